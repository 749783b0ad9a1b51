mod app;
mod color;
mod config;
mod data;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use app::CptApp;
use config::{Config, PaletteChoice};
use data::aggregate::AggregateError;
use data::fetch::{BroClient, DirectorySource, SoundingSource};

/// Compare cone penetration tests from the Dutch BRO registry in one plot.
#[derive(Parser, Debug)]
#[command(name = "cpt-compare", version, about)]
struct Cli {
    /// BRO CPT identifiers, e.g. CPT000000225472
    #[arg(required = true)]
    ids: Vec<String>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read `<id>.xml` documents from this directory instead of the BRO service
    #[arg(long)]
    source_dir: Option<PathBuf>,

    /// Output directory (overrides the configuration)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Also write one CSV per sounding next to the image
    #[arg(long)]
    csv: bool,

    /// Colour palette (overrides the configuration)
    #[arg(long, value_enum)]
    palette: Option<PaletteArg>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PaletteArg {
    Default,
    Hues,
}

impl From<PaletteArg> for PaletteChoice {
    fn from(arg: PaletteArg) -> Self {
        match arg {
            PaletteArg::Default => PaletteChoice::Default,
            PaletteArg::Hues => PaletteChoice::Hues,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<AggregateError>() {
                Some(empty) => log::error!("{empty}"),
                None => log::error!("{e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(dir) = cli.out_dir {
        config.output_dir = dir;
    }
    if let Some(palette) = cli.palette {
        config.palette = palette.into();
    }

    let source: Box<dyn SoundingSource> = match &cli.source_dir {
        Some(dir) => {
            log::info!("reading soundings from {}", dir.display());
            Box::new(DirectorySource::new(dir))
        }
        None => Box::new(
            BroClient::new(config.base_url.clone(), config.timeout())
                .context("building HTTP client")?,
        ),
    };

    let app = CptApp::new(config);
    let outcome = app.run(cli.ids, source.as_ref(), cli.csv)?;

    if !outcome.failures.is_empty() {
        log::warn!(
            "{} of {} soundings could not be loaded",
            outcome.failures.len(),
            outcome.failures.len() + outcome.loaded.len()
        );
    }
    println!("{}", outcome.image.display());
    for path in &outcome.csv_files {
        println!("{}", path.display());
    }
    Ok(())
}
