use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::data::aggregate::{aggregate, AggregateError, Aggregation, Identifiers, SoundingFailure};
use crate::data::decoder::{Decoder, NamespaceTable};
use crate::data::export::write_csv_file;
use crate::data::fetch::SoundingSource;
use crate::render::figure::{Figure, Renderer};
use crate::render::output::write_figure;

// ---------------------------------------------------------------------------
// Pipeline: identifiers → collection → figure → files
// ---------------------------------------------------------------------------

/// What one comparison run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub image: PathBuf,
    pub csv_files: Vec<PathBuf>,
    /// Identifiers that made it into the figure, in drawing order.
    pub loaded: Vec<String>,
    pub failures: Vec<SoundingFailure>,
}

pub struct CptApp {
    pub config: Config,
    decoder: Decoder,
}

impl CptApp {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            decoder: Decoder::new(NamespaceTable::bro_cpt()),
        }
    }

    /// Load all identifiers and compose the figure, without touching disk.
    ///
    /// Fails only when no identifier could be loaded.
    pub fn compose<S>(&self, ids: impl Into<Identifiers>, source: &S) -> Result<(Aggregation, Figure)>
    where
        S: SoundingSource + ?Sized,
    {
        let aggregation = match aggregate(ids, source, &self.decoder) {
            Ok(aggregation) => aggregation,
            Err(AggregateError::EmptyResult { failures }) => {
                for failure in &failures {
                    log::error!("{failure}");
                }
                return Err(AggregateError::EmptyResult { failures }.into());
            }
        };

        let assigner = self.config.color_assigner()?;
        let figure = Renderer::new(assigner.as_ref())
            .with_legend_threshold(self.config.legend_threshold)
            .render(&aggregation.collection);
        Ok((aggregation, figure))
    }

    /// Full run: compose, write the PNG and optionally one CSV per sounding.
    ///
    /// The image is named after the requested identifiers, so a
    /// multi-identifier request is always written as the combined plot even
    /// when only one of them loaded.
    pub fn run<S>(&self, ids: impl Into<Identifiers>, source: &S, export_csv: bool) -> Result<RunOutcome>
    where
        S: SoundingSource + ?Sized,
    {
        let requested: Identifiers = ids.into();
        let (aggregation, figure) = self.compose(requested.clone(), source)?;
        let collection = &aggregation.collection;
        let loaded = collection.ids();
        let out_dir = &self.config.output_dir;

        let image = write_figure(
            &figure,
            out_dir,
            &requested.unique(),
            &self.config.raster_options(),
        )?;

        let mut csv_files = Vec::new();
        if export_csv {
            for (id, sounding) in collection.iter() {
                let path = out_dir.join(format!("{id}.csv"));
                write_csv_file(sounding, &path).with_context(|| format!("exporting {id}"))?;
                log::info!("wrote {}", path.display());
                csv_files.push(path);
            }
        }

        Ok(RunOutcome {
            image,
            csv_files,
            loaded: loaded.iter().map(|s| s.to_string()).collect(),
            failures: aggregation.failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fetch::DirectorySource;
    use crate::data::schema::COLUMN_COUNT;
    use crate::render::figure::TrackKind;

    fn write_doc(dir: &std::path::Path, id: &str, offset: f64) {
        let row: Vec<String> = (0..COLUMN_COUNT).map(|i| format!("{}", i as f64 / 10.0)).collect();
        let xml = format!(
            r#"<r xmlns:cptcommon="http://www.broservices.nl/xsd/cptcommon/1.1">
                 <cptcommon:offset>{offset}</cptcommon:offset>
                 <cptcommon:values>{row};{row};</cptcommon:values></r>"#,
            row = row.join(",")
        );
        std::fs::write(dir.join(format!("{id}.xml")), xml).unwrap();
    }

    #[test]
    fn test_compose_renders_surviving_soundings() {
        let dir = tempfile::tempdir().unwrap();
        write_doc(dir.path(), "CPT_A", 1.0);
        write_doc(dir.path(), "CPT_C", -0.5);

        let app = CptApp::new(Config::default());
        let source = DirectorySource::new(dir.path());
        let (agg, figure) = app.compose(["CPT_A", "CPT_B", "CPT_C"], &source).unwrap();

        assert_eq!(agg.collection.ids(), vec!["CPT_A", "CPT_C"]);
        assert_eq!(agg.failures.len(), 1);
        assert_eq!(figure.title, "CPT_A / CPT_C");
        let cone = figure.track(TrackKind::ConeResistance).unwrap();
        assert_eq!(cone.curves.len(), 2);
        assert!(cone.legend.is_some());
    }

    fn small_config(out: &std::path::Path) -> Config {
        Config {
            output_dir: out.to_path_buf(),
            dpi: 40,
            width_in: 6.0,
            height_in: 5.0,
            ..Config::default()
        }
    }

    #[test]
    fn test_partial_multi_request_writes_combined_plot() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write_doc(src.path(), "CPT_A", 1.0);

        let app = CptApp::new(small_config(out.path()));
        let outcome = app
            .run(vec!["CPT_A".to_string(), "CPT_B".to_string()], &DirectorySource::new(src.path()), true)
            .unwrap();

        assert!(outcome.image.ends_with("combined_cpt_plot.png"));
        assert!(outcome.image.exists());
        assert!(!out.path().join("CPT_A.png").exists());
        assert_eq!(outcome.loaded, vec!["CPT_A"]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.csv_files, vec![out.path().join("CPT_A.csv")]);
    }

    #[test]
    fn test_repeated_single_identifier_is_named_after_it() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write_doc(src.path(), "CPT_A", 1.0);

        let app = CptApp::new(small_config(out.path()));
        let outcome = app
            .run(["CPT_A", "CPT_A"], &DirectorySource::new(src.path()), false)
            .unwrap();
        assert!(outcome.image.ends_with("CPT_A.png"));
        assert!(outcome.csv_files.is_empty());
    }

    #[test]
    fn test_compose_without_any_sounding_fails() {
        let dir = tempfile::tempdir().unwrap();
        let app = CptApp::new(Config::default());
        let err = app
            .compose("CPT_X", &DirectorySource::new(dir.path()))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AggregateError>(),
            Some(AggregateError::EmptyResult { .. })
        ));
    }
}
