//! JSON configuration file.
//!
//! Every field is optional; missing fields take the defaults below:
//!
//! ```json
//! {
//!   "base_url": "https://publiek.broservices.nl/sr/cpt/v1/objects/",
//!   "output_dir": "output",
//!   "timeout_secs": 30,
//!   "dpi": 300,
//!   "width_in": 12.0,
//!   "height_in": 10.0,
//!   "legend_threshold": 5,
//!   "palette": "default",
//!   "colors": ["#005AA7", "#E52329"]
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::color::{parse_cycle, ColorAssigner, CycleAssigner, EvenHues};
use crate::data::fetch::BRO_CPT_BASE_URL;
use crate::render::figure::DEFAULT_LEGEND_THRESHOLD;
use crate::render::output::RasterOptions;

/// How soundings are coloured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteChoice {
    /// Ten-colour cycle, or `colors` when given.
    #[default]
    Default,
    /// Evenly spaced hues, never repeating.
    Hues,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub output_dir: PathBuf,
    pub timeout_secs: u64,
    pub dpi: u32,
    pub width_in: f64,
    pub height_in: f64,
    pub legend_threshold: usize,
    pub palette: PaletteChoice,
    /// Custom `#rrggbb` cycle for the default palette.
    pub colors: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        let raster = RasterOptions::default();
        Self {
            base_url: BRO_CPT_BASE_URL.to_string(),
            output_dir: PathBuf::from("output"),
            timeout_secs: 30,
            dpi: raster.dpi,
            width_in: raster.width_in,
            height_in: raster.height_in,
            legend_threshold: DEFAULT_LEGEND_THRESHOLD,
            palette: PaletteChoice::Default,
            colors: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse JSON configuration")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn raster_options(&self) -> RasterOptions {
        RasterOptions {
            width_in: self.width_in,
            height_in: self.height_in,
            dpi: self.dpi,
            ..RasterOptions::default()
        }
    }

    /// Build the colour assigner selected by `palette` / `colors`.
    pub fn color_assigner(&self) -> Result<Box<dyn ColorAssigner>> {
        Ok(match self.palette {
            PaletteChoice::Hues => Box::new(EvenHues),
            PaletteChoice::Default => {
                let colors = parse_cycle(&self.colors).context("invalid colour in `colors`")?;
                Box::new(CycleAssigner::new(colors))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::DEFAULT_CYCLE;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.base_url, BRO_CPT_BASE_URL);
        assert_eq!(config.legend_threshold, 5);
        assert_eq!(config.dpi, 300);
    }

    #[test]
    fn test_parse_config() {
        let json = r##"{
            "output_dir": "/tmp/plots",
            "dpi": 150,
            "legend_threshold": 3,
            "palette": "hues"
        }"##;
        let config = Config::from_json(json).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/tmp/plots"));
        assert_eq!(config.raster_options().dpi, 150);
        assert_eq!(config.legend_threshold, 3);
        assert_eq!(config.palette, PaletteChoice::Hues);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_custom_colors() {
        let config = Config::from_json(r##"{"colors": ["#005AA7"]}"##).unwrap();
        let map = config.color_assigner().unwrap().assign(&["A", "B"]);
        assert_eq!(map.color_for("A"), map.color_for("B"));
        assert_ne!(map.color_for("A"), DEFAULT_CYCLE[0]);

        let bad = Config::from_json(r##"{"colors": ["blue"]}"##).unwrap();
        assert!(bad.color_assigner().is_err());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(Config::from_json("{ dpi: }").is_err());
        assert!(Config::from_json(r#"{"palette": "rainbow"}"#).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cpt.json");
        std::fs::write(&path, r#"{"timeout_secs": 5}"#).unwrap();
        assert_eq!(Config::from_file(&path).unwrap().timeout(), Duration::from_secs(5));
        assert!(Config::from_file(&dir.path().join("missing.json")).is_err());
    }
}
