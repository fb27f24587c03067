//! TOML configuration file support.
//!
//! Settings for `obs2nc render` can live in a config file instead of flags;
//! flags given on the command line win:
//!
//! ```toml
//! # obs2nc.toml
//! [render]
//! time_key = "Datetime"
//! compression_level = 6
//! format = "archive"
//! output_dir = "out"
//! batch_size = 360
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root configuration structure for obs2nc.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Render-specific settings.
    #[serde(default)]
    pub render: RenderConfig,
}

/// Configuration for the render command.
#[derive(Debug, Default, Deserialize)]
pub struct RenderConfig {
    /// Record key holding the timestamp.
    pub time_key: Option<String>,

    /// Deflate level for numeric variables (0-9).
    pub compression_level: Option<u32>,

    /// Container format (`archive` or `netcdf`).
    pub format: Option<String>,

    /// Directory for named output files.
    pub output_dir: Option<PathBuf>,

    /// Number of records per output file.
    pub batch_size: Option<usize>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [render]
            time_key = "Time"
            compression_level = 6
            format = "archive"
            output_dir = "out"
            batch_size = 360
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.render.time_key.as_deref(), Some("Time"));
        assert_eq!(config.render.compression_level, Some(6));
        assert_eq!(config.render.format.as_deref(), Some("archive"));
        assert_eq!(config.render.output_dir, Some(PathBuf::from("out")));
        assert_eq!(config.render.batch_size, Some(360));
    }

    #[test]
    fn test_partial_config() {
        let toml = r#"
            [render]
            compression_level = 9
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.render.compression_level, Some(9));
        assert_eq!(config.render.batch_size, None);
    }

    #[test]
    fn test_empty_config() {
        let config = Config::from_str("").unwrap();
        assert!(config.render.time_key.is_none());
    }

    #[test]
    fn test_invalid_config() {
        assert!(Config::from_str("[render]\nbatch_size = \"many\"").is_err());
    }
}
