use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::exif::ValueSanitizer;

/// Top-level configuration for the exif-meta library.
///
/// Controls which tags are projected into metadata stores, the labels they
/// are displayed under, and which tags are never emitted.
///
/// # Loading
///
/// ```rust,no_run
/// use exif_meta::config::Config;
///
/// // From a JSON file
/// let config = Config::load(Some("config.json".as_ref())).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.meta_fields = "IFD0.Make,IFD0.Model,IPTC.City".into();
/// config.meta_labels = "Camera maker,Camera model,City".into();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Comma-separated `<section>.<tag>` (or `<section>-<tag>`) list.
    pub meta_fields: String,
    /// Comma-separated display labels, paired with `meta_fields` by position.
    pub meta_labels: String,
    /// Tag names (case-insensitive) dropped from every output.
    pub exclude_tags: Vec<String>,
    pub output: OutputConfig,
}

/// Output behavior for the command-line tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print JSON output.
    pub pretty_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta_fields: "IFD0.Make,IFD0.Model,EXIF.DateTimeOriginal,COMPUTED_GPS.GPS_Latitude,COMPUTED_GPS.GPS_Longitude,IPTC.City,IPTC.Copyright".to_string(),
            meta_labels: "Make,Model,Date taken,Latitude,Longitude,City,Copyright".to_string(),
            exclude_tags: Vec::new(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty_json: true }
    }
}

impl Config {
    /// Resolve the config file path: same directory as the executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("config.json"))
    }

    /// Load config from the given path, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            log::warn!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// The `(fields, labels)` pair handed to the field resolver.
    pub fn resolver_input(&self) -> (&str, &str) {
        (&self.meta_fields, &self.meta_labels)
    }

    /// Sanitizer honoring `exclude_tags`.
    pub fn sanitizer(&self) -> ValueSanitizer {
        ValueSanitizer::with_excluded_tags(&self.exclude_tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(Some(dir.path().join("absent.json").as_path())).unwrap();
        assert_eq!(config.meta_fields, Config::default().meta_fields);
        assert!(config.exclude_tags.is_empty());
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.meta_fields = "EXIF.Make".into();
        config.exclude_tags = vec!["MakerNote".into()];
        config.save(Some(path.as_path())).unwrap();

        let loaded = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(loaded.meta_fields, "EXIF.Make");
        assert_eq!(loaded.exclude_tags, ["MakerNote"]);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"meta_fields": "IPTC.City"}"#).unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.meta_fields, "IPTC.City");
        assert!(config.output.pretty_json);
    }

    #[test]
    fn invalid_json_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Config::load(Some(path.as_path())).is_err());
    }

    #[test]
    fn resolver_input_pairs_fields_and_labels() {
        let config = Config::default();
        let (fields, labels) = config.resolver_input();
        assert!(fields.starts_with("IFD0.Make"));
        assert!(labels.starts_with("Make,"));
    }

    #[test]
    fn sanitizer_uses_excluded_tags() {
        let mut config = Config::default();
        config.exclude_tags = vec!["MakerNote".into()];
        assert!(config.sanitizer().is_excluded("makernote"));
    }
}
