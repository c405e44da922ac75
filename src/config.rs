//! Configuration management module.
//! Application settings persisted as JSON next to the executable.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration load result.
#[derive(Debug)]
pub enum ConfigLoadResult {
    /// Config loaded successfully.
    Loaded(AppConfig),
    /// Config file missing (first run).
    Missing,
    /// Config file exists but invalid.
    Invalid(ConfigError),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Number of bins used by histograms.
    pub histogram_bins: usize,
    /// Rows shown in the raw data view and aggregation results.
    pub preview_rows: usize,
    /// Rows scanned by the CSV reader to infer column types.
    pub infer_schema_length: usize,
    /// Upper bound on pairplot columns.
    pub pairplot_max_columns: usize,
    /// Upper bound on points per pairplot cell.
    pub pairplot_max_points: usize,
    /// Most frequent values listed per column in the profiling report.
    pub report_top_values: usize,
    /// Directory for generated reports (system temp dir when unset).
    pub report_dir: Option<PathBuf>,
    /// PNG export size in pixels.
    pub export_width: u32,
    pub export_height: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            histogram_bins: 30,
            preview_rows: 200,
            infer_schema_length: 10_000,
            pairplot_max_columns: 5,
            pairplot_max_points: 2_000,
            report_top_values: 10,
            report_dir: None,
            export_width: 1200,
            export_height: 800,
        }
    }
}

impl AppConfig {
    /// Get config file path (same directory as executable).
    pub fn default_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vizcraft.json")
    }

    /// Attempt to load config with detailed result.
    pub fn try_load(path: &Path) -> ConfigLoadResult {
        if !path.exists() {
            return ConfigLoadResult::Missing;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
                Ok(config) => match config.validate() {
                    Ok(()) => ConfigLoadResult::Loaded(config),
                    Err(e) => ConfigLoadResult::Invalid(e),
                },
                Err(e) => ConfigLoadResult::Invalid(ConfigError::Parse(e)),
            },
            Err(e) => ConfigLoadResult::Invalid(ConfigError::Read(e)),
        }
    }

    /// Save config as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=500).contains(&self.histogram_bins) {
            return Err(ConfigError::Validation(
                "histogram_bins must be between 1 and 500".to_string(),
            ));
        }
        if self.preview_rows == 0 {
            return Err(ConfigError::Validation(
                "preview_rows must be greater than 0".to_string(),
            ));
        }
        if self.infer_schema_length == 0 {
            return Err(ConfigError::Validation(
                "infer_schema_length must be greater than 0".to_string(),
            ));
        }
        if !(2..=10).contains(&self.pairplot_max_columns) {
            return Err(ConfigError::Validation(
                "pairplot_max_columns must be between 2 and 10".to_string(),
            ));
        }
        if self.pairplot_max_points == 0 {
            return Err(ConfigError::Validation(
                "pairplot_max_points must be greater than 0".to_string(),
            ));
        }
        if self.export_width < 200 || self.export_height < 200 {
            return Err(ConfigError::Validation(
                "export size must be at least 200x200".to_string(),
            ));
        }
        Ok(())
    }

    /// Directory where profiling reports are written.
    pub fn report_dir(&self) -> PathBuf {
        self.report_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.histogram_bins, 30);
    }

    #[test]
    fn test_validation_histogram_bins_bounds() {
        let mut config = AppConfig::default();

        config.histogram_bins = 0;
        assert!(config.validate().is_err());

        config.histogram_bins = 501;
        assert!(config.validate().is_err());

        config.histogram_bins = 50;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_pairplot_columns() {
        let mut config = AppConfig::default();
        config.pairplot_max_columns = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{ "histogram_bins": 12 }"#).unwrap();
        assert_eq!(config.histogram_bins, 12);
        assert_eq!(config.preview_rows, 200);
        assert!(config.report_dir.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("vizcraft_cfg_{}.json", std::process::id()));
        let mut config = AppConfig::default();
        config.preview_rows = 50;
        config.save(&path).unwrap();

        match AppConfig::try_load(&path) {
            ConfigLoadResult::Loaded(loaded) => assert_eq!(loaded, config),
            other => panic!("unexpected load result: {:?}", other),
        }
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_and_invalid() {
        let missing = std::env::temp_dir().join("vizcraft_cfg_does_not_exist.json");
        assert!(matches!(AppConfig::try_load(&missing), ConfigLoadResult::Missing));

        let bad = std::env::temp_dir().join(format!("vizcraft_cfg_bad_{}.json", std::process::id()));
        std::fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(AppConfig::try_load(&bad), ConfigLoadResult::Invalid(_)));
        let _ = std::fs::remove_file(&bad);
    }
}
