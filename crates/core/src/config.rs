//! Configuration structures for the predchart pipeline.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration for the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database locations.
    pub sources: SourceConfig,
    /// Table discovery configuration.
    pub catalog: CatalogConfig,
    /// Column naming configuration.
    pub columns: ColumnConfig,
    /// Chart output configuration.
    pub chart: ChartConfig,
}

impl Config {
    /// Parse a configuration from JSON. Missing sections take their defaults.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.catalog.predicted_suffix.is_empty() {
            return Err(Error::config("catalog.predicted_suffix must not be empty"));
        }
        if self.columns.timestamp.is_empty() {
            return Err(Error::config("columns.timestamp must not be empty"));
        }
        if self.columns.predicted_prefix.is_empty() {
            return Err(Error::config("columns.predicted_prefix must not be empty"));
        }
        if self.chart.width == 0 || self.chart.height == 0 {
            return Err(Error::config("chart dimensions must be non-zero"));
        }
        Ok(())
    }
}

/// Where the actual and predicted tables live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Database holding the observed price tables.
    pub actual_db: PathBuf,
    /// Database holding the `*_predictions` tables.
    pub predictions_db: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            actual_db: PathBuf::from("databases/nifty50_data_v1.db"),
            predictions_db: PathBuf::from("databases/predictions.db"),
        }
    }
}

/// Table discovery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Suffix appended to an actual table name to get its predicted table.
    pub predicted_suffix: String,
    /// Table names never treated as actual series.
    pub excluded_tables: Vec<String>,
    /// Also exclude every table the source reports as internal.
    pub exclude_internal: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            predicted_suffix: "_predictions".to_string(),
            excluded_tables: vec!["sqlite_sequence".to_string()],
            exclude_internal: true,
        }
    }
}

/// Column naming configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    /// Name of the timestamp column in both actual and predicted tables.
    pub timestamp: String,
    /// Prefix of the fields kept from a predicted table.
    pub predicted_prefix: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            timestamp: crate::columns::DATETIME.to_string(),
            predicted_prefix: crate::columns::PREDICTED_PREFIX.to_string(),
        }
    }
}

/// Chart output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Directory that receives one HTML document per rendered pair.
    pub output_dir: PathBuf,
    /// Plot width in pixels.
    pub width: u32,
    /// Plot height in pixels.
    pub height: u32,
    /// Title text placed before the table name.
    pub title_prefix: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("charts"),
            width: 1200,
            height: 600,
            title_prefix: "Candlestick Chart for".to_string(),
        }
    }
}
