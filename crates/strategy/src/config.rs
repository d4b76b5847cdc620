use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use common::Result;

/// Top-level detector config file (TOML).
///
/// Example `config/detectors.toml`:
/// ```toml
/// [[detector]]
/// type = "flag"
/// name = "AAPL daily flag"
/// symbol = "AAPL"
///
/// [detector.params]
/// lookback = 60
/// flag_tolerance_degrees = 25.0
/// segment_cost = 4.0
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectorFileConfig {
    #[serde(rename = "detector", default)]
    pub detectors: Vec<DetectorConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectorConfig {
    /// Detector type identifier. Only "flag" exists today.
    #[serde(rename = "type", default = "default_type")]
    pub detector_type: String,
    /// Human-readable name shown in logs and reports.
    pub name: String,
    /// Symbol whose bars feed this detector.
    pub symbol: String,
    /// Detector-specific parameters.
    #[serde(default)]
    pub params: HashMap<String, toml::Value>,
}

fn default_type() -> String {
    "flag".to_string()
}

impl DetectorFileConfig {
    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
