use std::str::FromStr;

use crate::{Error, Result};

/// Runtime defaults loaded from environment variables.
/// Every variable is optional; malformed values are reported, not ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Cost charged once per segment.
    pub segment_cost: f64,
    /// Worker threads for the cost-table fill. `1` keeps it sequential.
    pub threads: usize,
    /// Path to the detector definitions file.
    pub detector_config_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            segment_cost: 4.0,
            threads: 1,
            detector_config_path: "config/detectors.toml".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the environment, reading `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let segment_cost = match lookup("SEGMENT_COST") {
            Some(raw) => parse_var::<f64>("SEGMENT_COST", &raw)?,
            None => defaults.segment_cost,
        };
        if !segment_cost.is_finite() {
            return Err(Error::Config(format!(
                "SEGMENT_COST must be finite, got '{segment_cost}'"
            )));
        }

        let threads = match lookup("SEGFIT_THREADS") {
            Some(raw) => parse_var::<usize>("SEGFIT_THREADS", &raw)?,
            None => defaults.threads,
        };
        if threads == 0 {
            return Err(Error::Config("SEGFIT_THREADS must be at least 1".into()));
        }

        Ok(Config {
            segment_cost,
            threads,
            detector_config_path: lookup("DETECTOR_CONFIG_PATH")
                .unwrap_or(defaults.detector_config_path),
        })
    }
}

fn parse_var<T: FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| Error::Config(format!("{key}='{raw}': {e}")))
}
