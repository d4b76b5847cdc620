use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use common::{Bar, Error, Result};

use crate::config::{DetectorConfig, DetectorFileConfig};
use crate::indicators::{FlagIndicator, FlagParams, FlagVerdict};
use crate::Detector;

/// One detector's judgement after a bar arrived.
#[derive(Debug, Clone, Serialize)]
pub struct DetectorReport {
    pub detector: String,
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub verdict: FlagVerdict,
}

/// Holds all active detectors and dispatches bars to them.
pub struct DetectorRegistry {
    detectors: Vec<Box<dyn Detector>>,
    /// Per-symbol rolling window of recent bars.
    history: HashMap<String, VecDeque<Bar>>,
    /// Per-symbol window cap: the largest lookback among its detectors.
    max_history: HashMap<String, usize>,
}

impl DetectorRegistry {
    /// Build the registry from config. Unknown types and bad parameters are errors.
    pub fn from_config(file_cfg: &DetectorFileConfig) -> Result<Self> {
        let mut registry = Self {
            detectors: Vec::new(),
            history: HashMap::new(),
            max_history: HashMap::new(),
        };
        for cfg in &file_cfg.detectors {
            registry.register(build_detector(cfg)?);
        }
        Ok(registry)
    }

    pub fn register(&mut self, detector: Box<dyn Detector>) {
        info!(
            name = %detector.name(),
            symbol = %detector.symbol(),
            lookback = detector.lookback(),
            "Registered detector"
        );
        let cap = self
            .max_history
            .entry(detector.symbol().to_string())
            .or_insert(0);
        *cap = (*cap).max(detector.lookback());
        self.detectors.push(detector);
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Record one closed bar and evaluate every detector watching its symbol.
    /// Bars for unwatched symbols are dropped. A detector whose lookback is
    /// not yet filled reports [`FlagVerdict::InsufficientData`].
    pub fn process(&mut self, bar: &Bar) -> Vec<DetectorReport> {
        let Some(&cap) = self.max_history.get(&bar.symbol) else {
            debug!(symbol = %bar.symbol, "No detector for symbol, bar ignored");
            return Vec::new();
        };

        let window = self.history.entry(bar.symbol.clone()).or_default();
        window.push_back(bar.clone());
        while window.len() > cap {
            window.pop_front();
        }
        let bars = window.make_contiguous();

        self.detectors
            .iter()
            .filter(|d| d.symbol() == bar.symbol)
            .map(|d| {
                let verdict = if bars.len() < d.lookback() {
                    FlagVerdict::InsufficientData
                } else {
                    d.evaluate(&bars[bars.len() - d.lookback()..])
                };
                debug!(detector = %d.name(), symbol = %bar.symbol, %verdict, "Evaluated");
                DetectorReport {
                    detector: d.name().to_string(),
                    symbol: bar.symbol.clone(),
                    timestamp: bar.timestamp,
                    verdict,
                }
            })
            .collect()
    }

    /// The bars currently held for `symbol`, oldest first.
    pub fn history(&self, symbol: &str) -> Vec<&Bar> {
        self.history
            .get(symbol)
            .map(|w| w.iter().collect())
            .unwrap_or_default()
    }
}

// ─── Detector builders ────────────────────────────────────────────────────────

fn build_detector(cfg: &DetectorConfig) -> Result<Box<dyn Detector>> {
    match cfg.detector_type.as_str() {
        "flag" => {
            let defaults = FlagParams::default();
            let params = FlagParams {
                lookback: param_usize(cfg, "lookback", defaults.lookback)?,
                flag_tolerance_degrees: param_f64(
                    cfg,
                    "flag_tolerance_degrees",
                    defaults.flag_tolerance_degrees,
                )?,
                min_positive_slope: param_f64(
                    cfg,
                    "min_positive_slope",
                    defaults.min_positive_slope,
                )?,
                segment_cost: param_f64(cfg, "segment_cost", defaults.segment_cost)?,
                error_threshold: param_f64(cfg, "error_threshold", defaults.error_threshold)?,
            };
            params
                .validate()
                .map_err(|e| Error::Config(format!("detector '{}': {e}", cfg.name)))?;
            Ok(Box::new(FlagDetector::new(cfg.clone(), params)))
        }
        other => Err(Error::Config(format!(
            "detector '{}': unknown type '{other}'",
            cfg.name
        ))),
    }
}

/// Absent keys take `default`; present keys must be numbers. Integers are
/// accepted as floats.
fn param_f64(cfg: &DetectorConfig, key: &str, default: f64) -> Result<f64> {
    let Some(value) = cfg.params.get(key) else {
        return Ok(default);
    };
    value
        .as_float()
        .or_else(|| value.as_integer().map(|i| i as f64))
        .ok_or_else(|| bad_param(cfg, key, value, "a number"))
}

/// Absent keys take `default`; present keys must be non-negative integers.
fn param_usize(cfg: &DetectorConfig, key: &str, default: usize) -> Result<usize> {
    let Some(value) = cfg.params.get(key) else {
        return Ok(default);
    };
    value
        .as_integer()
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(|| bad_param(cfg, key, value, "a non-negative integer"))
}

fn bad_param(cfg: &DetectorConfig, key: &str, value: &toml::Value, expected: &str) -> Error {
    Error::Config(format!(
        "detector '{}': parameter '{key}' must be {expected}, got {value}",
        cfg.name
    ))
}

// ─── Concrete detector types ──────────────────────────────────────────────────

struct FlagDetector {
    cfg: DetectorConfig,
    indicator: FlagIndicator,
}

impl FlagDetector {
    fn new(cfg: DetectorConfig, params: FlagParams) -> Self {
        Self {
            cfg,
            indicator: FlagIndicator::new(params),
        }
    }
}

impl Detector for FlagDetector {
    fn name(&self) -> &str {
        &self.cfg.name
    }

    fn symbol(&self) -> &str {
        &self.cfg.symbol
    }

    fn lookback(&self) -> usize {
        self.indicator.params.lookback
    }

    fn evaluate(&self, bars: &[Bar]) -> FlagVerdict {
        let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
        self.indicator.evaluate(&highs, &lows)
    }
}
