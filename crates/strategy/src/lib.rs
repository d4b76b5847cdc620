pub mod config;
pub mod indicators;
pub mod registry;

pub use config::{DetectorConfig, DetectorFileConfig};
pub use indicators::{FlagIndicator, FlagParams, FlagVerdict};
pub use registry::{DetectorRegistry, DetectorReport};

use common::Bar;

/// All pattern detectors must satisfy this trait.
pub trait Detector: Send + Sync {
    /// Human-readable name of this detector instance.
    fn name(&self) -> &str;

    /// The symbol this detector watches (e.g. "AAPL").
    fn symbol(&self) -> &str;

    /// How many of the most recent bars `evaluate` looks at.
    fn lookback(&self) -> usize;

    /// Judge the latest bars (oldest first).
    fn evaluate(&self, bars: &[Bar]) -> FlagVerdict;
}
