use serde::{Deserialize, Serialize};

use common::{Error, Result, Segment};
use segmentation::Segmenter;

use super::points::to_points;
use super::slope::angle_between_slopes;

/// Tuning knobs of the flag pattern check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagParams {
    /// Number of most recent bars examined.
    pub lookback: usize,
    /// Largest angle (degrees) between the high and low trend lines that
    /// still counts as a flag.
    pub flag_tolerance_degrees: f64,
    /// The mean of both trend slopes must exceed this.
    pub min_positive_slope: f64,
    /// Per-segment cost handed to the segmenter.
    pub segment_cost: f64,
    /// Both final trend segments must fit with less squared error than this.
    pub error_threshold: f64,
}

impl Default for FlagParams {
    fn default() -> Self {
        Self {
            lookback: 60,
            flag_tolerance_degrees: 25.0,
            min_positive_slope: 0.1,
            segment_cost: 4.0,
            error_threshold: 2.0,
        }
    }
}

impl FlagParams {
    pub fn validate(&self) -> Result<()> {
        if self.lookback == 0 {
            return Err(Error::Config("flag lookback must be at least 1".into()));
        }
        for (name, value) in [
            ("flag_tolerance_degrees", self.flag_tolerance_degrees),
            ("min_positive_slope", self.min_positive_slope),
            ("segment_cost", self.segment_cost),
            ("error_threshold", self.error_threshold),
        ] {
            if !value.is_finite() {
                return Err(Error::Config(format!("flag {name} must be finite, got {value}")));
            }
        }
        Ok(())
    }
}

/// Outcome of one flag check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum FlagVerdict {
    /// Highs and lows trend up together along tight, parallel lines.
    Flag {
        avg_slope: f64,
        angle: f64,
        high_sqerr: f64,
        low_sqerr: f64,
    },
    /// The high and low trend lines diverge too much.
    NotAFlag { angle: f64 },
    /// Parallel, but not rising steeply enough.
    SlopeTooShallow { avg_slope: f64 },
    /// Trend lines fit the recent bars too loosely.
    ErrorTooHigh { high_sqerr: f64, low_sqerr: f64 },
    /// Too few bars to judge: an empty history, or a registry window that
    /// does not yet hold `lookback` bars.
    InsufficientData,
}

impl FlagVerdict {
    pub fn is_flag(&self) -> bool {
        matches!(self, FlagVerdict::Flag { .. })
    }
}

impl std::fmt::Display for FlagVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlagVerdict::Flag {
                avg_slope,
                angle,
                high_sqerr,
                low_sqerr,
            } => write!(
                f,
                "flag (slope {avg_slope:.4}, angle {angle:.2}°, E_h {high_sqerr:.4}, E_l {low_sqerr:.4})"
            ),
            FlagVerdict::NotAFlag { angle } => write!(f, "not a flag (angle {angle:.2}°)"),
            FlagVerdict::SlopeTooShallow { avg_slope } => {
                write!(f, "slope too shallow ({avg_slope:.4})")
            }
            FlagVerdict::ErrorTooHigh {
                high_sqerr,
                low_sqerr,
            } => write!(f, "error too high (E_h {high_sqerr:.4}, E_l {low_sqerr:.4})"),
            FlagVerdict::InsufficientData => write!(f, "insufficient data"),
        }
    }
}

/// Flag pattern detector.
///
/// Segments the recent highs and the recent lows separately and compares the
/// latest segment of each: a flag is two nearly parallel, rising, tightly
/// fitted trend lines.
#[derive(Debug, Clone)]
pub struct FlagIndicator {
    pub params: FlagParams,
    segmenter: Segmenter,
}

impl FlagIndicator {
    pub fn new(params: FlagParams) -> Self {
        assert!(params.lookback >= 1, "flag lookback must be >= 1");
        Self {
            params,
            segmenter: Segmenter::new(params.segment_cost),
        }
    }

    /// Judge the last `lookback` highs and lows (oldest first).
    pub fn evaluate(&self, highs: &[f64], lows: &[f64]) -> FlagVerdict {
        let (Some(high), Some(low)) = (self.last_segment(highs), self.last_segment(lows)) else {
            return FlagVerdict::InsufficientData;
        };

        let angle = angle_between_slopes(high.slope, low.slope);
        if angle >= self.params.flag_tolerance_degrees {
            return FlagVerdict::NotAFlag { angle };
        }

        let avg_slope = (high.slope + low.slope) / 2.0;
        if avg_slope <= self.params.min_positive_slope {
            return FlagVerdict::SlopeTooShallow { avg_slope };
        }

        if high.sqerr >= self.params.error_threshold || low.sqerr >= self.params.error_threshold {
            return FlagVerdict::ErrorTooHigh {
                high_sqerr: high.sqerr,
                low_sqerr: low.sqerr,
            };
        }

        FlagVerdict::Flag {
            avg_slope,
            angle,
            high_sqerr: high.sqerr,
            low_sqerr: low.sqerr,
        }
    }

    fn last_segment(&self, history: &[f64]) -> Option<Segment> {
        let start = history.len().saturating_sub(self.params.lookback);
        let points = to_points(&history[start..]);
        self.segmenter.segment(&points).last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize, start: f64, slope: f64) -> Vec<f64> {
        (0..n).map(|i| start + slope * i as f64).collect()
    }

    #[test]
    fn rising_parallel_channel_is_a_flag() {
        let flag = FlagIndicator::new(FlagParams::default());
        let highs = line(30, 105.0, 0.5);
        let lows = line(30, 100.0, 0.5);
        let verdict = flag.evaluate(&highs, &lows);
        match verdict {
            FlagVerdict::Flag {
                avg_slope, angle, ..
            } => {
                assert!((avg_slope - 0.5).abs() < 1e-6);
                assert!(angle < 1e-3);
            }
            other => panic!("expected flag, got {other}"),
        }
    }

    #[test]
    fn diverging_lines_are_not_a_flag() {
        let flag = FlagIndicator::new(FlagParams::default());
        let highs = line(30, 100.0, 2.0);
        let lows = line(30, 100.0, -2.0);
        assert!(matches!(
            flag.evaluate(&highs, &lows),
            FlagVerdict::NotAFlag { angle } if angle > 25.0
        ));
    }

    #[test]
    fn flat_channel_is_too_shallow() {
        let flag = FlagIndicator::new(FlagParams::default());
        let highs = vec![101.0; 30];
        let lows = vec![99.0; 30];
        assert_eq!(
            flag.evaluate(&highs, &lows),
            FlagVerdict::SlopeTooShallow { avg_slope: 0.0 }
        );
    }

    #[test]
    fn loose_low_fit_is_rejected() {
        // A huge segment cost keeps a single segment per series, so the noisy
        // lows cannot be split away.
        let flag = FlagIndicator::new(FlagParams {
            segment_cost: 1e6,
            ..FlagParams::default()
        });
        let highs = line(30, 105.0, 0.5);
        let lows: Vec<f64> = line(30, 100.0, 0.5)
            .into_iter()
            .enumerate()
            .map(|(i, v)| if i % 2 == 0 { v + 1.0 } else { v - 1.0 })
            .collect();
        match flag.evaluate(&highs, &lows) {
            FlagVerdict::ErrorTooHigh {
                high_sqerr,
                low_sqerr,
            } => {
                assert!(high_sqerr < 1e-6);
                assert!(low_sqerr >= 2.0);
            }
            other => panic!("expected error rejection, got {other}"),
        }
    }

    #[test]
    fn only_lookback_window_is_used() {
        let flag = FlagIndicator::new(FlagParams {
            lookback: 10,
            ..FlagParams::default()
        });
        // Wild history followed by a clean rising channel in the last 10 bars.
        let mut highs: Vec<f64> = (0..50).map(|i| if i % 2 == 0 { 500.0 } else { 5.0 }).collect();
        let mut lows = highs.iter().map(|h| h - 3.0).collect::<Vec<_>>();
        highs.extend(line(10, 105.0, 1.0));
        lows.extend(line(10, 100.0, 1.0));
        assert!(flag.evaluate(&highs, &lows).is_flag());
    }

    #[test]
    fn empty_history_is_insufficient() {
        let flag = FlagIndicator::new(FlagParams::default());
        assert_eq!(flag.evaluate(&[], &[1.0, 2.0]), FlagVerdict::InsufficientData);
    }

    #[test]
    fn params_validation() {
        assert!(FlagParams::default().validate().is_ok());
        let zero = FlagParams {
            lookback: 0,
            ..FlagParams::default()
        };
        assert!(zero.validate().is_err());
        let nan = FlagParams {
            error_threshold: f64::NAN,
            ..FlagParams::default()
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    #[should_panic(expected = "lookback")]
    fn zero_lookback_panics() {
        FlagIndicator::new(FlagParams {
            lookback: 0,
            ..FlagParams::default()
        });
    }
}
