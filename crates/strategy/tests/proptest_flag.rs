use proptest::prelude::*;
use strategy::indicators::angle_between_slopes;
use strategy::{FlagIndicator, FlagParams, FlagVerdict};

proptest! {
    /// The angle is symmetric and stays within [0, 180].
    #[test]
    fn angle_is_bounded_and_symmetric(a in -1e6f64..1e6, b in -1e6f64..1e6) {
        let ab = angle_between_slopes(a, b);
        let ba = angle_between_slopes(b, a);
        prop_assert!((0.0..=180.0).contains(&ab), "angle {}", ab);
        prop_assert!((ab - ba).abs() < 1e-9);
    }

    /// Any finite history yields a verdict without panicking, and a flag
    /// verdict always satisfies every threshold.
    #[test]
    fn flag_verdicts_respect_thresholds(
        highs in prop::collection::vec(0.0f64..500.0, 0..40),
        lows in prop::collection::vec(0.0f64..500.0, 0..40),
        lookback in 1usize..50,
        segment_cost in 0.0f64..20.0,
    ) {
        let params = FlagParams { lookback, segment_cost, ..FlagParams::default() };
        let verdict = FlagIndicator::new(params).evaluate(&highs, &lows);

        match verdict {
            FlagVerdict::Flag { avg_slope, angle, high_sqerr, low_sqerr } => {
                prop_assert!(angle < params.flag_tolerance_degrees);
                prop_assert!(avg_slope > params.min_positive_slope);
                prop_assert!(high_sqerr < params.error_threshold);
                prop_assert!(low_sqerr < params.error_threshold);
            }
            FlagVerdict::InsufficientData => {
                prop_assert!(highs.is_empty() || lows.is_empty());
            }
            _ => {}
        }
    }
}
