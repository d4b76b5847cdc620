use common::Segment;
use tracing::trace;

use crate::cost::CostEntry;
use crate::prefix::PrefixSums;

/// Observer of the intermediate tables of one segmentation run.
///
/// Every hook defaults to a no-op, so implementors pick what they need and the
/// algorithm runs the same with or without an observer.
pub trait SegmentationTrace {
    /// Prefix sums, once they are complete.
    fn prefix(&mut self, _sums: &PrefixSums) {}

    /// One filled cost-table cell for the interval `i..=j`.
    fn cost(&mut self, _i: usize, _j: usize, _entry: &CostEntry) {}

    /// The optimum for prefix `j` and the start of its last segment.
    fn optimum(&mut self, _j: usize, _cost: f64, _choice: usize) {}

    /// A segment of the final answer, reported left to right.
    fn segment(&mut self, _segment: &Segment) {}
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTrace;

impl SegmentationTrace for NoTrace {}

/// Emits each intermediate value as a TRACE-level `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTrace;

impl SegmentationTrace for TracingTrace {
    fn prefix(&mut self, sums: &PrefixSums) {
        for k in 1..=sums.len() {
            trace!(
                k,
                x = sums.x()[k],
                y = sums.y()[k],
                xy = sums.xy()[k],
                xx = sums.xx()[k],
                "prefix"
            );
        }
    }

    fn cost(&mut self, i: usize, j: usize, entry: &CostEntry) {
        trace!(i, j, slope = entry.slope, intercept = entry.intercept, sqerr = entry.sqerr, "cost");
    }

    fn optimum(&mut self, j: usize, cost: f64, choice: usize) {
        trace!(j, cost, choice, "optimum");
    }

    fn segment(&mut self, segment: &Segment) {
        trace!(
            start = segment.start,
            end = segment.end,
            slope = segment.slope,
            intercept = segment.intercept,
            sqerr = segment.sqerr,
            "segment"
        );
    }
}
