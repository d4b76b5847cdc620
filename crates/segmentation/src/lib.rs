//! Optimal segmentation of an ordered point sequence into contiguous
//! least-squares line fits.
//!
//! The total cost of a partition is the sum of each piece's squared error
//! plus a fixed penalty per piece. [`Segmenter`] finds a partition of minimum
//! total cost with the classic segmented least squares dynamic program:
//!
//! 1. [`PrefixSums`] — cumulative Σx, Σy, Σxy, Σx² for O(1) interval statistics.
//! 2. [`CostTable`] — best-fit line and squared error of every interval.
//! 3. [`Partition`] — minimal cost of every prefix and the start of its last piece.
//! 4. [`extract`] — backward walk over those choices into ordered [`Segment`]s.
//!
//! ```
//! use common::Point;
//! use segmentation::Segmenter;
//!
//! let points: Vec<Point> = (1..=4).map(|i| Point::new(i as f64, i as f64)).collect();
//! let result = Segmenter::new(1.0).segment(&points);
//! assert_eq!(result.segments.len(), 1);
//! assert_eq!((result.segments[0].start, result.segments[0].end), (1, 4));
//! ```

pub mod cost;
pub mod extract;
pub mod partition;
pub mod prefix;
pub mod segmenter;
pub mod trace;

pub use cost::{CostEntry, CostTable, FillPool, LineFit, VERTICAL_SLOPE_SENTINEL};
pub use extract::extract;
pub use partition::Partition;
pub use prefix::{IntervalStats, PrefixSums};
pub use segmenter::{segment, Segmentation, Segmenter};
pub use trace::{NoTrace, SegmentationTrace, TracingTrace};

pub use common::{Point, Segment};
