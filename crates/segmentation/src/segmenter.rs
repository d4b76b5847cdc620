use common::{Config, Point, Segment};
use serde::Serialize;
use tracing::debug;

use crate::cost::{CostTable, FillPool};
use crate::extract::extract;
use crate::partition::Partition;
use crate::prefix::PrefixSums;
use crate::trace::{NoTrace, SegmentationTrace};

/// Result of one segmentation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segmentation {
    /// Ordered, disjoint segments covering every input position.
    pub segments: Vec<Segment>,
    /// Sum of segment errors plus one penalty per segment (`OPT[N]`).
    pub total_cost: f64,
}

impl Segmentation {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The rightmost segment, i.e. the one ending at the latest point.
    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Total squared error, without the per-segment penalties.
    pub fn total_sqerr(&self) -> f64 {
        self.segments.iter().map(|s| s.sqerr).sum()
    }
}

/// Segmented least squares with a fixed per-segment cost.
///
/// Every call builds its tables from scratch and keeps nothing afterwards, so
/// a `Segmenter` can be shared freely and re-run at will. The only state kept
/// between calls is the cost-table [`FillPool`].
#[derive(Debug, Clone, PartialEq)]
pub struct Segmenter {
    segment_cost: f64,
    pool: FillPool,
}

impl Segmenter {
    /// Any finite `segment_cost` is accepted. Values at or below zero favour
    /// ever finer partitions.
    pub fn new(segment_cost: f64) -> Self {
        Self {
            segment_cost,
            pool: FillPool::sequential(),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.segment_cost).with_threads(cfg.threads)
    }

    /// Threads used to fill the cost table (needs the `parallel` feature).
    /// The workers are started here and reused by every call.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.pool = FillPool::new(threads);
        self
    }

    pub fn segment_cost(&self) -> f64 {
        self.segment_cost
    }

    pub fn threads(&self) -> usize {
        self.pool.threads()
    }

    pub fn pool(&self) -> &FillPool {
        &self.pool
    }

    /// Segment `points`, which must be ordered non-decreasing by `x`.
    pub fn segment(&self, points: &[Point]) -> Segmentation {
        self.segment_traced(points, &mut NoTrace)
    }

    /// Like [`Segmenter::segment`], reporting intermediate tables to `trace`.
    pub fn segment_traced<T>(&self, points: &[Point], trace: &mut T) -> Segmentation
    where
        T: SegmentationTrace + ?Sized,
    {
        let prefix = PrefixSums::new(points);
        trace.prefix(&prefix);

        let table = CostTable::build_in(points, &prefix, &self.pool);
        for (i, j, entry) in table.iter() {
            trace.cost(i, j, entry);
        }

        let partition = Partition::solve(&table, self.segment_cost);
        for j in 1..=partition.len() {
            trace.optimum(j, partition.opt()[j], partition.choice()[j]);
        }

        let segments = extract(&partition, &table);
        for segment in &segments {
            trace.segment(segment);
        }

        let total_cost = partition.total_cost();
        debug!(
            points = points.len(),
            segments = segments.len(),
            segment_cost = self.segment_cost,
            total_cost,
            "Segmentation complete"
        );

        Segmentation {
            segments,
            total_cost,
        }
    }
}

/// Segment `points` with the given per-segment cost.
pub fn segment(points: &[Point], segment_cost: f64) -> Vec<Segment> {
    Segmenter::new(segment_cost).segment(points).segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        prefixes: usize,
        cells: usize,
        optima: Vec<(usize, usize)>,
        segments: Vec<(usize, usize)>,
    }

    impl SegmentationTrace for Recorder {
        fn prefix(&mut self, sums: &PrefixSums) {
            self.prefixes = sums.len();
        }

        fn cost(&mut self, _i: usize, _j: usize, _entry: &crate::CostEntry) {
            self.cells += 1;
        }

        fn optimum(&mut self, j: usize, _cost: f64, choice: usize) {
            self.optima.push((j, choice));
        }

        fn segment(&mut self, segment: &Segment) {
            self.segments.push((segment.start, segment.end));
        }
    }

    fn points(raw: &[(f64, f64)]) -> Vec<Point> {
        raw.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn trace_sees_every_stage() {
        let pts = points(&[(1.0, 0.0), (2.0, 0.0), (3.0, 10.0), (4.0, 20.0)]);
        let mut recorder = Recorder::default();
        let traced = Segmenter::new(1.0).segment_traced(&pts, &mut recorder);

        assert_eq!(recorder.prefixes, 4);
        assert_eq!(recorder.cells, 10);
        assert_eq!(recorder.optima.len(), 4);
        let expected: Vec<(usize, usize)> =
            traced.segments.iter().map(|s| (s.start, s.end)).collect();
        assert_eq!(recorder.segments, expected);
    }

    #[test]
    fn trace_does_not_change_result() {
        let pts = points(&[(1.0, 3.0), (2.0, -1.0), (3.0, 4.0), (4.0, 4.0), (5.0, 9.0)]);
        let segmenter = Segmenter::new(0.5);
        let plain = segmenter.segment(&pts);
        let traced = segmenter.segment_traced(&pts, &mut crate::TracingTrace);
        assert_eq!(plain, traced);
    }

    #[test]
    fn threads_are_clamped() {
        assert_eq!(Segmenter::new(1.0).with_threads(0).threads(), 1);
    }

    #[test]
    fn repeated_runs_share_one_pool() {
        let segmenter = Segmenter::new(0.5).with_threads(2);
        assert_eq!(segmenter.pool().is_parallel(), cfg!(feature = "parallel"));
        let pts = points(&[(1.0, 0.0), (2.0, 1.0), (3.0, 5.0), (4.0, 9.0), (5.0, 9.5)]);
        let first = segmenter.segment(&pts);
        assert_eq!(first, segmenter.segment(&pts));
        assert_eq!(first, Segmenter::new(0.5).segment(&pts));
    }

    #[test]
    fn from_config_copies_settings() {
        let cfg = Config {
            segment_cost: 7.5,
            threads: 3,
            ..Config::default()
        };
        let segmenter = Segmenter::from_config(&cfg);
        assert_eq!(segmenter.segment_cost(), 7.5);
        assert_eq!(segmenter.threads(), 3);
    }

    #[test]
    fn free_function_matches_facade() {
        let pts = points(&[(1.0, 1.0), (2.0, 1.0), (3.0, 1.0)]);
        assert_eq!(segment(&pts, 5.0), Segmenter::new(5.0).segment(&pts).segments);
    }

    #[test]
    fn summary_helpers() {
        let pts = points(&[(1.0, 0.0), (2.0, 0.0), (3.0, 0.0), (4.0, 100.0)]);
        let result = Segmenter::new(0.01).segment(&pts);
        assert!(result.len() >= 2);
        assert_eq!(result.last().map(|s| s.end), Some(4));
        assert!(result.total_sqerr() < 1e-9);
    }
}
