use common::Point;
use tracing::debug;

use crate::prefix::{IntervalStats, PrefixSums};

/// Slope reported when the least-squares slope is undefined (zero spread in
/// x with a non-zero covariance numerator). A large finite stand-in for a
/// vertical line, not a real slope: downstream angle comparisons treat it as
/// "nearly vertical" rather than propagating infinities.
pub const VERTICAL_SLOPE_SENTINEL: f64 = 99_999_999_999_999.0;

/// A fitted line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LineFit {
    /// Ordinary least-squares fit from interval statistics.
    ///
    /// A zero numerator yields a flat line (this covers single points), a zero
    /// denominator yields [`VERTICAL_SLOPE_SENTINEL`].
    pub fn from_stats(stats: &IntervalStats) -> Self {
        debug_assert!(stats.count > 0, "fit over an empty interval");
        let n = stats.count as f64;
        let numerator = n * stats.sum_xy - stats.sum_x * stats.sum_y;

        let slope = if numerator == 0.0 {
            0.0
        } else {
            let denominator = n * stats.sum_xx - stats.sum_x * stats.sum_x;
            if denominator == 0.0 {
                VERTICAL_SLOPE_SENTINEL
            } else {
                numerator / denominator
            }
        };

        LineFit {
            slope,
            intercept: (stats.sum_y - slope * stats.sum_x) / n,
        }
    }

    pub fn residual(&self, p: &Point) -> f64 {
        p.y - self.slope * p.x - self.intercept
    }

    /// Sum of squared vertical residuals of `points` against this line.
    pub fn sqerr(&self, points: &[Point]) -> f64 {
        points
            .iter()
            .map(|p| {
                let r = self.residual(p);
                r * r
            })
            .sum()
    }
}

/// Best fit and its error for one interval.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CostEntry {
    pub slope: f64,
    pub intercept: f64,
    pub sqerr: f64,
}

impl CostEntry {
    /// Fit the 1-based interval `i..=j` of `points`.
    pub fn evaluate(points: &[Point], prefix: &PrefixSums, i: usize, j: usize) -> Self {
        let fit = LineFit::from_stats(&prefix.interval(i, j));
        CostEntry {
            slope: fit.slope,
            intercept: fit.intercept,
            sqerr: fit.sqerr(&points[i - 1..j]),
        }
    }

    pub fn line(&self) -> LineFit {
        LineFit {
            slope: self.slope,
            intercept: self.intercept,
        }
    }
}

/// Fits for every interval `(i, j)` with `1 <= i <= j <= N`.
///
/// Stored as one flat `N * N` arena, row `i` at offset `(i - 1) * N`. Cells
/// below the diagonal are never read.
#[derive(Debug, Clone)]
pub struct CostTable {
    n: usize,
    cells: Vec<CostEntry>,
}

impl CostTable {
    /// Sequential fill. O(N^3): every interval sums its residuals directly.
    pub fn build(points: &[Point], prefix: &PrefixSums) -> Self {
        let mut table = Self::zeroed(points.len());
        for (r, row) in table.rows_mut().enumerate() {
            fill_row(points, prefix, r + 1, row);
        }
        table
    }

    /// Fill with up to `threads` workers. Identical output to [`CostTable::build`].
    ///
    /// Starts a pool for this one fill; use [`CostTable::build_in`] with a kept
    /// [`FillPool`] when filling repeatedly.
    pub fn build_with_threads(points: &[Point], prefix: &PrefixSums, threads: usize) -> Self {
        Self::build_in(points, prefix, &FillPool::new(threads))
    }

    /// Fill on `pool`. Rows only read the prefix sums, so they are filled
    /// independently. A sequential pool, or a build without the `parallel`
    /// feature, gives the sequential fill.
    pub fn build_in(points: &[Point], prefix: &PrefixSums, pool: &FillPool) -> Self {
        #[cfg(feature = "parallel")]
        {
            if let Some(workers) = pool.workers.as_deref() {
                if points.len() >= 2 {
                    return fill_parallel(workers, points, prefix);
                }
            }
        }
        #[cfg(not(feature = "parallel"))]
        {
            if pool.threads > 1 {
                debug!(
                    threads = pool.threads,
                    "Built without the `parallel` feature, filling sequentially"
                );
            }
        }
        Self::build(points, prefix)
    }

    fn zeroed(n: usize) -> Self {
        Self {
            n,
            cells: vec![CostEntry::default(); n * n],
        }
    }

    fn rows_mut(&mut self) -> std::slice::ChunksMut<'_, CostEntry> {
        // chunks_mut panics on a zero chunk size; an empty arena yields no rows
        self.cells.chunks_mut(self.n.max(1))
    }

    /// Number of points (N).
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    #[inline]
    fn offset(&self, i: usize, j: usize) -> usize {
        (i - 1) * self.n + (j - 1)
    }

    /// Entry for the 1-based inclusive interval `i..=j`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> &CostEntry {
        debug_assert!(1 <= i && i <= j && j <= self.n, "bad interval {i}..={j}");
        &self.cells[self.offset(i, j)]
    }

    /// Every filled cell in row-major order as `(i, j, entry)`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &CostEntry)> + '_ {
        (1..=self.n).flat_map(move |i| (i..=self.n).map(move |j| (i, j, self.get(i, j))))
    }
}

fn fill_row(points: &[Point], prefix: &PrefixSums, i: usize, row: &mut [CostEntry]) {
    for j in i..=points.len() {
        row[j - 1] = CostEntry::evaluate(points, prefix, i, j);
    }
}

/// Worker threads for filling cost tables, started once and reused.
///
/// Cloning shares the same workers.
#[derive(Clone, Default)]
pub struct FillPool {
    threads: usize,
    #[cfg(feature = "parallel")]
    workers: Option<std::sync::Arc<rayon::ThreadPool>>,
}

impl FillPool {
    /// `threads` is clamped to at least 1. With one thread no workers are started.
    pub fn new(threads: usize) -> Self {
        let threads = threads.max(1);
        Self {
            threads,
            #[cfg(feature = "parallel")]
            workers: start_workers(threads),
        }
    }

    pub fn sequential() -> Self {
        Self::new(1)
    }

    pub fn threads(&self) -> usize {
        self.threads.max(1)
    }

    /// Whether fills on this pool actually run on worker threads.
    pub fn is_parallel(&self) -> bool {
        #[cfg(feature = "parallel")]
        {
            self.workers.is_some()
        }
        #[cfg(not(feature = "parallel"))]
        {
            false
        }
    }
}

impl std::fmt::Debug for FillPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FillPool")
            .field("threads", &self.threads())
            .field("parallel", &self.is_parallel())
            .finish()
    }
}

impl PartialEq for FillPool {
    fn eq(&self, other: &Self) -> bool {
        self.threads() == other.threads()
    }
}

#[cfg(feature = "parallel")]
fn start_workers(threads: usize) -> Option<std::sync::Arc<rayon::ThreadPool>> {
    if threads <= 1 {
        return None;
    }
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => {
            debug!(threads, "Started cost-table pool");
            Some(std::sync::Arc::new(pool))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Could not start cost-table pool, filling sequentially");
            None
        }
    }
}

#[cfg(feature = "parallel")]
fn fill_parallel(workers: &rayon::ThreadPool, points: &[Point], prefix: &PrefixSums) -> CostTable {
    use rayon::prelude::*;

    let mut table = CostTable::zeroed(points.len());
    let n = table.n;
    workers.install(|| {
        table
            .cells
            .par_chunks_mut(n)
            .enumerate()
            .for_each(|(r, row)| fill_row(points, prefix, r + 1, row));
    });
    debug!(rows = n, threads = workers.current_num_threads(), "Cost table filled in parallel");
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[(f64, f64)]) -> Vec<Point> {
        raw.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn single_point_is_flat_with_zero_error() {
        let points = pts(&[(3.0, 5.0)]);
        let prefix = PrefixSums::new(&points);
        let entry = CostEntry::evaluate(&points, &prefix, 1, 1);
        assert_eq!(entry.slope, 0.0);
        assert_eq!(entry.intercept, 5.0);
        assert_eq!(entry.sqerr, 0.0);
    }

    #[test]
    fn exact_line() {
        let points = pts(&[(1.0, 3.0), (2.0, 5.0), (3.0, 7.0)]);
        let prefix = PrefixSums::new(&points);
        let entry = CostEntry::evaluate(&points, &prefix, 1, 3);
        assert!((entry.slope - 2.0).abs() < 1e-12);
        assert!((entry.intercept - 1.0).abs() < 1e-12);
        assert!(entry.sqerr.abs() < 1e-12);
    }

    #[test]
    fn noisy_fit_matches_hand_computation() {
        // x̄ = 2, ȳ = 2/3, Sxy = -1, Sxx = 2 → slope -0.5, intercept 5/3
        let points = pts(&[(1.0, 1.0), (2.0, 1.0), (3.0, 0.0)]);
        let prefix = PrefixSums::new(&points);
        let entry = CostEntry::evaluate(&points, &prefix, 1, 3);
        assert!((entry.slope + 0.5).abs() < 1e-12);
        assert!((entry.intercept - 5.0 / 3.0).abs() < 1e-12);
        // residuals -1/6, 1/3, -1/6
        assert!((entry.sqerr - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn identical_x_has_zero_numerator() {
        let points = pts(&[(2.0, 1.0), (2.0, 5.0)]);
        let prefix = PrefixSums::new(&points);
        let entry = CostEntry::evaluate(&points, &prefix, 1, 2);
        assert_eq!(entry.slope, 0.0);
        assert_eq!(entry.intercept, 3.0);
        assert_eq!(entry.sqerr, 8.0);
    }

    #[test]
    fn zero_denominator_uses_sentinel() {
        let stats = IntervalStats {
            count: 2,
            sum_x: 4.0,
            sum_y: 6.0,
            sum_xy: 13.0,
            sum_xx: 8.0,
        };
        let fit = LineFit::from_stats(&stats);
        assert_eq!(fit.slope, VERTICAL_SLOPE_SENTINEL);
        assert_eq!(fit.intercept, (6.0 - VERTICAL_SLOPE_SENTINEL * 4.0) / 2.0);
    }

    #[test]
    fn table_covers_upper_triangle() {
        let points = pts(&[(1.0, 1.0), (2.0, 4.0), (3.0, 9.0), (4.0, 16.0)]);
        let prefix = PrefixSums::new(&points);
        let table = CostTable::build(&points, &prefix);
        assert_eq!(table.len(), 4);
        assert_eq!(table.iter().count(), 10);
        for (i, j, entry) in table.iter() {
            assert_eq!(*entry, CostEntry::evaluate(&points, &prefix, i, j));
            assert!(entry.sqerr >= 0.0);
        }
    }

    #[test]
    fn threaded_build_matches_sequential() {
        let points: Vec<Point> = (0..40)
            .map(|i| Point::new(i as f64, ((i * 37) % 11) as f64 - 5.0))
            .collect();
        let prefix = PrefixSums::new(&points);
        let seq = CostTable::build(&points, &prefix);
        let par = CostTable::build_with_threads(&points, &prefix, 4);
        for (i, j, entry) in seq.iter() {
            assert_eq!(entry, par.get(i, j));
        }
    }

    #[test]
    fn kept_pool_is_reused_across_fills() {
        let pool = FillPool::new(3);
        assert_eq!(pool.threads(), 3);
        assert_eq!(pool.is_parallel(), cfg!(feature = "parallel"));

        let shared = pool.clone();
        for len in [2usize, 9, 25] {
            let points: Vec<Point> = (0..len)
                .map(|i| Point::new(i as f64, ((i * 13) % 7) as f64))
                .collect();
            let prefix = PrefixSums::new(&points);
            let seq = CostTable::build(&points, &prefix);
            let par = CostTable::build_in(&points, &prefix, &shared);
            for (i, j, entry) in seq.iter() {
                assert_eq!(entry, par.get(i, j));
            }
        }
    }

    #[test]
    fn single_thread_pool_starts_no_workers() {
        let pool = FillPool::new(0);
        assert_eq!(pool.threads(), 1);
        assert!(!pool.is_parallel());
        assert_eq!(pool, FillPool::sequential());
    }

    #[test]
    fn empty_table() {
        let table = CostTable::build(&[], &PrefixSums::new(&[]));
        assert!(table.is_empty());
        assert_eq!(table.iter().count(), 0);
    }
}
