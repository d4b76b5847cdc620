use common::Point;

/// Cumulative sums of x, y, x·y and x² over a point sequence.
///
/// Each vector has `N + 1` entries: index 0 is zero and index `k` holds the
/// sum over the first `k` points, so any interval sum is one subtraction.
///
/// All sums are `f64`. For integer coordinates the results stay exact while
/// Σx² and |Σxy| remain below 2^53 (about 9.007e15); beyond that, or for large
/// fractional magnitudes, interval sums lose low-order digits through
/// cancellation. Shift `x` toward zero (e.g. bar index instead of epoch
/// seconds) when feeding long or far-from-origin series.
#[derive(Debug, Clone, PartialEq)]
pub struct PrefixSums {
    x: Vec<f64>,
    y: Vec<f64>,
    xy: Vec<f64>,
    xx: Vec<f64>,
}

/// Sufficient statistics of the points `i..=j`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IntervalStats {
    pub count: usize,
    pub sum_x: f64,
    pub sum_y: f64,
    pub sum_xy: f64,
    pub sum_xx: f64,
}

impl PrefixSums {
    pub fn new(points: &[Point]) -> Self {
        let n = points.len();
        let mut sums = Self {
            x: Vec::with_capacity(n + 1),
            y: Vec::with_capacity(n + 1),
            xy: Vec::with_capacity(n + 1),
            xx: Vec::with_capacity(n + 1),
        };
        let (mut x, mut y, mut xy, mut xx) = (0.0, 0.0, 0.0, 0.0);
        sums.push(x, y, xy, xx);
        for p in points {
            x += p.x;
            y += p.y;
            xy += p.x * p.y;
            xx += p.x * p.x;
            sums.push(x, y, xy, xx);
        }
        sums
    }

    fn push(&mut self, x: f64, y: f64, xy: f64, xx: f64) {
        self.x.push(x);
        self.y.push(y);
        self.xy.push(xy);
        self.xx.push(xx);
    }

    /// Number of points summed (N).
    pub fn len(&self) -> usize {
        self.x.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Statistics for the 1-based inclusive interval `i..=j`.
    pub fn interval(&self, i: usize, j: usize) -> IntervalStats {
        debug_assert!(1 <= i && i <= j && j <= self.len(), "bad interval {i}..={j}");
        IntervalStats {
            count: j - i + 1,
            sum_x: self.x[j] - self.x[i - 1],
            sum_y: self.y[j] - self.y[i - 1],
            sum_xy: self.xy[j] - self.xy[i - 1],
            sum_xx: self.xx[j] - self.xx[i - 1],
        }
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn xy(&self) -> &[f64] {
        &self.xy
    }

    pub fn xx(&self) -> &[f64] {
        &self.xx
    }
}
