use std::cmp::Ordering;
use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A 2D sample. Sequences handed to the segmentation core must be ordered
/// non-decreasing by `x`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Total order on the `x` coordinate only.
    pub fn cmp_x(&self, other: &Point) -> Ordering {
        self.x.total_cmp(&other.x)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Stable sort by `x`. Points sharing an `x` keep their relative order.
pub fn sort_by_x(points: &mut [Point]) {
    points.sort_by(Point::cmp_x);
}

/// An owned point sequence that is known to be finite and ordered by `x`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PointSeries {
    points: Vec<Point>,
}

impl PointSeries {
    /// Validate an already-ordered sequence.
    pub fn new(points: Vec<Point>) -> Result<Self> {
        check_finite(&points)?;
        if let Some(k) = points
            .windows(2)
            .position(|w| w[1].cmp_x(&w[0]) == Ordering::Less)
        {
            return Err(Error::Unsorted { index: k + 2 });
        }
        Ok(Self { points })
    }

    /// Sort by `x`, then validate.
    pub fn sorted(mut points: Vec<Point>) -> Result<Self> {
        check_finite(&points)?;
        sort_by_x(&mut points);
        Ok(Self { points })
    }

    pub fn into_inner(self) -> Vec<Point> {
        self.points
    }
}

impl Deref for PointSeries {
    type Target = [Point];

    fn deref(&self) -> &[Point] {
        &self.points
    }
}

fn check_finite(points: &[Point]) -> Result<()> {
    match points.iter().position(|p| !p.is_finite()) {
        // 1-based, matching segment indices
        Some(i) => Err(Error::NonFinite { index: i + 1 }),
        None => Ok(()),
    }
}

/// One fitted piece of a segmentation.
///
/// `start` and `end` are 1-based, inclusive positions in the input series.
/// The fitted line is `y = slope * x + intercept` and `sqerr` is the sum of
/// squared vertical residuals of the covered points against it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    pub slope: f64,
    pub intercept: f64,
    pub sqerr: f64,
}

impl Segment {
    /// Number of points covered.
    pub fn len(&self) -> usize {
        self.end + 1 - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// Value of the fitted line at `x`.
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// The points of `series` this segment covers.
    pub fn points<'a>(&self, series: &'a [Point]) -> &'a [Point] {
        &series[self.start - 1..self.end]
    }

    /// 0-based `(first, last)` positions.
    pub fn index_pair(&self) -> (usize, usize) {
        (self.start - 1, self.end - 1)
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "y = {:.6} * x + {:.6} over #{}..=#{} (sqerr {:.6})",
            self.slope, self.intercept, self.start, self.end, self.sqerr
        )
    }
}

/// A closed price bar for one symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub timestamp: DateTime<Utc>,
}
