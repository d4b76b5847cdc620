use crate::cost::CostTable;

/// Dynamic-programming tables over every prefix of the series.
///
/// `opt[j]` is the minimum total cost of covering points `1..=j` and
/// `choice[j]` is the 1-based start of the last segment in that optimum.
/// Index 0 is the empty prefix: `opt[0] = 0`, `choice[0] = 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    opt: Vec<f64>,
    choice: Vec<usize>,
}

impl Partition {
    /// `opt[j] = segment_cost + min over i in 1..=j of (E(i, j) + opt[i - 1])`.
    ///
    /// Ties keep the smallest `i`. The first candidate is always accepted, so
    /// a choice exists even when every error is astronomically large.
    pub fn solve(table: &CostTable, segment_cost: f64) -> Self {
        let n = table.len();
        let mut opt = Vec::with_capacity(n + 1);
        let mut choice = Vec::with_capacity(n + 1);
        opt.push(0.0);
        choice.push(0);

        for j in 1..=n {
            let mut best_start = 1;
            let mut best = table.get(1, j).sqerr + opt[0];
            for i in 2..=j {
                let candidate = table.get(i, j).sqerr + opt[i - 1];
                if candidate < best {
                    best = candidate;
                    best_start = i;
                }
            }
            opt.push(best + segment_cost);
            choice.push(best_start);
        }

        Self { opt, choice }
    }

    /// Number of points covered (N).
    pub fn len(&self) -> usize {
        self.opt.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Minimal total cost of the whole series, `opt[N]`.
    pub fn total_cost(&self) -> f64 {
        self.opt[self.len()]
    }

    pub fn opt(&self) -> &[f64] {
        &self.opt
    }

    pub fn choice(&self) -> &[usize] {
        &self.choice
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefix::PrefixSums;
    use common::Point;

    fn solve(raw: &[(f64, f64)], c: f64) -> Partition {
        let points: Vec<Point> = raw.iter().map(|&(x, y)| Point::new(x, y)).collect();
        let prefix = PrefixSums::new(&points);
        Partition::solve(&CostTable::build(&points, &prefix), c)
    }

    #[test]
    fn empty_series_is_trivial() {
        let p = solve(&[], 3.0);
        assert!(p.is_empty());
        assert_eq!(p.opt(), &[0.0]);
        assert_eq!(p.choice(), &[0]);
        assert_eq!(p.total_cost(), 0.0);
    }

    #[test]
    fn penalty_charged_once_per_segment() {
        let p = solve(&[(1.0, 1.0), (2.0, 2.0), (3.0, 3.0)], 2.5);
        assert_eq!(p.choice(), &[0, 1, 1, 1]);
        assert!((p.total_cost() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn ties_keep_smallest_start() {
        // Both {1},{2,3} and {1,2},{3} cost 2C with zero error.
        let p = solve(&[(1.0, 0.0), (2.0, 5.0), (3.0, 0.0)], 1.0);
        assert_eq!(p.opt(), &[0.0, 1.0, 1.0, 2.0]);
        assert_eq!(p.choice()[3], 2);
    }

    #[test]
    fn choices_stay_in_range() {
        let p = solve(&[(1.0, 4.0), (2.0, -3.0), (3.0, 8.0), (4.0, 0.0), (5.0, 2.0)], 0.1);
        for (j, &i) in p.choice().iter().enumerate().skip(1) {
            assert!((1..=j).contains(&i), "choice[{j}] = {i}");
        }
    }
}
