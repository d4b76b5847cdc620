use common::Segment;

use crate::cost::CostTable;
use crate::partition::Partition;

/// Rebuild the optimal segments from the recorded choices.
///
/// Walks back from `j = N` through `choice[j]`, then returns the segments left
/// to right. Ranges are contiguous and cover `1..=N` exactly once.
pub fn extract(partition: &Partition, table: &CostTable) -> Vec<Segment> {
    let choice = partition.choice();
    let mut segments = Vec::new();
    let mut j = partition.len();

    while j > 0 {
        let i = choice[j];
        let entry = table.get(i, j);
        segments.push(Segment {
            start: i,
            end: j,
            slope: entry.slope,
            intercept: entry.intercept,
            sqerr: entry.sqerr,
        });
        j = i - 1;
    }

    segments.reverse();
    segments
}
