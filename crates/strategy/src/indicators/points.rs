use common::Point;

/// Turn a value history into points, using each value's position as `x`.
pub fn to_points(history: &[f64]) -> Vec<Point> {
    history
        .iter()
        .enumerate()
        .map(|(i, &value)| Point::new(i as f64, value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_become_x() {
        let points = to_points(&[10.0, 12.5, 11.0]);
        assert_eq!(
            points,
            vec![Point::new(0.0, 10.0), Point::new(1.0, 12.5), Point::new(2.0, 11.0)]
        );
    }

    #[test]
    fn empty_history() {
        assert!(to_points(&[]).is_empty());
    }
}
