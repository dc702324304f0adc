//! Local extrema detection over a symmetric neighbourhood.

/// Indices whose value is strictly greater than every value within `order`
/// bars on each side. The first and last `order` bars are never reported.
pub fn local_maxima(values: &[f64], order: usize) -> Vec<usize> {
    scan(values, order, |center, other| center > other)
}

/// Indices whose value is strictly less than every value within `order`
/// bars on each side.
pub fn local_minima(values: &[f64], order: usize) -> Vec<usize> {
    scan(values, order, |center, other| center < other)
}

fn scan(values: &[f64], order: usize, beats: impl Fn(f64, f64) -> bool) -> Vec<usize> {
    let n = values.len();
    let order = order.max(1);
    if n < order * 2 + 1 {
        return Vec::new();
    }

    (order..n - order)
        .filter(|&i| {
            (1..=order).all(|j| beats(values[i], values[i - j]) && beats(values[i], values[i + j]))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_maxima_exact_indices() {
        let values = [1.0, 3.0, 2.0, 1.0, 4.0, 1.0, 0.5, 2.0, 1.0];
        assert_eq!(local_maxima(&values, 1), vec![1, 4, 7]);
        assert_eq!(local_maxima(&values, 2), vec![4]);
    }

    #[test]
    fn test_local_minima_exact_indices() {
        let values = [5.0, 4.0, 3.0, 4.0, 5.0, 4.0, 2.0, 4.0, 5.0];
        assert_eq!(local_minima(&values, 2), vec![2, 6]);
    }

    #[test]
    fn test_plateau_is_not_an_extremum() {
        let values = [1.0, 2.0, 3.0, 3.0, 2.0, 1.0];
        assert!(local_maxima(&values, 1).is_empty());
    }

    #[test]
    fn test_edges_excluded() {
        let values = [9.0, 1.0, 2.0, 1.0, 9.0];
        assert_eq!(local_maxima(&values, 1), vec![2]);
        assert!(local_maxima(&values, 2).is_empty());
    }

    #[test]
    fn test_too_short_series() {
        assert!(local_maxima(&[1.0, 2.0], 1).is_empty());
    }
}
