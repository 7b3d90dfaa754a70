use nalgebra::Vector2;

/// Default fraction of the largest displacements kept by [`robust_displacement`].
pub const DEFAULT_KEEP_RATIO: f64 = 0.5;

/// Reduce index-aligned point correspondences to one representative pixel displacement.
///
/// The euclidean distance of every pair is computed and sorted ascending. The smallest
/// `1 - keep_ratio` fraction is discarded as near-stationary noise and the mean of the
/// remaining (largest) distances is returned.
///
/// Returns exactly `0.0` when there are no pairs or when the cutoff leaves nothing to average.
pub fn robust_displacement(source: &[Vector2<f64>], target: &[Vector2<f64>], keep_ratio: f64) -> f64 {
    debug_assert_eq!(source.len(), target.len());

    let mut distances: Vec<f64> = source
        .iter()
        .zip(target)
        .map(|(a, b)| (a - b).norm())
        .collect();

    if distances.is_empty() {
        return 0.0;
    }

    // stable, so equal distances keep their input order
    distances.sort_by(f64::total_cmp);

    let cutoff = ((distances.len() as f64 * (1.0 - keep_ratio)) as usize).min(distances.len());
    let retained = &distances[cutoff..];
    if retained.is_empty() {
        return 0.0;
    }

    retained.iter().sum::<f64>() / retained.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn points(coords: &[(f64, f64)]) -> Vec<Vector2<f64>> {
        coords.iter().map(|&(x, y)| Vector2::new(x, y)).collect()
    }

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(robust_displacement(&[], &[], DEFAULT_KEEP_RATIO), 0.0);
    }

    #[test]
    fn keeps_largest_half() {
        let source = points(&[(0.0, 0.0), (0.0, 0.0), (0.0, 0.0), (0.0, 0.0)]);
        let target = points(&[(1.0, 0.0), (4.0, 0.0), (2.0, 0.0), (8.0, 0.0)]);
        assert_abs_diff_eq!(robust_displacement(&source, &target, 0.5), 6.0);
    }

    #[test]
    fn odd_count_truncates_cutoff() {
        // int(3 * 0.5) = 1 discarded
        let source = points(&[(0.0, 0.0), (0.0, 0.0), (0.0, 0.0)]);
        let target = points(&[(0.0, 3.0), (0.0, 1.0), (0.0, 5.0)]);
        assert_abs_diff_eq!(robust_displacement(&source, &target, 0.5), 4.0);
    }

    #[test]
    fn non_positive_keep_ratio_is_degenerate() {
        let source = points(&[(0.0, 0.0)]);
        let target = points(&[(3.0, 4.0)]);
        assert_eq!(robust_displacement(&source, &target, 0.0), 0.0);
    }
}
