/// Median by position: the element at index `len / 2` after a stable ascending sort.
///
/// No interpolation happens for an even count; the second of the two middle
/// values is selected. Returns `None` for an empty slice.
pub fn lower_median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(sorted[sorted.len() / 2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_count_picks_middle() {
        assert_eq!(lower_median(&[3.0, 1.0, 2.0]), Some(2.0));
    }

    #[test]
    fn even_count_picks_index_len_over_two() {
        assert_eq!(lower_median(&[4.0, 1.0, 3.0, 2.0]), Some(3.0));
    }

    #[test]
    fn single_and_empty() {
        assert_eq!(lower_median(&[7.5]), Some(7.5));
        assert_eq!(lower_median(&[]), None);
    }
}
