pub struct Statistics;

impl Statistics {
    /// Exact integer sum; counts never go through floating point.
    pub fn sum(values: impl IntoIterator<Item = u32>) -> u64 {
        values.into_iter().map(u64::from).sum()
    }

    pub fn min_max<T: Ord + Copy>(values: impl IntoIterator<Item = T>) -> Option<(T, T)> {
        let mut iter = values.into_iter();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

#[cfg(test)]
mod tests {
    use super::Statistics;

    #[test]
    fn sum_is_exact_for_large_counts() {
        assert_eq!(Statistics::sum([u32::MAX, u32::MAX, 2]), 2 * u32::MAX as u64 + 2);
        assert_eq!(Statistics::sum([]), 0);
    }

    #[test]
    fn min_max_of_years() {
        assert_eq!(Statistics::min_max([1905, 1902, 1910]), Some((1902, 1910)));
        assert_eq!(Statistics::min_max(Vec::<i32>::new()), None);
    }
}
