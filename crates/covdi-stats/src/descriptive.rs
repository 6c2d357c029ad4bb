use serde::Serialize;

/// Summary of a sample: extremes, central tendency and spread.
///
/// `variance` and `std_dev` are population measures (divided by `n`); the `sample_*` fields use
/// Bessel's correction and are `NaN` for a single value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Mean of the two middle values for an even count.
    pub median: f64,
    pub variance: f64,
    pub std_dev: f64,
    pub sample_variance: f64,
    pub sample_std_dev: f64,
}

impl DescriptiveStats {
    /// Computes the summary of unsorted values, or `None` when there are none.
    ///
    /// # Examples
    ///
    /// ```
    /// # use covdi_stats::descriptive::DescriptiveStats;
    /// let stats = DescriptiveStats::new([4.0, 1.0, 3.0, 2.0]).unwrap();
    /// assert_eq!(stats.min, 1.0);
    /// assert_eq!(stats.max, 4.0);
    /// assert_eq!(stats.mean, 2.5);
    /// assert_eq!(stats.median, 2.5);
    /// assert!(DescriptiveStats::new([]).is_none());
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut values = values.into_iter().collect::<Vec<_>>();
        values.sort_by(f64::total_cmp);
        Self::from_sorted(&values)
    }

    /// Same as [`DescriptiveStats::new`] for values already sorted in ascending order.
    ///
    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64]) -> Option<Self> {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let min = *sorted_values.first()?;
        let max = *sorted_values.last()?;
        let count = sorted_values.len();
        let n = count as f64;
        let mean = mean(sorted_values)?;
        let mid = count / 2;
        let median = if count % 2 == 0 {
            f64::midpoint(sorted_values[mid - 1], sorted_values[mid])
        } else {
            sorted_values[mid]
        };
        let sum_sq = sorted_values
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>();
        let variance = sum_sq / n;
        let sample_variance = if count > 1 { sum_sq / (n - 1.0) } else { f64::NAN };

        Some(Self {
            count,
            min,
            max,
            mean,
            median,
            variance,
            std_dev: variance.sqrt(),
            sample_variance,
            sample_std_dev: sample_variance.sqrt(),
        })
    }
}

/// Arithmetic mean, or `None` for an empty slice.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_odd_count_median() {
        let stats = DescriptiveStats::new([5.0, 1.0, 3.0]).unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.median, 3.0);
    }

    #[test]
    fn test_variances() {
        let stats = DescriptiveStats::new([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.variance, 4.0);
        assert_eq!(stats.std_dev, 2.0);
        assert!((stats.sample_variance - 32.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_value() {
        let stats = DescriptiveStats::new([3.5]).unwrap();
        assert_eq!(stats.variance, 0.0);
        assert!(stats.sample_variance.is_nan());
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[1.0, 2.0, 6.0]), Some(3.0));
        assert_eq!(mean(&[]), None);
    }
}
