use serde::Serialize;

use crate::{descriptive::DescriptiveStats, histogram::Histogram, percentiles::Percentiles};

/// Percentile points reported by default: quartiles plus the 5/95 tails.
pub const DEFAULT_PERCENTILES: [f64; 5] = [5.0, 25.0, 50.0, 75.0, 95.0];

/// Descriptive statistics, percentiles and histogram of one sample.
///
/// # Examples
///
/// ```
/// use covdi_stats::comprehensive::ComprehensiveStats;
///
/// let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
/// let stats = ComprehensiveStats::new(values, &[50.0], 3, None).unwrap();
///
/// assert_eq!(stats.stats.mean, 5.0);
/// assert_eq!(stats.percentiles.get(50.0), Some(5.0));
/// assert_eq!(stats.histogram.total(), 9);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComprehensiveStats {
    pub stats: DescriptiveStats,
    pub percentiles: Percentiles,
    pub histogram: Histogram,
}

impl ComprehensiveStats {
    /// Returns `None` when `values` is empty.
    #[must_use]
    pub fn new<I>(
        values: I,
        percentile_points: &[f64],
        hist_num_bins: usize,
        hist_bounds: Option<(f64, f64)>,
    ) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut sorted = values.into_iter().collect::<Vec<_>>();
        sorted.sort_by(f64::total_cmp);
        Self::from_sorted(&sorted, percentile_points, hist_num_bins, hist_bounds)
    }

    #[must_use]
    pub fn from_sorted(
        sorted_values: &[f64],
        percentile_points: &[f64],
        hist_num_bins: usize,
        hist_bounds: Option<(f64, f64)>,
    ) -> Option<Self> {
        let stats = DescriptiveStats::from_sorted(sorted_values)?;
        let percentiles = Percentiles::from_sorted(sorted_values, percentile_points);
        let histogram = Histogram::new(sorted_values.iter().copied(), hist_num_bins, hist_bounds);
        Some(Self {
            stats,
            percentiles,
            histogram,
        })
    }
}
