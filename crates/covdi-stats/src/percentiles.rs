use serde::Serialize;

/// Percentile values precomputed for a fixed set of percentile points.
///
/// # Examples
///
/// ```
/// use covdi_stats::percentiles::Percentiles;
///
/// let values = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let percentiles = Percentiles::new(&values, &[25.0, 50.0, 90.0]);
///
/// assert_eq!(percentiles.get(25.0), Some(2.0));
/// assert_eq!(percentiles.get(50.0), Some(3.0));
/// assert_eq!(percentiles.get(10.0), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Percentiles {
    /// `(percentile, value)` pairs in the order the points were given.
    values: Vec<(f64, f64)>,
}

impl Percentiles {
    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order.
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64], percentile_points: &[f64]) -> Self {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let values = percentile_points
            .iter()
            .map(|&p| (p, compute_percentile(sorted_values, p)))
            .collect();
        Self { values }
    }

    #[must_use]
    pub fn new(values: &[f64], percentile_points: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Self::from_sorted(&sorted, percentile_points)
    }

    /// Value at `percentile`, if it was one of the precomputed points.
    #[must_use]
    pub fn get(&self, percentile: f64) -> Option<f64> {
        self.values
            .iter()
            .find(|(p, _)| (*p - percentile).abs() < f64::EPSILON)
            .map(|&(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.values.iter().copied()
    }
}

/// Percentile of sorted data by linear interpolation between the closest ranks.
///
/// The `p`-th percentile sits at fractional position `p / 100 * (n - 1)`. Returns `NaN` for an
/// empty slice; `percentile` is clamped to `0..=100`.
///
/// # Examples
///
/// ```
/// use covdi_stats::percentiles::compute_percentile;
///
/// let values = [10.0, 20.0, 30.0, 40.0];
/// assert_eq!(compute_percentile(&values, 0.0), 10.0);
/// assert_eq!(compute_percentile(&values, 50.0), 25.0);
/// assert_eq!(compute_percentile(&values, 100.0), 40.0);
/// ```
#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]
#[must_use]
pub fn compute_percentile(sorted_values: &[f64], percentile: f64) -> f64 {
    if sorted_values.is_empty() {
        return f64::NAN;
    }
    let last = sorted_values.len() - 1;
    let pos = percentile.clamp(0.0, 100.0) / 100.0 * last as f64;
    let lower = pos.floor() as usize;
    let upper = (lower + 1).min(last);
    let frac = pos - lower as f64;
    sorted_values[lower] + (sorted_values[upper] - sorted_values[lower]) * frac
}
