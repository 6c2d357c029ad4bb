use std::ops::Range;

use serde::Serialize;

/// Equal-width histogram over a closed value range.
///
/// Every bin is half-open except the last, which also holds values equal to the upper bound.
/// Values outside the range are not counted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub range: Range<f64>,
    pub count: u64,
}

impl Histogram {
    /// Bins `values` into `num_bins` bins spanning `bounds`, or the data range when `None`.
    ///
    /// A degenerate range (all values equal) is widened to `value ± 0.5`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use covdi_stats::histogram::Histogram;
    /// let histogram = Histogram::new([1.0, 2.0, 2.5, 4.0, 5.0], 4, None);
    /// let counts = histogram.bins.iter().map(|b| b.count).collect::<Vec<_>>();
    /// assert_eq!(counts, [1, 2, 0, 2]);
    /// assert_eq!(histogram.bins[0].range, 1.0..2.0);
    /// ```
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_sign_loss,
        clippy::cast_possible_truncation
    )]
    #[must_use]
    pub fn new<I>(values: I, num_bins: usize, bounds: Option<(f64, f64)>) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let values = values
            .into_iter()
            .filter(|v| v.is_finite())
            .collect::<Vec<_>>();
        if num_bins == 0 {
            return Self { bins: vec![] };
        }
        let (mut lo, mut hi) = match bounds {
            Some(bounds) => bounds,
            None => {
                if values.is_empty() {
                    return Self { bins: vec![] };
                }
                values
                    .iter()
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                        (lo.min(v), hi.max(v))
                    })
            }
        };
        if hi <= lo {
            lo -= 0.5;
            hi += 0.5;
        }

        let width = (hi - lo) / num_bins as f64;
        // Edges are recomputed from the index to avoid accumulating rounding errors.
        let edge = |i: usize| if i == num_bins { hi } else { lo + width * i as f64 };
        let mut bins = (0..num_bins)
            .map(|i| HistogramBin {
                range: edge(i)..edge(i + 1),
                count: 0,
            })
            .collect::<Vec<_>>();
        for v in values {
            if v < lo || v > hi {
                continue;
            }
            let idx = (((v - lo) / width).floor() as usize).min(num_bins - 1);
            bins[idx].count += 1;
        }
        Self { bins }
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.bins.iter().map(|b| b.count).sum()
    }

    /// Renders one line per bin: its lower edge, count and a bar scaled to `bar_width`.
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_sign_loss,
        clippy::cast_possible_truncation
    )]
    #[must_use]
    pub fn render(&self, bar_width: usize) -> String {
        let max = self.bins.iter().map(|b| b.count).max().unwrap_or(0);
        let mut out = String::new();
        for bin in &self.bins {
            let len = if max == 0 {
                0
            } else {
                ((bin.count as f64 / max as f64) * bar_width as f64).round() as usize
            };
            out.push_str(&format!(
                "{:>14.4} | {:>7} | {}\n",
                bin.range.start,
                bin.count,
                "#".repeat(len)
            ));
        }
        out
    }
}
