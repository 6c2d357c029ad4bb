//! Missing-value policies turning decoded records into resolved time series.
//!
//! Every policy except [`last_present`] preserves the length of its input.

use crate::record::Record;

/// Number of trailing samples inspected by [`recent_above`] (one week of daily data).
pub const RECENT_WINDOW: usize = 7;

/// Keeps absent records as `None`.
#[must_use]
pub fn as_optional<T>(records: &[Record<T>]) -> Vec<Option<T>>
where
    T: Copy,
{
    records.iter().map(|r| r.value()).collect()
}

/// Replaces absent records with `default`.
#[must_use]
pub fn with_default<T>(records: &[Record<T>], default: T) -> Vec<T>
where
    T: Copy,
{
    records
        .iter()
        .map(|r| r.value().unwrap_or(default))
        .collect()
}

/// Replaces absent records with the most recent present value, starting from `initial`.
///
/// # Examples
///
/// ```
/// use covdi_data::{policy, record::Record};
///
/// let records = [Record::absent(), Record::present(1.5_f64), Record::absent()];
/// assert_eq!(policy::forward_fill(&records, 0.0), vec![0.0, 1.5, 1.5]);
/// ```
#[must_use]
pub fn forward_fill<T>(records: &[Record<T>], initial: T) -> Vec<T>
where
    T: Copy,
{
    let mut last = initial;
    records
        .iter()
        .map(|r| {
            if let Some(value) = r.value() {
                last = value;
            }
            last
        })
        .collect()
}

/// Returns the last present value, or `None` when no record carries a value.
#[must_use]
pub fn last_present<T>(records: &[Record<T>]) -> Option<T>
where
    T: Copy,
{
    records.iter().rev().find_map(|r| r.value())
}

/// How absent numeric records are resolved when a dense series is needed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericFill {
    /// Substitute a literal value.
    Default(f64),
    /// Carry the previous value forward, starting from `0.0`.
    ForwardFill,
}

impl Default for NumericFill {
    fn default() -> Self {
        NumericFill::Default(0.0)
    }
}

impl NumericFill {
    #[must_use]
    pub fn resolve(self, records: &[Record<f64>]) -> Vec<f64> {
        match self {
            NumericFill::Default(value) => with_default(records, value),
            NumericFill::ForwardFill => forward_fill(records, 0.0),
        }
    }
}

/// Scans the last `window` values newest-first and returns the first one strictly greater
/// than `minimal`.
///
/// Daily series are often reported with a lag, so the most recent sample may be a placeholder
/// zero while the value from a few days earlier is meaningful.
#[must_use]
pub fn recent_above(values: &[f64], minimal: f64, window: usize) -> Option<f64> {
    values
        .iter()
        .rev()
        .take(window)
        .copied()
        .find(|&v| v > minimal)
}
