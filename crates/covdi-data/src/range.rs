//! Index bounds for slicing date-aligned series to a calendar range.

use crate::record::RecordDate;

/// Which match wins when a target date occurs more than once in a sequence.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    #[default]
    FirstMatch,
    /// Keep overwriting on every match, so the last occurrence wins.
    LastMatch,
}

/// Something that may hold a date: a resolved date, or an optional one.
pub trait AsRecordDate {
    fn as_record_date(&self) -> Option<RecordDate>;
}

impl AsRecordDate for RecordDate {
    fn as_record_date(&self) -> Option<RecordDate> {
        Some(*self)
    }
}

impl AsRecordDate for Option<RecordDate> {
    fn as_record_date(&self) -> Option<RecordDate> {
        *self
    }
}

/// Inclusive index bounds `start..=end` into a date-aligned sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: usize,
    pub end: usize,
}

impl DateRange {
    /// Locates `start` and `stop` in `dates` with a single linear scan.
    ///
    /// An absent target, or one that never occurs, leaves the bound at the beginning or the end
    /// of the sequence. Returns `None` for an empty sequence.
    ///
    /// # Examples
    ///
    /// ```
    /// use covdi_data::{range::{DateRange, MatchRule}, record::RecordDate};
    ///
    /// let dates = [
    ///     RecordDate::new(2021, 11, 29),
    ///     RecordDate::new(2021, 11, 30),
    ///     RecordDate::new(2021, 12, 1),
    /// ];
    /// let range = DateRange::locate(
    ///     &dates,
    ///     None,
    ///     Some(RecordDate::new(2021, 11, 30)),
    ///     MatchRule::FirstMatch,
    /// )
    /// .unwrap();
    /// assert_eq!(range, DateRange { start: 0, end: 1 });
    /// ```
    #[must_use]
    pub fn locate<D>(
        dates: &[D],
        start: Option<RecordDate>,
        stop: Option<RecordDate>,
        rule: MatchRule,
    ) -> Option<Self>
    where
        D: AsRecordDate,
    {
        let last = dates.len().checked_sub(1)?;
        let mut start_idx = None;
        let mut end_idx = None;
        for (i, date) in dates.iter().enumerate() {
            let Some(date) = date.as_record_date() else {
                continue;
            };
            if start == Some(date) && (rule == MatchRule::LastMatch || start_idx.is_none()) {
                start_idx = Some(i);
            }
            if stop == Some(date) && (rule == MatchRule::LastMatch || end_idx.is_none()) {
                end_idx = Some(i);
            }
        }
        Some(Self {
            start: start_idx.unwrap_or(0),
            end: end_idx.unwrap_or(last),
        })
    }

    /// Number of indices covered, zero when the bounds are inverted.
    ///
    /// Saturates at `usize::MAX` for a range spanning the whole index space.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end
            .checked_sub(self.start)
            .map_or(0, |span| span.saturating_add(1))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slices `values` to the range, clamping `end` to the slice length.
    #[must_use]
    pub fn slice<'a, T>(&self, values: &'a [T]) -> &'a [T] {
        let Some(last) = values.len().checked_sub(1) else {
            return &[];
        };
        let end = self.end.min(last);
        if self.start > end {
            return &[];
        }
        &values[self.start..=end]
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn daily(from: NaiveDate, to: NaiveDate) -> Vec<RecordDate> {
        from.iter_days()
            .take_while(|d| *d <= to)
            .filter_map(RecordDate::from_naive_date)
            .collect()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_open_start_bounded_stop() {
        let dates = daily(ymd(2020, 2, 24), ymd(2021, 12, 1));
        let stop = RecordDate::new(2021, 11, 30);
        let range = DateRange::locate(&dates, None, Some(stop), MatchRule::FirstMatch).unwrap();
        let expected_end = dates.iter().position(|d| *d == stop).unwrap();
        assert_eq!(range, DateRange { start: 0, end: expected_end });
        assert_eq!(expected_end, dates.len() - 2);
    }

    #[test]
    fn test_missing_targets_fall_back_to_bounds() {
        let dates = daily(ymd(2021, 1, 1), ymd(2021, 1, 10));
        let range = DateRange::locate(
            &dates,
            Some(RecordDate::new(1999, 1, 1)),
            Some(RecordDate::new(2030, 1, 1)),
            MatchRule::FirstMatch,
        )
        .unwrap();
        assert_eq!(range, DateRange { start: 0, end: 9 });
        assert_eq!(range.len(), 10);
    }

    #[test]
    fn test_match_rule_on_duplicate_dates() {
        let d = RecordDate::new(2021, 3, 1);
        let dates = [d, RecordDate::new(2021, 3, 2), d, RecordDate::new(2021, 3, 3)];
        let first = DateRange::locate(&dates, Some(d), None, MatchRule::FirstMatch).unwrap();
        let last = DateRange::locate(&dates, Some(d), None, MatchRule::LastMatch).unwrap();
        assert_eq!(first.start, 0);
        assert_eq!(last.start, 2);
    }

    #[test]
    fn test_optional_dates_skip_absent_entries() {
        let target = RecordDate::new(2021, 5, 5);
        let dates = [None, Some(target), None];
        let range = DateRange::locate(&dates, Some(target), Some(target), MatchRule::FirstMatch)
            .unwrap();
        assert_eq!(range, DateRange { start: 1, end: 1 });
    }

    #[test]
    fn test_empty_sequence() {
        let dates: [RecordDate; 0] = [];
        assert_eq!(
            DateRange::locate(&dates, None, None, MatchRule::FirstMatch),
            None
        );
    }

    #[test]
    fn test_slice() {
        let values = [0, 1, 2, 3, 4];
        assert_eq!(DateRange { start: 1, end: 3 }.slice(&values), &[1, 2, 3]);
        assert_eq!(DateRange { start: 3, end: 10 }.slice(&values), &[3, 4]);
        assert!(DateRange { start: 4, end: 2 }.slice(&values).is_empty());
        assert!(DateRange { start: 4, end: 2 }.is_empty());
        assert!(DateRange { start: 0, end: 0 }.slice::<i32>(&[]).is_empty());
    }

    #[test]
    fn test_len_at_index_limits() {
        assert_eq!(DateRange { start: 0, end: usize::MAX }.len(), usize::MAX);
        assert_eq!(DateRange { start: usize::MAX, end: usize::MAX }.len(), 1);
        assert_eq!(DateRange { start: usize::MAX, end: 0 }.len(), 0);
        assert_eq!(DateRange { start: 2, end: 4 }.len(), 3);
    }
}
