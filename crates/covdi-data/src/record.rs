//! Fixed-width packed records stored in `.data` files.
//!
//! A `.data` file is a plain concatenation of records with no header. Every record starts with a
//! has-value flag byte (nonzero when the payload is meaningful) followed by the payload:
//!
//! | kind      | stride | layout                                                  |
//! |-----------|--------|---------------------------------------------------------|
//! | date      | 5      | flag, year (`u16` little-endian), month (`u8`), day (`u8`) |
//! | numeric   | 9      | flag, value (`f64` little-endian)                        |
//!
//! Absent records still occupy a full stride; their payload bytes are zero.

use std::{fmt, str::FromStr};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Byte length of one date record.
pub const DATE_STRIDE: usize = 5;
/// Byte length of one numeric record.
pub const NUMERIC_STRIDE: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum RecordKind {
    #[display("date")]
    Date,
    #[display("numeric")]
    Numeric,
}

impl RecordKind {
    #[must_use]
    pub const fn stride(self) -> usize {
        match self {
            RecordKind::Date => DATE_STRIDE,
            RecordKind::Numeric => NUMERIC_STRIDE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("{len}-byte buffer is not a multiple of the {stride}-byte {kind} record stride")]
pub struct MalformedRecordError {
    pub kind: RecordKind,
    pub len: usize,
    pub stride: usize,
}

impl MalformedRecordError {
    /// Bytes after the last complete record.
    #[must_use]
    pub fn remainder(&self) -> usize {
        self.len % self.stride
    }
}

/// What to do with bytes left over after the last complete record.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TrailingBytes {
    /// Drop the partial record. Reads through `DataLayout` log a warning naming the file.
    #[default]
    Truncate,
    /// Fail with [`MalformedRecordError`].
    Reject,
}

/// A calendar date as stored in a date record.
///
/// The fields are kept as raw as they were written so that an out-of-range month or day
/// still round-trips; use [`RecordDate::to_naive_date`] for calendar arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordDate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl RecordDate {
    #[must_use]
    pub const fn new(year: u16, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    #[must_use]
    pub fn to_naive_date(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(i32::from(self.year), u32::from(self.month), u32::from(self.day))
    }

    #[must_use]
    pub fn from_naive_date(date: NaiveDate) -> Option<Self> {
        Some(Self {
            year: u16::try_from(date.year()).ok()?,
            month: u8::try_from(date.month()).ok()?,
            day: u8::try_from(date.day()).ok()?,
        })
    }
}

impl fmt::Display for RecordDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("invalid date '{input}', expected YYYY-MM-DD")]
pub struct ParseDateError {
    pub input: String,
}

impl FromStr for RecordDate {
    type Err = ParseDateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseDateError {
            input: s.to_owned(),
        };
        let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| err())?;
        Self::from_naive_date(date).ok_or_else(err)
    }
}

/// One decoded record: the has-value flag and the payload it guards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record<T> {
    pub has_value: bool,
    pub payload: T,
}

impl<T> Record<T> {
    #[must_use]
    pub fn present(payload: T) -> Self {
        Self {
            has_value: true,
            payload,
        }
    }

    #[must_use]
    pub fn value(self) -> Option<T> {
        self.has_value.then_some(self.payload)
    }
}

impl<T> Record<T>
where
    T: Payload,
{
    #[must_use]
    pub fn absent() -> Self {
        Self {
            has_value: false,
            payload: T::ZERO,
        }
    }
}

impl<T> From<Option<T>> for Record<T>
where
    T: Payload,
{
    fn from(value: Option<T>) -> Self {
        value.map_or_else(Self::absent, Self::present)
    }
}

/// A payload type that can be packed into a fixed-width record.
pub trait Payload: Copy {
    const KIND: RecordKind;
    /// Payload written for absent records.
    const ZERO: Self;

    /// Decodes the payload from the `stride - 1` bytes following the flag.
    fn read(bytes: &[u8]) -> Self;

    /// Encodes the payload into the `stride - 1` bytes following the flag.
    fn write(self, out: &mut [u8]);
}

impl Payload for RecordDate {
    const KIND: RecordKind = RecordKind::Date;
    const ZERO: Self = RecordDate::new(0, 0, 0);

    fn read(bytes: &[u8]) -> Self {
        Self {
            year: u16::from_le_bytes([bytes[0], bytes[1]]),
            month: bytes[2],
            day: bytes[3],
        }
    }

    fn write(self, out: &mut [u8]) {
        out[..2].copy_from_slice(&self.year.to_le_bytes());
        out[2] = self.month;
        out[3] = self.day;
    }
}

impl Payload for f64 {
    const KIND: RecordKind = RecordKind::Numeric;
    const ZERO: Self = 0.0;

    fn read(bytes: &[u8]) -> Self {
        let mut buf = [0; 8];
        buf.copy_from_slice(&bytes[..8]);
        f64::from_le_bytes(buf)
    }

    fn write(self, out: &mut [u8]) {
        out[..8].copy_from_slice(&self.to_le_bytes());
    }
}

/// Lazily decodes every complete record in `buf`, ignoring any partial tail.
pub fn iter_records<T>(buf: &[u8]) -> impl Iterator<Item = Record<T>> + '_
where
    T: Payload,
{
    buf.chunks_exact(T::KIND.stride()).map(|chunk| Record {
        has_value: chunk[0] != 0,
        payload: T::read(&chunk[1..]),
    })
}

/// The error describing a `len`-byte buffer of `T` records, or `None` when it holds whole records.
#[must_use]
pub fn check_len<T>(len: usize) -> Option<MalformedRecordError>
where
    T: Payload,
{
    let stride = T::KIND.stride();
    (len % stride != 0).then_some(MalformedRecordError {
        kind: T::KIND,
        len,
        stride,
    })
}

/// Decodes `buf` into records, applying `trailing` to a partial final record.
///
/// # Examples
///
/// ```
/// use covdi_data::record::{self, Record, TrailingBytes};
///
/// let buf = record::encode([Record::absent(), Record::present(1.5_f64)]);
/// let records = record::decode::<f64>(&buf, TrailingBytes::Reject).unwrap();
/// assert_eq!(records[0].value(), None);
/// assert_eq!(records[1].value(), Some(1.5));
/// ```
pub fn decode<T>(buf: &[u8], trailing: TrailingBytes) -> Result<Vec<Record<T>>, MalformedRecordError>
where
    T: Payload,
{
    if let (TrailingBytes::Reject, Some(err)) = (trailing, check_len::<T>(buf.len())) {
        return Err(err);
    }
    Ok(iter_records(buf).collect())
}

/// Appends the packed form of `record` to `out`.
pub fn encode_into<T>(record: Record<T>, out: &mut Vec<u8>)
where
    T: Payload,
{
    let start = out.len();
    out.resize(start + T::KIND.stride(), 0);
    let chunk = &mut out[start..];
    chunk[0] = u8::from(record.has_value);
    if record.has_value {
        record.payload.write(&mut chunk[1..]);
    }
}

/// Packs `records` into a `.data` buffer.
#[must_use]
pub fn encode<T, I>(records: I) -> Vec<u8>
where
    T: Payload,
    I: IntoIterator<Item = Record<T>>,
{
    let mut out = vec![];
    for record in records {
        encode_into(record, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_round_trip() {
        for (has_value, value) in [(true, 1.5), (true, -0.25), (true, 1e300), (false, 0.0)] {
            let record = Record {
                has_value,
                payload: value,
            };
            let buf = encode([record]);
            assert_eq!(buf.len(), NUMERIC_STRIDE);
            let decoded = decode::<f64>(&buf, TrailingBytes::Reject).unwrap();
            assert_eq!(decoded, vec![record]);
        }
    }

    #[test]
    fn test_numeric_layout_is_little_endian() {
        let buf = encode([Record::present(1.0_f64)]);
        assert_eq!(buf[0], 1);
        assert_eq!(&buf[1..], &1.0_f64.to_le_bytes());
    }

    #[test]
    fn test_numeric_value_is_not_rescaled() {
        let mut buf = vec![1];
        buf.extend_from_slice(&123.0_f64.to_le_bytes());
        let decoded = decode::<f64>(&buf, TrailingBytes::Reject).unwrap();
        assert_eq!(decoded[0].value(), Some(123.0));
    }

    #[test]
    fn test_any_nonzero_flag_means_present() {
        let mut buf = vec![0xff];
        buf.extend_from_slice(&2.0_f64.to_le_bytes());
        let decoded = decode::<f64>(&buf, TrailingBytes::Reject).unwrap();
        assert!(decoded[0].has_value);
    }

    #[test]
    fn test_date_layout() {
        // 2021-11-30: year 2021 = 0x07e5
        let buf = [1, 0xe5, 0x07, 11, 30];
        let decoded = decode::<RecordDate>(&buf, TrailingBytes::Reject).unwrap();
        assert_eq!(decoded, vec![Record::present(RecordDate::new(2021, 11, 30))]);
        assert_eq!(encode(decoded), buf);
    }

    #[test]
    fn test_absent_record_payload_is_zeroed() {
        let buf = encode([Record {
            has_value: false,
            payload: RecordDate::new(2020, 2, 24),
        }]);
        assert_eq!(buf, [0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_trailing_bytes_truncate() {
        let mut buf = encode([Record::present(1.0_f64), Record::present(2.0)]);
        buf.extend_from_slice(&[1, 2, 3]);
        let decoded = decode::<f64>(&buf, TrailingBytes::Truncate).unwrap();
        assert_eq!(decoded.len(), 2);
    }

    #[test]
    fn test_trailing_bytes_reject() {
        let mut buf = encode([Record::present(RecordDate::new(2020, 1, 1))]);
        buf.push(0);
        let err = decode::<RecordDate>(&buf, TrailingBytes::Reject).unwrap_err();
        assert_eq!(
            err,
            MalformedRecordError {
                kind: RecordKind::Date,
                len: 6,
                stride: DATE_STRIDE,
            }
        );
    }

    #[test]
    fn test_check_len() {
        assert_eq!(check_len::<f64>(18), None);
        let err = check_len::<f64>(21).unwrap();
        assert_eq!(err.stride, NUMERIC_STRIDE);
        assert_eq!(err.remainder(), 3);
    }

    #[test]
    fn test_empty_buffer() {
        let decoded = decode::<f64>(&[], TrailingBytes::Reject).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_parse_record_date() {
        let date: RecordDate = "2021-01-01".parse().unwrap();
        assert_eq!(date, RecordDate::new(2021, 1, 1));
        assert_eq!(date.to_string(), "2021-01-01");
        assert!("2021-13-01".parse::<RecordDate>().is_err());
        assert!("yesterday".parse::<RecordDate>().is_err());
    }

    #[test]
    fn test_record_date_json() {
        let json = serde_json::to_string(&RecordDate::new(2021, 11, 30)).unwrap();
        assert_eq!(json, r#"{"year":2021,"month":11,"day":30}"#);
        let back: RecordDate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, RecordDate::new(2021, 11, 30));
    }
}
