//! Governance indicator table (`EIU_Data.csv`).
//!
//! Layout of the file:
//!
//! - rows 0 and 1 are headers, the last row is a footnote and is ignored;
//! - column 0 holds the country name (anything after the first comma is dropped);
//! - column 1 is unused;
//! - from column 2 on, blocks of six columns hold one year each, most recent year first, in
//!   [`Indicator::ALL`] order.

use std::{fs::File, io, path::Path};

use serde::Serialize;

/// Number of indicator columns per year block.
pub const BLOCK_WIDTH: usize = 6;
const FIRST_VALUE_COLUMN: usize = 2;
const HEADER_ROWS: usize = 2;
const MISSING_MARKERS: [&str; 3] = ["#N/A", "..", ""];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, derive_more::Display)]
pub enum Indicator {
    #[display("VA")]
    VoiceAndAccountability,
    #[display("PV")]
    PoliticalStability,
    #[display("GE")]
    GovernmentEffectiveness,
    #[display("RQ")]
    RegulatoryQuality,
    #[display("RL")]
    RuleOfLaw,
    #[display("CC")]
    ControlOfCorruption,
}

impl Indicator {
    pub const ALL: [Indicator; BLOCK_WIDTH] = [
        Indicator::VoiceAndAccountability,
        Indicator::PoliticalStability,
        Indicator::GovernmentEffectiveness,
        Indicator::RegulatoryQuality,
        Indicator::RuleOfLaw,
        Indicator::ControlOfCorruption,
    ];

    #[must_use]
    pub const fn offset(self) -> usize {
        self as usize
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum EiuError {
    #[display("failed to open {}", path.display())]
    Open {
        path: std::path::PathBuf,
        source: io::Error,
    },
    #[display("failed to read index table")]
    Csv { source: csv::Error },
    #[display("row {row}, column {column}: invalid value '{value}'")]
    InvalidCell {
        row: usize,
        column: usize,
        value: String,
    },
}

/// Values of the six indicators for one year; `None` where the table has no data.
pub type YearBlock = [Option<f64>; BLOCK_WIDTH];

#[derive(Debug, Clone, PartialEq)]
pub struct IndexRow {
    pub country: String,
    /// Year blocks, most recent first.
    pub years: Vec<YearBlock>,
}

impl IndexRow {
    /// Chronological (oldest first) values of `indicator` over `years` blocks, after skipping
    /// the `skip` most recent ones.
    #[must_use]
    pub fn series(&self, indicator: Indicator, skip: usize, years: usize) -> Vec<Option<f64>> {
        let mut values = self
            .years
            .iter()
            .skip(skip)
            .take(years)
            .map(|block| block[indicator.offset()])
            .collect::<Vec<_>>();
        values.reverse();
        values
    }

    /// The year block `skip` positions back from the most recent one.
    #[must_use]
    pub fn year(&self, skip: usize) -> Option<&YearBlock> {
        self.years.get(skip)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexTable {
    pub rows: Vec<IndexRow>,
}

impl IndexTable {
    pub fn load<P>(path: P) -> Result<Self, EiuError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| EiuError::Open {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(file)
    }

    pub fn parse<R>(reader: R) -> Result<Self, EiuError>
    where
        R: io::Read,
    {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);
        let records = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| EiuError::Csv { source })?;

        let body_end = records.len().saturating_sub(1);
        let mut rows = vec![];
        for (row_idx, record) in records
            .iter()
            .enumerate()
            .take(body_end)
            .skip(HEADER_ROWS)
        {
            let country = record
                .get(0)
                .and_then(|cell| cell.split(',').next())
                .unwrap_or_default()
                .trim()
                .to_owned();
            let cells = record.iter().skip(FIRST_VALUE_COLUMN).collect::<Vec<_>>();
            let mut years = vec![];
            for (block_idx, chunk) in cells.chunks(BLOCK_WIDTH).enumerate() {
                let mut block = [None; BLOCK_WIDTH];
                for (offset, cell) in chunk.iter().enumerate() {
                    let column = FIRST_VALUE_COLUMN + block_idx * BLOCK_WIDTH + offset;
                    block[offset] = parse_cell(cell, row_idx, column)?;
                }
                years.push(block);
            }
            rows.push(IndexRow { country, years });
        }
        Ok(Self { rows })
    }
}

fn parse_cell(cell: &str, row: usize, column: usize) -> Result<Option<f64>, EiuError> {
    let cell = cell.trim();
    if MISSING_MARKERS.contains(&cell) {
        return Ok(None);
    }
    cell.parse()
        .map(Some)
        .map_err(|_| EiuError::InvalidCell {
            row,
            column,
            value: cell.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Country,Code,2020,,,,,,2019,,,,,
,,VA,PV,GE,RQ,RL,CC,VA,PV,GE,RQ,RL,CC
\"Korea, Rep.\",KOR,0.8,0.6,0.9,0.85,0.8,0.7,0.7,0.5,#N/A,0.8,0.75,0.65
Peru,PER,0.5,..,0.4,0.45,0.3,0.35,0.45,0.2,0.4,0.4,0.3,0.3
Source: EIU,,,,,,,,,,,,,
";

    #[test]
    fn test_parse_skips_headers_and_footer() {
        let table = IndexTable::parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].country, "Korea");
        assert_eq!(table.rows[1].country, "Peru");
        assert_eq!(table.rows[0].years.len(), 2);
    }

    #[test]
    fn test_missing_markers() {
        let table = IndexTable::parse(SAMPLE.as_bytes()).unwrap();
        let korea = &table.rows[0];
        assert_eq!(korea.years[1][Indicator::GovernmentEffectiveness.offset()], None);
        let peru = &table.rows[1];
        assert_eq!(peru.years[0][Indicator::PoliticalStability.offset()], None);
    }

    #[test]
    fn test_series_is_chronological() {
        let table = IndexTable::parse(SAMPLE.as_bytes()).unwrap();
        let korea = &table.rows[0];
        assert_eq!(
            korea.series(Indicator::VoiceAndAccountability, 0, 2),
            vec![Some(0.7), Some(0.8)]
        );
        assert_eq!(
            korea.series(Indicator::ControlOfCorruption, 1, 3),
            vec![Some(0.65)]
        );
    }

    #[test]
    fn test_invalid_cell() {
        let text = "h\nh\nPeru,PER,abc\nfooter\n";
        let err = IndexTable::parse(text.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            EiuError::InvalidCell { row: 2, column: 2, .. }
        ));
    }

    #[test]
    fn test_indicator_codes() {
        let codes = Indicator::ALL.map(|i| i.to_string());
        assert_eq!(codes, ["VA", "PV", "GE", "RQ", "RL", "CC"]);
    }
}
