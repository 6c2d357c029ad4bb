//! Splits the OWID COVID-19 CSV into the per-country data tree.
//!
//! Each country gets a `date.data` file plus one `<column>.data` file per numeric column, and the
//! manifest lists the countries in the order they first appear in the CSV.

use std::{collections::HashMap, fs::File, io, path::Path};

use serde::Serialize;

use crate::{
    DataError,
    catalog::{CatalogError, CountryCatalog},
    layout::DataLayout,
    record::{Record, RecordDate},
};

pub const COUNTRY_COLUMN: &str = "location";
pub const DATE_COLUMN: &str = "date";
/// Non-numeric columns that are not written out.
pub const TEXT_COLUMNS: [&str; 3] = ["iso_code", "continent", "tests_units"];

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum SplitError {
    #[display("failed to open {}", path.display())]
    Open {
        path: std::path::PathBuf,
        source: io::Error,
    },
    #[display("failed to read CSV input")]
    Csv { source: csv::Error },
    #[display("missing column '{name}'")]
    MissingColumn { name: &'static str },
    #[display("line {line}, column '{column}': invalid number '{value}'")]
    InvalidNumber {
        line: usize,
        column: String,
        value: String,
    },
    #[display("line {line}: invalid date '{value}'")]
    InvalidDate { line: usize, value: String },
    #[display("failed to write data files")]
    Data { source: DataError },
    #[display("failed to write manifest")]
    Manifest { source: CatalogError },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitSummary {
    pub countries: usize,
    pub rows: usize,
    pub variables: Vec<String>,
}

#[derive(Debug, Default)]
struct CountrySeries {
    dates: Vec<Record<RecordDate>>,
    columns: Vec<Vec<Record<f64>>>,
}

pub fn split_file<P>(path: P, layout: &DataLayout) -> Result<SplitSummary, SplitError>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| SplitError::Open {
        path: path.to_owned(),
        source,
    })?;
    split(file, layout)
}

/// Reads the whole CSV, then writes the data tree and the manifest.
pub fn split<R>(reader: R, layout: &DataLayout) -> Result<SplitSummary, SplitError>
where
    R: io::Read,
{
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader
        .headers()
        .map_err(|source| SplitError::Csv { source })?
        .clone();
    let find = |name: &'static str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or(SplitError::MissingColumn { name })
    };
    let country_idx = find(COUNTRY_COLUMN)?;
    let date_idx = find(DATE_COLUMN)?;
    let numeric = headers
        .iter()
        .enumerate()
        .filter(|&(i, h)| {
            i != country_idx && i != date_idx && !TEXT_COLUMNS.contains(&h.trim())
        })
        .map(|(i, h)| (i, h.trim().to_owned()))
        .collect::<Vec<_>>();

    let mut order = vec![];
    let mut by_country = HashMap::<String, CountrySeries>::new();
    let mut rows = 0;
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.map_err(|source| SplitError::Csv { source })?;
        let line = row_idx + 2;
        let country = record.get(country_idx).unwrap_or_default().trim();
        let series = by_country.entry(country.to_owned()).or_insert_with(|| {
            order.push(country.to_owned());
            CountrySeries {
                dates: vec![],
                columns: vec![vec![]; numeric.len()],
            }
        });

        let date = record.get(date_idx).unwrap_or_default().trim();
        let date = if date.is_empty() {
            Record::absent()
        } else {
            let parsed = date.parse::<RecordDate>().map_err(|_| SplitError::InvalidDate {
                line,
                value: date.to_owned(),
            })?;
            Record::present(parsed)
        };
        series.dates.push(date);

        for ((idx, name), column) in numeric.iter().zip(&mut series.columns) {
            let cell = record.get(*idx).unwrap_or_default().trim();
            let value = if cell.is_empty() {
                Record::absent()
            } else {
                Record::present(cell.parse::<f64>().map_err(|_| SplitError::InvalidNumber {
                    line,
                    column: name.clone(),
                    value: cell.to_owned(),
                })?)
            };
            column.push(value);
        }
        rows += 1;
    }

    for country in &order {
        let Some(series) = by_country.get(country) else {
            continue;
        };
        tracing::debug!("writing {} records for [{country}]", series.dates.len());
        layout
            .write_dates(country, &series.dates)
            .map_err(|source| SplitError::Data { source })?;
        for ((_, name), column) in numeric.iter().zip(&series.columns) {
            layout
                .write_numerics(country, name, column)
                .map_err(|source| SplitError::Data { source })?;
        }
    }
    let catalog = order.iter().cloned().collect::<CountryCatalog>();
    layout
        .write_catalog(&catalog)
        .map_err(|source| SplitError::Manifest { source })?;

    Ok(SplitSummary {
        countries: order.len(),
        rows,
        variables: numeric.into_iter().map(|(_, name)| name).collect(),
    })
}
