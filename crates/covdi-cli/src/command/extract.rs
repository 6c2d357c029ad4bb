use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use anyhow::Context;
use covdi_data::{layout::DataLayout, report::ReportTable};

use crate::util::{self, DataArgs};

const DEFAULT_TABLE: &str = "Countries Data File.txt";
const KEY_HEADER: &str = "Country";
/// Cell written for a country without data.
const MISSING_CELL: &str = "nan";

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ExtractArg {
    /// Variables to add as columns
    #[arg(required = true)]
    variables: Vec<String>,
    /// Only values strictly above this count as recent
    #[arg(long, default_value_t = 0.0)]
    minimal_value: f64,
    /// Report table to update
    #[arg(long, default_value = DEFAULT_TABLE)]
    table: PathBuf,
    /// Fail on the first country without data
    #[arg(long)]
    strict: bool,
}

/// Loads `table_path` (or starts it from the manifest) and upserts one column per variable.
fn extract(
    layout: &DataLayout,
    table_path: &Path,
    variables: &[String],
    minimal_value: f64,
    strict: bool,
) -> anyhow::Result<ReportTable> {
    let mut table = ReportTable::load_or_default(table_path)
        .with_context(|| format!("Failed to load report: {}", table_path.display()))?;
    if table.is_empty() {
        let catalog = layout.load_catalog().with_context(|| {
            format!(
                "Failed to load manifest: {}",
                layout.manifest_path().display()
            )
        })?;
        tracing::info!(
            "Initialising {} with {} countries",
            table_path.display(),
            catalog.len()
        );
        table = ReportTable::with_keys(KEY_HEADER, &catalog);
    }

    let countries = table.keys().map(str::to_owned).collect::<Vec<_>>();
    for variable in variables {
        let values = util::load_recent_values(
            layout,
            countries.iter().map(String::as_str),
            variable,
            minimal_value,
            strict,
        )?
        .into_iter()
        .map(|(country, value)| (country, value.or_last()))
        .collect::<HashMap<_, _>>();
        table.upsert_column(variable, |country| {
            values
                .get(country)
                .copied()
                .flatten()
                .map_or_else(|| MISSING_CELL.to_owned(), |v| v.to_string())
        });
        tracing::info!("Extracted {variable} for {} countries", values.len());
    }
    Ok(table)
}

pub(crate) fn run(data: &DataArgs, arg: &ExtractArg) -> anyhow::Result<()> {
    let layout = data.layout();
    let table = extract(
        &layout,
        &arg.table,
        &arg.variables,
        arg.minimal_value,
        arg.strict,
    )?;
    table
        .save(&arg.table)
        .with_context(|| format!("Failed to write report: {}", arg.table.display()))?;
    tracing::info!("Wrote {}", arg.table.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use covdi_data::record::Record;

    use super::*;

    fn write_data(layout: &DataLayout) {
        layout
            .write_numerics(
                "Peru",
                "total_cases",
                &[Record::present(4.0), Record::present(9.0), Record::absent()],
            )
            .unwrap();
        layout
            .write_numerics("Peru", "total_deaths", &[Record::present(2.0)])
            .unwrap();
        layout
            .write_numerics("Chile", "total_cases", &[Record::present(0.0)])
            .unwrap();
    }

    #[test]
    fn test_extract_starts_from_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        write_data(&layout);
        fs::write(layout.manifest_path(), "Peru\nChile\nAtlantis\n").unwrap();

        let variables = ["total_cases".to_owned(), "total_deaths".to_owned()];
        let table = extract(
            &layout,
            &dir.path().join(DEFAULT_TABLE),
            &variables,
            0.0,
            false,
        )
        .unwrap();
        assert_eq!(
            table.render(),
            "Country, total_cases, total_deaths\n\
             Peru, 9, 2\n\
             Chile, 0, nan\n\
             Atlantis, nan, nan\n"
        );
    }

    #[test]
    fn test_extract_replaces_existing_column() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        write_data(&layout);
        let path = dir.path().join(DEFAULT_TABLE);
        fs::write(&path, "Country, total_cases, gdp\nPeru, 1, 5\nChile, 1, 6\n").unwrap();

        let table = extract(&layout, &path, &["total_cases".to_owned()], 0.0, false).unwrap();
        assert_eq!(
            table.render(),
            "Country, total_cases, gdp\nPeru, 9, 5\nChile, 0, 6\n"
        );
    }

    #[test]
    fn test_extract_strict_fails_on_missing_country() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        write_data(&layout);
        let path = dir.path().join(DEFAULT_TABLE);
        fs::write(&path, "Country\nPeru\nAtlantis\n").unwrap();

        let err = extract(&layout, &path, &["total_cases".to_owned()], 0.0, true).unwrap_err();
        assert!(format!("{err:#}").contains("Atlantis"));
    }
}
