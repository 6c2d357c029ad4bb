use std::path::{Path, PathBuf};

use anyhow::Context;
use covdi_data::{
    DataError,
    catalog::AliasMap,
    layout::{self, DataLayout},
    policy,
    report::{self, ReportTable},
};

use crate::util::DataArgs;

const DEFAULT_BINDER: &str = "binder.txt";

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct AppendArg {
    /// Report to extend (`.txt` or `.csv`, `, ` delimited, first column holds countries)
    target: PathBuf,
    /// Variable to append
    variable: String,
    /// Country aliases as `name: directory` lines [default: binder.txt in the data directory, if present]
    #[arg(long)]
    binder: Option<PathBuf>,
}

/// Loads `binder`, or the optional alias file at `default_path`.
fn load_aliases(default_path: &Path, binder: Option<&Path>) -> anyhow::Result<AliasMap> {
    let (path, required) = match binder {
        Some(path) => (path, true),
        None => (default_path, false),
    };
    if !required && !path.exists() {
        tracing::debug!("no alias file at {}", path.display());
        return Ok(AliasMap::default());
    }
    AliasMap::load(path).with_context(|| format!("Failed to load aliases: {}", path.display()))
}

/// Adds the last value of `variable` to every row of `target`.
///
/// Returns the output path and the extended table. Countries without a data file get an empty
/// cell.
fn append(
    layout: &DataLayout,
    aliases: &AliasMap,
    target: &Path,
    variable: &str,
) -> anyhow::Result<(PathBuf, ReportTable)> {
    let variable = layout::variable_name(variable);
    let output_path = report::appended_path(target, variable)?;
    let mut table = ReportTable::load(target)
        .with_context(|| format!("Failed to load report: {}", target.display()))?;

    let mut values = Vec::with_capacity(table.rows.len());
    for country in table.keys() {
        let directory = aliases.resolve(country);
        let value = match layout.read_numerics(directory, variable) {
            Ok(records) => policy::last_present(&records).map(|v| format!("{v:?}")),
            Err(DataError::DataFileNotFound { path }) => {
                tracing::warn!("{country}: no data at {}", path.display());
                None
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to read {variable} of {country}"));
            }
        };
        values.push(value);
    }
    table.append_padded_column(variable, &values);
    Ok((output_path, table))
}

pub(crate) fn run(data: &DataArgs, arg: &AppendArg) -> anyhow::Result<()> {
    let layout = data.layout();
    let aliases = load_aliases(
        &data.resolve(Path::new(DEFAULT_BINDER)),
        arg.binder.as_deref(),
    )?;
    let (output_path, table) = append(&layout, &aliases, &arg.target, &arg.variable)?;
    table
        .save(&output_path)
        .with_context(|| format!("Failed to write report: {}", output_path.display()))?;
    tracing::info!("Wrote {}", output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use covdi_data::record::Record;

    use super::*;

    fn fixture() -> (tempfile::TempDir, DataLayout, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        layout
            .write_numerics("Peru", "gdp", &[Record::present(12.5), Record::absent()])
            .unwrap();
        layout
            .write_numerics("Czechia", "gdp", &[Record::present(3.0)])
            .unwrap();
        let target = dir.path().join("summary.txt");
        fs::write(&target, "Country, cases\nPeru, 10\nCzech Republic, 20\nAtlantis, 30\n").unwrap();
        (dir, layout, target)
    }

    #[test]
    fn test_append_resolves_aliases_and_leaves_missing_blank() {
        let (dir, layout, target) = fixture();
        let binder = dir.path().join(DEFAULT_BINDER);
        fs::write(&binder, "Czech Republic: Czechia\n").unwrap();
        let aliases = load_aliases(&binder, None).unwrap();

        let (path, table) = append(&layout, &aliases, &target, "gdp").unwrap();
        assert_eq!(path, dir.path().join("summary_app_[gdp].txt"));
        assert_eq!(
            table.render(),
            "Country, cases,  gdp\n\
             Peru, 10, 12.5\n\
             Czech Republic, 20,  3.0\n\
             Atlantis, 30,     \n"
        );
    }

    #[test]
    fn test_append_without_alias_file() {
        let (dir, layout, target) = fixture();
        let aliases = load_aliases(&dir.path().join(DEFAULT_BINDER), None).unwrap();
        let (_, table) = append(&layout, &aliases, &target, "gdp").unwrap();
        assert_eq!(table.rows[1], ["Czech Republic", "20", "    "]);
    }

    #[test]
    fn test_explicit_alias_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("aliases.txt");
        assert!(load_aliases(&dir.path().join(DEFAULT_BINDER), Some(&missing)).is_err());
    }

    #[test]
    fn test_data_extension_is_dropped_from_column_and_file_name() {
        let (dir, layout, target) = fixture();
        let (path, table) = append(&layout, &AliasMap::default(), &target, "gdp.data").unwrap();
        assert_eq!(path, dir.path().join("summary_app_[gdp].txt"));
        assert_eq!(table.header, ["Country", "cases", " gdp"]);
    }
}
