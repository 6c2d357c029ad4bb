use std::{
    fs::File,
    io::{self, BufWriter, StdoutLock, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context;
use covdi_data::{
    gather::{self, Outcome, RecentValue},
    layout::{DEFAULT_MANIFEST, DataLayout},
    record::TrailingBytes,
};
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;

/// Location of the per-country data tree, shared by every subcommand.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct DataArgs {
    /// Root directory of the per-country data tree
    #[arg(long, global = true, default_value = ".")]
    data_dir: PathBuf,
    /// Country manifest, relative to the data directory
    #[arg(long, global = true, default_value = DEFAULT_MANIFEST)]
    manifest: PathBuf,
    /// Reject data files ending with a partial record instead of truncating them
    #[arg(long, global = true)]
    strict_records: bool,
}

impl DataArgs {
    pub(crate) fn layout(&self) -> DataLayout {
        let trailing = if self.strict_records {
            TrailingBytes::Reject
        } else {
            TrailingBytes::Truncate
        };
        DataLayout::new(&self.data_dir)
            .with_manifest(&self.manifest)
            .with_trailing_bytes(trailing)
    }

    /// Resolves a file name given on the command line against the data directory.
    pub(crate) fn resolve(&self, path: &Path) -> PathBuf {
        self.data_dir.join(path)
    }
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SeedArg {
    /// Seed of the resampling generator; a random seed is drawn and logged when omitted
    #[arg(long)]
    seed: Option<u64>,
}

impl SeedArg {
    pub(crate) fn rng(&self) -> Pcg32 {
        let seed = self.seed.unwrap_or_else(|| rand::rng().random());
        tracing::info!("Resampling with seed {seed}");
        Pcg32::seed_from_u64(seed)
    }
}

#[derive(Debug)]
pub enum Output {
    Stdout {
        writer: StdoutLock<'static>,
    },
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    pub fn save_json<T>(value: &T, output_path: Option<PathBuf>) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let mut output = Output::from_output_path(output_path)?;
        output.write_json(value)
    }

    /// Writes `rows` as CSV to `output_path`, with a header taken from the row fields.
    pub fn save_csv<I, T>(rows: I, output_path: PathBuf) -> anyhow::Result<()>
    where
        I: IntoIterator<Item = T>,
        T: serde::Serialize,
    {
        let mut output = Output::open(output_path)?;
        output.write_csv(rows)?;
        tracing::info!("Exported {}", output.display_path());
        Ok(())
    }

    pub fn from_output_path(output_path: Option<PathBuf>) -> anyhow::Result<Self> {
        match output_path {
            Some(path) => Output::open(path),
            None => Ok(Output::stdout()),
        }
    }

    pub fn stdout() -> Self {
        Output::Stdout {
            writer: io::stdout().lock(),
        }
    }

    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output::File {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn display_path(&self) -> String {
        match self {
            Output::Stdout { .. } => "stdout".to_string(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    pub fn write_json<T>(&mut self, value: T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        serde_json::to_writer_pretty(&mut *self, &value)
            .with_context(|| format!("Failed to write JSON to {}", self.display_path()))?;
        writeln!(&mut *self).with_context(|| {
            format!(
                "Failed to write newline after JSON to {}",
                self.display_path()
            )
        })?;
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))?;
        Ok(())
    }

    pub fn write_csv<I, T>(&mut self, rows: I) -> anyhow::Result<()>
    where
        I: IntoIterator<Item = T>,
        T: serde::Serialize,
    {
        let path = self.display_path();
        let mut writer = csv::Writer::from_writer(&mut *self);
        for row in rows {
            writer
                .serialize(row)
                .with_context(|| format!("Failed to write CSV row to {path}"))?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to flush output to {path}"))?;
        Ok(())
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout { writer } => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout { writer } => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

/// Splits per-country outcomes into loaded values and failures.
///
/// With `strict`, the first failure aborts; otherwise failures are logged and skipped.
pub fn collect_outcomes<T>(outcomes: Vec<Outcome<T>>, strict: bool) -> anyhow::Result<Vec<(String, T)>> {
    let mut loaded = Vec::with_capacity(outcomes.len());
    let mut skipped = 0_usize;
    for Outcome { country, result } in outcomes {
        match result {
            Ok(value) => loaded.push((country, value)),
            Err(err) if strict => {
                return Err(err).with_context(|| format!("Failed to load data for {country}"));
            }
            Err(err) => {
                tracing::warn!("skipping {country}: {err}");
                skipped += 1;
            }
        }
    }
    if skipped > 0 {
        tracing::warn!("{skipped} countries skipped, {} loaded", loaded.len());
    }
    Ok(loaded)
}

/// Recent value of `variable` above `minimal` for each country.
pub fn load_recent_values<'a, I>(
    layout: &DataLayout,
    countries: I,
    variable: &str,
    minimal: f64,
    strict: bool,
) -> anyhow::Result<Vec<(String, RecentValue)>>
where
    I: IntoIterator<Item = &'a str>,
{
    let outcomes = gather::recent_values(layout, countries, variable, minimal);
    collect_outcomes(outcomes, strict)
}

#[cfg(test)]
mod tests {
    use covdi_data::{
        DataError,
        record::{Record, RecordDate},
    };

    use super::*;

    fn missing(country: &str) -> Outcome<f64> {
        Outcome {
            country: country.to_owned(),
            result: Err(DataError::DataFileNotFound {
                path: PathBuf::from(country),
            }),
        }
    }

    fn loaded(country: &str, value: f64) -> Outcome<f64> {
        Outcome {
            country: country.to_owned(),
            result: Ok(value),
        }
    }

    #[test]
    fn test_collect_outcomes_skips_failures() {
        let outcomes = vec![loaded("Peru", 1.0), missing("Atlantis"), loaded("Chile", 2.0)];
        let values = collect_outcomes(outcomes, false).unwrap();
        assert_eq!(
            values,
            vec![("Peru".to_owned(), 1.0), ("Chile".to_owned(), 2.0)]
        );
    }

    #[test]
    fn test_collect_outcomes_strict() {
        let outcomes = vec![loaded("Peru", 1.0), missing("Atlantis")];
        let err = collect_outcomes(outcomes, true).unwrap_err();
        assert!(err.to_string().contains("Atlantis"));
    }

    #[test]
    fn test_load_recent_values() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        layout
            .write_dates("Peru", &[Record::present(RecordDate::new(2021, 1, 1))])
            .unwrap();
        layout
            .write_numerics("Peru", "total_cases", &[Record::present(12.0)])
            .unwrap();
        let values =
            load_recent_values(&layout, ["Peru", "Atlantis"], "total_cases", 0.0, false).unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].1.above, Some(12.0));
    }

    #[test]
    fn test_save_csv() {
        #[derive(serde::Serialize)]
        struct Row {
            sample: usize,
            mean: f64,
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("means.csv");
        let rows = [Row { sample: 0, mean: 1.5 }, Row { sample: 1, mean: 2.0 }];
        Output::save_csv(rows, path.clone()).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(text, "sample,mean\n0,1.5\n1,2.0\n");
    }
}
