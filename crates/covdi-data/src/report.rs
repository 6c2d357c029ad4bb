//! Comma-space delimited report tables.
//!
//! The first row is a header, every further row is keyed by its first cell (the country).
//! Cells are split on `,` and lose the single space that follows the delimiter, so right-aligned
//! columns keep their padding through a load and save. Lookups compare trimmed text.

use std::{
    fs,
    io::{self, Write as _},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;

pub const DELIMITER: &str = ", ";
/// Extensions accepted for report files that get a column appended.
pub const REPORT_EXTENSIONS: [&str; 2] = ["txt", "csv"];

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ReportError {
    #[display("failed to read {}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[display("failed to write {}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[display("column '{name}' not found")]
    MissingColumn { name: String },
    #[display("unsupported report extension: {}", path.display())]
    UnsupportedExtension { path: PathBuf },
    #[display("row {row} of column '{column}': invalid number '{value}'")]
    InvalidNumber {
        column: String,
        row: usize,
        value: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    /// Creates a table with a key column and one row per key.
    #[must_use]
    pub fn with_keys<I, S>(key_header: &str, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: vec![key_header.to_owned()],
            rows: keys.into_iter().map(|k| vec![k.into()]).collect(),
        }
    }

    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut lines = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                line.split(',')
                    .enumerate()
                    .map(|(i, cell)| {
                        if i == 0 {
                            cell.to_owned()
                        } else {
                            cell.strip_prefix(' ').unwrap_or(cell).to_owned()
                        }
                    })
                    .collect::<Vec<_>>()
            });
        let header = lines.next().unwrap_or_default();
        Self {
            header,
            rows: lines.collect(),
        }
    }

    pub fn load<P>(path: P) -> Result<Self, ReportError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ReportError::Read {
            path: path.to_owned(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    /// Loads `path`, or returns an empty table when the file does not exist.
    pub fn load_or_default<P>(path: P) -> Result<Self, ReportError>
    where
        P: AsRef<Path>,
    {
        match Self::load(path) {
            Err(ReportError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.header.is_empty()
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h.trim() == name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.rows
            .iter()
            .map(|row| row.first().map_or("", |key| key.trim()))
    }

    /// Parses every cell of column `name` as a number.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>, ReportError> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| ReportError::MissingColumn {
                name: name.to_owned(),
            })?;
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let cell = row.get(idx).map_or("", |cell| cell.trim());
                cell.parse().map_err(|_| ReportError::InvalidNumber {
                    column: name.to_owned(),
                    row: i + 1,
                    value: cell.to_owned(),
                })
            })
            .collect()
    }

    /// Replaces column `name`, or appends it when the header does not have it yet.
    ///
    /// `value_for` receives the key of each row.
    ///
    /// # Examples
    ///
    /// ```
    /// use covdi_data::report::ReportTable;
    ///
    /// let mut table = ReportTable::with_keys("Country", ["Peru", "Chile"]);
    /// table.upsert_column("total_cases", |c| if c == "Peru" { "10".into() } else { "20".into() });
    /// table.upsert_column("total_cases", |_| "0".into());
    /// assert_eq!(table.render(), "Country, total_cases\nPeru, 0\nChile, 0\n");
    /// ```
    pub fn upsert_column<F>(&mut self, name: &str, mut value_for: F)
    where
        F: FnMut(&str) -> String,
    {
        let idx = self.column_index(name).unwrap_or_else(|| {
            self.header.push(name.to_owned());
            self.header.len() - 1
        });
        for row in &mut self.rows {
            let value = value_for(row.first().map_or("", |key| key.trim()));
            if row.len() <= idx {
                row.resize(idx + 1, String::new());
            }
            row[idx] = value;
        }
    }

    /// Appends column `name`, right-aligning the header and values to a common width.
    ///
    /// Rows beyond `values` get an empty cell.
    pub fn append_padded_column(&mut self, name: &str, values: &[Option<String>]) {
        let width = values
            .iter()
            .flatten()
            .map(String::len)
            .chain([name.len()])
            .max()
            .unwrap_or(0);
        self.header.push(format!("{name:>width$}"));
        for (i, row) in self.rows.iter_mut().enumerate() {
            let value = values.get(i).cloned().flatten().unwrap_or_default();
            row.push(format!("{value:>width$}"));
        }
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for row in std::iter::once(&self.header).chain(&self.rows) {
            out.push_str(&row.join(DELIMITER));
            out.push('\n');
        }
        out
    }

    /// Writes the table atomically: a temporary file in the same directory replaces `path`.
    pub fn save<P>(&self, path: P) -> Result<(), ReportError>
    where
        P: AsRef<Path>,
    {
        write_atomic(path.as_ref(), self.render().as_bytes())
    }
}

/// Output path of an appended report: `<stem>_app_[<variable>].<ext>` next to `path`.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use covdi_data::report::appended_path;
///
/// let path = appended_path(Path::new("out/summary.txt"), "gdp").unwrap();
/// assert_eq!(path, Path::new("out/summary_app_[gdp].txt"));
/// assert!(appended_path(Path::new("summary.xlsx"), "gdp").is_err());
/// ```
pub fn appended_path(path: &Path, variable: &str) -> Result<PathBuf, ReportError> {
    let unsupported = || ReportError::UnsupportedExtension {
        path: path.to_owned(),
    };
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| REPORT_EXTENSIONS.contains(e))
        .ok_or_else(unsupported)?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(unsupported)?;
    Ok(path.with_file_name(format!("{stem}_app_[{variable}].{ext}")))
}

/// Writes `contents` to a temporary sibling of `path`, then renames it over `path`.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), ReportError> {
    let write_err = |source| ReportError::Write {
        path: path.to_owned(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir).map_err(write_err)?;
    file.write_all(contents).map_err(write_err)?;
    file.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
