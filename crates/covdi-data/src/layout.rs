//! The on-disk data tree: `<root>/<country>/<variable>.data` plus a country manifest.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::{
    DataError,
    catalog::{CatalogError, CountryCatalog},
    record::{self, MalformedRecordError, Payload, Record, RecordDate, TrailingBytes},
};

pub const DEFAULT_MANIFEST: &str = "countries.txt";
pub const DATA_EXTENSION: &str = "data";
/// Variable name of the per-country date file.
pub const DATE_VARIABLE: &str = "date";

/// Variable name with any `.data` extension removed.
///
/// ```
/// use covdi_data::layout::variable_name;
///
/// assert_eq!(variable_name("gdp.data"), "gdp");
/// assert_eq!(variable_name("gdp"), "gdp");
/// ```
#[must_use]
pub fn variable_name(variable: &str) -> &str {
    variable
        .strip_suffix(DATA_EXTENSION)
        .and_then(|stem| stem.strip_suffix('.'))
        .unwrap_or(variable)
}

/// Where the data tree lives and how its files are decoded.
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
    manifest: PathBuf,
    trailing: TrailingBytes,
}

impl DataLayout {
    pub fn new<P>(root: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self {
            root: root.into(),
            manifest: PathBuf::from(DEFAULT_MANIFEST),
            trailing: TrailingBytes::default(),
        }
    }

    /// Sets the manifest path; relative paths are resolved against the root.
    #[must_use]
    pub fn with_manifest<P>(mut self, manifest: P) -> Self
    where
        P: Into<PathBuf>,
    {
        self.manifest = manifest.into();
        self
    }

    #[must_use]
    pub fn with_trailing_bytes(mut self, trailing: TrailingBytes) -> Self {
        self.trailing = trailing;
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(&self.manifest)
    }

    #[must_use]
    pub fn country_dir(&self, country: &str) -> PathBuf {
        self.root.join(country)
    }

    /// Path of a variable file; the `.data` extension is appended when missing.
    #[must_use]
    pub fn variable_path(&self, country: &str, variable: &str) -> PathBuf {
        let file = if Path::new(variable).extension().is_some_and(|e| e == DATA_EXTENSION) {
            variable.to_owned()
        } else {
            format!("{variable}.{DATA_EXTENSION}")
        };
        self.country_dir(country).join(file)
    }

    pub fn load_catalog(&self) -> Result<CountryCatalog, CatalogError> {
        CountryCatalog::load(self.manifest_path())
    }

    pub fn write_catalog(&self, catalog: &CountryCatalog) -> Result<(), CatalogError> {
        catalog.save(self.manifest_path())
    }

    /// Lists the sub-directories of the root holding a date file, sorted by name.
    pub fn discover_catalog(&self) -> Result<CountryCatalog, DataError> {
        let io_err = |source| DataError::Io {
            path: self.root.clone(),
            source,
        };
        let mut countries = vec![];
        for entry in fs::read_dir(&self.root).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            if !entry.file_type().map_err(io_err)?.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                tracing::warn!("skipping non UTF-8 directory {}", entry.path().display());
                continue;
            };
            if self.variable_path(&name, DATE_VARIABLE).is_file() {
                countries.push(name);
            }
        }
        countries.sort();
        Ok(countries.into_iter().collect())
    }

    fn read_records<T>(&self, path: &Path) -> Result<Vec<Record<T>>, DataError>
    where
        T: Payload,
    {
        let buf = fs::read(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                DataError::DataFileNotFound {
                    path: path.to_owned(),
                }
            } else {
                DataError::Io {
                    path: path.to_owned(),
                    source,
                }
            }
        })?;
        let records = record::decode(&buf, self.trailing).map_err(|source| DataError::Malformed {
            path: path.to_owned(),
            source,
        })?;
        if let Some(err) = record::check_len::<T>(buf.len()) {
            tracing::warn!("{}", truncation_message(path, &err));
        }
        Ok(records)
    }

    fn write_records<T>(&self, path: &Path, records: &[Record<T>]) -> Result<(), DataError>
    where
        T: Payload,
    {
        let io_err = |source| DataError::Io {
            path: path.to_owned(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, record::encode(records.iter().copied())).map_err(io_err)
    }

    pub fn read_dates(&self, country: &str) -> Result<Vec<Record<RecordDate>>, DataError> {
        self.read_records(&self.variable_path(country, DATE_VARIABLE))
    }

    pub fn read_numerics(&self, country: &str, variable: &str) -> Result<Vec<Record<f64>>, DataError> {
        self.read_records(&self.variable_path(country, variable))
    }

    pub fn write_dates(&self, country: &str, records: &[Record<RecordDate>]) -> Result<(), DataError> {
        self.write_records(&self.variable_path(country, DATE_VARIABLE), records)
    }

    pub fn write_numerics(
        &self,
        country: &str,
        variable: &str,
        records: &[Record<f64>],
    ) -> Result<(), DataError> {
        self.write_records(&self.variable_path(country, variable), records)
    }
}

fn truncation_message(path: &Path, err: &MalformedRecordError) -> String {
    format!(
        "{}: {err}; ignoring {} trailing byte(s)",
        path.display(),
        err.remainder()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy;

    #[test]
    fn test_variable_path() {
        let layout = DataLayout::new("/data");
        assert_eq!(
            layout.variable_path("Peru", "new_cases"),
            PathBuf::from("/data/Peru/new_cases.data")
        );
        assert_eq!(
            layout.variable_path("Peru", "new_cases.data"),
            PathBuf::from("/data/Peru/new_cases.data")
        );
        assert_eq!(layout.manifest_path(), PathBuf::from("/data/countries.txt"));
    }

    #[test]
    fn test_read_synthetic_numeric_file() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        let mut buf = vec![0; 9];
        buf.push(1);
        buf.extend_from_slice(&1.5_f64.to_le_bytes());
        buf.extend_from_slice(&[0; 9]);
        assert_eq!(buf.len(), 27);
        fs::create_dir(dir.path().join("Peru")).unwrap();
        fs::write(layout.variable_path("Peru", "x"), &buf).unwrap();

        let records = layout.read_numerics("Peru", "x").unwrap();
        assert_eq!(policy::forward_fill(&records, 0.0), vec![0.0, 1.5, 1.5]);
        assert_eq!(policy::as_optional(&records), vec![None, Some(1.5), None]);
    }

    #[test]
    fn test_missing_file_is_typed() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        let err = layout.read_numerics("Atlantis", "new_cases").unwrap_err();
        assert!(matches!(err, DataError::DataFileNotFound { .. }));
    }

    #[test]
    fn test_strict_layout_rejects_trailing_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path()).with_trailing_bytes(TrailingBytes::Reject);
        layout
            .write_numerics("Peru", "x", &[Record::present(1.0)])
            .unwrap();
        let path = layout.variable_path("Peru", "x");
        let mut buf = fs::read(&path).unwrap();
        buf.push(0);
        fs::write(&path, buf).unwrap();
        let err = layout.read_numerics("Peru", "x").unwrap_err();
        assert!(matches!(err, DataError::Malformed { .. }));
    }

    #[test]
    fn test_truncating_layout_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        layout
            .write_numerics("Peru", "x", &[Record::present(1.0), Record::present(2.0)])
            .unwrap();
        let path = layout.variable_path("Peru", "x");
        let mut buf = fs::read(&path).unwrap();
        buf.extend_from_slice(&[1, 2]);
        fs::write(&path, &buf).unwrap();

        let records = layout.read_numerics("Peru", "x").unwrap();
        assert_eq!(policy::as_optional(&records), vec![Some(1.0), Some(2.0)]);

        let err = record::check_len::<f64>(buf.len()).unwrap();
        assert_eq!(
            truncation_message(&path, &err),
            format!(
                "{}: 20-byte buffer is not a multiple of the 9-byte numeric record stride; \
                 ignoring 2 trailing byte(s)",
                path.display()
            )
        );
    }

    #[test]
    fn test_discover_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        let date = [Record::present(RecordDate::new(2021, 1, 1))];
        layout.write_dates("Peru", &date).unwrap();
        layout.write_dates("Chile", &date).unwrap();
        fs::create_dir(dir.path().join("__pycache__")).unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let catalog = layout.discover_catalog().unwrap();
        assert_eq!(catalog.as_slice(), ["Chile", "Peru"]);

        layout.write_catalog(&catalog).unwrap();
        assert_eq!(layout.load_catalog().unwrap(), catalog);
    }
}
