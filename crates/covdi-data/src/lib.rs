//! Readers and writers for the COVID-19 / democracy-index data tree.
//!
//! The tree is a directory per country holding packed binary series (`<variable>.data`), plus a
//! manifest listing the countries, and a few flat text files (governance indicators, democracy
//! scores, comma-space report tables).
//!
//! # Modules
//!
//! - [`record`]: fixed-stride binary record codec
//! - [`policy`]: missing-value policies over decoded records
//! - [`range`]: date-range indexer used to slice aligned series
//! - [`catalog`]: country manifests, alias maps and subset files
//! - [`layout`]: paths and file access for the data tree
//! - [`gather`]: per-country datasets sliced to a common window
//! - [`eiu`]: governance indicator table
//! - [`democracy`]: democracy index scores and regime categories
//! - [`report`]: comma-space delimited report tables
//! - [`owid`]: splitter turning the OWID CSV into the data tree
//!
//! # Examples
//!
//! ```
//! use covdi_data::{layout::DataLayout, policy, record::Record};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let layout = DataLayout::new(dir.path());
//! layout
//!     .write_numerics("Peru", "new_cases", &[Record::absent(), Record::present(1.5), Record::absent()])
//!     .unwrap();
//!
//! let records = layout.read_numerics("Peru", "new_cases").unwrap();
//! assert_eq!(policy::forward_fill(&records, 0.0), [0.0, 1.5, 1.5]);
//! assert_eq!(policy::last_present(&records), Some(1.5));
//! ```

use std::{io, path::PathBuf};

use self::record::MalformedRecordError;

pub mod catalog;
pub mod democracy;
pub mod eiu;
pub mod gather;
pub mod layout;
pub mod owid;
pub mod policy;
pub mod range;
pub mod record;
pub mod report;

/// Failure to read or write one data file.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum DataError {
    #[display("data file not found: {}", path.display())]
    DataFileNotFound { path: PathBuf },
    #[display("failed to access {}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[display("malformed data file {}", path.display())]
    Malformed {
        path: PathBuf,
        source: MalformedRecordError,
    },
}
