//! Country manifests, name aliases and country subset files.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

/// Ordered list of country identifiers driving per-country iteration.
///
/// Duplicates are preserved; callers iterating the catalog visit a duplicated country twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryCatalog {
    countries: Vec<String>,
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum CatalogError {
    #[display("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[display("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[display("{}:{line}: expected 'name: alias'", path.display())]
    InvalidAlias {
        path: PathBuf,
        line: usize,
    },
}

impl CountryCatalog {
    /// Parses a manifest: one identifier per line, whitespace trimmed, blank lines skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// use covdi_data::catalog::CountryCatalog;
    ///
    /// let catalog = CountryCatalog::parse("Netherlands \n\nBelgium\nNetherlands\n");
    /// assert_eq!(catalog.as_slice(), ["Netherlands", "Belgium", "Netherlands"]);
    /// ```
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let countries = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect();
        Self { countries }
    }

    pub fn load<P>(path: P) -> Result<Self, CatalogError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_owned(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    /// Writes the manifest, one identifier per line.
    pub fn save<P>(&self, path: P) -> Result<(), CatalogError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        fs::write(path, self.countries.join("\n")).map_err(|source| CatalogError::Write {
            path: path.to_owned(),
            source,
        })
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.countries
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.countries.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.countries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}

impl FromIterator<String> for CountryCatalog {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            countries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a CountryCatalog {
    type Item = &'a str;
    type IntoIter = std::iter::Map<std::slice::Iter<'a, String>, fn(&'a String) -> &'a str>;

    fn into_iter(self) -> Self::IntoIter {
        self.countries
            .iter()
            .map(String::as_str as fn(&'a String) -> &'a str)
    }
}

/// Maps country names used in report files to the directory names of the data tree.
#[derive(Debug, Clone, Default)]
pub struct AliasMap {
    aliases: HashMap<String, String>,
}

impl AliasMap {
    /// Parses `name: alias` lines; blank lines are skipped.
    pub fn parse(text: &str, path: &Path) -> Result<Self, CatalogError> {
        let mut aliases = HashMap::new();
        for (i, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let (name, alias) = line.split_once(':').ok_or_else(|| CatalogError::InvalidAlias {
                path: path.to_owned(),
                line: i + 1,
            })?;
            aliases.insert(name.trim().to_owned(), alias.trim().to_owned());
        }
        Ok(Self { aliases })
    }

    pub fn load<P>(path: P) -> Result<Self, CatalogError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(&text, path)
    }

    #[must_use]
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map_or(name, String::as_str)
    }
}

/// A titled group of countries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountrySubset {
    pub title: String,
    pub countries: Vec<String>,
}

/// Parses a subset file: sections terminated by a line reading `END`, each starting with a
/// title line followed by one country per line. Blank lines are ignored and empty sections
/// are dropped.
///
/// # Examples
///
/// ```
/// use covdi_data::catalog::parse_subsets;
///
/// let subsets = parse_subsets("Subset 1\nNorway\nEND\n\nSubset 2\nChad\nMali\nEND\n");
/// assert_eq!(subsets.len(), 2);
/// assert_eq!(subsets[1].title, "Subset 2");
/// assert_eq!(subsets[1].countries, ["Chad", "Mali"]);
/// ```
#[must_use]
pub fn parse_subsets(text: &str) -> Vec<CountrySubset> {
    let mut subsets = vec![];
    let mut current: Option<CountrySubset> = None;
    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            continue;
        }
        if line == "END" {
            subsets.extend(current.take());
            continue;
        }
        match &mut current {
            Some(subset) => subset.countries.push(line.to_owned()),
            None => {
                current = Some(CountrySubset {
                    title: line.to_owned(),
                    countries: vec![],
                });
            }
        }
    }
    subsets.extend(current);
    subsets
}

pub fn load_subsets<P>(path: P) -> Result<Vec<CountrySubset>, CatalogError>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: path.to_owned(),
        source,
    })?;
    Ok(parse_subsets(&text))
}
