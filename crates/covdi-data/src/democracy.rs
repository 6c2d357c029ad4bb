//! Democracy index scores and the regime categories derived from them.

use std::{fs, path::Path};

use serde::Serialize;

use crate::catalog::{CatalogError, CountrySubset};

/// Regime category by democracy index score (0–100 scale).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, derive_more::Display)]
pub enum Regime {
    #[display("Full Democracy")]
    FullDemocracy,
    #[display("Flawed Democracy")]
    FlawedDemocracy,
    #[display("Hybrid Regime")]
    HybridRegime,
    #[display("Authoritarian Regime")]
    Authoritarian,
}

impl Regime {
    pub const ALL: [Regime; 4] = [
        Regime::FullDemocracy,
        Regime::FlawedDemocracy,
        Regime::HybridRegime,
        Regime::Authoritarian,
    ];

    /// Classifies a score; every bound is exclusive from below.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score > 80.0 {
            Regime::FullDemocracy
        } else if score > 60.0 {
            Regime::FlawedDemocracy
        } else if score > 40.0 {
            Regime::HybridRegime
        } else {
            Regime::Authoritarian
        }
    }
}

/// Democracy index scores by country, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreSheet {
    pub scores: Vec<(String, f64)>,
    /// Lines whose score did not parse, kept for reporting.
    pub rejected: Vec<(String, String)>,
}

impl ScoreSheet {
    /// Parses `Country, score` lines. Later lines override earlier ones for the same country.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut sheet = Self::default();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (country, score) = line.split_once(',').unwrap_or((line, ""));
            let country = country.trim().to_owned();
            match score.trim().parse::<f64>() {
                Ok(score) => {
                    if let Some(entry) = sheet.scores.iter_mut().find(|(c, _)| *c == country) {
                        entry.1 = score;
                    } else {
                        sheet.scores.push((country, score));
                    }
                }
                Err(_) => {
                    tracing::warn!("skipping '{country}': invalid score '{}'", score.trim());
                    sheet.rejected.push((country, score.trim().to_owned()));
                }
            }
        }
        sheet
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

    /// Groups countries by regime, one subset per regime in [`Regime::ALL`] order.
    ///
    /// # Examples
    ///
    /// ```
    /// use covdi_data::democracy::{Regime, ScoreSheet};
    ///
    /// let sheet = ScoreSheet::parse("Norway, 97.5\nChad, 15.5\nPeru, 65.3\n");
    /// let subsets = sheet.group_by_regime();
    /// assert_eq!(subsets[0].title, Regime::FullDemocracy.to_string());
    /// assert_eq!(subsets[0].countries, ["Norway"]);
    /// assert_eq!(subsets[3].countries, ["Chad"]);
    /// ```
    #[must_use]
    pub fn group_by_regime(&self) -> Vec<CountrySubset> {
        Regime::ALL
            .iter()
            .map(|&regime| CountrySubset {
                title: regime.to_string(),
                countries: self
                    .scores
                    .iter()
                    .filter(|(_, score)| Regime::from_score(*score) == regime)
                    .map(|(country, _)| country.clone())
                    .collect(),
            })
            .collect()
    }
}
