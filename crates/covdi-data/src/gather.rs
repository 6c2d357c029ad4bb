//! Per-country datasets sliced to a common date range.

use serde::Serialize;

use crate::{
    DataError,
    catalog::CountryCatalog,
    layout::DataLayout,
    policy,
    range::{DateRange, MatchRule},
    record::{Record, RecordDate},
};

/// First day of the default analysis window.
pub const DEFAULT_START: RecordDate = RecordDate::new(2021, 1, 1);
/// Last day of the default analysis window.
pub const DEFAULT_STOP: RecordDate = RecordDate::new(2021, 11, 30);

/// Date bounds and match rule used to slice every series of a country.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: Option<RecordDate>,
    pub stop: Option<RecordDate>,
    pub rule: MatchRule,
}

impl Default for Window {
    fn default() -> Self {
        Self {
            start: Some(DEFAULT_START),
            stop: Some(DEFAULT_STOP),
            rule: MatchRule::default(),
        }
    }
}

/// Population, vaccination, case, death and excess-mortality series of one country.
///
/// Cumulative series are forward-filled; excess mortality is reported weekly, so absent days
/// are zero instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryDataset {
    pub country: String,
    pub dates: Vec<RecordDate>,
    pub population: Vec<f64>,
    pub vaccinations: Vec<f64>,
    pub cases: Vec<f64>,
    pub deaths: Vec<f64>,
    pub excess_mortality: Vec<f64>,
}

impl CountryDataset {
    pub fn load(layout: &DataLayout, country: &str, window: Window) -> Result<Self, DataError> {
        let date_records = layout.read_dates(country)?;
        let dates = policy::forward_fill(&date_records, RecordDate::new(0, 0, 0));
        let series = |variable: &str| -> Result<Vec<f64>, DataError> {
            Ok(policy::forward_fill(
                &layout.read_numerics(country, variable)?,
                0.0,
            ))
        };
        let population = series("population")?;
        let vaccinations = series("total_vaccinations")?;
        let cases = series("total_cases")?;
        let deaths = series("total_deaths")?;
        let excess_mortality =
            policy::with_default(&layout.read_numerics(country, "excess_mortality")?, 0.0);

        let range = DateRange::locate(
            &policy::as_optional(&date_records),
            window.start,
            window.stop,
            window.rule,
        );
        let slice = |values: &[f64]| match range {
            Some(range) => range.slice(values).to_vec(),
            None => vec![],
        };
        Ok(Self {
            country: country.to_owned(),
            dates: range.map_or_else(Vec::new, |r| r.slice(&dates).to_vec()),
            population: slice(&population),
            vaccinations: slice(&vaccinations),
            cases: slice(&cases),
            deaths: slice(&deaths),
            excess_mortality: slice(&excess_mortality),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Result of loading one country during a batch run.
#[derive(Debug)]
pub struct Outcome<T> {
    pub country: String,
    pub result: Result<T, DataError>,
}

/// Latest usable value of one variable for one country.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecentValue {
    /// Newest value above the minimum within the last [`policy::RECENT_WINDOW`] days.
    pub above: Option<f64>,
    /// Final value of the series, absent records read as zero.
    pub last: Option<f64>,
}

impl RecentValue {
    #[must_use]
    pub fn from_records(records: &[Record<f64>], minimal: f64) -> Self {
        let values = policy::with_default(records, 0.0);
        Self {
            above: policy::recent_above(&values, minimal, policy::RECENT_WINDOW),
            last: values.last().copied(),
        }
    }

    /// The recent value, falling back to the final one.
    #[must_use]
    pub fn or_last(&self) -> Option<f64> {
        self.above.or(self.last)
    }
}

/// Reads `variable` for every country and selects its recent value above `minimal`.
pub fn recent_values<'a, I>(
    layout: &DataLayout,
    countries: I,
    variable: &str,
    minimal: f64,
) -> Vec<Outcome<RecentValue>>
where
    I: IntoIterator<Item = &'a str>,
{
    countries
        .into_iter()
        .map(|country| Outcome {
            country: country.to_owned(),
            result: layout
                .read_numerics(country, variable)
                .map(|records| RecentValue::from_records(&records, minimal)),
        })
        .collect()
}

/// Loads the dataset of every country in the catalog, keeping failures per country.
pub fn gather(layout: &DataLayout, catalog: &CountryCatalog, window: Window) -> Vec<Outcome<CountryDataset>> {
    catalog
        .iter()
        .map(|country| {
            tracing::debug!("parsing data for country [{country}]");
            Outcome {
                country: country.to_owned(),
                result: CountryDataset::load(layout, country, window),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_country(layout: &DataLayout, country: &str) {
        let dates = [
            RecordDate::new(2020, 12, 31),
            RecordDate::new(2021, 1, 1),
            RecordDate::new(2021, 1, 2),
            RecordDate::new(2021, 1, 3),
        ]
        .map(Record::present);
        layout.write_dates(country, &dates).unwrap();
        let numeric = [
            Record::present(1.0),
            Record::absent(),
            Record::present(3.0),
            Record::absent(),
        ];
        for variable in [
            "population",
            "total_vaccinations",
            "total_cases",
            "total_deaths",
            "excess_mortality",
        ] {
            layout.write_numerics(country, variable, &numeric).unwrap();
        }
    }

    #[test]
    fn test_load_slices_every_series() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        write_country(&layout, "Peru");
        let window = Window {
            start: Some(RecordDate::new(2021, 1, 1)),
            stop: Some(RecordDate::new(2021, 1, 2)),
            rule: MatchRule::FirstMatch,
        };
        let dataset = CountryDataset::load(&layout, "Peru", window).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.dates[0], RecordDate::new(2021, 1, 1));
        assert_eq!(dataset.cases, vec![1.0, 3.0]);
        assert_eq!(dataset.excess_mortality, vec![0.0, 3.0]);
    }

    #[test]
    fn test_gather_keeps_per_country_failures() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        write_country(&layout, "Peru");
        let catalog = CountryCatalog::parse("Peru\nAtlantis\n");
        let outcomes = gather(&layout, &catalog, Window::default());
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].result.is_ok());
        assert!(matches!(
            outcomes[1].result,
            Err(DataError::DataFileNotFound { .. })
        ));
    }

    #[test]
    fn test_recent_value_falls_back_to_last() {
        let records = [Record::present(5.0), Record::present(0.5), Record::absent()];
        let value = RecentValue::from_records(&records, 1.0);
        assert_eq!(value.above, Some(5.0));
        assert_eq!(value.last, Some(0.0));

        let value = RecentValue::from_records(&records, 10.0);
        assert_eq!(value.above, None);
        assert_eq!(value.or_last(), Some(0.0));
        assert_eq!(RecentValue::from_records(&[], 0.0).or_last(), None);
    }

    #[test]
    fn test_recent_values_per_country() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        write_country(&layout, "Peru");
        let outcomes = recent_values(&layout, ["Peru", "Atlantis"], "total_cases", 0.0);
        assert_eq!(outcomes[0].result.as_ref().unwrap().above, Some(3.0));
        assert!(outcomes[1].result.is_err());
    }
}
