use anyhow::Context;
use covdi_data::{
    gather::Outcome,
    layout::DataLayout,
    policy::{self, NumericFill},
    range::{DateRange, MatchRule},
    record::RecordDate,
};

use crate::util::{self, DataArgs};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ReportArg {
    /// Variable to report, e.g. `total_deaths`
    variable: String,
    /// Fail on the first country without data
    #[arg(long)]
    strict: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum FillMode {
    /// Print absent days as `-`
    Missing,
    /// Substitute `--default-value`
    Default,
    /// Repeat the previous value
    ForwardFill,
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ShowArg {
    country: String,
    variable: String,
    /// How absent days are printed
    #[arg(long, value_enum, default_value_t = FillMode::Missing)]
    fill: FillMode,
    /// Value of absent days with `--fill default`
    #[arg(long, default_value_t = 0.0)]
    default_value: f64,
    /// First day to print (YYYY-MM-DD)
    #[arg(long)]
    start: Option<RecordDate>,
    /// Last day to print (YYYY-MM-DD)
    #[arg(long)]
    stop: Option<RecordDate>,
    /// Use the last occurrence of a repeated date as range bound
    #[arg(long)]
    last_match: bool,
}

/// Last forward-filled value of `variable`, `None` for an empty series.
fn latest_value(layout: &DataLayout, country: &str, variable: &str) -> Outcome<Option<f64>> {
    Outcome {
        country: country.to_owned(),
        result: layout
            .read_numerics(country, variable)
            .map(|records| policy::forward_fill(&records, 0.0).last().copied()),
    }
}

/// Report header followed by one `country: value` line per loaded country.
fn report_lines(layout: &DataLayout, arg: &ReportArg) -> anyhow::Result<Vec<String>> {
    let catalog = layout.load_catalog().with_context(|| {
        format!(
            "Failed to load manifest: {}",
            layout.manifest_path().display()
        )
    })?;
    let outcomes = catalog
        .iter()
        .map(|country| latest_value(layout, country, &arg.variable))
        .collect();
    let values = util::collect_outcomes(outcomes, arg.strict)?;

    let mut lines = vec![format!("--- COUNTRY REPORT FOR SET {} ---", arg.variable)];
    lines.extend(values.into_iter().map(|(country, value)| match value {
        Some(value) => format!("{country}: {value:.1}"),
        None => format!("{country}: -"),
    }));
    Ok(lines)
}

/// `date, value` lines of one country within the requested window.
fn show_lines(layout: &DataLayout, arg: &ShowArg) -> anyhow::Result<Vec<String>> {
    let dates = layout
        .read_dates(&arg.country)
        .with_context(|| format!("Failed to read dates of {}", arg.country))?;
    let records = layout
        .read_numerics(&arg.country, &arg.variable)
        .with_context(|| format!("Failed to read {} of {}", arg.variable, arg.country))?;
    if dates.len() != records.len() {
        tracing::warn!(
            "{} has {} dates but {} {} values",
            arg.country,
            dates.len(),
            records.len(),
            arg.variable
        );
    }

    let values = match arg.fill {
        FillMode::Missing => policy::as_optional(&records),
        FillMode::Default => NumericFill::Default(arg.default_value)
            .resolve(&records)
            .into_iter()
            .map(Some)
            .collect(),
        FillMode::ForwardFill => NumericFill::ForwardFill
            .resolve(&records)
            .into_iter()
            .map(Some)
            .collect(),
    };
    let dates = policy::as_optional(&dates);
    let rule = if arg.last_match {
        MatchRule::LastMatch
    } else {
        MatchRule::FirstMatch
    };
    let Some(range) = DateRange::locate(&dates, arg.start, arg.stop, rule) else {
        tracing::info!("{} has no dates", arg.country);
        return Ok(vec![]);
    };

    let mut lines = vec![format!("date, {}", arg.variable)];
    for (date, value) in range.slice(&dates).iter().zip(range.slice(&values)) {
        let date = date.map_or_else(|| "-".to_owned(), |d| d.to_string());
        let value = value.map_or_else(|| "-".to_owned(), |v| v.to_string());
        lines.push(format!("{date}, {value}"));
    }
    Ok(lines)
}

pub(crate) fn run_report(data: &DataArgs, arg: &ReportArg) -> anyhow::Result<()> {
    for line in report_lines(&data.layout(), arg)? {
        println!("{line}");
    }
    Ok(())
}

pub(crate) fn run_show(data: &DataArgs, arg: &ShowArg) -> anyhow::Result<()> {
    for line in show_lines(&data.layout(), arg)? {
        println!("{line}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use covdi_data::record::Record;

    use super::*;

    fn write_peru(layout: &DataLayout) {
        let dates = (1..=5)
            .map(|day| Record::present(RecordDate::new(2021, 1, day)))
            .collect::<Vec<_>>();
        layout.write_dates("Peru", &dates).unwrap();
        let cases = [
            Record::present(1.0),
            Record::present(2.0),
            Record::absent(),
            Record::present(4.5),
            Record::present(5.0),
        ];
        layout.write_numerics("Peru", "total_cases", &cases).unwrap();
    }

    fn show_arg(fill: FillMode) -> ShowArg {
        ShowArg {
            country: "Peru".to_owned(),
            variable: "total_cases".to_owned(),
            fill,
            default_value: -1.0,
            start: Some(RecordDate::new(2021, 1, 2)),
            stop: Some(RecordDate::new(2021, 1, 4)),
            last_match: false,
        }
    }

    #[test]
    fn test_show_slices_to_window() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        write_peru(&layout);
        assert_eq!(
            show_lines(&layout, &show_arg(FillMode::Missing)).unwrap(),
            [
                "date, total_cases",
                "2021-01-02, 2",
                "2021-01-03, -",
                "2021-01-04, 4.5"
            ]
        );
    }

    #[test]
    fn test_show_fill_modes() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        write_peru(&layout);
        let forward = show_lines(&layout, &show_arg(FillMode::ForwardFill)).unwrap();
        assert_eq!(forward[2], "2021-01-03, 2");
        let default = show_lines(&layout, &show_arg(FillMode::Default)).unwrap();
        assert_eq!(default[2], "2021-01-03, -1");
    }

    #[test]
    fn test_show_open_window_prints_everything() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        write_peru(&layout);
        let arg = ShowArg {
            start: None,
            stop: None,
            ..show_arg(FillMode::Missing)
        };
        let lines = show_lines(&layout, &arg).unwrap();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[5], "2021-01-05, 5");
    }

    #[test]
    fn test_report_skips_countries_without_data() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        write_peru(&layout);
        layout.write_numerics("Chile", "total_cases", &[]).unwrap();
        fs::write(layout.manifest_path(), "Peru\nAtlantis\nChile\n").unwrap();

        let arg = ReportArg {
            variable: "total_cases".to_owned(),
            strict: false,
        };
        assert_eq!(
            report_lines(&layout, &arg).unwrap(),
            [
                "--- COUNTRY REPORT FOR SET total_cases ---",
                "Peru: 5.0",
                "Chile: -"
            ]
        );

        let strict = ReportArg { strict: true, ..arg };
        assert!(report_lines(&layout, &strict).is_err());
    }
}
