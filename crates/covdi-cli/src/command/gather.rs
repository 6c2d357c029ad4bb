use std::path::PathBuf;

use anyhow::Context;
use covdi_data::{
    gather::{self, CountryDataset, DEFAULT_START, DEFAULT_STOP, Window},
    layout::DataLayout,
    range::MatchRule,
    record::RecordDate,
};
use serde::Serialize;

use crate::util::{self, DataArgs, Output};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct GatherArg {
    /// First day of the range (YYYY-MM-DD)
    #[arg(long, default_value_t = DEFAULT_START)]
    start: RecordDate,
    /// Last day of the range (YYYY-MM-DD)
    #[arg(long, default_value_t = DEFAULT_STOP)]
    stop: RecordDate,
    /// Use the last occurrence of a repeated date as range bound
    #[arg(long)]
    last_match: bool,
    /// Fail on the first country without data
    #[arg(long)]
    strict: bool,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct GatherOutput {
    start: RecordDate,
    stop: RecordDate,
    datasets: Vec<CountryDataset>,
}

fn gather_output(layout: &DataLayout, arg: &GatherArg) -> anyhow::Result<GatherOutput> {
    let catalog = layout.load_catalog().with_context(|| {
        format!(
            "Failed to load manifest: {}",
            layout.manifest_path().display()
        )
    })?;
    let window = Window {
        start: Some(arg.start),
        stop: Some(arg.stop),
        rule: if arg.last_match {
            MatchRule::LastMatch
        } else {
            MatchRule::FirstMatch
        },
    };

    tracing::info!("Loading {} countries...", catalog.len());
    let outcomes = gather::gather(layout, &catalog, window);
    let datasets = util::collect_outcomes(outcomes, arg.strict)?
        .into_iter()
        .map(|(_, dataset)| dataset)
        .collect::<Vec<_>>();
    for dataset in datasets.iter().filter(|d| d.is_empty()) {
        tracing::warn!("{} has no records between {} and {}", dataset.country, arg.start, arg.stop);
    }
    tracing::info!("Loaded {} datasets", datasets.len());

    Ok(GatherOutput {
        start: arg.start,
        stop: arg.stop,
        datasets,
    })
}

pub(crate) fn run(data: &DataArgs, arg: &GatherArg) -> anyhow::Result<()> {
    let output = gather_output(&data.layout(), arg)?;
    Output::save_json(&output, arg.output.clone())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use covdi_data::record::Record;

    use super::*;

    fn gather_arg(strict: bool) -> GatherArg {
        GatherArg {
            start: RecordDate::new(2021, 1, 2),
            stop: RecordDate::new(2021, 1, 3),
            last_match: false,
            strict,
            output: None,
        }
    }

    fn write_peru(layout: &DataLayout) {
        let dates = (1..=4)
            .map(|day| Record::present(RecordDate::new(2021, 1, day)))
            .collect::<Vec<_>>();
        layout.write_dates("Peru", &dates).unwrap();
        let values = [1.0, 2.0, 3.0, 4.0].map(Record::present);
        for variable in [
            "population",
            "total_vaccinations",
            "total_cases",
            "total_deaths",
            "excess_mortality",
        ] {
            layout.write_numerics("Peru", variable, &values).unwrap();
        }
    }

    #[test]
    fn test_gather_output() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        write_peru(&layout);
        fs::write(layout.manifest_path(), "Peru\nAtlantis\n").unwrap();

        let output = gather_output(&layout, &gather_arg(false)).unwrap();
        assert_eq!(output.datasets.len(), 1);
        let peru = &output.datasets[0];
        assert_eq!(peru.dates, [RecordDate::new(2021, 1, 2), RecordDate::new(2021, 1, 3)]);
        assert_eq!(peru.cases, [2.0, 3.0]);

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["start"]["day"], 2);
        assert_eq!(json["datasets"][0]["country"], "Peru");

        assert!(gather_output(&layout, &gather_arg(true)).is_err());
    }
}
