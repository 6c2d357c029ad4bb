use clap::{Parser, Subcommand};

use crate::util::DataArgs;

use self::{
    append::AppendArg,
    bootstrap::BootstrapArg,
    compare::{CompareRegimesArg, CompareSubsetsArg},
    correlate::CorrelateArg,
    enumerate::EnumerateArg,
    extract::ExtractArg,
    gather::GatherArg,
    predict::{EvaluatePredictionsArg, PredictIndicesArg},
    report::{ReportArg, ShowArg},
    split::SplitArg,
    subset_summary::SubsetSummaryArg,
};

mod append;
mod bootstrap;
mod compare;
mod correlate;
mod enumerate;
mod extract;
mod gather;
mod predict;
mod report;
mod split;
mod subset_summary;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(flatten)]
    data: DataArgs,
    /// What analysis to run
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Write the country manifest from the sub-directories of the data tree
    Enumerate(#[clap(flatten)] EnumerateArg),
    /// Split an OWID CSV export into the per-country data tree
    Split(#[clap(flatten)] SplitArg),
    /// Print the latest value of a variable for every country
    Report(#[clap(flatten)] ReportArg),
    /// Print one variable of one country day by day
    Show(#[clap(flatten)] ShowArg),
    /// Collect the per-country datasets of a date range as JSON
    Gather(#[clap(flatten)] GatherArg),
    /// Add recent values of variables as columns of the countries report
    Extract(#[clap(flatten)] ExtractArg),
    /// Append the last value of a variable to an existing report
    Append(#[clap(flatten)] AppendArg),
    /// Bootstrap the mean of a variable across countries
    Bootstrap(#[clap(flatten)] BootstrapArg),
    /// Compare a variable between democracy-index regimes
    CompareRegimes(#[clap(flatten)] CompareRegimesArg),
    /// Compare a variable between country subsets
    CompareSubsets(#[clap(flatten)] CompareSubsetsArg),
    /// Write the average and per-country values of each country subset
    SubsetSummary(#[clap(flatten)] SubsetSummaryArg),
    /// Correlate two columns of a report table
    Correlate(#[clap(flatten)] CorrelateArg),
    /// Predict next year's governance indicators
    PredictIndices(#[clap(flatten)] PredictIndicesArg),
    /// Measure prediction error against the most recent year
    EvaluatePredictions(#[clap(flatten)] EvaluatePredictionsArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    let data = &args.data;
    match &args.mode {
        Mode::Enumerate(arg) => enumerate::run(data, arg)?,
        Mode::Split(arg) => split::run(data, arg)?,
        Mode::Report(arg) => report::run_report(data, arg)?,
        Mode::Show(arg) => report::run_show(data, arg)?,
        Mode::Gather(arg) => gather::run(data, arg)?,
        Mode::Extract(arg) => extract::run(data, arg)?,
        Mode::Append(arg) => append::run(data, arg)?,
        Mode::Bootstrap(arg) => bootstrap::run(data, arg)?,
        Mode::CompareRegimes(arg) => compare::run_regimes(data, arg)?,
        Mode::CompareSubsets(arg) => compare::run_subsets(data, arg)?,
        Mode::SubsetSummary(arg) => subset_summary::run(data, arg)?,
        Mode::Correlate(arg) => correlate::run(arg)?,
        Mode::PredictIndices(arg) => predict::run_predict(arg)?,
        Mode::EvaluatePredictions(arg) => predict::run_evaluate(arg)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn test_command_definition() {
        CommandArgs::command().debug_assert();
    }

    #[test]
    fn test_global_data_options() {
        let args = CommandArgs::try_parse_from([
            "covdi",
            "report",
            "total_deaths",
            "--data-dir",
            "covid",
            "--strict-records",
        ])
        .unwrap();
        let layout = args.data.layout();
        assert_eq!(layout.root(), std::path::Path::new("covid"));
        assert_eq!(
            layout.manifest_path(),
            std::path::Path::new("covid").join("countries.txt")
        );
        assert!(matches!(args.mode, Mode::Report(_)));
    }

    #[test]
    fn test_missing_subcommand_is_an_error() {
        assert!(CommandArgs::try_parse_from(["covdi"]).is_err());
    }
}
