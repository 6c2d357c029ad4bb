use std::path::PathBuf;

use anyhow::Context;
use covdi_data::{
    eiu::{Indicator, IndexTable},
    report::ReportTable,
};
use covdi_stats::extrapolation::{Extrapolation, ExtrapolationError};

const DEFAULT_EIU: &str = "data/EIU_Data.csv";
const DEFAULT_PREDICTIONS: &str = "data/2021IndexPredictions.txt";
const MISSING_CELL: &str = "nan";

#[derive(Debug, Clone, clap::Args)]
struct ModelArg {
    /// Governance indicator table
    #[arg(long, default_value = DEFAULT_EIU)]
    eiu: PathBuf,
    /// Number of past years the prediction is fitted on
    #[arg(long, default_value_t = 3)]
    years: usize,
    /// Weight exponent: year `b` of the window is repeated `(b + 1)^exponent` times
    #[arg(long, default_value_t = 8)]
    exponent: u32,
    /// Degree of the fitted polynomial
    #[arg(long, default_value_t = 1)]
    degree: usize,
}

impl ModelArg {
    fn model(&self) -> Extrapolation {
        Extrapolation {
            exponent: self.exponent,
            degree: self.degree,
        }
    }

    fn load_table(&self) -> anyhow::Result<IndexTable> {
        let table = IndexTable::load(&self.eiu)
            .with_context(|| format!("Failed to load index table: {}", self.eiu.display()))?;
        tracing::info!("Loaded {} countries from {}", table.rows.len(), self.eiu.display());
        Ok(table)
    }
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PredictIndicesArg {
    #[clap(flatten)]
    model: ModelArg,
    /// Copy the most recent year instead of extrapolating
    #[arg(long)]
    reuse: bool,
    /// Output file path
    #[arg(long, default_value = DEFAULT_PREDICTIONS)]
    output: PathBuf,
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct EvaluatePredictionsArg {
    #[clap(flatten)]
    model: ModelArg,
}

/// One row per country with a predicted value per indicator.
fn predict_table(
    table: &IndexTable,
    model: Extrapolation,
    years: usize,
    reuse: bool,
) -> Result<ReportTable, ExtrapolationError> {
    let header = std::iter::once("country".to_owned())
        .chain(Indicator::ALL.iter().map(ToString::to_string))
        .collect();
    let mut rows = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let mut cells = vec![row.country.clone()];
        for indicator in Indicator::ALL {
            let value = if reuse {
                row.year(0).and_then(|block| block[indicator.offset()])
            } else {
                model.predict(&row.series(indicator, 0, years))?
            };
            cells.push(value.map_or_else(|| MISSING_CELL.to_owned(), |v| v.to_string()));
        }
        rows.push(cells);
    }
    Ok(ReportTable { header, rows })
}

/// Summed absolute errors over the cells where the truth, the prediction and the previous
/// year all exist.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ErrorTotals {
    cells: usize,
    prediction: f64,
    previous_year: f64,
}

impl ErrorTotals {
    fn add(&mut self, truth: f64, predicted: f64, previous: f64) {
        self.cells += 1;
        self.prediction += (truth - predicted).abs();
        self.previous_year += (truth - previous).abs();
    }
}

/// Predicts the most recent year from the `years` before it, per indicator.
fn evaluate(
    table: &IndexTable,
    model: Extrapolation,
    years: usize,
) -> Result<Vec<(Indicator, ErrorTotals)>, ExtrapolationError> {
    let mut totals = Indicator::ALL.map(|indicator| (indicator, ErrorTotals::default()));
    for row in &table.rows {
        let (Some(truth), Some(previous)) = (row.year(0), row.year(1)) else {
            continue;
        };
        for (indicator, total) in &mut totals {
            let offset = indicator.offset();
            let predicted = model.predict(&row.series(*indicator, 1, years))?;
            if let (Some(t), Some(p), Some(prev)) = (truth[offset], predicted, previous[offset]) {
                total.add(t, p, prev);
            }
        }
    }
    Ok(totals.to_vec())
}

pub(crate) fn run_predict(arg: &PredictIndicesArg) -> anyhow::Result<()> {
    let table = arg.model.load_table()?;
    let predictions = predict_table(&table, arg.model.model(), arg.model.years, arg.reuse)
        .context("Failed to extrapolate indicators")?;
    predictions
        .save(&arg.output)
        .with_context(|| format!("Failed to write predictions: {}", arg.output.display()))?;
    tracing::info!(
        "Wrote {} predictions to {}",
        predictions.rows.len(),
        arg.output.display()
    );
    Ok(())
}

pub(crate) fn run_evaluate(arg: &EvaluatePredictionsArg) -> anyhow::Result<()> {
    let table = arg.model.load_table()?;
    let totals = evaluate(&table, arg.model.model(), arg.model.years)
        .context("Failed to extrapolate indicators")?;

    let mut overall = ErrorTotals::default();
    println!("indicator, cells, prediction error, previous-year error");
    for (indicator, total) in &totals {
        println!(
            "{indicator}, {}, {:.4}, {:.4}",
            total.cells, total.prediction, total.previous_year
        );
        overall.cells += total.cells;
        overall.prediction += total.prediction;
        overall.previous_year += total.previous_year;
    }
    println!(
        "all, {}, {:.4}, {:.4}",
        overall.cells, overall.prediction, overall.previous_year
    );
    Ok(())
}
