use std::path::PathBuf;

use anyhow::Context;
use covdi_data::report::ReportTable;
use covdi_stats::regression::{self, LinearRegression};
use serde::Serialize;

use crate::util::Output;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct CorrelateArg {
    /// Report table holding both columns, e.g. "Countries Data File.txt"
    table: PathBuf,
    /// Column plotted on the x axis
    x: String,
    /// Column plotted on the y axis
    y: String,
    /// Write the points and both fits to this CSV file
    #[arg(long)]
    export: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct PointRow<'a> {
    country: &'a str,
    x: f64,
    y: f64,
    fitted: f64,
    log_x: f64,
    log_y: f64,
    log_fitted: f64,
}

/// Rows where both values are finite.
fn finite_points<'a>(keys: &[&'a str], xs: &[f64], ys: &[f64]) -> Vec<(&'a str, f64, f64)> {
    keys.iter()
        .zip(xs.iter().zip(ys))
        .filter(|(_, (x, y))| x.is_finite() && y.is_finite())
        .map(|(&key, (&x, &y))| (key, x, y))
        .collect()
}

pub(crate) fn run(arg: &CorrelateArg) -> anyhow::Result<()> {
    let table = ReportTable::load(&arg.table)
        .with_context(|| format!("Failed to load report: {}", arg.table.display()))?;
    let xs = table
        .numeric_column(&arg.x)
        .with_context(|| format!("Failed to read column {} of {}", arg.x, arg.table.display()))?;
    let ys = table
        .numeric_column(&arg.y)
        .with_context(|| format!("Failed to read column {} of {}", arg.y, arg.table.display()))?;
    let keys = table.keys().collect::<Vec<_>>();
    let points = finite_points(&keys, &xs, &ys);
    if points.len() < keys.len() {
        tracing::warn!("{} rows without both values skipped", keys.len() - points.len());
    }

    let x = points.iter().map(|p| p.1).collect::<Vec<_>>();
    let y = points.iter().map(|p| p.2).collect::<Vec<_>>();
    let log_x = x.iter().map(|&v| regression::log1p10(v)).collect::<Vec<_>>();
    let log_y = y.iter().map(|&v| regression::log1p10(v)).collect::<Vec<_>>();
    let fit = LinearRegression::fit(&x, &y)
        .with_context(|| format!("Failed to fit {} against {}", arg.y, arg.x))?;
    let log_fit = LinearRegression::fit(&log_x, &log_y)
        .with_context(|| format!("Failed to fit log-transformed {} against {}", arg.y, arg.x))?;

    println!("{} vs {} over {} countries", arg.y, arg.x, points.len());
    println!(
        "Pearson R: {:.4} (p = {:.4e}, std err = {:.4e})",
        fit.r, fit.p_value, fit.std_err
    );
    println!("Linear fit: intercept {}, slope {}", fit.intercept, fit.slope);
    println!(
        "Fit of log10(v + 1): intercept {}, slope {}, R {:.4}",
        log_fit.intercept, log_fit.slope, log_fit.r
    );

    if let Some(path) = &arg.export {
        let rows = points.iter().enumerate().map(|(i, &(country, x, y))| PointRow {
            country,
            x,
            y,
            fitted: fit.predict(x),
            log_x: log_x[i],
            log_y: log_y[i],
            log_fitted: log_fit.predict(log_x[i]),
        });
        Output::save_csv(rows, path.clone())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finite_points() {
        let keys = ["Peru", "Chile", "Chad"];
        let points = finite_points(&keys, &[1.0, f64::NAN, 3.0], &[2.0, 4.0, 6.0]);
        assert_eq!(points, [("Peru", 1.0, 2.0), ("Chad", 3.0, 6.0)]);
    }
}
