use std::path::PathBuf;

use anyhow::Context;
use covdi_stats::{
    bootstrap,
    comprehensive::{ComprehensiveStats, DEFAULT_PERCENTILES},
    descriptive,
};
use serde::Serialize;

use crate::util::{self, DataArgs, Output, SeedArg};

pub(crate) const HISTOGRAM_WIDTH: usize = 50;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct BootstrapArg {
    /// Variable to resample
    variable: String,
    /// Only values strictly above this count as recent
    #[arg(long, default_value_t = 0.0)]
    minimal_value: f64,
    /// Countries drawn per subsample
    #[arg(long, default_value_t = 5)]
    subset_size: usize,
    /// Number of subsamples
    #[arg(long, default_value_t = 10000)]
    samples: usize,
    /// Histogram bins
    #[arg(long, default_value_t = 50)]
    bins: usize,
    #[clap(flatten)]
    seed: SeedArg,
    /// Write the subsample means to this CSV file
    #[arg(long)]
    export: Option<PathBuf>,
    /// Fail on the first country without data
    #[arg(long)]
    strict: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct MeanRow<'a> {
    pub group: &'a str,
    pub sample: usize,
    pub mean: f64,
}

/// Prints the summary and histogram of a resampled distribution.
pub(crate) fn print_distribution(title: &str, summary: &ComprehensiveStats) {
    println!("{title}");
    println!(
        "  mean: {:.4}  std dev: {:.4}  min: {:.4}  max: {:.4}",
        summary.stats.mean, summary.stats.std_dev, summary.stats.min, summary.stats.max
    );
    let percentiles = summary
        .percentiles
        .iter()
        .map(|(p, v)| format!("p{p}: {v:.4}"))
        .collect::<Vec<_>>()
        .join("  ");
    println!("  {percentiles}");
    print!("{}", summary.histogram.render(HISTOGRAM_WIDTH));
    println!();
}

pub(crate) fn run(data: &DataArgs, arg: &BootstrapArg) -> anyhow::Result<()> {
    let layout = data.layout();
    let catalog = layout.load_catalog().with_context(|| {
        format!(
            "Failed to load manifest: {}",
            layout.manifest_path().display()
        )
    })?;
    let values = util::load_recent_values(
        &layout,
        &catalog,
        &arg.variable,
        arg.minimal_value,
        arg.strict,
    )?
    .into_iter()
    .filter_map(|(_, value)| value.above)
    .collect::<Vec<_>>();
    tracing::info!(
        "{} of {} countries have a recent {} above {}",
        values.len(),
        catalog.len(),
        arg.variable,
        arg.minimal_value
    );

    let mut rng = arg.seed.rng();
    let means = bootstrap::resample_means(&values, arg.subset_size, arg.samples, &mut rng)
        .with_context(|| format!("Failed to resample {}", arg.variable))?;
    let summary = ComprehensiveStats::new(means.iter().copied(), &DEFAULT_PERCENTILES, arg.bins, None)
        .context("No subsamples drawn")?;

    if let Some(mean) = descriptive::mean(&values) {
        println!("Mean of {} over {} countries: {mean:.4}", arg.variable, values.len());
    }
    let title = format!(
        "{} subsamples of {} with subset-size {}",
        arg.samples, arg.variable, arg.subset_size
    );
    print_distribution(&title, &summary);

    if let Some(path) = &arg.export {
        let rows = means.iter().enumerate().map(|(sample, &mean)| MeanRow {
            group: &arg.variable,
            sample,
            mean,
        });
        Output::save_csv(rows, path.clone())?;
    }
    Ok(())
}
