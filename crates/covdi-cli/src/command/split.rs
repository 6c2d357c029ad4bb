use std::path::PathBuf;

use anyhow::Context;
use covdi_data::owid;

use crate::util::{DataArgs, Output};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SplitArg {
    /// OWID COVID-19 CSV export
    input: PathBuf,
    /// Write a JSON summary of the split to this file
    #[arg(long)]
    summary: Option<PathBuf>,
}

pub(crate) fn run(data: &DataArgs, arg: &SplitArg) -> anyhow::Result<()> {
    let layout = data.layout();
    tracing::info!("Splitting {}...", arg.input.display());
    let summary = owid::split_file(&arg.input, &layout)
        .with_context(|| format!("Failed to split {}", arg.input.display()))?;
    tracing::info!(
        "Wrote {} rows for {} countries ({} variables) under {}",
        summary.rows,
        summary.countries,
        summary.variables.len(),
        layout.root().display()
    );
    if let Some(path) = &arg.summary {
        Output::save_json(&summary, Some(path.clone()))?;
    }
    Ok(())
}
