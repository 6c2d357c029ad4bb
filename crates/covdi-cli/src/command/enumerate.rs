use anyhow::Context;
use covdi_data::{catalog::CountryCatalog, layout::DataLayout};

use crate::util::DataArgs;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct EnumerateArg {
    /// Print the discovered countries without writing the manifest
    #[arg(long)]
    dry_run: bool,
}

/// Scans the data tree and, unless `dry_run`, writes the manifest.
fn enumerate(layout: &DataLayout, dry_run: bool) -> anyhow::Result<CountryCatalog> {
    let catalog = layout
        .discover_catalog()
        .with_context(|| format!("Failed to scan data directory: {}", layout.root().display()))?;
    tracing::info!("Found {} countries", catalog.len());
    if dry_run {
        return Ok(catalog);
    }

    layout.write_catalog(&catalog).with_context(|| {
        format!(
            "Failed to write manifest: {}",
            layout.manifest_path().display()
        )
    })?;
    tracing::info!("Wrote {}", layout.manifest_path().display());
    Ok(catalog)
}

pub(crate) fn run(data: &DataArgs, arg: &EnumerateArg) -> anyhow::Result<()> {
    let catalog = enumerate(&data.layout(), arg.dry_run)?;
    if arg.dry_run {
        for country in &catalog {
            println!("{country}");
        }
    }
    Ok(())
}
