use std::path::PathBuf;

use anyhow::Context;
use covdi_data::{catalog, report};
use covdi_stats::descriptive;

use crate::util::{self, DataArgs};

const DEFAULT_OUTPUT: &str = "Subset_Results.txt";

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SubsetSummaryArg {
    /// Variable to summarise
    variable: String,
    /// Subset file: a title line then one country per line, each section closed by `END`
    #[arg(long)]
    subsets: PathBuf,
    /// Only values strictly above this count as recent
    #[arg(long, default_value_t = 0.0)]
    minimal_value: f64,
    /// Output file path
    #[arg(long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,
    /// Fail on the first country without data
    #[arg(long)]
    strict: bool,
}

#[derive(Debug)]
struct SubsetValues {
    title: String,
    values: Vec<(String, Option<f64>)>,
}

/// One block per subset: a blank line, `title, variable`, the average, then `country, value`
/// lines. Countries without a value are listed as `nan` and left out of the average.
fn render(subsets: &[SubsetValues], variable: &str) -> String {
    let mut out = String::new();
    for subset in subsets {
        let present = subset
            .values
            .iter()
            .filter_map(|(_, v)| *v)
            .collect::<Vec<_>>();
        let average = descriptive::mean(&present).unwrap_or(f64::NAN);
        out.push_str(&format!("\n{}, {variable}\nAverage: {average}\n", subset.title));
        for (country, value) in &subset.values {
            let value = value.map_or_else(|| "nan".to_owned(), |v| v.to_string());
            out.push_str(&format!("{country}, {value}\n"));
        }
    }
    out
}

pub(crate) fn run(data: &DataArgs, arg: &SubsetSummaryArg) -> anyhow::Result<()> {
    let layout = data.layout();
    let subsets = catalog::load_subsets(&arg.subsets)
        .with_context(|| format!("Failed to load subsets: {}", arg.subsets.display()))?;

    let mut summaries = Vec::with_capacity(subsets.len());
    for subset in subsets {
        let values = util::load_recent_values(
            &layout,
            subset.countries.iter().map(String::as_str),
            &arg.variable,
            arg.minimal_value,
            arg.strict,
        )?
        .into_iter()
        .map(|(country, value)| (country, value.or_last()))
        .collect();
        summaries.push(SubsetValues {
            title: subset.title,
            values,
        });
    }

    let text = render(&summaries, &arg.variable);
    report::write_atomic(&arg.output, text.as_bytes())
        .with_context(|| format!("Failed to write summary: {}", arg.output.display()))?;
    tracing::info!("Wrote {} subsets to {}", summaries.len(), arg.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let subsets = [
            SubsetValues {
                title: "Subset 1".to_owned(),
                values: vec![
                    ("Norway".to_owned(), Some(2.0)),
                    ("Chad".to_owned(), None),
                    ("Mali".to_owned(), Some(4.0)),
                ],
            },
            SubsetValues {
                title: "Subset 2".to_owned(),
                values: vec![("Peru".to_owned(), Some(1.5))],
            },
        ];
        assert_eq!(
            render(&subsets, "total_deaths"),
            "\nSubset 1, total_deaths\nAverage: 3\nNorway, 2\nChad, nan\nMali, 4\n\
             \nSubset 2, total_deaths\nAverage: 1.5\nPeru, 1.5\n"
        );
    }
}
