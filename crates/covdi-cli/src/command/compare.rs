use std::path::PathBuf;

use anyhow::Context;
use covdi_data::{
    catalog::{self, CountrySubset},
    democracy::{Regime, ScoreSheet},
    layout::DataLayout,
};
use covdi_stats::{
    bootstrap,
    comprehensive::{ComprehensiveStats, DEFAULT_PERCENTILES},
    hypothesis::{KsTest, MannWhitneyU, TestError},
};
use rand::Rng;

use super::bootstrap::{MeanRow, print_distribution};
use crate::util::{self, DataArgs, Output, SeedArg};

const DEFAULT_SCORES: &str = "democracy_index_2020.txt";
/// Pairs compared with the Kolmogorov-Smirnov test, by group index.
const KS_PAIRS: [(usize, usize); 4] = [(0, 1), (0, 2), (0, 3), (1, 2)];

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct CompareRegimesArg {
    /// Variable to compare
    variable: String,
    /// Democracy index scores as `Country, score` lines
    #[arg(long, default_value = DEFAULT_SCORES)]
    scores: PathBuf,
    /// Countries drawn per authoritarian subsample; other regimes draw their own size
    #[arg(long, default_value_t = 200)]
    authoritarian_subset_size: usize,
    #[clap(flatten)]
    resample: ResampleArg,
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct CompareSubsetsArg {
    /// Variable to compare
    variable: String,
    /// Subset file: a title line then one country per line, each section closed by `END`
    #[arg(long)]
    subsets: PathBuf,
    #[clap(flatten)]
    resample: ResampleArg,
}

#[derive(Debug, Clone, clap::Args)]
struct ResampleArg {
    /// Number of subsamples per group
    #[arg(long, default_value_t = 10000)]
    samples: usize,
    /// Histogram bins
    #[arg(long, default_value_t = 50)]
    bins: usize,
    #[clap(flatten)]
    seed: SeedArg,
    /// Write the subsample means of every group to this CSV file
    #[arg(long)]
    export: Option<PathBuf>,
    /// Fail on the first country without data
    #[arg(long)]
    strict: bool,
}

/// Per-country values of one group and their bootstrapped means.
#[derive(Debug)]
struct Group {
    title: String,
    values: Vec<f64>,
    means: Vec<f64>,
}

impl Group {
    /// Recent value above zero of each country, `0.0` when none qualifies.
    fn load(
        layout: &DataLayout,
        subset: &CountrySubset,
        variable: &str,
        strict: bool,
    ) -> anyhow::Result<Self> {
        let values = util::load_recent_values(
            layout,
            subset.countries.iter().map(String::as_str),
            variable,
            0.0,
            strict,
        )?
        .into_iter()
        .map(|(_, value)| value.above.unwrap_or(0.0))
        .collect::<Vec<_>>();
        tracing::info!("{}: {} countries", subset.title, values.len());
        Ok(Self {
            title: subset.title.clone(),
            values,
            means: vec![],
        })
    }

    fn resample<R>(&mut self, subset_size: usize, samples: usize, rng: &mut R) -> anyhow::Result<()>
    where
        R: Rng + ?Sized,
    {
        if self.values.is_empty() {
            tracing::warn!("{} has no countries, not resampled", self.title);
            return Ok(());
        }
        self.means = bootstrap::resample_means(&self.values, subset_size, samples, rng)
            .with_context(|| format!("Failed to resample {}", self.title))?;
        Ok(())
    }
}

/// Pairs of `KS_PAIRS` that exist among `len` groups.
fn ks_pairs(len: usize) -> impl Iterator<Item = (usize, usize)> {
    KS_PAIRS.into_iter().filter(move |&(_, j)| j < len)
}

fn all_pairs(len: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..len).flat_map(move |i| (i + 1..len).map(move |j| (i, j)))
}

fn print_test(a: &str, b: &str, result: Result<(f64, f64), TestError>, name: &str) {
    match result {
        Ok((statistic, p_value)) => {
            println!("  {a} vs {b}: {name} = {statistic:.4}, p = {p_value:.4e}");
        }
        Err(err) => println!("  {a} vs {b}: not computed ({err})"),
    }
}

/// Runs both tests on the samples chosen by `sample`, one line per pair.
fn print_tests<F>(groups: &[Group], sample: F)
where
    F: Fn(&Group) -> &[f64],
{
    println!("Kolmogorov-Smirnov");
    for (i, j) in ks_pairs(groups.len()) {
        let (a, b) = (&groups[i], &groups[j]);
        let result = KsTest::two_sample(sample(a), sample(b)).map(|t| (t.statistic, t.p_value));
        print_test(&a.title, &b.title, result, "D");
    }
    println!("Mann-Whitney U");
    for (i, j) in all_pairs(groups.len()) {
        let (a, b) = (&groups[i], &groups[j]);
        let result =
            MannWhitneyU::two_sided(sample(a), sample(b)).map(|t| (t.statistic, t.p_value));
        print_test(&a.title, &b.title, result, "U");
    }
    println!();
}

fn print_distributions(groups: &[Group], variable: &str, arg: &ResampleArg) -> anyhow::Result<()> {
    for group in groups {
        let Some(summary) =
            ComprehensiveStats::new(group.means.iter().copied(), &DEFAULT_PERCENTILES, arg.bins, None)
        else {
            continue;
        };
        let title = format!(
            "{}: {} subsamples of {variable} over {} countries",
            group.title,
            group.means.len(),
            group.values.len()
        );
        print_distribution(&title, &summary);
    }
    if let Some(path) = &arg.export {
        let rows = groups.iter().flat_map(|group| {
            group
                .means
                .iter()
                .enumerate()
                .map(move |(sample, &mean)| MeanRow {
                    group: &group.title,
                    sample,
                    mean,
                })
        });
        Output::save_csv(rows, path.clone())?;
    }
    Ok(())
}

pub(crate) fn run_regimes(data: &DataArgs, arg: &CompareRegimesArg) -> anyhow::Result<()> {
    let layout = data.layout();
    let sheet = ScoreSheet::load(&arg.scores)
        .with_context(|| format!("Failed to load scores: {}", arg.scores.display()))?;
    if !sheet.rejected.is_empty() {
        tracing::warn!("{} score lines rejected", sheet.rejected.len());
    }

    let mut rng = arg.resample.seed.rng();
    let mut groups = vec![];
    for (regime, subset) in Regime::ALL.into_iter().zip(sheet.group_by_regime()) {
        let mut group = Group::load(&layout, &subset, &arg.variable, arg.resample.strict)?;
        let subset_size = if regime == Regime::Authoritarian {
            arg.authoritarian_subset_size
        } else {
            group.values.len()
        };
        group.resample(subset_size, arg.resample.samples, &mut rng)?;
        groups.push(group);
    }

    println!("Bootstrapped means of {} by regime", arg.variable);
    print_tests(&groups, |g| g.means.as_slice());
    print_distributions(&groups, &arg.variable, &arg.resample)
}

pub(crate) fn run_subsets(data: &DataArgs, arg: &CompareSubsetsArg) -> anyhow::Result<()> {
    let layout = data.layout();
    let subsets = catalog::load_subsets(&arg.subsets)
        .with_context(|| format!("Failed to load subsets: {}", arg.subsets.display()))?;
    if subsets.len() < 2 {
        anyhow::bail!(
            "{} defines {} subsets, at least 2 are needed",
            arg.subsets.display(),
            subsets.len()
        );
    }

    let mut rng = arg.resample.seed.rng();
    let mut groups = vec![];
    for subset in &subsets {
        let mut group = Group::load(&layout, subset, &arg.variable, arg.resample.strict)?;
        let subset_size = group.values.len();
        group.resample(subset_size, arg.resample.samples, &mut rng)?;
        groups.push(group);
    }

    println!("Per-country values of {} by subset", arg.variable);
    print_tests(&groups, |g| g.values.as_slice());
    print_distributions(&groups, &arg.variable, &arg.resample)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_pairs() {
        assert_eq!(ks_pairs(4).collect::<Vec<_>>(), KS_PAIRS);
        assert_eq!(ks_pairs(2).collect::<Vec<_>>(), [(0, 1)]);
        assert_eq!(all_pairs(4).count(), 6);
        assert_eq!(all_pairs(3).collect::<Vec<_>>(), [(0, 1), (0, 2), (1, 2)]);
        assert_eq!(all_pairs(1).count(), 0);
    }

    #[test]
    fn test_empty_group_is_not_resampled() {
        let mut group = Group {
            title: "Empty".to_owned(),
            values: vec![],
            means: vec![],
        };
        group.resample(5, 10, &mut Pcg32::seed_from_u64(0)).unwrap();
        assert!(group.means.is_empty());
    }

    #[test]
    fn test_group_resample() {
        let mut group = Group {
            title: "Pair".to_owned(),
            values: vec![1.0, 3.0],
            means: vec![],
        };
        group.resample(2, 100, &mut Pcg32::seed_from_u64(9)).unwrap();
        assert_eq!(group.means.len(), 100);
        assert!(group.means.iter().all(|m| [1.0, 2.0, 3.0].contains(m)));
    }
}
