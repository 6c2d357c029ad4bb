//! Two-sample nonparametric tests: Kolmogorov-Smirnov and Mann-Whitney U.
//!
//! Both report two-sided p-values from their asymptotic distributions.

use serde::Serialize;

use crate::special;

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum TestError {
    #[display("sample {index} is empty")]
    EmptySample { index: usize },
}

fn check_samples(a: &[f64], b: &[f64]) -> Result<(), TestError> {
    if a.is_empty() {
        return Err(TestError::EmptySample { index: 1 });
    }
    if b.is_empty() {
        return Err(TestError::EmptySample { index: 2 });
    }
    Ok(())
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut values = values.to_vec();
    values.sort_by(f64::total_cmp);
    values
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KsTest {
    /// Largest distance between the two empirical distribution functions.
    pub statistic: f64,
    pub p_value: f64,
}

impl KsTest {
    /// # Examples
    ///
    /// ```
    /// use covdi_stats::hypothesis::KsTest;
    ///
    /// let test = KsTest::two_sample(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
    /// assert_eq!(test.statistic, 0.0);
    /// assert_eq!(test.p_value, 1.0);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    pub fn two_sample(a: &[f64], b: &[f64]) -> Result<Self, TestError> {
        check_samples(a, b)?;
        let a = sorted(a);
        let b = sorted(b);
        let (n1, n2) = (a.len() as f64, b.len() as f64);

        let (mut i, mut j) = (0, 0);
        let mut statistic = 0.0_f64;
        while i < a.len() && j < b.len() {
            let x = a[i].min(b[j]);
            while i < a.len() && a[i] <= x {
                i += 1;
            }
            while j < b.len() && b[j] <= x {
                j += 1;
            }
            statistic = statistic.max((i as f64 / n1 - j as f64 / n2).abs());
        }

        let en = (n1 * n2 / (n1 + n2)).sqrt();
        let p_value = kolmogorov_q((en + 0.12 + 0.11 / en) * statistic);
        Ok(Self { statistic, p_value })
    }
}

/// Survival function of the Kolmogorov distribution.
fn kolmogorov_q(lambda: f64) -> f64 {
    const EPS1: f64 = 1.0e-6;
    const EPS2: f64 = 1.0e-16;
    if lambda < 1.0e-3 {
        return 1.0;
    }
    let a2 = -2.0 * lambda * lambda;
    let mut fac = 2.0;
    let mut sum = 0.0;
    let mut prev_term = 0.0_f64;
    for j in 1..=100_u32 {
        let j = f64::from(j);
        let term = fac * (a2 * j * j).exp();
        sum += term;
        if term.abs() <= EPS1 * prev_term || term.abs() <= EPS2 * sum {
            return sum.clamp(0.0, 1.0);
        }
        fac = -fac;
        prev_term = term.abs();
    }
    // Did not converge: the series only fails for lambda close to zero.
    1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MannWhitneyU {
    /// U statistic of the first sample.
    pub statistic: f64,
    pub p_value: f64,
}

impl MannWhitneyU {
    /// Two-sided test with tie and continuity corrections.
    ///
    /// # Examples
    ///
    /// ```
    /// use covdi_stats::hypothesis::MannWhitneyU;
    ///
    /// let test = MannWhitneyU::two_sided(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]).unwrap();
    /// assert_eq!(test.statistic, 0.0);
    /// assert!((test.p_value - 0.0809).abs() < 1e-3);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    pub fn two_sided(a: &[f64], b: &[f64]) -> Result<Self, TestError> {
        check_samples(a, b)?;
        let (n1, n2) = (a.len() as f64, b.len() as f64);
        let mut pooled = a
            .iter()
            .map(|&v| (v, true))
            .chain(b.iter().map(|&v| (v, false)))
            .collect::<Vec<_>>();
        pooled.sort_by(|x, y| x.0.total_cmp(&y.0));

        let mut rank_sum_a = 0.0;
        let mut tie_term = 0.0;
        let mut start = 0;
        while start < pooled.len() {
            let mut end = start + 1;
            while end < pooled.len() && pooled[end].0 == pooled[start].0 {
                end += 1;
            }
            // Ranks are 1-based; a tie group shares the mean of its ranks.
            let mid_rank = (start + end + 1) as f64 / 2.0;
            let from_a = pooled[start..end].iter().filter(|(_, first)| *first).count();
            rank_sum_a += mid_rank * from_a as f64;
            let t = (end - start) as f64;
            tie_term += t * t * t - t;
            start = end;
        }

        let u1 = rank_sum_a - n1 * (n1 + 1.0) / 2.0;
        let u2 = n1 * n2 - u1;
        let n = n1 + n2;
        let mu = n1 * n2 / 2.0;
        let sigma = (n1 * n2 / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)))).sqrt();
        let p_value = if sigma > 0.0 {
            let z = (u1.max(u2) - mu - 0.5) / sigma;
            (2.0 * special::normal_sf(z)).clamp(0.0, 1.0)
        } else {
            1.0
        };
        Ok(Self {
            statistic: u1,
            p_value,
        })
    }
}
