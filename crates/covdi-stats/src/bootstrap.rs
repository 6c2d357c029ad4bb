use rand::Rng;

use crate::descriptive;

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum BootstrapError {
    #[display("cannot resample an empty sample")]
    EmptySample,
    #[display("subset size must be at least 1")]
    ZeroSubsetSize,
}

/// Draws `samples` subsets of `subset_size` values with replacement and returns their means.
///
/// # Examples
///
/// ```
/// use covdi_stats::bootstrap::resample_means;
///
/// let mut rng = rand::rng();
/// let means = resample_means(&[2.0, 4.0, 6.0], 5, 100, &mut rng).unwrap();
/// assert_eq!(means.len(), 100);
/// assert!(means.iter().all(|m| (2.0..=6.0).contains(m)));
/// ```
pub fn resample_means<R>(
    data: &[f64],
    subset_size: usize,
    samples: usize,
    rng: &mut R,
) -> Result<Vec<f64>, BootstrapError>
where
    R: Rng + ?Sized,
{
    if data.is_empty() {
        return Err(BootstrapError::EmptySample);
    }
    if subset_size == 0 {
        return Err(BootstrapError::ZeroSubsetSize);
    }
    let mut subset = Vec::with_capacity(subset_size);
    let means = (0..samples)
        .map(|_| {
            subset.clear();
            subset.extend((0..subset_size).map(|_| data[rng.random_range(0..data.len())]));
            descriptive::mean(&subset).unwrap_or(f64::NAN)
        })
        .collect();
    Ok(means)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let data = [1.0, 5.0, 9.0, 13.0];
        let a = resample_means(&data, 3, 50, &mut Pcg32::seed_from_u64(7)).unwrap();
        let b = resample_means(&data, 3, 50, &mut Pcg32::seed_from_u64(7)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_constant_data() {
        let means = resample_means(&[4.0], 10, 20, &mut Pcg32::seed_from_u64(1)).unwrap();
        assert!(means.iter().all(|&m| m == 4.0));
    }

    #[test]
    fn test_mean_of_means_is_close_to_mean() {
        let data = (1..=10).map(f64::from).collect::<Vec<_>>();
        let means = resample_means(&data, 5, 10_000, &mut Pcg32::seed_from_u64(42)).unwrap();
        let overall = descriptive::mean(&means).unwrap();
        assert!((overall - 5.5).abs() < 0.1);
    }

    #[test]
    fn test_invalid_arguments() {
        let mut rng = Pcg32::seed_from_u64(0);
        assert_eq!(
            resample_means(&[], 5, 10, &mut rng),
            Err(BootstrapError::EmptySample)
        );
        assert_eq!(
            resample_means(&[1.0], 0, 10, &mut rng),
            Err(BootstrapError::ZeroSubsetSize)
        );
    }
}
