//! Statistics used by the COVID-19 / democracy-index analyses.
//!
//! This crate provides:
//!
//! - **Descriptive statistics**: mean, median, population and sample variance
//! - **Percentiles**: linearly interpolated percentile values
//! - **Histograms**: equal-width binning with a text rendering
//! - **Comprehensive statistics**: the three above combined
//! - **Special functions**: gamma, incomplete beta and error functions for p-values
//! - **Regression**: least-squares line fit with Pearson's r and its p-value
//! - **Hypothesis tests**: two-sample Kolmogorov-Smirnov and Mann-Whitney U
//! - **Bootstrap**: resampled subset means
//! - **Extrapolation**: weighted polynomial one-step-ahead prediction
//!
//! # Examples
//!
//! ## Comparing two groups
//!
//! ```
//! use covdi_stats::hypothesis::{KsTest, MannWhitneyU};
//!
//! let a = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let b = [6.0, 7.0, 8.0, 9.0, 10.0];
//! let ks = KsTest::two_sample(&a, &b).unwrap();
//! let mwu = MannWhitneyU::two_sided(&a, &b).unwrap();
//! assert_eq!(ks.statistic, 1.0);
//! assert_eq!(mwu.statistic, 0.0);
//! assert!(mwu.p_value < 0.05);
//! ```
//!
//! ## Bootstrapping a mean
//!
//! ```
//! use covdi_stats::{bootstrap, comprehensive::ComprehensiveStats};
//! use rand::SeedableRng as _;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(3);
//! let means = bootstrap::resample_means(&[1.0, 2.0, 3.0, 4.0], 5, 1000, &mut rng).unwrap();
//! let summary = ComprehensiveStats::new(means, &[50.0], 20, None).unwrap();
//! assert!((summary.stats.mean - 2.5).abs() < 0.1);
//! ```

pub mod bootstrap;
pub mod comprehensive;
pub mod descriptive;
pub mod extrapolation;
pub mod histogram;
pub mod hypothesis;
pub mod percentiles;
pub mod regression;
pub mod special;
