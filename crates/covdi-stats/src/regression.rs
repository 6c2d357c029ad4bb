//! Least-squares line fit and Pearson correlation.

use serde::Serialize;

use crate::{descriptive, special};

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum RegressionError {
    #[display("x and y have different lengths ({x_len} and {y_len})")]
    LengthMismatch { x_len: usize, y_len: usize },
    #[display("at least two points are required, got {len}")]
    TooFewPoints { len: usize },
    #[display("all x values are identical")]
    ConstantX,
}

/// Result of fitting `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearRegression {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation coefficient.
    pub r: f64,
    /// Two-sided p-value for a zero slope (Student's t, `n - 2` degrees of freedom).
    pub p_value: f64,
    /// Standard error of the slope.
    pub std_err: f64,
}

impl LinearRegression {
    /// Fits a line through `(x, y)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use covdi_stats::regression::LinearRegression;
    ///
    /// let fit = LinearRegression::fit(&[1.0, 2.0, 3.0, 4.0, 5.0], &[1.0, 3.0, 2.0, 5.0, 4.0]).unwrap();
    /// assert!((fit.r - 0.8).abs() < 1e-12);
    /// assert!((fit.slope - 0.8).abs() < 1e-12);
    /// assert!((fit.intercept - 0.6).abs() < 1e-12);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    pub fn fit(x: &[f64], y: &[f64]) -> Result<Self, RegressionError> {
        if x.len() != y.len() {
            return Err(RegressionError::LengthMismatch {
                x_len: x.len(),
                y_len: y.len(),
            });
        }
        let n = x.len();
        if n < 2 {
            return Err(RegressionError::TooFewPoints { len: n });
        }
        let (Some(x_mean), Some(y_mean)) = (descriptive::mean(x), descriptive::mean(y)) else {
            return Err(RegressionError::TooFewPoints { len: n });
        };
        let mut ssxm = 0.0;
        let mut ssym = 0.0;
        let mut ssxym = 0.0;
        for (&xi, &yi) in x.iter().zip(y) {
            let dx = xi - x_mean;
            let dy = yi - y_mean;
            ssxm += dx * dx;
            ssym += dy * dy;
            ssxym += dx * dy;
        }
        if ssxm == 0.0 {
            return Err(RegressionError::ConstantX);
        }

        let r = if ssym == 0.0 {
            0.0
        } else {
            (ssxym / (ssxm * ssym).sqrt()).clamp(-1.0, 1.0)
        };
        let slope = ssxym / ssxm;
        let intercept = y_mean - slope * x_mean;

        let (p_value, std_err) = if n == 2 {
            let p = if y[0] == y[1] { 1.0 } else { 0.0 };
            (p, 0.0)
        } else {
            const TINY: f64 = 1.0e-20;
            let df = (n - 2) as f64;
            let t = r * (df / ((1.0 - r + TINY) * (1.0 + r + TINY))).sqrt();
            let p = special::student_t_two_sided(t, df);
            let std_err = ((1.0 - r * r) * ssym / ssxm / df).sqrt();
            (p, std_err)
        };

        Ok(Self {
            slope,
            intercept,
            r,
            p_value,
            std_err,
        })
    }

    #[must_use]
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// `log10(v + 1)`, the transform used to compare heavy-tailed variables.
#[must_use]
pub fn log1p10(v: f64) -> f64 {
    (v + 1.0).log10()
}
