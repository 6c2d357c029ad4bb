//! One-step-ahead prediction from a short yearly series.
//!
//! Later years are weighted by repeating their values: block `b` of the window (0 = oldest)
//! appears `(b + 1)^exponent` times in the expanded sequence. A least-squares polynomial over the
//! positions of the expanded sequence is then evaluated one position past its end.

use serde::Serialize;

/// Upper bound on the length of an expanded sequence.
pub const MAX_EXPANDED_LEN: usize = 1 << 24;

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ExtrapolationError {
    #[display("weight exponent {exponent} over {blocks} blocks yields too many samples")]
    TooManySamples { blocks: usize, exponent: u32 },
}

/// Parameters of a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Extrapolation {
    pub exponent: u32,
    pub degree: usize,
}

impl Default for Extrapolation {
    fn default() -> Self {
        Self {
            exponent: 8,
            degree: 1,
        }
    }
}

impl Extrapolation {
    /// Predicts the value following `values` (oldest first), clamped to `[0, 1]`.
    ///
    /// Returns `Ok(None)` when no value is present.
    ///
    /// # Examples
    ///
    /// ```
    /// use covdi_stats::extrapolation::Extrapolation;
    ///
    /// let model = Extrapolation { exponent: 0, degree: 1 };
    /// let next = model.predict(&[Some(0.2), Some(0.3), Some(0.4)]).unwrap().unwrap();
    /// assert!((next - 0.5).abs() < 1e-12);
    /// assert_eq!(model.predict(&[Some(0.8), Some(0.9), Some(1.0)]).unwrap(), Some(1.0));
    /// assert_eq!(model.predict(&[None, None]).unwrap(), None);
    /// ```
    pub fn predict(&self, values: &[Option<f64>]) -> Result<Option<f64>, ExtrapolationError> {
        let expanded = expand_weighted(values, self.exponent)?;
        Ok(extrapolate_next(&expanded, self.degree).map(|v| v.clamp(0.0, 1.0)))
    }
}

/// Repeats the value of block `b` `(b + 1)^exponent` times; missing values are dropped.
pub fn expand_weighted(values: &[Option<f64>], exponent: u32) -> Result<Vec<f64>, ExtrapolationError> {
    let too_many = || ExtrapolationError::TooManySamples {
        blocks: values.len(),
        exponent,
    };
    let mut total = 0_usize;
    let mut repeats = Vec::with_capacity(values.len());
    for (block, value) in values.iter().enumerate() {
        let count = (block + 1).checked_pow(exponent).ok_or_else(too_many)?;
        if value.is_some() {
            total = total.checked_add(count).ok_or_else(too_many)?;
        }
        repeats.push(count);
    }
    if total > MAX_EXPANDED_LEN {
        return Err(too_many());
    }
    let mut expanded = Vec::with_capacity(total);
    for (value, count) in values.iter().zip(repeats) {
        if let Some(v) = value {
            expanded.extend(std::iter::repeat_n(*v, count));
        }
    }
    Ok(expanded)
}

/// Fits a polynomial of degree `min(degree, n - 1)` to `y` at positions `0..n` and evaluates it
/// at position `n`. Returns `None` for an empty input or a singular fit.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn extrapolate_next(y: &[f64], degree: usize) -> Option<f64> {
    let n = y.len();
    if n == 0 {
        return None;
    }
    // Positions are scaled to [0, 1) to keep the normal equations well conditioned.
    let scale = n as f64;
    let x = (0..n).map(|i| i as f64 / scale).collect::<Vec<_>>();
    let coefficients = fit_polynomial(&x, y, degree.min(n - 1))?;
    Some(evaluate(&coefficients, 1.0))
}

/// Least-squares polynomial coefficients, lowest power first.
fn fit_polynomial(x: &[f64], y: &[f64], degree: usize) -> Option<Vec<f64>> {
    let size = degree + 1;
    let mut power_sums = vec![0.0; 2 * degree + 1];
    let mut rhs = vec![0.0; size];
    for (&xi, &yi) in x.iter().zip(y) {
        let mut p = 1.0;
        for (k, sum) in power_sums.iter_mut().enumerate() {
            *sum += p;
            if k < size {
                rhs[k] += yi * p;
            }
            p *= xi;
        }
    }
    let mut matrix = (0..size)
        .map(|i| power_sums[i..i + size].to_vec())
        .collect::<Vec<_>>();
    solve(&mut matrix, &mut rhs)?;
    Some(rhs)
}

/// Gaussian elimination with partial pivoting; the solution replaces `rhs`.
fn solve(matrix: &mut [Vec<f64>], rhs: &mut [f64]) -> Option<()> {
    const SINGULAR: f64 = 1.0e-12;
    let size = rhs.len();
    for col in 0..size {
        let pivot = (col..size).max_by(|&a, &b| matrix[a][col].abs().total_cmp(&matrix[b][col].abs()))?;
        if matrix[pivot][col].abs() < SINGULAR {
            return None;
        }
        matrix.swap(col, pivot);
        rhs.swap(col, pivot);
        for row in col + 1..size {
            let factor = matrix[row][col] / matrix[col][col];
            for k in col..size {
                matrix[row][k] -= factor * matrix[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }
    for row in (0..size).rev() {
        let tail = (row + 1..size)
            .map(|k| matrix[row][k] * rhs[k])
            .sum::<f64>();
        rhs[row] = (rhs[row] - tail) / matrix[row][row];
    }
    Some(())
}

fn evaluate(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_weighted() {
        let expanded = expand_weighted(&[Some(1.0), None, Some(3.0)], 2).unwrap();
        assert_eq!(expanded.len(), 1 + 9);
        assert_eq!(expanded[0], 1.0);
        assert!(expanded[1..].iter().all(|&v| v == 3.0));
    }

    #[test]
    fn test_expand_rejects_huge_weights() {
        let values = vec![Some(0.5); 20];
        assert!(expand_weighted(&values, 30).is_err());
    }

    #[test]
    fn test_single_value_is_constant() {
        assert_eq!(extrapolate_next(&[0.42], 3), Some(0.42));
    }

    #[test]
    fn test_linear_extrapolation() {
        let next = extrapolate_next(&[1.0, 3.0, 5.0, 7.0], 1).unwrap();
        assert!((next - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_quadratic_extrapolation() {
        let y = (0..6).map(|i| f64::from(i * i)).collect::<Vec<_>>();
        let next = extrapolate_next(&y, 2).unwrap();
        assert!((next - 36.0).abs() < 1e-6);
    }

    #[test]
    fn test_weighting_pulls_towards_recent_years() {
        let values = [Some(0.2), Some(0.2), Some(0.6)];
        let flat = Extrapolation { exponent: 0, degree: 0 }.predict(&values).unwrap().unwrap();
        let weighted = Extrapolation::default().predict(&values).unwrap().unwrap();
        assert!((flat - 1.0 / 3.0).abs() < 1e-12);
        assert!(weighted > flat);
    }

    #[test]
    fn test_prediction_is_clamped() {
        let model = Extrapolation {
            exponent: 0,
            degree: 1,
        };
        let low = model.predict(&[Some(0.3), Some(0.1)]).unwrap();
        assert_eq!(low, Some(0.0));
    }
}
