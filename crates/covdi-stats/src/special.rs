//! Special functions backing the p-value computations.

use std::f64::consts::{PI, SQRT_2};

const LANCZOS: [f64; 6] = [
    76.180_091_729_471_46,
    -86.505_320_329_416_77,
    24.014_098_240_830_91,
    -1.231_739_572_450_155,
    0.120_865_097_386_617_9e-2,
    -0.539_523_938_495_3e-5,
];

/// Natural logarithm of the gamma function for `x > 0` (Lanczos approximation).
#[must_use]
pub fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        // Reflection keeps the approximation accurate near zero.
        return (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let tmp = x + 5.5;
    let tmp = tmp - (x + 0.5) * tmp.ln();
    let mut ser = 1.000_000_000_190_015;
    let mut y = x;
    for c in LANCZOS {
        y += 1.0;
        ser += c / y;
    }
    -tmp + ((2.0 * PI).sqrt() * ser / x).ln()
}

/// Regularized incomplete beta function `I_x(a, b)`.
///
/// # Examples
///
/// ```
/// use covdi_stats::special::incomplete_beta;
///
/// assert_eq!(incomplete_beta(2.0, 3.0, 0.0), 0.0);
/// assert_eq!(incomplete_beta(2.0, 3.0, 1.0), 1.0);
/// // I_x(1, 1) is the uniform CDF.
/// assert!((incomplete_beta(1.0, 1.0, 0.3) - 0.3).abs() < 1e-9);
/// ```
#[must_use]
pub fn incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let front = (ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln()).exp();
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

/// Modified Lentz evaluation of the continued fraction for the incomplete beta function.
fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITER: u32 = 300;
    const EPS: f64 = 3.0e-16;
    const FPMIN: f64 = 1.0e-300;

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < FPMIN {
        d = FPMIN;
    }
    d = 1.0 / d;
    let mut h = d;
    for m in 1..=MAX_ITER {
        let m = f64::from(m);
        let m2 = 2.0 * m;
        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        h *= d * c;
        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;
        if (del - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

/// Complementary error function, accurate to about `1.2e-7` relative error.
#[must_use]
pub fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98
                                + t * (1.488_515_87 + t * (-0.822_152_23 + t * 0.170_872_77))))))));
    let ans = t * poly.exp();
    if x >= 0.0 { ans } else { 2.0 - ans }
}

/// Survival function `P(Z > z)` of the standard normal distribution.
#[must_use]
pub fn normal_sf(z: f64) -> f64 {
    0.5 * erfc(z / SQRT_2)
}

/// Two-sided p-value of Student's t statistic with `df` degrees of freedom.
#[must_use]
pub fn student_t_two_sided(t: f64, df: f64) -> f64 {
    incomplete_beta(0.5 * df, 0.5, df / (df + t * t))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_ln_gamma_factorials() {
        assert!(close(ln_gamma(1.0), 0.0, 1e-9));
        assert!(close(ln_gamma(5.0), 24.0_f64.ln(), 1e-9));
        assert!(close(ln_gamma(0.5), PI.sqrt().ln(), 1e-9));
    }

    #[test]
    fn test_incomplete_beta_symmetry() {
        let lhs = incomplete_beta(2.5, 4.0, 0.3);
        let rhs = 1.0 - incomplete_beta(4.0, 2.5, 0.7);
        assert!(close(lhs, rhs, 1e-12));
    }

    #[test]
    fn test_normal_sf() {
        assert!(close(normal_sf(0.0), 0.5, 1e-7));
        assert!(close(normal_sf(1.959_964), 0.025, 1e-6));
        assert!(close(normal_sf(-1.959_964), 0.975, 1e-6));
    }

    #[test]
    fn test_student_t() {
        assert!(close(student_t_two_sided(0.0, 5.0), 1.0, 1e-12));
        // t = 2.228 is the two-sided 5% critical value at 10 df.
        assert!(close(student_t_two_sided(2.228_139, 10.0), 0.05, 1e-5));
    }
}
