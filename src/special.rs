//! Scalar special functions shared by the distribution families and the
//! derivation engine.
//!
//! The error-function evaluations come from `statrs`; this module layers the
//! normal-CDF helpers, the signed log-space primitives, and the exact
//! combinatorial factors on top.

use statrs::function::erf::erfc;
use std::f64::consts::{LN_2, SQRT_2};

/// `1 / sqrt(2 * pi)`.
pub const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;
/// `ln(sqrt(2 * pi))`.
pub const LN_SQRT_2PI: f64 = 0.918_938_533_204_672_7;

/// Standard normal CDF.
pub fn ndtr(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Log of the standard normal CDF, stable across both tails.
pub fn log_ndtr(x: f64) -> f64 {
    if x.is_nan() {
        f64::NAN
    } else if x > 6.0 {
        // ndtr(x) is within an ulp of 1; go through the complement.
        (-ndtr(-x)).ln_1p()
    } else if x > -14.0 {
        ndtr(x).ln()
    } else {
        // Asymptotic expansion of the lower tail: erfc underflows long
        // before the log does.
        let z = -x;
        let z2 = z * z;
        let z4 = z2 * z2;
        let series = 1.0 - 1.0 / z2 + 3.0 / z4 - 15.0 / (z4 * z2) + 105.0 / (z4 * z4);
        -0.5 * z2 - z.ln() - LN_SQRT_2PI + series.ln()
    }
}

/// Inverse of the standard normal CDF.
///
/// Rational approximation (Beasley-Springer-Moro regions) followed by one
/// Halley step against [`ndtr`], which brings the result to full double
/// precision.
pub fn ndtri(p: f64) -> f64 {
    if p.is_nan() || p < 0.0 || p > 1.0 {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }

    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    let x = if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    // Halley refinement. The residual is taken on whichever side of the
    // median keeps it free of cancellation (ndtr(x) - p == (1 - p) - ndtr(-x)
    // exactly, and 1 - p is exact for p >= 0.5). Skipped where exp(x^2/2)
    // would overflow; the rational approximation is already at its best
    // there.
    if x * x < 1400.0 {
        let e = if p <= 0.5 {
            ndtr(x) - p
        } else {
            (1.0 - p) - ndtr(-x)
        };
        let u = e * (2.0 * std::f64::consts::PI).sqrt() * (x * x / 2.0).exp();
        x - u / (1.0 + x * u / 2.0)
    } else {
        x
    }
}

/// Inverse of [`log_ndtr`]: the x with `log_ndtr(x) == y`, for `y <= 0`.
pub fn ndtri_exp(y: f64) -> f64 {
    if y.is_nan() || y > 0.0 {
        return f64::NAN;
    }
    if y == 0.0 {
        return f64::INFINITY;
    }
    if y == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    if y > -690.0 {
        return ndtri(y.exp());
    }

    // Deep lower tail: invert the asymptotic form of log_ndtr, then polish
    // with Newton steps expressed entirely in log space.
    let mut x = -(-2.0 * y).sqrt();
    for _ in 0..4 {
        x = -(2.0 * (-y - (-x).ln() - LN_SQRT_2PI)).sqrt();
    }
    for _ in 0..2 {
        let f = log_ndtr(x) - y;
        // d/dx log_ndtr = exp(logpdf - log_ndtr)
        let dlog = (-0.5 * x * x - LN_SQRT_2PI) - log_ndtr(x);
        x -= f / dlog.exp();
    }
    x
}

/// `ln(1 - exp(y))` for `y <= 0`, computed without cancellation.
pub fn log1mexp(y: f64) -> f64 {
    if y.is_nan() || y > 0.0 {
        f64::NAN
    } else if y == 0.0 {
        f64::NEG_INFINITY
    } else if y > -LN_2 {
        (-y.exp_m1()).ln()
    } else {
        (-y.exp()).ln_1p()
    }
}

/// `ln(exp(a) - exp(b))` for `a >= b`: a log-sum-exp with one negated term.
///
/// Keeps differences of two exponentials (e.g. power-term moment formulas)
/// in log space until the final exponentiation.
pub fn logsubexp(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() || b > a {
        f64::NAN
    } else if a == b {
        f64::NEG_INFINITY
    } else if b == f64::NEG_INFINITY {
        a
    } else {
        a + log1mexp(b - a)
    }
}

/// Exact double factorial `n!! = n * (n - 2) * ...` as a float.
pub fn double_factorial(n: u32) -> f64 {
    let mut acc = 1.0f64;
    let mut k = n;
    while k > 1 {
        acc *= f64::from(k);
        k -= 2;
    }
    acc
}

/// Binomial coefficient `C(n, k)` as a float, exact for modest arguments.
pub fn binomial(n: u32, k: u32) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    let mut acc = 1.0f64;
    for i in 0..k {
        acc = acc * f64::from(n - i) / f64::from(i + 1);
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ndtr_known_values() {
        assert_relative_eq!(ndtr(0.0), 0.5, max_relative = 1e-15);
        assert_relative_eq!(ndtr(1.0), 0.8413447460685429, max_relative = 1e-14);
        assert_relative_eq!(ndtr(-1.96), 0.024997895148220435, max_relative = 1e-12);
    }

    #[test]
    fn log_ndtr_matches_direct_log_in_the_body() {
        for &x in &[-5.0, -1.0, 0.0, 1.0, 4.0] {
            assert_relative_eq!(log_ndtr(x), ndtr(x).ln(), max_relative = 1e-13);
        }
    }

    #[test]
    fn log_ndtr_deep_tail_is_finite_and_ordered() {
        let a = log_ndtr(-20.0);
        let b = log_ndtr(-30.0);
        assert!(a.is_finite() && b.is_finite());
        assert!(b < a);
        // Leading term dominates: -x^2/2.
        assert!((b - (-450.0)).abs() < 5.0);
    }

    #[test]
    fn ndtri_round_trips_through_ndtr() {
        // Positive arguments stay modest: beyond ~2 the rounding of p toward
        // 1 itself moves the quantile by more than the tolerance. The lower
        // tail keeps full relative precision at any depth.
        for &x in &[-8.0, -3.0, -0.5, 0.0, 0.5, 1.0, 2.0] {
            assert_relative_eq!(ndtri(ndtr(x)), x, epsilon = 1e-12, max_relative = 1e-12);
        }
        assert_eq!(ndtri(0.0), f64::NEG_INFINITY);
        assert_eq!(ndtri(1.0), f64::INFINITY);
        assert!(ndtri(1.5).is_nan());
    }

    #[test]
    fn ndtri_known_quantiles() {
        assert_relative_eq!(ndtri(0.5), 0.0, epsilon = 1e-15);
        assert_relative_eq!(ndtri(0.025), -1.9599639845400545, max_relative = 1e-13);
        assert_relative_eq!(ndtri(0.975), 1.9599639845400545, max_relative = 1e-13);
        assert_relative_eq!(ndtri(0.25), -0.6744897501960817, max_relative = 1e-13);
    }

    #[test]
    fn ndtri_exp_agrees_with_ndtri_in_the_body() {
        for &p in &[1e-10f64, 1e-3, 0.25, 0.5, 0.9] {
            assert_relative_eq!(ndtri_exp(p.ln()), ndtri(p), max_relative = 1e-10);
        }
    }

    #[test]
    fn ndtri_exp_deep_tail_round_trips() {
        for &y in &[-800.0, -2000.0, -1.0e4] {
            let x = ndtri_exp(y);
            assert_relative_eq!(log_ndtr(x), y, max_relative = 1e-10);
        }
    }

    #[test]
    fn log1mexp_both_branches() {
        assert_relative_eq!(log1mexp(-1e-3), (1.0 - (-1e-3f64).exp()).ln(), max_relative = 1e-12);
        assert_relative_eq!(log1mexp(-40.0), -(-40.0f64).exp(), max_relative = 1e-12);
        assert_eq!(log1mexp(0.0), f64::NEG_INFINITY);
    }

    #[test]
    fn logsubexp_matches_naive_form() {
        let (a, b) = (2.0, 1.0);
        assert_relative_eq!(
            logsubexp(a, b),
            (a.exp() - b.exp()).ln(),
            max_relative = 1e-14
        );
        assert_eq!(logsubexp(3.0, f64::NEG_INFINITY), 3.0);
        assert_eq!(logsubexp(3.0, 3.0), f64::NEG_INFINITY);
    }

    #[test]
    fn combinatorics_are_exact() {
        assert_eq!(double_factorial(0), 1.0);
        assert_eq!(double_factorial(1), 1.0);
        assert_eq!(double_factorial(5), 15.0);
        assert_eq!(double_factorial(6), 48.0);
        assert_eq!(binomial(4, 2), 6.0);
        assert_eq!(binomial(10, 0), 1.0);
        assert_eq!(binomial(3, 5), 0.0);
    }
}
