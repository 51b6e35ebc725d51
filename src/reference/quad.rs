//! Brute-force numerics in arbitrary precision: tanh-sinh quadrature and
//! secant root finding.
//!
//! Nothing here is tuned for speed; the oracle is allowed to be slow, never
//! inaccurate. The quadrature converges double-exponentially for the smooth
//! densities it is pointed at, and the level loop simply doubles the node
//! density until two consecutive estimates agree to the working precision's
//! tolerance.

use super::real::{working_precision, Real};

const MAX_LEVEL: i32 = 9;

fn tolerance() -> Real {
    let dps = working_precision().unwrap_or(16);
    Real::from_f64(10.0).powi(-(dps.saturating_sub(8) as i32))
}

fn sinh_cosh(u: &Real) -> (Real, Real) {
    let e = u.exp();
    let einv = Real::one() / &e;
    let half = Real::from_f64(0.5);
    (&half * (&e - &einv), &half * (&e + &einv))
}

/// Integrates `f` over `(a, b)`; either bound may be infinite.
pub fn integrate<F>(f: F, a: &Real, b: &Real) -> Real
where
    F: Fn(&Real) -> Real,
{
    // Map onto t in (-1, 1); endpoint singularities introduced by the maps
    // are exactly what tanh-sinh absorbs.
    let one = Real::one();
    match (a.is_finite(), b.is_finite()) {
        (true, true) => {
            let mid = Real::from_f64(0.5) * (a + b);
            let half_width = Real::from_f64(0.5) * (b - a);
            tanh_sinh(|t| f(&(&mid + &(&half_width * t))) * half_width.clone())
        }
        (true, false) => tanh_sinh(|t| {
            let u = &one - t;
            let x = a + &((&one + t) / &u);
            f(&x) * (Real::from_f64(2.0) / (&u * &u))
        }),
        (false, true) => tanh_sinh(|t| {
            let u = &one + t;
            let x = b - &((&one - t) / &u);
            f(&x) * (Real::from_f64(2.0) / (&u * &u))
        }),
        (false, false) => tanh_sinh(|t| {
            let u = &one - &(t * t);
            let x = t / &u;
            f(&x) * ((&one + &(t * t)) / (&u * &u))
        }),
    }
}

fn tanh_sinh<G>(g: G) -> Real
where
    G: Fn(&Real) -> Real,
{
    let dps = working_precision().unwrap_or(16) as f64;
    // Past this point the weights are below the tolerance regardless of g.
    let v_limit = dps * std::f64::consts::LN_10 + 30.0;
    let half_pi = Real::from_f64(0.5) * Real::pi();
    let tol = tolerance();

    let mut previous = Real::zero();
    let mut estimate = Real::zero();
    for level in 1..=MAX_LEVEL {
        let h_f = 0.5f64.powi(level);
        let h = Real::from_f64(h_f);
        let jh_max = (v_limit.asinh() / h_f).ceil() as i64;
        let mut sum = Real::zero();
        for j in -jh_max..=jh_max {
            // Cheap double-precision screen: nodes whose weight cannot reach
            // the tolerance are skipped before any high-precision work.
            if std::f64::consts::FRAC_PI_2 * (j as f64 * h_f).sinh().abs() > v_limit {
                continue;
            }
            let u = &h * Real::from_f64(j as f64);
            let (su, cu) = sinh_cosh(&u);
            let v = &half_pi * &su;
            let (sv, cv) = sinh_cosh(&v);
            let t = &sv / &cv;
            let w = (&half_pi * &cu) / (&cv * &cv);
            let val = g(&t);
            if val.is_finite() {
                sum = sum + val * w;
            }
        }
        estimate = &h * &sum;
        if level > 2 && (&estimate - &previous).abs() <= &tol * &estimate.abs() {
            return estimate;
        }
        previous = estimate.clone();
    }
    estimate
}

/// Secant iteration for `f(x) = 0` starting at `guess`, with a bisection
/// retreat when the secant step stalls on a bracketed sign change.
pub fn find_root<F>(f: F, guess: &Real) -> Real
where
    F: Fn(&Real) -> Real,
{
    let tol = tolerance();
    let mut x0 = guess.clone();
    let step = {
        let scale = x0.abs().max(&Real::one());
        scale * Real::from_f64(1.0 / 64.0)
    };
    let mut x1 = &x0 + &step;
    let mut f0 = f(&x0);
    let mut f1 = f(&x1);

    for _ in 0..256 {
        if f1.is_zero() {
            return x1;
        }
        let denom = &f1 - &f0;
        if denom.is_zero() || !denom.is_finite() {
            break;
        }
        let x2 = &x1 - &(&f1 * &(&x1 - &x0) / &denom);
        x0 = x1;
        f0 = f1;
        x1 = x2;
        f1 = f(&x1);
        if (&x1 - &x0).abs() <= &tol * &x1.abs().max(&Real::one()) {
            return x1;
        }
    }
    x1
}
