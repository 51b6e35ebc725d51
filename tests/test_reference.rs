//! Validation of the production engine against the arbitrary-precision
//! oracle, and of the oracle's precision guard rails.
//!
//! Each test installs its own working precision: the context is per-thread
//! and the test harness gives every test its own thread.

use approx::assert_relative_eq;
use ndarray::IxDyn;

use statdist::dist::{LogUniform, Normal, Uniform};
use statdist::reference::{set_working_precision, RefLogUniform, RefNormal, RefUniform};
use statdist::Error;

fn scalar(a: ndarray::ArrayD<f64>) -> f64 {
    a[IxDyn(&[])]
}

#[test]
fn oracle_refuses_to_run_without_a_precision() {
    // no set_working_precision in this thread: the sentinel default
    let err = RefNormal::new(0.0, 1.0).unwrap_err();
    assert!(matches!(err, Error::PrecisionUnset));
}

#[test]
fn oracle_refuses_a_low_precision() {
    set_working_precision(15);
    let err = RefNormal::new(0.0, 1.0).unwrap_err();
    match err {
        Error::PrecisionTooLow { digits } => assert_eq!(digits, 15),
        other => panic!("unexpected error {other:?}"),
    }
    set_working_precision(10);
    assert!(matches!(
        RefUniform::new(0.0, 1.0).unwrap_err(),
        Error::PrecisionTooLow { .. }
    ));
}

#[test]
fn normal_matches_the_oracle() {
    set_working_precision(50);
    let (mu, sigma) = (0.3, 1.4);
    let d = Normal::new(mu, sigma).unwrap();
    let r = RefNormal::new(mu, sigma).unwrap();

    // an irregular spread of points across the body and both shoulders
    let points = [-1.9, -1.1, -0.4, 0.0, 0.3, 0.9, 1.4, 2.0, 2.5];
    for &x in &points {
        assert_relative_eq!(scalar(d.pdf(x)), r.pdf(x), max_relative = 1e-15);
        assert_relative_eq!(scalar(d.logpdf(x)), r.logpdf(x), max_relative = 1e-14);
        assert_relative_eq!(scalar(d.cdf(x)), r.cdf(x), max_relative = 5e-14);
        assert_relative_eq!(scalar(d.logcdf(x)), r.logcdf(x), max_relative = 1e-13);
        assert_relative_eq!(scalar(d.ccdf(x)), r.sf(x), max_relative = 5e-14);
    }

    assert_relative_eq!(scalar(d.entropy()), r.entropy(), max_relative = 1e-14);
    assert_relative_eq!(scalar(d.mean()), r.mean(), max_relative = 1e-14);
    assert_relative_eq!(scalar(d.variance()), r.var(), max_relative = 1e-13);

    let (lo, hi) = r.support();
    assert_eq!(lo, f64::NEG_INFINITY);
    assert_eq!(hi, f64::INFINITY);
    let (dlo, dhi) = d.support();
    assert_eq!(scalar(dlo), lo);
    assert_eq!(scalar(dhi), hi);
}

#[test]
fn normal_skew_matches_the_oracle_exactly_enough() {
    set_working_precision(40);
    let d = Normal::new(2.0, 0.75).unwrap();
    let r = RefNormal::new(2.0, 0.75).unwrap();
    assert_relative_eq!(scalar(d.skewness()), r.skew(), epsilon = 1e-12);
    // oracle kurtosis is excess; the engine reports the standardized moment
    assert_relative_eq!(scalar(d.kurtosis()), r.kurtosis() + 3.0, max_relative = 1e-12);
}

#[test]
fn oracle_quantile_inverts_its_own_cdf() {
    set_working_precision(30);
    let r = RefNormal::new(0.0, 1.0).unwrap();
    let x = r.ppf(0.25, 0.0);
    assert_relative_eq!(x, -0.6744897501960817, max_relative = 1e-12);
    let y = r.isf(0.25, 0.0);
    assert_relative_eq!(y, 0.6744897501960817, max_relative = 1e-12);
}

#[test]
fn uniform_matches_the_oracle() {
    set_working_precision(50);
    let d = Uniform::new(-1.0, 3.0).unwrap();
    let r = RefUniform::new(-1.0, 3.0).unwrap();
    for &x in &[-0.5, 0.0, 1.2, 2.9] {
        assert_relative_eq!(scalar(d.pdf(x)), r.pdf(x), max_relative = 1e-15);
        assert_relative_eq!(scalar(d.cdf(x)), r.cdf(x), max_relative = 1e-10);
    }
    assert_relative_eq!(scalar(d.entropy()), r.entropy(), max_relative = 1e-9);
    assert_relative_eq!(scalar(d.mean()), r.mean(), max_relative = 1e-10);
}

#[test]
fn log_uniform_matches_the_oracle() {
    set_working_precision(50);
    let (a, b) = (0.5, 4.0);
    let d = LogUniform::new(a, b).unwrap();
    let r = RefLogUniform::new(a, b).unwrap();
    for &x in &[0.6, 1.0, 1.7, 3.5] {
        assert_relative_eq!(scalar(d.pdf(x)), r.pdf(x), max_relative = 1e-14);
        assert_relative_eq!(scalar(d.cdf(x)), r.cdf(x), max_relative = 1e-9);
    }
    // the raw-moment formula (a log-space difference of exponentials)
    // against brute-force integration
    assert_relative_eq!(scalar(d.mean()), r.mean(), max_relative = 1e-13);
    assert_relative_eq!(
        scalar(d.moment(3, statdist::MomentKind::Raw).unwrap()),
        r.moment(3, Some(0.0)),
        max_relative = 1e-13
    );
}
