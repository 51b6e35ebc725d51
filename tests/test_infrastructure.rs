//! Tests for the declaration layer (domains, parameterizations, masking) and
//! for every generic derivation path of the engine, exercised through a
//! pdf-only exponential family whose closed forms are known.

use std::sync::OnceLock;

use approx::assert_relative_eq;
use ndarray::IxDyn;
use rand::rngs::StdRng;
use rand::SeedableRng;

use statdist::dist::{LogUniform, Normal, StandardNormal, Uniform};
use statdist::{
    ContinuousFamily, Distribution, Endpoint, Error, FamilySpec, FormulaSet, MomentKind, ParamMap,
    Parameterization, RealDomain, RealParameter, ValidatedSpec,
};

fn scalar(a: ndarray::ArrayD<f64>) -> f64 {
    a[IxDyn(&[])]
}

// ============================================================================
// A pdf-only family: everything below the density comes from the engine.
// ============================================================================

struct Exponential;

impl ContinuousFamily for Exponential {
    type Params = f64;

    const NAME: &'static str = "Exponential";
    const FORMULAS: FormulaSet = FormulaSet::none().with_pdf();

    fn spec() -> &'static ValidatedSpec {
        const LAMBDA: RealParameter = RealParameter::new(
            "lambda",
            RealDomain::open(0.0, f64::INFINITY),
            (0.5, 2.0),
        );
        const X: RealParameter =
            RealParameter::new("x", RealDomain::open(0.0, f64::INFINITY), (0.1, 3.0));
        static PARAMS: [RealParameter; 1] = [LAMBDA];
        static PARAMETERIZATIONS: [Parameterization; 1] = [Parameterization::new(&PARAMS)];
        static SLOT: OnceLock<ValidatedSpec> = OnceLock::new();
        statdist::family::register(
            &SLOT,
            FamilySpec {
                name: Self::NAME,
                variable: X,
                parameterizations: &PARAMETERIZATIONS,
            },
            Self::FORMULAS,
        )
    }

    fn pack(values: &ParamMap) -> f64 {
        values["lambda"]
    }

    fn support(_p: &f64) -> (f64, f64) {
        (0.0, f64::INFINITY)
    }

    fn pdf_formula(lambda: &f64, x: f64) -> f64 {
        lambda * (-lambda * x).exp()
    }
}

fn exponential(lambda: f64) -> Distribution<Exponential> {
    Distribution::from_named(vec![("lambda", lambda.into())]).unwrap()
}

#[test]
fn cdf_falls_back_to_quadrature() {
    let d = exponential(1.3);
    for &x in &[0.1f64, 0.5, 1.0, 2.5] {
        let expected = 1.0 - (-1.3 * x).exp();
        assert_relative_eq!(scalar(d.cdf(x)), expected, max_relative = 1e-9);
    }
}

#[test]
fn ccdf_fallback_integrates_the_upper_tail() {
    let d = exponential(1.0);
    // deep enough that 1 - cdf would lose digits if the engine integrated
    // the lower tail and complemented
    let x = 30.0f64;
    let expected = (-x).exp();
    assert_relative_eq!(scalar(d.ccdf(x)), expected, max_relative = 1e-8);
    assert_relative_eq!(scalar(d.logccdf(x)), -x, max_relative = 1e-8);
}

#[test]
fn log_forms_fall_back_through_the_cdf() {
    let d = exponential(2.0);
    let x = 0.7;
    assert_relative_eq!(
        scalar(d.logcdf(x)),
        (1.0 - (-2.0 * x).exp()).ln(),
        max_relative = 1e-9
    );
    assert_relative_eq!(scalar(d.logpdf(x)), (2.0f64).ln() - 2.0 * x, max_relative = 1e-12);
}

#[test]
fn icdf_falls_back_to_root_finding() {
    let d = exponential(1.5);
    for &q in &[0.05f64, 0.25, 0.5, 0.9, 0.99] {
        let expected = -(1.0 - q).ln() / 1.5;
        assert_relative_eq!(scalar(d.icdf(q)), expected, max_relative = 1e-7);
    }
    // inverse pair round trip through the generic paths
    let x = 1.25;
    assert_relative_eq!(scalar(d.icdf(scalar(d.cdf(x)))), x, max_relative = 1e-7);
    assert_relative_eq!(scalar(d.iccdf(scalar(d.ccdf(x)))), x, max_relative = 1e-7);
}

#[test]
fn median_mode_and_entropy_fall_back() {
    let d = exponential(2.0);
    assert_relative_eq!(scalar(d.median()), std::f64::consts::LN_2 / 2.0, max_relative = 1e-7);
    // entropy of Exp(lambda) is 1 - ln(lambda)
    assert_relative_eq!(scalar(d.entropy()), 1.0 - (2.0f64).ln(), max_relative = 1e-8);
    // the density is maximized at the lower support bound
    assert!(scalar(d.mode()).abs() < 1e-4);
}

#[test]
fn moments_fall_back_to_quadrature() {
    let lambda = 1.5;
    let d = exponential(lambda);
    assert_relative_eq!(scalar(d.mean()), 1.0 / lambda, max_relative = 1e-9);
    assert_relative_eq!(scalar(d.variance()), 1.0 / (lambda * lambda), max_relative = 1e-8);
    let raw2 = d.moment(2, MomentKind::Raw).unwrap();
    assert_relative_eq!(scalar(raw2), 2.0 / (lambda * lambda), max_relative = 1e-8);
    // skewness of any exponential distribution is 2
    assert_relative_eq!(scalar(d.skewness()), 2.0, max_relative = 1e-6);
}

#[test]
fn negative_moment_order_is_unavailable() {
    let d = exponential(1.0);
    assert!(d.moment(-1, MomentKind::Raw).is_none());
    assert!(d.moment(-2, MomentKind::Central).is_none());
}

#[test]
fn sampling_falls_back_to_inverse_transform() {
    let d = exponential(1.0);
    let mut rng = StdRng::seed_from_u64(7);
    let draws = d.sample(&[300], &mut rng);
    assert_eq!(draws.shape(), &[300]);
    let mean = draws.iter().sum::<f64>() / 300.0;
    assert!(draws.iter().all(|&v| v > 0.0));
    assert!((mean - 1.0).abs() < 0.25, "sample mean {mean} too far from 1");
}

// ============================================================================
// Parameterization selection and validation
// ============================================================================

#[test]
fn unknown_parameterization_names_the_alternatives() {
    let err = Distribution::<Exponential>::from_named(vec![("rate", 1.0.into())]).unwrap_err();
    match err {
        Error::UnknownParameterization {
            family,
            supplied,
            alternatives,
        } => {
            assert_eq!(family, "Exponential");
            assert!(supplied.contains("rate"));
            assert!(alternatives.contains("lambda"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn mixed_parameterizations_are_rejected() {
    let err =
        Distribution::<LogUniform>::from_named(vec![("a", 1.0.into()), ("log_b", 1.0.into())])
            .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("{log_a, log_b}"));
    assert!(message.contains("{a, b}"));
}

#[test]
fn broadcast_mismatch_fails_eagerly() {
    let err = Uniform::new(vec![0.0, 1.0], vec![1.0, 2.0, 3.0]).unwrap_err();
    assert!(matches!(err, Error::BroadcastMismatch { .. }));
}

#[test]
fn invalid_elements_are_masked_not_fatal() {
    // second element violates b > a; third violates sigma > 0 in its family
    let u = Uniform::new(0.0, vec![2.0, -1.0]).unwrap();
    let pdf = u.pdf(1.0);
    assert_relative_eq!(pdf[IxDyn(&[0])], 0.5);
    assert!(pdf[IxDyn(&[1])].is_nan());
    let mean = u.mean();
    assert_relative_eq!(mean[IxDyn(&[0])], 1.0, max_relative = 1e-9);
    assert!(mean[IxDyn(&[1])].is_nan());

    let n = Normal::new(0.0, vec![1.0, -2.0]).unwrap();
    let cdf = n.cdf(0.0);
    assert_relative_eq!(cdf[IxDyn(&[0])], 0.5);
    assert!(cdf[IxDyn(&[1])].is_nan());
    let s = n.sample(&[3], &mut StdRng::seed_from_u64(1));
    assert_eq!(s.shape(), &[3, 2]);
    assert!(s[IxDyn(&[0, 1])].is_nan());
    assert!(s[IxDyn(&[0, 0])].is_finite());
}

#[test]
fn symbolic_endpoints_resolve_against_sibling_values() {
    // b's domain is (a, inf): the same b can be valid or invalid depending on a
    let u = Uniform::new(vec![0.0, 1.5], 1.0).unwrap();
    let pdf = u.pdf(0.5);
    assert_relative_eq!(pdf[IxDyn(&[0])], 1.0);
    assert!(pdf[IxDyn(&[1])].is_nan());
}

#[test]
fn zero_parameter_family_constructs_from_nothing() {
    let d = StandardNormal::new();
    assert_eq!(d.shape(), &[] as &[usize]);
    let err = Distribution::<StandardNormal>::from_named(vec![("mu", 0.0.into())]).unwrap_err();
    assert!(matches!(err, Error::UnknownParameterization { .. }));
}

// ============================================================================
// Registration-time authoring errors
// ============================================================================

struct CyclicFamily;

impl ContinuousFamily for CyclicFamily {
    type Params = ();

    const NAME: &'static str = "Cyclic";
    const FORMULAS: FormulaSet = FormulaSet::none().with_pdf();

    fn spec() -> &'static ValidatedSpec {
        const A: RealParameter = RealParameter::new(
            "a",
            RealDomain::between(Endpoint::Param("b"), Endpoint::Value(f64::INFINITY)),
            (0.0, 1.0),
        );
        const B: RealParameter = RealParameter::new(
            "b",
            RealDomain::between(Endpoint::Param("a"), Endpoint::Value(f64::INFINITY)),
            (0.0, 1.0),
        );
        const X: RealParameter =
            RealParameter::new("x", RealDomain::open(0.0, 1.0), (0.0, 1.0));
        static PARAMS: [RealParameter; 2] = [A, B];
        static PARAMETERIZATIONS: [Parameterization; 1] = [Parameterization::new(&PARAMS)];
        static SLOT: OnceLock<ValidatedSpec> = OnceLock::new();
        statdist::family::register(
            &SLOT,
            FamilySpec {
                name: Self::NAME,
                variable: X,
                parameterizations: &PARAMETERIZATIONS,
            },
            Self::FORMULAS,
        )
    }

    fn pack(_values: &ParamMap) {}

    fn support(_p: &()) -> (f64, f64) {
        (0.0, 1.0)
    }

    fn pdf_formula(_p: &(), _x: f64) -> f64 {
        1.0
    }
}

#[test]
#[should_panic(expected = "cyclic domain dependency")]
fn cyclic_domains_are_a_registration_error() {
    let _ = Distribution::<CyclicFamily>::from_named(vec![
        ("a", 1.0.into()),
        ("b", 2.0.into()),
    ]);
}

struct FormulaFreeFamily;

impl ContinuousFamily for FormulaFreeFamily {
    type Params = ();

    const NAME: &'static str = "FormulaFree";
    const FORMULAS: FormulaSet = FormulaSet::none();

    fn spec() -> &'static ValidatedSpec {
        const X: RealParameter =
            RealParameter::new("x", RealDomain::open(0.0, 1.0), (0.0, 1.0));
        static SLOT: OnceLock<ValidatedSpec> = OnceLock::new();
        statdist::family::register(
            &SLOT,
            FamilySpec {
                name: Self::NAME,
                variable: X,
                parameterizations: &[],
            },
            Self::FORMULAS,
        )
    }

    fn pack(_values: &ParamMap) {}

    fn support(_p: &()) -> (f64, f64) {
        (0.0, 1.0)
    }
}

#[test]
#[should_panic(expected = "must provide a PDF or log-PDF formula")]
fn a_family_without_any_density_formula_is_rejected() {
    let _ = Distribution::<FormulaFreeFamily>::from_named(Vec::new());
}
