//! Normal (Gaussian) family, its standard-normal specialization, and the
//! explicit factory that picks between them.

use std::sync::OnceLock;

use ndarray::ArrayD;
use rand::Rng;
use rand_distr::{Distribution as Draw, StandardNormal as StandardNormalSampler};

use crate::domain::RealDomain;
use crate::engine::{Distribution, MomentKind, ParamInput};
use crate::error::Result;
use crate::family::{register, ContinuousFamily, FamilySpec, FormulaSet, ValidatedSpec};
use crate::parameter::{ParamMap, RealParameter};
use crate::special::{double_factorial, log_ndtr, ndtr, ndtri, ndtri_exp, INV_SQRT_2PI, LN_SQRT_2PI};

const FULL_REAL: RealDomain = RealDomain::open(f64::NEG_INFINITY, f64::INFINITY);

fn std_pdf(z: f64) -> f64 {
    INV_SQRT_2PI * (-0.5 * z * z).exp()
}

fn std_logpdf(z: f64) -> f64 {
    -(LN_SQRT_2PI + 0.5 * z * z)
}

fn std_entropy() -> f64 {
    0.5 * (1.0 + (2.0 * std::f64::consts::PI).ln())
}

/// The normal distribution with prescribed mean and standard deviation.
///
/// `f(x) = 1 / (sigma * sqrt(2 pi)) * exp(-((x - mu) / sigma)^2 / 2)`
///
/// The standard normal is so common that it gets its own zero-parameter
/// family ([`StandardNormal`]); the [`normal`] factory picks between the two.
pub struct Normal;

/// Resolved per-element parameters of [`Normal`].
#[derive(Debug, Clone)]
pub struct NormalParams {
    pub mu: f64,
    pub sigma: f64,
}

impl NormalParams {
    fn z(&self, x: f64) -> f64 {
        (x - self.mu) / self.sigma
    }
}

impl Normal {
    /// A normal distribution with the given mean and standard deviation
    /// (broadcast against each other).
    pub fn new(
        mu: impl Into<ParamInput>,
        sigma: impl Into<ParamInput>,
    ) -> Result<Distribution<Normal>> {
        Distribution::from_named(vec![("mu", mu.into()), ("sigma", sigma.into())])
    }
}

impl ContinuousFamily for Normal {
    type Params = NormalParams;

    const NAME: &'static str = "Normal";
    const FORMULAS: FormulaSet = FormulaSet::none()
        .with_pdf()
        .with_logpdf()
        .with_cdf()
        .with_logcdf()
        .with_ccdf()
        .with_logccdf()
        .with_icdf()
        .with_ilogcdf()
        .with_iccdf()
        .with_ilogccdf()
        .with_entropy()
        .with_logentropy()
        .with_median()
        .with_mode()
        .with_sample();
    const SYMMETRIC: bool = true;

    fn spec() -> &'static ValidatedSpec {
        const MU: RealParameter =
            RealParameter::new("mu", FULL_REAL, (-1.0, 1.0)).with_symbol("μ");
        const SIGMA: RealParameter =
            RealParameter::new("sigma", RealDomain::open(0.0, f64::INFINITY), (0.5, 1.5))
                .with_symbol("σ");
        const X: RealParameter = RealParameter::new("x", FULL_REAL, (-1.0, 1.0));
        static PARAMS: [RealParameter; 2] = [MU, SIGMA];
        static PARAMETERIZATIONS: [crate::parameter::Parameterization; 1] =
            [crate::parameter::Parameterization::new(&PARAMS)];
        static SLOT: OnceLock<ValidatedSpec> = OnceLock::new();
        register(
            &SLOT,
            FamilySpec {
                name: Self::NAME,
                variable: X,
                parameterizations: &PARAMETERIZATIONS,
            },
            Self::FORMULAS,
        )
    }

    fn pack(values: &ParamMap) -> NormalParams {
        NormalParams {
            mu: values["mu"],
            sigma: values["sigma"],
        }
    }

    fn support(_p: &NormalParams) -> (f64, f64) {
        (f64::NEG_INFINITY, f64::INFINITY)
    }

    fn pdf_formula(p: &NormalParams, x: f64) -> f64 {
        std_pdf(p.z(x)) / p.sigma
    }

    fn logpdf_formula(p: &NormalParams, x: f64) -> f64 {
        std_logpdf(p.z(x)) - p.sigma.ln()
    }

    fn cdf_formula(p: &NormalParams, x: f64) -> f64 {
        ndtr(p.z(x))
    }

    fn logcdf_formula(p: &NormalParams, x: f64) -> f64 {
        log_ndtr(p.z(x))
    }

    fn ccdf_formula(p: &NormalParams, x: f64) -> f64 {
        ndtr(-p.z(x))
    }

    fn logccdf_formula(p: &NormalParams, x: f64) -> f64 {
        log_ndtr(-p.z(x))
    }

    fn icdf_formula(p: &NormalParams, q: f64) -> f64 {
        p.mu + p.sigma * ndtri(q)
    }

    fn ilogcdf_formula(p: &NormalParams, logq: f64) -> f64 {
        p.mu + p.sigma * ndtri_exp(logq)
    }

    fn iccdf_formula(p: &NormalParams, q: f64) -> f64 {
        p.mu - p.sigma * ndtri(q)
    }

    fn ilogccdf_formula(p: &NormalParams, logq: f64) -> f64 {
        p.mu - p.sigma * ndtri_exp(logq)
    }

    fn entropy_formula(p: &NormalParams) -> f64 {
        std_entropy() + p.sigma.ln()
    }

    fn logentropy_formula(p: &NormalParams) -> f64 {
        Self::entropy_formula(p).ln()
    }

    fn median_formula(p: &NormalParams) -> f64 {
        p.mu
    }

    fn mode_formula(p: &NormalParams) -> f64 {
        p.mu
    }

    fn moment_raw_formula(p: &NormalParams, order: u32) -> Option<f64> {
        match order {
            0 => Some(1.0),
            1 => Some(p.mu),
            _ => None,
        }
    }

    fn moment_central_formula(p: &NormalParams, order: u32) -> Option<f64> {
        Some(match order {
            0 => 1.0,
            k if k % 2 == 1 => 0.0,
            // Exact combinatorial factor: E[(X - mu)^k] = sigma^k (k - 1)!!
            k => p.sigma.powi(k as i32) * double_factorial(k - 1),
        })
    }

    fn sample_formula<R: Rng + ?Sized>(p: &NormalParams, rng: &mut R) -> f64 {
        let z: f64 = StandardNormalSampler.sample(rng);
        p.mu + p.sigma * z
    }
}

/// The standard normal distribution `N(0, 1)`.
///
/// A zero-parameter family: construction takes no arguments and yields a
/// scalar (0-dimensional) instance.
pub struct StandardNormal;

impl StandardNormal {
    pub fn new() -> Distribution<StandardNormal> {
        Distribution::from_named(Vec::new()).expect("the standard normal takes no parameters")
    }
}

impl ContinuousFamily for StandardNormal {
    type Params = ();

    const NAME: &'static str = "StandardNormal";
    const FORMULAS: FormulaSet = Normal::FORMULAS;
    const SYMMETRIC: bool = true;

    fn spec() -> &'static ValidatedSpec {
        const X: RealParameter = RealParameter::new("x", FULL_REAL, (-5.0, 5.0));
        static SLOT: OnceLock<ValidatedSpec> = OnceLock::new();
        register(
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
        (f64::NEG_INFINITY, f64::INFINITY)
    }

    fn pdf_formula(_p: &(), x: f64) -> f64 {
        std_pdf(x)
    }

    fn logpdf_formula(_p: &(), x: f64) -> f64 {
        std_logpdf(x)
    }

    fn cdf_formula(_p: &(), x: f64) -> f64 {
        ndtr(x)
    }

    fn logcdf_formula(_p: &(), x: f64) -> f64 {
        log_ndtr(x)
    }

    fn ccdf_formula(_p: &(), x: f64) -> f64 {
        ndtr(-x)
    }

    fn logccdf_formula(_p: &(), x: f64) -> f64 {
        log_ndtr(-x)
    }

    fn icdf_formula(_p: &(), q: f64) -> f64 {
        ndtri(q)
    }

    fn ilogcdf_formula(_p: &(), logq: f64) -> f64 {
        ndtri_exp(logq)
    }

    fn iccdf_formula(_p: &(), q: f64) -> f64 {
        -ndtri(q)
    }

    fn ilogccdf_formula(_p: &(), logq: f64) -> f64 {
        -ndtri_exp(logq)
    }

    fn entropy_formula(_p: &()) -> f64 {
        std_entropy()
    }

    fn logentropy_formula(_p: &()) -> f64 {
        (2.0 * std::f64::consts::PI).ln().ln_1p() - std::f64::consts::LN_2
    }

    fn median_formula(_p: &()) -> f64 {
        0.0
    }

    fn mode_formula(_p: &()) -> f64 {
        0.0
    }

    fn moment_raw_formula(_p: &(), order: u32) -> Option<f64> {
        match order {
            0 => Some(1.0),
            1 => Some(0.0),
            2 => Some(1.0),
            3 => Some(0.0),
            4 => Some(3.0),
            5 => Some(0.0),
            _ => None,
        }
    }

    fn moment_central_formula(p: &(), order: u32) -> Option<f64> {
        Self::moment_raw_formula(p, order)
    }

    fn moment_standardized_formula(p: &(), order: u32) -> Option<f64> {
        Self::moment_raw_formula(p, order)
    }

    fn sample_formula<R: Rng + ?Sized>(_p: &(), rng: &mut R) -> f64 {
        StandardNormalSampler.sample(rng)
    }
}

/// Either normal variant, as picked by the [`normal`] factory.
#[derive(Debug, Clone)]
pub enum AnyNormal {
    Standard(Distribution<StandardNormal>),
    General(Distribution<Normal>),
}

/// Builds a normal distribution from optional parameters.
///
/// With both `mu` and `sigma` omitted this returns the specialized
/// [`StandardNormal`] variant; otherwise the general family, with the missing
/// argument defaulted to 0 or 1.
pub fn normal(mu: Option<ParamInput>, sigma: Option<ParamInput>) -> Result<AnyNormal> {
    match (mu, sigma) {
        (None, None) => Ok(AnyNormal::Standard(StandardNormal::new())),
        (mu, sigma) => Normal::new(
            mu.unwrap_or_else(|| 0.0.into()),
            sigma.unwrap_or_else(|| 1.0.into()),
        )
        .map(AnyNormal::General),
    }
}

macro_rules! forward {
    ($self:ident, $d:ident => $body:expr) => {
        match $self {
            AnyNormal::Standard($d) => $body,
            AnyNormal::General($d) => $body,
        }
    };
}

impl AnyNormal {
    pub fn pdf(&self, x: impl Into<ParamInput>) -> ArrayD<f64> {
        forward!(self, d => d.pdf(x))
    }
    pub fn logpdf(&self, x: impl Into<ParamInput>) -> ArrayD<f64> {
        forward!(self, d => d.logpdf(x))
    }
    pub fn cdf(&self, x: impl Into<ParamInput>) -> ArrayD<f64> {
        forward!(self, d => d.cdf(x))
    }
    pub fn logcdf(&self, x: impl Into<ParamInput>) -> ArrayD<f64> {
        forward!(self, d => d.logcdf(x))
    }
    pub fn ccdf(&self, x: impl Into<ParamInput>) -> ArrayD<f64> {
        forward!(self, d => d.ccdf(x))
    }
    pub fn logccdf(&self, x: impl Into<ParamInput>) -> ArrayD<f64> {
        forward!(self, d => d.logccdf(x))
    }
    pub fn icdf(&self, q: impl Into<ParamInput>) -> ArrayD<f64> {
        forward!(self, d => d.icdf(q))
    }
    pub fn ilogcdf(&self, logq: impl Into<ParamInput>) -> ArrayD<f64> {
        forward!(self, d => d.ilogcdf(logq))
    }
    pub fn iccdf(&self, q: impl Into<ParamInput>) -> ArrayD<f64> {
        forward!(self, d => d.iccdf(q))
    }
    pub fn ilogccdf(&self, logq: impl Into<ParamInput>) -> ArrayD<f64> {
        forward!(self, d => d.ilogccdf(logq))
    }
    pub fn support(&self) -> (ArrayD<f64>, ArrayD<f64>) {
        forward!(self, d => d.support())
    }
    pub fn entropy(&self) -> ArrayD<f64> {
        forward!(self, d => d.entropy())
    }
    pub fn logentropy(&self) -> ArrayD<f64> {
        forward!(self, d => d.logentropy())
    }
    pub fn median(&self) -> ArrayD<f64> {
        forward!(self, d => d.median())
    }
    pub fn mode(&self) -> ArrayD<f64> {
        forward!(self, d => d.mode())
    }
    pub fn mean(&self) -> ArrayD<f64> {
        forward!(self, d => d.mean())
    }
    pub fn variance(&self) -> ArrayD<f64> {
        forward!(self, d => d.variance())
    }
    pub fn standard_deviation(&self) -> ArrayD<f64> {
        forward!(self, d => d.standard_deviation())
    }
    pub fn skewness(&self) -> ArrayD<f64> {
        forward!(self, d => d.skewness())
    }
    pub fn kurtosis(&self) -> ArrayD<f64> {
        forward!(self, d => d.kurtosis())
    }
    pub fn moment(&self, order: i64, kind: MomentKind) -> Option<ArrayD<f64>> {
        forward!(self, d => d.moment(order, kind))
    }
    pub fn sample<R: Rng + ?Sized>(&self, shape: &[usize], rng: &mut R) -> ArrayD<f64> {
        forward!(self, d => d.sample(shape, rng))
    }
}
