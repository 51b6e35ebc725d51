//! Arbitrary-precision reference oracle.
//!
//! A minimalist mirror of the production engine used to generate trustworthy
//! ground truth for accuracy tests. Method implementations stay as close to
//! their mathematical definitions as possible: exact complementary
//! identities are always preferred when a family overrides one side, and
//! everything else falls back to brute-force quadrature and root finding in
//! arbitrary precision. Construction refuses to proceed when the ambient
//! working precision is unset or too low, since a silently-low-precision
//! oracle would produce misleading reference values.

pub mod families;
pub mod quad;
pub mod real;

pub use families::{RefLogUniform, RefNormal, RefUniform};
pub use real::{set_working_precision, working_precision, Real};

use crate::error::{Error, Result};

/// Capability table for the few overridable reference methods.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefFormulaSet {
    pub cdf: bool,
    pub sf: bool,
}

impl RefFormulaSet {
    pub const fn none() -> Self {
        RefFormulaSet {
            cdf: false,
            sf: false,
        }
    }

    pub const fn with_cdf(mut self) -> Self {
        self.cdf = true;
        self
    }

    pub const fn with_sf(mut self) -> Self {
        self.sf = true;
        self
    }
}

/// A family as seen by the oracle: arbitrary-precision parameters, a density,
/// and optionally a direct CDF or survival formula.
///
/// Hesitate to override more than the density: the generic implementations
/// are mathematically transparent, an override is another place to make a
/// mistake.
pub trait ReferenceFamily: Sized + 'static {
    type Params;

    const NAME: &'static str;
    const OVERRIDES: RefFormulaSet = RefFormulaSet::none();

    fn support(_params: &Self::Params) -> (Real, Real) {
        (Real::neg_infinity(), Real::infinity())
    }

    fn pdf(params: &Self::Params, x: &Real) -> Real;

    fn cdf_formula(_params: &Self::Params, _x: &Real) -> Real {
        unreachable!("cdf override not declared")
    }

    fn sf_formula(_params: &Self::Params, _x: &Real) -> Real {
        unreachable!("sf override not declared")
    }
}

/// A fully-specified reference distribution.
pub struct Reference<F: ReferenceFamily> {
    params: F::Params,
}

impl<F: ReferenceFamily> std::fmt::Debug for Reference<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Reference<{}>", F::NAME)
    }
}

impl<F: ReferenceFamily> Reference<F> {
    /// Builds the oracle after checking the ambient precision.
    ///
    /// The closure defers parameter conversion until the check has passed,
    /// so no arbitrary-precision value is ever created under a bad context.
    pub fn from_params(make: impl FnOnce() -> F::Params) -> Result<Self> {
        match working_precision() {
            None => Err(Error::PrecisionUnset),
            Some(dps) if dps <= 15 => Err(Error::PrecisionTooLow { digits: dps }),
            Some(_) => Ok(Reference { params: make() }),
        }
    }

    // ------------------------------------------------------------------
    // Exact ("object dtype") forms
    // ------------------------------------------------------------------

    pub fn pdf_exact(&self, x: &Real) -> Real {
        F::pdf(&self.params, x)
    }

    pub fn logpdf_exact(&self, x: &Real) -> Real {
        self.pdf_exact(x).ln()
    }

    pub fn cdf_exact(&self, x: &Real) -> Real {
        if F::OVERRIDES.cdf {
            return F::cdf_formula(&self.params, x);
        }
        if F::OVERRIDES.sf {
            return Real::one() - F::sf_formula(&self.params, x);
        }
        let (a, b) = F::support(&self.params);
        let lower = quad::integrate(|t| F::pdf(&self.params, t), &a, x);
        if lower <= Real::from_f64(0.5) {
            lower
        } else {
            Real::one() - quad::integrate(|t| F::pdf(&self.params, t), x, &b)
        }
    }

    pub fn sf_exact(&self, x: &Real) -> Real {
        if F::OVERRIDES.sf {
            return F::sf_formula(&self.params, x);
        }
        if F::OVERRIDES.cdf {
            return Real::one() - F::cdf_formula(&self.params, x);
        }
        let (a, b) = F::support(&self.params);
        let upper = quad::integrate(|t| F::pdf(&self.params, t), x, &b);
        if upper <= Real::from_f64(0.5) {
            upper
        } else {
            Real::one() - quad::integrate(|t| F::pdf(&self.params, t), &a, x)
        }
    }

    pub fn logcdf_exact(&self, x: &Real) -> Real {
        self.cdf_exact(x).ln()
    }

    pub fn logsf_exact(&self, x: &Real) -> Real {
        self.sf_exact(x).ln()
    }

    pub fn ppf_exact(&self, p: &Real, guess: &Real) -> Real {
        quad::find_root(|x| self.cdf_exact(x) - p.clone(), guess)
    }

    pub fn isf_exact(&self, p: &Real, guess: &Real) -> Real {
        quad::find_root(|x| self.sf_exact(x) - p.clone(), guess)
    }

    pub fn support_exact(&self) -> (Real, Real) {
        F::support(&self.params)
    }

    pub fn entropy_exact(&self) -> Real {
        let (a, b) = F::support(&self.params);
        -quad::integrate(
            |x| {
                let logpdf = F::pdf(&self.params, x).ln();
                logpdf.exp() * logpdf
            },
            &a,
            &b,
        )
    }

    /// Raw moment about `center`; `None` centers at the mean.
    pub fn moment_exact(&self, order: u32, center: Option<&Real>) -> Real {
        let center = match center {
            Some(c) => c.clone(),
            None => self.mean_exact(),
        };
        let (a, b) = F::support(&self.params);
        quad::integrate(
            |x| F::pdf(&self.params, x) * (x - &center).powi(order as i32),
            &a,
            &b,
        )
    }

    pub fn mean_exact(&self) -> Real {
        self.moment_exact(1, Some(&Real::zero()))
    }

    pub fn var_exact(&self) -> Real {
        self.moment_exact(2, None)
    }

    pub fn skew_exact(&self) -> Real {
        let sigma = self.var_exact().sqrt();
        self.moment_exact(3, None) / sigma.powi(3)
    }

    /// Excess kurtosis.
    pub fn kurtosis_exact(&self) -> Real {
        let u2 = self.var_exact();
        self.moment_exact(4, None) / u2.powi(2) - Real::from_f64(3.0)
    }

    // ------------------------------------------------------------------
    // Default f64 forms
    // ------------------------------------------------------------------

    pub fn pdf(&self, x: f64) -> f64 {
        self.pdf_exact(&Real::from_f64(x)).to_f64()
    }

    pub fn logpdf(&self, x: f64) -> f64 {
        self.logpdf_exact(&Real::from_f64(x)).to_f64()
    }

    pub fn cdf(&self, x: f64) -> f64 {
        self.cdf_exact(&Real::from_f64(x)).to_f64()
    }

    pub fn sf(&self, x: f64) -> f64 {
        self.sf_exact(&Real::from_f64(x)).to_f64()
    }

    pub fn logcdf(&self, x: f64) -> f64 {
        self.logcdf_exact(&Real::from_f64(x)).to_f64()
    }

    pub fn logsf(&self, x: f64) -> f64 {
        self.logsf_exact(&Real::from_f64(x)).to_f64()
    }

    pub fn ppf(&self, p: f64, guess: f64) -> f64 {
        self.ppf_exact(&Real::from_f64(p), &Real::from_f64(guess))
            .to_f64()
    }

    pub fn isf(&self, p: f64, guess: f64) -> f64 {
        self.isf_exact(&Real::from_f64(p), &Real::from_f64(guess))
            .to_f64()
    }

    pub fn support(&self) -> (f64, f64) {
        let (a, b) = self.support_exact();
        (a.to_f64(), b.to_f64())
    }

    pub fn entropy(&self) -> f64 {
        self.entropy_exact().to_f64()
    }

    pub fn moment(&self, order: u32, center: Option<f64>) -> f64 {
        let center = center.map(Real::from_f64);
        self.moment_exact(order, center.as_ref()).to_f64()
    }

    pub fn mean(&self) -> f64 {
        self.mean_exact().to_f64()
    }

    pub fn var(&self) -> f64 {
        self.var_exact().to_f64()
    }

    pub fn skew(&self) -> f64 {
        self.skew_exact().to_f64()
    }

    pub fn kurtosis(&self) -> f64 {
        self.kurtosis_exact().to_f64()
    }
}
