//! The derivation engine: from a family's declared formulas to the complete
//! statistical method surface.
//!
//! Every public method resolves its quantity by priority: a direct formula
//! from the family, then a one-step algebraic identity from a *directly
//! provided* sibling formula (complements, log forms, inverse pairs), then a
//! generic numerical fallback (quadrature, monotone root finding, bounded
//! search). Domain masking is applied per element regardless of the path
//! taken: arguments outside the support saturate, invalid parameter elements
//! yield NaN, and NaN arguments propagate.

use std::fmt;

use ndarray::{Array1, Array2, ArrayD, IxDyn, Zip};
use rand::Rng;

use crate::error::{Error, Result};
use crate::family::ContinuousFamily;
use crate::parameter::ParamMap;
use crate::quadrature::{self, QuadOptions};
use crate::rootfind::{self, RootOptions};
use crate::special::{binomial, log1mexp};

/// Which kind of moment [`Distribution::moment`] computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MomentKind {
    /// `E[X^k]`.
    Raw,
    /// `E[(X - mean)^k]`.
    Central,
    /// `E[(X - mean)^k] / sigma^k`.
    Standardized,
}

/// A scalar-or-array argument: parameter values and evaluation points enter
/// the API through this wrapper and broadcast against each other.
#[derive(Debug, Clone)]
pub struct ParamInput(pub(crate) ArrayD<f64>);

impl From<f64> for ParamInput {
    fn from(v: f64) -> Self {
        ParamInput(ArrayD::from_elem(IxDyn(&[]), v))
    }
}

impl From<Vec<f64>> for ParamInput {
    fn from(v: Vec<f64>) -> Self {
        ParamInput(Array1::from_vec(v).into_dyn())
    }
}

impl From<&[f64]> for ParamInput {
    fn from(v: &[f64]) -> Self {
        ParamInput(Array1::from_vec(v.to_vec()).into_dyn())
    }
}

impl<const N: usize> From<[f64; N]> for ParamInput {
    fn from(v: [f64; N]) -> Self {
        ParamInput(Array1::from_vec(v.to_vec()).into_dyn())
    }
}

impl From<Array1<f64>> for ParamInput {
    fn from(v: Array1<f64>) -> Self {
        ParamInput(v.into_dyn())
    }
}

impl From<Array2<f64>> for ParamInput {
    fn from(v: Array2<f64>) -> Self {
        ParamInput(v.into_dyn())
    }
}

impl From<ArrayD<f64>> for ParamInput {
    fn from(v: ArrayD<f64>) -> Self {
        ParamInput(v)
    }
}

impl From<&ArrayD<f64>> for ParamInput {
    fn from(v: &ArrayD<f64>) -> Self {
        ParamInput(v.clone())
    }
}

/// NumPy-style right-aligned shape broadcasting.
pub(crate) fn broadcast_shapes(a: &[usize], b: &[usize]) -> Option<Vec<usize>> {
    let n = a.len().max(b.len());
    let mut out = vec![0usize; n];
    for i in 0..n {
        let da = if i < n - a.len() { 1 } else { a[i - (n - a.len())] };
        let db = if i < n - b.len() { 1 } else { b[i - (n - b.len())] };
        out[i] = if da == db || db == 1 {
            da
        } else if da == 1 {
            db
        } else {
            return None;
        };
    }
    Some(out)
}

/// Where an argument sits relative to the (resolved, inclusivity-aware)
/// support of one element.
enum Place {
    Below,
    Inside,
    Above,
}

/// A fully-specified instance of a distribution family.
///
/// Holds one resolved parameter record per broadcast element; elements whose
/// parameters violated their domains are `None` and evaluate to NaN
/// everywhere.
pub struct Distribution<F: ContinuousFamily> {
    cells: ArrayD<Option<F::Params>>,
}

impl<F: ContinuousFamily> Clone for Distribution<F> {
    fn clone(&self) -> Self {
        Distribution {
            cells: self.cells.clone(),
        }
    }
}

impl<F: ContinuousFamily> fmt::Debug for Distribution<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Distribution<{}>{:?}", F::NAME, self.cells.shape())
    }
}

impl<F: ContinuousFamily> Distribution<F> {
    /// Constructs an instance from keyword-style `(name, values)` pairs.
    ///
    /// The supplied names must exactly match one registered parameterization
    /// (a structurally impossible set fails eagerly); the values broadcast to
    /// a common shape. Each broadcast element is validated against its
    /// domains in dependency order; invalid elements are masked, not fatal.
    pub fn from_named(supplied: Vec<(&'static str, ParamInput)>) -> Result<Self> {
        let spec = F::spec();
        let names: Vec<&str> = supplied.iter().map(|(n, _)| *n).collect();

        let pz_idx = match spec.raw.parameterizations.iter().position(|pz| pz.matches(&names)) {
            Some(i) => Some(i),
            None if spec.raw.parameterizations.is_empty() && names.is_empty() => None,
            None => {
                let alternatives = if spec.raw.parameterizations.is_empty() {
                    "(no parameters)".to_string()
                } else {
                    spec.raw
                        .parameterizations
                        .iter()
                        .map(|pz| pz.describe())
                        .collect::<Vec<_>>()
                        .join(" or ")
                };
                return Err(Error::UnknownParameterization {
                    family: F::NAME,
                    supplied: names.join(", "),
                    alternatives,
                });
            }
        };

        let mut shape: Vec<usize> = Vec::new();
        for (name, input) in &supplied {
            shape = broadcast_shapes(&shape, input.0.shape()).ok_or_else(|| {
                Error::BroadcastMismatch {
                    name: *name,
                    shape: input.0.shape().to_vec(),
                    against: shape.clone(),
                }
            })?;
        }
        let size: usize = shape.iter().product();

        let arrays: Vec<ArrayD<f64>> = supplied
            .iter()
            .map(|(_, input)| input.0.broadcast(IxDyn(&shape)).unwrap().to_owned())
            .collect();
        let slices: Vec<&[f64]> = arrays.iter().map(|a| a.as_slice().unwrap()).collect();

        let mut cells: Vec<Option<F::Params>> = Vec::with_capacity(size);
        for j in 0..size {
            let mut values = ParamMap::new();
            for (k, (name, _)) in supplied.iter().enumerate() {
                values.insert(*name, slices[k][j]);
            }
            let valid = match pz_idx {
                Some(i) => Self::validate_element(i, &values),
                None => true,
            };
            if valid {
                F::process(&mut values);
                cells.push(Some(F::pack(&values)));
            } else {
                cells.push(None);
            }
        }
        Ok(Distribution {
            cells: ArrayD::from_shape_vec(IxDyn(&shape), cells).unwrap(),
        })
    }

    fn validate_element(pz_idx: usize, values: &ParamMap) -> bool {
        let spec = F::spec();
        let pz = &spec.raw.parameterizations[pz_idx];
        for &i in &spec.orders[pz_idx] {
            let p = &pz.parameters[i];
            let v = values[p.name];
            let (lo, hi) = p.domain.resolve(values);
            if !p.domain.contains(v, lo, hi) {
                return false;
            }
        }
        true
    }

    /// Broadcast shape of the parameter batch.
    pub fn shape(&self) -> &[usize] {
        self.cells.shape()
    }

    // ------------------------------------------------------------------
    // Argument-taking methods
    // ------------------------------------------------------------------

    /// Probability density function.
    pub fn pdf(&self, x: impl Into<ParamInput>) -> ArrayD<f64> {
        self.map_x(x.into(), Self::pdf_cell)
    }

    /// Log of the probability density function.
    pub fn logpdf(&self, x: impl Into<ParamInput>) -> ArrayD<f64> {
        self.map_x(x.into(), Self::logpdf_cell)
    }

    /// Cumulative distribution function.
    pub fn cdf(&self, x: impl Into<ParamInput>) -> ArrayD<f64> {
        self.map_x(x.into(), Self::cdf_cell)
    }

    /// Log of the cumulative distribution function.
    pub fn logcdf(&self, x: impl Into<ParamInput>) -> ArrayD<f64> {
        self.map_x(x.into(), Self::logcdf_cell)
    }

    /// Complementary CDF (survival function).
    pub fn ccdf(&self, x: impl Into<ParamInput>) -> ArrayD<f64> {
        self.map_x(x.into(), Self::ccdf_cell)
    }

    /// Survival function; alias of [`Self::ccdf`].
    pub fn sf(&self, x: impl Into<ParamInput>) -> ArrayD<f64> {
        self.ccdf(x)
    }

    /// Log of the complementary CDF.
    pub fn logccdf(&self, x: impl Into<ParamInput>) -> ArrayD<f64> {
        self.map_x(x.into(), Self::logccdf_cell)
    }

    /// Log survival function; alias of [`Self::logccdf`].
    pub fn logsf(&self, x: impl Into<ParamInput>) -> ArrayD<f64> {
        self.logccdf(x)
    }

    /// Inverse CDF (quantile function) of a probability in `[0, 1]`.
    pub fn icdf(&self, q: impl Into<ParamInput>) -> ArrayD<f64> {
        self.map_x(q.into(), Self::icdf_cell)
    }

    /// Quantile function; alias of [`Self::icdf`].
    pub fn ppf(&self, q: impl Into<ParamInput>) -> ArrayD<f64> {
        self.icdf(q)
    }

    /// Inverse of [`Self::logcdf`]: takes a log-probability in `[-inf, 0]`.
    pub fn ilogcdf(&self, logq: impl Into<ParamInput>) -> ArrayD<f64> {
        self.map_x(logq.into(), Self::ilogcdf_cell)
    }

    /// Inverse complementary CDF of a probability in `[0, 1]`.
    pub fn iccdf(&self, q: impl Into<ParamInput>) -> ArrayD<f64> {
        self.map_x(q.into(), Self::iccdf_cell)
    }

    /// Inverse survival function; alias of [`Self::iccdf`].
    pub fn isf(&self, q: impl Into<ParamInput>) -> ArrayD<f64> {
        self.iccdf(q)
    }

    /// Inverse of [`Self::logccdf`].
    pub fn ilogccdf(&self, logq: impl Into<ParamInput>) -> ArrayD<f64> {
        self.map_x(logq.into(), Self::ilogccdf_cell)
    }

    // ------------------------------------------------------------------
    // Nullary methods
    // ------------------------------------------------------------------

    /// Resolved support bounds per element.
    pub fn support(&self) -> (ArrayD<f64>, ArrayD<f64>) {
        (
            self.map_cells(|p| F::support(p).0),
            self.map_cells(|p| F::support(p).1),
        )
    }

    /// Differential entropy.
    pub fn entropy(&self) -> ArrayD<f64> {
        self.map_cells(Self::entropy_at)
    }

    /// Log of the differential entropy (NaN where the entropy is negative).
    pub fn logentropy(&self) -> ArrayD<f64> {
        self.map_cells(|p| {
            if F::FORMULAS.logentropy {
                F::logentropy_formula(p)
            } else {
                Self::entropy_at(p).ln()
            }
        })
    }

    /// Median.
    pub fn median(&self) -> ArrayD<f64> {
        self.map_cells(Self::median_at)
    }

    /// Mode (a maximizer of the PDF).
    pub fn mode(&self) -> ArrayD<f64> {
        self.map_cells(Self::mode_at)
    }

    /// Mean (first raw moment).
    pub fn mean(&self) -> ArrayD<f64> {
        self.map_cells(|p| Self::moment_raw(p, 1))
    }

    /// Variance (second central moment).
    pub fn variance(&self) -> ArrayD<f64> {
        self.map_cells(|p| Self::moment_central(p, 2))
    }

    /// Standard deviation.
    pub fn standard_deviation(&self) -> ArrayD<f64> {
        self.map_cells(|p| Self::moment_central(p, 2).sqrt())
    }

    /// Skewness (third standardized moment).
    pub fn skewness(&self) -> ArrayD<f64> {
        self.map_cells(|p| Self::moment_standardized(p, 3))
    }

    /// Kurtosis (fourth standardized moment, not excess).
    pub fn kurtosis(&self) -> ArrayD<f64> {
        self.map_cells(|p| Self::moment_standardized(p, 4))
    }

    /// Moment of the requested order and kind.
    ///
    /// Returns `None` for structurally unavailable requests (negative
    /// order); any non-negative order has at worst a quadrature path.
    pub fn moment(&self, order: i64, kind: MomentKind) -> Option<ArrayD<f64>> {
        if order < 0 {
            return None;
        }
        let k = order as u32;
        Some(match kind {
            MomentKind::Raw => self.map_cells(|p| Self::moment_raw(p, k)),
            MomentKind::Central => self.map_cells(|p| Self::moment_central(p, k)),
            MomentKind::Standardized => self.map_cells(|p| Self::moment_standardized(p, k)),
        })
    }

    /// Draws pseudo-random variates.
    ///
    /// The output shape is `shape` followed by the parameter batch shape.
    /// The generator handle is borrowed for this call only; absent a family
    /// sampler, inverse-transform sampling through the quantile function is
    /// used.
    pub fn sample<R: Rng + ?Sized>(&self, shape: &[usize], rng: &mut R) -> ArrayD<f64> {
        let draws: usize = shape.iter().product();
        let full: Vec<usize> = shape.iter().chain(self.cells.shape().iter()).copied().collect();
        let mut data = Vec::with_capacity(draws * self.cells.len());
        for _ in 0..draws {
            for cell in self.cells.iter() {
                data.push(match cell {
                    Some(p) => Self::sample_at(p, rng),
                    None => f64::NAN,
                });
            }
        }
        ArrayD::from_shape_vec(IxDyn(&full), data).unwrap()
    }

    // ------------------------------------------------------------------
    // Elementwise drivers
    // ------------------------------------------------------------------

    fn map_x(&self, x: ParamInput, f: impl Fn(&F::Params, f64) -> f64) -> ArrayD<f64> {
        let shape = broadcast_shapes(self.cells.shape(), x.0.shape()).unwrap_or_else(|| {
            panic!(
                "argument shape {:?} does not broadcast against distribution shape {:?}",
                x.0.shape(),
                self.cells.shape()
            )
        });
        let cells = self.cells.broadcast(IxDyn(&shape)).unwrap();
        let xs = x.0.broadcast(IxDyn(&shape)).unwrap();
        let mut out = ArrayD::zeros(IxDyn(&shape));
        Zip::from(&mut out).and(cells).and(xs).for_each(|o, cell, &xv| {
            *o = match cell {
                Some(p) => f(p, xv),
                None => f64::NAN,
            };
        });
        out
    }

    fn map_cells(&self, f: impl Fn(&F::Params) -> f64) -> ArrayD<f64> {
        self.cells.map(|cell| match cell {
            Some(p) => f(p),
            None => f64::NAN,
        })
    }

    fn locate(p: &F::Params, x: f64) -> Option<Place> {
        if x.is_nan() {
            return None;
        }
        let (a, b) = F::support(p);
        let inclusive = F::spec().raw.variable.domain.inclusive;
        if x < a || (x == a && !inclusive.0) {
            Some(Place::Below)
        } else if x > b || (x == b && !inclusive.1) {
            Some(Place::Above)
        } else {
            Some(Place::Inside)
        }
    }

    // ------------------------------------------------------------------
    // Density
    // ------------------------------------------------------------------

    fn pdf_cell(p: &F::Params, x: f64) -> f64 {
        match Self::locate(p, x) {
            None => f64::NAN,
            Some(Place::Inside) => Self::pdf_at(p, x),
            Some(_) => 0.0,
        }
    }

    fn logpdf_cell(p: &F::Params, x: f64) -> f64 {
        match Self::locate(p, x) {
            None => f64::NAN,
            Some(Place::Inside) => Self::logpdf_at(p, x),
            Some(_) => f64::NEG_INFINITY,
        }
    }

    fn pdf_at(p: &F::Params, x: f64) -> f64 {
        if F::FORMULAS.pdf {
            F::pdf_formula(p, x)
        } else {
            F::logpdf_formula(p, x).exp()
        }
    }

    fn logpdf_at(p: &F::Params, x: f64) -> f64 {
        if F::FORMULAS.logpdf {
            F::logpdf_formula(p, x)
        } else {
            F::pdf_formula(p, x).ln()
        }
    }

    // ------------------------------------------------------------------
    // Cumulative forms
    // ------------------------------------------------------------------

    fn cdf_cell(p: &F::Params, x: f64) -> f64 {
        match Self::locate(p, x) {
            None => f64::NAN,
            Some(Place::Below) => 0.0,
            Some(Place::Above) => 1.0,
            Some(Place::Inside) => Self::cdf_at(p, x),
        }
    }

    fn ccdf_cell(p: &F::Params, x: f64) -> f64 {
        match Self::locate(p, x) {
            None => f64::NAN,
            Some(Place::Below) => 1.0,
            Some(Place::Above) => 0.0,
            Some(Place::Inside) => Self::ccdf_at(p, x),
        }
    }

    fn logcdf_cell(p: &F::Params, x: f64) -> f64 {
        match Self::locate(p, x) {
            None => f64::NAN,
            Some(Place::Below) => f64::NEG_INFINITY,
            Some(Place::Above) => 0.0,
            Some(Place::Inside) => Self::logcdf_at(p, x),
        }
    }

    fn logccdf_cell(p: &F::Params, x: f64) -> f64 {
        match Self::locate(p, x) {
            None => f64::NAN,
            Some(Place::Below) => 0.0,
            Some(Place::Above) => f64::NEG_INFINITY,
            Some(Place::Inside) => Self::logccdf_at(p, x),
        }
    }

    fn cdf_at(p: &F::Params, x: f64) -> f64 {
        let fs = F::FORMULAS;
        if fs.cdf {
            F::cdf_formula(p, x)
        } else if fs.ccdf {
            1.0 - F::ccdf_formula(p, x)
        } else if fs.logcdf {
            F::logcdf_formula(p, x).exp()
        } else if fs.logccdf {
            -F::logccdf_formula(p, x).exp_m1()
        } else {
            Self::cdf_quadrature(p, x, false)
        }
    }

    fn ccdf_at(p: &F::Params, x: f64) -> f64 {
        let fs = F::FORMULAS;
        if fs.ccdf {
            F::ccdf_formula(p, x)
        } else if fs.cdf {
            1.0 - F::cdf_formula(p, x)
        } else if fs.logccdf {
            F::logccdf_formula(p, x).exp()
        } else if fs.logcdf {
            -F::logcdf_formula(p, x).exp_m1()
        } else {
            Self::cdf_quadrature(p, x, true)
        }
    }

    fn logcdf_at(p: &F::Params, x: f64) -> f64 {
        let fs = F::FORMULAS;
        if fs.logcdf {
            F::logcdf_formula(p, x)
        } else if fs.cdf {
            F::cdf_formula(p, x).ln()
        } else if fs.logccdf {
            log1mexp(F::logccdf_formula(p, x))
        } else if fs.ccdf {
            (-F::ccdf_formula(p, x)).ln_1p()
        } else {
            Self::cdf_quadrature(p, x, false).ln()
        }
    }

    fn logccdf_at(p: &F::Params, x: f64) -> f64 {
        let fs = F::FORMULAS;
        if fs.logccdf {
            F::logccdf_formula(p, x)
        } else if fs.ccdf {
            F::ccdf_formula(p, x).ln()
        } else if fs.logcdf {
            log1mexp(F::logcdf_formula(p, x))
        } else if fs.cdf {
            (-F::cdf_formula(p, x)).ln_1p()
        } else {
            Self::cdf_quadrature(p, x, true).ln()
        }
    }

    /// Quadrature fallback for the cumulative forms: integrates the smaller
    /// tail of the PDF and complements if needed, so the result never loses
    /// precision to cancellation near 1.
    fn cdf_quadrature(p: &F::Params, x: f64, complement: bool) -> f64 {
        let (a, b) = F::support(p);
        let opts = QuadOptions::default();
        let lower = quadrature::integrate(|t| Self::pdf_at(p, t), a, x, &opts);
        let value = if lower <= 0.5 {
            if complement {
                1.0 - lower
            } else {
                lower
            }
        } else {
            let upper = quadrature::integrate(|t| Self::pdf_at(p, t), x, b, &opts);
            if complement {
                upper
            } else {
                1.0 - upper
            }
        };
        value.clamp(0.0, 1.0)
    }

    // ------------------------------------------------------------------
    // Inverse forms
    // ------------------------------------------------------------------

    fn icdf_cell(p: &F::Params, q: f64) -> f64 {
        if q.is_nan() || !(0.0..=1.0).contains(&q) {
            return f64::NAN;
        }
        let (a, b) = F::support(p);
        if q == 0.0 {
            return a;
        }
        if q == 1.0 {
            return b;
        }
        Self::icdf_at(p, q)
    }

    fn iccdf_cell(p: &F::Params, q: f64) -> f64 {
        if q.is_nan() || !(0.0..=1.0).contains(&q) {
            return f64::NAN;
        }
        let (a, b) = F::support(p);
        if q == 0.0 {
            return b;
        }
        if q == 1.0 {
            return a;
        }
        Self::iccdf_at(p, q)
    }

    fn ilogcdf_cell(p: &F::Params, logq: f64) -> f64 {
        if logq.is_nan() || logq > 0.0 {
            return f64::NAN;
        }
        let (a, b) = F::support(p);
        if logq == f64::NEG_INFINITY {
            return a;
        }
        if logq == 0.0 {
            return b;
        }
        Self::ilogcdf_at(p, logq)
    }

    fn ilogccdf_cell(p: &F::Params, logq: f64) -> f64 {
        if logq.is_nan() || logq > 0.0 {
            return f64::NAN;
        }
        let (a, b) = F::support(p);
        if logq == f64::NEG_INFINITY {
            return b;
        }
        if logq == 0.0 {
            return a;
        }
        Self::ilogccdf_at(p, logq)
    }

    fn icdf_at(p: &F::Params, q: f64) -> f64 {
        let fs = F::FORMULAS;
        if fs.icdf {
            F::icdf_formula(p, q)
        } else if fs.iccdf {
            F::iccdf_formula(p, 1.0 - q)
        } else if fs.ilogcdf {
            F::ilogcdf_formula(p, q.ln())
        } else if fs.ilogccdf {
            F::ilogccdf_formula(p, (-q).ln_1p())
        } else {
            rootfind::find_root_monotonic(
                |x| Self::cdf_at(p, x) - q,
                F::support(p),
                &RootOptions::default(),
            )
        }
    }

    fn iccdf_at(p: &F::Params, q: f64) -> f64 {
        let fs = F::FORMULAS;
        if fs.iccdf {
            F::iccdf_formula(p, q)
        } else if fs.icdf {
            F::icdf_formula(p, 1.0 - q)
        } else if fs.ilogccdf {
            F::ilogccdf_formula(p, q.ln())
        } else if fs.ilogcdf {
            F::ilogcdf_formula(p, (-q).ln_1p())
        } else {
            // ccdf is nonincreasing; q - ccdf(x) is a nondecreasing objective.
            rootfind::find_root_monotonic(
                |x| q - Self::ccdf_at(p, x),
                F::support(p),
                &RootOptions::default(),
            )
        }
    }

    fn ilogcdf_at(p: &F::Params, logq: f64) -> f64 {
        let fs = F::FORMULAS;
        if fs.ilogcdf {
            F::ilogcdf_formula(p, logq)
        } else if fs.icdf && logq > -700.0 {
            // Safe to leave log space: exp does not underflow here.
            F::icdf_formula(p, logq.exp())
        } else if fs.ilogccdf {
            F::ilogccdf_formula(p, log1mexp(logq))
        } else {
            rootfind::find_root_monotonic(
                |x| Self::logcdf_at(p, x) - logq,
                F::support(p),
                &RootOptions::default(),
            )
        }
    }

    fn ilogccdf_at(p: &F::Params, logq: f64) -> f64 {
        let fs = F::FORMULAS;
        if fs.ilogccdf {
            F::ilogccdf_formula(p, logq)
        } else if fs.iccdf && logq > -700.0 {
            F::iccdf_formula(p, logq.exp())
        } else if fs.ilogcdf {
            F::ilogcdf_formula(p, log1mexp(logq))
        } else {
            // logccdf is nonincreasing; logq - logccdf(x) is nondecreasing.
            rootfind::find_root_monotonic(
                |x| logq - Self::logccdf_at(p, x),
                F::support(p),
                &RootOptions::default(),
            )
        }
    }

    // ------------------------------------------------------------------
    // Entropy, median, mode
    // ------------------------------------------------------------------

    fn entropy_at(p: &F::Params) -> f64 {
        if F::FORMULAS.entropy {
            return F::entropy_formula(p);
        }
        let (a, b) = F::support(p);
        -quadrature::integrate(
            |t| Self::pdf_at(p, t) * Self::logpdf_at(p, t),
            a,
            b,
            &QuadOptions::default(),
        )
    }

    fn median_at(p: &F::Params) -> f64 {
        if F::FORMULAS.median {
            F::median_formula(p)
        } else {
            Self::icdf_at(p, 0.5)
        }
    }

    fn mode_at(p: &F::Params) -> f64 {
        if F::FORMULAS.mode {
            return F::mode_formula(p);
        }
        let (a, b) = F::support(p);
        let (mut lo, mut hi) = if a.is_finite() && b.is_finite() {
            (a, b)
        } else {
            // Grow a window around the median until the density falls off on
            // both sides.
            let c = Self::median_at(p);
            let fc = Self::pdf_at(p, c);
            let mut s = 1.0;
            let (mut lo, mut hi) = ((c - s).max(a), (c + s).min(b));
            for _ in 0..64 {
                let lo_ok = lo <= a || Self::pdf_at(p, lo) < fc;
                let hi_ok = hi >= b || Self::pdf_at(p, hi) < fc;
                if lo_ok && hi_ok {
                    break;
                }
                s *= 2.0;
                lo = (c - s).max(a);
                hi = (c + s).min(b);
            }
            (lo, hi)
        };
        if !lo.is_finite() {
            lo = hi - 1.0;
        }
        if !hi.is_finite() {
            hi = lo + 1.0;
        }
        rootfind::minimize_golden(|x| -Self::logpdf_at(p, x), lo, hi, &RootOptions::default())
    }

    // ------------------------------------------------------------------
    // Moments
    // ------------------------------------------------------------------

    fn moment_raw(p: &F::Params, k: u32) -> f64 {
        if let Some(v) = F::moment_raw_formula(p, k) {
            return v;
        }
        if k == 0 {
            return 1.0;
        }
        if let Some(v) = Self::raw_from_central(p, k) {
            return v;
        }
        Self::moment_quadrature(p, k, 0.0)
    }

    fn moment_central(p: &F::Params, k: u32) -> f64 {
        if let Some(v) = F::moment_central_formula(p, k) {
            return v;
        }
        match k {
            0 => return 1.0,
            1 => return 0.0,
            _ => {}
        }
        // Parity: odd central moments of a symmetric family vanish exactly.
        if F::SYMMETRIC && k % 2 == 1 {
            return 0.0;
        }
        if let Some(v) = Self::central_from_raw(p, k) {
            return v;
        }
        let mu = Self::moment_raw(p, 1);
        Self::moment_quadrature(p, k, mu)
    }

    fn moment_standardized(p: &F::Params, k: u32) -> f64 {
        if let Some(v) = F::moment_standardized_formula(p, k) {
            return v;
        }
        let sigma = Self::moment_central(p, 2).sqrt();
        Self::moment_central(p, k) / sigma.powi(k as i32)
    }

    /// Raw moment via the binomial transfer `E[X^k] = sum_j C(k,j) m_j mu^(k-j)`
    /// when the mean and every needed central moment have closed forms.
    fn raw_from_central(p: &F::Params, k: u32) -> Option<f64> {
        let mu = F::moment_raw_formula(p, 1)?;
        let mut acc = mu.powi(k as i32);
        for j in 2..=k {
            let mj = F::moment_central_formula(p, j)?;
            acc += binomial(k, j) * mj * mu.powi((k - j) as i32);
        }
        Some(acc)
    }

    /// Central moment via `m_k = sum_j C(k,j) E[X^j] (-mu)^(k-j)` when every
    /// needed raw moment has a closed form.
    fn central_from_raw(p: &F::Params, k: u32) -> Option<f64> {
        let mu = F::moment_raw_formula(p, 1)?;
        let mut acc = 0.0;
        for j in 0..=k {
            let rj = if j == 0 {
                1.0
            } else {
                F::moment_raw_formula(p, j)?
            };
            acc += binomial(k, j) * rj * (-mu).powi((k - j) as i32);
        }
        Some(acc)
    }

    fn moment_quadrature(p: &F::Params, k: u32, center: f64) -> f64 {
        let (a, b) = F::support(p);
        quadrature::integrate(
            |t| Self::pdf_at(p, t) * (t - center).powi(k as i32),
            a,
            b,
            &QuadOptions::default(),
        )
    }

    // ------------------------------------------------------------------
    // Sampling
    // ------------------------------------------------------------------

    fn sample_at<R: Rng + ?Sized>(p: &F::Params, rng: &mut R) -> f64 {
        if F::FORMULAS.sample {
            return F::sample_formula(p, rng);
        }
        let mut u: f64 = rng.random();
        while u == 0.0 {
            u = rng.random();
        }
        Self::icdf_at(p, u)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_shapes_follow_numpy_rules() {
        assert_eq!(broadcast_shapes(&[], &[3]), Some(vec![3]));
        assert_eq!(broadcast_shapes(&[2, 1], &[3]), Some(vec![2, 3]));
        assert_eq!(broadcast_shapes(&[4], &[4]), Some(vec![4]));
        assert_eq!(broadcast_shapes(&[2], &[3]), None);
        assert_eq!(broadcast_shapes(&[], &[]), Some(vec![]));
    }
}
