//! Reference families: densities written directly from their definitions.

use super::real::Real;
use super::{Reference, ReferenceFamily};
use crate::error::Result;

/// Reference normal distribution.
pub struct RefNormal;

pub struct RefNormalParams {
    pub mu: Real,
    pub sigma: Real,
}

impl RefNormal {
    pub fn new(mu: f64, sigma: f64) -> Result<Reference<RefNormal>> {
        Reference::from_params(|| RefNormalParams {
            mu: Real::from_f64(mu),
            sigma: Real::from_f64(sigma),
        })
    }
}

impl ReferenceFamily for RefNormal {
    type Params = RefNormalParams;

    const NAME: &'static str = "RefNormal";

    fn pdf(p: &Self::Params, x: &Real) -> Real {
        let z = (x - &p.mu) / &p.sigma;
        let norm = &p.sigma * (Real::from_f64(2.0) * Real::pi()).sqrt();
        (-(Real::from_f64(0.5) * &z * &z)).exp() / norm
    }
}

/// Reference uniform distribution on `(a, b)`.
pub struct RefUniform;

pub struct RefUniformParams {
    pub a: Real,
    pub b: Real,
}

impl RefUniform {
    pub fn new(a: f64, b: f64) -> Result<Reference<RefUniform>> {
        Reference::from_params(|| RefUniformParams {
            a: Real::from_f64(a),
            b: Real::from_f64(b),
        })
    }
}

impl ReferenceFamily for RefUniform {
    type Params = RefUniformParams;

    const NAME: &'static str = "RefUniform";

    fn support(p: &Self::Params) -> (Real, Real) {
        (p.a.clone(), p.b.clone())
    }

    fn pdf(p: &Self::Params, _x: &Real) -> Real {
        Real::one() / (&p.b - &p.a)
    }
}

/// Reference log-uniform distribution on `[a, b]`.
pub struct RefLogUniform;

pub struct RefLogUniformParams {
    pub a: Real,
    pub b: Real,
}

impl RefLogUniform {
    pub fn new(a: f64, b: f64) -> Result<Reference<RefLogUniform>> {
        Reference::from_params(|| RefLogUniformParams {
            a: Real::from_f64(a),
            b: Real::from_f64(b),
        })
    }
}

impl ReferenceFamily for RefLogUniform {
    type Params = RefLogUniformParams;

    const NAME: &'static str = "RefLogUniform";

    fn support(p: &Self::Params) -> (Real, Real) {
        (p.a.clone(), p.b.clone())
    }

    fn pdf(p: &Self::Params, x: &Real) -> Real {
        Real::one() / (x * (p.b.ln() - p.a.ln()))
    }
}
