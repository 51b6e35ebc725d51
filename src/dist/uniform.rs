//! Uniform family on an interval `(a, b)`.

use std::sync::OnceLock;

use rand::Rng;

use crate::domain::{Endpoint, RealDomain};
use crate::engine::{Distribution, ParamInput};
use crate::error::Result;
use crate::family::{register, ContinuousFamily, FamilySpec, FormulaSet, ValidatedSpec};
use crate::parameter::{ParamMap, Parameterization, RealParameter};

/// The uniform distribution.
///
/// `f(x; a, b) = 1 / (b - a)` on the open interval `(a, b)`.
///
/// Only the density, the quantile function and the mode have declared
/// formulas; every other method exercises the engine's generic derivations.
pub struct Uniform;

/// Resolved per-element parameters of [`Uniform`], with the width `ab`
/// cached at construction.
#[derive(Debug, Clone)]
pub struct UniformParams {
    pub a: f64,
    pub b: f64,
    pub ab: f64,
}

impl Uniform {
    /// A uniform distribution on `(a, b)` (broadcast against each other).
    pub fn new(a: impl Into<ParamInput>, b: impl Into<ParamInput>) -> Result<Distribution<Uniform>> {
        Distribution::from_named(vec![("a", a.into()), ("b", b.into())])
    }
}

impl ContinuousFamily for Uniform {
    type Params = UniformParams;

    const NAME: &'static str = "Uniform";
    const FORMULAS: FormulaSet = FormulaSet::none()
        .with_pdf()
        .with_icdf()
        .with_mode()
        .with_sample();
    const SYMMETRIC: bool = true;

    fn spec() -> &'static ValidatedSpec {
        const A: RealParameter = RealParameter::new(
            "a",
            RealDomain::open(f64::NEG_INFINITY, f64::INFINITY),
            (1e-3, 0.9),
        );
        const B: RealParameter = RealParameter::new(
            "b",
            RealDomain::between(Endpoint::Param("a"), Endpoint::Value(f64::INFINITY)),
            (1.1, 1e3),
        );
        const X: RealParameter = RealParameter::new(
            "x",
            RealDomain::between(Endpoint::Param("a"), Endpoint::Param("b")),
            (0.0, 1.0),
        )
        .with_typical(Endpoint::Param("a"), Endpoint::Param("b"));
        static PARAMS: [RealParameter; 2] = [A, B];
        static PARAMETERIZATIONS: [Parameterization; 1] = [Parameterization::new(&PARAMS)];
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

    fn process(values: &mut ParamMap) {
        let ab = values["b"] - values["a"];
        values.insert("ab", ab);
    }

    fn pack(values: &ParamMap) -> UniformParams {
        UniformParams {
            a: values["a"],
            b: values["b"],
            ab: values["ab"],
        }
    }

    fn support(p: &UniformParams) -> (f64, f64) {
        (p.a, p.b)
    }

    fn pdf_formula(p: &UniformParams, _x: f64) -> f64 {
        1.0 / p.ab
    }

    fn icdf_formula(p: &UniformParams, q: f64) -> f64 {
        p.a + p.ab * q
    }

    fn mode_formula(p: &UniformParams) -> f64 {
        p.a + 0.5 * p.ab
    }

    fn sample_formula<R: Rng + ?Sized>(p: &UniformParams, rng: &mut R) -> f64 {
        p.a + p.ab * rng.random::<f64>()
    }
}
