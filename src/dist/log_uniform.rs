//! Log-uniform (reciprocal) family.

use std::sync::OnceLock;

use crate::domain::{Endpoint, RealDomain};
use crate::engine::{Distribution, ParamInput};
use crate::error::Result;
use crate::family::{register, ContinuousFamily, FamilySpec, FormulaSet, ValidatedSpec};
use crate::parameter::{ParamMap, Parameterization, RealParameter};
use crate::special::logsubexp;

/// The log-uniform distribution.
///
/// `f(x; a, b) = 1 / (x * (log(b) - log(a)))` on `[a, b]`.
///
/// If `log(X)` is uniformly distributed between `log(a)` and `log(b)`, then
/// `X` is log-uniform with shape parameters `a` and `b`. The family registers
/// two parameterizations — `{log_a, log_b}` and `{a, b}` — and derives the
/// other set from whichever was supplied. Only the density and the raw
/// moments have declared formulas; the cumulative, inverse and sampling
/// methods all flow through the engine's generic fallbacks.
pub struct LogUniform;

/// Resolved per-element parameters of [`LogUniform`], carrying both
/// parameterizations' values.
#[derive(Debug, Clone)]
pub struct LogUniformParams {
    pub a: f64,
    pub b: f64,
    pub log_a: f64,
    pub log_b: f64,
}

impl LogUniform {
    /// A log-uniform distribution from the shape parameters `a` and `b`.
    pub fn new(
        a: impl Into<ParamInput>,
        b: impl Into<ParamInput>,
    ) -> Result<Distribution<LogUniform>> {
        Distribution::from_named(vec![("a", a.into()), ("b", b.into())])
    }

    /// The same family specified through `log_a` and `log_b`.
    pub fn from_logs(
        log_a: impl Into<ParamInput>,
        log_b: impl Into<ParamInput>,
    ) -> Result<Distribution<LogUniform>> {
        Distribution::from_named(vec![("log_a", log_a.into()), ("log_b", log_b.into())])
    }
}

impl ContinuousFamily for LogUniform {
    type Params = LogUniformParams;

    const NAME: &'static str = "LogUniform";
    const FORMULAS: FormulaSet = FormulaSet::none().with_pdf();

    fn spec() -> &'static ValidatedSpec {
        const A: RealParameter =
            RealParameter::new("a", RealDomain::open(0.0, f64::INFINITY), (1e-3, 0.9));
        const B: RealParameter = RealParameter::new(
            "b",
            RealDomain::between(Endpoint::Param("a"), Endpoint::Value(f64::INFINITY)),
            (1.1, 1e3),
        );
        const LOG_A: RealParameter = RealParameter::new(
            "log_a",
            RealDomain::open(f64::NEG_INFINITY, f64::INFINITY),
            (-3.0, -0.1),
        )
        .with_symbol("log(a)");
        const LOG_B: RealParameter = RealParameter::new(
            "log_b",
            RealDomain::between(Endpoint::Param("log_a"), Endpoint::Value(f64::INFINITY)),
            (0.1, 3.0),
        )
        .with_symbol("log(b)");
        const X: RealParameter = RealParameter::new(
            "x",
            RealDomain::between(Endpoint::Param("a"), Endpoint::Param("b"))
                .with_inclusive(true, true),
            (0.0, 1.0),
        )
        .with_typical(Endpoint::Param("a"), Endpoint::Param("b"));
        static LOG_PARAMS: [RealParameter; 2] = [LOG_A, LOG_B];
        static PARAMS: [RealParameter; 2] = [A, B];
        static PARAMETERIZATIONS: [Parameterization; 2] = [
            Parameterization::new(&LOG_PARAMS),
            Parameterization::new(&PARAMS),
        ];
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
        if !values.contains_key("a") {
            let (log_a, log_b) = (values["log_a"], values["log_b"]);
            values.insert("a", log_a.exp());
            values.insert("b", log_b.exp());
        }
        if !values.contains_key("log_a") {
            let (a, b) = (values["a"], values["b"]);
            values.insert("log_a", a.ln());
            values.insert("log_b", b.ln());
        }
    }

    fn pack(values: &ParamMap) -> LogUniformParams {
        LogUniformParams {
            a: values["a"],
            b: values["b"],
            log_a: values["log_a"],
            log_b: values["log_b"],
        }
    }

    fn support(p: &LogUniformParams) -> (f64, f64) {
        (p.a, p.b)
    }

    fn pdf_formula(p: &LogUniformParams, x: f64) -> f64 {
        ((p.log_b - p.log_a) * x).recip()
    }

    fn moment_raw_formula(p: &LogUniformParams, order: u32) -> Option<f64> {
        if order == 0 {
            return Some(1.0);
        }
        let k = f64::from(order);
        // Algebraically (b^k - a^k) / (k (log b - log a)); the difference of
        // power terms stays in log space until the end.
        let t1 = ((p.log_b - p.log_a) * k).recip();
        let t2 = logsubexp(k * p.log_b, k * p.log_a).exp();
        Some(t1 * t2)
    }
}
