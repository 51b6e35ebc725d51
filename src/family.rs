//! Family declaration: the capability table, the class-level specification,
//! and the trait a concrete distribution family implements.
//!
//! A family supplies domains, parameters, parameterizations, and a minimal
//! set of formula hooks (at least a PDF or log-PDF). The derivation engine in
//! [`crate::engine`] consults the [`FormulaSet`] capability table — never the
//! hooks themselves — to decide which derivation path to take, so a hook body
//! is only ever invoked when its capability bit is set.

use std::sync::OnceLock;

use rand::Rng;

use crate::parameter::{ParamMap, Parameterization, RealParameter};

/// Explicit per-family registry of which formula hooks are provided.
///
/// Built in `const` context by chaining `with_*` calls:
///
/// ```ignore
/// const FORMULAS: FormulaSet = FormulaSet::none().with_pdf().with_icdf();
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FormulaSet {
    pub pdf: bool,
    pub logpdf: bool,
    pub cdf: bool,
    pub logcdf: bool,
    pub ccdf: bool,
    pub logccdf: bool,
    pub icdf: bool,
    pub ilogcdf: bool,
    pub iccdf: bool,
    pub ilogccdf: bool,
    pub entropy: bool,
    pub logentropy: bool,
    pub median: bool,
    pub mode: bool,
    pub sample: bool,
}

macro_rules! formula_bits {
    ($($field:ident => $with:ident),* $(,)?) => {
        impl FormulaSet {
            /// No formulas provided.
            pub const fn none() -> Self {
                FormulaSet {
                    $($field: false,)*
                }
            }
            $(
                pub const fn $with(mut self) -> Self {
                    self.$field = true;
                    self
                }
            )*
        }
    };
}

formula_bits! {
    pdf => with_pdf,
    logpdf => with_logpdf,
    cdf => with_cdf,
    logcdf => with_logcdf,
    ccdf => with_ccdf,
    logccdf => with_logccdf,
    icdf => with_icdf,
    ilogcdf => with_ilogcdf,
    iccdf => with_iccdf,
    ilogccdf => with_ilogccdf,
    entropy => with_entropy,
    logentropy => with_logentropy,
    median => with_median,
    mode => with_mode,
    sample => with_sample,
}

/// Class-level declaration of a distribution family.
#[derive(Debug, Clone, Copy)]
pub struct FamilySpec {
    /// Family name, used in error messages.
    pub name: &'static str,
    /// The free variable, whose domain is the support description.
    pub variable: RealParameter,
    /// Alternative complete parameter sets. May be empty for a family with
    /// no free parameters.
    pub parameterizations: &'static [Parameterization],
}

/// A [`FamilySpec`] that has passed registration-time checks, with the
/// per-parameterization validation order precomputed.
#[derive(Debug, Clone)]
pub struct ValidatedSpec {
    pub raw: FamilySpec,
    /// For each parameterization, parameter indices in dependency order.
    pub orders: Vec<Vec<usize>>,
}

impl ValidatedSpec {
    /// Checks a family declaration once, at registration.
    ///
    /// # Panics
    ///
    /// Family-authoring mistakes are fatal configuration errors and panic
    /// with a description: a domain endpoint referencing a parameter outside
    /// its own parameterization, a dependency cycle between domains, or a
    /// family that provides neither a PDF nor a log-PDF formula.
    pub fn build(raw: FamilySpec, formulas: FormulaSet) -> Self {
        if !(formulas.pdf || formulas.logpdf) {
            panic!(
                "family `{}` must provide a PDF or log-PDF formula",
                raw.name
            );
        }
        let orders = raw
            .parameterizations
            .iter()
            .map(|pz| dependency_order(raw.name, pz))
            .collect();
        ValidatedSpec { raw, orders }
    }
}

/// Topologically sorts a parameterization's parameters so that every domain
/// is resolved only after the parameters it references.
fn dependency_order(family: &str, pz: &Parameterization) -> Vec<usize> {
    let n = pz.parameters.len();
    let mut placed = vec![false; n];
    let mut order = Vec::with_capacity(n);

    while order.len() < n {
        let mut progressed = false;
        for i in 0..n {
            if placed[i] {
                continue;
            }
            let p = &pz.parameters[i];
            let ready = p.domain.dependencies().all(|dep| {
                match pz.parameters.iter().position(|q| q.name == dep) {
                    Some(j) => placed[j],
                    None => panic!(
                        "family `{family}`: domain of `{}` references `{dep}`, \
                         which is not part of parameterization {}",
                        p.name,
                        pz.describe()
                    ),
                }
            });
            if ready {
                placed[i] = true;
                order.push(i);
                progressed = true;
            }
        }
        if !progressed {
            let cycle: Vec<&str> = pz
                .parameters
                .iter()
                .enumerate()
                .filter(|(i, _)| !placed[*i])
                .map(|(_, p)| p.name)
                .collect();
            panic!("family `{family}`: cyclic domain dependency among parameters {cycle:?}");
        }
    }
    order
}

/// Convenience for the one-`OnceLock`-per-family registration pattern used in
/// `spec()` implementations.
pub fn register(
    slot: &OnceLock<ValidatedSpec>,
    raw: FamilySpec,
    formulas: FormulaSet,
) -> &ValidatedSpec {
    slot.get_or_init(|| ValidatedSpec::build(raw, formulas))
}

/// A continuous distribution family.
///
/// Implementors declare their parameters through [`Self::spec`] and provide
/// formula hooks for whatever quantities have closed forms; the engine
/// derives the rest. `Params` is the per-element record of resolved parameter
/// values (including anything derived by [`Self::process`]).
pub trait ContinuousFamily: Sized + 'static {
    /// Per-element resolved parameter record.
    type Params: Clone;

    const NAME: &'static str;
    /// Which formula hooks this family provides.
    const FORMULAS: FormulaSet;
    /// Whether the PDF is symmetric about the mean. Enables the exact
    /// odd-central-moment shortcut.
    const SYMMETRIC: bool = false;

    /// The validated class-level declaration (register with a `OnceLock`).
    fn spec() -> &'static ValidatedSpec;

    /// Derives auxiliary and cross-parameterization values into the map
    /// before packing (e.g. `ab = b - a`, `log_a = ln(a)`).
    fn process(_values: &mut ParamMap) {}

    /// Packs the fully-derived map into the per-element record.
    fn pack(values: &ParamMap) -> Self::Params;

    /// Resolved support bounds for one element.
    fn support(params: &Self::Params) -> (f64, f64);

    // Formula hooks. Only called when the matching `FORMULAS` bit is set; the
    // defaults are therefore unreachable for a correctly-declared family.

    fn pdf_formula(_p: &Self::Params, _x: f64) -> f64 {
        unreachable!("pdf formula not declared")
    }
    fn logpdf_formula(_p: &Self::Params, _x: f64) -> f64 {
        unreachable!("logpdf formula not declared")
    }
    fn cdf_formula(_p: &Self::Params, _x: f64) -> f64 {
        unreachable!("cdf formula not declared")
    }
    fn logcdf_formula(_p: &Self::Params, _x: f64) -> f64 {
        unreachable!("logcdf formula not declared")
    }
    fn ccdf_formula(_p: &Self::Params, _x: f64) -> f64 {
        unreachable!("ccdf formula not declared")
    }
    fn logccdf_formula(_p: &Self::Params, _x: f64) -> f64 {
        unreachable!("logccdf formula not declared")
    }
    fn icdf_formula(_p: &Self::Params, _q: f64) -> f64 {
        unreachable!("icdf formula not declared")
    }
    fn ilogcdf_formula(_p: &Self::Params, _logq: f64) -> f64 {
        unreachable!("ilogcdf formula not declared")
    }
    fn iccdf_formula(_p: &Self::Params, _q: f64) -> f64 {
        unreachable!("iccdf formula not declared")
    }
    fn ilogccdf_formula(_p: &Self::Params, _logq: f64) -> f64 {
        unreachable!("ilogccdf formula not declared")
    }
    fn entropy_formula(_p: &Self::Params) -> f64 {
        unreachable!("entropy formula not declared")
    }
    fn logentropy_formula(_p: &Self::Params) -> f64 {
        unreachable!("logentropy formula not declared")
    }
    fn median_formula(_p: &Self::Params) -> f64 {
        unreachable!("median formula not declared")
    }
    fn mode_formula(_p: &Self::Params) -> f64 {
        unreachable!("mode formula not declared")
    }

    /// Closed-form raw moment for the given order, if one exists.
    fn moment_raw_formula(_p: &Self::Params, _order: u32) -> Option<f64> {
        None
    }
    /// Closed-form central moment for the given order, if one exists.
    fn moment_central_formula(_p: &Self::Params, _order: u32) -> Option<f64> {
        None
    }
    /// Closed-form standardized moment for the given order, if one exists.
    fn moment_standardized_formula(_p: &Self::Params, _order: u32) -> Option<f64> {
        None
    }

    /// Family-specific sampler (e.g. a dedicated normal generator).
    fn sample_formula<R: Rng + ?Sized>(_p: &Self::Params, _rng: &mut R) -> f64 {
        unreachable!("sample formula not declared")
    }
}
