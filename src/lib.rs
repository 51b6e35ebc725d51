//! Continuous probability distribution framework.
//!
//! A distribution family declares its parameters — typed domains, one or
//! more [`Parameterization`]s, a free variable — and a minimal set of
//! formula hooks (at least a density). The engine in [`engine`] derives the
//! complete statistical surface from whatever was declared: cumulative and
//! survival forms, log forms, the four inverses, entropy, median, mode,
//! moments of any kind and order, and sampling, using complementary
//! identities where they are exact and quadrature or root finding where they
//! are not.
//!
//! ```
//! use statdist::dist::{Normal, Uniform};
//!
//! let n = Normal::new(2.0, 3.0).unwrap();
//! let c = n.cdf(2.0);
//! assert!((c[ndarray::IxDyn(&[])] - 0.5).abs() < 1e-15);
//!
//! // Parameters broadcast; invalid elements are masked, not fatal.
//! let u = Uniform::new(0.0, vec![2.0, -1.0]).unwrap();
//! let p = u.pdf(1.0);
//! assert_eq!(p[ndarray::IxDyn(&[0])], 0.5);
//! assert!(p[ndarray::IxDyn(&[1])].is_nan());
//! ```
//!
//! The [`reference`] module carries a parallel arbitrary-precision oracle
//! used to validate the production formulas; see its docs for the working
//! precision contract.

pub mod dist;
pub mod domain;
pub mod engine;
pub mod error;
pub mod family;
pub mod parameter;
pub mod quadrature;
pub mod reference;
pub mod rootfind;
pub mod special;

// Re-export commonly used types at crate root
pub use domain::{Endpoint, RealDomain};
pub use engine::{Distribution, MomentKind, ParamInput};
pub use error::{Error, Result};
pub use family::{ContinuousFamily, FamilySpec, FormulaSet, ValidatedSpec};
pub use parameter::{ParamMap, Parameterization, RealParameter};
