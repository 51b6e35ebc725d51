//! Error types for distribution construction and oracle configuration.

use thiserror::Error;

/// Result type used by fallible constructors in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised eagerly for structurally invalid calls.
///
/// Per-element problems (a parameter outside its domain, an argument outside
/// the support) are never reported through this type; they are masked to NaN
/// at the offending position so the rest of a batch can proceed.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The supplied parameter names do not match any registered
    /// parameterization of the family.
    #[error(
        "family `{family}` has no parameterization matching {{{supplied}}}; \
         valid alternatives: {alternatives}"
    )]
    UnknownParameterization {
        family: &'static str,
        supplied: String,
        alternatives: String,
    },

    /// Supplied parameter arrays cannot be broadcast to a common shape.
    #[error("parameter `{name}` with shape {shape:?} cannot be broadcast against shape {against:?}")]
    BroadcastMismatch {
        name: &'static str,
        shape: Vec<usize>,
        against: Vec<usize>,
    },

    /// The reference working precision was never configured.
    #[error(
        "reference working precision is unset; call \
         `reference::set_working_precision` (e.g. with 50 digits) first"
    )]
    PrecisionUnset,

    /// The reference working precision is too low to produce trustworthy
    /// ground truth.
    #[error(
        "reference working precision of {digits} significant digits is too low; \
         more than 15 digits are required"
    )]
    PrecisionTooLow { digits: usize },
}
