//! Concrete continuous distribution families.

pub mod log_uniform;
pub mod normal;
pub mod uniform;

// Re-export all families for convenience
pub use log_uniform::LogUniform;
pub use normal::{normal, AnyNormal, Normal, StandardNormal};
pub use uniform::Uniform;
