//! Named parameters and the parameterizations that group them.

use std::collections::BTreeMap;

use crate::domain::{Endpoint, RealDomain};

/// Concrete values for a set of parameters, keyed by name.
///
/// One map exists per broadcast element during construction; it also carries
/// auxiliary values derived by a family's `process` hook (e.g. `ab = b - a`).
pub type ParamMap = BTreeMap<&'static str, f64>;

/// A named real-valued parameter bound to a domain.
#[derive(Debug, Clone, Copy)]
pub struct RealParameter {
    /// Name used in keyword-style construction and in symbolic endpoints.
    pub name: &'static str,
    /// Optional display symbol (e.g. `"σ"`).
    pub symbol: Option<&'static str>,
    /// Where the parameter's values are valid.
    pub domain: RealDomain,
    /// A range of unexceptional values, used for sanity checks and as seed
    /// material for numerical searches.
    pub typical: (Endpoint, Endpoint),
}

impl RealParameter {
    /// A parameter with no display symbol and a typical range equal to the
    /// given constants.
    pub const fn new(name: &'static str, domain: RealDomain, typical: (f64, f64)) -> Self {
        RealParameter {
            name,
            symbol: None,
            domain,
            typical: (Endpoint::Value(typical.0), Endpoint::Value(typical.1)),
        }
    }

    /// Sets the display symbol.
    pub const fn with_symbol(mut self, symbol: &'static str) -> Self {
        self.symbol = Some(symbol);
        self
    }

    /// Replaces the typical range with arbitrary endpoints.
    pub const fn with_typical(mut self, lower: Endpoint, upper: Endpoint) -> Self {
        self.typical = (lower, upper);
        self
    }
}

/// An ordered set of parameters that jointly specify one instance of a
/// distribution family.
///
/// A family may register several alternative parameterizations; construction
/// matches the supplied names against exactly one of them.
#[derive(Debug, Clone, Copy)]
pub struct Parameterization {
    /// The parameters that must all be supplied together.
    pub parameters: &'static [RealParameter],
}

impl Parameterization {
    pub const fn new(parameters: &'static [RealParameter]) -> Self {
        Parameterization { parameters }
    }

    /// Whether `names` is exactly this parameterization's name set,
    /// regardless of order.
    pub fn matches(&self, names: &[&str]) -> bool {
        self.parameters.len() == names.len()
            && self
                .parameters
                .iter()
                .all(|p| names.contains(&p.name))
    }

    /// Looks up a member parameter by name.
    pub fn get(&self, name: &str) -> Option<&RealParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// `{a, b}`-style description for error messages.
    pub fn describe(&self) -> String {
        let names: Vec<&str> = self.parameters.iter().map(|p| p.name).collect();
        format!("{{{}}}", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: RealParameter = RealParameter::new(
        "a",
        RealDomain::open(f64::NEG_INFINITY, f64::INFINITY),
        (0.0, 1.0),
    );
    const B: RealParameter = RealParameter::new(
        "b",
        RealDomain::between(Endpoint::Param("a"), Endpoint::Value(f64::INFINITY)),
        (1.0, 2.0),
    );

    #[test]
    fn matching_is_order_insensitive() {
        static PARAMS: [RealParameter; 2] = [A, B];
        let pz = Parameterization::new(&PARAMS);
        assert!(pz.matches(&["b", "a"]));
        assert!(pz.matches(&["a", "b"]));
        assert!(!pz.matches(&["a"]));
        assert!(!pz.matches(&["a", "c"]));
    }

    #[test]
    fn describe_lists_names() {
        static PARAMS: [RealParameter; 2] = [A, B];
        let pz = Parameterization::new(&PARAMS);
        assert_eq!(pz.describe(), "{a, b}");
    }
}
