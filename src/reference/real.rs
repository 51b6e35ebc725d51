//! Arbitrary-precision scalar used by the reference oracle.
//!
//! [`Real`] wraps `astro_float::BigFloat` behind standard operators and a
//! thread-local *working precision* context, mirroring an ambient
//! decimal-places setting. The context starts unset; oracle constructors
//! refuse to run until [`set_working_precision`] has installed one (see
//! [`crate::reference::Reference`]).

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;

use astro_float::{BigFloat, Consts, RoundingMode, INF_NEG, INF_POS, NAN};

struct RealCtx {
    /// Binary working precision, including guard bits.
    prec: usize,
    /// The decimal digits the user asked for.
    dps: usize,
    rm: RoundingMode,
    cc: Consts,
}

thread_local! {
    static CTX: RefCell<Option<RealCtx>> = const { RefCell::new(None) };
}

/// Installs the working precision, in significant decimal digits, for the
/// current thread.
pub fn set_working_precision(dps: usize) {
    let prec = ((dps as f64) * std::f64::consts::LOG2_10).ceil() as usize + 64;
    CTX.with(|c| {
        *c.borrow_mut() = Some(RealCtx {
            prec,
            dps,
            rm: RoundingMode::ToEven,
            cc: Consts::new().expect("constants cache allocation"),
        });
    });
}

/// The configured working precision in decimal digits, or `None` while the
/// context is still at its unset sentinel.
pub fn working_precision() -> Option<usize> {
    CTX.with(|c| c.borrow().as_ref().map(|ctx| ctx.dps))
}

fn with<T>(f: impl FnOnce(&mut RealCtx) -> T) -> T {
    CTX.with(|c| {
        let mut slot = c.borrow_mut();
        let ctx = slot
            .as_mut()
            .expect("reference working precision is unset; call reference::set_working_precision first");
        f(ctx)
    })
}

/// An arbitrary-precision real number at the ambient working precision.
#[derive(Clone)]
pub struct Real(BigFloat);

impl fmt::Debug for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Real({})", self.0)
    }
}

impl fmt::Display for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Real {
    pub fn from_f64(v: f64) -> Real {
        if v.is_nan() {
            Real(NAN)
        } else if v == f64::INFINITY {
            Real(INF_POS)
        } else if v == f64::NEG_INFINITY {
            Real(INF_NEG)
        } else {
            with(|c| Real(BigFloat::from_f64(v, c.prec)))
        }
    }

    pub fn zero() -> Real {
        Real::from_f64(0.0)
    }

    pub fn one() -> Real {
        Real::from_f64(1.0)
    }

    pub fn infinity() -> Real {
        Real::from_f64(f64::INFINITY)
    }

    pub fn neg_infinity() -> Real {
        Real::from_f64(f64::NEG_INFINITY)
    }

    /// The circle constant at the working precision.
    pub fn pi() -> Real {
        with(|c| Real(c.cc.pi(c.prec, c.rm)))
    }

    /// Rounds to the nearest `f64`.
    pub fn to_f64(&self) -> f64 {
        if self.0.is_nan() {
            f64::NAN
        } else if self.0.is_inf_pos() {
            f64::INFINITY
        } else if self.0.is_inf_neg() {
            f64::NEG_INFINITY
        } else if self.0.is_zero() {
            0.0
        } else {
            // The decimal rendering carries the full working precision;
            // parsing rounds it to the nearest double.
            format!("{}", self.0).parse().unwrap_or(f64::NAN)
        }
    }

    pub fn is_nan(&self) -> bool {
        self.0.is_nan()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_finite(&self) -> bool {
        !(self.0.is_nan() || self.0.is_inf_pos() || self.0.is_inf_neg())
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub fn abs(&self) -> Real {
        if self.0.is_negative() {
            -self
        } else {
            self.clone()
        }
    }

    pub fn exp(&self) -> Real {
        with(|c| Real(self.0.exp(c.prec, c.rm, &mut c.cc)))
    }

    pub fn ln(&self) -> Real {
        with(|c| Real(self.0.ln(c.prec, c.rm, &mut c.cc)))
    }

    pub fn sqrt(&self) -> Real {
        with(|c| Real(self.0.sqrt(c.prec, c.rm)))
    }

    /// Integer power by binary exponentiation.
    pub fn powi(&self, n: i32) -> Real {
        if n < 0 {
            return Real::one() / self.powi(-n);
        }
        let mut result = Real::one();
        let mut base = self.clone();
        let mut e = n as u32;
        while e > 0 {
            if e & 1 == 1 {
                result = &result * &base;
            }
            base = &base * &base;
            e >>= 1;
        }
        result
    }

    pub fn min(&self, other: &Real) -> Real {
        if self <= other {
            self.clone()
        } else {
            other.clone()
        }
    }

    pub fn max(&self, other: &Real) -> Real {
        if self >= other {
            self.clone()
        } else {
            other.clone()
        }
    }
}

impl PartialEq for Real {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl PartialOrd for Real {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

macro_rules! real_binop {
    ($trait:ident, $method:ident) => {
        impl std::ops::$trait<&Real> for &Real {
            type Output = Real;
            fn $method(self, rhs: &Real) -> Real {
                with(|c| Real(self.0.$method(&rhs.0, c.prec, c.rm)))
            }
        }
        impl std::ops::$trait<Real> for Real {
            type Output = Real;
            fn $method(self, rhs: Real) -> Real {
                std::ops::$trait::$method(&self, &rhs)
            }
        }
        impl std::ops::$trait<&Real> for Real {
            type Output = Real;
            fn $method(self, rhs: &Real) -> Real {
                std::ops::$trait::$method(&self, rhs)
            }
        }
        impl std::ops::$trait<Real> for &Real {
            type Output = Real;
            fn $method(self, rhs: Real) -> Real {
                std::ops::$trait::$method(self, &rhs)
            }
        }
    };
}

real_binop!(Add, add);
real_binop!(Sub, sub);
real_binop!(Mul, mul);
real_binop!(Div, div);

impl std::ops::Neg for &Real {
    type Output = Real;
    fn neg(self) -> Real {
        with(|c| {
            let minus_one = BigFloat::from_f64(-1.0, c.prec);
            Real(self.0.mul(&minus_one, c.prec, c.rm))
        })
    }
}

impl std::ops::Neg for Real {
    type Output = Real;
    fn neg(self) -> Real {
        -&self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() {
        set_working_precision(50);
    }

    #[test]
    fn round_trips_and_arithmetic() {
        setup();
        let x = Real::from_f64(1.5);
        let y = Real::from_f64(2.25);
        assert_eq!((&x + &y).to_f64(), 3.75);
        assert_eq!((&x * &y).to_f64(), 3.375);
        assert_eq!((-&x).to_f64(), -1.5);
        assert!(Real::from_f64(f64::NAN).is_nan());
        assert_eq!(Real::infinity().to_f64(), f64::INFINITY);
        assert_eq!(Real::neg_infinity().to_f64(), f64::NEG_INFINITY);
    }

    #[test]
    fn transcendentals_beat_double_precision() {
        setup();
        // exp(1) rounded back to f64 must be exactly E.
        assert_eq!(Real::one().exp().to_f64(), std::f64::consts::E);
        assert_eq!(Real::pi().to_f64(), std::f64::consts::PI);
        assert_eq!(Real::from_f64(2.0).sqrt().to_f64(), std::f64::consts::SQRT_2);
        assert_eq!(Real::from_f64(2.0).ln().to_f64(), std::f64::consts::LN_2);
    }

    #[test]
    fn integer_powers() {
        setup();
        assert_eq!(Real::from_f64(3.0).powi(4).to_f64(), 81.0);
        assert_eq!(Real::from_f64(2.0).powi(-2).to_f64(), 0.25);
        assert_eq!(Real::from_f64(7.0).powi(0).to_f64(), 1.0);
    }

    #[test]
    fn ordering() {
        setup();
        let a = Real::from_f64(1.0);
        let b = Real::from_f64(2.0);
        assert!(a < b);
        assert!(b >= a);
        assert_eq!(a.max(&b).to_f64(), 2.0);
        assert_eq!(a.min(&b).to_f64(), 1.0);
    }
}
