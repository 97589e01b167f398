//! Fixed-point money/size type shared by every component.
//!
//! All currency, size, and percentage fields in this system use a 1e-6
//! (micros) fixed-point representation stored as `i64`. `Micros` wraps the
//! raw `i64` so that arithmetic cannot accidentally mix monetary amounts
//! with unrelated integers (quantities, ids, tick counters).
//!
//! 1 unit of quote currency = `Micros(1_000_000)`.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

pub const MICROS_SCALE: i64 = 1_000_000;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Micros(i64);

impl Micros {
    pub const ZERO: Micros = Micros(0);
    pub const MAX: Micros = Micros(i64::MAX);
    pub const MIN: Micros = Micros(i64::MIN);

    #[inline]
    pub const fn new(raw: i64) -> Self {
        Micros(raw)
    }

    /// Construct from a whole-unit integer (e.g. `Micros::from_units(100)` == $100.00).
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Micros(units * MICROS_SCALE)
    }

    /// Construct from a basis-point percentage, e.g. `from_bps(2500)` == 25.00%.
    #[inline]
    pub const fn from_bps(bps: i64) -> Self {
        Micros(bps * (MICROS_SCALE / 10_000))
    }

    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Lossy conversion to `f64`, only for feeding external math libraries
    /// (normal-inverse CDF, etc.) that have no fixed-point equivalent. Never
    /// use the result as a stored or compared value — round-trip back
    /// through `Micros::from_f64` immediately.
    #[inline]
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / MICROS_SCALE as f64
    }

    #[inline]
    pub fn from_f64(v: f64) -> Self {
        Micros((v * MICROS_SCALE as f64).round() as i64)
    }

    #[inline]
    pub fn saturating_add(self, rhs: Micros) -> Micros {
        Micros(self.0.saturating_add(rhs.0))
    }

    #[inline]
    pub fn saturating_sub(self, rhs: Micros) -> Micros {
        Micros(self.0.saturating_sub(rhs.0))
    }

    #[inline]
    pub fn abs(self) -> Micros {
        Micros(self.0.saturating_abs())
    }

    #[inline]
    pub fn signum(self) -> i64 {
        self.0.signum()
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub fn max(self, rhs: Micros) -> Micros {
        if self.0 >= rhs.0 {
            self
        } else {
            rhs
        }
    }

    #[inline]
    pub fn min(self, rhs: Micros) -> Micros {
        if self.0 <= rhs.0 {
            self
        } else {
            rhs
        }
    }

    /// Clamp to `[lo, hi]`.
    #[inline]
    pub fn clamp(self, lo: Micros, hi: Micros) -> Micros {
        self.max(lo).min(hi)
    }

    /// Multiply by an integer quantity (shares, units), checking for overflow.
    #[inline]
    pub fn checked_mul_qty(self, qty: i64) -> Option<Micros> {
        self.0.checked_mul(qty).map(Micros)
    }

    /// Multiply by a dimensionless fraction expressed as another `Micros`
    /// value (e.g. a 0.30 reduction fraction stored as `Micros::from_f64(0.30)`).
    /// Uses i128 intermediate to avoid overflow, then rescales.
    #[inline]
    pub fn mul_fraction(self, fraction: Micros) -> Micros {
        let product = (self.0 as i128) * (fraction.0 as i128);
        let scaled = product / (MICROS_SCALE as i128);
        Micros(scaled.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }

    /// Divide by another `Micros` value, returning a dimensionless ratio as
    /// `Micros` (e.g. exposure / portfolio_value). Returns `Micros::ZERO`
    /// when the divisor is zero.
    #[inline]
    pub fn div_ratio(self, rhs: Micros) -> Micros {
        if rhs.0 == 0 {
            return Micros::ZERO;
        }
        let scaled = (self.0 as i128) * (MICROS_SCALE as i128) / (rhs.0 as i128);
        Micros(scaled.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }
}

impl Add for Micros {
    type Output = Micros;
    #[inline]
    fn add(self, rhs: Micros) -> Micros {
        Micros(self.0 + rhs.0)
    }
}

impl Sub for Micros {
    type Output = Micros;
    #[inline]
    fn sub(self, rhs: Micros) -> Micros {
        Micros(self.0 - rhs.0)
    }
}

impl Neg for Micros {
    type Output = Micros;
    #[inline]
    fn neg(self) -> Micros {
        Micros(-self.0)
    }
}

impl AddAssign for Micros {
    #[inline]
    fn add_assign(&mut self, rhs: Micros) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Micros {
    #[inline]
    fn sub_assign(&mut self, rhs: Micros) {
        self.0 -= rhs.0;
    }
}

/// Scale by a plain dimensionless `f64` factor (lookback windows, weights).
/// Only used inside C3 metrics math, never at persistence boundaries.
impl Mul<f64> for Micros {
    type Output = Micros;
    #[inline]
    fn mul(self, rhs: f64) -> Micros {
        Micros::from_f64(self.to_f64() * rhs)
    }
}

impl Div<f64> for Micros {
    type Output = Micros;
    #[inline]
    fn div(self, rhs: f64) -> Micros {
        if rhs == 0.0 {
            return Micros::ZERO;
        }
        Micros::from_f64(self.to_f64() / rhs)
    }
}

impl std::fmt::Display for Micros {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let units = self.0 / MICROS_SCALE;
        let frac = (self.0 % MICROS_SCALE).abs();
        if self.0 < 0 && units == 0 {
            write!(f, "-{units}.{frac:06}")
        } else {
            write!(f, "{units}.{frac:06}")
        }
    }
}
