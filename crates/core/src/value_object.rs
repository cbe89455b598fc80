//! Value objects: equality by value, not identity.
//!
//! Money and percentages are the two values the back-office renders
//! everywhere (cards, tables, exports). Amounts travel as decimal JSON
//! numbers on the wire and are held as integer minor units in memory.

use core::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// Signed monetary amount in minor units (cents).
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn from_major(units: i64) -> Self {
        Self(units.saturating_mul(100))
    }

    /// Convert a decimal amount (as sent by the backend) to minor units,
    /// rounding half away from zero. Non-finite input becomes zero.
    pub fn from_major_f64(amount: f64) -> Self {
        if !amount.is_finite() {
            return Self::ZERO;
        }
        // `as` saturates at the i64 bounds.
        Self((amount * 100.0).round() as i64)
    }

    pub const fn minor(self) -> i64 {
        self.0
    }

    pub fn to_major_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    /// Multiply by a (possibly fractional) quantity, rounding to the cent.
    pub fn times(self, quantity: f64) -> Self {
        Self::from_major_f64(self.to_major_f64() * quantity)
    }

    /// Clamp negative amounts to zero (outstanding balances never go below zero).
    pub fn non_negative(self) -> Self {
        if self.0 < 0 { Self::ZERO } else { self }
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        *self = *self - rhs;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(self.0.saturating_neg())
    }
}

impl core::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> core::iter::Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_major_f64())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MoneyVisitor;

        impl Visitor<'_> for MoneyVisitor {
            type Value = Money;

            fn expecting(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str("a decimal amount as number or string")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
                Ok(Money::from_major(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
                Ok(Money::from_major(i64::try_from(v).unwrap_or(i64::MAX)))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
                Ok(Money::from_major_f64(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
                let trimmed = v.trim();
                if trimmed.is_empty() {
                    return Ok(Money::ZERO);
                }
                trimmed
                    .parse::<f64>()
                    .map(Money::from_major_f64)
                    .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
            }

            fn visit_unit<E: de::Error>(self) -> Result<Money, E> {
                Ok(Money::ZERO)
            }
        }

        deserializer.deserialize_any(MoneyVisitor)
    }
}

/// Percentage value (`12.5` means 12.5%).
#[derive(Debug, Default, Copy, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percentage(f64);

impl ValueObject for Percentage {}

impl Percentage {
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> f64 {
        self.0
    }

    /// `part` as a share of `whole`; `None` when `whole` is zero.
    pub fn of(part: Money, whole: Money) -> Option<Self> {
        if whole.is_zero() {
            return None;
        }
        Some(Self(part.minor() as f64 / whole.minor() as f64 * 100.0))
    }

    /// Relative change from `previous` to `current`; `None` when `previous` is zero.
    ///
    /// The base is taken as an absolute value so a loss shrinking towards zero
    /// reads as positive growth.
    pub fn change(previous: f64, current: f64) -> Option<Self> {
        if previous == 0.0 || !previous.is_finite() || !current.is_finite() {
            return None;
        }
        Some(Self((current - previous) / previous.abs() * 100.0))
    }

    pub fn change_money(previous: Money, current: Money) -> Option<Self> {
        Self::change(previous.minor() as f64, current.minor() as f64)
    }
}
