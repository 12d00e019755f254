//! Whole-unit currency amounts
//!
//! Estate fees are billed in Indonesian Rupiah, which has no minor unit in
//! practice. Amounts are therefore stored as signed 64-bit integers; fractional
//! values only appear in definition templates (NUMERIC columns) and are
//! truncated when a billing is created from them.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};
use thiserror::Error;

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Amount {0} cannot be represented in whole currency units")]
    Unrepresentable(Decimal),
}

/// An amount in whole currency units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    pub const fn amount(&self) -> i64 {
        self.0
    }

    /// Converts a decimal template amount, truncating toward zero
    pub fn from_decimal(value: Decimal) -> Result<Self, MoneyError> {
        value
            .trunc()
            .to_i64()
            .map(Self)
            .ok_or(MoneyError::Unrepresentable(value))
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the amount, or zero if it is negative
    pub fn clamp_non_negative(self) -> Self {
        Self(self.0.max(0))
    }

    pub fn checked_add(self, other: Money) -> Result<Self, MoneyError> {
        self.0.checked_add(other.0).map(Self).ok_or(MoneyError::Overflow)
    }

    /// Multiplies by a count of units, saturating on overflow
    pub fn times(self, count: u64) -> Self {
        let count = i64::try_from(count).unwrap_or(i64::MAX);
        Self(self.0.saturating_mul(count))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IDR {}", self.0)
    }
}

impl From<i64> for Money {
    fn from(amount: i64) -> Self {
        Self(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_decimal_truncates() {
        assert_eq!(Money::from_decimal(dec!(150000.75)).unwrap(), Money::new(150000));
        assert_eq!(Money::from_decimal(dec!(-10.9)).unwrap(), Money::new(-10));
    }

    #[test]
    fn test_sum_and_times() {
        let total: Money = [Money::new(100), Money::new(250)].into_iter().sum();
        assert_eq!(total, Money::new(350));
        assert_eq!(Money::new(20000).times(3), Money::new(60000));
    }
}
