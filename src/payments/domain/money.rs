//! Money amounts and the platform fee split.
//!
//! Amounts are stored as integer cents. The wire representation is a
//! decimal dollar value (`37.33`), accepted either as a JSON number or as a
//! numeric string.

use serde::de::{self, Deserializer};
use serde::ser::{Error as _, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const CENTS_PER_UNIT: i64 = 100;
const BASIS_POINTS_PER_WHOLE: i128 = 10_000;
const MAX_WHOLE_DIGITS: usize = 12;

/// Error returned when a decimal amount cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// The value is not a plain decimal number.
    #[error("invalid amount '{0}'")]
    Invalid(String),

    /// The value is too large to represent.
    #[error("amount '{0}' is out of range")]
    OutOfRange(String),
}

/// A monetary amount in minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    /// The zero amount.
    pub const ZERO: Self = Self(0);

    /// Creates an amount from integer cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Creates an amount from whole currency units.
    #[must_use]
    pub const fn from_units(units: i64) -> Self {
        Self(units.saturating_mul(CENTS_PER_UNIT))
    }

    /// Returns the amount in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Returns `true` when the amount is strictly greater than zero.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Adds two amounts, saturating at the numeric bounds.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Subtracts `other` from this amount, saturating at the numeric bounds.
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Parses a decimal amount, rounding half-up to the nearest cent.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Invalid`] when the input is not a plain decimal
    /// number and [`MoneyError::OutOfRange`] when it has too many digits.
    pub fn parse_decimal(raw: &str) -> Result<Self, MoneyError> {
        let trimmed = raw.trim();
        let invalid = || MoneyError::Invalid(raw.to_owned());
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if whole.len() > MAX_WHOLE_DIGITS {
            return Err(MoneyError::OutOfRange(raw.to_owned()));
        }

        let mut whole_value: i64 = 0;
        for ch in whole.chars() {
            let digit = ch.to_digit(10).ok_or_else(invalid)?;
            whole_value = whole_value * 10 + i64::from(digit);
        }

        let mut fraction_digits = fraction.chars();
        let mut fraction_value: i64 = 0;
        for _ in 0..2 {
            let digit = match fraction_digits.next() {
                Some(ch) => ch.to_digit(10).ok_or_else(invalid)?,
                None => 0,
            };
            fraction_value = fraction_value * 10 + i64::from(digit);
        }
        let round_up = match fraction_digits.next() {
            Some(ch) => ch.to_digit(10).ok_or_else(invalid)? >= 5,
            None => false,
        };
        if fraction_digits.any(|ch| !ch.is_ascii_digit()) {
            return Err(invalid());
        }

        let magnitude = whole_value * CENTS_PER_UNIT + fraction_value + i64::from(round_up);
        Ok(Self(if negative { -magnitude } else { magnitude }))
    }

    /// Renders the amount as a decimal string with two fractional digits.
    #[must_use]
    pub fn to_decimal_string(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        let units = magnitude.div_euclid(100);
        let cents = magnitude.rem_euclid(100);
        format!("{sign}{units}.{cents:02}")
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal_string())
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse_decimal(value)
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let number = serde_json::Number::from_str(&self.to_decimal_string())
            .map_err(|err| S::Error::custom(err.to_string()))?;
        number.serialize(serializer)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(serde_json::Number),
    Text(String),
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = match RawAmount::deserialize(deserializer)? {
            RawAmount::Number(number) => number.to_string(),
            RawAmount::Text(text) => text,
        };
        Self::parse_decimal(&text).map_err(de::Error::custom)
    }
}

/// Platform fee rate expressed in basis points of the gross amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeeRate(u32);

impl FeeRate {
    /// Creates a fee rate from basis points (`1500` = 15%).
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::OutOfRange`] when the rate exceeds 100%.
    pub fn from_basis_points(basis_points: u32) -> Result<Self, MoneyError> {
        if i128::from(basis_points) > BASIS_POINTS_PER_WHOLE {
            return Err(MoneyError::OutOfRange(basis_points.to_string()));
        }
        Ok(Self(basis_points))
    }

    /// Parses a percentage such as `15` or `12.5`.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError`] when the value is not a percentage between 0
    /// and 100.
    pub fn parse_percent(raw: &str) -> Result<Self, MoneyError> {
        // A percentage with two decimals maps one-to-one onto basis points.
        let basis_points = Money::parse_decimal(raw)?.cents();
        let value =
            u32::try_from(basis_points).map_err(|_| MoneyError::OutOfRange(raw.to_owned()))?;
        Self::from_basis_points(value)
    }

    /// Returns the rate in basis points.
    #[must_use]
    pub const fn basis_points(self) -> u32 {
        self.0
    }

    /// Computes the fee owed on `amount`, rounding half-up to the cent.
    #[must_use]
    pub fn fee_on(self, amount: Money) -> Money {
        let scaled = i128::from(amount.cents()) * i128::from(self.0) + BASIS_POINTS_PER_WHOLE / 2;
        let fee = scaled.div_euclid(BASIS_POINTS_PER_WHOLE);
        Money::from_cents(i64::try_from(fee).unwrap_or(amount.cents()))
    }
}

impl Default for FeeRate {
    fn default() -> Self {
        Self(1500)
    }
}

/// Division of a gross payment between the platform and the payee.
///
/// `platform_fee + payee_amount == total` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSplit {
    /// Gross amount charged to the payer.
    pub total: Money,
    /// Platform's share.
    pub platform_fee: Money,
    /// Amount transferred to the payee.
    pub payee_amount: Money,
}

impl FeeSplit {
    /// Splits `total` using the given fee rate.
    #[must_use]
    pub fn compute(total: Money, rate: FeeRate) -> Self {
        let platform_fee = rate.fee_on(total);
        Self {
            total,
            platform_fee,
            payee_amount: total.saturating_sub(platform_fee),
        }
    }

    /// A split where the payee receives the whole amount.
    #[must_use]
    pub const fn without_fee(total: Money) -> Self {
        Self {
            total,
            platform_fee: Money::ZERO,
            payee_amount: total,
        }
    }
}
