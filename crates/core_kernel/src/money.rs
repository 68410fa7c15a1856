//! Money types with integer minor-unit arithmetic
//!
//! Amounts are held as `i64` minor units (won, cents, ...) so that repeated
//! recalculation never accumulates floating-point drift. `Decimal` only
//! appears at the edges: converting from major units, applying rates, and
//! rendering.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::error::CoreError;

/// Currency codes following ISO 4217
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    KRW,
    USD,
    EUR,
    GBP,
    JPY,
    CHF,
    INR,
    AUD,
    CAD,
    SGD,
    HKD,
}

impl Currency {
    /// Returns the number of decimal places for this currency
    pub fn decimal_places(&self) -> u32 {
        match self {
            Currency::KRW | Currency::JPY => 0,
            _ => 2,
        }
    }

    /// Returns the currency symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::KRW => "₩",
            Currency::USD => "$",
            Currency::EUR => "€",
            Currency::GBP => "£",
            Currency::JPY => "¥",
            Currency::CHF => "CHF",
            Currency::INR => "₹",
            Currency::AUD => "A$",
            Currency::CAD => "C$",
            Currency::SGD => "S$",
            Currency::HKD => "HK$",
        }
    }

    /// Returns the ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::KRW => "KRW",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::JPY => "JPY",
            Currency::CHF => "CHF",
            Currency::INR => "INR",
            Currency::AUD => "AUD",
            Currency::CAD => "CAD",
            Currency::SGD => "SGD",
            Currency::HKD => "HKD",
        }
    }

    fn minor_factor(&self) -> i64 {
        10_i64.pow(self.decimal_places())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "KRW" => Ok(Currency::KRW),
            "USD" => Ok(Currency::USD),
            "EUR" => Ok(Currency::EUR),
            "GBP" => Ok(Currency::GBP),
            "JPY" => Ok(Currency::JPY),
            "CHF" => Ok(Currency::CHF),
            "INR" => Ok(Currency::INR),
            "AUD" => Ok(Currency::AUD),
            "CAD" => Ok(Currency::CAD),
            "SGD" => Ok(Currency::SGD),
            "HKD" => Ok(Currency::HKD),
            other => Err(CoreError::validation(format!("unknown currency code '{}'", other))),
        }
    }
}

/// Errors that can occur during money operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Currency mismatch: cannot operate on {0} and {1}")]
    CurrencyMismatch(String, String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Overflow during calculation")]
    Overflow,
}

/// A monetary amount in integer minor units with its currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    minor: i64,
    currency: Currency,
}

impl Money {
    /// Creates Money from an integer amount in minor units (e.g., cents)
    pub fn from_minor(minor_units: i64, currency: Currency) -> Self {
        Self {
            minor: minor_units,
            currency,
        }
    }

    /// Creates Money from a major-unit decimal, rounding half-to-even to the
    /// currency's minor unit
    pub fn from_major(amount: Decimal, currency: Currency) -> Result<Self, MoneyError> {
        let scaled = amount
            .checked_mul(Decimal::from(currency.minor_factor()))
            .ok_or(MoneyError::Overflow)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);

        let minor = scaled.to_i64().ok_or(MoneyError::Overflow)?;
        Ok(Self::from_minor(minor, currency))
    }

    /// Creates a zero amount in the specified currency
    pub fn zero(currency: Currency) -> Self {
        Self { minor: 0, currency }
    }

    /// Returns the amount in minor units
    pub fn minor_units(&self) -> i64 {
        self.minor
    }

    /// Returns the amount in major units
    pub fn amount(&self) -> Decimal {
        Decimal::new(self.minor, self.currency.decimal_places())
    }

    /// Returns the currency
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.minor == 0
    }

    /// Returns true if the amount is positive
    pub fn is_positive(&self) -> bool {
        self.minor > 0
    }

    /// Returns true if the amount is negative
    pub fn is_negative(&self) -> bool {
        self.minor < 0
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch(
                self.currency.to_string(),
                other.currency.to_string(),
            ));
        }
        Ok(())
    }

    /// Checked addition that returns an error on currency mismatch or overflow
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        let minor = self.minor.checked_add(other.minor).ok_or(MoneyError::Overflow)?;
        Ok(Self::from_minor(minor, self.currency))
    }

    /// Checked subtraction that returns an error on currency mismatch or overflow
    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        let minor = self.minor.checked_sub(other.minor).ok_or(MoneyError::Overflow)?;
        Ok(Self::from_minor(minor, self.currency))
    }

    /// Multiplies by an integer quantity (days, visits, ...)
    pub fn checked_mul(&self, quantity: i64) -> Result<Money, MoneyError> {
        let minor = self.minor.checked_mul(quantity).ok_or(MoneyError::Overflow)?;
        Ok(Self::from_minor(minor, self.currency))
    }

    /// Returns the smaller of two amounts in the same currency
    pub fn min(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(if other.minor < self.minor { *other } else { *self })
    }

    /// Applies a rate, rounding half-to-even to a whole minor unit
    pub fn apply_rate(&self, rate: &Rate) -> Result<Money, MoneyError> {
        let share = Decimal::from(self.minor)
            .checked_mul(rate.as_decimal())
            .ok_or(MoneyError::Overflow)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);

        let minor = share.to_i64().ok_or(MoneyError::Overflow)?;
        Ok(Self::from_minor(minor, self.currency))
    }

    /// Sums amounts, all of which must be in `currency`
    pub fn sum<'a, I>(amounts: I, currency: Currency) -> Result<Money, MoneyError>
    where
        I: IntoIterator<Item = &'a Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::zero(currency), |acc, m| acc.checked_add(m))
    }

    /// Splits this amount in proportion to `weights` so that the parts sum
    /// exactly to the original.
    ///
    /// Each part gets the floor of its exact share; the leftover minor units
    /// go one at a time to the parts with the largest fractional remainder,
    /// ties broken by larger weight and then by earlier position.
    pub fn allocate_proportionally(&self, weights: &[i64]) -> Result<Vec<Money>, MoneyError> {
        if weights.is_empty() {
            return Err(MoneyError::InvalidAmount("Empty weights".to_string()));
        }
        if self.minor < 0 || weights.iter().any(|w| *w < 0) {
            return Err(MoneyError::InvalidAmount(
                "Proportional allocation requires non-negative values".to_string(),
            ));
        }

        let total_weight: i128 = weights.iter().map(|w| *w as i128).sum();
        if total_weight == 0 {
            return Err(MoneyError::DivisionByZero);
        }

        let amount = self.minor as i128;
        let mut parts: Vec<i128> = Vec::with_capacity(weights.len());
        let mut remainders: Vec<(usize, i128)> = Vec::with_capacity(weights.len());

        for (index, weight) in weights.iter().enumerate() {
            let exact = amount * *weight as i128;
            parts.push(exact / total_weight);
            remainders.push((index, exact % total_weight));
        }

        let allocated: i128 = parts.iter().sum();
        let leftover = (amount - allocated) as usize;

        remainders.sort_by(|(ia, ra), (ib, rb)| {
            rb.cmp(ra)
                .then_with(|| weights[*ib].cmp(&weights[*ia]))
                .then_with(|| ia.cmp(ib))
        });

        for (index, _) in remainders.into_iter().take(leftover) {
            parts[index] += 1;
        }

        parts
            .into_iter()
            .map(|minor| {
                i64::try_from(minor)
                    .map(|m| Money::from_minor(m, self.currency))
                    .map_err(|_| MoneyError::Overflow)
            })
            .collect()
    }

    /// Renders the major-unit amount with thousands separators and no symbol
    pub fn grouped(&self) -> String {
        let dp = self.currency.decimal_places() as usize;
        let factor = self.currency.minor_factor().unsigned_abs();
        let abs = self.minor.unsigned_abs();
        let whole = (abs / factor).to_string();

        let mut out = String::with_capacity(whole.len() + whole.len() / 3 + dp + 2);
        if self.minor < 0 {
            out.push('-');
        }
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                out.push(',');
            }
            out.push(ch);
        }
        if dp > 0 {
            out.push('.');
            out.push_str(&format!("{:0width$}", abs % factor, width = dp));
        }
        out
    }
}

impl PartialOrd for Money {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.currency != other.currency {
            return None;
        }
        Some(self.minor.cmp(&other.minor))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.currency.symbol(), self.grouped())
    }
}

/// Represents a percentage rate (e.g., coverage share, reduction ratio)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    /// The rate as a decimal (e.g., 0.8 for 80%)
    value: Decimal,
}

impl Rate {
    /// Creates a rate from a decimal value (e.g., 0.05 for 5%)
    pub fn new(value: Decimal) -> Self {
        Self { value }
    }

    /// Creates a rate from a percentage (e.g., 5.0 for 5%)
    pub fn from_percentage(percentage: Decimal) -> Self {
        Self {
            value: percentage / dec!(100),
        }
    }

    /// Creates the ratio `numerator / denominator` of two amounts
    pub fn ratio_of(numerator: &Money, denominator: &Money) -> Result<Self, MoneyError> {
        numerator.ensure_same_currency(denominator)?;
        Self::from_minor_ratio(i128::from(numerator.minor_units()), i128::from(denominator.minor_units()))
    }

    /// Creates the ratio of two minor-unit quantities that may exceed `i64`,
    /// such as a sum of many amounts
    pub fn from_minor_ratio(numerator: i128, denominator: i128) -> Result<Self, MoneyError> {
        if denominator == 0 {
            return Err(MoneyError::DivisionByZero);
        }
        let numerator = Decimal::try_from_i128_with_scale(numerator, 0).map_err(|_| MoneyError::Overflow)?;
        let denominator = Decimal::try_from_i128_with_scale(denominator, 0).map_err(|_| MoneyError::Overflow)?;
        let value = numerator.checked_div(denominator).ok_or(MoneyError::Overflow)?;
        Ok(Self { value })
    }

    /// Returns the rate as a decimal
    pub fn as_decimal(&self) -> Decimal {
        self.value
    }

    /// Returns the rate as a percentage
    pub fn as_percentage(&self) -> Decimal {
        self.value * dec!(100)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage().round_dp(2).normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_from_minor() {
        let m = Money::from_minor(10050, Currency::USD);
        assert_eq!(m.amount(), dec!(100.50));
        assert_eq!(m.minor_units(), 10050);
    }

    #[test]
    fn test_money_from_major_rounds_half_even() {
        assert_eq!(Money::from_major(dec!(10.005), Currency::USD).unwrap().minor_units(), 1000);
        assert_eq!(Money::from_major(dec!(10.015), Currency::USD).unwrap().minor_units(), 1002);
        assert_eq!(Money::from_major(dec!(50000), Currency::KRW).unwrap().minor_units(), 50000);
    }

    #[test]
    fn test_currency_mismatch() {
        let krw = Money::from_minor(100, Currency::KRW);
        let usd = Money::from_minor(100, Currency::USD);

        let result = krw.checked_add(&usd);
        assert!(matches!(result, Err(MoneyError::CurrencyMismatch(_, _))));
    }

    #[test]
    fn test_checked_mul_overflow() {
        let m = Money::from_minor(i64::MAX / 2, Currency::KRW);
        assert_eq!(m.checked_mul(3), Err(MoneyError::Overflow));
    }

    #[test]
    fn test_apply_rate() {
        let m = Money::from_minor(100_000, Currency::KRW);
        let share = m.apply_rate(&Rate::from_percentage(dec!(80))).unwrap();
        assert_eq!(share.minor_units(), 80_000);
    }

    #[test]
    fn test_money_error_clones() {
        let err = Money::from_minor(i64::MAX, Currency::KRW).checked_mul(2).unwrap_err();
        assert_eq!(err.clone(), MoneyError::Overflow);
    }

    #[test]
    fn test_allocate_proportionally_exact() {
        let cap = Money::from_minor(1_000_000, Currency::KRW);
        let parts = cap.allocate_proportionally(&[900_000, 600_000]).unwrap();

        assert_eq!(parts[0].minor_units(), 600_000);
        assert_eq!(parts[1].minor_units(), 400_000);
    }

    #[test]
    fn test_allocate_proportionally_leftover_goes_to_largest_remainder() {
        let cap = Money::from_minor(100, Currency::KRW);
        let parts = cap.allocate_proportionally(&[1, 1, 1]).unwrap();

        let minors: Vec<i64> = parts.iter().map(|p| p.minor_units()).collect();
        assert_eq!(minors, vec![34, 33, 33]);
    }

    #[test]
    fn test_allocate_proportionally_zero_weights() {
        let cap = Money::from_minor(100, Currency::KRW);
        assert_eq!(cap.allocate_proportionally(&[0, 0]), Err(MoneyError::DivisionByZero));
    }

    #[test]
    fn test_grouped_rendering() {
        assert_eq!(Money::from_minor(250_000, Currency::KRW).grouped(), "250,000");
        assert_eq!(Money::from_minor(123_456_789, Currency::USD).grouped(), "1,234,567.89");
        assert_eq!(Money::from_minor(-5, Currency::USD).grouped(), "-0.05");
        assert_eq!(Money::from_minor(999, Currency::KRW).to_string(), "₩999");
    }

    #[test]
    fn test_rate_display() {
        let ratio = Rate::ratio_of(
            &Money::from_minor(1_000_000, Currency::KRW),
            &Money::from_minor(1_500_000, Currency::KRW),
        )
        .unwrap();
        assert_eq!(ratio.to_string(), "66.67%");
        assert_eq!(Rate::from_percentage(dec!(80)).to_string(), "80%");
    }

    #[test]
    fn test_ratio_beyond_i64() {
        let sum = i128::from(i64::MAX) * 2;
        let ratio = Rate::from_minor_ratio(1_000_000, sum).unwrap();
        assert!(ratio.as_decimal() > Decimal::ZERO);
        assert!(ratio.as_decimal() < dec!(0.000001));
        assert_eq!(Rate::from_minor_ratio(1, 0), Err(MoneyError::DivisionByZero));
    }

    #[test]
    fn test_currency_parse() {
        assert_eq!("krw".parse::<Currency>().unwrap(), Currency::KRW);
        assert!("XYZ".parse::<Currency>().is_err());
    }
}
