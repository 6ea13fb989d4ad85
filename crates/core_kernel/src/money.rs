//! Money types with precise decimal arithmetic
//!
//! This module provides a type-safe representation of monetary values
//! using rust_decimal for precise calculations without floating-point errors.
//! Invoice amounts are rounded to the cent at the line level, so sums over
//! lines are exact by construction.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul, Neg, Sub};
use thiserror::Error;

/// Currency codes following ISO 4217
///
/// The system bills European vacation-rental owners, so the set is small.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    EUR,
    USD,
    GBP,
}

impl Currency {
    /// Returns the number of decimal places for this currency
    pub fn decimal_places(&self) -> u32 {
        2
    }

    /// Returns the currency symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::EUR => "€",
            Currency::USD => "$",
            Currency::GBP => "£",
        }
    }

    /// Returns the ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::EUR => "EUR",
            Currency::USD => "USD",
            Currency::GBP => "GBP",
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::EUR
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Currency mismatch: cannot operate on {0} and {1}")]
    CurrencyMismatch(String, String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Rate out of range: {0}% (expected 0-100)")]
    RateOutOfRange(Decimal),
}

/// A monetary amount with associated currency
///
/// Money uses rust_decimal for precise arithmetic without floating-point
/// errors. Amounts are stored with 4 decimal places internally so that
/// intermediate rate calculations keep sub-cent precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Creates a new Money value
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount: amount.round_dp(4),
            currency,
        }
    }

    /// Creates Money from an integer amount in minor units (cents)
    pub fn from_minor(minor_units: i64, currency: Currency) -> Self {
        let divisor = Decimal::new(10_i64.pow(currency.decimal_places()), 0);
        Self::new(Decimal::new(minor_units, 0) / divisor, currency)
    }

    /// Creates a zero amount in the specified currency
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: dec!(0),
            currency,
        }
    }

    /// Returns the amount
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the currency
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is strictly positive
    pub fn is_positive(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }

    /// Returns true if the amount is negative
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Returns the absolute value
    pub fn abs(&self) -> Self {
        Self {
            amount: self.amount.abs(),
            currency: self.currency,
        }
    }

    /// Rounds to the currency's standard decimal places (the cent)
    pub fn round_to_currency(&self) -> Self {
        Self {
            amount: self.amount.round_dp(self.currency.decimal_places()),
            currency: self.currency,
        }
    }

    /// Rounds using banker's rounding (round half to even)
    pub fn round_bankers(&self, dp: u32) -> Self {
        Self {
            amount: self.amount.round_dp_with_strategy(
                dp,
                rust_decimal::RoundingStrategy::MidpointNearestEven,
            ),
            currency: self.currency,
        }
    }

    /// Checked addition that returns an error on currency mismatch
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch(
                self.currency.to_string(),
                other.currency.to_string(),
            ));
        }
        Ok(Self::new(self.amount + other.amount, self.currency))
    }

    /// Checked subtraction that returns an error on currency mismatch
    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch(
                self.currency.to_string(),
                other.currency.to_string(),
            ));
        }
        Ok(Self::new(self.amount - other.amount, self.currency))
    }

    /// Checked multiplication by a scalar (e.g., a quantity)
    pub fn checked_mul(&self, factor: Decimal) -> Result<Money, MoneyError> {
        self.amount
            .checked_mul(factor)
            .map(|amount| Self::new(amount, self.currency))
            .ok_or(MoneyError::Overflow)
    }

    /// Divides by a scalar
    pub fn divide(&self, divisor: Decimal) -> Result<Self, MoneyError> {
        if divisor.is_zero() {
            return Err(MoneyError::DivisionByZero);
        }
        Ok(Self::new(self.amount / divisor, self.currency))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dp = self.currency.decimal_places();
        write!(
            f,
            "{} {:.dp$}",
            self.currency.symbol(),
            self.amount,
            dp = dp as usize
        )
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.checked_add(&other)
            .expect("Currency mismatch in Money::add")
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        self.checked_sub(&other)
            .expect("Currency mismatch in Money::sub")
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.amount, self.currency)
    }
}

impl Mul<Decimal> for Money {
    type Output = Self;

    fn mul(self, factor: Decimal) -> Self {
        self.checked_mul(factor)
            .expect("Overflow in Money::mul")
    }
}

impl Sum for Money {
    /// Sums an iterator of Money values.
    ///
    /// An empty iterator yields zero in the default currency; mixed
    /// currencies panic, mirroring `Add`.
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(None::<Money>, |acc, m| match acc {
            None => Some(m),
            Some(total) => Some(total + m),
        })
        .unwrap_or_else(|| Money::zero(Currency::default()))
    }
}

/// A percentage rate (VAT rate, retention rate)
///
/// Stored as a percentage value (21 means 21%), matching how rates appear
/// on printed invoices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate(Decimal);

impl Rate {
    /// Creates a rate from a percentage value (e.g., 21 for 21%)
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::RateOutOfRange` when the percentage falls
    /// outside [0, 100].
    pub fn from_percentage(percentage: Decimal) -> Result<Self, MoneyError> {
        if percentage < dec!(0) || percentage > dec!(100) {
            return Err(MoneyError::RateOutOfRange(percentage));
        }
        Ok(Self(percentage))
    }

    /// The zero rate
    pub fn zero() -> Self {
        Self(dec!(0))
    }

    /// Returns the rate as a percentage (21 for 21%)
    pub fn as_percentage(&self) -> Decimal {
        self.0
    }

    /// Returns the rate as a fraction (0.21 for 21%)
    pub fn as_fraction(&self) -> Decimal {
        self.0 / dec!(100)
    }

    /// Returns true if the rate is zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Applies this rate to a money amount
    pub fn apply(&self, money: &Money) -> Result<Money, MoneyError> {
        money.checked_mul(self.as_fraction())
    }
}

impl Default for Rate {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_creation() {
        let m = Money::new(dec!(100.50), Currency::EUR);
        assert_eq!(m.amount(), dec!(100.50));
        assert_eq!(m.currency(), Currency::EUR);
    }

    #[test]
    fn test_money_from_minor() {
        let m = Money::from_minor(10050, Currency::EUR);
        assert_eq!(m.amount(), dec!(100.50));
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::new(dec!(100.00), Currency::EUR);
        let b = Money::new(dec!(50.00), Currency::EUR);

        assert_eq!((a + b).amount(), dec!(150.00));
        assert_eq!((a - b).amount(), dec!(50.00));
        assert_eq!((-a).amount(), dec!(-100.00));
    }

    #[test]
    fn test_currency_mismatch() {
        let eur = Money::new(dec!(100.00), Currency::EUR);
        let gbp = Money::new(dec!(100.00), Currency::GBP);

        let result = eur.checked_add(&gbp);
        assert!(matches!(result, Err(MoneyError::CurrencyMismatch(_, _))));
    }

    #[test]
    fn test_money_sum() {
        let total: Money = vec![
            Money::new(dec!(10.10), Currency::EUR),
            Money::new(dec!(20.20), Currency::EUR),
            Money::new(dec!(-5.30), Currency::EUR),
        ]
        .into_iter()
        .sum();
        assert_eq!(total.amount(), dec!(25.00));
    }

    #[test]
    fn test_round_to_currency() {
        let m = Money::new(dec!(10.005), Currency::EUR);
        assert_eq!(m.round_to_currency().amount(), dec!(10.01));
    }

    #[test]
    fn test_rate_application() {
        let vat = Rate::from_percentage(dec!(21)).unwrap();
        let base = Money::new(dec!(200.00), Currency::EUR);

        assert_eq!(vat.apply(&base).unwrap().amount(), dec!(42.00));
    }

    #[test]
    fn test_checked_mul_overflow() {
        let huge = Money::new(Decimal::MAX, Currency::EUR);
        assert!(matches!(
            huge.checked_mul(dec!(2)),
            Err(MoneyError::Overflow)
        ));
        assert_eq!(
            huge.checked_mul(dec!(1)).unwrap().amount(),
            huge.amount()
        );
    }

    #[test]
    fn test_rate_rejects_out_of_range() {
        assert!(Rate::from_percentage(dec!(-1)).is_err());
        assert!(Rate::from_percentage(dec!(100.01)).is_err());
        assert!(Rate::from_percentage(dec!(0)).is_ok());
        assert!(Rate::from_percentage(dec!(100)).is_ok());
    }

    #[test]
    fn test_rate_display() {
        let rate = Rate::from_percentage(dec!(15.00)).unwrap();
        assert_eq!(rate.to_string(), "15%");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn money_add_sub_round_trips(
            a in -1_000_000i64..1_000_000i64,
            b in -1_000_000i64..1_000_000i64
        ) {
            let ma = Money::from_minor(a, Currency::EUR);
            let mb = Money::from_minor(b, Currency::EUR);

            prop_assert_eq!((ma + mb) - mb, ma);
        }

        #[test]
        fn rate_apply_is_linear(
            amount in 0i64..100_000_000i64,
            pct in 0u32..10_000u32
        ) {
            let rate = Rate::from_percentage(Decimal::new(pct as i64, 2)).unwrap();
            let money = Money::from_minor(amount, Currency::EUR);
            let doubled = Money::from_minor(amount * 2, Currency::EUR);

            prop_assert_eq!(
                rate.apply(&doubled).unwrap().amount(),
                (rate.apply(&money).unwrap() + rate.apply(&money).unwrap()).amount()
            );
        }
    }
}
