//! Invoice line items
//!
//! A line item belongs to exactly one invoice. Its monetary components are
//! rounded to the cent when computed, so invoice totals (plain sums over
//! lines) are cent-exact.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, LineItemId, Money, Rate};

use crate::error::InvoicingError;

/// Pricing policy applied when validating line inputs
///
/// Negative unit prices only make sense as deltas on a difference-type
/// rectification; everywhere else they are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinePricing {
    /// Unit prices must be non-negative
    NonNegative,
    /// Deltas: negative unit prices allowed
    AllowNegative,
}

/// Raw line input as supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemInput {
    pub concept: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// VAT percentage in [0, 100]
    pub vat_rate: Decimal,
    /// Retention percentage in [0, 100]
    #[serde(default)]
    pub retention_rate: Decimal,
}

/// A validated, computed line item
///
/// `position` is the stable display/print order, unique within the invoice.
/// Retention is tracked per line but subtracted only at the invoice level,
/// preserving per-line VAT display integrity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    pub concept: String,
    pub quantity: Decimal,
    pub unit_price: Money,
    pub vat_rate: Rate,
    pub retention_rate: Rate,
    pub position: u32,
    /// quantity × unit price, cent-rounded
    pub base: Money,
    /// base × VAT rate, cent-rounded
    pub vat: Money,
    /// base × retention rate, cent-rounded
    pub retention: Money,
    /// base + VAT (retention not subtracted here)
    pub total: Money,
}

impl LineItem {
    /// Validates an input and computes the line's monetary components
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty concept, non-positive quantity,
    /// out-of-range VAT/retention rates, or a negative unit price under
    /// `LinePricing::NonNegative`.
    pub fn compute(
        input: &LineItemInput,
        position: u32,
        currency: Currency,
        pricing: LinePricing,
    ) -> Result<Self, InvoicingError> {
        if input.concept.trim().is_empty() {
            return Err(InvoicingError::validation("Line concept must not be empty"));
        }
        if input.quantity <= Decimal::ZERO {
            return Err(InvoicingError::validation(format!(
                "Line quantity must be positive, got {}",
                input.quantity
            )));
        }
        if pricing == LinePricing::NonNegative && input.unit_price < Decimal::ZERO {
            return Err(InvoicingError::validation(format!(
                "Negative unit price {} only allowed on difference rectification lines",
                input.unit_price
            )));
        }

        let vat_rate = Rate::from_percentage(input.vat_rate)?;
        let retention_rate = Rate::from_percentage(input.retention_rate)?;

        let unit_price = Money::new(input.unit_price, currency);
        let base = unit_price.checked_mul(input.quantity)?.round_to_currency();
        let vat = vat_rate.apply(&base)?.round_to_currency();
        let retention = retention_rate.apply(&base)?.round_to_currency();
        let total = base + vat;

        Ok(Self {
            id: LineItemId::new_v7(),
            concept: input.concept.trim().to_string(),
            quantity: input.quantity,
            unit_price,
            vat_rate,
            retention_rate,
            position,
            base,
            vat,
            retention,
            total,
        })
    }

    /// Validates and computes a whole set of lines, assigning positions in
    /// input order
    pub fn compute_all(
        inputs: &[LineItemInput],
        currency: Currency,
        pricing: LinePricing,
    ) -> Result<Vec<Self>, InvoicingError> {
        if inputs.is_empty() {
            return Err(InvoicingError::EmptyLineItems);
        }
        inputs
            .iter()
            .enumerate()
            .map(|(i, input)| Self::compute(input, i as u32, currency, pricing))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input(quantity: Decimal, unit_price: Decimal, vat: Decimal, retention: Decimal) -> LineItemInput {
        LineItemInput {
            concept: "Monthly management fee".to_string(),
            quantity,
            unit_price,
            vat_rate: vat,
            retention_rate: retention,
        }
    }

    #[test]
    fn test_line_computation() {
        let line = LineItem::compute(
            &input(dec!(2), dec!(100), dec!(21), dec!(15)),
            0,
            Currency::EUR,
            LinePricing::NonNegative,
        )
        .unwrap();

        assert_eq!(line.base.amount(), dec!(200.00));
        assert_eq!(line.vat.amount(), dec!(42.00));
        assert_eq!(line.retention.amount(), dec!(30.00));
        assert_eq!(line.total.amount(), dec!(242.00));
    }

    #[test]
    fn test_components_are_cent_rounded() {
        // 3 × 33.333 = 99.999 -> 100.00; VAT 21% of 100.00 = 21.00
        let line = LineItem::compute(
            &input(dec!(3), dec!(33.333), dec!(21), dec!(0)),
            0,
            Currency::EUR,
            LinePricing::NonNegative,
        )
        .unwrap();

        assert_eq!(line.base.amount(), dec!(100.00));
        assert_eq!(line.vat.amount(), dec!(21.00));
    }

    #[test]
    fn test_rejects_empty_concept() {
        let mut bad = input(dec!(1), dec!(10), dec!(21), dec!(0));
        bad.concept = "   ".to_string();
        let err = LineItem::compute(&bad, 0, Currency::EUR, LinePricing::NonNegative).unwrap_err();
        assert!(matches!(err, InvoicingError::Validation(_)));
    }

    #[test]
    fn test_rejects_non_positive_quantity() {
        let err = LineItem::compute(
            &input(dec!(0), dec!(10), dec!(21), dec!(0)),
            0,
            Currency::EUR,
            LinePricing::NonNegative,
        )
        .unwrap_err();
        assert!(matches!(err, InvoicingError::Validation(_)));
    }

    #[test]
    fn test_rejects_out_of_range_rates() {
        let err = LineItem::compute(
            &input(dec!(1), dec!(10), dec!(101), dec!(0)),
            0,
            Currency::EUR,
            LinePricing::NonNegative,
        )
        .unwrap_err();
        assert!(matches!(err, InvoicingError::Validation(_)));
    }

    #[test]
    fn test_negative_price_policy() {
        let delta = input(dec!(1), dec!(-50), dec!(21), dec!(0));

        let err =
            LineItem::compute(&delta, 0, Currency::EUR, LinePricing::NonNegative).unwrap_err();
        assert!(matches!(err, InvoicingError::Validation(_)));

        let line =
            LineItem::compute(&delta, 0, Currency::EUR, LinePricing::AllowNegative).unwrap();
        assert_eq!(line.base.amount(), dec!(-50.00));
        assert_eq!(line.vat.amount(), dec!(-10.50));
        assert_eq!(line.total.amount(), dec!(-60.50));
    }

    #[test]
    fn test_compute_all_assigns_positions() {
        let inputs = vec![
            input(dec!(1), dec!(10), dec!(21), dec!(0)),
            input(dec!(1), dec!(20), dec!(21), dec!(0)),
        ];
        let lines = LineItem::compute_all(&inputs, Currency::EUR, LinePricing::NonNegative).unwrap();
        assert_eq!(lines[0].position, 0);
        assert_eq!(lines[1].position, 1);
    }

    #[test]
    fn test_overflowing_amount_is_an_error_not_a_panic() {
        let err = LineItem::compute(
            &input(Decimal::MAX, Decimal::MAX, dec!(21), dec!(0)),
            0,
            Currency::EUR,
            LinePricing::NonNegative,
        )
        .unwrap_err();
        assert!(matches!(err, InvoicingError::Validation(_)));
    }

    #[test]
    fn test_compute_all_rejects_empty() {
        let err = LineItem::compute_all(&[], Currency::EUR, LinePricing::NonNegative).unwrap_err();
        assert!(matches!(err, InvoicingError::EmptyLineItems));
    }
}
