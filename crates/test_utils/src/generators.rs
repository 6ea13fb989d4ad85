//! Property-Based Test Generators
//!
//! Proptest strategies for generating invoicing domain values.

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use core_kernel::{OwnerId, SeriesId, TenantId};
use domain_invoicing::LineItemInput;

/// Strategy for tenant identifiers
pub fn tenant_id_strategy() -> impl Strategy<Value = TenantId> {
    any::<[u8; 16]>().prop_map(|bytes| TenantId::from_uuid(Uuid::from_bytes(bytes)))
}

/// Strategy for owner identifiers
pub fn owner_id_strategy() -> impl Strategy<Value = OwnerId> {
    any::<[u8; 16]>().prop_map(|bytes| OwnerId::from_uuid(Uuid::from_bytes(bytes)))
}

/// Strategy for series identifiers
pub fn series_id_strategy() -> impl Strategy<Value = SeriesId> {
    any::<[u8; 16]>().prop_map(|bytes| SeriesId::from_uuid(Uuid::from_bytes(bytes)))
}

/// Strategy for line concepts
pub fn concept_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "Monthly management fee",
        "Cleaning service",
        "Owner settlement",
        "Booking commission",
        "Maintenance callout",
        "Linen rental",
    ])
    .prop_map(|s| s.to_string())
}

/// Strategy for quantities between 1 and 100 with two decimal places
pub fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    (100i64..=10_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for unit prices between 0.01 and 5000.00
pub fn unit_price_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=500_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for Spanish VAT rates
pub fn vat_rate_strategy() -> impl Strategy<Value = Decimal> {
    prop::sample::select(vec![
        Decimal::ZERO,
        Decimal::new(4, 0),
        Decimal::new(10, 0),
        Decimal::new(21, 0),
    ])
}

/// Strategy for IRPF retention rates
pub fn retention_rate_strategy() -> impl Strategy<Value = Decimal> {
    prop::sample::select(vec![
        Decimal::ZERO,
        Decimal::new(7, 0),
        Decimal::new(15, 0),
    ])
}

/// Strategy for a single line item input
pub fn line_item_input_strategy() -> impl Strategy<Value = LineItemInput> {
    (
        concept_strategy(),
        quantity_strategy(),
        unit_price_strategy(),
        vat_rate_strategy(),
        retention_rate_strategy(),
    )
        .prop_map(
            |(concept, quantity, unit_price, vat_rate, retention_rate)| LineItemInput {
                concept,
                quantity,
                unit_price,
                vat_rate,
                retention_rate,
            },
        )
}

/// Strategy for a non-empty batch of line items
pub fn line_items_strategy() -> impl Strategy<Value = Vec<LineItemInput>> {
    prop::collection::vec(line_item_input_strategy(), 1..=10)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use domain_invoicing::{InvoiceTotals, LineItem, LinePricing};

    proptest! {
        #[test]
        fn generated_lines_always_compute(items in line_items_strategy()) {
            let lines =
                LineItem::compute_all(&items, Currency::EUR, LinePricing::NonNegative).unwrap();
            let totals = InvoiceTotals::from_lines(&lines, Currency::EUR);
            prop_assert_eq!(
                totals.total.amount(),
                totals.subtotal.amount() + totals.total_vat.amount()
                    - totals.retention_amount.amount()
            );
        }
    }
}
