//! Test Assertions
//!
//! Custom assertions for invoicing invariants.

use rust_decimal::Decimal;

use domain_invoicing::{Invoice, InvoiceTotals, LineItem};

/// Asserts the totals block is internally consistent with its line items.
pub fn assert_totals_consistent(items: &[LineItem], totals: &InvoiceTotals) {
    let subtotal: Decimal = items.iter().map(|l| l.base.amount()).sum();
    let vat: Decimal = items.iter().map(|l| l.vat.amount()).sum();
    let retention: Decimal = items.iter().map(|l| l.retention.amount()).sum();

    assert_eq!(
        totals.subtotal.amount(),
        subtotal,
        "subtotal must equal the sum of line bases"
    );
    assert_eq!(
        totals.total_vat.amount(),
        vat,
        "total VAT must equal the sum of line VAT amounts"
    );
    assert_eq!(
        totals.retention_amount.amount(),
        retention,
        "retention must equal the sum of line retentions"
    );
    assert_eq!(
        totals.total.amount(),
        subtotal + vat - retention,
        "total must be subtotal + VAT - retention"
    );
}

/// Asserts a set of allocated sequence numbers is gapless from 1.
pub fn assert_gapless(numbers: &[i64]) {
    let mut sorted = numbers.to_vec();
    sorted.sort_unstable();
    let expected: Vec<i64> = (1..=numbers.len() as i64).collect();
    assert_eq!(
        sorted, expected,
        "sequence numbers must be contiguous starting at 1"
    );
}

/// Asserts an invoice is issued with the expected display number.
pub fn assert_issued_as(invoice: &Invoice, display_number: &str) {
    assert!(invoice.is_locked(), "invoice should be issued");
    assert_eq!(invoice.display_number(), Some(display_number));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{standard_draft, standard_series};
    use core_kernel::{OwnerId, TenantId};

    #[test]
    fn test_totals_consistent_on_fixture() {
        let tenant = TenantId::new();
        let series = standard_series(tenant);
        let draft = standard_draft(tenant, OwnerId::new(), series.id);
        assert_totals_consistent(draft.items(), draft.totals());
    }

    #[test]
    fn test_gapless_accepts_any_order() {
        assert_gapless(&[3, 1, 2]);
    }

    #[test]
    #[should_panic(expected = "contiguous")]
    fn test_gapless_rejects_holes() {
        assert_gapless(&[1, 3]);
    }
}
