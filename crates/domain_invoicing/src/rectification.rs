//! Rectification workflow
//!
//! Issued invoices are never edited in place. A correction is a new invoice
//! in the rectifying series that points back at its original. Two flavours
//! exist: substitution (full replacement figures) and difference (signed
//! deltas against the original).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{InvoiceId, Money, SeriesId};

use crate::error::InvoicingError;
use crate::invoice::{DraftInvoice, IssuedInvoice};
use crate::line_item::LineItemInput;

/// How a rectifying invoice relates to its original
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RectificationKind {
    /// Lines fully replace the original's figures
    Substitution,
    /// Lines are signed deltas; negative amounts allowed
    Difference,
}

/// The rectification facts carried by a rectifying invoice
///
/// `rectifies` always points at an issued invoice; the link is set at
/// creation and never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RectificationInfo {
    pub kind: RectificationKind,
    pub reason: String,
    pub rectifies: InvoiceId,
    /// The original's grand total, recorded for difference rectifications so
    /// the delta can be read against it
    pub original_total: Option<Money>,
}

/// A request to rectify an issued invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RectificationRequest {
    pub kind: RectificationKind,
    pub reason: String,
    pub items: Vec<LineItemInput>,
    /// When true the rectifying invoice is issued in the same operation
    #[serde(default)]
    pub issue_immediately: bool,
}

/// Builds a rectifying draft against an issued original
///
/// The draft inherits tenant, owner, and currency from the original and is
/// placed in the given rectifying series. The type of `original` guarantees
/// the target is issued; callers resolve and check that before getting here.
///
/// # Errors
///
/// Returns `Validation` for a blank reason and line-level errors per
/// [`crate::line_item::LineItem::compute`]. Difference requests may carry
/// negative unit prices; substitution requests may not.
pub fn build_rectifying_draft(
    original: &IssuedInvoice,
    series_id: SeriesId,
    request: &RectificationRequest,
) -> Result<DraftInvoice, InvoicingError> {
    if request.reason.trim().is_empty() {
        return Err(InvoicingError::validation(
            "Rectification reason must not be empty",
        ));
    }

    let original_total = match request.kind {
        RectificationKind::Difference => Some(original.totals().total),
        RectificationKind::Substitution => None,
    };

    let info = RectificationInfo {
        kind: request.kind,
        reason: request.reason.trim().to_string(),
        rectifies: original.id(),
        original_total,
    };

    DraftInvoice::new_rectifying(
        original.tenant_id(),
        original.owner_id(),
        series_id,
        original.currency(),
        &request.items,
        info,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    use core_kernel::{Currency, OwnerId, TenantId};

    use crate::series::SequenceNumber;

    fn issued_original() -> IssuedInvoice {
        let draft = DraftInvoice::new(
            TenantId::new(),
            OwnerId::new(),
            SeriesId::new(),
            Currency::EUR,
            None,
            &[LineItemInput {
                concept: "Monthly management fee".to_string(),
                quantity: dec!(2),
                unit_price: dec!(100),
                vat_rate: dec!(21),
                retention_rate: dec!(0),
            }],
        )
        .unwrap();
        draft.issue(
            SequenceNumber {
                number: 1,
                display_number: "STD-2025-0001".to_string(),
            },
            Utc::now(),
        )
    }

    fn delta_item(unit_price: Decimal) -> LineItemInput {
        LineItemInput {
            concept: "Fee correction".to_string(),
            quantity: dec!(1),
            unit_price,
            vat_rate: dec!(21),
            retention_rate: dec!(0),
        }
    }

    #[test]
    fn test_difference_rectification_records_original_total() {
        let original = issued_original();
        let series_id = SeriesId::new();

        let draft = build_rectifying_draft(
            &original,
            series_id,
            &RectificationRequest {
                kind: RectificationKind::Difference,
                reason: "Overbilled management fee".to_string(),
                items: vec![delta_item(dec!(-50))],
                issue_immediately: false,
            },
        )
        .unwrap();

        let info = draft.rectification().unwrap();
        assert_eq!(info.kind, RectificationKind::Difference);
        assert_eq!(info.rectifies, original.id());
        assert_eq!(info.original_total.unwrap().amount(), dec!(242.00));
        assert_eq!(draft.totals().total.amount(), dec!(-60.50));
        assert_eq!(draft.series_id(), series_id);
        assert_eq!(draft.owner_id(), original.owner_id());
    }

    #[test]
    fn test_substitution_rejects_negative_lines() {
        let original = issued_original();
        let err = build_rectifying_draft(
            &original,
            SeriesId::new(),
            &RectificationRequest {
                kind: RectificationKind::Substitution,
                reason: "Wrong concept billed".to_string(),
                items: vec![delta_item(dec!(-50))],
                issue_immediately: false,
            },
        )
        .unwrap_err();
        assert!(matches!(err, InvoicingError::Validation(_)));
    }

    #[test]
    fn test_substitution_carries_replacement_figures() {
        let original = issued_original();
        let draft = build_rectifying_draft(
            &original,
            SeriesId::new(),
            &RectificationRequest {
                kind: RectificationKind::Substitution,
                reason: "Wrong unit price".to_string(),
                items: vec![delta_item(dec!(150))],
                issue_immediately: false,
            },
        )
        .unwrap();

        let info = draft.rectification().unwrap();
        assert_eq!(info.kind, RectificationKind::Substitution);
        assert_eq!(info.original_total, None);
        assert_eq!(draft.totals().total.amount(), dec!(181.50));
    }

    #[test]
    fn test_blank_reason_rejected() {
        let original = issued_original();
        let err = build_rectifying_draft(
            &original,
            SeriesId::new(),
            &RectificationRequest {
                kind: RectificationKind::Difference,
                reason: "  ".to_string(),
                items: vec![delta_item(dec!(-10))],
                issue_immediately: false,
            },
        )
        .unwrap_err();
        assert!(matches!(err, InvoicingError::Validation(_)));
    }

    #[test]
    fn test_empty_items_rejected() {
        let original = issued_original();
        let err = build_rectifying_draft(
            &original,
            SeriesId::new(),
            &RectificationRequest {
                kind: RectificationKind::Difference,
                reason: "Overbilled".to_string(),
                items: vec![],
                issue_immediately: false,
            },
        )
        .unwrap_err();
        assert!(matches!(err, InvoicingError::EmptyLineItems));
    }
}
