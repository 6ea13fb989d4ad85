//! Invoice lifecycle
//!
//! An invoice is a one-way state machine: it starts as a [`DraftInvoice`]
//! (mutable, unnumbered) and is consumed by [`DraftInvoice::issue`] into an
//! [`IssuedInvoice`] (numbered, frozen). Mutation methods exist only on the
//! draft variant, so editing an issued invoice is not expressible; any
//! correction must go through the rectification workflow.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, InvoiceId, Money, OwnerId, SeriesId, TenantId};

use crate::error::InvoicingError;
use crate::line_item::{LineItem, LineItemInput, LinePricing};
use crate::rectification::{RectificationInfo, RectificationKind};
use crate::series::SequenceNumber;

/// Invoice lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Draft,
    Issued,
}

/// Invoice-level aggregates computed from the line items
///
/// Retention is subtracted here, at the invoice level, never per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    pub subtotal: Money,
    pub total_vat: Money,
    /// Weighted average retention percentage across lines (0 when subtotal is 0)
    pub retention_rate: Decimal,
    pub retention_amount: Money,
    pub total: Money,
}

impl InvoiceTotals {
    /// Computes totals from a set of lines
    pub fn from_lines(lines: &[LineItem], currency: Currency) -> Self {
        let zero = Money::zero(currency);
        let subtotal = lines.iter().fold(zero, |acc, l| acc + l.base);
        let total_vat = lines.iter().fold(zero, |acc, l| acc + l.vat);
        let retention_amount = lines.iter().fold(zero, |acc, l| acc + l.retention);

        let retention_rate = if subtotal.is_zero() {
            dec!(0)
        } else {
            retention_amount.amount() / subtotal.amount() * dec!(100)
        };

        Self {
            subtotal,
            total_vat,
            retention_rate,
            retention_amount,
            total: subtotal + total_vat - retention_amount,
        }
    }
}

/// A mutable, unnumbered invoice
///
/// Drafts never touch the sequence allocator; deleting a draft burns no
/// number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftInvoice {
    id: InvoiceId,
    tenant_id: TenantId,
    owner_id: OwnerId,
    series_id: SeriesId,
    currency: Currency,
    issue_date: NaiveDate,
    due_date: Option<NaiveDate>,
    items: Vec<LineItem>,
    totals: InvoiceTotals,
    rectification: Option<RectificationInfo>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DraftInvoice {
    /// Creates a standard draft from raw line inputs
    ///
    /// # Errors
    ///
    /// Returns `EmptyLineItems` for an empty input set and `Validation` for
    /// bad lines (see [`LineItem::compute`]).
    pub fn new(
        tenant_id: TenantId,
        owner_id: OwnerId,
        series_id: SeriesId,
        currency: Currency,
        due_date: Option<NaiveDate>,
        inputs: &[LineItemInput],
    ) -> Result<Self, InvoicingError> {
        Self::build(tenant_id, owner_id, series_id, currency, due_date, inputs, None)
    }

    /// Creates a rectifying draft; used by the rectification workflow
    pub(crate) fn new_rectifying(
        tenant_id: TenantId,
        owner_id: OwnerId,
        series_id: SeriesId,
        currency: Currency,
        inputs: &[LineItemInput],
        rectification: RectificationInfo,
    ) -> Result<Self, InvoicingError> {
        Self::build(
            tenant_id,
            owner_id,
            series_id,
            currency,
            None,
            inputs,
            Some(rectification),
        )
    }

    fn build(
        tenant_id: TenantId,
        owner_id: OwnerId,
        series_id: SeriesId,
        currency: Currency,
        due_date: Option<NaiveDate>,
        inputs: &[LineItemInput],
        rectification: Option<RectificationInfo>,
    ) -> Result<Self, InvoicingError> {
        let pricing = Self::pricing_for(rectification.as_ref());
        let items = LineItem::compute_all(inputs, currency, pricing)?;
        let totals = InvoiceTotals::from_lines(&items, currency);
        let now = Utc::now();

        Ok(Self {
            id: InvoiceId::new_v7(),
            tenant_id,
            owner_id,
            series_id,
            currency,
            issue_date: now.date_naive(),
            due_date,
            items,
            totals,
            rectification,
            created_at: now,
            updated_at: now,
        })
    }

    fn pricing_for(rectification: Option<&RectificationInfo>) -> LinePricing {
        match rectification {
            Some(info) if info.kind == RectificationKind::Difference => LinePricing::AllowNegative,
            _ => LinePricing::NonNegative,
        }
    }

    /// Replaces the draft's line items and recomputes totals
    ///
    /// Only valid while the invoice is a draft, which this type guarantees.
    pub fn replace_items(&mut self, inputs: &[LineItemInput]) -> Result<(), InvoicingError> {
        let pricing = Self::pricing_for(self.rectification.as_ref());
        let items = LineItem::compute_all(inputs, self.currency, pricing)?;
        self.totals = InvoiceTotals::from_lines(&items, self.currency);
        self.items = items;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Sets the payment due date
    pub fn set_due_date(&mut self, due_date: Option<NaiveDate>) {
        self.due_date = due_date;
        self.updated_at = Utc::now();
    }

    /// Consumes the draft, assigning the allocated number and freezing it
    ///
    /// Callers must obtain `seq` and persist the resulting invoice inside the
    /// same atomic unit that advanced the series counter.
    pub fn issue(self, seq: SequenceNumber, issued_at: DateTime<Utc>) -> IssuedInvoice {
        IssuedInvoice {
            id: self.id,
            tenant_id: self.tenant_id,
            owner_id: self.owner_id,
            series_id: self.series_id,
            currency: self.currency,
            number: seq.number,
            display_number: seq.display_number,
            issue_date: self.issue_date,
            due_date: self.due_date,
            issued_at,
            items: self.items,
            totals: self.totals,
            rectification: self.rectification,
            created_at: self.created_at,
            updated_at: issued_at,
        }
    }

    pub fn id(&self) -> InvoiceId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn owner_id(&self) -> OwnerId {
        self.owner_id
    }

    pub fn series_id(&self) -> SeriesId {
        self.series_id
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn issue_date(&self) -> NaiveDate {
        self.issue_date
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn totals(&self) -> &InvoiceTotals {
        &self.totals
    }

    pub fn rectification(&self) -> Option<&RectificationInfo> {
        self.rectification.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// A numbered, frozen invoice
///
/// Exposes no mutators: number, display number, totals, and lines are fixed
/// for good. Corrections are expressed as new rectifying invoices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuedInvoice {
    id: InvoiceId,
    tenant_id: TenantId,
    owner_id: OwnerId,
    series_id: SeriesId,
    currency: Currency,
    number: i64,
    display_number: String,
    issue_date: NaiveDate,
    due_date: Option<NaiveDate>,
    issued_at: DateTime<Utc>,
    items: Vec<LineItem>,
    totals: InvoiceTotals,
    rectification: Option<RectificationInfo>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl IssuedInvoice {
    pub fn id(&self) -> InvoiceId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn owner_id(&self) -> OwnerId {
        self.owner_id
    }

    pub fn series_id(&self) -> SeriesId {
        self.series_id
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn number(&self) -> i64 {
        self.number
    }

    pub fn display_number(&self) -> &str {
        &self.display_number
    }

    pub fn issue_date(&self) -> NaiveDate {
        self.issue_date
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn totals(&self) -> &InvoiceTotals {
        &self.totals
    }

    pub fn rectification(&self) -> Option<&RectificationInfo> {
        self.rectification.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// An invoice in either lifecycle state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Invoice {
    Draft(DraftInvoice),
    Issued(IssuedInvoice),
}

impl Invoice {
    pub fn id(&self) -> InvoiceId {
        match self {
            Invoice::Draft(d) => d.id(),
            Invoice::Issued(i) => i.id(),
        }
    }

    pub fn tenant_id(&self) -> TenantId {
        match self {
            Invoice::Draft(d) => d.tenant_id(),
            Invoice::Issued(i) => i.tenant_id(),
        }
    }

    pub fn owner_id(&self) -> OwnerId {
        match self {
            Invoice::Draft(d) => d.owner_id(),
            Invoice::Issued(i) => i.owner_id(),
        }
    }

    pub fn series_id(&self) -> SeriesId {
        match self {
            Invoice::Draft(d) => d.series_id(),
            Invoice::Issued(i) => i.series_id(),
        }
    }

    pub fn status(&self) -> InvoiceStatus {
        match self {
            Invoice::Draft(_) => InvoiceStatus::Draft,
            Invoice::Issued(_) => InvoiceStatus::Issued,
        }
    }

    /// The assigned series number; `None` until issued
    pub fn number(&self) -> Option<i64> {
        match self {
            Invoice::Draft(_) => None,
            Invoice::Issued(i) => Some(i.number()),
        }
    }

    /// The fixed display number; `None` until issued
    pub fn display_number(&self) -> Option<&str> {
        match self {
            Invoice::Draft(_) => None,
            Invoice::Issued(i) => Some(i.display_number()),
        }
    }

    pub fn items(&self) -> &[LineItem] {
        match self {
            Invoice::Draft(d) => d.items(),
            Invoice::Issued(i) => i.items(),
        }
    }

    pub fn totals(&self) -> &InvoiceTotals {
        match self {
            Invoice::Draft(d) => d.totals(),
            Invoice::Issued(i) => i.totals(),
        }
    }

    pub fn rectification(&self) -> Option<&RectificationInfo> {
        match self {
            Invoice::Draft(d) => d.rectification(),
            Invoice::Issued(i) => i.rectification(),
        }
    }

    /// True once issued; a locked invoice rejects every mutation
    pub fn is_locked(&self) -> bool {
        matches!(self, Invoice::Issued(_))
    }

    pub fn is_rectifying(&self) -> bool {
        self.rectification().is_some()
    }

    pub fn as_issued(&self) -> Option<&IssuedInvoice> {
        match self {
            Invoice::Issued(i) => Some(i),
            Invoice::Draft(_) => None,
        }
    }

    /// Unwraps the draft variant, or fails with `InvoiceLocked`
    pub fn into_draft(self) -> Result<DraftInvoice, InvoicingError> {
        match self {
            Invoice::Draft(d) => Ok(d),
            Invoice::Issued(i) => Err(InvoicingError::InvoiceLocked(format!(
                "Invoice {} was issued as {} and can no longer be modified",
                i.id(),
                i.display_number()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(quantity: Decimal, unit_price: Decimal, vat: Decimal, retention: Decimal) -> LineItemInput {
        LineItemInput {
            concept: "Accommodation management".to_string(),
            quantity,
            unit_price,
            vat_rate: vat,
            retention_rate: retention,
        }
    }

    fn draft_with(inputs: &[LineItemInput]) -> DraftInvoice {
        DraftInvoice::new(
            TenantId::new(),
            OwnerId::new(),
            SeriesId::new(),
            Currency::EUR,
            None,
            inputs,
        )
        .unwrap()
    }

    #[test]
    fn test_totals_identity_holds() {
        let draft = draft_with(&[
            line(dec!(2), dec!(100), dec!(21), dec!(15)),
            line(dec!(1), dec!(50), dec!(10), dec!(0)),
        ]);
        let t = draft.totals();

        assert_eq!(t.subtotal.amount(), dec!(250.00));
        assert_eq!(t.total_vat.amount(), dec!(47.00));
        assert_eq!(t.retention_amount.amount(), dec!(30.00));
        assert_eq!(t.total, t.subtotal + t.total_vat - t.retention_amount);
    }

    #[test]
    fn test_average_retention_rate_is_weighted() {
        // 200 at 15% plus 50 at 0% -> 30 / 250 = 12%
        let draft = draft_with(&[
            line(dec!(2), dec!(100), dec!(21), dec!(15)),
            line(dec!(1), dec!(50), dec!(10), dec!(0)),
        ]);
        assert_eq!(draft.totals().retention_rate, dec!(12));
    }

    #[test]
    fn test_draft_has_no_number() {
        let draft = draft_with(&[line(dec!(1), dec!(10), dec!(21), dec!(0))]);
        let invoice = Invoice::Draft(draft);
        assert_eq!(invoice.number(), None);
        assert_eq!(invoice.display_number(), None);
        assert!(!invoice.is_locked());
    }

    #[test]
    fn test_issue_freezes_and_numbers() {
        let draft = draft_with(&[line(dec!(2), dec!(100), dec!(21), dec!(0))]);
        let id = draft.id();
        let issued_at = Utc::now();

        let issued = draft.issue(
            SequenceNumber {
                number: 1,
                display_number: "STD-2025-0001".to_string(),
            },
            issued_at,
        );

        assert_eq!(issued.id(), id);
        assert_eq!(issued.number(), 1);
        assert_eq!(issued.display_number(), "STD-2025-0001");
        assert_eq!(issued.issued_at(), issued_at);

        let invoice = Invoice::Issued(issued);
        assert!(invoice.is_locked());
        assert_eq!(invoice.status(), InvoiceStatus::Issued);
        assert!(matches!(
            invoice.into_draft(),
            Err(InvoicingError::InvoiceLocked(_))
        ));
    }

    #[test]
    fn test_replace_items_recomputes_totals() {
        let mut draft = draft_with(&[line(dec!(1), dec!(10), dec!(21), dec!(0))]);
        draft
            .replace_items(&[line(dec!(3), dec!(100), dec!(10), dec!(0))])
            .unwrap();

        assert_eq!(draft.items().len(), 1);
        assert_eq!(draft.totals().subtotal.amount(), dec!(300.00));
        assert_eq!(draft.totals().total.amount(), dec!(330.00));
    }

    #[test]
    fn test_replace_items_rejects_empty() {
        let mut draft = draft_with(&[line(dec!(1), dec!(10), dec!(21), dec!(0))]);
        assert!(matches!(
            draft.replace_items(&[]),
            Err(InvoicingError::EmptyLineItems)
        ));
        // Original lines remain untouched after a failed replace
        assert_eq!(draft.items().len(), 1);
    }

    #[test]
    fn test_zero_subtotal_has_zero_retention_rate() {
        // Difference rectification lines can net to zero
        let draft = draft_with(&[line(dec!(1), dec!(0), dec!(21), dec!(0))]);
        assert_eq!(draft.totals().retention_rate, dec!(0));
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&InvoiceStatus::Draft).unwrap(),
            "\"DRAFT\""
        );
        assert_eq!(
            serde_json::to_string(&InvoiceStatus::Issued).unwrap(),
            "\"ISSUED\""
        );
    }
}
