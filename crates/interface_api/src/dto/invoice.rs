//! Invoice DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::Currency;
use domain_invoicing::{
    Invoice, InvoiceStatus, InvoiceTotals, LineItem, LineItemInput, RectificationInfo,
    RectificationKind, SequenceNumber,
};

#[derive(Debug, Deserialize)]
pub struct LineItemRequest {
    pub concept: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub vat_rate: Decimal,
    #[serde(default)]
    pub retention_rate: Decimal,
}

impl From<LineItemRequest> for LineItemInput {
    fn from(req: LineItemRequest) -> Self {
        LineItemInput {
            concept: req.concept,
            quantity: req.quantity,
            unit_price: req.unit_price,
            vat_rate: req.vat_rate,
            retention_rate: req.retention_rate,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    pub owner_id: Uuid,
    pub series_id: Option<Uuid>,
    #[serde(default)]
    pub currency: Currency,
    pub due_date: Option<NaiveDate>,
    pub items: Vec<LineItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemsRequest {
    pub items: Vec<LineItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct RectifyRequest {
    pub kind: RectificationKind,
    pub reason: String,
    pub items: Vec<LineItemRequest>,
    #[serde(default)]
    pub issue_immediately: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct ListInvoicesQuery {
    pub status: Option<InvoiceStatus>,
    pub series_id: Option<Uuid>,
    pub rectifying: Option<bool>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct LineItemResponse {
    pub concept: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub vat_rate: Decimal,
    pub retention_rate: Decimal,
    pub position: u32,
    pub base: Decimal,
    pub vat: Decimal,
    pub retention: Decimal,
    pub total: Decimal,
}

impl From<&LineItem> for LineItemResponse {
    fn from(line: &LineItem) -> Self {
        Self {
            concept: line.concept.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price.amount(),
            vat_rate: line.vat_rate.as_percentage(),
            retention_rate: line.retention_rate.as_percentage(),
            position: line.position,
            base: line.base.amount(),
            vat: line.vat.amount(),
            retention: line.retention.amount(),
            total: line.total.amount(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TotalsResponse {
    pub subtotal: Decimal,
    pub total_vat: Decimal,
    /// Weighted average retention percentage, rounded for display
    pub retention_rate: Decimal,
    pub retention_amount: Decimal,
    pub total: Decimal,
}

impl From<&InvoiceTotals> for TotalsResponse {
    fn from(totals: &InvoiceTotals) -> Self {
        Self {
            subtotal: totals.subtotal.amount(),
            total_vat: totals.total_vat.amount(),
            retention_rate: totals.retention_rate.round_dp(2),
            retention_amount: totals.retention_amount.amount(),
            total: totals.total.amount(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RectificationResponse {
    pub kind: RectificationKind,
    pub reason: String,
    pub rectifies: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_total: Option<Decimal>,
}

impl From<&RectificationInfo> for RectificationResponse {
    fn from(info: &RectificationInfo) -> Self {
        Self {
            kind: info.kind,
            reason: info.reason.clone(),
            rectifies: info.rectifies.into(),
            original_total: info.original_total.map(|m| m.amount()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub id: Uuid,
    pub status: InvoiceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_number: Option<String>,
    pub owner_id: Uuid,
    pub series_id: Uuid,
    pub issue_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<DateTime<Utc>>,
    pub items: Vec<LineItemResponse>,
    pub totals: TotalsResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rectification: Option<RectificationResponse>,
}

impl From<&Invoice> for InvoiceResponse {
    fn from(invoice: &Invoice) -> Self {
        let (issue_date, due_date, issued_at) = match invoice {
            Invoice::Draft(d) => (d.issue_date(), d.due_date(), None),
            Invoice::Issued(i) => (i.issue_date(), i.due_date(), Some(i.issued_at())),
        };

        Self {
            id: invoice.id().into(),
            status: invoice.status(),
            number: invoice.number(),
            display_number: invoice.display_number().map(str::to_string),
            owner_id: invoice.owner_id().into(),
            series_id: invoice.series_id().into(),
            issue_date,
            due_date,
            issued_at,
            items: invoice.items().iter().map(LineItemResponse::from).collect(),
            totals: invoice.totals().into(),
            rectification: invoice.rectification().map(RectificationResponse::from),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NextNumberResponse {
    pub number: i64,
    pub display_number: String,
}

impl From<SequenceNumber> for NextNumberResponse {
    fn from(seq: SequenceNumber) -> Self {
        Self {
            number: seq.number,
            display_number: seq.display_number,
        }
    }
}
