//! Test Fixtures
//!
//! Pre-built test data for common invoicing entities.

use chrono::Utc;
use rust_decimal_macros::dec;
use std::sync::Arc;

use core_kernel::{Currency, OwnerId, SeriesId, TenantId};
use domain_invoicing::ports::mock::MemoryInvoicingStore;
use domain_invoicing::{
    DraftInvoice, InvoiceSeries, InvoicingService, IssuedInvoice, LineItemInput, SeriesKind,
};

/// A standard one-line invoice input: 2 × 100.00 at 21% VAT
pub fn standard_line() -> LineItemInput {
    LineItemInput {
        concept: "Monthly management fee".to_string(),
        quantity: dec!(2),
        unit_price: dec!(100),
        vat_rate: dec!(21),
        retention_rate: dec!(0),
    }
}

/// A line carrying the company-owner retention: 1000.00 at 21% VAT, 15% retention
pub fn retention_line() -> LineItemInput {
    LineItemInput {
        concept: "Owner settlement".to_string(),
        quantity: dec!(1),
        unit_price: dec!(1000),
        vat_rate: dec!(21),
        retention_rate: dec!(15),
    }
}

/// A negative delta line for difference rectifications
pub fn delta_line(unit_price: rust_decimal::Decimal) -> LineItemInput {
    LineItemInput {
        concept: "Fee correction".to_string(),
        quantity: dec!(1),
        unit_price,
        vat_rate: dec!(21),
        retention_rate: dec!(0),
    }
}

/// A standard series for 2025 with its counter at zero
pub fn standard_series(tenant_id: TenantId) -> InvoiceSeries {
    InvoiceSeries::default_for(tenant_id, SeriesKind::Standard, 2025)
}

/// A rectifying series for 2025 with its counter at zero
pub fn rectifying_series(tenant_id: TenantId) -> InvoiceSeries {
    InvoiceSeries::default_for(tenant_id, SeriesKind::Rectifying, 2025)
}

/// A draft invoice with the standard line
pub fn standard_draft(tenant_id: TenantId, owner_id: OwnerId, series_id: SeriesId) -> DraftInvoice {
    DraftInvoice::new(
        tenant_id,
        owner_id,
        series_id,
        Currency::EUR,
        None,
        &[standard_line()],
    )
    .expect("standard draft fixture must be valid")
}

/// An issued invoice numbered from the given series
pub fn issued_invoice(
    tenant_id: TenantId,
    owner_id: OwnerId,
    series: &mut InvoiceSeries,
) -> IssuedInvoice {
    standard_draft(tenant_id, owner_id, series.id).issue(series.allocate_next(), Utc::now())
}

/// An invoicing service over a fresh in-memory store with one known owner
pub async fn mock_service() -> (InvoicingService, TenantId, OwnerId) {
    let tenant = TenantId::new();
    let owner = OwnerId::new();
    let store = MemoryInvoicingStore::with_owner(tenant, owner).await;
    (InvoicingService::new(Arc::new(store)), tenant, owner)
}
