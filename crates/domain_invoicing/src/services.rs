//! Invoicing application services
//!
//! `InvoicingService` orchestrates the draft/issue/rectify workflows over an
//! [`InvoicingStore`]. It owns no state of its own; all invariants that need
//! atomicity live behind the store port.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use tracing::{debug, info};

use core_kernel::{Currency, InvoiceId, OwnerId, SeriesId, TenantId};

use crate::error::InvoicingError;
use crate::invoice::{DraftInvoice, Invoice, IssuedInvoice};
use crate::line_item::LineItemInput;
use crate::ports::{InvoiceQuery, InvoicingStore};
use crate::rectification::{build_rectifying_draft, RectificationRequest};
use crate::series::{InvoiceSeries, SequenceNumber, SeriesKind};

/// Request to create a draft invoice
#[derive(Debug, Clone)]
pub struct CreateDraftInvoice {
    pub owner_id: OwnerId,
    /// Target series; when absent the tenant's default standard series for
    /// the current year is used, created on first use
    pub series_id: Option<SeriesId>,
    pub currency: Currency,
    pub due_date: Option<NaiveDate>,
    pub items: Vec<LineItemInput>,
}

/// Request to create a numbering series
#[derive(Debug, Clone)]
pub struct CreateSeries {
    pub kind: SeriesKind,
    pub name: String,
    pub prefix: String,
    pub year: i32,
}

/// Orchestrates invoicing workflows over a store port
#[derive(Clone)]
pub struct InvoicingService {
    store: Arc<dyn InvoicingStore>,
}

impl InvoicingService {
    pub fn new(store: Arc<dyn InvoicingStore>) -> Self {
        Self { store }
    }

    /// Creates a draft invoice for an owner
    ///
    /// The draft gets no number; numbers are allocated at issuance only.
    pub async fn create_draft(
        &self,
        tenant_id: TenantId,
        request: CreateDraftInvoice,
    ) -> Result<DraftInvoice, InvoicingError> {
        if !self.store.owner_exists(tenant_id, request.owner_id).await? {
            return Err(InvoicingError::OwnerNotFound(request.owner_id.to_string()));
        }

        let series = match request.series_id {
            Some(series_id) => self.store.find_series(tenant_id, series_id).await?,
            None => {
                self.store
                    .find_or_create_default_series(tenant_id, SeriesKind::Standard, current_year())
                    .await?
            }
        };

        let draft = DraftInvoice::new(
            tenant_id,
            request.owner_id,
            series.id,
            request.currency,
            request.due_date,
            &request.items,
        )?;
        let draft = self.store.insert_draft(draft).await?;

        info!(
            invoice_id = %draft.id(),
            series_id = %series.id,
            total = %draft.totals().total,
            "Draft invoice created"
        );
        Ok(draft)
    }

    /// Retrieves an invoice in either lifecycle state
    pub async fn get_invoice(
        &self,
        tenant_id: TenantId,
        invoice_id: InvoiceId,
    ) -> Result<Invoice, InvoicingError> {
        self.store.get_invoice(tenant_id, invoice_id).await
    }

    /// Lists the tenant's invoices matching the query
    pub async fn list_invoices(
        &self,
        tenant_id: TenantId,
        query: InvoiceQuery,
    ) -> Result<Vec<Invoice>, InvoicingError> {
        self.store.list_invoices(tenant_id, query).await
    }

    /// Replaces a draft's line items
    pub async fn update_draft_items(
        &self,
        tenant_id: TenantId,
        invoice_id: InvoiceId,
        items: &[LineItemInput],
    ) -> Result<DraftInvoice, InvoicingError> {
        let mut draft = self
            .store
            .get_invoice(tenant_id, invoice_id)
            .await?
            .into_draft()?;
        draft.replace_items(items)?;
        let draft = self.store.update_draft(draft).await?;

        debug!(invoice_id = %invoice_id, "Draft line items replaced");
        Ok(draft)
    }

    /// Deletes a draft; burns no number since drafts are unnumbered
    pub async fn delete_draft(
        &self,
        tenant_id: TenantId,
        invoice_id: InvoiceId,
    ) -> Result<(), InvoicingError> {
        self.store.delete_draft(tenant_id, invoice_id).await?;
        info!(invoice_id = %invoice_id, "Draft invoice deleted");
        Ok(())
    }

    /// Issues a draft: allocates the next number in its series and freezes it
    ///
    /// Allocation and transition happen atomically in the store, so two
    /// concurrent issuances in a series always receive distinct consecutive
    /// numbers.
    pub async fn issue(
        &self,
        tenant_id: TenantId,
        invoice_id: InvoiceId,
    ) -> Result<IssuedInvoice, InvoicingError> {
        let issued = self
            .store
            .issue_invoice(tenant_id, invoice_id, Utc::now())
            .await?;

        info!(
            invoice_id = %issued.id(),
            number = %issued.display_number(),
            "Invoice issued"
        );
        Ok(issued)
    }

    /// Returns the number a draft would receive if issued now
    ///
    /// Purely informational; a concurrent issuance can take the number
    /// between the preview and the actual issue.
    pub async fn preview_issue(
        &self,
        tenant_id: TenantId,
        invoice_id: InvoiceId,
    ) -> Result<SequenceNumber, InvoicingError> {
        let invoice = self.store.get_invoice(tenant_id, invoice_id).await?;
        if let Some(issued) = invoice.as_issued() {
            return Err(InvoicingError::invalid_state(format!(
                "Invoice {} is already issued as {}",
                issued.id(),
                issued.display_number()
            )));
        }
        self.store
            .peek_next_number(tenant_id, invoice.series_id())
            .await
    }

    /// Creates a rectifying invoice against an issued original
    ///
    /// The rectifying draft lands in the tenant's rectifying series for the
    /// current year and is optionally issued in the same call.
    pub async fn rectify(
        &self,
        tenant_id: TenantId,
        original_id: InvoiceId,
        request: RectificationRequest,
    ) -> Result<Invoice, InvoicingError> {
        let original = self
            .store
            .get_invoice(tenant_id, original_id)
            .await
            .map_err(|e| match e {
                InvoicingError::InvoiceNotFound(id) => InvoicingError::OriginalNotFound(id),
                other => other,
            })?;
        let original = original
            .as_issued()
            .ok_or_else(|| InvoicingError::OriginalNotIssued(original_id.to_string()))?;

        let series = self
            .store
            .find_or_create_default_series(tenant_id, SeriesKind::Rectifying, current_year())
            .await?;

        let draft = build_rectifying_draft(original, series.id, &request)?;
        let draft = self.store.insert_draft(draft).await?;

        info!(
            invoice_id = %draft.id(),
            rectifies = %original_id,
            kind = ?request.kind,
            "Rectifying invoice created"
        );

        if request.issue_immediately {
            let issued = self
                .store
                .issue_invoice(tenant_id, draft.id(), Utc::now())
                .await?;
            info!(
                invoice_id = %issued.id(),
                number = %issued.display_number(),
                "Rectifying invoice issued"
            );
            Ok(Invoice::Issued(issued))
        } else {
            Ok(Invoice::Draft(draft))
        }
    }

    /// Creates a numbering series
    pub async fn create_series(
        &self,
        tenant_id: TenantId,
        request: CreateSeries,
    ) -> Result<InvoiceSeries, InvoicingError> {
        if request.name.trim().is_empty() {
            return Err(InvoicingError::validation("Series name must not be empty"));
        }
        if request.prefix.trim().is_empty() {
            return Err(InvoicingError::validation(
                "Series prefix must not be empty",
            ));
        }

        let series = InvoiceSeries::new(
            tenant_id,
            request.kind,
            request.name.trim(),
            request.prefix.trim(),
            request.year,
        );
        let series = self.store.insert_series(series).await?;

        info!(series_id = %series.id, prefix = %series.prefix, "Series created");
        Ok(series)
    }

    /// Lists the tenant's numbering series
    pub async fn list_series(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<InvoiceSeries>, InvoicingError> {
        self.store.list_series(tenant_id).await
    }
}

fn current_year() -> i32 {
    Utc::now().year()
}
