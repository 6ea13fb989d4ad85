//! Invoicing Domain Ports
//!
//! The `InvoicingStore` trait defines everything the invoicing domain needs
//! from its persistence layer. Adapters implement it over PostgreSQL
//! (infra_db) or in memory (the mock below, for tests).
//!
//! The one contract every adapter must honor: `issue_invoice` performs the
//! number allocation and the DRAFT→ISSUED transition as a single atomic
//! unit, so concurrent issuances in a series can never observe the same
//! number and a failed issuance never burns one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use core_kernel::{InvoiceId, OwnerId, SeriesId, TenantId};

use crate::error::InvoicingError;
use crate::invoice::{DraftInvoice, Invoice, InvoiceStatus, IssuedInvoice};
use crate::series::{InvoiceSeries, SequenceNumber, SeriesKind};

/// Query parameters for listing invoices
#[derive(Debug, Clone, Default)]
pub struct InvoiceQuery {
    /// Filter by lifecycle status
    pub status: Option<InvoiceStatus>,
    /// Filter by numbering series
    pub series_id: Option<SeriesId>,
    /// Filter rectifying invoices in (true) or out (false)
    pub rectifying: Option<bool>,
    /// Limit results
    pub limit: Option<u32>,
    /// Offset for pagination
    pub offset: Option<u32>,
}

impl InvoiceQuery {
    /// Creates a query filtered to one status
    pub fn by_status(status: InvoiceStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Adds pagination to the query
    pub fn paginate(mut self, limit: u32, offset: u32) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }
}

/// Persistence port for the invoicing domain
///
/// Every method is tenant-scoped: an entity belonging to another tenant is
/// indistinguishable from one that does not exist.
#[async_trait]
pub trait InvoicingStore: Send + Sync {
    /// Checks that an owner exists in the tenant's directory
    async fn owner_exists(&self, tenant_id: TenantId, owner_id: OwnerId)
        -> Result<bool, InvoicingError>;

    /// Persists a new series
    async fn insert_series(&self, series: InvoiceSeries) -> Result<InvoiceSeries, InvoicingError>;

    /// Retrieves a series by id
    async fn find_series(
        &self,
        tenant_id: TenantId,
        series_id: SeriesId,
    ) -> Result<InvoiceSeries, InvoicingError>;

    /// Finds the tenant's series for a kind and year, creating the default
    /// one on first use
    async fn find_or_create_default_series(
        &self,
        tenant_id: TenantId,
        kind: SeriesKind,
        year: i32,
    ) -> Result<InvoiceSeries, InvoicingError>;

    /// Lists all of the tenant's series
    async fn list_series(&self, tenant_id: TenantId) -> Result<Vec<InvoiceSeries>, InvoicingError>;

    /// Returns the number the next issuance in a series would receive,
    /// without consuming it
    async fn peek_next_number(
        &self,
        tenant_id: TenantId,
        series_id: SeriesId,
    ) -> Result<SequenceNumber, InvoicingError>;

    /// Persists a new draft
    async fn insert_draft(&self, draft: DraftInvoice) -> Result<DraftInvoice, InvoicingError>;

    /// Retrieves an invoice in either lifecycle state
    async fn get_invoice(
        &self,
        tenant_id: TenantId,
        invoice_id: InvoiceId,
    ) -> Result<Invoice, InvoicingError>;

    /// Lists the tenant's invoices matching the query, newest first
    async fn list_invoices(
        &self,
        tenant_id: TenantId,
        query: InvoiceQuery,
    ) -> Result<Vec<Invoice>, InvoicingError>;

    /// Replaces a stored draft with an updated one
    ///
    /// Fails with `InvoiceLocked` when the stored invoice has been issued in
    /// the meantime.
    async fn update_draft(&self, draft: DraftInvoice) -> Result<DraftInvoice, InvoicingError>;

    /// Deletes a draft; issued invoices cannot be deleted
    async fn delete_draft(
        &self,
        tenant_id: TenantId,
        invoice_id: InvoiceId,
    ) -> Result<(), InvoicingError>;

    /// Atomically allocates the next number in the draft's series and
    /// transitions the draft to ISSUED
    ///
    /// Fails with `InvalidState` when the invoice is already issued; the
    /// series counter is left untouched in every failure case.
    async fn issue_invoice(
        &self,
        tenant_id: TenantId,
        invoice_id: InvoiceId,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedInvoice, InvoicingError>;
}

/// In-memory implementation of `InvoicingStore` for testing
///
/// A single mutex guards all state, which trivially gives `issue_invoice`
/// the atomicity the trait demands.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use tokio::sync::Mutex;

    #[derive(Debug, Default)]
    struct Inner {
        owners: HashSet<(TenantId, OwnerId)>,
        series: HashMap<SeriesId, InvoiceSeries>,
        invoices: HashMap<InvoiceId, Invoice>,
    }

    /// In-memory invoicing store
    #[derive(Debug, Default)]
    pub struct MemoryInvoicingStore {
        inner: Mutex<Inner>,
    }

    impl MemoryInvoicingStore {
        /// Creates an empty store
        pub fn new() -> Self {
            Self::default()
        }

        /// Registers an owner in a tenant's directory
        pub async fn register_owner(&self, tenant_id: TenantId, owner_id: OwnerId) {
            self.inner.lock().await.owners.insert((tenant_id, owner_id));
        }

        /// Creates a store pre-populated with one owner
        pub async fn with_owner(tenant_id: TenantId, owner_id: OwnerId) -> Self {
            let store = Self::new();
            store.register_owner(tenant_id, owner_id).await;
            store
        }
    }

    #[async_trait]
    impl InvoicingStore for MemoryInvoicingStore {
        async fn owner_exists(
            &self,
            tenant_id: TenantId,
            owner_id: OwnerId,
        ) -> Result<bool, InvoicingError> {
            Ok(self.inner.lock().await.owners.contains(&(tenant_id, owner_id)))
        }

        async fn insert_series(
            &self,
            series: InvoiceSeries,
        ) -> Result<InvoiceSeries, InvoicingError> {
            self.inner
                .lock()
                .await
                .series
                .insert(series.id, series.clone());
            Ok(series)
        }

        async fn find_series(
            &self,
            tenant_id: TenantId,
            series_id: SeriesId,
        ) -> Result<InvoiceSeries, InvoicingError> {
            self.inner
                .lock()
                .await
                .series
                .get(&series_id)
                .filter(|s| s.tenant_id == tenant_id)
                .cloned()
                .ok_or_else(|| InvoicingError::SeriesNotFound(series_id.to_string()))
        }

        async fn find_or_create_default_series(
            &self,
            tenant_id: TenantId,
            kind: SeriesKind,
            year: i32,
        ) -> Result<InvoiceSeries, InvoicingError> {
            let mut inner = self.inner.lock().await;
            if let Some(series) = inner
                .series
                .values()
                .find(|s| s.tenant_id == tenant_id && s.kind == kind && s.year == year)
            {
                return Ok(series.clone());
            }
            let series = InvoiceSeries::default_for(tenant_id, kind, year);
            inner.series.insert(series.id, series.clone());
            Ok(series)
        }

        async fn list_series(
            &self,
            tenant_id: TenantId,
        ) -> Result<Vec<InvoiceSeries>, InvoicingError> {
            let inner = self.inner.lock().await;
            let mut series: Vec<_> = inner
                .series
                .values()
                .filter(|s| s.tenant_id == tenant_id)
                .cloned()
                .collect();
            series.sort_by_key(|s| s.created_at);
            Ok(series)
        }

        async fn peek_next_number(
            &self,
            tenant_id: TenantId,
            series_id: SeriesId,
        ) -> Result<SequenceNumber, InvoicingError> {
            let inner = self.inner.lock().await;
            inner
                .series
                .get(&series_id)
                .filter(|s| s.tenant_id == tenant_id)
                .map(|s| s.peek_next())
                .ok_or_else(|| InvoicingError::SeriesNotFound(series_id.to_string()))
        }

        async fn insert_draft(
            &self,
            draft: DraftInvoice,
        ) -> Result<DraftInvoice, InvoicingError> {
            self.inner
                .lock()
                .await
                .invoices
                .insert(draft.id(), Invoice::Draft(draft.clone()));
            Ok(draft)
        }

        async fn get_invoice(
            &self,
            tenant_id: TenantId,
            invoice_id: InvoiceId,
        ) -> Result<Invoice, InvoicingError> {
            self.inner
                .lock()
                .await
                .invoices
                .get(&invoice_id)
                .filter(|i| i.tenant_id() == tenant_id)
                .cloned()
                .ok_or_else(|| InvoicingError::InvoiceNotFound(invoice_id.to_string()))
        }

        async fn list_invoices(
            &self,
            tenant_id: TenantId,
            query: InvoiceQuery,
        ) -> Result<Vec<Invoice>, InvoicingError> {
            let inner = self.inner.lock().await;
            let mut invoices: Vec<_> = inner
                .invoices
                .values()
                .filter(|i| i.tenant_id() == tenant_id)
                .filter(|i| query.status.map_or(true, |s| i.status() == s))
                .filter(|i| query.series_id.map_or(true, |s| i.series_id() == s))
                .filter(|i| query.rectifying.map_or(true, |r| i.is_rectifying() == r))
                .cloned()
                .collect();
            invoices.sort_by(|a, b| b.id().cmp(&a.id()));

            if let Some(offset) = query.offset {
                invoices = invoices.into_iter().skip(offset as usize).collect();
            }
            if let Some(limit) = query.limit {
                invoices.truncate(limit as usize);
            }
            Ok(invoices)
        }

        async fn update_draft(
            &self,
            draft: DraftInvoice,
        ) -> Result<DraftInvoice, InvoicingError> {
            let mut inner = self.inner.lock().await;
            match inner.invoices.get(&draft.id()) {
                Some(Invoice::Draft(stored)) if stored.tenant_id() == draft.tenant_id() => {
                    inner
                        .invoices
                        .insert(draft.id(), Invoice::Draft(draft.clone()));
                    Ok(draft)
                }
                Some(Invoice::Issued(issued)) if issued.tenant_id() == draft.tenant_id() => {
                    Err(InvoicingError::InvoiceLocked(format!(
                        "Invoice {} was issued as {} and can no longer be modified",
                        issued.id(),
                        issued.display_number()
                    )))
                }
                _ => Err(InvoicingError::InvoiceNotFound(draft.id().to_string())),
            }
        }

        async fn delete_draft(
            &self,
            tenant_id: TenantId,
            invoice_id: InvoiceId,
        ) -> Result<(), InvoicingError> {
            let mut inner = self.inner.lock().await;
            match inner.invoices.get(&invoice_id) {
                Some(invoice) if invoice.tenant_id() == tenant_id => {
                    if invoice.is_locked() {
                        return Err(InvoicingError::InvoiceLocked(format!(
                            "Invoice {invoice_id} is issued and cannot be deleted"
                        )));
                    }
                    inner.invoices.remove(&invoice_id);
                    Ok(())
                }
                _ => Err(InvoicingError::InvoiceNotFound(invoice_id.to_string())),
            }
        }

        async fn issue_invoice(
            &self,
            tenant_id: TenantId,
            invoice_id: InvoiceId,
            issued_at: DateTime<Utc>,
        ) -> Result<IssuedInvoice, InvoicingError> {
            // The lock is held across allocation and transition, which is the
            // whole atomicity story for this adapter.
            let mut inner = self.inner.lock().await;

            let draft = match inner.invoices.get(&invoice_id) {
                Some(Invoice::Draft(d)) if d.tenant_id() == tenant_id => d.clone(),
                Some(Invoice::Issued(i)) if i.tenant_id() == tenant_id => {
                    return Err(InvoicingError::invalid_state(format!(
                        "Invoice {} is already issued as {}",
                        i.id(),
                        i.display_number()
                    )));
                }
                _ => return Err(InvoicingError::InvoiceNotFound(invoice_id.to_string())),
            };

            let series = inner
                .series
                .get_mut(&draft.series_id())
                .filter(|s| s.tenant_id == tenant_id)
                .ok_or_else(|| InvoicingError::SeriesNotFound(draft.series_id().to_string()))?;
            let seq = series.allocate_next();

            let issued = draft.issue(seq, issued_at);
            inner
                .invoices
                .insert(invoice_id, Invoice::Issued(issued.clone()));
            Ok(issued)
        }
    }

}
