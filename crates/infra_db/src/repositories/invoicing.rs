//! PostgreSQL invoicing store
//!
//! Implements `InvoicingStore` over PostgreSQL. Invoices are stored as JSONB
//! documents alongside a queryable projection (tenant, series, status,
//! number); series and owners are plain relational rows.
//!
//! The atomicity contract of `issue_invoice` is met with a single
//! transaction: the invoice row is locked, the series counter is advanced
//! with `UPDATE .. RETURNING`, and the frozen document is written back. A
//! unique index on `(series_id, number)` backstops the whole scheme.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use core_kernel::{InvoiceId, OwnerId, SeriesId, TenantId};
use domain_invoicing::{
    DraftInvoice, Invoice, InvoiceQuery, InvoiceSeries, InvoiceStatus, InvoicingError,
    InvoicingStore, IssuedInvoice, SequenceNumber, SeriesKind,
};

use crate::error::DatabaseError;

#[derive(Debug, FromRow)]
struct SeriesRow {
    id: Uuid,
    tenant_id: Uuid,
    kind: String,
    name: String,
    prefix: String,
    year: i32,
    current_number: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SeriesRow {
    fn into_series(self) -> Result<InvoiceSeries, InvoicingError> {
        Ok(InvoiceSeries {
            id: SeriesId::from(self.id),
            tenant_id: TenantId::from(self.tenant_id),
            kind: kind_from_str(&self.kind)?,
            name: self.name,
            prefix: self.prefix,
            year: self.year,
            current_number: self.current_number,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct InvoiceDocRow {
    doc: Value,
}

fn kind_to_str(kind: SeriesKind) -> &'static str {
    match kind {
        SeriesKind::Standard => "STANDARD",
        SeriesKind::Rectifying => "RECTIFYING",
    }
}

fn kind_from_str(s: &str) -> Result<SeriesKind, InvoicingError> {
    match s {
        "STANDARD" => Ok(SeriesKind::Standard),
        "RECTIFYING" => Ok(SeriesKind::Rectifying),
        other => Err(InvoicingError::store(format!(
            "Unknown series kind in database: {other}"
        ))),
    }
}

fn status_to_str(status: InvoiceStatus) -> &'static str {
    match status {
        InvoiceStatus::Draft => "DRAFT",
        InvoiceStatus::Issued => "ISSUED",
    }
}

fn decode_invoice(doc: Value) -> Result<Invoice, InvoicingError> {
    serde_json::from_value(doc)
        .map_err(|e| DatabaseError::DecodeFailed(e.to_string()).into())
}

fn encode_invoice(invoice: &Invoice) -> Result<Value, InvoicingError> {
    serde_json::to_value(invoice)
        .map_err(|e| DatabaseError::DecodeFailed(e.to_string()).into())
}

/// `InvoicingStore` backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PostgresInvoicingStore {
    pool: PgPool,
}

impl PostgresInvoicingStore {
    /// Creates a new store with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Adds an owner to a tenant's directory
    ///
    /// Owner management proper lives outside this crate; this exists for
    /// provisioning and test seeding.
    pub async fn insert_owner(
        &self,
        tenant_id: TenantId,
        owner_id: OwnerId,
        name: &str,
    ) -> Result<(), InvoicingError> {
        sqlx::query("INSERT INTO owners (id, tenant_id, name) VALUES ($1, $2, $3)")
            .bind(Uuid::from(owner_id))
            .bind(Uuid::from(tenant_id))
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from)?;
        Ok(())
    }

    async fn insert_series_row(
        &self,
        series: &InvoiceSeries,
        is_default: bool,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO invoice_series (
                id, tenant_id, kind, name, prefix, year,
                current_number, is_default, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(Uuid::from(series.id))
        .bind(Uuid::from(series.tenant_id))
        .bind(kind_to_str(series.kind))
        .bind(&series.name)
        .bind(&series.prefix)
        .bind(series.year)
        .bind(series.current_number)
        .bind(is_default)
        .bind(series.created_at)
        .bind(series.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_default_series(
        &self,
        tenant_id: TenantId,
        kind: SeriesKind,
        year: i32,
    ) -> Result<Option<InvoiceSeries>, InvoicingError> {
        let row = sqlx::query_as::<_, SeriesRow>(
            r#"
            SELECT id, tenant_id, kind, name, prefix, year,
                   current_number, created_at, updated_at
            FROM invoice_series
            WHERE tenant_id = $1 AND kind = $2 AND year = $3
            ORDER BY is_default DESC, created_at ASC
            LIMIT 1
            "#,
        )
        .bind(Uuid::from(tenant_id))
        .bind(kind_to_str(kind))
        .bind(year)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        row.map(SeriesRow::into_series).transpose()
    }
}

#[async_trait]
impl InvoicingStore for PostgresInvoicingStore {
    async fn owner_exists(
        &self,
        tenant_id: TenantId,
        owner_id: OwnerId,
    ) -> Result<bool, InvoicingError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM owners WHERE id = $1 AND tenant_id = $2)",
        )
        .bind(Uuid::from(owner_id))
        .bind(Uuid::from(tenant_id))
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from)?;
        Ok(exists)
    }

    async fn insert_series(&self, series: InvoiceSeries) -> Result<InvoiceSeries, InvoicingError> {
        self.insert_series_row(&series, false).await?;
        Ok(series)
    }

    async fn find_series(
        &self,
        tenant_id: TenantId,
        series_id: SeriesId,
    ) -> Result<InvoiceSeries, InvoicingError> {
        let row = sqlx::query_as::<_, SeriesRow>(
            r#"
            SELECT id, tenant_id, kind, name, prefix, year,
                   current_number, created_at, updated_at
            FROM invoice_series
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(Uuid::from(series_id))
        .bind(Uuid::from(tenant_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?
        .ok_or_else(|| InvoicingError::SeriesNotFound(series_id.to_string()))?;

        row.into_series()
    }

    async fn find_or_create_default_series(
        &self,
        tenant_id: TenantId,
        kind: SeriesKind,
        year: i32,
    ) -> Result<InvoiceSeries, InvoicingError> {
        if let Some(series) = self.find_default_series(tenant_id, kind, year).await? {
            return Ok(series);
        }

        let series = InvoiceSeries::default_for(tenant_id, kind, year);
        let inserted = sqlx::query(
            r#"
            INSERT INTO invoice_series (
                id, tenant_id, kind, name, prefix, year,
                current_number, is_default, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, $8, $9)
            ON CONFLICT (tenant_id, kind, year) WHERE is_default DO NOTHING
            "#,
        )
        .bind(Uuid::from(series.id))
        .bind(Uuid::from(series.tenant_id))
        .bind(kind_to_str(series.kind))
        .bind(&series.name)
        .bind(&series.prefix)
        .bind(series.year)
        .bind(series.current_number)
        .bind(series.created_at)
        .bind(series.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        if inserted.rows_affected() == 1 {
            debug!(series_id = %series.id, kind = ?kind, year, "Default series created");
            return Ok(series);
        }

        // Lost the creation race; the winner's row is there now.
        self.find_default_series(tenant_id, kind, year)
            .await?
            .ok_or_else(|| {
                InvoicingError::store("Default series vanished after conflicting insert")
            })
    }

    async fn list_series(&self, tenant_id: TenantId) -> Result<Vec<InvoiceSeries>, InvoicingError> {
        let rows = sqlx::query_as::<_, SeriesRow>(
            r#"
            SELECT id, tenant_id, kind, name, prefix, year,
                   current_number, created_at, updated_at
            FROM invoice_series
            WHERE tenant_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(Uuid::from(tenant_id))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        rows.into_iter().map(SeriesRow::into_series).collect()
    }

    async fn peek_next_number(
        &self,
        tenant_id: TenantId,
        series_id: SeriesId,
    ) -> Result<SequenceNumber, InvoicingError> {
        let series = self.find_series(tenant_id, series_id).await?;
        Ok(series.peek_next())
    }

    async fn insert_draft(&self, draft: DraftInvoice) -> Result<DraftInvoice, InvoicingError> {
        let created_at = draft.created_at();
        let updated_at = draft.updated_at();
        let invoice = Invoice::Draft(draft);
        let doc = encode_invoice(&invoice)?;

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, tenant_id, owner_id, series_id, status,
                number, display_number, rectifies, doc, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, 'DRAFT', NULL, NULL, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::from(invoice.id()))
        .bind(Uuid::from(invoice.tenant_id()))
        .bind(Uuid::from(invoice.owner_id()))
        .bind(Uuid::from(invoice.series_id()))
        .bind(invoice.rectification().map(|r| Uuid::from(r.rectifies)))
        .bind(&doc)
        .bind(created_at)
        .bind(updated_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        match invoice {
            Invoice::Draft(draft) => Ok(draft),
            Invoice::Issued(_) => unreachable!("inserted variant is a draft"),
        }
    }

    async fn get_invoice(
        &self,
        tenant_id: TenantId,
        invoice_id: InvoiceId,
    ) -> Result<Invoice, InvoicingError> {
        let row = sqlx::query_as::<_, InvoiceDocRow>(
            "SELECT doc FROM invoices WHERE id = $1 AND tenant_id = $2",
        )
        .bind(Uuid::from(invoice_id))
        .bind(Uuid::from(tenant_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?
        .ok_or_else(|| InvoicingError::InvoiceNotFound(invoice_id.to_string()))?;

        decode_invoice(row.doc)
    }

    async fn list_invoices(
        &self,
        tenant_id: TenantId,
        query: InvoiceQuery,
    ) -> Result<Vec<Invoice>, InvoicingError> {
        let rows = sqlx::query_as::<_, InvoiceDocRow>(
            r#"
            SELECT doc
            FROM invoices
            WHERE tenant_id = $1
              AND ($2::text IS NULL OR status = $2)
              AND ($3::uuid IS NULL OR series_id = $3)
              AND ($4::boolean IS NULL OR (rectifies IS NOT NULL) = $4)
            ORDER BY created_at DESC, id DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(Uuid::from(tenant_id))
        .bind(query.status.map(status_to_str))
        .bind(query.series_id.map(Uuid::from))
        .bind(query.rectifying)
        .bind(query.limit.map(i64::from))
        .bind(query.offset.map(i64::from).unwrap_or(0))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        rows.into_iter().map(|r| decode_invoice(r.doc)).collect()
    }

    async fn update_draft(&self, draft: DraftInvoice) -> Result<DraftInvoice, InvoicingError> {
        let invoice_id = draft.id();
        let tenant_id = draft.tenant_id();
        let updated_at = draft.updated_at();
        let invoice = Invoice::Draft(draft);
        let doc = encode_invoice(&invoice)?;

        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET doc = $3, updated_at = $4
            WHERE id = $1 AND tenant_id = $2 AND status = 'DRAFT'
            "#,
        )
        .bind(Uuid::from(invoice_id))
        .bind(Uuid::from(tenant_id))
        .bind(&doc)
        .bind(updated_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        if result.rows_affected() == 0 {
            return Err(self.classify_missing_draft(tenant_id, invoice_id).await);
        }

        match invoice {
            Invoice::Draft(draft) => Ok(draft),
            Invoice::Issued(_) => unreachable!("updated variant is a draft"),
        }
    }

    async fn delete_draft(
        &self,
        tenant_id: TenantId,
        invoice_id: InvoiceId,
    ) -> Result<(), InvoicingError> {
        let result = sqlx::query(
            "DELETE FROM invoices WHERE id = $1 AND tenant_id = $2 AND status = 'DRAFT'",
        )
        .bind(Uuid::from(invoice_id))
        .bind(Uuid::from(tenant_id))
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        if result.rows_affected() == 0 {
            return Err(self.classify_missing_draft(tenant_id, invoice_id).await);
        }
        Ok(())
    }

    async fn issue_invoice(
        &self,
        tenant_id: TenantId,
        invoice_id: InvoiceId,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedInvoice, InvoicingError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        // Lock the invoice row first, then the series row; every issuance
        // takes locks in this order.
        let row = sqlx::query_as::<_, InvoiceDocRow>(
            "SELECT doc FROM invoices WHERE id = $1 AND tenant_id = $2 FOR UPDATE",
        )
        .bind(Uuid::from(invoice_id))
        .bind(Uuid::from(tenant_id))
        .fetch_optional(&mut *tx)
        .await
        .map_err(DatabaseError::from)?
        .ok_or_else(|| InvoicingError::InvoiceNotFound(invoice_id.to_string()))?;

        let draft = match decode_invoice(row.doc)? {
            Invoice::Draft(draft) => draft,
            Invoice::Issued(issued) => {
                return Err(InvoicingError::invalid_state(format!(
                    "Invoice {} is already issued as {}",
                    issued.id(),
                    issued.display_number()
                )));
            }
        };

        let series_row = sqlx::query_as::<_, SeriesRow>(
            r#"
            UPDATE invoice_series
            SET current_number = current_number + 1, updated_at = $3
            WHERE id = $1 AND tenant_id = $2
            RETURNING id, tenant_id, kind, name, prefix, year,
                      current_number, created_at, updated_at
            "#,
        )
        .bind(Uuid::from(draft.series_id()))
        .bind(Uuid::from(tenant_id))
        .bind(issued_at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(DatabaseError::from)?
        .ok_or_else(|| InvoicingError::SeriesNotFound(draft.series_id().to_string()))?;

        let series = series_row.into_series()?;
        let seq = SequenceNumber {
            number: series.current_number,
            display_number: series.display_number(series.current_number),
        };

        let issued = draft.issue(seq, issued_at);
        let doc = encode_invoice(&Invoice::Issued(issued.clone()))?;

        sqlx::query(
            r#"
            UPDATE invoices
            SET status = 'ISSUED', number = $3, display_number = $4,
                doc = $5, updated_at = $6
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(Uuid::from(invoice_id))
        .bind(Uuid::from(tenant_id))
        .bind(issued.number())
        .bind(issued.display_number())
        .bind(&doc)
        .bind(issued_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from(e).into_allocation_error())?;

        tx.commit()
            .await
            .map_err(|e| DatabaseError::from(e).into_allocation_error())?;
        Ok(issued)
    }
}

impl PostgresInvoicingStore {
    /// Distinguishes a missing draft from one issued in the meantime
    async fn classify_missing_draft(
        &self,
        tenant_id: TenantId,
        invoice_id: InvoiceId,
    ) -> InvoicingError {
        let status: Result<Option<String>, _> =
            sqlx::query_scalar("SELECT status FROM invoices WHERE id = $1 AND tenant_id = $2")
                .bind(Uuid::from(invoice_id))
                .bind(Uuid::from(tenant_id))
                .fetch_optional(&self.pool)
                .await;

        match status {
            Ok(Some(_)) => InvoicingError::InvoiceLocked(format!(
                "Invoice {invoice_id} has been issued and can no longer be modified"
            )),
            Ok(None) => InvoicingError::InvoiceNotFound(invoice_id.to_string()),
            Err(e) => DatabaseError::from(e).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [SeriesKind::Standard, SeriesKind::Rectifying] {
            assert_eq!(kind_from_str(kind_to_str(kind)).unwrap(), kind);
        }
        assert!(kind_from_str("WEEKLY").is_err());
    }

    #[test]
    fn test_status_strings_match_schema_check() {
        assert_eq!(status_to_str(InvoiceStatus::Draft), "DRAFT");
        assert_eq!(status_to_str(InvoiceStatus::Issued), "ISSUED");
    }
}
