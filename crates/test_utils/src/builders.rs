//! Test Data Builders
//!
//! Builder patterns for constructing invoicing test data with sensible
//! defaults and fluent overrides.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{Currency, OwnerId, SeriesId, TenantId};
use domain_invoicing::{
    DraftInvoice, InvoiceSeries, InvoicingError, LineItemInput, SeriesKind,
};

/// Builder for draft invoices
///
/// # Example
///
/// ```rust
/// use test_utils::builders::DraftInvoiceBuilder;
/// use rust_decimal_macros::dec;
///
/// let draft = DraftInvoiceBuilder::new()
///     .line("Management fee", dec!(2), dec!(100), dec!(21))
///     .retention_line("Owner settlement", dec!(1), dec!(500), dec!(21), dec!(15))
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct DraftInvoiceBuilder {
    tenant_id: TenantId,
    owner_id: OwnerId,
    series_id: SeriesId,
    currency: Currency,
    due_date: Option<NaiveDate>,
    lines: Vec<LineItemInput>,
}

impl Default for DraftInvoiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DraftInvoiceBuilder {
    pub fn new() -> Self {
        Self {
            tenant_id: TenantId::new(),
            owner_id: OwnerId::new(),
            series_id: SeriesId::new(),
            currency: Currency::EUR,
            due_date: None,
            lines: Vec::new(),
        }
    }

    pub fn tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    pub fn owner(mut self, owner_id: OwnerId) -> Self {
        self.owner_id = owner_id;
        self
    }

    pub fn series(mut self, series_id: SeriesId) -> Self {
        self.series_id = series_id;
        self
    }

    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Adds a line without retention
    pub fn line(
        self,
        concept: &str,
        quantity: Decimal,
        unit_price: Decimal,
        vat_rate: Decimal,
    ) -> Self {
        self.retention_line(concept, quantity, unit_price, vat_rate, dec!(0))
    }

    /// Adds a line with retention
    pub fn retention_line(
        mut self,
        concept: &str,
        quantity: Decimal,
        unit_price: Decimal,
        vat_rate: Decimal,
        retention_rate: Decimal,
    ) -> Self {
        self.lines.push(LineItemInput {
            concept: concept.to_string(),
            quantity,
            unit_price,
            vat_rate,
            retention_rate,
        });
        self
    }

    pub fn build(self) -> Result<DraftInvoice, InvoicingError> {
        DraftInvoice::new(
            self.tenant_id,
            self.owner_id,
            self.series_id,
            self.currency,
            self.due_date,
            &self.lines,
        )
    }
}

/// Builder for numbering series
#[derive(Debug, Clone)]
pub struct SeriesBuilder {
    tenant_id: TenantId,
    kind: SeriesKind,
    name: String,
    prefix: String,
    year: i32,
    current_number: i64,
}

impl Default for SeriesBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SeriesBuilder {
    pub fn new() -> Self {
        Self {
            tenant_id: TenantId::new(),
            kind: SeriesKind::Standard,
            name: "Standard 2025".to_string(),
            prefix: "STD".to_string(),
            year: 2025,
            current_number: 0,
        }
    }

    pub fn tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    pub fn rectifying(mut self) -> Self {
        self.kind = SeriesKind::Rectifying;
        self.name = "Rectifying 2025".to_string();
        self.prefix = "REC".to_string();
        self
    }

    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }

    /// Starts the counter at a given position
    pub fn at_number(mut self, current_number: i64) -> Self {
        self.current_number = current_number;
        self
    }

    pub fn build(self) -> InvoiceSeries {
        let mut series =
            InvoiceSeries::new(self.tenant_id, self.kind, self.name, self.prefix, self.year);
        series.current_number = self.current_number;
        series
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_builder_defaults() {
        let draft = DraftInvoiceBuilder::new()
            .line("Fee", dec!(1), dec!(100), dec!(21))
            .build()
            .unwrap();
        assert_eq!(draft.currency(), Currency::EUR);
        assert_eq!(draft.items().len(), 1);
        assert_eq!(draft.totals().total.amount(), dec!(121.00));
    }

    #[test]
    fn test_series_builder_at_number() {
        let series = SeriesBuilder::new().prefix("FAC").at_number(41).build();
        assert_eq!(series.peek_next().display_number, "FAC-2025-0042");
    }
}
