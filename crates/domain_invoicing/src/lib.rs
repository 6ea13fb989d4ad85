//! Invoicing Domain
//!
//! Sequential invoice numbering and the rectification workflow for a
//! multi-tenant rental management platform.
//!
//! # Lifecycle
//!
//! Invoices start as unnumbered drafts and are issued into a numbering
//! series, receiving the next gapless number and a fixed display form such
//! as `STD-2025-0001`. Issued invoices are frozen; corrections are new
//! invoices in a separate rectifying series that reference their original.
//!
//! # Architecture
//!
//! - Entities and workflows live here (`series`, `invoice`, `line_item`,
//!   `rectification`)
//! - [`ports::InvoicingStore`] is the persistence seam; infra_db provides the
//!   PostgreSQL adapter, `ports::mock` an in-memory one for tests
//! - [`services::InvoicingService`] is the application-facing API

pub mod error;
pub mod invoice;
pub mod line_item;
pub mod ports;
pub mod rectification;
pub mod series;
pub mod services;

pub use error::InvoicingError;
pub use invoice::{DraftInvoice, Invoice, InvoiceStatus, InvoiceTotals, IssuedInvoice};
pub use line_item::{LineItem, LineItemInput, LinePricing};
pub use ports::{InvoiceQuery, InvoicingStore};
pub use rectification::{
    build_rectifying_draft, RectificationInfo, RectificationKind, RectificationRequest,
};
pub use series::{InvoiceSeries, SequenceNumber, SeriesKind};
pub use services::{CreateDraftInvoice, CreateSeries, InvoicingService};
