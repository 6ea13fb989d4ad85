//! Core Kernel - Foundational types for the rental billing system
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money and Rate types with precise decimal arithmetic
//! - Strongly-typed identifiers for tenants, owners, invoices, series, and line items

pub mod identifiers;
pub mod money;

pub use identifiers::{InvoiceId, LineItemId, OwnerId, SeriesId, TenantId};
pub use money::{Currency, Money, MoneyError, Rate};
