//! Repository implementations

pub mod invoicing;

pub use invoicing::PostgresInvoicingStore;
