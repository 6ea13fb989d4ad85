//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the rental billing system, built on SQLx.
//!
//! The crate exposes connection pooling ([`pool`]), error classification
//! ([`error`]), and the [`PostgresInvoicingStore`] adapter implementing the
//! invoicing domain's store port.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, DatabaseConfig, PostgresInvoicingStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/rental_billing")).await?;
//! infra_db::run_migrations(&pool).await?;
//! let store = PostgresInvoicingStore::new(pool);
//! ```

pub mod error;
pub mod pool;
pub mod repositories;

pub use error::DatabaseError;
pub use pool::{create_pool, create_pool_from_url, run_migrations, DatabaseConfig, DatabasePool};
pub use repositories::PostgresInvoicingStore;
