//! HTTP API Layer
//!
//! REST API for the rental billing system using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Invoice, series, and health endpoints
//! - **Middleware**: JWT authentication, audit logging, tracing
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Domain errors mapped onto HTTP status codes
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let app = create_router(AppState::new(service, config).with_pool(pool));
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use domain_invoicing::InvoicingService;

use crate::config::ApiConfig;
use crate::handlers::{health, invoice, series};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: InvoicingService,
    pub config: ApiConfig,
    /// Attached when running against PostgreSQL; used by the readiness probe
    pub pool: Option<PgPool>,
}

impl AppState {
    pub fn new(service: InvoicingService, config: ApiConfig) -> Self {
        Self {
            service,
            config,
            pool: None,
        }
    }

    pub fn with_pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    // Invoice routes
    let invoice_routes = Router::new()
        .route("/", post(invoice::create_invoice))
        .route("/", get(invoice::list_invoices))
        .route("/:id", get(invoice::get_invoice))
        .route("/:id", delete(invoice::delete_invoice))
        .route("/:id/items", put(invoice::update_items))
        .route("/:id/issue", get(invoice::preview_issue))
        .route("/:id/issue", post(invoice::issue_invoice))
        .route("/:id/rectify", post(invoice::rectify_invoice));

    // Series routes
    let series_routes = Router::new()
        .route("/", post(series::create_series))
        .route("/", get(series::list_series));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/invoices", invoice_routes)
        .nest("/series", series_routes)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            audit_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
