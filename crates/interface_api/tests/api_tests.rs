//! HTTP API integration tests
//!
//! Runs the full router against the in-memory invoicing store, exercising
//! authentication, the invoice lifecycle, and the error mapping.

use std::sync::Arc;

use axum_test::TestServer;
use chrono::{Datelike, Utc};
use serde_json::{json, Value};

use core_kernel::{OwnerId, TenantId};
use domain_invoicing::ports::mock::MemoryInvoicingStore;
use domain_invoicing::InvoicingService;
use interface_api::auth::create_token;
use interface_api::config::ApiConfig;
use interface_api::{create_router, AppState};

struct TestApi {
    server: TestServer,
    token: String,
    owner: OwnerId,
    tenant: TenantId,
    config: ApiConfig,
}

async fn spawn_api() -> TestApi {
    let tenant = TenantId::new();
    let owner = OwnerId::new();
    let store = MemoryInvoicingStore::with_owner(tenant, owner).await;
    let service = InvoicingService::new(Arc::new(store));
    let config = ApiConfig::default();
    let token = create_token(tenant, vec!["admin".to_string()], &config.jwt_secret, 3600).unwrap();

    let server = TestServer::new(create_router(AppState::new(service, config.clone()))).unwrap();
    TestApi {
        server,
        token,
        owner,
        tenant,
        config,
    }
}

fn invoice_body(api: &TestApi) -> Value {
    json!({
        "owner_id": api.owner.as_uuid(),
        "items": [
            {"concept": "Monthly management fee", "quantity": "2", "unit_price": "100", "vat_rate": "21"}
        ]
    })
}

async fn create_draft(api: &TestApi) -> Value {
    let response = api
        .server
        .post("/api/v1/invoices")
        .authorization_bearer(&api.token)
        .json(&invoice_body(api))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()
}

#[tokio::test]
async fn test_health_is_public() {
    let api = spawn_api().await;
    let response = api.server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "healthy");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let api = spawn_api().await;
    let response = api.server.get("/api/v1/invoices").await;
    response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_permission_is_forbidden() {
    let api = spawn_api().await;
    let token = create_token(
        api.tenant,
        vec!["invoice:read".to_string()],
        &api.config.jwt_secret,
        3600,
    )
    .unwrap();

    let response = api
        .server
        .post("/api/v1/invoices")
        .authorization_bearer(&token)
        .json(&invoice_body(&api))
        .await;
    response.assert_status(axum::http::StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_invoice_lifecycle() {
    let api = spawn_api().await;
    let year = Utc::now().year();

    // Create: draft with computed totals and no number
    let draft = create_draft(&api).await;
    assert_eq!(draft["status"], "DRAFT");
    assert!(draft.get("number").is_none());
    assert_eq!(draft["totals"]["subtotal"], "200.00");
    assert_eq!(draft["totals"]["total_vat"], "42.00");
    assert_eq!(draft["totals"]["total"], "242.00");
    let id = draft["id"].as_str().unwrap().to_string();

    // Preview: next number without consuming it
    let preview = api
        .server
        .get(&format!("/api/v1/invoices/{id}/issue"))
        .authorization_bearer(&api.token)
        .await;
    preview.assert_status_ok();
    assert_eq!(
        preview.json::<Value>()["display_number"],
        format!("STD-{year}-0001")
    );

    // Issue: assigns the first number and freezes the invoice
    let issued = api
        .server
        .post(&format!("/api/v1/invoices/{id}/issue"))
        .authorization_bearer(&api.token)
        .await;
    issued.assert_status_ok();
    let issued = issued.json::<Value>();
    assert_eq!(issued["status"], "ISSUED");
    assert_eq!(issued["number"], 1);
    assert_eq!(issued["display_number"], format!("STD-{year}-0001"));

    // Double issue is a conflict
    let again = api
        .server
        .post(&format!("/api/v1/invoices/{id}/issue"))
        .authorization_bearer(&api.token)
        .await;
    again.assert_status(axum::http::StatusCode::CONFLICT);

    // Editing the issued invoice is a conflict
    let update = api
        .server
        .put(&format!("/api/v1/invoices/{id}/items"))
        .authorization_bearer(&api.token)
        .json(&json!({"items": [
            {"concept": "Changed", "quantity": "1", "unit_price": "1", "vat_rate": "0"}
        ]}))
        .await;
    update.assert_status(axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_rectify_difference_over_http() {
    let api = spawn_api().await;
    let year = Utc::now().year();

    let draft = create_draft(&api).await;
    let id = draft["id"].as_str().unwrap().to_string();
    api.server
        .post(&format!("/api/v1/invoices/{id}/issue"))
        .authorization_bearer(&api.token)
        .await
        .assert_status_ok();

    let response = api
        .server
        .post(&format!("/api/v1/invoices/{id}/rectify"))
        .authorization_bearer(&api.token)
        .json(&json!({
            "kind": "DIFFERENCE",
            "reason": "Overbilled management fee",
            "issue_immediately": true,
            "items": [
                {"concept": "Fee correction", "quantity": "1", "unit_price": "-50", "vat_rate": "21"}
            ]
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);

    let rectifying = response.json::<Value>();
    assert_eq!(rectifying["status"], "ISSUED");
    assert_eq!(rectifying["display_number"], format!("REC-{year}-0001"));
    assert_eq!(rectifying["totals"]["total"], "-60.50");
    assert_eq!(rectifying["rectification"]["rectifies"], draft["id"]);
    assert_eq!(rectifying["rectification"]["original_total"], "242.00");
}

#[tokio::test]
async fn test_rectify_draft_is_conflict() {
    let api = spawn_api().await;
    let draft = create_draft(&api).await;
    let id = draft["id"].as_str().unwrap();

    let response = api
        .server
        .post(&format!("/api/v1/invoices/{id}/rectify"))
        .authorization_bearer(&api.token)
        .json(&json!({
            "kind": "DIFFERENCE",
            "reason": "Too early",
            "items": [
                {"concept": "Delta", "quantity": "1", "unit_price": "-10", "vat_rate": "21"}
            ]
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_empty_items_is_unprocessable() {
    let api = spawn_api().await;
    let response = api
        .server
        .post("/api/v1/invoices")
        .authorization_bearer(&api.token)
        .json(&json!({"owner_id": api.owner.as_uuid(), "items": []}))
        .await;
    response.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_unknown_invoice_is_not_found() {
    let api = spawn_api().await;
    let response = api
        .server
        .get(&format!("/api/v1/invoices/{}", uuid::Uuid::new_v4()))
        .authorization_bearer(&api.token)
        .await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_draft() {
    let api = spawn_api().await;
    let draft = create_draft(&api).await;
    let id = draft["id"].as_str().unwrap().to_string();

    api.server
        .delete(&format!("/api/v1/invoices/{id}"))
        .authorization_bearer(&api.token)
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);

    api.server
        .get(&format!("/api/v1/invoices/{id}"))
        .authorization_bearer(&api.token)
        .await
        .assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_series_endpoints() {
    let api = spawn_api().await;

    let created = api
        .server
        .post("/api/v1/series")
        .authorization_bearer(&api.token)
        .json(&json!({
            "kind": "STANDARD",
            "name": "Facturas 2025",
            "prefix": "FAC",
            "year": 2025
        }))
        .await;
    created.assert_status(axum::http::StatusCode::CREATED);
    assert_eq!(created.json::<Value>()["next_display_number"], "FAC-2025-0001");

    let listed = api
        .server
        .get("/api/v1/series")
        .authorization_bearer(&api.token)
        .await;
    listed.assert_status_ok();
    assert_eq!(listed.json::<Value>().as_array().unwrap().len(), 1);
}
