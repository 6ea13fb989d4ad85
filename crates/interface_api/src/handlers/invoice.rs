//! Invoice handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use domain_invoicing::{
    CreateDraftInvoice, Invoice, InvoiceQuery, RectificationRequest,
};

use crate::auth::{permissions, Claims};
use crate::dto::invoice::*;
use crate::error::ApiError;
use crate::handlers::authorize;
use crate::AppState;

/// Creates a draft invoice
pub async fn create_invoice(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<InvoiceResponse>), ApiError> {
    let tenant = authorize(&claims, permissions::INVOICE_WRITE)?;

    let draft = state
        .service
        .create_draft(
            tenant,
            CreateDraftInvoice {
                owner_id: request.owner_id.into(),
                series_id: request.series_id.map(Into::into),
                currency: request.currency,
                due_date: request.due_date,
                items: request.items.into_iter().map(Into::into).collect(),
            },
        )
        .await?;

    let invoice = Invoice::Draft(draft);
    Ok((StatusCode::CREATED, Json(InvoiceResponse::from(&invoice))))
}

/// Lists invoices
pub async fn list_invoices(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ListInvoicesQuery>,
) -> Result<Json<Vec<InvoiceResponse>>, ApiError> {
    let tenant = authorize(&claims, permissions::INVOICE_READ)?;

    let invoices = state
        .service
        .list_invoices(
            tenant,
            InvoiceQuery {
                status: query.status,
                series_id: query.series_id.map(Into::into),
                rectifying: query.rectifying,
                limit: query.limit,
                offset: query.offset,
            },
        )
        .await?;

    Ok(Json(invoices.iter().map(InvoiceResponse::from).collect()))
}

/// Gets an invoice by ID
pub async fn get_invoice(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let tenant = authorize(&claims, permissions::INVOICE_READ)?;
    let invoice = state.service.get_invoice(tenant, id.into()).await?;
    Ok(Json(InvoiceResponse::from(&invoice)))
}

/// Deletes a draft invoice
pub async fn delete_invoice(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let tenant = authorize(&claims, permissions::INVOICE_WRITE)?;
    state.service.delete_draft(tenant, id.into()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replaces a draft's line items
pub async fn update_items(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateItemsRequest>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let tenant = authorize(&claims, permissions::INVOICE_WRITE)?;

    let items: Vec<_> = request.items.into_iter().map(Into::into).collect();
    let draft = state
        .service
        .update_draft_items(tenant, id.into(), &items)
        .await?;

    let invoice = Invoice::Draft(draft);
    Ok(Json(InvoiceResponse::from(&invoice)))
}

/// Previews the number the draft would receive if issued now
pub async fn preview_issue(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<NextNumberResponse>, ApiError> {
    let tenant = authorize(&claims, permissions::INVOICE_READ)?;
    let seq = state.service.preview_issue(tenant, id.into()).await?;
    Ok(Json(seq.into()))
}

/// Issues a draft invoice, assigning the next number in its series
pub async fn issue_invoice(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let tenant = authorize(&claims, permissions::INVOICE_ISSUE)?;
    let issued = state.service.issue(tenant, id.into()).await?;
    let invoice = Invoice::Issued(issued);
    Ok(Json(InvoiceResponse::from(&invoice)))
}

/// Creates a rectifying invoice against an issued original
pub async fn rectify_invoice(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<RectifyRequest>,
) -> Result<(StatusCode, Json<InvoiceResponse>), ApiError> {
    let tenant = authorize(&claims, permissions::INVOICE_WRITE)?;

    let invoice = state
        .service
        .rectify(
            tenant,
            id.into(),
            RectificationRequest {
                kind: request.kind,
                reason: request.reason,
                items: request.items.into_iter().map(Into::into).collect(),
                issue_immediately: request.issue_immediately,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(InvoiceResponse::from(&invoice))))
}
