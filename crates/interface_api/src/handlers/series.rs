//! Series handlers

use axum::{extract::State, http::StatusCode, Extension, Json};

use domain_invoicing::CreateSeries;

use crate::auth::{permissions, Claims};
use crate::dto::series::*;
use crate::error::ApiError;
use crate::handlers::authorize;
use crate::AppState;

/// Lists the tenant's numbering series
pub async fn list_series(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<SeriesResponse>>, ApiError> {
    let tenant = authorize(&claims, permissions::SERIES_READ)?;
    let series = state.service.list_series(tenant).await?;
    Ok(Json(series.iter().map(SeriesResponse::from).collect()))
}

/// Creates a numbering series
pub async fn create_series(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreateSeriesRequest>,
) -> Result<(StatusCode, Json<SeriesResponse>), ApiError> {
    let tenant = authorize(&claims, permissions::SERIES_WRITE)?;

    let series = state
        .service
        .create_series(
            tenant,
            CreateSeries {
                kind: request.kind,
                name: request.name,
                prefix: request.prefix,
                year: request.year,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(SeriesResponse::from(&series))))
}
