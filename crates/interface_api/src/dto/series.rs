//! Series DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain_invoicing::{InvoiceSeries, SeriesKind};

#[derive(Debug, Deserialize)]
pub struct CreateSeriesRequest {
    pub kind: SeriesKind,
    pub name: String,
    pub prefix: String,
    pub year: i32,
}

#[derive(Debug, Serialize)]
pub struct SeriesResponse {
    pub id: Uuid,
    pub kind: SeriesKind,
    pub name: String,
    pub prefix: String,
    pub year: i32,
    pub current_number: i64,
    /// Display form the next issuance in this series would take
    pub next_display_number: String,
    pub created_at: DateTime<Utc>,
}

impl From<&InvoiceSeries> for SeriesResponse {
    fn from(series: &InvoiceSeries) -> Self {
        Self {
            id: series.id.into(),
            kind: series.kind,
            name: series.name.clone(),
            prefix: series.prefix.clone(),
            year: series.year,
            current_number: series.current_number,
            next_display_number: series.peek_next().display_number,
            created_at: series.created_at,
        }
    }
}
