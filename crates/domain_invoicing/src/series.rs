//! Invoice numbering series
//!
//! A series is a tenant-scoped numbering stream. Standard invoices and
//! rectifying invoices draw from separate series so that corrections never
//! disturb the gapless numbering of the standard stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{SeriesId, TenantId};

/// The kind of numbering stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeriesKind {
    /// Ordinary invoices
    Standard,
    /// Corrective (rectifying) invoices
    Rectifying,
}

impl SeriesKind {
    /// Default display prefix for lazily created series of this kind
    pub fn default_prefix(&self) -> &'static str {
        match self {
            SeriesKind::Standard => "STD",
            SeriesKind::Rectifying => "REC",
        }
    }

    /// Default human-readable name for lazily created series
    pub fn default_name(&self) -> &'static str {
        match self {
            SeriesKind::Standard => "Standard",
            SeriesKind::Rectifying => "Rectifying",
        }
    }
}

/// A number drawn from a series, with its fixed display form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceNumber {
    pub number: i64,
    pub display_number: String,
}

/// A tenant-scoped invoice numbering stream
///
/// The counter only ever moves forward. Adapters must perform
/// [`allocate_next`](InvoiceSeries::allocate_next) and the invoice's
/// DRAFT→ISSUED transition inside one atomic unit, so a failed issuance
/// never burns a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceSeries {
    pub id: SeriesId,
    pub tenant_id: TenantId,
    pub kind: SeriesKind,
    pub name: String,
    pub prefix: String,
    pub year: i32,
    pub current_number: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InvoiceSeries {
    /// Creates a new series with its counter at zero
    pub fn new(
        tenant_id: TenantId,
        kind: SeriesKind,
        name: impl Into<String>,
        prefix: impl Into<String>,
        year: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: SeriesId::new_v7(),
            tenant_id,
            kind,
            name: name.into(),
            prefix: prefix.into(),
            year,
            current_number: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates the tenant's default series for a kind, used on first issuance
    pub fn default_for(tenant_id: TenantId, kind: SeriesKind, year: i32) -> Self {
        Self::new(
            tenant_id,
            kind,
            format!("{} {}", kind.default_name(), year),
            kind.default_prefix(),
            year,
        )
    }

    /// Formats a number in this series' fixed display form:
    /// `{prefix}-{year}-{number zero-padded to 4}`
    ///
    /// The format is fixed per series and never changes retroactively for
    /// already-issued invoices.
    pub fn display_number(&self, number: i64) -> String {
        format!("{}-{}-{:04}", self.prefix, self.year, number)
    }

    /// Returns the number the next issuance would receive, without consuming it
    pub fn peek_next(&self) -> SequenceNumber {
        let next = self.current_number + 1;
        SequenceNumber {
            number: next,
            display_number: self.display_number(next),
        }
    }

    /// Advances the counter and returns the allocated number
    ///
    /// Callers must hold whatever exclusivity their store requires (row lock,
    /// mutex) for the duration of the surrounding issuance.
    pub fn allocate_next(&mut self) -> SequenceNumber {
        self.current_number += 1;
        self.updated_at = Utc::now();
        SequenceNumber {
            number: self.current_number,
            display_number: self.display_number(self.current_number),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_series() -> InvoiceSeries {
        InvoiceSeries::default_for(TenantId::new(), SeriesKind::Standard, 2025)
    }

    #[test]
    fn test_display_number_format() {
        let series = test_series();
        assert_eq!(series.display_number(1), "STD-2025-0001");
        assert_eq!(series.display_number(42), "STD-2025-0042");
        assert_eq!(series.display_number(12345), "STD-2025-12345");
    }

    #[test]
    fn test_rectifying_prefix() {
        let series = InvoiceSeries::default_for(TenantId::new(), SeriesKind::Rectifying, 2025);
        assert_eq!(series.display_number(1), "REC-2025-0001");
    }

    #[test]
    fn test_allocate_is_monotonic_and_gapless() {
        let mut series = test_series();
        let numbers: Vec<i64> = (0..5).map(|_| series.allocate_next().number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
        assert_eq!(series.current_number, 5);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut series = test_series();
        assert_eq!(series.peek_next().number, 1);
        assert_eq!(series.peek_next().number, 1);
        assert_eq!(series.allocate_next().number, 1);
        assert_eq!(series.peek_next().number, 2);
    }
}
