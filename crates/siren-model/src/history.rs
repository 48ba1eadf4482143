//! Query descriptor and result page for history lookups.

use serde::{Deserialize, Serialize};

use crate::types::Alert;

/// A query descriptor for one history lookup.
///
/// Built per request and never persisted. No validation happens at
/// construction; out-of-range values are passed through and the backend
/// defines their behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryQuery {
    /// The composed storage key (`tenant|identity`).
    pub key: String,
    /// Upper bound on the time score, inclusive. `+inf` means no bound.
    pub score_ceiling: f64,
    /// How many entries to skip after score filtering.
    pub offset: i64,
    /// Page size. Zero returns no alerts; [`Self::UNBOUNDED`] returns all.
    pub count: i64,
}

impl HistoryQuery {
    /// Sentinel page size meaning "return everything after the offset".
    pub const UNBOUNDED: i64 = -1;

    /// Creates a new query descriptor. Pure constructor, no validation.
    #[must_use]
    pub fn new(key: impl Into<String>, score_ceiling: f64, offset: i64, count: i64) -> Self {
        Self {
            key: key.into(),
            score_ceiling,
            offset,
            count,
        }
    }
}

/// The result of one history lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage {
    /// The matching alerts, ascending by score.
    pub alerts: Vec<Alert>,
    /// Full cardinality of the underlying history, independent of paging.
    pub total: i64,
    /// The offset that was requested.
    pub offset: i64,
    /// The page size that was requested.
    pub limit: i64,
}
