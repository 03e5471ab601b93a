use crate::match_result::MatchType;
use crate::severity::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a stored alert (spec.md §3).
///
/// `Expired` is set by the expiry sweep, never by the poll cycle that created the row.
/// `Cancelled` is an admin-surface transition the engine itself never makes. Status
/// only moves forward — `active → expired` or `active → cancelled` — never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
pub enum AlertStatus {
    Active,
    Expired,
    Cancelled,
}

/// A warning-to-location match, persisted once and never mutated except for `status`.
///
/// The `(bmkg_alert_code, matched_location_id)` pair is the dedup key enforced at the
/// database layer — this struct does not enforce it itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    pub bmkg_alert_code: String,
    pub matched_location_id: i64,
    pub match_type: MatchType,
    pub matched_text: String,
    pub event: String,
    pub severity: Severity,
    pub headline: String,
    pub description: String,
    pub province: String,
    /// Raw upstream `expires` string (ISO-8601 with an explicit UTC offset, or empty
    /// for "never expires" — see `StateManager::mark_expired_alerts`).
    pub expires: String,
    /// `warning.areas` serialized as JSON at store time, kept verbatim for the
    /// admin surface — never parsed back out by the engine itself.
    pub polygon_data: String,
    pub status: AlertStatus,
    /// Set once a farewell notification has gone out for this alert's expiry.
    pub expired_notified: bool,
    pub created_at: DateTime<Utc>,
}
