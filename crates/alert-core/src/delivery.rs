use crate::channel::ChannelKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one dispatch attempt to one channel (spec.md §3).
///
/// `SkippedSeverity` mirrors the original's `DeliveryStatus.SKIPPED_SEVERITY` — the
/// main pipeline has no severity filter by design (spec.md §9), so nothing emits it
/// today, but the value exists so a future per-channel severity floor has somewhere
/// to record itself without inventing a new status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Failed,
    SkippedQuietHours,
    SkippedSeverity,
}

/// One row per (alert, channel) dispatch attempt, written by the `Dispatcher`
/// regardless of outcome — `SkippedQuietHours` rows exist so quiet-hours
/// suppression is auditable, not just silent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    pub id: i64,
    pub alert_id: i64,
    pub channel: ChannelKind,
    pub status: DeliveryStatus,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}
