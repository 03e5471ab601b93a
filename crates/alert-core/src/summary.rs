use serde::{Deserialize, Serialize};

/// Per-cycle counters returned by `AlertEngine::run_poll_cycle` (spec.md §4.3).
///
/// Exposed as-is through `GET /engine/status` as `last_poll_result`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollSummary {
    pub nowcasts_seen: u32,
    pub warnings_seen: u32,
    pub matches_found: u32,
    pub alerts_stored: u32,
    pub duplicates_skipped: u32,
    pub alerts_expired: u32,
    pub trials_notified: u32,
    pub trials_expired: u32,
    pub deliveries_sent: u32,
    pub deliveries_failed: u32,
    pub errors: Vec<String>,
}
