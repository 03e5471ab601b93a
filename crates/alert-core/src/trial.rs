use crate::severity::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A time-boxed Telegram trial subscription (spec.md §3, SPEC_FULL §4.5).
///
/// Trials bypass the `locations`/`notification_channels` tables entirely: matching
/// and delivery for a trial happen inline against this row's own fields, re-fetching
/// warning details per trial rather than reusing the already-matched `Alert` set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trial {
    pub id: i64,
    pub chat_id: String,
    pub kecamatan: String,
    pub kabupaten: String,
    /// `"all"` or a `Severity` name; stored as free text and parsed leniently at use.
    pub severity_threshold: String,
    pub ip_address: String,
    pub registered_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub expired_notified: bool,
}

impl Trial {
    /// Minimum severity this trial wants to hear about; `"all"` means everything.
    pub fn threshold(&self) -> Option<Severity> {
        if self.severity_threshold.eq_ignore_ascii_case("all") {
            None
        } else {
            Some(Severity::parse_lenient(&self.severity_threshold))
        }
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}
