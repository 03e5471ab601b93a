use crate::severity::Severity;
use serde::{Deserialize, Serialize};

/// A single affected area as listed by the upstream nowcast feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarningArea {
    pub name: String,
    #[serde(default)]
    pub polygon: Vec<Vec<f64>>,
}

/// A transient warning parsed from the upstream detail response (spec.md §3).
///
/// Lives only for the poll cycle that fetched it — never persisted as-is; a `Match`
/// against it produces the fields that *do* get written into `Alert`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub event: String,
    #[serde(default, with = "severity_text")]
    pub severity: Severity,
    #[serde(default)]
    pub urgency: String,
    #[serde(default)]
    pub certainty: String,
    #[serde(default)]
    pub effective: String,
    #[serde(default)]
    pub expires: String,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub infographic_url: String,
    #[serde(default)]
    pub areas: Vec<WarningArea>,
    #[serde(default)]
    pub is_expired: bool,
}

/// Severities arrive over the wire as free-text (`"Moderate"`, `"moderate"`, ...);
/// decode leniently rather than rejecting the whole warning on an unexpected casing.
mod severity_text {
    use super::Severity;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Severity, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Severity, D::Error> {
        let raw = String::deserialize(d)?;
        Ok(Severity::parse_lenient(&raw))
    }
}

/// `Summary` from `UpstreamClient::list_nowcast` (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NowcastSummary {
    pub code: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub published_at: String,
    #[serde(default)]
    pub detail_url: String,
}

/// `Detail` from `UpstreamClient::fetch_detail` (spec.md §6), already unwrapped from
/// the upstream's `{data: {...}, meta: {...}}` envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NowcastDetail {
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub warnings: Vec<Warning>,
}
