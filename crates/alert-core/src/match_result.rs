use serde::{Deserialize, Serialize};

/// Which field on the `Location` produced the hit (spec.md §4.1).
///
/// Kecamatan is checked first; a location only falls through to a kabupaten match if
/// no kecamatan hit was found for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchType {
    Kecamatan,
    Kabupaten,
}

/// One location matched against one warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub location_id: i64,
    pub match_type: MatchType,
    /// The substring of the warning text that triggered the match, kept for the
    /// delivery message and for debugging near-miss reports.
    pub matched_text: String,
}
