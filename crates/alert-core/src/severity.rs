use serde::{Deserialize, Serialize};
use std::fmt;

/// Warning severity, ordered `Minor < Moderate < Severe < Extreme` (spec.md §6).
///
/// Derives `Ord` from declaration order, which is what both the quiet-hours override
/// check and the trial severity-threshold filter rely on.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    #[default]
    Minor,
    Moderate,
    Severe,
    Extreme,
}

impl Severity {
    /// Parse case-insensitively, defaulting to `Minor` on anything unrecognized.
    ///
    /// The upstream feed and trial threshold strings aren't validated at the edge; the
    /// original client fails open the same way (`_SEVERITY_ORDER.get(x, 0)`).
    pub fn parse_lenient(s: &str) -> Severity {
        match s.to_ascii_lowercase().as_str() {
            "moderate" => Severity::Moderate,
            "severe" => Severity::Severe,
            "extreme" => Severity::Extreme,
            _ => Severity::Minor,
        }
    }

    pub fn bypasses_quiet_hours(self) -> bool {
        matches!(self, Severity::Severe | Severity::Extreme)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Minor => "Minor",
            Severity::Moderate => "Moderate",
            Severity::Severe => "Severe",
            Severity::Extreme => "Extreme",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_severity() {
        assert!(Severity::Minor < Severity::Moderate);
        assert!(Severity::Moderate < Severity::Severe);
        assert!(Severity::Severe < Severity::Extreme);
    }

    #[test]
    fn parse_is_case_insensitive_and_fails_open() {
        assert_eq!(Severity::parse_lenient("SEVERE"), Severity::Severe);
        assert_eq!(Severity::parse_lenient("bogus"), Severity::Minor);
    }
}
