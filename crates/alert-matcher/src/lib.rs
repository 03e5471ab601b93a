//! Pure matching logic: warning text against monitored locations.
//!
//! No I/O, no clock, no randomness — the same `(warning, locations)` pair always
//! produces the same `Vec<Match>` in the same order, which is what lets the engine
//! re-run a cycle idempotently and lets tests assert on exact output.

use alert_core::location::Location;
use alert_core::match_result::{Match, MatchType};
use alert_core::warning::Warning;

/// Match a warning against a list of locations.
///
/// Strategy, in order, per location:
/// 1. Primary: the location's kecamatan name appears in the warning description.
/// 2. Fallback: the location's kabupaten name appears in any warning area name.
///
/// A location matches at most once, by whichever rule fires first. Disabled
/// locations and locations with an empty kecamatan/kabupaten are skipped.
pub fn match_locations(warning: &Warning, locations: &[Location]) -> Vec<Match> {
    let description_lower = warning.description.to_lowercase();
    let area_names_lower: Vec<String> =
        warning.areas.iter().map(|a| a.name.to_lowercase()).collect();

    let mut results = Vec::new();

    for location in locations {
        if !location.enabled {
            continue;
        }

        let kecamatan = location.kecamatan.to_lowercase();
        if !kecamatan.is_empty() && description_lower.contains(&kecamatan) {
            results.push(Match {
                location_id: location.id,
                match_type: MatchType::Kecamatan,
                matched_text: location.kecamatan.clone(),
            });
            continue;
        }

        let kabupaten = location.kabupaten.to_lowercase();
        if !kabupaten.is_empty()
            && area_names_lower.iter().any(|area| area.contains(&kabupaten))
        {
            results.push(Match {
                location_id: location.id,
                match_type: MatchType::Kabupaten,
                matched_text: location.kabupaten.clone(),
            });
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use alert_core::warning::WarningArea;

    fn location(id: i64, kecamatan: &str, kabupaten: &str) -> Location {
        Location {
            id,
            label: format!("loc-{id}"),
            province_code: String::new(),
            province: "Jawa Barat".to_string(),
            kabupaten_code: String::new(),
            kabupaten: kabupaten.to_string(),
            kecamatan_code: format!("code-{id}"),
            kecamatan: kecamatan.to_string(),
            latitude: None,
            longitude: None,
            enabled: true,
        }
    }

    fn warning(description: &str, areas: &[&str]) -> Warning {
        Warning {
            identifier: "W1".to_string(),
            event: "Hujan Lebat".to_string(),
            severity: alert_core::severity::Severity::Moderate,
            urgency: String::new(),
            certainty: String::new(),
            effective: String::new(),
            expires: String::new(),
            headline: String::new(),
            description: description.to_string(),
            sender: String::new(),
            infographic_url: String::new(),
            areas: areas
                .iter()
                .map(|name| WarningArea {
                    name: name.to_string(),
                    polygon: Vec::new(),
                })
                .collect(),
            is_expired: false,
        }
    }

    #[test]
    fn matches_kecamatan_in_description() {
        let w = warning("Hujan lebat diperkirakan di Kecamatan Cimahi Utara", &[]);
        let locs = vec![location(1, "Cimahi Utara", "Kota Cimahi")];
        let matches = match_locations(&w, &locs);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].match_type, MatchType::Kecamatan);
        assert_eq!(matches[0].matched_text, "Cimahi Utara");
    }

    #[test]
    fn falls_back_to_kabupaten_in_area_names() {
        let w = warning("Hujan lebat di wilayah sekitar", &["Kabupaten Bandung Barat"]);
        let locs = vec![location(1, "Lembang", "Bandung Barat")];
        let matches = match_locations(&w, &locs);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].match_type, MatchType::Kabupaten);
    }

    #[test]
    fn skips_disabled_locations() {
        let w = warning("Hujan di Cimahi Utara", &[]);
        let mut loc = location(1, "Cimahi Utara", "Kota Cimahi");
        loc.enabled = false;
        assert!(match_locations(&w, &[loc]).is_empty());
    }

    #[test]
    fn empty_names_never_match() {
        let w = warning("", &[]);
        let locs = vec![location(1, "", "")];
        assert!(match_locations(&w, &locs).is_empty());
    }

    #[test]
    fn is_pure_and_order_preserving() {
        let w = warning("Cimahi Utara dan Lembang", &["Kabupaten Bandung Barat"]);
        let locs = vec![
            location(2, "Lembang", "Bandung Barat"),
            location(1, "Cimahi Utara", "Kota Cimahi"),
        ];
        let first = match_locations(&w, &locs);
        let second = match_locations(&w, &locs);
        assert_eq!(first.len(), second.len());
        assert_eq!(first[0].location_id, locs[0].id);
        assert_eq!(first[1].location_id, locs[1].id);
    }
}
