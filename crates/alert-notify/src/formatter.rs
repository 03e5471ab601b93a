//! Builds the Telegram HTML message and the plain-text "all clear" message.
//!
//! This is the reference formatter other channels borrow fields from; Discord/Slack
//! build their own richer embeds/blocks but use the same severity emoji and
//! truncation rules.

use alert_core::location::Location;
use alert_core::match_result::Match;
use alert_core::severity::Severity;
use alert_core::warning::Warning;

pub fn severity_emoji(severity: Severity) -> &'static str {
    match severity {
        Severity::Minor => "\u{1f535}",
        Severity::Moderate => "\u{1f7e1}",
        Severity::Severe => "\u{1f534}",
        Severity::Extreme => "\u{26ab}",
    }
}

pub fn telegram_message(
    warning: &Warning,
    location: &Location,
    matched: &Match,
    is_trial: bool,
) -> String {
    let emoji = severity_emoji(warning.severity);
    let label = if location.label.is_empty() {
        location.kecamatan.clone()
    } else {
        location.label.clone()
    };

    let mut lines = vec![
        format!("{emoji} <b>Peringatan Cuaca — {}</b>", warning.event),
        String::new(),
        format!("\u{1f4cd} <b>Lokasi Terpantau:</b> {label}"),
        format!(
            "   {}, {}, {}",
            location.kecamatan, location.kabupaten, location.province
        ),
        String::new(),
        format!("\u{26a1} <b>Tingkat:</b> {}", warning.severity),
        format!("\u{1f550} <b>Berlaku:</b> {}", format_time(&warning.effective)),
        format!("\u{23f0} <b>Hingga:</b> {}", format_time(&warning.expires)),
    ];

    if !warning.description.is_empty() {
        let desc = truncate(&warning.description, 500);
        lines.push(String::new());
        lines.push(format!("\u{1f4dd} {desc}"));
    }

    lines.push(String::new());
    lines.push(format!(
        "\u{1f50d} <i>Cocok: {:?} — {}</i>",
        matched.match_type, matched.matched_text
    ));

    if !warning.infographic_url.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "\u{1f5fa}\u{fe0f} <a href=\"{}\">Lihat Infografis BMKG</a>",
            warning.infographic_url
        ));
    }

    if is_trial {
        lines.push(String::new());
        lines.push("\u{2500}".repeat(30));
        lines.push("\u{23f3} <i>Mode Trial — langganan aktif sementara.</i>".to_string());
    }

    lines.push(String::new());
    lines.push("\u{2500}".repeat(30));
    lines.push("\u{1f4e1} Sumber: BMKG (bmkg.go.id)".to_string());
    lines.push("\u{1f916} BMKG Alert System".to_string());

    lines.join("\n")
}

pub fn expiry_message(warning_event: &str, location_label: &str) -> String {
    format!(
        "\u{2705} <b>Peringatan Berakhir</b>\n\nPeringatan <b>{warning_event}</b> untuk <b>{location_label}</b> telah berakhir.\n\nKondisi sudah aman. Tetap waspada.\n\n\u{1f4e1} Sumber: BMKG (bmkg.go.id)"
    )
}

pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{cut}...")
}

/// The upstream timestamp already carries a UTC offset (`+07:00` Jakarta, `+08:00`
/// Makassar, `+09:00` Jayapura); just swap it for the matching WIB/WITA/WIT label.
fn format_time(iso: &str) -> String {
    if iso.is_empty() {
        return "-".to_string();
    }
    let Some((date_part, time_part)) = iso.split_once('T') else {
        return iso.to_string();
    };
    if time_part.len() < 5 {
        return iso.to_string();
    }
    let tz_label = if time_part.contains("+08") {
        "WITA"
    } else if time_part.contains("+09") {
        "WIT"
    } else {
        "WIB"
    };
    format!("{date_part} {} {tz_label}", &time_part[..5])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_time_picks_label_from_offset() {
        assert_eq!(format_time("2026-02-17T19:55:00+07:00"), "2026-02-17 19:55 WIB");
        assert_eq!(format_time("2026-02-17T19:55:00+08:00"), "2026-02-17 19:55 WITA");
        assert_eq!(format_time("2026-02-17T19:55:00+09:00"), "2026-02-17 19:55 WIT");
    }

    #[test]
    fn format_time_handles_missing_value() {
        assert_eq!(format_time(""), "-");
    }

    #[test]
    fn truncate_adds_ellipsis_only_when_needed() {
        assert_eq!(truncate("short", 10), "short");
        let long = "a".repeat(20);
        let truncated = truncate(&long, 10);
        assert_eq!(truncated.chars().count(), 10);
        assert!(truncated.ends_with("..."));
    }
}
