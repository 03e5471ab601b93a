use alert_core::location::Location;
use alert_core::match_result::{Match, MatchType};
use alert_core::severity::Severity;
use alert_core::warning::Warning;
use async_trait::async_trait;

/// One outbound channel. `send` returns `Err` on any failure to reach or be
/// accepted by the channel; the dispatcher is responsible for logging and turning
/// that into a `Delivery` row — senders never touch the database themselves.
#[async_trait]
pub trait ChannelSender: Send + Sync {
    async fn send(
        &self,
        warning: &Warning,
        location: &Location,
        matched: &Match,
        config: &serde_json::Value,
        is_trial: bool,
    ) -> anyhow::Result<()>;

    /// Verify a channel's config is reachable without waiting for a real alert.
    /// Default implementation builds a synthetic warning and routes it through
    /// `send` the same way a real alert would be; channels that need a lighter
    /// probe can override this.
    async fn send_test(&self, config: &serde_json::Value) -> anyhow::Result<()> {
        let warning = test_warning();
        let location = test_location();
        let matched = Match {
            location_id: location.id,
            match_type: MatchType::Kecamatan,
            matched_text: location.kecamatan.clone(),
        };
        self.send(&warning, &location, &matched, config, false).await
    }
}

fn test_warning() -> Warning {
    Warning {
        identifier: String::new(),
        event: "Uji Notifikasi".to_string(),
        severity: Severity::Minor,
        urgency: String::new(),
        certainty: String::new(),
        effective: String::new(),
        expires: String::new(),
        headline: "Pesan uji coba kanal notifikasi".to_string(),
        description: "Ini adalah pesan uji untuk memastikan kanal notifikasi berfungsi.".to_string(),
        sender: String::new(),
        infographic_url: String::new(),
        areas: Vec::new(),
        is_expired: false,
    }
}

fn test_location() -> Location {
    Location {
        id: 0,
        label: "Lokasi Uji".to_string(),
        province_code: String::new(),
        province: String::new(),
        kabupaten_code: String::new(),
        kabupaten: String::new(),
        kecamatan_code: String::new(),
        kecamatan: "Lokasi Uji".to_string(),
        latitude: None,
        longitude: None,
        enabled: true,
    }
}
