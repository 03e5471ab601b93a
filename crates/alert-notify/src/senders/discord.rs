use crate::config::WebhookConfig;
use crate::formatter::truncate;
use crate::sender::ChannelSender;
use alert_core::location::Location;
use alert_core::match_result::Match;
use alert_core::severity::Severity;
use alert_core::warning::Warning;
use anyhow::{bail, Context};
use async_trait::async_trait;
use serde_json::json;

fn severity_color(severity: Severity) -> u32 {
    match severity {
        Severity::Minor => 0x3B82F6,
        Severity::Moderate => 0xEAB308,
        Severity::Severe => 0xEF4444,
        Severity::Extreme => 0x1F2937,
    }
}

fn severity_emoji(severity: Severity) -> &'static str {
    match severity {
        Severity::Minor => "\u{1f535}",
        Severity::Moderate => "\u{1f7e1}",
        Severity::Severe => "\u{1f534}",
        Severity::Extreme => "\u{26ab}",
    }
}

pub struct DiscordSender {
    http: reqwest::Client,
}

impl DiscordSender {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    fn build_embed(
        warning: &Warning,
        location: &Location,
        matched: &Match,
        is_trial: bool,
    ) -> serde_json::Value {
        let label = if location.label.is_empty() {
            &location.kecamatan
        } else {
            &location.label
        };
        let description = if !warning.description.is_empty() {
            warning.description.clone()
        } else {
            warning.headline.clone()
        };

        let mut embed = json!({
            "title": format!("{} Peringatan Cuaca — {}", severity_emoji(warning.severity), warning.event),
            "description": truncate(&description, 300),
            "color": severity_color(warning.severity),
            "fields": [
                {"name": "Lokasi Terpantau", "value": label, "inline": true},
                {"name": "Tingkat", "value": warning.severity.to_string(), "inline": true},
                {"name": "Berlaku", "value": non_empty(&warning.effective), "inline": true},
                {"name": "Hingga", "value": non_empty(&warning.expires), "inline": true},
                {"name": "Match", "value": format!("{:?} — {}", matched.match_type, matched.matched_text), "inline": false},
            ],
            "footer": {"text": "BMKG Alert System | Sumber: BMKG (bmkg.go.id)"},
        });

        if !warning.infographic_url.is_empty() {
            embed["image"] = json!({ "url": warning.infographic_url });
        }

        let mut payload = json!({ "embeds": [embed] });
        if is_trial {
            payload["content"] = json!("\u{23f3} Mode Trial — notifikasi aktif sementara.");
        }
        payload
    }
}

fn non_empty(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

#[async_trait]
impl ChannelSender for DiscordSender {
    async fn send(
        &self,
        warning: &Warning,
        location: &Location,
        matched: &Match,
        config: &serde_json::Value,
        is_trial: bool,
    ) -> anyhow::Result<()> {
        let config: WebhookConfig =
            serde_json::from_value(config.clone()).context("discord channel config")?;
        let payload = Self::build_embed(warning, location, matched, is_trial);

        let resp = self
            .http
            .post(&config.webhook_url)
            .json(&payload)
            .send()
            .await
            .context("post discord webhook")?;

        let status = resp.status();
        if status.as_u16() == 200 || status.as_u16() == 204 {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        bail!("discord webhook error: status={status} body={}", truncate(&body, 200));
    }
}
