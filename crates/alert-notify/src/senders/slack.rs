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

fn severity_emoji(severity: Severity) -> &'static str {
    match severity {
        Severity::Minor => ":large_blue_circle:",
        Severity::Moderate => ":large_yellow_circle:",
        Severity::Severe => ":red_circle:",
        Severity::Extreme => ":black_circle:",
    }
}

pub struct SlackSender {
    http: reqwest::Client,
}

impl SlackSender {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    fn build_blocks(
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
        let description = truncate(&description, 300);

        let mut blocks = vec![
            json!({
                "type": "header",
                "text": {"type": "plain_text", "text": format!("{} Peringatan Cuaca — {}", severity_emoji(warning.severity), warning.event), "emoji": true},
            }),
            json!({
                "type": "section",
                "fields": [
                    {"type": "mrkdwn", "text": format!("*Lokasi:*\n{label}")},
                    {"type": "mrkdwn", "text": format!("*Tingkat:*\n{}", warning.severity)},
                    {"type": "mrkdwn", "text": format!("*Berlaku:*\n{}", non_empty(&warning.effective))},
                    {"type": "mrkdwn", "text": format!("*Hingga:*\n{}", non_empty(&warning.expires))},
                ],
            }),
        ];

        if !description.is_empty() {
            blocks.push(json!({
                "type": "section",
                "text": {"type": "mrkdwn", "text": description},
            }));
        }

        if !warning.infographic_url.is_empty() {
            blocks.push(json!({
                "type": "section",
                "text": {"type": "mrkdwn", "text": format!("<{}|Lihat Infografis BMKG>", warning.infographic_url)},
            }));
        }

        blocks.push(json!({
            "type": "context",
            "elements": [
                {"type": "mrkdwn", "text": format!("Match: {:?} — {}", matched.match_type, matched.matched_text)},
                {"type": "mrkdwn", "text": "Sumber: BMKG (bmkg.go.id) | BMKG Alert"},
            ],
        }));

        if is_trial {
            blocks.push(json!({
                "type": "context",
                "elements": [
                    {"type": "mrkdwn", "text": ":hourglass: _Mode Trial — notifikasi aktif sementara._"},
                ],
            }));
        }

        json!({ "blocks": blocks })
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
impl ChannelSender for SlackSender {
    async fn send(
        &self,
        warning: &Warning,
        location: &Location,
        matched: &Match,
        config: &serde_json::Value,
        is_trial: bool,
    ) -> anyhow::Result<()> {
        let config: WebhookConfig =
            serde_json::from_value(config.clone()).context("slack channel config")?;
        let payload = Self::build_blocks(warning, location, matched, is_trial);

        let resp = self
            .http
            .post(&config.webhook_url)
            .json(&payload)
            .send()
            .await
            .context("post slack webhook")?;

        let status = resp.status();
        if status.as_u16() == 200 {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        bail!("slack webhook error: status={status} body={}", truncate(&body, 200));
    }
}
