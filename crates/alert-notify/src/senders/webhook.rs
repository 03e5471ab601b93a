use crate::config::WebhookConfig;
use crate::sender::ChannelSender;
use alert_core::location::Location;
use alert_core::match_result::Match;
use alert_core::warning::Warning;
use anyhow::{bail, Context};
use async_trait::async_trait;
use serde_json::json;

pub struct WebhookSender {
    http: reqwest::Client,
}

impl WebhookSender {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ChannelSender for WebhookSender {
    async fn send(
        &self,
        warning: &Warning,
        location: &Location,
        matched: &Match,
        config: &serde_json::Value,
        is_trial: bool,
    ) -> anyhow::Result<()> {
        let config: WebhookConfig =
            serde_json::from_value(config.clone()).context("webhook channel config")?;

        let payload = json!({
            "source": "bmkg-alert",
            "version": "1.0",
            "is_trial": is_trial,
            "warning": {
                "event": warning.event,
                "severity": warning.severity.to_string(),
                "headline": warning.headline,
                "description": warning.description,
                "effective": warning.effective,
                "expires": warning.expires,
                "infographic_url": warning.infographic_url,
            },
            "location": {
                "id": location.id,
                "label": location.label,
                "kecamatan": location.kecamatan,
                "kabupaten": location.kabupaten,
                "province": location.province,
            },
            "match": {
                "type": format!("{:?}", matched.match_type),
                "text": matched.matched_text,
            },
        });

        let mut request = self.http.post(&config.webhook_url).json(&payload);
        for (key, value) in &config.headers {
            request = request.header(key, value);
        }

        let resp = request.send().await.context("post generic webhook")?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        bail!("webhook error: status={status}");
    }
}
