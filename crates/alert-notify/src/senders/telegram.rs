use crate::config::TelegramConfig;
use crate::formatter;
use crate::sender::ChannelSender;
use alert_core::location::Location;
use alert_core::match_result::Match;
use alert_core::warning::Warning;
use anyhow::{bail, Context};
use async_trait::async_trait;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

pub struct TelegramSender {
    http: reqwest::Client,
}

impl TelegramSender {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Send a raw pre-formatted message, used by the trial message flow which
    /// doesn't go through `ChannelSender::send`.
    pub async fn send_raw(&self, bot_token: &str, chat_id: &str, text: &str) -> anyhow::Result<()> {
        let url = format!("{TELEGRAM_API_BASE}/bot{bot_token}/sendMessage");
        let resp = self
            .http
            .post(&url)
            .json(&serde_json::json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "HTML",
                "disable_web_page_preview": false,
            }))
            .send()
            .await
            .context("send telegram message")?;

        let status = resp.status();
        let body: serde_json::Value = resp.json().await.unwrap_or(serde_json::Value::Null);
        if status.is_success() && body.get("ok").and_then(|v| v.as_bool()).unwrap_or(false) {
            return Ok(());
        }
        bail!("telegram api error: status={status} body={body}");
    }
}

#[async_trait]
impl ChannelSender for TelegramSender {
    async fn send(
        &self,
        warning: &Warning,
        location: &Location,
        matched: &Match,
        config: &serde_json::Value,
        is_trial: bool,
    ) -> anyhow::Result<()> {
        let config: TelegramConfig =
            serde_json::from_value(config.clone()).context("telegram channel config")?;
        let message = formatter::telegram_message(warning, location, matched, is_trial);
        self.send_raw(&config.bot_token, &config.chat_id, &message).await
    }
}
