//! Typed views over `NotificationChannel::config`, which is stored as opaque JSON
//! (spec.md §3 — config shape is per-channel-type, not a fixed column set).

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

#[derive(Debug, Deserialize)]
pub struct WebhookConfig {
    pub webhook_url: String,
    #[serde(default)]
    pub headers: std::collections::HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct EmailConfig {
    pub to_email: String,
    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default)]
    pub smtp_port: Option<u16>,
    #[serde(default)]
    pub smtp_user: Option<String>,
    #[serde(default)]
    pub smtp_password: Option<String>,
}
