use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The five outbound channels this build knows how to send on (spec.md §6, SPEC_FULL §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
pub enum ChannelKind {
    Telegram,
    Discord,
    Slack,
    Email,
    Webhook,
}

impl ChannelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChannelKind::Telegram => "telegram",
            ChannelKind::Discord => "discord",
            ChannelKind::Slack => "slack",
            ChannelKind::Email => "email",
            ChannelKind::Webhook => "webhook",
        }
    }
}

/// A configured destination for one channel.
///
/// `config` holds the channel-specific JSON blob (bot token + chat id for Telegram,
/// webhook URL for Discord/Slack/Webhook, SMTP recipient for Email) — see
/// `alert-notify::config` for the typed views over it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationChannel {
    pub id: i64,
    pub kind: ChannelKind,
    pub label: String,
    pub config: serde_json::Value,
    pub enabled: bool,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}
