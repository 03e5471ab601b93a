use crate::config::ServerConfig;
use alert_core::channel::ChannelKind;
use alert_engine::AlertEngine;
use alert_notify::{DiscordSender, Dispatcher, EmailSender, SlackSender, SmtpDefaults, TelegramSender, WebhookSender};
use alert_state::StateManager;
use alert_upstream::HttpUpstreamClient;
use std::collections::HashMap;
use std::sync::Arc;

pub async fn build_engine(cfg: &ServerConfig) -> anyhow::Result<AlertEngine> {
    let pool = alert_state::pool::connect(&cfg.db_path)
        .await
        .map_err(anyhow::Error::from)?;
    let state = Arc::new(StateManager::new(pool));

    let upstream = Arc::new(HttpUpstreamClient::new(cfg.bmkg_base_url.clone())?);

    let http = reqwest::Client::new();
    let mut senders: HashMap<ChannelKind, Arc<dyn alert_notify::ChannelSender>> = HashMap::new();
    senders.insert(ChannelKind::Telegram, Arc::new(TelegramSender::new(http.clone())));
    senders.insert(ChannelKind::Discord, Arc::new(DiscordSender::new(http.clone())));
    senders.insert(ChannelKind::Slack, Arc::new(SlackSender::new(http.clone())));
    senders.insert(ChannelKind::Webhook, Arc::new(WebhookSender::new(http.clone())));
    senders.insert(
        ChannelKind::Email,
        Arc::new(EmailSender::new(SmtpDefaults {
            host: cfg.smtp_host.clone(),
            port: cfg.smtp_port,
            user: cfg.smtp_user.clone(),
            password: cfg.smtp_password.clone(),
            from_addr: cfg.smtp_from.clone(),
        })),
    );

    let dispatcher = Arc::new(Dispatcher::new(state.clone(), senders));
    let telegram = Arc::new(TelegramSender::new(http));

    Ok(AlertEngine::new(
        upstream,
        state,
        dispatcher,
        telegram,
        cfg.telegram_bot_token(),
    ))
}
