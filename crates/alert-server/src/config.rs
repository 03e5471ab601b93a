use clap::Parser;

/// Process-level configuration — parsed once at startup and passed through by
/// reference. Runtime-tunable behavior (poll interval, quiet hours, trial limits)
/// lives in the `config` table instead, so it can change without a restart.
#[derive(Parser, Debug, Clone)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    #[arg(long, env = "DB_PATH", default_value = "data/alerts.db")]
    pub db_path: String,

    /// Base URL of the upstream BMKG nowcast API.
    #[arg(long, env = "BMKG_BASE_URL", default_value = "https://api.bmkg.go.id")]
    pub bmkg_base_url: String,

    /// Bind address for the engine-control HTTP plane.
    #[arg(long, env = "SERVER_BIND", default_value = "127.0.0.1:8080")]
    pub bind: String,

    /// "pretty" for a human console, "json" for structured production logs.
    #[arg(long, env = "LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Bot token used for both channel deliveries without their own token and the
    /// trial sub-pipeline's direct sends.
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", default_value = "")]
    pub telegram_bot_token: String,

    #[arg(long, env = "SMTP_HOST", default_value = "")]
    pub smtp_host: String,

    #[arg(long, env = "SMTP_PORT", default_value_t = 587)]
    pub smtp_port: u16,

    #[arg(long, env = "SMTP_USER", default_value = "")]
    pub smtp_user: String,

    #[arg(long, env = "SMTP_PASSWORD", default_value = "")]
    pub smtp_password: String,

    #[arg(long, env = "SMTP_FROM", default_value = "")]
    pub smtp_from: String,

    /// Start the poll loop immediately instead of waiting for `POST /engine/start`.
    #[arg(long, env = "AUTOSTART_ENGINE", default_value_t = false)]
    pub autostart_engine: bool,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::parse_from(["alert-server"]))
    }

    pub fn telegram_bot_token(&self) -> Option<String> {
        (!self.telegram_bot_token.is_empty()).then(|| self.telegram_bot_token.clone())
    }
}
