use crate::sender::ChannelSender;
use alert_core::channel::{ChannelKind, NotificationChannel};
use alert_core::config_keys;
use alert_core::delivery::DeliveryStatus;
use alert_core::location::Location;
use alert_core::match_result::Match;
use alert_core::severity::Severity;
use alert_core::warning::Warning;
use alert_state::StateManager;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

/// Routes one alert to one channel, after a quiet-hours check, and logs the
/// outcome. Holding a `HashMap<ChannelKind, Arc<dyn ChannelSender>>` instead of five
/// named fields is the one departure from the original's `sender_map` literal —
/// it lets tests substitute a single fake sender without building all five.
pub struct Dispatcher {
    state: Arc<StateManager>,
    senders: HashMap<ChannelKind, Arc<dyn ChannelSender>>,
}

impl Dispatcher {
    pub fn new(state: Arc<StateManager>, senders: HashMap<ChannelKind, Arc<dyn ChannelSender>>) -> Self {
        Self { state, senders }
    }

    pub async fn send(
        &self,
        alert_id: i64,
        warning: &Warning,
        location: &Location,
        matched: &Match,
        channel: &NotificationChannel,
        is_trial: bool,
    ) -> bool {
        if self.is_quiet_hours(warning.severity).await {
            tracing::info!(
                event = "alert_notify.skipped_quiet_hours",
                alert_id,
                channel_id = channel.id,
            );
            let _ = self
                .state
                .log_delivery(alert_id, channel.kind, DeliveryStatus::SkippedQuietHours, "quiet hours")
                .await;
            return false;
        }

        let Some(sender) = self.senders.get(&channel.kind) else {
            tracing::warn!(
                event = "alert_notify.unsupported_channel",
                channel = channel.kind.as_str(),
            );
            let _ = self
                .state
                .log_delivery(alert_id, channel.kind, DeliveryStatus::Failed, "unsupported channel type")
                .await;
            return false;
        };

        let result = sender.send(warning, location, matched, &channel.config, is_trial).await;

        let (status, detail, success) = match &result {
            Ok(()) => (DeliveryStatus::Sent, String::new(), true),
            Err(err) => {
                tracing::error!(
                    event = "alert_notify.dispatch_error",
                    channel = channel.kind.as_str(),
                    error = %err,
                );
                (DeliveryStatus::Failed, err.to_string(), false)
            }
        };

        let _ = self.state.log_delivery(alert_id, channel.kind, status, &detail).await;
        let _ = self
            .state
            .record_channel_outcome(channel.id, success, (!success).then_some(detail.as_str()))
            .await;

        success
    }

    /// Severe/Extreme warnings bypass quiet hours when
    /// `quiet_hours_override_severe` is (the default) true.
    async fn is_quiet_hours(&self, severity: Severity) -> bool {
        let enabled = self
            .state
            .get_config_value(config_keys::QUIET_HOURS_ENABLED, "false")
            .await
            .unwrap_or_else(|_| "false".to_string());
        if enabled != "true" {
            return false;
        }

        let override_severe = self
            .state
            .get_config_value(config_keys::QUIET_HOURS_OVERRIDE_SEVERE, "true")
            .await
            .unwrap_or_else(|_| "true".to_string());
        if override_severe == "true" && severity.bypasses_quiet_hours() {
            return false;
        }

        let start = self
            .state
            .get_config_value(config_keys::QUIET_HOURS_START, "22")
            .await
            .ok()
            .and_then(|s| s.split(':').next().and_then(|h| h.parse::<i64>().ok()))
            .unwrap_or(config_keys::DEFAULT_QUIET_HOURS_START);
        let end = self
            .state
            .get_config_value(config_keys::QUIET_HOURS_END, "6")
            .await
            .ok()
            .and_then(|s| s.split(':').next().and_then(|h| h.parse::<i64>().ok()))
            .unwrap_or(config_keys::DEFAULT_QUIET_HOURS_END);
        let offset = self
            .state
            .get_config_value(
                config_keys::QUIET_HOURS_UTC_OFFSET_HOURS,
                &config_keys::DEFAULT_QUIET_HOURS_UTC_OFFSET_HOURS.to_string(),
            )
            .await
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(config_keys::DEFAULT_QUIET_HOURS_UTC_OFFSET_HOURS);

        use chrono::Timelike;
        let local_hour = (Utc::now().hour() as i64 + offset).rem_euclid(24);

        if start > end {
            local_hour >= start || local_hour < end
        } else {
            local_hour >= start && local_hour < end
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use sqlx::sqlite::SqlitePoolOptions;

    /// Builds a dispatcher whose `quiet_hours_utc_offset_hours` is computed so that
    /// "now" always lands on `target_local_hour`, regardless of wall-clock time.
    async fn dispatcher_at_local_hour(target_local_hour: i64, override_severe: bool) -> Dispatcher {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("../alert-state/migrations").run(&pool).await.unwrap();

        let offset = (target_local_hour - Utc::now().hour() as i64).rem_euclid(24);

        for (key, value) in [
            (config_keys::QUIET_HOURS_ENABLED, "true".to_string()),
            (config_keys::QUIET_HOURS_START, "22".to_string()),
            (config_keys::QUIET_HOURS_END, "6".to_string()),
            (config_keys::QUIET_HOURS_OVERRIDE_SEVERE, override_severe.to_string()),
            (config_keys::QUIET_HOURS_UTC_OFFSET_HOURS, offset.to_string()),
        ] {
            sqlx::query("INSERT INTO config (key, value) VALUES (?, ?)")
                .bind(key)
                .bind(value)
                .execute(&pool)
                .await
                .unwrap();
        }

        let state = Arc::new(StateManager::new(pool));
        Dispatcher::new(state, HashMap::new())
    }

    #[tokio::test]
    async fn overnight_window_blocks_moderate_severity() {
        let dispatcher = dispatcher_at_local_hour(23, true).await;
        assert!(dispatcher.is_quiet_hours(Severity::Moderate).await);
    }

    #[tokio::test]
    async fn severe_override_bypasses_overnight_window() {
        let dispatcher = dispatcher_at_local_hour(23, true).await;
        assert!(!dispatcher.is_quiet_hours(Severity::Severe).await);
    }

    #[tokio::test]
    async fn override_disabled_still_blocks_severe() {
        let dispatcher = dispatcher_at_local_hour(23, false).await;
        assert!(dispatcher.is_quiet_hours(Severity::Severe).await);
    }
}
