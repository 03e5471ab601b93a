//! The background poll loop: start/stop/check-now controls around a periodic
//! fetch-match-store-notify cycle.
//!
//! Shutdown uses the same `tokio::sync::watch` signal this workspace's dispatcher
//! server uses for its background loops, rather than `AbortHandle` — the loop gets
//! a chance to finish its current cycle instead of being cut off mid-database-write.

use alert_core::config_keys;
use alert_core::error::Result as AlertResult;
use alert_core::summary::PollSummary;
use alert_core::trial::Trial;
use alert_core::upstream::UpstreamClient;
use alert_core::warning::Warning;
use alert_notify::{Dispatcher, TelegramSender};
use alert_state::StateManager;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub running: bool,
    pub last_poll: Option<DateTime<Utc>>,
    pub last_poll_result: Option<String>,
    pub next_poll: Option<DateTime<Utc>>,
    pub poll_interval_seconds: u64,
}

struct Inner {
    upstream: Arc<dyn UpstreamClient>,
    state: Arc<StateManager>,
    dispatcher: Arc<Dispatcher>,
    telegram: Arc<TelegramSender>,
    trial_bot_token: Option<String>,
    running: RwLock<bool>,
    last_poll: RwLock<Option<DateTime<Utc>>>,
    last_poll_result: RwLock<Option<String>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// Cheap to clone — every clone shares the same running loop and status cells.
#[derive(Clone)]
pub struct AlertEngine {
    inner: Arc<Inner>,
}

impl AlertEngine {
    pub fn new(
        upstream: Arc<dyn UpstreamClient>,
        state: Arc<StateManager>,
        dispatcher: Arc<Dispatcher>,
        telegram: Arc<TelegramSender>,
        trial_bot_token: Option<String>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                upstream,
                state,
                dispatcher,
                telegram,
                trial_bot_token,
                running: RwLock::new(false),
                last_poll: RwLock::new(None),
                last_poll_result: RwLock::new(None),
                shutdown_tx,
                shutdown_rx,
                task: Mutex::new(None),
            }),
        }
    }

    pub async fn start(&self) {
        let mut running = self.inner.running.write().await;
        if *running {
            tracing::warn!(event = "alert_engine.already_running");
            return;
        }
        *running = true;
        drop(running);

        let _ = self.inner.shutdown_tx.send(false);
        let engine = self.clone();
        let handle = tokio::spawn(async move { engine.poll_loop().await });
        *self.inner.task.lock().await = Some(handle);

        let _ = self
            .inner
            .state
            .log_activity("engine_started", "Alert engine started", "")
            .await;
        tracing::info!(event = "alert_engine.started");
    }

    pub async fn stop(&self) {
        let mut running = self.inner.running.write().await;
        if !*running {
            return;
        }
        *running = false;
        drop(running);

        let _ = self.inner.shutdown_tx.send(true);
        if let Some(handle) = self.inner.task.lock().await.take() {
            let _ = handle.await;
        }

        let _ = self
            .inner
            .state
            .log_activity("engine_stopped", "Alert engine stopped", "")
            .await;
        tracing::info!(event = "alert_engine.stopped");
    }

    pub async fn check_now(&self) -> PollSummary {
        self.run_poll_cycle().await
    }

    pub async fn status(&self) -> EngineStatus {
        let running = *self.inner.running.read().await;
        let last_poll = *self.inner.last_poll.read().await;
        let poll_interval_seconds = self.poll_interval_seconds().await;
        let next_poll = if running {
            last_poll.map(|t| t + chrono::Duration::seconds(poll_interval_seconds as i64))
        } else {
            None
        };

        EngineStatus {
            running,
            last_poll,
            last_poll_result: self.inner.last_poll_result.read().await.clone(),
            next_poll,
            poll_interval_seconds,
        }
    }

    async fn poll_interval_seconds(&self) -> u64 {
        self.inner
            .state
            .get_config_value(
                config_keys::POLL_INTERVAL_SECONDS,
                &config_keys::DEFAULT_POLL_INTERVAL_SECONDS.to_string(),
            )
            .await
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(config_keys::DEFAULT_POLL_INTERVAL_SECONDS as u64)
    }

    async fn poll_loop(&self) {
        let mut shutdown_rx = self.inner.shutdown_rx.clone();
        loop {
            if *shutdown_rx.borrow() {
                return;
            }

            self.run_poll_cycle().await;

            let poll_interval = self.poll_interval_seconds().await;

            tokio::select! {
                _ = tokio::time::sleep(std::time::Duration::from_secs(poll_interval)) => {}
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        return;
                    }
                }
            }
        }
    }

    /// Fetch, match, dedup-store, notify, sweep expiry, and run the trial
    /// sub-pipeline. Never returns an error — failures are folded into
    /// `summary.errors` so one bad cycle doesn't take down the loop.
    async fn run_poll_cycle(&self) -> PollSummary {
        let start = Utc::now();
        *self.inner.last_poll.write().await = Some(start);
        let mut summary = PollSummary::default();

        tracing::info!(event = "alert_engine.poll_cycle_start");

        let outcome = self.run_poll_cycle_inner(&mut summary).await;
        if let Err(err) = outcome {
            summary.errors.push(err.to_string());
            *self.inner.last_poll_result.write().await = Some(format!("error: {err}"));
            let _ = self
                .inner
                .state
                .log_activity("poll_error", &format!("Poll cycle failed: {err}"), "")
                .await;
            return summary;
        }

        let result = format!(
            "OK: {} new, {} dupes, {} expired",
            summary.alerts_stored, summary.duplicates_skipped, summary.alerts_expired
        );
        *self.inner.last_poll_result.write().await = Some(result.clone());

        let details = serde_json::to_string(&summary).unwrap_or_default();
        let _ = self
            .inner
            .state
            .log_activity("poll_completed", &result, &details)
            .await;

        summary
    }

    async fn run_poll_cycle_inner(&self, summary: &mut PollSummary) -> AlertResult<()> {
        let nowcasts = self.inner.upstream.list_nowcast().await?;
        summary.nowcasts_seen = nowcasts.len() as u32;

        if nowcasts.is_empty() {
            tracing::info!(event = "alert_engine.poll_cycle_no_warnings");
            return Ok(());
        }

        let locations = self.inner.state.get_enabled_locations().await?;
        if locations.is_empty() {
            tracing::info!(event = "alert_engine.poll_cycle_no_locations");
            return Ok(());
        }
        let channels = self.inner.state.get_enabled_channels().await?;

        for item in &nowcasts {
            let detail = match self.inner.upstream.fetch_detail(&item.code).await {
                Ok(detail) => detail,
                Err(err) => {
                    summary.errors.push(format!("{}: {err}", item.code));
                    continue;
                }
            };

            for warning in &detail.warnings {
                if warning.is_expired {
                    continue;
                }
                summary.warnings_seen += 1;

                let matches = alert_matcher::match_locations(warning, &locations);
                summary.matches_found += matches.len() as u32;

                for matched in &matches {
                    if self
                        .inner
                        .state
                        .is_duplicate(&item.code, matched.location_id)
                        .await
                        .unwrap_or(false)
                    {
                        summary.duplicates_skipped += 1;
                        continue;
                    }

                    let alert_id = match self
                        .inner
                        .state
                        .store_alert(warning, matched, &item.code, &item.province)
                        .await
                    {
                        Ok(id) => id,
                        Err(err) if err.is_duplicate() => {
                            summary.duplicates_skipped += 1;
                            continue;
                        }
                        Err(err) => {
                            summary.errors.push(err.to_string());
                            continue;
                        }
                    };
                    summary.alerts_stored += 1;

                    let Some(location) = locations.iter().find(|l| l.id == matched.location_id)
                    else {
                        continue;
                    };

                    for channel in &channels {
                        let sent = self
                            .inner
                            .dispatcher
                            .send(alert_id, warning, location, matched, channel, false)
                            .await;
                        if sent {
                            summary.deliveries_sent += 1;
                        } else {
                            summary.deliveries_failed += 1;
                        }
                    }
                }
            }
        }

        let expired = self.inner.state.mark_expired_alerts().await?;
        summary.alerts_expired = expired.len() as u32;

        summary.trials_notified = self.process_trials(&nowcasts).await;
        summary.trials_expired = self.expire_trials().await;

        Ok(())
    }

    /// Re-fetches detail per nowcast item (the original does the same rather than
    /// reuse the already-matched `Alert` set) and matches inline against each
    /// trial's own kecamatan/kabupaten and severity threshold.
    async fn process_trials(&self, nowcasts: &[alert_core::warning::NowcastSummary]) -> u32 {
        let Some(bot_token) = &self.inner.trial_bot_token else {
            return 0;
        };

        let trials = match self.inner.state.get_active_trials().await {
            Ok(t) => t,
            Err(_) => return 0,
        };
        if trials.is_empty() {
            return 0;
        }

        let mut sent = 0u32;
        for item in nowcasts {
            let Ok(detail) = self.inner.upstream.fetch_detail(&item.code).await else {
                continue;
            };

            for warning in &detail.warnings {
                if warning.is_expired {
                    continue;
                }
                for trial in &trials {
                    if !trial_matches(trial, warning) {
                        continue;
                    }
                    let message = trial_message(warning, trial);
                    if self
                        .inner
                        .telegram
                        .send_raw(bot_token, &trial.chat_id, &message)
                        .await
                        .is_ok()
                    {
                        sent += 1;
                    }
                }
            }
        }
        sent
    }

    async fn expire_trials(&self) -> u32 {
        let expired = match self.inner.state.expire_trials().await {
            Ok(t) => t,
            Err(_) => return 0,
        };
        if expired.is_empty() {
            return 0;
        }

        if let Some(bot_token) = &self.inner.trial_bot_token {
            for trial in &expired {
                let _ = self
                    .inner
                    .telegram
                    .send_raw(bot_token, &trial.chat_id, &alert_notify::trial_messages::expiry())
                    .await;
            }
        }

        tracing::info!(event = "alert_engine.trials_expired", count = expired.len());
        expired.len() as u32
    }

    /// Register a new trial subscription, subject to the one-active-trial-per-chat
    /// and per-IP rate limit rules, and send the confirmation message.
    pub async fn register_trial(
        &self,
        chat_id: &str,
        kecamatan: &str,
        kabupaten: &str,
        severity_threshold: &str,
        ip_address: &str,
    ) -> AlertResult<Trial> {
        if self.inner.state.has_active_trial_for_chat(chat_id).await? {
            return Err(alert_core::error::Error::Other(anyhow::anyhow!(
                "chat already has an active trial"
            )));
        }

        let max_per_ip = self
            .inner
            .state
            .get_config_value(
                config_keys::MAX_TRIAL_REGISTRATIONS_PER_IP,
                &config_keys::DEFAULT_MAX_TRIAL_REGISTRATIONS_PER_IP.to_string(),
            )
            .await
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(config_keys::DEFAULT_MAX_TRIAL_REGISTRATIONS_PER_IP);
        let recent = self.inner.state.count_recent_trial_registrations(ip_address).await?;
        if recent >= max_per_ip {
            return Err(alert_core::error::Error::Other(anyhow::anyhow!(
                "too many trial registrations from this IP"
            )));
        }

        let duration_hours = self
            .inner
            .state
            .get_config_value(
                config_keys::TRIAL_DURATION_HOURS,
                &config_keys::DEFAULT_TRIAL_DURATION_HOURS.to_string(),
            )
            .await
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(config_keys::DEFAULT_TRIAL_DURATION_HOURS);
        let expires_at = Utc::now() + chrono::Duration::hours(duration_hours);

        let id = self
            .inner
            .state
            .register_trial(chat_id, kecamatan, kabupaten, severity_threshold, ip_address, expires_at)
            .await?;

        if let Some(bot_token) = &self.inner.trial_bot_token {
            let message = alert_notify::trial_messages::registration_confirmation(
                kecamatan,
                kabupaten,
                severity_threshold,
                duration_hours,
            );
            let _ = self.inner.telegram.send_raw(bot_token, chat_id, &message).await;
        }

        let _ = self
            .inner
            .state
            .log_activity(
                "trial_registered",
                &format!("Trial registered for chat {chat_id}: {kecamatan}"),
                "",
            )
            .await;

        self.inner.state.get_trial(id).await
    }

    /// Cancel a trial subscription and send the cancellation message.
    pub async fn cancel_trial(&self, trial_id: i64) -> AlertResult<()> {
        let trial = self.inner.state.get_trial(trial_id).await?;
        self.inner.state.cancel_trial(trial_id).await?;

        if let Some(bot_token) = &self.inner.trial_bot_token {
            let _ = self
                .inner
                .telegram
                .send_raw(bot_token, &trial.chat_id, &alert_notify::trial_messages::cancellation())
                .await;
        }

        let _ = self
            .inner
            .state
            .log_activity("trial_cancelled", &format!("Trial cancelled for chat {}", trial.chat_id), "")
            .await;

        Ok(())
    }
}

fn trial_matches(trial: &Trial, warning: &Warning) -> bool {
    if let Some(threshold) = trial.threshold() {
        if warning.severity < threshold {
            return false;
        }
    }

    let description_lower = warning.description.to_lowercase();
    let kecamatan = trial.kecamatan.to_lowercase();
    if !kecamatan.is_empty() && description_lower.contains(&kecamatan) {
        return true;
    }

    let kabupaten = trial.kabupaten.to_lowercase();
    if kabupaten.is_empty() {
        return false;
    }
    warning
        .areas
        .iter()
        .any(|a| a.name.to_lowercase().contains(&kabupaten))
}

fn trial_message(warning: &Warning, trial: &Trial) -> String {
    let mut location = trial.kecamatan.clone();
    if !trial.kabupaten.is_empty() {
        location = format!("{location}, {}", trial.kabupaten);
    }
    let description = alert_notify::formatter::truncate(&warning.description, 300);

    format!(
        "<b>Peringatan Cuaca — {}</b>\nSeverity: {}\n\nLokasi Anda: {location}\nBerlaku: {}\nHingga: {}\n\n{description}\n\n<i>BMKG Alert — Trial Mode</i>",
        warning.event,
        warning.severity,
        non_empty(&warning.effective),
        non_empty(&warning.expires),
    )
}

fn non_empty(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alert_core::error::Result as CoreResult;
    use alert_core::warning::{NowcastDetail, NowcastSummary, WarningArea};
    use async_trait::async_trait;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::collections::HashMap;

    struct FakeUpstream {
        detail: Warning,
    }

    #[async_trait]
    impl UpstreamClient for FakeUpstream {
        async fn list_nowcast(&self) -> CoreResult<Vec<NowcastSummary>> {
            Ok(vec![NowcastSummary {
                code: "BMKG-1".into(),
                province: "Jawa Barat".into(),
                description: String::new(),
                published_at: String::new(),
                detail_url: String::new(),
            }])
        }

        async fn fetch_detail(&self, _code: &str) -> CoreResult<NowcastDetail> {
            Ok(NowcastDetail {
                province: "Jawa Barat".into(),
                warnings: vec![self.detail.clone()],
            })
        }
    }

    async fn build_engine() -> AlertEngine {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("../alert-state/migrations").run(&pool).await.unwrap();
        let state = Arc::new(StateManager::new(pool.clone()));

        sqlx::query("INSERT INTO locations (label, kecamatan, kabupaten, province, kecamatan_code, enabled) VALUES ('x', 'Cimahi Utara', 'Kota Cimahi', 'Jawa Barat', '32.77.01.1001', 1)")
            .execute(&pool)
            .await
            .unwrap();

        let warning = Warning {
            identifier: "W1".into(),
            event: "Hujan Lebat".into(),
            severity: alert_core::severity::Severity::Severe,
            urgency: String::new(),
            certainty: String::new(),
            effective: String::new(),
            expires: String::new(),
            headline: String::new(),
            description: "Hujan lebat di Cimahi Utara".into(),
            sender: String::new(),
            infographic_url: String::new(),
            areas: vec![WarningArea {
                name: "Kota Cimahi".into(),
                polygon: Vec::new(),
            }],
            is_expired: false,
        };

        let upstream: Arc<dyn UpstreamClient> = Arc::new(FakeUpstream { detail: warning });
        let dispatcher = Arc::new(Dispatcher::new(state.clone(), HashMap::new()));
        let telegram = Arc::new(TelegramSender::new(reqwest::Client::new()));

        AlertEngine::new(upstream, state, dispatcher, telegram, None)
    }

    #[tokio::test]
    async fn poll_cycle_stores_then_dedups() {
        let engine = build_engine().await;
        let first = engine.check_now().await;
        assert_eq!(first.alerts_stored, 1);
        assert_eq!(first.duplicates_skipped, 0);

        let second = engine.check_now().await;
        assert_eq!(second.alerts_stored, 0);
        assert_eq!(second.duplicates_skipped, 1);
    }

    #[tokio::test]
    async fn status_reports_last_poll_result() {
        let engine = build_engine().await;
        engine.check_now().await;
        let status = engine.status().await;
        assert!(status.last_poll.is_some());
        assert!(status.last_poll_result.unwrap().starts_with("OK"));
    }
}
