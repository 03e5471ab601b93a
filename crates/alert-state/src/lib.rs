//! Persistence: dedup, expiry tracking, delivery logging, and the config/trial
//! tables, all against a single SQLite connection.
//!
//! Mirrors the original `StateManager` one-to-one, including its check-then-insert
//! dedup: callers ask `is_duplicate` before calling `store_alert`, the same order
//! `app/engine/worker.py`'s poll loop uses. The `UNIQUE (bmkg_alert_code,
//! matched_location_id)` constraint on `alerts` still backstops `store_alert`
//! itself (turning a collision into `Error::Duplicate`), since the original's own
//! check-then-insert isn't race-free either — it's just the algorithm the spec
//! names as the `is_duplicate` operation.

use alert_core::alert::{Alert, AlertStatus};
use alert_core::channel::{ChannelKind, NotificationChannel};
use alert_core::delivery::DeliveryStatus;
use alert_core::error::{Error, Result};
use alert_core::location::Location;
use alert_core::match_result::{Match, MatchType};
use alert_core::trial::Trial;
use alert_core::warning::Warning;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

pub mod pool {
    use super::*;

    /// Open the alert store, creating the file if needed and matching the original
    /// `aiosqlite` connection's pragmas (WAL journaling, foreign keys on).
    ///
    /// A single-connection pool: this process is the only writer, and SQLite doesn't
    /// benefit from a larger pool the way a networked database would.
    pub async fn connect(db_path: &str) -> Result<SqlitePool> {
        let opts = SqliteConnectOptions::from_str(&format!("sqlite://{db_path}"))
            .map_err(anyhow::Error::from)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await.map_err(anyhow::Error::from)?;

        Ok(pool)
    }
}

fn match_type_str(m: MatchType) -> &'static str {
    match m {
        MatchType::Kecamatan => "kecamatan",
        MatchType::Kabupaten => "kabupaten",
    }
}

fn parse_match_type(s: &str) -> MatchType {
    match s {
        "kabupaten" => MatchType::Kabupaten,
        _ => MatchType::Kecamatan,
    }
}

fn alert_from_row(row: &sqlx::sqlite::SqliteRow) -> Alert {
    let severity: String = row.get("severity");
    let status: String = row.get("status");
    let match_type: String = row.get("match_type");
    Alert {
        id: row.get("id"),
        bmkg_alert_code: row.get("bmkg_alert_code"),
        matched_location_id: row.get("matched_location_id"),
        match_type: parse_match_type(&match_type),
        matched_text: row.get("matched_text"),
        event: row.get("event"),
        severity: alert_core::severity::Severity::parse_lenient(&severity),
        headline: row.get("headline"),
        description: row.get("description"),
        province: row.get("province"),
        expires: row.get("expires"),
        polygon_data: row.get("polygon_data"),
        status: match status.as_str() {
            "expired" => AlertStatus::Expired,
            "cancelled" => AlertStatus::Cancelled,
            _ => AlertStatus::Active,
        },
        expired_notified: row.get::<i64, _>("expired_notified") != 0,
        created_at: row.get("created_at"),
    }
}

pub struct StateManager {
    pool: SqlitePool,
}

impl StateManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// True if `(bmkg_alert_code, matched_location_id)` already has a row — the
    /// check half of the check-then-insert dedup the poll loop runs before
    /// `store_alert`.
    pub async fn is_duplicate(&self, alert_code: &str, location_id: i64) -> Result<bool> {
        let row = sqlx::query(
            "SELECT 1 as present FROM alerts WHERE bmkg_alert_code = ? AND matched_location_id = ? LIMIT 1",
        )
        .bind(alert_code)
        .bind(location_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    /// Persist a new alert. Returns `Error::Duplicate` if this
    /// `(bmkg_alert_code, matched_location_id)` pair already has a row — callers
    /// should have already checked `is_duplicate`, but the `UNIQUE` constraint on
    /// `alerts` backstops the race between the check and this insert.
    pub async fn store_alert(
        &self,
        warning: &Warning,
        matched: &Match,
        alert_code: &str,
        province: &str,
    ) -> Result<i64> {
        let polygon_data = serde_json::to_string(&warning.areas).unwrap_or_default();
        let id = sqlx::query(
            r#"
            INSERT INTO alerts (
                bmkg_alert_code, matched_location_id, match_type, matched_text,
                event, severity, headline, description, province, expires,
                polygon_data, status
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'active')
            "#,
        )
        .bind(alert_code)
        .bind(matched.location_id)
        .bind(match_type_str(matched.match_type))
        .bind(&matched.matched_text)
        .bind(&warning.event)
        .bind(warning.severity.to_string().to_lowercase())
        .bind(&warning.headline)
        .bind(&warning.description)
        .bind(province)
        .bind(&warning.expires)
        .bind(polygon_data)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        tracing::info!(
            event = "alert_state.alert_stored",
            alert_id = id,
            code = alert_code,
            location_id = matched.location_id,
            "alert stored"
        );

        Ok(id)
    }

    /// Mark alerts whose `expires` timestamp has passed as expired, returning the
    /// rows that just transitioned so callers can send "all clear" notifications.
    ///
    /// An empty `expires` string means "never expires" and is excluded, matching the
    /// original's `expires != ''` guard.
    pub async fn mark_expired_alerts(&self) -> Result<Vec<Alert>> {
        let now = Utc::now().to_rfc3339();

        let rows = sqlx::query(
            "SELECT * FROM alerts WHERE status = 'active' AND expires != '' AND expires < ?",
        )
        .bind(&now)
        .fetch_all(&self.pool)
        .await?;

        let expired: Vec<Alert> = rows.iter().map(alert_from_row).collect();

        for alert in &expired {
            sqlx::query("UPDATE alerts SET status = 'expired' WHERE id = ?")
                .bind(alert.id)
                .execute(&self.pool)
                .await?;
            tracing::info!(event = "alert_state.alert_expired", alert_id = alert.id);
        }

        Ok(expired)
    }

    pub async fn get_active_alerts(&self) -> Result<Vec<Alert>> {
        let rows = sqlx::query("SELECT * FROM alerts WHERE status = 'active' ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(alert_from_row).collect())
    }

    pub async fn get_alert_count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM alerts WHERE status = 'active'")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("cnt"))
    }

    pub async fn log_activity(&self, event_type: &str, message: &str, details: &str) -> Result<()> {
        sqlx::query("INSERT INTO activity_log (event_type, message, details) VALUES (?, ?, ?)")
            .bind(event_type)
            .bind(message)
            .bind(details)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn log_delivery(
        &self,
        alert_id: i64,
        channel: ChannelKind,
        status: DeliveryStatus,
        detail: &str,
    ) -> Result<()> {
        let status_str = match status {
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Failed => "failed",
            DeliveryStatus::SkippedQuietHours => "skipped_quiet_hours",
            DeliveryStatus::SkippedSeverity => "skipped_severity",
        };
        sqlx::query("INSERT INTO deliveries (alert_id, channel, status, detail) VALUES (?, ?, ?, ?)")
            .bind(alert_id)
            .bind(channel.as_str())
            .bind(status_str)
            .bind(detail)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Update the health fields on a channel row after a send attempt.
    pub async fn record_channel_outcome(
        &self,
        channel_id: i64,
        success: bool,
        error: Option<&str>,
    ) -> Result<()> {
        if success {
            sqlx::query(
                "UPDATE notification_channels SET last_success_at = ?, last_error = NULL WHERE id = ?",
            )
            .bind(Utc::now().to_rfc3339())
            .bind(channel_id)
            .execute(&self.pool)
            .await?;
        } else {
            sqlx::query("UPDATE notification_channels SET last_error = ? WHERE id = ?")
                .bind(error.unwrap_or(""))
                .bind(channel_id)
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    pub async fn get_enabled_locations(&self) -> Result<Vec<Location>> {
        let rows = sqlx::query("SELECT * FROM locations WHERE enabled = 1")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|row| Location {
                id: row.get("id"),
                label: row.get("label"),
                province_code: row.get("province_code"),
                province: row.get("province"),
                kabupaten_code: row.get("kabupaten_code"),
                kabupaten: row.get("kabupaten"),
                kecamatan_code: row.get("kecamatan_code"),
                kecamatan: row.get("kecamatan"),
                latitude: row.get("latitude"),
                longitude: row.get("longitude"),
                enabled: row.get::<i64, _>("enabled") != 0,
            })
            .collect())
    }

    pub async fn get_enabled_channels(&self) -> Result<Vec<NotificationChannel>> {
        let rows = sqlx::query("SELECT * FROM notification_channels WHERE enabled = 1")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| {
                let kind: String = row.get("kind");
                let config_text: String = row.get("config");
                Ok(NotificationChannel {
                    id: row.get("id"),
                    kind: parse_channel_kind(&kind),
                    label: row.get("label"),
                    config: serde_json::from_str(&config_text).unwrap_or(serde_json::Value::Null),
                    enabled: row.get::<i64, _>("enabled") != 0,
                    last_success_at: row.get("last_success_at"),
                    last_error: row.get("last_error"),
                })
            })
            .collect()
    }

    pub async fn get_config_value(&self, key: &str, default: &str) -> Result<String> {
        let row = sqlx::query("SELECT value FROM config WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("value")).unwrap_or_else(|| default.to_string()))
    }

    // ── Trial subscriptions ─────────────────────────────────────────────────

    pub async fn get_active_trials(&self) -> Result<Vec<Trial>> {
        let rows = sqlx::query("SELECT * FROM trials WHERE expires_at > CURRENT_TIMESTAMP")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(trial_from_row).collect())
    }

    /// Trials whose `expires_at` has passed but haven't been sent a farewell
    /// message yet. Marks them notified in the same call.
    pub async fn expire_trials(&self) -> Result<Vec<Trial>> {
        let rows = sqlx::query(
            "SELECT * FROM trials WHERE expires_at <= CURRENT_TIMESTAMP AND expired_notified = 0",
        )
        .fetch_all(&self.pool)
        .await?;

        let expired: Vec<Trial> = rows.iter().map(trial_from_row).collect();

        for trial in &expired {
            sqlx::query("UPDATE trials SET expired_notified = 1 WHERE id = ?")
                .bind(trial.id)
                .execute(&self.pool)
                .await?;
        }

        Ok(expired)
    }

    /// Count trial registrations from `ip` in the last hour, for the
    /// max-registrations-per-IP rate limit.
    pub async fn count_recent_trial_registrations(&self, ip: &str) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) as cnt FROM trials WHERE ip_address = ? AND registered_at > datetime('now', '-1 hour')",
        )
        .bind(ip)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("cnt"))
    }

    pub async fn get_trial(&self, trial_id: i64) -> Result<Trial> {
        let row = sqlx::query("SELECT * FROM trials WHERE id = ?")
            .bind(trial_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| trial_from_row(&r)).ok_or(Error::NotFound("trial"))
    }

    pub async fn has_active_trial_for_chat(&self, chat_id: &str) -> Result<bool> {
        let row = sqlx::query(
            "SELECT id FROM trials WHERE chat_id = ? AND expires_at > CURRENT_TIMESTAMP",
        )
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    pub async fn register_trial(
        &self,
        chat_id: &str,
        kecamatan: &str,
        kabupaten: &str,
        severity_threshold: &str,
        ip_address: &str,
        expires_at: chrono::DateTime<Utc>,
    ) -> Result<i64> {
        let id = sqlx::query(
            r#"
            INSERT INTO trials (chat_id, kecamatan, kabupaten, severity_threshold, ip_address, expires_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(chat_id)
        .bind(kecamatan)
        .bind(kabupaten)
        .bind(severity_threshold)
        .bind(ip_address)
        .bind(expires_at.to_rfc3339())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();
        Ok(id)
    }

    /// Cancel a trial by pulling its expiry into the past, the same trick the
    /// original uses instead of a hard delete — keeps the row for the rate limit.
    pub async fn cancel_trial(&self, trial_id: i64) -> Result<()> {
        sqlx::query("UPDATE trials SET expires_at = CURRENT_TIMESTAMP WHERE id = ?")
            .bind(trial_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn parse_channel_kind(s: &str) -> ChannelKind {
    match s {
        "discord" => ChannelKind::Discord,
        "slack" => ChannelKind::Slack,
        "email" => ChannelKind::Email,
        "webhook" => ChannelKind::Webhook,
        _ => ChannelKind::Telegram,
    }
}

fn trial_from_row(row: &sqlx::sqlite::SqliteRow) -> Trial {
    Trial {
        id: row.get("id"),
        chat_id: row.get("chat_id"),
        kecamatan: row.get("kecamatan"),
        kabupaten: row.get("kabupaten"),
        severity_threshold: row.get("severity_threshold"),
        ip_address: row.get("ip_address"),
        registered_at: row.get("registered_at"),
        expires_at: row.get("expires_at"),
        expired_notified: row.get::<i64, _>("expired_notified") != 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alert_core::warning::WarningArea;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    fn sample_warning() -> Warning {
        Warning {
            identifier: "W1".into(),
            event: "Hujan Lebat".into(),
            severity: alert_core::severity::Severity::Severe,
            urgency: String::new(),
            certainty: String::new(),
            effective: String::new(),
            expires: String::new(),
            headline: "Waspada hujan lebat".into(),
            description: "Hujan lebat di Cimahi Utara".into(),
            sender: String::new(),
            infographic_url: String::new(),
            areas: vec![WarningArea {
                name: "Kota Cimahi".into(),
                polygon: Vec::new(),
            }],
            is_expired: false,
        }
    }

    #[tokio::test]
    async fn store_then_duplicate_fails() {
        let pool = test_pool().await;
        let state = StateManager::new(pool);
        let warning = sample_warning();
        let matched = Match {
            location_id: 1,
            match_type: MatchType::Kecamatan,
            matched_text: "Cimahi Utara".into(),
        };

        sqlx::query("INSERT INTO locations (id, label, kecamatan, kabupaten, province, kecamatan_code, enabled) VALUES (1, 'x', 'Cimahi Utara', '', '', '32.77.01.1001', 1)")
            .execute(&state.pool)
            .await
            .unwrap();

        assert!(!state.is_duplicate("BMKG-1", 1).await.unwrap());
        state.store_alert(&warning, &matched, "BMKG-1", "Jawa Barat").await.unwrap();
        assert!(state.is_duplicate("BMKG-1", 1).await.unwrap());
        let err = state.store_alert(&warning, &matched, "BMKG-1", "Jawa Barat").await.unwrap_err();
        assert!(err.is_duplicate());
    }

    #[tokio::test]
    async fn expiry_sweep_only_moves_past_deadlines() {
        let pool = test_pool().await;
        let state = StateManager::new(pool);

        sqlx::query("INSERT INTO locations (id, label, kecamatan_code, enabled) VALUES (1, 'x', '32.77.01.1001', 1)")
            .execute(&state.pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO alerts (bmkg_alert_code, matched_location_id, match_type, matched_text, expires, status) VALUES ('A', 1, 'kecamatan', 'x', '2000-01-01T00:00:00Z', 'active')",
        )
        .execute(&state.pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO alerts (bmkg_alert_code, matched_location_id, match_type, matched_text, expires, status) VALUES ('B', 1, 'kecamatan', 'x', '', 'active')",
        )
        .execute(&state.pool)
        .await
        .unwrap();

        let expired = state.mark_expired_alerts().await.unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].bmkg_alert_code, "A");
        assert_eq!(state.get_active_alerts().await.unwrap().len(), 1);
    }
}
