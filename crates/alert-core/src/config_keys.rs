//! Names of rows in the `config` table (spec.md §3, §6).
//!
//! Runtime-tunable behavior lives here rather than in process env vars so it can be
//! changed without a restart; process-level config (db path, bind address, log
//! format) stays in `alert-server`'s `clap::Parser` struct.

pub const POLL_INTERVAL_SECONDS: &str = "poll_interval_seconds";
pub const QUIET_HOURS_ENABLED: &str = "quiet_hours_enabled";
pub const QUIET_HOURS_START: &str = "quiet_hours_start";
pub const QUIET_HOURS_END: &str = "quiet_hours_end";
pub const QUIET_HOURS_UTC_OFFSET_HOURS: &str = "quiet_hours_utc_offset_hours";
pub const QUIET_HOURS_OVERRIDE_SEVERE: &str = "quiet_hours_override_severe";
pub const TRIAL_DURATION_HOURS: &str = "trial_duration_hours";
pub const MAX_TRIAL_REGISTRATIONS_PER_IP: &str = "max_trial_registrations_per_ip";

pub const DEFAULT_POLL_INTERVAL_SECONDS: i64 = 300;
pub const DEFAULT_QUIET_HOURS_START: i64 = 22;
pub const DEFAULT_QUIET_HOURS_END: i64 = 6;
pub const DEFAULT_QUIET_HOURS_UTC_OFFSET_HOURS: i64 = 7;
pub const DEFAULT_TRIAL_DURATION_HOURS: i64 = 24;
pub const DEFAULT_MAX_TRIAL_REGISTRATIONS_PER_IP: i64 = 5;
