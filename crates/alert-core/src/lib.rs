//! Shared domain types for the alert engine.
//!
//! Every other crate in this workspace depends on this one rather than on each
//! other: `alert-matcher` and `alert-state` and `alert-notify` all speak `Warning`,
//! `Location`, `Alert`, `Delivery` from here, so none of them need to depend on the
//! others directly.

pub mod alert;
pub mod channel;
pub mod config_keys;
pub mod delivery;
pub mod error;
pub mod location;
pub mod match_result;
pub mod severity;
pub mod summary;
pub mod trial;
pub mod upstream;
pub mod warning;

pub use alert::{Alert, AlertStatus};
pub use channel::{ChannelKind, NotificationChannel};
pub use delivery::{Delivery, DeliveryStatus};
pub use error::{Error, Result};
pub use location::Location;
pub use match_result::{Match, MatchType};
pub use severity::Severity;
pub use summary::PollSummary;
pub use trial::Trial;
pub use upstream::UpstreamClient;
pub use warning::{NowcastDetail, NowcastSummary, Warning, WarningArea};
