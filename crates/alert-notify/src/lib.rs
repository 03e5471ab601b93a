//! Per-channel senders plus the quiet-hours-aware dispatcher that routes to them.

pub mod config;
pub mod dispatcher;
pub mod formatter;
pub mod sender;
pub mod senders;
pub mod trial_messages;

pub use dispatcher::Dispatcher;
pub use sender::ChannelSender;
pub use senders::discord::DiscordSender;
pub use senders::email::{EmailSender, SmtpDefaults};
pub use senders::slack::SlackSender;
pub use senders::telegram::TelegramSender;
pub use senders::webhook::WebhookSender;
