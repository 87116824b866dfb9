//! Notification delivery
//!
//! Formats alert messages and sends them through the chat channel using a
//! cached credential.

pub mod credentials;
pub mod dispatcher;
pub mod format;

pub use credentials::{CredentialCache, CredentialError, EnvSecretSource, SecretSource};
pub use dispatcher::{DispatchError, NotificationChannel, OutboundMessage, TelegramDispatcher};
pub use format::format_alert_message;
