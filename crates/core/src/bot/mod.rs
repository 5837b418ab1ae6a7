//! Inbound bot listener: ideas submitted via chat messages.

pub mod poller;
pub mod telegram_source;

pub use poller::{BotError, BotUpdate, UpdatePoller, UpdateSource};
pub use telegram_source::TelegramUpdateSource;
