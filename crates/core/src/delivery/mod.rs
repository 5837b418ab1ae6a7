//! Artifact delivery to external sinks.

pub mod fanout;
pub mod telegram;
pub mod tiktok;
pub mod traits;
pub mod types;

pub use fanout::DeliveryFanout;
pub use telegram::TelegramSink;
pub use tiktok::TikTokSink;
pub use traits::{Sink, SinkError};
pub use types::{DeliveryMetadata, DeliveryOutcome, DeliveryResult, SinkKind};
