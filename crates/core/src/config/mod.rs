//! Configuration loading, types and validation.

pub mod loader;
pub mod types;
pub mod validate;

pub use loader::{load_config, load_config_from_str, ConfigError};
pub use types::{
    AccountConfig, BotConfig, Config, DatabaseConfig, GeneratorConfig, SanitizedConfig,
    SchedulerSettings, ScreenwriterConfig, ServerConfig, TelegramConfig, TikTokConfig,
};
