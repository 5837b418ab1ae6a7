//! Configuration types.
//!
//! Everything is deserialized from TOML merged with `REELFORGE_`
//! environment variables; every field has a default so a minimal config
//! file is enough to boot.

use serde::{Deserialize, Serialize};

use crate::delivery::SinkKind;
use crate::pool::{AccountSeed, CredentialRef, PoolConfig};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub screenwriter: ScreenwriterConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    /// Upstream generation accounts shared by all tasks.
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
    #[serde(default)]
    pub tiktok: Option<TikTokConfig>,
    #[serde(default)]
    pub bot: Option<BotConfig>,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
}

impl Config {
    pub fn account_seeds(&self) -> Vec<AccountSeed> {
        self.accounts
            .iter()
            .map(|account| AccountSeed {
                id: account.id.clone(),
                credential: CredentialRef::new(account.api_key.clone()),
            })
            .collect()
    }

    pub fn sanitized(&self) -> SanitizedConfig {
        SanitizedConfig {
            server: self.server.clone(),
            database_path: self.database.path.clone(),
            screenwriter_model: self.screenwriter.model.clone(),
            screenwriter_api_key_configured: !self.screenwriter.api_key.is_empty(),
            generator_model: self.generator.model.clone(),
            account_count: self.accounts.len(),
            telegram_configured: self.telegram.is_some(),
            tiktok_configured: self.tiktok.is_some(),
            bot_enabled: self.bot.as_ref().map(|b| b.enabled).unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

fn default_database_path() -> String {
    "reelforge.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenwriterConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_google_api_base")]
    pub api_base: String,
    #[serde(default = "default_screenwriter_model")]
    pub model: String,
    #[serde(default = "default_screenwriter_timeout")]
    pub request_timeout_secs: u64,
}

fn default_google_api_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_screenwriter_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_screenwriter_timeout() -> u64 {
    60
}

impl Default for ScreenwriterConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: default_google_api_base(),
            model: default_screenwriter_model(),
            request_timeout_secs: default_screenwriter_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_google_api_base")]
    pub api_base: String,
    #[serde(default = "default_generator_model")]
    pub model: String,
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
    #[serde(default = "default_duration_seconds")]
    pub duration_seconds: u32,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
    /// Directory finished videos are downloaded into.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_generator_timeout")]
    pub request_timeout_secs: u64,
}

fn default_generator_model() -> String {
    "veo-3.1-fast-generate-preview".to_string()
}

fn default_aspect_ratio() -> String {
    "9:16".to_string()
}

fn default_duration_seconds() -> u32 {
    8
}

fn default_poll_interval_ms() -> u64 {
    5000
}

fn default_max_poll_attempts() -> u32 {
    60
}

fn default_output_dir() -> String {
    "artifacts".to_string()
}

fn default_generator_timeout() -> u64 {
    120
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_base: default_google_api_base(),
            model: default_generator_model(),
            aspect_ratio: default_aspect_ratio(),
            duration_seconds: default_duration_seconds(),
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
            output_dir: default_output_dir(),
            request_timeout_secs: default_generator_timeout(),
        }
    }
}

/// One upstream generation account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub id: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub chat_id: String,
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,
    #[serde(default = "default_sink_timeout")]
    pub request_timeout_secs: u64,
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_sink_timeout() -> u64 {
    120
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            api_base: default_telegram_api_base(),
            request_timeout_secs: default_sink_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TikTokConfig {
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_tiktok_api_base")]
    pub api_base: String,
    #[serde(default = "default_sink_timeout")]
    pub request_timeout_secs: u64,
}

fn default_tiktok_api_base() -> String {
    "https://open.tiktokapis.com".to_string()
}

impl Default for TikTokConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            api_base: default_tiktok_api_base(),
            request_timeout_secs: default_sink_timeout(),
        }
    }
}

/// Telegram bot listener settings. The listener reuses the telegram
/// sink's token for `getUpdates`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Chat ids allowed to submit ideas. Messages from anyone else are
    /// ignored.
    #[serde(default)]
    pub authorized_chat_ids: Vec<String>,
    #[serde(default = "default_bot_poll_interval")]
    pub poll_interval_secs: u64,
    /// Sinks used for bot-submitted tasks.
    #[serde(default = "default_bot_targets")]
    pub targets: Vec<SinkKind>,
}

fn default_bot_poll_interval() -> u64 {
    5
}

fn default_bot_targets() -> Vec<SinkKind> {
    vec![SinkKind::Telegram]
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            authorized_chat_ids: Vec::new(),
            poll_interval_secs: default_bot_poll_interval(),
            targets: default_bot_targets(),
        }
    }
}

/// Operational scheduler knobs. The schedule itself is runtime state,
/// configured over the API and persisted in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerSettings {
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
}

fn default_tick_interval_secs() -> u64 {
    15
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval_secs(),
        }
    }
}

/// Config view safe to expose over the API: secrets reduced to booleans.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database_path: String,
    pub screenwriter_model: String,
    pub screenwriter_api_key_configured: bool,
    pub generator_model: String,
    pub account_count: usize,
    pub telegram_configured: bool,
    pub tiktok_configured: bool,
    pub bot_enabled: bool,
}
