//! Config validation beyond what serde can express.

use std::collections::HashSet;

use super::loader::ConfigError;
use super::types::Config;

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for account in &config.accounts {
        if account.id.trim().is_empty() {
            return Err(ConfigError::Invalid("account id must not be empty".to_string()));
        }
        if account.api_key.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "account {} has an empty api_key",
                account.id
            )));
        }
        if !seen.insert(account.id.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "duplicate account id: {}",
                account.id
            )));
        }
    }

    if config.pool.disable_threshold == 0 {
        return Err(ConfigError::Invalid(
            "pool.disable_threshold must be at least 1".to_string(),
        ));
    }
    if config.pool.cooldown_max_secs < config.pool.cooldown_base_secs {
        return Err(ConfigError::Invalid(
            "pool.cooldown_max_secs must be >= pool.cooldown_base_secs".to_string(),
        ));
    }

    if let Some(bot) = &config.bot {
        if bot.enabled {
            let telegram_ok = config
                .telegram
                .as_ref()
                .map(|t| !t.bot_token.trim().is_empty())
                .unwrap_or(false);
            if !telegram_ok {
                return Err(ConfigError::Invalid(
                    "bot.enabled requires telegram.bot_token".to_string(),
                ));
            }
        }
    }

    Ok(())
}
