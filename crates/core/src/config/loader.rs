//! Configuration loading via figment (TOML file + environment).

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use super::types::Config;
use super::validate::validate_config;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(String),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Load and validate configuration from a TOML file, with
/// `REELFORGE_`-prefixed environment variables layered on top
/// (e.g. `REELFORGE_SERVER_PORT=9090`).
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("REELFORGE_").split("_"))
        .extract()
        .map_err(|e| ConfigError::Parse(e.to_string()))?;

    validate_config(&config)?;
    Ok(config)
}

/// Parse configuration from a TOML string. Used by tests.
pub fn load_config_from_str(toml: &str) -> Result<Config, ConfigError> {
    let config: Config = Figment::new()
        .merge(Toml::string(toml))
        .extract()
        .map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let result = load_config("/nonexistent/reelforge.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_minimal_config() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.pool.disable_threshold, 3);
    }

    #[test]
    fn test_full_config() {
        let toml = r#"
            [server]
            port = 9090

            [screenwriter]
            api_key = "sw-key"

            [generator]
            duration_seconds = 6

            [pool]
            acquire_timeout_secs = 10

            [[accounts]]
            id = "acc-1"
            api_key = "k1"

            [[accounts]]
            id = "acc-2"
            api_key = "k2"

            [telegram]
            bot_token = "123:abc"
            chat_id = "42"

            [bot]
            enabled = true
            authorized_chat_ids = ["42"]
        "#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.generator.duration_seconds, 6);
        assert_eq!(config.accounts.len(), 2);
        assert_eq!(config.pool.acquire_timeout_secs, 10);
        assert!(config.bot.unwrap().enabled);
    }

    #[test]
    fn test_duplicate_account_ids_rejected() {
        let toml = r#"
            [[accounts]]
            id = "acc-1"
            api_key = "k1"

            [[accounts]]
            id = "acc-1"
            api_key = "k2"
        "#;
        assert!(matches!(
            load_config_from_str(toml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            load_config_from_str("not = [valid"),
            Err(ConfigError::Parse(_))
        ));
    }
}
