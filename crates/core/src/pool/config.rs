//! Account pool configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// How long `acquire` waits for an account before giving up.
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,

    /// Base cooldown applied after the first failure or rate limit.
    #[serde(default = "default_cooldown_base_secs")]
    pub cooldown_base_secs: u64,

    /// Upper bound for the exponential cooldown.
    #[serde(default = "default_cooldown_max_secs")]
    pub cooldown_max_secs: u64,

    /// Consecutive errors before an account is disabled for good.
    #[serde(default = "default_disable_threshold")]
    pub disable_threshold: u32,

    /// How often the reviver promotes expired cooldowns.
    #[serde(default = "default_reviver_interval_ms")]
    pub reviver_interval_ms: u64,
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

fn default_cooldown_base_secs() -> u64 {
    60
}

fn default_cooldown_max_secs() -> u64 {
    3600
}

fn default_disable_threshold() -> u32 {
    3
}

fn default_reviver_interval_ms() -> u64 {
    1000
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            acquire_timeout_secs: default_acquire_timeout_secs(),
            cooldown_base_secs: default_cooldown_base_secs(),
            cooldown_max_secs: default_cooldown_max_secs(),
            disable_threshold: default_disable_threshold(),
            reviver_interval_ms: default_reviver_interval_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.acquire_timeout_secs, 30);
        assert_eq!(config.disable_threshold, 3);
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let config: PoolConfig = toml::from_str("disable_threshold = 5").unwrap();
        assert_eq!(config.disable_threshold, 5);
        assert_eq!(config.cooldown_base_secs, 60);
    }
}
