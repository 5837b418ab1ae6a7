//! Account pool types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use std::fmt;
use std::time::Duration;

/// Opaque credential handle. Never printed or serialized in full.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialRef {
    key: String,
}

impl CredentialRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Access the raw secret for outbound requests.
    pub fn expose(&self) -> &str {
        &self.key
    }
}

impl fmt::Debug for CredentialRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CredentialRef(****)")
    }
}

/// Seed used to build the pool at startup.
#[derive(Debug, Clone)]
pub struct AccountSeed {
    pub id: String,
    pub credential: CredentialRef,
}

/// Lifecycle state of a pooled account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountState {
    Available,
    /// Leased to exactly one execution unit.
    Busy,
    /// Backing off after a rate limit or transient error.
    CoolingDown,
    /// Permanently out of rotation until a manual reset.
    Disabled,
}

impl AccountState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountState::Available => "available",
            AccountState::Busy => "busy",
            AccountState::CoolingDown => "cooling_down",
            AccountState::Disabled => "disabled",
        }
    }
}

/// Read-only view of an account, safe to expose over the API.
#[derive(Debug, Clone, Serialize)]
pub struct AccountSnapshot {
    pub id: String,
    pub state: AccountState,
    pub last_used_at: Option<DateTime<Utc>>,
    pub failure_count: u32,
    pub cooldown_until: Option<DateTime<Utc>>,
}

/// Exclusive lease on an account. Must be released exactly once.
#[derive(Debug, Clone)]
pub struct AccountLease {
    pub account_id: String,
    pub credential: CredentialRef,
}

/// How a lease ended, from the pool's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The upstream call succeeded. Failure counters reset.
    Success,
    /// The provider throttled the account. Cooldown with growing backoff.
    RateLimited,
    /// The call failed for another reason. Counts toward disabling.
    Error,
}

impl ReleaseOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseOutcome::Success => "success",
            ReleaseOutcome::RateLimited => "rate_limited",
            ReleaseOutcome::Error => "error",
        }
    }
}

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("no account became available within {waited:?}")]
    AcquireTimeout { waited: Duration },

    #[error("unknown account: {0}")]
    UnknownAccount(String),

    #[error("the account pool is empty")]
    Empty,
}
