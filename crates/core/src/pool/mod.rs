//! Shared account pool for rate-limited upstream generation accounts.

pub mod config;
pub mod manager;
pub mod types;

pub use config::PoolConfig;
pub use manager::AccountPool;
pub use types::{
    AccountLease, AccountSeed, AccountSnapshot, AccountState, CredentialRef, PoolError,
    ReleaseOutcome,
};
