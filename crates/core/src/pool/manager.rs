//! Shared pool of rate-limited upstream accounts.
//!
//! Acquisition is the only blocking operation in the system: callers wait
//! up to a configured timeout for an account to become available. The
//! critical section covers selection-and-mark-busy only; upstream calls
//! happen outside the lock, so a slow generation never stalls the pool.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{broadcast, Notify};
use tracing::{debug, info, warn};

use super::config::PoolConfig;
use super::types::{
    AccountLease, AccountSeed, AccountSnapshot, AccountState, CredentialRef, PoolError,
    ReleaseOutcome,
};
use crate::metrics::{ACCOUNTS_DISABLED_TOTAL, ACCOUNT_ACQUIRE_TOTAL, ACCOUNT_RELEASE_TOTAL};

struct Slot {
    id: String,
    credential: CredentialRef,
    state: AccountState,
    last_used_at: Option<DateTime<Utc>>,
    failure_count: u32,
    cooldown_until: Option<DateTime<Utc>>,
}

pub struct AccountPool {
    config: PoolConfig,
    slots: Mutex<Vec<Slot>>,
    notify: Notify,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl AccountPool {
    pub fn new(config: PoolConfig, seeds: Vec<AccountSeed>) -> Self {
        let slots = seeds
            .into_iter()
            .map(|seed| Slot {
                id: seed.id,
                credential: seed.credential,
                state: AccountState::Available,
                last_used_at: None,
                failure_count: 0,
                cooldown_until: None,
            })
            .collect();
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            slots: Mutex::new(slots),
            notify: Notify::new(),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    pub fn len(&self) -> usize {
        self.lock_slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait for an account and lease it exclusively.
    pub async fn acquire(&self) -> Result<AccountLease, PoolError> {
        if self.is_empty() {
            return Err(PoolError::Empty);
        }

        let timeout = Duration::from_secs(self.config.acquire_timeout_secs);
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if let Some(lease) = self.try_acquire() {
                ACCOUNT_ACQUIRE_TOTAL.with_label_values(&["acquired"]).inc();
                debug!(account_id = %lease.account_id, "account leased");
                return Ok(lease);
            }

            let now = tokio::time::Instant::now();
            if now >= deadline {
                ACCOUNT_ACQUIRE_TOTAL.with_label_values(&["timeout"]).inc();
                return Err(PoolError::AcquireTimeout { waited: timeout });
            }

            // Wake on release/revival, or re-check at the deadline.
            let _ = tokio::time::timeout(deadline - now, self.notify.notified()).await;
        }
    }

    /// Selection-and-mark-busy under the lock. Oldest-used accounts are
    /// picked first so load spreads evenly; never-used accounts win.
    fn try_acquire(&self) -> Option<AccountLease> {
        let mut slots = self.lock_slots();
        let now = Utc::now();
        revive_due(&mut slots, now);

        let candidate = slots
            .iter_mut()
            .filter(|slot| slot.state == AccountState::Available)
            .min_by_key(|slot| slot.last_used_at)?;

        candidate.state = AccountState::Busy;
        candidate.last_used_at = Some(now);
        Some(AccountLease {
            account_id: candidate.id.clone(),
            credential: candidate.credential.clone(),
        })
    }

    /// Return a lease with the outcome of the upstream call.
    pub fn release(&self, lease: &AccountLease, outcome: ReleaseOutcome) {
        ACCOUNT_RELEASE_TOTAL
            .with_label_values(&[outcome.as_str()])
            .inc();

        let mut slots = self.lock_slots();
        let Some(slot) = slots.iter_mut().find(|s| s.id == lease.account_id) else {
            warn!(account_id = %lease.account_id, "released lease for unknown account");
            return;
        };

        match outcome {
            ReleaseOutcome::Success => {
                slot.failure_count = 0;
                slot.cooldown_until = None;
                slot.last_used_at = Some(Utc::now());
                slot.state = AccountState::Available;
            }
            ReleaseOutcome::RateLimited => {
                // Consecutive throttles cool down longer each time; the
                // counter feeds the next backoff but never disables.
                let cooldown = self.backoff(slot.failure_count);
                slot.failure_count += 1;
                slot.cooldown_until = Some(Utc::now() + cooldown);
                slot.state = AccountState::CoolingDown;
                info!(
                    account_id = %slot.id,
                    failures = slot.failure_count,
                    cooldown_secs = cooldown.num_seconds(),
                    "account rate limited, cooling down"
                );
            }
            ReleaseOutcome::Error => {
                slot.failure_count += 1;
                if slot.failure_count >= self.config.disable_threshold {
                    slot.state = AccountState::Disabled;
                    slot.cooldown_until = None;
                    ACCOUNTS_DISABLED_TOTAL.inc();
                    warn!(
                        account_id = %slot.id,
                        failures = slot.failure_count,
                        "account disabled after consecutive errors"
                    );
                } else {
                    let cooldown = self.backoff(slot.failure_count - 1);
                    slot.cooldown_until = Some(Utc::now() + cooldown);
                    slot.state = AccountState::CoolingDown;
                }
            }
        }

        drop(slots);
        self.notify.notify_waiters();
    }

    /// Manually bring a disabled account back into rotation.
    pub fn reset(&self, account_id: &str) -> Result<(), PoolError> {
        let mut slots = self.lock_slots();
        let slot = slots
            .iter_mut()
            .find(|s| s.id == account_id)
            .ok_or_else(|| PoolError::UnknownAccount(account_id.to_string()))?;

        slot.failure_count = 0;
        slot.cooldown_until = None;
        if slot.state != AccountState::Busy {
            slot.state = AccountState::Available;
        }
        info!(account_id = %account_id, "account manually reset");
        drop(slots);
        self.notify.notify_waiters();
        Ok(())
    }

    pub fn snapshot(&self) -> Vec<AccountSnapshot> {
        self.lock_slots()
            .iter()
            .map(|slot| AccountSnapshot {
                id: slot.id.clone(),
                state: slot.state,
                last_used_at: slot.last_used_at,
                failure_count: slot.failure_count,
                cooldown_until: slot.cooldown_until,
            })
            .collect()
    }

    /// Exponential backoff for the nth consecutive failure, capped.
    fn backoff(&self, failures: u32) -> ChronoDuration {
        let base = self.config.cooldown_base_secs;
        let exp = failures.min(16);
        let secs = base.saturating_mul(1u64 << exp).min(self.config.cooldown_max_secs);
        ChronoDuration::seconds(secs as i64)
    }

    fn lock_slots(&self) -> MutexGuard<'_, Vec<Slot>> {
        match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Background loop that promotes expired cooldowns so waiters wake up
    /// even when nothing is released.
    pub fn spawn_reviver(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let pool = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let interval = Duration::from_millis(self.config.reviver_interval_ms);

        tokio::spawn(async move {
            info!("account pool reviver started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("account pool reviver shutting down");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        let revived = {
                            let mut slots = pool.lock_slots();
                            revive_due(&mut slots, Utc::now())
                        };
                        if revived > 0 {
                            debug!(revived, "cooldowns expired, accounts available");
                            pool.notify.notify_waiters();
                        }
                    }
                }
            }
        });
    }

    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            let _ = self.shutdown_tx.send(());
        }
    }
}

fn revive_due(slots: &mut [Slot], now: DateTime<Utc>) -> usize {
    let mut revived = 0;
    for slot in slots.iter_mut() {
        if slot.state == AccountState::CoolingDown {
            if let Some(until) = slot.cooldown_until {
                if now >= until {
                    slot.state = AccountState::Available;
                    slot.cooldown_until = None;
                    revived += 1;
                }
            }
        }
    }
    revived
}
