//! Account pool under concurrent load.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reelforge_core::pool::{AccountPool, PoolConfig, PoolError, ReleaseOutcome};
use reelforge_core::testing::fixtures;

fn quick_config() -> PoolConfig {
    PoolConfig {
        acquire_timeout_secs: 10,
        cooldown_base_secs: 0,
        cooldown_max_secs: 3600,
        disable_threshold: 3,
        reviver_interval_ms: 10,
    }
}

#[tokio::test]
async fn test_leases_are_exclusive_under_load() {
    let accounts = 4;
    let workers = 32;
    let pool = Arc::new(AccountPool::new(
        quick_config(),
        fixtures::account_seeds(accounts),
    ));

    // Tracks how many leases are held at once per account. Any value
    // above 1 means the same account was leased twice concurrently.
    let held: Arc<Mutex<HashMap<String, usize>>> = Arc::new(Mutex::new(HashMap::new()));
    let violations = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..workers {
        let pool = Arc::clone(&pool);
        let held = Arc::clone(&held);
        let violations = Arc::clone(&violations);
        handles.push(tokio::spawn(async move {
            for _ in 0..8 {
                let lease = pool.acquire().await.unwrap();
                {
                    let mut held = held.lock().unwrap();
                    let count = held.entry(lease.account_id.clone()).or_insert(0);
                    *count += 1;
                    if *count > 1 {
                        violations.fetch_add(1, Ordering::SeqCst);
                    }
                }
                tokio::time::sleep(Duration::from_millis(1)).await;
                {
                    let mut held = held.lock().unwrap();
                    *held.get_mut(&lease.account_id).unwrap() -= 1;
                }
                pool.release(&lease, ReleaseOutcome::Success);
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(violations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_load_spreads_across_accounts() {
    let accounts = 3;
    let pool = Arc::new(AccountPool::new(
        quick_config(),
        fixtures::account_seeds(accounts),
    ));

    let mut usage: HashMap<String, usize> = HashMap::new();
    for _ in 0..30 {
        let lease = pool.acquire().await.unwrap();
        *usage.entry(lease.account_id.clone()).or_insert(0) += 1;
        pool.release(&lease, ReleaseOutcome::Success);
    }

    // Oldest-used-first selection rotates strictly, so sequential use
    // lands on every account the same number of times.
    assert_eq!(usage.len(), accounts);
    for count in usage.values() {
        assert_eq!(*count, 30 / accounts);
    }
}

#[tokio::test]
async fn test_waiters_drain_after_cooldowns_expire() {
    let pool = Arc::new(AccountPool::new(
        quick_config(),
        fixtures::account_seeds(2),
    ));
    pool.spawn_reviver();

    // Push both accounts into cooldown while waiters queue up behind them.
    let a = pool.acquire().await.unwrap();
    let b = pool.acquire().await.unwrap();

    let mut waiters = Vec::new();
    for _ in 0..6 {
        let pool = Arc::clone(&pool);
        waiters.push(tokio::spawn(async move { pool.acquire().await }));
    }

    pool.release(&a, ReleaseOutcome::RateLimited);
    pool.release(&b, ReleaseOutcome::RateLimited);

    // Zero-length cooldowns expire right away; the reviver wakes the
    // queue and every waiter eventually gets a lease.
    for waiter in waiters {
        let lease = waiter.await.unwrap().unwrap();
        pool.release(&lease, ReleaseOutcome::Success);
    }
    pool.stop();
}

#[tokio::test]
async fn test_disabled_accounts_leave_rotation() {
    let pool = Arc::new(AccountPool::new(
        PoolConfig {
            acquire_timeout_secs: 1,
            disable_threshold: 1,
            ..quick_config()
        },
        fixtures::account_seeds(2),
    ));

    // Burn both accounts out.
    for _ in 0..2 {
        let lease = pool.acquire().await.unwrap();
        pool.release(&lease, ReleaseOutcome::Error);
    }

    assert!(matches!(
        pool.acquire().await,
        Err(PoolError::AcquireTimeout { .. })
    ));

    // A manual reset puts one account back in rotation.
    pool.reset("acc-0").unwrap();
    let lease = pool.acquire().await.unwrap();
    assert_eq!(lease.account_id, "acc-0");
}
