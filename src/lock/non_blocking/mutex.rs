/*
 *
 *  *
 *  *      Copyright (c) 2018-2025, SnackCloud All rights reserved.
 *  *
 *  *   Redistribution and use in source and binary forms, with or without
 *  *   modification, are permitted provided that the following conditions are met:
 *  *
 *  *   Redistributions of source code must retain the above copyright notice,
 *  *   this list of conditions and the following disclaimer.
 *  *   Redistributions in binary form must reproduce the above copyright
 *  *   notice, this list of conditions and the following disclaimer in the
 *  *   documentation and/or other materials provided with the distribution.
 *  *   Neither the name of the www.snackcloud.cn developer nor the names of its
 *  *   contributors may be used to endorse or promote products derived from
 *  *   this software without specific prior written permission.
 *  *   Author: SnackCloud
 *  *
 *
 */
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::debug;

use crate::config::MutexConfig;
use crate::connection::AsyncReplicaPool;
use crate::errors::{RedquorumError, RedquorumResult};
use crate::lock::{DelayFn, ValueFn};
use crate::scripts;
use crate::util::{calculate_drift, calculate_quorum, gen_lock_value, num_milliseconds};

/// === AsyncMutex (non-blocking quorum lock) ===
///
/// The asynchronous counterpart of [`crate::Mutex`]: the same state machine,
/// with the per-replica fan-out running as spawned tasks so all N replicas
/// are in flight at once.
pub struct AsyncMutex {
    pools: Vec<Arc<AsyncReplicaPool>>,
    name: String,
    expiry: Duration,
    tries: u32,
    delay_fn: DelayFn,
    drift_factor: f64,
    quorum: usize,
    value_fn: ValueFn,
    value: String,
    until: Option<Instant>,
}

impl AsyncMutex {
    pub(crate) fn new(
        pools: Vec<Arc<AsyncReplicaPool>>,
        name: String,
        config: &MutexConfig,
    ) -> Self {
        let quorum = calculate_quorum(pools.len());
        let retry_delay = config.retry_delay;
        Self {
            pools,
            name,
            expiry: config.expiry,
            tries: config.tries,
            delay_fn: Arc::new(move |_| retry_delay),
            drift_factor: config.drift_factor,
            quorum,
            value_fn: Arc::new(gen_lock_value),
            value: String::new(),
            until: None,
        }
    }

    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = expiry;
        self
    }

    pub fn with_tries(mut self, tries: u32) -> Self {
        self.tries = tries;
        self
    }

    pub fn with_delay_fn(mut self, delay_fn: DelayFn) -> Self {
        self.delay_fn = delay_fn;
        self
    }

    pub fn with_drift_factor(mut self, drift_factor: f64) -> Self {
        self.drift_factor = drift_factor;
        self
    }

    /// Overrides the majority quorum. Rejects anything outside `1..=N`: a
    /// zero quorum would let every attempt succeed trivially, and one above
    /// N could never be met.
    pub fn with_quorum(mut self, quorum: usize) -> RedquorumResult<Self> {
        if quorum == 0 || quorum > self.pools.len() {
            return Err(RedquorumError::ConfigError(format!(
                "quorum must be within 1..={}, got {quorum}",
                self.pools.len()
            )));
        }
        self.quorum = quorum;
        Ok(self)
    }

    pub fn with_value_fn(mut self, value_fn: ValueFn) -> Self {
        self.value_fn = value_fn;
        self
    }

    /// Acquires the lock, retrying up to the configured number of attempts.
    /// See [`crate::Mutex::lock`] for the attempt semantics; the two surfaces
    /// are behaviourally identical.
    pub async fn lock(&mut self) -> RedquorumResult<()> {
        for attempt in 0..self.tries {
            if attempt != 0 {
                sleep((self.delay_fn)(attempt)).await;
            }

            let value = (self.value_fn)()?;

            let start = Instant::now();
            let n = self.acquire_on_pools(&value).await;
            let end = Instant::now();

            let drift = calculate_drift(self.expiry, self.drift_factor);
            let validity = self
                .expiry
                .checked_sub(end.duration_since(start))
                .and_then(|remaining| remaining.checked_sub(drift));

            match validity {
                Some(validity) if n >= self.quorum && validity > Duration::ZERO => {
                    debug!(name = %self.name, replicas = n, ?validity, "lock acquired");
                    self.value = value;
                    self.until = Some(end + validity);
                    return Ok(());
                }
                _ => {}
            }

            debug!(name = %self.name, replicas = n, attempt, "lock attempt failed, rolling back");
            self.release_on_pools(&value).await;
        }

        Err(RedquorumError::LockAcquisitionError)
    }

    /// Best-effort release; `true` only when strictly more than a quorum of
    /// replicas confirmed the delete. The last token stays readable through
    /// [`AsyncMutex::value`] afterwards.
    pub async fn unlock(&self) -> bool {
        let n = self.release_on_pools(&self.value).await;
        debug!(name = %self.name, replicas = n, "unlock");
        n > self.quorum
    }

    /// Resets the TTL back to the full expiry on every replica still holding
    /// this token; `true` iff a quorum confirmed. The locally reported
    /// [`AsyncMutex::until`] deadline is not refreshed.
    pub async fn extend(&self) -> bool {
        let expiry_ms = num_milliseconds(self.expiry);
        let n = self
            .act_on_pools(|pool| {
                let name = self.name.clone();
                let value = self.value.clone();
                async move { touch(pool, name, value, expiry_ms).await }
            })
            .await;
        debug!(name = %self.name, replicas = n, "extend");
        n >= self.quorum
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Token written on the most recent successful acquisition; empty before
    /// the first one.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Deadline after which the most recent acquisition is no longer locally
    /// valid.
    pub fn until(&self) -> Option<Instant> {
        self.until
    }

    async fn acquire_on_pools(&self, value: &str) -> usize {
        let expiry_ms = num_milliseconds(self.expiry);
        self.act_on_pools(|pool| {
            let name = self.name.clone();
            let value = value.to_string();
            async move { acquire(pool, name, value, expiry_ms).await }
        })
        .await
    }

    async fn release_on_pools(&self, value: &str) -> usize {
        self.act_on_pools(|pool| {
            let name = self.name.clone();
            let value = value.to_string();
            async move { release(pool, name, value).await }
        })
        .await
    }

    /// Spawns `act_fn` against every replica, then awaits all of them and
    /// returns how many reported success. A task that errors or panics counts
    /// as a failure.
    async fn act_on_pools<F, Fut>(&self, act_fn: F) -> usize
    where
        F: Fn(Arc<AsyncReplicaPool>) -> Fut,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let mut tasks = Vec::with_capacity(self.pools.len());
        for pool in &self.pools {
            tasks.push(tokio::spawn(act_fn(Arc::clone(pool))));
        }

        let mut successes = 0;
        for task in tasks {
            if task.await.unwrap_or(false) {
                successes += 1;
            }
        }
        successes
    }
}

async fn acquire(pool: Arc<AsyncReplicaPool>, name: String, value: String, expiry_ms: u64) -> bool {
    let mut conn = match pool.get_connection().await {
        Ok(conn) => conn,
        Err(_) => return false,
    };
    let reply: redis::RedisResult<Option<String>> = redis::cmd("SET")
        .arg(&name)
        .arg(&value)
        .arg("NX")
        .arg("PX")
        .arg(expiry_ms)
        .query_async(&mut *conn)
        .await;
    matches!(reply, Ok(Some(ref status)) if status == "OK")
}

async fn release(pool: Arc<AsyncReplicaPool>, name: String, value: String) -> bool {
    let mut conn = match pool.get_connection().await {
        Ok(conn) => conn,
        Err(_) => return false,
    };
    let status: redis::RedisResult<i64> = scripts::DELETE_SCRIPT
        .key(&name)
        .arg(&value)
        .invoke_async(&mut *conn)
        .await;
    matches!(status, Ok(deleted) if deleted != 0)
}

async fn touch(pool: Arc<AsyncReplicaPool>, name: String, value: String, expiry_ms: u64) -> bool {
    let mut conn = match pool.get_connection().await {
        Ok(conn) => conn,
        Err(_) => return false,
    };
    let status: redis::RedisResult<i64> = scripts::TOUCH_SCRIPT
        .key(&name)
        .arg(&value)
        .arg(expiry_ms)
        .invoke_async(&mut *conn)
        .await;
    matches!(status, Ok(updated) if updated != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReplicaConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn unreachable_pools(n: usize) -> Vec<Arc<AsyncReplicaPool>> {
        (0..n)
            .map(|_| {
                let config = ReplicaConfig::new("redis://127.0.0.1:1")
                    .with_pool_size(1)
                    .with_connection_timeout(Duration::from_millis(100));
                Arc::new(AsyncReplicaPool::new(&config).unwrap())
            })
            .collect()
    }

    fn fast_config() -> MutexConfig {
        MutexConfig::default()
            .with_tries(3)
            .with_retry_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn zero_tries_fails_without_generating_a_value() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut mutex = AsyncMutex::new(unreachable_pools(3), "m".to_string(), &fast_config())
            .with_tries(0)
            .with_value_fn(Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok("token".to_string())
            }));

        assert!(matches!(
            mutex.lock().await,
            Err(RedquorumError::LockAcquisitionError)
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn value_generation_errors_surface_immediately() {
        let mut mutex = AsyncMutex::new(unreachable_pools(3), "m".to_string(), &fast_config())
            .with_value_fn(Arc::new(|| {
                Err(RedquorumError::ValueGenerationError("entropy".to_string()))
            }));

        assert!(matches!(
            mutex.lock().await,
            Err(RedquorumError::ValueGenerationError(_))
        ));
    }

    #[tokio::test]
    async fn every_attempt_uses_a_fresh_token() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut mutex = AsyncMutex::new(unreachable_pools(2), "m".to_string(), &fast_config())
            .with_value_fn(Arc::new(move || {
                let i = counter.fetch_add(1, Ordering::SeqCst);
                Ok(format!("token-{i}"))
            }));

        assert!(mutex.lock().await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn quorum_override_rejects_out_of_range_values() {
        let pools = unreachable_pools(3);
        let config = fast_config();

        let raised = AsyncMutex::new(pools.clone(), "m".to_string(), &config)
            .with_quorum(3)
            .unwrap();
        assert_eq!(raised.quorum, 3);

        assert!(matches!(
            AsyncMutex::new(pools.clone(), "m".to_string(), &config).with_quorum(0),
            Err(RedquorumError::ConfigError(_))
        ));
        assert!(matches!(
            AsyncMutex::new(pools, "m".to_string(), &config).with_quorum(99),
            Err(RedquorumError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn unlock_and_extend_before_lock_fail_at_the_quorum_step() {
        let mutex = AsyncMutex::new(unreachable_pools(2), "m".to_string(), &fast_config());
        assert!(!mutex.unlock().await);
        assert!(!mutex.extend().await);
        assert_eq!(mutex.value(), "");
        assert!(mutex.until().is_none());
    }

    // The tests below need a local redis-server; each logical database acts
    // as one independent replica. Run with `cargo test -- --ignored`.

    fn live_pools(n: usize) -> Vec<Arc<AsyncReplicaPool>> {
        (0..n)
            .map(|db| {
                let config = ReplicaConfig::new(&format!("redis://127.0.0.1:6379/{db}"));
                Arc::new(AsyncReplicaPool::new(&config).unwrap())
            })
            .collect()
    }

    async fn get_values(pools: &[Arc<AsyncReplicaPool>], name: &str) -> Vec<Option<String>> {
        let mut values = Vec::with_capacity(pools.len());
        for pool in pools {
            let mut conn = pool.get_connection().await.unwrap();
            let value: Option<String> = redis::cmd("GET")
                .arg(name)
                .query_async(&mut *conn)
                .await
                .unwrap();
            values.push(value);
        }
        values
    }

    async fn clear_key(pools: &[Arc<AsyncReplicaPool>], name: &str) {
        for pool in pools {
            let mut conn = pool.get_connection().await.unwrap();
            let _: () = redis::cmd("DEL")
                .arg(name)
                .query_async(&mut *conn)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    #[ignore]
    async fn lock_extend_unlock_roundtrip() {
        let pools = live_pools(4);
        clear_key(&pools, "test-async-roundtrip").await;

        let mut mutex = AsyncMutex::new(
            pools.clone(),
            "test-async-roundtrip".to_string(),
            &fast_config(),
        );
        mutex.lock().await.unwrap();
        assert!(mutex.until().unwrap() > Instant::now());

        let held = get_values(&pools, "test-async-roundtrip")
            .await
            .into_iter()
            .filter(|v| v.as_deref() == Some(mutex.value()))
            .count();
        assert!(held >= mutex.quorum);

        assert!(mutex.extend().await);

        mutex.unlock().await;
        let remaining = get_values(&pools, "test-async-roundtrip")
            .await
            .into_iter()
            .flatten()
            .count();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    #[ignore]
    async fn contending_callers_exclude_each_other() {
        let pools = live_pools(8);
        clear_key(&pools, "test-async-contention").await;

        let in_critical = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let pools = pools.clone();
            let in_critical = in_critical.clone();
            handles.push(tokio::spawn(async move {
                let config = MutexConfig::default()
                    .with_tries(64)
                    .with_retry_delay(Duration::from_millis(50));
                let mut mutex = AsyncMutex::new(
                    pools,
                    "test-async-contention".to_string(),
                    &config,
                );
                mutex.lock().await.unwrap();

                assert_eq!(in_critical.fetch_add(1, Ordering::SeqCst), 0);
                sleep(Duration::from_millis(20)).await;
                in_critical.fetch_sub(1, Ordering::SeqCst);

                mutex.unlock().await;
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }
    }
}
