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
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::MutexConfig;
use crate::connection::SyncReplicaPool;
use crate::errors::{RedquorumError, RedquorumResult};
use crate::lock::{DelayFn, ValueFn};
use crate::scripts;
use crate::util::{calculate_drift, calculate_quorum, gen_lock_value, num_milliseconds};

/// === Mutex (blocking quorum lock) ===
///
/// A distributed mutual-exclusion lock over N independent replicas. One
/// logical caller drives a `Mutex`; the per-replica work inside each call
/// fans out on short-lived scoped threads, all N in flight at once.
///
/// The lock is advisory: it only protects code that acquires it before the
/// critical section.
pub struct Mutex {
    pools: Vec<Arc<SyncReplicaPool>>,
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

impl Mutex {
    pub(crate) fn new(pools: Vec<Arc<SyncReplicaPool>>, name: String, config: &MutexConfig) -> Self {
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
    ///
    /// Each attempt writes a fresh token to all replicas in parallel and
    /// succeeds once a quorum confirmed the write with enough of the expiry
    /// left to be useful after subtracting elapsed time and clock drift. A
    /// failed attempt rolls its partial writes back before the next one
    /// starts.
    pub fn lock(&mut self) -> RedquorumResult<()> {
        for attempt in 0..self.tries {
            if attempt != 0 {
                thread::sleep((self.delay_fn)(attempt));
            }

            let value = (self.value_fn)()?;

            let start = Instant::now();
            let n = self.act_on_pools(|pool| self.acquire(pool, &value));
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
            self.act_on_pools(|pool| self.release(pool, &value));
        }

        Err(RedquorumError::LockAcquisitionError)
    }

    /// Best-effort release. Returns `true` only when strictly more than a
    /// quorum of replicas confirmed the delete; `false` does not imply the
    /// lock is still held anywhere (the expiry may simply have elapsed).
    ///
    /// The last token stays readable through [`Mutex::value`] afterwards.
    pub fn unlock(&self) -> bool {
        let n = self.act_on_pools(|pool| self.release(pool, &self.value));
        debug!(name = %self.name, replicas = n, "unlock");
        n > self.quorum
    }

    /// Resets the TTL back to the full expiry on every replica still holding
    /// this token. Returns `true` iff a quorum confirmed.
    ///
    /// The locally reported [`Mutex::until`] deadline is not refreshed; it
    /// stays the minimum guarantee computed at acquisition.
    pub fn extend(&self) -> bool {
        let expiry_ms = num_milliseconds(self.expiry);
        let n = self.act_on_pools(|pool| self.touch(pool, &self.value, expiry_ms));
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

    /// Runs `act_fn` against every replica concurrently and returns how many
    /// reported success. Joins all N before returning; a panicking action
    /// counts as a failure.
    fn act_on_pools<F>(&self, act_fn: F) -> usize
    where
        F: Fn(&SyncReplicaPool) -> bool + Sync,
    {
        thread::scope(|scope| {
            let handles: Vec<_> = self
                .pools
                .iter()
                .map(|pool| {
                    let act_fn = &act_fn;
                    scope.spawn(move || act_fn(pool.as_ref()))
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or(false))
                .filter(|ok| *ok)
                .count()
        })
    }

    fn acquire(&self, pool: &SyncReplicaPool, value: &str) -> bool {
        let mut conn = match pool.get_connection() {
            Ok(conn) => conn,
            Err(_) => return false,
        };
        let reply: redis::RedisResult<Option<String>> = redis::cmd("SET")
            .arg(&self.name)
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(num_milliseconds(self.expiry))
            .query(&mut *conn);
        matches!(reply, Ok(Some(ref status)) if status == "OK")
    }

    fn release(&self, pool: &SyncReplicaPool, value: &str) -> bool {
        let mut conn = match pool.get_connection() {
            Ok(conn) => conn,
            Err(_) => return false,
        };
        let status: redis::RedisResult<i64> = scripts::DELETE_SCRIPT
            .key(&self.name)
            .arg(value)
            .invoke(&mut *conn);
        matches!(status, Ok(deleted) if deleted != 0)
    }

    fn touch(&self, pool: &SyncReplicaPool, value: &str, expiry_ms: u64) -> bool {
        let mut conn = match pool.get_connection() {
            Ok(conn) => conn,
            Err(_) => return false,
        };
        let status: redis::RedisResult<i64> = scripts::TOUCH_SCRIPT
            .key(&self.name)
            .arg(value)
            .arg(expiry_ms)
            .invoke(&mut *conn);
        matches!(status, Ok(updated) if updated != 0)
    }
}
