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

use crate::config::{MutexConfig, ReplicaConfig};
use crate::connection::AsyncReplicaPool;
use crate::errors::{RedquorumError, RedquorumResult};
use crate::lock::AsyncMutex;

/// === AsyncRedquorum (non-blocking factory) ===
///
/// Bundles the replica pools and a default [`MutexConfig`] and mints
/// [`AsyncMutex`] instances by name. The pools are shared by every mutex
/// minted from this factory.
pub struct AsyncRedquorum {
    pools: Vec<Arc<AsyncReplicaPool>>,
    config: MutexConfig,
}

impl AsyncRedquorum {
    /// At least one replica is required; the quorum arithmetic is meaningless
    /// over an empty replica set.
    pub fn new(pools: Vec<Arc<AsyncReplicaPool>>) -> RedquorumResult<Self> {
        if pools.is_empty() {
            return Err(RedquorumError::NoReplicasError);
        }
        Ok(Self {
            pools,
            config: MutexConfig::default(),
        })
    }

    /// Opens one default-configured pool per replica URL. Connections are
    /// established lazily, so this does not need a runtime.
    pub fn connect<I, S>(urls: I) -> RedquorumResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut pools = Vec::new();
        for url in urls {
            let config = ReplicaConfig::new(url.as_ref());
            pools.push(Arc::new(AsyncReplicaPool::new(&config)?));
        }
        Self::new(pools)
    }

    /// Replaces the defaults applied to subsequently minted mutexes.
    pub fn with_config(mut self, config: MutexConfig) -> Self {
        self.config = config;
        self
    }

    /// Mints a fresh, unlocked mutex registered under `name` on every
    /// replica. `name` must be non-empty and identical across all callers
    /// contending for the same logical lock.
    pub fn new_mutex(&self, name: impl Into<String>) -> AsyncMutex {
        AsyncMutex::new(self.pools.clone(), name.into(), &self.config)
    }

    pub fn replica_count(&self) -> usize {
        self.pools.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_rejects_an_empty_replica_set() {
        assert!(matches!(
            AsyncRedquorum::new(Vec::new()),
            Err(RedquorumError::NoReplicasError)
        ));
    }

    #[test]
    fn minted_mutexes_inherit_the_factory_defaults() {
        let factory = AsyncRedquorum::connect(["redis://127.0.0.1:1", "redis://127.0.0.1:1"])
            .unwrap()
            .with_config(MutexConfig::default().with_tries(5));
        assert_eq!(factory.replica_count(), 2);

        let mutex = factory.new_mutex("resource");
        assert_eq!(mutex.name(), "resource");
        assert_eq!(mutex.value(), "");
    }
}
