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
use crate::connection::SyncReplicaPool;
use crate::errors::{RedquorumError, RedquorumResult};
use crate::lock::Mutex;

/// === Redquorum (blocking factory) ===
///
/// Bundles the replica pools and a default [`MutexConfig`] and mints
/// [`Mutex`] instances by name. The pools are shared by every mutex minted
/// from this factory.
pub struct Redquorum {
    pools: Vec<Arc<SyncReplicaPool>>,
    config: MutexConfig,
}

impl Redquorum {
    /// At least one replica is required; the quorum arithmetic is meaningless
    /// over an empty replica set.
    pub fn new(pools: Vec<Arc<SyncReplicaPool>>) -> RedquorumResult<Self> {
        if pools.is_empty() {
            return Err(RedquorumError::NoReplicasError);
        }
        Ok(Self {
            pools,
            config: MutexConfig::default(),
        })
    }

    /// Opens one default-configured pool per replica URL.
    pub fn connect<I, S>(urls: I) -> RedquorumResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut pools = Vec::new();
        for url in urls {
            let config = ReplicaConfig::new(url.as_ref());
            pools.push(Arc::new(SyncReplicaPool::new(&config)?));
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
    pub fn new_mutex(&self, name: impl Into<String>) -> Mutex {
        Mutex::new(self.pools.clone(), name.into(), &self.config)
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
            Redquorum::new(Vec::new()),
            Err(RedquorumError::NoReplicasError)
        ));
    }

    #[test]
    fn minted_mutexes_inherit_the_factory_defaults() {
        let factory = Redquorum::connect(["redis://127.0.0.1:1", "redis://127.0.0.1:1"])
            .unwrap()
            .with_config(MutexConfig::default().with_tries(5));
        assert_eq!(factory.replica_count(), 2);

        let mutex = factory.new_mutex("resource");
        assert_eq!(mutex.name(), "resource");
        assert_eq!(mutex.value(), "");
    }

    #[test]
    fn factory_surfaces_invalid_urls() {
        assert!(Redquorum::connect(["not a url"]).is_err());
    }
}
