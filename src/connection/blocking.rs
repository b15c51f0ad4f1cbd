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
use r2d2::{Pool, PooledConnection};
use redis::Client;

use crate::config::ReplicaConfig;
use crate::connection::build_connection_info;
use crate::errors::RedquorumResult;

pub type SyncReplicaConnection = PooledConnection<Client>;

/// Pooled blocking connections to one replica. The pool is built without
/// eager connections: a replica that is down at construction time must cost a
/// failed per-replica action later, not a constructor error.
pub struct SyncReplicaPool {
    pool: Pool<Client>,
    url: String,
}

impl SyncReplicaPool {
    pub fn new(config: &ReplicaConfig) -> RedquorumResult<Self> {
        let client = Client::open(build_connection_info(config)?)?;
        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(config.connection_timeout)
            .build_unchecked(client);

        Ok(Self {
            pool,
            url: config.url.clone(),
        })
    }

    /// Checks out a scoped connection; it returns to the pool on drop.
    pub fn get_connection(&self) -> RedquorumResult<SyncReplicaConnection> {
        Ok(self.pool.get()?)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn construction_does_not_dial_the_replica() {
        // port 1 is never a redis server; construction must still succeed
        let config = ReplicaConfig::new("redis://127.0.0.1:1")
            .with_pool_size(1)
            .with_connection_timeout(Duration::from_millis(100));
        let pool = SyncReplicaPool::new(&config).unwrap();
        assert_eq!(pool.url(), "redis://127.0.0.1:1");
        assert!(pool.get_connection().is_err());
    }
}
