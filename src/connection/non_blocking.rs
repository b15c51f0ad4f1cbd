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
use deadpool::managed::{Metrics, Object, Pool, RecycleError, RecycleResult, Timeouts};
use deadpool::Runtime;
use redis::aio::MultiplexedConnection;
use redis::Client;
use std::time::Duration;

use crate::config::ReplicaConfig;
use crate::connection::build_connection_info;
use crate::errors::RedquorumResult;

pub type AsyncReplicaConnection = Object<AsyncReplicaManager>;

/// deadpool manager for one replica's multiplexed connections.
pub struct AsyncReplicaManager {
    client: Client,
}

#[async_trait::async_trait]
impl deadpool::managed::Manager for AsyncReplicaManager {
    type Type = MultiplexedConnection;
    type Error = redis::RedisError;

    async fn create(&self) -> Result<Self::Type, Self::Error> {
        self.client.get_multiplexed_async_connection().await
    }

    async fn recycle(
        &self,
        conn: &mut Self::Type,
        _metrics: &Metrics,
    ) -> RecycleResult<Self::Error> {
        // Check that the connection is still valid
        let pong: Result<String, redis::RedisError> =
            redis::cmd("PING").query_async(conn).await;
        match pong {
            Ok(pong) if pong == "PONG" => Ok(()),
            Ok(_) => Err(RecycleError::Message("Invalid PONG response".into())),
            Err(e) => Err(RecycleError::Backend(e)),
        }
    }
}

/// Pooled non-blocking connections to one replica.
pub struct AsyncReplicaPool {
    pool: Pool<AsyncReplicaManager>,
    url: String,
}

impl AsyncReplicaPool {
    pub fn new(config: &ReplicaConfig) -> RedquorumResult<Self> {
        let client = Client::open(build_connection_info(config)?)?;
        let manager = AsyncReplicaManager { client };

        let pool = Pool::builder(manager)
            .max_size(config.pool_size as usize)
            .timeouts(Timeouts {
                wait: Some(config.connection_timeout),
                create: Some(config.connection_timeout),
                recycle: Some(Duration::from_secs(5)),
            })
            .runtime(Runtime::Tokio1)
            .build()?;

        Ok(Self {
            pool,
            url: config.url.clone(),
        })
    }

    /// Checks out a scoped connection; it returns to the pool on drop.
    pub async fn get_connection(&self) -> RedquorumResult<AsyncReplicaConnection> {
        Ok(self.pool.get().await?)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}
