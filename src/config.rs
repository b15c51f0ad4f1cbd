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
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for one replica. One config describes one independent
/// Redis process; a lock spanning N replicas is built from N of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicaConfig {
    /// Connection URL, e.g. `redis://127.0.0.1:6379/0`
    pub url: String,
    /// Connection pool size
    pub pool_size: u32,
    /// Connection establishment / checkout timeout
    pub connection_timeout: Duration,
    /// User name
    pub username: Option<String>,
    /// Password
    pub password: Option<String>,
    /// Database number
    pub database: Option<i64>,
}

impl Default for ReplicaConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            pool_size: 8,
            connection_timeout: Duration::from_secs(3),
            username: None,
            password: None,
            database: None,
        }
    }
}

impl ReplicaConfig {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Default::default()
        }
    }

    pub fn with_pool_size(mut self, size: u32) -> Self {
        self.pool_size = size;
        self
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    pub fn with_username(mut self, username: &str) -> Self {
        self.username = Some(username.to_string());
        self
    }

    pub fn with_password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    pub fn with_database(mut self, db: i64) -> Self {
        self.database = Some(db);
        self
    }
}

/// Default knobs applied to every mutex minted by a factory. Each knob can
/// still be overridden per mutex through its `with_*` builder methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutexConfig {
    /// Upper bound on how long the lock lives on any single replica
    pub expiry: Duration,
    /// Maximum number of acquisition attempts before giving up
    pub tries: u32,
    /// Back-off between consecutive acquisition attempts
    pub retry_delay: Duration,
    /// Clock drift factor: worst-case proportion of `expiry` lost to
    /// unsynchronized replica clocks
    pub drift_factor: f64,
}

impl Default for MutexConfig {
    fn default() -> Self {
        Self {
            expiry: Duration::from_secs(8),
            tries: 32,
            retry_delay: Duration::from_millis(500),
            drift_factor: 0.01,
        }
    }
}

impl MutexConfig {
    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = expiry;
        self
    }

    pub fn with_tries(mut self, tries: u32) -> Self {
        self.tries = tries;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_drift_factor(mut self, factor: f64) -> Self {
        self.drift_factor = factor;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutex_config_defaults() {
        let config = MutexConfig::default();
        assert_eq!(config.expiry, Duration::from_secs(8));
        assert_eq!(config.tries, 32);
        assert_eq!(config.retry_delay, Duration::from_millis(500));
        assert_eq!(config.drift_factor, 0.01);
    }

    #[test]
    fn builder_methods_chain() {
        let config = MutexConfig::default()
            .with_expiry(Duration::from_secs(30))
            .with_tries(4)
            .with_retry_delay(Duration::from_millis(50))
            .with_drift_factor(0.02);
        assert_eq!(config.expiry, Duration::from_secs(30));
        assert_eq!(config.tries, 4);
        assert_eq!(config.retry_delay, Duration::from_millis(50));
        assert_eq!(config.drift_factor, 0.02);
    }

    #[test]
    fn replica_config_serde() {
        let config = ReplicaConfig::new("redis://10.0.0.1:6380/2")
            .with_pool_size(4)
            .with_password("hunter2");
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ReplicaConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.url, "redis://10.0.0.1:6380/2");
        assert_eq!(parsed.pool_size, 4);
        assert_eq!(parsed.password.as_deref(), Some("hunter2"));
    }
}
