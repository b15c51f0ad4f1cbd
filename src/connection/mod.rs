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
mod blocking;
#[cfg(feature = "async")]
mod non_blocking;

pub use blocking::*;
#[cfg(feature = "async")]
pub use non_blocking::*;

use redis::{ConnectionInfo, IntoConnectionInfo};

use crate::config::ReplicaConfig;
use crate::errors::{RedquorumError, RedquorumResult};

pub(crate) fn build_connection_info(config: &ReplicaConfig) -> RedquorumResult<ConnectionInfo> {
    let mut info: ConnectionInfo = config
        .url
        .as_str()
        .into_connection_info()
        .map_err(|e| RedquorumError::ConfigError(format!("invalid replica url {}: {e}", config.url)))?;
    if let Some(username) = &config.username {
        info.redis.username = Some(username.clone());
    }
    if let Some(password) = &config.password {
        info.redis.password = Some(password.clone());
    }
    if let Some(db) = config.database {
        info.redis.db = db;
    }
    Ok(info)
}
