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

use redis::RedisError;
use thiserror::Error;

pub type RedquorumResult<T> = std::result::Result<T, RedquorumError>;

/// Only [`RedquorumError::ValueGenerationError`] and
/// [`RedquorumError::LockAcquisitionError`] can surface from the lock
/// operations themselves; per-replica transport and protocol failures are
/// folded into the fan-out count and never propagated.
#[derive(Error, Debug)]
pub enum RedquorumError {
    #[error("Redis error: {0}")]
    RedisError(#[from] RedisError),

    #[error("No redis replicas provided")]
    NoReplicasError,

    #[error("Failed to acquire lock")]
    LockAcquisitionError,

    #[error("Lock value generation failed: {0}")]
    ValueGenerationError(String),

    #[error("Connection pool error: {0}")]
    PoolError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl From<r2d2::Error> for RedquorumError {
    fn from(err: r2d2::Error) -> Self {
        RedquorumError::PoolError(err.to_string())
    }
}

#[cfg(feature = "async")]
impl From<deadpool::managed::PoolError<RedisError>> for RedquorumError {
    fn from(err: deadpool::managed::PoolError<RedisError>) -> Self {
        RedquorumError::PoolError(err.to_string())
    }
}

#[cfg(feature = "async")]
impl From<deadpool::managed::BuildError> for RedquorumError {
    fn from(err: deadpool::managed::BuildError) -> Self {
        RedquorumError::PoolError(err.to_string())
    }
}
