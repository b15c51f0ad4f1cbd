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

use std::sync::Arc;
use std::time::Duration;

use crate::errors::RedquorumResult;

/// Back-off between acquisition attempts, keyed by the 1-based attempt index.
/// Must be deterministic on its input.
pub type DelayFn = Arc<dyn Fn(u32) -> Duration + Send + Sync>;

/// Produces the opaque random token written to every replica. Called once per
/// acquisition attempt.
pub type ValueFn = Arc<dyn Fn() -> RedquorumResult<String> + Send + Sync>;
