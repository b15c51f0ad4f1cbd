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

//! Quorum-based distributed mutual exclusion over independent Redis replicas.
//!
//! A mutex acquires the lock by writing one fresh random token to a majority
//! of replicas inside a bounded wall-clock window, holds it for a computed
//! validity duration and releases or extends it with compare-guarded
//! server-side scripts. Every replica is one independent failure domain,
//! addressed through its own connection pool.

mod client;
mod config;
mod connection;
mod errors;
mod lock;
mod scripts;
mod util;

pub use client::*;
pub use config::*;
pub use connection::*;
pub use errors::*;
pub use lock::*;
pub use scripts::*;
pub use util::*;
