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
use std::time::Duration;

use redquorum::{MutexConfig, Redquorum, RedquorumResult};

fn main() -> RedquorumResult<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // One pool per independent replica. A single redis-server with several
    // logical databases stands in for a real multi-node deployment here.
    let redquorum = Redquorum::connect([
        "redis://127.0.0.1:6379/0",
        "redis://127.0.0.1:6379/1",
        "redis://127.0.0.1:6379/2",
    ])?
    .with_config(
        MutexConfig::default()
            .with_expiry(Duration::from_secs(8))
            .with_retry_delay(Duration::from_millis(200)),
    );

    let mut mutex = redquorum.new_mutex("demo-resource");

    mutex.lock()?;
    println!("holding {:?}, valid until {:?}", mutex.name(), mutex.until());

    // Critical section; push the replica-side TTL back out if it runs long.
    let extended = mutex.extend();
    println!("extended: {extended}");

    let released = mutex.unlock();
    println!("released: {released}");

    Ok(())
}
