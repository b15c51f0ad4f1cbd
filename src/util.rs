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
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use std::time::Duration;

use crate::errors::{RedquorumError, RedquorumResult};

/// Majority quorum for `n` replicas: any two quorums intersect.
pub fn calculate_quorum(n: usize) -> usize {
    n / 2 + 1
}

/// Drift allowance subtracted from the validity window: a proportional term
/// for clock skew across replicas plus a 2ms absolute slop.
pub fn calculate_drift(expiry: Duration, drift_factor: f64) -> Duration {
    let proportional_ms = (expiry.as_millis() as f64 * drift_factor) as u64;
    Duration::from_millis(proportional_ms + 2)
}

pub fn num_milliseconds(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

/// Default lock token: 16 bytes from the OS CSPRNG, base64-encoded. Collisions
/// between competing holders must stay astronomically unlikely, so anything
/// weaker than a crypto source is unsuitable here.
pub fn gen_lock_value() -> RedquorumResult<String> {
    let mut bytes = [0u8; 16];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| RedquorumError::ValueGenerationError(e.to_string()))?;
    Ok(STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn quorum_is_strict_majority() {
        assert_eq!(calculate_quorum(1), 1);
        assert_eq!(calculate_quorum(2), 2);
        assert_eq!(calculate_quorum(3), 2);
        assert_eq!(calculate_quorum(4), 3);
        assert_eq!(calculate_quorum(5), 3);
        assert_eq!(calculate_quorum(8), 5);
    }

    #[test]
    fn drift_scales_with_expiry_plus_slop() {
        assert_eq!(
            calculate_drift(Duration::from_secs(8), 0.01),
            Duration::from_millis(82)
        );
        assert_eq!(
            calculate_drift(Duration::from_secs(30), 0.01),
            Duration::from_millis(302)
        );
        // zero factor keeps only the absolute slop
        assert_eq!(
            calculate_drift(Duration::from_secs(8), 0.0),
            Duration::from_millis(2)
        );
    }

    #[test]
    fn lock_values_are_unique_and_opaque() {
        let mut seen = HashSet::new();
        for _ in 0..64 {
            let value = gen_lock_value().unwrap();
            // 16 bytes encode to 24 base64 characters
            assert_eq!(value.len(), 24);
            assert!(seen.insert(value), "token repeated");
        }
    }
}
