// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Deterministic mapping of token seeds onto the curve.
//!
//! The issuer speaks the legacy try-and-increment construction rather than
//! a hash-to-field expansion: each attempt hashes the separator, the
//! current seed and a little-endian counter, then tries both compression
//! tags on the digest as an x-coordinate. Feed order and the seed chaining
//! between attempts must match the issuer exactly, or the proof transcript
//! diverges.

use p256::AffinePoint;
use sha2::{Digest, Sha256};

use crate::errors::{Error, Result};
use crate::group::decompress_x;

/// Separator fed to every hashing attempt. This is the literal byte
/// sequence the issuer uses, stray OID typo included.
const POINT_GENERATION_SEED: &[u8] = b"1.2.840.100045.3.1.7 point generation seed";

/// Attempt bound; beyond this the mapping reports failure and the caller
/// retries with fresh randomness.
const MAX_ATTEMPTS: u32 = 10;

/// Maps a 32-byte seed onto a curve point.
///
/// Failed attempts chain the digest back in as the next seed, so the walk
/// is deterministic: the same seed always yields the same point, across
/// implementations. The failure probability after ten attempts is about
/// `2^-10`.
pub fn hash_to_curve(seed: &[u8; 32]) -> Result<AffinePoint> {
    let mut candidate = *seed;
    for i in 0..MAX_ATTEMPTS {
        let mut hasher = Sha256::new();
        hasher.update(POINT_GENERATION_SEED);
        hasher.update(candidate);
        hasher.update(i.to_le_bytes());
        let digest = hasher.finalize();

        for tag in [0x02u8, 0x03] {
            if let Some(point) = decompress_x(&digest, tag) {
                return Ok(point);
            }
        }
        candidate.copy_from_slice(&digest);
    }
    Err(Error::HashToCurveError)
}
