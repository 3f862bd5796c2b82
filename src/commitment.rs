// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Issuer commitment pairs and the process-wide active snapshot.
//!
//! The commitment document is fetched by an external loader; this module
//! parses it, selects the build-configured version and publishes the pair
//! for verifiers. Publication swaps an `Arc` snapshot: a verification that
//! has read the pair keeps using it for its whole duration, whatever the
//! loader does in the meantime.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use p256::AffinePoint;
use serde::Deserialize;

use crate::errors::{Error, Result};
use crate::group::sec1_decode;

/// Version selected from the commitment document. The `dev-commitments`
/// feature switches the crate to the staging pair.
pub const COMMITMENT_VERSION: &str = if cfg!(feature = "dev-commitments") {
    "dev"
} else {
    "1.0"
};

/// A published `(G, H)` pair with `H = k·G` for the issuer's secret `k`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Commitment {
    g: AffinePoint,
    h: AffinePoint,
}

impl Commitment {
    /// Decodes a pair of base64 SEC1-uncompressed points.
    pub fn from_base64(g: &str, h: &str) -> Result<Self> {
        let g = sec1_decode(&base64::decode(g).map_err(|_| Error::SerializationError)?)?;
        let h = sec1_decode(&base64::decode(h).map_err(|_| Error::SerializationError)?)?;
        Ok(Commitment { g, h })
    }

    /// The base point tokens are blinded against.
    pub fn g(&self) -> AffinePoint {
        self.g
    }

    /// The issuer's public commitment `H = k·G`.
    pub fn h(&self) -> AffinePoint {
        self.h
    }

    #[cfg(test)]
    pub(crate) fn from_points(g: AffinePoint, h: AffinePoint) -> Self {
        Commitment { g, h }
    }
}

#[derive(Deserialize)]
struct CommitmentEntry {
    #[serde(rename = "G")]
    g: String,
    #[serde(rename = "H")]
    h: String,
}

/// The issuer's commitment document, keyed by deployment then version.
#[derive(Deserialize)]
pub struct CommitmentFile(HashMap<String, HashMap<String, CommitmentEntry>>);

impl CommitmentFile {
    /// Parses the JSON commitment document.
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|_| Error::SerializationError)
    }

    /// Looks up and decodes the pair under `key` at `version`.
    pub fn select(&self, key: &str, version: &str) -> Result<Commitment> {
        let entry = self
            .0
            .get(key)
            .and_then(|versions| versions.get(version))
            .ok_or(Error::CommitmentError)?;
        Commitment::from_base64(&entry.g, &entry.h)
    }

    /// Looks up the pair under `key` at the build-configured version.
    pub fn select_configured(&self, key: &str) -> Result<Commitment> {
        self.select(key, COMMITMENT_VERSION)
    }
}

static ACTIVE: RwLock<Option<Arc<Commitment>>> = RwLock::new(None);

/// Publishes `commitment` as the process-wide active pair.
pub fn set_active_commitments(commitment: Commitment) {
    let mut active = ACTIVE.write().unwrap_or_else(PoisonError::into_inner);
    *active = Some(Arc::new(commitment));
}

/// Takes a snapshot of the active pair, if one has been published.
pub fn active_commitments() -> Result<Arc<Commitment>> {
    ACTIVE
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .ok_or(Error::CommitmentError)
}
