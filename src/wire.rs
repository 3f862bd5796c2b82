// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Base64 and JSON framing of the issuance response's batch proof.
//!
//! The blob is layered: base64 over UTF-8 text, an optional
//! `batch-proof=` marker, a JSON envelope whose `P` field is base64 of an
//! inner JSON object, and finally the `R`/`C` scalars as base64 big-endian
//! integers. Unknown envelope fields are ignored.

use serde::{Deserialize, Serialize};

use crate::dleq::DleqProof;
use crate::errors::{Error, Result};
use crate::group::{scalar_from_be_padded, scalar_to_bytes};

/// Marker some issuer versions prepend to the decoded proof text.
const BATCH_PROOF_PREFIX: &str = "batch-proof=";

#[derive(Deserialize, Serialize)]
struct ProofEnvelope {
    #[serde(rename = "P")]
    payload: String,
}

#[derive(Deserialize, Serialize)]
struct ProofScalars {
    #[serde(rename = "R")]
    response: String,
    #[serde(rename = "C")]
    challenge: String,
}

/// Decodes the opaque batch-proof blob from an issuance response.
///
/// Scalars at or above the group order are rejected rather than reduced.
pub fn decode_batch_proof(blob: &str) -> Result<DleqProof> {
    let text = base64::decode(blob.trim()).map_err(|_| Error::SerializationError)?;
    let text = core::str::from_utf8(&text).map_err(|_| Error::SerializationError)?;
    let body = text.strip_prefix(BATCH_PROOF_PREFIX).unwrap_or(text);

    let envelope: ProofEnvelope =
        serde_json::from_str(body).map_err(|_| Error::SerializationError)?;
    let payload = base64::decode(&envelope.payload).map_err(|_| Error::SerializationError)?;
    let scalars: ProofScalars =
        serde_json::from_slice(&payload).map_err(|_| Error::SerializationError)?;

    let challenge = base64::decode(&scalars.challenge).map_err(|_| Error::SerializationError)?;
    let response = base64::decode(&scalars.response).map_err(|_| Error::SerializationError)?;
    Ok(DleqProof::new(
        scalar_from_be_padded(&challenge)?,
        scalar_from_be_padded(&response)?,
    ))
}

/// Encodes a proof in the same framing the issuer emits, marker included.
pub fn encode_batch_proof(proof: &DleqProof) -> String {
    let scalars = ProofScalars {
        response: base64::encode(scalar_to_bytes(&proof.r)),
        challenge: base64::encode(scalar_to_bytes(&proof.c)),
    };
    let payload = serde_json::to_string(&scalars).expect("string fields always serialize");
    let envelope = ProofEnvelope {
        payload: base64::encode(payload),
    };
    let body = serde_json::to_string(&envelope).expect("string fields always serialize");
    base64::encode(format!("{}{}", BATCH_PROOF_PREFIX, body))
}
