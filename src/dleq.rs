// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Verification of the issuer's batch discrete-log equivalence proof.
//!
//! One Chaum–Pedersen proof covers a whole issuance batch. Per-index
//! scalars are drawn from a SHAKE-256 stream seeded with a hash of the
//! transcript, both point sequences fold into composite points under those
//! scalars, and the Fiat–Shamir challenge is recomputed over the
//! composites and the prover's reconstructed commitments. The SHA256 feeds
//! use SEC1 uncompressed bytes, the XOF absorbs the hex encoding of the
//! seed digest, and every feed order below is part of the wire contract.

use digest::Output;
use elliptic_curve::PrimeField;
use p256::{AffinePoint, FieldBytes, ProjectivePoint, Scalar};
use sha2::{Digest, Sha256};
use sha3::digest::{ExtendableOutput, XofReader};
use sha3::{Shake256, Shake256Reader};
use subtle::ConstantTimeEq;

use crate::commitment::Commitment;
use crate::errors::{Error, Result};
use crate::group::{scalar_from_bytes, scalar_to_bytes, sec1_encode, SCALAR_LENGTH};
use crate::tokens::{BlindedToken, SignedToken, Token, UnblindedToken};

/// The length of a `DleqProof`, in bytes.
pub const DLEQ_PROOF_LENGTH: usize = 2 * SCALAR_LENGTH;

/// Top-byte masks indexed by `bit_len(order) mod 8`.
const SCALAR_MASKS: [u8; 8] = [0xff, 0x01, 0x03, 0x07, 0x0f, 0x1f, 0x3f, 0x7f];

/// Bit length of the P-256 group order.
const ORDER_BITS: usize = 256;

/// Mask clearing the excess top bits of a squeezed scalar candidate.
/// P-256's order fills all 256 bits, so its mask keeps every bit.
const fn top_byte_mask(order_bits: usize) -> u8 {
    SCALAR_MASKS[order_bits % 8]
}

/// A Chaum–Pedersen challenge/response pair proving that every signed
/// point in a batch was produced with the committed key.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DleqProof {
    pub(crate) c: Scalar,
    pub(crate) r: Scalar,
}

impl DleqProof {
    pub(crate) fn new(c: Scalar, r: Scalar) -> Self {
        DleqProof { c, r }
    }

    /// Convert this `DleqProof` to a byte array, `C || R`.
    pub fn to_bytes(&self) -> [u8; DLEQ_PROOF_LENGTH] {
        let mut bytes = [0u8; DLEQ_PROOF_LENGTH];
        bytes[..SCALAR_LENGTH].copy_from_slice(&scalar_to_bytes(&self.c));
        bytes[SCALAR_LENGTH..].copy_from_slice(&scalar_to_bytes(&self.r));
        bytes
    }

    /// Construct a `DleqProof` from a slice of bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != DLEQ_PROOF_LENGTH {
            return Err(Error::LengthError {
                name: "DleqProof",
                length: DLEQ_PROOF_LENGTH,
            });
        }
        let c = scalar_from_bytes(&bytes[..SCALAR_LENGTH])?;
        let r = scalar_from_bytes(&bytes[SCALAR_LENGTH..])?;
        Ok(DleqProof { c, r })
    }

    /// Checks the proof against a batch of blinded tokens and the signed
    /// points returned for them.
    ///
    /// The batch must be non-empty and aligned index-for-index; the
    /// acceptance comparison is constant time.
    pub fn verify(
        &self,
        commitment: &Commitment,
        blinded: &[BlindedToken],
        signed: &[SignedToken],
    ) -> Result<()> {
        if blinded.is_empty() || blinded.len() != signed.len() {
            return Err(Error::BatchError);
        }

        let (mc, zc) = compute_composites(commitment, blinded, signed)?;

        let g = ProjectivePoint::from(commitment.g());
        let h = ProjectivePoint::from(commitment.h());
        let a = (h * self.c + g * self.r).to_affine();
        let b = (ProjectivePoint::from(zc) * self.c + ProjectivePoint::from(mc) * self.r)
            .to_affine();

        let expected = challenge_digest(
            &commitment.g(),
            &commitment.h(),
            &mc,
            &zc,
            &a,
            &b,
        )?;

        // the digest is compared against the canonical big-endian encoding
        // of C; a digest at or above the group order can never match a
        // scalar that parsed as canonical
        let received = scalar_to_bytes(&self.c);
        if bool::from(expected.as_slice().ct_eq(&received)) {
            Ok(())
        } else {
            tracing::debug!(
                expected = %hex::encode(expected),
                received = %hex::encode(received),
                "batch proof challenge mismatch"
            );
            Err(Error::VerificationError)
        }
    }
}

/// Verifies the issuer's batch proof, then unblinds every signed point.
///
/// Nothing is unblinded unless the whole batch verifies; the returned
/// tokens line up index-for-index with `tokens`.
pub fn batch_unblind(
    commitment: &Commitment,
    tokens: &[Token],
    signed: &[SignedToken],
    proof: &DleqProof,
) -> Result<Vec<UnblindedToken>> {
    if tokens.len() != signed.len() {
        return Err(Error::BatchError);
    }
    let blinded = tokens.iter().map(Token::blind).collect::<Result<Vec<_>>>()?;
    proof.verify(commitment, &blinded, signed)?;
    tokens
        .iter()
        .zip(signed)
        .map(|(token, point)| token.unblind(point))
        .collect()
}

/// Seed for the per-index scalar stream: a hash of the commitments and
/// the full batch, in transcript order.
pub(crate) fn transcript_seed(
    commitment: &Commitment,
    blinded: &[BlindedToken],
    signed: &[SignedToken],
) -> Result<Output<Sha256>> {
    let mut hasher = Sha256::new();
    hasher.update(sec1_encode(&commitment.g())?);
    hasher.update(sec1_encode(&commitment.h())?);
    for (m, z) in blinded.iter().zip(signed) {
        hasher.update(sec1_encode(&m.0)?);
        hasher.update(sec1_encode(&z.0)?);
    }
    Ok(hasher.finalize())
}

/// Folds both sequences into composite points under the seeded scalars.
pub(crate) fn compute_composites(
    commitment: &Commitment,
    blinded: &[BlindedToken],
    signed: &[SignedToken],
) -> Result<(AffinePoint, AffinePoint)> {
    let seed = transcript_seed(commitment, blinded, signed)?;
    let mut scalars = ScalarStream::seeded(&seed);

    let mut mc = ProjectivePoint::IDENTITY;
    let mut zc = ProjectivePoint::IDENTITY;
    for (m, z) in blinded.iter().zip(signed) {
        let ci = scalars.next_scalar();
        mc += ProjectivePoint::from(m.0) * ci;
        zc += ProjectivePoint::from(z.0) * ci;
    }
    Ok((mc.to_affine(), zc.to_affine()))
}

/// Recomputes the Fiat–Shamir challenge digest over the transcript
/// points; the digest doubles as the big-endian encoding of the
/// challenge scalar.
pub(crate) fn challenge_digest(
    g: &AffinePoint,
    h: &AffinePoint,
    mc: &AffinePoint,
    zc: &AffinePoint,
    a: &AffinePoint,
    b: &AffinePoint,
) -> Result<Output<Sha256>> {
    let mut hasher = Sha256::new();
    for point in [g, h, mc, zc, a, b] {
        hasher.update(sec1_encode(point)?);
    }
    Ok(hasher.finalize())
}

/// Rejection-samples scalars from a seeded SHAKE-256 stream.
///
/// The XOF absorbs the lowercase-hex encoding of the seed, not its raw
/// bytes; the issuer feeds its stream the same way. One XOF instance
/// serves the whole batch; a rejected candidate advances the stream
/// rather than resetting it, so sample order is significant.
pub(crate) struct ScalarStream {
    reader: Shake256Reader,
}

impl ScalarStream {
    pub(crate) fn seeded(seed: &[u8]) -> Self {
        let mut xof = Shake256::default();
        sha3::digest::Update::update(&mut xof, hex::encode(seed).as_bytes());
        ScalarStream {
            reader: xof.finalize_xof(),
        }
    }

    pub(crate) fn next_scalar(&mut self) -> Scalar {
        let mask = top_byte_mask(ORDER_BITS);
        loop {
            let mut candidate = FieldBytes::default();
            self.reader.read(&mut candidate);
            candidate[0] &= mask;
            if let Some(scalar) = Option::<Scalar>::from(Scalar::from_repr(candidate)) {
                return scalar;
            }
        }
    }
}
