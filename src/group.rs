// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! P-256 point and scalar encodings shared by the token pipeline and the
//! batch proof transcript.
//!
//! Three point encodings are in play, and they are not interchangeable:
//! SEC1 uncompressed (`0x04 || X || Y`) everywhere a point is hashed or
//! sent on the wire, SEC1 compressed (`{0x02, 0x03} || X`) for commitments
//! and compact transport, and a tag-less `X || Y` form for persisted state,
//! which the issuer's storage format also speaks.

use elliptic_curve::DecompressPoint;
use elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use elliptic_curve::{Field, PrimeField};
use p256::{AffinePoint, EncodedPoint, FieldBytes, Scalar, SecretKey};
use rand_core::{CryptoRng, RngCore};
use subtle::Choice;

use crate::errors::{Error, Result};

/// The length of a SEC1 uncompressed point encoding, in bytes.
pub const UNCOMPRESSED_POINT_LENGTH: usize = 65;
/// The length of a SEC1 compressed point encoding, in bytes.
pub const COMPRESSED_POINT_LENGTH: usize = 33;
/// The length of the tag-less `X || Y` encoding used for persisted points.
pub const STORAGE_POINT_LENGTH: usize = 64;
/// The length of a big-endian scalar encoding, in bytes.
pub const SCALAR_LENGTH: usize = 32;

const TAG_UNCOMPRESSED: u8 = 0x04;
const TAG_COMPRESSED_EVEN: u8 = 0x02;
const TAG_COMPRESSED_ODD: u8 = 0x03;

/// Lifts an x-coordinate candidate onto the curve, selecting the root
/// whose parity matches the compression tag.
pub(crate) fn decompress_x(x: &FieldBytes, tag: u8) -> Option<AffinePoint> {
    AffinePoint::decompress(x, Choice::from(tag & 1)).into()
}

/// Serializes a point as `0x04 || X || Y`.
///
/// The identity has no affine coordinates and is rejected.
pub fn sec1_encode(point: &AffinePoint) -> Result<[u8; UNCOMPRESSED_POINT_LENGTH]> {
    let encoded = point.to_encoded_point(false);
    let bytes = encoded.as_bytes();
    if bytes.len() != UNCOMPRESSED_POINT_LENGTH {
        return Err(Error::PointError);
    }
    let mut out = [0u8; UNCOMPRESSED_POINT_LENGTH];
    out.copy_from_slice(bytes);
    Ok(out)
}

/// Parses a SEC1 uncompressed encoding.
///
/// Any leading byte other than `0x04` is a tag error, even when the
/// payload would otherwise decode.
pub fn sec1_decode(bytes: &[u8]) -> Result<AffinePoint> {
    if bytes.first() != Some(&TAG_UNCOMPRESSED) {
        return Err(Error::TagError);
    }
    if bytes.len() != UNCOMPRESSED_POINT_LENGTH {
        return Err(Error::LengthError {
            name: "uncompressed point",
            length: UNCOMPRESSED_POINT_LENGTH,
        });
    }
    let encoded = EncodedPoint::from_bytes(bytes).map_err(|_| Error::PointError)?;
    Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded)).ok_or(Error::PointError)
}

/// Serializes a point as `{0x02, 0x03} || X` with the tag carrying the
/// parity of `y`.
pub fn compress(point: &AffinePoint) -> Result<[u8; COMPRESSED_POINT_LENGTH]> {
    let encoded = point.to_encoded_point(true);
    let bytes = encoded.as_bytes();
    if bytes.len() != COMPRESSED_POINT_LENGTH {
        return Err(Error::PointError);
    }
    let mut out = [0u8; COMPRESSED_POINT_LENGTH];
    out.copy_from_slice(bytes);
    Ok(out)
}

/// Recovers a point from its compressed encoding, or fails when the
/// x-coordinate has no square root on the curve.
pub fn decompress(bytes: &[u8]) -> Result<AffinePoint> {
    match bytes.first() {
        Some(&TAG_COMPRESSED_EVEN | &TAG_COMPRESSED_ODD) => {}
        _ => return Err(Error::TagError),
    }
    if bytes.len() != COMPRESSED_POINT_LENGTH {
        return Err(Error::LengthError {
            name: "compressed point",
            length: COMPRESSED_POINT_LENGTH,
        });
    }
    let x = FieldBytes::clone_from_slice(&bytes[1..]);
    decompress_x(&x, bytes[0]).ok_or(Error::PointError)
}

/// Parses either SEC1 form, dispatching on the leading tag byte.
pub fn decode_point(bytes: &[u8]) -> Result<AffinePoint> {
    match bytes.first() {
        Some(&TAG_UNCOMPRESSED) => sec1_decode(bytes),
        Some(&TAG_COMPRESSED_EVEN | &TAG_COMPRESSED_ODD) => decompress(bytes),
        _ => Err(Error::TagError),
    }
}

/// Encodes a point in the tag-less `X || Y` form used for persisted state.
pub fn storage_encode(point: &AffinePoint) -> Result<[u8; STORAGE_POINT_LENGTH]> {
    let sec1 = sec1_encode(point)?;
    let mut out = [0u8; STORAGE_POINT_LENGTH];
    out.copy_from_slice(&sec1[1..]);
    Ok(out)
}

/// Decodes the tag-less 64-byte `X || Y` form.
pub fn storage_decode(bytes: &[u8]) -> Result<AffinePoint> {
    if bytes.len() != STORAGE_POINT_LENGTH {
        return Err(Error::LengthError {
            name: "persisted point",
            length: STORAGE_POINT_LENGTH,
        });
    }
    let mut sec1 = [0u8; UNCOMPRESSED_POINT_LENGTH];
    sec1[0] = TAG_UNCOMPRESSED;
    sec1[1..].copy_from_slice(bytes);
    sec1_decode(&sec1)
}

/// Parses a canonical big-endian scalar.
pub fn scalar_from_bytes(bytes: &[u8]) -> Result<Scalar> {
    if bytes.len() != SCALAR_LENGTH {
        return Err(Error::LengthError {
            name: "scalar",
            length: SCALAR_LENGTH,
        });
    }
    let repr = FieldBytes::clone_from_slice(bytes);
    Option::<Scalar>::from(Scalar::from_repr(repr)).ok_or(Error::ScalarError)
}

/// Parses a canonical big-endian scalar of up to 32 bytes, left-padding
/// shorter values (the issuer emits minimal big-endian integers).
pub fn scalar_from_be_padded(bytes: &[u8]) -> Result<Scalar> {
    if bytes.len() > SCALAR_LENGTH {
        return Err(Error::ScalarError);
    }
    let mut repr = FieldBytes::default();
    repr[SCALAR_LENGTH - bytes.len()..].copy_from_slice(bytes);
    Option::<Scalar>::from(Scalar::from_repr(repr)).ok_or(Error::ScalarError)
}

/// Parses a canonical nonzero big-endian scalar.
pub fn nonzero_scalar_from_bytes(bytes: &[u8]) -> Result<Scalar> {
    let scalar = scalar_from_bytes(bytes)?;
    if scalar.is_zero().into() {
        return Err(Error::ScalarError);
    }
    Ok(scalar)
}

/// Serializes a scalar as 32 big-endian bytes.
pub fn scalar_to_bytes(scalar: &Scalar) -> [u8; SCALAR_LENGTH] {
    let repr: FieldBytes = (*scalar).into();
    repr.into()
}

/// The multiplicative inverse of a scalar mod the group order.
pub fn invert_scalar(scalar: &Scalar) -> Result<Scalar> {
    Option::<Scalar>::from(scalar.invert()).ok_or(Error::ScalarError)
}

/// Draws a uniform nonzero scalar.
pub(crate) fn random_nonzero_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Scalar {
    *SecretKey::random(rng).to_nonzero_scalar()
}
