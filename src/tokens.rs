// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Token minting, blinding, unblinding and redemption-key derivation.
//!
//! A token lives through exactly one issuance and one redemption: the
//! client mints a random preimage, blinds its curve image for signing,
//! unblinds the returned point into the shared secret `N = k·T`, and
//! derives from it the MAC key that binds the redemption to its request
//! data.

use core::fmt;

use hmac::{Hmac, Mac};
use p256::{AffinePoint, ProjectivePoint, Scalar};
use rand_core::{CryptoRng, RngCore};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::errors::{Error, Result};
use crate::group::{
    decode_point, invert_scalar, nonzero_scalar_from_bytes, random_nonzero_scalar, scalar_to_bytes,
    sec1_decode, sec1_encode, storage_decode, storage_encode, SCALAR_LENGTH,
    STORAGE_POINT_LENGTH, UNCOMPRESSED_POINT_LENGTH,
};
use crate::hash_to_curve::hash_to_curve;

type HmacSha256 = Hmac<Sha256>;

/// Doubles as HMAC key and first update when deriving a redemption key.
/// The issuer derives keys the same way; both quirks are load-bearing.
const DERIVE_KEY_TAG: &[u8] = b"hash_derive_key";
/// First HMAC update when binding request data under a derived key.
const REQUEST_BINDING_TAG: &[u8] = b"hash_request_binding";

/// The length of a `TokenPreimage`, in bytes.
pub const TOKEN_PREIMAGE_LENGTH: usize = 32;
/// The length of a `Token`, in bytes.
pub const TOKEN_LENGTH: usize = TOKEN_PREIMAGE_LENGTH + SCALAR_LENGTH;
/// The length of a `BlindedToken`, in bytes.
pub const BLINDED_TOKEN_LENGTH: usize = UNCOMPRESSED_POINT_LENGTH;
/// The length of a `SignedToken`, in bytes.
pub const SIGNED_TOKEN_LENGTH: usize = UNCOMPRESSED_POINT_LENGTH;
/// The length of an `UnblindedToken`, in bytes.
pub const UNBLINDED_TOKEN_LENGTH: usize = TOKEN_PREIMAGE_LENGTH + STORAGE_POINT_LENGTH;
/// The length of a `VerificationSignature`, in bytes.
pub const VERIFICATION_SIGNATURE_LENGTH: usize = 32;

/// A `TokenPreimage` is 32 CSPRNG bytes whose curve image
/// `T = HashToCurve(t)` is the value the issuer actually signs.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct TokenPreimage([u8; TOKEN_PREIMAGE_LENGTH]);

impl fmt::Debug for TokenPreimage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPreimage").finish_non_exhaustive()
    }
}

impl TokenPreimage {
    pub(crate) fn hash_to_point(&self) -> Result<AffinePoint> {
        hash_to_curve(&self.0)
    }

    pub(crate) fn bytes(&self) -> &[u8; TOKEN_PREIMAGE_LENGTH] {
        &self.0
    }

    /// Convert this `TokenPreimage` to a byte array.
    pub fn to_bytes(&self) -> [u8; TOKEN_PREIMAGE_LENGTH] {
        self.0
    }

    /// Construct a `TokenPreimage` from a slice of bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != TOKEN_PREIMAGE_LENGTH {
            return Err(Error::LengthError {
                name: "TokenPreimage",
                length: TOKEN_PREIMAGE_LENGTH,
            });
        }
        let mut bits = [0u8; TOKEN_PREIMAGE_LENGTH];
        bits.copy_from_slice(bytes);
        Ok(TokenPreimage(bits))
    }
}

impl_base64!(TokenPreimage);
impl_serde!(TokenPreimage);

/// A `Token` is a preimage together with its blinding factor.
///
/// Since it includes the blinding factor, a token is a client secret and
/// is never revealed to the server.
pub struct Token {
    t: TokenPreimage,
    r: Scalar,
}

/// Overwrite the blinding factor when the token goes out of scope.
impl Drop for Token {
    fn drop(&mut self) {
        self.r.zeroize();
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token").finish_non_exhaustive()
    }
}

impl Token {
    /// Mints a fresh token from the OS CSPRNG.
    ///
    /// On the vanishingly rare seed whose try-and-increment walk exhausts
    /// its bound, draws again rather than surfacing the failure.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let r = random_nonzero_scalar(rng);
        loop {
            let mut seed = [0u8; TOKEN_PREIMAGE_LENGTH];
            rng.fill_bytes(&mut seed);
            let t = TokenPreimage(seed);
            if t.hash_to_point().is_ok() {
                return Token { t, r };
            }
        }
    }

    /// The preimage revealed to the server at redemption time.
    pub fn preimage(&self) -> &TokenPreimage {
        &self.t
    }

    /// Blinds the token's curve image for issuance, computing `b·T`.
    pub fn blind(&self) -> Result<BlindedToken> {
        let point = ProjectivePoint::from(self.t.hash_to_point()?) * self.r;
        Ok(BlindedToken(point.to_affine()))
    }

    /// Removes the blinding factor from a signed point, yielding the
    /// shared redemption secret `N = b⁻¹·(k·b·T) = k·T`.
    pub fn unblind(&self, signed: &SignedToken) -> Result<UnblindedToken> {
        let inverse = invert_scalar(&self.r)?;
        let w = (ProjectivePoint::from(signed.0) * inverse).to_affine();
        Ok(UnblindedToken { t: self.t, w })
    }

    /// Convert this `Token` to a byte array.
    pub fn to_bytes(&self) -> [u8; TOKEN_LENGTH] {
        let mut bytes = [0u8; TOKEN_LENGTH];
        bytes[..TOKEN_PREIMAGE_LENGTH].copy_from_slice(&self.t.0);
        bytes[TOKEN_PREIMAGE_LENGTH..].copy_from_slice(&scalar_to_bytes(&self.r));
        bytes
    }

    /// Construct a `Token` from a slice of bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != TOKEN_LENGTH {
            return Err(Error::LengthError {
                name: "Token",
                length: TOKEN_LENGTH,
            });
        }
        let t = TokenPreimage::from_bytes(&bytes[..TOKEN_PREIMAGE_LENGTH])?;
        let r = nonzero_scalar_from_bytes(&bytes[TOKEN_PREIMAGE_LENGTH..])?;
        Ok(Token { t, r })
    }

    #[cfg(test)]
    pub(crate) fn from_parts(t: TokenPreimage, r: Scalar) -> Self {
        Token { t, r }
    }
}

impl_base64!(Token);
impl_serde!(Token);

/// A `BlindedToken` is sent to the server for signing.
///
/// It is the blinding factor applied to the point derived from the token
/// preimage: `P = b·T = b·HashToCurve(t)`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BlindedToken(pub(crate) AffinePoint);

impl BlindedToken {
    /// Convert this `BlindedToken` to a byte array.
    pub fn to_bytes(&self) -> [u8; BLINDED_TOKEN_LENGTH] {
        sec1_encode(&self.0).expect("constructors reject the identity point")
    }

    /// Construct a `BlindedToken` from its SEC1 uncompressed encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        sec1_decode(bytes).map(BlindedToken)
    }
}

impl_base64!(BlindedToken);
impl_serde!(BlindedToken);

/// A `SignedToken` is the issuer's evaluation `Q = k·P` of a blinded
/// token.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SignedToken(pub(crate) AffinePoint);

impl SignedToken {
    /// Convert this `SignedToken` to a byte array.
    pub fn to_bytes(&self) -> [u8; SIGNED_TOKEN_LENGTH] {
        sec1_encode(&self.0).expect("constructors reject the identity point")
    }

    /// Construct a `SignedToken` from either SEC1 encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        decode_point(bytes).map(SignedToken)
    }
}

impl_base64!(SignedToken);
impl_serde!(SignedToken);

/// An `UnblindedToken` holds the preimage and the shared secret point
/// `N = k·T`; the pair is persisted until spent at redemption.
///
/// While both the client and the issuer can compute `N`, it is never sent
/// between them.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct UnblindedToken {
    t: TokenPreimage,
    w: AffinePoint,
}

impl fmt::Debug for UnblindedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnblindedToken").finish_non_exhaustive()
    }
}

impl UnblindedToken {
    /// The preimage revealed to the server at redemption time.
    pub fn preimage(&self) -> &TokenPreimage {
        &self.t
    }

    /// Derives the per-redemption MAC key `K = HMAC(tag, tag || t || N)`.
    ///
    /// The derivation tag is both the HMAC key and the first message
    /// update; the issuer keys its side identically.
    pub fn derive_verification_key(&self) -> VerificationKey {
        let mut mac = HmacSha256::new_from_slice(DERIVE_KEY_TAG)
            .expect("HMAC accepts keys of any length");
        mac.update(DERIVE_KEY_TAG);
        mac.update(self.t.bytes());
        mac.update(&sec1_encode(&self.w).expect("constructors reject the identity point"));
        VerificationKey(mac.finalize().into_bytes().into())
    }

    /// Convert this `UnblindedToken` to a byte array, using the tag-less
    /// persisted-point form for `N`.
    pub fn to_bytes(&self) -> [u8; UNBLINDED_TOKEN_LENGTH] {
        let mut bytes = [0u8; UNBLINDED_TOKEN_LENGTH];
        bytes[..TOKEN_PREIMAGE_LENGTH].copy_from_slice(&self.t.0);
        bytes[TOKEN_PREIMAGE_LENGTH..]
            .copy_from_slice(&storage_encode(&self.w).expect("constructors reject the identity point"));
        bytes
    }

    /// Construct an `UnblindedToken` from a slice of bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != UNBLINDED_TOKEN_LENGTH {
            return Err(Error::LengthError {
                name: "UnblindedToken",
                length: UNBLINDED_TOKEN_LENGTH,
            });
        }
        let t = TokenPreimage::from_bytes(&bytes[..TOKEN_PREIMAGE_LENGTH])?;
        let w = storage_decode(&bytes[TOKEN_PREIMAGE_LENGTH..])?;
        Ok(UnblindedToken { t, w })
    }

    #[cfg(test)]
    pub(crate) fn from_parts(t: TokenPreimage, w: AffinePoint) -> Self {
        UnblindedToken { t, w }
    }

    #[cfg(test)]
    pub(crate) fn point(&self) -> AffinePoint {
        self.w
    }
}

impl_base64!(UnblindedToken);
impl_serde!(UnblindedToken);

/// The shared MAC key for binding a redemption to its request data.
pub struct VerificationKey([u8; 32]);

impl fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationKey").finish_non_exhaustive()
    }
}

impl VerificationKey {
    /// MACs `data`, producing the signature sent alongside a redemption.
    ///
    /// Each element of `data` is fed as a separate update, in order.
    pub fn sign(&self, data: &[&[u8]]) -> VerificationSignature {
        let mut mac =
            HmacSha256::new_from_slice(&self.0).expect("HMAC accepts keys of any length");
        mac.update(REQUEST_BINDING_TAG);
        for part in data {
            mac.update(part);
        }
        VerificationSignature(mac.finalize().into_bytes().into())
    }

    /// Recomputes the MAC over `data` and compares in constant time.
    pub fn verify(&self, signature: &VerificationSignature, data: &[&[u8]]) -> bool {
        self.sign(data)
            .0
            .as_ref()
            .ct_eq(signature.0.as_ref())
            .into()
    }

    #[cfg(test)]
    pub(crate) fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// A `VerificationSignature` accompanies the preimage in a redemption
/// request and is checked by the issuer with its own derived key.
#[derive(Clone)]
pub struct VerificationSignature([u8; VERIFICATION_SIGNATURE_LENGTH]);

impl PartialEq for VerificationSignature {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_ref().ct_eq(other.0.as_ref()).into()
    }
}

impl Eq for VerificationSignature {}

impl fmt::Debug for VerificationSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationSignature").finish_non_exhaustive()
    }
}

impl VerificationSignature {
    // Kept private so all comparisons go through the constant-time path.
    fn to_bytes(&self) -> [u8; VERIFICATION_SIGNATURE_LENGTH] {
        self.0
    }

    /// Construct a `VerificationSignature` from a slice of bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != VERIFICATION_SIGNATURE_LENGTH {
            return Err(Error::LengthError {
                name: "VerificationSignature",
                length: VERIFICATION_SIGNATURE_LENGTH,
            });
        }
        let mut bits = [0u8; VERIFICATION_SIGNATURE_LENGTH];
        bits.copy_from_slice(bytes);
        Ok(VerificationSignature(bits))
    }
}

impl_base64!(VerificationSignature);
impl_serde!(VerificationSignature);
