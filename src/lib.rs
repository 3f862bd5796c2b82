// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Client-side cryptography for a Privacy Pass style anonymous token
//! protocol over NIST P-256.
//!
//! # Overview
//!
//! The scheme is a 2HashDH verifiable oblivious pseudorandom function: the
//! issuer holds a secret scalar `k` and publishes a commitment pair
//! `(G, H)` with `H = k·G`. The client mints random tokens, maps each onto
//! the curve with a deterministic hash-to-curve walk, and blinds the
//! images before sending them for signing. The issuer returns `k`-th
//! multiples of the blinded points together with one batch Chaum–Pedersen
//! proof that the same `k` was used for every point and for the published
//! commitment. After checking the proof the client unblinds each point
//! into the shared secret `N = k·T`, from which both sides can derive a
//! MAC key binding a later redemption to its request data. The issuer
//! cannot link a redemption back to the issuance it came from.
//!
//! # Issuance
//!
//! Mint tokens and blind them for the signing request:
//!
//! ```
//! use challenge_bypass_p256::Token;
//! use rand::rngs::OsRng;
//!
//! let mut rng = OsRng;
//! let token = Token::random(&mut rng);
//! let blinded = token.blind().expect("fresh tokens always map onto the curve");
//! let request = blinded.encode_base64();
//! # assert_eq!(request.len(), 88);
//! ```
//!
//! The issuance response carries the signed points and an opaque batch
//! proof blob. [`batch_unblind`] checks the proof against the active
//! commitment pair and only then strips the blinding factors:
//!
//! ```no_run
//! use challenge_bypass_p256::{
//!     batch_unblind, decode_batch_proof, Commitment, SignedToken, Token,
//! };
//! use rand::rngs::OsRng;
//!
//! # fn issue(_: &[challenge_bypass_p256::BlindedToken]) -> (Vec<SignedToken>, String) {
//! #     unimplemented!()
//! # }
//! let mut rng = OsRng;
//! let tokens: Vec<Token> = (0..10).map(|_| Token::random(&mut rng)).collect();
//! let blinded = tokens
//!     .iter()
//!     .map(Token::blind)
//!     .collect::<Result<Vec<_>, _>>()?;
//!
//! // hand the blinded tokens to the issuer
//! let (signed, proof_blob) = issue(&blinded);
//!
//! let commitment = Commitment::from_base64("<G>", "<H>")?;
//! let proof = decode_batch_proof(&proof_blob)?;
//! let unblinded = batch_unblind(&commitment, &tokens, &signed, &proof)?;
//! # Ok::<(), challenge_bypass_p256::Error>(())
//! ```
//!
//! # Redemption
//!
//! Spending a token reveals its preimage and a MAC over the request data
//! under the derived key; the issuer recomputes both from `k` alone:
//!
//! ```
//! use challenge_bypass_p256::{SignedToken, Token};
//! use rand::rngs::OsRng;
//!
//! # let mut rng = OsRng;
//! # let token = Token::random(&mut rng);
//! # let blinded = token.blind().unwrap();
//! # let signed = SignedToken::from_bytes(&blinded.to_bytes()).unwrap();
//! let unblinded = token.unblind(&signed)?;
//! let key = unblinded.derive_verification_key();
//! let mac = key.sign(&[b"example.com", b"/index.html"]);
//! assert!(key.verify(&mac, &[b"example.com", b"/index.html"]));
//! # Ok::<(), challenge_bypass_p256::Error>(())
//! ```
//!
//! # Features
//!
//! - `dev-commitments`: select the `"dev"` entry of the issuer's
//!   commitment document instead of `"1.0"`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod macros;

pub mod commitment;
pub mod dleq;
pub mod errors;
pub mod group;
mod hash_to_curve;
pub mod tokens;
pub mod wire;


pub use crate::commitment::{
    active_commitments, set_active_commitments, Commitment, CommitmentFile, COMMITMENT_VERSION,
};
pub use crate::dleq::{batch_unblind, DleqProof, DLEQ_PROOF_LENGTH};
pub use crate::errors::{Error, Result};
pub use crate::hash_to_curve::hash_to_curve;
pub use crate::tokens::{
    BlindedToken, SignedToken, Token, TokenPreimage, UnblindedToken, VerificationKey,
    VerificationSignature, BLINDED_TOKEN_LENGTH, SIGNED_TOKEN_LENGTH, TOKEN_LENGTH,
    TOKEN_PREIMAGE_LENGTH, UNBLINDED_TOKEN_LENGTH, VERIFICATION_SIGNATURE_LENGTH,
};
pub use crate::wire::{decode_batch_proof, encode_batch_proof};
