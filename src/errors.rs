// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Errors which are produced while minting, issuing and redeeming tokens

use displaydoc::Display;

/// [`Result`](core::result::Result) shorthand that uses [`Error`].
pub type Result<T> = core::result::Result<T, Error>;

/// Represents an error in the manipulation of internal cryptographic data
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Error {
    /// Point encoding did not begin with the expected SEC1 tag
    TagError,
    /// Could not decompress or validate a curve point
    PointError,
    /// Scalar bytes were out of range, or zero where an inverse is required
    ScalarError,
    /// Wrong length for {name}: expected {length} bytes
    LengthError {
        /// the type being decoded
        name: &'static str,
        /// the expected byte length
        length: usize,
    },
    /// Failure to decode the base64 or JSON framing of a message
    SerializationError,
    /// The blinded and signed sequences were empty or differ in length
    BatchError,
    /// Exhausted the iteration bound while hashing onto the curve
    HashToCurveError,
    /// The recomputed batch proof challenge did not match
    VerificationError,
    /// No commitment pair is available
    CommitmentError,
}

impl std::error::Error for Error {}
