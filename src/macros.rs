// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

/// Adds base64 convenience codecs on top of a type's fixed-length byte
/// representation.
macro_rules! impl_base64 {
    ($name:ident) => {
        impl $name {
            /// Encode to a base64 string.
            pub fn encode_base64(&self) -> String {
                base64::encode(self.to_bytes())
            }

            /// Decode from a base64 string.
            pub fn decode_base64(s: &str) -> crate::errors::Result<Self> {
                let bytes = base64::decode(s)
                    .map_err(|_| crate::errors::Error::SerializationError)?;
                Self::from_bytes(&bytes)
            }
        }
    };
}

/// Derives `serde` traits: base64 strings for human-readable formats,
/// raw bytes otherwise.
macro_rules! impl_serde {
    ($name:ident) => {
        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                if serializer.is_human_readable() {
                    serializer.serialize_str(&self.encode_base64())
                } else {
                    serializer.serialize_bytes(self.to_bytes().as_ref())
                }
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> core::result::Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                if deserializer.is_human_readable() {
                    let string = <&str as serde::Deserialize>::deserialize(deserializer)?;
                    Self::decode_base64(string).map_err(serde::de::Error::custom)
                } else {
                    let bytes = <&[u8] as serde::Deserialize>::deserialize(deserializer)?;
                    Self::from_bytes(bytes).map_err(serde::de::Error::custom)
                }
            }
        }
    };
}
