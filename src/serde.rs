// SPDX-License-Identifier: AGPL-3.0-or-later

//! Helpers for the JSON mirror of the protocol objects.
//!
//! Byte sequences are represented as `0x`-prefixed hex strings in human readable encodings and as
//! raw bytes otherwise. Polymorphic objects carry an integer `"type"` field next to their named
//! fields; decoding them happens in two steps: the discriminator is read first, then the same
//! value is decoded into the concrete variant.
use serde::de::{DeserializeOwned, Error as SerdeError};
use serde::{Deserialize, Serialize};
use serde_bytes::{ByteBuf as SerdeByteBuf, Bytes as SerdeBytes};
use serde_json::Value;

use crate::serializer::TypeKind;

/// Prefix in front of every hex string of the JSON mirror.
pub const HEX_PREFIX: &str = "0x";

/// Name of the discriminator field of polymorphic objects.
pub const TYPE_FIELD: &str = "type";

/// Encodes bytes as a `0x`-prefixed hex string.
pub fn to_prefixed_hex(value: impl AsRef<[u8]>) -> String {
    format!("{HEX_PREFIX}{}", hex::encode(value))
}

/// Decodes a hex string, the `0x` prefix is optional.
pub fn from_prefixed_hex(value: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(value.strip_prefix(HEX_PREFIX).unwrap_or(value))
}

/// Helper method for `serde` to serialize bytes into a hex string when using a human readable
/// encoding (JSON), otherwise it serializes the bytes directly.
pub fn serialize_hex<S>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    if serializer.is_human_readable() {
        serializer.serialize_str(&to_prefixed_hex(value))
    } else {
        SerdeBytes::new(value).serialize(serializer)
    }
}

/// Helper method for `serde` to deserialize from a hex string into bytes when using a human
/// readable encoding (JSON), otherwise it deserializes the bytes directly.
pub fn deserialize_hex<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    if deserializer.is_human_readable() {
        let value = String::deserialize(deserializer)?;
        from_prefixed_hex(&value).map_err(|err| SerdeError::custom(err.to_string()))
    } else {
        let bytes = <SerdeByteBuf>::deserialize(deserializer)?;
        Ok(bytes.to_vec())
    }
}

/// Hex encoding for fixed-size byte arrays, use with `#[serde(with = "crate::serde::hex_array")]`.
pub mod hex_array {
    use super::{deserialize_hex, serialize_hex};

    pub fn serialize<S, const N: usize>(value: &[u8; N], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serialize_hex(value, serializer)
    }

    pub fn deserialize<'de, D, const N: usize>(deserializer: D) -> Result<[u8; N], D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bytes = deserialize_hex(deserializer)?;
        let len = bytes.len();
        bytes.try_into().map_err(|_| {
            serde::de::Error::custom(format!("invalid length {len} bytes, expected {N} bytes"))
        })
    }
}

/// Hex encoding for variable sized byte sequences, use with
/// `#[serde(with = "crate::serde::hex_bytes")]`.
pub mod hex_bytes {
    pub use super::deserialize_hex as deserialize;

    pub fn serialize<S>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        super::serialize_hex(value, serializer)
    }
}

/// Amounts are strings in the JSON mirror since JSON numbers can't represent every `u64`.
pub mod u64_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.collect_str(value)
        } else {
            serializer.serialize_u64(*value)
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let value = String::deserialize(deserializer)?;
            value.parse().map_err(serde::de::Error::custom)
        } else {
            u64::deserialize(deserializer)
        }
    }
}

/// Serializes a variant struct together with its `"type"` discriminator.
#[derive(Serialize)]
pub struct Tagged<'a, T> {
    #[serde(rename = "type")]
    prefix: u32,

    #[serde(flatten)]
    inner: &'a T,
}

impl<'a, T: Serialize> Tagged<'a, T> {
    /// Wraps the variant of the given kind.
    pub fn new<K: TypeKind>(kind: K, inner: &'a T) -> Self {
        Self {
            prefix: kind.prefix(),
            inner,
        }
    }
}

impl<T> std::fmt::Debug for Tagged<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tagged").field("prefix", &self.prefix).finish()
    }
}

/// First step of decoding a polymorphic object: reads the JSON value and resolves its
/// discriminator into a kind.
pub fn deserialize_tagged<'de, D, K>(deserializer: D) -> Result<(K, Value), D::Error>
where
    D: serde::Deserializer<'de>,
    K: TypeKind,
{
    let value = Value::deserialize(deserializer)?;

    let prefix = value
        .get(TYPE_FIELD)
        .and_then(Value::as_u64)
        .ok_or_else(|| D::Error::missing_field(TYPE_FIELD))?;

    let kind = u32::try_from(prefix)
        .ok()
        .and_then(K::from_prefix)
        .ok_or_else(|| D::Error::custom(format!("unknown {} type {prefix}", K::CATEGORY)))?;

    Ok((kind, value))
}

/// Second step of decoding a polymorphic object: decodes the JSON value into the concrete variant.
pub fn from_value<T, E>(value: Value) -> Result<T, E>
where
    T: DeserializeOwned,
    E: SerdeError,
{
    serde_json::from_value(value).map_err(E::custom)
}
