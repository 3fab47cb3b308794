// SPDX-License-Identifier: AGPL-3.0-or-later

//! Fixed-size identifiers of blocks, transactions, outputs, chain outputs and native tokens.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::serde::{deserialize_hex, from_prefixed_hex, serialize_hex, to_prefixed_hex};
use crate::serializer::{
    ByteCursor, ByteWriter, DeSerializationMode, Serializable, SerializationError, UINT16_BYTE_SIZE,
};

/// Size of BLAKE3 hashes all 32-byte identifiers are derived from.
pub const HASH_LEN: usize = blake3::OUT_LEN;

/// Size of a block id.
pub const BLOCK_ID_LEN: usize = HASH_LEN;

/// Size of a transaction id.
pub const TRANSACTION_ID_LEN: usize = HASH_LEN;

/// Size of an output id: transaction id followed by the output index.
pub const OUTPUT_ID_LEN: usize = TRANSACTION_ID_LEN + UINT16_BYTE_SIZE;

/// Size of an alias id.
pub const ALIAS_ID_LEN: usize = HASH_LEN;

/// Size of an NFT id.
pub const NFT_ID_LEN: usize = HASH_LEN;

/// Size of a native token id: the address of the foundry (type byte and alias id), its serial
/// number and token scheme type.
pub const TOKEN_ID_LEN: usize = 38;

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; $len]);

        impl $name {
            /// Create the identifier from its raw bytes representation.
            pub const fn from_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Bytes of the identifier.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Convert the identifier to a `0x`-prefixed hex string.
            pub fn to_hex(&self) -> String {
                to_prefixed_hex(self.0)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(value: [u8; $len]) -> Self {
                Self(value)
            }
        }

        impl From<$name> for [u8; $len] {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = IdentifierError;

            fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
                let value_len = value.len();

                let checked_value: [u8; $len] = value
                    .try_into()
                    .map_err(|_| IdentifierError::InvalidLength(value_len, $len))?;

                Ok(Self(checked_value))
            }
        }

        impl FromStr for $name {
            type Err = IdentifierError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Self::try_from(from_prefixed_hex(value)?.as_slice())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.to_hex()).finish()
            }
        }

        impl Serializable for $name {
            const MIN_SIZE: usize = $len;

            fn size(&self) -> usize {
                $len
            }

            fn write(
                &self,
                writer: &mut ByteWriter,
                _mode: DeSerializationMode,
            ) -> Result<(), SerializationError> {
                writer.write_bytes(&self.0);
                Ok(())
            }

            fn read(
                cursor: &mut ByteCursor<'_>,
                _mode: DeSerializationMode,
            ) -> Result<Self, SerializationError> {
                cursor.read_array::<$len>().map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serialize_hex(&self.0, serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let bytes = deserialize_hex(deserializer)?;

                bytes
                    .as_slice()
                    .try_into()
                    .map_err(|err: IdentifierError| serde::de::Error::custom(err.to_string()))
            }
        }
    };
}

identifier!(
    /// Identifier of a block, the BLAKE3 hash of its encoding.
    BlockId,
    BLOCK_ID_LEN
);

identifier!(
    /// Identifier of a transaction, the BLAKE3 hash of the encoded transaction payload.
    TransactionId,
    TRANSACTION_ID_LEN
);

identifier!(
    /// Identifier of an alias chain.
    AliasId,
    ALIAS_ID_LEN
);

identifier!(
    /// Identifier of an NFT chain.
    NftId,
    NFT_ID_LEN
);

identifier!(
    /// Identifier of a native token.
    TokenId,
    TOKEN_ID_LEN
);

impl BlockId {
    /// Calculates the id of the given encoded block.
    pub fn from_block_bytes(bytes: impl AsRef<[u8]>) -> Self {
        Self(*blake3::hash(bytes.as_ref()).as_bytes())
    }
}

impl TransactionId {
    /// Calculates the id of the given encoded transaction payload.
    pub fn from_payload_bytes(bytes: impl AsRef<[u8]>) -> Self {
        Self(*blake3::hash(bytes.as_ref()).as_bytes())
    }
}

/// Identifier of an output: the id of the transaction which created it and its index in that
/// transaction's outputs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputId {
    transaction_id: TransactionId,
    index: u16,
}

impl OutputId {
    /// Creates a new output id.
    pub const fn new(transaction_id: TransactionId, index: u16) -> Self {
        Self {
            transaction_id,
            index,
        }
    }

    /// Id of the transaction which created the output.
    pub fn transaction_id(&self) -> &TransactionId {
        &self.transaction_id
    }

    /// Index of the output in the creating transaction.
    pub fn index(&self) -> u16 {
        self.index
    }

    /// Encoded bytes of the output id.
    pub fn to_bytes(&self) -> [u8; OUTPUT_ID_LEN] {
        let mut bytes = [0u8; OUTPUT_ID_LEN];
        bytes[..TRANSACTION_ID_LEN].copy_from_slice(self.transaction_id.as_bytes());
        bytes[TRANSACTION_ID_LEN..].copy_from_slice(&self.index.to_le_bytes());
        bytes
    }

    /// Convert the output id to a `0x`-prefixed hex string.
    pub fn to_hex(&self) -> String {
        to_prefixed_hex(self.to_bytes())
    }
}

impl TryFrom<&[u8]> for OutputId {
    type Error = IdentifierError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        if value.len() != OUTPUT_ID_LEN {
            return Err(IdentifierError::InvalidLength(value.len(), OUTPUT_ID_LEN));
        }

        let (transaction_id, index) = value.split_at(TRANSACTION_ID_LEN);
        Ok(Self {
            transaction_id: TransactionId::try_from(transaction_id)?,
            index: u16::from_le_bytes([index[0], index[1]]),
        })
    }
}

impl FromStr for OutputId {
    type Err = IdentifierError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::try_from(from_prefixed_hex(value)?.as_slice())
    }
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputId")
            .field("transaction_id", &self.transaction_id)
            .field("index", &self.index)
            .finish()
    }
}

impl Serializable for OutputId {
    const MIN_SIZE: usize = OUTPUT_ID_LEN;

    fn size(&self) -> usize {
        OUTPUT_ID_LEN
    }

    fn write(
        &self,
        writer: &mut ByteWriter,
        mode: DeSerializationMode,
    ) -> Result<(), SerializationError> {
        writer.write_object(&self.transaction_id, mode)?;
        writer.write_num(self.index);
        Ok(())
    }

    fn read(
        cursor: &mut ByteCursor<'_>,
        mode: DeSerializationMode,
    ) -> Result<Self, SerializationError> {
        Ok(Self {
            transaction_id: cursor.read_serializable(mode)?,
            index: cursor.read_num()?,
        })
    }
}

impl Serialize for OutputId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serialize_hex(&self.to_bytes(), serializer)
    }
}

impl<'de> Deserialize<'de> for OutputId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bytes = deserialize_hex(deserializer)?;

        bytes
            .as_slice()
            .try_into()
            .map_err(|err: IdentifierError| serde::de::Error::custom(err.to_string()))
    }
}

/// Error types for identifiers.
#[derive(Error, Debug)]
pub enum IdentifierError {
    /// Identifier has an invalid length.
    #[error("invalid identifier length {0} bytes, expected {1} bytes")]
    InvalidLength(usize, usize),

    /// Identifier string contains invalid hexadecimal characters.
    #[error("invalid hex encoding in identifier string")]
    InvalidHexEncoding(#[from] hex::FromHexError),
}

#[cfg(test)]
mod tests {
    use crate::serializer::{DeSerializationMode, Serializable};

    use super::{BlockId, IdentifierError, OutputId, TokenId, TransactionId};

    #[test]
    fn hashing() {
        let id = BlockId::from_block_bytes([1, 2, 3]);

        // Same BLAKE3 digest of [1, 2, 3] as any other BLAKE3 implementation produces
        assert_eq!(
            id.as_bytes(),
            &[
                177, 119, 236, 27, 242, 109, 251, 59, 112, 16, 212, 115, 230, 212, 71, 19, 178,
                155, 118, 91, 153, 198, 230, 14, 203, 250, 231, 66, 222, 73, 101, 67
            ]
        );
        assert_eq!(
            TransactionId::from_payload_bytes([1, 2, 3]).as_bytes(),
            id.as_bytes()
        );
    }

    #[test]
    fn hex_representation() {
        let id = BlockId::from_block_bytes([1, 2, 3]);
        assert_eq!(
            id.to_string(),
            "0xb177ec1bf26dfb3b7010d473e6d44713b29b765b99c6e60ecbfae742de496543"
        );
        assert_eq!(id.to_string().parse::<BlockId>().unwrap(), id);

        // Prefix is optional when parsing
        assert_eq!(
            "b177ec1bf26dfb3b7010d473e6d44713b29b765b99c6e60ecbfae742de496543"
                .parse::<BlockId>()
                .unwrap(),
            id
        );
    }

    #[test]
    fn serialize() {
        let id = TokenId::from_bytes([7; 38]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "07".repeat(38)));
        assert_eq!(serde_json::from_str::<TokenId>(&json).unwrap(), id);
    }

    #[test]
    fn invalid_length() {
        let result: Result<BlockId, IdentifierError> = [1, 2, 3].as_slice().try_into();
        assert!(matches!(result, Err(IdentifierError::InvalidLength(3, 32))));

        assert!(matches!(
            "0x0102".parse::<OutputId>(),
            Err(IdentifierError::InvalidLength(2, 34))
        ));

        assert!(serde_json::from_str::<BlockId>("\"0x0102\"").is_err());
    }

    #[test]
    fn invalid_hex_encoding() {
        assert!(matches!(
            "0xnothex".parse::<TransactionId>(),
            Err(IdentifierError::InvalidHexEncoding(_))
        ));
    }

    #[test]
    fn output_id() {
        let transaction_id = TransactionId::from_bytes([3; 32]);
        let output_id = OutputId::new(transaction_id, 258);

        let bytes = output_id
            .serialize(DeSerializationMode::PERFORM_VALIDATION)
            .unwrap();
        assert_eq!(bytes.len(), 34);
        assert_eq!(&bytes[32..], &[2, 1]);
        assert_eq!(bytes, output_id.to_bytes().to_vec());

        let (decoded, consumed) =
            OutputId::deserialize(&bytes, DeSerializationMode::PERFORM_VALIDATION).unwrap();
        assert_eq!(decoded, output_id);
        assert_eq!(consumed, 34);

        assert_eq!(output_id.to_hex().parse::<OutputId>().unwrap(), output_id);
        assert_eq!(decoded.index(), 258);
        assert_eq!(decoded.transaction_id(), &transaction_id);
    }
}
