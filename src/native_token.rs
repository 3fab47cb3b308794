// SPDX-License-Identifier: AGPL-3.0-or-later

//! Native tokens held by outputs next to their base token amount.
use serde::{Deserialize, Serialize};

use crate::identifier::{TokenId, TOKEN_ID_LEN};
use crate::serializer::{
    ArrayRules, ArrayValidationMode, ByteCursor, ByteWriter, DeSerializationMode, ErrorContext,
    Serializable, SerializationError,
};

/// Size of an encoded native token amount, an unsigned 256-bit integer.
pub const AMOUNT_LEN: usize = 32;

/// Size of an encoded native token.
pub const NATIVE_TOKEN_LEN: usize = TOKEN_ID_LEN + AMOUNT_LEN;

/// Maximum number of distinct native tokens an output can hold.
pub const MAX_NATIVE_TOKENS: usize = 64;

/// Native tokens are sorted by and unique in their token id, the amount is not taken into account.
pub const NATIVE_TOKENS_RULES: ArrayRules = ArrayRules::new(0, MAX_NATIVE_TOKENS)
    .with_mode(ArrayValidationMode::NO_DUPLICATES.with(ArrayValidationMode::LEXICAL_ORDERING))
    .with_uniqueness_slice(token_id_slice);

fn token_id_slice(bytes: &[u8]) -> &[u8] {
    bytes.get(..TOKEN_ID_LEN).unwrap_or(bytes)
}

/// Amount of a native token, an unsigned 256-bit integer stored little-endian.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TokenAmount([u8; AMOUNT_LEN]);

impl TokenAmount {
    /// Create the amount from its little-endian bytes.
    pub const fn from_le_bytes(bytes: [u8; AMOUNT_LEN]) -> Self {
        Self(bytes)
    }

    /// Little-endian bytes of the amount.
    pub fn as_le_bytes(&self) -> &[u8; AMOUNT_LEN] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|byte| *byte == 0)
    }

    /// Big-endian hex representation without leading zeros, as used by the JSON mirror.
    pub fn to_hex(&self) -> String {
        let mut big_endian = self.0;
        big_endian.reverse();

        let digits = hex::encode(big_endian);
        let trimmed = digits.trim_start_matches('0');
        if trimmed.is_empty() {
            "0x0".to_string()
        } else {
            format!("0x{trimmed}")
        }
    }

    /// Parses the big-endian hex representation, the `0x` prefix is optional.
    pub fn from_hex(value: &str) -> Result<Self, SerializationError> {
        let digits = value.strip_prefix("0x").unwrap_or(value);
        let padded = if digits.len() % 2 == 1 {
            format!("0{digits}")
        } else {
            digits.to_string()
        };

        let bytes = hex::decode(padded)
            .map_err(|err| SerializationError::InvalidValue(format!("invalid amount: {err}")))?;
        if bytes.len() > AMOUNT_LEN {
            return Err(SerializationError::InvalidValue(format!(
                "amount exceeds {AMOUNT_LEN} bytes"
            )));
        }

        let mut amount = [0u8; AMOUNT_LEN];
        for (index, byte) in bytes.iter().rev().enumerate() {
            amount[index] = *byte;
        }

        Ok(Self(amount))
    }
}

impl From<u128> for TokenAmount {
    fn from(value: u128) -> Self {
        let mut bytes = [0u8; AMOUNT_LEN];
        bytes[..16].copy_from_slice(&value.to_le_bytes());
        Self(bytes)
    }
}

impl std::fmt::Debug for TokenAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TokenAmount").field(&self.to_hex()).finish()
    }
}

impl Serialize for TokenAmount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::from_hex(&value).map_err(|err| serde::de::Error::custom(err.to_string()))
    }
}

/// Amount of a native token held by an output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeToken {
    id: TokenId,
    amount: TokenAmount,
}

impl NativeToken {
    pub fn new(id: TokenId, amount: impl Into<TokenAmount>) -> Self {
        Self {
            id,
            amount: amount.into(),
        }
    }

    pub fn id(&self) -> &TokenId {
        &self.id
    }

    pub fn amount(&self) -> &TokenAmount {
        &self.amount
    }
}

impl Serializable for NativeToken {
    const MIN_SIZE: usize = NATIVE_TOKEN_LEN;

    fn size(&self) -> usize {
        NATIVE_TOKEN_LEN
    }

    fn write(
        &self,
        writer: &mut ByteWriter,
        mode: DeSerializationMode,
    ) -> Result<(), SerializationError> {
        if mode.validates() && self.amount.is_zero() {
            return Err(zero_amount(&self.id));
        }

        writer.write_object(&self.id, mode)?;
        writer.write_bytes(self.amount.as_le_bytes());
        Ok(())
    }

    fn read(
        cursor: &mut ByteCursor<'_>,
        mode: DeSerializationMode,
    ) -> Result<Self, SerializationError> {
        let id: TokenId = cursor
            .read_serializable(mode)
            .context("unable to deserialize native token id")?;
        let amount = TokenAmount::from_le_bytes(cursor.read_array()?);

        if mode.validates() && amount.is_zero() {
            return Err(zero_amount(&id));
        }

        Ok(Self { id, amount })
    }
}

fn zero_amount(id: &TokenId) -> SerializationError {
    SerializationError::InvalidValue(format!("amount of native token {id} must not be zero"))
}
