// SPDX-License-Identifier: AGPL-3.0-or-later

//! Parameters of the network a node participates in.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::block::PROTOCOL_VERSION;
use crate::serializer::{
    ByteCursor, ByteWriter, DeSerializationMode, ErrorContext, LengthPrefixType, Serializable,
    SerializationError, ONE_BYTE, UINT32_BYTE_SIZE, UINT64_BYTE_SIZE,
};

/// Identifier of a network, derived from its name.
pub type NetworkId = u64;

/// Maximum length of the human readable part of bech32 addresses.
pub const MAX_BECH32_HRP_LENGTH: usize = 83;

/// Costs of storing objects in the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentStructure {
    /// Rent of a single virtual byte denoted in base tokens.
    #[serde(rename = "vByteCost")]
    pub v_byte_cost: u32,

    /// Weight of data fields.
    #[serde(rename = "vByteFactorData")]
    pub v_byte_factor_data: u8,

    /// Weight of fields generating lookup keys.
    #[serde(rename = "vByteFactorKey")]
    pub v_byte_factor_key: u8,
}

impl Default for RentStructure {
    fn default() -> Self {
        Self {
            v_byte_cost: 100,
            v_byte_factor_data: 1,
            v_byte_factor_key: 10,
        }
    }
}

impl Serializable for RentStructure {
    const MIN_SIZE: usize = UINT32_BYTE_SIZE + ONE_BYTE + ONE_BYTE;

    fn size(&self) -> usize {
        Self::MIN_SIZE
    }

    fn write(
        &self,
        writer: &mut ByteWriter,
        _mode: DeSerializationMode,
    ) -> Result<(), SerializationError> {
        writer.write_num(self.v_byte_cost);
        writer.write_num(self.v_byte_factor_data);
        writer.write_num(self.v_byte_factor_key);
        Ok(())
    }

    fn read(
        cursor: &mut ByteCursor<'_>,
        _mode: DeSerializationMode,
    ) -> Result<Self, SerializationError> {
        Ok(Self {
            v_byte_cost: cursor
                .read_num()
                .context("unable to deserialize virtual byte cost")?,
            v_byte_factor_data: cursor
                .read_num()
                .context("unable to deserialize virtual byte factor data")?,
            v_byte_factor_key: cursor
                .read_num()
                .context("unable to deserialize virtual byte factor key")?,
        })
    }
}

/// Parameters of the protocol running on a network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolParameters {
    /// Version of the protocol.
    #[serde(rename = "version")]
    pub protocol_version: u8,

    /// Human friendly name of the network.
    #[serde(rename = "networkName")]
    pub network_name: String,

    /// Human readable part of bech32 addresses on the network.
    #[serde(rename = "bech32HRP")]
    pub bech32_hrp: String,

    /// Minimum proof of work score of blocks.
    #[serde(rename = "minPoWScore")]
    pub min_pow_score: u32,

    /// How far below the tips a parent may lie.
    #[serde(rename = "belowMaxDepth")]
    pub below_max_depth: u8,

    #[serde(rename = "rentStructure")]
    pub rent_structure: RentStructure,

    /// Total supply of base tokens.
    #[serde(rename = "tokenSupply", with = "crate::serde::u64_string")]
    pub token_supply: u64,
}

impl ProtocolParameters {
    /// Parses and validates parameters given as JSON.
    pub fn from_json(json: &str) -> Result<Self, ProtocolParametersError> {
        let parameters: Self = serde_json::from_str(json)?;
        parameters.validate()?;
        Ok(parameters)
    }

    /// Checks the parameters for consistency.
    pub fn validate(&self) -> Result<(), ProtocolParametersError> {
        if self.protocol_version != PROTOCOL_VERSION {
            return Err(ProtocolParametersError::UnsupportedProtocolVersion(
                self.protocol_version,
            ));
        }

        if self.network_name.is_empty() {
            return Err(ProtocolParametersError::EmptyNetworkName);
        }

        let hrp_is_valid = !self.bech32_hrp.is_empty()
            && self.bech32_hrp.len() <= MAX_BECH32_HRP_LENGTH
            && self
                .bech32_hrp
                .bytes()
                .all(|byte| byte.is_ascii_lowercase() || byte.is_ascii_digit());
        if !hrp_is_valid {
            return Err(ProtocolParametersError::InvalidBech32Hrp(
                self.bech32_hrp.clone(),
            ));
        }

        Ok(())
    }

    /// Id of the network, the first eight bytes of the hash of its name read as a little-endian
    /// integer.
    pub fn network_id(&self) -> NetworkId {
        network_id_from_name(&self.network_name)
    }
}

/// Derives the id of a network from its name.
pub fn network_id_from_name(network_name: &str) -> NetworkId {
    let hash = blake3::hash(network_name.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

impl Default for ProtocolParameters {
    fn default() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            network_name: "testnet".to_string(),
            bech32_hrp: "rms".to_string(),
            min_pow_score: 1500,
            below_max_depth: 15,
            rent_structure: RentStructure::default(),
            token_supply: 1_813_620_509_061_365,
        }
    }
}

fn write_string(writer: &mut ByteWriter, value: &str) -> Result<(), SerializationError> {
    writer.write_variable_bytes(value.as_bytes(), LengthPrefixType::Byte)
}

fn read_string(cursor: &mut ByteCursor<'_>) -> Result<String, SerializationError> {
    let bytes = cursor.read_variable_bytes(LengthPrefixType::Byte, None)?;
    String::from_utf8(bytes)
        .map_err(|err| SerializationError::InvalidValue(format!("invalid utf-8 string: {err}")))
}

impl Serializable for ProtocolParameters {
    const MIN_SIZE: usize = ONE_BYTE
        + ONE_BYTE
        + ONE_BYTE
        + UINT32_BYTE_SIZE
        + ONE_BYTE
        + RentStructure::MIN_SIZE
        + UINT64_BYTE_SIZE;

    fn size(&self) -> usize {
        Self::MIN_SIZE + self.network_name.len() + self.bech32_hrp.len()
    }

    fn write(
        &self,
        writer: &mut ByteWriter,
        mode: DeSerializationMode,
    ) -> Result<(), SerializationError> {
        writer.write_num(self.protocol_version);
        write_string(writer, &self.network_name)
            .context("unable to serialize network name within protocol parameters")?;
        write_string(writer, &self.bech32_hrp)
            .context("unable to serialize bech32 hrp within protocol parameters")?;
        writer.write_num(self.min_pow_score);
        writer.write_num(self.below_max_depth);
        writer.write_object(&self.rent_structure, mode)?;
        writer.write_num(self.token_supply);
        Ok(())
    }

    fn read(
        cursor: &mut ByteCursor<'_>,
        mode: DeSerializationMode,
    ) -> Result<Self, SerializationError> {
        let protocol_version = cursor
            .read_num()
            .context("unable to deserialize version within protocol parameters")?;
        let network_name = read_string(cursor)
            .context("unable to deserialize network name within protocol parameters")?;
        let bech32_hrp = read_string(cursor)
            .context("unable to deserialize bech32 hrp within protocol parameters")?;
        let min_pow_score = cursor
            .read_num()
            .context("unable to deserialize minimum pow score within protocol parameters")?;
        let below_max_depth = cursor
            .read_num()
            .context("unable to deserialize below max depth within protocol parameters")?;
        let rent_structure = cursor
            .read_serializable(mode)
            .context("unable to deserialize rent structure within protocol parameters")?;
        let token_supply = cursor
            .read_num()
            .context("unable to deserialize token supply within protocol parameters")?;

        Ok(Self {
            protocol_version,
            network_name,
            bech32_hrp,
            min_pow_score,
            below_max_depth,
            rent_structure,
            token_supply,
        })
    }
}

/// Errors which can occur while loading protocol parameters.
#[derive(Error, Debug)]
pub enum ProtocolParametersError {
    /// Parameters are not valid JSON or miss a field.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("unsupported protocol version {0}")]
    UnsupportedProtocolVersion(u8),

    #[error("network name must not be empty")]
    EmptyNetworkName,

    #[error("invalid bech32 human readable part '{0}'")]
    InvalidBech32Hrp(String),
}
