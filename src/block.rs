// SPDX-License-Identifier: AGPL-3.0-or-later

//! Blocks, the vertices of the tangle.
//!
//! A block approves between one and eight parent blocks and optionally carries a payload. Its
//! encoding is canonical: parents are sorted, duplicates are impossible and the payload length
//! prefix must match the bytes the payload actually occupies.
use log::trace;
use serde::{Deserialize, Serialize};

use crate::identifier::BlockId;
use crate::payload::{Payload, PayloadKind};
use crate::serializer::{
    ArrayRules, ArrayValidationMode, ByteCursor, ByteWriter, DeSerializationMode, ErrorContext,
    Guard, LengthPrefixType, Serializable, SerializationError, ONE_BYTE,
    PAYLOAD_LENGTH_BYTE_SIZE, UINT64_BYTE_SIZE,
};

/// Version of the protocol blocks are encoded with.
pub const PROTOCOL_VERSION: u8 = 2;

/// Maximum size of an encoded block.
pub const MAX_BLOCK_SIZE: usize = 32768;

/// Minimum number of parents of a block.
pub const MIN_PARENTS: usize = 1;

/// Maximum number of parents of a block.
pub const MAX_PARENTS: usize = 8;

/// Parents are unique and sorted by their id.
pub const PARENTS_RULES: ArrayRules = ArrayRules::new(MIN_PARENTS, MAX_PARENTS)
    .with_mode(ArrayValidationMode::NO_DUPLICATES.with(ArrayValidationMode::LEXICAL_ORDERING));

const PAYLOAD_GUARD: Guard<PayloadKind> = Guard::new(
    "block payload",
    &[PayloadKind::TaggedData, PayloadKind::Transaction],
);

/// Vertex of the tangle, approving its parents and carrying an optional payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    protocol_version: u8,

    parents: Vec<BlockId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<Payload>,

    #[serde(with = "crate::serde::u64_string")]
    nonce: u64,
}

impl Block {
    /// Creates a block of the current protocol version.
    pub fn new(parents: Vec<BlockId>, payload: Option<Payload>, nonce: u64) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            parents,
            payload,
            nonce,
        }
    }

    /// Overrides the protocol version.
    pub fn with_protocol_version(mut self, protocol_version: u8) -> Self {
        self.protocol_version = protocol_version;
        self
    }

    pub fn protocol_version(&self) -> u8 {
        self.protocol_version
    }

    pub fn parents(&self) -> &[BlockId] {
        &self.parents
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Decodes a block which must span all of the given bytes.
    pub fn from_bytes(bytes: &[u8], mode: DeSerializationMode) -> Result<Self, SerializationError> {
        let mut cursor = ByteCursor::new(bytes);
        let block: Self = cursor
            .read_serializable(mode)
            .context("unable to deserialize block")?;
        cursor
            .consumed_all()
            .context("unable to deserialize block")?;

        trace!(
            "decoded block with {} parents ({} bytes)",
            block.parents.len(),
            cursor.done()
        );

        Ok(block)
    }

    /// Encodes the block in canonical form, sorting its parents first.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SerializationError> {
        Serializable::serialize(
            self,
            DeSerializationMode::PERFORM_VALIDATION | DeSerializationMode::PERFORM_LEXICAL_ORDERING,
        )
    }

    /// Id of the block, the hash of its canonical encoding.
    pub fn id(&self) -> Result<BlockId, SerializationError> {
        Ok(BlockId::from_block_bytes(self.to_bytes()?))
    }

    fn check_protocol_version(version: u8) -> Result<(), SerializationError> {
        if version != PROTOCOL_VERSION {
            return Err(SerializationError::InvalidValue(format!(
                "protocol version must be {PROTOCOL_VERSION} but is {version}"
            )));
        }

        Ok(())
    }

    fn check_size(size: usize) -> Result<(), SerializationError> {
        if size > MAX_BLOCK_SIZE {
            return Err(SerializationError::LengthInvalid {
                length: size,
                min: 0,
                max: MAX_BLOCK_SIZE,
            });
        }

        Ok(())
    }
}

impl Serializable for Block {
    const MIN_SIZE: usize = ONE_BYTE + ONE_BYTE + PAYLOAD_LENGTH_BYTE_SIZE + UINT64_BYTE_SIZE;

    fn size(&self) -> usize {
        ONE_BYTE
            + ONE_BYTE
            + PARENTS_RULES.canonical_size(&self.parents)
            + PAYLOAD_LENGTH_BYTE_SIZE
            + self.payload.as_ref().map_or(0, Serializable::size)
            + UINT64_BYTE_SIZE
    }

    fn write(
        &self,
        writer: &mut ByteWriter,
        mode: DeSerializationMode,
    ) -> Result<(), SerializationError> {
        if mode.validates() {
            Self::check_protocol_version(self.protocol_version)
                .context("unable to serialize block")?;
        }

        let start = writer.written();
        writer.write_num(self.protocol_version);
        writer
            .write_sequence(&self.parents, mode, LengthPrefixType::Byte, &PARENTS_RULES)
            .context("unable to serialize block parents")?;
        writer
            .write_payload(self.payload.as_ref(), mode, &PAYLOAD_GUARD)
            .context("unable to serialize block payload")?;
        writer.write_num(self.nonce);

        if mode.validates() {
            Self::check_size(writer.written() - start).context("unable to serialize block")?;
        }

        Ok(())
    }

    fn read(
        cursor: &mut ByteCursor<'_>,
        mode: DeSerializationMode,
    ) -> Result<Self, SerializationError> {
        let start = cursor.offset();

        let protocol_version = cursor
            .read_num()
            .context("unable to deserialize block protocol version")?;
        if mode.validates() {
            Self::check_protocol_version(protocol_version)?;
        }

        let parents = cursor
            .read_sequence(mode, LengthPrefixType::Byte, &PARENTS_RULES)
            .context("unable to deserialize block parents")?;
        let payload = cursor
            .read_payload(mode, &PAYLOAD_GUARD)
            .context("unable to deserialize block payload")?;
        let nonce = cursor
            .read_num()
            .context("unable to deserialize block nonce")?;

        if mode.validates() {
            Self::check_size(cursor.offset() - start)?;
        }

        Ok(Self {
            protocol_version,
            parents,
            payload,
            nonce,
        })
    }
}
