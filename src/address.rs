// SPDX-License-Identifier: AGPL-3.0-or-later

//! Addresses funds and chain outputs can be locked to.
use serde::{Deserialize, Serialize};

use crate::bech32::{self, Bech32Error};
use crate::identifier::{AliasId, NftId, ALIAS_ID_LEN, HASH_LEN, NFT_ID_LEN};
use crate::serializer::{
    ByteCursor, ByteWriter, DeSerializationMode, Serializable, SerializationError,
    TypeDenotation, TypeKind, SMALL_TYPE_DENOTATION_BYTE_SIZE,
};

type_kind! {
    /// Kinds of addresses.
    AddressKind, "address" {
        /// Address derived from an Ed25519 public key.
        Ed25519 = 0,
        /// Address of an alias chain.
        Alias = 8,
        /// Address of an NFT chain.
        Nft = 16,
    }
}

/// Address derived from the BLAKE3 hash of an Ed25519 public key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ed25519Address {
    #[serde(with = "crate::serde::hex_array")]
    pub_key_hash: [u8; HASH_LEN],
}

impl Ed25519Address {
    /// Kind of this address.
    pub const KIND: AddressKind = AddressKind::Ed25519;

    /// Size of the encoded address.
    pub const LENGTH: usize = SMALL_TYPE_DENOTATION_BYTE_SIZE + HASH_LEN;

    /// Creates the address from the hash of a public key.
    pub const fn new(pub_key_hash: [u8; HASH_LEN]) -> Self {
        Self { pub_key_hash }
    }

    /// Derives the address of the given public key.
    pub fn from_public_key(public_key: &[u8; 32]) -> Self {
        Self::new(*blake3::hash(public_key).as_bytes())
    }

    /// Hash of the public key.
    pub fn pub_key_hash(&self) -> &[u8; HASH_LEN] {
        &self.pub_key_hash
    }
}

impl Serializable for Ed25519Address {
    const MIN_SIZE: usize = Self::LENGTH;

    fn size(&self) -> usize {
        Self::LENGTH
    }

    fn write(
        &self,
        writer: &mut ByteWriter,
        _mode: DeSerializationMode,
    ) -> Result<(), SerializationError> {
        writer.write_type_prefix(TypeDenotation::Byte, Self::KIND.prefix());
        writer.write_bytes(&self.pub_key_hash);
        Ok(())
    }

    fn read(
        cursor: &mut ByteCursor<'_>,
        _mode: DeSerializationMode,
    ) -> Result<Self, SerializationError> {
        cursor.check_type_prefix(TypeDenotation::Byte, Self::KIND.prefix())?;
        Ok(Self::new(cursor.read_array()?))
    }
}

/// Address of an alias chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasAddress {
    alias_id: AliasId,
}

impl AliasAddress {
    /// Kind of this address.
    pub const KIND: AddressKind = AddressKind::Alias;

    /// Size of the encoded address.
    pub const LENGTH: usize = SMALL_TYPE_DENOTATION_BYTE_SIZE + ALIAS_ID_LEN;

    pub const fn new(alias_id: AliasId) -> Self {
        Self { alias_id }
    }

    pub fn alias_id(&self) -> &AliasId {
        &self.alias_id
    }
}

impl Serializable for AliasAddress {
    const MIN_SIZE: usize = Self::LENGTH;

    fn size(&self) -> usize {
        Self::LENGTH
    }

    fn write(
        &self,
        writer: &mut ByteWriter,
        mode: DeSerializationMode,
    ) -> Result<(), SerializationError> {
        writer.write_type_prefix(TypeDenotation::Byte, Self::KIND.prefix());
        writer.write_object(&self.alias_id, mode)
    }

    fn read(
        cursor: &mut ByteCursor<'_>,
        mode: DeSerializationMode,
    ) -> Result<Self, SerializationError> {
        cursor.check_type_prefix(TypeDenotation::Byte, Self::KIND.prefix())?;
        Ok(Self::new(cursor.read_serializable(mode)?))
    }
}

/// Address of an NFT chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftAddress {
    nft_id: NftId,
}

impl NftAddress {
    /// Kind of this address.
    pub const KIND: AddressKind = AddressKind::Nft;

    /// Size of the encoded address.
    pub const LENGTH: usize = SMALL_TYPE_DENOTATION_BYTE_SIZE + NFT_ID_LEN;

    pub const fn new(nft_id: NftId) -> Self {
        Self { nft_id }
    }

    pub fn nft_id(&self) -> &NftId {
        &self.nft_id
    }
}

impl Serializable for NftAddress {
    const MIN_SIZE: usize = Self::LENGTH;

    fn size(&self) -> usize {
        Self::LENGTH
    }

    fn write(
        &self,
        writer: &mut ByteWriter,
        mode: DeSerializationMode,
    ) -> Result<(), SerializationError> {
        writer.write_type_prefix(TypeDenotation::Byte, Self::KIND.prefix());
        writer.write_object(&self.nft_id, mode)
    }

    fn read(
        cursor: &mut ByteCursor<'_>,
        mode: DeSerializationMode,
    ) -> Result<Self, SerializationError> {
        cursor.check_type_prefix(TypeDenotation::Byte, Self::KIND.prefix())?;
        Ok(Self::new(cursor.read_serializable(mode)?))
    }
}

/// Any kind of address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Address {
    Ed25519(Ed25519Address),
    Alias(AliasAddress),
    Nft(NftAddress),
}

polymorphic! {
    Address: AddressKind, TypeDenotation::Byte, "address" {
        Ed25519(Ed25519Address),
        Alias(AliasAddress),
        Nft(NftAddress),
    }
}

impl Address {
    /// Renders the encoded address as bech32 string under the human readable part of a network.
    pub fn to_bech32(&self, hrp: &str) -> Result<String, Bech32Error> {
        let bytes = Serializable::serialize(self, DeSerializationMode::PERFORM_VALIDATION)?;
        bech32::encode(hrp, &bytes)
    }

    /// Parses a bech32 address, returning its human readable part together with the address.
    pub fn try_from_bech32(value: &str) -> Result<(String, Self), Bech32Error> {
        let (hrp, bytes) = bech32::decode(value)?;
        let mut cursor = ByteCursor::new(&bytes);
        let address = cursor.read_serializable(DeSerializationMode::PERFORM_VALIDATION)?;
        cursor.consumed_all()?;
        Ok((hrp, address))
    }
}
