// SPDX-License-Identifier: AGPL-3.0-or-later

//! Optional features an output can carry.
use serde::{Deserialize, Serialize};

use crate::address::{Address, AddressKind};
use crate::serializer::{
    ByteCursor, ByteWriter, DeSerializationMode, ErrorContext, Guard, LengthPrefixType,
    Serializable, SerializationError, TypeDenotation, TypeKind, ONE_BYTE,
    SMALL_TYPE_DENOTATION_BYTE_SIZE, UINT16_BYTE_SIZE,
};

/// Maximum size of the data of a metadata feature.
pub const MAX_METADATA_LENGTH: usize = 8192;

/// Maximum size of the tag of a tag feature.
pub const MAX_TAG_LENGTH: usize = 64;

type_kind! {
    /// Kinds of features.
    FeatureKind, "feature" {
        Sender = 0,
        Issuer = 1,
        Metadata = 2,
        Tag = 3,
    }
}

const ADDRESS_GUARD: Guard<AddressKind> = Guard::all("feature address");

/// Identifies the validated sender of an output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderFeature {
    address: Address,
}

impl SenderFeature {
    /// Kind of this feature.
    pub const KIND: FeatureKind = FeatureKind::Sender;

    pub fn new(address: impl Into<Address>) -> Self {
        Self {
            address: address.into(),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }
}

/// Identifies the validated issuer of a chain output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuerFeature {
    address: Address,
}

impl IssuerFeature {
    /// Kind of this feature.
    pub const KIND: FeatureKind = FeatureKind::Issuer;

    pub fn new(address: impl Into<Address>) -> Self {
        Self {
            address: address.into(),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }
}

// Sender and issuer only differ in their type prefix
macro_rules! address_feature {
    ($feature:ident, $name:literal) => {
        impl Serializable for $feature {
            const MIN_SIZE: usize = SMALL_TYPE_DENOTATION_BYTE_SIZE + Address::MIN_SIZE;

            fn size(&self) -> usize {
                SMALL_TYPE_DENOTATION_BYTE_SIZE + self.address.size()
            }

            fn write(
                &self,
                writer: &mut ByteWriter,
                mode: DeSerializationMode,
            ) -> Result<(), SerializationError> {
                writer.write_type_prefix(TypeDenotation::Byte, Self::KIND.prefix());
                writer
                    .write_polymorphic(&self.address, mode, &ADDRESS_GUARD)
                    .context(concat!("unable to serialize ", $name, " feature address"))
            }

            fn read(
                cursor: &mut ByteCursor<'_>,
                mode: DeSerializationMode,
            ) -> Result<Self, SerializationError> {
                cursor.check_type_prefix(TypeDenotation::Byte, Self::KIND.prefix())?;
                let address = cursor
                    .read_object(mode, &ADDRESS_GUARD)
                    .context(concat!("unable to deserialize ", $name, " feature address"))?;
                Ok(Self { address })
            }
        }
    };
}

address_feature!(SenderFeature, "sender");
address_feature!(IssuerFeature, "issuer");

/// Arbitrary binary data attached to an output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataFeature {
    #[serde(with = "crate::serde::hex_bytes")]
    data: Vec<u8>,
}

impl MetadataFeature {
    /// Kind of this feature.
    pub const KIND: FeatureKind = FeatureKind::Metadata;

    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl Serializable for MetadataFeature {
    const MIN_SIZE: usize = SMALL_TYPE_DENOTATION_BYTE_SIZE + UINT16_BYTE_SIZE;

    fn size(&self) -> usize {
        SMALL_TYPE_DENOTATION_BYTE_SIZE + UINT16_BYTE_SIZE + self.data.len()
    }

    fn write(
        &self,
        writer: &mut ByteWriter,
        mode: DeSerializationMode,
    ) -> Result<(), SerializationError> {
        if mode.validates() {
            check_length(self.data.len(), MAX_METADATA_LENGTH)
                .context("unable to serialize metadata feature data")?;
        }

        writer.write_type_prefix(TypeDenotation::Byte, Self::KIND.prefix());
        writer.write_variable_bytes(&self.data, LengthPrefixType::Uint16)
    }

    fn read(
        cursor: &mut ByteCursor<'_>,
        mode: DeSerializationMode,
    ) -> Result<Self, SerializationError> {
        cursor.check_type_prefix(TypeDenotation::Byte, Self::KIND.prefix())?;
        let data = cursor
            .read_variable_bytes(LengthPrefixType::Uint16, Some(MAX_METADATA_LENGTH))
            .context("unable to deserialize metadata feature data")?;

        if mode.validates() {
            check_length(data.len(), MAX_METADATA_LENGTH)
                .context("unable to deserialize metadata feature data")?;
        }

        Ok(Self { data })
    }
}

/// Indexation tag attached to an output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagFeature {
    #[serde(with = "crate::serde::hex_bytes")]
    tag: Vec<u8>,
}

impl TagFeature {
    /// Kind of this feature.
    pub const KIND: FeatureKind = FeatureKind::Tag;

    pub fn new(tag: impl Into<Vec<u8>>) -> Self {
        Self { tag: tag.into() }
    }

    pub fn tag(&self) -> &[u8] {
        &self.tag
    }
}

impl Serializable for TagFeature {
    const MIN_SIZE: usize = SMALL_TYPE_DENOTATION_BYTE_SIZE + ONE_BYTE;

    fn size(&self) -> usize {
        SMALL_TYPE_DENOTATION_BYTE_SIZE + ONE_BYTE + self.tag.len()
    }

    fn write(
        &self,
        writer: &mut ByteWriter,
        mode: DeSerializationMode,
    ) -> Result<(), SerializationError> {
        if mode.validates() {
            check_length(self.tag.len(), MAX_TAG_LENGTH)
                .context("unable to serialize tag feature tag")?;
        }

        writer.write_type_prefix(TypeDenotation::Byte, Self::KIND.prefix());
        writer.write_variable_bytes(&self.tag, LengthPrefixType::Byte)
    }

    fn read(
        cursor: &mut ByteCursor<'_>,
        mode: DeSerializationMode,
    ) -> Result<Self, SerializationError> {
        cursor.check_type_prefix(TypeDenotation::Byte, Self::KIND.prefix())?;
        let tag = cursor
            .read_variable_bytes(LengthPrefixType::Byte, Some(MAX_TAG_LENGTH))
            .context("unable to deserialize tag feature tag")?;

        if mode.validates() {
            check_length(tag.len(), MAX_TAG_LENGTH)
                .context("unable to deserialize tag feature tag")?;
        }

        Ok(Self { tag })
    }
}

fn check_length(length: usize, max: usize) -> Result<(), SerializationError> {
    if length == 0 || length > max {
        return Err(SerializationError::LengthInvalid {
            length,
            min: 1,
            max,
        });
    }

    Ok(())
}

/// Any kind of feature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Feature {
    Sender(SenderFeature),
    Issuer(IssuerFeature),
    Metadata(MetadataFeature),
    Tag(TagFeature),
}

polymorphic! {
    Feature: FeatureKind, TypeDenotation::Byte, "feature" {
        Sender(SenderFeature),
        Issuer(IssuerFeature),
        Metadata(MetadataFeature),
        Tag(TagFeature),
    }
}
