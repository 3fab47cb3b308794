// SPDX-License-Identifier: AGPL-3.0-or-later

use serde::{Deserialize, Serialize};

use crate::block::MAX_BLOCK_SIZE;
use crate::payload::PayloadKind;
use crate::serializer::{
    ByteCursor, ByteWriter, DeSerializationMode, ErrorContext, LengthPrefixType, Serializable,
    SerializationError, TypeDenotation, TypeKind, ONE_BYTE, TYPE_DENOTATION_BYTE_SIZE,
    UINT32_BYTE_SIZE,
};

/// Maximum size of the tag of a tagged data payload.
pub const MAX_TAG_LENGTH: usize = 64;

/// Payload holding arbitrary data, optionally categorized by a tag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaggedDataPayload {
    #[serde(with = "crate::serde::hex_bytes")]
    tag: Vec<u8>,

    #[serde(with = "crate::serde::hex_bytes")]
    data: Vec<u8>,
}

impl TaggedDataPayload {
    /// Kind of this payload.
    pub const KIND: PayloadKind = PayloadKind::TaggedData;

    pub fn new(tag: impl Into<Vec<u8>>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            tag: tag.into(),
            data: data.into(),
        }
    }

    pub fn tag(&self) -> &[u8] {
        &self.tag
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl Serializable for TaggedDataPayload {
    const MIN_SIZE: usize = TYPE_DENOTATION_BYTE_SIZE + ONE_BYTE + UINT32_BYTE_SIZE;

    fn size(&self) -> usize {
        TYPE_DENOTATION_BYTE_SIZE + ONE_BYTE + self.tag.len() + UINT32_BYTE_SIZE + self.data.len()
    }

    fn write(
        &self,
        writer: &mut ByteWriter,
        mode: DeSerializationMode,
    ) -> Result<(), SerializationError> {
        // The data is bounded by the enclosing block, not checked here
        if mode.validates() && self.tag.len() > MAX_TAG_LENGTH {
            return Err(SerializationError::LengthInvalid {
                length: self.tag.len(),
                min: 0,
                max: MAX_TAG_LENGTH,
            }
            .context("unable to serialize tagged data tag"));
        }

        writer.write_type_prefix(TypeDenotation::Uint32, Self::KIND.prefix());
        writer
            .write_variable_bytes(&self.tag, LengthPrefixType::Byte)
            .context("unable to serialize tagged data tag")?;
        writer
            .write_variable_bytes(&self.data, LengthPrefixType::Uint32)
            .context("unable to serialize tagged data data")
    }

    fn read(
        cursor: &mut ByteCursor<'_>,
        _mode: DeSerializationMode,
    ) -> Result<Self, SerializationError> {
        cursor
            .check_type_prefix(TypeDenotation::Uint32, Self::KIND.prefix())
            .context("unable to deserialize tagged data")?;
        let tag = cursor
            .read_variable_bytes(LengthPrefixType::Byte, Some(MAX_TAG_LENGTH))
            .context("unable to deserialize tagged data tag")?;
        let data = cursor
            .read_variable_bytes(LengthPrefixType::Uint32, Some(MAX_BLOCK_SIZE))
            .context("unable to deserialize tagged data data")?;

        Ok(Self { tag, data })
    }
}

#[cfg(test)]
mod tests {
    use crate::payload::Payload;
    use crate::serializer::{DeSerializationMode, Serializable, SerializationError};

    use super::{TaggedDataPayload, MAX_TAG_LENGTH};

    const VALIDATE: DeSerializationMode = DeSerializationMode::PERFORM_VALIDATION;

    #[test]
    fn encoding() {
        let payload = TaggedDataPayload::new(vec![0xaa], vec![1, 2, 3]);
        let bytes = payload.serialize(VALIDATE).unwrap();
        assert_eq!(bytes, vec![5, 0, 0, 0, 1, 0xaa, 3, 0, 0, 0, 1, 2, 3]);
        assert_eq!(payload.size(), bytes.len());

        let (decoded, consumed) = TaggedDataPayload::deserialize(&bytes, VALIDATE).unwrap();
        assert_eq!(decoded, payload);
        assert_eq!(consumed, 13);
    }

    #[test]
    fn empty_tag_and_data() {
        let payload = TaggedDataPayload::new(vec![], vec![]);
        let bytes = payload.serialize(VALIDATE).unwrap();
        assert_eq!(bytes.len(), TaggedDataPayload::MIN_SIZE);
        assert_eq!(
            TaggedDataPayload::deserialize(&bytes, VALIDATE).unwrap().0,
            payload
        );
    }

    #[test]
    fn tag_too_long() {
        let payload = TaggedDataPayload::new(vec![1; MAX_TAG_LENGTH + 1], vec![]);
        let err = payload.serialize(VALIDATE).unwrap_err();
        assert_eq!(
            err.root(),
            &SerializationError::LengthInvalid {
                length: 65,
                min: 0,
                max: MAX_TAG_LENGTH
            }
        );

        // Readers refuse the oversized tag even without validation
        let bytes = payload
            .serialize(DeSerializationMode::NO_VALIDATION)
            .unwrap();
        assert!(
            TaggedDataPayload::deserialize(&bytes, DeSerializationMode::NO_VALIDATION).is_err()
        );
    }

    #[test]
    fn truncated_data() {
        let bytes = TaggedDataPayload::new(vec![1], vec![1, 2, 3])
            .serialize(VALIDATE)
            .unwrap();
        let err = TaggedDataPayload::deserialize(&bytes[..bytes.len() - 1], VALIDATE).unwrap_err();
        assert!(matches!(
            err.root(),
            SerializationError::NotEnoughData { .. }
        ));
    }

    #[test]
    fn json() {
        let payload = Payload::from(TaggedDataPayload::new(b"hi".to_vec(), vec![0xff]));
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"type":5,"tag":"0x6869","data":"0xff"}"#);
        assert_eq!(serde_json::from_str::<Payload>(&json).unwrap(), payload);
    }
}
