// SPDX-License-Identifier: AGPL-3.0-or-later

//! Payloads carried by blocks and transactions.
//!
//! A payload is always nested behind an `u32` length prefix and denoted by an `u32` type prefix,
//! see [`ByteCursor::read_payload`](crate::serializer::ByteCursor::read_payload).
pub mod tagged_data;
pub mod transaction;

use crate::serializer::TypeDenotation;

pub use tagged_data::TaggedDataPayload;
pub use transaction::{TransactionEssence, TransactionPayload};

type_kind! {
    /// Kinds of payloads.
    PayloadKind, "payload" {
        TaggedData = 5,
        Transaction = 6,
    }
}

/// Any kind of payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    TaggedData(TaggedDataPayload),
    Transaction(Box<TransactionPayload>),
}

polymorphic! {
    Payload: PayloadKind, TypeDenotation::Uint32, "payload" {
        TaggedData(TaggedDataPayload),
        Transaction(Box<TransactionPayload>),
    }
}

impl From<TransactionPayload> for Payload {
    fn from(value: TransactionPayload) -> Self {
        Payload::Transaction(Box::new(value))
    }
}

#[cfg(test)]
mod tests {
    use crate::serializer::{
        ByteCursor, ByteWriter, DeSerializationMode, Guard, Serializable, SerializationError,
    };

    use super::{Payload, PayloadKind, TaggedDataPayload};

    const VALIDATE: DeSerializationMode = DeSerializationMode::PERFORM_VALIDATION;

    #[test]
    fn uint32_type_prefix() {
        let payload = Payload::from(TaggedDataPayload::new(b"tag".to_vec(), vec![1, 2]));
        let bytes = payload.serialize(VALIDATE).unwrap();
        assert_eq!(&bytes[..4], &[5, 0, 0, 0]);

        let (decoded, consumed) = Payload::deserialize(&bytes, VALIDATE).unwrap();
        assert_eq!(decoded, payload);
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn unknown_payload_type() {
        let bytes = [9, 0, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(
            Payload::deserialize(&bytes, VALIDATE),
            Err(SerializationError::UnknownType {
                context: "payload",
                prefix: 9
            })
        );
    }

    #[test]
    fn nested_behind_length_prefix() {
        const GUARD: Guard<PayloadKind> = Guard::new("test payload", &[PayloadKind::TaggedData]);

        let payload = Payload::from(TaggedDataPayload::new(vec![], vec![7; 10]));
        let mut writer = ByteWriter::new();
        writer.write_payload(Some(&payload), VALIDATE, &GUARD).unwrap();
        let bytes = writer.into_bytes();
        assert_eq!(&bytes[..4], &(payload.size() as u32).to_le_bytes());

        let mut cursor = ByteCursor::new(&bytes);
        assert_eq!(
            cursor.read_payload::<Payload>(VALIDATE, &GUARD).unwrap(),
            Some(payload)
        );
        assert!(cursor.consumed_all().is_ok());
    }
}
