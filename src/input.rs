// SPDX-License-Identifier: AGPL-3.0-or-later

//! Inputs referencing the outputs a transaction consumes.
use serde::{Deserialize, Serialize};

use crate::identifier::{OutputId, TransactionId, TRANSACTION_ID_LEN};
use crate::payload::transaction::MAX_OUTPUTS_COUNT;
use crate::serializer::{
    ByteCursor, ByteWriter, DeSerializationMode, ErrorContext, Serializable, SerializationError,
    TypeDenotation, TypeKind, SMALL_TYPE_DENOTATION_BYTE_SIZE, UINT16_BYTE_SIZE,
};

type_kind! {
    /// Kinds of inputs.
    InputKind, "input" {
        Utxo = 0,
    }
}

/// References an unspent output by the id of the transaction which created it and its index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoInput {
    transaction_id: TransactionId,
    transaction_output_index: u16,
}

impl UtxoInput {
    /// Kind of this input.
    pub const KIND: InputKind = InputKind::Utxo;

    /// Size of the encoded input.
    pub const LENGTH: usize =
        SMALL_TYPE_DENOTATION_BYTE_SIZE + TRANSACTION_ID_LEN + UINT16_BYTE_SIZE;

    pub fn new(transaction_id: TransactionId, transaction_output_index: u16) -> Self {
        Self {
            transaction_id,
            transaction_output_index,
        }
    }

    pub fn transaction_id(&self) -> &TransactionId {
        &self.transaction_id
    }

    pub fn transaction_output_index(&self) -> u16 {
        self.transaction_output_index
    }

    /// Id of the referenced output.
    pub fn output_id(&self) -> OutputId {
        OutputId::new(self.transaction_id, self.transaction_output_index)
    }

    fn check_index(index: u16) -> Result<(), SerializationError> {
        if usize::from(index) >= MAX_OUTPUTS_COUNT {
            return Err(SerializationError::InvalidValue(format!(
                "output index {index} exceeds the maximum of {}",
                MAX_OUTPUTS_COUNT - 1
            )));
        }

        Ok(())
    }
}

impl From<OutputId> for UtxoInput {
    fn from(value: OutputId) -> Self {
        Self::new(*value.transaction_id(), value.index())
    }
}

impl Serializable for UtxoInput {
    const MIN_SIZE: usize = Self::LENGTH;

    fn size(&self) -> usize {
        Self::LENGTH
    }

    fn write(
        &self,
        writer: &mut ByteWriter,
        mode: DeSerializationMode,
    ) -> Result<(), SerializationError> {
        if mode.validates() {
            Self::check_index(self.transaction_output_index)?;
        }

        writer.write_type_prefix(TypeDenotation::Byte, Self::KIND.prefix());
        writer.write_object(&self.transaction_id, mode)?;
        writer.write_num(self.transaction_output_index);
        Ok(())
    }

    fn read(
        cursor: &mut ByteCursor<'_>,
        mode: DeSerializationMode,
    ) -> Result<Self, SerializationError> {
        cursor
            .check_type_prefix(TypeDenotation::Byte, Self::KIND.prefix())
            .context("unable to deserialize UTXO input")?;
        let transaction_id = cursor
            .read_serializable(mode)
            .context("unable to deserialize transaction id in UTXO input")?;
        let transaction_output_index = cursor
            .read_num()
            .context("unable to deserialize output index in UTXO input")?;

        if mode.validates() {
            Self::check_index(transaction_output_index)?;
        }

        Ok(Self {
            transaction_id,
            transaction_output_index,
        })
    }
}

/// Any kind of input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Input {
    Utxo(UtxoInput),
}

polymorphic! {
    Input: InputKind, TypeDenotation::Byte, "input" {
        Utxo(UtxoInput),
    }
}
