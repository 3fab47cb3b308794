// SPDX-License-Identifier: AGPL-3.0-or-later

//! Transactions moving funds from consumed inputs to newly created outputs.
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identifier::{TransactionId, HASH_LEN};
use crate::input::{Input, InputKind};
use crate::output::{Output, OutputKind};
use crate::payload::{Payload, PayloadKind};
use crate::serializer::{
    ArrayRules, ArrayValidationMode, ByteCursor, ByteWriter, DeSerializationMode, ErrorContext,
    Guard, LengthPrefixType, Serializable, SerializationError, TypeDenotation, TypeKind,
    PAYLOAD_LENGTH_BYTE_SIZE, SMALL_TYPE_DENOTATION_BYTE_SIZE, TYPE_DENOTATION_BYTE_SIZE,
    UINT16_BYTE_SIZE, UINT64_BYTE_SIZE,
};
use crate::signature::SignatureError;
use crate::unlock::{verify_unlocks, Unlock, UnlockKind};

/// Maximum number of inputs of a transaction.
pub const MAX_INPUTS_COUNT: usize = 128;

/// Maximum number of outputs of a transaction.
pub const MAX_OUTPUTS_COUNT: usize = 128;

/// Inputs must not be consumed twice by the same transaction.
pub const INPUTS_RULES: ArrayRules =
    ArrayRules::new(1, MAX_INPUTS_COUNT).with_mode(ArrayValidationMode::NO_DUPLICATES);

/// Outputs keep the order they were given in, their index is part of their id.
pub const OUTPUTS_RULES: ArrayRules = ArrayRules::new(1, MAX_OUTPUTS_COUNT);

/// Unlocks are positional, the unlock at index `i` belongs to the input at index `i`.
pub const UNLOCKS_RULES: ArrayRules = ArrayRules::new(1, MAX_INPUTS_COUNT);

const INPUT_GUARD: Guard<InputKind> = Guard::all("transaction essence input");

const OUTPUT_GUARD: Guard<OutputKind> =
    Guard::new("transaction essence output", &[OutputKind::Basic]);

const PAYLOAD_GUARD: Guard<PayloadKind> =
    Guard::new("transaction essence payload", &[PayloadKind::TaggedData]);

const UNLOCK_GUARD: Guard<UnlockKind> = Guard::all("transaction unlock");

type_kind! {
    /// Kinds of transaction essences.
    TransactionEssenceKind, "transaction essence" {
        Regular = 1,
    }
}

/// The part of a transaction which gets signed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEssence {
    #[serde(with = "crate::serde::u64_string")]
    network_id: u64,

    inputs: Vec<Input>,

    #[serde(with = "crate::serde::hex_array")]
    inputs_commitment: [u8; HASH_LEN],

    outputs: Vec<Output>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<Payload>,
}

impl TransactionEssence {
    /// Kind of this essence.
    pub const KIND: TransactionEssenceKind = TransactionEssenceKind::Regular;

    pub fn new(
        network_id: u64,
        inputs: Vec<Input>,
        inputs_commitment: [u8; HASH_LEN],
        outputs: Vec<Output>,
    ) -> Self {
        Self {
            network_id,
            inputs,
            inputs_commitment,
            outputs,
            payload: None,
        }
    }

    /// Attaches a payload to the essence.
    pub fn with_payload(mut self, payload: impl Into<Payload>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn network_id(&self) -> u64 {
        self.network_id
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    /// Hash committing to the outputs the inputs refer to.
    pub fn inputs_commitment(&self) -> &[u8; HASH_LEN] {
        &self.inputs_commitment
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    /// Hash of the canonically encoded essence, the message signature unlocks sign.
    pub fn signing_hash(&self) -> Result<[u8; HASH_LEN], SerializationError> {
        let bytes = Serializable::serialize(self, DeSerializationMode::PERFORM_LEXICAL_ORDERING)?;
        Ok(*blake3::hash(&bytes).as_bytes())
    }

    fn check_amounts(&self) -> Result<(), SerializationError> {
        self.outputs
            .iter()
            .try_fold(0u64, |total, output| total.checked_add(output.amount()))
            .map(|_| ())
            .ok_or_else(|| {
                SerializationError::InvalidValue("sum of output amounts overflows".to_string())
            })
    }
}

impl Serializable for TransactionEssence {
    const MIN_SIZE: usize = SMALL_TYPE_DENOTATION_BYTE_SIZE
        + UINT64_BYTE_SIZE
        + UINT16_BYTE_SIZE
        + HASH_LEN
        + UINT16_BYTE_SIZE
        + PAYLOAD_LENGTH_BYTE_SIZE;

    fn size(&self) -> usize {
        Self::MIN_SIZE
            + self.inputs.iter().map(Serializable::size).sum::<usize>()
            + self.outputs.iter().map(Serializable::size).sum::<usize>()
            + self.payload.as_ref().map_or(0, Serializable::size)
    }

    fn write(
        &self,
        writer: &mut ByteWriter,
        mode: DeSerializationMode,
    ) -> Result<(), SerializationError> {
        if mode.validates() {
            self.check_amounts()?;
        }

        writer.write_type_prefix(TypeDenotation::Byte, Self::KIND.prefix());
        writer.write_num(self.network_id);
        writer
            .write_objects(
                &self.inputs,
                mode,
                LengthPrefixType::Uint16,
                &INPUT_GUARD,
                &INPUTS_RULES,
            )
            .context("unable to serialize transaction essence inputs")?;
        writer.write_bytes(&self.inputs_commitment);
        writer
            .write_objects(
                &self.outputs,
                mode,
                LengthPrefixType::Uint16,
                &OUTPUT_GUARD,
                &OUTPUTS_RULES,
            )
            .context("unable to serialize transaction essence outputs")?;
        writer
            .write_payload(self.payload.as_ref(), mode, &PAYLOAD_GUARD)
            .context("unable to serialize transaction essence payload")
    }

    fn read(
        cursor: &mut ByteCursor<'_>,
        mode: DeSerializationMode,
    ) -> Result<Self, SerializationError> {
        cursor
            .check_type_prefix(TypeDenotation::Byte, Self::KIND.prefix())
            .context("unable to deserialize transaction essence")?;
        let network_id = cursor
            .read_num()
            .context("unable to deserialize transaction essence network id")?;
        let inputs = cursor
            .read_objects(mode, LengthPrefixType::Uint16, &INPUT_GUARD, &INPUTS_RULES)
            .context("unable to deserialize transaction essence inputs")?;
        let inputs_commitment = cursor
            .read_array()
            .context("unable to deserialize transaction essence inputs commitment")?;
        let outputs = cursor
            .read_objects(
                mode,
                LengthPrefixType::Uint16,
                &OUTPUT_GUARD,
                &OUTPUTS_RULES,
            )
            .context("unable to deserialize transaction essence outputs")?;
        let payload = cursor
            .read_payload(mode, &PAYLOAD_GUARD)
            .context("unable to deserialize transaction essence payload")?;

        let essence = Self {
            network_id,
            inputs,
            inputs_commitment,
            outputs,
            payload,
        };

        if mode.validates() {
            essence.check_amounts()?;
        }

        Ok(essence)
    }
}

/// JSON mirror of the essence carries its own `"type"` discriminator.
mod tagged_essence {
    use serde::{Deserializer, Serialize, Serializer};

    use super::{TransactionEssence, TransactionEssenceKind};
    use crate::serde::{deserialize_tagged, from_value, Tagged};

    pub fn serialize<S>(essence: &TransactionEssence, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Tagged::new(TransactionEssence::KIND, essence).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<TransactionEssence, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (_, value) = deserialize_tagged::<D, TransactionEssenceKind>(deserializer)?;
        from_value::<TransactionEssence, D::Error>(value)
    }
}

/// Transaction together with the unlocks of all of its inputs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    #[serde(with = "tagged_essence")]
    essence: TransactionEssence,

    unlocks: Vec<Unlock>,
}

impl TransactionPayload {
    /// Kind of this payload.
    pub const KIND: PayloadKind = PayloadKind::Transaction;

    pub fn new(essence: TransactionEssence, unlocks: Vec<Unlock>) -> Self {
        Self { essence, unlocks }
    }

    pub fn essence(&self) -> &TransactionEssence {
        &self.essence
    }

    pub fn unlocks(&self) -> &[Unlock] {
        &self.unlocks
    }

    /// Id of this transaction, the hash of its canonically encoded payload.
    pub fn id(&self) -> Result<TransactionId, SerializationError> {
        let bytes = Serializable::serialize(self, DeSerializationMode::PERFORM_LEXICAL_ORDERING)?;
        Ok(TransactionId::from_payload_bytes(bytes))
    }

    /// Verifies every signature unlock against the signing hash of the essence.
    ///
    /// This only checks the signatures themselves. Whether the signing addresses own the consumed
    /// outputs can only be decided with access to the ledger.
    pub fn verify_signatures(&self) -> Result<(), TransactionError> {
        let signing_hash = self.essence.signing_hash()?;

        for (index, unlock) in self.unlocks.iter().enumerate() {
            if let Unlock::Signature(unlock) = unlock {
                unlock.signature().verify(&signing_hash).map_err(|source| {
                    debug!("signature of unlock {index} is invalid: {source}");
                    TransactionError::InvalidSignature { index, source }
                })?;
            }
        }

        Ok(())
    }

    fn check_unlocks(&self) -> Result<(), SerializationError> {
        if self.unlocks.len() != self.essence.inputs.len() {
            return Err(SerializationError::InvalidValue(format!(
                "unlock count {} doesn't match input count {}",
                self.unlocks.len(),
                self.essence.inputs.len()
            )));
        }

        verify_unlocks(&self.unlocks)
    }
}

impl Serializable for TransactionPayload {
    const MIN_SIZE: usize =
        TYPE_DENOTATION_BYTE_SIZE + TransactionEssence::MIN_SIZE + UINT16_BYTE_SIZE;

    fn size(&self) -> usize {
        TYPE_DENOTATION_BYTE_SIZE
            + self.essence.size()
            + UINT16_BYTE_SIZE
            + self.unlocks.iter().map(Serializable::size).sum::<usize>()
    }

    fn write(
        &self,
        writer: &mut ByteWriter,
        mode: DeSerializationMode,
    ) -> Result<(), SerializationError> {
        if mode.validates() {
            self.check_unlocks()
                .context("unable to serialize transaction unlocks")?;
        }

        writer.write_type_prefix(TypeDenotation::Uint32, Self::KIND.prefix());
        writer.write_object(&self.essence, mode)?;
        writer
            .write_objects(
                &self.unlocks,
                mode,
                LengthPrefixType::Uint16,
                &UNLOCK_GUARD,
                &UNLOCKS_RULES,
            )
            .context("unable to serialize transaction unlocks")
    }

    fn read(
        cursor: &mut ByteCursor<'_>,
        mode: DeSerializationMode,
    ) -> Result<Self, SerializationError> {
        cursor
            .check_type_prefix(TypeDenotation::Uint32, Self::KIND.prefix())
            .context("unable to deserialize transaction")?;
        let essence = cursor
            .read_serializable(mode)
            .context("unable to deserialize transaction essence")?;
        let unlocks = cursor
            .read_objects(mode, LengthPrefixType::Uint16, &UNLOCK_GUARD, &UNLOCKS_RULES)
            .context("unable to deserialize transaction unlocks")?;

        let transaction = Self { essence, unlocks };

        if mode.validates() {
            transaction
                .check_unlocks()
                .context("unable to deserialize transaction unlocks")?;
        }

        Ok(transaction)
    }
}

/// Errors which can occur while verifying a transaction.
#[derive(Error, Debug)]
pub enum TransactionError {
    /// Signature of an unlock doesn't verify against the essence.
    #[error("invalid signature in unlock {index}: {source}")]
    InvalidSignature {
        /// Index of the offending unlock.
        index: usize,
        /// Reason the signature was rejected.
        source: SignatureError,
    },

    /// Essence could not be encoded to compute its signing hash.
    #[error(transparent)]
    Serialization(#[from] SerializationError),
}
