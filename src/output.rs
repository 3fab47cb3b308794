// SPDX-License-Identifier: AGPL-3.0-or-later

//! Outputs created by transactions and milestones.
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::feature::{Feature, FeatureKind};
use crate::native_token::{NativeToken, NATIVE_TOKENS_RULES};
use crate::serializer::{
    ArrayRules, ArrayValidationMode, ByteCursor, ByteWriter, DeSerializationMode, ErrorContext,
    Guard, LengthPrefixType, Serializable, SerializationError, TypeDenotation, TypeKind, ONE_BYTE,
    SMALL_TYPE_DENOTATION_BYTE_SIZE, UINT64_BYTE_SIZE,
};
use crate::unlock_condition::{UnlockCondition, UnlockConditionKind};

type_kind! {
    /// Kinds of outputs.
    OutputKind, "output" {
        Treasury = 2,
        Basic = 3,
    }
}

/// Element checks shared by the property-bag collections of outputs: each kind at most once, in
/// lexical order.
const PROPERTY_BAG: ArrayValidationMode = ArrayValidationMode::NO_DUPLICATES
    .with(ArrayValidationMode::LEXICAL_ORDERING)
    .with(ArrayValidationMode::AT_MOST_ONE_OF_EACH_TYPE);

/// Unlock conditions of a basic output, an address unlock condition is mandatory.
pub const BASIC_OUTPUT_UNLOCK_CONDITIONS_RULES: ArrayRules = ArrayRules::new(1, 4)
    .with_mode(PROPERTY_BAG)
    .with_must_occur(&[0]);

/// Features of a basic output.
pub const BASIC_OUTPUT_FEATURES_RULES: ArrayRules = ArrayRules::new(0, 3).with_mode(PROPERTY_BAG);

const UNLOCK_CONDITION_GUARD: Guard<UnlockConditionKind> =
    Guard::all("basic output unlock condition");

const FEATURE_GUARD: Guard<FeatureKind> = Guard::new(
    "basic output feature",
    &[FeatureKind::Sender, FeatureKind::Metadata, FeatureKind::Tag],
);

/// Output holding the treasury of the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreasuryOutput {
    #[serde(with = "crate::serde::u64_string")]
    amount: u64,
}

impl TreasuryOutput {
    /// Kind of this output.
    pub const KIND: OutputKind = OutputKind::Treasury;

    /// Size of the encoded output.
    pub const LENGTH: usize = SMALL_TYPE_DENOTATION_BYTE_SIZE + UINT64_BYTE_SIZE;

    pub fn new(amount: u64) -> Self {
        Self { amount }
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }
}

impl Serializable for TreasuryOutput {
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
        writer.write_num(self.amount);
        Ok(())
    }

    fn read(
        cursor: &mut ByteCursor<'_>,
        _mode: DeSerializationMode,
    ) -> Result<Self, SerializationError> {
        cursor
            .check_type_prefix(TypeDenotation::Byte, Self::KIND.prefix())
            .context("unable to deserialize treasury output")?;
        let amount = cursor
            .read_num()
            .context("unable to deserialize amount for treasury output")?;
        Ok(Self { amount })
    }
}

/// Output holding base tokens and native tokens, unlockable by an address under the given
/// conditions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicOutput {
    #[serde(with = "crate::serde::u64_string")]
    amount: u64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    native_tokens: Vec<NativeToken>,

    unlock_conditions: Vec<UnlockCondition>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    features: Vec<Feature>,
}

impl BasicOutput {
    /// Kind of this output.
    pub const KIND: OutputKind = OutputKind::Basic;

    pub fn new(amount: u64, unlock_conditions: Vec<UnlockCondition>) -> Self {
        Self {
            amount,
            native_tokens: Vec::new(),
            unlock_conditions,
            features: Vec::new(),
        }
    }

    /// Sets the native tokens held by the output.
    pub fn with_native_tokens(mut self, native_tokens: Vec<NativeToken>) -> Self {
        self.native_tokens = native_tokens;
        self
    }

    /// Sets the features of the output.
    pub fn with_features(mut self, features: Vec<Feature>) -> Self {
        self.features = features;
        self
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn native_tokens(&self) -> &[NativeToken] {
        &self.native_tokens
    }

    pub fn unlock_conditions(&self) -> &[UnlockCondition] {
        &self.unlock_conditions
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Address of the mandatory address unlock condition.
    pub fn address(&self) -> Option<&Address> {
        self.unlock_conditions
            .iter()
            .find_map(|condition| match condition {
                UnlockCondition::Address(condition) => Some(condition.address()),
                _ => None,
            })
    }
}

impl Serializable for BasicOutput {
    const MIN_SIZE: usize =
        SMALL_TYPE_DENOTATION_BYTE_SIZE + UINT64_BYTE_SIZE + ONE_BYTE + ONE_BYTE + ONE_BYTE;

    fn size(&self) -> usize {
        SMALL_TYPE_DENOTATION_BYTE_SIZE
            + UINT64_BYTE_SIZE
            + ONE_BYTE
            + NATIVE_TOKENS_RULES.canonical_size(&self.native_tokens)
            + ONE_BYTE
            + BASIC_OUTPUT_UNLOCK_CONDITIONS_RULES.canonical_size(&self.unlock_conditions)
            + ONE_BYTE
            + BASIC_OUTPUT_FEATURES_RULES.canonical_size(&self.features)
    }

    fn write(
        &self,
        writer: &mut ByteWriter,
        mode: DeSerializationMode,
    ) -> Result<(), SerializationError> {
        writer.write_type_prefix(TypeDenotation::Byte, Self::KIND.prefix());
        writer.write_num(self.amount);
        writer
            .write_sequence(
                &self.native_tokens,
                mode,
                LengthPrefixType::Byte,
                &NATIVE_TOKENS_RULES,
            )
            .context("unable to serialize basic output native tokens")?;
        writer
            .write_objects(
                &self.unlock_conditions,
                mode,
                LengthPrefixType::Byte,
                &UNLOCK_CONDITION_GUARD,
                &BASIC_OUTPUT_UNLOCK_CONDITIONS_RULES,
            )
            .context("unable to serialize basic output unlock conditions")?;
        writer
            .write_objects(
                &self.features,
                mode,
                LengthPrefixType::Byte,
                &FEATURE_GUARD,
                &BASIC_OUTPUT_FEATURES_RULES,
            )
            .context("unable to serialize basic output features")
    }

    fn read(
        cursor: &mut ByteCursor<'_>,
        mode: DeSerializationMode,
    ) -> Result<Self, SerializationError> {
        cursor
            .check_type_prefix(TypeDenotation::Byte, Self::KIND.prefix())
            .context("unable to deserialize basic output")?;
        let amount = cursor
            .read_num()
            .context("unable to deserialize amount for basic output")?;
        let native_tokens = cursor
            .read_sequence(mode, LengthPrefixType::Byte, &NATIVE_TOKENS_RULES)
            .context("unable to deserialize native tokens for basic output")?;
        let unlock_conditions = cursor
            .read_objects(
                mode,
                LengthPrefixType::Byte,
                &UNLOCK_CONDITION_GUARD,
                &BASIC_OUTPUT_UNLOCK_CONDITIONS_RULES,
            )
            .context("unable to deserialize unlock conditions for basic output")?;
        let features = cursor
            .read_objects(
                mode,
                LengthPrefixType::Byte,
                &FEATURE_GUARD,
                &BASIC_OUTPUT_FEATURES_RULES,
            )
            .context("unable to deserialize features for basic output")?;

        Ok(Self {
            amount,
            native_tokens,
            unlock_conditions,
            features,
        })
    }
}

/// Any kind of output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Output {
    Treasury(TreasuryOutput),
    Basic(BasicOutput),
}

polymorphic! {
    Output: OutputKind, TypeDenotation::Byte, "output" {
        Treasury(TreasuryOutput),
        Basic(BasicOutput),
    }
}

impl Output {
    /// Amount of base tokens held by the output.
    pub fn amount(&self) -> u64 {
        match self {
            Output::Treasury(output) => output.amount(),
            Output::Basic(output) => output.amount(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::address::{Address, Ed25519Address};
    use crate::feature::{Feature, IssuerFeature, MetadataFeature, SenderFeature, TagFeature};
    use crate::identifier::TokenId;
    use crate::native_token::NativeToken;
    use crate::serializer::{DeSerializationMode, Serializable, SerializationError};
    use crate::unlock_condition::{
        AddressUnlockCondition, ExpirationUnlockCondition, TimelockUnlockCondition,
        UnlockCondition,
    };

    use super::{BasicOutput, Output, TreasuryOutput};

    const VALIDATE: DeSerializationMode = DeSerializationMode::PERFORM_VALIDATION;
    const ORDER: DeSerializationMode = DeSerializationMode::PERFORM_LEXICAL_ORDERING;

    fn address() -> Address {
        Ed25519Address::new([9; 32]).into()
    }

    fn basic_output() -> BasicOutput {
        BasicOutput::new(1_000_000, vec![AddressUnlockCondition::new(address()).into()])
            .with_native_tokens(vec![NativeToken::new(TokenId::from_bytes([1; 38]), 50u128)])
            .with_features(vec![
                SenderFeature::new(address()).into(),
                TagFeature::new(b"demo".to_vec()).into(),
            ])
    }

    #[rstest]
    #[case::treasury(TreasuryOutput::new(42).into())]
    #[case::basic(basic_output().into())]
    fn round_trip(#[case] output: Output) {
        let bytes = output.serialize(VALIDATE).unwrap();
        assert_eq!(bytes.len(), output.size());

        let (decoded, consumed) = Output::deserialize(&bytes, VALIDATE).unwrap();
        assert_eq!(decoded, output);
        assert_eq!(consumed, bytes.len());

        assert_eq!(
            output.serialize(DeSerializationMode::NO_VALIDATION).unwrap(),
            bytes
        );

        for len in 0..bytes.len() {
            assert!(matches!(
                Output::deserialize(&bytes[..len], VALIDATE).map_err(|err| err.root().clone()),
                Err(SerializationError::NotEnoughData { .. })
            ));
        }
    }

    #[test]
    fn two_sender_features() {
        // Distinct and in lexical order, so only the type check can object
        let output = BasicOutput::new(1, vec![AddressUnlockCondition::new(address()).into()])
            .with_features(vec![
                SenderFeature::new(Ed25519Address::new([1; 32])).into(),
                SenderFeature::new(address()).into(),
            ]);
        let expected = SerializationError::ViolatesTypeUniqueness {
            index: 1,
            previous: 0,
            prefix: 0,
        };

        let err = output.serialize(VALIDATE).unwrap_err();
        assert_eq!(err.root(), &expected);

        let err = output.serialize(VALIDATE | ORDER).unwrap_err();
        assert_eq!(err.root(), &expected);

        // The fast path writes whatever it is given, validating readers reject it
        let bytes = output
            .serialize(DeSerializationMode::NO_VALIDATION)
            .unwrap();
        assert!(BasicOutput::deserialize(&bytes, DeSerializationMode::NO_VALIDATION).is_ok());
        let err = BasicOutput::deserialize(&bytes, VALIDATE).unwrap_err();
        assert_eq!(err.root(), &expected);
    }

    #[test]
    fn issuer_feature_not_permitted() {
        let output = BasicOutput::new(1, vec![AddressUnlockCondition::new(address()).into()])
            .with_features(vec![IssuerFeature::new(address()).into()]);

        let err = output.serialize(VALIDATE).unwrap_err();
        assert_eq!(
            err.root(),
            &SerializationError::UnsupportedType {
                context: "basic output feature",
                prefix: 1
            }
        );

        let bytes = output
            .serialize(DeSerializationMode::NO_VALIDATION)
            .unwrap();
        assert_eq!(
            BasicOutput::deserialize(&bytes, DeSerializationMode::NO_VALIDATION)
                .unwrap_err()
                .root(),
            &SerializationError::UnsupportedType {
                context: "basic output feature",
                prefix: 1
            }
        );
    }

    #[test]
    fn address_unlock_condition_must_occur() {
        let output = BasicOutput::new(1, vec![TimelockUnlockCondition::new(100).into()]);
        assert_eq!(
            output.serialize(VALIDATE).unwrap_err().root(),
            &SerializationError::MustOccurMissing { prefix: 0 }
        );

        let output = BasicOutput::new(1, vec![]);
        assert_eq!(
            output.serialize(VALIDATE).unwrap_err().root(),
            &SerializationError::MinElementsNotReached { min: 1, count: 0 }
        );
    }

    #[test]
    fn unlock_conditions_canonical_order() {
        let conditions: Vec<UnlockCondition> = vec![
            ExpirationUnlockCondition::new(address(), 500).into(),
            AddressUnlockCondition::new(address()).into(),
        ];
        let output = BasicOutput::new(1, conditions);

        assert!(matches!(
            output.serialize(VALIDATE).unwrap_err().root(),
            SerializationError::OrderViolatesLexicalOrder { .. }
        ));

        let bytes = output.serialize(VALIDATE | ORDER).unwrap();
        let (decoded, _) = BasicOutput::deserialize(&bytes, VALIDATE).unwrap();
        assert!(matches!(
            decoded.unlock_conditions(),
            [UnlockCondition::Address(_), UnlockCondition::Expiration(_)]
        ));
        assert_eq!(decoded.address(), Some(&address()));
    }

    #[test]
    fn too_many_features() {
        let features: Vec<Feature> = vec![
            SenderFeature::new(address()).into(),
            MetadataFeature::new(vec![1]).into(),
            TagFeature::new(vec![1]).into(),
            TagFeature::new(vec![2]).into(),
        ];
        let output = BasicOutput::new(1, vec![AddressUnlockCondition::new(address()).into()])
            .with_features(features);

        assert_eq!(
            output.serialize(VALIDATE).unwrap_err().root(),
            &SerializationError::MaxElementsExceeded { max: 3, count: 4 }
        );
    }

    #[test]
    fn json() {
        let output = Output::from(basic_output());
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["type"], 3);
        assert_eq!(json["amount"], "1000000");
        assert_eq!(json["unlockConditions"][0]["type"], 0);
        assert_eq!(json["features"][1]["tag"], "0x64656d6f");

        assert_eq!(serde_json::from_value::<Output>(json).unwrap(), output);

        let treasury: Output =
            serde_json::from_str(r#"{"type":2,"amount":"5"}"#).unwrap();
        assert_eq!(treasury, Output::from(TreasuryOutput::new(5)));
    }
}
