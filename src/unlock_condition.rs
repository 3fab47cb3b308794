// SPDX-License-Identifier: AGPL-3.0-or-later

//! Conditions which need to be fulfilled to unlock an output.
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::serializer::{
    ByteCursor, ByteWriter, DeSerializationMode, ErrorContext, Guard, Serializable,
    SerializationError, TypeDenotation, TypeKind, SMALL_TYPE_DENOTATION_BYTE_SIZE,
    UINT32_BYTE_SIZE, UINT64_BYTE_SIZE,
};

type_kind! {
    /// Kinds of unlock conditions.
    UnlockConditionKind, "unlock condition" {
        Address = 0,
        StorageDepositReturn = 1,
        Timelock = 2,
        Expiration = 3,
    }
}

/// Addresses permitted inside of unlock conditions.
const ADDRESS_GUARD: Guard<crate::address::AddressKind> = Guard::all("unlock condition address");

/// Defines the address which can unlock an output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressUnlockCondition {
    address: Address,
}

impl AddressUnlockCondition {
    /// Kind of this unlock condition.
    pub const KIND: UnlockConditionKind = UnlockConditionKind::Address;

    pub fn new(address: impl Into<Address>) -> Self {
        Self {
            address: address.into(),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }
}

impl Serializable for AddressUnlockCondition {
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
            .context("unable to serialize address unlock condition address")
    }

    fn read(
        cursor: &mut ByteCursor<'_>,
        mode: DeSerializationMode,
    ) -> Result<Self, SerializationError> {
        cursor.check_type_prefix(TypeDenotation::Byte, Self::KIND.prefix())?;
        let address = cursor
            .read_object(mode, &ADDRESS_GUARD)
            .context("unable to deserialize address unlock condition address")?;
        Ok(Self { address })
    }
}

/// Defines the amount which needs to be sent back to the return address when the output is
/// consumed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageDepositReturnUnlockCondition {
    return_address: Address,

    #[serde(with = "crate::serde::u64_string")]
    amount: u64,
}

impl StorageDepositReturnUnlockCondition {
    /// Kind of this unlock condition.
    pub const KIND: UnlockConditionKind = UnlockConditionKind::StorageDepositReturn;

    pub fn new(return_address: impl Into<Address>, amount: u64) -> Self {
        Self {
            return_address: return_address.into(),
            amount,
        }
    }

    pub fn return_address(&self) -> &Address {
        &self.return_address
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }
}

impl Serializable for StorageDepositReturnUnlockCondition {
    const MIN_SIZE: usize = SMALL_TYPE_DENOTATION_BYTE_SIZE + Address::MIN_SIZE + UINT64_BYTE_SIZE;

    fn size(&self) -> usize {
        SMALL_TYPE_DENOTATION_BYTE_SIZE + self.return_address.size() + UINT64_BYTE_SIZE
    }

    fn write(
        &self,
        writer: &mut ByteWriter,
        mode: DeSerializationMode,
    ) -> Result<(), SerializationError> {
        if mode.validates() && self.amount == 0 {
            return Err(zero_value("storage deposit return amount"));
        }

        writer.write_type_prefix(TypeDenotation::Byte, Self::KIND.prefix());
        writer
            .write_polymorphic(&self.return_address, mode, &ADDRESS_GUARD)
            .context("unable to serialize storage deposit return address")?;
        writer.write_num(self.amount);
        Ok(())
    }

    fn read(
        cursor: &mut ByteCursor<'_>,
        mode: DeSerializationMode,
    ) -> Result<Self, SerializationError> {
        cursor.check_type_prefix(TypeDenotation::Byte, Self::KIND.prefix())?;
        let return_address = cursor
            .read_object(mode, &ADDRESS_GUARD)
            .context("unable to deserialize storage deposit return address")?;
        let amount = cursor.read_num()?;

        if mode.validates() && amount == 0 {
            return Err(zero_value("storage deposit return amount"));
        }

        Ok(Self {
            return_address,
            amount,
        })
    }
}

/// Defines a unix time until which the output can not be unlocked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelockUnlockCondition {
    unix_time: u32,
}

impl TimelockUnlockCondition {
    /// Kind of this unlock condition.
    pub const KIND: UnlockConditionKind = UnlockConditionKind::Timelock;

    /// Size of the encoded unlock condition.
    pub const LENGTH: usize = SMALL_TYPE_DENOTATION_BYTE_SIZE + UINT32_BYTE_SIZE;

    pub fn new(unix_time: u32) -> Self {
        Self { unix_time }
    }

    pub fn unix_time(&self) -> u32 {
        self.unix_time
    }
}

impl Serializable for TimelockUnlockCondition {
    const MIN_SIZE: usize = Self::LENGTH;

    fn size(&self) -> usize {
        Self::LENGTH
    }

    fn write(
        &self,
        writer: &mut ByteWriter,
        mode: DeSerializationMode,
    ) -> Result<(), SerializationError> {
        if mode.validates() && self.unix_time == 0 {
            return Err(zero_value("timelock unix time"));
        }

        writer.write_type_prefix(TypeDenotation::Byte, Self::KIND.prefix());
        writer.write_num(self.unix_time);
        Ok(())
    }

    fn read(
        cursor: &mut ByteCursor<'_>,
        mode: DeSerializationMode,
    ) -> Result<Self, SerializationError> {
        cursor.check_type_prefix(TypeDenotation::Byte, Self::KIND.prefix())?;
        let unix_time = cursor.read_num()?;

        if mode.validates() && unix_time == 0 {
            return Err(zero_value("timelock unix time"));
        }

        Ok(Self { unix_time })
    }
}

/// Defines a unix time after which only the return address can unlock the output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpirationUnlockCondition {
    return_address: Address,
    unix_time: u32,
}

impl ExpirationUnlockCondition {
    /// Kind of this unlock condition.
    pub const KIND: UnlockConditionKind = UnlockConditionKind::Expiration;

    pub fn new(return_address: impl Into<Address>, unix_time: u32) -> Self {
        Self {
            return_address: return_address.into(),
            unix_time,
        }
    }

    pub fn return_address(&self) -> &Address {
        &self.return_address
    }

    pub fn unix_time(&self) -> u32 {
        self.unix_time
    }
}

impl Serializable for ExpirationUnlockCondition {
    const MIN_SIZE: usize = SMALL_TYPE_DENOTATION_BYTE_SIZE + Address::MIN_SIZE + UINT32_BYTE_SIZE;

    fn size(&self) -> usize {
        SMALL_TYPE_DENOTATION_BYTE_SIZE + self.return_address.size() + UINT32_BYTE_SIZE
    }

    fn write(
        &self,
        writer: &mut ByteWriter,
        mode: DeSerializationMode,
    ) -> Result<(), SerializationError> {
        if mode.validates() && self.unix_time == 0 {
            return Err(zero_value("expiration unix time"));
        }

        writer.write_type_prefix(TypeDenotation::Byte, Self::KIND.prefix());
        writer
            .write_polymorphic(&self.return_address, mode, &ADDRESS_GUARD)
            .context("unable to serialize expiration return address")?;
        writer.write_num(self.unix_time);
        Ok(())
    }

    fn read(
        cursor: &mut ByteCursor<'_>,
        mode: DeSerializationMode,
    ) -> Result<Self, SerializationError> {
        cursor.check_type_prefix(TypeDenotation::Byte, Self::KIND.prefix())?;
        let return_address = cursor
            .read_object(mode, &ADDRESS_GUARD)
            .context("unable to deserialize expiration return address")?;
        let unix_time = cursor.read_num()?;

        if mode.validates() && unix_time == 0 {
            return Err(zero_value("expiration unix time"));
        }

        Ok(Self {
            return_address,
            unix_time,
        })
    }
}

fn zero_value(field: &str) -> SerializationError {
    SerializationError::InvalidValue(format!("{field} must not be zero"))
}

/// Any kind of unlock condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnlockCondition {
    Address(AddressUnlockCondition),
    StorageDepositReturn(StorageDepositReturnUnlockCondition),
    Timelock(TimelockUnlockCondition),
    Expiration(ExpirationUnlockCondition),
}

polymorphic! {
    UnlockCondition: UnlockConditionKind, TypeDenotation::Byte, "unlock condition" {
        Address(AddressUnlockCondition),
        StorageDepositReturn(StorageDepositReturnUnlockCondition),
        Timelock(TimelockUnlockCondition),
        Expiration(ExpirationUnlockCondition),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::address::{AliasAddress, Ed25519Address};
    use crate::identifier::AliasId;
    use crate::serializer::{DeSerializationMode, Serializable, SerializationError};

    use super::{
        AddressUnlockCondition, ExpirationUnlockCondition, StorageDepositReturnUnlockCondition,
        TimelockUnlockCondition, UnlockCondition,
    };

    const VALIDATE: DeSerializationMode = DeSerializationMode::PERFORM_VALIDATION;

    fn ed25519() -> Ed25519Address {
        Ed25519Address::new([4; 32])
    }

    #[rstest]
    #[case::address(AddressUnlockCondition::new(ed25519()).into(), 34)]
    #[case::storage_deposit_return(
        StorageDepositReturnUnlockCondition::new(ed25519(), 1000).into(), 42
    )]
    #[case::timelock(TimelockUnlockCondition::new(1_700_000_000).into(), 5)]
    #[case::expiration(
        ExpirationUnlockCondition::new(AliasAddress::new(AliasId::from_bytes([1; 32])), 5).into(),
        38
    )]
    fn round_trip(#[case] condition: UnlockCondition, #[case] size: usize) {
        let bytes = condition.serialize(VALIDATE).unwrap();
        assert_eq!(bytes.len(), size);
        assert_eq!(condition.size(), size);

        let (decoded, consumed) = UnlockCondition::deserialize(&bytes, VALIDATE).unwrap();
        assert_eq!(decoded, condition);
        assert_eq!(consumed, size);

        // Validation doesn't change the encoding of valid objects
        assert_eq!(
            condition
                .serialize(DeSerializationMode::NO_VALIDATION)
                .unwrap(),
            bytes
        );
    }

    #[rstest]
    #[case::amount(StorageDepositReturnUnlockCondition::new(ed25519(), 0).into())]
    #[case::timelock(TimelockUnlockCondition::new(0).into())]
    #[case::expiration(ExpirationUnlockCondition::new(ed25519(), 0).into())]
    fn zero_values(#[case] condition: UnlockCondition) {
        assert!(matches!(
            condition.serialize(VALIDATE),
            Err(SerializationError::InvalidValue(_))
        ));

        let bytes = condition
            .serialize(DeSerializationMode::NO_VALIDATION)
            .unwrap();
        assert!(matches!(
            UnlockCondition::deserialize(&bytes, VALIDATE),
            Err(SerializationError::InvalidValue(_))
        ));
        assert!(UnlockCondition::deserialize(&bytes, DeSerializationMode::NO_VALIDATION).is_ok());
    }

    #[test]
    fn nested_error_context() {
        // Address unlock condition holding an address of unknown type 9
        let mut bytes = vec![0, 9];
        bytes.extend_from_slice(&[0; 32]);

        let err = UnlockCondition::deserialize(&bytes, VALIDATE).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unable to deserialize address unlock condition address: unknown address type 9"
        );
        assert_eq!(
            err.root(),
            &SerializationError::UnknownType {
                context: "address",
                prefix: 9
            }
        );
    }

    #[test]
    fn json() {
        let condition =
            UnlockCondition::from(StorageDepositReturnUnlockCondition::new(ed25519(), 42));
        let json = serde_json::to_value(condition).unwrap();
        assert_eq!(json["type"], 1);
        assert_eq!(json["amount"], "42");
        assert_eq!(json["returnAddress"]["type"], 0);

        assert_eq!(
            serde_json::from_value::<UnlockCondition>(json).unwrap(),
            condition
        );

        let json = serde_json::json!({ "type": 2, "unixTime": 10 });
        assert_eq!(
            serde_json::from_value::<UnlockCondition>(json).unwrap(),
            UnlockCondition::from(TimelockUnlockCondition::new(10))
        );
    }
}
