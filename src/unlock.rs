// SPDX-License-Identifier: AGPL-3.0-or-later

//! Unlocks proving the right to consume the inputs of a transaction.
//!
//! The unlock at position `i` belongs to the input at position `i`. Only signature unlocks carry a
//! signature, the other kinds point back to an earlier unlock so the same signature doesn't need
//! to be repeated for every input owned by one address.
use serde::{Deserialize, Serialize};

use crate::serializer::{
    ByteCursor, ByteWriter, DeSerializationMode, ErrorContext, Guard, Serializable,
    SerializationError, TypeDenotation, TypeKind, SMALL_TYPE_DENOTATION_BYTE_SIZE,
    UINT16_BYTE_SIZE,
};
use crate::signature::{Signature, SignatureKind};

type_kind! {
    /// Kinds of unlocks.
    UnlockKind, "unlock" {
        Signature = 0,
        Reference = 1,
        Alias = 2,
        Nft = 3,
    }
}

const SIGNATURE_GUARD: Guard<SignatureKind> = Guard::all("signature unlock signature");

/// Unlocks an input with a signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureUnlock {
    signature: Signature,
}

impl SignatureUnlock {
    /// Kind of this unlock.
    pub const KIND: UnlockKind = UnlockKind::Signature;

    pub fn new(signature: impl Into<Signature>) -> Self {
        Self {
            signature: signature.into(),
        }
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

impl Serializable for SignatureUnlock {
    const MIN_SIZE: usize = SMALL_TYPE_DENOTATION_BYTE_SIZE + Signature::MIN_SIZE;

    fn size(&self) -> usize {
        SMALL_TYPE_DENOTATION_BYTE_SIZE + self.signature.size()
    }

    fn write(
        &self,
        writer: &mut ByteWriter,
        mode: DeSerializationMode,
    ) -> Result<(), SerializationError> {
        writer.write_type_prefix(TypeDenotation::Byte, Self::KIND.prefix());
        writer
            .write_polymorphic(&self.signature, mode, &SIGNATURE_GUARD)
            .context("unable to serialize signature unlock signature")
    }

    fn read(
        cursor: &mut ByteCursor<'_>,
        mode: DeSerializationMode,
    ) -> Result<Self, SerializationError> {
        cursor.check_type_prefix(TypeDenotation::Byte, Self::KIND.prefix())?;
        let signature = cursor
            .read_object(mode, &SIGNATURE_GUARD)
            .context("unable to deserialize signature unlock signature")?;
        Ok(Self { signature })
    }
}

// Reference, alias and nft unlocks all point to another unlock by its index
macro_rules! index_unlock {
    ($(#[$meta:meta])* $unlock:ident, $kind:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $unlock {
            reference: u16,
        }

        impl $unlock {
            /// Kind of this unlock.
            pub const KIND: UnlockKind = UnlockKind::$kind;

            /// Size of the encoded unlock.
            pub const LENGTH: usize = SMALL_TYPE_DENOTATION_BYTE_SIZE + UINT16_BYTE_SIZE;

            pub const fn new(reference: u16) -> Self {
                Self { reference }
            }

            /// Index of the unlock this one refers to.
            pub fn index(&self) -> u16 {
                self.reference
            }
        }

        impl Serializable for $unlock {
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
                writer.write_num(self.reference);
                Ok(())
            }

            fn read(
                cursor: &mut ByteCursor<'_>,
                _mode: DeSerializationMode,
            ) -> Result<Self, SerializationError> {
                cursor.check_type_prefix(TypeDenotation::Byte, Self::KIND.prefix())?;
                let reference = cursor
                    .read_num()
                    .context(concat!("unable to deserialize ", $name, " unlock index"))?;
                Ok(Self { reference })
            }
        }
    };
}

index_unlock!(
    /// Unlocks an input with the signature of an earlier signature unlock.
    ReferenceUnlock,
    Reference,
    "reference"
);

index_unlock!(
    /// Unlocks an input owned by an alias which was unlocked by an earlier unlock.
    AliasUnlock,
    Alias,
    "alias"
);

index_unlock!(
    /// Unlocks an input owned by an nft which was unlocked by an earlier unlock.
    NftUnlock,
    Nft,
    "nft"
);

/// Any kind of unlock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Unlock {
    Signature(SignatureUnlock),
    Reference(ReferenceUnlock),
    Alias(AliasUnlock),
    Nft(NftUnlock),
}

polymorphic! {
    Unlock: UnlockKind, TypeDenotation::Byte, "unlock" {
        Signature(SignatureUnlock),
        Reference(ReferenceUnlock),
        Alias(AliasUnlock),
        Nft(NftUnlock),
    }
}

impl Unlock {
    /// Index of the unlock this one points back to, `None` for signature unlocks.
    pub fn reference(&self) -> Option<u16> {
        match self {
            Unlock::Signature(_) => None,
            Unlock::Reference(unlock) => Some(unlock.index()),
            Unlock::Alias(unlock) => Some(unlock.index()),
            Unlock::Nft(unlock) => Some(unlock.index()),
        }
    }
}

/// Checks the references between the unlocks of one transaction.
///
/// Signature unlocks must be unique. Every other unlock must point to an unlock with a smaller
/// index, a reference unlock furthermore only to a signature unlock.
pub fn verify_unlocks(unlocks: &[Unlock]) -> Result<(), SerializationError> {
    for (index, unlock) in unlocks.iter().enumerate() {
        match unlock {
            Unlock::Signature(_) => {
                if let Some(previous) = unlocks[..index].iter().position(|other| other == unlock) {
                    return Err(SerializationError::InvalidValue(format!(
                        "signature unlock {index} is a duplicate of unlock {previous}"
                    )));
                }
            }
            Unlock::Reference(reference) => {
                let target = usize::from(reference.index());
                match unlocks[..index].get(target) {
                    Some(Unlock::Signature(_)) => (),
                    Some(_) => {
                        return Err(SerializationError::InvalidValue(format!(
                            "reference unlock {index} must point to a signature unlock but \
                            unlock {target} is none"
                        )));
                    }
                    None => return Err(invalid_reference(index, target)),
                }
            }
            Unlock::Alias(AliasUnlock { reference }) | Unlock::Nft(NftUnlock { reference }) => {
                let target = usize::from(*reference);
                if target >= index {
                    return Err(invalid_reference(index, target));
                }
            }
        }
    }

    Ok(())
}

fn invalid_reference(index: usize, target: usize) -> SerializationError {
    SerializationError::InvalidValue(format!(
        "unlock {index} references unlock {target} which is not a previous unlock"
    ))
}
