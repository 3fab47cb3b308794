// SPDX-License-Identifier: AGPL-3.0-or-later

//! Binary and JSON wire formats of the objects of an IOTA-style DAG ledger.
//!
//! Every protocol object implements [`Serializable`], encoding itself into a compact
//! little-endian binary format and decoding itself from it again. Decoding untrusted bytes is
//! done with [`DeSerializationMode::PERFORM_VALIDATION`], which enforces collection bounds,
//! canonical ordering, uniqueness, permitted types and semantic values. Trusted bytes can be
//! decoded without any validation work.
//!
//! All objects also have a JSON representation (via `serde`) in which polymorphic objects carry a
//! numeric `"type"` field and bytes are `0x`-prefixed hex strings.
//!
//! ## Example
//!
//! ```
//! use tangle_codec::{Block, BlockId, DeSerializationMode, Serializable};
//!
//! let block = Block::new(
//!     vec![BlockId::from_bytes([2; 32]), BlockId::from_bytes([1; 32])],
//!     None,
//!     0,
//! );
//!
//! // Parents are sorted when encoding canonically
//! let bytes = block.to_bytes().unwrap();
//! let decoded = Block::from_bytes(&bytes, DeSerializationMode::PERFORM_VALIDATION).unwrap();
//! assert_eq!(decoded.parents()[0], BlockId::from_bytes([1; 32]));
//! assert_eq!(decoded.size(), bytes.len());
//! ```
#[macro_use]
pub mod serializer;

pub mod address;
pub mod bech32;
pub mod block;
pub mod feature;
pub mod identifier;
pub mod input;
pub mod native_token;
pub mod output;
pub mod payload;
pub mod protocol;
pub mod serde;
pub mod signature;
pub mod unlock;
pub mod unlock_condition;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use address::{Address, AddressKind, AliasAddress, Ed25519Address, NftAddress};
pub use bech32::Bech32Error;
pub use block::{Block, PROTOCOL_VERSION};
pub use feature::{Feature, FeatureKind};
pub use identifier::{
    AliasId, BlockId, IdentifierError, NftId, OutputId, TokenId, TransactionId,
};
pub use input::{Input, InputKind, UtxoInput};
pub use native_token::{NativeToken, TokenAmount};
pub use output::{BasicOutput, Output, OutputKind, TreasuryOutput};
pub use payload::{Payload, PayloadKind, TaggedDataPayload, TransactionEssence, TransactionPayload};
pub use protocol::{NetworkId, ProtocolParameters, ProtocolParametersError, RentStructure};
pub use serializer::{
    ArrayRules, ArrayValidationMode, ByteCursor, ByteWriter, DeSerializationMode, Guard,
    LengthPrefixType, Polymorphic, Serializable, SerializationError, TypeDenotation, TypeKind,
};
pub use signature::{Ed25519Signature, Signature, SignatureError};
pub use unlock::{Unlock, UnlockKind};
pub use unlock_condition::{UnlockCondition, UnlockConditionKind};
