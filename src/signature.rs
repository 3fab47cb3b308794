// SPDX-License-Identifier: AGPL-3.0-or-later

//! Signatures proving ownership of the addresses inputs are locked to.
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::Ed25519Address;
use crate::serializer::{
    ByteCursor, ByteWriter, DeSerializationMode, Serializable, SerializationError,
    TypeDenotation, TypeKind, SMALL_TYPE_DENOTATION_BYTE_SIZE,
};

/// Size of an Ed25519 public key.
pub const PUBLIC_KEY_LEN: usize = ed25519_dalek::PUBLIC_KEY_LENGTH;

/// Size of an Ed25519 private key.
pub const PRIVATE_KEY_LEN: usize = ed25519_dalek::SECRET_KEY_LENGTH;

/// Size of an Ed25519 signature.
pub const SIGNATURE_LEN: usize = ed25519_dalek::SIGNATURE_LENGTH;

type_kind! {
    /// Kinds of signatures.
    SignatureKind, "signature" {
        Ed25519 = 0,
    }
}

/// Ed25519 signature together with the public key it can be verified with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ed25519Signature {
    #[serde(with = "crate::serde::hex_array")]
    public_key: [u8; PUBLIC_KEY_LEN],

    #[serde(with = "crate::serde::hex_array")]
    signature: [u8; SIGNATURE_LEN],
}

impl Ed25519Signature {
    /// Kind of this signature.
    pub const KIND: SignatureKind = SignatureKind::Ed25519;

    /// Size of the encoded signature.
    pub const LENGTH: usize = SMALL_TYPE_DENOTATION_BYTE_SIZE + PUBLIC_KEY_LEN + SIGNATURE_LEN;

    pub const fn new(public_key: [u8; PUBLIC_KEY_LEN], signature: [u8; SIGNATURE_LEN]) -> Self {
        Self {
            public_key,
            signature,
        }
    }

    /// Signs the message with the given private key.
    pub fn sign(private_key: &[u8; PRIVATE_KEY_LEN], message: &[u8]) -> Self {
        let signing_key = SigningKey::from_bytes(private_key);
        Self {
            public_key: signing_key.verifying_key().to_bytes(),
            signature: signing_key.sign(message).to_bytes(),
        }
    }

    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.public_key
    }

    pub fn signature(&self) -> &[u8; SIGNATURE_LEN] {
        &self.signature
    }

    /// Address the public key of this signature belongs to.
    pub fn address(&self) -> Ed25519Address {
        Ed25519Address::from_public_key(&self.public_key)
    }

    /// Verifies the signature over the given message.
    pub fn verify(&self, message: &[u8]) -> Result<(), SignatureError> {
        let verifying_key = VerifyingKey::from_bytes(&self.public_key)
            .map_err(|_| SignatureError::InvalidPublicKey)?;
        let signature = ed25519_dalek::Signature::from_bytes(&self.signature);

        verifying_key
            .verify(message, &signature)
            .map_err(|_| SignatureError::InvalidSignature)
    }
}

impl Serializable for Ed25519Signature {
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
        writer.write_bytes(&self.public_key);
        writer.write_bytes(&self.signature);
        Ok(())
    }

    fn read(
        cursor: &mut ByteCursor<'_>,
        _mode: DeSerializationMode,
    ) -> Result<Self, SerializationError> {
        cursor.check_type_prefix(TypeDenotation::Byte, Self::KIND.prefix())?;
        Ok(Self {
            public_key: cursor.read_array()?,
            signature: cursor.read_array()?,
        })
    }
}

/// Any kind of signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Signature {
    Ed25519(Ed25519Signature),
}

polymorphic! {
    Signature: SignatureKind, TypeDenotation::Byte, "signature" {
        Ed25519(Ed25519Signature),
    }
}

impl Signature {
    /// Verifies the signature over the given message.
    pub fn verify(&self, message: &[u8]) -> Result<(), SignatureError> {
        match self {
            Signature::Ed25519(signature) => signature.verify(message),
        }
    }
}

/// Error types for signature verification.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignatureError {
    /// Public key is not a valid point on the curve.
    #[error("invalid ed25519 public key")]
    InvalidPublicKey,

    /// Signature doesn't match the message and public key.
    #[error("signature does not match public key and message")]
    InvalidSignature,
}

#[cfg(test)]
mod tests {
    use crate::serializer::{DeSerializationMode, Serializable};

    use super::{Ed25519Signature, Signature, SignatureError};

    const PRIVATE_KEY: [u8; 32] = [42; 32];

    #[test]
    fn sign_and_verify() {
        let signature = Ed25519Signature::sign(&PRIVATE_KEY, b"essence");
        assert!(signature.verify(b"essence").is_ok());
        assert_eq!(
            signature.verify(b"tampered"),
            Err(SignatureError::InvalidSignature)
        );
        assert_eq!(
            signature.address(),
            crate::address::Ed25519Address::from_public_key(signature.public_key())
        );
    }

    #[test]
    fn round_trip() {
        let signature = Signature::from(Ed25519Signature::sign(&PRIVATE_KEY, b"essence"));
        let bytes = signature
            .serialize(DeSerializationMode::PERFORM_VALIDATION)
            .unwrap();
        assert_eq!(bytes.len(), 97);

        let (decoded, _) =
            Signature::deserialize(&bytes, DeSerializationMode::PERFORM_VALIDATION).unwrap();
        assert_eq!(decoded, signature);
        assert!(decoded.verify(b"essence").is_ok());
    }

    #[test]
    fn json() {
        let signature = Signature::from(Ed25519Signature::new([1; 32], [2; 64]));
        let json = serde_json::to_value(signature).unwrap();
        assert_eq!(json["type"], 0);
        assert_eq!(json["publicKey"], format!("0x{}", "01".repeat(32)));
        assert_eq!(json["signature"], format!("0x{}", "02".repeat(64)));
        assert_eq!(serde_json::from_value::<Signature>(json).unwrap(), signature);
    }
}
