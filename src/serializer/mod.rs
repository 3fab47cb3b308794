// SPDX-License-Identifier: AGPL-3.0-or-later

//! Generic binary serialization engine all protocol objects are built on.
//!
//! Objects are written into a [`ByteWriter`] and read back from a [`ByteCursor`]. Both sides share
//! the same validation vocabulary: a [`DeSerializationMode`] deciding how much checking is done,
//! [`ArrayRules`] describing constraints on collections and [`Guard`]s restricting which concrete
//! kinds of a polymorphic type may appear in a given field.
//!
//! All numbers are encoded little-endian.
//!
//! ```text
//!                       write(mode)                       read(mode)
//!   ┌──────────────┐                  ┌─────┐                          ┌──────────────┐
//!   │ Serializable ├──► ByteWriter ──►│bytes├──► ByteCursor ──────────►│ Serializable │
//!   └──────────────┘       ▲          └─────┘         ▲                └──────────────┘
//!                          │                          │
//!                   ArrayRules, Guard           ArrayRules, Guard
//! ```
use std::fmt;
use std::ops::BitOr;

#[macro_use]
mod macros;

mod array_rules;
mod cursor;
mod error;
mod guard;
mod writer;

pub use array_rules::{ArrayRules, ArrayValidationMode, ElementValidator, UniquenessSliceFn};
pub use cursor::ByteCursor;
pub use error::{ErrorContext, SerializationError};
pub use guard::{Guard, Polymorphic, TypeKind};
pub use writer::ByteWriter;

/// Size of a single byte.
pub const ONE_BYTE: usize = 1;

/// Size of an encoded `u16`.
pub const UINT16_BYTE_SIZE: usize = 2;

/// Size of an encoded `u32`.
pub const UINT32_BYTE_SIZE: usize = 4;

/// Size of an encoded `u64`.
pub const UINT64_BYTE_SIZE: usize = 8;

/// Size of the length denotation in front of a payload.
pub const PAYLOAD_LENGTH_BYTE_SIZE: usize = UINT32_BYTE_SIZE;

/// Size of a type prefix denoted by a single byte.
pub const SMALL_TYPE_DENOTATION_BYTE_SIZE: usize = ONE_BYTE;

/// Size of a type prefix denoted by an `u32`.
pub const TYPE_DENOTATION_BYTE_SIZE: usize = UINT32_BYTE_SIZE;

/// Mode of de- and serialization.
///
/// Modes are flags and can be combined with `|`. Without
/// [`DeSerializationMode::PERFORM_VALIDATION`] no validation work happens at all, which is the
/// fast path for data which is already trusted.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DeSerializationMode(u8);

impl DeSerializationMode {
    /// Perform no validation.
    pub const NO_VALIDATION: Self = Self(0);

    /// Check bounds, ordering, uniqueness, permitted types and semantic values.
    pub const PERFORM_VALIDATION: Self = Self(1 << 0);

    /// Bring collections which require lexical ordering into canonical order before writing them.
    pub const PERFORM_LEXICAL_ORDERING: Self = Self(1 << 1);

    /// Returns true if all flags of `mode` are set.
    pub const fn has_mode(&self, mode: Self) -> bool {
        mode.0 != 0 && self.0 & mode.0 == mode.0
    }

    /// Shorthand for checking the [`DeSerializationMode::PERFORM_VALIDATION`] flag.
    pub const fn validates(&self) -> bool {
        self.has_mode(Self::PERFORM_VALIDATION)
    }
}

impl BitOr for DeSerializationMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for DeSerializationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut flags = Vec::new();
        if self.has_mode(Self::PERFORM_VALIDATION) {
            flags.push("PERFORM_VALIDATION");
        }
        if self.has_mode(Self::PERFORM_LEXICAL_ORDERING) {
            flags.push("PERFORM_LEXICAL_ORDERING");
        }
        if flags.is_empty() {
            flags.push("NO_VALIDATION");
        }
        write!(f, "DeSerializationMode({})", flags.join(" | "))
    }
}

/// How the type of a polymorphic object is denoted in front of its body.
///
/// Encoding and decoding side of a field need to agree on the denotation, otherwise the stream
/// desynchronizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeDenotation {
    /// No type prefix, the type is known from the context.
    None,

    /// Type prefix is a single byte.
    Byte,

    /// Type prefix is an `u32`.
    Uint32,
}

impl TypeDenotation {
    /// Number of bytes the type prefix occupies.
    pub const fn size(&self) -> usize {
        match self {
            TypeDenotation::None => 0,
            TypeDenotation::Byte => SMALL_TYPE_DENOTATION_BYTE_SIZE,
            TypeDenotation::Uint32 => TYPE_DENOTATION_BYTE_SIZE,
        }
    }

    /// Reads the type prefix from the beginning of the given encoded object.
    ///
    /// Objects without a type denotation report the prefix `0`. Returns `None` when the bytes are
    /// too short to hold the prefix.
    pub fn prefix_of(&self, bytes: &[u8]) -> Option<u32> {
        match self {
            TypeDenotation::None => Some(0),
            TypeDenotation::Byte => bytes.first().map(|byte| u32::from(*byte)),
            TypeDenotation::Uint32 => bytes
                .get(..UINT32_BYTE_SIZE)
                .and_then(|slice| slice.try_into().ok())
                .map(u32::from_le_bytes),
        }
    }
}

/// How the length of a variable sized byte sequence or the element count of a collection is
/// denoted.
///
/// A byte-sized prefix caps the collection at 255 elements, the [`ArrayRules`] of such a field
/// must respect that.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LengthPrefixType {
    /// Length is denoted by a single byte.
    Byte,

    /// Length is denoted by an `u16`.
    Uint16,

    /// Length is denoted by an `u32`.
    Uint32,
}

impl LengthPrefixType {
    /// Number of bytes the prefix occupies.
    pub const fn size(&self) -> usize {
        match self {
            LengthPrefixType::Byte => ONE_BYTE,
            LengthPrefixType::Uint16 => UINT16_BYTE_SIZE,
            LengthPrefixType::Uint32 => UINT32_BYTE_SIZE,
        }
    }

    /// Largest length this prefix can denote.
    pub const fn max_length(&self) -> usize {
        match self {
            LengthPrefixType::Byte => u8::MAX as usize,
            LengthPrefixType::Uint16 => u16::MAX as usize,
            LengthPrefixType::Uint32 => u32::MAX as usize,
        }
    }
}

/// Fixed-width integer which can be encoded little-endian.
///
/// The width of a read or write is derived from the type, never from a runtime argument.
pub trait FixedNumber: Copy {
    /// Encoded width in bytes.
    const SIZE: usize;

    /// Decodes the number from exactly [`FixedNumber::SIZE`] bytes.
    fn from_le_slice(bytes: &[u8]) -> Self;

    /// Appends the little-endian encoding to `buf`.
    fn extend_le(&self, buf: &mut Vec<u8>);
}

macro_rules! impl_fixed_number {
    ($($ty:ty),*) => {
        $(
            impl FixedNumber for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                fn from_le_slice(bytes: &[u8]) -> Self {
                    let mut buf = [0u8; std::mem::size_of::<$ty>()];
                    buf.copy_from_slice(&bytes[..Self::SIZE]);
                    <$ty>::from_le_bytes(buf)
                }

                fn extend_le(&self, buf: &mut Vec<u8>) {
                    buf.extend_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_fixed_number!(u8, u16, u32, u64, i8, i16, i32, i64);

/// Smallest of the given sizes, used to derive the minimum size of a polymorphic type from the
/// minimum sizes of its variants.
pub const fn min_size(sizes: &[usize]) -> usize {
    if sizes.is_empty() {
        return 0;
    }

    let mut min = sizes[0];
    let mut i = 1;
    while i < sizes.len() {
        if sizes[i] < min {
            min = sizes[i];
        }
        i += 1;
    }
    min
}

/// Object which knows how to write itself into a [`ByteWriter`] and read itself from a
/// [`ByteCursor`].
pub trait Serializable: Sized {
    /// Smallest number of bytes a valid encoding of this type can have.
    ///
    /// Input shorter than this is rejected before any field is interpreted.
    const MIN_SIZE: usize = 0;

    /// Exact number of bytes the canonical encoding of this object occupies.
    ///
    /// Written without [`DeSerializationMode::PERFORM_LEXICAL_ORDERING`], collections holding
    /// exact duplicates their rules forbid encode longer.
    fn size(&self) -> usize;

    /// Writes the object into the writer.
    fn write(
        &self,
        writer: &mut ByteWriter,
        mode: DeSerializationMode,
    ) -> Result<(), SerializationError>;

    /// Reads the object from the cursor.
    fn read(cursor: &mut ByteCursor<'_>, mode: DeSerializationMode)
        -> Result<Self, SerializationError>;

    /// Returns the encoded bytes of this object.
    fn serialize(&self, mode: DeSerializationMode) -> Result<Vec<u8>, SerializationError> {
        let mut writer = ByteWriter::with_capacity(self.size());
        self.write(&mut writer, mode)?;
        Ok(writer.into_bytes())
    }

    /// Decodes an object from the beginning of `data`, returning it together with the number of
    /// consumed bytes.
    fn deserialize(
        data: &[u8],
        mode: DeSerializationMode,
    ) -> Result<(Self, usize), SerializationError> {
        let mut cursor = ByteCursor::new(data);
        let object = cursor.read_serializable::<Self>(mode)?;
        Ok((object, cursor.done()))
    }
}

// Recursive protocol types, like a transaction carrying a payload, need the indirection
impl<T: Serializable> Serializable for Box<T> {
    const MIN_SIZE: usize = T::MIN_SIZE;

    fn size(&self) -> usize {
        self.as_ref().size()
    }

    fn write(
        &self,
        writer: &mut ByteWriter,
        mode: DeSerializationMode,
    ) -> Result<(), SerializationError> {
        self.as_ref().write(writer, mode)
    }

    fn read(
        cursor: &mut ByteCursor<'_>,
        mode: DeSerializationMode,
    ) -> Result<Self, SerializationError> {
        T::read(cursor, mode).map(Box::new)
    }
}
