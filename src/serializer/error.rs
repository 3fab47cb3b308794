// SPDX-License-Identifier: AGPL-3.0-or-later

use std::borrow::Cow;

use thiserror::Error;

/// Errors which can occur while encoding or decoding protocol objects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SerializationError {
    /// Fewer bytes remain than the current operation requires.
    #[error("not enough data for deserialization, required {required} bytes but only {remaining} remain")]
    NotEnoughData {
        /// Number of bytes the operation needed.
        required: usize,
        /// Number of bytes left in the buffer.
        remaining: usize,
    },

    /// Unread bytes remain after decoding a top-level object.
    #[error("not all data has been consumed, {0} bytes are left over")]
    NotAllConsumed(usize),

    /// A declared or given length lies outside of the permitted range.
    #[error("length {length} is outside of the permitted range {min}..={max}")]
    LengthInvalid {
        /// The length which was encountered.
        length: usize,
        /// Smallest permitted length.
        min: usize,
        /// Largest permitted length.
        max: usize,
    },

    /// The type prefix does not belong to any known type.
    #[error("unknown {context} type {prefix}")]
    UnknownType {
        /// Name of the polymorphic category, for example "address".
        context: &'static str,
        /// The type prefix which was read.
        prefix: u32,
    },

    /// The type is known but not permitted at this place.
    #[error("unsupported {context} type {prefix}")]
    UnsupportedType {
        /// Name of the field context, for example "basic output feature".
        context: &'static str,
        /// The type prefix of the rejected object.
        prefix: u32,
    },

    /// A decoder for one type encountered the type prefix of another.
    #[error("type prefix must be {expected} but is {actual}")]
    TypeMismatch {
        /// Prefix the decoder expected.
        expected: u32,
        /// Prefix found in the data.
        actual: u32,
    },

    /// Collection holds fewer elements than required.
    #[error("min count of elements within the array not reached, min is {min} but count is {count}")]
    MinElementsNotReached {
        /// Required minimum.
        min: usize,
        /// Actual element count.
        count: usize,
    },

    /// Collection holds more elements than permitted.
    #[error("max count of elements within the array exceeded, max is {max} but count is {count}")]
    MaxElementsExceeded {
        /// Permitted maximum.
        max: usize,
        /// Actual element count.
        count: usize,
    },

    /// An element occurs more than once.
    #[error("array elements must be unique, element {index} is a duplicate of element {previous}")]
    ViolatesUniqueness {
        /// Index of the duplicate.
        index: usize,
        /// Index of the earlier element it duplicates.
        previous: usize,
    },

    /// Elements are not in lexical order of their encoded bytes.
    #[error("array elements must be in lexical order, element {index} should have been before element {previous}")]
    OrderViolatesLexicalOrder {
        /// Index of the element which is out of order.
        index: usize,
        /// Index of the element it should have preceded.
        previous: usize,
    },

    /// Two elements of the same type occur in a collection which permits each type only once.
    #[error("array elements must be of unique type, element {index} has the same type {prefix} as element {previous}")]
    ViolatesTypeUniqueness {
        /// Index of the second element of that type.
        index: usize,
        /// Index of the first element of that type.
        previous: usize,
        /// The repeated type prefix.
        prefix: u32,
    },

    /// A type which must occur in a collection is missing.
    #[error("array must contain an element of type {prefix}")]
    MustOccurMissing {
        /// The missing type prefix.
        prefix: u32,
    },

    /// A nested payload consumed a different number of bytes than its length prefix denoted.
    #[error("invalid bytes, denoted payload length {declared} doesn't equal the size of the deserialized payload {consumed}")]
    InvalidBytes {
        /// Length given by the prefix.
        declared: usize,
        /// Bytes consumed by the payload decoder.
        consumed: usize,
    },

    /// A decoded value violates a semantic rule of its type.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Error with the field-level context it occurred in.
    #[error("{context}: {source}")]
    Context {
        /// Description of the operation which failed.
        context: Cow<'static, str>,
        /// The wrapped error.
        source: Box<SerializationError>,
    },
}

impl SerializationError {
    /// Returns the innermost error, stripping all context layers.
    pub fn root(&self) -> &SerializationError {
        match self {
            SerializationError::Context { source, .. } => source.root(),
            err => err,
        }
    }

    /// Wraps this error into a context layer.
    pub fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        SerializationError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Attach field-level context to a failed de- or serialization step.
pub trait ErrorContext<T> {
    /// Wraps the error with a static description.
    fn context(self, context: &'static str) -> Result<T, SerializationError>;

    /// Wraps the error with a lazily built description.
    fn with_context<F>(self, f: F) -> Result<T, SerializationError>
    where
        F: FnOnce() -> String;
}

impl<T> ErrorContext<T> for Result<T, SerializationError> {
    fn context(self, context: &'static str) -> Result<T, SerializationError> {
        self.map_err(|err| err.context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T, SerializationError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|err| err.context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorContext, SerializationError};

    #[test]
    fn context_chain() {
        let result: Result<(), SerializationError> =
            Err(SerializationError::NotAllConsumed(3));
        let err = result
            .context("unable to deserialize parents")
            .with_context(|| format!("unable to deserialize block {}", 1))
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "unable to deserialize block 1: unable to deserialize parents: \
            not all data has been consumed, 3 bytes are left over"
        );
        assert_eq!(err.root(), &SerializationError::NotAllConsumed(3));
    }

    #[test]
    fn root_of_plain_error() {
        let err = SerializationError::MustOccurMissing { prefix: 0 };
        assert_eq!(err.root(), &err);
    }
}
