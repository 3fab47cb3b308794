// SPDX-License-Identifier: AGPL-3.0-or-later

use std::fmt;

use crate::serializer::{
    ByteCursor, DeSerializationMode, Serializable, SerializationError, TypeDenotation,
};

/// Discriminant of a polymorphic protocol type, mapping between a kind and its type prefix.
pub trait TypeKind: Copy + Eq + fmt::Debug + 'static {
    /// Name of the polymorphic category, used in error messages.
    const CATEGORY: &'static str;

    /// Every kind of this category.
    const ALL: &'static [Self];

    /// Type prefix of this kind on the wire.
    fn prefix(self) -> u32;

    /// Resolves a type prefix read from the wire.
    fn from_prefix(prefix: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.prefix() == prefix)
    }
}

/// Serializable type which is one of several concrete kinds, told apart by a type prefix.
///
/// Every concrete kind writes its own type prefix in front of its body, so `read_kind` receives
/// the cursor positioned at the prefix.
pub trait Polymorphic: Serializable {
    /// Discriminant of this type.
    type Kind: TypeKind;

    /// How the type prefix is encoded.
    const DENOTATION: TypeDenotation;

    /// Returns the kind of this instance.
    fn kind(&self) -> Self::Kind;

    /// Reads an instance of the given kind from the cursor.
    fn read_kind(
        kind: Self::Kind,
        cursor: &mut ByteCursor<'_>,
        mode: DeSerializationMode,
    ) -> Result<Self, SerializationError>;
}

/// Restricts which kinds of a polymorphic type may appear in a certain field.
///
/// A guard is the one list of permitted kinds of a field context. Decoding uses it as a selector
/// ([`Guard::select`]), encoding uses it to reject instances the field does not permit
/// ([`Guard::check`]). Since both halves derive from the same list they can never diverge.
#[derive(Clone, Copy)]
pub struct Guard<K: 'static> {
    context: &'static str,
    permitted: &'static [K],
}

impl<K: TypeKind> Guard<K> {
    /// Creates a guard permitting the given kinds.
    pub const fn new(context: &'static str, permitted: &'static [K]) -> Self {
        Self { context, permitted }
    }

    /// Creates a guard permitting every kind of the category.
    pub const fn all(context: &'static str) -> Self {
        Self {
            context,
            permitted: K::ALL,
        }
    }

    /// Name of the field context this guard belongs to.
    pub fn context(&self) -> &'static str {
        self.context
    }

    /// Kinds permitted by this guard.
    pub fn permitted(&self) -> &'static [K] {
        self.permitted
    }

    /// Returns true if the kind is permitted.
    pub fn permits(&self, kind: K) -> bool {
        self.permitted.contains(&kind)
    }

    /// Read guard: resolves a type prefix into a kind permitted in this context.
    pub fn select(&self, prefix: u32) -> Result<K, SerializationError> {
        let kind = K::from_prefix(prefix).ok_or(SerializationError::UnknownType {
            context: K::CATEGORY,
            prefix,
        })?;

        if !self.permits(kind) {
            return Err(SerializationError::UnsupportedType {
                context: self.context,
                prefix,
            });
        }

        Ok(kind)
    }

    /// Write guard: rejects objects whose kind is not permitted in this context.
    pub fn check<T>(&self, object: &T) -> Result<(), SerializationError>
    where
        T: Polymorphic<Kind = K>,
    {
        let kind = object.kind();
        if !self.permits(kind) {
            return Err(SerializationError::UnsupportedType {
                context: self.context,
                prefix: kind.prefix(),
            });
        }

        Ok(())
    }
}

impl<K: TypeKind> fmt::Debug for Guard<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard")
            .field("context", &self.context)
            .field("permitted", &self.permitted)
            .finish()
    }
}
