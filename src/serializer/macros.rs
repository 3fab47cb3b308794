// SPDX-License-Identifier: AGPL-3.0-or-later

/// Declares the kind enum of a polymorphic category together with its type prefixes.
macro_rules! type_kind {
    (
        $(#[$meta:meta])*
        $kind:ident, $category:literal {
            $($(#[$variant_meta:meta])* $variant:ident = $prefix:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $kind {
            $($(#[$variant_meta])* $variant),+
        }

        impl $crate::serializer::TypeKind for $kind {
            const CATEGORY: &'static str = $category;
            const ALL: &'static [Self] = &[$($kind::$variant),+];

            fn prefix(self) -> u32 {
                match self {
                    $($kind::$variant => $prefix),+
                }
            }
        }
    };
}

/// Implements the binary and JSON encoding of a polymorphic enum by delegating to its variants.
///
/// Every variant of the enum wraps a concrete type and is named like its kind.
macro_rules! polymorphic {
    (
        $name:ident: $kind:ident, $denotation:expr, $context:literal {
            $($variant:ident($inner:ty)),+ $(,)?
        }
    ) => {
        impl $crate::serializer::Serializable for $name {
            const MIN_SIZE: usize = $crate::serializer::min_size(&[
                $(<$inner as $crate::serializer::Serializable>::MIN_SIZE),+
            ]);

            fn size(&self) -> usize {
                match self {
                    $($name::$variant(inner) => $crate::serializer::Serializable::size(inner)),+
                }
            }

            fn write(
                &self,
                writer: &mut $crate::serializer::ByteWriter,
                mode: $crate::serializer::DeSerializationMode,
            ) -> Result<(), $crate::serializer::SerializationError> {
                match self {
                    $($name::$variant(inner) => writer.write_object(inner, mode)),+
                }
            }

            fn read(
                cursor: &mut $crate::serializer::ByteCursor<'_>,
                mode: $crate::serializer::DeSerializationMode,
            ) -> Result<Self, $crate::serializer::SerializationError> {
                cursor.read_object(mode, &$crate::serializer::Guard::all($context))
            }
        }

        impl $crate::serializer::Polymorphic for $name {
            type Kind = $kind;
            const DENOTATION: $crate::serializer::TypeDenotation = $denotation;

            fn kind(&self) -> $kind {
                match self {
                    $($name::$variant(_) => $kind::$variant),+
                }
            }

            fn read_kind(
                kind: $kind,
                cursor: &mut $crate::serializer::ByteCursor<'_>,
                mode: $crate::serializer::DeSerializationMode,
            ) -> Result<Self, $crate::serializer::SerializationError> {
                match kind {
                    $($kind::$variant => cursor.read_serializable::<$inner>(mode).map($name::$variant)),+
                }
            }
        }

        $(
            impl From<$inner> for $name {
                fn from(value: $inner) -> Self {
                    $name::$variant(value)
                }
            }
        )+

        impl ::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                match self {
                    $($name::$variant(inner) => ::serde::Serialize::serialize(
                        &$crate::serde::Tagged::new($kind::$variant, inner),
                        serializer,
                    )),+
                }
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let (kind, value) = $crate::serde::deserialize_tagged::<D, $kind>(deserializer)?;

                match kind {
                    $($kind::$variant => {
                        $crate::serde::from_value::<$inner, D::Error>(value).map($name::$variant)
                    }),+
                }
            }
        }
    };
}
