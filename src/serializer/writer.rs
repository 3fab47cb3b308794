// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::serializer::{
    ArrayRules, DeSerializationMode, FixedNumber, Guard, LengthPrefixType, Polymorphic,
    Serializable, SerializationError, TypeDenotation,
};

/// Accumulates the encoding of protocol objects in a growable buffer.
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty writer with space for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far.
    pub fn written(&self) -> usize {
        self.buf.len()
    }

    /// Returns the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Writes a little-endian number, its width is given by `T`.
    pub fn write_num<T: FixedNumber>(&mut self, value: T) {
        value.extend_le(&mut self.buf);
    }

    /// Writes raw bytes without any length prefix.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes the type prefix of an object as given by its denotation.
    ///
    /// Byte-denoted categories only use prefixes below 256.
    pub fn write_type_prefix(&mut self, denotation: TypeDenotation, prefix: u32) {
        match denotation {
            TypeDenotation::None => (),
            TypeDenotation::Byte => self.write_num(prefix as u8),
            TypeDenotation::Uint32 => self.write_num(prefix),
        }
    }

    /// Writes a length denoted as `len_type`.
    ///
    /// Lengths which don't fit into the prefix are rejected instead of being truncated.
    pub fn write_length(
        &mut self,
        length: usize,
        len_type: LengthPrefixType,
    ) -> Result<(), SerializationError> {
        if length > len_type.max_length() {
            return Err(SerializationError::LengthInvalid {
                length,
                min: 0,
                max: len_type.max_length(),
            });
        }

        match len_type {
            LengthPrefixType::Byte => self.write_num(length as u8),
            LengthPrefixType::Uint16 => self.write_num(length as u16),
            LengthPrefixType::Uint32 => self.write_num(length as u32),
        }

        Ok(())
    }

    /// Writes a length prefix followed by the bytes.
    pub fn write_variable_bytes(
        &mut self,
        bytes: &[u8],
        len_type: LengthPrefixType,
    ) -> Result<(), SerializationError> {
        self.write_length(bytes.len(), len_type)?;
        self.write_bytes(bytes);
        Ok(())
    }

    /// Writes an object whose type is known from the context.
    pub fn write_object<T: Serializable>(
        &mut self,
        object: &T,
        mode: DeSerializationMode,
    ) -> Result<(), SerializationError> {
        object.write(self, mode)
    }

    /// Writes a polymorphic object after checking it against the guard of its field.
    pub fn write_polymorphic<T: Polymorphic>(
        &mut self,
        object: &T,
        mode: DeSerializationMode,
        guard: &Guard<T::Kind>,
    ) -> Result<(), SerializationError> {
        if mode.validates() {
            guard.check(object)?;
        }

        object.write(self, mode)
    }

    /// Writes a count-prefixed collection of polymorphic objects.
    ///
    /// Elements are encoded first so that ordering and uniqueness are decided on the bytes which
    /// actually appear on the wire. With [`DeSerializationMode::PERFORM_LEXICAL_ORDERING`] the
    /// encoded elements are brought into canonical order before being written.
    pub fn write_objects<T: Polymorphic>(
        &mut self,
        objects: &[T],
        mode: DeSerializationMode,
        len_type: LengthPrefixType,
        guard: &Guard<T::Kind>,
        rules: &ArrayRules,
    ) -> Result<(), SerializationError> {
        let mut encoded = Vec::with_capacity(objects.len());
        for object in objects {
            let mut writer = ByteWriter::with_capacity(object.size());
            writer.write_polymorphic(object, mode, guard)?;
            encoded.push(writer.into_bytes());
        }

        self.write_encoded(encoded, mode, len_type, rules, T::DENOTATION)
    }

    /// Writes a count-prefixed collection of objects whose type is known from the context.
    pub fn write_sequence<T: Serializable>(
        &mut self,
        objects: &[T],
        mode: DeSerializationMode,
        len_type: LengthPrefixType,
        rules: &ArrayRules,
    ) -> Result<(), SerializationError> {
        let encoded = objects
            .iter()
            .map(|object| object.serialize(mode))
            .collect::<Result<Vec<_>, _>>()?;

        self.write_encoded(encoded, mode, len_type, rules, TypeDenotation::None)
    }

    /// Writes a count-prefixed collection of fixed-size byte arrays.
    pub fn write_fixed_arrays<const N: usize>(
        &mut self,
        arrays: &[[u8; N]],
        mode: DeSerializationMode,
        len_type: LengthPrefixType,
        rules: &ArrayRules,
    ) -> Result<(), SerializationError> {
        let encoded = arrays.iter().map(|array| array.to_vec()).collect();
        self.write_encoded(encoded, mode, len_type, rules, TypeDenotation::None)
    }

    fn write_encoded(
        &mut self,
        mut encoded: Vec<Vec<u8>>,
        mode: DeSerializationMode,
        len_type: LengthPrefixType,
        rules: &ArrayRules,
        denotation: TypeDenotation,
    ) -> Result<(), SerializationError> {
        if mode.has_mode(DeSerializationMode::PERFORM_LEXICAL_ORDERING) {
            rules.canonicalize(&mut encoded, |element| element.as_slice());
        }

        if mode.validates() {
            rules.check_bounds(encoded.len())?;

            let mut validator = rules.element_validator(denotation);
            for (index, element) in encoded.iter().enumerate() {
                validator.validate(index, element)?;
            }
            validator.finish()?;
        }

        self.write_length(encoded.len(), len_type)?;
        for element in &encoded {
            self.write_bytes(element);
        }

        Ok(())
    }

    /// Writes an optional payload prefixed by its total length in bytes.
    ///
    /// An absent payload is written as a zero length.
    pub fn write_payload<T: Polymorphic>(
        &mut self,
        payload: Option<&T>,
        mode: DeSerializationMode,
        guard: &Guard<T::Kind>,
    ) -> Result<(), SerializationError> {
        let Some(payload) = payload else {
            self.write_num(0u32);
            return Ok(());
        };

        let mut writer = ByteWriter::with_capacity(payload.size());
        writer.write_polymorphic(payload, mode, guard)?;
        self.write_variable_bytes(&writer.into_bytes(), LengthPrefixType::Uint32)
    }
}
