// SPDX-License-Identifier: AGPL-3.0-or-later

use log::trace;

use crate::serializer::{
    ArrayRules, DeSerializationMode, FixedNumber, Guard, LengthPrefixType, Polymorphic,
    Serializable, SerializationError, TypeDenotation, TypeKind,
};

/// Forward-only cursor decoding values from an immutable byte buffer.
///
/// Every read checks that enough bytes remain before touching the buffer. Returned byte sequences
/// are copied, the cursor never hands out references into the buffer.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    remaining: &'a [u8],
    offset: usize,
}

impl<'a> ByteCursor<'a> {
    /// Creates a cursor at the beginning of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            remaining: data,
            offset: 0,
        }
    }

    /// Number of bytes consumed so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of bytes not yet consumed.
    pub fn remaining_len(&self) -> usize {
        self.remaining.len()
    }

    /// Fails with [`SerializationError::NotEnoughData`] if fewer than `required` bytes remain.
    pub fn ensure_remaining(&self, required: usize) -> Result<(), SerializationError> {
        if self.remaining.len() < required {
            return Err(SerializationError::NotEnoughData {
                required,
                remaining: self.remaining.len(),
            });
        }

        Ok(())
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], SerializationError> {
        self.ensure_remaining(len)?;
        let (head, tail) = self.remaining.split_at(len);
        self.remaining = tail;
        self.offset += len;
        Ok(head)
    }

    /// Advances the cursor by `len` bytes without interpreting them.
    pub fn skip(&mut self, len: usize) -> Result<(), SerializationError> {
        self.take(len).map(|_| ())
    }

    /// Reads a little-endian number, its width is given by `T`.
    pub fn read_num<T: FixedNumber>(&mut self) -> Result<T, SerializationError> {
        self.take(T::SIZE).map(T::from_le_slice)
    }

    /// Reads exactly `N` bytes into a fixed-size array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], SerializationError> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take(N)?);
        Ok(array)
    }

    /// Reads a length denoted as `len_type`.
    pub fn read_length(&mut self, len_type: LengthPrefixType) -> Result<usize, SerializationError> {
        let length = match len_type {
            LengthPrefixType::Byte => usize::from(self.read_num::<u8>()?),
            LengthPrefixType::Uint16 => usize::from(self.read_num::<u16>()?),
            LengthPrefixType::Uint32 => self.read_num::<u32>()? as usize,
        };

        Ok(length)
    }

    /// Reads a length-prefixed byte sequence.
    ///
    /// A declared length above `max` is rejected before any data is copied.
    pub fn read_variable_bytes(
        &mut self,
        len_type: LengthPrefixType,
        max: Option<usize>,
    ) -> Result<Vec<u8>, SerializationError> {
        let length = self.read_length(len_type)?;

        if let Some(max) = max {
            if length > max {
                return Err(SerializationError::LengthInvalid {
                    length,
                    min: 0,
                    max,
                });
            }
        }

        self.take(length).map(|bytes| bytes.to_vec())
    }

    /// Returns the type prefix in front of the next object without consuming it.
    ///
    /// Objects without a type denotation report the prefix `0`.
    pub fn peek_type_prefix(&self, denotation: TypeDenotation) -> Result<u32, SerializationError> {
        if denotation == TypeDenotation::None {
            return Ok(0);
        }

        self.ensure_remaining(denotation.size())?;
        Ok(denotation.prefix_of(self.remaining).unwrap_or_default())
    }

    /// Consumes the type prefix and checks that it matches `expected`.
    pub fn check_type_prefix(
        &mut self,
        denotation: TypeDenotation,
        expected: u32,
    ) -> Result<(), SerializationError> {
        let actual = self.peek_type_prefix(denotation)?;
        if actual != expected {
            return Err(SerializationError::TypeMismatch { expected, actual });
        }

        self.skip(denotation.size())
    }

    /// Reads an object whose type is known from the context.
    pub fn read_serializable<T: Serializable>(
        &mut self,
        mode: DeSerializationMode,
    ) -> Result<T, SerializationError> {
        self.ensure_remaining(T::MIN_SIZE)?;
        T::read(self, mode)
    }

    /// Reads a polymorphic object, dispatching on its type prefix through the guard.
    pub fn read_object<T: Polymorphic>(
        &mut self,
        mode: DeSerializationMode,
        guard: &Guard<T::Kind>,
    ) -> Result<T, SerializationError> {
        let prefix = self.peek_type_prefix(T::DENOTATION)?;
        let kind = guard.select(prefix)?;
        self.ensure_remaining(T::MIN_SIZE)?;
        T::read_kind(kind, self, mode)
    }

    /// Reads a count-prefixed collection of polymorphic objects.
    ///
    /// With validation, the count is checked against the rules before any element is decoded and
    /// every element's encoded bytes are streamed through the rules' element validator.
    pub fn read_objects<T: Polymorphic>(
        &mut self,
        mode: DeSerializationMode,
        len_type: LengthPrefixType,
        guard: &Guard<T::Kind>,
        rules: &ArrayRules,
    ) -> Result<Vec<T>, SerializationError> {
        self.read_collection(mode, len_type, rules, T::DENOTATION, |cursor| {
            cursor.read_object::<T>(mode, guard)
        })
    }

    /// Reads a count-prefixed collection of objects whose type is known from the context.
    pub fn read_sequence<T: Serializable>(
        &mut self,
        mode: DeSerializationMode,
        len_type: LengthPrefixType,
        rules: &ArrayRules,
    ) -> Result<Vec<T>, SerializationError> {
        self.read_collection(mode, len_type, rules, TypeDenotation::None, |cursor| {
            cursor.read_serializable::<T>(mode)
        })
    }

    /// Reads a count-prefixed collection of fixed-size byte arrays.
    pub fn read_fixed_arrays<const N: usize>(
        &mut self,
        mode: DeSerializationMode,
        len_type: LengthPrefixType,
        rules: &ArrayRules,
    ) -> Result<Vec<[u8; N]>, SerializationError> {
        self.read_collection(mode, len_type, rules, TypeDenotation::None, |cursor| {
            cursor.read_array::<N>()
        })
    }

    fn read_collection<T, F>(
        &mut self,
        mode: DeSerializationMode,
        len_type: LengthPrefixType,
        rules: &ArrayRules,
        denotation: TypeDenotation,
        mut read_element: F,
    ) -> Result<Vec<T>, SerializationError>
    where
        F: FnMut(&mut Self) -> Result<T, SerializationError>,
    {
        let count = self.read_length(len_type)?;

        let mut validator = if mode.validates() {
            rules.check_bounds(count)?;
            Some(rules.element_validator(denotation))
        } else {
            None
        };

        // The count is untrusted, don't let it decide the allocation alone
        let mut elements = Vec::with_capacity(count.min(self.remaining.len()));
        for index in 0..count {
            let before = self.remaining;
            let element = read_element(self)?;
            let consumed = before.len() - self.remaining.len();

            if let Some(validator) = validator.as_mut() {
                validator.validate(index, &before[..consumed])?;
            }

            elements.push(element);
        }

        if let Some(validator) = validator {
            validator.finish()?;
        }

        Ok(elements)
    }

    /// Reads an optional payload prefixed by its total length in bytes.
    ///
    /// A length of `0` denotes an absent payload. Otherwise the payload decoder must consume
    /// exactly the denoted number of bytes, so that a faulty nested decoder can never shift the
    /// fields following the payload.
    pub fn read_payload<T: Polymorphic>(
        &mut self,
        mode: DeSerializationMode,
        guard: &Guard<T::Kind>,
    ) -> Result<Option<T>, SerializationError> {
        let declared = self.read_num::<u32>()? as usize;
        if declared == 0 {
            return Ok(None);
        }

        self.ensure_remaining(declared.max(T::DENOTATION.size()))?;

        let before = self.remaining.len();
        let payload = self.read_object::<T>(mode, guard)?;
        let consumed = before - self.remaining.len();

        if consumed != declared {
            return Err(SerializationError::InvalidBytes { declared, consumed });
        }

        trace!(
            "read {} payload of type {} ({} bytes)",
            <T::Kind as TypeKind>::CATEGORY,
            payload.kind().prefix(),
            consumed
        );

        Ok(Some(payload))
    }

    /// Fails with [`SerializationError::NotAllConsumed`] if any bytes remain.
    pub fn consumed_all(&self) -> Result<(), SerializationError> {
        if !self.remaining.is_empty() {
            return Err(SerializationError::NotAllConsumed(self.remaining.len()));
        }

        Ok(())
    }

    /// Finishes decoding, returning the number of consumed bytes.
    pub fn done(self) -> usize {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::ByteCursor;
    use crate::serializer::{
        ArrayRules, ArrayValidationMode, ByteWriter, DeSerializationMode, Guard, LengthPrefixType,
        Polymorphic, Serializable, SerializationError, TypeDenotation, TypeKind,
    };

    const VALIDATE: DeSerializationMode = DeSerializationMode::PERFORM_VALIDATION;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum ProbeKind {
        Short,
        Greedy,
    }

    impl TypeKind for ProbeKind {
        const CATEGORY: &'static str = "probe";
        const ALL: &'static [Self] = &[ProbeKind::Short, ProbeKind::Greedy];

        fn prefix(self) -> u32 {
            match self {
                ProbeKind::Short => 1,
                ProbeKind::Greedy => 2,
            }
        }
    }

    const SHORT_ONLY: Guard<ProbeKind> = Guard::new("short probe", &[ProbeKind::Short]);

    /// Object consisting of its type prefix only. The greedy kind swallows two more bytes on
    /// decode than it ever writes.
    #[derive(Debug, PartialEq)]
    struct Probe(ProbeKind);

    impl Serializable for Probe {
        const MIN_SIZE: usize = 4;

        fn size(&self) -> usize {
            4
        }

        fn write(
            &self,
            writer: &mut ByteWriter,
            _mode: DeSerializationMode,
        ) -> Result<(), SerializationError> {
            writer.write_num(self.0.prefix());
            Ok(())
        }

        fn read(
            cursor: &mut ByteCursor<'_>,
            mode: DeSerializationMode,
        ) -> Result<Self, SerializationError> {
            cursor.read_object(mode, &Guard::all("probe"))
        }
    }

    impl Polymorphic for Probe {
        type Kind = ProbeKind;
        const DENOTATION: TypeDenotation = TypeDenotation::Uint32;

        fn kind(&self) -> ProbeKind {
            self.0
        }

        fn read_kind(
            kind: ProbeKind,
            cursor: &mut ByteCursor<'_>,
            _mode: DeSerializationMode,
        ) -> Result<Self, SerializationError> {
            cursor.check_type_prefix(TypeDenotation::Uint32, kind.prefix())?;
            if kind == ProbeKind::Greedy {
                cursor.skip(2)?;
            }
            Ok(Probe(kind))
        }
    }

    #[test]
    fn absent_payload() {
        let data = [0, 0, 0, 0];
        let mut cursor = ByteCursor::new(&data);
        let payload = cursor
            .read_payload::<Probe>(VALIDATE, &Guard::all("probe"))
            .unwrap();
        assert_eq!(payload, None);
        assert_eq!(cursor.done(), 4);
    }

    #[test]
    fn present_payload() {
        let data = [4, 0, 0, 0, 1, 0, 0, 0];
        let mut cursor = ByteCursor::new(&data);
        let payload = cursor.read_payload::<Probe>(VALIDATE, &SHORT_ONLY).unwrap();
        assert_eq!(payload, Some(Probe(ProbeKind::Short)));
        assert!(cursor.consumed_all().is_ok());
    }

    #[rstest]
    #[case::over_read(vec![4, 0, 0, 0, 2, 0, 0, 0, 9, 9], 4, 6)]
    #[case::under_read(vec![6, 0, 0, 0, 1, 0, 0, 0, 9, 9], 6, 4)]
    fn payload_length_double_check(
        #[case] data: Vec<u8>,
        #[case] declared: usize,
        #[case] consumed: usize,
    ) {
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(
            cursor.read_payload::<Probe>(VALIDATE, &Guard::all("probe")),
            Err(SerializationError::InvalidBytes { declared, consumed })
        );
    }

    #[test]
    fn payload_longer_than_buffer() {
        let data = [8, 0, 0, 0, 1, 0, 0, 0];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(
            cursor.read_payload::<Probe>(VALIDATE, &SHORT_ONLY),
            Err(SerializationError::NotEnoughData {
                required: 8,
                remaining: 4
            })
        );
    }

    #[test]
    fn objects_dispatch_through_guard() {
        let data = [1, 2, 0, 0, 0, 9, 9];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(
            cursor.read_objects::<Probe>(
                DeSerializationMode::NO_VALIDATION,
                LengthPrefixType::Byte,
                &SHORT_ONLY,
                &ArrayRules::unbounded(),
            ),
            Err(SerializationError::UnsupportedType {
                context: "short probe",
                prefix: 2
            })
        );

        let data = [1, 7, 0, 0, 0];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(
            cursor.read_objects::<Probe>(
                DeSerializationMode::NO_VALIDATION,
                LengthPrefixType::Byte,
                &SHORT_ONLY,
                &ArrayRules::unbounded(),
            ),
            Err(SerializationError::UnknownType {
                context: "probe",
                prefix: 7
            })
        );
    }

    #[test]
    fn objects_validated_over_encoded_bytes() {
        let rules =
            ArrayRules::new(1, 2).with_mode(ArrayValidationMode::AT_MOST_ONE_OF_EACH_TYPE);
        let data = [2, 1, 0, 0, 0, 1, 0, 0, 0];

        let mut cursor = ByteCursor::new(&data);
        assert_eq!(
            cursor.read_objects::<Probe>(VALIDATE, LengthPrefixType::Byte, &SHORT_ONLY, &rules),
            Err(SerializationError::ViolatesTypeUniqueness {
                index: 1,
                previous: 0,
                prefix: 1
            })
        );

        let mut cursor = ByteCursor::new(&data);
        let objects = cursor
            .read_objects::<Probe>(
                DeSerializationMode::NO_VALIDATION,
                LengthPrefixType::Byte,
                &SHORT_ONLY,
                &rules,
            )
            .unwrap();
        assert_eq!(objects.len(), 2);
        assert!(cursor.consumed_all().is_ok());
    }

    #[test]
    fn min_size_checked_before_decoding() {
        let data = [1, 0];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(
            cursor.read_serializable::<Probe>(DeSerializationMode::NO_VALIDATION),
            Err(SerializationError::NotEnoughData {
                required: 4,
                remaining: 2
            })
        );
    }

    #[test]
    fn read_numbers() {
        let data = [1, 2, 0, 3, 0, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0];
        let mut cursor = ByteCursor::new(&data);

        assert_eq!(cursor.read_num::<u8>().unwrap(), 1);
        assert_eq!(cursor.read_num::<u16>().unwrap(), 2);
        assert_eq!(cursor.read_num::<u32>().unwrap(), 3);
        assert_eq!(cursor.read_num::<u64>().unwrap(), 4);
        assert!(cursor.consumed_all().is_ok());
        assert_eq!(cursor.done(), data.len());
    }

    #[rstest]
    #[case::u16(vec![1])]
    #[case::empty(vec![])]
    fn numbers_need_full_width(#[case] data: Vec<u8>) {
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(
            cursor.read_num::<u16>(),
            Err(SerializationError::NotEnoughData {
                required: 2,
                remaining: data.len()
            })
        );
    }

    #[test]
    fn skip_and_arrays() {
        let data = [9, 9, 1, 2, 3];
        let mut cursor = ByteCursor::new(&data);

        cursor.skip(2).unwrap();
        assert_eq!(cursor.read_array::<3>().unwrap(), [1, 2, 3]);
        assert!(cursor.skip(1).is_err());
    }

    #[rstest]
    #[case::byte(LengthPrefixType::Byte, vec![2, 7, 8])]
    #[case::uint16(LengthPrefixType::Uint16, vec![2, 0, 7, 8])]
    #[case::uint32(LengthPrefixType::Uint32, vec![2, 0, 0, 0, 7, 8])]
    fn variable_bytes(#[case] len_type: LengthPrefixType, #[case] data: Vec<u8>) {
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(
            cursor.read_variable_bytes(len_type, None).unwrap(),
            vec![7, 8]
        );
        assert!(cursor.consumed_all().is_ok());
    }

    #[test]
    fn variable_bytes_respect_max_and_available_data() {
        let data = [3, 1, 2, 3];

        let mut cursor = ByteCursor::new(&data);
        assert_eq!(
            cursor.read_variable_bytes(LengthPrefixType::Byte, Some(2)),
            Err(SerializationError::LengthInvalid {
                length: 3,
                min: 0,
                max: 2
            })
        );

        let mut cursor = ByteCursor::new(&data[..3]);
        assert!(matches!(
            cursor.read_variable_bytes(LengthPrefixType::Byte, None),
            Err(SerializationError::NotEnoughData { .. })
        ));
    }

    #[test]
    fn type_prefix() {
        let data = [6, 0, 0, 0, 1];
        let mut cursor = ByteCursor::new(&data);

        assert_eq!(cursor.peek_type_prefix(TypeDenotation::Uint32).unwrap(), 6);
        assert_eq!(cursor.peek_type_prefix(TypeDenotation::Byte).unwrap(), 6);
        assert_eq!(
            cursor.check_type_prefix(TypeDenotation::Uint32, 5),
            Err(SerializationError::TypeMismatch {
                expected: 5,
                actual: 6
            })
        );
        cursor.check_type_prefix(TypeDenotation::Uint32, 6).unwrap();
        assert_eq!(cursor.offset(), 4);
    }

    #[test]
    fn fixed_arrays_validated_only_on_request() {
        let rules = ArrayRules::new(1, 3)
            .with_mode(ArrayValidationMode::LEXICAL_ORDERING | ArrayValidationMode::NO_DUPLICATES);
        let data = [2, 5, 5, 1, 1];

        let mut cursor = ByteCursor::new(&data);
        assert_eq!(
            cursor.read_fixed_arrays::<2>(VALIDATE, LengthPrefixType::Byte, &rules),
            Err(SerializationError::OrderViolatesLexicalOrder {
                index: 1,
                previous: 0
            })
        );

        let mut cursor = ByteCursor::new(&data);
        let arrays = cursor
            .read_fixed_arrays::<2>(
                DeSerializationMode::NO_VALIDATION,
                LengthPrefixType::Byte,
                &rules,
            )
            .unwrap();
        assert_eq!(arrays, vec![[5, 5], [1, 1]]);
    }

    #[test]
    fn fixed_arrays_bounds_checked_before_elements() {
        let rules = ArrayRules::new(1, 1);
        let data = [2, 5, 5];

        let mut cursor = ByteCursor::new(&data);
        assert_eq!(
            cursor.read_fixed_arrays::<2>(VALIDATE, LengthPrefixType::Byte, &rules),
            Err(SerializationError::MaxElementsExceeded { max: 1, count: 2 })
        );
    }

    #[test]
    fn consumed_all_reports_leftover() {
        let data = [1, 2, 3];
        let mut cursor = ByteCursor::new(&data);
        cursor.skip(1).unwrap();
        assert_eq!(
            cursor.consumed_all(),
            Err(SerializationError::NotAllConsumed(2))
        );
    }
}
