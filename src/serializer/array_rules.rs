// SPDX-License-Identifier: AGPL-3.0-or-later

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::ops::BitOr;

use log::debug;

use crate::serializer::{Serializable, SerializationError, TypeDenotation};

/// Selects the part of an encoded element which is relevant for uniqueness and ordering checks.
pub type UniquenessSliceFn = fn(&[u8]) -> &[u8];

/// Element-level checks applied to a collection.
///
/// Modes are flags and can be combined with `|`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ArrayValidationMode(u8);

impl ArrayValidationMode {
    /// No element-level checks.
    pub const NONE: Self = Self(0);

    /// Encoded elements must be unique.
    pub const NO_DUPLICATES: Self = Self(1 << 0);

    /// Encoded elements must be in ascending lexical order.
    pub const LEXICAL_ORDERING: Self = Self(1 << 1);

    /// Every type prefix may occur at most once.
    pub const AT_MOST_ONE_OF_EACH_TYPE: Self = Self(1 << 2);

    /// Returns true if all flags of `mode` are set.
    pub const fn has_mode(&self, mode: Self) -> bool {
        mode.0 != 0 && self.0 & mode.0 == mode.0
    }

    /// Combines two modes, usable in constant contexts.
    pub const fn with(self, mode: Self) -> Self {
        Self(self.0 | mode.0)
    }
}

impl BitOr for ArrayValidationMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.with(rhs)
    }
}

impl fmt::Debug for ArrayValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags: Vec<&str> = [
            (Self::NO_DUPLICATES, "NO_DUPLICATES"),
            (Self::LEXICAL_ORDERING, "LEXICAL_ORDERING"),
            (Self::AT_MOST_ONE_OF_EACH_TYPE, "AT_MOST_ONE_OF_EACH_TYPE"),
        ]
        .iter()
        .filter(|(mode, _)| self.has_mode(*mode))
        .map(|(_, name)| *name)
        .collect();

        if flags.is_empty() {
            write!(f, "ArrayValidationMode(NONE)")
        } else {
            write!(f, "ArrayValidationMode({})", flags.join(" | "))
        }
    }
}

/// Constraints on a collection: element count bounds plus element-level checks.
///
/// A bound of `0` leaves that side unbounded. Rules are usually declared as constants next to the
/// type holding the collection.
#[derive(Clone, Copy)]
pub struct ArrayRules {
    /// Minimum element count.
    pub min: usize,

    /// Maximum element count.
    pub max: usize,

    /// Element-level checks.
    pub mode: ArrayValidationMode,

    /// Type prefixes which need to occur at least once.
    pub must_occur: &'static [u32],

    /// Part of each element uniqueness and ordering are decided on, defaults to all bytes.
    pub uniqueness_slice: Option<UniquenessSliceFn>,
}

impl ArrayRules {
    /// Rules with the given bounds and no element-level checks.
    pub const fn new(min: usize, max: usize) -> Self {
        Self {
            min,
            max,
            mode: ArrayValidationMode::NONE,
            must_occur: &[],
            uniqueness_slice: None,
        }
    }

    /// Rules without any constraint.
    pub const fn unbounded() -> Self {
        Self::new(0, 0)
    }

    /// Sets the element-level checks.
    pub const fn with_mode(mut self, mode: ArrayValidationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the type prefixes which need to occur at least once.
    pub const fn with_must_occur(mut self, must_occur: &'static [u32]) -> Self {
        self.must_occur = must_occur;
        self
    }

    /// Sets the part of each element uniqueness and ordering are decided on.
    pub const fn with_uniqueness_slice(mut self, slice: UniquenessSliceFn) -> Self {
        self.uniqueness_slice = Some(slice);
        self
    }

    /// Checks the element count against the bounds.
    pub fn check_bounds(&self, count: usize) -> Result<(), SerializationError> {
        if self.min != 0 && count < self.min {
            return Err(SerializationError::MinElementsNotReached {
                min: self.min,
                count,
            });
        }

        if self.max != 0 && count > self.max {
            return Err(SerializationError::MaxElementsExceeded {
                max: self.max,
                count,
            });
        }

        Ok(())
    }

    /// Returns a validator to stream the encoded elements of one collection through.
    ///
    /// The denotation tells the validator where to find the type prefix of each element.
    pub fn element_validator(&self, denotation: TypeDenotation) -> ElementValidator<'_> {
        ElementValidator {
            rules: self,
            denotation,
            previous: None,
            seen: HashMap::new(),
            seen_types: HashMap::new(),
        }
    }

    /// Sorts encoded elements into lexical order of their uniqueness slice and removes exact
    /// duplicates if the rules forbid them.
    ///
    /// Does nothing when the rules don't ask for lexical ordering.
    pub fn canonicalize<T, F>(&self, elements: &mut Vec<T>, bytes_of: F)
    where
        F: Fn(&T) -> &[u8],
    {
        if !self.mode.has_mode(ArrayValidationMode::LEXICAL_ORDERING) {
            return;
        }

        let slice = self.slice_fn();
        elements.sort_by(|a, b| {
            let (a, b) = (bytes_of(a), bytes_of(b));
            slice(a).cmp(slice(b)).then_with(|| a.cmp(b))
        });

        if self.mode.has_mode(ArrayValidationMode::NO_DUPLICATES) {
            elements.dedup_by(|a, b| bytes_of(a) == bytes_of(b));
        }
    }

    /// Encoded size of the elements of a collection in canonical form.
    ///
    /// Canonical ordering drops exact duplicates when the rules forbid them, those are only
    /// counted once.
    pub fn canonical_size<T: Serializable + PartialEq>(&self, elements: &[T]) -> usize {
        let drops_duplicates = self.mode.has_mode(ArrayValidationMode::LEXICAL_ORDERING)
            && self.mode.has_mode(ArrayValidationMode::NO_DUPLICATES);

        elements
            .iter()
            .enumerate()
            .filter(|(index, element)| !drops_duplicates || !elements[..*index].contains(*element))
            .map(|(_, element)| element.size())
            .sum()
    }

        fn slice_fn(&self) -> UniquenessSliceFn {
        self.uniqueness_slice.unwrap_or(whole)
    }
}

impl fmt::Debug for ArrayRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayRules")
            .field("min", &self.min)
            .field("max", &self.max)
            .field("mode", &self.mode)
            .field("must_occur", &self.must_occur)
            .field("uniqueness_slice", &self.uniqueness_slice.is_some())
            .finish()
    }
}

fn whole(bytes: &[u8]) -> &[u8] {
    bytes
}

/// Stateful checker for the elements of one collection, created by
/// [`ArrayRules::element_validator`].
#[derive(Debug)]
pub struct ElementValidator<'a> {
    rules: &'a ArrayRules,
    denotation: TypeDenotation,
    previous: Option<(Vec<u8>, usize)>,
    seen: HashMap<Vec<u8>, usize>,
    seen_types: HashMap<u32, usize>,
}

impl ElementValidator<'_> {
    /// Checks the encoded bytes of the element at `index` against all configured rules.
    pub fn validate(&mut self, index: usize, element: &[u8]) -> Result<(), SerializationError> {
        let result = self.validate_inner(index, element);
        if let Err(err) = &result {
            debug!("array element {index} rejected: {err}");
        }
        result
    }

    fn validate_inner(&mut self, index: usize, element: &[u8]) -> Result<(), SerializationError> {
        let mode = self.rules.mode;
        let key = (self.rules.slice_fn())(element);

        let no_duplicates = mode.has_mode(ArrayValidationMode::NO_DUPLICATES);
        let lexical_ordering = mode.has_mode(ArrayValidationMode::LEXICAL_ORDERING);

        if lexical_ordering {
            if let Some((previous, previous_index)) = &self.previous {
                match previous.as_slice().cmp(key) {
                    Ordering::Greater => {
                        return Err(SerializationError::OrderViolatesLexicalOrder {
                            index,
                            previous: *previous_index,
                        });
                    }
                    // With ascending order any duplicate sits right next to its twin
                    Ordering::Equal if no_duplicates => {
                        return Err(SerializationError::ViolatesUniqueness {
                            index,
                            previous: *previous_index,
                        });
                    }
                    _ => (),
                }
            }
            self.previous = Some((key.to_vec(), index));
        } else if no_duplicates {
            if let Some(previous) = self.seen.get(key) {
                return Err(SerializationError::ViolatesUniqueness {
                    index,
                    previous: *previous,
                });
            }
            self.seen.insert(key.to_vec(), index);
        }

        let track_types = mode.has_mode(ArrayValidationMode::AT_MOST_ONE_OF_EACH_TYPE)
            || !self.rules.must_occur.is_empty();

        if track_types {
            if let Some(prefix) = self.denotation.prefix_of(element) {
                match self.seen_types.get(&prefix) {
                    Some(previous)
                        if mode.has_mode(ArrayValidationMode::AT_MOST_ONE_OF_EACH_TYPE) =>
                    {
                        return Err(SerializationError::ViolatesTypeUniqueness {
                            index,
                            previous: *previous,
                            prefix,
                        });
                    }
                    Some(_) => (),
                    None => {
                        self.seen_types.insert(prefix, index);
                    }
                }
            }
        }

        Ok(())
    }

    /// Checks the rules which can only be decided after the last element.
    pub fn finish(self) -> Result<(), SerializationError> {
        for prefix in self.rules.must_occur {
            if !self.seen_types.contains_key(prefix) {
                return Err(SerializationError::MustOccurMissing { prefix: *prefix });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{ArrayRules, ArrayValidationMode};
    use crate::identifier::BlockId;
    use crate::serializer::{Serializable, SerializationError, TypeDenotation};

    const BOUNDED: ArrayRules = ArrayRules::new(2, 4);

    #[rstest]
    #[case::at_min(2, None)]
    #[case::at_max(4, None)]
    #[case::below_min(1, Some(SerializationError::MinElementsNotReached { min: 2, count: 1 }))]
    #[case::above_max(5, Some(SerializationError::MaxElementsExceeded { max: 4, count: 5 }))]
    fn bounds(#[case] count: usize, #[case] expected: Option<SerializationError>) {
        assert_eq!(BOUNDED.check_bounds(count).err(), expected);
    }

    #[rstest]
    #[case::unbounded_max(ArrayRules::new(1, 0), 10_000, true)]
    #[case::unbounded_min(ArrayRules::new(0, 3), 0, true)]
    #[case::fully_unbounded(ArrayRules::unbounded(), 0, true)]
    #[case::zero_below_min(ArrayRules::new(1, 0), 0, false)]
    fn zero_means_unbounded(#[case] rules: ArrayRules, #[case] count: usize, #[case] ok: bool) {
        assert_eq!(rules.check_bounds(count).is_ok(), ok);
    }

    #[test]
    fn duplicates_name_both_indices() {
        let rules = ArrayRules::unbounded().with_mode(ArrayValidationMode::NO_DUPLICATES);
        let mut validator = rules.element_validator(TypeDenotation::None);

        validator.validate(0, &[3, 3]).unwrap();
        validator.validate(1, &[1, 1]).unwrap();
        assert_eq!(
            validator.validate(2, &[3, 3]),
            Err(SerializationError::ViolatesUniqueness {
                index: 2,
                previous: 0
            })
        );
    }

    #[test]
    fn lexical_order_accepts_equal_without_dedup() {
        let rules = ArrayRules::unbounded().with_mode(ArrayValidationMode::LEXICAL_ORDERING);
        let mut validator = rules.element_validator(TypeDenotation::None);

        validator.validate(0, &[1, 2]).unwrap();
        validator.validate(1, &[1, 2]).unwrap();
        validator.validate(2, &[1, 3]).unwrap();
        assert_eq!(
            validator.validate(3, &[0, 9]),
            Err(SerializationError::OrderViolatesLexicalOrder {
                index: 3,
                previous: 2
            })
        );
    }

    #[test]
    fn lexical_order_with_dedup() {
        let rules = ArrayRules::unbounded()
            .with_mode(ArrayValidationMode::LEXICAL_ORDERING | ArrayValidationMode::NO_DUPLICATES);
        let mut validator = rules.element_validator(TypeDenotation::None);

        validator.validate(0, &[1, 2]).unwrap();
        assert_eq!(
            validator.validate(1, &[1, 2]),
            Err(SerializationError::ViolatesUniqueness {
                index: 1,
                previous: 0
            })
        );
    }

    #[test]
    fn uniqueness_slice_decides_on_prefix() {
        let rules = ArrayRules::unbounded()
            .with_mode(ArrayValidationMode::LEXICAL_ORDERING | ArrayValidationMode::NO_DUPLICATES)
            .with_uniqueness_slice(|bytes| &bytes[..1]);
        let mut validator = rules.element_validator(TypeDenotation::None);

        validator.validate(0, &[1, 9]).unwrap();
        validator.validate(1, &[2, 0]).unwrap();

        // Differs in the tail but shares the identifying first byte
        assert_eq!(
            validator.validate(2, &[2, 5]),
            Err(SerializationError::ViolatesUniqueness {
                index: 2,
                previous: 1
            })
        );
    }

    #[test]
    fn at_most_one_of_each_type() {
        let rules =
            ArrayRules::unbounded().with_mode(ArrayValidationMode::AT_MOST_ONE_OF_EACH_TYPE);
        let mut validator = rules.element_validator(TypeDenotation::Byte);

        validator.validate(0, &[0, 1]).unwrap();
        validator.validate(1, &[2, 1]).unwrap();
        assert_eq!(
            validator.validate(2, &[0, 7]),
            Err(SerializationError::ViolatesTypeUniqueness {
                index: 2,
                previous: 0,
                prefix: 0
            })
        );
    }

    #[test]
    fn must_occur() {
        let rules = ArrayRules::unbounded().with_must_occur(&[0, 2]);

        let mut validator = rules.element_validator(TypeDenotation::Byte);
        validator.validate(0, &[2, 1]).unwrap();
        validator.validate(1, &[2, 1]).unwrap();
        assert_eq!(
            validator.finish(),
            Err(SerializationError::MustOccurMissing { prefix: 0 })
        );

        let mut validator = rules.element_validator(TypeDenotation::Byte);
        validator.validate(0, &[0]).unwrap();
        validator.validate(1, &[2]).unwrap();
        assert!(validator.finish().is_ok());
    }

    #[test]
    fn type_checks_without_denotation() {
        // Every element of an undenoted collection counts as type 0
        let rules = ArrayRules::unbounded().with_must_occur(&[0]);
        let mut validator = rules.element_validator(TypeDenotation::None);
        validator.validate(0, &[7, 7]).unwrap();
        assert!(validator.finish().is_ok());

        let validator = rules.element_validator(TypeDenotation::None);
        assert_eq!(
            validator.finish(),
            Err(SerializationError::MustOccurMissing { prefix: 0 })
        );

        let rules =
            ArrayRules::unbounded().with_mode(ArrayValidationMode::AT_MOST_ONE_OF_EACH_TYPE);
        let mut validator = rules.element_validator(TypeDenotation::None);
        validator.validate(0, &[1]).unwrap();
        assert_eq!(
            validator.validate(1, &[2]),
            Err(SerializationError::ViolatesTypeUniqueness {
                index: 1,
                previous: 0,
                prefix: 0
            })
        );
    }

    #[test]
    fn canonical_size_counts_duplicates_once() {
        let ids = [
            BlockId::from_bytes([2; 32]),
            BlockId::from_bytes([1; 32]),
            BlockId::from_bytes([2; 32]),
        ];

        let rules = ArrayRules::unbounded()
            .with_mode(ArrayValidationMode::LEXICAL_ORDERING | ArrayValidationMode::NO_DUPLICATES);
        assert_eq!(rules.canonical_size(&ids), 2 * ids[0].size());

        // Only canonical ordering removes duplicates
        let rules = ArrayRules::unbounded().with_mode(ArrayValidationMode::NO_DUPLICATES);
        assert_eq!(rules.canonical_size(&ids), 3 * ids[0].size());
    }

    #[test]
    fn canonicalize_sorts_and_dedups() {
        let rules = ArrayRules::unbounded()
            .with_mode(ArrayValidationMode::LEXICAL_ORDERING | ArrayValidationMode::NO_DUPLICATES);
        let mut elements = vec![vec![3u8], vec![1], vec![3], vec![2]];
        rules.canonicalize(&mut elements, |element| element.as_slice());
        assert_eq!(elements, vec![vec![1], vec![2], vec![3]]);

        // Without lexical ordering the order is semantic and stays untouched
        let rules = ArrayRules::unbounded().with_mode(ArrayValidationMode::NO_DUPLICATES);
        let mut elements = vec![vec![3u8], vec![1], vec![3]];
        rules.canonicalize(&mut elements, |element| element.as_slice());
        assert_eq!(elements, vec![vec![3], vec![1], vec![3]]);
    }
}
