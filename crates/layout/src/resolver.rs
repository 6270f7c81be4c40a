//! Path resolution.
//!
//! Folds an access path into a concrete `(slot, offset, width)` location,
//! one segment at a time:
//!
//! ```text
//! struct field    slot + field.slot_delta, offset = field.offset
//! mapping key     H(pad32(key) ++ pad32(slot))
//! fixed array     slot + element delta (packed or whole-slot)
//! dynamic array   H(pad32(slot)) + element delta
//! ```
//!
//! Indices are never range-checked here; lengths are a value-level concern.

use crate::allocator::TypeLayout;
use crate::codec::encode_key;
use crate::error::{LayoutError, Result};
use serde::Serialize;
use slotscope_core::{PathSegment, Slot, SlotHasher, U256};
use std::fmt;
use tracing::trace;

/// A fully resolved storage location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    pub slot: Slot,
    /// Byte offset counted from the low-order end of the word.
    pub offset: u8,
    pub width: u8,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "slot {:#x} offset {} width {}",
            self.slot, self.offset, self.width
        )
    }
}

/// A location together with the layout of the type found there.
#[derive(Debug, Clone, Copy)]
pub struct Resolved<'a> {
    pub location: Location,
    pub layout: &'a TypeLayout,
}

impl<'a> Resolved<'a> {
    /// The root of a variable at `slot`.
    pub fn root(slot: Slot, offset: u8, layout: &'a TypeLayout) -> Self {
        Self {
            location: Location {
                slot,
                offset,
                width: layout.width(),
            },
            layout,
        }
    }
}

/// Resolve `path` against a variable of type `layout` rooted at `base`.
///
/// An empty path resolves to the variable itself.
pub fn resolve<'a, H: SlotHasher + ?Sized>(
    hasher: &H,
    base: Resolved<'a>,
    path: &[PathSegment],
) -> Result<Resolved<'a>> {
    let mut current = base;
    for (depth, segment) in path.iter().enumerate() {
        current = step(hasher, current, segment, depth, path.len() - depth)?;
    }
    Ok(current)
}

/// Apply a single segment.
pub(crate) fn step<'a, H: SlotHasher + ?Sized>(
    hasher: &H,
    current: Resolved<'a>,
    segment: &PathSegment,
    depth: usize,
    remaining: usize,
) -> Result<Resolved<'a>> {
    let slot = current.location.slot;

    let next = match (current.layout, segment) {
        (TypeLayout::Struct(s), PathSegment::Field(name)) => {
            let field = s.field(name).ok_or_else(|| LayoutError::UnknownField {
                ty: s.name.clone(),
                field: name.clone(),
            })?;
            Resolved::root(
                slot.wrapping_add(U256::from(field.slot)),
                field.offset,
                &field.layout,
            )
        }
        (TypeLayout::Mapping { key, value }, PathSegment::Key(k)) => {
            let encoded = encode_key(key, k).map_err(|err| match err {
                LayoutError::ValueTypeMismatch { expected, found } => {
                    LayoutError::PathTypeMismatch {
                        depth,
                        expected: format!("{} key", expected),
                        found: format!("{} key", found),
                    }
                }
                other => other,
            })?;
            Resolved::root(hasher.hash_key(&encoded, &slot), 0, value)
        }
        (TypeLayout::FixedArray { element, .. }, PathSegment::Index(i)) => {
            let (delta, offset) = element_position(element, *i);
            Resolved::root(slot.wrapping_add(delta), offset, element)
        }
        (TypeLayout::DynamicArray { element }, PathSegment::Index(i)) => {
            let (delta, offset) = element_position(element, *i);
            Resolved::root(hasher.hash_slot(&slot).wrapping_add(delta), offset, element)
        }
        (layout @ (TypeLayout::Scalar { .. } | TypeLayout::String | TypeLayout::Bytes), _) => {
            return Err(LayoutError::PathTooLong {
                remaining,
                ty: layout.kind_name().to_string(),
            })
        }
        (layout, segment) => {
            return Err(LayoutError::PathTypeMismatch {
                depth,
                expected: layout.kind_name().to_string(),
                found: segment.kind_name().to_string(),
            })
        }
    };

    trace!(
        depth,
        %segment,
        slot = %next.location.slot,
        offset = next.location.offset,
        "resolved segment"
    );
    Ok(next)
}

/// Slot delta and byte offset of element `index` relative to an array's
/// first element slot.
///
/// Value-type elements pack `32 / width` per slot; every other element
/// occupies `slot_count` whole slots. Arithmetic wraps modulo 2^256.
pub fn element_position(element: &TypeLayout, index: U256) -> (U256, u8) {
    match element.packed_width() {
        Some(width) => {
            let per_slot = U256::from(32 / width);
            let delta = index / per_slot;
            let within = (index % per_slot).to::<u64>() as u8;
            (delta, within * width)
        }
        None => (index.wrapping_mul(U256::from(element.slot_count())), 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::allocate;
    use slotscope_core::{
        pad32, AccessPath, Address, Declaration, Field, Keccak256, TypeDescriptor as T, Value,
    };

    fn root<'a>(decl: &'a crate::SlotAssignment, name: &str) -> Resolved<'a> {
        let p = decl.get(name).unwrap();
        Resolved::root(U256::from(p.slot), p.offset, &p.layout)
    }

    #[test]
    fn test_empty_path_is_variable() {
        let decl = Declaration::new().with("a", T::Bool).with("b", T::Uint(16));
        let assignment = allocate(&decl).unwrap();
        let r = resolve(&Keccak256, root(&assignment, "b"), &[]).unwrap();
        assert_eq!(
            r.location,
            Location {
                slot: U256::ZERO,
                offset: 1,
                width: 16
            }
        );
    }

    #[test]
    fn test_mapping_key_hashes_padded_key_and_slot() {
        let decl = Declaration::new()
            .with("x", T::uint256())
            .with("balances", T::mapping(T::Address, T::uint256()));
        let assignment = allocate(&decl).unwrap();

        let key = Address::repeat_byte(0x11);
        let path = AccessPath::new().key(key);
        let r = resolve(&Keccak256, root(&assignment, "balances"), path.segments()).unwrap();

        let mut preimage = pad32(key.as_slice()).to_vec();
        preimage.extend_from_slice(&pad32(&[1]));
        let expected = U256::from_be_bytes(Keccak256.hash(&preimage).0);
        assert_eq!(r.location.slot, expected);
        assert_eq!(r.location.width, 32);
    }

    #[test]
    fn test_packed_fixed_array_index() {
        let decl = Declaration::new()
            .with("a", T::uint256())
            .with("small", T::fixed_array(T::Uint(8), 10));
        let assignment = allocate(&decl).unwrap();
        let path = AccessPath::new().index(5);
        let r = resolve(&Keccak256, root(&assignment, "small"), path.segments()).unwrap();
        // 4 per slot: index 5 is the second element of the second slot
        assert_eq!(r.location.slot, U256::from(2));
        assert_eq!(r.location.offset, 8);
        assert_eq!(r.location.width, 8);
    }

    #[test]
    fn test_dynamic_array_of_structs_uses_whole_slots() {
        let pair = T::structure(
            "Pair",
            vec![Field::new("a", T::uint256()), Field::new("b", T::Bool)],
        );
        let decl = Declaration::new().with("pairs", T::dynamic_array(pair));
        let assignment = allocate(&decl).unwrap();

        let path = AccessPath::new().index(3).field("b");
        let r = resolve(&Keccak256, root(&assignment, "pairs"), path.segments()).unwrap();
        let data = Keccak256.hash_slot(&U256::ZERO);
        assert_eq!(r.location.slot, data + U256::from(7));
        assert_eq!(r.location.width, 1);
    }

    #[test]
    fn test_index_is_not_range_checked() {
        let decl = Declaration::new().with("arr", T::fixed_array(T::uint256(), 2));
        let assignment = allocate(&decl).unwrap();
        let path = AccessPath::new().index(10);
        let r = resolve(&Keccak256, root(&assignment, "arr"), path.segments()).unwrap();
        assert_eq!(r.location.slot, U256::from(10));
    }

    #[test]
    fn test_segment_kind_mismatch() {
        let decl = Declaration::new().with("arr", T::dynamic_array(T::uint256()));
        let assignment = allocate(&decl).unwrap();

        let path = AccessPath::new().field("x");
        let err = resolve(&Keccak256, root(&assignment, "arr"), path.segments()).unwrap_err();
        assert!(matches!(err, LayoutError::PathTypeMismatch { depth: 0, .. }));
    }

    #[test]
    fn test_key_type_mismatch() {
        let decl = Declaration::new().with("m", T::mapping(T::Address, T::uint256()));
        let assignment = allocate(&decl).unwrap();

        let path = AccessPath::new().key(Value::Bool(true));
        let err = resolve(&Keccak256, root(&assignment, "m"), path.segments()).unwrap_err();
        assert!(matches!(err, LayoutError::PathTypeMismatch { .. }));
    }

    #[test]
    fn test_path_past_scalar() {
        let decl = Declaration::new().with("n", T::uint256());
        let assignment = allocate(&decl).unwrap();
        let path = AccessPath::new().index(0).index(1);
        let err = resolve(&Keccak256, root(&assignment, "n"), path.segments()).unwrap_err();
        assert!(matches!(err, LayoutError::PathTooLong { remaining: 2, .. }));
    }

    #[test]
    fn test_unknown_struct_field() {
        let s = T::structure("S", vec![Field::new("a", T::uint256())]);
        let decl = Declaration::new().with("s", s);
        let assignment = allocate(&decl).unwrap();
        let path = AccessPath::new().field("missing");
        let err = resolve(&Keccak256, root(&assignment, "s"), path.segments()).unwrap_err();
        assert!(matches!(err, LayoutError::UnknownField { .. }));
    }

    #[test]
    fn test_element_position_wraps() {
        let element = TypeLayout::Scalar {
            kind: crate::ScalarKind::Uint,
            width: 32,
        };
        let (delta, offset) = element_position(&element, U256::MAX);
        assert_eq!(delta, U256::MAX);
        assert_eq!(offset, 0);
    }
}
