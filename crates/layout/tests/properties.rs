//! Property tests for allocation and value encoding.

use proptest::prelude::*;
use slotscope_core::{AccessPath, Declaration, TypeDescriptor as T, Value, I256, U256};
use slotscope_layout::{allocate, StorageLayout};
use slotscope_storage::MemoryStore;

fn value_type() -> impl Strategy<Value = T> {
    prop_oneof![
        (1u8..=32).prop_map(T::Uint),
        (1u8..=32).prop_map(T::Int),
        (1u8..=32).prop_map(T::FixedBytes),
        Just(T::Bool),
        Just(T::Address),
    ]
}

fn member_type() -> impl Strategy<Value = T> {
    prop_oneof![
        4 => value_type(),
        1 => Just(T::String),
        1 => value_type().prop_map(|t| T::mapping(T::Address, t)),
        1 => (value_type(), 1u64..6).prop_map(|(t, n)| T::fixed_array(t, n)),
        1 => value_type().prop_map(T::dynamic_array),
    ]
}

fn declaration() -> impl Strategy<Value = Declaration> {
    prop::collection::vec(member_type(), 1..24).prop_map(|types| {
        types
            .into_iter()
            .enumerate()
            .fold(Declaration::new(), |decl, (i, ty)| {
                decl.with(format!("v{}", i), ty)
            })
    })
}

proptest! {
    /// Allocation depends only on the declaration.
    #[test]
    fn prop_allocation_is_deterministic(decl in declaration()) {
        let first = allocate(&decl).unwrap();
        let second = allocate(&decl).unwrap();
        prop_assert_eq!(first.entries(), second.entries());
    }

    /// No placement straddles a slot boundary and no two placements overlap.
    #[test]
    fn prop_placements_are_disjoint(decl in declaration()) {
        let assignment = allocate(&decl).unwrap();
        let mut used = std::collections::HashMap::<u64, u32>::new();

        for placement in assignment.variables() {
            if let Some(width) = placement.layout.packed_width() {
                prop_assert!(u16::from(placement.offset) + u16::from(width) <= 32);
                let mask = (((1u64 << width) - 1) << placement.offset) as u32;
                let bits = used.entry(placement.slot).or_default();
                prop_assert_eq!(*bits & mask, 0);
                *bits |= mask;
            } else {
                prop_assert_eq!(placement.offset, 0);
                for slot in placement.slot..placement.slot + placement.layout.slot_count() {
                    prop_assert!(used.insert(slot, u32::MAX).is_none());
                }
            }
        }
        prop_assert!(used.keys().all(|slot| *slot < assignment.slot_count()));
    }

    /// Unsigned integers that fit their width survive a write/read cycle.
    #[test]
    fn prop_uint_round_trip(width in 1u8..=32, raw in any::<[u8; 32]>()) {
        let value = U256::from_be_bytes(raw) >> (256 - usize::from(width) * 8);
        let decl = Declaration::new().with("pad", T::Uint(3)).with("x", T::Uint(width));
        let layout = StorageLayout::keccak(&decl).unwrap();
        let store = MemoryStore::new();

        layout.write_value(&store, "x", &AccessPath::new(), &Value::Uint(value)).unwrap();
        prop_assert_eq!(
            layout.read_value(&store, "x", &AccessPath::new()).unwrap(),
            Value::Uint(value)
        );
    }

    /// Signed integers in range survive a write/read cycle, sign included.
    #[test]
    fn prop_int_round_trip(width in 1u8..=8, raw in any::<i64>()) {
        let bits = u32::from(width) * 8;
        let value = if bits == 64 { raw } else { (raw << (64 - bits)) >> (64 - bits) };
        let value = Value::Int(I256::try_from(value).unwrap());
        let decl = Declaration::new().with("x", T::Int(width)).with("flag", T::Bool);
        let layout = StorageLayout::keccak(&decl).unwrap();
        let store = MemoryStore::new();

        layout.write_value(&store, "flag", &AccessPath::new(), &Value::Bool(true)).unwrap();
        layout.write_value(&store, "x", &AccessPath::new(), &value).unwrap();
        prop_assert_eq!(layout.read_value(&store, "x", &AccessPath::new()).unwrap(), value);
        prop_assert_eq!(
            layout.read_value(&store, "flag", &AccessPath::new()).unwrap(),
            Value::Bool(true)
        );
    }

    /// Overwriting a byte sequence leaves exactly the words the new value needs.
    #[test]
    fn prop_bytes_overwrite_leaves_no_stale_words(
        first in prop::collection::vec(any::<u8>(), 0..160),
        second in prop::collection::vec(any::<u8>(), 0..160),
    ) {
        let decl = Declaration::new().with("blob", T::Bytes);
        let layout = StorageLayout::keccak(&decl).unwrap();
        let store = MemoryStore::new();
        let root = AccessPath::new();

        layout.write_value(&store, "blob", &root, &Value::Bytes(first)).unwrap();
        layout.write_value(&store, "blob", &root, &Value::Bytes(second.clone())).unwrap();

        prop_assert_eq!(
            layout.read_value(&store, "blob", &root).unwrap(),
            Value::Bytes(second.clone())
        );
        // Zero words are never stored, including all-zero data chunks
        let expected_words = match second.len() {
            0 => 0,
            n if n <= 31 => 1,
            _ => 1 + second.chunks(32).filter(|c| c.iter().any(|b| *b != 0)).count(),
        };
        prop_assert_eq!(store.len(), expected_words);
    }
}
