//! The storage layout engine.
//!
//! [`StorageLayout`] ties an allocated declaration to a hash function and
//! reads and writes whole values through any [`WordStore`].

use crate::allocator::{allocate, SlotAssignment, TypeLayout};
use crate::codec::{
    clear_bytes, decode_header, decode_scalar, encode_scalar, read_bytes, read_scalar, write_bytes,
    write_scalar,
};
use crate::error::{LayoutError, Result};
use crate::resolver::{element_position, resolve, Location, Resolved};
use slotscope_core::{AccessPath, Declaration, Keccak256, Slot, SlotHasher, Value, Word, U256};
use slotscope_storage::WordStore;
use std::collections::HashSet;
use tracing::debug;

/// Largest dynamic array length accepted when reading an array as a whole.
pub const MAX_DYNAMIC_LENGTH: u64 = u32::MAX as u64;

/// Resolves and encodes values for one declaration.
///
/// Immutable after construction; share it freely across threads.
#[derive(Debug, Clone)]
pub struct StorageLayout<H = Keccak256> {
    assignment: SlotAssignment,
    hasher: H,
}

impl StorageLayout<Keccak256> {
    /// Layout using the EVM hash function.
    pub fn keccak(declaration: &Declaration) -> Result<Self> {
        Self::new(declaration, Keccak256)
    }
}

impl<H: SlotHasher> StorageLayout<H> {
    pub fn new(declaration: &Declaration, hasher: H) -> Result<Self> {
        Ok(Self::with_assignment(allocate(declaration)?, hasher))
    }

    pub fn with_assignment(assignment: SlotAssignment, hasher: H) -> Self {
        Self { assignment, hasher }
    }

    pub fn assignment(&self) -> &SlotAssignment {
        &self.assignment
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    fn locate(&self, name: &str, path: &AccessPath) -> Result<Resolved<'_>> {
        let placement = self
            .assignment
            .get(name)
            .ok_or_else(|| LayoutError::UnknownVariable(name.to_string()))?;
        let root = Resolved::root(U256::from(placement.slot), placement.offset, &placement.layout);
        resolve(&self.hasher, root, path.segments())
    }

    /// Resolve `name` followed by `path` to a physical location.
    pub fn resolve(&self, name: &str, path: &AccessPath) -> Result<Location> {
        let resolved = self.locate(name, path)?;
        debug!(variable = name, %path, location = %resolved.location, "resolved path");
        Ok(resolved.location)
    }

    /// Read the value at `name` + `path`.
    ///
    /// Structs are read field by field, skipping mappings; arrays element by
    /// element. Reading a mapping as a whole fails with `PathTooShort`.
    pub fn read_value<S: WordStore + ?Sized>(
        &self,
        store: &S,
        name: &str,
        path: &AccessPath,
    ) -> Result<Value> {
        let resolved = self.locate(name, path)?;
        self.read_at(store, resolved.location.slot, resolved.location.offset, resolved.layout)
    }

    /// Write `value` at `name` + `path`.
    ///
    /// The value is checked against the type before any word is touched.
    /// Shrinking a dynamic array or string zeroes the words it no longer uses.
    pub fn write_value<S: WordStore + ?Sized>(
        &self,
        store: &S,
        name: &str,
        path: &AccessPath,
        value: &Value,
    ) -> Result<()> {
        let resolved = self.locate(name, path)?;
        check_value(resolved.layout, value)?;
        debug!(variable = name, %path, location = %resolved.location, "writing value");
        self.write_at(
            store,
            resolved.location.slot,
            resolved.location.offset,
            resolved.layout,
            value,
        )
    }

    /// Reset the value at `name` + `path` to its zero state.
    ///
    /// Mapping entries cannot be enumerated; clearing a mapping leaves its
    /// entries untouched.
    pub fn clear_value<S: WordStore + ?Sized>(
        &self,
        store: &S,
        name: &str,
        path: &AccessPath,
    ) -> Result<()> {
        let resolved = self.locate(name, path)?;
        debug!(variable = name, %path, location = %resolved.location, "clearing value");
        self.clear_at(store, resolved.location.slot, resolved.location.offset, resolved.layout)
    }

    /// Element count of an array, or byte length of a string or bytes value.
    pub fn array_length<S: WordStore + ?Sized>(
        &self,
        store: &S,
        name: &str,
        path: &AccessPath,
    ) -> Result<u64> {
        let resolved = self.locate(name, path)?;
        let slot = resolved.location.slot;
        match resolved.layout {
            TypeLayout::FixedArray { length, .. } => Ok(*length),
            TypeLayout::DynamicArray { .. } => dynamic_length(store, &slot),
            TypeLayout::String | TypeLayout::Bytes => {
                let header = decode_header(&slot, &store.read_word(&slot)?)?;
                Ok(header.len() as u64)
            }
            other => Err(LayoutError::PathTypeMismatch {
                depth: path.len(),
                expected: "array, string or bytes".to_string(),
                found: other.kind_name().to_string(),
            }),
        }
    }

    fn read_at<S: WordStore + ?Sized>(
        &self,
        store: &S,
        slot: Slot,
        offset: u8,
        layout: &TypeLayout,
    ) -> Result<Value> {
        match layout {
            TypeLayout::Scalar { kind, width } => {
                let word = store.read_word(&slot)?;
                let bytes = read_scalar(&word, offset, *width)?;
                Ok(decode_scalar(*kind, &bytes))
            }
            TypeLayout::String => {
                let bytes = read_bytes(store, &self.hasher, &slot)?;
                String::from_utf8(bytes).map(Value::String).map_err(|_| {
                    LayoutError::CorruptEncoding {
                        slot,
                        reason: "string is not valid UTF-8".to_string(),
                    }
                })
            }
            TypeLayout::Bytes => Ok(Value::Bytes(read_bytes(store, &self.hasher, &slot)?)),
            TypeLayout::Mapping { .. } => Err(LayoutError::PathTooShort {
                ty: layout.kind_name().to_string(),
            }),
            TypeLayout::FixedArray {
                element, length, ..
            } => self.read_elements(store, slot, element, *length),
            TypeLayout::DynamicArray { element } => {
                let length = dynamic_length(store, &slot)?;
                if length > MAX_DYNAMIC_LENGTH {
                    return Err(LayoutError::CorruptEncoding {
                        slot,
                        reason: format!("array length {} out of range", length),
                    });
                }
                self.read_elements(store, self.hasher.hash_slot(&slot), element, length)
            }
            TypeLayout::Struct(s) => {
                let mut fields = Vec::with_capacity(s.fields.len());
                for field in &s.fields {
                    if matches!(field.layout, TypeLayout::Mapping { .. }) {
                        continue;
                    }
                    let value = self.read_at(
                        store,
                        slot.wrapping_add(U256::from(field.slot)),
                        field.offset,
                        &field.layout,
                    )?;
                    fields.push((field.name.clone(), value));
                }
                Ok(Value::Struct(fields))
            }
        }
    }

    fn read_elements<S: WordStore + ?Sized>(
        &self,
        store: &S,
        base: Slot,
        element: &TypeLayout,
        length: u64,
    ) -> Result<Value> {
        let mut items = Vec::with_capacity(length.min(1024) as usize);
        for i in 0..length {
            let (delta, offset) = element_position(element, U256::from(i));
            items.push(self.read_at(store, base.wrapping_add(delta), offset, element)?);
        }
        Ok(Value::Array(items))
    }

    fn write_at<S: WordStore + ?Sized>(
        &self,
        store: &S,
        slot: Slot,
        offset: u8,
        layout: &TypeLayout,
        value: &Value,
    ) -> Result<()> {
        match (layout, value) {
            (TypeLayout::Scalar { kind, width }, value) => {
                let bytes = encode_scalar(*kind, *width, value)?;
                let word = store.read_word(&slot)?;
                store.write_word(&slot, write_scalar(&word, offset, *width, &bytes)?)?;
                Ok(())
            }
            (TypeLayout::String, Value::String(s)) => {
                write_bytes(store, &self.hasher, &slot, s.as_bytes())
            }
            (TypeLayout::Bytes, Value::Bytes(b)) => write_bytes(store, &self.hasher, &slot, b),
            (TypeLayout::FixedArray { element, .. }, Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    let (delta, offset) = element_position(element, U256::from(i));
                    self.write_at(store, slot.wrapping_add(delta), offset, element, item)?;
                }
                Ok(())
            }
            (TypeLayout::DynamicArray { element }, Value::Array(items)) => {
                let previous = previous_length(store, &slot)?;
                let data = self.hasher.hash_slot(&slot);
                store.write_word(&slot, Word::from_u256(U256::from(items.len())))?;
                for (i, item) in items.iter().enumerate() {
                    let (delta, offset) = element_position(element, U256::from(i));
                    self.write_at(store, data.wrapping_add(delta), offset, element, item)?;
                }
                for i in (items.len() as u64)..previous {
                    let (delta, offset) = element_position(element, U256::from(i));
                    self.clear_at(store, data.wrapping_add(delta), offset, element)?;
                }
                Ok(())
            }
            (TypeLayout::Struct(s), Value::Struct(values)) => {
                for (name, item) in values {
                    if let Some(field) = s.field(name) {
                        self.write_at(
                            store,
                            slot.wrapping_add(U256::from(field.slot)),
                            field.offset,
                            &field.layout,
                            item,
                        )?;
                    }
                }
                Ok(())
            }
            (layout, value) => Err(type_mismatch(layout, value)),
        }
    }

    fn clear_at<S: WordStore + ?Sized>(
        &self,
        store: &S,
        slot: Slot,
        offset: u8,
        layout: &TypeLayout,
    ) -> Result<()> {
        match layout {
            TypeLayout::Scalar { width, .. } => {
                let word = store.read_word(&slot)?;
                store.write_word(&slot, write_scalar(&word, offset, *width, &[])?)?;
                Ok(())
            }
            TypeLayout::String | TypeLayout::Bytes => clear_bytes(store, &self.hasher, &slot),
            TypeLayout::Mapping { .. } => Ok(()),
            TypeLayout::FixedArray {
                element,
                length,
                slots,
            } => self.clear_elements(store, slot, element, *length, *slots),
            TypeLayout::DynamicArray { element } => {
                let length = previous_length(store, &slot)?;
                let slots = match element.packed_width() {
                    Some(width) => length.div_ceil(u64::from(32 / width)),
                    None => length.saturating_mul(element.slot_count()),
                };
                let data = self.hasher.hash_slot(&slot);
                self.clear_elements(store, data, element, length, slots)?;
                store.write_word(&slot, Word::ZERO)?;
                Ok(())
            }
            TypeLayout::Struct(s) => {
                for field in &s.fields {
                    self.clear_at(
                        store,
                        slot.wrapping_add(U256::from(field.slot)),
                        field.offset,
                        &field.layout,
                    )?;
                }
                Ok(())
            }
        }
    }

    fn clear_elements<S: WordStore + ?Sized>(
        &self,
        store: &S,
        base: Slot,
        element: &TypeLayout,
        length: u64,
        slots: u64,
    ) -> Result<()> {
        // Packed elements own their slots outright: zero them wholesale
        if element.packed_width().is_some() {
            for i in 0..slots {
                store.write_word(&base.wrapping_add(U256::from(i)), Word::ZERO)?;
            }
            return Ok(());
        }
        for i in 0..length {
            let (delta, offset) = element_position(element, U256::from(i));
            self.clear_at(store, base.wrapping_add(delta), offset, element)?;
        }
        Ok(())
    }
}

/// Length word of a dynamic array.
fn dynamic_length<S: WordStore + ?Sized>(store: &S, slot: &Slot) -> Result<u64> {
    let length = store.read_word(slot)?.to_u256();
    if length.bit_len() > 64 {
        return Err(LayoutError::CorruptEncoding {
            slot: *slot,
            reason: format!("array length {} out of range", length),
        });
    }
    Ok(length.as_limbs()[0])
}

/// Length of an array about to be overwritten or cleared. An undecodable
/// length word is treated as empty.
fn previous_length<S: WordStore + ?Sized>(store: &S, slot: &Slot) -> Result<u64> {
    match dynamic_length(store, slot) {
        Ok(length) => Ok(length.min(MAX_DYNAMIC_LENGTH)),
        Err(LayoutError::CorruptEncoding { .. }) => Ok(0),
        Err(err) => Err(err),
    }
}

fn type_mismatch(layout: &TypeLayout, value: &Value) -> LayoutError {
    match layout {
        TypeLayout::Mapping { .. } => LayoutError::PathTooShort {
            ty: layout.kind_name().to_string(),
        },
        _ => LayoutError::ValueTypeMismatch {
            expected: layout.kind_name().to_string(),
            found: value.kind_name().to_string(),
        },
    }
}

/// Check that `value` can be written to a location of type `layout`.
fn check_value(layout: &TypeLayout, value: &Value) -> Result<()> {
    match (layout, value) {
        (TypeLayout::Scalar { kind, width }, value) => {
            encode_scalar(*kind, *width, value)?;
            Ok(())
        }
        (TypeLayout::String, Value::String(_)) | (TypeLayout::Bytes, Value::Bytes(_)) => Ok(()),
        (TypeLayout::FixedArray { element, length, .. }, Value::Array(items)) => {
            if items.len() as u64 != *length {
                return Err(LayoutError::ArrayLengthMismatch {
                    expected: *length,
                    found: items.len(),
                });
            }
            items.iter().try_for_each(|item| check_value(element, item))
        }
        (TypeLayout::DynamicArray { element }, Value::Array(items)) => {
            if items.len() as u64 > MAX_DYNAMIC_LENGTH {
                return Err(LayoutError::EncodingOverflow {
                    value: format!("{} elements", items.len()),
                    width: 32,
                });
            }
            items.iter().try_for_each(|item| check_value(element, item))
        }
        (TypeLayout::Struct(s), Value::Struct(values)) => {
            let mut seen = HashSet::new();
            for (name, item) in values {
                let field = s.field(name).ok_or_else(|| LayoutError::UnknownField {
                    ty: s.name.clone(),
                    field: name.clone(),
                })?;
                if !seen.insert(name.as_str()) {
                    return Err(LayoutError::ValueTypeMismatch {
                        expected: format!("struct {}", s.name),
                        found: format!("duplicate field '{}'", name),
                    });
                }
                check_value(&field.layout, item)?;
            }
            for field in &s.fields {
                let is_mapping = matches!(field.layout, TypeLayout::Mapping { .. });
                if !is_mapping && !seen.contains(field.name.as_str()) {
                    return Err(LayoutError::ValueTypeMismatch {
                        expected: format!("struct {} with field '{}'", s.name, field.name),
                        found: "missing field".to_string(),
                    });
                }
            }
            Ok(())
        }
        (layout, value) => Err(type_mismatch(layout, value)),
    }
}
