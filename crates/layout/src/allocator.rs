//! Static slot allocation.
//!
//! Walks a [`Declaration`] in order and assigns every variable (and,
//! recursively, every struct field) a `(slot, offset, width)` placement.
//! The walk threads an explicit [`Cursor`] through each placement; there is
//! no shared counter.
//!
//! Packing rules:
//! - Value types fill a slot from the low-order byte upwards and never
//!   straddle two slots.
//! - Structs, fixed arrays, mappings, dynamic arrays, strings and bytes start
//!   a fresh slot, and whatever follows them starts a fresh slot too.
//! - Fixed arrays of value types pack `32 / width` elements per slot.

use crate::error::{LayoutError, Result};
use serde::Serialize;
use slotscope_core::{Declaration, Field, Slot, TypeDescriptor, U256};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// Encoding family of a value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    Uint,
    Int,
    Bool,
    Address,
    FixedBytes,
}

/// A type with its static layout resolved.
///
/// Mirrors [`TypeDescriptor`], carrying the pre-computed struct-local
/// placements and slot counts the resolver needs at every depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeLayout {
    Scalar {
        kind: ScalarKind,
        width: u8,
    },
    String,
    Bytes,
    Mapping {
        key: Box<TypeLayout>,
        value: Box<TypeLayout>,
    },
    FixedArray {
        element: Box<TypeLayout>,
        length: u64,
        slots: u64,
    },
    DynamicArray {
        element: Box<TypeLayout>,
    },
    Struct(StructLayout),
}

impl TypeLayout {
    /// Resolve the static layout of a type, validating it on the way.
    pub fn of(ty: &TypeDescriptor) -> Result<Self> {
        match ty {
            TypeDescriptor::Uint(width) => scalar(ScalarKind::Uint, *width, ty),
            TypeDescriptor::Int(width) => scalar(ScalarKind::Int, *width, ty),
            TypeDescriptor::FixedBytes(width) => scalar(ScalarKind::FixedBytes, *width, ty),
            TypeDescriptor::Bool => scalar(ScalarKind::Bool, 1, ty),
            TypeDescriptor::Address => scalar(ScalarKind::Address, 20, ty),
            TypeDescriptor::String => Ok(TypeLayout::String),
            TypeDescriptor::Bytes => Ok(TypeLayout::Bytes),
            TypeDescriptor::Mapping { key, value } => {
                if !(key.is_value_type() || key.is_bytes_like()) {
                    return Err(LayoutError::InvalidType(format!(
                        "mapping key must be a value type, string or bytes, found {}",
                        key
                    )));
                }
                Ok(TypeLayout::Mapping {
                    key: Box::new(TypeLayout::of(key)?),
                    value: Box::new(TypeLayout::of(value)?),
                })
            }
            TypeDescriptor::FixedArray { element, length } => {
                if *length == 0 {
                    return Err(LayoutError::InvalidType(format!(
                        "zero-length fixed array {}",
                        ty
                    )));
                }
                let element = TypeLayout::of(element)?;
                let slots = match element.packed_width() {
                    Some(width) => {
                        let per_slot = u64::from(32 / width);
                        length.div_ceil(per_slot)
                    }
                    None => length
                        .checked_mul(element.slot_count())
                        .ok_or_else(|| overflow(ty))?,
                };
                Ok(TypeLayout::FixedArray {
                    element: Box::new(element),
                    length: *length,
                    slots,
                })
            }
            TypeDescriptor::DynamicArray { element } => Ok(TypeLayout::DynamicArray {
                element: Box::new(TypeLayout::of(element)?),
            }),
            TypeDescriptor::Struct(s) => {
                if s.fields.is_empty() {
                    return Err(LayoutError::InvalidType(format!(
                        "struct {} has no fields",
                        s.name
                    )));
                }
                let (fields, slots) = place_fields(&s.fields, &s.name)?;
                Ok(TypeLayout::Struct(StructLayout {
                    name: s.name.clone(),
                    fields,
                    slots,
                }))
            }
        }
    }

    /// Number of whole slots the type occupies at its position.
    pub fn slot_count(&self) -> u64 {
        match self {
            TypeLayout::Scalar { .. }
            | TypeLayout::String
            | TypeLayout::Bytes
            | TypeLayout::Mapping { .. }
            | TypeLayout::DynamicArray { .. } => 1,
            TypeLayout::FixedArray { slots, .. } => *slots,
            TypeLayout::Struct(s) => s.slots,
        }
    }

    /// Byte width if the type packs with its neighbors.
    pub fn packed_width(&self) -> Option<u8> {
        match self {
            TypeLayout::Scalar { width, .. } => Some(*width),
            _ => None,
        }
    }

    /// Width reported in a resolved location: the value width, or a full word.
    pub fn width(&self) -> u8 {
        self.packed_width().unwrap_or(32)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeLayout::Scalar { .. } => "value",
            TypeLayout::String => "string",
            TypeLayout::Bytes => "bytes",
            TypeLayout::Mapping { .. } => "mapping",
            TypeLayout::FixedArray { .. } => "fixed array",
            TypeLayout::DynamicArray { .. } => "dynamic array",
            TypeLayout::Struct(_) => "struct",
        }
    }
}

fn scalar(kind: ScalarKind, width: u8, ty: &TypeDescriptor) -> Result<TypeLayout> {
    if !(1..=32).contains(&width) {
        return Err(LayoutError::InvalidType(format!(
            "{} has byte width {}, expected 1..=32",
            ty, width
        )));
    }
    Ok(TypeLayout::Scalar { kind, width })
}

fn overflow(ty: &TypeDescriptor) -> LayoutError {
    LayoutError::InvalidType(format!("{} exceeds the addressable slot range", ty))
}

/// Struct-local placements of a struct's fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructLayout {
    pub name: String,
    pub fields: Vec<Placement>,
    /// Whole slots occupied by the struct.
    pub slots: u64,
}

impl StructLayout {
    pub fn field(&self, name: &str) -> Option<&Placement> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Where one member lives relative to its container's base slot.
///
/// For top-level variables the container base is slot 0, so `slot` is the
/// absolute slot number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub name: String,
    pub slot: u64,
    /// Byte offset counted from the low-order end of the word.
    pub offset: u8,
    pub width: u8,
    pub ty: TypeDescriptor,
    pub layout: TypeLayout,
}

/// Allocation cursor: the current slot and the bytes already used in it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Cursor {
    slot: u64,
    used: u8,
}

impl Cursor {
    /// Place a member, returning the advanced cursor and the `(slot, offset)`
    /// the member was placed at.
    fn place(self, layout: &TypeLayout) -> Option<(Cursor, u64, u8)> {
        match layout.packed_width() {
            Some(width) => {
                let start = if u16::from(self.used) + u16::from(width) > 32 {
                    Cursor {
                        slot: self.slot.checked_add(1)?,
                        used: 0,
                    }
                } else {
                    self
                };
                let next = Cursor {
                    slot: start.slot,
                    used: start.used + width,
                };
                Some((next, start.slot, start.used))
            }
            None => {
                let start = self.slots_used()?;
                let next = Cursor {
                    slot: start.checked_add(layout.slot_count())?,
                    used: 0,
                };
                Some((next, start, 0))
            }
        }
    }

    /// Slots consumed so far, counting a partially filled slot.
    fn slots_used(self) -> Option<u64> {
        if self.used > 0 {
            self.slot.checked_add(1)
        } else {
            Some(self.slot)
        }
    }
}

/// Place an ordered list of members from a fresh cursor.
fn place_fields(fields: &[Field], container: &str) -> Result<(Vec<Placement>, u64)> {
    let mut seen = HashSet::new();
    let mut cursor = Cursor::default();
    let mut placements = Vec::with_capacity(fields.len());

    for field in fields {
        if !seen.insert(field.name.as_str()) {
            return Err(LayoutError::InvalidType(format!(
                "duplicate member '{}' in {}",
                field.name, container
            )));
        }
        let layout = TypeLayout::of(&field.ty)?;
        let (next, slot, offset) = cursor
            .place(&layout)
            .ok_or_else(|| overflow(&field.ty))?;
        trace!(container, member = %field.name, slot, offset, "placed member");

        placements.push(Placement {
            name: field.name.clone(),
            slot,
            offset,
            width: layout.width(),
            ty: field.ty.clone(),
            layout,
        });
        cursor = next;
    }

    let slots = cursor.slots_used().ok_or_else(|| {
        LayoutError::InvalidType(format!("{} exceeds the addressable slot range", container))
    })?;
    Ok((placements, slots))
}

/// The immutable result of allocating a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotAssignment {
    variables: Vec<Placement>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    slots: u64,
}

impl SlotAssignment {
    /// Placement of a top-level variable.
    pub fn get(&self, name: &str) -> Option<&Placement> {
        self.index.get(name).map(|i| &self.variables[*i])
    }

    /// Top-level placements in declaration order.
    pub fn variables(&self) -> &[Placement] {
        &self.variables
    }

    /// Total static slots used by the declaration.
    pub fn slot_count(&self) -> u64 {
        self.slots
    }

    /// Base slot of a top-level variable.
    pub fn base_slot(&self, name: &str) -> Option<Slot> {
        self.get(name).map(|p| U256::from(p.slot))
    }

    /// Every top-level variable and, recursively, every struct field with its
    /// absolute placement. Members of mappings and dynamic arrays have no
    /// static placement and are not listed.
    pub fn entries(&self) -> Vec<LayoutEntry> {
        let mut out = Vec::new();
        collect_entries("", U256::ZERO, &self.variables, &mut out);
        out
    }
}

/// One flattened row of a [`SlotAssignment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutEntry {
    pub path: String,
    pub slot: Slot,
    pub offset: u8,
    pub width: u8,
    pub ty: TypeDescriptor,
}

fn collect_entries(prefix: &str, base: Slot, placements: &[Placement], out: &mut Vec<LayoutEntry>) {
    for placement in placements {
        let path = if prefix.is_empty() {
            placement.name.clone()
        } else {
            format!("{}.{}", prefix, placement.name)
        };
        let slot = base + U256::from(placement.slot);
        out.push(LayoutEntry {
            path: path.clone(),
            slot,
            offset: placement.offset,
            width: placement.width,
            ty: placement.ty.clone(),
        });
        if let TypeLayout::Struct(s) = &placement.layout {
            collect_entries(&path, slot, &s.fields, out);
        }
    }
}

/// Assign base slots to every variable of a declaration.
///
/// Deterministic: depends only on declaration order and type shapes.
pub fn allocate(declaration: &Declaration) -> Result<SlotAssignment> {
    let (variables, slots) = place_fields(declaration.variables(), "declaration")?;
    let index = variables
        .iter()
        .enumerate()
        .map(|(i, p)| (p.name.clone(), i))
        .collect();

    debug!(variables = variables.len(), slots, "allocated storage layout");

    Ok(SlotAssignment {
        variables,
        index,
        slots,
    })
}
