//! Storage type model.
//!
//! A [`Declaration`] is the ordered list of state variables whose layout the
//! engine computes. Each variable has a [`TypeDescriptor`] describing its
//! shape. The model is pure data; validation happens during allocation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The shape of a storage variable.
///
/// Value types (`Uint`, `Int`, `Bool`, `Address`, `FixedBytes`) occupy a
/// fixed number of bytes and may share a slot with their neighbors. Every
/// other variant occupies whole slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeDescriptor {
    /// Unsigned integer of the given byte width (1..=32).
    Uint(u8),
    /// Two's complement signed integer of the given byte width (1..=32).
    Int(u8),
    Bool,
    /// 20-byte account address.
    Address,
    /// Fixed-size byte sequence of the given length (1..=32).
    FixedBytes(u8),
    Mapping {
        key: Box<TypeDescriptor>,
        value: Box<TypeDescriptor>,
    },
    FixedArray {
        element: Box<TypeDescriptor>,
        length: u64,
    },
    DynamicArray {
        element: Box<TypeDescriptor>,
    },
    Struct(StructType),
    String,
    Bytes,
}

impl TypeDescriptor {
    pub fn uint256() -> Self {
        TypeDescriptor::Uint(32)
    }

    pub fn mapping(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        TypeDescriptor::Mapping {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn fixed_array(element: TypeDescriptor, length: u64) -> Self {
        TypeDescriptor::FixedArray {
            element: Box::new(element),
            length,
        }
    }

    pub fn dynamic_array(element: TypeDescriptor) -> Self {
        TypeDescriptor::DynamicArray {
            element: Box::new(element),
        }
    }

    pub fn structure(name: impl Into<String>, fields: Vec<Field>) -> Self {
        TypeDescriptor::Struct(StructType {
            name: name.into(),
            fields,
        })
    }

    /// Byte width of a value type, `None` for types occupying whole slots.
    pub fn value_width(&self) -> Option<u8> {
        match self {
            TypeDescriptor::Uint(w) | TypeDescriptor::Int(w) | TypeDescriptor::FixedBytes(w) => {
                Some(*w)
            }
            TypeDescriptor::Bool => Some(1),
            TypeDescriptor::Address => Some(20),
            TypeDescriptor::Mapping { .. }
            | TypeDescriptor::FixedArray { .. }
            | TypeDescriptor::DynamicArray { .. }
            | TypeDescriptor::Struct(_)
            | TypeDescriptor::String
            | TypeDescriptor::Bytes => None,
        }
    }

    pub fn is_value_type(&self) -> bool {
        self.value_width().is_some()
    }

    /// Strings and byte sequences use the short/long encoding.
    pub fn is_bytes_like(&self) -> bool {
        matches!(self, TypeDescriptor::String | TypeDescriptor::Bytes)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Uint(w) => write!(f, "uint{}", u32::from(*w) * 8),
            TypeDescriptor::Int(w) => write!(f, "int{}", u32::from(*w) * 8),
            TypeDescriptor::Bool => write!(f, "bool"),
            TypeDescriptor::Address => write!(f, "address"),
            TypeDescriptor::FixedBytes(n) => write!(f, "bytes{}", n),
            TypeDescriptor::Mapping { key, value } => write!(f, "mapping({} => {})", key, value),
            TypeDescriptor::FixedArray { element, length } => write!(f, "{}[{}]", element, length),
            TypeDescriptor::DynamicArray { element } => write!(f, "{}[]", element),
            TypeDescriptor::Struct(s) => write!(f, "struct {}", s.name),
            TypeDescriptor::String => write!(f, "string"),
            TypeDescriptor::Bytes => write!(f, "bytes"),
        }
    }
}

/// A named struct type with ordered fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructType {
    pub name: String,
    pub fields: Vec<Field>,
}

/// A named, typed member: a top-level state variable or a struct field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Ordered top-level state variables. Order determines slot assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Declaration {
    variables: Vec<Field>,
}

impl Declaration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style append.
    pub fn with(mut self, name: impl Into<String>, ty: TypeDescriptor) -> Self {
        self.push(name, ty);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, ty: TypeDescriptor) {
        self.variables.push(Field::new(name, ty));
    }

    pub fn variables(&self) -> &[Field] {
        &self.variables
    }

    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.variables
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.ty)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

impl From<Vec<Field>> for Declaration {
    fn from(variables: Vec<Field>) -> Self {
        Self { variables }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_widths() {
        assert_eq!(TypeDescriptor::uint256().value_width(), Some(32));
        assert_eq!(TypeDescriptor::Address.value_width(), Some(20));
        assert_eq!(TypeDescriptor::Bool.value_width(), Some(1));
        assert_eq!(TypeDescriptor::String.value_width(), None);
        assert_eq!(
            TypeDescriptor::dynamic_array(TypeDescriptor::Uint(1)).value_width(),
            None
        );
    }

    #[test]
    fn test_display_names() {
        let ty = TypeDescriptor::mapping(
            TypeDescriptor::Address,
            TypeDescriptor::dynamic_array(TypeDescriptor::fixed_array(TypeDescriptor::Uint(4), 3)),
        );
        assert_eq!(ty.to_string(), "mapping(address => uint32[3][])");
        assert_eq!(TypeDescriptor::Int(16).to_string(), "int128");
        assert_eq!(TypeDescriptor::FixedBytes(4).to_string(), "bytes4");
    }

    #[test]
    fn test_declaration_builder_preserves_order() {
        let decl = Declaration::new()
            .with("someNumber", TypeDescriptor::uint256())
            .with("someAddress", TypeDescriptor::Address);

        let names: Vec<_> = decl.variables().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["someNumber", "someAddress"]);
        assert_eq!(decl.get("someAddress"), Some(&TypeDescriptor::Address));
        assert_eq!(decl.get("missing"), None);
    }

    #[test]
    fn test_declaration_json_roundtrip() {
        let decl = Declaration::new()
            .with(
                "balance",
                TypeDescriptor::mapping(TypeDescriptor::Address, TypeDescriptor::uint256()),
            )
            .with("name", TypeDescriptor::String);

        let json = serde_json::to_string(&decl).unwrap();
        let parsed: Declaration = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, decl);
    }

    #[test]
    fn test_declaration_json_shape() {
        let json = r#"[
            {"name": "count", "type": {"uint": 8}},
            {"name": "owner", "type": "address"}
        ]"#;
        let decl: Declaration = serde_json::from_str(json).unwrap();
        assert_eq!(decl.len(), 2);
        assert_eq!(decl.get("count"), Some(&TypeDescriptor::Uint(8)));
    }
}
