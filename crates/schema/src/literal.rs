//! Value and access path literals.
//!
//! Value types are written as plain text: decimal or `0x` hex integers
//! (`-` for negative signed values), `true`/`false`, hex addresses and hex
//! byte strings. Strings may be quoted. Arrays and structs use JSON:
//! `[1, 2, 3]`, `{"name": "alice", "age": 30}`.
//!
//! Access paths follow a variable name and chain `.field`, `[index]` and
//! `{key}` segments, e.g. `.owners[2]{0xabc...}`.

use slotscope_core::{
    AccessPath, Address, PathSegment, StructType, TypeDescriptor, Value, I256, U256,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LiteralError {
    #[error("invalid {ty} literal '{text}': {reason}")]
    Invalid {
        ty: String,
        text: String,
        reason: String,
    },

    #[error("invalid path '{text}': {reason}")]
    Path { text: String, reason: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LiteralError>;

fn invalid(ty: &TypeDescriptor, text: &str, reason: impl Into<String>) -> LiteralError {
    LiteralError::Invalid {
        ty: ty.to_string(),
        text: text.to_string(),
        reason: reason.into(),
    }
}

/// Parse a literal for a location of type `ty`.
pub fn parse_value(ty: &TypeDescriptor, text: &str) -> Result<Value> {
    let text = text.trim();
    match ty {
        TypeDescriptor::FixedArray { .. }
        | TypeDescriptor::DynamicArray { .. }
        | TypeDescriptor::Struct(_) => {
            let json: serde_json::Value = serde_json::from_str(text)?;
            value_from_json(ty, &json)
        }
        _ => scalar_from_text(ty, text),
    }
}

fn scalar_from_text(ty: &TypeDescriptor, text: &str) -> Result<Value> {
    match ty {
        TypeDescriptor::Uint(_) => parse_u256(text)
            .map(Value::Uint)
            .ok_or_else(|| invalid(ty, text, "expected a decimal or 0x-prefixed integer")),
        TypeDescriptor::Int(_) => parse_i256(text)
            .map(Value::Int)
            .ok_or_else(|| invalid(ty, text, "expected a signed integer in range")),
        TypeDescriptor::Bool => match text {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(invalid(ty, text, "expected true or false")),
        },
        TypeDescriptor::Address => text
            .parse::<Address>()
            .map(Value::Address)
            .map_err(|err| invalid(ty, text, err.to_string())),
        TypeDescriptor::FixedBytes(n) => {
            let bytes = parse_hex(text).map_err(|err| invalid(ty, text, err.to_string()))?;
            if bytes.len() > usize::from(*n) {
                return Err(invalid(ty, text, format!("longer than {} bytes", n)));
            }
            Ok(Value::FixedBytes(bytes))
        }
        TypeDescriptor::String => {
            if text.starts_with('"') {
                Ok(Value::String(serde_json::from_str(text)?))
            } else {
                Ok(Value::String(text.to_string()))
            }
        }
        TypeDescriptor::Bytes => parse_hex(text)
            .map(Value::Bytes)
            .map_err(|err| invalid(ty, text, err.to_string())),
        TypeDescriptor::Mapping { .. } => Err(invalid(
            ty,
            text,
            "mappings are written one entry at a time",
        )),
        TypeDescriptor::FixedArray { .. }
        | TypeDescriptor::DynamicArray { .. }
        | TypeDescriptor::Struct(_) => Err(invalid(ty, text, "expected a JSON array or object")),
    }
}

fn parse_hex(text: &str) -> std::result::Result<Vec<u8>, hex::FromHexError> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    if digits.len() % 2 == 1 {
        hex::decode(format!("0{}", digits))
    } else {
        hex::decode(digits)
    }
}

fn parse_u256(text: &str) -> Option<U256> {
    match text.strip_prefix("0x") {
        Some(digits) => U256::from_str_radix(digits, 16).ok(),
        None => U256::from_str_radix(text, 10).ok(),
    }
}

fn parse_i256(text: &str) -> Option<I256> {
    let (negative, magnitude) = match text.strip_prefix('-') {
        Some(rest) => (true, parse_u256(rest)?),
        None => (false, parse_u256(text)?),
    };
    let limit = U256::from(1u8) << 255usize;
    if negative {
        (magnitude <= limit).then(|| I256::from_raw(U256::ZERO.wrapping_sub(magnitude)))
    } else {
        (magnitude < limit).then(|| I256::from_raw(magnitude))
    }
}

/// Convert a JSON document into a value of type `ty`.
///
/// Numbers may be given as JSON numbers or strings; large integers should
/// be strings.
pub fn value_from_json(ty: &TypeDescriptor, json: &serde_json::Value) -> Result<Value> {
    use serde_json::Value as Json;

    match (ty, json) {
        (TypeDescriptor::FixedArray { element, .. }, Json::Array(items))
        | (TypeDescriptor::DynamicArray { element }, Json::Array(items)) => items
            .iter()
            .map(|item| value_from_json(element, item))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        (TypeDescriptor::Struct(s), Json::Object(object)) => struct_from_json(ty, s, object),
        (TypeDescriptor::String, Json::String(s)) => Ok(Value::String(s.clone())),
        (_, Json::String(s)) if ty.is_value_type() || ty.is_bytes_like() => {
            scalar_from_text(ty, s)
        }
        (_, Json::Number(n)) if ty.is_value_type() => scalar_from_text(ty, &n.to_string()),
        (TypeDescriptor::Bool, Json::Bool(b)) => Ok(Value::Bool(*b)),
        (ty, json) => Err(invalid(ty, &json.to_string(), "unexpected JSON shape")),
    }
}

fn struct_from_json(
    ty: &TypeDescriptor,
    s: &StructType,
    object: &serde_json::Map<String, serde_json::Value>,
) -> Result<Value> {
    if let Some(unknown) = object
        .keys()
        .find(|key| !s.fields.iter().any(|f| &f.name == *key))
    {
        return Err(invalid(
            ty,
            &format!("{{\"{}\": ...}}", unknown),
            format!("struct {} has no field '{}'", s.name, unknown),
        ));
    }

    let mut fields = Vec::with_capacity(s.fields.len());
    for field in &s.fields {
        if matches!(field.ty, TypeDescriptor::Mapping { .. }) {
            continue;
        }
        let json = object.get(&field.name).ok_or_else(|| {
            invalid(
                ty,
                &serde_json::Value::Object(object.clone()).to_string(),
                format!("missing field '{}'", field.name),
            )
        })?;
        fields.push((field.name.clone(), value_from_json(&field.ty, json)?));
    }
    Ok(Value::Struct(fields))
}

/// Parse the access path that follows a variable of type `root`.
///
/// Mapping keys are parsed with the mapping's key type, so the path is
/// checked against the type tree while it is read.
pub fn parse_path(root: &TypeDescriptor, text: &str) -> Result<AccessPath> {
    parse_typed_path(root, text).map(|(path, _)| path)
}

/// Like [`parse_path`], also returning the type the path ends at.
pub fn parse_typed_path<'a>(
    root: &'a TypeDescriptor,
    text: &str,
) -> Result<(AccessPath, &'a TypeDescriptor)> {
    let path_error = |reason: String| LiteralError::Path {
        text: text.to_string(),
        reason,
    };

    let mut path = AccessPath::new();
    let mut ty = root;
    let mut rest = text.trim();

    while let Some(first) = rest.chars().next() {
        match first {
            '.' => {
                let end = rest[1..]
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'))
                    .map_or(rest.len(), |i| i + 1);
                let name = &rest[1..end];
                if name.is_empty() {
                    return Err(path_error("empty field name".to_string()));
                }
                let TypeDescriptor::Struct(s) = ty else {
                    return Err(path_error(format!("field '{}' on {}", name, ty)));
                };
                let field = s
                    .fields
                    .iter()
                    .find(|f| f.name == name)
                    .ok_or_else(|| path_error(format!("struct {} has no field '{}'", s.name, name)))?;
                path.push(PathSegment::Field(name.to_string()));
                ty = &field.ty;
                rest = &rest[end..];
            }
            '[' => {
                let end = rest
                    .find(']')
                    .ok_or_else(|| path_error("unclosed '['".to_string()))?;
                let inner = rest[1..end].trim();
                let index = parse_u256(inner)
                    .ok_or_else(|| path_error(format!("invalid index '{}'", inner)))?;
                ty = match ty {
                    TypeDescriptor::FixedArray { element, .. }
                    | TypeDescriptor::DynamicArray { element } => &**element,
                    other => return Err(path_error(format!("index on {}", other))),
                };
                path.push(PathSegment::Index(index));
                rest = &rest[end + 1..];
            }
            '{' => {
                let end = closing_brace(rest)
                    .ok_or_else(|| path_error("unclosed '{'".to_string()))?;
                let inner = &rest[1..end];
                let TypeDescriptor::Mapping { key, value } = ty else {
                    return Err(path_error(format!("key on {}", ty)));
                };
                path.push(PathSegment::Key(parse_value(key, inner)?));
                ty = &**value;
                rest = &rest[end + 1..];
            }
            other => return Err(path_error(format!("unexpected '{}'", other))),
        }
        rest = rest.trim_start();
    }
    Ok((path, ty))
}

/// Byte index of the `}` closing the `{` at the start of `text`, skipping
/// quoted strings.
fn closing_brace(text: &str) -> Option<usize> {
    let mut in_quote = false;
    let mut escaped = false;
    for (i, c) in text.char_indices().skip(1) {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quote => escaped = true,
            '"' => in_quote = !in_quote,
            '}' if !in_quote => return Some(i),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotscope_core::{Field, TypeDescriptor as T};

    #[test]
    fn test_integers() {
        assert_eq!(parse_value(&T::Uint(32), "42").unwrap(), Value::uint(42));
        assert_eq!(parse_value(&T::Uint(1), "0xff").unwrap(), Value::uint(255));
        assert_eq!(parse_value(&T::Int(2), "-300").unwrap(), Value::int(-300));
        assert_eq!(
            parse_value(&T::Int(32), &format!("-{}", U256::from(1u8) << 255usize)).unwrap(),
            Value::Int(I256::MIN)
        );
        assert!(parse_value(&T::Uint(32), "-1").is_err());
        assert!(parse_value(&T::Uint(32), "twelve").is_err());
    }

    #[test]
    fn test_bool_address_bytes() {
        assert_eq!(parse_value(&T::Bool, "true").unwrap(), Value::Bool(true));
        assert!(parse_value(&T::Bool, "yes").is_err());

        let addr = parse_value(&T::Address, "0x0000000000000000000000000000000000000001").unwrap();
        assert_eq!(addr, Value::Address(Address::with_last_byte(1)));

        assert_eq!(
            parse_value(&T::FixedBytes(4), "0xdeadbeef").unwrap(),
            Value::FixedBytes(vec![0xde, 0xad, 0xbe, 0xef])
        );
        assert!(parse_value(&T::FixedBytes(2), "0xdeadbeef").is_err());
        assert_eq!(parse_value(&T::Bytes, "0x123").unwrap(), Value::Bytes(vec![0x01, 0x23]));
    }

    #[test]
    fn test_strings() {
        assert_eq!(parse_value(&T::String, "hello").unwrap(), Value::from("hello"));
        assert_eq!(
            parse_value(&T::String, r#""quoted \"text\"""#).unwrap(),
            Value::from("quoted \"text\"")
        );
    }

    #[test]
    fn test_json_composites() {
        let person = T::structure(
            "Person",
            vec![
                Field::new("name", T::String),
                Field::new("age", T::Uint(1)),
                Field::new("badges", T::mapping(T::Uint(32), T::Bool)),
            ],
        );
        let value = parse_value(&person, r#"{"age": 30, "name": "alice"}"#).unwrap();
        assert_eq!(
            value,
            Value::Struct(vec![
                ("name".to_string(), Value::from("alice")),
                ("age".to_string(), Value::uint(30)),
            ])
        );

        let list = parse_value(&T::dynamic_array(T::Uint(32)), r#"[1, "0x02", 3]"#).unwrap();
        assert_eq!(
            list,
            Value::Array(vec![Value::uint(1), Value::uint(2), Value::uint(3)])
        );

        assert!(parse_value(&person, r#"{"name": "bob"}"#).is_err());
        assert!(parse_value(&person, r#"{"name": "bob", "age": 1, "extra": 2}"#).is_err());
    }

    #[test]
    fn test_parse_path() {
        let person = T::structure(
            "Person",
            vec![
                Field::new("name", T::String),
                Field::new("scores", T::dynamic_array(T::Uint(32))),
            ],
        );
        let root = T::mapping(T::Address, T::fixed_array(person, 4));
        let path = parse_path(
            &root,
            "{0x00000000000000000000000000000000000000aa}[3] .scores[0x10]",
        )
        .unwrap();

        assert_eq!(
            path,
            AccessPath::new()
                .key(Address::with_last_byte(0xaa))
                .index(3)
                .field("scores")
                .index(16)
        );
    }

    #[test]
    fn test_typed_path_reports_leaf_type() {
        let root = T::mapping(T::Uint(32), T::dynamic_array(T::Bool));
        let (path, ty) = parse_typed_path(&root, "{7}").unwrap();
        assert_eq!(path.len(), 1);
        assert_eq!(ty, &T::dynamic_array(T::Bool));

        let (_, ty) = parse_typed_path(&root, "{7}[0]").unwrap();
        assert_eq!(ty, &T::Bool);
    }

    #[test]
    fn test_path_with_string_key() {
        let root = T::mapping(T::String, T::Uint(32));
        let path = parse_path(&root, r#"{"a}b"}"#).unwrap();
        assert_eq!(path, AccessPath::new().key("a}b"));
    }

    #[test]
    fn test_path_errors() {
        let root = T::dynamic_array(T::Uint(32));
        assert!(matches!(
            parse_path(&root, ".length"),
            Err(LiteralError::Path { .. })
        ));
        assert!(matches!(
            parse_path(&root, "[1"),
            Err(LiteralError::Path { .. })
        ));
        assert!(matches!(
            parse_path(&root, "[0][1]"),
            Err(LiteralError::Path { .. })
        ));
        assert!(parse_path(&root, "").unwrap().is_empty());
    }
}
