//! Storage declaration language for slotscope.
//!
//! Turns a Solidity-like list of state variables and struct definitions into
//! a [`Declaration`], and parses value and path literals against it.
//!
//! # Example
//!
//! ```
//! use slotscope_schema::parse_declaration;
//!
//! let source = r#"
//!     struct Position {
//!         uint128 size;
//!         int64 entry;
//!     }
//!
//!     uint256 totalSupply;
//!     mapping(address => Position) positions;
//!     address[] traders;
//! "#;
//!
//! let declaration = parse_declaration(source).unwrap();
//! assert_eq!(declaration.len(), 3);
//! ```
//!
//! # Pipeline
//!
//! 1. **Lexer** - Tokenizes the source into keywords, identifiers, numbers
//!    and symbols, skipping `//` and `/* */` comments
//! 2. **Parser** - Reads struct definitions and variables, then resolves
//!    struct references into nested type descriptors
//!
//! A source that starts with `[` is read as the JSON form of a declaration
//! instead.

pub mod lexer;
pub mod literal;
pub mod parser;

use slotscope_core::Declaration;
use thiserror::Error;

/// Schema errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("parse error: {0}")]
    Parse(#[from] parser::ParseError),

    #[error("json schema error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SchemaError>;

/// Parse a declaration from either the declaration language or JSON.
pub fn parse_declaration(source: &str) -> Result<Declaration> {
    if source.trim_start().starts_with('[') {
        return Ok(serde_json::from_str(source)?);
    }
    Ok(parser::Parser::parse(source)?)
}

// Re-export commonly used types
pub use lexer::{LexError, Lexer, Token};
pub use literal::{parse_path, parse_typed_path, parse_value, value_from_json, LiteralError};
pub use parser::{ParseError, Parser};

#[cfg(test)]
mod tests {
    use super::*;
    use slotscope_core::TypeDescriptor as T;

    #[test]
    fn test_language_and_json_agree() {
        let source = "uint8 a;\nmapping(address => bool) seen;";
        let from_language = parse_declaration(source).unwrap();

        let json = serde_json::to_string(&from_language).unwrap();
        let from_json = parse_declaration(&json).unwrap();

        assert_eq!(from_language, from_json);
        assert_eq!(from_json.get("a"), Some(&T::Uint(1)));
    }

    #[test]
    fn test_errors_are_wrapped() {
        assert!(matches!(
            parse_declaration("uint8"),
            Err(SchemaError::Parse(_))
        ));
        assert!(matches!(
            parse_declaration("[{\"name\": 1}]"),
            Err(SchemaError::Json(_))
        ));
    }
}
