//! Parse declaration source into a [`Declaration`].
//!
//! ```text
//! source      := item* | "contract" IDENT "{" item* "}"
//! item        := struct_def | variable
//! struct_def  := "struct" IDENT "{" (type IDENT ";")+ "}"
//! variable    := type visibility? IDENT ";"
//! type        := base ("[" NUMBER? "]")*
//! base        := "mapping" "(" type "=>" type ")" | IDENT
//! ```
//!
//! Struct definitions may appear in any order; references are resolved once
//! the whole source has been read.

use crate::lexer::{Lexer, Token};
use slotscope_core::{Declaration, Field, TypeDescriptor};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Parse errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("unexpected token at line {line}: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: usize,
    },

    #[error("unexpected end of input: expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("invalid input '{text}' at line {line}")]
    InvalidCharacter { text: String, line: usize },

    #[error("invalid type '{name}' at line {line}")]
    InvalidType { name: String, line: usize },

    #[error("unknown type '{name}' at line {line}")]
    UnknownType { name: String, line: usize },

    #[error("duplicate struct '{name}' at line {line} (first defined at line {first_line})")]
    DuplicateStruct {
        name: String,
        line: usize,
        first_line: usize,
    },

    #[error("struct '{name}' contains itself")]
    RecursiveStruct { name: String },
}

pub type Result<T> = std::result::Result<T, ParseError>;

/// A type as written, before struct references are resolved.
#[derive(Debug, Clone, PartialEq)]
enum TypeExpr {
    Named { name: String, line: usize },
    Mapping(Box<TypeExpr>, Box<TypeExpr>),
    FixedArray(Box<TypeExpr>, u64),
    DynamicArray(Box<TypeExpr>),
}

#[derive(Debug, Clone)]
struct StructDef {
    fields: Vec<(String, TypeExpr)>,
    line: usize,
}

/// Parser state
pub struct Parser {
    tokens: Vec<(Token, usize)>,
    position: usize,
    structs: HashMap<String, StructDef>,
    variables: Vec<(String, TypeExpr)>,
}

impl Parser {
    /// Create a new parser
    pub fn new(source: &str) -> Result<Self> {
        let tokens = Lexer::new(source)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|err| ParseError::InvalidCharacter {
                text: err.text,
                line: err.line,
            })?;
        Ok(Self {
            tokens,
            position: 0,
            structs: HashMap::new(),
            variables: Vec::new(),
        })
    }

    /// Parse a complete declaration source
    pub fn parse(source: &str) -> Result<Declaration> {
        let mut parser = Self::new(source)?;
        parser.parse_source()?;
        parser.finish()
    }

    fn parse_source(&mut self) -> Result<()> {
        if self.peek() == Some(&Token::Contract) {
            self.advance();
            self.expect_identifier("contract name")?;
            self.expect(Token::LBrace)?;
            while self.peek() != Some(&Token::RBrace) {
                self.parse_item()?;
            }
            self.expect(Token::RBrace)?;
            if let Some((token, line)) = self.tokens.get(self.position) {
                return Err(ParseError::UnexpectedToken {
                    expected: "end of input".to_string(),
                    found: token.describe(),
                    line: *line,
                });
            }
            return Ok(());
        }

        while !self.is_at_end() {
            self.parse_item()?;
        }
        Ok(())
    }

    fn parse_item(&mut self) -> Result<()> {
        if self.peek() == Some(&Token::Struct) {
            return self.parse_struct();
        }
        let ty = self.parse_type()?;
        while self.peek() == Some(&Token::Visibility) {
            self.advance();
        }
        let name = self.expect_identifier("variable name")?;
        self.expect(Token::Semicolon)?;
        self.variables.push((name, ty));
        Ok(())
    }

    fn parse_struct(&mut self) -> Result<()> {
        let (_, line) = self.advance()?;
        let name = self.expect_identifier("struct name")?;
        self.expect(Token::LBrace)?;

        let mut fields = Vec::new();
        while self.peek() != Some(&Token::RBrace) {
            let ty = self.parse_type()?;
            let field = self.expect_identifier("field name")?;
            self.expect(Token::Semicolon)?;
            fields.push((field, ty));
        }
        self.expect(Token::RBrace)?;

        if let Some(first) = self.structs.get(&name) {
            return Err(ParseError::DuplicateStruct {
                name,
                line,
                first_line: first.line,
            });
        }
        self.structs.insert(name, StructDef { fields, line });
        Ok(())
    }

    fn parse_type(&mut self) -> Result<TypeExpr> {
        let (token, line) = self.advance()?;
        let mut ty = match token {
            Token::Mapping => {
                self.expect(Token::LParen)?;
                let key = self.parse_type()?;
                self.expect(Token::Arrow)?;
                let value = self.parse_type()?;
                self.expect(Token::RParen)?;
                TypeExpr::Mapping(Box::new(key), Box::new(value))
            }
            Token::Identifier(name) => TypeExpr::Named { name, line },
            other => {
                return Err(ParseError::UnexpectedToken {
                    expected: "type".to_string(),
                    found: other.describe(),
                    line,
                })
            }
        };

        // Array suffixes apply left to right: uint8[3][] is a dynamic array of uint8[3]
        while self.peek() == Some(&Token::LBracket) {
            self.advance();
            let (token, line) = self.advance()?;
            ty = match token {
                Token::RBracket => TypeExpr::DynamicArray(Box::new(ty)),
                Token::Number(length) => {
                    self.expect(Token::RBracket)?;
                    TypeExpr::FixedArray(Box::new(ty), length)
                }
                other => {
                    return Err(ParseError::UnexpectedToken {
                        expected: "array length or ']'".to_string(),
                        found: other.describe(),
                        line,
                    })
                }
            };
        }
        Ok(ty)
    }

    /// Resolve struct references and build the declaration.
    fn finish(self) -> Result<Declaration> {
        let mut declaration = Declaration::new();
        for (name, expr) in &self.variables {
            let mut stack = Vec::new();
            declaration.push(name.clone(), self.resolve(expr, &mut stack)?);
        }
        debug!(
            variables = declaration.len(),
            structs = self.structs.len(),
            "parsed declaration"
        );
        Ok(declaration)
    }

    fn resolve(&self, expr: &TypeExpr, stack: &mut Vec<String>) -> Result<TypeDescriptor> {
        match expr {
            TypeExpr::Mapping(key, value) => Ok(TypeDescriptor::mapping(
                self.resolve(key, stack)?,
                self.resolve(value, stack)?,
            )),
            TypeExpr::FixedArray(element, length) => Ok(TypeDescriptor::fixed_array(
                self.resolve(element, stack)?,
                *length,
            )),
            TypeExpr::DynamicArray(element) => Ok(TypeDescriptor::dynamic_array(
                self.resolve(element, stack)?,
            )),
            TypeExpr::Named { name, line } => {
                if let Some(ty) = elementary(name, *line)? {
                    return Ok(ty);
                }
                let def = self.structs.get(name).ok_or_else(|| ParseError::UnknownType {
                    name: name.clone(),
                    line: *line,
                })?;
                if stack.contains(name) {
                    return Err(ParseError::RecursiveStruct { name: name.clone() });
                }

                stack.push(name.clone());
                let mut fields = Vec::with_capacity(def.fields.len());
                for (field, expr) in &def.fields {
                    fields.push(Field::new(field.clone(), self.resolve(expr, stack)?));
                }
                stack.pop();
                Ok(TypeDescriptor::structure(name.clone(), fields))
            }
        }
    }

    /// Expect a specific token
    fn expect(&mut self, expected: Token) -> Result<()> {
        let (token, line) = self.advance_or(&expected.describe())?;
        if token == expected {
            Ok(())
        } else {
            Err(ParseError::UnexpectedToken {
                expected: expected.describe(),
                found: token.describe(),
                line,
            })
        }
    }

    /// Expect an identifier
    fn expect_identifier(&mut self, what: &str) -> Result<String> {
        let (token, line) = self.advance_or(what)?;
        match token {
            Token::Identifier(name) => Ok(name),
            other => Err(ParseError::UnexpectedToken {
                expected: what.to_string(),
                found: other.describe(),
                line,
            }),
        }
    }

    /// Advance to next token
    fn advance(&mut self) -> Result<(Token, usize)> {
        self.advance_or("more input")
    }

    fn advance_or(&mut self, expected: &str) -> Result<(Token, usize)> {
        let token = self
            .tokens
            .get(self.position)
            .cloned()
            .ok_or_else(|| ParseError::UnexpectedEof {
                expected: expected.to_string(),
            })?;
        self.position += 1;
        Ok(token)
    }

    /// Peek at current token
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position).map(|(token, _)| token)
    }

    /// Check if at end of input
    fn is_at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }
}

/// Resolve an elementary type name such as `uint64`, `int`, `bytes4`.
///
/// Returns `Ok(None)` for names that are not elementary (struct references).
fn elementary(name: &str, line: usize) -> Result<Option<TypeDescriptor>> {
    let invalid = || ParseError::InvalidType {
        name: name.to_string(),
        line,
    };
    let ty = match name {
        "bool" => TypeDescriptor::Bool,
        "address" => TypeDescriptor::Address,
        "string" => TypeDescriptor::String,
        "bytes" => TypeDescriptor::Bytes,
        "byte" => TypeDescriptor::FixedBytes(1),
        "uint" => TypeDescriptor::Uint(32),
        "int" => TypeDescriptor::Int(32),
        _ => {
            let (prefix, digits) = match name.find(|c: char| c.is_ascii_digit()) {
                Some(split) => name.split_at(split),
                None => return Ok(None),
            };
            if !matches!(prefix, "uint" | "int" | "bytes") {
                return Ok(None);
            }
            let n: u32 = digits.parse().map_err(|_| invalid())?;
            match prefix {
                "bytes" if (1..=32).contains(&n) => TypeDescriptor::FixedBytes(n as u8),
                "uint" if n % 8 == 0 && (8..=256).contains(&n) => TypeDescriptor::Uint((n / 8) as u8),
                "int" if n % 8 == 0 && (8..=256).contains(&n) => TypeDescriptor::Int((n / 8) as u8),
                _ => return Err(invalid()),
            }
        }
    };
    Ok(Some(ty))
}
