//! Tokenization for the declaration language.
//!
//! Uses the logos crate for fast lexical analysis.

use logos::Logos;

/// Token types for storage declarations
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")] // Skip whitespace
pub enum Token {
    // ========== Keywords ==========
    #[token("contract")]
    Contract,

    #[token("struct")]
    Struct,

    #[token("mapping")]
    Mapping,

    // Visibility is accepted and ignored
    #[token("public")]
    #[token("private")]
    #[token("internal")]
    Visibility,

    // ========== Numbers ==========
    #[regex(r"[0-9]+", |lex| lex.slice().parse().ok())]
    Number(u64),

    // ========== Identifiers (type names, variables, fields) ==========
    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // ========== Symbols ==========
    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(";")]
    Semicolon,

    #[token("=>")]
    Arrow,

    // ========== Comments (skipped) ==========
    #[regex(r"//[^\n]*", logos::skip)]
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/", logos::skip)]
    Comment,
}

impl Token {
    /// Human-readable form for error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Contract => "'contract'".to_string(),
            Token::Struct => "'struct'".to_string(),
            Token::Mapping => "'mapping'".to_string(),
            Token::Visibility => "visibility".to_string(),
            Token::Number(n) => format!("number {}", n),
            Token::Identifier(name) => format!("identifier '{}'", name),
            Token::LBrace => "'{'".to_string(),
            Token::RBrace => "'}'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::LBracket => "'['".to_string(),
            Token::RBracket => "']'".to_string(),
            Token::Semicolon => "';'".to_string(),
            Token::Arrow => "'=>'".to_string(),
            Token::Comment => "comment".to_string(),
        }
    }
}

/// Input the lexer could not match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub text: String,
    pub line: usize,
}

/// Lexer wrapper that tracks line numbers
pub struct Lexer<'source> {
    inner: logos::Lexer<'source, Token>,
    source: &'source str,
}

impl<'source> Lexer<'source> {
    /// Create a new lexer for the given source
    pub fn new(source: &'source str) -> Self {
        Self {
            inner: Token::lexer(source),
            source,
        }
    }

    /// Get the span of the current token
    pub fn span(&self) -> std::ops::Range<usize> {
        self.inner.span()
    }

    /// Count line number based on position in source
    fn line_at_pos(&self, pos: usize) -> usize {
        1 + self.source[..pos].chars().filter(|c| *c == '\n').count()
    }
}

impl<'source> Iterator for Lexer<'source> {
    type Item = Result<(Token, usize), LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.inner.next()?;
        let line = self.line_at_pos(self.inner.span().start);
        Some(match token {
            Ok(token) => Ok((token, line)),
            Err(()) => Err(LexError {
                text: self.inner.slice().to_string(),
                line,
            }),
        })
    }
}
