//! stache Parser
//!
//! Parses the token stream from `stache-lexer` into a concrete syntax
//! tree: a [`Template`] of tags, text runs, comments and `{{ }}`
//! mustaches. Closing tags must repeat the opening tag's name exactly.
//!
//! ```
//! use stache_parser::{parse, Node};
//!
//! let template = parse("<p>Hello {{ name }}!</p>").unwrap();
//! let Node::Tag(p) = &template.children[0] else { panic!() };
//! assert_eq!(p.name, "p");
//! assert_eq!(p.children.len(), 3);
//! ```

use std::fmt;

use stache_lexer::{LexErrorKind, LexerError, Span, TokenKind};

pub mod ast;
pub mod parser;

pub use ast::{Attribute, AttributeValue, Comment, Mustache, Node, Tag, Template, Text};
pub use parser::Parser;

/// Parse a complete template.
pub fn parse(source: &str) -> Result<Template, ParseError> {
    Parser::new(source)?.parse()
}

/// What the parser was looking for when it hit an unexpected token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    Token(TokenKind),
    /// The start of a tag, text, comment or mustache.
    Node,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Token(kind) => fmt::Display::fmt(kind, f),
            Expected::Node => f.write_str("a tag, text, comment or mustache"),
        }
    }
}

/// What went wrong while parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    /// The source handed over a language boundary was not a string.
    #[error("invalid input: expected a string, got {found}")]
    InvalidInput { found: String },

    #[error("{0}")]
    Lex(LexErrorKind),

    #[error("unexpected token: expected {expected}, got {actual}")]
    UnexpectedToken { expected: Expected, actual: TokenKind },

    #[error("end tag `{actual}` does not match start tag `{expected}`")]
    TagMismatch { expected: String, actual: String },

    #[error("no more tokens after end of input")]
    ExhaustedStream,
}

/// Parser error with position information.
///
/// For grammar errors `span` is the offending token; for lexer errors it
/// is the zero-length position where scanning failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Parse error at line {}, column {}: {kind}", .span.line, .span.column)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Byte offset of the failure.
    pub fn offset(&self) -> usize {
        self.span.start
    }
}

impl From<LexerError> for ParseError {
    fn from(err: LexerError) -> Self {
        ParseError {
            kind: ParseErrorKind::Lex(err.kind),
            span: Span::new(err.offset, err.offset, err.line, err.column),
        }
    }
}
