//! stache Lexer
//!
//! Tokenizes stache templates (HTML tags, attributes, comments, text and
//! `{{ expr }}` interpolation) into a lazy stream of positioned tokens.
//! Mustache payloads are captured verbatim and never parsed.
//!
//! # Example
//!
//! ```
//! use stache_lexer::{Scanner, TokenKind};
//!
//! let tokens = Scanner::tokenize("").unwrap();
//! assert_eq!(tokens.len(), 1); // Just EOF
//! assert_eq!(tokens[0].kind, TokenKind::Eof);
//! ```

pub mod scanner;
pub mod token;

pub use scanner::Scanner;
pub use token::{Span, Token, TokenKind};

/// What went wrong while scanning.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexErrorKind {
    #[error("unterminated comment, expected `-->`")]
    UnterminatedComment,
    #[error("unterminated mustache, expected `}}}}`")]
    UnterminatedMustache,
    #[error("unterminated attribute value, expected closing {quote}")]
    UnterminatedAttributeValue { quote: char },
    #[error("invalid tag name")]
    InvalidTagName,
    #[error("invalid attribute")]
    InvalidAttribute,
}

/// Lexer error with position information.
///
/// `offset` is the byte position of the cursor when scanning failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Lexer error at line {line}, column {column}: {kind}")]
pub struct LexerError {
    pub kind: LexErrorKind,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}
