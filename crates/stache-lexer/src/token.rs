use std::fmt;

/// A half-open byte range `[start, end)` into the source, plus the
/// line and column of `start` for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Widen this span up to `other.end`, keeping this span's start position.
    pub fn to(self, other: Span) -> Span {
        Span { end: other.end, ..self }
    }

    /// The source text this span covers.
    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

/// Token classification for stache source.
///
/// The kind set is closed. Every kind has a stable identifier (see
/// [`TokenKind::as_str`]); delimiter kinds additionally have fixed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum TokenKind {
    // Tags
    OpenTag,          // <
    OpenTagWithSlash, // </
    CloseTag,         // >
    SelfCloseTag,     // />
    TagName,

    // Attributes
    AttributeKey,
    AttributeText,
    Equals,

    // Interpolation
    OpenMustache,  // {{
    CloseMustache, // }}
    MustacheValue,

    // Comments
    OpenComment,  // <!--
    CloseComment, // -->
    CommentText,

    Text,

    // End of input
    #[cfg_attr(feature = "serde", serde(rename = "end-of-input"))]
    Eof,
}

impl TokenKind {
    /// Stable identifier for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::OpenTag => "open-tag",
            TokenKind::OpenTagWithSlash => "open-tag-with-slash",
            TokenKind::CloseTag => "close-tag",
            TokenKind::SelfCloseTag => "self-close-tag",
            TokenKind::TagName => "tag-name",
            TokenKind::AttributeKey => "attribute-key",
            TokenKind::AttributeText => "attribute-text",
            TokenKind::Equals => "equals",
            TokenKind::OpenMustache => "open-mustache",
            TokenKind::CloseMustache => "close-mustache",
            TokenKind::MustacheValue => "mustache-value",
            TokenKind::OpenComment => "open-comment",
            TokenKind::CloseComment => "close-comment",
            TokenKind::CommentText => "comment-text",
            TokenKind::Text => "text",
            TokenKind::Eof => "end-of-input",
        }
    }

    /// The fixed source text of a delimiter kind, `None` for kinds whose
    /// value depends on the input.
    pub fn delimiter(self) -> Option<&'static str> {
        match self {
            TokenKind::OpenTag => Some("<"),
            TokenKind::OpenTagWithSlash => Some("</"),
            TokenKind::CloseTag => Some(">"),
            TokenKind::SelfCloseTag => Some("/>"),
            TokenKind::Equals => Some("="),
            TokenKind::OpenMustache => Some("{{"),
            TokenKind::CloseMustache => Some("}}"),
            TokenKind::OpenComment => Some("<!--"),
            TokenKind::CloseComment => Some("-->"),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.delimiter() {
            Some(text) => write!(f, "{}(\"{text}\")", self.as_str()),
            None => f.write_str(self.as_str()),
        }
    }
}

/// A token produced by the stache scanner.
///
/// `value` borrows the exact source text the token covers. For
/// [`TokenKind::Eof`] it is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub value: &'a str,
    pub span: Span,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, value: &'a str, span: Span) -> Self {
        Self { kind, value, span }
    }
}
