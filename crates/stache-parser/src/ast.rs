//! Concrete syntax tree for stache templates.
//!
//! Every node carries the [`Span`] of the full construct, delimiters
//! included. Text, comment and mustache payloads are stored raw: no
//! unescaping, no trimming.

use stache_lexer::Span;

/// The root of a parsed template.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
pub struct Template {
    pub children: Vec<Node>,
    pub span: Span,
}

/// A node that may appear at the top level or inside a tag.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
pub enum Node {
    /// An element, `<name attrs>children</name>` or `<name attrs/>`.
    Tag(Tag),

    /// A run of raw text between markup.
    Text(Text),

    /// A `{{ expr }}` placeholder.
    Mustache(Mustache),

    /// A `<!-- comment -->`.
    Comment(Comment),
}

impl Node {
    pub fn span(&self) -> Span {
        match self {
            Node::Tag(tag) => tag.span,
            Node::Text(text) => text.span,
            Node::Mustache(mustache) => mustache.span,
            Node::Comment(comment) => comment.span,
        }
    }
}

/// An element. `children` is always empty for self-closing tags.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Tag {
    pub name: String,
    pub attrs: Vec<Attribute>,
    pub children: Vec<Node>,
    pub span: Span,
}

/// An attribute on an element. Duplicated keys are kept in source order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
pub struct Attribute {
    pub key: String,
    pub value: AttributeValue,
    pub span: Span,
}

/// The value of an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// `key="value"`: the quoted text, quotes included.
    Text(String),
    /// A bare `key` with no `=value` part.
    Present,
}

impl AttributeValue {
    /// The raw quoted text, `None` for a bare attribute.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(text) => Some(text),
            AttributeValue::Present => None,
        }
    }
}

// Bare attributes serialize as `true`, quoted ones as their raw text.
#[cfg(feature = "serde")]
impl serde::Serialize for AttributeValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AttributeValue::Text(text) => serializer.serialize_str(text),
            AttributeValue::Present => serializer.serialize_bool(true),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Text {
    pub text: String,
    pub span: Span,
}

/// The `expr` is the raw text between `{{` and `}}`; it is not parsed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Mustache {
    pub expr: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Comment {
    pub comment: String,
    pub span: Span,
}
