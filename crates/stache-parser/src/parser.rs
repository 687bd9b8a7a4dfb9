//! Template parser for stache.
//!
//! Pulls tokens lazily from a [`Scanner`] and builds a [`Template`] by
//! recursive descent with one token of lookahead. Grammar:
//!
//! ```text
//! template  = node* EOF
//! node      = tag | text | comment | mustache
//! tag       = "<" name attribute* ( "/>" | ">" node* "</" name ">" )
//! attribute = key ( "=" quoted )?
//! comment   = "<!--" comment-text "-->"
//! mustache  = "{{" mustache-value "}}"
//! ```

use stache_lexer::{Scanner, Token, TokenKind};
use tracing::debug;

use crate::ast::{Attribute, AttributeValue, Comment, Mustache, Node, Tag, Template, Text};
use crate::{Expected, ParseError, ParseErrorKind};

/// stache template parser.
///
/// Single use: construct it over a source string, call [`Parser::parse`].
pub struct Parser<'a> {
    scanner: Scanner<'a>,
    current: Token<'a>,
}

impl<'a> Parser<'a> {
    /// Create a parser over `source` and scan its first token.
    pub fn new(source: &'a str) -> Result<Self, ParseError> {
        let mut scanner = Scanner::new(source);
        let current = match scanner.next() {
            Some(token) => token?,
            None => return Err(ParseError::new(ParseErrorKind::ExhaustedStream, Default::default())),
        };
        Ok(Self { scanner, current })
    }

    /// Parse the whole token stream into a template.
    ///
    /// The template spans from the first token to the end of input, so an
    /// empty source gives an empty template at `[0, 0)`.
    #[tracing::instrument(level = "debug", skip_all, fields(len = self.scanner.source().len()))]
    pub fn parse(mut self) -> Result<Template, ParseError> {
        let start = self.current.span;
        let mut children = Vec::new();

        while self.current.kind != TokenKind::Eof {
            match self.parse_node() {
                Ok(node) => children.push(node),
                Err(err) => {
                    debug!(%err, "parse failed");
                    return Err(err);
                }
            }
        }

        Ok(Template {
            children,
            span: start.to(self.current.span),
        })
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    fn parse_node(&mut self) -> Result<Node, ParseError> {
        match self.current.kind {
            TokenKind::OpenTag => Ok(Node::Tag(self.parse_tag()?)),
            TokenKind::Text => Ok(Node::Text(self.parse_text()?)),
            TokenKind::OpenComment => Ok(Node::Comment(self.parse_comment()?)),
            TokenKind::OpenMustache => Ok(Node::Mustache(self.parse_mustache()?)),
            actual => Err(self.error(ParseErrorKind::UnexpectedToken {
                expected: Expected::Node,
                actual,
            })),
        }
    }

    /// Parse a tag:
    /// ```text
    /// <div class="foo" hidden>children</div>
    /// <br/>
    /// ```
    fn parse_tag(&mut self) -> Result<Tag, ParseError> {
        let open = self.expect(TokenKind::OpenTag)?;
        let name = self.expect(TokenKind::TagName)?.value;

        let mut attrs = Vec::new();
        while self.current.kind == TokenKind::AttributeKey {
            attrs.push(self.parse_attribute()?);
        }

        if self.current.kind == TokenKind::SelfCloseTag {
            let close = self.expect(TokenKind::SelfCloseTag)?;
            return Ok(Tag {
                name: name.to_string(),
                attrs,
                children: Vec::new(),
                span: open.span.to(close.span),
            });
        }

        self.expect(TokenKind::CloseTag)?;

        let mut children = Vec::new();
        while self.current.kind != TokenKind::OpenTagWithSlash {
            children.push(self.parse_node()?);
        }

        self.expect(TokenKind::OpenTagWithSlash)?;
        let end_name = self.expect(TokenKind::TagName)?;
        if end_name.value != name {
            return Err(ParseError::new(
                ParseErrorKind::TagMismatch {
                    expected: name.to_string(),
                    actual: end_name.value.to_string(),
                },
                end_name.span,
            ));
        }
        let close = self.expect(TokenKind::CloseTag)?;

        Ok(Tag {
            name: name.to_string(),
            attrs,
            children,
            span: open.span.to(close.span),
        })
    }

    /// Parse `key="value"` or a bare `key`.
    fn parse_attribute(&mut self) -> Result<Attribute, ParseError> {
        let key = self.expect(TokenKind::AttributeKey)?;

        if self.current.kind != TokenKind::Equals {
            return Ok(Attribute {
                key: key.value.to_string(),
                value: AttributeValue::Present,
                span: key.span,
            });
        }

        self.expect(TokenKind::Equals)?;
        let value = self.expect(TokenKind::AttributeText)?;
        Ok(Attribute {
            key: key.value.to_string(),
            value: AttributeValue::Text(value.value.to_string()),
            span: key.span.to(value.span),
        })
    }

    fn parse_text(&mut self) -> Result<Text, ParseError> {
        let token = self.expect(TokenKind::Text)?;
        Ok(Text {
            text: token.value.to_string(),
            span: token.span,
        })
    }

    fn parse_comment(&mut self) -> Result<Comment, ParseError> {
        let open = self.expect(TokenKind::OpenComment)?;
        let comment = self.expect(TokenKind::CommentText)?.value;
        let close = self.expect(TokenKind::CloseComment)?;
        Ok(Comment {
            comment: comment.to_string(),
            span: open.span.to(close.span),
        })
    }

    fn parse_mustache(&mut self) -> Result<Mustache, ParseError> {
        let open = self.expect(TokenKind::OpenMustache)?;
        let expr = self.expect(TokenKind::MustacheValue)?.value;
        let close = self.expect(TokenKind::CloseMustache)?;
        Ok(Mustache {
            expr: expr.to_string(),
            span: open.span.to(close.span),
        })
    }

    // =========================================================================
    // Token navigation helpers
    // =========================================================================

    /// Consume the current token if it has the given kind and return it.
    fn expect(&mut self, kind: TokenKind) -> Result<Token<'a>, ParseError> {
        if self.current.kind != kind {
            return Err(self.error(ParseErrorKind::UnexpectedToken {
                expected: Expected::Token(kind),
                actual: self.current.kind,
            }));
        }
        let token = self.current;
        self.advance()?;
        Ok(token)
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current = match self.scanner.next() {
            Some(token) => token?,
            None => return Err(self.error(ParseErrorKind::ExhaustedStream)),
        };
        Ok(())
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(kind, self.current.span)
    }
}
