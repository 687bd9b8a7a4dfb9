use std::iter::FusedIterator;

use tracing::{debug, trace};

use crate::token::{Span, Token, TokenKind};
use crate::{LexErrorKind, LexerError};

/// What the scanner expects to read next.
///
/// `Markup` is the default mode; `TagName` and `Attributes` make up the
/// attribute sub-sequence of an opening or closing tag, which ends when a
/// `>` or `/>` is produced. The remaining states finish a comment or
/// mustache whose opening delimiter has already been emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Markup,
    TagName,
    Attributes,
    CommentText,
    CloseComment,
    MustacheValue,
    CloseMustache,
}

/// Saved cursor position, used as the start of a token.
#[derive(Debug, Clone, Copy)]
struct Mark {
    pos: usize,
    line: usize,
    column: usize,
}

/// stache source scanner.
///
/// A lazy, pull-based token stream over a borrowed source string. Each
/// call to [`Iterator::next`] scans exactly one token and resumes where
/// the previous call stopped. The stream is finite: it yields
/// [`TokenKind::Eof`] once and then `None`. Scanning errors are terminal,
/// after an `Err` the stream is finished as well.
///
/// Offsets are byte offsets into the source. Lines and columns are
/// 1-based, with columns counted in characters.
pub struct Scanner<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    state: State,
    finished: bool,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner for the given source.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            column: 1,
            state: State::Markup,
            finished: false,
        }
    }

    /// Tokenize the entire source into a vector of tokens.
    ///
    /// The last token is always [`TokenKind::Eof`].
    pub fn tokenize(source: &'a str) -> Result<Vec<Token<'a>>, LexerError> {
        Scanner::new(source).collect()
    }

    /// The source this scanner reads from.
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Scan the next token according to the current state.
    fn scan_token(&mut self) -> Result<Token<'a>, LexerError> {
        match self.state {
            State::Markup => self.scan_markup(),
            State::TagName => self.scan_tag_name(),
            State::Attributes => self.scan_attribute(),
            State::CommentText => self.scan_until(
                "-->",
                TokenKind::CommentText,
                LexErrorKind::UnterminatedComment,
                State::CloseComment,
            ),
            State::CloseComment => Ok(self.scan_delimiter(TokenKind::CloseComment, State::Markup)),
            State::MustacheValue => self.scan_until(
                "}}",
                TokenKind::MustacheValue,
                LexErrorKind::UnterminatedMustache,
                State::CloseMustache,
            ),
            State::CloseMustache => {
                Ok(self.scan_delimiter(TokenKind::CloseMustache, State::Markup))
            }
        }
    }

    // --- Markup mode ---

    /// Scan a structural marker (`<!--`, `</`, `<`, `{{`) or a run of text
    /// up to the next marker.
    fn scan_markup(&mut self) -> Result<Token<'a>, LexerError> {
        if self.is_at_end() {
            return Ok(self.eof());
        }

        let start = self.mark();
        match self.markup_marker() {
            Some(kind) => {
                let next = match kind {
                    TokenKind::OpenComment => State::CommentText,
                    TokenKind::OpenMustache => State::MustacheValue,
                    _ => State::TagName,
                };
                Ok(self.scan_delimiter(kind, next))
            }
            None => {
                // At least one character is consumed: no marker matched here.
                while !self.is_at_end() && self.markup_marker().is_none() {
                    self.advance();
                }
                Ok(self.token(TokenKind::Text, start))
            }
        }
    }

    /// The marker at the cursor, in priority order.
    fn markup_marker(&self) -> Option<TokenKind> {
        let rest = self.rest();
        if rest.starts_with("<!--") {
            Some(TokenKind::OpenComment)
        } else if rest.starts_with("</") {
            Some(TokenKind::OpenTagWithSlash)
        } else if rest.starts_with('<') {
            Some(TokenKind::OpenTag)
        } else if rest.starts_with("{{") {
            Some(TokenKind::OpenMustache)
        } else {
            None
        }
    }

    /// Scan a tag name: `[a-zA-Z][a-zA-Z0-9:-]*`.
    fn scan_tag_name(&mut self) -> Result<Token<'a>, LexerError> {
        let start = self.mark();

        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() => self.advance(),
            _ => return Err(self.error(LexErrorKind::InvalidTagName)),
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == ':' || c == '-') {
            self.advance();
        }

        trace!(offset = self.pos, "entering attribute mode");
        self.state = State::Attributes;
        Ok(self.token(TokenKind::TagName, start))
    }

    /// Scan everything up to (not including) `terminator` as one token.
    fn scan_until(
        &mut self,
        terminator: &str,
        kind: TokenKind,
        unterminated: LexErrorKind,
        next: State,
    ) -> Result<Token<'a>, LexerError> {
        let start = self.mark();

        while !self.rest().starts_with(terminator) {
            if self.is_at_end() {
                return Err(self.error(unterminated));
            }
            self.advance();
        }

        self.state = next;
        Ok(self.token(kind, start))
    }

    // --- Attribute mode ---

    /// Scan one token of an attribute list: a close delimiter, a key,
    /// a quoted value or `=`.
    fn scan_attribute(&mut self) -> Result<Token<'a>, LexerError> {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }

        let start = self.mark();

        if self.rest().starts_with("/>") {
            trace!(offset = self.pos, "leaving attribute mode");
            return Ok(self.scan_delimiter(TokenKind::SelfCloseTag, State::Markup));
        }

        match self.peek() {
            Some('>') => {
                trace!(offset = self.pos, "leaving attribute mode");
                Ok(self.scan_delimiter(TokenKind::CloseTag, State::Markup))
            }
            Some('=') => Ok(self.scan_delimiter(TokenKind::Equals, State::Attributes)),
            Some(quote @ ('"' | '\'')) => self.scan_attribute_value(quote),
            Some(c) if is_key_char(c) => {
                while matches!(self.peek(), Some(c) if is_key_char(c)) {
                    self.advance();
                }
                Ok(self.token(TokenKind::AttributeKey, start))
            }
            _ => Err(self.error(LexErrorKind::InvalidAttribute)),
        }
    }

    /// Scan a quoted attribute value. The token keeps both quotes.
    fn scan_attribute_value(&mut self, quote: char) -> Result<Token<'a>, LexerError> {
        let start = self.mark();
        self.advance(); // opening quote

        while self.peek().is_some_and(|c| c != quote) {
            self.advance();
        }
        if self.is_at_end() {
            return Err(self.error(LexErrorKind::UnterminatedAttributeValue { quote }));
        }

        self.advance(); // closing quote
        Ok(self.token(TokenKind::AttributeText, start))
    }

    // --- Helpers ---

    /// Consume a fixed delimiter and switch to `next`.
    fn scan_delimiter(&mut self, kind: TokenKind, next: State) -> Token<'a> {
        let start = self.mark();
        let len = kind.delimiter().map_or(0, str::len);
        // Delimiters are ASCII without newlines.
        self.pos += len;
        self.column += len;
        self.state = next;
        self.token(kind, start)
    }

    fn token(&self, kind: TokenKind, start: Mark) -> Token<'a> {
        let span = Span::new(start.pos, self.pos, start.line, start.column);
        Token::new(kind, &self.source[start.pos..self.pos], span)
    }

    fn eof(&self) -> Token<'a> {
        let len = self.source.len();
        Token::new(TokenKind::Eof, "", Span::new(len, len, self.line, self.column))
    }

    fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn error(&self, kind: LexErrorKind) -> LexerError {
        LexerError {
            kind,
            offset: self.pos,
            line: self.line,
            column: self.column,
        }
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token<'a>, LexerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let result = self.scan_token();
        match &result {
            Ok(token) => {
                trace!(
                    kind = token.kind.as_str(),
                    start = token.span.start,
                    end = token.span.end,
                    "token"
                );
                self.finished = token.kind == TokenKind::Eof;
            }
            Err(err) => {
                debug!(%err, "scan failed");
                self.finished = true;
            }
        }
        Some(result)
    }
}

impl FusedIterator for Scanner<'_> {}

/// Characters allowed in an attribute key: anything but `>`, `/`, `=`,
/// quotes and whitespace.
fn is_key_char(c: char) -> bool {
    !matches!(c, '>' | '/' | '=' | '"' | '\'') && !c.is_whitespace()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Helper: tokenize and return token kinds (ignoring spans).
    fn kinds(source: &str) -> Vec<TokenKind> {
        Scanner::tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    /// Helper: tokenize and return (kind, value) pairs.
    fn values(source: &str) -> Vec<(TokenKind, &str)> {
        Scanner::tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.value))
            .collect()
    }

    /// Helper: tokenize and return the first error.
    fn error(source: &str) -> LexerError {
        Scanner::tokenize(source).unwrap_err()
    }

    // =========================================================================
    // Structure: empty, EOF, stream behaviour
    // =========================================================================

    #[test]
    fn test_empty_source() {
        let toks = Scanner::tokenize("").unwrap();
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].kind, TokenKind::Eof);
        assert_eq!(toks[0].span, Span::new(0, 0, 1, 1));
        assert_eq!(toks[0].value, "");
    }

    #[test]
    fn test_eof_is_zero_length_at_end() {
        let toks = Scanner::tokenize("ab\ncd").unwrap();
        let eof = toks.last().unwrap();
        assert_eq!(eof.kind, TokenKind::Eof);
        assert_eq!(eof.span, Span::new(5, 5, 2, 3));
    }

    #[test]
    fn test_stream_ends_after_eof() {
        let mut scanner = Scanner::new("hi");
        assert_eq!(scanner.next().unwrap().unwrap().kind, TokenKind::Text);
        assert_eq!(scanner.next().unwrap().unwrap().kind, TokenKind::Eof);
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_stream_ends_after_error() {
        let mut scanner = Scanner::new("<1>");
        assert_eq!(scanner.next().unwrap().unwrap().kind, TokenKind::OpenTag);
        assert!(scanner.next().unwrap().is_err());
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_fresh_scanner_restarts() {
        let source = "<p>{{a}}</p>";
        let first: Vec<_> = Scanner::new(source).map(Result::unwrap).collect();
        let second: Vec<_> = Scanner::new(source).map(Result::unwrap).collect();
        assert_eq!(first, second);
    }

    // =========================================================================
    // Text
    // =========================================================================

    #[test]
    fn test_plain_text() {
        assert_eq!(
            values("hello world"),
            vec![(TokenKind::Text, "hello world"), (TokenKind::Eof, "")]
        );
    }

    #[test]
    fn test_text_stops_at_markers() {
        assert_eq!(
            kinds("a<b>c{{d}}e<!--f-->g</b>"),
            vec![
                TokenKind::Text,
                TokenKind::OpenTag,
                TokenKind::TagName,
                TokenKind::CloseTag,
                TokenKind::Text,
                TokenKind::OpenMustache,
                TokenKind::MustacheValue,
                TokenKind::CloseMustache,
                TokenKind::Text,
                TokenKind::OpenComment,
                TokenKind::CommentText,
                TokenKind::CloseComment,
                TokenKind::Text,
                TokenKind::OpenTagWithSlash,
                TokenKind::TagName,
                TokenKind::CloseTag,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_no_empty_text_between_markers() {
        let toks = Scanner::tokenize("{{a}}{{b}}").unwrap();
        assert!(toks.iter().all(|t| t.kind != TokenKind::Text));
    }

    #[test]
    fn test_single_brace_is_text() {
        assert_eq!(
            values("a { b } c"),
            vec![(TokenKind::Text, "a { b } c"), (TokenKind::Eof, "")]
        );
    }

    #[test]
    fn test_text_with_multibyte_chars() {
        let toks = Scanner::tokenize("héllo<br/>").unwrap();
        assert_eq!(toks[0].value, "héllo");
        assert_eq!(toks[0].span, Span::new(0, 6, 1, 1));
        // `<` is the sixth character but sits at byte 6.
        assert_eq!(toks[1].span, Span::new(6, 7, 1, 6));
    }

    // =========================================================================
    // Tags
    // =========================================================================

    #[test]
    fn test_open_and_close_tag() {
        assert_eq!(
            values("<div></div>"),
            vec![
                (TokenKind::OpenTag, "<"),
                (TokenKind::TagName, "div"),
                (TokenKind::CloseTag, ">"),
                (TokenKind::OpenTagWithSlash, "</"),
                (TokenKind::TagName, "div"),
                (TokenKind::CloseTag, ">"),
                (TokenKind::Eof, ""),
            ]
        );
    }

    #[test]
    fn test_self_closing_tag() {
        assert_eq!(
            kinds("<br/>"),
            vec![
                TokenKind::OpenTag,
                TokenKind::TagName,
                TokenKind::SelfCloseTag,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_self_closing_tag_with_space() {
        assert_eq!(
            kinds("<br />"),
            vec![
                TokenKind::OpenTag,
                TokenKind::TagName,
                TokenKind::SelfCloseTag,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_tag_name_with_namespace_and_hyphen() {
        let toks = Scanner::tokenize("<svg:my-el2>").unwrap();
        assert_eq!(toks[1].kind, TokenKind::TagName);
        assert_eq!(toks[1].value, "svg:my-el2");
    }

    #[test]
    fn test_invalid_tag_name() {
        let err = error("<1div>");
        assert_eq!(err.kind, LexErrorKind::InvalidTagName);
        assert_eq!(err.offset, 1);
    }

    #[test]
    fn test_lone_angle_bracket_is_a_tag() {
        let err = error("a < b");
        assert_eq!(err.kind, LexErrorKind::InvalidTagName);
        assert_eq!(err.offset, 3);
    }

    #[test]
    fn test_tag_name_at_end_of_input() {
        assert_eq!(error("</").kind, LexErrorKind::InvalidTagName);
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    #[test]
    fn test_quoted_attribute_keeps_quotes() {
        assert_eq!(
            values("<div baz=\"qux\">"),
            vec![
                (TokenKind::OpenTag, "<"),
                (TokenKind::TagName, "div"),
                (TokenKind::AttributeKey, "baz"),
                (TokenKind::Equals, "="),
                (TokenKind::AttributeText, "\"qux\""),
                (TokenKind::CloseTag, ">"),
                (TokenKind::Eof, ""),
            ]
        );
    }

    #[test]
    fn test_attribute_spans() {
        let toks = Scanner::tokenize("<div baz=\"qux\">").unwrap();
        let spans: Vec<_> = toks.iter().map(|t| (t.span.start, t.span.end)).collect();
        assert_eq!(
            spans,
            vec![(0, 1), (1, 4), (5, 8), (8, 9), (9, 14), (14, 15), (15, 15)]
        );
    }

    #[test]
    fn test_single_quoted_value_may_contain_double_quote() {
        let toks = Scanner::tokenize("<a title='say \"hi\"'>").unwrap();
        assert_eq!(toks[4].kind, TokenKind::AttributeText);
        assert_eq!(toks[4].value, "'say \"hi\"'");
    }

    #[test]
    fn test_value_may_contain_markup() {
        let toks = Scanner::tokenize("<a title=\"<b>{{x}}</b>\">").unwrap();
        assert_eq!(toks[4].value, "\"<b>{{x}}</b>\"");
        assert_eq!(toks[5].kind, TokenKind::CloseTag);
    }

    #[test]
    fn test_boolean_attributes() {
        assert_eq!(
            values("<input disabled checked>"),
            vec![
                (TokenKind::OpenTag, "<"),
                (TokenKind::TagName, "input"),
                (TokenKind::AttributeKey, "disabled"),
                (TokenKind::AttributeKey, "checked"),
                (TokenKind::CloseTag, ">"),
                (TokenKind::Eof, ""),
            ]
        );
    }

    #[test]
    fn test_attribute_whitespace_is_skipped() {
        assert_eq!(
            kinds("<a\n\thref = 'x'\n>"),
            vec![
                TokenKind::OpenTag,
                TokenKind::TagName,
                TokenKind::AttributeKey,
                TokenKind::Equals,
                TokenKind::AttributeText,
                TokenKind::CloseTag,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_key_with_punctuation() {
        let toks = Scanner::tokenize("<a :href @click.prevent>").unwrap();
        assert_eq!(toks[2].value, ":href");
        assert_eq!(toks[3].value, "@click.prevent");
    }

    #[test]
    fn test_unterminated_attribute_value() {
        let source = "<p bar='foo\">{{a}} {{b}} : {{c}} :</p>";
        let err = error(source);
        assert_eq!(err.kind, LexErrorKind::UnterminatedAttributeValue { quote: '\'' });
        assert_eq!(err.offset, source.len());
    }

    #[test]
    fn test_lone_slash_is_invalid_attribute() {
        let err = error("<a / >");
        assert_eq!(err.kind, LexErrorKind::InvalidAttribute);
        assert_eq!(err.offset, 3);
    }

    #[test]
    fn test_unclosed_tag_is_invalid_attribute() {
        let err = error("<a href='x'");
        assert_eq!(err.kind, LexErrorKind::InvalidAttribute);
        assert_eq!(err.offset, 11);
    }

    // =========================================================================
    // Mustaches
    // =========================================================================

    #[test]
    fn test_mustache_value_is_verbatim() {
        assert_eq!(
            values("{{ user.name | upper }}"),
            vec![
                (TokenKind::OpenMustache, "{{"),
                (TokenKind::MustacheValue, " user.name | upper "),
                (TokenKind::CloseMustache, "}}"),
                (TokenKind::Eof, ""),
            ]
        );
    }

    #[test]
    fn test_empty_mustache() {
        let toks = Scanner::tokenize("{{}}").unwrap();
        assert_eq!(toks[1].kind, TokenKind::MustacheValue);
        assert_eq!(toks[1].span, Span::new(2, 2, 1, 3));
    }

    #[test]
    fn test_mustache_between_text() {
        assert_eq!(
            values("<p>{{a}} {{b}} : {{c}} :</p>"),
            vec![
                (TokenKind::OpenTag, "<"),
                (TokenKind::TagName, "p"),
                (TokenKind::CloseTag, ">"),
                (TokenKind::OpenMustache, "{{"),
                (TokenKind::MustacheValue, "a"),
                (TokenKind::CloseMustache, "}}"),
                (TokenKind::Text, " "),
                (TokenKind::OpenMustache, "{{"),
                (TokenKind::MustacheValue, "b"),
                (TokenKind::CloseMustache, "}}"),
                (TokenKind::Text, " : "),
                (TokenKind::OpenMustache, "{{"),
                (TokenKind::MustacheValue, "c"),
                (TokenKind::CloseMustache, "}}"),
                (TokenKind::Text, " :"),
                (TokenKind::OpenTagWithSlash, "</"),
                (TokenKind::TagName, "p"),
                (TokenKind::CloseTag, ">"),
                (TokenKind::Eof, ""),
            ]
        );
    }

    #[test]
    fn test_unterminated_mustache() {
        let err = error("<p bar='foo'>{{abcdefg</p>");
        assert_eq!(err.kind, LexErrorKind::UnterminatedMustache);
        assert_eq!(err.offset, 26);
    }

    // =========================================================================
    // Comments
    // =========================================================================

    #[test]
    fn test_comment_is_verbatim() {
        assert_eq!(
            values("<!-- a comment  -->"),
            vec![
                (TokenKind::OpenComment, "<!--"),
                (TokenKind::CommentText, " a comment  "),
                (TokenKind::CloseComment, "-->"),
                (TokenKind::Eof, ""),
            ]
        );
    }

    #[test]
    fn test_comment_may_contain_markup() {
        let toks = Scanner::tokenize("<!-- <div>{{x}} -->").unwrap();
        assert_eq!(toks[1].value, " <div>{{x}} ");
        assert_eq!(toks.len(), 4);
    }

    #[test]
    fn test_empty_comment() {
        assert_eq!(
            values("<!---->"),
            vec![
                (TokenKind::OpenComment, "<!--"),
                (TokenKind::CommentText, ""),
                (TokenKind::CloseComment, "-->"),
                (TokenKind::Eof, ""),
            ]
        );
    }

    #[test]
    fn test_unterminated_comment() {
        let err = error("<!-- never closed");
        assert_eq!(err.kind, LexErrorKind::UnterminatedComment);
        assert_eq!(err.offset, 17);
    }

    // =========================================================================
    // Positions
    // =========================================================================

    #[test]
    fn test_spans_are_contiguous() {
        let source = "<div>\n  foo {{a}}\n  <div baz=\"qux\">{{b}}bar</div>\n</div>";
        let toks = Scanner::tokenize(source).unwrap();
        for pair in toks.windows(2) {
            assert!(pair[0].span.end <= pair[1].span.start);
        }
        for tok in &toks {
            assert_eq!(tok.span.slice(source), tok.value);
        }
    }

    #[test]
    fn test_line_and_column_tracking() {
        let toks = Scanner::tokenize("<div>\n  foo\n</div>").unwrap();
        // text "\n  foo\n" starts right after `<div>`
        assert_eq!(toks[3].kind, TokenKind::Text);
        assert_eq!((toks[3].span.line, toks[3].span.column), (1, 6));
        // `</` on line 3
        assert_eq!(toks[4].kind, TokenKind::OpenTagWithSlash);
        assert_eq!((toks[4].span.line, toks[4].span.column), (3, 1));
    }

    #[test]
    fn test_error_position() {
        let err = error("<div>\n  <1>");
        assert_eq!(err.offset, 9);
        assert_eq!((err.line, err.column), (2, 4));
        assert_eq!(
            err.to_string(),
            "Lexer error at line 2, column 4: invalid tag name"
        );
    }
}
