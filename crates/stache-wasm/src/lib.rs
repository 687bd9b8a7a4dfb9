//! WASM bindings for the stache parser.
//!
//! Exposes `parse()` and `tokenize()` to JavaScript via wasm-bindgen.
//! Both accept any JS value, return plain JS objects, and throw on error.

use serde::Serialize;
use stache_lexer::{Scanner, Span, Token};
use stache_parser::{ParseError, ParseErrorKind, Template};
use wasm_bindgen::prelude::*;

/// Parse a template into its syntax tree.
///
/// Returns `{ type: "Template", children, span }`. Nodes carry a `type` tag
/// (`Tag`, `Text`, `Mustache`, `Comment`) and bare attributes have the
/// value `true`. Throws if `source` is not a string or does not parse.
#[wasm_bindgen]
pub fn parse(source: JsValue) -> Result<JsValue, JsError> {
    let source = source_text(&source)?;
    let template = parse_source(&source).map_err(to_js_error)?;
    to_js(&template)
}

/// Scan a template into its token list, ending with `end-of-input`.
///
/// Throws if `source` is not a string or does not scan.
#[wasm_bindgen]
pub fn tokenize(source: JsValue) -> Result<JsValue, JsError> {
    let source = source_text(&source)?;
    let tokens = tokenize_source(&source).map_err(to_js_error)?;
    to_js(&tokens)
}

/// Get the parser version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn parse_source(source: &str) -> Result<Template, ParseError> {
    stache_parser::parse(source)
}

fn tokenize_source(source: &str) -> Result<Vec<Token<'_>>, ParseError> {
    Ok(Scanner::tokenize(source)?)
}

/// The source text behind a JS value, or an `InvalidInput` error.
fn source_text(value: &JsValue) -> Result<String, JsError> {
    value
        .as_string()
        .ok_or_else(|| to_js_error(invalid_input(&js_type_name(value))))
}

fn js_type_name(value: &JsValue) -> String {
    value.js_typeof().as_string().unwrap_or_else(|| "unknown".to_string())
}

fn invalid_input(found: &str) -> ParseError {
    ParseError::new(
        ParseErrorKind::InvalidInput {
            found: found.to_string(),
        },
        Span::new(0, 0, 1, 1),
    )
}

fn to_js_error(err: ParseError) -> JsError {
    JsError::new(&err.to_string())
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsError::new(&e.to_string()))
}
