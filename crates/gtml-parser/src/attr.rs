//! Attribute value classification.

use gtml_lexer::{Attribute, Source};

use crate::marker::{scan_markers, Location, Marker};
use crate::ParseError;

/// Literal kinds an attribute can carry without any marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Str,
    Bool,
    Int,
}

impl LiteralKind {
    /// `true`/`false` are bools, optionally signed digit runs are ints, the rest are strings.
    pub fn of(text: &str) -> Self {
        if text == "true" || text == "false" {
            return LiteralKind::Bool;
        }
        let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return LiteralKind::Int;
        }
        LiteralKind::Str
    }
}

/// One part of a mixed attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
    Text(String),
    Marker(Marker),
}

/// A classified attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// `<x flag>` or `<x flag="">`.
    Empty,
    /// No markers at all.
    Literal(LiteralKind, String),
    /// Exactly one marker, nothing else but surrounding whitespace.
    Expression(Marker),
    /// Text mixed with markers.
    Template(Vec<Piece>),
}

impl AttrValue {
    /// Classify the value of `attr`, which must come from `source`.
    pub fn classify(source: &Source, attr: &Attribute) -> Result<AttrValue, ParseError> {
        let (Some(value), Some(span)) = (attr.value.as_deref(), attr.value_span) else {
            return Ok(AttrValue::Empty);
        };
        if value.is_empty() {
            return Ok(AttrValue::Empty);
        }

        let markers = scan_markers(source, span, Location::Attribute)?;
        if markers.is_empty() {
            return Ok(AttrValue::Literal(LiteralKind::of(value), value.to_string()));
        }
        if let [only] = markers.as_slice() {
            if value.trim() == only.raw() {
                return Ok(AttrValue::Expression(only.clone()));
            }
        }

        let mut pieces = Vec::new();
        let mut cursor = span.start;
        for marker in markers {
            let marker_span = marker.span();
            if marker_span.start > cursor {
                pieces.push(Piece::Text(source.text()[cursor..marker_span.start].to_string()));
            }
            cursor = marker_span.end;
            pieces.push(Piece::Marker(marker));
        }
        if cursor < span.end {
            pieces.push(Piece::Text(source.text()[cursor..span.end].to_string()));
        }
        Ok(AttrValue::Template(pieces))
    }

    /// Markers inside this value, in order.
    pub fn markers(&self) -> Vec<&Marker> {
        match self {
            AttrValue::Empty | AttrValue::Literal(..) => Vec::new(),
            AttrValue::Expression(marker) => vec![marker],
            AttrValue::Template(pieces) => pieces
                .iter()
                .filter_map(|p| match p {
                    Piece::Marker(m) => Some(m),
                    Piece::Text(_) => None,
                })
                .collect(),
        }
    }
}

/// Internal construct markers (`_component`, `_for`, ...) start with `_`
/// and never become call arguments.
pub fn is_marker(name: &str) -> bool {
    name.starts_with('_')
}
