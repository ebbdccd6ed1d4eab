//! `{{ expr }}` interpolations.

use gtml_lexer::{Source, Span};

use crate::ident::is_identifier;
use crate::marker::Location;
use crate::{ParseError, ParseErrorKind};

/// An inline `{{ expr }}` marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Prop {
    /// The whole marker text including braces.
    pub raw: String,
    /// The trimmed expression.
    pub value: String,
    pub span: Span,
    pub location: Location,
}

impl Prop {
    /// `{{ name }}` refers to a single outer-scope name.
    pub fn is_bare_identifier(&self) -> bool {
        is_identifier(&self.value)
    }
}

/// Read an interpolation at `start` (which holds `{{`), not reading past `limit`.
pub fn parse_prop(
    source: &Source,
    start: usize,
    limit: usize,
    location: Location,
) -> Result<Prop, ParseError> {
    let text = &source.text()[start..limit];
    let Some(close) = text[2..].find("}}").map(|i| i + 2) else {
        return Err(ParseError::at(
            source,
            Span::new(start, limit),
            ParseErrorKind::InvalidInterpolation,
            "`{{` is missing its closing `}}`",
        ));
    };

    let span = Span::new(start, start + close + 2);
    let value = text[2..close].trim();
    if value.is_empty() {
        return Err(ParseError::at(
            source,
            span,
            ParseErrorKind::InvalidInterpolation,
            "empty interpolation",
        ));
    }

    Ok(Prop {
        raw: text[..close + 2].to_string(),
        value: value.to_string(),
        span,
        location,
    })
}
