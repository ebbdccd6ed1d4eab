//! `$name(argument)` runes.
//!
//! | rune            | argument                  | meaning                                  |
//! |-----------------|---------------------------|------------------------------------------|
//! | `$prop("name")` | one quoted identifier     | string parameter, written escaped        |
//! | `$slot("name")` | one quoted identifier     | pre-rendered markup parameter, raw       |
//! | `$val(path)`    | one bare identifier path  | in-scope value, written escaped          |
//! | `$pipe(path)`   | one bare identifier path  | in-scope value passed through untouched  |
//!
//! Any other `$` text is literal.

use gtml_lexer::{Source, Span};

use crate::ident::{is_identifier, is_path};
use crate::marker::Location;
use crate::{ParseError, ParseErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuneKind {
    Prop,
    Slot,
    Val,
    Pipe,
}

impl RuneKind {
    /// Recognize a rune name. Unknown names are not runes.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "prop" => Some(Self::Prop),
            "slot" => Some(Self::Slot),
            "val" => Some(Self::Val),
            "pipe" => Some(Self::Pipe),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Prop => "prop",
            Self::Slot => "slot",
            Self::Val => "val",
            Self::Pipe => "pipe",
        }
    }

    /// Prop and slot runes declare parameters; val and pipe consume values.
    pub fn declares_param(self) -> bool {
        matches!(self, Self::Prop | Self::Slot)
    }
}

/// An inline `$name(argument)` marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Rune {
    pub kind: RuneKind,
    /// The decoded identifier or path.
    pub value: String,
    /// The whole marker text, e.g. `$prop("title")`.
    pub raw: String,
    pub span: Span,
    pub location: Location,
}

/// Try to read a rune at `start` (which holds `$`), not reading past `limit`.
///
/// Returns `Ok(None)` when the text is not a rune at all.
pub fn parse_rune(
    source: &Source,
    start: usize,
    limit: usize,
    location: Location,
) -> Result<Option<Rune>, ParseError> {
    let text = &source.text()[start..limit];
    let name_len = text[1..]
        .bytes()
        .take_while(|b| b.is_ascii_lowercase())
        .count();
    let Some(kind) = RuneKind::from_name(&text[1..1 + name_len]) else {
        return Ok(None);
    };
    let open = 1 + name_len;
    if text.as_bytes().get(open) != Some(&b'(') {
        return Ok(None);
    }

    let Some(close) = text[open..].find(')').map(|i| open + i) else {
        return Err(ParseError::at(
            source,
            Span::new(start, limit),
            ParseErrorKind::InvalidRuneSyntax,
            format!("`${}(` is missing its closing `)`", kind.name()),
        ));
    };

    let span = Span::new(start, start + close + 1);
    let raw = text[..=close].to_string();
    let argument = &text[open + 1..close];
    let invalid = |message: String| {
        Err(ParseError::at(
            source,
            span,
            ParseErrorKind::InvalidRuneSyntax,
            message,
        ))
    };

    let value = match kind {
        RuneKind::Prop | RuneKind::Slot => match unquote(argument) {
            Some(name) if is_identifier(name) => name.to_string(),
            _ => {
                return invalid(format!(
                    "`${}` takes one quoted identifier, e.g. `${}(\"name\")`",
                    kind.name(),
                    kind.name()
                ))
            }
        },
        RuneKind::Val | RuneKind::Pipe => {
            if !is_path(argument) {
                return invalid(format!(
                    "`${}` takes one bare identifier without quotes, e.g. `${}(item.Name)`",
                    kind.name(),
                    kind.name()
                ));
            }
            argument.to_string()
        }
    };

    if kind == RuneKind::Slot && location == Location::Attribute {
        return invalid("`$slot` renders markup and cannot appear inside a tag".into());
    }

    Ok(Some(Rune {
        kind,
        value,
        raw,
        span,
        location,
    }))
}

/// Strip one pair of matching single or double quotes.
fn unquote(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    if bytes.len() < 2 {
        return None;
    }
    let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
    if (first == b'"' || first == b'\'') && first == last {
        Some(&s[1..s.len() - 1])
    } else {
        None
    }
}
