//! Left-to-right scan for runes and interpolations.
//!
//! A small state machine follows tags and quoted attribute values so each
//! marker knows whether it sits inside a tag or in text content.

use gtml_lexer::{Source, Span};

use crate::prop::{parse_prop, Prop};
use crate::rune::{parse_rune, Rune};
use crate::ParseError;

/// Where a marker appeared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Inside a start tag, usually within an attribute value.
    Attribute,
    /// In text content.
    Text,
}

/// A rune or an interpolation, in source order.
#[derive(Debug, Clone, PartialEq)]
pub enum Marker {
    Rune(Rune),
    Prop(Prop),
}

impl Marker {
    pub fn span(&self) -> Span {
        match self {
            Marker::Rune(rune) => rune.span,
            Marker::Prop(prop) => prop.span,
        }
    }

    pub fn location(&self) -> Location {
        match self {
            Marker::Rune(rune) => rune.location,
            Marker::Prop(prop) => prop.location,
        }
    }

    pub fn raw(&self) -> &str {
        match self {
            Marker::Rune(rune) => &rune.raw,
            Marker::Prop(prop) => &prop.raw,
        }
    }

    /// The host-language expression the marker stands for.
    pub fn expr(&self) -> &str {
        match self {
            Marker::Rune(rune) => &rune.value,
            Marker::Prop(prop) => &prop.value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Text,
    Tag,
    Quoted(u8),
    /// Scanning an isolated attribute value; never leaves.
    Value,
}

impl State {
    fn location(self) -> Location {
        match self {
            State::Text => Location::Text,
            State::Tag | State::Quoted(_) | State::Value => Location::Attribute,
        }
    }

    fn step(self, bytes: &[u8], i: usize) -> State {
        let b = bytes[i];
        match self {
            State::Text => {
                let next = bytes.get(i + 1).copied().unwrap_or(b'\0');
                if b == b'<' && (next.is_ascii_alphabetic() || next == b'/') {
                    State::Tag
                } else {
                    State::Text
                }
            }
            State::Tag => match b {
                b'"' | b'\'' => State::Quoted(b),
                b'>' => State::Text,
                _ => State::Tag,
            },
            State::Quoted(q) if b == q => State::Tag,
            other => other,
        }
    }
}

/// Scan `span` of `source` for markers.
///
/// `start` says what the first byte is: `Location::Text` for markup that
/// begins in text context (an element's own HTML), `Location::Attribute` for
/// a bare attribute value.
pub fn scan_markers(source: &Source, span: Span, start: Location) -> Result<Vec<Marker>, ParseError> {
    let bytes = source.slice(span).as_bytes();
    let mut state = match start {
        Location::Text => State::Text,
        Location::Attribute => State::Value,
    };
    let mut markers = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i..].starts_with(b"{{") {
            let prop = parse_prop(source, span.start + i, span.end, state.location())?;
            i = prop.span.end - span.start;
            markers.push(Marker::Prop(prop));
            continue;
        }
        if bytes[i] == b'$' {
            if let Some(rune) = parse_rune(source, span.start + i, span.end, state.location())? {
                i = rune.span.end - span.start;
                markers.push(Marker::Rune(rune));
                continue;
            }
        }
        state = state.step(bytes, i);
        i += 1;
    }

    Ok(markers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rune::RuneKind;
    use pretty_assertions::assert_eq;

    fn scan(text: &str) -> Vec<Marker> {
        let source = Source::new(text);
        scan_markers(&source, Span::new(0, source.len()), Location::Text).unwrap()
    }

    fn summary(markers: &[Marker]) -> Vec<(&str, Location)> {
        markers.iter().map(|m| (m.raw(), m.location())).collect()
    }

    #[test]
    fn test_no_markers() {
        assert!(scan("<p>plain $5 text</p>").is_empty());
    }

    #[test]
    fn test_markers_in_order() {
        let markers = scan("<p>{{ b }} and $prop(\"a\") then {{ c }}</p>");
        assert_eq!(
            summary(&markers),
            vec![
                ("{{ b }}", Location::Text),
                ("$prop(\"a\")", Location::Text),
                ("{{ c }}", Location::Text),
            ]
        );
    }

    #[test]
    fn test_attribute_location() {
        let markers = scan("<a href=\"{{ url }}\" title='$prop(\"t\")'>{{ label }}</a>");
        assert_eq!(
            summary(&markers),
            vec![
                ("{{ url }}", Location::Attribute),
                ("$prop(\"t\")", Location::Attribute),
                ("{{ label }}", Location::Text),
            ]
        );
    }

    #[test]
    fn test_quoted_gt_does_not_close_tag() {
        let markers = scan("<div data-x=\"a > b {{ v }}\">{{ w }}</div>");
        assert_eq!(markers[0].location(), Location::Attribute);
        assert_eq!(markers[1].location(), Location::Text);
    }

    #[test]
    fn test_value_scan_is_always_attribute() {
        let source = Source::new("x <b> {{ y }}");
        let markers =
            scan_markers(&source, Span::new(0, source.len()), Location::Attribute).unwrap();
        assert_eq!(markers[0].location(), Location::Attribute);
    }

    #[test]
    fn test_spans_are_absolute() {
        let source = Source::new("<p>ab{{ x }}</p>");
        let markers = scan_markers(&source, Span::new(3, 12), Location::Text).unwrap();
        assert_eq!(markers[0].span(), Span::new(5, 12));
    }

    #[test]
    fn test_rune_kinds_and_exprs() {
        let markers = scan("<p>$val(item.Name)$pipe(user)$slot(\"body\")</p>");
        let kinds: Vec<_> = markers
            .iter()
            .map(|m| match m {
                Marker::Rune(r) => r.kind,
                Marker::Prop(_) => panic!("Expected rune"),
            })
            .collect();
        assert_eq!(kinds, vec![RuneKind::Val, RuneKind::Pipe, RuneKind::Slot]);
        assert_eq!(markers[0].expr(), "item.Name");
    }

    #[test]
    fn test_error_propagates() {
        let source = Source::new("<p>{{ oops</p>");
        assert!(scan_markers(&source, Span::new(0, source.len()), Location::Text).is_err());
    }
}
