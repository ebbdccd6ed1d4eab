//! GTML Parser
//!
//! Turns flattened template source into typed construct trees:
//!
//! ```text
//! Source → dom::Document → component::discover → element::Element tree
//! ```
//!
//! The `dom` module is a small HTML query facility (tree, attributes,
//! descendants, outer HTML). On top of it, `element` classifies
//! `_component`/`_for`/`_if`/`_else`/`_placeholder`/`_slot` constructs and
//! component-named tags, while `rune` and `prop` scan the `$name(...)` and
//! `{{ expr }}` markers found in each construct's own markup.

pub mod attr;
pub mod component;
pub mod dom;
pub mod element;
pub mod ident;
pub mod marker;
pub mod prop;
pub mod rune;

pub use attr::{AttrValue, LiteralKind, Piece};
pub use component::{Component, ComponentSet};
pub use dom::{Document, HtmlElement, Node};
pub use element::{Element, ElementKind, IdCounter, PlaceholderArg};
pub use marker::{Location, Marker};
pub use prop::Prop;
pub use rune::{Rune, RuneKind};

use gtml_lexer::{LexerError, Source, Span};

/// What went wrong while reading a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    /// A construct marker's value does not match its token grammar.
    #[error("Malformed attribute")]
    MalformedAttribute,
    /// A fragment expected to be a construct carries no marker.
    #[error("Not a valid element")]
    NotAValidElement,
    /// A `$name(...)` marker violates its literal rule.
    #[error("Invalid rune syntax")]
    InvalidRuneSyntax,
    /// An empty or unterminated `{{ }}` marker.
    #[error("Invalid interpolation")]
    InvalidInterpolation,
    /// A required name or pairing is missing.
    #[error("Missing required attribute")]
    MissingRequiredAttribute,
    /// The markup itself could not be tokenized or nested.
    #[error("Syntax error")]
    Syntax,
}

/// Parser error with position information and a snippet of the offending text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind} at {}: {message} (near `{snippet}`)", position(.file, .line, .column))]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub snippet: String,
    /// The file the error came from, when known.
    pub file: Option<String>,
}

impl ParseError {
    /// Build an error located at `span` in `source`.
    pub fn at(source: &Source, span: Span, kind: ParseErrorKind, message: impl Into<String>) -> Self {
        let (line, column) = source.locate(span.start);
        Self {
            kind,
            message: message.into(),
            line,
            column,
            snippet: source.snippet(span),
            file: None,
        }
    }

    /// Lift a tokenizer error; the snippet starts at the reported position.
    pub fn from_lexer(error: LexerError, snippet: impl Into<String>) -> Self {
        Self {
            kind: ParseErrorKind::Syntax,
            message: error.message,
            line: error.line,
            column: error.column,
            snippet: snippet.into(),
            file: None,
        }
    }

    /// Attach the file the error came from.
    pub fn in_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

fn position(file: &Option<String>, line: &usize, column: &usize) -> String {
    match file {
        Some(file) => format!("{file}:{line}:{column}"),
        None => format!("line {line}, column {column}"),
    }
}
