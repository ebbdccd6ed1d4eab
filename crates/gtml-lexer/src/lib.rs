//! GTML Lexer
//!
//! Flattens template source (one trimmed line after another, blank lines
//! dropped) and tokenizes the result as HTML: start tags with attributes,
//! end tags, text, comments and doctypes. Every token keeps its byte span in
//! the flattened text so later stages can slice the exact original markup.
//!
//! # Example
//!
//! ```
//! use gtml_lexer::{Scanner, Source};
//!
//! let source = Source::new("<p>\n  Hello\n</p>");
//! assert_eq!(source.text(), "<p>Hello</p>");
//! let tokens = Scanner::tokenize(&source).unwrap();
//! assert_eq!(tokens.len(), 4); // <p>, Hello, </p>, EOF
//! ```

pub mod scanner;
pub mod source;
pub mod token;

pub use scanner::Scanner;
pub use source::{flatten, snippet_of, Source};
pub use token::{is_void_element, Attribute, Quote, Span, Token, TokenKind};

/// Lexer error with position information in the original file.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Lexer error at line {line}, column {column}: {message}")]
pub struct LexerError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    /// Byte offset in the flattened text.
    pub offset: usize,
}
