use crate::source::Source;
use crate::token::{is_raw_text_element, Attribute, Quote, Span, Token, TokenKind};
use crate::LexerError;

/// HTML source scanner.
///
/// Tokenizes flattened template text into start tags, end tags, text,
/// comments and doctypes. Works on bytes: every delimiter it looks for is
/// ASCII, so every span it records falls on a char boundary.
///
/// The scanner is deliberately lenient about HTML itself (unknown tags,
/// unquoted values, stray `<` in text) and strict only where a template
/// could otherwise be silently misread: unterminated tags, comments and
/// quoted values are errors.
pub struct Scanner<'a> {
    source: &'a Source,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner for the given source.
    pub fn new(source: &'a Source) -> Self {
        Self {
            source,
            bytes: source.text().as_bytes(),
            pos: 0,
            tokens: Vec::new(),
        }
    }

    /// Tokenize the entire source into a vector of tokens.
    pub fn tokenize(source: &Source) -> Result<Vec<Token>, LexerError> {
        let mut scanner = Scanner::new(source);
        scanner.scan_tokens()?;
        Ok(scanner.tokens)
    }

    /// Scan all tokens from the source.
    fn scan_tokens(&mut self) -> Result<(), LexerError> {
        while !self.is_at_end() {
            self.scan_token()?;
        }
        let end = self.bytes.len();
        self.tokens.push(Token::new(TokenKind::Eof, Span::new(end, end)));
        Ok(())
    }

    /// Scan the next token.
    fn scan_token(&mut self) -> Result<(), LexerError> {
        if self.peek() != b'<' {
            self.scan_text();
            return Ok(());
        }

        if self.starts_with(b"<!--") {
            self.scan_comment()
        } else if self.starts_with(b"<!") {
            self.scan_doctype()
        } else if self.starts_with(b"</") && self.peek_at(2).is_ascii_alphabetic() {
            self.scan_end_tag()
        } else if self.peek_at(1).is_ascii_alphabetic() {
            self.scan_start_tag()
        } else {
            // A lone `<` is just text.
            self.scan_text();
            Ok(())
        }
    }

    // --- Scanners ---

    /// Scan text up to the next tag-like `<`.
    fn scan_text(&mut self) {
        let start = self.pos;
        self.advance();
        while !self.is_at_end() && !self.at_markup() {
            self.advance();
        }
        self.push_text(start, self.pos);
    }

    /// Scan `<!-- ... -->`.
    fn scan_comment(&mut self) -> Result<(), LexerError> {
        let start = self.pos;
        let body_start = start + 4;
        let Some(close) = self.find_from(body_start, b"-->") else {
            return Err(self.error_at(start, "Unterminated comment"));
        };
        let body = self.text(body_start, close).to_string();
        self.pos = close + 3;
        self.tokens
            .push(Token::new(TokenKind::Comment(body), Span::new(start, self.pos)));
        Ok(())
    }

    /// Scan `<!DOCTYPE ...>` and other `<!` declarations.
    fn scan_doctype(&mut self) -> Result<(), LexerError> {
        let start = self.pos;
        let Some(close) = self.find_from(start + 2, b">") else {
            return Err(self.error_at(start, "Unterminated declaration"));
        };
        let body = self.text(start + 2, close).trim().to_string();
        self.pos = close + 1;
        self.tokens
            .push(Token::new(TokenKind::Doctype(body), Span::new(start, self.pos)));
        Ok(())
    }

    /// Scan `</name>`. Anything between the name and `>` is ignored.
    fn scan_end_tag(&mut self) -> Result<(), LexerError> {
        let start = self.pos;
        self.pos += 2;
        let name = self.scan_name();
        let Some(close) = self.find_from(self.pos, b">") else {
            return Err(self.error_at(start, format!("Unterminated end tag '</{name}'")));
        };
        self.pos = close + 1;
        self.tokens
            .push(Token::new(TokenKind::EndTag { name }, Span::new(start, self.pos)));
        Ok(())
    }

    /// Scan `<name attr="value" ...>` or `<name ... />`.
    fn scan_start_tag(&mut self) -> Result<(), LexerError> {
        let start = self.pos;
        self.advance(); // consume `<`
        let name = self.scan_name();
        let mut attributes = Vec::new();
        let self_closing;

        loop {
            self.skip_whitespace();
            if self.is_at_end() {
                return Err(self.error_at(start, format!("Unterminated tag '<{name}'")));
            }
            match self.peek() {
                b'>' => {
                    self.advance();
                    self_closing = false;
                    break;
                }
                b'/' if self.peek_at(1) == b'>' => {
                    self.pos += 2;
                    self_closing = true;
                    break;
                }
                b'/' => self.advance(),
                _ => attributes.push(self.scan_attribute(start, &name)?),
            }
        }

        let span = Span::new(start, self.pos);
        let raw_text = !self_closing && is_raw_text_element(&name);
        self.tokens.push(Token::new(
            TokenKind::StartTag {
                name: name.clone(),
                attributes,
                self_closing,
            },
            span,
        ));

        if raw_text {
            self.scan_raw_text(&name);
        }
        Ok(())
    }

    /// Scan one attribute: `name`, `name=value`, `name="value"` or `name='value'`.
    fn scan_attribute(&mut self, tag_start: usize, tag: &str) -> Result<Attribute, LexerError> {
        let start = self.pos;
        while !self.is_at_end() {
            let c = self.peek();
            if c.is_ascii_whitespace() || c == b'=' || c == b'>' || c == b'/' {
                break;
            }
            self.advance();
        }
        let name = self.text(start, self.pos).to_string();

        self.skip_whitespace();
        if self.peek() != b'=' || self.is_at_end() {
            return Ok(Attribute {
                name,
                value: None,
                quote: Quote::Unquoted,
                span: Span::new(start, self.pos),
                value_span: None,
            });
        }
        self.advance(); // consume `=`
        self.skip_whitespace();

        let (quote, value_span) = match self.peek() {
            q @ (b'"' | b'\'') => {
                let value_start = self.pos + 1;
                let Some(close) = self.find_byte_from(value_start, q) else {
                    return Err(self.error_at(
                        start,
                        format!("Unterminated value for attribute '{name}' on '<{tag}'"),
                    ));
                };
                self.pos = close + 1;
                let quote = if q == b'"' { Quote::Double } else { Quote::Single };
                (quote, Span::new(value_start, close))
            }
            _ => {
                let value_start = self.pos;
                while !self.is_at_end() && !self.peek().is_ascii_whitespace() && self.peek() != b'>'
                {
                    self.advance();
                }
                if self.is_at_end() {
                    return Err(self.error_at(tag_start, format!("Unterminated tag '<{tag}'")));
                }
                (Quote::Unquoted, Span::new(value_start, self.pos))
            }
        };

        Ok(Attribute {
            name,
            value: Some(self.text(value_span.start, value_span.end).to_string()),
            quote,
            span: Span::new(start, self.pos),
            value_span: Some(value_span),
        })
    }

    /// Inside `<script>`/`<style>`, everything up to the end tag is text.
    fn scan_raw_text(&mut self, tag: &str) {
        let start = self.pos;
        let closing = format!("</{}", tag.to_ascii_lowercase());
        let mut end = self.bytes.len();
        let mut i = start;
        while i + closing.len() <= self.bytes.len() {
            if self.bytes[i..i + closing.len()].eq_ignore_ascii_case(closing.as_bytes()) {
                end = i;
                break;
            }
            i += 1;
        }
        self.pos = end;
        self.push_text(start, end);
    }

    /// Tag names: letters, digits, `-`, `_`, `:` and `.`.
    fn scan_name(&mut self) -> String {
        let start = self.pos;
        while !self.is_at_end() {
            let c = self.peek();
            if c.is_ascii_alphanumeric() || matches!(c, b'-' | b'_' | b':' | b'.') {
                self.advance();
            } else {
                break;
            }
        }
        self.text(start, self.pos).to_string()
    }

    // --- Helpers ---

    fn push_text(&mut self, start: usize, end: usize) {
        if start == end {
            return;
        }
        let text = self.text(start, end).to_string();
        self.tokens
            .push(Token::new(TokenKind::Text(text), Span::new(start, end)));
    }

    /// True if the current `<` starts a tag, end tag, comment or declaration.
    fn at_markup(&self) -> bool {
        if self.peek() != b'<' {
            return false;
        }
        let next = self.peek_at(1);
        next.is_ascii_alphabetic() || next == b'!' || (next == b'/' && self.peek_at(2).is_ascii_alphabetic())
    }

    fn text(&self, start: usize, end: usize) -> &'a str {
        &self.source.text()[start..end]
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.peek().is_ascii_whitespace() {
            self.advance();
        }
    }

    fn starts_with(&self, prefix: &[u8]) -> bool {
        self.bytes[self.pos..].starts_with(prefix)
    }

    fn find_from(&self, from: usize, needle: &[u8]) -> Option<usize> {
        if from > self.bytes.len() {
            return None;
        }
        self.bytes[from..]
            .windows(needle.len())
            .position(|w| w == needle)
            .map(|i| from + i)
    }

    fn find_byte_from(&self, from: usize, byte: u8) -> Option<usize> {
        self.bytes
            .get(from..)?
            .iter()
            .position(|b| *b == byte)
            .map(|i| from + i)
    }

    fn peek(&self) -> u8 {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        self.bytes.get(self.pos + offset).copied().unwrap_or(b'\0')
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn error_at(&self, offset: usize, message: impl Into<String>) -> LexerError {
        let (line, column) = self.source.locate(offset);
        LexerError {
            message: message.into(),
            line,
            column,
            offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Helper: tokenize and return token kinds (ignoring spans).
    fn kinds(text: &str) -> Vec<TokenKind> {
        tokens(text).into_iter().map(|t| t.kind).collect()
    }

    /// Helper: tokenize and panic on error.
    fn tokens(text: &str) -> Vec<Token> {
        Scanner::tokenize(&Source::new(text)).unwrap()
    }

    fn start_tag(text: &str) -> (String, Vec<Attribute>, bool) {
        match tokens(text).remove(0).kind {
            TokenKind::StartTag {
                name,
                attributes,
                self_closing,
            } => (name, attributes, self_closing),
            other => panic!("Expected StartTag, got {other:?}"),
        }
    }

    // =========================================================================
    // Structure
    // =========================================================================

    #[test]
    fn test_empty_source() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_text_only() {
        assert_eq!(
            kinds("hello world"),
            vec![TokenKind::Text("hello world".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_simple_element() {
        assert_eq!(
            kinds("<p>Hi</p>"),
            vec![
                TokenKind::StartTag {
                    name: "p".into(),
                    attributes: vec![],
                    self_closing: false,
                },
                TokenKind::Text("Hi".into()),
                TokenKind::EndTag { name: "p".into() },
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_spans_cover_source_exactly() {
        let text = "<div class=\"a\">x<br/>y</div>";
        let source = Source::new(text);
        let toks = Scanner::tokenize(&source).unwrap();
        let rebuilt: String = toks.iter().map(|t| source.slice(t.span)).collect();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_lone_angle_bracket_is_text() {
        assert_eq!(
            kinds("a < b"),
            vec![TokenKind::Text("a < b".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_comment() {
        assert_eq!(
            kinds("<!-- note --><p></p>")[0],
            TokenKind::Comment(" note ".into())
        );
    }

    #[test]
    fn test_doctype() {
        assert_eq!(
            kinds("<!DOCTYPE html>")[0],
            TokenKind::Doctype("DOCTYPE html".into())
        );
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    #[test]
    fn test_double_quoted_attribute() {
        let (name, attrs, _) = start_tag("<a href=\"/about\">");
        assert_eq!(name, "a");
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].name, "href");
        assert_eq!(attrs[0].value.as_deref(), Some("/about"));
        assert_eq!(attrs[0].quote, Quote::Double);
    }

    #[test]
    fn test_single_quoted_attribute_with_double_quotes_inside() {
        let (_, attrs, _) = start_tag("<div title='say \"hi\"'>");
        assert_eq!(attrs[0].value.as_deref(), Some("say \"hi\""));
        assert_eq!(attrs[0].quote, Quote::Single);
    }

    #[test]
    fn test_unquoted_attribute() {
        let (_, attrs, _) = start_tag("<input type=text disabled>");
        assert_eq!(attrs[0].value.as_deref(), Some("text"));
        assert_eq!(attrs[0].quote, Quote::Unquoted);
        assert_eq!(attrs[1].name, "disabled");
        assert_eq!(attrs[1].value, None);
    }

    #[test]
    fn test_attribute_value_may_contain_angle_brackets() {
        let (_, attrs, _) = start_tag("<div _if=\"a\" data-x=\"<b>\">");
        assert_eq!(attrs[1].value.as_deref(), Some("<b>"));
    }

    #[test]
    fn test_attribute_value_span() {
        let text = "<li _for=\"x of xs []string\">";
        let source = Source::new(text);
        let toks = Scanner::tokenize(&source).unwrap();
        let TokenKind::StartTag { attributes, .. } = &toks[0].kind else {
            panic!("Expected StartTag");
        };
        let value_span = attributes[0].value_span.unwrap();
        assert_eq!(source.slice(value_span), "x of xs []string");
        assert_eq!(source.slice(attributes[0].span), "_for=\"x of xs []string\"");
    }

    #[test]
    fn test_self_closing() {
        let (name, _, self_closing) = start_tag("<greeting name=\"Sam\"/>");
        assert_eq!(name, "greeting");
        assert!(self_closing);
    }

    #[test]
    fn test_raw_text_element() {
        assert_eq!(
            kinds("<script>if (a < b) { x(\"</p>\") }</script>"),
            vec![
                TokenKind::StartTag {
                    name: "script".into(),
                    attributes: vec![],
                    self_closing: false,
                },
                TokenKind::Text("if (a < b) { x(\"</p>\") }".into()),
                TokenKind::EndTag {
                    name: "script".into()
                },
                TokenKind::Eof,
            ]
        );
    }

    // =========================================================================
    // Errors
    // =========================================================================

    #[test]
    fn test_unterminated_tag() {
        let err = Scanner::tokenize(&Source::new("<div class=\"a\"")).unwrap_err();
        assert!(err.message.contains("Unterminated"));
    }

    #[test]
    fn test_unterminated_attribute_value() {
        let err = Scanner::tokenize(&Source::new("<div title=\"oops>")).unwrap_err();
        assert!(err.message.contains("attribute 'title'"));
    }

    #[test]
    fn test_unterminated_comment() {
        let err = Scanner::tokenize(&Source::new("<!-- never closed")).unwrap_err();
        assert!(err.message.contains("comment"));
    }

    #[test]
    fn test_error_reports_original_line() {
        let err = Scanner::tokenize(&Source::new("<div>\n\n   <p title=\"x>\n</div>")).unwrap_err();
        assert_eq!(err.line, 3);
        assert_eq!(err.column, 7);
    }
}
