//! Whitespace flattening.
//!
//! Template files are indented for humans. Before anything is parsed, every
//! line is trimmed and blank lines are dropped, so generated string literals
//! carry no indentation artifacts. The flattened text keeps a line map back to
//! the original file for error reporting.

use crate::token::Span;

/// Longest snippet shown in error messages.
pub const SNIPPET_LIMIT: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineStart {
    /// Offset of the line's first byte in the flattened text.
    offset: usize,
    /// 1-based line in the original text.
    line: usize,
    /// 1-based column of the line's first non-blank char in the original text.
    column: usize,
}

/// Flattened template source with a map back to original positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    text: String,
    lines: Vec<LineStart>,
}

impl Source {
    /// Flatten `raw` and remember where each kept line came from.
    pub fn new(raw: &str) -> Self {
        let mut text = String::with_capacity(raw.len());
        let mut lines = Vec::new();

        for (index, line) in raw.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if !text.is_empty() && needs_separator(&text, trimmed) {
                text.push(' ');
            }

            let leading = line.len() - line.trim_start().len();
            lines.push(LineStart {
                offset: text.len(),
                line: index + 1,
                column: line[..leading].chars().count() + 1,
            });
            text.push_str(trimmed);
        }

        Self { text, lines }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The flattened text under `span`.
    pub fn slice(&self, span: Span) -> &str {
        &self.text[span.start..span.end]
    }

    /// Map a flattened byte offset to a 1-based `(line, column)` in the original file.
    pub fn locate(&self, offset: usize) -> (usize, usize) {
        let index = self.lines.partition_point(|l| l.offset <= offset);
        let Some(start) = index.checked_sub(1).map(|i| self.lines[i]) else {
            return (1, 1);
        };
        let end = offset.min(self.text.len());
        let width = self
            .text
            .get(start.offset..end)
            .map(|s| s.chars().count())
            .unwrap_or(end.saturating_sub(start.offset));
        (start.line, start.column + width)
    }

    /// A short excerpt of the text under `span` for error messages.
    pub fn snippet(&self, span: Span) -> String {
        let end = span.end.min(self.text.len());
        let start = span.start.min(end);
        snippet_of(self.text.get(start..end).unwrap_or(""))
    }
}

/// Truncate `text` to [`SNIPPET_LIMIT`] chars.
pub fn snippet_of(text: &str) -> String {
    if text.chars().count() <= SNIPPET_LIMIT {
        return text.to_string();
    }
    let mut out: String = text.chars().take(SNIPPET_LIMIT).collect();
    out.push_str("...");
    out
}

/// Flatten without keeping the line map.
///
/// `flatten(&flatten(x)) == flatten(x)`.
pub fn flatten(raw: &str) -> String {
    Source::new(raw).text
}

/// Words split across lines keep one space between them; markup boundaries don't.
fn needs_separator(previous: &str, next: &str) -> bool {
    !(previous.ends_with('>') || next.starts_with('<'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flatten_strips_indentation() {
        let raw = "<div>\n    <p>Hello</p>\n</div>\n";
        assert_eq!(flatten(raw), "<div><p>Hello</p></div>");
    }

    #[test]
    fn test_flatten_drops_blank_lines() {
        assert_eq!(flatten("\n\n  <br>\n\n\t\n<hr>"), "<br><hr>");
    }

    #[test]
    fn test_flatten_keeps_word_separation() {
        assert_eq!(flatten("<p>Hello\n   world</p>"), "<p>Hello world</p>");
    }

    #[test]
    fn test_flatten_keeps_inner_whitespace() {
        assert_eq!(flatten("  <p>a   b</p>  "), "<p>a   b</p>");
    }

    #[test]
    fn test_flatten_windows_line_endings() {
        assert_eq!(flatten("<div>\r\n  <p>x</p>\r\n</div>"), "<div><p>x</p></div>");
    }

    #[test]
    fn test_flatten_is_idempotent() {
        let inputs = [
            "",
            "   ",
            "<div>\n  <p>Hello\n  there</p>\n</div>",
            "text only\n  more text\n",
            "<ul>\n\t<li _for=\"x of xs []string\">{{ x }}</li>\n</ul>",
            "a\r\n b \r\n",
            "  <p> spaced </p>  \n\n  tail",
        ];
        for input in inputs {
            let once = flatten(input);
            assert_eq!(flatten(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_locate_maps_back_to_original_line() {
        let source = Source::new("<div>\n    <p>Hi</p>\n</div>");
        assert_eq!(source.text(), "<div><p>Hi</p></div>");
        // `<p>` starts at flattened offset 5, original line 2 column 5
        assert_eq!(source.locate(5), (2, 5));
        // `Hi` is three chars further along the same line
        assert_eq!(source.locate(8), (2, 8));
        assert_eq!(source.locate(0), (1, 1));
        assert_eq!(source.locate(14), (3, 1));
    }

    #[test]
    fn test_locate_empty_source() {
        assert_eq!(Source::new("").locate(0), (1, 1));
    }

    #[test]
    fn test_snippet_truncates() {
        let long = "x".repeat(100);
        let source = Source::new(&long);
        let snippet = source.snippet(Span::new(0, 100));
        assert_eq!(snippet.len(), SNIPPET_LIMIT + 3);
        assert!(snippet.ends_with("..."));
    }
}
