//! HTML query facility.
//!
//! A plain element tree built from scanner tokens. Nodes keep their spans in
//! the flattened source, so outer HTML is a slice of the source rather than a
//! re-serialization and always matches the text byte for byte.

use gtml_lexer::{is_void_element, Attribute, Scanner, Source, Span, TokenKind};

use crate::{ParseError, ParseErrorKind};

/// A parsed template file.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(HtmlElement),
    Text(Span),
    Comment(Span),
    Doctype(Span),
}

/// An HTML element with its attributes and children.
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlElement {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
    /// From `<` of the start tag to `>` of the end tag (or of the start tag
    /// for void, self-closing and implicitly closed elements).
    pub span: Span,
    pub start_tag: Span,
}

impl Document {
    /// Tokenize and build the element tree.
    ///
    /// Elements left open are closed where their parent closes (or at the end
    /// of input). An end tag matching no open element is an error.
    pub fn parse(source: &Source) -> Result<Document, ParseError> {
        let tokens = Scanner::tokenize(source).map_err(|e| {
            let snippet = source.snippet(Span::new(e.offset, source.len()));
            ParseError::from_lexer(e, snippet)
        })?;

        let mut roots: Vec<Node> = Vec::new();
        let mut stack: Vec<HtmlElement> = Vec::new();

        for token in tokens {
            match token.kind {
                TokenKind::StartTag {
                    name,
                    attributes,
                    self_closing,
                } => {
                    let element = HtmlElement {
                        name,
                        attributes,
                        children: Vec::new(),
                        span: token.span,
                        start_tag: token.span,
                    };
                    if self_closing || is_void_element(&element.name) {
                        push_node(&mut stack, &mut roots, Node::Element(element));
                    } else {
                        stack.push(element);
                    }
                }
                TokenKind::EndTag { name } => {
                    let Some(index) = stack
                        .iter()
                        .rposition(|open| open.name.eq_ignore_ascii_case(&name))
                    else {
                        if is_void_element(&name) {
                            // `</br>` and friends carry no structure.
                            continue;
                        }
                        return Err(ParseError::at(
                            source,
                            token.span,
                            ParseErrorKind::Syntax,
                            format!("End tag '</{name}>' has no matching start tag"),
                        ));
                    };
                    while stack.len() > index + 1 {
                        close_top(&mut stack, &mut roots, token.span.start);
                    }
                    close_top(&mut stack, &mut roots, token.span.end);
                }
                TokenKind::Text(_) => push_node(&mut stack, &mut roots, Node::Text(token.span)),
                TokenKind::Comment(_) => {
                    push_node(&mut stack, &mut roots, Node::Comment(token.span))
                }
                TokenKind::Doctype(_) => {
                    push_node(&mut stack, &mut roots, Node::Doctype(token.span))
                }
                TokenKind::Eof => {
                    while !stack.is_empty() {
                        close_top(&mut stack, &mut roots, token.span.end);
                    }
                }
            }
        }

        Ok(Document { nodes: roots })
    }

    /// Top-level elements.
    pub fn elements(&self) -> impl Iterator<Item = &HtmlElement> {
        element_children(&self.nodes)
    }

    /// Every element in the document, in document order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants::over(&self.nodes)
    }

    /// Every element carrying attribute `name`, in document order.
    pub fn select_by_attr<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a HtmlElement> {
        self.descendants()
            .map(|(_, el)| el)
            .filter(move |el| el.has_attr(name))
    }
}

impl HtmlElement {
    /// Look up an attribute by name (ASCII case-insensitive).
    pub fn attr(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// The exact markup of this element.
    pub fn outer_html<'s>(&self, source: &'s Source) -> &'s str {
        source.slice(self.span)
    }

    /// Direct element children.
    pub fn elements(&self) -> impl Iterator<Item = &HtmlElement> {
        element_children(&self.children)
    }

    /// All elements below this one, pre-order, with depth (children are depth 1).
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants::over(&self.children)
    }

    /// Elements below this one carrying attribute `name`.
    pub fn select_by_attr<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a HtmlElement> {
        self.descendants()
            .map(|(_, el)| el)
            .filter(move |el| el.has_attr(name))
    }

    /// True if `other` is this element or nested anywhere inside it.
    pub fn contains(&self, other: &HtmlElement) -> bool {
        self.span.encloses(other.span)
    }
}

/// Pre-order walk over elements.
pub struct Descendants<'a> {
    stack: Vec<(usize, &'a HtmlElement)>,
}

impl<'a> Descendants<'a> {
    fn over(nodes: &'a [Node]) -> Self {
        let mut stack = Vec::new();
        push_reversed(&mut stack, nodes, 1);
        Self { stack }
    }
}

impl<'a> Iterator for Descendants<'a> {
    type Item = (usize, &'a HtmlElement);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, element) = self.stack.pop()?;
        push_reversed(&mut self.stack, &element.children, depth + 1);
        Some((depth, element))
    }
}

fn push_reversed<'a>(stack: &mut Vec<(usize, &'a HtmlElement)>, nodes: &'a [Node], depth: usize) {
    for node in nodes.iter().rev() {
        if let Node::Element(el) = node {
            stack.push((depth, el));
        }
    }
}

fn element_children(nodes: &[Node]) -> impl Iterator<Item = &HtmlElement> {
    nodes.iter().filter_map(|n| match n {
        Node::Element(el) => Some(el),
        _ => None,
    })
}

fn push_node(stack: &mut [HtmlElement], roots: &mut Vec<Node>, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => roots.push(node),
    }
}

fn close_top(stack: &mut Vec<HtmlElement>, roots: &mut Vec<Node>, end: usize) {
    if let Some(mut element) = stack.pop() {
        element.span.end = end.max(element.start_tag.end);
        push_node(stack, roots, Node::Element(element));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> (Source, Document) {
        let source = Source::new(text);
        let doc = Document::parse(&source).unwrap();
        (source, doc)
    }

    #[test]
    fn test_empty_document() {
        let (_, doc) = parse("");
        assert!(doc.nodes.is_empty());
    }

    #[test]
    fn test_nesting() {
        let (_, doc) = parse("<div><p>a</p><p>b</p></div>");
        let div = doc.elements().next().unwrap();
        assert_eq!(div.name, "div");
        assert_eq!(div.elements().count(), 2);
    }

    #[test]
    fn test_outer_html_is_exact_slice() {
        let text = "<ul><li class=\"x\">One</li><li>Two</li></ul>";
        let (source, doc) = parse(text);
        let ul = doc.elements().next().unwrap();
        assert_eq!(ul.outer_html(&source), text);
        let first = ul.elements().next().unwrap();
        assert_eq!(first.outer_html(&source), "<li class=\"x\">One</li>");
    }

    #[test]
    fn test_void_and_self_closing() {
        let (source, doc) = parse("<div><br><img src=\"a\"/><greeting/></div>");
        let div = doc.elements().next().unwrap();
        let names: Vec<_> = div.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["br", "img", "greeting"]);
        assert_eq!(div.elements().nth(2).unwrap().outer_html(&source), "<greeting/>");
    }

    #[test]
    fn test_implicit_close_at_parent_end() {
        let (source, doc) = parse("<ul><li>a<li>b</ul>");
        let ul = doc.elements().next().unwrap();
        let li = ul.elements().next().unwrap();
        // The first <li> swallows the second, both close where </ul> starts.
        assert_eq!(li.outer_html(&source), "<li>a<li>b");
        assert_eq!(ul.outer_html(&source), "<ul><li>a<li>b</ul>");
    }

    #[test]
    fn test_unclosed_at_eof() {
        let (source, doc) = parse("<div><p>x");
        let div = doc.elements().next().unwrap();
        assert_eq!(div.outer_html(&source), "<div><p>x");
    }

    #[test]
    fn test_stray_end_tag_is_error() {
        let source = Source::new("<div></span></div>");
        let err = Document::parse(&source).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Syntax);
        assert_eq!(err.snippet, "</span>");
    }

    #[test]
    fn test_lexer_error_lifted() {
        let source = Source::new("<div title=\"x>");
        let err = Document::parse(&source).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Syntax);
    }

    #[test]
    fn test_descendants_pre_order_with_depth() {
        let (_, doc) = parse("<a><b><c></c></b><d></d></a>");
        let walk: Vec<_> = doc
            .descendants()
            .map(|(depth, el)| (depth, el.name.as_str()))
            .collect();
        assert_eq!(walk, vec![(1, "a"), (2, "b"), (3, "c"), (2, "d")]);
    }

    #[test]
    fn test_select_by_attr() {
        let (_, doc) = parse("<div _component=\"A\"></div><p></p><section _component=\"B\"></section>");
        let names: Vec<_> = doc
            .select_by_attr("_component")
            .map(|e| e.attr("_component").unwrap().value_or_empty())
            .collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_attr_lookup_case_insensitive() {
        let (_, doc) = parse("<div DATA-X=\"1\"></div>");
        let div = doc.elements().next().unwrap();
        assert!(div.has_attr("data-x"));
    }

    #[test]
    fn test_contains() {
        let (_, doc) = parse("<a><b></b></a><c></c>");
        let mut top = doc.elements();
        let a = top.next().unwrap();
        let c = top.next().unwrap();
        let b = a.elements().next().unwrap();
        assert!(a.contains(b));
        assert!(!b.contains(a));
        assert!(!a.contains(c));
    }
}
