//! Element classifier and construct tree builder.
//!
//! A construct is an element carrying one of the [`MARKERS`] attributes, or
//! an element whose tag names a known component (a placeholder). Each
//! construct owns the constructs nearest to it in the markup; a construct
//! nested inside another child construct belongs to that child only.

use gtml_lexer::{Attribute, Source, Span};
use tracing::{debug, warn};

use crate::attr::{is_marker, AttrValue};
use crate::dom::{Document, HtmlElement, Node};
use crate::ident::{is_identifier, is_path};
use crate::marker::{scan_markers, Location, Marker};
use crate::{ParseError, ParseErrorKind};

/// Construct markers in priority order: when an element carries several,
/// the first one listed wins.
pub const MARKERS: [&str; 6] = ["_component", "_for", "_if", "_else", "_placeholder", "_slot"];

/// A placeholder attribute that becomes a call argument.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderArg {
    pub name: String,
    pub value: AttrValue,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    /// `_component="Name"`: a top-level function.
    Component { name: String },
    /// `_for="item of collection []Type"`.
    For {
        item: String,
        collection: String,
        element_type: String,
    },
    /// `_if="condition"`.
    If { condition: String },
    /// `_else="condition"`: the negated branch of the `_if` with the same condition.
    Else { condition: String },
    /// A call to another component, by tag name or `_placeholder="Name"`.
    Placeholder {
        target: String,
        args: Vec<PlaceholderArg>,
    },
    /// `_slot="name"`: markup passed into a placeholder call.
    Slot { name: String },
}

impl ElementKind {
    /// Short lowercase name, also the prefix of generated variable names.
    pub fn label(&self) -> &'static str {
        match self {
            ElementKind::Component { .. } => "component",
            ElementKind::For { .. } => "for",
            ElementKind::If { .. } => "if",
            ElementKind::Else { .. } => "else",
            ElementKind::Placeholder { .. } => "placeholder",
            ElementKind::Slot { .. } => "slot",
        }
    }
}

/// A node in the construct tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub kind: ElementKind,
    /// Unique within one component tree, assigned in document order from 0.
    pub id: usize,
    /// Outer span in the flattened source.
    pub span: Span,
    /// The markup under `span`.
    pub html: String,
    /// Runes and interpolations in this element's own markup, outside child
    /// constructs. Always empty for placeholders, whose markup is not rendered.
    pub markers: Vec<Marker>,
    /// Direct child constructs in document order.
    pub children: Vec<Element>,
}

impl Element {
    /// Build the construct tree rooted at `root`.
    ///
    /// `known` lists every component name visible to this tree; tags matching
    /// one of them (case-insensitively) become placeholders.
    pub fn build(source: &Source, root: &HtmlElement, known: &[String]) -> Result<Element, ParseError> {
        TreeBuilder::new(source, known).build_root(root)
    }

    /// Parse a standalone fragment and build the tree of its first element.
    pub fn classify(fragment: &str, known: &[String]) -> Result<Element, ParseError> {
        let source = Source::new(fragment);
        let document = Document::parse(&source)?;
        let Some(root) = document.elements().next() else {
            return Err(ParseError::at(
                &source,
                Span::new(0, source.len()),
                ParseErrorKind::NotAValidElement,
                "fragment contains no element",
            ));
        };
        Element::build(&source, root, known)
    }

    /// Kind-specific attribute tokens, e.g. `[item, "of", items, "[]Item"]` for a loop.
    pub fn attr_parts(&self) -> Vec<String> {
        match &self.kind {
            ElementKind::Component { name } | ElementKind::Slot { name } => vec![name.clone()],
            ElementKind::For {
                item,
                collection,
                element_type,
            } => vec![
                item.clone(),
                "of".to_string(),
                collection.clone(),
                element_type.clone(),
            ],
            ElementKind::If { condition } | ElementKind::Else { condition } => {
                vec![condition.clone()]
            }
            ElementKind::Placeholder { target, .. } => vec![target.clone()],
        }
    }

    /// This element and all constructs below it, pre-order.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }
}

/// Pre-order walk over a construct tree.
pub struct Walk<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.stack.pop()?;
        self.stack.extend(element.children.iter().rev());
        Some(element)
    }
}

/// Hands out construct ids for one component tree.
#[derive(Debug, Default)]
pub struct IdCounter {
    next: usize,
}

impl IdCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> usize {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// The first construct marker `element` carries, by priority.
pub fn marker_of(element: &HtmlElement) -> Option<&'static str> {
    marker_attr(element).map(|(marker, _)| marker)
}

fn marker_attr(element: &HtmlElement) -> Option<(&'static str, &Attribute)> {
    MARKERS
        .into_iter()
        .find_map(|m| element.attr(m).map(|attr| (m, attr)))
}

struct TreeBuilder<'a> {
    source: &'a Source,
    known: &'a [String],
    /// Name of the component being built; its own tag is not a placeholder.
    component: Option<String>,
    ids: IdCounter,
}

impl<'a> TreeBuilder<'a> {
    fn new(source: &'a Source, known: &'a [String]) -> Self {
        Self {
            source,
            known,
            component: None,
            ids: IdCounter::new(),
        }
    }

    fn build_root(mut self, root: &HtmlElement) -> Result<Element, ParseError> {
        if let Some(attr) = root.attr("_component") {
            self.component = Some(attr.value_or_empty().trim().to_string());
        }
        let Some(kind) = self.classify_kind(root, true)? else {
            return Err(self.error(
                root.start_tag,
                ParseErrorKind::NotAValidElement,
                format!(
                    "<{}> carries none of {} and is not a known component",
                    root.name,
                    MARKERS.join(", ")
                ),
            ));
        };
        let element = self.build_element(root, kind)?;
        debug!(
            kind = element.kind.label(),
            constructs = element.walk().count(),
            "built construct tree"
        );
        Ok(element)
    }

    fn build_element(&mut self, html: &HtmlElement, kind: ElementKind) -> Result<Element, ParseError> {
        let id = self.ids.next_id();
        let mut children = Vec::new();
        self.collect_children(&html.children, &mut children)?;

        let markers = if let ElementKind::Placeholder { target, .. } = &kind {
            self.keep_slots_only(html, target, &mut children);
            Vec::new()
        } else {
            self.scan_own_markup(html.span, &children)?
        };
        self.check_else_pairing(&children)?;

        Ok(Element {
            kind,
            id,
            span: html.span,
            html: self.source.slice(html.span).to_string(),
            markers,
            children,
        })
    }

    /// The first construct on each branch below `nodes` is a direct child.
    fn collect_children(&mut self, nodes: &[Node], out: &mut Vec<Element>) -> Result<(), ParseError> {
        for node in nodes {
            let Node::Element(child) = node else {
                continue;
            };
            match self.classify_kind(child, false)? {
                Some(kind) => out.push(self.build_element(child, kind)?),
                None => self.collect_children(&child.children, out)?,
            }
        }
        Ok(())
    }

    fn classify_kind(&self, html: &HtmlElement, is_root: bool) -> Result<Option<ElementKind>, ParseError> {
        let Some((marker, attr)) = marker_attr(html) else {
            return match self.placeholder_target(&html.name) {
                Some(target) => Ok(Some(ElementKind::Placeholder {
                    target,
                    args: self.placeholder_args(html)?,
                })),
                None => Ok(None),
            };
        };

        let kind = match marker {
            "_component" => {
                if !is_root {
                    return Err(self.error(
                        attr.span,
                        ParseErrorKind::NotAValidElement,
                        "component definitions cannot be nested",
                    ));
                }
                ElementKind::Component {
                    name: self.single_token(attr, is_identifier)?,
                }
            }
            "_for" => self.parse_for(attr)?,
            "_if" => ElementKind::If {
                condition: self.single_token(attr, is_path)?,
            },
            "_else" => ElementKind::Else {
                condition: self.single_token(attr, is_path)?,
            },
            "_placeholder" => {
                let name = self.single_token(attr, is_identifier)?;
                let Some(target) = self.placeholder_target(&name) else {
                    return Err(self.error(
                        attr.span,
                        ParseErrorKind::MissingRequiredAttribute,
                        format!("`_placeholder` names unknown component '{name}'"),
                    ));
                };
                ElementKind::Placeholder {
                    target,
                    args: self.placeholder_args(html)?,
                }
            }
            _ => ElementKind::Slot {
                name: self.single_token(attr, is_identifier)?,
            },
        };
        Ok(Some(kind))
    }

    /// `ITEM of COLLECTION []TYPE`, exactly four tokens.
    fn parse_for(&self, attr: &Attribute) -> Result<ElementKind, ParseError> {
        let value = attr.value_or_empty();
        let tokens: Vec<&str> = value.split_whitespace().collect();
        let [item, of, collection, element_type] = tokens.as_slice() else {
            return Err(self.malformed_for(attr, value));
        };
        if *of != "of" || !is_identifier(item) || !is_path(collection) {
            return Err(self.malformed_for(attr, value));
        }
        if element_type.len() <= 2 || !element_type.starts_with("[]") {
            return Err(self.error(
                attr.span,
                ParseErrorKind::MalformedAttribute,
                format!("`_for` element type must be a slice type like `[]Item`, got `{element_type}`"),
            ));
        }
        Ok(ElementKind::For {
            item: item.to_string(),
            collection: collection.to_string(),
            element_type: element_type.to_string(),
        })
    }

    fn malformed_for(&self, attr: &Attribute, value: &str) -> ParseError {
        self.error(
            attr.span,
            ParseErrorKind::MalformedAttribute,
            format!("`_for` expects `ITEM of COLLECTION []TYPE`, got `{value}`"),
        )
    }

    /// A marker value made of exactly one token accepted by `valid`.
    fn single_token(&self, attr: &Attribute, valid: fn(&str) -> bool) -> Result<String, ParseError> {
        let value = attr.value_or_empty().trim();
        if value.is_empty() {
            return Err(self.error(
                attr.span,
                ParseErrorKind::MissingRequiredAttribute,
                format!("`{}` needs a value", attr.name),
            ));
        }
        if !valid(value) {
            return Err(self.error(
                attr.span,
                ParseErrorKind::MalformedAttribute,
                format!("`{}` expects a single identifier, got `{value}`", attr.name),
            ));
        }
        Ok(value.to_string())
    }

    /// The declared name of the component `tag` refers to, if any.
    fn placeholder_target(&self, tag: &str) -> Option<String> {
        self.known
            .iter()
            .filter(|name| self.component.as_deref() != Some(name.as_str()))
            .find(|name| name.eq_ignore_ascii_case(tag))
            .cloned()
    }

    fn placeholder_args(&self, html: &HtmlElement) -> Result<Vec<PlaceholderArg>, ParseError> {
        html.attributes
            .iter()
            .filter(|attr| !is_marker(&attr.name))
            .map(|attr| {
                Ok(PlaceholderArg {
                    name: attr.name.clone(),
                    value: AttrValue::classify(self.source, attr)?,
                    span: attr.span,
                })
            })
            .collect()
    }

    /// Placeholders only pass slots along; anything else inside them is dropped.
    fn keep_slots_only(&self, html: &HtmlElement, target: &str, children: &mut Vec<Element>) {
        children.retain(|child| {
            let keep = matches!(child.kind, ElementKind::Slot { .. });
            if !keep {
                warn!(
                    placeholder = target,
                    construct = child.kind.label(),
                    "construct outside `_slot` inside a placeholder is ignored"
                );
            }
            keep
        });

        let mut cursor = html.start_tag.end;
        let mut stray = String::new();
        for slot in children.iter() {
            stray.push_str(&self.source.text()[cursor..slot.span.start]);
            cursor = slot.span.end;
        }
        if cursor < html.span.end {
            stray.push_str(&self.source.text()[cursor..html.span.end]);
        }
        let closing = format!("</{}>", html.name);
        let stray = stray.trim();
        let tail = stray.len().saturating_sub(closing.len());
        let stray = match stray.get(tail..) {
            Some(end) if end.eq_ignore_ascii_case(&closing) => &stray[..tail],
            _ => stray,
        };
        if !stray.trim().is_empty() {
            warn!(
                placeholder = target,
                content = stray.trim(),
                "content outside `_slot` inside a placeholder is ignored"
            );
        }
    }

    /// Markers in `span` outside the children's spans.
    fn scan_own_markup(&self, span: Span, children: &[Element]) -> Result<Vec<Marker>, ParseError> {
        let mut markers = Vec::new();
        let mut cursor = span.start;
        for child in children {
            if child.span.start > cursor {
                markers.extend(scan_markers(
                    self.source,
                    Span::new(cursor, child.span.start),
                    Location::Text,
                )?);
            }
            cursor = child.span.end;
        }
        if cursor < span.end {
            markers.extend(scan_markers(
                self.source,
                Span::new(cursor, span.end),
                Location::Text,
            )?);
        }
        Ok(markers)
    }

    /// Every `_else` needs an earlier unpaired `_if` on the same condition
    /// among the same parent's constructs.
    fn check_else_pairing(&self, children: &[Element]) -> Result<(), ParseError> {
        let mut open: Vec<(&str, bool)> = Vec::new();
        for child in children {
            match &child.kind {
                ElementKind::If { condition } => open.push((condition.as_str(), false)),
                ElementKind::Else { condition } => {
                    if let Some((_, paired)) = open
                        .iter_mut()
                        .rev()
                        .find(|(c, paired)| *c == condition.as_str() && !*paired)
                    {
                        *paired = true;
                        continue;
                    }
                    match open.iter().find(|(c, _)| *c == condition.as_str()) {
                        Some(_) => {
                            return Err(self.error(
                                child.span,
                                ParseErrorKind::MissingRequiredAttribute,
                                format!("`_if=\"{condition}\"` already has an `_else`"),
                            ))
                        }
                        None => {
                            return Err(self.error(
                                child.span,
                                ParseErrorKind::MissingRequiredAttribute,
                                format!("`_else=\"{condition}\"` has no preceding `_if=\"{condition}\"`"),
                            ))
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn error(&self, span: Span, kind: ParseErrorKind, message: impl Into<String>) -> ParseError {
        ParseError::at(self.source, span, kind, message)
    }
}
