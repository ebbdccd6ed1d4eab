//! Component discovery across a set of template files.

use gtml_lexer::Source;
use tracing::debug;

use crate::dom::{Document, HtmlElement};
use crate::element::{Element, ElementKind};
use crate::{ParseError, ParseErrorKind};

/// Every `_component` element in `document`, in document order.
pub fn discover(document: &Document) -> Vec<&HtmlElement> {
    document.select_by_attr("_component").collect()
}

/// A component and the file it was declared in.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub name: String,
    pub file: String,
    pub element: Element,
}

/// All components of one build, in discovery order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentSet {
    components: Vec<Component>,
}

impl ComponentSet {
    /// Parse `(label, contents)` pairs into components.
    ///
    /// Names are collected from every file first, so a placeholder may refer
    /// to a component declared in any file of the set.
    pub fn parse<'a, I>(files: I) -> Result<ComponentSet, ParseError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut parsed = Vec::new();
        for (label, raw) in files {
            let source = Source::new(raw);
            let document = Document::parse(&source).map_err(|e| e.in_file(label))?;
            parsed.push((label, source, document));
        }

        let mut declared: Vec<(String, &str)> = Vec::new();
        for (label, source, document) in &parsed {
            for html in discover(document) {
                let name = html
                    .attr("_component")
                    .map(|attr| attr.value_or_empty().trim().to_string())
                    .unwrap_or_default();
                if let Some((_, first)) = declared.iter().find(|(n, _)| *n == name) {
                    let err = ParseError::at(
                        source,
                        html.start_tag,
                        ParseErrorKind::MalformedAttribute,
                        format!("component '{name}' is already declared in {first}"),
                    );
                    return Err(err.in_file(*label));
                }
                declared.push((name, *label));
            }
        }
        let names: Vec<String> = declared.into_iter().map(|(name, _)| name).collect();

        let mut components = Vec::new();
        for (label, source, document) in &parsed {
            for html in discover(document) {
                let element = Element::build(source, html, &names).map_err(|e| e.in_file(*label))?;
                let ElementKind::Component { name } = &element.kind else {
                    continue;
                };
                debug!(file = *label, component = %name, "discovered component");
                components.push(Component {
                    name: name.clone(),
                    file: label.to_string(),
                    element,
                });
            }
        }

        Ok(ComponentSet { components })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.components.iter()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Component names in discovery order.
    pub fn names(&self) -> Vec<&str> {
        self.components.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }
}

impl<'a> IntoIterator for &'a ComponentSet {
    type Item = &'a Component;
    type IntoIter = std::slice::Iter<'a, Component>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.iter()
    }
}
