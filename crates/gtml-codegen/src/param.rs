//! Function parameters derived from a component's construct tree.

use std::fmt;

use gtml_lexer::snippet_of;
use gtml_parser::{AttrValue, Element, ElementKind, Marker};

use crate::link::{find_param, Signatures};
use crate::{CodegenError, CodegenErrorKind};

/// One `name type` pair of a generated function signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Param {
    pub name: String,
    pub ty: String,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.ty)
    }
}

/// Parameters of the function generated for `root`, in first-seen order.
///
/// Markers come first: `$prop`/`$slot` runes and bare `{{ name }}`
/// interpolations give string parameters. A placeholder attribute whose
/// whole value is such a marker takes the type of the callee parameter it
/// feeds, looked up in `callees`. Construct attributes follow: `_if`/`_else`
/// conditions are bools and `_for` collections take the loop's slice type.
/// Dotted names, and names bound by an enclosing `_for`, read something
/// already in scope and give nothing.
///
/// A name forwarded to a callee missing from `callees` (one still being
/// derived further up a call cycle) is a string, appended last, unless the
/// component gives it a type elsewhere.
pub fn derive_params(root: &Element, callees: &Signatures) -> Result<Vec<Param>, CodegenError> {
    let mut params = ParamList::default();
    let mut untyped = Vec::new();

    visit_scoped(root, &mut Vec::new(), &mut |element, outer| {
        for (name, ty) in marker_params(element, callees) {
            if outer.contains(&name) || loop_item(element) == Some(name) {
                continue;
            }
            match ty {
                Some(ty) => params.add(name, &ty, element)?,
                None => untyped.push(name),
            }
        }
        Ok(())
    })?;

    visit_scoped(root, &mut Vec::new(), &mut |element, outer| {
        let (name, ty) = match &element.kind {
            ElementKind::If { condition } | ElementKind::Else { condition } => {
                (condition.as_str(), "bool")
            }
            ElementKind::For {
                collection,
                element_type,
                ..
            } => (collection.as_str(), element_type.as_str()),
            _ => return Ok(()),
        };
        if !name.contains('.') && !outer.contains(&name) {
            params.add(name, ty, element)?;
        }
        Ok(())
    })?;

    for name in untyped {
        if !params.0.iter().any(|p| p.name == name) {
            params.0.push(Param::new(name, "string"));
        }
    }
    Ok(params.0)
}

/// Pre-order walk handing each element the loop items bound around it.
/// A `_for`'s own item is bound for its descendants only.
fn visit_scoped<'e, F>(
    element: &'e Element,
    bound: &mut Vec<&'e str>,
    visit: &mut F,
) -> Result<(), CodegenError>
where
    F: FnMut(&'e Element, &[&'e str]) -> Result<(), CodegenError>,
{
    visit(element, bound.as_slice())?;
    let item = loop_item(element);
    if let Some(item) = item {
        bound.push(item);
    }
    for child in &element.children {
        visit_scoped(child, bound, visit)?;
    }
    if item.is_some() {
        bound.pop();
    }
    Ok(())
}

fn loop_item(element: &Element) -> Option<&str> {
    match &element.kind {
        ElementKind::For { item, .. } => Some(item.as_str()),
        _ => None,
    }
}

/// Names the element's own markers and placeholder arguments ask for, with
/// their type when it is known.
fn marker_params<'e>(element: &'e Element, callees: &Signatures) -> Vec<(&'e str, Option<String>)> {
    let string = |name| (name, Some("string".to_string()));
    let mut found: Vec<(&str, Option<String>)> = element
        .markers
        .iter()
        .filter_map(declared_name)
        .map(string)
        .collect();

    if let ElementKind::Placeholder { target, args } = &element.kind {
        for arg in args {
            if let AttrValue::Expression(marker) = &arg.value {
                if let Some(name) = declared_name(marker) {
                    let ty = callees.get(target).map(|params| {
                        find_param(params, &arg.name)
                            .map_or("string", |param| param.ty.as_str())
                            .to_string()
                    });
                    found.push((name, ty));
                    continue;
                }
            }
            found.extend(arg.value.markers().into_iter().filter_map(declared_name).map(string));
        }
    }
    found
}

/// The parameter a marker asks for, if any.
fn declared_name(marker: &Marker) -> Option<&str> {
    match marker {
        Marker::Rune(rune) if rune.kind.declares_param() => Some(rune.value.as_str()),
        Marker::Prop(prop) if prop.is_bare_identifier() => Some(prop.value.as_str()),
        _ => None,
    }
}

/// Parameters de-duplicated by `name type`.
#[derive(Default)]
struct ParamList(Vec<Param>);

impl ParamList {
    fn add(&mut self, name: &str, ty: &str, at: &Element) -> Result<(), CodegenError> {
        if let Some(first) = self.0.iter().find(|p| p.name == name) {
            if first.ty == ty {
                return Ok(());
            }
            return Err(CodegenError::new(
                CodegenErrorKind::MalformedAttribute,
                format!("`{name}` is used as both `{}` and `{ty}`", first.ty),
                snippet_of(&at.html),
            ));
        }
        self.0.push(Param::new(name, ty));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtml_parser::ComponentSet;
    use pretty_assertions::assert_eq;

    fn params(fragment: &str) -> Vec<String> {
        params_with(fragment, &[])
    }

    fn params_with(fragment: &str, known: &[&str]) -> Vec<String> {
        let known: Vec<String> = known.iter().map(|n| n.to_string()).collect();
        let element = Element::classify(fragment, &known).unwrap();
        derive_params(&element, &Signatures::default())
            .unwrap()
            .iter()
            .map(|p| p.to_string())
            .collect()
    }

    fn signature(files: &[&str], name: &str) -> Result<Vec<String>, CodegenError> {
        let labelled: Vec<(&str, &str)> = files.iter().map(|f| ("test.html", *f)).collect();
        let set = ComponentSet::parse(labelled).unwrap();
        let signatures = Signatures::derive(&set)?;
        Ok(signatures
            .get(name)
            .unwrap()
            .iter()
            .map(|p| p.to_string())
            .collect())
    }

    const GREETING: &str =
        "<p _component=\"Greeting\">Hello {{ name }}<b _if=\"excited\">!</b></p>";

    #[test]
    fn test_first_seen_order() {
        let fragment = "<div _component=\"A\">{{ b }}{{ a }}<p _for=\"x of items []Item\">{{ x.Name }}</p></div>";
        assert_eq!(params(fragment), vec!["b string", "a string", "items []Item"]);
        // Stable across runs.
        assert_eq!(params(fragment), params(fragment));
    }

    #[test]
    fn test_dotted_collection_is_not_a_param() {
        assert_eq!(
            params("<div _component=\"A\"><p _for=\"x of outer.items []Item\"></p></div>"),
            Vec::<String>::new()
        );
        assert_eq!(
            params("<div _component=\"A\"><p _for=\"x of items []Item\"></p></div>"),
            vec!["items []Item"]
        );
    }

    #[test]
    fn test_nested_loop_over_item_member() {
        let fragment = "<div _component=\"A\">\
            <ul _for=\"group of groups []Group\">\
              <li _for=\"entry of group.Entries []Entry\">{{ entry.Title }}</li>\
            </ul></div>";
        assert_eq!(params(fragment), vec!["groups []Group"]);
    }

    #[test]
    fn test_conditions_are_bools() {
        let fragment = "<div _component=\"A\"><p _if=\"loggedIn\"></p><p _else=\"loggedIn\"></p><p _if=\"user.Admin\"></p></div>";
        assert_eq!(params(fragment), vec!["loggedIn bool"]);
    }

    #[test]
    fn test_runes() {
        let fragment = "<div _component=\"A\" title=\"$prop('title')\">$slot(\"body\")$val(count)$pipe(raw)</div>";
        assert_eq!(params(fragment), vec!["title string", "body string"]);
    }

    #[test]
    fn test_loop_item_is_in_scope() {
        let fragment = "<div _component=\"A\"><p _for=\"item of items []string\">{{ item }}</p>{{ item }}</div>";
        // Inside the loop `item` is bound; outside it is a parameter.
        assert_eq!(params(fragment), vec!["item string", "items []string"]);
    }

    #[test]
    fn test_deduplicated() {
        let fragment = "<div _component=\"A\">{{ name }}<p _if=\"on\">{{ name }}</p>$prop(\"name\")<p _if=\"on\"></p></div>";
        assert_eq!(params(fragment), vec!["name string", "on bool"]);
    }

    #[test]
    fn test_placeholder_arguments_count() {
        let card = "<section _component=\"Card\"><h2>{{ title }}</h2>$slot(\"body\")</section>";
        let page = "<div _component=\"Page\"><card title=\"{{ heading }}\" count=\"3\"><div _slot=\"body\">{{ text }}</div></card></div>";
        assert_eq!(
            signature(&[card, page], "Page").unwrap(),
            vec!["heading string", "text string"]
        );
        // Without the callee's signature a forwarded name goes last.
        assert_eq!(
            params_with(page, &["Page", "Card"]),
            vec!["text string", "heading string"]
        );
    }

    #[test]
    fn test_expressions_other_than_names_give_nothing() {
        assert_eq!(
            params("<div _component=\"A\">{{ user.Name }}{{ len(items) }}</div>"),
            Vec::<String>::new()
        );
    }

    // =========================================================================
    // Loop scope
    // =========================================================================

    #[test]
    fn test_loop_over_bound_item() {
        let fragment = "<table _component=\"A\">\
            <tr _for=\"row of rows [][]Cell\">\
              <td _for=\"cell of row []Cell\">{{ cell }}</td>\
            </tr></table>";
        assert_eq!(params(fragment), vec!["rows [][]Cell"]);
    }

    #[test]
    fn test_condition_on_bound_item() {
        let fragment = "<ul _component=\"A\"><li _for=\"on of flags []bool\"><b _if=\"on\">!</b></li></ul>";
        assert_eq!(params(fragment), vec!["flags []bool"]);
    }

    #[test]
    fn test_loop_item_not_in_scope_of_own_collection() {
        let fragment = "<ul _component=\"A\"><li _for=\"x of x []string\">{{ x }}</li></ul>";
        assert_eq!(params(fragment), vec!["x []string"]);
    }

    // =========================================================================
    // Forwarded placeholder arguments
    // =========================================================================

    #[test]
    fn test_forwarded_argument_takes_callee_type() {
        let page = "<main _component=\"Page\"><greeting name=\"Sam\" excited=\"{{ loud }}\"></greeting></main>";
        assert_eq!(signature(&[GREETING, page], "Page").unwrap(), vec!["loud bool"]);

        // The caller may come first in the set.
        assert_eq!(signature(&[page, GREETING], "Page").unwrap(), vec!["loud bool"]);
    }

    #[test]
    fn test_forwarded_argument_matches_condition() {
        let page = "<main _component=\"Page\"><b _if=\"loud\">!</b>\
            <greeting name=\"Sam\" excited=\"{{ loud }}\"></greeting></main>";
        assert_eq!(signature(&[GREETING, page], "Page").unwrap(), vec!["loud bool"]);
    }

    #[test]
    fn test_name_with_two_types() {
        let page = "<main _component=\"Page\">{{ loud }}\
            <greeting name=\"Sam\" excited=\"{{ loud }}\"></greeting></main>";
        let err = signature(&[GREETING, page], "Page").unwrap_err();
        assert_eq!(err.kind, CodegenErrorKind::MalformedAttribute);
        assert_eq!(err.component.as_deref(), Some("Page"));
        assert!(err.message.contains("both `string` and `bool`"));
    }

    #[test]
    fn test_template_argument_stays_string() {
        let page = "<main _component=\"Page\"><greeting name=\"Dr. {{ who }}\" excited></greeting></main>";
        assert_eq!(signature(&[GREETING, page], "Page").unwrap(), vec!["who string"]);
    }

    #[test]
    fn test_call_cycle_without_types() {
        let a = "<div _component=\"Ping\"><pong n=\"{{ n }}\"></pong></div>";
        let b = "<div _component=\"Pong\"><ping n=\"{{ n }}\"></ping></div>";
        assert_eq!(signature(&[a, b], "Pong").unwrap(), vec!["n string"]);
        assert_eq!(signature(&[a, b], "Ping").unwrap(), vec!["n string"]);
    }

    #[test]
    fn test_call_cycle_terminates() {
        let a = "<div _component=\"Ping\"><pong n=\"{{ n }}\"></pong></div>";
        let b = "<div _component=\"Pong\"><b _if=\"n\"></b><ping n=\"{{ n }}\"></ping></div>";
        assert_eq!(signature(&[a, b], "Pong").unwrap(), vec!["n bool"]);
        assert_eq!(signature(&[a, b], "Ping").unwrap(), vec!["n bool"]);
    }
}
