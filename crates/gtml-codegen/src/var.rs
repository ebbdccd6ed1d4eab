//! Go code for each construct.
//!
//! Every construct becomes a [`Var`]: a declaration (a closure, or the
//! top-level function for a component) plus the expression that renders it
//! in its parent. A construct's body is its builder series: the element's
//! markup cut at child construct and marker spans, each cut replaced by a
//! computed write.

use gtml_lexer::{snippet_of, Span};
use gtml_parser::{Element, ElementKind, Location, Marker, RuneKind};

use crate::go;
use crate::link::{link_call, Signatures, SlotArg};
use crate::{CodegenError, CodegenErrorKind};

/// One instruction of a builder series.
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Markup copied verbatim.
    Literal(String),
    /// A Go expression producing a string.
    Value(String),
}

/// Generated code for one construct.
#[derive(Debug, Clone, PartialEq)]
pub struct Var {
    /// `for1`, `if2`, ... or the function name for a component.
    pub name: String,
    /// Name of the `strings.Builder` the body writes to.
    pub builder: String,
    pub children: Vec<Var>,
    pub series: Vec<Write>,
    /// Expression rendering this construct in its parent's series; the
    /// function name for a component.
    pub call: String,
    /// Go source declaring this construct.
    pub data: String,
}

impl Var {
    /// Generate `element` and everything below it.
    pub fn new(element: &Element, signatures: &Signatures) -> Result<Var, CodegenError> {
        let name = match &element.kind {
            ElementKind::Component { name } => name.clone(),
            kind => format!("{}{}", kind.label(), element.id),
        };
        let builder = match element.kind {
            ElementKind::Component { .. } => "builder".to_string(),
            _ => format!("{name}Builder"),
        };
        let children = element
            .children
            .iter()
            .map(|child| Var::new(child, signatures))
            .collect::<Result<Vec<_>, _>>()?;

        if let ElementKind::Placeholder { target, args } = &element.kind {
            let slots: Vec<SlotArg> = element
                .children
                .iter()
                .zip(&children)
                .filter_map(|(child, var)| match &child.kind {
                    ElementKind::Slot { name } => Some(SlotArg {
                        name: name.clone(),
                        expr: var.call.clone(),
                    }),
                    _ => None,
                })
                .collect();
            let linked = link_call(target, args, &slots, signatures, &element.html)?;

            let mut body = String::new();
            for (child, var) in element.children.iter().zip(&children) {
                let used = match &child.kind {
                    ElementKind::Slot { name } => linked.used_slots.contains(name),
                    _ => false,
                };
                if used {
                    body.push_str(&go::indent(&var.data));
                    body.push('\n');
                }
            }
            body.push_str(&format!("\treturn {}\n", linked.call));

            return Ok(Var {
                data: format!("{name} := func() string {{\n{body}}}"),
                call: format!("{name}()"),
                name,
                builder,
                children,
                series: Vec::new(),
            });
        }

        let series = builder_series(element, &children);
        let body = render_body(&builder, &children, &series);
        let (data, call) = match &element.kind {
            ElementKind::Component { name: func } => {
                let Some(params) = signatures.get(func) else {
                    return Err(CodegenError::new(
                        CodegenErrorKind::MalformedGeneratedCall,
                        format!("no signature was derived for '{func}'"),
                        snippet_of(&element.html),
                    ));
                };
                let params: Vec<String> = params.iter().map(|p| p.to_string()).collect();
                (
                    format!("func {func}({}) string {{\n{body}}}", params.join(", ")),
                    func.clone(),
                )
            }
            ElementKind::For {
                item,
                collection,
                element_type,
            } => {
                let item_type = element_type.strip_prefix("[]").unwrap_or(element_type);
                (
                    format!("{name} := func(_ int, {item} {item_type}) string {{\n{body}}}"),
                    format!("gtmlFor({collection}, {name})"),
                )
            }
            ElementKind::If { condition } => (
                closure(&name, &body),
                format!("gtmlIf({condition}, {name})"),
            ),
            ElementKind::Else { condition } => (
                closure(&name, &body),
                format!("gtmlElse({condition}, {name})"),
            ),
            ElementKind::Slot { .. } => (closure(&name, &body), format!("gtmlSlot({name})")),
            ElementKind::Placeholder { .. } => unreachable!("placeholders return above"),
        };

        Ok(Var {
            name,
            builder,
            children,
            series,
            call,
            data,
        })
    }
}

fn closure(name: &str, body: &str) -> String {
    format!("{name} := func() string {{\n{body}}}")
}

/// Child declarations, then one `WriteString` per series entry.
fn render_body(builder: &str, children: &[Var], series: &[Write]) -> String {
    let mut body = format!("\tvar {builder} strings.Builder\n");
    for child in children {
        body.push_str(&go::indent(&child.data));
        body.push('\n');
    }
    for write in series {
        let arg = match write {
            Write::Literal(text) => go::quote(text),
            Write::Value(expr) => expr.clone(),
        };
        body.push_str(&format!("\t{builder}.WriteString({arg})\n"));
    }
    body.push_str(&format!("\treturn {builder}.String()\n"));
    body
}

/// The builder series of `element`, whose children generated `children`.
///
/// Child construct spans and marker spans become value writes, everything
/// between them literal writes, all in source order.
pub fn builder_series(element: &Element, children: &[Var]) -> Vec<Write> {
    let mut cuts: Vec<(Span, String)> = element
        .children
        .iter()
        .zip(children)
        .map(|(child, var)| (child.span, var.call.clone()))
        .collect();
    cuts.extend(element.markers.iter().map(|m| (m.span(), value_expr(m))));
    cuts.sort_by_key(|(span, _)| span.start);

    let base = element.span.start;
    let html = element.html.as_str();
    let mut series = Vec::new();
    let mut cursor = 0;
    for (span, expr) in cuts {
        let span = span.relative_to(base);
        if span.start > cursor {
            series.push(Write::Literal(html[cursor..span.start].to_string()));
        }
        series.push(Write::Value(expr));
        cursor = span.end;
    }
    if cursor < html.len() {
        series.push(Write::Literal(html[cursor..].to_string()));
    }
    series
}

/// Interpolations, `$prop` and `$val` are escaped; `$slot` markup and
/// `$pipe` values are written as they are. A `$pipe` inside an attribute
/// value still has its quotes escaped so it cannot end the attribute.
fn value_expr(marker: &Marker) -> String {
    match marker {
        Marker::Prop(prop) => format!("gtmlEscape({})", prop.value),
        Marker::Rune(rune) => match (rune.kind, marker.location()) {
            (RuneKind::Prop | RuneKind::Val, _) => format!("gtmlEscape({})", rune.value),
            (RuneKind::Slot, _) => rune.value.clone(),
            (RuneKind::Pipe, Location::Attribute) => format!("gtmlRawAttr({})", rune.value),
            (RuneKind::Pipe, Location::Text) => format!("gtmlRaw({})", rune.value),
        },
    }
}
