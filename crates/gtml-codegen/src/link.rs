//! Placeholder call-site linking.
//!
//! A placeholder's attributes and slots are keyed by name. The callee's
//! derived parameter list decides the positional order of the call.

use gtml_lexer::snippet_of;
use gtml_parser::{AttrValue, ComponentSet, ElementKind, LiteralKind, Piece, PlaceholderArg};
use tracing::{debug, warn};

use crate::go;
use crate::param::{derive_params, Param};
use crate::{CodegenError, CodegenErrorKind};

/// Every component's parameter list, derived once per build.
#[derive(Debug, Clone, Default)]
pub struct Signatures {
    entries: Vec<(String, Vec<Param>)>,
}

impl Signatures {
    /// Derive every component's parameters, callees before their callers.
    ///
    /// A placeholder argument forwarding a caller's parameter takes the
    /// callee's type, so the callee must be known first. Inside a call cycle
    /// the callee is not known yet and forwarded names stay `string`.
    pub fn derive(set: &ComponentSet) -> Result<Self, CodegenError> {
        let mut signatures = Self::default();
        let mut visiting = Vec::new();
        for component in set {
            signatures.resolve(set, &component.name, &mut visiting)?;
        }
        Ok(signatures)
    }

    fn resolve<'s>(
        &mut self,
        set: &'s ComponentSet,
        name: &str,
        visiting: &mut Vec<&'s str>,
    ) -> Result<(), CodegenError> {
        if self.get(name).is_some() || visiting.iter().any(|v| *v == name) {
            return Ok(());
        }
        let Some(component) = set.get(name) else {
            return Ok(());
        };

        visiting.push(&component.name);
        for element in component.element.walk() {
            if let ElementKind::Placeholder { target, .. } = &element.kind {
                self.resolve(set, target, visiting)?;
            }
        }
        visiting.pop();

        let params =
            derive_params(&component.element, self).map_err(|e| e.in_component(&component.name))?;
        debug!(component = %component.name, params = params.len(), "derived signature");
        self.entries.push((component.name.clone(), params));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&[Param]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, params)| params.as_slice())
    }
}

/// One keyed argument before ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct CallArg {
    pub key: String,
    pub expr: String,
}

/// A rendered slot handed to a placeholder call.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotArg {
    pub name: String,
    pub expr: String,
}

/// A linked call and the slots it consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct Linked {
    pub call: String,
    pub used_slots: Vec<String>,
}

/// Build the call expression `target(args...)` for one placeholder.
///
/// `html` is the placeholder's markup, used for error snippets.
pub fn link_call(
    target: &str,
    args: &[PlaceholderArg],
    slots: &[SlotArg],
    signatures: &Signatures,
    html: &str,
) -> Result<Linked, CodegenError> {
    let Some(params) = signatures.get(target) else {
        return Err(CodegenError::new(
            CodegenErrorKind::MalformedGeneratedCall,
            format!("placeholder refers to '{target}', which has no generated function"),
            snippet_of(html),
        ));
    };

    let mut keyed: Vec<CallArg> = Vec::new();
    let mut used_slots = Vec::new();
    for arg in args {
        let Some(param) = find_param(params, &arg.name) else {
            warn!(
                component = target,
                attribute = %arg.name,
                "attribute matches no parameter and is ignored"
            );
            continue;
        };
        let expr = argument_expr(target, param, &arg.value, html)?;
        push_keyed(&mut keyed, &param.name, expr, target, html)?;
    }
    for slot in slots {
        let Some(param) = find_param(params, &slot.name) else {
            warn!(
                component = target,
                slot = %slot.name,
                "slot matches no parameter and is ignored"
            );
            continue;
        };
        push_keyed(&mut keyed, &param.name, slot.expr.clone(), target, html)?;
        used_slots.push(slot.name.clone());
    }

    let mut ordered = Vec::with_capacity(params.len());
    for param in params {
        let Some(arg) = keyed.iter().find(|a| a.key == param.name) else {
            return Err(CodegenError::new(
                CodegenErrorKind::MissingRequiredAttribute,
                format!("<{target}> needs a value for `{param}`"),
                snippet_of(html),
            ));
        };
        ordered.push(arg.expr.as_str());
    }

    Ok(Linked {
        call: format!("{target}({})", ordered.join(", ")),
        used_slots,
    })
}

/// Attribute names match parameters case-insensitively; HTML folds case.
pub(crate) fn find_param<'p>(params: &'p [Param], key: &str) -> Option<&'p Param> {
    params
        .iter()
        .find(|p| p.name == key)
        .or_else(|| params.iter().find(|p| p.name.eq_ignore_ascii_case(key)))
}

fn push_keyed(
    keyed: &mut Vec<CallArg>,
    key: &str,
    expr: String,
    target: &str,
    html: &str,
) -> Result<(), CodegenError> {
    if keyed.iter().any(|a| a.key == key) {
        return Err(CodegenError::new(
            CodegenErrorKind::MalformedAttribute,
            format!("<{target}> receives `{key}` twice"),
            snippet_of(html),
        ));
    }
    keyed.push(CallArg {
        key: key.to_string(),
        expr,
    });
    Ok(())
}

/// Convert an attribute value to a Go expression of the parameter's type.
fn argument_expr(
    target: &str,
    param: &Param,
    value: &AttrValue,
    html: &str,
) -> Result<String, CodegenError> {
    let mismatch = |what: &str| {
        CodegenError::new(
            CodegenErrorKind::MalformedAttribute,
            format!("<{target}> `{param}` cannot take {what}"),
            snippet_of(html),
        )
    };

    match value {
        AttrValue::Empty => match param.ty.as_str() {
            "bool" => Ok("true".to_string()),
            "string" => Ok(go::quote("")),
            _ => Err(mismatch("an empty value")),
        },
        AttrValue::Literal(kind, text) => match (param.ty.as_str(), kind) {
            ("string", _) => Ok(go::quote(text)),
            ("bool", LiteralKind::Bool) | ("int", LiteralKind::Int) => Ok(text.clone()),
            _ => Err(mismatch(&format!("the literal `{text}`"))),
        },
        AttrValue::Expression(marker) => Ok(marker.expr().to_string()),
        AttrValue::Template(pieces) => {
            if param.ty != "string" {
                return Err(mismatch("text mixed with expressions"));
            }
            let parts: Vec<String> = pieces
                .iter()
                .map(|piece| match piece {
                    Piece::Text(text) => go::quote(text),
                    Piece::Marker(marker) => marker.expr().to_string(),
                })
                .collect();
            Ok(parts.join(" + "))
        }
    }
}
