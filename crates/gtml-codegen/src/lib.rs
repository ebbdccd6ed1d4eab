//! GTML Code Generator
//!
//! Compiles parsed components into Go functions that return strings.
//!
//! ```text
//! ComponentSet → Signatures (param) → Var per component (var, link) → Func → go::render_file
//! ```
//!
//! Each component becomes `func Name(params) string`. Loops, conditionals
//! and slots become closures written into a `strings.Builder`; placeholders
//! become closures calling the target component with arguments in the
//! target's parameter order.

pub mod go;
pub mod link;
pub mod param;
pub mod var;

pub use link::Signatures;
pub use param::{derive_params, Param};
pub use var::{Var, Write};

use gtml_parser::{ComponentSet, ParseError};
use tracing::{debug, instrument};

/// What went wrong while generating code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CodegenErrorKind {
    #[error("Parse error")]
    Parse,
    /// A placeholder call lacks an argument for a callee parameter.
    #[error("Missing required attribute")]
    MissingRequiredAttribute,
    /// A placeholder argument that does not fit its parameter, or a name
    /// used with two types.
    #[error("Malformed attribute")]
    MalformedAttribute,
    /// The generator produced an inconsistent call. Never expected from
    /// well-formed input.
    #[error("Malformed generated call")]
    MalformedGeneratedCall,
}

/// Code generation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}{}: {message}{}", origin(.component), near(.snippet))]
pub struct CodegenError {
    pub kind: CodegenErrorKind,
    pub message: String,
    /// Empty for wrapped parse errors, whose message already quotes one.
    pub snippet: String,
    /// The component being generated, when known.
    pub component: Option<String>,
}

fn origin(component: &Option<String>) -> String {
    match component {
        Some(name) => format!(" in component '{name}'"),
        None => String::new(),
    }
}

fn near(snippet: &str) -> String {
    if snippet.is_empty() {
        String::new()
    } else {
        format!(" (near `{snippet}`)")
    }
}

impl CodegenError {
    pub fn new(kind: CodegenErrorKind, message: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            snippet: snippet.into(),
            component: None,
        }
    }

    pub fn in_component(mut self, name: impl Into<String>) -> Self {
        self.component = Some(name.into());
        self
    }
}

impl From<ParseError> for CodegenError {
    fn from(err: ParseError) -> Self {
        Self {
            kind: CodegenErrorKind::Parse,
            message: err.to_string(),
            snippet: String::new(),
            component: None,
        }
    }
}

/// One generated top-level function.
#[derive(Debug, Clone, PartialEq)]
pub struct Func {
    pub name: String,
    pub params: Vec<Param>,
    /// The complete Go function declaration.
    pub data: String,
}

/// Generate one function per component, in discovery order.
#[instrument(skip_all, fields(components = set.len()))]
pub fn compile(set: &ComponentSet) -> Result<Vec<Func>, CodegenError> {
    let signatures = Signatures::derive(set)?;
    let mut funcs = Vec::with_capacity(set.len());

    for component in set {
        let var = Var::new(&component.element, &signatures)
            .map_err(|e| e.in_component(&component.name))?;
        let params = signatures
            .get(&component.name)
            .map(<[Param]>::to_vec)
            .unwrap_or_default();
        debug!(
            component = %component.name,
            params = params.len(),
            constructs = component.element.walk().count() - 1,
            "generated function"
        );
        funcs.push(Func {
            name: component.name.clone(),
            params,
            data: var.data,
        });
    }

    Ok(funcs)
}

/// Parse `(label, contents)` files, generate every component and render the
/// Go file for `package`.
pub fn compile_files<'a, I>(files: I, package: &str) -> Result<String, CodegenError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let set = ComponentSet::parse(files)?;
    let funcs = compile(&set)?;
    Ok(go::render_file(package, &funcs))
}
