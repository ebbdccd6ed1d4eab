//! Go source helpers and output file assembly.

use crate::Func;

/// Go keywords, which cannot name a package.
const KEYWORDS: [&str; 25] = [
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

/// Runtime helpers every generated file carries.
pub const HELPERS: &str = r#"func gtmlFor[T any](items []T, render func(int, T) string) string {
	var builder strings.Builder
	for i, item := range items {
		builder.WriteString(render(i, item))
	}
	return builder.String()
}

func gtmlIf(condition bool, render func() string) string {
	if condition {
		return render()
	}
	return ""
}

func gtmlElse(condition bool, render func() string) string {
	if !condition {
		return render()
	}
	return ""
}

func gtmlSlot(render func() string) string {
	return render()
}

func gtmlEscape(value any) string {
	return html.EscapeString(fmt.Sprint(value))
}

func gtmlRaw(value any) string {
	return fmt.Sprint(value)
}

func gtmlRawAttr(value any) string {
	return strings.NewReplacer(`"`, "&#34;", "'", "&#39;").Replace(fmt.Sprint(value))
}
"#;

/// Quote `text` as a Go interpreted string literal, byte for byte.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Indent every non-empty line of `code` by one tab.
pub fn indent(code: &str) -> String {
    code.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("\t{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A valid Go package name: an identifier that is not a keyword.
pub fn is_package_name(name: &str) -> bool {
    gtml_parser::ident::is_identifier(name) && !KEYWORDS.contains(&name)
}

/// The complete output file: header, package clause, imports, helpers and
/// every function in order.
pub fn render_file(package: &str, funcs: &[Func]) -> String {
    let mut out = String::new();
    out.push_str("// Code generated by gtml. DO NOT EDIT.\n\n");
    out.push_str(&format!("package {package}\n\n"));
    out.push_str("import (\n\t\"fmt\"\n\t\"html\"\n\t\"strings\"\n)\n\n");
    out.push_str(HELPERS);
    for func in funcs {
        out.push('\n');
        out.push_str(&func.data);
        out.push('\n');
    }
    out
}
