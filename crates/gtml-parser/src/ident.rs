//! Identifier rules shared by construct attributes and runes.

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// One or more identifiers joined by `.`, e.g. `user` or `item.Author.Name`.
pub fn is_path(s: &str) -> bool {
    !s.is_empty() && s.split('.').all(is_identifier)
}
