//! Selector composition for nested keys.

/// Split a selector list on top-level commas.
///
/// Commas inside parentheses, brackets or quotes (`:is(a, b)`, `[title="a,b"]`) do not split.
/// Parts are trimmed and empty parts dropped.
pub fn split_top_level(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0_usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (index, character) in list.char_indices() {
        match (quote, character) {
            (Some(open), current) if current == open => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(character),
            (None, '(' | '[') => depth += 1,
            (None, ')' | ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&list[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);
    parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

/// Collapse runs of whitespace into a single space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Apply a modifier key to the current selector.
///
/// Every `&` is replaced by the current selector; keys without `&` (`:hover`, `[open]`) are
/// appended directly. Selector lists on either side produce every combination.
pub fn resolve_modifier(current: &str, pattern: &str) -> String {
    let roots = split_top_level(current);
    let roots = if roots.is_empty() { vec![""] } else { roots };
    let mut out = Vec::new();
    for root in &roots {
        for part in split_top_level(pattern) {
            let part = collapse_whitespace(part);
            if part.contains('&') {
                out.push(part.replace('&', root));
            } else {
                out.push(format!("{root}{part}"));
            }
        }
    }
    out.join(", ")
}

/// Join a descendant key under the current selector (`.x` + `span` = `.x span`).
pub fn join_descendant(current: &str, key: &str) -> String {
    let roots = split_top_level(current);
    let mut out = Vec::new();
    for part in split_top_level(key) {
        let part = collapse_whitespace(part);
        if roots.is_empty() {
            out.push(part);
            continue;
        }
        for root in &roots {
            out.push(format!("{root} {part}"));
        }
    }
    out.join(", ")
}

/// Reduce arbitrary text to a valid CSS identifier fragment.
///
/// ASCII alphanumerics, `-` and `_` are kept, anything else becomes `-`. A leading digit is
/// prefixed with `_`.
pub fn sanitize_ident(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for character in raw.trim().chars() {
        if character.is_ascii_alphanumeric() || character == '-' || character == '_' {
            out.push(character);
        } else {
            out.push('-');
        }
    }
    if out.starts_with(|character: char| character.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}
