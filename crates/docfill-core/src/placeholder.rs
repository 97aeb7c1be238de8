//! `{{key}}` placeholder markers

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Build the literal marker for a key
pub fn placeholder(key: &str) -> String {
    format!("{OPEN}{key}{CLOSE}")
}

/// Keys of every `{{...}}` marker in `text`, left to right.
///
/// Markers do not nest or overlap. An inner text that is empty or contains a
/// brace does not count as a placeholder.
pub fn find_placeholders(text: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find(OPEN) {
        let after_open = &rest[start + OPEN.len()..];
        let Some(end) = after_open.find(CLOSE) else {
            break;
        };

        let inner = &after_open[..end];
        if !inner.is_empty() && !inner.contains(['{', '}']) {
            keys.push(inner.to_string());
            rest = &after_open[end + CLOSE.len()..];
        } else {
            // Resume right after the opening brace so `{{{key}}` still matches
            rest = &rest[start + 1..];
        }
    }

    keys
}
