//! `key: value` line parser
//!
//! Turns the plain text of a base document into the mapping used to fill a
//! template. Rules, per line:
//! - blank lines and lines starting with `#` are skipped
//! - lines without a colon are skipped
//! - the line is split on the first colon; key and value are trimmed
//! - an empty key is skipped
//! - a repeated key overwrites the earlier value

use std::collections::BTreeMap;

use serde::Serialize;

/// Parsed key/value pairs.
///
/// Ordered by key so that placeholder substitution is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct KeyValues(BTreeMap<String, String>);

impl KeyValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pair, returning the previous value for the key
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for KeyValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = KeyValues::new();
        for (k, v) in iter {
            values.insert(k, v);
        }
        values
    }
}

impl From<BTreeMap<String, String>> for KeyValues {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

/// Parse `key: value` lines into a mapping
pub fn parse_key_values(text: &str) -> KeyValues {
    let mut pairs = KeyValues::new();

    for line in text.split(is_line_break) {
        if let Some((key, value)) = parse_line(line) {
            pairs.insert(key, value);
        }
    }

    tracing::debug!("Parsed {} key/value pairs", pairs.len());
    pairs
}

/// Line boundaries, including the form feeds PDF extraction leaves between pages.
/// A `\r\n` pair yields an extra empty line, which is skipped anyway.
fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

fn parse_line(line: &str) -> Option<(&str, &str)> {
    let cleaned = line.trim();
    if cleaned.is_empty() || cleaned.starts_with('#') {
        return None;
    }

    let (key, value) = cleaned.split_once(':')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }

    Some((key, value.trim()))
}
