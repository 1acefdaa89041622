//! Pure functions for URL and query parameter handling.
//!
//! This module contains stateless, side-effect-free functions for splitting URLs, parsing
//! `key=value&key=value` strings into ordered pairs and building them back up again.

use std::collections::BTreeSet;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{Error, Result};

/// Marker prefix for a negative flag, e.g. `-subscribe`.
pub const NEGATIVE_FLAG_PREFIX: char = '-';

/// Ordered key/value pairs parsed from a query or fragment query.
///
/// Insertion order is kept. Re-inserting an existing key replaces its value in place.
/// Keys that arrived as negative flags (`-name`) are stored without the `-` and remembered,
/// so a later positive occurrence of the same key cannot undo the negation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pairs {
    entries: Vec<(String, String)>,
    negated: BTreeSet<String>,
}

impl Pairs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Whether `key` was given as a negative flag.
    pub fn is_negated(&self, key: &str) -> bool {
        self.negated.contains(key)
    }

    /// Insert a pair as-is. The key is not inspected for a negative flag.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Insert a pair as it appeared in a URL or caller supplied values.
    ///
    /// A key beginning with `-` is a negative flag: the `-` is stripped and the value is
    /// forced to `"false"`.
    pub fn insert_raw(&mut self, key: &str, value: impl Into<String>) {
        match key.strip_prefix(NEGATIVE_FLAG_PREFIX) {
            Some(stripped) if !stripped.is_empty() => {
                self.negated.insert(stripped.to_string());
                self.insert(stripped, "false");
            }
            _ => self.insert(key, value),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.negated.remove(key);
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Shallow-merge `other` into `self`. Values from `other` win on key collision and
    /// negations from both sides are kept.
    pub fn merge(&mut self, other: &Pairs) {
        for (k, v) in other.iter() {
            self.insert(k, v);
        }
        self.negated.extend(other.negated.iter().cloned());
    }

    /// Split into (matching, rest) by key, keeping order and negations on both sides.
    pub fn partition<F>(&self, mut owned: F) -> (Pairs, Pairs)
    where
        F: FnMut(&str) -> bool,
    {
        let mut yes = Pairs::new();
        let mut no = Pairs::new();
        for (k, v) in &self.entries {
            let side = if owned(k.as_str()) { &mut yes } else { &mut no };
            side.entries.push((k.clone(), v.clone()));
            if self.negated.contains(k) {
                side.negated.insert(k.clone());
            }
        }
        (yes, no)
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Pairs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut pairs = Pairs::new();
        for (k, v) in iter {
            pairs.insert_raw(k.as_ref(), v);
        }
        pairs
    }
}

impl Serialize for Pairs {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// One parameter of a generated URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParam {
    /// `key=value`
    Value { key: String, value: String },
    /// Bare `key`, present but unset.
    Flag(String),
    /// Bare `-key`.
    NegativeFlag(String),
}

impl QueryParam {
    /// A `key=value` parameter, or a bare flag when `value` is empty.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        if value.is_empty() {
            QueryParam::Flag(key)
        } else {
            QueryParam::Value { key, value }
        }
    }

    pub fn key(&self) -> &str {
        match self {
            QueryParam::Value { key, .. } | QueryParam::Flag(key) | QueryParam::NegativeFlag(key) => key,
        }
    }

    /// Percent-encoded form of the parameter.
    pub fn encode(&self) -> String {
        match self {
            QueryParam::Value { key, value } => {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            }
            QueryParam::Flag(key) => urlencoding::encode(key).into_owned(),
            QueryParam::NegativeFlag(key) => {
                format!("{}{}", NEGATIVE_FLAG_PREFIX, urlencoding::encode(key))
            }
        }
    }
}

/// Join parameters into `a=1&b&-c`. Parameters with empty keys are skipped.
pub fn build_pair_string(params: &[QueryParam]) -> String {
    params
        .iter()
        .filter(|p| !p.key().is_empty())
        .map(QueryParam::encode)
        .collect::<Vec<_>>()
        .join("&")
}

/// Percent-decode one URL component.
///
/// A `%` that is not followed by two hex digits is an error, as is a decoded byte sequence
/// that is not UTF-8. `+` is left alone.
pub fn decode_component(s: &str) -> Result<String> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(Error::MalformedEscape { input: s.to_string() });
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    urlencoding::decode(s)
        .map(|d| d.into_owned())
        .map_err(|source| Error::InvalidUtf8 {
            input: s.to_string(),
            source,
        })
}

/// Parse a raw `key=value&key=value` string into ordered pairs.
///
/// - Empty input gives empty pairs.
/// - Each segment splits on its first `=`. A segment without `=` has the value `""`.
/// - Segments with an empty key are skipped (leading, trailing or doubled `&`).
/// - A key beginning with `-` is a negative flag, see [`Pairs::insert_raw`].
/// - Keys and values are percent-decoded; malformed escapes are returned as errors.
///
/// # Examples
/// ```
/// let pairs = urlform::url_params::parse_pairs("first_name=Bob&subscribe&-news").unwrap();
/// assert_eq!(pairs.get("first_name"), Some("Bob"));
/// assert_eq!(pairs.get("subscribe"), Some(""));
/// assert_eq!(pairs.get("news"), Some("false"));
/// ```
pub fn parse_pairs(s: &str) -> Result<Pairs> {
    let mut pairs = Pairs::new();
    if s.is_empty() {
        return Ok(pairs);
    }

    for segment in s.split('&') {
        let (raw_key, raw_value) = match segment.split_once('=') {
            Some((k, v)) => (k, v),
            None => (segment, ""),
        };
        if raw_key.is_empty() {
            continue;
        }
        let key = decode_component(raw_key)?;
        let value = decode_component(raw_value)?;
        pairs.insert_raw(&key, value);
    }

    Ok(pairs)
}

/// The query string of `href`, without the leading `?` and without any fragment.
pub fn raw_query(href: &str) -> &str {
    let before_hash = href.split_once('#').map_or(href, |(b, _)| b);
    before_hash.split_once('?').map_or("", |(_, q)| q)
}

/// The fragment of `href`, without the leading `#`.
///
/// Only the text up to a second `#`, if any, is returned.
pub fn raw_fragment(href: &str) -> &str {
    match href.split_once('#') {
        Some((_, frag)) => frag.split_once('#').map_or(frag, |(f, _)| f),
        None => "",
    }
}
