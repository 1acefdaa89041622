//! "Quag": the query string and the fragment query read as one namespace.

use serde::Serialize;

use crate::error::Result;
use crate::fragment::{decompose_fragment, FragmentParts};
use crate::url_params::{decode_component, parse_pairs, Pairs, NEGATIVE_FLAG_PREFIX};

/// Parameters from the URL query string.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryPart {
    /// Raw query string without `?`.
    pub string: String,
    /// Pairs whose key is a form field.
    pub pairs: Pairs,
    /// Pairs whose key is not a form field.
    pub extras: Pairs,
    /// The undecoded `&` segments of `extras`, in URL order with repeats kept.
    pub raw_extras: Vec<String>,
}

/// Parameters from the URL fragment.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FragmentPart {
    /// Raw fragment string without `#`.
    pub string: String,
    #[serde(flatten)]
    pub parts: FragmentParts,
    pub pairs: Pairs,
    pub extras: Pairs,
    pub raw_extras: Vec<String>,
}

/// The parsed query and fragment of one URL. Derived fresh for every operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuagParts {
    pub query: QueryPart,
    pub fragment: FragmentPart,
    /// Owned query pairs overridden by owned fragment pairs.
    pub pairs: Pairs,
}

/// Resolve a raw query string (with or without its leading `?`) and a raw fragment (without
/// `#`) against the names of the form fields.
///
/// Negative flags are stripped before the ownership test, so `-subscribe` belongs to the
/// `subscribe` field. Fragment query parameters override query parameters of the same name.
pub fn resolve<'a, I>(raw_query: &str, raw_fragment: &str, field_names: I) -> Result<QuagParts>
where
    I: IntoIterator<Item = &'a str>,
{
    let names: Vec<&str> = field_names.into_iter().collect();
    let is_field = |key: &str| names.iter().any(|n| *n == key);

    let query_string = raw_query.strip_prefix('?').unwrap_or(raw_query);
    let (query_pairs, query_extras) = parse_pairs(query_string)?.partition(is_field);
    let query_raw_extras = raw_extra_segments(query_string, is_field)?;

    let parts = decompose_fragment(raw_fragment);
    let (fragment_pairs, fragment_extras) = parse_pairs(&parts.query)?.partition(is_field);
    let fragment_raw_extras = raw_extra_segments(&parts.query, is_field)?;

    let mut pairs = query_pairs.clone();
    pairs.merge(&fragment_pairs);

    Ok(QuagParts {
        query: QueryPart {
            string: query_string.to_string(),
            pairs: query_pairs,
            extras: query_extras,
            raw_extras: query_raw_extras,
        },
        fragment: FragmentPart {
            string: raw_fragment.to_string(),
            parts,
            pairs: fragment_pairs,
            extras: fragment_extras,
            raw_extras: fragment_raw_extras,
        },
        pairs,
    })
}

/// Segments of a raw pair string whose key is not a form field, exactly as written.
///
/// Segments with an empty key are dropped, as [`parse_pairs`] drops them.
fn raw_extra_segments<F>(s: &str, is_field: F) -> Result<Vec<String>>
where
    F: Fn(&str) -> bool,
{
    let mut extras = Vec::new();
    for segment in s.split('&') {
        let raw_key = segment.split_once('=').map_or(segment, |(k, _)| k);
        if raw_key.is_empty() {
            continue;
        }
        let key = decode_component(raw_key)?;
        let key = match key.strip_prefix(NEGATIVE_FLAG_PREFIX) {
            Some(stripped) if !stripped.is_empty() => stripped,
            _ => key.as_str(),
        };
        if !is_field(key) {
            extras.push(segment.to_string());
        }
    }
    Ok(extras)
}

impl QuagParts {
    /// Every pair in the URL, fields and extras, query first and fragment overriding.
    pub fn all_pairs(&self) -> Pairs {
        let mut all = Pairs::new();
        all.merge(&self.query.pairs);
        all.merge(&self.query.extras);
        all.merge(&self.fragment.pairs);
        all.merge(&self.fragment.extras);
        all
    }

    pub fn has_extras(&self) -> bool {
        !self.query.extras.is_empty() || !self.fragment.extras.is_empty()
    }
}
