//! Building share URLs from the current form values.

use url::Url;

use crate::quag::QuagParts;
use crate::registry::FormRegistry;
use crate::types::{FieldKind, FieldValue, FormOptions, FormParameter, FormValues, QueryLocation};
use crate::url_params::{build_pair_string, QueryParam};

/// Query and fragment of a generated URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShareLink {
    /// `?a=1&b`, or empty.
    pub query: String,
    /// `#anchor?c=2:~:text=x`, or empty.
    pub fragment: String,
}

impl ShareLink {
    /// Replace the query and fragment of `base`.
    pub fn apply(&self, base: &Url) -> Url {
        let mut url = base.clone();
        match self.query.strip_prefix('?') {
            Some(q) if !q.is_empty() => url.set_query(Some(q)),
            _ => url.set_query(None),
        }
        match self.fragment.strip_prefix('#') {
            Some(f) => url.set_fragment(Some(f)),
            None => url.set_fragment(None),
        }
        url
    }
}

/// `href` without query and fragment.
pub fn base_url(href: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(href)?;
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// The URL parameter a field contributes, if any.
///
/// - Bools are flags: `true` is `name`, `false` is `-name` when the default is `true`,
///   otherwise nothing.
/// - Other kinds are `name=value`; empty text is left out.
/// - A non-form field already present in the URL is kept even when its value is empty.
fn field_param(field: &FormParameter, value: Option<&FieldValue>, quag: &QuagParts) -> Option<QueryParam> {
    let name = &field.name;
    let param = match (field.kind, value) {
        (FieldKind::Bool, Some(v)) if v.as_bool() => Some(QueryParam::Flag(name.clone())),
        (FieldKind::Bool, Some(_)) if field.has_true_default() => {
            Some(QueryParam::NegativeFlag(name.clone()))
        }
        (FieldKind::Bool, _) => None,
        (_, Some(FieldValue::Text(s))) if s.is_empty() => None,
        (_, Some(v)) => Some(QueryParam::new(name.clone(), v.to_text())),
        (_, None) => None,
    };
    if param.is_some() || !field.non_form_value {
        return param;
    }

    let raw = quag.pairs.get(name)?;
    if quag.pairs.is_negated(name) {
        Some(QueryParam::NegativeFlag(name.clone()))
    } else {
        Some(QueryParam::new(name.clone(), raw))
    }
}

/// Append raw extra segments, unchanged, after the encoded field parameters.
fn join_segments(fields: String, raw_extras: &[String]) -> String {
    std::iter::once(fields)
        .chain(raw_extras.iter().cloned())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("&")
}

/// Serialize field values into a query string and a fragment.
///
/// Fields go to their own query location or the form default. Parameters of the source URL
/// that are not form fields are appended back, as written, to the section they came from
/// unless `clean_url` is set. The fragment anchor and any fragment directive are kept.
pub fn serialize(
    registry: &FormRegistry,
    values: &FormValues,
    quag: &QuagParts,
    options: &FormOptions,
) -> ShareLink {
    let mut query_params = Vec::new();
    let mut fragment_params = Vec::new();

    for field in registry.fields() {
        let Some(param) = field_param(field, values.get(&field.name), quag) else {
            continue;
        };
        match registry.location(field) {
            QueryLocation::Query => query_params.push(param),
            QueryLocation::Fragment => fragment_params.push(param),
        }
    }

    let no_extras = Vec::new();
    let (query_extras, fragment_extras) = if options.clean_url {
        (&no_extras, &no_extras)
    } else {
        (&quag.query.raw_extras, &quag.fragment.raw_extras)
    };

    let query = join_segments(build_pair_string(&query_params), query_extras);
    let query = if query.is_empty() {
        query
    } else {
        format!("?{}", query)
    };
    let fragment = quag
        .fragment
        .parts
        .rebuild(&join_segments(build_pair_string(&fragment_params), fragment_extras));

    ShareLink { query, fragment }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quag::resolve;
    use crate::url_params::parse_pairs;

    fn registry(params: Vec<FormParameter>, location: QueryLocation) -> FormRegistry {
        FormRegistry::new(params, "", location).unwrap()
    }

    fn values(pairs: &[(&str, FieldValue)]) -> FormValues {
        let mut v = FormValues::new();
        for (k, val) in pairs {
            v.insert(*k, val.clone());
        }
        v
    }

    // ============ serialize tests ============

    #[test]
    fn test_empty_form_gives_empty_link() {
        let reg = registry(vec![FormParameter::new("a")], QueryLocation::Fragment);
        let link = serialize(&reg, &FormValues::new(), &QuagParts::default(), &FormOptions::default());
        assert_eq!(link, ShareLink::default());
    }

    #[test]
    fn test_fields_follow_query_location() {
        let reg = registry(
            vec![
                FormParameter::new("a"),
                FormParameter::new("b").query_location(QueryLocation::Query),
            ],
            QueryLocation::Fragment,
        );
        let v = values(&[("a", "x y".into()), ("b", "2".into())]);
        let link = serialize(&reg, &v, &QuagParts::default(), &FormOptions::default());
        assert_eq!(link.query, "?b=2");
        assert_eq!(link.fragment, "#?a=x%20y");
    }

    #[test]
    fn test_empty_text_is_omitted() {
        let reg = registry(vec![FormParameter::new("a"), FormParameter::new("b")], QueryLocation::Query);
        let v = values(&[("a", "".into()), ("b", "1".into())]);
        let link = serialize(&reg, &v, &QuagParts::default(), &FormOptions::default());
        assert_eq!(link.query, "?b=1");
    }

    #[test]
    fn test_bool_flags() {
        let reg = registry(
            vec![
                FormParameter::new("on").kind(FieldKind::Bool),
                FormParameter::new("off").kind(FieldKind::Bool),
                FormParameter::new("negative_flag").kind(FieldKind::Bool).default_value(true),
                FormParameter::new("default_value").kind(FieldKind::Bool).default_value(true),
            ],
            QueryLocation::Query,
        );
        let v = values(&[
            ("on", true.into()),
            ("off", false.into()),
            ("negative_flag", false.into()),
            ("default_value", true.into()),
        ]);
        let link = serialize(&reg, &v, &QuagParts::default(), &FormOptions::default());
        assert_eq!(link.query, "?on&-negative_flag&default_value");
    }

    #[test]
    fn test_numbers_are_written_plainly() {
        let reg = registry(
            vec![FormParameter::new("phone_number").kind(FieldKind::Number)],
            QueryLocation::Query,
        );
        let v = values(&[("phone_number", 1234567890.0.into())]);
        let link = serialize(&reg, &v, &QuagParts::default(), &FormOptions::default());
        assert_eq!(link.query, "?phone_number=1234567890");
    }

    #[test]
    fn test_extras_preserved_in_their_section() {
        let reg = registry(vec![FormParameter::new("a")], QueryLocation::Fragment);
        let quag = resolve("utm=mail&-old", "top?ref=x%26y:~:text=hi", ["a"]).unwrap();
        let v = values(&[("a", "1".into())]);

        let link = serialize(&reg, &v, &quag, &FormOptions::default());
        assert_eq!(link.query, "?utm=mail&-old");
        assert_eq!(link.fragment, "#top?a=1&ref=x%26y:~:text=hi");

        let clean = serialize(&reg, &v, &quag, &FormOptions::default().clean_url(true));
        assert_eq!(clean.query, "");
        assert_eq!(clean.fragment, "#top?a=1:~:text=hi");
    }

    #[test]
    fn test_extras_are_re_emitted_as_written() {
        let reg = registry(vec![FormParameter::new("first_name")], QueryLocation::Fragment);
        let quag = resolve("q=a+b&tag=x&tag=y&empty=&-v=3&enc=%2B", "?first_name=Bob", ["first_name"])
            .unwrap();
        let v = values(&[("first_name", "Bob".into())]);

        let link = serialize(&reg, &v, &quag, &FormOptions::default());
        assert_eq!(link.query, "?q=a+b&tag=x&tag=y&empty=&-v=3&enc=%2B");
        assert_eq!(link.fragment, "#?first_name=Bob");
    }

    #[test]
    fn test_non_form_value_is_sticky() {
        let reg = registry(
            vec![FormParameter::new("token").non_form_value(true), FormParameter::new("other")],
            QueryLocation::Fragment,
        );
        let quag = resolve("", "?token&other=1", ["token", "other"]).unwrap();
        let link = serialize(&reg, &FormValues::new(), &quag, &FormOptions::default());
        assert_eq!(link.fragment, "#?token");

        let gone = serialize(&reg, &FormValues::new(), &QuagParts::default(), &FormOptions::default());
        assert_eq!(gone.fragment, "");
    }

    #[test]
    fn test_round_trip_through_parse() {
        let reg = registry(
            vec![
                FormParameter::new("s"),
                FormParameter::new("b").kind(FieldKind::Bool),
                FormParameter::new("n").kind(FieldKind::Number),
            ],
            QueryLocation::Fragment,
        );
        let v = values(&[
            ("s", "{\"e\":\"!#$%&()*+,./:<=>?@[]^_`{|}~\"}".into()),
            ("b", true.into()),
            ("n", 2.5.into()),
        ]);
        let link = serialize(&reg, &v, &QuagParts::default(), &FormOptions::default());
        let pairs = parse_pairs(link.fragment.strip_prefix("#?").unwrap()).unwrap();
        assert_eq!(pairs.get("s"), Some("{\"e\":\"!#$%&()*+,./:<=>?@[]^_`{|}~\"}"));
        assert_eq!(pairs.get("b"), Some(""));
        assert_eq!(pairs.get("n"), Some("2.5"));
    }

    // ============ ShareLink tests ============

    #[test]
    fn test_apply_to_base() {
        let base = base_url("https://example.com/form?old=1#old").unwrap();
        assert_eq!(base.as_str(), "https://example.com/form");

        let link = ShareLink {
            query: "?a=1".into(),
            fragment: "#?b".into(),
        };
        assert_eq!(link.apply(&base).as_str(), "https://example.com/form?a=1#?b");
        assert_eq!(ShareLink::default().apply(&base).as_str(), "https://example.com/form");
    }
}
