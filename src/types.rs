use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::rc::Rc;

use crate::error::Result;

/// Kind of a form field. Decides coercion of URL text and how the element is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    String,
    /// Checkbox. Present-but-unset flags (`?name`) are true.
    Bool,
    Number,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Bool => "bool",
            FieldKind::Number => "number",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a field is written in generated URLs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryLocation {
    /// `?name=value`
    Query,
    /// `#?name=value`
    #[default]
    Fragment,
}

/// A typed field value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// The zero value of a kind: `""`, `false` or `0`.
    pub fn zero(kind: FieldKind) -> Self {
        match kind {
            FieldKind::String => FieldValue::Text(String::new()),
            FieldKind::Bool => FieldValue::Bool(false),
            FieldKind::Number => FieldValue::Number(0.0),
        }
    }

    /// Coerce raw URL or storage text to `kind`.
    ///
    /// Returns `None` only for a number that does not parse.
    pub fn from_text(kind: FieldKind, text: &str) -> Option<Self> {
        match kind {
            FieldKind::String => Some(FieldValue::Text(text.to_string())),
            FieldKind::Bool => Some(FieldValue::Bool(text_is_true(text))),
            FieldKind::Number => parse_number(text).map(FieldValue::Number),
        }
    }

    /// Convert an already typed value to `kind`. Used on configured defaults.
    pub fn coerce(&self, kind: FieldKind) -> Option<Self> {
        match (kind, self) {
            (FieldKind::Bool, FieldValue::Bool(b)) => Some(FieldValue::Bool(*b)),
            (FieldKind::Number, FieldValue::Number(n)) if n.is_finite() => {
                Some(FieldValue::Number(*n))
            }
            (FieldKind::Number, FieldValue::Number(_)) => None,
            (_, other) => FieldValue::from_text(kind, &other.to_text()),
        }
    }

    /// Text form, as written into an element value, the URL or a settings store.
    pub fn to_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Number(n) => n.to_string(),
        }
    }

    /// Empty text and `false` are empty. A number is never empty.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::Bool(b) => !b,
            FieldValue::Number(_) => false,
        }
    }

    /// `true`, or the text `"true"`.
    pub fn as_bool(&self) -> bool {
        match self {
            FieldValue::Bool(b) => *b,
            FieldValue::Text(s) => s == "true",
            FieldValue::Number(_) => false,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            // Integral numbers serialize without a fractional part, as in JSON.stringify.
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 => {
                serializer.serialize_i64(*n as i64)
            }
            FieldValue::Number(n) => serializer.serialize_f64(*n),
            FieldValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

/// Typed values read from a form, in field order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormValues {
    entries: Vec<(String, FieldValue)>,
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Insert or replace, keeping the first position of `name`.
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Serialize for FormValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// `"true"` and the present-but-unset flag `""` are true; everything else is false.
pub fn text_is_true(text: &str) -> bool {
    text.is_empty() || text == "true"
}

/// Parse an element or URL number. Empty, non-numeric and non-finite text is `None`.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Per-field hook, called with the resolved value on every reconciliation.
#[derive(Clone)]
pub struct FieldCallback(Rc<dyn Fn(&FieldValue) -> anyhow::Result<()>>);

impl FieldCallback {
    pub fn new(f: impl Fn(&FieldValue) -> anyhow::Result<()> + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, value: &FieldValue) -> anyhow::Result<()> {
        (self.0)(value)
    }
}

impl fmt::Debug for FieldCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FieldCallback")
    }
}

/// Form-wide hook, called once at the end of every reconciliation.
#[derive(Clone)]
pub struct FormCallback(Rc<dyn Fn() -> anyhow::Result<()>>);

impl FormCallback {
    pub fn new(f: impl Fn() -> anyhow::Result<()> + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self) -> anyhow::Result<()> {
        (self.0)()
    }
}

impl fmt::Debug for FormCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FormCallback")
    }
}

/// Descriptor for one form field.
///
/// ```
/// use urlform::{FieldKind, FormParameter};
/// let p = FormParameter::new("send_news")
///     .kind(FieldKind::Bool)
///     .default_value(true)
///     .on_true(|_| Ok(()));
/// assert_eq!(p.name, "send_news");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormParameter {
    /// Key in the URL, and the element id after `prefix` unless `id` is set.
    pub name: String,
    /// Element id, overriding `prefix + name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: FieldKind,
    /// `None` inherits `FormOptions::default_query_location`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_location: Option<QueryLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<FieldValue>,
    #[serde(default)]
    pub save_setting: bool,
    /// Value lives only in the URL. Once present it is re-emitted until removed from the URL.
    #[serde(default)]
    pub non_form_value: bool,
    #[serde(skip)]
    pub func: Option<FieldCallback>,
    #[serde(skip)]
    pub func_true: Option<FieldCallback>,
}

impl FormParameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn query_location(mut self, location: QueryLocation) -> Self {
        self.query_location = Some(location);
        self
    }

    pub fn default_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn save_setting(mut self, save: bool) -> Self {
        self.save_setting = save;
        self
    }

    pub fn non_form_value(mut self, non_form: bool) -> Self {
        self.non_form_value = non_form;
        self
    }

    pub fn on_value(mut self, f: impl Fn(&FieldValue) -> anyhow::Result<()> + 'static) -> Self {
        self.func = Some(FieldCallback::new(f));
        self
    }

    pub fn on_true(mut self, f: impl Fn(&FieldValue) -> anyhow::Result<()> + 'static) -> Self {
        self.func_true = Some(FieldCallback::new(f));
        self
    }

    /// Whether a `false` value of this field is written as `-name`.
    pub fn has_true_default(&self) -> bool {
        self.kind == FieldKind::Bool && matches!(self.default_value, Some(FieldValue::Bool(true)))
    }
}

/// Form-wide options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormOptions {
    /// Prepended to `name` to form the default element id.
    pub prefix: String,
    pub default_query_location: QueryLocation,
    /// Drop URL parameters that are not form fields from generated URLs.
    #[serde(rename = "cleanURL")]
    pub clean_url: bool,
    /// Prepended to persisted setting keys.
    pub local_storage_namespace: String,
    /// Id of a `<form>` element. When set, values are read from the whole form at once.
    #[serde(rename = "formID", skip_serializing_if = "Option::is_none")]
    pub form_id: Option<String>,
    /// Id of the share link element.
    #[serde(rename = "shareURL", skip_serializing_if = "Option::is_none")]
    pub share_url: Option<String>,
    /// Id of the element showing the share URL as text.
    #[serde(rename = "shareURLArea", skip_serializing_if = "Option::is_none")]
    pub share_url_area: Option<String>,
    /// Id of the button that regenerates the share URL.
    #[serde(rename = "shareURLBtn", skip_serializing_if = "Option::is_none")]
    pub share_url_btn: Option<String>,
    /// Id of the button that clears the form.
    #[serde(rename = "clearBtn", skip_serializing_if = "Option::is_none")]
    pub clear_btn: Option<String>,
    #[serde(skip)]
    pub callback: Option<FormCallback>,
    pub form_parameters: Vec<FormParameter>,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            default_query_location: QueryLocation::Fragment,
            clean_url: false,
            local_storage_namespace: "URLFormJS_".to_string(),
            form_id: None,
            share_url: Some("shareURL".to_string()),
            share_url_area: Some("shareURLArea".to_string()),
            share_url_btn: Some("shareURLBtn".to_string()),
            clear_btn: Some("clearBtn".to_string()),
            callback: None,
            form_parameters: Vec::new(),
        }
    }
}

impl FormOptions {
    pub fn new(form_parameters: Vec<FormParameter>) -> Self {
        Self {
            form_parameters,
            ..Self::default()
        }
    }

    /// Load options from a JSON document using the camelCase keys of the option literals.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn default_query_location(mut self, location: QueryLocation) -> Self {
        self.default_query_location = location;
        self
    }

    pub fn clean_url(mut self, clean: bool) -> Self {
        self.clean_url = clean;
        self
    }

    pub fn form_id(mut self, form_id: impl Into<String>) -> Self {
        self.form_id = Some(form_id.into());
        self
    }

    pub fn on_populated(mut self, f: impl Fn() -> anyhow::Result<()> + 'static) -> Self {
        self.callback = Some(FormCallback::new(f));
        self
    }

    /// Key under which a field's setting is persisted.
    pub fn setting_key(&self, name: &str) -> String {
        format!("{}{}{}", self.local_storage_namespace, self.prefix, name)
    }
}

/// Read-only template of the default options.
pub fn default_form_options() -> FormOptions {
    FormOptions::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============ FieldValue tests ============

    #[test]
    fn test_bool_coercion() {
        assert_eq!(FieldValue::from_text(FieldKind::Bool, ""), Some(FieldValue::Bool(true)));
        assert_eq!(FieldValue::from_text(FieldKind::Bool, "true"), Some(FieldValue::Bool(true)));
        assert_eq!(FieldValue::from_text(FieldKind::Bool, "false"), Some(FieldValue::Bool(false)));
        assert_eq!(FieldValue::from_text(FieldKind::Bool, "on"), Some(FieldValue::Bool(false)));
    }

    #[test]
    fn test_number_coercion() {
        assert_eq!(
            FieldValue::from_text(FieldKind::Number, "1234567890"),
            Some(FieldValue::Number(1234567890.0))
        );
        assert_eq!(FieldValue::from_text(FieldKind::Number, " 2.5 "), Some(FieldValue::Number(2.5)));
        assert_eq!(FieldValue::from_text(FieldKind::Number, ""), None);
        assert_eq!(FieldValue::from_text(FieldKind::Number, "abc"), None);
        assert_eq!(FieldValue::from_text(FieldKind::Number, "NaN"), None);
    }

    #[test]
    fn test_coerce_default_to_kind() {
        assert_eq!(FieldValue::from("true").coerce(FieldKind::Bool), Some(FieldValue::Bool(true)));
        assert_eq!(FieldValue::from("7").coerce(FieldKind::Number), Some(FieldValue::Number(7.0)));
        assert_eq!(FieldValue::from(true).coerce(FieldKind::String), Some(FieldValue::from("true")));
        assert_eq!(FieldValue::from("x").coerce(FieldKind::Number), None);
    }

    #[test]
    fn test_is_empty_per_kind() {
        assert!(FieldValue::from("").is_empty());
        assert!(FieldValue::Bool(false).is_empty());
        assert!(!FieldValue::Number(0.0).is_empty());
        assert!(!FieldValue::from("0").is_empty());
    }

    #[test]
    fn test_to_text() {
        assert_eq!(FieldValue::Number(1234567890.0).to_text(), "1234567890");
        assert_eq!(FieldValue::Number(2.5).to_text(), "2.5");
        assert_eq!(FieldValue::Bool(false).to_text(), "false");
    }

    #[test]
    fn test_serialize_integral_number_without_fraction() {
        assert_eq!(serde_json::to_string(&FieldValue::Number(10.0)).unwrap(), "10");
        assert_eq!(serde_json::to_string(&FieldValue::Number(0.5)).unwrap(), "0.5");
    }

    #[test]
    fn test_deserialize_untagged() {
        let v: Vec<FieldValue> = serde_json::from_str(r#"[true, 3, "x"]"#).unwrap();
        assert_eq!(
            v,
            vec![FieldValue::Bool(true), FieldValue::Number(3.0), FieldValue::from("x")]
        );
    }

    // ============ FormOptions tests ============

    #[test]
    fn test_options_from_json() {
        let opts = FormOptions::from_json(
            r#"{
                "prefix": "input_",
                "defaultQueryLocation": "query",
                "cleanURL": true,
                "formParameters": [
                    {"name": "first_name"},
                    {"name": "subscribe", "type": "bool", "saveSetting": true},
                    {"name": "negative_flag", "type": "bool", "defaultValue": true, "queryLocation": "fragment"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(opts.prefix, "input_");
        assert_eq!(opts.default_query_location, QueryLocation::Query);
        assert!(opts.clean_url);
        assert_eq!(opts.local_storage_namespace, "URLFormJS_");
        assert_eq!(opts.form_parameters.len(), 3);
        assert_eq!(opts.form_parameters[1].kind, FieldKind::Bool);
        assert!(opts.form_parameters[1].save_setting);
        assert!(opts.form_parameters[2].has_true_default());
        assert_eq!(
            opts.form_parameters[2].query_location,
            Some(QueryLocation::Fragment)
        );
    }

    #[test]
    fn test_options_from_json_rejects_unknown_location() {
        assert!(FormOptions::from_json(r#"{"defaultQueryLocation": "path"}"#).is_err());
    }

    #[test]
    fn test_default_options_json() {
        assert_eq!(
            serde_json::to_string(&default_form_options()).unwrap(),
            r#"{"prefix":"","defaultQueryLocation":"fragment","cleanURL":false,"localStorageNamespace":"URLFormJS_","shareURL":"shareURL","shareURLArea":"shareURLArea","shareURLBtn":"shareURLBtn","clearBtn":"clearBtn","formParameters":[]}"#
        );
    }

    #[test]
    fn test_setting_key() {
        let opts = FormOptions::default().prefix("input_");
        assert_eq!(opts.setting_key("subscribe"), "URLFormJS_input_subscribe");
    }
}
