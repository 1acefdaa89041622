//! The initialized form and its public operations.

use url::Url;

use crate::environment::{Control, Document, Location, Page, SettingsStore};
use crate::error::{Error, Result};
use crate::quag::{self, QuagParts};
use crate::reconcile::{self, ResolvedField};
use crate::registry::FormRegistry;
use crate::share;
use crate::types::{parse_number, FieldKind, FieldValue, FormOptions, FormParameter, FormValues};
use crate::url_params::Pairs;

/// An initialized form: sanitized options plus the frozen field registry.
///
/// Only [`UrlForm::init`] builds one, so no operation can run before initialization. To
/// change options, call `init` again.
#[derive(Debug, Clone)]
pub struct UrlForm {
    options: FormOptions,
    registry: FormRegistry,
}

/// Element values as read, before emptiness filtering. `None` is a number that did not parse.
type RawValues = Vec<(String, Option<FieldValue>)>;

impl UrlForm {
    /// Validate `options`, freeze them for the session and bind the share and clear
    /// buttons when present.
    ///
    /// Fails on an empty, duplicated or `-` prefixed field name, a default that does not fit
    /// its field kind, or a `form_id` that names no `<form>` in `document`.
    pub fn init<D: Document>(mut options: FormOptions, document: &mut D) -> Result<Self> {
        if options.form_id.as_deref() == Some("") {
            options.form_id = None;
        }
        if let Some(form_id) = &options.form_id {
            if document.form_controls(form_id).is_none() {
                return Err(Error::FormNotFound(form_id.clone()));
            }
        }

        let params = std::mem::take(&mut options.form_parameters);
        let registry = FormRegistry::new(params, &options.prefix, options.default_query_location)?;

        for id in [&options.share_url_btn, &options.clear_btn].into_iter().flatten() {
            if !document.bind_click(id) {
                log::trace!("no button \"{}\"", id);
            }
        }
        log::debug!(
            "initialized form with {} fields, form mode {}",
            registry.len(),
            options.form_id.is_some()
        );

        Ok(Self { options, registry })
    }

    /// Sanitized options. `form_parameters` is empty here; fields live in the registry.
    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    pub fn registry(&self) -> &FormRegistry {
        &self.registry
    }

    pub fn fields(&self) -> &[FormParameter] {
        self.registry.fields()
    }

    fn form_mode(&self) -> Option<&str> {
        self.options.form_id.as_deref()
    }

    /// Parse the current URL against the form fields.
    pub fn quag_parts<L: Location>(&self, location: &L) -> Result<QuagParts> {
        quag::resolve(location.raw_query(), location.raw_fragment(), self.registry.names())
    }

    /// Every pair in the current URL, form fields and extras alike.
    pub fn url_key_values<L: Location>(&self, location: &L) -> Result<Pairs> {
        Ok(self.quag_parts(location)?.all_pairs())
    }

    /// `(name, element id)` of every field.
    pub fn element_ids(&self) -> Vec<(String, String)> {
        self.registry
            .fields()
            .iter()
            .map(|f| (f.name.clone(), self.registry.element_id(f)))
            .collect()
    }

    /// Restore the form from saved settings and the URL, then regenerate the share link.
    pub fn populate<D, S, L>(&self, page: &mut Page<D, S, L>) -> Result<Vec<ResolvedField>>
    where
        D: Document,
        S: SettingsStore,
        L: Location,
    {
        let quag = self.quag_parts(&page.location)?;
        log::debug!("populating from {} url pairs", quag.pairs.len());
        let resolved = reconcile::reconcile(
            &self.registry,
            &self.options,
            &quag.pairs,
            &mut page.document,
            &page.storage,
        )?;
        self.share_uri(page)?;
        Ok(resolved)
    }

    /// Like [`populate`](Self::populate), with caller supplied pairs instead of the URL.
    /// Keys starting with `-` are negative flags.
    pub fn populate_from_values<D, S, L>(
        &self,
        pairs: &Pairs,
        page: &mut Page<D, S, L>,
    ) -> Result<Vec<ResolvedField>>
    where
        D: Document,
        S: SettingsStore,
        L: Location,
    {
        let resolved = reconcile::reconcile(
            &self.registry,
            &self.options,
            pairs,
            &mut page.document,
            &page.storage,
        )?;
        self.share_uri(page)?;
        Ok(resolved)
    }

    fn read_control(field: &FormParameter, control: Control) -> Option<FieldValue> {
        match (field.kind, control) {
            (FieldKind::Bool, Control::Checkbox(checked)) => Some(FieldValue::Bool(checked)),
            (FieldKind::Bool, Control::Text(t)) => Some(FieldValue::Bool(t == "true" || t == "on")),
            (FieldKind::Number, Control::Text(t)) => parse_number(&t).map(FieldValue::Number),
            (FieldKind::Number, Control::Checkbox(_)) => None,
            (FieldKind::String, Control::Text(t)) => Some(FieldValue::Text(t)),
            (FieldKind::String, Control::Checkbox(checked)) => {
                Some(FieldValue::Text(checked.to_string()))
            }
        }
    }

    fn read_form_entry(field: Option<&FormParameter>, value: &str) -> Option<FieldValue> {
        match field.map(|f| f.kind) {
            Some(FieldKind::Bool) => Some(FieldValue::Bool(value == "true" || value == "on")),
            Some(FieldKind::Number) => parse_number(value).map(FieldValue::Number),
            Some(FieldKind::String) => Some(FieldValue::Text(value.to_string())),
            None => Some(match value {
                "true" | "on" => FieldValue::Bool(true),
                "false" | "unchecked" => FieldValue::Bool(false),
                other => FieldValue::Text(other.to_string()),
            }),
        }
    }

    fn read_values<D: Document>(&self, document: &D) -> Result<RawValues> {
        let Some(form_id) = self.form_mode() else {
            let mut raw = Vec::with_capacity(self.registry.len());
            for field in self.registry.fields() {
                let id = self.registry.element_id(field);
                match document.control(&id) {
                    Some(control) => raw.push((field.name.clone(), Self::read_control(field, control))),
                    None => log::trace!("{}: no element \"{}\"", field.name, id),
                }
            }
            return Ok(raw);
        };

        let entries = document
            .form_data(form_id)
            .ok_or_else(|| Error::FormNotFound(form_id.to_string()))?;
        let mut raw: RawValues = Vec::with_capacity(entries.len());
        for (entry_name, value) in entries {
            let name = entry_name
                .strip_prefix(self.options.prefix.as_str())
                .unwrap_or(&entry_name)
                .to_string();
            let v = Self::read_form_entry(self.registry.get(&name), &value);
            raw.push((name, v));
        }

        // Unchecked boxes are missing from form data.
        for field in self.registry.fields() {
            if field.kind != FieldKind::Bool || raw.iter().any(|(n, _)| *n == field.name) {
                continue;
            }
            if let Some(Control::Checkbox(checked)) = document.control(&self.registry.element_id(field)) {
                raw.push((field.name.clone(), Some(FieldValue::Bool(checked))));
            }
        }
        Ok(raw)
    }

    /// Read the form into typed values.
    ///
    /// Empty text, unchecked boxes and numbers that do not parse are left out, unless
    /// `return_zero_values` is set, in which case they are reported as `""`, `false` and `0`.
    pub fn get_form<D: Document>(&self, document: &D, return_zero_values: bool) -> Result<FormValues> {
        let mut values = FormValues::new();
        for (name, value) in self.read_values(document)? {
            match value {
                Some(v) if !v.is_empty() || return_zero_values => values.insert(name, v),
                Some(_) => {}
                None if return_zero_values => values.insert(name, FieldValue::Number(0.0)),
                None => {}
            }
        }
        Ok(values)
    }

    /// [`get_form`](Self::get_form) as a JSON object.
    pub fn serialize<D: Document>(&self, document: &D) -> Result<String> {
        Ok(serde_json::to_string(&self.get_form(document, false)?)?)
    }

    /// Whether no field holds a value.
    pub fn is_empty<D: Document>(&self, document: &D) -> Result<bool> {
        Ok(self.get_form(document, false)?.is_empty())
    }

    /// Empty every field and point the share link at the bare page URL.
    pub fn clear<D, S, L>(&self, page: &mut Page<D, S, L>) -> Result<()>
    where
        D: Document,
        L: Location,
    {
        let document = &mut page.document;
        match self.form_mode() {
            Some(form_id) => {
                let controls = document
                    .form_controls(form_id)
                    .ok_or_else(|| Error::FormNotFound(form_id.to_string()))?;
                for id in controls {
                    match document.control(&id) {
                        Some(Control::Checkbox(_)) => document.set_checked(&id, false),
                        Some(Control::Text(_)) => document.set_value(&id, ""),
                        None => false,
                    };
                }
            }
            None => {
                for field in self.registry.fields() {
                    let id = self.registry.element_id(field);
                    match field.kind {
                        FieldKind::Bool => document.set_checked(&id, false),
                        _ => document.set_value(&id, ""),
                    };
                }
            }
        }

        let base = share::base_url(page.location.href())?;
        self.write_share_link(&mut page.document, base.as_str());
        Ok(())
    }

    /// Current values for URL generation: element values plus non-form values from the URL.
    fn current_values<D: Document>(&self, document: &D, quag: &QuagParts) -> Result<FormValues> {
        let mut values = FormValues::new();
        for (name, value) in self.read_values(document)? {
            if let Some(v) = value {
                values.insert(name, v);
            }
        }

        for field in self.registry.fields() {
            if !field.non_form_value || values.get(&field.name).is_some() {
                continue;
            }
            if quag.pairs.is_negated(&field.name) && field.kind == FieldKind::Bool {
                values.insert(field.name.clone(), FieldValue::Bool(false));
            } else if let Some(v) = quag
                .pairs
                .get(&field.name)
                .and_then(|raw| FieldValue::from_text(field.kind, raw))
            {
                values.insert(field.name.clone(), v);
            }
        }
        Ok(values)
    }

    /// Build the share URL from the current form and write it to the share elements.
    pub fn share_uri<D, S, L>(&self, page: &mut Page<D, S, L>) -> Result<Url>
    where
        D: Document,
        L: Location,
    {
        let quag = self.quag_parts(&page.location)?;
        let values = self.current_values(&page.document, &quag)?;
        let link = share::serialize(&self.registry, &values, &quag, &self.options);
        let url = link.apply(&share::base_url(page.location.href())?);
        log::debug!("share url {}", url);

        self.write_share_link(&mut page.document, url.as_str());
        Ok(url)
    }

    fn write_share_link<D: Document>(&self, document: &mut D, href: &str) {
        if let Some(id) = &self.options.share_url {
            document.set_link(id, href);
        }
        if let Some(id) = &self.options.share_url_area {
            document.set_text(id, href);
        }
    }

    /// Click handler of the clear button: clear the form, then regenerate the share link.
    pub fn on_clear<D, S, L>(&self, page: &mut Page<D, S, L>) -> Result<Url>
    where
        D: Document,
        L: Location,
    {
        self.clear(page)?;
        self.share_uri(page)
    }

    /// Route a click on a bound button. Returns the new share URL, or `None` when `id` is not
    /// the share or clear button.
    pub fn on_click<D, S, L>(&self, page: &mut Page<D, S, L>, id: &str) -> Result<Option<Url>>
    where
        D: Document,
        L: Location,
    {
        if self.options.clear_btn.as_deref() == Some(id) {
            return self.on_clear(page).map(Some);
        }
        if self.options.share_url_btn.as_deref() == Some(id) {
            return self.share_uri(page).map(Some);
        }
        Ok(None)
    }

    /// Persist one field's current element value. This is the body of the input/change
    /// listener bound during population. Returns whether anything was written.
    pub fn persist_field<D, S, L>(&self, page: &mut Page<D, S, L>, name: &str) -> Result<bool>
    where
        D: Document,
        S: SettingsStore,
    {
        let Some(field) = self.registry.get(name) else {
            return Ok(false);
        };
        if !field.save_setting {
            return Ok(false);
        }
        let Some(control) = page.document.control(&self.registry.element_id(field)) else {
            return Ok(false);
        };

        let value = match control {
            Control::Checkbox(checked) => checked.to_string(),
            Control::Text(t) => t,
        };
        page.storage.set_item(&self.options.setting_key(name), &value)?;
        Ok(true)
    }

    /// Persist every field that saves settings.
    pub fn save_settings<D, S, L>(&self, page: &mut Page<D, S, L>) -> Result<usize>
    where
        D: Document,
        S: SettingsStore,
    {
        let mut saved = 0;
        for field in self.registry.fields() {
            if self.persist_field(page, &field.name)? {
                saved += 1;
            }
        }
        Ok(saved)
    }
}
