//! Merging defaults, saved settings and URL pairs into one value per field, and applying
//! the result to the page.

use serde::Serialize;

use crate::environment::{Document, SettingsStore};
use crate::error::{Error, Result};
use crate::registry::FormRegistry;
use crate::types::{FieldKind, FieldValue, FormCallback, FormOptions, FormParameter};
use crate::url_params::Pairs;

/// Which input decided a field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueSource {
    /// Nothing was given; the value is the zero value of the kind.
    Unset,
    Default,
    Saved,
    Url,
    NegativeFlag,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedField {
    pub name: String,
    pub value: FieldValue,
    pub source: ValueSource,
}

/// Resolve the effective value of one field. Later steps override earlier ones:
///
/// 1. the configured default,
/// 2. the saved setting, when the field saves settings and one is stored,
/// 3. the URL value, including the empty "flag present" value,
/// 4. for bool fields, a negative flag forces `false`.
///
/// A number that does not parse does not override an earlier step.
pub fn resolve_field(field: &FormParameter, url_pairs: &Pairs, saved: Option<&str>) -> ResolvedField {
    let mut value = FieldValue::zero(field.kind);
    let mut source = ValueSource::Unset;

    if let Some(default) = &field.default_value {
        value = default.clone();
        source = ValueSource::Default;
    }

    if field.save_setting {
        if let Some(v) = saved.and_then(|s| FieldValue::from_text(field.kind, s)) {
            value = v;
            source = ValueSource::Saved;
        }
    }

    if let Some(v) = url_pairs
        .get(&field.name)
        .and_then(|s| FieldValue::from_text(field.kind, s))
    {
        value = v;
        source = ValueSource::Url;
    }

    if field.kind == FieldKind::Bool && url_pairs.is_negated(&field.name) {
        value = FieldValue::Bool(false);
        source = ValueSource::NegativeFlag;
    }

    ResolvedField {
        name: field.name.clone(),
        value,
        source,
    }
}

/// Resolve every field and apply it to the page.
///
/// Per field, in order: resolve the value, update the bound element (skipped when the
/// element is missing or nothing was resolved), bind the persistence listener for fields
/// that save settings, call `func`, then call `func_true` when the value is true.
///
/// A failing field stops the remaining fields. The form-wide callback runs regardless.
pub fn reconcile<D, S>(
    registry: &FormRegistry,
    options: &FormOptions,
    url_pairs: &Pairs,
    document: &mut D,
    storage: &S,
) -> Result<Vec<ResolvedField>>
where
    D: Document,
    S: SettingsStore,
{
    let outcome = apply_fields(registry, options, url_pairs, document, storage);
    let finished = run_form_callback(options.callback.as_ref());

    match (outcome, finished) {
        (Ok(resolved), Ok(())) => Ok(resolved),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(callback_err)) => {
            log::warn!("form callback failed after an earlier error: {}", callback_err);
            Err(e)
        }
    }
}

fn apply_fields<D, S>(
    registry: &FormRegistry,
    options: &FormOptions,
    url_pairs: &Pairs,
    document: &mut D,
    storage: &S,
) -> Result<Vec<ResolvedField>>
where
    D: Document,
    S: SettingsStore,
{
    let mut resolved = Vec::with_capacity(registry.len());

    for field in registry.fields() {
        let saved = if field.save_setting {
            storage.get_item(&options.setting_key(&field.name))?
        } else {
            None
        };
        let r = resolve_field(field, url_pairs, saved.as_deref());
        log::debug!("{}: {:?} from {:?}", r.name, r.value, r.source);

        let id = registry.element_id(field);
        if r.source != ValueSource::Unset {
            let found = match &r.value {
                FieldValue::Bool(b) => document.set_checked(&id, *b),
                other => document.set_value(&id, &other.to_text()),
            };
            if !found {
                log::trace!("{}: no element \"{}\"", r.name, id);
            }
        }

        if field.save_setting {
            document.bind_input(&id);
        }

        if let Some(func) = &field.func {
            func.call(&r.value).map_err(|source| Error::Callback {
                field: field.name.clone(),
                source,
            })?;
        }
        if let Some(func_true) = &field.func_true {
            if r.value.as_bool() {
                func_true.call(&r.value).map_err(|source| Error::Callback {
                    field: field.name.clone(),
                    source,
                })?;
            }
        }

        resolved.push(r);
    }

    Ok(resolved)
}

fn run_form_callback(callback: Option<&FormCallback>) -> Result<()> {
    match callback {
        Some(cb) => cb.call().map_err(Error::FormCallback),
        None => Ok(()),
    }
}
