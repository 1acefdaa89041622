//! The validated, frozen list of form fields.

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::types::{FormParameter, QueryLocation};
use crate::url_params::NEGATIVE_FLAG_PREFIX;

/// Form fields after validation. Built once by [`UrlForm::init`](crate::UrlForm::init).
#[derive(Debug, Clone, Default)]
pub struct FormRegistry {
    fields: Vec<FormParameter>,
    prefix: String,
    default_location: QueryLocation,
}

impl FormRegistry {
    /// Validate and normalize field descriptors.
    ///
    /// - Names must be non-empty and unique, and must not start with `-`, which marks a
    ///   negative flag in URLs.
    /// - An empty `id` counts as unset.
    /// - Defaults are coerced to the field kind; an uncoercible default is an error.
    pub fn new(
        params: Vec<FormParameter>,
        prefix: &str,
        default_location: QueryLocation,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(params.len());

        for mut p in params {
            if p.name.is_empty() {
                return Err(Error::EmptyFieldName);
            }
            if p.name.starts_with(NEGATIVE_FLAG_PREFIX) {
                return Err(Error::InvalidFieldName(p.name));
            }
            if !seen.insert(p.name.clone()) {
                return Err(Error::DuplicateField(p.name));
            }
            if p.id.as_deref() == Some("") {
                p.id = None;
            }
            if let Some(default) = p.default_value.take() {
                let coerced = default.coerce(p.kind).ok_or_else(|| Error::InvalidDefault {
                    field: p.name.clone(),
                    reason: format!("{:?} is not a {}", default, p.kind),
                })?;
                p.default_value = Some(coerced);
            }
            fields.push(p);
        }

        Ok(Self {
            fields,
            prefix: prefix.to_string(),
            default_location,
        })
    }

    pub fn fields(&self) -> &[FormParameter] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&FormParameter> {
        self.fields.iter().find(|p| p.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|p| p.name.as_str())
    }

    /// Element id of a field: its explicit `id`, otherwise `prefix + name`.
    pub fn element_id(&self, field: &FormParameter) -> String {
        match &field.id {
            Some(id) => id.clone(),
            None => format!("{}{}", self.prefix, field.name),
        }
    }

    /// Where a field goes in generated URLs.
    pub fn location(&self, field: &FormParameter) -> QueryLocation {
        field.query_location.unwrap_or(self.default_location)
    }
}
