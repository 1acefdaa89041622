//! In-memory collaborators, for hosts without a browser and for tests.

use std::collections::BTreeMap;

use crate::environment::{Control, Document, Location, SettingsStore};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    TextInput,
    Checkbox,
    Link,
    TextArea,
    Button,
    Form,
}

#[derive(Debug, Clone)]
pub struct Element {
    pub kind: ElementKind,
    /// `name` attribute, used for form data. Defaults to the id.
    pub name: String,
    pub value: String,
    pub checked: bool,
    pub href: String,
    /// Id of the owning `<form>`, if any.
    pub form: Option<String>,
    pub input_bound: bool,
    pub click_bound: bool,
}

impl Element {
    fn new(kind: ElementKind, id: &str) -> Self {
        Self {
            kind,
            name: id.to_string(),
            value: String::new(),
            checked: false,
            href: String::new(),
            form: None,
            input_bound: false,
            click_bound: false,
        }
    }
}

/// A flat element tree keyed by id, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    elements: Vec<(String, Element)>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text_input(mut self, id: &str) -> Self {
        self.add(id, Element::new(ElementKind::TextInput, id));
        self
    }

    pub fn with_checkbox(mut self, id: &str) -> Self {
        self.add(id, Element::new(ElementKind::Checkbox, id));
        self
    }

    pub fn with_link(mut self, id: &str) -> Self {
        self.add(id, Element::new(ElementKind::Link, id));
        self
    }

    pub fn with_text_area(mut self, id: &str) -> Self {
        self.add(id, Element::new(ElementKind::TextArea, id));
        self
    }

    pub fn with_button(mut self, id: &str) -> Self {
        self.add(id, Element::new(ElementKind::Button, id));
        self
    }

    /// Add a `<form>` and move the listed controls into it.
    pub fn with_form(mut self, form_id: &str, control_ids: &[&str]) -> Self {
        self.add(form_id, Element::new(ElementKind::Form, form_id));
        for id in control_ids {
            if let Some(e) = self.element_mut(id) {
                e.form = Some(form_id.to_string());
            }
        }
        self
    }

    fn add(&mut self, id: &str, element: Element) {
        match self.element_mut(id) {
            Some(existing) => *existing = element,
            None => self.elements.push((id.to_string(), element)),
        }
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|(k, _)| k == id).map(|(_, e)| e)
    }

    pub fn element_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements
            .iter_mut()
            .find(|(k, _)| k == id)
            .map(|(_, e)| e)
    }

    fn is_control(kind: ElementKind) -> bool {
        matches!(
            kind,
            ElementKind::TextInput | ElementKind::Checkbox | ElementKind::TextArea
        )
    }

    fn form_members(&self, form_id: &str) -> Option<impl Iterator<Item = (&String, &Element)>> {
        let form = self.element(form_id)?;
        if form.kind != ElementKind::Form {
            return None;
        }
        let form_id = form_id.to_string();
        Some(
            self.elements
                .iter()
                .filter(move |(_, e)| {
                    Self::is_control(e.kind) && e.form.as_deref() == Some(form_id.as_str())
                })
                .map(|(id, e)| (id, e)),
        )
    }
}

impl Document for MemoryDocument {
    fn control(&self, id: &str) -> Option<Control> {
        let e = self.element(id)?;
        match e.kind {
            ElementKind::Checkbox => Some(Control::Checkbox(e.checked)),
            ElementKind::TextInput | ElementKind::TextArea => Some(Control::Text(e.value.clone())),
            ElementKind::Link | ElementKind::Button | ElementKind::Form => None,
        }
    }

    fn set_value(&mut self, id: &str, value: &str) -> bool {
        match self.element_mut(id) {
            Some(e) => {
                e.value = value.to_string();
                true
            }
            None => false,
        }
    }

    fn set_checked(&mut self, id: &str, checked: bool) -> bool {
        match self.element_mut(id) {
            Some(e) => {
                e.checked = checked;
                true
            }
            None => false,
        }
    }

    fn set_link(&mut self, id: &str, href: &str) -> bool {
        match self.element_mut(id) {
            Some(e) => {
                e.href = href.to_string();
                e.value = href.to_string();
                true
            }
            None => false,
        }
    }

    fn set_text(&mut self, id: &str, text: &str) -> bool {
        self.set_value(id, text)
    }

    fn bind_input(&mut self, id: &str) -> bool {
        match self.element_mut(id) {
            Some(e) => {
                e.input_bound = true;
                true
            }
            None => false,
        }
    }

    fn bind_click(&mut self, id: &str) -> bool {
        match self.element_mut(id) {
            Some(e) => {
                e.click_bound = true;
                true
            }
            None => false,
        }
    }

    fn form_data(&self, form_id: &str) -> Option<Vec<(String, String)>> {
        let entries = self
            .form_members(form_id)?
            .filter_map(|(_, e)| match e.kind {
                ElementKind::Checkbox if e.checked => Some((e.name.clone(), "on".to_string())),
                ElementKind::Checkbox => None,
                _ => Some((e.name.clone(), e.value.clone())),
            })
            .collect();
        Some(entries)
    }

    fn form_controls(&self, form_id: &str) -> Option<Vec<String>> {
        Some(self.form_members(form_id)?.map(|(id, _)| id.clone()).collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl SettingsStore for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A fixed URL. `navigation` models the un-truncated navigation entry.
#[derive(Debug, Clone, Default)]
pub struct StaticLocation {
    pub href: String,
    pub navigation: Option<String>,
}

impl StaticLocation {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            navigation: None,
        }
    }

    pub fn with_navigation(mut self, navigation: impl Into<String>) -> Self {
        self.navigation = Some(navigation.into());
        self
    }

    /// Replace the URL, like `history.pushState`.
    pub fn push(&mut self, href: impl Into<String>) {
        self.href = href.into();
        self.navigation = None;
    }
}

impl Location for StaticLocation {
    fn href(&self) -> &str {
        &self.href
    }

    fn navigation_href(&self) -> Option<&str> {
        self.navigation.as_deref()
    }
}
