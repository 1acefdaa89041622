//! Interfaces to the page the form lives on: its elements, persisted settings and URL.

use crate::error::Result;
use crate::url_params;

/// State of a form control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    Checkbox(bool),
    /// Text inputs, selects and text areas.
    Text(String),
}

/// Element access, by element id.
///
/// Setters return `false` when no element with that id exists.
pub trait Document {
    fn control(&self, id: &str) -> Option<Control>;

    fn set_value(&mut self, id: &str, value: &str) -> bool;

    fn set_checked(&mut self, id: &str, checked: bool) -> bool;

    /// Point a link element at `href`.
    fn set_link(&mut self, id: &str, href: &str) -> bool;

    fn set_text(&mut self, id: &str, text: &str) -> bool;

    /// Register the element for input/change persistence. The host forwards those events
    /// to [`UrlForm::persist_field`](crate::UrlForm::persist_field).
    fn bind_input(&mut self, _id: &str) -> bool {
        false
    }

    /// Register a button for clicks. The host forwards those clicks to
    /// [`UrlForm::on_click`](crate::UrlForm::on_click).
    fn bind_click(&mut self, _id: &str) -> bool {
        false
    }

    /// Entries of a `<form>` the way `FormData` reports them: `(name, value)` in document
    /// order, checked checkboxes as `"on"`, unchecked checkboxes left out.
    fn form_data(&self, form_id: &str) -> Option<Vec<(String, String)>>;

    /// Ids of every control inside a `<form>`.
    fn form_controls(&self, form_id: &str) -> Option<Vec<String>>;
}

/// Persistent string settings, `localStorage` style.
pub trait SettingsStore {
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;
}

/// The page URL.
pub trait Location {
    fn href(&self) -> &str;

    /// The full navigation URL when the host can provide it. Some browsers drop fragment
    /// directives and whatever follows them from `href`.
    fn navigation_href(&self) -> Option<&str> {
        None
    }

    fn raw_query(&self) -> &str {
        url_params::raw_query(self.href())
    }

    /// Fragment without `#`, from the navigation URL when available and non-empty.
    fn raw_fragment(&self) -> &str {
        match self.navigation_href() {
            Some(nav) if !nav.is_empty() => url_params::raw_fragment(nav),
            _ => url_params::raw_fragment(self.href()),
        }
    }
}

/// The collaborators a form operation works against.
#[derive(Debug, Default)]
pub struct Page<D, S, L> {
    pub document: D,
    pub storage: S,
    pub location: L,
}

impl<D, S, L> Page<D, S, L> {
    pub fn new(document: D, storage: S, location: L) -> Self {
        Self {
            document,
            storage,
            location,
        }
    }
}
