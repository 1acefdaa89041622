//! Sticky forms and share URLs.
//!
//! A form is declared once as a list of [`FormParameter`]s. [`UrlForm::populate`] fills the
//! form from defaults, saved settings and the page URL, and [`UrlForm::share_uri`] writes the
//! current form back out as a URL. Form fields may live in the query string (`?a=1`) or in
//! a query inside the fragment (`#?a=1`); both are read as one namespace with the fragment
//! winning. Bool fields are flags: `subscribe` is true and `-subscribe` is false.
//!
//! ```
//! use urlform::{FieldKind, FormOptions, FormParameter, MemoryDocument, MemoryStorage, Page,
//!     StaticLocation, UrlForm};
//!
//! let options = FormOptions::new(vec![
//!     FormParameter::new("first_name"),
//!     FormParameter::new("subscribe").kind(FieldKind::Bool),
//! ]);
//! let document = MemoryDocument::new()
//!     .with_text_input("first_name")
//!     .with_checkbox("subscribe")
//!     .with_link("shareURL");
//! let mut page = Page::new(
//!     document,
//!     MemoryStorage::new(),
//!     StaticLocation::new("https://example.com/?first_name=Bob&subscribe"),
//! );
//!
//! let form = UrlForm::init(options, &mut page.document).unwrap();
//! form.populate(&mut page).unwrap();
//! assert_eq!(
//!     form.share_uri(&mut page).unwrap().as_str(),
//!     "https://example.com/#?first_name=Bob&subscribe"
//! );
//! ```

pub mod db;
pub mod environment;
pub mod error;
pub mod form;
pub mod fragment;
pub mod memory;
pub mod quag;
pub mod reconcile;
pub mod registry;
pub mod share;
pub mod types;
pub mod url_params;

pub use db::SqliteSettings;
pub use environment::{Control, Document, Location, Page, SettingsStore};
pub use error::{Error, Result};
pub use form::UrlForm;
pub use memory::{Element, ElementKind, MemoryDocument, MemoryStorage, StaticLocation};
pub use quag::QuagParts;
pub use reconcile::{ResolvedField, ValueSource};
pub use share::ShareLink;
pub use types::{
    default_form_options, FieldKind, FieldValue, FormOptions, FormParameter, FormValues,
    QueryLocation,
};
pub use url_params::Pairs;
