use std::string::FromUtf8Error;

use thiserror::Error;

/// Errors returned by form initialization, URL parsing and reconciliation.
#[derive(Debug, Error)]
pub enum Error {
    #[error("form parameter name must not be empty")]
    EmptyFieldName,

    #[error("form parameter name \"{0}\" must not start with '-'")]
    InvalidFieldName(String),

    #[error("form parameter \"{0}\" is declared more than once")]
    DuplicateField(String),

    #[error("default value for \"{field}\" is invalid: {reason}")]
    InvalidDefault { field: String, reason: String },

    #[error("form element \"{0}\" was not found in the document")]
    FormNotFound(String),

    #[error("malformed percent escape in \"{input}\"")]
    MalformedEscape { input: String },

    #[error("percent-decoded \"{input}\" is not valid UTF-8")]
    InvalidUtf8 {
        input: String,
        #[source]
        source: FromUtf8Error,
    },

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("settings storage failed: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("cannot find home directory")]
    NoHomeDirectory,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("callback for \"{field}\" failed")]
    Callback {
        field: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("form callback failed")]
    FormCallback(#[source] anyhow::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
