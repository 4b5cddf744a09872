//! Error types shared by the backend adapters.

use thiserror::Error;
use wasm_bindgen::JsValue;

/// Failure talking to the document store or the identity provider.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("HTTP error: {status}")]
    Http { status: u16 },

    /// A payload could not be converted to or from JSON.
    #[error("decode error: {0}")]
    Decode(String),

    /// Login, registration or token refresh was rejected.
    #[error("auth error: {0}")]
    Auth(String),

    /// No browser window is available (not running in a page).
    #[error("no window")]
    NoWindow,

    /// A write was refused by the in-memory store.
    #[cfg(any(test, feature = "testing"))]
    #[error("rejected: {0}")]
    Rejected(String),
}

impl From<JsValue> for BackendError {
    fn from(value: JsValue) -> Self {
        Self::Network(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<serde_wasm_bindgen::Error> for BackendError {
    fn from(err: serde_wasm_bindgen::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Invalid or missing build-time configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}
