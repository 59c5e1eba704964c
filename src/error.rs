//! Crate-level error type.

use thiserror::Error;

/// Errors raised while wiring a widget to its host page.
#[derive(Debug, Error)]
pub enum WidgetError {
    /// A required element is not present in the document.
    #[error("element #{id} not found in document")]
    MissingElement {
        /// The identifier that was looked up.
        id: String,
    },

    /// No browser document is available to bind to.
    #[error("no browser document available")]
    NoDocument,

    /// The browser refused an event listener.
    #[error("failed to attach {event} listener: {reason}")]
    Listener { event: String, reason: String },
}

/// Result type alias for widget setup.
pub type Result<T> = std::result::Result<T, WidgetError>;
