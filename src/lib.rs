//! Chat Widget
//!
//! A small chat component: it captures user input, renders a running
//! transcript, and forwards each message with the prior history to a remote
//! endpoint as a single JSON `POST`, displaying the reply.
//!
//! # Architecture
//!
//! - **Document**: host surface the widget binds to by element id, either the
//!   headless element tree or the browser DOM (feature `web`)
//! - **Widget**: controller running one exchange at a time against a transport
//! - **Transport**: async seam to the endpoint, with a `reqwest` implementation
//! - **Host**: terminal loop feeding stdin lines to the widget
//!
//! # Modules
//!
//! - [`dom`]: host traits and the headless document model
//! - [`wire`]: request/response types and reply decoding
//! - [`transport`]: transport trait and HTTP implementation
//! - [`widget`]: controller, bubbles and state
//! - [`host`]: terminal host
//! - [`config`]: CLI and layered configuration
//! - `web`: `web-sys` host and `mount` (feature `web`)

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod dom;
pub mod error;
pub mod host;
pub mod transport;
#[cfg(feature = "web")]
pub mod web;
pub mod widget;
pub mod wire;

pub use error::WidgetError;
pub use transport::{ChatTransport, HttpTransport, TransportError};
pub use widget::{ChatWidget, ElementIds, SubmitOutcome, UiEvent};
