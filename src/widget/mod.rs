//! Chat widget controller.
//!
//! A [`ChatWidget`] binds to a transcript container, a text input and a send
//! control, and runs one request/response exchange per activation:
//!
//! 1. the trimmed input is rendered as a user bubble and the input cleared;
//! 2. input and send control are disabled and a typing marker appended;
//! 3. the message and the history *as it was* are posted through the
//!    [`ChatTransport`](crate::transport::ChatTransport);
//! 4. the marker is removed and either the reply or an `Error: ...` bubble
//!    rendered; a successful reply replaces the history wholesale;
//! 5. the controls are re-enabled and the input refocused.
//!
//! At most one exchange is in flight per widget. This is enforced by the
//! disabled controls and by an explicit busy check, so programmatic calls
//! cannot overlap either.
//!
//! # Example
//!
//! ```rust,no_run
//! use chat_widget::dom::Document;
//! use chat_widget::transport::HttpTransport;
//! use chat_widget::widget::{ChatWidget, ElementIds, UiEvent};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let ids = ElementIds::default();
//! let doc = Document::new();
//! ids.build_host_page(&doc);
//!
//! let transport = HttpTransport::new("http://localhost:5000", "/api/chat")?;
//! let widget = ChatWidget::bind(&doc, &ids, transport)?;
//!
//! widget.input().set_value("Hi");
//! widget.dispatch(UiEvent::KeyPress("Enter".into())).await;
//! # Ok(())
//! # }
//! ```

mod bubble;
mod controller;
mod state;

pub use bubble::{
    ASSISTANT_BUBBLE_CLASS, BUBBLE_CLASS, TYPING_CLASS, USER_BUBBLE_CLASS, append_bubble,
    append_typing_placeholder, bubble_role,
};
pub use controller::{ChatWidget, ERROR_PREFIX, IgnoreReason, SUBMIT_KEY, SubmitOutcome};
pub use state::ExchangePhase;

use serde::Deserialize;

use crate::dom::{Document, Element};

/// User gestures the widget reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// The send control was clicked or otherwise activated.
    SendActivated,
    /// A key was pressed while the input may have had focus.
    KeyPress(String),
}

/// Identifiers of the three host elements.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ElementIds {
    pub transcript_id: String,
    pub input_id: String,
    pub send_id: String,
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            transcript_id: "chatMessages".to_string(),
            input_id: "messageInput".to_string(),
            send_id: "sendButton".to_string(),
        }
    }
}

impl ElementIds {
    /// Add the markup a host page provides: a transcript container, a text
    /// input and a send button, in that order, under `<body>`.
    pub fn build_host_page(&self, doc: &Document) {
        let body = doc.body();
        let make = |tag: &str, id: &str| -> Element {
            let el = doc.create_element(tag);
            el.set_id(id);
            body.append_child(&el);
            el
        };
        make("div", &self.transcript_id).set_class_name("chat-messages");
        make("input", &self.input_id).set_class_name("message-input");
        make("button", &self.send_id).set_text("Send");
    }
}
