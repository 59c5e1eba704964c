//! The chat widget controller.

use std::sync::{PoisonError, RwLock, RwLockWriteGuard};

use crate::dom::{Document, HostDocument, HostElement};
use crate::error::{Result, WidgetError};
use crate::transport::ChatTransport;
use crate::wire::{ChatReply, ChatRequest, ConversationHistory, Role};

use super::bubble::{append_bubble, append_typing_placeholder};
use super::state::{ExchangePhase, WidgetState};
use super::{ElementIds, UiEvent};

/// Prefix of every error bubble.
pub const ERROR_PREFIX: &str = "Error: ";

/// Key that submits the input.
pub const SUBMIT_KEY: &str = "Enter";

/// Why a gesture did not start an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Input was empty after trimming.
    EmptyInput,
    /// Another exchange is still in flight.
    Busy,
    /// The control the gesture targeted is disabled or unfocused.
    ControlUnavailable,
    /// The gesture is not an activation (e.g. a key other than Enter).
    NotAnActivation,
}

/// How a gesture ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing happened.
    Ignored(IgnoreReason),
    /// The endpoint replied and the history was replaced.
    Replied,
    /// The endpoint reported an error; history untouched.
    ServerError,
    /// The request or its decoding failed; history untouched.
    TransportFailed,
}

/// Trim surrounding whitespace, counting a byte-order mark as whitespace.
fn trim_input(raw: &str) -> &str {
    raw.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

/// A chat widget bound to three elements of a host document.
///
/// Each instance owns its own conversation history, so any number of
/// widgets can live side by side. The host defaults to the headless
/// [`Document`].
pub struct ChatWidget<T, D: HostDocument = Document> {
    document: D,
    transcript: D::Element,
    input: D::Element,
    send: D::Element,
    transport: T,
    state: RwLock<WidgetState>,
}

impl<T, D: HostDocument> std::fmt::Debug for ChatWidget<T, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatWidget")
            .field("transcript", &self.transcript)
            .field("input", &self.input)
            .field("send", &self.send)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<T: ChatTransport, D: HostDocument> ChatWidget<T, D> {
    /// Wire a widget to the elements named by `ids`.
    ///
    /// Fails if any of the three elements is missing. On success the input
    /// takes focus.
    pub fn bind(document: &D, ids: &ElementIds, transport: T) -> Result<Self> {
        let lookup = |id: &str| {
            document
                .get_element_by_id(id)
                .ok_or_else(|| WidgetError::MissingElement { id: id.to_string() })
        };
        let transcript = lookup(&ids.transcript_id)?;
        let input = lookup(&ids.input_id)?;
        let send = lookup(&ids.send_id)?;

        input.focus();
        tracing::debug!(
            name: "widget.bound",
            transcript = %ids.transcript_id,
            input = %ids.input_id,
            send = %ids.send_id,
            "Chat widget bound to document"
        );

        Ok(Self {
            document: document.clone(),
            transcript,
            input,
            send,
            transport,
            state: RwLock::new(WidgetState::default()),
        })
    }

    /// Route a user gesture.
    pub async fn dispatch(&self, event: UiEvent) -> SubmitOutcome {
        match event {
            UiEvent::SendActivated => {
                if self.send.is_disabled() {
                    return SubmitOutcome::Ignored(IgnoreReason::ControlUnavailable);
                }
            }
            UiEvent::KeyPress(key) => {
                if key != SUBMIT_KEY {
                    return SubmitOutcome::Ignored(IgnoreReason::NotAnActivation);
                }
                if self.input.is_disabled() || !self.input.is_focused() {
                    return SubmitOutcome::Ignored(IgnoreReason::ControlUnavailable);
                }
            }
        }
        self.submit_current_input().await
    }

    /// Submit whatever the input holds and wait for the reply.
    ///
    /// Controls are restored and the input refocused on every path, including
    /// when this future is dropped before the reply arrives.
    pub async fn submit_current_input(&self) -> SubmitOutcome {
        let message = trim_input(&self.input.value()).to_string();
        if message.is_empty() {
            return SubmitOutcome::Ignored(IgnoreReason::EmptyInput);
        }

        let Some(history) = self.state().begin_exchange() else {
            tracing::debug!(name: "widget.submit.busy", "Exchange already in flight");
            return SubmitOutcome::Ignored(IgnoreReason::Busy);
        };

        self.append_bubble(&message, Role::User);
        self.input.set_value("");
        self.set_controls_disabled(true);
        let guard = ExchangeGuard {
            widget: self,
            typing: self.append_typing_placeholder(),
        };

        tracing::info!(
            name: "widget.exchange.started",
            chars = message.chars().count(),
            history_len = history.len(),
            "Exchange started"
        );

        let request = ChatRequest {
            message,
            conversation_history: history,
        };
        let result = self.transport.exchange(&request).await;
        if let Some(typing) = &guard.typing {
            typing.remove();
        }

        let outcome = match result {
            Ok(ChatReply::Success {
                message,
                conversation_history,
            }) => {
                self.append_bubble(&message, Role::Assistant);
                tracing::info!(
                    name: "widget.exchange.completed",
                    history_len = conversation_history.len(),
                    "Exchange completed"
                );
                self.state().history = conversation_history;
                SubmitOutcome::Replied
            }
            Ok(ChatReply::Failure { error }) => {
                self.append_bubble(&format!("{ERROR_PREFIX}{error}"), Role::Assistant);
                tracing::warn!(
                    name: "widget.exchange.failed",
                    kind = "server",
                    error = %error,
                    "Endpoint reported an error"
                );
                SubmitOutcome::ServerError
            }
            Err(e) => {
                self.append_bubble(&format!("{ERROR_PREFIX}{e}"), Role::Assistant);
                tracing::warn!(
                    name: "widget.exchange.failed",
                    kind = "transport",
                    error = %e,
                    "Exchange failed"
                );
                SubmitOutcome::TransportFailed
            }
        };

        drop(guard);
        outcome
    }
}

impl<T, D: HostDocument> ChatWidget<T, D> {
    fn state(&self) -> RwLockWriteGuard<'_, WidgetState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a bubble to this widget's transcript.
    pub fn append_bubble(&self, text: &str, role: Role) -> Option<D::Element> {
        let bubble = append_bubble(&self.transcript, text, role);
        if bubble.is_none() {
            tracing::warn!(name: "widget.render.failed", ?role, "Host refused to create a bubble");
        }
        bubble
    }

    /// Append the pending-reply marker to this widget's transcript.
    pub fn append_typing_placeholder(&self) -> Option<D::Element> {
        append_typing_placeholder(&self.transcript)
    }

    fn set_controls_disabled(&self, disabled: bool) {
        self.input.set_disabled(disabled);
        self.send.set_disabled(disabled);
    }

    /// Snapshot of the conversation history.
    #[must_use]
    pub fn history(&self) -> ConversationHistory {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .history
            .clone()
    }

    #[must_use]
    pub fn phase(&self) -> ExchangePhase {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .phase
    }

    /// Whether an exchange is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.phase() == ExchangePhase::AwaitingResponse
    }

    #[must_use]
    pub fn document(&self) -> &D {
        &self.document
    }

    #[must_use]
    pub fn transcript(&self) -> &D::Element {
        &self.transcript
    }

    #[must_use]
    pub fn input(&self) -> &D::Element {
        &self.input
    }

    #[must_use]
    pub fn send_control(&self) -> &D::Element {
        &self.send
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

/// Restores the widget when an exchange ends, however it ends.
struct ExchangeGuard<'a, T, D: HostDocument> {
    widget: &'a ChatWidget<T, D>,
    typing: Option<D::Element>,
}

impl<T, D: HostDocument> Drop for ExchangeGuard<'_, T, D> {
    fn drop(&mut self) {
        if let Some(typing) = self.typing.take() {
            typing.remove();
        }
        self.widget.set_controls_disabled(false);
        self.widget.input.focus();
        self.widget.state().end_exchange();
    }
}
