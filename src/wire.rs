//! Wire types for the `/api/chat` exchange.
//!
//! The client sends `{ "message", "conversation_history" }` and receives either
//! `{ "message", "conversation_history" }` or `{ "error" }`. History records
//! are defined by the server; beyond a `role` the client treats them as
//! opaque and sends them back exactly as received.
//!
//! # Example
//!
//! ```rust
//! use chat_widget::wire::{ChatReply, Role};
//!
//! let reply = ChatReply::from_slice(
//!     br#"{"message":"Hello!","conversation_history":[{"role":"user","text":"Hi"}]}"#,
//! )
//! .unwrap();
//!
//! match reply {
//!     ChatReply::Success { message, conversation_history } => {
//!         assert_eq!(message, "Hello!");
//!         assert_eq!(conversation_history.as_slice()[0].role(), Role::User);
//!     }
//!     ChatReply::Failure { .. } => unreachable!(),
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Turn typed by the person using the widget.
    User,
    /// Turn produced by the remote endpoint.
    Assistant,
}

/// A single history entry.
///
/// Only `role` is interpreted; every other field is carried through
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    role: Role,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl MessageRecord {
    /// Build a plain `{ "role", "text" }` record.
    #[must_use]
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("text".to_string(), Value::String(text.into()));
        Self { role, fields }
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Best-effort plain text of the turn.
    ///
    /// Reads `text`, then a string `content`, then the concatenated `text`
    /// of `content` blocks.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        if let Some(text) = self.fields.get("text").and_then(Value::as_str) {
            return Some(text.to_string());
        }
        match self.fields.get("content")? {
            Value::String(s) => Some(s.clone()),
            Value::Array(blocks) => {
                let joined: String = blocks
                    .iter()
                    .filter_map(|b| b.get("text").and_then(Value::as_str))
                    .collect();
                Some(joined)
            }
            _ => None,
        }
    }
}

/// Ordered record of prior turns, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationHistory(Vec<MessageRecord>);

impl ConversationHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[MessageRecord] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MessageRecord> {
        self.0.iter()
    }
}

impl From<Vec<MessageRecord>> for ConversationHistory {
    fn from(records: Vec<MessageRecord>) -> Self {
        Self(records)
    }
}

impl<'a> IntoIterator for &'a ConversationHistory {
    type Item = &'a MessageRecord;
    type IntoIter = std::slice::Iter<'a, MessageRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Request body for `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The submitted text, already trimmed.
    pub message: String,
    /// History as it stood before this message.
    pub conversation_history: ConversationHistory,
}

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatReply {
    /// The endpoint answered; `conversation_history` replaces the local one.
    Success {
        message: String,
        conversation_history: ConversationHistory,
    },
    /// The endpoint reported an error.
    Failure { error: String },
}

/// Why a response body could not be decoded.
#[derive(Debug, Error)]
pub enum ReplyError {
    /// Body is not JSON at all.
    #[error("invalid JSON in response: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Body is JSON but not a usable reply.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ChatReply {
    /// Decode a response body.
    ///
    /// An `error` field wins whenever it is set to something other than
    /// `null`, `false`, `0` or `""`. Otherwise both `message` and
    /// `conversation_history` are required.
    pub fn from_slice(body: &[u8]) -> Result<Self, ReplyError> {
        let value: Value = serde_json::from_slice(body)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, ReplyError> {
        let Value::Object(mut obj) = value else {
            return Err(ReplyError::Malformed("expected a JSON object".to_string()));
        };

        if let Some(error) = obj.remove("error").and_then(error_text) {
            return Ok(Self::Failure { error });
        }

        let message = match obj.remove("message") {
            Some(Value::String(message)) => message,
            Some(_) => {
                return Err(ReplyError::Malformed("`message` is not a string".to_string()));
            }
            None => return Err(ReplyError::Malformed("missing `message`".to_string())),
        };

        let history = obj
            .remove("conversation_history")
            .ok_or_else(|| ReplyError::Malformed("missing `conversation_history`".to_string()))?;
        let conversation_history = serde_json::from_value(history)
            .map_err(|e| ReplyError::Malformed(format!("bad `conversation_history`: {e}")))?;

        Ok(Self::Success {
            message,
            conversation_history,
        })
    }
}

/// Text of a set `error` field; falsy JSON values count as unset.
fn error_text(value: Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Number(n) if n.as_f64().is_some_and(|f| f == 0.0) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}
