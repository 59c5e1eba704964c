#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use chat_widget::dom::Document;
use chat_widget::transport::{ChatTransport, TransportError};
use chat_widget::widget::{ChatWidget, ElementIds, TYPING_CLASS, bubble_role};
use chat_widget::wire::{ChatReply, ChatRequest, ConversationHistory, Role};
use tokio::sync::oneshot;

pub type Reply = Result<ChatReply, TransportError>;

/// Replies from a fixed queue and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedTransport {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ChatTransport for ScriptedTransport {
    async fn exchange(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("no scripted reply".to_string())))
    }
}

/// Holds each request until the test releases it.
pub struct GatedTransport {
    gate: Mutex<Option<oneshot::Receiver<Reply>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl GatedTransport {
    pub fn new() -> (Self, oneshot::Sender<Reply>) {
        let (tx, rx) = oneshot::channel();
        let transport = Self {
            gate: Mutex::new(Some(rx)),
            requests: Mutex::new(Vec::new()),
        };
        (transport, tx)
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl ChatTransport for GatedTransport {
    async fn exchange(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let gate = self.gate.lock().unwrap().take();
        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(TransportError::Other("gate dropped".to_string()))),
            None => Err(TransportError::Other("gate already used".to_string())),
        }
    }
}

pub fn success(message: &str, history: ConversationHistory) -> Reply {
    Ok(ChatReply::Success {
        message: message.to_string(),
        conversation_history: history,
    })
}

pub fn server_error(error: &str) -> Reply {
    Ok(ChatReply::Failure {
        error: error.to_string(),
    })
}

/// Bind a widget to a freshly built host page.
pub fn widget<T: ChatTransport>(transport: T) -> ChatWidget<T> {
    let doc = Document::new();
    let ids = ElementIds::default();
    ids.build_host_page(&doc);
    ChatWidget::bind(&doc, &ids, transport).expect("host page has all elements")
}

/// `(role, text)` of every bubble in the transcript.
pub fn bubbles<T>(widget: &ChatWidget<T>) -> Vec<(Role, String)> {
    widget
        .transcript()
        .children()
        .iter()
        .filter_map(|el| bubble_role(el).map(|role| (role, el.text())))
        .collect()
}

pub fn has_typing_placeholder<T>(widget: &ChatWidget<T>) -> bool {
    widget
        .transcript()
        .children()
        .iter()
        .any(|el| el.has_class(TYPING_CLASS))
}

pub fn controls_enabled<T>(widget: &ChatWidget<T>) -> bool {
    !widget.input().is_disabled() && !widget.send_control().is_disabled()
}
