//! Network seam between the widget and the chat endpoint.
//!
//! The widget only knows [`ChatTransport`]: hand it a [`ChatRequest`], get back
//! a decoded [`ChatReply`] or a [`TransportError`]. Every failure, whether a
//! refused connection, a non-JSON body or an oversized response, ends up as a
//! `TransportError` whose `Display` text is what the user sees.
//!
//! # Implementations
//!
//! - [`HttpTransport`]: `POST` over HTTP with `reqwest`

pub mod http;

pub use http::HttpTransport;

use thiserror::Error;

use crate::wire::{ChatReply, ChatRequest, ReplyError};

/// Failure of a single exchange below the widget.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection, TLS or body-read failure.
    #[error("{0}")]
    Network(#[from] reqwest::Error),

    /// Endpoint URL could not be built.
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Body was received but could not be decoded.
    #[error(transparent)]
    Reply(#[from] ReplyError),

    /// Body exceeded the configured size bound.
    #[error("response exceeded {limit} bytes")]
    ResponseTooLarge {
        /// Configured maximum, in bytes.
        limit: usize,
    },

    /// Failure from a non-HTTP transport.
    #[error("{0}")]
    Other(String),
}

/// Carries one request to the chat endpoint and returns its decoded reply.
///
/// Implementations perform exactly one attempt; the widget never retries.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    async fn exchange(&self, request: &ChatRequest) -> Result<ChatReply, TransportError>;
}

#[async_trait::async_trait]
impl<T: ChatTransport + ?Sized> ChatTransport for std::sync::Arc<T> {
    async fn exchange(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        (**self).exchange(request).await
    }
}
