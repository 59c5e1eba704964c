//! HTTP transport for the chat endpoint.

use futures::StreamExt;
use url::Url;

use super::{ChatTransport, TransportError};
use crate::wire::{ChatReply, ChatRequest};

/// Default path of the chat endpoint.
pub const DEFAULT_API_PATH: &str = "/api/chat";

/// Default bound on response bodies (1 MiB).
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 1024 * 1024;

/// Posts chat requests as JSON and decodes the buffered JSON reply.
///
/// The HTTP status is logged but does not decide the outcome: a `500` with
/// `{"error": "..."}` is a server-reported error like any other, and a body
/// that is not JSON fails regardless of status.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: Url,
    max_response_bytes: usize,
}

impl HttpTransport {
    /// Create a transport for `base_url` joined with `api_path`.
    pub fn new(base_url: impl AsRef<str>, api_path: &str) -> Result<Self, TransportError> {
        Self::with_client(base_url, api_path, reqwest::Client::new())
    }

    /// Create a transport with a custom reqwest client.
    pub fn with_client(
        base_url: impl AsRef<str>,
        api_path: &str,
        http: reqwest::Client,
    ) -> Result<Self, TransportError> {
        let endpoint = Url::parse(base_url.as_ref())?.join(api_path)?;
        Ok(Self {
            http,
            endpoint,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        })
    }

    /// Override the response size bound.
    #[must_use]
    pub fn max_response_bytes(mut self, limit: usize) -> Self {
        self.max_response_bytes = limit;
        self
    }

    /// Full URL requests are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<Vec<u8>, TransportError> {
        let limit = self.max_response_bytes;
        if response
            .content_length()
            .is_some_and(|len| usize::try_from(len).map_or(true, |len| len > limit))
        {
            return Err(TransportError::ResponseTooLarge { limit });
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if body.len() + chunk.len() > limit {
                return Err(TransportError::ResponseTooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

#[async_trait::async_trait]
impl ChatTransport for HttpTransport {
    async fn exchange(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        tracing::debug!(
            name: "transport.request.sent",
            endpoint = %self.endpoint,
            history_len = request.conversation_history.len(),
            "Posting chat request"
        );

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                name: "transport.response.status",
                status = status.as_u16(),
                "Chat endpoint returned non-success status"
            );
        }

        let body = self.read_body(response).await?;
        tracing::debug!(
            name: "transport.response.received",
            status = status.as_u16(),
            bytes = body.len(),
            "Chat response received"
        );

        Ok(ChatReply::from_slice(&body)?)
    }
}
