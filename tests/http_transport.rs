mod common;

use axum::{
    Json, Router,
    body::Body,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::post,
};
use chat_widget::transport::{ChatTransport, HttpTransport, TransportError};
use chat_widget::widget::SubmitOutcome;
use chat_widget::wire::{ChatReply, ChatRequest, ConversationHistory, MessageRecord, Role};
use common::{bubbles, widget};
use serde_json::json;

/// Serve `app` on an ephemeral local port and return its base URL.
async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Appends the user turn and an echoed assistant turn, like a real endpoint.
async fn echo(headers: HeaderMap, Json(req): Json<ChatRequest>) -> impl IntoResponse {
    assert_eq!(
        headers.get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let reply = format!("echo: {}", req.message);
    let mut history: Vec<MessageRecord> = req.conversation_history.iter().cloned().collect();
    history.push(MessageRecord::new(Role::User, req.message));
    history.push(MessageRecord::new(Role::Assistant, reply.clone()));
    Json(json!({ "message": reply, "conversation_history": history }))
}

fn request(message: &str) -> ChatRequest {
    ChatRequest {
        message: message.to_string(),
        conversation_history: ConversationHistory::new(),
    }
}

#[tokio::test]
async fn test_post_round_trip() {
    let base = spawn(Router::new().route("/api/chat", post(echo))).await;
    let transport = HttpTransport::new(&base, "/api/chat").unwrap();

    let reply = transport.exchange(&request("Hi")).await.unwrap();
    match reply {
        ChatReply::Success {
            message,
            conversation_history,
        } => {
            assert_eq!(message, "echo: Hi");
            assert_eq!(conversation_history.len(), 2);
        }
        ChatReply::Failure { error } => panic!("unexpected failure: {error}"),
    }
}

#[tokio::test]
async fn test_error_body_on_error_status() {
    let app = Router::new().route(
        "/api/chat",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "upstream exploded" })),
            )
        }),
    );
    let base = spawn(app).await;
    let transport = HttpTransport::new(&base, "/api/chat").unwrap();

    let reply = transport.exchange(&request("Hi")).await.unwrap();
    assert_eq!(
        reply,
        ChatReply::Failure {
            error: "upstream exploded".to_string()
        }
    );
}

#[tokio::test]
async fn test_non_json_body_is_a_failure() {
    let app = Router::new().route(
        "/api/chat",
        post(|| async { (StatusCode::BAD_GATEWAY, "<html>bad gateway</html>") }),
    );
    let base = spawn(app).await;
    let transport = HttpTransport::new(&base, "/api/chat").unwrap();

    let err = transport.exchange(&request("Hi")).await.unwrap_err();
    assert!(matches!(err, TransportError::Reply(_)));
    assert!(err.to_string().starts_with("invalid JSON in response:"));
}

#[tokio::test]
async fn test_missing_message_fails_closed() {
    let app = Router::new().route(
        "/api/chat",
        post(|| async { Json(json!({ "conversation_history": [] })) }),
    );
    let base = spawn(app).await;
    let transport = HttpTransport::new(&base, "/api/chat").unwrap();

    let err = transport.exchange(&request("Hi")).await.unwrap_err();
    assert_eq!(err.to_string(), "malformed response: missing `message`");
}

#[tokio::test]
async fn test_oversized_body_is_refused() {
    let big = "x".repeat(4096);
    let app = Router::new().route(
        "/api/chat",
        post(move || {
            let big = big.clone();
            async move { Json(json!({ "message": big, "conversation_history": [] })) }
        }),
    );
    let base = spawn(app).await;
    let transport = HttpTransport::new(&base, "/api/chat")
        .unwrap()
        .max_response_bytes(1024);

    let err = transport.exchange(&request("Hi")).await.unwrap_err();
    assert!(matches!(err, TransportError::ResponseTooLarge { limit: 1024 }));
    assert_eq!(err.to_string(), "response exceeded 1024 bytes");
}

/// Chunked body with no `Content-Length`, so only the streamed count applies.
fn chunked(chunks: Vec<Vec<u8>>) -> Body {
    Body::from_stream(futures::stream::iter(
        chunks.into_iter().map(Ok::<_, std::io::Error>),
    ))
}

#[tokio::test]
async fn test_chunked_body_over_limit_is_refused() {
    let app = Router::new().route(
        "/api/chat",
        post(|| async { chunked(vec![vec![b'x'; 512]; 8]) }),
    );
    let base = spawn(app).await;
    let transport = HttpTransport::new(&base, "/api/chat")
        .unwrap()
        .max_response_bytes(1024);

    let err = transport.exchange(&request("Hi")).await.unwrap_err();
    assert!(matches!(err, TransportError::ResponseTooLarge { limit: 1024 }));
}

#[tokio::test]
async fn test_chunked_body_within_limit_is_decoded() {
    let app = Router::new().route(
        "/api/chat",
        post(|| async {
            chunked(vec![
                br#"{"message":"#.to_vec(),
                br#""split","conversation_history":[]}"#.to_vec(),
            ])
        }),
    );
    let base = spawn(app).await;
    let transport = HttpTransport::new(&base, "/api/chat")
        .unwrap()
        .max_response_bytes(1024);

    let reply = transport.exchange(&request("Hi")).await.unwrap();
    assert_eq!(
        reply,
        ChatReply::Success {
            message: "split".to_string(),
            conversation_history: ConversationHistory::new(),
        }
    );
}

#[tokio::test]
async fn test_connection_refused() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let transport = HttpTransport::new(format!("http://{addr}"), "/api/chat").unwrap();
    let err = transport.exchange(&request("Hi")).await.unwrap_err();
    assert!(matches!(err, TransportError::Network(_)));
    assert!(!err.to_string().is_empty());
}

#[tokio::test]
async fn test_widget_over_http() {
    let base = spawn(Router::new().route("/api/chat", post(echo))).await;
    let widget = widget(HttpTransport::new(&base, "/api/chat").unwrap());

    widget.input().set_value("one");
    assert_eq!(widget.submit_current_input().await, SubmitOutcome::Replied);
    widget.input().set_value("two");
    assert_eq!(widget.submit_current_input().await, SubmitOutcome::Replied);

    assert_eq!(
        bubbles(&widget),
        vec![
            (Role::User, "one".to_string()),
            (Role::Assistant, "echo: one".to_string()),
            (Role::User, "two".to_string()),
            (Role::Assistant, "echo: two".to_string()),
        ]
    );
    assert_eq!(widget.history().len(), 4);
    assert_eq!(widget.history().as_slice()[2].text().unwrap(), "two");
}

#[tokio::test]
async fn test_widget_renders_transport_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let widget = widget(HttpTransport::new(format!("http://{addr}"), "/api/chat").unwrap());

    widget.input().set_value("Hi");
    assert_eq!(
        widget.submit_current_input().await,
        SubmitOutcome::TransportFailed
    );
    let rendered = bubbles(&widget);
    assert_eq!(rendered.len(), 2);
    assert!(rendered[1].1.starts_with("Error: "));
    assert!(!widget.input().is_disabled());
}
