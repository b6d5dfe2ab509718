use super::types::{ChatRequest, ErrorResponse};
use crate::llm::{ChatCompletionRequest, ChatMessage, LlmClient, Role};
use crate::{config::LlmConfig, Result};
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{debug, error};

#[derive(Clone)]
pub struct AppState {
    pub llm: Arc<dyn LlmClient>,
    pub llm_config: LlmConfig,
}

/// POST /api/chat. Every failure inside the parse/normalize/dispatch
/// sequence collapses to the same 500 JSON body; detail goes to the log only.
pub async fn chat(State(state): State<AppState>, request: Request) -> Response {
    match handle_chat(&state, request).await {
        Ok(response) => response,
        Err(e) => {
            error!("Failed to process chat request: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to process request".to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn handle_chat(state: &AppState, request: Request) -> Result<Response> {
    // The body is read raw rather than through the Json extractor so that
    // malformed input lands on the uniform error path instead of a 4xx
    // rejection.
    let body = axum::body::to_bytes(request.into_body(), usize::MAX).await?;
    let chat_request: ChatRequest = serde_json::from_slice(&body)?;

    let messages = ensure_system_message(chat_request.messages, &state.llm_config.system_prompt);

    debug!("Dispatching {} messages to inference backend", messages.len());

    let upstream = state
        .llm
        .stream_chat_completion(ChatCompletionRequest {
            model: state.llm_config.model.clone(),
            messages,
            max_tokens: state.llm_config.max_tokens,
            stream: true,
        })
        .await?;

    Ok(relay(upstream))
}

pub async fn method_not_allowed() -> Response {
    (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response()
}

pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}

/// Prepends the instruction prompt unless the caller already supplied a
/// system message anywhere in the conversation. Keyed on presence, not
/// content; the sequence is never reordered or filtered.
fn ensure_system_message(mut messages: Vec<ChatMessage>, prompt: &str) -> Vec<ChatMessage> {
    if !messages.iter().any(|m| m.role == Role::System) {
        messages.insert(0, ChatMessage::system(prompt));
    }
    messages
}

/// Hands the backend's response to the caller as-is: its status, its
/// headers, and its body as an open byte stream. Nothing is buffered, so
/// backpressure and caller disconnects propagate to the backend naturally.
fn relay(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let headers = preserve_response_headers(upstream.headers());

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

fn preserve_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in upstream {
        // Framing and hop-by-hop headers belong to this server's HTTP layer.
        if name == header::CONNECTION
            || name == header::TRANSFER_ENCODING
            || name == header::CONTENT_LENGTH
        {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use pretty_assertions::assert_eq;

    fn user(content: &str) -> ChatMessage {
        ChatMessage {
            role: Role::User,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_injects_system_message_at_front() {
        let messages = vec![user("Hi"), user("Here is my essay")];

        let normalized = ensure_system_message(messages, "coach prompt");

        assert_eq!(normalized.len(), 3);
        assert_eq!(normalized[0].role, Role::System);
        assert_eq!(normalized[0].content, "coach prompt");
        assert_eq!(normalized[1].content, "Hi");
        assert_eq!(normalized[2].content, "Here is my essay");
    }

    #[test]
    fn test_injects_into_empty_conversation() {
        let normalized = ensure_system_message(vec![], "coach prompt");

        assert_eq!(normalized, vec![ChatMessage::system("coach prompt")]);
    }

    #[test]
    fn test_existing_system_message_suppresses_injection() {
        let messages = vec![user("Hi"), ChatMessage::system("custom"), user("Bye")];

        let normalized = ensure_system_message(messages.clone(), "coach prompt");

        assert_eq!(normalized, messages);
    }

    #[test]
    fn test_preserve_headers_strips_framing() {
        let mut upstream = HeaderMap::new();
        upstream.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/event-stream"),
        );
        upstream.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        upstream.insert(header::CONTENT_LENGTH, HeaderValue::from_static("42"));
        upstream.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        upstream.insert("x-request-id", HeaderValue::from_static("abc"));

        let preserved = preserve_response_headers(&upstream);

        assert_eq!(
            preserved.get(header::CONTENT_TYPE),
            Some(&HeaderValue::from_static("text/event-stream"))
        );
        assert_eq!(
            preserved.get("x-request-id"),
            Some(&HeaderValue::from_static("abc"))
        );
        assert!(preserved.get(header::TRANSFER_ENCODING).is_none());
        assert!(preserved.get(header::CONTENT_LENGTH).is_none());
        assert!(preserved.get(header::CONNECTION).is_none());
    }
}
