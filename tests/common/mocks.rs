use async_trait::async_trait;
use bytes::Bytes;
use essay_coach_rust::{
    llm::{ChatCompletionRequest, LlmClient},
    Error, Result,
};
use std::sync::{Arc, Mutex};

/// Mock LLM client for testing: captures every outbound request and replies
/// with a canned streaming response built the same way the real backend
/// would deliver one.
pub struct MockLlmClient {
    pub requests: Arc<Mutex<Vec<ChatCompletionRequest>>>,
    chunks: Vec<Bytes>,
    content_type: String,
    error: Option<String>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            chunks: vec![Bytes::from_static(b"data: [DONE]\n\n")],
            content_type: "text/event-stream".to_string(),
            error: None,
        }
    }

    pub fn with_body(mut self, body: &'static str) -> Self {
        self.chunks = vec![Bytes::from(body)];
        self
    }

    pub fn with_chunks(mut self, chunks: Vec<&'static str>) -> Self {
        self.chunks = chunks.into_iter().map(Bytes::from).collect();
        self
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = content_type.to_string();
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn get_requests(&self) -> Vec<ChatCompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn stream_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<reqwest::Response> {
        self.requests.lock().unwrap().push(request);

        if let Some(ref error) = self.error {
            return Err(Error::llm(error.clone()));
        }

        let chunks = self.chunks.clone();
        let stream = futures::stream::iter(chunks.into_iter().map(Ok::<_, std::io::Error>));

        let response = axum::http::Response::builder()
            .status(200)
            .header("content-type", self.content_type.as_str())
            .body(reqwest::Body::wrap_stream(stream))
            .unwrap();

        Ok(reqwest::Response::from(response))
    }
}
