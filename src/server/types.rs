use crate::llm::ChatMessage;
use serde::{Deserialize, Serialize};

/// Inbound chat body. `messages` defaults to an empty conversation when the
/// field is absent; any shape that cannot be coerced is malformed input.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
