//! API request and response types.

use serde::{Deserialize, Serialize};

use crate::agent::ChatTurn;

/// Body of `POST /chat` and `POST /chat/stream`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// The user's message to the agent
    pub message: String,

    /// Previous conversation turns, oldest first
    #[serde(default)]
    pub chat_history: Vec<ChatTurn>,

    /// Optional caller identifier, reported in metadata
    #[serde(default)]
    pub user_id: Option<String>,

    /// `/chat` only: stream plain text instead of returning JSON
    #[serde(default)]
    pub stream: bool,
}

/// Buffered reply from `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub model: String,
    pub framework: String,
}

/// Query string of `POST /chat/stream`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamQuery {
    /// Emit invocation metadata as a named SSE event
    #[serde(default)]
    pub metadata: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            service: "Todo Agent API".to_string(),
            version: "1.0.0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}
