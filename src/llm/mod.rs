//! Hosted completion provider seam.
//!
//! The agent talks to any OpenAI-compatible chat-completions endpoint through
//! [`LlmClient`]. Responses are consumed as a stream of [`ChatChunk`]s so text
//! can be forwarded as it arrives while tool-call deltas are accumulated.

mod openai;
mod stream;

pub use openai::{azure_chat_url, openai_chat_url, ApiAuth, OpenAiClient};
pub use stream::{decode_chunk, ToolCallAccumulator};

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("stream error: {0}")]
    Stream(String),

    #[error("invalid stream chunk: {0}")]
    Json(#[from] serde_json::Error),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("invalid endpoint {0}")]
    Endpoint(String),
}

/// Chat message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A message in the completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Assistant turn that requested tool calls. Empty text is sent as no content.
    pub fn assistant_tool_calls(content: String, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: (!content.is_empty()).then_some(content),
            tool_calls: Some(tool_calls),
            tool_call_id: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// A complete tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,

    #[serde(rename = "type")]
    pub call_type: String,

    pub function: FunctionCall,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,

    /// JSON-encoded arguments, as produced by the model
    pub arguments: String,
}

/// Function tool advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub kind: &'static str,

    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Partial tool call as streamed by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolCallDelta {
    pub index: usize,
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments: Option<String>,
}

/// One decoded piece of a streamed completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatChunk {
    /// Assistant text delta
    Text(String),
    /// Fragment of a tool call
    ToolCall(ToolCallDelta),
    /// The choice finished with the given reason
    Finish(String),
}

pub type ChatStream = BoxStream<'static, Result<ChatChunk, LlmError>>;

/// Streaming chat-completions client bound to one model.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Model identifier requests are sent for.
    fn model(&self) -> &str;

    /// Start a streaming completion.
    async fn chat_stream(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatStream, LlmError>;
}

/// Source of short-lived bearer tokens.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> Result<String, LlmError>;
}

pub type SharedLlmClient = Arc<dyn LlmClient>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_result_serializes_call_id() {
        let message = ChatMessage::tool_result("call_1", "done");
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({"role": "tool", "content": "done", "tool_call_id": "call_1"})
        );
    }

    #[test]
    fn assistant_tool_calls_omit_empty_content() {
        let call = ToolCall {
            id: "call_1".to_string(),
            call_type: "function".to_string(),
            function: FunctionCall {
                name: "get_todo_by_id".to_string(),
                arguments: r#"{"todo_id":5}"#.to_string(),
            },
        };
        let value = serde_json::to_value(ChatMessage::assistant_tool_calls(String::new(), vec![call]))
            .unwrap();
        assert!(value.get("content").is_none());
        assert_eq!(value["tool_calls"][0]["type"], "function");
        assert_eq!(value["tool_calls"][0]["function"]["name"], "get_todo_by_id");
    }
}
