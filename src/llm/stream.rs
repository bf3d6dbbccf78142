//! Decoding of OpenAI-style streamed completion chunks.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use super::{ChatChunk, FunctionCall, LlmError, ToolCall, ToolCallDelta};

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Option<StreamDelta>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<StreamToolCall>>,
}

#[derive(Debug, Deserialize)]
struct StreamToolCall {
    #[serde(default)]
    index: usize,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<StreamFunction>,
}

#[derive(Debug, Deserialize)]
struct StreamFunction {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

/// Decode one SSE `data:` payload into chunks.
///
/// Only the first choice is used. Chunks without choices (usage reports,
/// content-filter annotations) decode to nothing.
pub fn decode_chunk(data: &str) -> Result<Vec<ChatChunk>, LlmError> {
    let chunk: StreamChunk = serde_json::from_str(data)?;

    if let Some(error) = chunk.error {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(LlmError::Stream(message));
    }

    let mut out = Vec::new();
    let Some(choice) = chunk.choices.into_iter().next() else {
        return Ok(out);
    };

    if let Some(delta) = choice.delta {
        if let Some(content) = delta.content.filter(|c| !c.is_empty()) {
            out.push(ChatChunk::Text(content));
        }
        for call in delta.tool_calls.unwrap_or_default() {
            let (name, arguments) = match call.function {
                Some(f) => (f.name, f.arguments),
                None => (None, None),
            };
            out.push(ChatChunk::ToolCall(ToolCallDelta {
                index: call.index,
                id: call.id,
                name,
                arguments,
            }));
        }
    }

    if let Some(reason) = choice.finish_reason {
        out.push(ChatChunk::Finish(reason));
    }

    Ok(out)
}

/// Reassembles streamed tool-call fragments, keyed by their index.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    calls: BTreeMap<usize, ToolCall>,
}

impl ToolCallAccumulator {
    pub fn push(&mut self, delta: ToolCallDelta) {
        let call = self.calls.entry(delta.index).or_insert_with(|| ToolCall {
            id: String::new(),
            call_type: "function".to_string(),
            function: FunctionCall {
                name: String::new(),
                arguments: String::new(),
            },
        });

        if let Some(id) = delta.id.filter(|id| !id.is_empty()) {
            call.id = id;
        }
        if let Some(name) = delta.name.filter(|n| !n.is_empty()) {
            if call.function.name.is_empty() {
                call.function.name = name;
            }
        }
        if let Some(arguments) = delta.arguments {
            call.function.arguments.push_str(&arguments);
        }
    }

    /// Completed calls in index order. Calls that never received a name are dropped.
    pub fn finish(self) -> Vec<ToolCall> {
        self.calls
            .into_iter()
            .filter(|(_, call)| !call.function.name.is_empty())
            .map(|(index, mut call)| {
                if call.id.is_empty() {
                    call.id = format!("call_{}", index);
                }
                call
            })
            .collect()
    }
}
