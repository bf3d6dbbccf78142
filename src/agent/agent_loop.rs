//! Core agent loop implementation.

use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::Value;
use tracing::Instrument;
use uuid::Uuid;

use crate::auth::default_strategies;
use crate::config::{Config, TelemetryConfig};
use crate::llm::{ChatChunk, ChatMessage, SharedLlmClient, ToolCallAccumulator};
use crate::telemetry::invocation_span;
use crate::todos::{format_todos_for_context, TodoSource, DEFAULT_CONTEXT_LIMIT};
use crate::tools::ToolRegistry;

use super::output::{AgentOutput, InvocationMetadata, FRAMEWORK};
use super::prompt::{build_instructions, build_prompt, ChatTurn};
use super::session::AgentSession;
use super::AgentError;

pub type AgentOutputStream = BoxStream<'static, AgentOutput>;

/// The todo assistant. Cheap to clone; clones share the todo cache and the
/// completion session.
#[derive(Clone)]
pub struct Agent {
    inner: Arc<AgentInner>,
}

struct AgentInner {
    model: String,
    max_tool_rounds: usize,
    telemetry: TelemetryConfig,
    todos: Arc<TodoSource>,
    tools: ToolRegistry,
    session: AgentSession,
}

impl Agent {
    /// Create an agent that resolves credentials from the configuration.
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        let todos = Arc::new(TodoSource::new(http.clone(), config.todo_api_url.clone()));
        let strategies = default_strategies(&config.credentials, &config.model, &http);
        Self::from_parts(config, todos, AgentSession::new(strategies))
    }

    /// Create an agent from pre-built services.
    pub fn from_parts(config: &Config, todos: Arc<TodoSource>, session: AgentSession) -> Self {
        let tools = ToolRegistry::for_todos(todos.clone());
        Self {
            inner: Arc::new(AgentInner {
                model: config.model.clone(),
                max_tool_rounds: config.max_tool_rounds,
                telemetry: config.telemetry.clone(),
                todos,
                tools,
                session,
            }),
        }
    }

    /// Configured model or deployment name.
    pub fn model(&self) -> &str {
        &self.inner.model
    }

    /// Build the completion client if that has not happened yet.
    pub async fn ensure_ready(&self) -> Result<SharedLlmClient, AgentError> {
        self.inner.session.ensure_ready().await
    }

    /// Answer one user message.
    ///
    /// Yields text as the model produces it. A successful run ends with one
    /// `Metadata` item; any failure ends the stream with one `Error` item.
    pub fn invoke(
        &self,
        user_message: &str,
        chat_history: &[ChatTurn],
        user_id: Option<&str>,
    ) -> AgentOutputStream {
        let agent = self.clone();
        let user_message = user_message.to_string();
        let chat_history = chat_history.to_vec();
        let user_id = user_id.unwrap_or("anonymous").to_string();
        let invocation_id = Uuid::new_v4();
        let span = invocation_span(&agent.inner.telemetry, invocation_id, &user_id);

        let stream = async_stream::stream! {
            let inner = &agent.inner;

            let client = match inner.session.ensure_ready().instrument(span.clone()).await {
                Ok(client) => client,
                Err(e) => {
                    tracing::error!(parent: &span, error = %e, "Agent is not ready");
                    yield AgentOutput::Error(e.to_string());
                    return;
                }
            };

            let todos = inner.todos.fetch_all().instrument(span.clone()).await;
            let todos_loaded = todos.len();
            let context = format_todos_for_context(todos, DEFAULT_CONTEXT_LIMIT);
            let prompt = build_prompt(&chat_history, &user_message);

            tracing::info!(
                parent: &span,
                todos_loaded,
                history_turns = chat_history.len(),
                "Invoking agent"
            );
            if inner.telemetry.enable_sensitive_data {
                tracing::debug!(parent: &span, prompt = %prompt, "Prompt");
            }

            let mut messages = vec![
                ChatMessage::system(build_instructions(&context)),
                ChatMessage::user(prompt),
            ];
            let tool_schemas = inner.tools.get_tool_schemas();
            let mut completion = String::new();
            let mut rounds = 0;

            loop {
                let mut chunks = match client
                    .chat_stream(&messages, &tool_schemas)
                    .instrument(span.clone())
                    .await
                {
                    Ok(chunks) => chunks,
                    Err(e) => {
                        let e = AgentError::from(e);
                        tracing::error!(parent: &span, error = %e, "Completion request failed");
                        yield AgentOutput::Error(e.to_string());
                        return;
                    }
                };

                let mut round_text = String::new();
                let mut pending = ToolCallAccumulator::default();

                while let Some(chunk) = chunks.next().await {
                    match chunk {
                        Ok(ChatChunk::Text(text)) => {
                            if text.is_empty() {
                                continue;
                            }
                            round_text.push_str(&text);
                            yield AgentOutput::Text(text);
                        }
                        Ok(ChatChunk::ToolCall(delta)) => pending.push(delta),
                        Ok(ChatChunk::Finish(reason)) => {
                            tracing::debug!(parent: &span, reason = %reason, "Completion finished");
                        }
                        Err(e) => {
                            let e = AgentError::from(e);
                            tracing::error!(parent: &span, error = %e, "Completion stream failed");
                            yield AgentOutput::Error(e.to_string());
                            return;
                        }
                    }
                }

                completion.push_str(&round_text);

                let tool_calls = pending.finish();
                if tool_calls.is_empty() {
                    break;
                }

                if rounds == inner.max_tool_rounds {
                    let e = AgentError::ToolRoundLimit(inner.max_tool_rounds);
                    tracing::warn!(parent: &span, error = %e, "Stopping tool loop");
                    yield AgentOutput::Error(e.to_string());
                    return;
                }
                rounds += 1;

                messages.push(ChatMessage::assistant_tool_calls(round_text, tool_calls.clone()));

                for tool_call in &tool_calls {
                    tracing::info!(
                        parent: &span,
                        tool = %tool_call.function.name,
                        call_id = %tool_call.id,
                        round = rounds,
                        "Executing tool call"
                    );

                    let args: Value = serde_json::from_str(&tool_call.function.arguments)
                        .unwrap_or(Value::Null);
                    let result = match inner
                        .tools
                        .execute(&tool_call.function.name, args)
                        .instrument(span.clone())
                        .await
                    {
                        Ok(output) => output,
                        Err(e) => format!("Error: {}", e),
                    };

                    messages.push(ChatMessage::tool_result(tool_call.id.clone(), result));
                }
            }

            if inner.telemetry.enable_sensitive_data {
                tracing::debug!(parent: &span, completion = %completion, "Completion");
            }
            tracing::info!(parent: &span, tool_rounds = rounds, "Agent invocation complete");

            yield AgentOutput::Metadata(InvocationMetadata {
                model: client.model().to_string(),
                framework: FRAMEWORK.to_string(),
                api_url: inner.todos.list_url().to_string(),
                todos_loaded,
                user_id,
            });
        };

        stream.boxed()
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("model", &self.inner.model)
            .field("todo_api_url", &self.inner.todos.list_url())
            .field("session", &self.inner.session)
            .finish()
    }
}
