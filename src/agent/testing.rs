//! Scripted completion client for agent tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;

use crate::auth::CredentialStrategy;
use crate::llm::{
    ChatChunk, ChatMessage, ChatStream, LlmClient, LlmError, SharedLlmClient, ToolCallDelta,
    ToolDefinition,
};

/// Replays one chunk list per completion request. Once the script runs out
/// the last round is repeated.
pub struct ScriptedClient {
    rounds: Mutex<VecDeque<Vec<ChatChunk>>>,
    last: Mutex<Vec<ChatChunk>>,
    fail_with: Option<u16>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedClient {
    pub fn new(rounds: Vec<Vec<ChatChunk>>) -> Arc<Self> {
        Arc::new(Self {
            rounds: Mutex::new(rounds.into()),
            last: Mutex::new(Vec::new()),
            fail_with: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Client whose every request is rejected with the given status.
    pub fn failing(status: u16) -> Arc<Self> {
        Arc::new(Self {
            rounds: Mutex::new(VecDeque::new()),
            last: Mutex::new(Vec::new()),
            fail_with: Some(status),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Messages sent with each request so far.
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn chat_stream(
        &self,
        messages: &[ChatMessage],
        _tools: &[ToolDefinition],
    ) -> Result<ChatStream, LlmError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        if let Some(status) = self.fail_with {
            return Err(LlmError::Api {
                status,
                body: "rejected".to_string(),
            });
        }

        let round = match self.rounds.lock().unwrap().pop_front() {
            Some(round) => {
                *self.last.lock().unwrap() = round.clone();
                round
            }
            None => self.last.lock().unwrap().clone(),
        };
        Ok(futures::stream::iter(round.into_iter().map(Ok)).boxed())
    }
}

/// Strategy handing out a scripted client, optionally failing its first builds.
pub struct ScriptedStrategy {
    client: SharedLlmClient,
    configured: bool,
    failures_left: AtomicUsize,
    builds: Arc<AtomicUsize>,
}

impl ScriptedStrategy {
    pub fn new(client: SharedLlmClient) -> Self {
        Self {
            client,
            configured: true,
            failures_left: AtomicUsize::new(0),
            builds: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn unconfigured(client: SharedLlmClient) -> Self {
        Self {
            configured: false,
            ..Self::new(client)
        }
    }

    pub fn failing_first(client: SharedLlmClient, failures: usize) -> Self {
        Self {
            failures_left: AtomicUsize::new(failures),
            ..Self::new(client)
        }
    }

    /// Shared counter of build attempts.
    pub fn builds(&self) -> Arc<AtomicUsize> {
        self.builds.clone()
    }
}

impl CredentialStrategy for ScriptedStrategy {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    fn build(&self) -> Result<SharedLlmClient, LlmError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(LlmError::Auth("token endpoint unavailable".to_string()));
        }
        Ok(self.client.clone())
    }
}

pub fn text(s: &str) -> ChatChunk {
    ChatChunk::Text(s.to_string())
}

pub fn tool_call(index: usize, id: &str, name: &str, arguments: &str) -> ChatChunk {
    ChatChunk::ToolCall(ToolCallDelta {
        index,
        id: Some(id.to_string()),
        name: Some(name.to_string()),
        arguments: Some(arguments.to_string()),
    })
}

pub fn finish(reason: &str) -> ChatChunk {
    ChatChunk::Finish(reason.to_string())
}
