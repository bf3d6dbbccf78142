//! Lazily-built completion client.

use tokio::sync::OnceCell;

use super::AgentError;
use crate::auth::{select_strategy, CredentialStrategy};
use crate::llm::SharedLlmClient;

/// Holds the credential strategies and the client built from the first
/// configured one.
///
/// Concurrent first callers wait on a single construction. A failed
/// construction leaves the session empty so the next call tries again.
pub struct AgentSession {
    strategies: Vec<Box<dyn CredentialStrategy>>,
    client: OnceCell<SharedLlmClient>,
}

impl AgentSession {
    pub fn new(strategies: Vec<Box<dyn CredentialStrategy>>) -> Self {
        Self {
            strategies,
            client: OnceCell::new(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.client.initialized()
    }

    pub async fn ensure_ready(&self) -> Result<SharedLlmClient, AgentError> {
        self.client
            .get_or_try_init(|| async move {
                let strategy = select_strategy(&self.strategies).ok_or(AgentError::NotConfigured)?;
                let client = strategy.build()?;
                tracing::info!(
                    strategy = strategy.name(),
                    model = client.model(),
                    "Completion client initialized"
                );
                Ok::<_, AgentError>(client)
            })
            .await
            .cloned()
    }
}

impl std::fmt::Debug for AgentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentSession")
            .field("strategies", &self.strategies.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("ready", &self.is_ready())
            .finish()
    }
}
