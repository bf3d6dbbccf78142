//! Agent module - the todo assistant's conversation logic.
//!
//! Each invocation follows a "tools in a loop" pattern:
//! 1. Build instructions from the system prompt and the current todo list
//! 2. Stream a completion with the available tools, forwarding text as it arrives
//! 3. If the model requests tool calls, execute them and feed the results back
//! 4. Repeat until the model answers without tools, then emit metadata

mod agent_loop;
mod output;
mod prompt;
mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use agent_loop::{Agent, AgentOutputStream};
pub use output::{AgentOutput, InvocationMetadata, FRAMEWORK, METADATA_PREFIX};
pub use prompt::{build_instructions, build_prompt, ChatTurn, TurnRole};
pub use session::AgentSession;

use thiserror::Error;

use crate::llm::LlmError;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(
        "No credentials configured. Set one of:\n  \
         - AZURE_OPENAI_ENDPOINT + APIM_SUBSCRIPTION_KEY (API gateway)\n  \
         - AZURE_OPENAI_ENDPOINT + AZURE_OPENAI_API_KEY\n  \
         - AZURE_OPENAI_ENDPOINT alone (managed identity)\n  \
         - OPENAI_API_KEY"
    )]
    NotConfigured,

    #[error(transparent)]
    Provider(#[from] LlmError),

    #[error("Tool-call limit of {0} rounds reached without a final answer")]
    ToolRoundLimit(usize),
}
