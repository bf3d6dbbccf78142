//! Tools the agent may call mid-conversation.

mod todo;

pub use todo::{render_todo, GetTodoById};

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::llm::{FunctionDefinition, ToolDefinition};
use crate::todos::TodoSource;

/// Whether a tool may run without a human confirming it first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalMode {
    NeverRequire,
    AlwaysRequire,
}

/// A callable capability exposed to the model.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the arguments object.
    fn parameters_schema(&self) -> Value;

    /// Tools must opt in to autonomous execution.
    fn approval_mode(&self) -> ApprovalMode {
        ApprovalMode::AlwaysRequire
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String>;
}

/// Registered tools, keyed by name.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the todo lookup tool.
    pub fn for_todos(source: Arc<TodoSource>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(GetTodoById::new(source)));
        registry
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Function-tool definitions for the completion request.
    pub fn get_tool_schemas(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|t| ToolDefinition {
                kind: "function",
                function: FunctionDefinition {
                    name: t.name().to_string(),
                    description: t.description().to_string(),
                    parameters: t.parameters_schema(),
                },
            })
            .collect()
    }

    /// Run a tool by name.
    ///
    /// Tools that require approval are refused; there is no one to ask.
    pub async fn execute(&self, name: &str, args: Value) -> anyhow::Result<String> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown tool: {}", name))?;

        if tool.approval_mode() == ApprovalMode::AlwaysRequire {
            anyhow::bail!("Tool '{}' requires approval and cannot run autonomously", name);
        }

        tool.execute(args).await
    }
}
