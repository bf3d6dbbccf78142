//! Single-todo lookup tool.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{ApprovalMode, Tool};
use crate::todos::{LookupError, Todo, TodoSource};

/// Fetch one todo from the upstream API by id.
pub struct GetTodoById {
    source: Arc<TodoSource>,
}

impl GetTodoById {
    pub fn new(source: Arc<TodoSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Tool for GetTodoById {
    fn name(&self) -> &str {
        "get_todo_by_id"
    }

    fn description(&self) -> &str {
        "Fetch a specific todo item by its ID from the JSONPlaceholder API. Use this when a user asks for details about a specific todo by ID. Valid IDs are 1-200."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "todo_id": {
                    "type": "integer",
                    "description": "The ID of the todo item to fetch (1-200)"
                }
            },
            "required": ["todo_id"]
        })
    }

    fn approval_mode(&self) -> ApprovalMode {
        ApprovalMode::NeverRequire
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        // Some models quote integers.
        let todo_id: i64 = match &args["todo_id"] {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
        .ok_or_else(|| anyhow::anyhow!("Missing or invalid 'todo_id' argument"))?;

        if todo_id < 1 {
            return Ok(LookupError::NotFound { id: todo_id }.to_string());
        }

        tracing::info!(todo_id, "Fetching todo for tool call");

        Ok(match self.source.fetch_one(todo_id).await {
            Ok(todo) => render_todo(&todo),
            Err(e) => e.to_string(),
        })
    }
}

/// Tool output for a found todo.
pub fn render_todo(todo: &Todo) -> String {
    let status = if todo.completed {
        "Completed ✓"
    } else {
        "Not completed ○"
    };
    format!(
        "Todo Details:\n  ID: {}\n  User ID: {}\n  Title: {}\n  Status: {}",
        todo.id, todo.user_id, todo.title, status
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn tool_with(server: &MockServer) -> GetTodoById {
        Mock::given(method("GET"))
            .and(path("/todos/5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "userId": 1,
                "id": 5,
                "title": "laboriosam mollitia et enim quasi adipisci quia provident illum",
                "completed": false
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/todos/9999"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({})))
            .mount(server)
            .await;

        GetTodoById::new(Arc::new(TodoSource::new(
            reqwest::Client::new(),
            format!("{}/todos", server.uri()),
        )))
    }

    #[test]
    fn renders_fixed_block() {
        let todo = Todo {
            id: 2,
            user_id: 1,
            title: "quis ut nam".to_string(),
            completed: true,
        };
        assert_eq!(
            render_todo(&todo),
            "Todo Details:\n  ID: 2\n  User ID: 1\n  Title: quis ut nam\n  Status: Completed ✓"
        );
    }

    #[tokio::test]
    async fn found_todo_is_rendered() {
        let server = MockServer::start().await;
        let tool = tool_with(&server).await;
        let output = tool.execute(json!({"todo_id": 5})).await.unwrap();
        assert!(output.starts_with("Todo Details:\n  ID: 5\n"));
        assert!(output.ends_with("Status: Not completed ○"));
    }

    #[tokio::test]
    async fn quoted_id_is_accepted() {
        let server = MockServer::start().await;
        let tool = tool_with(&server).await;
        let output = tool.execute(json!({"todo_id": "5"})).await.unwrap();
        assert!(output.contains("ID: 5"));
    }

    #[tokio::test]
    async fn missing_todo_is_a_message_not_an_error() {
        let server = MockServer::start().await;
        let tool = tool_with(&server).await;
        let output = tool.execute(json!({"todo_id": 9999})).await.unwrap();
        assert_eq!(output, "Todo with ID 9999 not found. Valid IDs are 1-200.");
    }

    #[tokio::test]
    async fn invalid_arguments_are_errors() {
        let server = MockServer::start().await;
        let tool = tool_with(&server).await;
        assert!(tool.execute(json!({})).await.is_err());
        assert!(tool.execute(json!({"todo_id": "five"})).await.is_err());
        assert!(tool.execute(json!({"todo_id": 2.5})).await.is_err());
    }

    #[tokio::test]
    async fn non_positive_ids_get_the_valid_range_hint() {
        let server = MockServer::start().await;
        let tool = tool_with(&server).await;
        assert_eq!(
            tool.execute(json!({"todo_id": -3})).await.unwrap(),
            "Todo with ID -3 not found. Valid IDs are 1-200."
        );
        assert_eq!(
            tool.execute(json!({"todo_id": "0"})).await.unwrap(),
            "Todo with ID 0 not found. Valid IDs are 1-200."
        );
    }

    #[test]
    fn runs_without_approval() {
        let tool = GetTodoById::new(Arc::new(TodoSource::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1/todos",
        )));
        assert_eq!(tool.approval_mode(), ApprovalMode::NeverRequire);
    }
}
