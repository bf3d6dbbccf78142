//! Renders todos as a compact text block for the model prompt.

use super::Todo;

/// Number of todos included in the prompt context by default.
pub const DEFAULT_CONTEXT_LIMIT: usize = 50;

/// Context text used when no todos could be loaded.
pub const NO_TODOS: &str = "No todos available.";

/// Format the first `limit` todos, in source order, as prompt context.
pub fn format_todos_for_context(todos: &[Todo], limit: usize) -> String {
    if todos.is_empty() {
        return NO_TODOS.to_string();
    }

    let shown = &todos[..limit.min(todos.len())];

    let mut lines = Vec::with_capacity(shown.len() + 2);
    lines.push(format!(
        "Available Todos ({} of {} shown):",
        shown.len(),
        todos.len()
    ));
    lines.push("-".repeat(50));

    for todo in shown {
        lines.push(format!(
            "{} [ID:{}] (User {}) {}",
            todo.glyph(),
            todo.id,
            todo.user_id,
            todo.title
        ));
    }

    lines.join("\n")
}
