//! System prompt and conversation flattening.

use serde::{Deserialize, Serialize};

const SYSTEM_PROMPT: &str = r#"You are a helpful Todo Assistant agent. You help users query and understand their todo items.

You have been provided with a list of todos from the JSONPlaceholder API. Use this data to answer user questions.

You also have a tool to fetch specific todo details by ID:
- Use the get_todo_by_id tool when a user asks for a specific todo (e.g., "get todo 5", "show me todo #42")

When users ask about todos, tasks, or to-do items:
1. For specific todo requests by ID, use the get_todo_by_id tool
2. For general queries, reference the provided todo data
3. You can filter, search, and summarize the todos
4. Each todo has: id, userId, title, and completed status (✓ = completed, ○ = not completed)

Examples of what you can help with:
- "Get todo 5" → Use the tool to fetch todo with ID 5
- "Show me completed todos" → Filter from provided data
- "What todos does user 1 have?" → Filter by userId
- "How many todos are incomplete?" → Count todos by status

Provide clear, formatted responses. Be helpful, concise, and proactive in suggesting insights about the todos."#;

/// Speaker of a prior turn. Unrecognized roles are kept but not replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
    #[serde(other)]
    Other,
}

/// One prior message of a conversation, owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// Agent instructions with the todo context block appended.
pub fn build_instructions(todos_context: &str) -> String {
    format!("{}\n\n--- TODO DATA ---\n{}", SYSTEM_PROMPT, todos_context)
}

/// Flatten prior turns into a transcript and append the new message.
///
/// The model receives this as a single user message rather than as
/// structured history.
pub fn build_prompt(history: &[ChatTurn], user_message: &str) -> String {
    let mut prompt = String::new();
    for turn in history {
        match turn.role {
            TurnRole::User => {
                prompt.push_str("User: ");
                prompt.push_str(&turn.content);
                prompt.push('\n');
            }
            TurnRole::Assistant => {
                prompt.push_str("Assistant: ");
                prompt.push_str(&turn.content);
                prompt.push('\n');
            }
            TurnRole::Other => {}
        }
    }
    prompt.push_str(user_message);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instructions_embed_todo_block() {
        let instructions = build_instructions("No todos available.");
        assert!(instructions.starts_with("You are a helpful Todo Assistant agent."));
        assert!(instructions.ends_with("\n\n--- TODO DATA ---\nNo todos available."));
    }

    #[test]
    fn empty_history_is_just_the_message() {
        assert_eq!(build_prompt(&[], "get todo 5"), "get todo 5");
    }

    #[test]
    fn history_is_prefixed_in_order() {
        let history = vec![
            ChatTurn::user("hi"),
            ChatTurn::assistant("hello!"),
            ChatTurn::user("how many todos?"),
            ChatTurn::assistant("200"),
        ];
        assert_eq!(
            build_prompt(&history, "and completed?"),
            "User: hi\nAssistant: hello!\nUser: how many todos?\nAssistant: 200\nand completed?"
        );
    }

    #[test]
    fn unknown_roles_are_skipped() {
        let history: Vec<ChatTurn> = serde_json::from_str(
            r#"[{"role":"system","content":"ignored"},{"role":"user","content":"hi"}]"#,
        )
        .unwrap();
        assert_eq!(history[0].role, TurnRole::Other);
        assert_eq!(build_prompt(&history, "next"), "User: hi\nnext");
    }
}
