//! Todo data: the upstream record type, the caching source and the prompt formatter.

mod format;
mod source;

pub use format::{format_todos_for_context, DEFAULT_CONTEXT_LIMIT, NO_TODOS};
pub use source::{FetchError, LookupError, TodoSource, VALID_ID_RANGE};

use serde::{Deserialize, Serialize};

/// A single todo record as served by the upstream API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: u64,

    #[serde(rename = "userId")]
    pub user_id: u64,

    pub title: String,

    pub completed: bool,
}

impl Todo {
    /// Status glyph used in prompt context and tool output.
    pub fn glyph(&self) -> &'static str {
        if self.completed {
            "✓"
        } else {
            "○"
        }
    }
}
