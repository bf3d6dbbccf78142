//! Items produced by an agent invocation.

use serde::{Deserialize, Serialize};

/// Prefix that marks the metadata trailer in the flat fragment encoding.
pub const METADATA_PREFIX: &str = "\n__METADATA__:";

/// Framework tag reported in metadata and API responses.
pub const FRAMEWORK: &str = "todo-agent";

/// Summary emitted once after a successful invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationMetadata {
    pub model: String,
    pub framework: String,
    pub api_url: String,
    pub todos_loaded: usize,
    pub user_id: String,
}

/// One item of an invocation stream.
///
/// Text items arrive in generation order. A stream ends with either exactly
/// one `Metadata` (success) or exactly one `Error` (failure), never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentOutput {
    Text(String),
    Error(String),
    Metadata(InvocationMetadata),
}

impl AgentOutput {
    /// Text shown to the user; `None` for metadata.
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            Self::Error(message) => Some(format!("Error: {}", message)),
            Self::Metadata(_) => None,
        }
    }

    pub fn is_metadata(&self) -> bool {
        matches!(self, Self::Metadata(_))
    }
}

/// Flat fragment encoding: text as-is, errors as `Error: ...`, metadata as
/// the prefixed JSON trailer.
impl std::fmt::Display for AgentOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Error(message) => write!(f, "Error: {}", message),
            Self::Metadata(metadata) => {
                let json = serde_json::to_string(metadata).map_err(|_| std::fmt::Error)?;
                write!(f, "{}{}", METADATA_PREFIX, json)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> InvocationMetadata {
        InvocationMetadata {
            model: "gpt-4o-mini".to_string(),
            framework: FRAMEWORK.to_string(),
            api_url: "https://jsonplaceholder.typicode.com/todos".to_string(),
            todos_loaded: 200,
            user_id: "anonymous".to_string(),
        }
    }

    #[test]
    fn metadata_trailer_is_prefixed_json() {
        let fragment = AgentOutput::Metadata(metadata()).to_string();
        let json = fragment.strip_prefix(METADATA_PREFIX).expect("prefixed");
        let parsed: InvocationMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, metadata());
    }

    #[test]
    fn error_renders_with_prefix() {
        let output = AgentOutput::Error("boom".to_string());
        assert_eq!(output.to_string(), "Error: boom");
        assert_eq!(output.into_text().as_deref(), Some("Error: boom"));
    }

    #[test]
    fn metadata_has_no_text() {
        let output = AgentOutput::Metadata(metadata());
        assert!(output.is_metadata());
        assert_eq!(output.into_text(), None);
    }
}
