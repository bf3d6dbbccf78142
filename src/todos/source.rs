//! Read-through access to the upstream todo API.
//!
//! The full list is fetched once and kept for the life of the source. A failed
//! list fetch is not cached, so the next caller tries again. Single-item
//! lookups always go to the network.

use std::ops::RangeInclusive;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;
use tokio::sync::OnceCell;

use super::Todo;

/// Timeout applied to every call against the todo API.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Ids served by the upstream fixture data. Informational only, not enforced.
pub const VALID_ID_RANGE: RangeInclusive<u64> = 1..=200;

/// Failure to load the todo list.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("API returned status {0}")]
    Status(StatusCode),

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Failure to look up a single todo. `Display` is the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error(
        "Todo with ID {id} not found. Valid IDs are {}-{}.",
        VALID_ID_RANGE.start(),
        VALID_ID_RANGE.end()
    )]
    NotFound { id: i64 },

    #[error("Error: API returned status {}", .status.as_u16())]
    Status { status: StatusCode },

    #[error("Error fetching todo {id}: {message}")]
    Fetch { id: i64, message: String },
}

/// Todo API client with a process-lifetime list cache.
#[derive(Debug)]
pub struct TodoSource {
    http: reqwest::Client,
    list_url: String,
    cache: OnceCell<Vec<Todo>>,
}

impl TodoSource {
    pub fn new(http: reqwest::Client, list_url: impl Into<String>) -> Self {
        Self {
            http,
            list_url: list_url.into(),
            cache: OnceCell::new(),
        }
    }

    /// The configured list endpoint.
    pub fn list_url(&self) -> &str {
        &self.list_url
    }

    /// Return every todo, fetching the list on first successful use.
    ///
    /// Degrades to an empty slice when the upstream is unavailable; the agent
    /// keeps working without context in that case.
    ///
    /// Only a successful fetch is published. Concurrent callers that find the
    /// cache empty fetch independently, so a slow failing upstream costs each
    /// of them one timeout at most.
    pub async fn fetch_all(&self) -> &[Todo] {
        if let Some(todos) = self.cache.get() {
            return todos.as_slice();
        }

        match self.fetch_list().await {
            // The first successful fill wins; later ones are identical.
            Ok(todos) => self.cache.get_or_init(|| async move { todos }).await.as_slice(),
            Err(e) => {
                tracing::error!(url = %self.list_url, error = %e, "Error fetching todos");
                &[]
            }
        }
    }

    async fn fetch_list(&self) -> Result<Vec<Todo>, FetchError> {
        let response = self
            .http
            .get(&self.list_url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status));
        }

        let todos: Vec<Todo> = response.json().await.map_err(FetchError::Decode)?;
        tracing::info!(count = todos.len(), "Fetched todos from API");
        Ok(todos)
    }

    /// Fetch one todo by id, bypassing the list cache.
    pub async fn fetch_one(&self, id: i64) -> Result<Todo, LookupError> {
        let url = self.item_url(id);

        let response = self
            .http
            .get(&url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(todo_id = id, error = %e, "Error fetching todo");
                LookupError::Fetch {
                    id,
                    message: e.to_string(),
                }
            })?;

        match response.status() {
            StatusCode::OK => response.json::<Todo>().await.map_err(|e| {
                tracing::error!(todo_id = id, error = %e, "Invalid todo body");
                LookupError::Fetch {
                    id,
                    message: e.to_string(),
                }
            }),
            StatusCode::NOT_FOUND => Err(LookupError::NotFound { id }),
            status => Err(LookupError::Status { status }),
        }
    }

    /// Per-item URL: the list URL with a trailing `/todos` removed, then `/todos/{id}`.
    pub fn item_url(&self, id: i64) -> String {
        let trimmed = self.list_url.trim_end_matches('/');
        let base = trimmed.strip_suffix("/todos").unwrap_or(trimmed);
        format!("{}/todos/{}", base.trim_end_matches('/'), id)
    }
}
