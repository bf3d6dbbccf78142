//! HTTP API for the todo agent.
//!
//! ## Endpoints
//!
//! - `GET /`, `GET /health` - service health
//! - `POST /chat` - buffered JSON reply, or plain streamed text with `stream: true`
//! - `POST /chat/stream` - Server-Sent Events, `?metadata=true` adds a metadata event

mod chat;
mod routes;
pub mod types;

pub use routes::{router, serve, AppState};
