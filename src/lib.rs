//! # Todo Agent
//!
//! A conversational assistant over a remote todo list.
//!
//! This library provides:
//! - A cached client for the upstream todo REST API
//! - A `get_todo_by_id` tool the model can call mid-conversation
//! - A streaming agent loop over any OpenAI-compatible completion endpoint
//! - An HTTP API (JSON, plain-text streaming and SSE) and an interactive CLI
//!
//! ## Architecture
//!
//! Each invocation:
//! 1. Builds the completion client on first use from the configured credentials
//! 2. Loads the todo list (cached after the first success) into the instructions
//! 3. Streams the completion, executing tool calls and feeding results back
//! 4. Ends with invocation metadata, or a single error fragment on failure
//!
//! ## Example
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use todo_agent::{agent::Agent, config::Config};
//!
//! let config = Config::from_env()?;
//! let agent = Agent::new(&config, reqwest::Client::new());
//! let mut outputs = agent.invoke("How many todos are incomplete?", &[], None);
//! while let Some(output) = outputs.next().await {
//!     println!("{}", output);
//! }
//! ```

pub mod api;
pub mod agent;
pub mod auth;
pub mod cli;
pub mod config;
pub mod llm;
pub mod pipeline;
pub mod telemetry;
pub mod todos;
pub mod tools;

pub use config::Config;
