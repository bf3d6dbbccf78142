//! OpenAI-compatible streaming chat-completions client.
//!
//! Covers both api.openai.com style endpoints (bearer key) and Azure OpenAI
//! deployment endpoints (`api-key` header or Entra ID bearer tokens).

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::RequestBuilder;
use reqwest_eventsource::{Event, EventSource};
use url::Url;

use super::{
    decode_chunk, ChatMessage, ChatStream, LlmClient, LlmError, TokenProvider, ToolDefinition,
};

/// How requests are authenticated.
#[derive(Clone)]
pub enum ApiAuth {
    /// `api-key: <key>` header (Azure OpenAI keys, API gateway subscription keys)
    ApiKeyHeader(String),
    /// `Authorization: Bearer <key>` with a static key
    Bearer(String),
    /// `Authorization: Bearer <token>` with a token fetched per request
    TokenProvider(Arc<dyn TokenProvider>),
}

impl std::fmt::Debug for ApiAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKeyHeader(_) => write!(f, "ApiKeyHeader(..)"),
            Self::Bearer(_) => write!(f, "Bearer(..)"),
            Self::TokenProvider(_) => write!(f, "TokenProvider(..)"),
        }
    }
}

/// Chat-completions URL for an Azure OpenAI deployment.
pub fn azure_chat_url(
    endpoint: &str,
    deployment: &str,
    api_version: &str,
) -> Result<String, LlmError> {
    let base = endpoint.trim_end_matches('/');
    let mut url = Url::parse(&format!(
        "{}/openai/deployments/{}/chat/completions",
        base, deployment
    ))
    .map_err(|e| LlmError::Endpoint(format!("{}: {}", endpoint, e)))?;
    url.query_pairs_mut().append_pair("api-version", api_version);
    Ok(url.into())
}

/// Chat-completions URL under an OpenAI-style base URL.
pub fn openai_chat_url(base_url: &str) -> Result<String, LlmError> {
    let url = Url::parse(&format!(
        "{}/chat/completions",
        base_url.trim_end_matches('/')
    ))
    .map_err(|e| LlmError::Endpoint(format!("{}: {}", base_url, e)))?;
    Ok(url.into())
}

/// Streaming client for one completions URL and model.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    url: String,
    model: String,
    auth: ApiAuth,
}

impl OpenAiClient {
    pub fn new(
        http: reqwest::Client,
        url: impl Into<String>,
        model: impl Into<String>,
        auth: ApiAuth,
    ) -> Self {
        Self {
            http,
            url: url.into(),
            model: model.into(),
            auth,
        }
    }

    fn build_request_body(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": true,
        });
        if !tools.is_empty() {
            body["tools"] = serde_json::json!(tools);
            body["tool_choice"] = serde_json::json!("auto");
        }
        body
    }

    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, LlmError> {
        Ok(match &self.auth {
            ApiAuth::ApiKeyHeader(key) => request.header("api-key", key),
            ApiAuth::Bearer(key) => request.bearer_auth(key),
            ApiAuth::TokenProvider(provider) => request.bearer_auth(provider.token().await?),
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn chat_stream(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatStream, LlmError> {
        let body = self.build_request_body(messages, tools);
        tracing::debug!(
            url = %self.url,
            model = %self.model,
            messages = messages.len(),
            tools = tools.len(),
            "Starting chat completion stream"
        );

        let request = self.authorize(self.http.post(&self.url).json(&body)).await?;
        let mut source =
            EventSource::new(request).map_err(|e| LlmError::Stream(e.to_string()))?;

        let stream = async_stream::stream! {
            while let Some(event) = source.next().await {
                match event {
                    Ok(Event::Open) => {}
                    Ok(Event::Message(message)) => {
                        if message.data.trim() == "[DONE]" {
                            break;
                        }
                        match decode_chunk(&message.data) {
                            Ok(chunks) => {
                                for chunk in chunks {
                                    yield Ok(chunk);
                                }
                            }
                            Err(e) => {
                                yield Err(e);
                                break;
                            }
                        }
                    }
                    Err(reqwest_eventsource::Error::StreamEnded) => break,
                    Err(err) => {
                        yield Err(describe_stream_error(err).await);
                        break;
                    }
                }
            }
            // EventSource reconnects on its own unless closed.
            source.close();
        };

        Ok(stream.boxed())
    }
}

async fn describe_stream_error(err: reqwest_eventsource::Error) -> LlmError {
    match err {
        reqwest_eventsource::Error::InvalidStatusCode(status, response) => LlmError::Api {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        },
        reqwest_eventsource::Error::InvalidContentType(content_type, response) => {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            LlmError::Api {
                status,
                body: format!(
                    "unexpected content type {:?}: {}",
                    content_type.to_str().unwrap_or("<binary>"),
                    body
                ),
            }
        }
        reqwest_eventsource::Error::Transport(e) => LlmError::Http(e),
        other => LlmError::Stream(other.to_string()),
    }
}
