//! Credential strategies for the hosted completion provider.
//!
//! Strategies are tried in a fixed order and the first one whose settings are
//! complete builds the client:
//! 1. API gateway subscription key in front of an Azure OpenAI endpoint
//! 2. Azure OpenAI endpoint with its API key
//! 3. Azure OpenAI endpoint with managed-identity tokens
//! 4. Direct OpenAI API key

mod managed_identity;

pub use managed_identity::{ManagedIdentityCredential, TokenSource, COGNITIVE_SERVICES_RESOURCE};

use std::sync::Arc;

use crate::config::CredentialConfig;
use crate::llm::{azure_chat_url, openai_chat_url, ApiAuth, LlmError, OpenAiClient, SharedLlmClient};

/// One way of authenticating to the completion provider.
pub trait CredentialStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether every setting this strategy needs is present.
    fn is_configured(&self) -> bool;

    /// Build the client. Only called when `is_configured` is true.
    fn build(&self) -> Result<SharedLlmClient, LlmError>;
}

/// Azure OpenAI endpoint fronted by an API gateway subscription key.
pub struct GatewayKeyStrategy {
    http: reqwest::Client,
    model: String,
    endpoint: Option<String>,
    subscription_key: Option<String>,
    api_version: String,
}

impl CredentialStrategy for GatewayKeyStrategy {
    fn name(&self) -> &'static str {
        "gateway-key"
    }

    fn is_configured(&self) -> bool {
        self.endpoint.is_some() && self.subscription_key.is_some()
    }

    fn build(&self) -> Result<SharedLlmClient, LlmError> {
        let (Some(endpoint), Some(key)) = (&self.endpoint, &self.subscription_key) else {
            return Err(LlmError::Auth("gateway endpoint or key missing".to_string()));
        };
        let url = azure_chat_url(endpoint, &self.model, &self.api_version)?;
        Ok(Arc::new(OpenAiClient::new(
            self.http.clone(),
            url,
            self.model.clone(),
            ApiAuth::ApiKeyHeader(key.clone()),
        )))
    }
}

/// Azure OpenAI endpoint with a resource API key.
pub struct EndpointKeyStrategy {
    http: reqwest::Client,
    model: String,
    endpoint: Option<String>,
    api_key: Option<String>,
    api_version: String,
}

impl CredentialStrategy for EndpointKeyStrategy {
    fn name(&self) -> &'static str {
        "endpoint-key"
    }

    fn is_configured(&self) -> bool {
        self.endpoint.is_some() && self.api_key.is_some()
    }

    fn build(&self) -> Result<SharedLlmClient, LlmError> {
        let (Some(endpoint), Some(key)) = (&self.endpoint, &self.api_key) else {
            return Err(LlmError::Auth("endpoint or API key missing".to_string()));
        };
        let url = azure_chat_url(endpoint, &self.model, &self.api_version)?;
        Ok(Arc::new(OpenAiClient::new(
            self.http.clone(),
            url,
            self.model.clone(),
            ApiAuth::ApiKeyHeader(key.clone()),
        )))
    }
}

/// Azure OpenAI endpoint with bearer tokens from a managed identity.
pub struct ManagedIdentityStrategy {
    http: reqwest::Client,
    model: String,
    endpoint: Option<String>,
    api_version: String,
    client_id: Option<String>,
    token_source: TokenSource,
}

impl CredentialStrategy for ManagedIdentityStrategy {
    fn name(&self) -> &'static str {
        "managed-identity"
    }

    fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    fn build(&self) -> Result<SharedLlmClient, LlmError> {
        let Some(endpoint) = &self.endpoint else {
            return Err(LlmError::Auth("endpoint missing".to_string()));
        };
        let url = azure_chat_url(endpoint, &self.model, &self.api_version)?;
        let credential = ManagedIdentityCredential::new(
            self.http.clone(),
            self.token_source.clone(),
            self.client_id.clone(),
        );
        Ok(Arc::new(OpenAiClient::new(
            self.http.clone(),
            url,
            self.model.clone(),
            ApiAuth::TokenProvider(Arc::new(credential)),
        )))
    }
}

/// api.openai.com (or a compatible base URL) with a bearer key.
pub struct OpenAiKeyStrategy {
    http: reqwest::Client,
    model: String,
    api_key: Option<String>,
    base_url: String,
}

impl CredentialStrategy for OpenAiKeyStrategy {
    fn name(&self) -> &'static str {
        "openai-key"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn build(&self) -> Result<SharedLlmClient, LlmError> {
        let Some(key) = &self.api_key else {
            return Err(LlmError::Auth("OpenAI API key missing".to_string()));
        };
        let url = openai_chat_url(&self.base_url)?;
        Ok(Arc::new(OpenAiClient::new(
            self.http.clone(),
            url,
            self.model.clone(),
            ApiAuth::Bearer(key.clone()),
        )))
    }
}

/// The four strategies in precedence order.
pub fn default_strategies(
    credentials: &CredentialConfig,
    model: &str,
    http: &reqwest::Client,
) -> Vec<Box<dyn CredentialStrategy>> {
    vec![
        Box::new(GatewayKeyStrategy {
            http: http.clone(),
            model: model.to_string(),
            endpoint: credentials.azure_endpoint.clone(),
            subscription_key: credentials.apim_subscription_key.clone(),
            api_version: credentials.azure_api_version.clone(),
        }),
        Box::new(EndpointKeyStrategy {
            http: http.clone(),
            model: model.to_string(),
            endpoint: credentials.azure_endpoint.clone(),
            api_key: credentials.azure_api_key.clone(),
            api_version: credentials.azure_api_version.clone(),
        }),
        Box::new(ManagedIdentityStrategy {
            http: http.clone(),
            model: model.to_string(),
            endpoint: credentials.azure_endpoint.clone(),
            api_version: credentials.azure_api_version.clone(),
            client_id: credentials.managed_identity_client_id.clone(),
            token_source: TokenSource::detect(
                credentials.identity_endpoint.as_deref(),
                credentials.identity_header.as_deref(),
            ),
        }),
        Box::new(OpenAiKeyStrategy {
            http: http.clone(),
            model: model.to_string(),
            api_key: credentials.openai_api_key.clone(),
            base_url: credentials.openai_base_url.clone(),
        }),
    ]
}

/// First configured strategy, if any.
pub fn select_strategy(
    strategies: &[Box<dyn CredentialStrategy>],
) -> Option<&dyn CredentialStrategy> {
    strategies
        .iter()
        .map(|s| &**s)
        .find(|s| s.is_configured())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selected(credentials: CredentialConfig) -> Option<&'static str> {
        let strategies = default_strategies(&credentials, "gpt-4o-mini", &reqwest::Client::new());
        select_strategy(&strategies).map(|s| s.name())
    }

    fn azure() -> CredentialConfig {
        CredentialConfig {
            azure_endpoint: Some("https://example.openai.azure.com".to_string()),
            ..CredentialConfig::default()
        }
    }

    #[test]
    fn nothing_configured_selects_nothing() {
        assert_eq!(selected(CredentialConfig::default()), None);
    }

    #[test]
    fn gateway_key_wins_over_everything() {
        let credentials = CredentialConfig {
            apim_subscription_key: Some("sub".to_string()),
            azure_api_key: Some("key".to_string()),
            openai_api_key: Some("sk".to_string()),
            ..azure()
        };
        assert_eq!(selected(credentials), Some("gateway-key"));
    }

    #[test]
    fn endpoint_key_beats_managed_identity() {
        let credentials = CredentialConfig {
            azure_api_key: Some("key".to_string()),
            ..azure()
        };
        assert_eq!(selected(credentials), Some("endpoint-key"));
    }

    #[test]
    fn endpoint_alone_uses_managed_identity_even_with_openai_key() {
        let credentials = CredentialConfig {
            openai_api_key: Some("sk".to_string()),
            ..azure()
        };
        assert_eq!(selected(credentials), Some("managed-identity"));
    }

    #[test]
    fn openai_key_alone_uses_direct_strategy() {
        let credentials = CredentialConfig {
            openai_api_key: Some("sk".to_string()),
            apim_subscription_key: Some("orphan".to_string()),
            ..CredentialConfig::default()
        };
        assert_eq!(selected(credentials), Some("openai-key"));
    }

    #[test]
    fn built_clients_carry_the_model() {
        let credentials = CredentialConfig {
            azure_api_key: Some("key".to_string()),
            ..azure()
        };
        let strategies = default_strategies(&credentials, "my-deployment", &reqwest::Client::new());
        let client = select_strategy(&strategies).unwrap().build().unwrap();
        assert_eq!(client.model(), "my-deployment");
    }

    #[test]
    fn malformed_endpoint_fails_to_build() {
        let credentials = CredentialConfig {
            azure_endpoint: Some("not a url".to_string()),
            azure_api_key: Some("key".to_string()),
            ..CredentialConfig::default()
        };
        let strategies = default_strategies(&credentials, "gpt-4o-mini", &reqwest::Client::new());
        assert!(matches!(
            select_strategy(&strategies).unwrap().build(),
            Err(LlmError::Endpoint(_))
        ));
    }
}
