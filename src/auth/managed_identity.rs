//! Managed-identity bearer tokens for Azure-hosted deployments.
//!
//! Uses the platform token endpoint (`IDENTITY_ENDPOINT` + `IDENTITY_HEADER`)
//! when the host injects one, otherwise the instance metadata service.
//! Tokens are cached until shortly before they expire.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::llm::{LlmError, TokenProvider};

/// Resource tokens are requested for.
pub const COGNITIVE_SERVICES_RESOURCE: &str = "https://cognitiveservices.azure.com";

const IMDS_TOKEN_URL: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const IMDS_API_VERSION: &str = "2018-02-01";
const APP_SERVICE_API_VERSION: &str = "2019-08-01";

/// Refresh this long before the reported expiry.
const REFRESH_MARGIN: Duration = Duration::from_secs(300);

/// Lifetime assumed when the endpoint reports none.
const DEFAULT_LIFETIME: Duration = Duration::from_secs(3600);

const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where tokens come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// Platform-injected endpoint guarded by a secret header
    AppService { endpoint: String, secret: String },
    /// Instance metadata service
    Imds { endpoint: String },
}

impl TokenSource {
    /// Platform endpoint when both parts are present, otherwise IMDS.
    pub fn detect(identity_endpoint: Option<&str>, identity_header: Option<&str>) -> Self {
        match (identity_endpoint, identity_header) {
            (Some(endpoint), Some(secret)) => Self::AppService {
                endpoint: endpoint.to_string(),
                secret: secret.to_string(),
            },
            _ => Self::Imds {
                endpoint: IMDS_TOKEN_URL.to_string(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<Value>,
    #[serde(default)]
    expires_on: Option<Value>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Token provider backed by a managed identity.
#[derive(Debug)]
pub struct ManagedIdentityCredential {
    http: reqwest::Client,
    source: TokenSource,
    resource: String,
    client_id: Option<String>,
    cached: Mutex<Option<CachedToken>>,
}

impl ManagedIdentityCredential {
    pub fn new(http: reqwest::Client, source: TokenSource, client_id: Option<String>) -> Self {
        Self {
            http,
            source,
            resource: COGNITIVE_SERVICES_RESOURCE.to_string(),
            client_id,
            cached: Mutex::new(None),
        }
    }

    async fn request_token(&self) -> Result<CachedToken, LlmError> {
        let mut query: Vec<(&str, &str)> = vec![("resource", self.resource.as_str())];
        if let Some(client_id) = &self.client_id {
            query.push(("client_id", client_id.as_str()));
        }

        let request = match &self.source {
            TokenSource::AppService { endpoint, secret } => {
                query.push(("api-version", APP_SERVICE_API_VERSION));
                self.http
                    .get(endpoint)
                    .header("X-IDENTITY-HEADER", secret)
                    .query(&query)
            }
            TokenSource::Imds { endpoint } => {
                query.push(("api-version", IMDS_API_VERSION));
                self.http
                    .get(endpoint)
                    .header("Metadata", "true")
                    .query(&query)
            }
        };

        let response = request
            .timeout(TOKEN_REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| LlmError::Auth(format!("token endpoint unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Auth(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Auth(format!("invalid token response: {}", e)))?;

        let lifetime = lifetime_from(&parsed).unwrap_or(DEFAULT_LIFETIME);
        tracing::debug!(lifetime_secs = lifetime.as_secs(), "Acquired managed identity token");

        // Reported lifetimes are untrusted; one past the clock's range falls
        // back to the default.
        let now = Instant::now();
        let expires_at = now
            .checked_add(lifetime)
            .unwrap_or_else(|| now + DEFAULT_LIFETIME);

        Ok(CachedToken {
            token: parsed.access_token,
            expires_at,
        })
    }
}

#[async_trait]
impl TokenProvider for ManagedIdentityCredential {
    async fn token(&self) -> Result<String, LlmError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + REFRESH_MARGIN {
                return Ok(token.token.clone());
            }
        }

        let fresh = self.request_token().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}

/// Seconds value that may arrive as a JSON number or a numeric string.
fn seconds(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lifetime_from(response: &TokenResponse) -> Option<Duration> {
    if let Some(secs) = response.expires_in.as_ref().and_then(seconds) {
        return Some(Duration::from_secs(secs));
    }
    let expires_on = response.expires_on.as_ref().and_then(seconds)?;
    let now = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_secs();
    Some(Duration::from_secs(expires_on.saturating_sub(now)))
}
