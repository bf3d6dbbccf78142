//! Configuration management for the todo agent.
//!
//! Configuration is read from environment variables (a `.env` file is loaded
//! into the environment by the binary before this runs):
//! - `TODO_API_URL` - Optional. Todo list endpoint. Defaults to the JSONPlaceholder todos.
//! - `AZURE_AI_MODEL_DEPLOYMENT_NAME` - Optional. Model / deployment name. Defaults to `gpt-4o-mini`.
//! - `AZURE_OPENAI_ENDPOINT` - Optional. Hosted model endpoint for the Azure strategies.
//! - `APIM_SUBSCRIPTION_KEY` - Optional. Gateway subscription key (with the endpoint).
//! - `AZURE_OPENAI_API_KEY` - Optional. Endpoint API key (with the endpoint).
//! - `AZURE_OPENAI_API_VERSION` - Optional. Defaults to `2024-05-01-preview`.
//! - `AZURE_CLIENT_ID` - Optional. User-assigned managed identity client id.
//! - `IDENTITY_ENDPOINT`, `IDENTITY_HEADER` - Optional. Set by the hosting platform for managed identity.
//! - `OPENAI_API_KEY` - Optional. Direct OpenAI API key.
//! - `OPENAI_BASE_URL` - Optional. Defaults to `https://api.openai.com/v1`.
//! - `HOST` - Optional. Server host. Defaults to `0.0.0.0`.
//! - `PORT` - Optional. Server port. Defaults to `8080`.
//! - `MAX_TOOL_ROUNDS` - Optional. Tool-call rounds per invocation. Defaults to `8`.
//! - `OTEL_SERVICE_NAME`, `AGENT_ID`, `ENABLE_SENSITIVE_DATA`, `LOG_FORMAT` - telemetry.
//!
//! None of the credential variables is individually required; the agent
//! session reports a configuration error when no strategy is usable.

use thiserror::Error;

pub const DEFAULT_TODO_API_URL: &str = "https://jsonplaceholder.typicode.com/todos";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-05-01-preview";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Credential material for the hosted completion provider.
///
/// Every field is optional; which ones are present decides the strategy.
#[derive(Debug, Clone)]
pub struct CredentialConfig {
    /// Azure OpenAI / Foundry model endpoint
    pub azure_endpoint: Option<String>,

    /// Gateway (API Management) subscription key
    pub apim_subscription_key: Option<String>,

    /// Azure OpenAI API key
    pub azure_api_key: Option<String>,

    /// Azure OpenAI REST API version
    pub azure_api_version: String,

    /// Client id of a user-assigned managed identity
    pub managed_identity_client_id: Option<String>,

    /// Platform token endpoint (App Service / Container Apps)
    pub identity_endpoint: Option<String>,

    /// Secret header value for the platform token endpoint
    pub identity_header: Option<String>,

    /// Direct OpenAI API key
    pub openai_api_key: Option<String>,

    /// Base URL for the direct OpenAI strategy
    pub openai_base_url: String,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            azure_endpoint: None,
            apim_subscription_key: None,
            azure_api_key: None,
            azure_api_version: DEFAULT_AZURE_API_VERSION.to_string(),
            managed_identity_client_id: None,
            identity_endpoint: None,
            identity_header: None,
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

/// Telemetry configuration.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name stamped on the invocation span
    pub service_name: String,

    /// Agent identifier stamped on the invocation span
    pub agent_id: String,

    /// Whether prompts and completions may be recorded in debug events
    pub enable_sensitive_data: bool,

    /// Output format of the subscriber
    pub log_format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "todo-agent".to_string(),
            agent_id: "TodoAgent".to_string(),
            enable_sensitive_data: true,
            log_format: LogFormat::Pretty,
        }
    }
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Todo list endpoint
    pub todo_api_url: String,

    /// Model identifier (Azure deployment name or OpenAI model)
    pub model: String,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Maximum tool-call rounds per invocation
    pub max_tool_rounds: usize,

    /// Provider credentials
    pub credentials: CredentialConfig,

    /// Telemetry settings
    pub telemetry: TelemetryConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric or boolean variable is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let todo_api_url =
            env_non_empty("TODO_API_URL").unwrap_or_else(|| DEFAULT_TODO_API_URL.to_string());

        let model = env_non_empty("AZURE_AI_MODEL_DEPLOYMENT_NAME")
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let host = env_non_empty("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = env_non_empty("PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;

        let max_tool_rounds = env_non_empty("MAX_TOOL_ROUNDS")
            .unwrap_or_else(|| "8".to_string())
            .parse()
            .map_err(|e| {
                ConfigError::InvalidValue("MAX_TOOL_ROUNDS".to_string(), format!("{}", e))
            })?;

        let credentials = CredentialConfig {
            azure_endpoint: env_non_empty("AZURE_OPENAI_ENDPOINT"),
            apim_subscription_key: env_non_empty("APIM_SUBSCRIPTION_KEY"),
            azure_api_key: env_non_empty("AZURE_OPENAI_API_KEY"),
            azure_api_version: env_non_empty("AZURE_OPENAI_API_VERSION")
                .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string()),
            managed_identity_client_id: env_non_empty("AZURE_CLIENT_ID"),
            identity_endpoint: env_non_empty("IDENTITY_ENDPOINT"),
            identity_header: env_non_empty("IDENTITY_HEADER"),
            openai_api_key: env_non_empty("OPENAI_API_KEY"),
            openai_base_url: env_non_empty("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
        };

        let enable_sensitive_data = env_non_empty("ENABLE_SENSITIVE_DATA")
            .map(|v| {
                parse_bool(&v)
                    .map_err(|e| ConfigError::InvalidValue("ENABLE_SENSITIVE_DATA".to_string(), e))
            })
            .transpose()?
            .unwrap_or(true);

        let log_format = env_non_empty("LOG_FORMAT")
            .map(|v| {
                parse_log_format(&v)
                    .map_err(|e| ConfigError::InvalidValue("LOG_FORMAT".to_string(), e))
            })
            .transpose()?
            .unwrap_or(LogFormat::Pretty);

        let telemetry = TelemetryConfig {
            service_name: env_non_empty("OTEL_SERVICE_NAME")
                .unwrap_or_else(|| "todo-agent".to_string()),
            agent_id: env_non_empty("AGENT_ID").unwrap_or_else(|| "TodoAgent".to_string()),
            enable_sensitive_data,
            log_format,
        };

        Ok(Self {
            todo_api_url,
            model,
            host,
            port,
            max_tool_rounds,
            credentials,
            telemetry,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(todo_api_url: String, model: String, credentials: CredentialConfig) -> Self {
        Self {
            todo_api_url,
            model,
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_tool_rounds: 8,
            credentials,
            telemetry: TelemetryConfig::default(),
        }
    }
}

/// Read an environment variable, treating empty or whitespace-only values as unset.
fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        other => Err(format!("expected boolean-like value, got: {}", other)),
    }
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    match value.trim().to_lowercase().as_str() {
        "pretty" | "text" => Ok(LogFormat::Pretty),
        "compact" => Ok(LogFormat::Compact),
        "json" => Ok(LogFormat::Json),
        other => Err(format!("expected pretty, compact or json, got: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert_eq!(parse_bool("TRUE"), Ok(true));
        assert_eq!(parse_bool(" on "), Ok(true));
        assert_eq!(parse_bool("0"), Ok(false));
        assert_eq!(parse_bool("no"), Ok(false));
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn parse_log_format_is_case_insensitive() {
        assert_eq!(parse_log_format("JSON"), Ok(LogFormat::Json));
        assert_eq!(parse_log_format("compact"), Ok(LogFormat::Compact));
        assert_eq!(parse_log_format("text"), Ok(LogFormat::Pretty));
        assert!(parse_log_format("xml").is_err());
    }

    #[test]
    fn new_config_has_no_credentials() {
        let config = Config::new(
            DEFAULT_TODO_API_URL.to_string(),
            DEFAULT_MODEL.to_string(),
            CredentialConfig::default(),
        );
        assert!(config.credentials.azure_endpoint.is_none());
        assert!(config.credentials.openai_api_key.is_none());
        assert_eq!(config.credentials.azure_api_version, DEFAULT_AZURE_API_VERSION);
        assert_eq!(config.max_tool_rounds, 8);
    }
}
