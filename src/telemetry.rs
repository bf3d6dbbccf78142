//! Logging and invocation tracing.

use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::{LogFormat, TelemetryConfig};

const DEFAULT_FILTER: &str = "todo_agent=info,tower_http=info";

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to install tracing subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Install the global subscriber. Logs go to stderr so the chat REPL keeps
/// stdout to itself.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    init_with_writer(config, std::io::stderr)
}

fn init_with_writer<W>(config: &TelemetryConfig, writer: W) -> Result<(), TelemetryError>
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(writer))
            .try_init()?,
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_writer(writer))
            .try_init()?,
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_writer(writer))
            .try_init()?,
    }

    tracing::info!(
        service = %config.service_name,
        agent_id = %config.agent_id,
        format = ?config.log_format,
        "Telemetry configured"
    );
    Ok(())
}

/// Span wrapping one agent invocation.
pub fn invocation_span(config: &TelemetryConfig, invocation_id: Uuid, user_id: &str) -> tracing::Span {
    tracing::info_span!(
        "agent.invoke",
        gen_ai.agent.id = %config.agent_id,
        gen_ai.agent.name = %config.service_name,
        invocation_id = %invocation_id,
        user_id = %user_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_reported_not_fatal() {
        let config = TelemetryConfig {
            log_format: LogFormat::Compact,
            ..TelemetryConfig::default()
        };
        // Sink writer keeps the process-wide subscriber quiet for other tests.
        let _ = init_with_writer(&config, std::io::sink);
        assert!(matches!(
            init_with_writer(&config, std::io::sink),
            Err(TelemetryError::Init(_))
        ));
    }
}
