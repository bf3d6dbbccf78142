//! Todo Agent - entry point
//!
//! Serves the HTTP API (default) or runs the interactive chat.

use clap::{Parser, Subcommand};
use todo_agent::{agent::Agent, api, cli, config::Config, telemetry};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "todo-agent", version, about = "Conversational assistant over a todo list")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API
    Serve {
        /// Bind address, overrides HOST
        #[arg(long)]
        host: Option<String>,

        /// Bind port, overrides PORT
        #[arg(long)]
        port: Option<u16>,
    },
    /// Chat interactively on stdin/stdout
    Chat {
        /// Print invocation metadata after each reply
        #[arg(long, default_value_t = false)]
        show_metadata: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is normal outside local development.
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    if let Err(e) = telemetry::init(&config.telemetry) {
        warn!(error = %e, "Failed to configure telemetry");
    }
    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    let http = reqwest::Client::builder()
        .user_agent(concat!("todo-agent/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let agent = Agent::new(&config, http);
    info!(
        model = %config.model,
        todo_api_url = %config.todo_api_url,
        "Loaded configuration"
    );

    match cli.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
    }) {
        Command::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.host.clone());
            let port = port.unwrap_or(config.port);
            api::serve(&host, port, agent).await?;
        }
        Command::Chat { show_metadata } => {
            if let Err(e) = agent.ensure_ready().await {
                warn!(error = %e, "Completion client not ready; replies will report the error");
            }
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            cli::run_repl(&agent, stdin, tokio::io::stdout(), show_metadata).await?;
        }
    }

    Ok(())
}
