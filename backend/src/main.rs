mod api;
mod errors;
mod models;
mod state;

use crate::errors::ApiError;
use crate::state::AppState;
use clap::{Args, Parser, Subcommand};
use registry_tree::config::AppConfig;
use registry_tree::solidity::SolidityConfig;
use registry_tree::RegistryTreeReader;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "backend",
    about = "Registry tree service for development groups",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Used when no subcommand is given.
    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Debug, Args)]
struct ServeArgs {
    #[arg(long, env = "BACKEND_ADDR", default_value = "127.0.0.1:8080")]
    addr: String,

    /// App config file (or inline JSON) whose groups the GET routes serve.
    #[arg(long, env = "REGISTRY_CONFIG")]
    config: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API.
    Serve(ServeArgs),
    /// Print the registry root of an app config's custom groups.
    Root {
        #[arg(long)]
        config: String,
    },
    /// Print the ABI-encoded Solidity configuration tuple of an app config.
    SolidityConfig {
        #[arg(long)]
        config: String,

        /// Print the decoded fields as JSON alongside the encoding.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve(cli.serve)) {
        Command::Serve(ServeArgs { addr, config }) => serve(addr, config).await,
        Command::Root { config } => {
            let config = AppConfig::load(&config)?;
            let root = tokio::task::spawn_blocking(move || {
                RegistryTreeReader::new(config.groups().to_vec()).registry_root()
            })
            .await
            .map_err(|_| ApiError::Internal)??;
            println!("{root}");
            Ok(())
        }
        Command::SolidityConfig { config, json } => {
            let config = AppConfig::load(&config)?;
            let solidity = tokio::task::spawn_blocking(move || SolidityConfig::from_app_config(&config))
                .await
                .map_err(|_| ApiError::Internal)??;
            if json {
                let out = serde_json::to_string_pretty(&solidity.to_json()).map_err(|_| ApiError::Internal)?;
                println!("{out}");
            } else {
                println!("{}", solidity.encode());
            }
            Ok(())
        }
    }
}

async fn serve(addr: String, config: Option<String>) -> Result<(), ApiError> {
    let config = config.as_deref().map(AppConfig::load).transpose()?;
    match &config {
        Some(c) => tracing::info!(app_id = %c.app_id, groups = c.groups().len(), "loaded registry config"),
        None => tracing::warn!("no REGISTRY_CONFIG set, only POST routes are usable"),
    }

    let state = AppState::new(config);

    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|_| ApiError::Internal)?;

    tracing::info!(%addr, "backend listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|_| ApiError::Internal)?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::warn!("failed to install ctrl-c handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_invocation_takes_serve_args() {
        let cli = Cli::try_parse_from(["backend", "--addr", "0.0.0.0:9000"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.serve.addr, "0.0.0.0:9000");
    }

    #[test]
    fn serve_subcommand_takes_the_same_args() {
        let cli = Cli::try_parse_from(["backend", "serve", "--addr", "0.0.0.0:9000", "--config", "{}"]).unwrap();
        match cli.command {
            Some(Command::Serve(args)) => {
                assert_eq!(args.addr, "0.0.0.0:9000");
                assert_eq!(args.config.as_deref(), Some("{}"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
