//! pixelstash -- serverless image metadata pipeline.
//!
//! `pixelstash lambda --handler <kind>` runs one handler under the Lambda
//! runtime.  `pixelstash serve` runs every handler behind a local HTTP
//! server for development.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pixelstash::config::{resolve_config, LoggingConfig};
use pixelstash::lambda::HandlerKind;

/// Command-line arguments for pixelstash.
#[derive(Parser, Debug)]
#[command(
    name = "pixelstash",
    version,
    about = "Serverless image metadata pipeline"
)]
struct Cli {
    /// Path to the YAML configuration file. Defaults apply when it is absent.
    #[arg(short, long, env = "PIXELSTASH_CONFIG", default_value = "pixelstash.yaml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve one handler under the AWS Lambda runtime.
    Lambda {
        #[arg(long, value_enum, env = "PIXELSTASH_HANDLER")]
        handler: HandlerKind,
    },
    /// Serve every handler over HTTP for local development.
    Serve {
        /// Override the bind address (host:port).
        #[arg(short, long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = resolve_config(&cli.config)?;
    init_tracing(&config.logging);
    info!("Configuration resolved from {}", cli.config);

    if config.observability.metrics {
        pixelstash::metrics::init_metrics()?;
        pixelstash::metrics::describe_metrics();
        info!("Prometheus metrics initialized");
    }

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(pixelstash::AppState::from_config(config).await?);

    match cli.command {
        Command::Lambda { handler } => pixelstash::lambda::run(state, handler)
            .await
            .map_err(|e| anyhow::anyhow!("Lambda runtime failed: {e}")),
        Command::Serve { bind } => {
            let bind_addr = bind.unwrap_or(bind_addr);
            let app = pixelstash::server::app(state);

            let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
            info!("pixelstash listening on {}", bind_addr);

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            info!("pixelstash shut down");
            Ok(())
        }
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Wait for SIGTERM or SIGINT (Ctrl+C), then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        },
    }
}
