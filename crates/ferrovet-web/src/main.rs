//! Ferrovet — drug-target validation evidence aggregator.
//!
//! Run with: cargo run -p ferrovet-web -- serve

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use ferrovet_pipeline::TargetValidator;
use ferrovet_web::config::Config;
use ferrovet_web::router::build_router;
use ferrovet_web::state::AppState;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ferrovet", version, about = "Drug-target validation evidence aggregator")]
struct Cli {
    /// Path to ferrovet.toml
    #[arg(long, global = true, env = "FERROVET_CONFIG")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
    /// Build one target profile and print it as JSON
    Profile {
        gene: String,
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
    /// Print search candidates for a query
    Search {
        query: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so profile JSON on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ferrovet=debug,info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let validator = TargetValidator::live(&config.pipeline, &config.sources)
        .context("building the request client")?;

    match cli.command {
        Command::Serve { bind } => {
            let addr = bind.unwrap_or_else(|| config.server.bind.clone());
            let app = build_router(AppState::new(validator));

            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("binding {addr}"))?;
            info!("Ferrovet API listening on http://{addr}");

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        Command::Profile { gene, pretty } => {
            let profile = validator.build_target_profile(&gene).await?;
            let json = if pretty {
                serde_json::to_string_pretty(&profile)?
            } else {
                serde_json::to_string(&profile)?
            };
            println!("{json}");
        }
        Command::Search { query, limit } => {
            let hits = validator.search_candidates_limited(&query, limit).await?;
            println!("{}", serde_json::to_string_pretty(&hits)?);
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
