//! x402 Solana facilitator HTTP server.
//!
//! # Usage
//!
//! ```bash
//! # Run with default config (config.toml in current directory, optional)
//! cargo run -p s402-facilitator --release
//!
//! # Run with custom config path
//! CONFIG=/path/to/config.toml cargo run -p s402-facilitator
//!
//! # Configure logging level
//! RUST_LOG=debug cargo run -p s402-facilitator
//! ```
//!
//! Endpoints:
//! - `POST /verify`, `POST /settle`, `GET /supported`, `GET /health`
//! - `GET|POST /api/gatya` - paywalled demo resource

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderName, Method};
use clap::Parser;
use dotenvy::dotenv;
use s402_http::constants::{X_PAYMENT_REQUIRED_HEADER, X_PAYMENT_RESPONSE_HEADER};
use s402_svm::exact::{RpcSender, SolanaExactFacilitator, SubmitPolicy};
use tower_http::cors;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use s402_facilitator::config::FacilitatorConfig;
use s402_facilitator::demo::demo_router;
use s402_facilitator::facilitator_router;
use s402_facilitator::util::SigDown;

/// CLI arguments for the facilitator server.
#[derive(Parser, Debug)]
#[command(name = "s402-facilitator")]
#[command(about = "x402 Solana facilitator HTTP server")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, short, env = "CONFIG", default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(Cli::parse()).await {
        tracing::error!("Facilitator failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| "failed to install rustls crypto provider")?;

    let config = FacilitatorConfig::load(&cli.config)?;
    let table = Arc::new(config.network_table()?);
    for (network, settings) in table.iter() {
        tracing::info!(%network, rpc_url = %settings.rpc_url, mint = %settings.mint, "network configured");
    }
    tracing::info!(
        recipient = %table.recipient(),
        price = %config.price,
        preflight = config.preflight,
        "loaded configuration"
    );

    let sender = RpcSender::new(&table, SubmitPolicy::from_preflight(config.preflight));
    let facilitator = Arc::new(SolanaExactFacilitator::new(
        Arc::clone(&table),
        Arc::new(sender),
    ));

    let app = Router::new()
        .merge(facilitator_router(Arc::clone(&facilitator)))
        .merge(demo_router(
            facilitator,
            table,
            config.price.clone(),
            config.base_url.clone(),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            cors::CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(cors::Any)
                .expose_headers([
                    HeaderName::from_bytes(X_PAYMENT_RESPONSE_HEADER.as_bytes())?,
                    HeaderName::from_bytes(X_PAYMENT_REQUIRED_HEADER.as_bytes())?,
                ]),
        );

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .inspect_err(|e| tracing::error!("Failed to bind to {addr}: {e}"))?;
    tracing::info!("Facilitator listening on http://{addr}");

    let sig_down = SigDown::try_new()?;
    let token = sig_down.cancellation_token();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { token.cancelled().await })
        .await?;
    sig_down.recv().await;

    tracing::info!("Facilitator shut down gracefully");
    Ok(())
}
