//! docfill Server
//!
//! Fills `{{chave}}` placeholders in a DOCX template with the `chave: valor`
//! lines of a base document (DOCX or PDF). Provides:
//!
//! - An upload page with text preview and download
//! - REST endpoints for extraction, the full flow and the filled file
//!
//! ## Architecture
//!
//! All document work happens in `docfill-core` and runs on the blocking
//! pool. The server only wires backends, limits upload size and rate, and
//! turns failures into JSON errors or user notices.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use docfill_core::Backends;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;
mod workflow;

use api::{handle_extract, handle_fill, handle_health, handle_index, handle_process};

/// Command-line arguments for the docfill server
#[derive(Parser, Debug)]
#[command(name = "docfill-server")]
#[command(about = "Fill DOCX templates with key: value data from DOCX/PDF documents")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, env = "DOCFILL_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Maximum request body size in megabytes
    #[arg(long, env = "DOCFILL_MAX_UPLOAD_MB", default_value = "25")]
    max_upload_mb: usize,

    /// Rate limit: requests per second per IP
    #[arg(long, default_value = "10")]
    rate_limit: u32,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Shared application state
#[derive(Clone, Debug)]
pub struct AppState {
    pub backends: Backends,
}

/// Routes and per-request middleware, without rate limiting
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Upload page
        .route("/", get(handle_index))
        // Health check
        .route("/health", get(handle_health))
        // API endpoints
        .route("/api/extract", post(handle_extract))
        .route("/api/process", post(handle_process))
        .route("/api/fill", post(handle_fill))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting docfill server on {}:{}", args.host, args.port);

    let state = AppState {
        backends: Backends::default(),
    };
    info!("Backends: {:?}", state.backends);

    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(args.rate_limit.into())
            .burst_size(args.rate_limit * 2)
            .finish()
            .context("Failed to create rate limiter config")?,
    );

    let app = router(state, args.max_upload_mb * 1024 * 1024).layer(GovernorLayer {
        config: governor_conf,
    });

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Upload limit: {} MB", args.max_upload_mb);
    info!("Rate limit: {} requests/second per IP", args.rate_limit);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
