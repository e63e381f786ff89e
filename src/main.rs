//! Gitop Web - browse and pick branches across hosted git repositories
//!
//! # Usage
//! ```bash
//! gitop-web /srv/git                      # Serve every repository under /srv/git
//! gitop-web --config gitop.toml           # Settings from a TOML file
//! gitop-web /srv/git --dev --open         # Verbose logging, open browser
//! ```

mod app;
mod assets;
mod config;
mod error;
mod git;
mod models;
mod picker;
mod routes;
mod session;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::{AppState, WebApp};
use config::Config;
use git::GitDepotStore;

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Gitop Web - browse hosted git repositories in your browser
#[derive(Parser)]
#[command(name = "gitop-web")]
#[command(about = "Web front end for a directory of git repositories", long_about = None)]
struct Cli {
    /// Directory containing the repositories to serve
    #[arg(value_name = "REPOS_ROOT")]
    repos_root: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to run the server on
    #[arg(short, long)]
    port: Option<u16>,

    /// Development mode: debug logging and per-request session tracing
    #[arg(long)]
    dev: bool,

    /// Open browser automatically after starting
    #[arg(short, long)]
    open: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(root) = cli.repos_root {
        config.storage.repos_root = root;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.server.development |= cli.dev;

    // Initialize tracing (quieter for production)
    let default_filter = if config.server.development { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let app = WebApp::init(&config)?;

    let store = match GitDepotStore::new(&config.storage.repos_root) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("✗ Failed to open repository root: {}", e);
            eprintln!("  Path: {}", config.storage.repos_root.display());
            std::process::exit(1);
        }
    };

    if config.auth.accounts.is_empty() && !config.auth.allow_anonymous {
        tracing::warn!("No accounts configured and anonymous access is off; nobody can log in");
    }

    let canonical_root = std::fs::canonicalize(store.root())
        .unwrap_or_else(|_| store.root().to_path_buf())
        .to_string_lossy()
        .to_string();
    let request_timeout = app.request_timeout();

    let state = AppState::new(&config, app, Arc::new(store));
    let sessions = Arc::clone(&state.sessions);

    let app = routes::create_router(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http());

    // Bind to the port
    let addr = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("✗ Failed to bind to {}: {}", addr, e);
            eprintln!("  Try a different port with --port <PORT>");
            std::process::exit(1);
        }
    };

    let purge = tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            match sessions.purge_expired() {
                Ok(0) => {}
                Ok(n) => tracing::debug!("Purged {} expired sessions", n),
                Err(e) => tracing::error!("Session purge failed: {}", e),
            }
        }
    });

    // Print startup message
    let url = format!("http://{}", addr);
    println!();
    println!("  ┌─────────────────────────────────────────────┐");
    println!("  │                  Gitop Web                  │");
    println!("  └─────────────────────────────────────────────┘");
    println!();
    println!("  Repositories: {}", canonical_root);
    println!("  Server:       {}", url);
    println!();
    println!("  Press Ctrl+C to stop");
    println!();

    // Open browser if requested
    if cli.open {
        if let Err(e) = open::that(&url) {
            eprintln!("  Warning: Could not open browser: {}", e);
        }
    }

    // Set up graceful shutdown
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
        println!("\n  Shutting down...");
    };

    // Start the server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    purge.abort();
    Ok(())
}
