//! Gatekeeper Server
//!
//! HTTP access-control service over the SQLite permission store.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use gatekeeper::auth::TokenManager;
use gatekeeper::broker::StoreBroker;
use gatekeeper::pipeline::Gatekeeper;
use gatekeeper::routes::{AppState, build_router};
use gatekeeper_core::tracing_init::{DEFAULT_FILTER, init_tracing};
use gatekeeper_core::{ConnectionManager, SqliteConnector, StoreConfig};

#[derive(Parser, Debug)]
#[command(name = "gatekeeper")]
#[command(version, about = "Gatekeeper access-control server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "GATEKEEPER_ADDR", default_value = "0.0.0.0:9123")]
    addr: SocketAddr,

    /// JSON store config file. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// SQLite connection URL.
    #[arg(long, env = "GATEKEEPER_DATABASE_URL")]
    database_url: Option<String>,

    /// Secret used to verify session tokens.
    #[arg(long, env = "GATEKEEPER_SESSION_SECRET", hide_env_values = true)]
    session_secret: String,

    /// Maximum wait for in-flight requests on shutdown (milliseconds).
    #[arg(long)]
    close_grace_ms: Option<u64>,

    /// In-flight poll interval on shutdown (milliseconds).
    #[arg(long)]
    close_poll_ms: Option<u64>,

    /// Delay between store reconnect attempts (milliseconds).
    #[arg(long)]
    retry_interval_ms: Option<u64>,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    log_json: bool,
}

impl Args {
    fn store_config(&self) -> anyhow::Result<StoreConfig> {
        let mut config = match &self.config {
            Some(path) => StoreConfig::load(path)?,
            None => StoreConfig::default(),
        };
        if let Some(url) = &self.database_url {
            config.connection_url.clone_from(url);
        }
        if let Some(ms) = self.close_grace_ms {
            config.close_grace_period_ms = ms;
        }
        if let Some(ms) = self.close_poll_ms {
            config.close_poll_interval_ms = ms;
        }
        if let Some(ms) = self.retry_interval_ms {
            config.retry_interval_ms = ms;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(DEFAULT_FILTER, args.log_json);

    let config = args.store_config()?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %args.addr,
        database = %gatekeeper_core::db::redact(&config.connection_url),
        "Starting gatekeeper"
    );

    let store = Arc::new(ConnectionManager::new(
        SqliteConnector::new(config.connection_url.clone()),
        config.lifecycle(),
    ));
    if let Err(e) = store.start().await {
        warn!(error = %e, "Permission store unavailable, retrying in background");
    }

    let state = AppState {
        gatekeeper: Gatekeeper::new(Arc::new(StoreBroker::new(Arc::clone(&store)))),
        identity: Arc::new(TokenManager::new(args.session_secret.as_bytes())),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let listener = tokio::net::TcpListener::bind(args.addr).await?;
    info!(addr = %args.addr, "Gatekeeper listening");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown signal received");
        })
        .await?;

    let shutdown = store.close().await?;
    if shutdown.forced {
        warn!(in_flight = shutdown.in_flight, "Permission store closed with requests in flight");
    }
    info!("Gatekeeper stopped");
    Ok(())
}
