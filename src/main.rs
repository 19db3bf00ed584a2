//! HTTP front end for the invoice filing engine.
//!
//! Every configured namespace is served under its own path prefix. See
//! [`routes`] for the endpoints.

mod error;
mod routes;

use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use filer_config::Config;
use filer_engine::Registry;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "filer=info,filer_engine=info,tower_http=info";

#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Configuration file (TOML, YAML or JSON).
    #[arg(short, long, env = "FILER_CONFIG")]
    config: Option<PathBuf>,
    /// Listen address, overriding the configuration.
    #[arg(short, long)]
    address: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    let registry = Registry::from_config(&config).await.or_raise(|| ErrorKind::Startup)?;
    let namespaces: Vec<&str> = registry.names().collect();
    let address = args.address.unwrap_or(config.server.address);

    let listener = tokio::net::TcpListener::bind(address).await.or_raise(|| ErrorKind::Bind(address))?;
    tracing::info!(%address, ?namespaces, "Listening");
    let app = routes::router(registry);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await.or_raise(|| ErrorKind::Serve)?;
    tracing::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Could not listen for Ctrl-C; shutting down");
    }
}
