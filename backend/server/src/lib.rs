//! Back-office service for a metalworking shop.
//!
//! Staff sign in against the hosted gateway and manage orders, customer
//! applications, the product and service catalog, the portfolio gallery,
//! the price calculator and the site copy. Every route except `/login`
//! sits behind the [session guard](guard).
//!
//! # Layout
//! - [`config`]: environment driven settings, secrets from `/run/secrets`
//! - [`guard`]: session resolution and the login redirect rule
//! - [`upload`]: the image upload widget and orphan cleanup
//! - [`screens`]: one handler module per back-office screen
//!
//! # Running
//! ```sh
//! GATEWAY_URL=http://localhost:54321 GATEWAY_ANON_KEY=... RUST_LOG=info cargo run -p backoffice
//! ```
use anyhow::Context;
use gateway::RestGateway;
use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod cookies;
pub mod error;
pub mod guard;
pub mod routes;
pub mod screens;
pub mod state;
pub mod upload;
pub mod utils;

#[cfg(test)]
mod testing;

use config::Config;
use state::AppState;

pub async fn start_server() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;

    info!("Initializing state...");
    let gateway = RestGateway::new(&config.gateway_url, &config.gateway_anon_key)
        .context("Failed to build gateway client")?;
    let state = AppState::new(config, gateway);

    info!("Starting server...");
    let app = routes::router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
