mod app;
mod handlers;
mod models;
mod services;
mod utils;

use anyhow::Context;
use app::config::{CliArgs, Config};
use app::{router, telemetry};
use clap::Parser;
use services::{PaymentService, StripeClient};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliArgs::parse();

    let config = Config::load(&cli);
    let log_format = match &config {
        Ok(config) => config.log_format,
        Err(_) => cli.log_format.unwrap_or_default(),
    };
    telemetry::init(log_format);

    let config = config.map_err(|e| {
        error!("Configuration error: {}", e);
        e
    })?;

    let mode = if config.stripe_secret_key.is_live() {
        "live"
    } else {
        "test"
    };
    info!(
        "Initializing Stripe Payment Service in {} mode (gateway {}, timeout {:?})",
        mode,
        config.gateway_base_url,
        config.gateway_timeout
    );

    let gateway = StripeClient::new(&config).context("failed to create gateway client")?;
    let payment_service = Arc::new(PaymentService::new(
        Arc::new(gateway),
        config.gateway_timeout,
    ));

    let app = router::build_router(payment_service);

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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

    info!("Shutdown signal received, draining in-flight requests");
}
