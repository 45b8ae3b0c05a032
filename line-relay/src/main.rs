//! LINE Relay server.
//!
//! Receives LINE webhooks on `/callback` and echoes text and sticker
//! messages back as replies. `/sendLineMessage` forwards a raw body as a
//! push message to `USER_ID`.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use linerelay::{router, AppState, Config, LineClient};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!(version = env!("CARGO_PKG_VERSION"), "line_relay_starting");

    // CHANNEL_SECRET, CHANNEL_TOKEN and PORT are mandatory: fail before binding anything
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        port = config.port,
        push_recipient_configured = config.user_id.is_some(),
        api_base_url = %config.api_base_url,
        request_timeout_ms = config.request_timeout_ms,
        "config_loaded"
    );

    let client = LineClient::new(&config).context("Failed to create LINE client")?;
    info!(api_base_url = %config.api_base_url, "line_client_created");

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = router(AppState::new(config, Arc::new(client)));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind relay to {}", addr))?;

    info!(
        address = %addr,
        webhook_path = "/callback",
        push_path = "/sendLineMessage",
        "line_relay_listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Relay server error")?;

    info!("line_relay_stopped");

    Ok(())
}

/// JSON logs filtered by `RUST_LOG`, `info` when unset.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();
}

/// Resolves on SIGINT or SIGTERM so in-flight webhook replies can finish.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "sigint_handler_unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "sigterm_handler_unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let received = tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    };

    info!(signal = received, "line_relay_draining");
}
