//! Liveness HTTP server and process wiring.
//!
//! `run` validates the delivery configuration, connects the bridge session,
//! starts the forwarder event loop and optional heartbeat, and serves the
//! liveness endpoints until SIGINT/SIGTERM.

use crate::config::{self, Config, DeliveryMode};
use crate::deliver::{ContactDelivery, Delivery};
use crate::forwarder::Forwarder;
use crate::heartbeat;
use crate::init;
use crate::transport::{BridgeSession, TransportEvent, TransportSession};
use anyhow::{Context, Result};
use axum::{routing::get, Router};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Static liveness strings for uptime probes.
const ROOT_LIVENESS: &str = "relic relay is running";
const PING_LIVENESS: &str = "pong";

/// Build the delivery collaborator for the configured mode. Missing mandatory
/// configuration is a fatal startup error.
fn build_delivery(
    config: &Config,
    session: Arc<dyn TransportSession>,
) -> Result<Arc<dyn Delivery>> {
    match config.forwarder.mode {
        DeliveryMode::Send => {
            let destination = config::resolve_destination(config).ok_or_else(|| {
                anyhow::anyhow!(
                    "forwarder destination is not configured (set forwarder.destination or RELIC_DESTINATION)"
                )
            })?;
            Ok(Arc::new(ContactDelivery::new(session, destination)))
        }
        DeliveryMode::Drive => build_drive_delivery(config),
    }
}

#[cfg(feature = "drive")]
fn build_drive_delivery(config: &Config) -> Result<Arc<dyn Delivery>> {
    let token = config::resolve_drive_token(config).ok_or_else(|| {
        anyhow::anyhow!(
            "drive access token is not configured (set drive.accessToken or RELIC_DRIVE_TOKEN)"
        )
    })?;
    let client =
        drive_delivery::DriveClient::new(None, token, config.drive.folder_id.clone());
    Ok(Arc::new(crate::deliver::DriveDelivery::new(client)))
}

#[cfg(not(feature = "drive"))]
fn build_drive_delivery(_config: &Config) -> Result<Arc<dyn Delivery>> {
    anyhow::bail!("delivery mode \"drive\" requires building with the `drive` feature")
}

/// Run the relay; binds the liveness server to config.server.bind:config.server.port.
/// Blocks until shutdown (e.g. Ctrl+C).
/// `config_path` is the path to the config file (used to resolve the session directory).
/// Requires the configuration directory to be initialized (`relic init`).
pub async fn run(config: Config, config_path: PathBuf) -> Result<()> {
    init::require_initialized(&config_path, &config)?;

    let bridge_url = config::resolve_bridge_url(&config);
    let session = Arc::new(BridgeSession::new(
        bridge_url.clone(),
        config.bridge.api_token.clone(),
    ));
    let session_dyn: Arc<dyn TransportSession> = session.clone();
    log::info!("transport session \"{}\" via {}", session.id(), bridge_url);
    let delivery = build_delivery(&config, session_dyn.clone())?;
    log::info!("delivery mode: {}", delivery.id());
    let forwarder = Arc::new(Forwarder::new(session_dyn, delivery));

    let (event_tx, mut event_rx) = mpsc::channel::<TransportEvent>(64);
    let connector_task = session.clone().start_inbound(event_tx);

    let event_task = tokio::spawn(async move {
        while let Some(ev) = event_rx.recv().await {
            match ev {
                TransportEvent::QrCode(code) => {
                    log::info!("pairing QR issued ({} chars); scan it with the phone", code.len());
                }
                TransportEvent::Ready => {
                    log::info!("messaging session ready");
                }
                TransportEvent::AuthFailure(reason) => {
                    log::error!("messaging session auth failed: {}", reason);
                }
                TransportEvent::Disconnected(reason) => {
                    log::warn!("messaging session disconnected: {}", reason);
                }
                TransportEvent::Message(msg) => {
                    // Fire-and-forget: handling suspends on network I/O and
                    // must not hold up the next event. In-flight forwards are
                    // not awaited at shutdown.
                    let forwarder = forwarder.clone();
                    tokio::spawn(async move {
                        forwarder.handle_message(msg).await;
                    });
                }
            }
        }
        log::debug!("event loop stopped");
    });

    let heartbeat_task = config
        .heartbeat
        .url
        .clone()
        .map(|url| heartbeat::start(url, config.heartbeat.interval_secs));

    let app = Router::new()
        .route("/", get(|| async { ROOT_LIVENESS }))
        .route("/ping", get(|| async { PING_LIVENESS }));

    let bind_addr = format!("{}:{}", config.server.bind.trim(), config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("liveness server listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(session, vec![connector_task, event_task]))
        .await
        .context("liveness server exited")?;

    if let Some(h) = heartbeat_task {
        h.abort();
    }
    log::info!("relay stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
/// Stops the bridge session, then awaits the connector and event tasks.
async fn shutdown_signal(session: Arc<BridgeSession>, tasks: Vec<JoinHandle<()>>) {
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, stopping bridge session");

    session.stop();
    for h in tasks {
        let _ = h.await;
    }
    log::info!("session tasks finished");
}
