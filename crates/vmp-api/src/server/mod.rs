//! Web server for the device query service.

pub mod router;
pub mod state;

pub use router::create_router;
pub use state::ServerState;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use vmp_core::ServerConfig;
use vmp_devices::{DeviceDirectory, DeviceUpdate, MemoryDirectory};

/// Start the web server and run until a shutdown signal arrives.
pub async fn run(config: ServerConfig, seed: Option<&Path>) -> anyhow::Result<()> {
    let directory: Arc<dyn DeviceDirectory> = match seed {
        Some(path) => Arc::new(MemoryDirectory::load_seed(path).await?),
        None => Arc::new(MemoryDirectory::new()),
    };
    let state = ServerState::new(&config, directory);

    let sweep_every = Duration::from_secs(config.heartbeat_timeout_secs.clamp(1, 30));
    let sweeper = tokio::spawn(sweep_liveness(state.clone(), sweep_every));

    let app = create_router(state, config.max_request_body_bytes);
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!(
        category = "server",
        "Device query service listening on http://{}",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(crate::shutdown::shutdown_signal())
        .await?;

    sweeper.abort();
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Periodically mark devices whose heartbeat lapsed as offline.
async fn sweep_liveness(state: ServerState, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        for device_id in state.liveness.sweep() {
            match state
                .directory
                .apply(&device_id, DeviceUpdate::Online(false))
                .await
            {
                Ok(_) => tracing::info!(
                    category = "liveness",
                    device_id = %device_id,
                    "Heartbeat lapsed, device offline"
                ),
                Err(e) if e.is_not_found() => tracing::debug!(
                    category = "liveness",
                    device_id = %device_id,
                    "Lapsed device not in directory"
                ),
                Err(e) => tracing::warn!(
                    category = "liveness",
                    device_id = %device_id,
                    error = %e,
                    "Failed to mark device offline"
                ),
            }
        }
    }
}
