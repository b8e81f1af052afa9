//! Capture appliance init
//!
//! Started by the kernel as PID 1. Never exits on its own: every failure
//! ends in the supervisor's abort, which reboots the device.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use netcapture::{
    audio::{alsa::AlsaBackend, find_devices, AudioBackend},
    config::AppConfig,
    network::{create_socket, Broadcaster, LogSink, StatusSink},
    session::{Dispatcher, SessionManager},
    supervisor::Supervisor,
};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting netcapture {}", env!("CARGO_PKG_VERSION"));

    // A bad config file still needs the network up to be reported, so bring
    // the socket up from defaults and fail afterwards.
    let loaded = AppConfig::from_env();
    let config = loaded.as_ref().cloned().unwrap_or_default();

    let socket = match create_socket(config.network.bind_addr()) {
        Ok(socket) => Arc::new(socket),
        Err(e) => {
            Supervisor::rebooting(Arc::new(LogSink), config.supervisor.cooldown()).fail(e).await;
            return;
        }
    };

    let status: Arc<dyn StatusSink> = Arc::new(Broadcaster::new(socket.clone(), config.network.broadcast_addr()));
    let supervisor = Supervisor::rebooting(status.clone(), config.supervisor.cooldown());

    if let Err(e) = loaded {
        supervisor.fail(e).await;
        return;
    }

    let backend: Arc<dyn AudioBackend> = Arc::new(AlsaBackend::new());
    let devices = match find_devices(backend.as_ref(), &config.device.card_name) {
        Ok(devices) => devices,
        Err(e) => {
            supervisor.fail(e).await;
            return;
        }
    };

    let sessions = SessionManager::new(backend, devices, config.capture.clone(), status, supervisor.clone());
    Dispatcher::new(socket, sessions, supervisor, config.network.recv_buffer_size)
        .run()
        .await;
}
