//! Session manager
//!
//! Owns the discovered endpoints and the single active capture session.
//! Only the dispatcher task touches it; the capture task sees nothing but
//! its own cancellation token.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::audio::{AudioBackend, AudioCapture, DeviceSet};
use crate::config::CaptureConfig;
use crate::error::Error;
use crate::network::StatusSink;
use crate::protocol::Command;
use crate::supervisor::Supervisor;

pub const STATUS_STOPPED_RECORDING: &str = "stopped recording";
pub const STATUS_STOPPED_PLAYING: &str = "stopped playing";
pub const STATUS_STOP_FAILED: &str = "stop failed";

struct ActiveSession {
    /// File the capture writes to
    path: PathBuf,
    /// Fired by `stop` or a superseding `record`
    cancel: CancellationToken,
    /// Capture driver; finishes once the device and file are released
    task: JoinHandle<()>,
}

pub struct SessionManager {
    /// Opens the record endpoint for each session
    backend: Arc<dyn AudioBackend>,
    /// Endpoints found at boot
    devices: DeviceSet,
    /// Parameters requested from the device on every record
    request: CaptureConfig,
    /// Outbound status channel
    status: Arc<dyn StatusSink>,
    /// Receives every session error
    supervisor: Supervisor,
    /// The running capture, if any
    current: Option<ActiveSession>,
    /// Task of the last stopped session, until it has released the device
    draining: Option<JoinHandle<()>>,
}

impl SessionManager {
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        devices: DeviceSet,
        request: CaptureConfig,
        status: Arc<dyn StatusSink>,
        supervisor: Supervisor,
    ) -> Self {
        Self {
            backend,
            devices,
            request,
            status,
            supervisor,
            current: None,
            draining: None,
        }
    }

    pub fn devices(&self) -> &DeviceSet {
        &self.devices
    }

    pub fn is_recording(&self) -> bool {
        self.current.is_some()
    }

    pub async fn handle(&mut self, command: Command) {
        match command {
            Command::Record { path } if path.is_empty() => {
                tracing::debug!("Ignoring record command without a path");
            }
            Command::Record { path } => self.start_recording(PathBuf::from(path)).await,
            Command::Play { path } => self.play(&path),
            Command::Stop => self.stop(),
        }
    }

    /// Start a capture into `path`. A session that is already running is
    /// stopped first, and its device released, before the new one opens it.
    async fn start_recording(&mut self, path: PathBuf) {
        if let Some(previous) = self.current.take() {
            tracing::info!(
                "Stopping recording of {} before starting {}",
                previous.path.display(),
                path.display()
            );
            previous.cancel.cancel();
            self.draining = Some(previous.task);
        }
        self.drain().await;

        self.status.announce(&format!("recording {}", path.display()));
        tracing::info!("Recording {} from {}", path.display(), self.devices.record);

        let cancel = CancellationToken::new();
        let capture = AudioCapture::new(self.backend.clone(), self.devices.record.clone(), self.request.clone());
        let task = tokio::spawn(run_capture(
            capture,
            path.clone(),
            cancel.clone(),
            self.status.clone(),
            self.supervisor.clone(),
        ));

        self.current = Some(ActiveSession { path, cancel, task });
    }

    fn stop(&mut self) {
        match self.current.take() {
            Some(session) => {
                tracing::info!("Stopping recording of {}", session.path.display());
                session.cancel.cancel();
                self.draining = Some(session.task);
            }
            None => {
                tracing::info!("Stop requested with no active session");
                self.status.announce(STATUS_STOP_FAILED);
            }
        }
    }

    /// Playback is a stub: nothing is decoded or played
    fn play(&self, path: &str) {
        tracing::warn!("Playback of {:?} on {} is not implemented", path, self.devices.playback);
        self.status.announce(STATUS_STOPPED_PLAYING);
    }

    /// Wait for the last stopped session to finish
    pub async fn drain(&mut self) {
        if let Some(task) = self.draining.take() {
            if let Err(e) = task.await {
                tracing::warn!("Capture task ended abnormally: {}", e);
            }
        }
    }
}

/// Drive one capture on the blocking pool and route its outcome
async fn run_capture(
    capture: AudioCapture,
    path: PathBuf,
    cancel: CancellationToken,
    status: Arc<dyn StatusSink>,
    supervisor: Supervisor,
) {
    let target = path.clone();
    let outcome = tokio::task::spawn_blocking(move || capture.record(&target, &cancel)).await;

    match outcome {
        Ok(Ok(summary)) => {
            tracing::info!(
                "Stopped recording {}: {} frames, {} bytes ({:.1}s)",
                path.display(),
                summary.frames,
                summary.bytes,
                summary.duration_secs()
            );
            status.announce(STATUS_STOPPED_RECORDING);
        }
        Ok(Err(e)) => supervisor.fail(e).await,
        Err(e) => supervisor.fail(Error::Task(e.to_string())).await,
    }
}
