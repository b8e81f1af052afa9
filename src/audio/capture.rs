//! Audio capture into a WAV file
//!
//! One capture owns its device handle and output file for its whole run.
//! The loop is blocking and meant to sit on a dedicated thread; cancellation
//! is polled between reads, so a stop takes effect after at most one
//! in-flight buffer.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::device::{AudioBackend, Direction, Endpoint, PcmDevice};
use super::negotiate::{negotiate, NegotiatedFormat};
use crate::codec::{WavSpec, WavWriter};
use crate::config::CaptureConfig;
use crate::error::{CodecError, Result};

/// What a finished capture produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSummary {
    /// Parameters the device ran with
    pub format: NegotiatedFormat,
    /// Whole frames written to the file
    pub frames: u64,
    /// Sample bytes in the data chunk
    pub bytes: u64,
}

impl CaptureSummary {
    pub fn duration_secs(&self) -> f64 {
        self.frames as f64 / self.format.sample_rate as f64
    }
}

/// Records from one endpoint with a fixed parameter request
pub struct AudioCapture {
    /// Opens the endpoint for each run
    backend: Arc<dyn AudioBackend>,
    /// Record endpoint chosen at boot
    endpoint: Endpoint,
    /// Parameters asked of the device before it settles
    request: CaptureConfig,
}

impl AudioCapture {
    pub fn new(backend: Arc<dyn AudioBackend>, endpoint: Endpoint, request: CaptureConfig) -> Self {
        Self {
            backend,
            endpoint,
            request,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Open, negotiate, and stream into `path` until `cancel` fires.
    ///
    /// Negotiation happens before the file is created, so a device that
    /// refuses every parameter leaves nothing behind. Returns `Ok` only for a
    /// cancelled run; every device or file error is returned as-is.
    pub fn record(&self, path: &Path, cancel: &CancellationToken) -> Result<CaptureSummary> {
        let mut device = self.backend.open(&self.endpoint, Direction::Capture)?;
        let format = negotiate(device.as_mut(), &self.request)?;

        tracing::info!(
            "Negotiated {}: {}ch {}Hz {} ({} bits), {} frames x {} bytes",
            self.endpoint,
            format.channels,
            format.sample_rate,
            format.sample_format,
            format.bits_per_sample,
            format.buffer_frames,
            format.bytes_per_frame
        );

        let spec = WavSpec::from_format(&format)?;
        let file = File::create(path).map_err(|source| CodecError::Create {
            path: path.display().to_string(),
            source,
        })?;
        let mut writer = WavWriter::new(BufWriter::new(file), spec)?;

        let streamed = stream(device.as_mut(), &format, &mut writer, cancel);
        drop(device);

        // Finalize on the error path too so the header sizes match whatever
        // made it to disk.
        let bytes = writer.data_bytes();
        let finalized = writer.finalize();
        let frames = streamed?;
        finalized?;

        Ok(CaptureSummary { format, frames, bytes })
    }
}

/// The read → encode loop. Returns the number of frames written.
pub fn stream<W: Write + Seek>(
    device: &mut dyn PcmDevice,
    format: &NegotiatedFormat,
    writer: &mut WavWriter<W>,
    cancel: &CancellationToken,
) -> Result<u64> {
    let mut buf = vec![0u8; format.buffer_bytes()];
    let mut frames_written: u64 = 0;

    loop {
        if cancel.is_cancelled() {
            return Ok(frames_written);
        }

        let frames = device.read(&mut buf)?;
        let len = (frames * format.bytes_per_frame).min(buf.len());
        writer.write(&buf[..len])?;
        frames_written += (len / format.bytes_per_frame) as u64;
    }
}
