//! Capability negotiation for an opened device

use super::device::PcmDevice;
use super::format::{bit_depth, SampleFormat};
use crate::config::CaptureConfig;
use crate::error::AudioError;

/// Parameters the device agreed to for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NegotiatedFormat {
    /// Interleaved channel count
    pub channels: u32,
    /// Frames per second
    pub sample_rate: u32,
    /// On-the-wire sample encoding
    pub sample_format: SampleFormat,
    /// Device buffer size, and the frames requested per read
    pub buffer_frames: u64,
    /// Bytes per frame as the device reports it, container padding included
    pub bytes_per_frame: usize,
    /// Significant bits per sample, from the format table
    pub bits_per_sample: u16,
}

impl NegotiatedFormat {
    /// Size of one full device read
    pub fn buffer_bytes(&self) -> usize {
        self.bytes_per_frame * self.buffer_frames as usize
    }
}

/// Negotiate channels, rate, format and buffer size in that order, then
/// prepare the device and read back its frame size.
pub fn negotiate(device: &mut dyn PcmDevice, request: &CaptureConfig) -> Result<NegotiatedFormat, AudioError> {
    let channels = device.negotiate_channels(request.channels)?;
    let sample_rate = device.negotiate_rate(request.sample_rate)?;
    let sample_format = device.negotiate_format(request.format)?;
    let buffer_frames = device.negotiate_buffer_size(request.buffer_min_frames, request.buffer_max_frames)?;

    device.prepare()?;

    let bytes_per_frame = device.bytes_per_frame()?;
    if bytes_per_frame == 0 {
        return Err(AudioError::InvalidFrameSize(bytes_per_frame));
    }

    let bits_per_sample = bit_depth(sample_format)?;

    if channels != request.channels || sample_rate != request.sample_rate || sample_format != request.format {
        tracing::warn!(
            "Device adjusted request: {}ch {}Hz {} -> {}ch {}Hz {}",
            request.channels,
            request.sample_rate,
            request.format,
            channels,
            sample_rate,
            sample_format
        );
    }

    Ok(NegotiatedFormat {
        channels,
        sample_rate,
        sample_format,
        buffer_frames,
        bytes_per_frame,
        bits_per_sample,
    })
}
