//! Audio device abstraction
//!
//! The capture core only talks to hardware through [`AudioBackend`] and
//! [`PcmDevice`]. The ALSA implementation lives in `audio::alsa`; tests use
//! the scripted backend in `audio::mock`.

use std::fmt;

use super::format::SampleFormat;
use crate::error::AudioError;

/// Stream direction an endpoint is opened for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Capture,
    Playback,
}

/// An audio card as reported by enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardInfo {
    /// Kernel card number
    pub index: i32,
    /// Card name as the driver reports it
    pub name: String,
}

/// A single record- or playback-capable endpoint on a card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Kernel number of the owning card
    pub card_index: i32,
    /// Name of the owning card
    pub card_name: String,
    /// PCM device number on the card
    pub device_index: u32,
    /// PCM device name
    pub name: String,
    /// Has a capture stream
    pub supports_record: bool,
    /// Has a playback stream
    pub supports_play: bool,
}

impl Endpoint {
    /// Backend-specific address used to open the endpoint
    pub fn path(&self) -> String {
        format!("hw:{},{}", self.card_index, self.device_index)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] ({})", self.card_name, self.name, self.path())
    }
}

/// Enumerates hardware and opens endpoints
pub trait AudioBackend: Send + Sync {
    fn cards(&self) -> Result<Vec<CardInfo>, AudioError>;

    fn devices(&self, card: &CardInfo) -> Result<Vec<Endpoint>, AudioError>;

    fn open(&self, endpoint: &Endpoint, direction: Direction) -> Result<Box<dyn PcmDevice>, AudioError>;
}

/// An opened endpoint.
///
/// Each `negotiate_*` call requests a value and returns what the device
/// actually settled on. Dropping the handle closes the device.
pub trait PcmDevice: Send {
    fn negotiate_channels(&mut self, requested: u32) -> Result<u32, AudioError>;

    fn negotiate_rate(&mut self, requested: u32) -> Result<u32, AudioError>;

    fn negotiate_format(&mut self, requested: SampleFormat) -> Result<SampleFormat, AudioError>;

    /// Pick a buffer size in frames within `[min, max]`
    fn negotiate_buffer_size(&mut self, min: u64, max: u64) -> Result<u64, AudioError>;

    /// Install negotiated parameters and get ready for I/O
    fn prepare(&mut self) -> Result<(), AudioError>;

    fn bytes_per_frame(&self) -> Result<usize, AudioError>;

    /// Blocking read of interleaved frames into `buf`; returns frames read
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, AudioError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_path_and_display() {
        let endpoint = Endpoint {
            card_index: 1,
            card_name: "USB Audio Device".to_string(),
            device_index: 0,
            name: "USB Audio".to_string(),
            supports_record: true,
            supports_play: false,
        };
        assert_eq!(endpoint.path(), "hw:1,0");
        assert_eq!(endpoint.to_string(), "USB Audio Device [USB Audio] (hw:1,0)");
    }
}
