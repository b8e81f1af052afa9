//! Application configuration
//!
//! Every field has a default matching the fixed values the appliance ships
//! with, so a missing config file is the normal case on a read-only root.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use crate::audio::SampleFormat;
use crate::constants::*;
use crate::error::{Error, Result};

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub network: NetworkConfig,
    pub device: DeviceConfig,
    pub capture: CaptureConfig,
    pub supervisor: SupervisorConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&text)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the file named by `NETCAPTURE_CONFIG`, or fall back to defaults
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let capture = &self.capture;
        if capture.channels == 0 {
            return Err(Error::Config("capture.channels must be positive".into()));
        }
        if capture.sample_rate == 0 {
            return Err(Error::Config("capture.sample_rate must be positive".into()));
        }
        if capture.buffer_min_frames == 0 || capture.buffer_min_frames > capture.buffer_max_frames {
            return Err(Error::Config(format!(
                "capture buffer range [{}, {}] is invalid",
                capture.buffer_min_frames, capture.buffer_max_frames
            )));
        }
        if self.network.recv_buffer_size == 0 {
            return Err(Error::Config("network.recv_buffer_size must be positive".into()));
        }
        Ok(())
    }
}

/// Broadcast transport settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Local address the command socket binds to
    pub bind_address: IpAddr,
    /// Destination for outbound status datagrams
    pub broadcast_address: IpAddr,
    /// Port for both commands and status
    pub port: u16,
    /// Bytes read per inbound datagram; longer commands are truncated
    pub recv_buffer_size: usize,
}

impl NetworkConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    pub fn broadcast_addr(&self) -> SocketAddr {
        SocketAddr::new(self.broadcast_address, self.port)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            broadcast_address: IpAddr::V4(Ipv4Addr::BROADCAST),
            port: DEFAULT_UDP_PORT,
            recv_buffer_size: MAX_COMMAND_SIZE,
        }
    }
}

/// Hardware identity to look for at boot
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Exact card name to claim endpoints from
    pub card_name: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            card_name: TARGET_CARD_NAME.to_string(),
        }
    }
}

/// Parameters requested from the device during negotiation
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Requested channel count
    pub channels: u32,
    /// Requested frames per second
    pub sample_rate: u32,
    /// Requested sample encoding
    pub format: SampleFormat,
    /// Smallest acceptable device buffer, in frames
    pub buffer_min_frames: u64,
    /// Largest acceptable device buffer, in frames
    pub buffer_max_frames: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            channels: DEFAULT_CHANNELS,
            sample_rate: DEFAULT_SAMPLE_RATE,
            format: SampleFormat::S16LE,
            buffer_min_frames: DEFAULT_BUFFER_MIN_FRAMES,
            buffer_max_frames: DEFAULT_BUFFER_MAX_FRAMES,
        }
    }
}

/// Fatal error handling
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Seconds between announcing a fatal error and terminating
    pub cooldown_secs: u64,
}

impl SupervisorConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: FATAL_COOLDOWN_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_appliance_constants() {
        let config = AppConfig::default();
        assert_eq!(config.network.port, 7171);
        assert_eq!(config.network.broadcast_addr().to_string(), "255.255.255.255:7171");
        assert_eq!(config.network.recv_buffer_size, 255);
        assert_eq!(config.device.card_name, "USB Audio Device");
        assert_eq!(config.capture.channels, 1);
        assert_eq!(config.capture.sample_rate, 44100);
        assert_eq!(config.capture.format, SampleFormat::S16LE);
        assert_eq!(config.capture.buffer_min_frames, 8192);
        assert_eq!(config.capture.buffer_max_frames, 16384);
        assert_eq!(config.supervisor.cooldown(), Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [device]
            card_name = "Scarlett 2i2"

            [capture]
            sample_rate = 48000
            format = "S24LE"
            "#,
        )
        .unwrap();

        assert_eq!(config.device.card_name, "Scarlett 2i2");
        assert_eq!(config.capture.sample_rate, 48000);
        assert_eq!(config.capture.format, SampleFormat::S24LE);
        assert_eq!(config.capture.channels, 1);
        assert_eq!(config.network.port, 7171);
    }

    #[test]
    fn test_rejects_inverted_buffer_range() {
        let err = AppConfig::from_toml(
            r#"
            [capture]
            buffer_min_frames = 4096
            buffer_max_frames = 1024
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        assert!(AppConfig::from_toml("[network\nport = ").is_err());
    }
}
