//! # netcapture
//!
//! Network-controlled audio capture appliance. Runs as PID 1 on a
//! read-only device, finds its USB audio interface at boot, and records raw
//! audio to WAV on command from the LAN.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                           netcapture (PID 1)                         │
//! │                                                                      │
//! │  boot ──► audio::discovery ──► DeviceSet { record, playback }        │
//! │                                        │                             │
//! │  ┌─────────────────────────────────────▼──────────────────────────┐  │
//! │  │ session::Dispatcher   (recv loop on UDP :7171, broadcast)      │  │
//! │  │    "record <path>" ─┐  "play <path>" ─┐  "stop" ─┐              │  │
//! │  │                     ▼                 ▼          ▼              │  │
//! │  │ session::SessionManager ── one CancellationToken at a time     │  │
//! │  └─────────────┬──────────────────────────────────────────────────┘  │
//! │                │ spawn_blocking                                       │
//! │  ┌─────────────▼──────────────────────────────────────────────────┐  │
//! │  │ audio::AudioCapture                                            │  │
//! │  │   open ─► negotiate ─► create file ─► WAV header               │  │
//! │  │   loop { cancelled? ─► read buffer ─► codec::WavWriter }       │  │
//! │  └─────────────┬──────────────────────────────────────────────────┘  │
//! │                │ any error                                           │
//! │  ┌─────────────▼──────────────────────────────────────────────────┐  │
//! │  │ supervisor::Supervisor: announce ─► sleep 10s ─► abort          │  │
//! │  └────────────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────────┘
//!                     status strings ▲ UDP broadcast :7171
//! ```

pub mod audio;
pub mod codec;
pub mod config;
pub mod error;
pub mod network;
pub mod protocol;
pub mod session;
pub mod supervisor;

pub use error::{Error, Result};

/// Application-wide constants
pub mod constants {
    /// Card name of the interface the appliance is built around
    pub const TARGET_CARD_NAME: &str = "USB Audio Device";

    /// UDP port for commands and status
    pub const DEFAULT_UDP_PORT: u16 = 7171;

    /// Bytes read per command datagram
    pub const MAX_COMMAND_SIZE: usize = 255;

    /// Requested channel count (mono)
    pub const DEFAULT_CHANNELS: u32 = 1;

    /// Requested sample rate
    pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

    /// Requested device buffer range, in frames
    pub const DEFAULT_BUFFER_MIN_FRAMES: u64 = 8192;
    pub const DEFAULT_BUFFER_MAX_FRAMES: u64 = 16384;

    /// Time between announcing a fatal error and terminating
    pub const FATAL_COOLDOWN_SECS: u64 = 10;

    /// Environment variable naming an optional TOML config file
    pub const CONFIG_ENV_VAR: &str = "NETCAPTURE_CONFIG";
}
