//! Error types for the capture appliance

use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum Error {
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Capture task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Audio subsystem errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Card enumeration failed: {0}")]
    Enumeration(String),

    #[error("Couldn't find both record and playback devices on {0:?}")]
    DevicesNotFound(String),

    #[error("Failed to open {path}: {reason}")]
    Open { path: String, reason: String },

    #[error("Failed to negotiate {param}: {reason}")]
    Negotiation { param: &'static str, reason: String },

    #[error("Failed to prepare device: {0}")]
    Prepare(String),

    #[error("Device read failed: {0}")]
    Read(String),

    #[error("Unknown sample format: {0}")]
    UnknownFormat(String),

    #[error("Invalid bytes per frame: {0}")]
    InvalidFrameSize(usize),
}

/// Container encoder errors
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Failed to create {path}: {source}")]
    Create {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Header write failed: {0}")]
    Header(#[source] std::io::Error),

    #[error("Write failed: {0}")]
    Write(#[source] std::io::Error),

    #[error("Finalize failed: {0}")]
    Finalize(#[source] std::io::Error),

    #[error("Data chunk exceeds 4 GiB")]
    TooLarge,
}

/// Network errors
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Socket bind failed on {addr}: {reason}")]
    BindFailed { addr: String, reason: String },

    #[error("Receive failed: {0}")]
    ReceiveFailed(String),
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;
