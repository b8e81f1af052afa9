//! Container encoding for captured frames
//!
//! Frames are stored exactly as the device delivers them; the only
//! container is WAV.

pub mod wav;

pub use wav::{WavSpec, WavWriter, EXTENSIBLE_HEADER_SIZE, WAV_HEADER_SIZE};
