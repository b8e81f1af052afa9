//! Sample formats and the format → bit depth table

use serde::Deserialize;
use std::fmt;

use crate::error::AudioError;

/// Sample encodings a device may report after negotiation.
///
/// Formats outside the bit-depth table (companded, compressed, or anything a
/// driver reports that we have no name for) are still representable so that
/// negotiation can hand them back; [`bit_depth`] rejects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum SampleFormat {
    S8,
    U8,
    S16LE,
    S16BE,
    U16LE,
    U16BE,
    S24LE,
    S24BE,
    U24LE,
    U24BE,
    S32LE,
    S32BE,
    U32LE,
    U32BE,
    FloatLE,
    FloatBE,
    Float64LE,
    Float64BE,
    MuLaw,
    ALaw,
    #[serde(skip)]
    Unknown(i32),
}

impl SampleFormat {
    /// True for IEEE floating point encodings
    pub fn is_float(self) -> bool {
        matches!(
            self,
            SampleFormat::FloatLE | SampleFormat::FloatBE | SampleFormat::Float64LE | SampleFormat::Float64BE
        )
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleFormat::Unknown(raw) => write!(f, "format #{}", raw),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Significant bits per sample for a format.
///
/// An unmapped format means a driver we don't understand; callers treat it as
/// fatal rather than guessing.
pub fn bit_depth(format: SampleFormat) -> Result<u16, AudioError> {
    use SampleFormat::*;

    match format {
        S8 | U8 => Ok(8),
        S16LE | S16BE | U16LE | U16BE => Ok(16),
        S24LE | S24BE | U24LE | U24BE => Ok(24),
        S32LE | S32BE | U32LE | U32BE => Ok(32),
        FloatLE | FloatBE => Ok(32),
        Float64LE | Float64BE => Ok(64),
        MuLaw | ALaw | Unknown(_) => Err(AudioError::UnknownFormat(format.to_string())),
    }
}
