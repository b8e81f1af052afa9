//! RIFF/WAVE writer for raw interleaved frames
//!
//! The header is written up front from the negotiated format; only the RIFF
//! and data size fields are patched when the writer is finalized. Formats
//! whose samples sit in a wider container than their significant bits (ALSA's
//! 24-bit formats use 4 bytes) get a `WAVE_FORMAT_EXTENSIBLE` fmt chunk.

use std::io::{Seek, SeekFrom, Write};

use crate::audio::NegotiatedFormat;
use crate::error::{AudioError, CodecError};

/// Size of the canonical PCM header
pub const WAV_HEADER_SIZE: usize = 44;

/// Size of the header with a `WAVE_FORMAT_EXTENSIBLE` fmt chunk
pub const EXTENSIBLE_HEADER_SIZE: usize = 68;

const FORMAT_PCM: u16 = 1;
const FORMAT_IEEE_FLOAT: u16 = 3;
const FORMAT_EXTENSIBLE: u16 = 0xfffe;

/// Tail of the KSDATAFORMAT_SUBTYPE GUIDs; the first two bytes carry the
/// plain format code.
const SUBFORMAT_GUID_TAIL: [u8; 14] = [
    0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x80, 0x00, 0x00, 0xaa, 0x00, 0x38, 0x9b, 0x71,
];

/// Header fields that must match the frame stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Interleaved channel count
    pub channels: u16,
    /// Frames per second
    pub sample_rate: u32,
    /// Significant bits in each sample
    pub bits_per_sample: u16,
    /// Bytes per interleaved frame, exactly as the device delivers it
    pub block_align: u16,
    /// IEEE float samples rather than integer PCM
    pub float: bool,
}

impl WavSpec {
    /// Header spec for a negotiated format. Fails when the device's frame
    /// layout can't be described by a WAV header.
    pub fn from_format(format: &NegotiatedFormat) -> Result<Self, AudioError> {
        let channels = u16::try_from(format.channels)
            .ok()
            .filter(|&channels| channels > 0)
            .ok_or_else(|| AudioError::Negotiation {
                param: "channels",
                reason: format!("{} channels can't be stored in a WAV file", format.channels),
            })?;

        let block_align = u16::try_from(format.bytes_per_frame)
            .ok()
            .filter(|&align| {
                let sample_bytes = align / channels;
                align % channels == 0 && sample_bytes <= 8 && sample_bytes * 8 >= format.bits_per_sample
            })
            .ok_or(AudioError::InvalidFrameSize(format.bytes_per_frame))?;

        Ok(Self {
            channels,
            sample_rate: format.sample_rate,
            bits_per_sample: format.bits_per_sample,
            block_align,
            float: format.sample_format.is_float(),
        })
    }

    /// Bits each sample occupies on disk
    fn container_bits(&self) -> u16 {
        self.block_align / self.channels * 8
    }

    fn is_extensible(&self) -> bool {
        self.container_bits() != self.bits_per_sample
    }

    fn byte_rate(&self) -> u32 {
        self.sample_rate.saturating_mul(self.block_align as u32)
    }

    fn format_code(&self) -> u16 {
        if self.float {
            FORMAT_IEEE_FLOAT
        } else {
            FORMAT_PCM
        }
    }

    /// Header length in bytes; the data chunk starts right after it
    pub fn header_len(&self) -> usize {
        if self.is_extensible() {
            EXTENSIBLE_HEADER_SIZE
        } else {
            WAV_HEADER_SIZE
        }
    }

    /// RIFF size field minus the data bytes
    fn riff_overhead(&self) -> u32 {
        (self.header_len() - 8) as u32
    }

    /// Largest data chunk whose padded RIFF size still fits 32 bits
    fn max_data_bytes(&self) -> u64 {
        u32::MAX as u64 - self.riff_overhead() as u64 - 1
    }

    /// Header with the given data size filled in
    pub fn header(&self, data_size: u32) -> Vec<u8> {
        let extensible = self.is_extensible();
        let mut header = Vec::with_capacity(self.header_len());

        header.extend_from_slice(b"RIFF");
        header.extend_from_slice(&self.riff_overhead().saturating_add(data_size).to_le_bytes());
        header.extend_from_slice(b"WAVE");

        header.extend_from_slice(b"fmt ");
        let (fmt_size, tag) = if extensible {
            (40u32, FORMAT_EXTENSIBLE)
        } else {
            (16u32, self.format_code())
        };
        header.extend_from_slice(&fmt_size.to_le_bytes());
        header.extend_from_slice(&tag.to_le_bytes());
        header.extend_from_slice(&self.channels.to_le_bytes());
        header.extend_from_slice(&self.sample_rate.to_le_bytes());
        header.extend_from_slice(&self.byte_rate().to_le_bytes());
        header.extend_from_slice(&self.block_align.to_le_bytes());
        header.extend_from_slice(&self.container_bits().to_le_bytes());

        if extensible {
            header.extend_from_slice(&22u16.to_le_bytes());
            header.extend_from_slice(&self.bits_per_sample.to_le_bytes());
            // Speaker positions unspecified
            header.extend_from_slice(&0u32.to_le_bytes());
            header.extend_from_slice(&self.format_code().to_le_bytes());
            header.extend_from_slice(&SUBFORMAT_GUID_TAIL);
        }

        header.extend_from_slice(b"data");
        header.extend_from_slice(&data_size.to_le_bytes());

        header
    }
}

/// Streams raw sample bytes behind a WAV header
pub struct WavWriter<W: Write + Seek> {
    inner: W,
    spec: WavSpec,
    data_bytes: u64,
}

impl<W: Write + Seek> WavWriter<W> {
    /// Write the header and return a writer positioned at the data chunk
    pub fn new(mut inner: W, spec: WavSpec) -> Result<Self, CodecError> {
        inner.write_all(&spec.header(0)).map_err(CodecError::Header)?;
        Ok(Self {
            inner,
            spec,
            data_bytes: 0,
        })
    }

    pub fn spec(&self) -> WavSpec {
        self.spec
    }

    pub fn data_bytes(&self) -> u64 {
        self.data_bytes
    }

    /// Append interleaved sample bytes
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        if self.data_bytes + bytes.len() as u64 > self.spec.max_data_bytes() {
            return Err(CodecError::TooLarge);
        }
        self.inner.write_all(bytes).map_err(CodecError::Write)?;
        self.data_bytes += bytes.len() as u64;
        Ok(())
    }

    /// Patch the size fields, flush, and hand back the underlying writer
    pub fn finalize(mut self) -> Result<W, CodecError> {
        let data_size = u32::try_from(self.data_bytes).map_err(|_| CodecError::TooLarge)?;
        let padding = data_size % 2;
        let riff_size = self
            .spec
            .riff_overhead()
            .checked_add(data_size)
            .and_then(|size| size.checked_add(padding))
            .ok_or(CodecError::TooLarge)?;
        let data_size_offset = (self.spec.header_len() - 4) as u64;

        let mut patch = || -> std::io::Result<()> {
            if padding == 1 {
                // RIFF chunks are word aligned
                self.inner.write_all(&[0])?;
            }
            self.inner.seek(SeekFrom::Start(4))?;
            self.inner.write_all(&riff_size.to_le_bytes())?;
            self.inner.seek(SeekFrom::Start(data_size_offset))?;
            self.inner.write_all(&data_size.to_le_bytes())?;
            self.inner.seek(SeekFrom::End(0))?;
            self.inner.flush()
        };
        patch().map_err(CodecError::Finalize)?;
        Ok(self.inner)
    }
}
