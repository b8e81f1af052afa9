//! ALSA hardware backend
//!
//! Negotiated values are kept on the device and re-applied to a fresh
//! hardware parameter space for every step, so each step sees the
//! restrictions of the ones before it. Nothing is installed until `prepare`.

use ::alsa::card::{Card, Iter as CardIter};
use ::alsa::ctl::{Ctl, DeviceIter};
use ::alsa::pcm::{Access, Format, Frames, HwParams, PCM};
use ::alsa::{Direction as AlsaDirection, ValueOr};

use super::device::{AudioBackend, CardInfo, Direction, Endpoint, PcmDevice};
use super::format::SampleFormat;
use crate::error::AudioError;

/// Formats tried, in order, when the device refuses the requested one
const FALLBACK_FORMATS: [Format; 6] = [
    Format::S16LE,
    Format::S32LE,
    Format::S24LE,
    Format::FloatLE,
    Format::S8,
    Format::U8,
];

#[derive(Debug, Default)]
pub struct AlsaBackend;

impl AlsaBackend {
    pub fn new() -> Self {
        Self
    }
}

fn enumeration_error(context: &str, err: ::alsa::Error) -> AudioError {
    AudioError::Enumeration(format!("{}: {}", context, err))
}

impl AudioBackend for AlsaBackend {
    fn cards(&self) -> Result<Vec<CardInfo>, AudioError> {
        let mut cards = Vec::new();
        for card in CardIter::new() {
            let card = card.map_err(|e| enumeration_error("card iteration", e))?;
            let name = card
                .get_name()
                .map_err(|e| enumeration_error(&format!("card {} name", card.get_index()), e))?;
            cards.push(CardInfo {
                index: card.get_index(),
                name,
            });
        }
        Ok(cards)
    }

    fn devices(&self, card: &CardInfo) -> Result<Vec<Endpoint>, AudioError> {
        let ctl = Ctl::from_card(&Card::new(card.index), false)
            .map_err(|e| enumeration_error(&format!("control for card {}", card.index), e))?;

        let mut endpoints = Vec::new();
        for device in DeviceIter::new(&ctl) {
            let device = device as u32;
            let capture = ctl.pcm_info(device, 0, AlsaDirection::Capture).ok();
            let playback = ctl.pcm_info(device, 0, AlsaDirection::Playback).ok();

            let name = capture
                .as_ref()
                .or(playback.as_ref())
                .and_then(|info| info.get_name().ok())
                .map(str::to_string)
                .unwrap_or_else(|| format!("device {}", device));

            endpoints.push(Endpoint {
                card_index: card.index,
                card_name: card.name.clone(),
                device_index: device,
                name,
                supports_record: capture.is_some(),
                supports_play: playback.is_some(),
            });
        }
        Ok(endpoints)
    }

    fn open(&self, endpoint: &Endpoint, direction: Direction) -> Result<Box<dyn PcmDevice>, AudioError> {
        let path = endpoint.path();
        let alsa_direction = match direction {
            Direction::Capture => AlsaDirection::Capture,
            Direction::Playback => AlsaDirection::Playback,
        };
        let pcm = PCM::new(&path, alsa_direction, false).map_err(|e| AudioError::Open {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        tracing::debug!("Opened {}", path);
        Ok(Box::new(AlsaDevice::new(pcm)))
    }
}

/// An open PCM plus the parameters settled so far
pub struct AlsaDevice {
    pcm: PCM,
    channels: Option<u32>,
    rate: Option<u32>,
    format: Option<Format>,
    buffer_frames: Option<Frames>,
}

impl AlsaDevice {
    fn new(pcm: PCM) -> Self {
        Self {
            pcm,
            channels: None,
            rate: None,
            format: None,
            buffer_frames: None,
        }
    }

    /// Fresh parameter space restricted by everything negotiated so far
    fn constrained(&self) -> Result<HwParams<'_>, ::alsa::Error> {
        let hwp = HwParams::any(&self.pcm)?;
        hwp.set_access(Access::RWInterleaved)?;
        if let Some(channels) = self.channels {
            hwp.set_channels(channels)?;
        }
        if let Some(rate) = self.rate {
            hwp.set_rate(rate, ValueOr::Nearest)?;
        }
        if let Some(format) = self.format {
            hwp.set_format(format)?;
        }
        if let Some(frames) = self.buffer_frames {
            hwp.set_buffer_size(frames)?;
        }
        Ok(hwp)
    }

    fn try_format(&self, format: Format) -> Result<(), ::alsa::Error> {
        self.constrained()?.set_format(format)
    }
}

fn negotiation_error(param: &'static str, err: ::alsa::Error) -> AudioError {
    AudioError::Negotiation {
        param,
        reason: err.to_string(),
    }
}

impl PcmDevice for AlsaDevice {
    fn negotiate_channels(&mut self, requested: u32) -> Result<u32, AudioError> {
        let channels = self
            .constrained()
            .and_then(|hwp| hwp.set_channels_near(requested))
            .map_err(|e| negotiation_error("channels", e))?;
        self.channels = Some(channels);
        Ok(channels)
    }

    fn negotiate_rate(&mut self, requested: u32) -> Result<u32, AudioError> {
        let rate = self
            .constrained()
            .and_then(|hwp| hwp.set_rate_near(requested, ValueOr::Nearest))
            .map_err(|e| negotiation_error("rate", e))?;
        self.rate = Some(rate);
        Ok(rate)
    }

    fn negotiate_format(&mut self, requested: SampleFormat) -> Result<SampleFormat, AudioError> {
        let requested_err = match to_alsa_format(requested) {
            Some(format) => match self.try_format(format) {
                Ok(()) => {
                    self.format = Some(format);
                    return Ok(requested);
                }
                Err(e) => e.to_string(),
            },
            None => format!("{} has no ALSA equivalent", requested),
        };

        for format in FALLBACK_FORMATS {
            if self.try_format(format).is_ok() {
                self.format = Some(format);
                return Ok(from_alsa_format(format));
            }
        }

        Err(AudioError::Negotiation {
            param: "format",
            reason: requested_err,
        })
    }

    fn negotiate_buffer_size(&mut self, min: u64, max: u64) -> Result<u64, AudioError> {
        let frames = self
            .constrained()
            .and_then(|hwp| {
                hwp.set_buffer_size_min(min as Frames)?;
                hwp.set_buffer_size_max(max as Frames)?;
                hwp.set_buffer_size_near(max as Frames)
            })
            .map_err(|e| negotiation_error("buffer size", e))?;
        self.buffer_frames = Some(frames);
        Ok(frames as u64)
    }

    fn prepare(&mut self) -> Result<(), AudioError> {
        let hwp = self.constrained().map_err(|e| AudioError::Prepare(e.to_string()))?;
        self.pcm.hw_params(&hwp).map_err(|e| AudioError::Prepare(e.to_string()))?;
        drop(hwp);
        self.pcm.prepare().map_err(|e| AudioError::Prepare(e.to_string()))
    }

    fn bytes_per_frame(&self) -> Result<usize, AudioError> {
        let bytes = self.pcm.frames_to_bytes(1);
        if bytes <= 0 {
            return Err(AudioError::InvalidFrameSize(0));
        }
        Ok(bytes as usize)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, AudioError> {
        self.pcm
            .io_bytes()
            .readi(buf)
            .map_err(|e| AudioError::Read(e.to_string()))
    }
}

fn to_alsa_format(format: SampleFormat) -> Option<Format> {
    use SampleFormat as S;

    Some(match format {
        S::S8 => Format::S8,
        S::U8 => Format::U8,
        S::S16LE => Format::S16LE,
        S::S16BE => Format::S16BE,
        S::U16LE => Format::U16LE,
        S::U16BE => Format::U16BE,
        S::S24LE => Format::S24LE,
        S::S24BE => Format::S24BE,
        S::U24LE => Format::U24LE,
        S::U24BE => Format::U24BE,
        S::S32LE => Format::S32LE,
        S::S32BE => Format::S32BE,
        S::U32LE => Format::U32LE,
        S::U32BE => Format::U32BE,
        S::FloatLE => Format::FloatLE,
        S::FloatBE => Format::FloatBE,
        S::Float64LE => Format::Float64LE,
        S::Float64BE => Format::Float64BE,
        S::MuLaw => Format::MuLaw,
        S::ALaw => Format::ALaw,
        S::Unknown(_) => return None,
    })
}

fn from_alsa_format(format: Format) -> SampleFormat {
    use SampleFormat as S;

    match format {
        Format::S8 => S::S8,
        Format::U8 => S::U8,
        Format::S16LE => S::S16LE,
        Format::S16BE => S::S16BE,
        Format::U16LE => S::U16LE,
        Format::U16BE => S::U16BE,
        Format::S24LE => S::S24LE,
        Format::S24BE => S::S24BE,
        Format::U24LE => S::U24LE,
        Format::U24BE => S::U24BE,
        Format::S32LE => S::S32LE,
        Format::S32BE => S::S32BE,
        Format::U32LE => S::U32LE,
        Format::U32BE => S::U32BE,
        Format::FloatLE => S::FloatLE,
        Format::FloatBE => S::FloatBE,
        Format::Float64LE => S::Float64LE,
        Format::Float64BE => S::Float64BE,
        Format::MuLaw => S::MuLaw,
        Format::ALaw => S::ALaw,
        other => S::Unknown(other as i32),
    }
}
