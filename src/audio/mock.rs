//! Scripted audio backend for tests

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::device::{AudioBackend, CardInfo, Direction, Endpoint, PcmDevice};
use super::format::{bit_depth, SampleFormat};
use crate::error::AudioError;

pub fn endpoint(card_index: i32, card_name: &str, device_index: u32, name: &str, record: bool, play: bool) -> Endpoint {
    Endpoint {
        card_index,
        card_name: card_name.to_string(),
        device_index,
        name: name.to_string(),
        supports_record: record,
        supports_play: play,
    }
}

#[derive(Default)]
pub struct MockBackend {
    cards: Vec<(CardInfo, Vec<Endpoint>)>,
    cards_error: Option<String>,
    devices_error: HashMap<i32, String>,
    open_error: Option<String>,
    device: MockDevice,
    opens: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_card(mut self, index: i32, name: &str, endpoints: Vec<Endpoint>) -> Self {
        self.cards.push((CardInfo { index, name: name.to_string() }, endpoints));
        self
    }

    pub fn with_device(mut self, device: MockDevice) -> Self {
        self.device = device;
        self
    }

    pub fn failing_cards(mut self, reason: &str) -> Self {
        self.cards_error = Some(reason.to_string());
        self
    }

    pub fn failing_devices(mut self, card_index: i32, reason: &str) -> Self {
        self.devices_error.insert(card_index, reason.to_string());
        self
    }

    pub fn failing_open(mut self, reason: &str) -> Self {
        self.open_error = Some(reason.to_string());
        self
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl AudioBackend for MockBackend {
    fn cards(&self) -> Result<Vec<CardInfo>, AudioError> {
        if let Some(reason) = &self.cards_error {
            return Err(AudioError::Enumeration(reason.clone()));
        }
        Ok(self.cards.iter().map(|(card, _)| card.clone()).collect())
    }

    fn devices(&self, card: &CardInfo) -> Result<Vec<Endpoint>, AudioError> {
        if let Some(reason) = self.devices_error.get(&card.index) {
            return Err(AudioError::Enumeration(reason.clone()));
        }
        Ok(self
            .cards
            .iter()
            .find(|(c, _)| c.index == card.index)
            .map(|(_, endpoints)| endpoints.clone())
            .unwrap_or_default())
    }

    fn open(&self, endpoint: &Endpoint, _direction: Direction) -> Result<Box<dyn PcmDevice>, AudioError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.open_error {
            return Err(AudioError::Open {
                path: endpoint.path(),
                reason: reason.clone(),
            });
        }
        let mut device = self.device.clone();
        device.handed_out = true;
        device.open.store(true, Ordering::SeqCst);
        Ok(Box::new(device))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Channels,
    Rate,
    Format,
    BufferSize,
    Prepare,
    BytesPerFrame,
    Read,
}

/// Device whose negotiation answers, read pacing and failures are scripted.
///
/// Clones share their call log and counters, so a test can keep one copy
/// while the capture loop owns another.
#[derive(Clone, Default)]
pub struct MockDevice {
    channels: Option<u32>,
    rate: Option<u32>,
    format: Option<SampleFormat>,
    buffer_frames: Option<u64>,
    bytes_per_frame: Option<usize>,
    frames_per_read: Option<usize>,
    read_delay: Duration,
    fail_at: Option<Step>,
    fail_after_reads: Option<usize>,
    handed_out: bool,
    negotiated: Arc<Mutex<(u32, Option<SampleFormat>)>>,
    calls: Arc<Mutex<Vec<Step>>>,
    reads: Arc<AtomicUsize>,
    open: Arc<AtomicBool>,
}

impl MockDevice {
    pub fn with_channels(mut self, channels: u32) -> Self {
        self.channels = Some(channels);
        self
    }

    pub fn with_rate(mut self, rate: u32) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn with_format(mut self, format: SampleFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_buffer_frames(mut self, frames: u64) -> Self {
        self.buffer_frames = Some(frames);
        self
    }

    pub fn with_bytes_per_frame(mut self, bytes: usize) -> Self {
        self.bytes_per_frame = Some(bytes);
        self
    }

    /// Return fewer frames than the buffer holds on each read
    pub fn with_short_reads(mut self, frames: usize) -> Self {
        self.frames_per_read = Some(frames);
        self
    }

    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = delay;
        self
    }

    pub fn failing_at(mut self, step: Step) -> Self {
        self.fail_at = Some(step);
        self
    }

    pub fn failing_after_reads(mut self, reads: usize) -> Self {
        self.fail_after_reads = Some(reads);
        self
    }

    pub fn calls(&self) -> Vec<Step> {
        self.calls.lock().clone()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn frame_size(&self) -> usize {
        if let Some(bytes) = self.bytes_per_frame {
            return bytes;
        }
        let (channels, format) = *self.negotiated.lock();
        let bits = match format.and_then(|f| bit_depth(f).ok()).unwrap_or(8) {
            // 24-bit samples sit in 4-byte containers
            24 => 32,
            bits => bits,
        };
        channels as usize * bits as usize / 8
    }

    fn step(&self, step: Step) -> Result<(), AudioError> {
        self.calls.lock().push(step);
        if self.fail_at == Some(step) {
            let reason = format!("injected {:?} failure", step);
            return Err(match step {
                Step::Prepare => AudioError::Prepare(reason),
                Step::Read => AudioError::Read(reason),
                Step::Channels => AudioError::Negotiation { param: "channels", reason },
                Step::Rate => AudioError::Negotiation { param: "rate", reason },
                Step::Format => AudioError::Negotiation { param: "format", reason },
                Step::BufferSize => AudioError::Negotiation { param: "buffer size", reason },
                Step::BytesPerFrame => AudioError::InvalidFrameSize(0),
            });
        }
        Ok(())
    }
}

impl PcmDevice for MockDevice {
    fn negotiate_channels(&mut self, requested: u32) -> Result<u32, AudioError> {
        self.step(Step::Channels)?;
        let channels = self.channels.unwrap_or(requested);
        self.negotiated.lock().0 = channels;
        Ok(channels)
    }

    fn negotiate_rate(&mut self, requested: u32) -> Result<u32, AudioError> {
        self.step(Step::Rate)?;
        Ok(self.rate.unwrap_or(requested))
    }

    fn negotiate_format(&mut self, requested: SampleFormat) -> Result<SampleFormat, AudioError> {
        self.step(Step::Format)?;
        let format = self.format.unwrap_or(requested);
        self.negotiated.lock().1 = Some(format);
        Ok(format)
    }

    fn negotiate_buffer_size(&mut self, _min: u64, max: u64) -> Result<u64, AudioError> {
        self.step(Step::BufferSize)?;
        Ok(self.buffer_frames.unwrap_or(max))
    }

    fn prepare(&mut self) -> Result<(), AudioError> {
        self.step(Step::Prepare)
    }

    fn bytes_per_frame(&self) -> Result<usize, AudioError> {
        self.step(Step::BytesPerFrame)?;
        Ok(self.frame_size())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, AudioError> {
        let count = self.reads.fetch_add(1, Ordering::SeqCst);
        if !self.read_delay.is_zero() {
            std::thread::sleep(self.read_delay);
        }
        if self.fail_after_reads.is_some_and(|limit| count >= limit) {
            self.calls.lock().push(Step::Read);
            return Err(AudioError::Read(format!("injected failure on read {}", count)));
        }
        self.step(Step::Read)?;

        let bytes_per_frame = self.frame_size().max(1);
        let capacity = buf.len() / bytes_per_frame;
        let frames = self.frames_per_read.map_or(capacity, |f| f.min(capacity));
        for (i, byte) in buf[..frames * bytes_per_frame].iter_mut().enumerate() {
            *byte = (i % 251) as u8;
        }
        Ok(frames)
    }
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        if self.handed_out {
            self.open.store(false, Ordering::SeqCst);
        }
    }
}
