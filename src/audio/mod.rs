//! Audio subsystem module

pub mod capture;
pub mod device;
pub mod discovery;
pub mod format;
pub mod negotiate;

#[cfg(feature = "alsa")]
pub mod alsa;

#[cfg(test)]
pub(crate) mod mock;

pub use capture::{AudioCapture, CaptureSummary};
pub use device::{AudioBackend, CardInfo, Direction, Endpoint, PcmDevice};
pub use discovery::{find_devices, DeviceSet};
pub use format::{bit_depth, SampleFormat};
pub use negotiate::{negotiate, NegotiatedFormat};
