//! Network subsystem for the broadcast command channel

pub mod status;
pub mod udp;

pub use status::{Broadcaster, LogSink, StatusSink};
pub use udp::{create_socket, UdpSocket};
