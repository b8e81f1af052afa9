//! Outbound status announcements
//!
//! Status strings are best-effort and unacknowledged. Each datagram carries
//! one message terminated by a carriage return.

use std::net::SocketAddr;
use std::sync::Arc;

use super::udp::UdpSocket;

pub const STATUS_TERMINATOR: char = '\r';

/// Anything that can publish a status line to observers
pub trait StatusSink: Send + Sync {
    fn announce(&self, message: &str);
}

/// Sends status datagrams to the broadcast address over the shared socket
pub struct Broadcaster {
    socket: Arc<UdpSocket>,
    target: SocketAddr,
}

impl Broadcaster {
    pub fn new(socket: Arc<UdpSocket>, target: SocketAddr) -> Self {
        Self { socket, target }
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

pub fn frame(message: &str) -> Vec<u8> {
    let mut payload = String::with_capacity(message.len() + 1);
    payload.push_str(message);
    payload.push(STATUS_TERMINATOR);
    payload.into_bytes()
}

impl StatusSink for Broadcaster {
    fn announce(&self, message: &str) {
        match self.socket.try_send_to(&frame(message), self.target) {
            Ok(_) => tracing::debug!("Announced {:?} to {}", message, self.target),
            Err(e) => tracing::warn!("Failed to announce {:?}: {}", message, e),
        }
    }
}

/// Fallback used before the broadcast socket exists: status only reaches
/// the local log
pub struct LogSink;

impl StatusSink for LogSink {
    fn announce(&self, message: &str) {
        tracing::error!("Unannounced status: {}", message);
    }
}
