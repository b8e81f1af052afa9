//! Command dispatcher
//!
//! Reads datagrams off the shared broadcast socket forever and feeds the
//! recognized ones to the session manager in arrival order.

use std::sync::Arc;

use super::manager::SessionManager;
use crate::error::NetworkError;
use crate::network::UdpSocket;
use crate::protocol::Command;
use crate::supervisor::Supervisor;

pub struct Dispatcher {
    /// Shared broadcast socket commands arrive on
    socket: Arc<UdpSocket>,
    /// Session state the commands act on
    sessions: SessionManager,
    /// Receives socket errors
    supervisor: Supervisor,
    /// Bytes read per datagram
    recv_buffer_size: usize,
}

impl Dispatcher {
    pub fn new(socket: Arc<UdpSocket>, sessions: SessionManager, supervisor: Supervisor, recv_buffer_size: usize) -> Self {
        Self {
            socket,
            sessions,
            supervisor,
            recv_buffer_size,
        }
    }

    /// Receive loop. A socket error goes to the supervisor, which never
    /// hands control back in production.
    pub async fn run(mut self) {
        let mut buf = vec![0u8; self.recv_buffer_size];
        tracing::info!("Listening for commands on {:?}", self.socket.local_addr().ok());

        loop {
            let (len, peer) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(e) => {
                    self.supervisor.fail(NetworkError::ReceiveFailed(e.to_string())).await;
                    return;
                }
            };

            match Command::parse(&buf[..len]) {
                Some(command) => {
                    tracing::debug!("{:?} from {}", command, peer);
                    self.sessions.handle(command).await;
                }
                None => tracing::trace!("Ignoring {} byte datagram from {}", len, peer),
            }
        }
    }
}
