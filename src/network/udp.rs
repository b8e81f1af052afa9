//! Broadcast UDP socket setup

use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;

use crate::error::NetworkError;

pub use tokio::net::UdpSocket;

/// Bind a non-blocking datagram socket that may send to and receive from the
/// broadcast address. Must be called from within a tokio runtime.
pub fn create_socket(addr: SocketAddr) -> Result<UdpSocket, NetworkError> {
    let bind_error = |e: std::io::Error| NetworkError::BindFailed {
        addr: addr.to_string(),
        reason: e.to_string(),
    };

    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP)).map_err(bind_error)?;
    socket.set_reuse_address(true).map_err(bind_error)?;
    socket.set_broadcast(true).map_err(bind_error)?;
    socket.set_nonblocking(true).map_err(bind_error)?;
    socket.bind(&addr.into()).map_err(bind_error)?;

    UdpSocket::from_std(socket.into()).map_err(bind_error)
}
