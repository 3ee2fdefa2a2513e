//! UDP datagram sink
//!
//! Fire-and-forget: one `send_to` per frame, no retries, no acknowledgment.

use super::FrameSink;
use crate::error::{Error, Result};
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

/// Sends each frame as one datagram to a fixed target
pub struct UdpSink {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpSink {
    /// Resolve `host:port` and bind an ephemeral local socket
    pub fn connect(host: &str, port: u16) -> Result<Self> {
        let target = (host, port)
            .to_socket_addrs()
            .map_err(|e| Error::Config(format!("Cannot resolve UDP host '{}': {}", host, e)))?
            .next()
            .ok_or_else(|| Error::Config(format!("No address found for UDP host '{}'", host)))?;

        // We only send, so any local port will do
        let bind_addr = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind_addr)
            .map_err(|e| Error::Other(format!("Failed to create UDP socket: {}", e)))?;

        Ok(Self::new(socket, target))
    }

    /// Use an already bound socket
    pub fn new(socket: UdpSocket, target: SocketAddr) -> Self {
        log::info!("UDP output to {}", target);
        Self { socket, target }
    }
}

impl FrameSink for UdpSink {
    fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.socket.send_to(frame, self.target)?;
        Ok(())
    }
}
