//! Datagram transport: one protocol message per UDP packet.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::net::UdpSocket;

use crate::{Connection, TransportError};

/// Receive buffer size; the largest payload a UDP packet can carry.
pub const MAX_DATAGRAM_LEN: usize = 65_535;

/// A UDP [`Connection`] bound to an ephemeral local port.
///
/// The server answers from a freshly allocated port once it has picked up
/// the conversation, so the destination for outgoing datagrams follows the
/// source address of the most recent datagram received.
pub struct UdpConnection {
    socket: UdpSocket,
    /// Guarded by a blocking mutex: it is never held across an `.await`.
    peer: Mutex<SocketAddr>,
    closed: AtomicBool,
}

impl UdpConnection {
    /// Resolves `host:port` (IPv4 preferred) and binds a local socket of the
    /// matching address family.
    pub async fn connect(host: &str, port: u16) -> Result<Self, TransportError> {
        let target = format!("{host}:{port}");
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, port))
            .await
            .map_err(|source| TransportError::ConnectFailed {
                addr: target.clone(),
                source,
            })?
            .collect();

        let server = addrs
            .iter()
            .find(|a| a.is_ipv4())
            .or_else(|| addrs.first())
            .copied()
            .ok_or_else(|| TransportError::NoAddress(target.clone()))?;

        let local: SocketAddr = if server.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).await.map_err(|source| {
            TransportError::ConnectFailed {
                addr: local.to_string(),
                source,
            }
        })?;

        tracing::info!(%server, local = ?socket.local_addr().ok(), "udp socket ready");
        Ok(Self::from_socket(socket, server))
    }

    /// Wraps a bound socket that will talk to `server`.
    pub fn from_socket(socket: UdpSocket, server: SocketAddr) -> Self {
        Self {
            socket,
            peer: Mutex::new(server),
            closed: AtomicBool::new(false),
        }
    }

    /// The address outgoing datagrams are currently sent to.
    pub fn peer_addr(&self) -> SocketAddr {
        *self.peer.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The local address of the underlying socket.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    fn adopt_peer(&self, from: SocketAddr) {
        let mut peer = self.peer.lock().unwrap_or_else(|e| e.into_inner());
        if *peer != from {
            tracing::debug!(old = %*peer, new = %from, "server switched port");
            *peer = from;
        }
    }
}

impl Connection for UdpConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::ConnectionClosed(
                "udp socket already closed".into(),
            ));
        }
        let peer = self.peer_addr();
        self.socket
            .send_to(data, peer)
            .await
            .map_err(TransportError::SendFailed)?;
        Ok(())
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Ok(None);
        }
        let mut buf = vec![0u8; MAX_DATAGRAM_LEN];
        let (n, from) = self
            .socket
            .recv_from(&mut buf)
            .await
            .map_err(TransportError::ReceiveFailed)?;
        buf.truncate(n);
        self.adopt_peer(from);
        Ok(Some(buf))
    }

    async fn close(&self) -> Result<(), TransportError> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!(peer = %self.peer_addr(), "closing udp socket");
        }
        Ok(())
    }
}
