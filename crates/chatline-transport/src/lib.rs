//! Transport layer for chatline.
//!
//! Provides the [`Connection`] trait, a byte-level `{send, recv, close}`
//! capability, and its two implementations:
//!
//! - [`TcpConnection`] — a reliable byte stream framed into CRLF-terminated
//!   lines. One `recv` returns exactly one line with the terminator removed.
//! - [`UdpConnection`] — unreliable datagrams. One `recv` returns exactly one
//!   datagram. Reliability is layered on top by the `chatline` crate.
//!
//! Both connections allow one concurrent reader plus one concurrent writer,
//! which is exactly what the client's inbound/outbound loops need.

#![allow(async_fn_in_trait)]

mod error;
mod tcp;
mod udp;

pub use error::TransportError;
pub use tcp::{MAX_LINE_LEN, TcpConnection};
pub use udp::{MAX_DATAGRAM_LEN, UdpConnection};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which transport the client speaks. Chosen once at startup.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Reliable, ordered byte stream (TCP).
    #[default]
    Stream,
    /// Unreliable datagrams (UDP).
    Datagram,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stream => f.write_str("tcp"),
            Self::Datagram => f.write_str("udp"),
        }
    }
}

impl FromStr for TransportKind {
    type Err = String;

    /// Accepts the command-line spellings `tcp` and `udp` (any case), as
    /// well as the serialized names `stream` and `datagram`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" | "stream" => Ok(Self::Stream),
            "udp" | "datagram" => Ok(Self::Datagram),
            other => Err(format!("unknown transport '{other}', use tcp or udp")),
        }
    }
}

/// A single connection to the chat server that moves raw bytes.
///
/// Message framing is the connection's job: for a stream this means line
/// splitting, for datagrams the packet boundary is the frame.
pub trait Connection: Send + Sync + 'static {
    /// Sends one frame to the server.
    async fn send(&self, data: &[u8]) -> Result<(), TransportError>;

    /// Receives the next frame from the server.
    ///
    /// Returns `Ok(None)` when the peer closed the connection.
    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError>;

    /// Releases the connection. Later sends fail with
    /// [`TransportError::ConnectionClosed`].
    async fn close(&self) -> Result<(), TransportError>;
}
