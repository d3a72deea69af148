//! Stream transport: a TCP connection framed into CRLF-terminated lines.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;

use crate::{Connection, TransportError};

/// Longest line accepted before it is handed up unterminated.
///
/// A chat line carries at most 60 000 content bytes plus a short keyword
/// prefix, so anything longer is garbage and will decode as unknown.
pub const MAX_LINE_LEN: usize = 70_000;

const TERMINATOR: &[u8] = b"\r\n";

/// A TCP [`Connection`] speaking one message per CRLF-terminated line.
///
/// The socket is split into halves so the inbound loop can sit in `recv`
/// while the outbound loop writes; each half has its own lock.
pub struct TcpConnection {
    peer: Option<SocketAddr>,
    reader: Mutex<BufReader<OwnedReadHalf>>,
    writer: Mutex<OwnedWriteHalf>,
    closed: AtomicBool,
}

impl TcpConnection {
    /// Connects to `host:port`, trying every address the host resolves to.
    pub async fn connect(host: &str, port: u16) -> Result<Self, TransportError> {
        let stream = TcpStream::connect((host, port)).await.map_err(|source| {
            TransportError::ConnectFailed {
                addr: format!("{host}:{port}"),
                source,
            }
        })?;
        let conn = Self::from_stream(stream);
        tracing::info!(peer = ?conn.peer, "tcp connection established");
        Ok(conn)
    }

    /// Wraps an already-connected stream.
    pub fn from_stream(stream: TcpStream) -> Self {
        let peer = stream.peer_addr().ok();
        let (read_half, write_half) = stream.into_split();
        Self {
            peer,
            reader: Mutex::new(BufReader::new(read_half)),
            writer: Mutex::new(write_half),
            closed: AtomicBool::new(false),
        }
    }

    /// The server address, if the socket still knows it.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }
}

impl Connection for TcpConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::ConnectionClosed(
                "tcp connection already closed".into(),
            ));
        }

        let mut frame = Vec::with_capacity(data.len() + TERMINATOR.len());
        frame.extend_from_slice(data);
        frame.extend_from_slice(TERMINATOR);

        let mut writer = self.writer.lock().await;
        writer
            .write_all(&frame)
            .await
            .map_err(TransportError::SendFailed)?;
        writer.flush().await.map_err(TransportError::SendFailed)
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut reader = self.reader.lock().await;
        let mut line = Vec::new();

        // Content may legally contain a bare LF, so keep reading until the
        // buffer ends with the full CRLF pair.
        loop {
            let budget = (MAX_LINE_LEN + 1).saturating_sub(line.len()) as u64;
            let n = (&mut *reader)
                .take(budget)
                .read_until(b'\n', &mut line)
                .await
                .map_err(TransportError::ReceiveFailed)?;

            if n == 0 {
                if !line.is_empty() {
                    tracing::debug!(
                        len = line.len(),
                        "dropping unterminated line at end of stream"
                    );
                }
                return Ok(None);
            }

            if line.ends_with(TERMINATOR) {
                line.truncate(line.len() - TERMINATOR.len());
                return Ok(Some(line));
            }

            if line.len() > MAX_LINE_LEN {
                tracing::warn!(len = line.len(), "oversized line from server");
                return Ok(Some(line));
            }
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        tracing::debug!(peer = ?self.peer, "closing tcp connection");
        match self.writer.lock().await.shutdown().await {
            Ok(()) => Ok(()),
            // The peer may already be gone; that still counts as closed.
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(TransportError::SendFailed(e)),
        }
    }
}
