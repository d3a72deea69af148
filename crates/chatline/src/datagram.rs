//! Message channel over the datagram transport.
//!
//! UDP may drop, duplicate or reorder packets. This binding adds
//! at-least-once sending and at-most-once handling on top:
//!
//! ```text
//!  send(msg)                               receive()
//!  ─────────                               ─────────
//!  id = next_id++                          decode packet
//!  waiters[id] = oneshot                   CONFIRM(ref) → waiters[ref].resolve()
//!  loop up to 1 + max_retransmissions:     id in seen → CONFIRM(id), drop it
//!      transmit                            otherwise mark seen, hand it up
//!      wait confirm_timeout for waiter
//!  remove waiters[id]                      acknowledge() → CONFIRM(id)
//! ```
//!
//! The waiter map and the seen set are touched by both the outbound loop
//! (registering waiters) and the inbound loop (resolving them), so both
//! live in `DashMap`/`DashSet` and the ID counter is atomic.

use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use chatline_protocol::{Codec, DatagramCodec, Envelope, MessageId, ProtocolMessage};
use chatline_transport::{Connection, UdpConnection};
use dashmap::{DashMap, DashSet};
use tokio::sync::oneshot;

use crate::{ChatError, ClientConfig, Inbound, MessageChannel};

type Waiters = DashMap<MessageId, oneshot::Sender<()>>;

/// Drop guard that removes a message's confirmation waiter.
///
/// The sending future may be dropped mid-retry when the session is
/// cancelled; the guard keeps the waiter map from leaking either way.
struct WaiterGuard<'a> {
    waiters: &'a Waiters,
    id: MessageId,
}

impl Drop for WaiterGuard<'_> {
    fn drop(&mut self) {
        self.waiters.remove(&self.id);
    }
}

/// Binary datagrams with confirmation, retransmission and duplicate
/// suppression.
pub struct DatagramBinding<C = UdpConnection> {
    conn: C,
    codec: DatagramCodec,
    next_id: AtomicU16,
    waiters: Waiters,
    seen: DashSet<MessageId>,
    confirm_timeout: Duration,
    max_retransmissions: u32,
}

impl<C: Connection> DatagramBinding<C> {
    pub fn new(conn: C, confirm_timeout: Duration, max_retransmissions: u32) -> Self {
        Self {
            conn,
            codec: DatagramCodec,
            next_id: AtomicU16::new(0),
            waiters: DashMap::new(),
            seen: DashSet::new(),
            confirm_timeout,
            max_retransmissions,
        }
    }

    /// Takes the retry settings from `config`.
    pub fn from_config(conn: C, config: &ClientConfig) -> Self {
        Self::new(conn, config.confirm_timeout, config.max_retransmissions)
    }

    /// Messages sent but not yet confirmed or given up on.
    pub fn pending_confirmations(&self) -> usize {
        self.waiters.len()
    }

    fn allocate_id(&self) -> MessageId {
        // fetch_add on an AtomicU16 wraps at 65536.
        MessageId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    async fn send_confirm(&self, ref_id: MessageId) -> Result<(), ChatError> {
        let bytes = self
            .codec
            .encode(&Envelope::bare(ProtocolMessage::Confirm { ref_id }));
        self.conn.send(&bytes).await?;
        tracing::trace!(%ref_id, "confirm sent");
        Ok(())
    }

    fn resolve(&self, ref_id: MessageId) {
        match self.waiters.remove(&ref_id) {
            Some((_, waiter)) => {
                // The sender may have given up in the meantime.
                let _ = waiter.send(());
                tracing::trace!(%ref_id, "confirmation received");
            }
            None => tracing::debug!(%ref_id, "confirm for nothing in flight"),
        }
    }
}

impl<C: Connection> MessageChannel for DatagramBinding<C> {
    async fn send(&self, message: &ProtocolMessage) -> Result<(), ChatError> {
        if let ProtocolMessage::Confirm { ref_id } = message {
            return self.send_confirm(*ref_id).await;
        }

        let kind = message.kind();
        let id = self.allocate_id();
        let (tx, mut rx) = oneshot::channel();
        self.waiters.insert(id, tx);
        let _guard = WaiterGuard {
            waiters: &self.waiters,
            id,
        };

        let bytes = self.codec.encode(&Envelope::with_id(id, message.clone()));
        let attempts = self.max_retransmissions.saturating_add(1);

        for attempt in 1..=attempts {
            self.conn.send(&bytes).await?;
            if attempt > 1 {
                tracing::debug!(%kind, %id, attempt, "retransmitted");
            }
            match tokio::time::timeout(self.confirm_timeout, &mut rx).await {
                Ok(Ok(())) => return Ok(()),
                // Only the guard removes the sender, and it is still alive.
                Ok(Err(_)) => break,
                Err(_) => continue,
            }
        }

        tracing::warn!(%kind, %id, attempts, "no confirmation, giving up");
        Err(ChatError::DeliveryTimeout { kind, id, attempts })
    }

    async fn receive(&self) -> Result<Option<Inbound>, ChatError> {
        loop {
            let Some(packet) = self.conn.recv().await? else {
                return Ok(None);
            };
            let envelope = self.codec.decode(&packet);
            let id = envelope.id.unwrap_or_default();

            match envelope.message {
                ProtocolMessage::Confirm { ref_id } => {
                    self.resolve(ref_id);
                    continue;
                }
                // Malformed packets are not confirmed and not remembered;
                // the session ends over them anyway.
                ProtocolMessage::Unknown => {
                    tracing::debug!(%id, len = packet.len(), "undecodable datagram");
                    return Ok(Some(Inbound {
                        message: ProtocolMessage::Unknown,
                        id: Some(id),
                    }));
                }
                message => {
                    if !self.seen.insert(id) {
                        tracing::debug!(%id, kind = %message.kind(), "duplicate suppressed");
                        self.send_confirm(id).await?;
                        continue;
                    }
                    return Ok(Some(Inbound {
                        message,
                        id: Some(id),
                    }));
                }
            }
        }
    }

    async fn acknowledge(&self, inbound: &Inbound) -> Result<(), ChatError> {
        match inbound.id {
            Some(id) if inbound.message.kind().requires_confirm() => {
                self.send_confirm(id).await
            }
            _ => Ok(()),
        }
    }

    async fn close(&self) -> Result<(), ChatError> {
        self.conn.close().await?;
        Ok(())
    }
}
