//! Message channel over the stream transport.

use chatline_protocol::{Codec, Envelope, MessageKind, ProtocolMessage, TextCodec};
use chatline_transport::{Connection, TcpConnection};

use crate::{ChatError, Inbound, MessageChannel};

/// Text lines over a reliable stream.
///
/// The stream already guarantees ordered delivery, so there are no message
/// IDs, no confirmations and no retransmission.
pub struct StreamBinding<C = TcpConnection> {
    conn: C,
    codec: TextCodec,
}

impl<C: Connection> StreamBinding<C> {
    pub fn new(conn: C) -> Self {
        Self {
            conn,
            codec: TextCodec,
        }
    }
}

impl<C: Connection> MessageChannel for StreamBinding<C> {
    async fn send(&self, message: &ProtocolMessage) -> Result<(), ChatError> {
        let kind = message.kind();
        if matches!(
            kind,
            MessageKind::Confirm | MessageKind::Ping | MessageKind::Unknown
        ) {
            tracing::debug!(%kind, "no stream form, not sent");
            return Ok(());
        }
        let line = self.codec.encode(&Envelope::bare(message.clone()));
        self.conn.send(&line).await?;
        tracing::trace!(%kind, "line sent");
        Ok(())
    }

    async fn receive(&self) -> Result<Option<Inbound>, ChatError> {
        let Some(line) = self.conn.recv().await? else {
            return Ok(None);
        };
        let envelope = self.codec.decode(&line);
        if envelope.message == ProtocolMessage::Unknown {
            tracing::debug!(
                line = %String::from_utf8_lossy(&line),
                "undecodable line"
            );
        }
        Ok(Some(Inbound {
            message: envelope.message,
            id: None,
        }))
    }

    async fn acknowledge(&self, _inbound: &Inbound) -> Result<(), ChatError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), ChatError> {
        self.conn.close().await?;
        Ok(())
    }
}
