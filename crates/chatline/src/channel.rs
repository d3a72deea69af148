use chatline_protocol::{MessageId, ProtocolMessage};

use crate::ChatError;

/// A decoded message from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub message: ProtocolMessage,
    /// The datagram message ID; `None` on the stream transport.
    pub id: Option<MessageId>,
}

/// A message-level connection to the server, one per transport.
///
/// Implementations own the socket and the codec, and for datagrams the
/// reliability machinery. The client's inbound loop calls [`receive`] and
/// [`acknowledge`] while the outbound loop calls [`send`], so one reader
/// and one writer must be able to work at the same time.
///
/// [`receive`]: MessageChannel::receive
/// [`acknowledge`]: MessageChannel::acknowledge
/// [`send`]: MessageChannel::send
pub trait MessageChannel: Send + Sync + 'static {
    /// Sends a message, returning once it is known to be delivered as far as
    /// the transport can tell.
    async fn send(&self, message: &ProtocolMessage) -> Result<(), ChatError>;

    /// Receives the next message for the state machine. Transport-level
    /// traffic (confirmations, duplicates) is handled internally.
    ///
    /// Returns `Ok(None)` once the server has closed the connection.
    async fn receive(&self) -> Result<Option<Inbound>, ChatError>;

    /// Acknowledges a message after it was handled, if the transport
    /// requires it.
    async fn acknowledge(&self, inbound: &Inbound) -> Result<(), ChatError>;

    /// Releases the connection.
    async fn close(&self) -> Result<(), ChatError>;
}
