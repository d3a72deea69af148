//! The [`Codec`] seam between messages and wire bytes.

use crate::{MessageId, ProtocolMessage};

/// A message together with its datagram ID.
///
/// Stream-borne envelopes have `id: None`. Outbound datagram envelopes
/// always carry an ID; the binding assigns it before encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub id: Option<MessageId>,
    pub message: ProtocolMessage,
}

impl Envelope {
    /// An envelope without an ID, as used on the stream transport.
    pub fn bare(message: ProtocolMessage) -> Self {
        Self { id: None, message }
    }

    pub fn with_id(id: MessageId, message: ProtocolMessage) -> Self {
        Self {
            id: Some(id),
            message,
        }
    }
}

/// Converts envelopes to and from one transport's wire format.
///
/// Both directions are total:
///
/// - `encode` assumes the fields already passed validation and never fails.
///   Messages the format cannot carry encode to an empty buffer.
/// - `decode` never fails either. Bytes that do not match the grammar come
///   back as [`ProtocolMessage::Unknown`], leaving the reaction to the
///   state machine.
///
/// `Send + Sync + 'static` lets a codec sit inside bindings shared by the
/// client's inbound and outbound loops.
pub trait Codec: Send + Sync + 'static {
    fn encode(&self, envelope: &Envelope) -> Vec<u8>;

    fn decode(&self, data: &[u8]) -> Envelope;
}
