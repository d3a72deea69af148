//! Unified error type for the chatline client.

use std::time::Duration;

use chatline_protocol::{MessageId, MessageKind, ProtocolError};
use chatline_session::SessionError;
use chatline_transport::TransportError;

use crate::ClientOutcome;

/// Top-level error that wraps all crate-specific errors and adds the
/// protocol faults that end a session.
///
/// The `#[from]` attribute on the wrapper variants lets `?` convert
/// sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// A transport-level error (connect, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A field broke the protocol grammar.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A local intent was refused by the state machine.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A datagram was never confirmed, even after retransmission.
    #[error("{kind} message {id} was not confirmed after {attempts} attempts")]
    DeliveryTimeout {
        kind: MessageKind,
        id: MessageId,
        attempts: u32,
    },

    /// The server sent something that does not parse, or that it must
    /// never send.
    #[error("malformed message from server")]
    MalformedMessage,

    /// The server sent a `REPLY` while no request was outstanding.
    #[error("unexpected reply from server")]
    UnexpectedReply,

    /// The server did not answer a request in time.
    #[error("no reply from server within {0:?}")]
    NoReply(Duration),
}

impl ChatError {
    /// How a run that failed with this error ended.
    pub fn outcome(&self) -> ClientOutcome {
        match self {
            Self::Transport(_) => ClientOutcome::ConnectionFailed,
            Self::Protocol(_) | Self::Session(_) => ClientOutcome::CommandLine,
            Self::DeliveryTimeout { .. } => ClientOutcome::DeliveryTimeout,
            Self::MalformedMessage => ClientOutcome::MalformedMessage,
            Self::UnexpectedReply => ClientOutcome::UnexpectedReply,
            Self::NoReply(_) => ClientOutcome::NoReply,
        }
    }
}
