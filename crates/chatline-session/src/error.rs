//! Error types for the session layer.

use chatline_protocol::ProtocolError;

use crate::ClientState;

/// Why a local intent was refused.
///
/// All of these are local faults: the caller reports them and the session
/// carries on with nothing sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// A field typed by the user breaks the protocol grammar.
    #[error(transparent)]
    InvalidField(#[from] ProtocolError),

    /// The intent is not legal in the current state, e.g. `/join` before
    /// authenticating.
    #[error("{intent} is not allowed in state {state}")]
    NotAllowed {
        intent: &'static str,
        state: ClientState,
    },

    /// The session has already ended.
    #[error("session has ended")]
    AlreadyEnded,
}
