//! Error types for the protocol layer.
//!
//! Decoding never fails with an error: bytes that do not match the grammar
//! decode to [`ProtocolMessage::Unknown`](crate::ProtocolMessage::Unknown)
//! and the caller decides how to react. What remains here is local input
//! that breaks the field grammar and must not be sent.

use crate::validate::Field;

/// Errors that can occur in the protocol layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// A user-supplied field does not match its grammar.
    ///
    /// Printed as e.g. "invalid display name: expected 1-20 visible
    /// characters (0x21-0x7E)".
    #[error("invalid {field}: expected {}", .field.grammar())]
    InvalidField { field: Field },
}
