//! The message model shared by both wire formats.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Message IDs
// ---------------------------------------------------------------------------

/// A 16-bit datagram message ID.
///
/// The sender assigns IDs from a counter that silently wraps at 65536; the
/// receiver echoes the ID back in a `CONFIRM`. Stream-borne messages carry
/// no ID at all.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct MessageId(pub u16);

impl MessageId {
    /// Big-endian wire bytes.
    pub fn to_be_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    /// Reads an ID from big-endian wire bytes.
    pub fn from_be_bytes(bytes: [u8; 2]) -> Self {
        Self(u16::from_be_bytes(bytes))
    }

    /// The ID that follows this one, wrapping to zero after `u16::MAX`.
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u16> for MessageId {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

// ---------------------------------------------------------------------------
// Message kinds
// ---------------------------------------------------------------------------

/// The type tag of a [`ProtocolMessage`], without its fields.
///
/// Each kind owns a one-byte code in the datagram header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Confirm,
    Reply,
    Auth,
    Join,
    Chat,
    Ping,
    Error,
    Bye,
    Unknown,
}

impl MessageKind {
    /// The datagram header code. `Unknown` has none of its own and maps to
    /// the unassigned value `0x05`.
    pub fn code(self) -> u8 {
        match self {
            Self::Confirm => 0x00,
            Self::Reply => 0x01,
            Self::Auth => 0x02,
            Self::Join => 0x03,
            Self::Chat => 0x04,
            Self::Ping => 0xFD,
            Self::Error => 0xFE,
            Self::Bye => 0xFF,
            Self::Unknown => 0x05,
        }
    }

    /// Looks up a header code; unassigned codes map to `Unknown`.
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => Self::Confirm,
            0x01 => Self::Reply,
            0x02 => Self::Auth,
            0x03 => Self::Join,
            0x04 => Self::Chat,
            0xFD => Self::Ping,
            0xFE => Self::Error,
            0xFF => Self::Bye,
            _ => Self::Unknown,
        }
    }

    /// `ERR` and `BYE` end the conversation; losing one is fatal.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Error | Self::Bye)
    }

    /// Kinds the receiver must acknowledge with a `CONFIRM` on the datagram
    /// transport.
    ///
    /// `Auth` and `Join` are client-to-server only and never arrive here.
    pub fn requires_confirm(self) -> bool {
        matches!(
            self,
            Self::Reply | Self::Chat | Self::Error | Self::Bye | Self::Ping
        )
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Confirm => "CONFIRM",
            Self::Reply => "REPLY",
            Self::Auth => "AUTH",
            Self::Join => "JOIN",
            Self::Chat => "MSG",
            Self::Ping => "PING",
            Self::Error => "ERR",
            Self::Bye => "BYE",
            Self::Unknown => "UNKNOWN",
        })
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Every message the client can send or receive.
///
/// The set is closed: anything the codecs cannot recognize becomes
/// [`ProtocolMessage::Unknown`] rather than an error. Fields are carried
/// transport-neutral; the datagram message ID lives beside the message in
/// an [`Envelope`](crate::Envelope).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProtocolMessage {
    Auth {
        username: String,
        display_name: String,
        secret: String,
    },
    Join {
        channel_id: String,
        display_name: String,
    },
    /// `MSG FROM {sender} IS {content}`.
    Chat { sender: String, content: String },
    /// `ERR FROM {sender} IS {content}`.
    Error { sender: String, content: String },
    Bye { sender: String },
    /// Server answer to an `Auth` or `Join`.
    ///
    /// `ref_id` names the request being answered; the stream format has no
    /// IDs so it is `None` there.
    Reply {
        success: bool,
        content: String,
        ref_id: Option<MessageId>,
    },
    /// Datagram-only acknowledgment of the message with `ref_id`.
    Confirm { ref_id: MessageId },
    Ping,
    Unknown,
}

impl ProtocolMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Auth { .. } => MessageKind::Auth,
            Self::Join { .. } => MessageKind::Join,
            Self::Chat { .. } => MessageKind::Chat,
            Self::Error { .. } => MessageKind::Error,
            Self::Bye { .. } => MessageKind::Bye,
            Self::Reply { .. } => MessageKind::Reply,
            Self::Confirm { .. } => MessageKind::Confirm,
            Self::Ping => MessageKind::Ping,
            Self::Unknown => MessageKind::Unknown,
        }
    }
}
