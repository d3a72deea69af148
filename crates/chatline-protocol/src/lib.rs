//! Wire protocol for chatline.
//!
//! - **Model** ([`ProtocolMessage`], [`MessageKind`], [`MessageId`]): the
//!   closed set of messages, transport-neutral.
//! - **Grammar** ([`validate`]): field rules checked before anything is
//!   sent and after anything is decoded.
//! - **Codecs** ([`Codec`], [`TextCodec`], [`DatagramCodec`]): one wire
//!   format per transport. Decoding never fails: garbage becomes
//!   [`ProtocolMessage::Unknown`].
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Session (state machine)
//! ```

mod codec;
mod datagram;
mod error;
mod text;
mod types;
pub mod validate;

pub use codec::{Codec, Envelope};
pub use datagram::{DatagramCodec, HEADER_LEN};
pub use error::ProtocolError;
pub use text::TextCodec;
pub use types::{MessageId, MessageKind, ProtocolMessage};
pub use validate::{DISCORD_PREFIX, Field};
