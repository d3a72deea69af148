//! Client configuration.

use std::time::Duration;

use chatline_transport::TransportKind;
use serde::{Deserialize, Serialize};

/// Port the server listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 4567;

/// What to do when a datagram that does not end the conversation is never
/// confirmed.
///
/// A lost `ERR` or `BYE` always ends the session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutPolicy {
    /// Treat the loss as fatal and shut down.
    #[default]
    EndSession,
    /// Report the lost message and carry on. A lost `AUTH` or `JOIN` is
    /// rolled back so it can be retried.
    DropMessage,
}

/// Everything the client needs to know before it connects.
///
/// The transport is chosen once, here; nothing after startup depends on
/// which one it was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub transport: TransportKind,
    pub host: String,
    pub port: u16,
    /// How long to wait for a `CONFIRM` before retransmitting (datagram
    /// only).
    pub confirm_timeout: Duration,
    /// Retransmissions after the first attempt (datagram only).
    pub max_retransmissions: u32,
    /// Prefix channel IDs with `discord.` on join.
    pub discord: bool,
    /// How long to hold local input while waiting for the reply to an
    /// `AUTH` or `JOIN`.
    pub reply_timeout: Duration,
    pub timeout_policy: TimeoutPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::Stream,
            host: "localhost".to_owned(),
            port: DEFAULT_PORT,
            confirm_timeout: Duration::from_millis(250),
            max_retransmissions: 3,
            discord: false,
            reply_timeout: Duration::from_secs(5),
            timeout_policy: TimeoutPolicy::EndSession,
        }
    }
}

impl ClientConfig {
    /// Defaults for everything except the transport and server host.
    pub fn new(transport: TransportKind, host: impl Into<String>) -> Self {
        Self {
            transport,
            host: host.into(),
            ..Self::default()
        }
    }
}
