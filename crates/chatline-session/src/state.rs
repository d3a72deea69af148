use std::fmt;

use serde::{Deserialize, Serialize};

/// Where the client is in the conversation with the server.
///
/// ```text
///   Start ──AUTH──→ Auth ──REPLY OK──→ Open ──JOIN──→ Join
///                   ↑  │                ↑              │
///                   └──┘ REPLY NOK      └───REPLY──────┘
///
///   any state ──ERR / BYE (either direction)──→ End
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ClientState {
    /// Connected, not yet authenticated.
    #[default]
    Start,
    /// `AUTH` sent; waiting for a positive reply, or retrying after a
    /// negative one.
    Auth,
    /// Authenticated and in a channel. Chat is allowed.
    Open,
    /// `JOIN` sent; waiting for the reply.
    Join,
    /// Terminal. Nothing more is sent or processed.
    End,
}

impl ClientState {
    /// `Auth` and `Join` are the states in which a `REPLY` is legal.
    pub fn expects_reply(self) -> bool {
        matches!(self, Self::Auth | Self::Join)
    }
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Start => "START",
            Self::Auth => "AUTH",
            Self::Open => "OPEN",
            Self::Join => "JOIN",
            Self::End => "END",
        })
    }
}
