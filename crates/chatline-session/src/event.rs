//! What flows into the session from the user, and out of it to the user.

use serde::{Deserialize, Serialize};

/// A typed local command, produced by the command interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    /// `/auth {username} {secret} {display_name}`
    Auth {
        username: String,
        secret: String,
        display_name: String,
    },
    /// `/join {channel_id}`
    Join { channel_id: String },
    /// Any line that is not a command.
    Chat { content: String },
    /// `/rename {display_name}`; local only.
    Rename { display_name: String },
    /// `/help`; local only.
    Help,
    /// `/bye`, or end of local input.
    Bye,
}

impl Intent {
    /// The command the intent came from, for error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Auth { .. } => "/auth",
            Self::Join { .. } => "/join",
            Self::Chat { .. } => "message",
            Self::Rename { .. } => "/rename",
            Self::Help => "/help",
            Self::Bye => "/bye",
        }
    }
}

/// Something the user should see.
///
/// The session and the orchestrator emit these; the console layer renders
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// A chat message from another participant.
    Chat { sender: String, content: String },
    /// The server's answer to `/auth` or `/join`.
    Reply { success: bool, content: String },
    /// The server reported an error and is ending the conversation.
    PeerError { sender: String, content: String },
    /// The server said goodbye.
    PeerLeft { sender: String },
    /// The server closed the connection without a goodbye.
    ServerClosed,
    /// A local problem: bad input, an illegal command, an undelivered
    /// message. The session continues.
    LocalError(String),
    /// `/rename` took effect.
    Renamed(String),
    /// `/help` was requested.
    Help,
}
