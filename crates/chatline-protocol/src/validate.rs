//! Field grammar shared by both wire formats.
//!
//! ```text
//! ID       = 1*20    ( ALPHA / DIGIT / "_" / "-" )
//! SECRET   = 1*128   ( ALPHA / DIGIT / "_" / "-" )
//! CONTENT  = 1*60000 ( VCHAR / SP / LF )
//! DNAME    = 1*20    VCHAR
//! ```
//!
//! Every character class is a subset of ASCII, so byte length and
//! character count are the same thing.

use std::fmt;

use crate::ProtocolError;

/// Longest username or channel ID.
pub const MAX_ID_LEN: usize = 20;
/// Longest secret.
pub const MAX_SECRET_LEN: usize = 128;
/// Longest display name.
pub const MAX_DISPLAY_NAME_LEN: usize = 20;
/// Longest chat or error content.
pub const MAX_CONTENT_LEN: usize = 60_000;

/// Prefix put in front of channel IDs when Discord mode is on.
pub const DISCORD_PREFIX: &str = "discord.";

/// A named protocol field, used to report which input was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Username,
    ChannelId,
    Secret,
    DisplayName,
    Content,
}

impl Field {
    /// Human-readable grammar for error messages.
    pub fn grammar(self) -> &'static str {
        match self {
            Self::Username | Self::ChannelId => {
                "1-20 characters from A-Z a-z 0-9 _ -"
            }
            Self::Secret => "1-128 characters from A-Z a-z 0-9 _ -",
            Self::DisplayName => "1-20 visible characters (0x21-0x7E)",
            Self::Content => {
                "1-60000 visible characters, spaces, or line feeds"
            }
        }
    }

    fn max_len(self) -> usize {
        match self {
            Self::Username | Self::ChannelId => MAX_ID_LEN,
            Self::Secret => MAX_SECRET_LEN,
            Self::DisplayName => MAX_DISPLAY_NAME_LEN,
            Self::Content => MAX_CONTENT_LEN,
        }
    }

    fn allows(self, c: char) -> bool {
        match self {
            Self::Username | Self::ChannelId | Self::Secret => is_id_char(c),
            Self::DisplayName => is_visible(c),
            Self::Content => is_visible(c) || c == ' ' || c == '\n',
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Username => "username",
            Self::ChannelId => "channel ID",
            Self::Secret => "secret",
            Self::DisplayName => "display name",
            Self::Content => "content",
        })
    }
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn is_visible(c: char) -> bool {
    ('\x21'..='\x7e').contains(&c)
}

/// Returns `true` if `value` matches the grammar of `field`.
pub fn is_valid(field: Field, value: &str) -> bool {
    !value.is_empty()
        && value.len() <= field.max_len()
        && value.chars().all(|c| field.allows(c))
}

/// Checks `value` against the grammar of `field`.
///
/// # Errors
/// Returns [`ProtocolError::InvalidField`] naming the field on mismatch.
pub fn validate(field: Field, value: &str) -> Result<(), ProtocolError> {
    if is_valid(field, value) {
        Ok(())
    } else {
        Err(ProtocolError::InvalidField { field })
    }
}

/// A channel ID as it appears on the wire: a plain ID, optionally carrying
/// the Discord prefix the client adds before sending.
pub(crate) fn is_valid_wire_channel(value: &str) -> bool {
    let bare = value.strip_prefix(DISCORD_PREFIX).unwrap_or(value);
    is_valid(Field::ChannelId, bare)
}
