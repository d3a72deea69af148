//! The `/command` interpreter.
//!
//! Turns one line of user input into an [`Intent`]. Field contents are not
//! checked here; the session validates them before anything is sent.

use chatline::Intent;
use thiserror::Error;

/// Why a line could not be turned into an intent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command '{0}', type /help for a list")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),
}

const AUTH_USAGE: &str = "/auth <username> <secret> <displayName>";
const JOIN_USAGE: &str = "/join <channelId>";
const RENAME_USAGE: &str = "/rename <displayName>";
const HELP_USAGE: &str = "/help";
const BYE_USAGE: &str = "/bye";

/// Parses one line of input.
///
/// Returns `Ok(None)` for a blank line. A line that does not start with
/// `/` is a chat message and is passed on verbatim.
pub fn parse_line(line: &str) -> Result<Option<Intent>, CommandError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Ok(None);
    }
    if !line.starts_with('/') {
        return Ok(Some(Intent::Chat {
            content: line.to_owned(),
        }));
    }

    let mut words = line.split_whitespace();
    let command = words.next().unwrap_or_default();
    let args: Vec<&str> = words.collect();

    let intent = match command.to_ascii_lowercase().as_str() {
        "/auth" => match args[..] {
            [username, secret, display_name] => Intent::Auth {
                username: username.to_owned(),
                secret: secret.to_owned(),
                display_name: display_name.to_owned(),
            },
            _ => return Err(CommandError::Usage(AUTH_USAGE)),
        },
        "/join" => match args[..] {
            [channel_id] => Intent::Join {
                channel_id: channel_id.to_owned(),
            },
            _ => return Err(CommandError::Usage(JOIN_USAGE)),
        },
        "/rename" => match args[..] {
            [display_name] => Intent::Rename {
                display_name: display_name.to_owned(),
            },
            _ => return Err(CommandError::Usage(RENAME_USAGE)),
        },
        "/help" if args.is_empty() => Intent::Help,
        "/help" => return Err(CommandError::Usage(HELP_USAGE)),
        "/bye" if args.is_empty() => Intent::Bye,
        "/bye" => return Err(CommandError::Usage(BYE_USAGE)),
        _ => return Err(CommandError::Unknown(command.to_owned())),
    };
    Ok(Some(intent))
}
