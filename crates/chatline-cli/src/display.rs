//! Console rendering of client events.

use chatline::ClientEvent;

/// Which console stream a line belongs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Stdout,
    Stderr,
}

pub const HELP_TEXT: &str = "\
Supported commands:
/auth <username> <secret> <displayName> - Authenticate to the server.
/join <channelId> - Join a channel.
/rename <displayName> - Change your display name.
/help - Show this help message.
/bye - Disconnect from the server.";

/// Formats an event the way the user sees it.
pub fn render(event: &ClientEvent) -> (Output, String) {
    match event {
        ClientEvent::Chat { sender, content } => {
            (Output::Stdout, format!("{sender}: {content}"))
        }
        ClientEvent::Reply { success, content } => {
            let verdict = if *success { "Success" } else { "Failure" };
            (Output::Stdout, format!("Action {verdict}: {content}"))
        }
        ClientEvent::PeerError { sender, content } => {
            (Output::Stdout, format!("ERROR FROM {sender}: {content}"))
        }
        ClientEvent::PeerLeft { sender } => {
            (Output::Stdout, format!("{sender} has disconnected."))
        }
        ClientEvent::ServerClosed => (Output::Stdout, "Server closed connection.".to_owned()),
        ClientEvent::LocalError(message) => (Output::Stderr, format!("ERROR: {message}")),
        ClientEvent::Renamed(name) => {
            (Output::Stdout, format!("Display name changed to {name}"))
        }
        ClientEvent::Help => (Output::Stdout, HELP_TEXT.to_owned()),
    }
}
