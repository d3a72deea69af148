//! Line-oriented text format used on the stream transport.
//!
//! One message per line. The line terminator is the transport's business;
//! this codec only sees the bare line. Keywords match case-insensitively.

use std::sync::LazyLock;

use regex::Regex;

use crate::validate::{Field, is_valid, is_valid_wire_channel};
use crate::{Codec, Envelope, ProtocolMessage};

const ID: &str = r"[A-Za-z0-9_-]+";
const CHANNEL: &str = r"[A-Za-z0-9_.-]+";
const DNAME: &str = r"[\x21-\x7E]+";
const CONTENT: &str = r"[\x20-\x7E\n]+";

/// A pattern that fails to compile is a programming error; the unit tests
/// force every static below.
fn compile(pattern: String) -> Regex {
    Regex::new(&pattern).expect("grammar patterns are valid regexes")
}

static AUTH: LazyLock<Regex> = LazyLock::new(|| {
    compile(format!(
        r"^(?i:AUTH) ({ID}) (?i:AS) ({DNAME}) (?i:USING) ({ID})$"
    ))
});
static JOIN: LazyLock<Regex> = LazyLock::new(|| {
    compile(format!(r"^(?i:JOIN) ({CHANNEL}) (?i:AS) ({DNAME})$"))
});
static MSG: LazyLock<Regex> = LazyLock::new(|| {
    compile(format!(r"^(?i:MSG FROM) ({DNAME}) (?i:IS) ({CONTENT})$"))
});
static ERR: LazyLock<Regex> = LazyLock::new(|| {
    compile(format!(r"^(?i:ERR FROM) ({DNAME}) (?i:IS) ({CONTENT})$"))
});
static BYE: LazyLock<Regex> =
    LazyLock::new(|| compile(format!(r"^(?i:BYE FROM) ({DNAME})$")));
static REPLY: LazyLock<Regex> = LazyLock::new(|| {
    compile(format!(r"^(?i:REPLY) ((?i:OK|NOK)) (?i:IS) ({CONTENT})$"))
});

/// Codec for the stream transport's text lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl TextCodec {
    fn parse(line: &str) -> Option<ProtocolMessage> {
        // The keyword regexes are case-insensitive, which under Unicode
        // rules would let e.g. the Kelvin sign match `K`. The grammar is
        // pure ASCII, so refuse anything else up front.
        if !line.is_ascii() {
            return None;
        }

        let keyword = line.split(' ').next()?.to_ascii_uppercase();
        let message = match keyword.as_str() {
            "AUTH" => {
                let c = AUTH.captures(line)?;
                ProtocolMessage::Auth {
                    username: c[1].to_owned(),
                    display_name: c[2].to_owned(),
                    secret: c[3].to_owned(),
                }
            }
            "JOIN" => {
                let c = JOIN.captures(line)?;
                ProtocolMessage::Join {
                    channel_id: c[1].to_owned(),
                    display_name: c[2].to_owned(),
                }
            }
            "MSG" => {
                let c = MSG.captures(line)?;
                ProtocolMessage::Chat {
                    sender: c[1].to_owned(),
                    content: c[2].to_owned(),
                }
            }
            "ERR" => {
                let c = ERR.captures(line)?;
                ProtocolMessage::Error {
                    sender: c[1].to_owned(),
                    content: c[2].to_owned(),
                }
            }
            "BYE" => {
                let c = BYE.captures(line)?;
                ProtocolMessage::Bye {
                    sender: c[1].to_owned(),
                }
            }
            "REPLY" => {
                let c = REPLY.captures(line)?;
                ProtocolMessage::Reply {
                    success: c[1].eq_ignore_ascii_case("OK"),
                    content: c[2].to_owned(),
                    ref_id: None,
                }
            }
            _ => return None,
        };

        fields_valid(&message).then_some(message)
    }
}

/// Length limits are not expressed in the patterns; check them here.
pub(crate) fn fields_valid(message: &ProtocolMessage) -> bool {
    match message {
        ProtocolMessage::Auth {
            username,
            display_name,
            secret,
        } => {
            is_valid(Field::Username, username)
                && is_valid(Field::DisplayName, display_name)
                && is_valid(Field::Secret, secret)
        }
        ProtocolMessage::Join {
            channel_id,
            display_name,
        } => {
            is_valid_wire_channel(channel_id)
                && is_valid(Field::DisplayName, display_name)
        }
        ProtocolMessage::Chat { sender, content }
        | ProtocolMessage::Error { sender, content } => {
            is_valid(Field::DisplayName, sender)
                && is_valid(Field::Content, content)
        }
        ProtocolMessage::Bye { sender } => is_valid(Field::DisplayName, sender),
        ProtocolMessage::Reply { content, .. } => {
            is_valid(Field::Content, content)
        }
        ProtocolMessage::Confirm { .. }
        | ProtocolMessage::Ping
        | ProtocolMessage::Unknown => true,
    }
}

impl Codec for TextCodec {
    fn encode(&self, envelope: &Envelope) -> Vec<u8> {
        let line = match &envelope.message {
            ProtocolMessage::Auth {
                username,
                display_name,
                secret,
            } => format!("AUTH {username} AS {display_name} USING {secret}"),
            ProtocolMessage::Join {
                channel_id,
                display_name,
            } => format!("JOIN {channel_id} AS {display_name}"),
            ProtocolMessage::Chat { sender, content } => {
                format!("MSG FROM {sender} IS {content}")
            }
            ProtocolMessage::Error { sender, content } => {
                format!("ERR FROM {sender} IS {content}")
            }
            ProtocolMessage::Bye { sender } => format!("BYE FROM {sender}"),
            ProtocolMessage::Reply {
                success, content, ..
            } => {
                let result = if *success { "OK" } else { "NOK" };
                format!("REPLY {result} IS {content}")
            }
            // No text form; the stream already guarantees delivery.
            ProtocolMessage::Confirm { .. }
            | ProtocolMessage::Ping
            | ProtocolMessage::Unknown => String::new(),
        };
        line.into_bytes()
    }

    fn decode(&self, data: &[u8]) -> Envelope {
        let message = std::str::from_utf8(data)
            .ok()
            .and_then(Self::parse)
            .unwrap_or(ProtocolMessage::Unknown);
        Envelope::bare(message)
    }
}
