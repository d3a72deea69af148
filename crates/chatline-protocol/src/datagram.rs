//! Binary format used on the datagram transport.
//!
//! ```text
//! +--------+--------+--------+---------------------------+
//! |  type  |   message ID    |  payload (NUL-terminated) |
//! | 1 byte | 2 bytes, BE     |  fields                   |
//! +--------+--------+--------+---------------------------+
//! ```
//!
//! `CONFIRM` reuses the ID slot for the ID it acknowledges. `REPLY` starts
//! its payload with a result byte and the 2-byte ID of the request it
//! answers, followed by the NUL-terminated content.

use crate::text::fields_valid;
use crate::{Codec, Envelope, MessageId, MessageKind, ProtocolMessage};

/// Type byte plus message ID.
pub const HEADER_LEN: usize = 3;

/// Codec for the datagram transport's binary packets.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatagramCodec;

fn push_field(buf: &mut Vec<u8>, field: &str) {
    buf.extend_from_slice(field.as_bytes());
    buf.push(0);
}

/// Splits a payload into exactly `count` NUL-terminated ASCII fields.
fn split_fields(payload: &[u8], count: usize) -> Option<Vec<String>> {
    let body = payload.strip_suffix(&[0])?;
    let fields: Vec<&[u8]> = body.split(|&b| b == 0).collect();
    if fields.len() != count {
        return None;
    }
    fields
        .into_iter()
        .map(|f| {
            f.is_ascii()
                .then(|| String::from_utf8(f.to_vec()).ok())
                .flatten()
        })
        .collect()
}

fn parse(kind: MessageKind, id: MessageId, payload: &[u8]) -> Option<ProtocolMessage> {
    let message = match kind {
        MessageKind::Confirm => {
            if !payload.is_empty() {
                return None;
            }
            ProtocolMessage::Confirm { ref_id: id }
        }
        MessageKind::Ping => {
            if !payload.is_empty() {
                return None;
            }
            ProtocolMessage::Ping
        }
        MessageKind::Reply => {
            let (&result, rest) = payload.split_first()?;
            let success = match result {
                1 => true,
                0 => false,
                _ => return None,
            };
            let (ref_bytes, rest) = rest.split_first_chunk::<2>()?;
            let mut fields = split_fields(rest, 1)?;
            ProtocolMessage::Reply {
                success,
                content: fields.pop()?,
                ref_id: Some(MessageId::from_be_bytes(*ref_bytes)),
            }
        }
        MessageKind::Auth => {
            let [username, display_name, secret] =
                <[String; 3]>::try_from(split_fields(payload, 3)?).ok()?;
            ProtocolMessage::Auth {
                username,
                display_name,
                secret,
            }
        }
        MessageKind::Join => {
            let [channel_id, display_name] =
                <[String; 2]>::try_from(split_fields(payload, 2)?).ok()?;
            ProtocolMessage::Join {
                channel_id,
                display_name,
            }
        }
        MessageKind::Chat | MessageKind::Error => {
            let [sender, content] =
                <[String; 2]>::try_from(split_fields(payload, 2)?).ok()?;
            if kind == MessageKind::Chat {
                ProtocolMessage::Chat { sender, content }
            } else {
                ProtocolMessage::Error { sender, content }
            }
        }
        MessageKind::Bye => {
            let mut fields = split_fields(payload, 1)?;
            ProtocolMessage::Bye {
                sender: fields.pop()?,
            }
        }
        MessageKind::Unknown => return None,
    };

    fields_valid(&message).then_some(message)
}

impl Codec for DatagramCodec {
    fn encode(&self, envelope: &Envelope) -> Vec<u8> {
        let message = &envelope.message;
        let kind = message.kind();
        if kind == MessageKind::Unknown {
            return Vec::new();
        }

        let id = match message {
            ProtocolMessage::Confirm { ref_id } => *ref_id,
            _ => envelope.id.unwrap_or_default(),
        };

        let mut buf = Vec::with_capacity(HEADER_LEN + 32);
        buf.push(kind.code());
        buf.extend_from_slice(&id.to_be_bytes());

        match message {
            ProtocolMessage::Auth {
                username,
                display_name,
                secret,
            } => {
                push_field(&mut buf, username);
                push_field(&mut buf, display_name);
                push_field(&mut buf, secret);
            }
            ProtocolMessage::Join {
                channel_id,
                display_name,
            } => {
                push_field(&mut buf, channel_id);
                push_field(&mut buf, display_name);
            }
            ProtocolMessage::Chat { sender, content }
            | ProtocolMessage::Error { sender, content } => {
                push_field(&mut buf, sender);
                push_field(&mut buf, content);
            }
            ProtocolMessage::Bye { sender } => push_field(&mut buf, sender),
            ProtocolMessage::Reply {
                success,
                content,
                ref_id,
            } => {
                buf.push(u8::from(*success));
                buf.extend_from_slice(&ref_id.unwrap_or_default().to_be_bytes());
                push_field(&mut buf, content);
            }
            ProtocolMessage::Confirm { .. }
            | ProtocolMessage::Ping
            | ProtocolMessage::Unknown => {}
        }
        buf
    }

    fn decode(&self, data: &[u8]) -> Envelope {
        let Some((header, payload)) = data.split_first_chunk::<HEADER_LEN>() else {
            return Envelope::with_id(MessageId(0), ProtocolMessage::Unknown);
        };
        let kind = MessageKind::from_code(header[0]);
        let id = MessageId::from_be_bytes([header[1], header[2]]);
        let message = parse(kind, id, payload).unwrap_or(ProtocolMessage::Unknown);
        Envelope::with_id(id, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(id: u16, message: ProtocolMessage) -> Vec<u8> {
        DatagramCodec.encode(&Envelope::with_id(MessageId(id), message))
    }

    #[test]
    fn test_encode_auth_layout() {
        let bytes = encode(
            0x0102,
            ProtocolMessage::Auth {
                username: "bob".into(),
                display_name: "Bob".into(),
                secret: "pw".into(),
            },
        );
        assert_eq!(bytes, b"\x02\x01\x02bob\0Bob\0pw\0");
    }

    #[test]
    fn test_encode_confirm_puts_ref_id_in_header() {
        let bytes = DatagramCodec.encode(&Envelope::bare(ProtocolMessage::Confirm {
            ref_id: MessageId(0xBEEF),
        }));
        assert_eq!(bytes, [0x00, 0xBE, 0xEF]);
    }

    #[test]
    fn test_encode_reply_layout() {
        let bytes = encode(
            5,
            ProtocolMessage::Reply {
                success: true,
                content: "ok".into(),
                ref_id: Some(MessageId(3)),
            },
        );
        assert_eq!(bytes, b"\x01\x00\x05\x01\x00\x03ok\0");
    }

    #[test]
    fn test_decode_reply_reads_ref_id() {
        let env = DatagramCodec.decode(b"\x01\x00\x09\x00\x00\x04denied\0");
        assert_eq!(env.id, Some(MessageId(9)));
        assert_eq!(
            env.message,
            ProtocolMessage::Reply {
                success: false,
                content: "denied".into(),
                ref_id: Some(MessageId(4)),
            }
        );
    }

    #[test]
    fn test_decode_ping_and_confirm() {
        let ping = DatagramCodec.decode(&[0xFD, 0x00, 0x07]);
        assert_eq!(ping.message, ProtocolMessage::Ping);
        assert_eq!(ping.id, Some(MessageId(7)));

        let confirm = DatagramCodec.decode(&[0x00, 0x00, 0x07]);
        assert_eq!(
            confirm.message,
            ProtocolMessage::Confirm {
                ref_id: MessageId(7)
            }
        );
    }

    #[test]
    fn test_decode_short_buffer_unknown_with_zero_id() {
        let env = DatagramCodec.decode(&[0x04, 0x00]);
        assert_eq!(env.message, ProtocolMessage::Unknown);
        assert_eq!(env.id, Some(MessageId(0)));
    }

    #[test]
    fn test_decode_missing_field_keeps_parsed_id() {
        let env = DatagramCodec.decode(b"\x04\x00\x2aAlice\0");
        assert_eq!(env.message, ProtocolMessage::Unknown);
        assert_eq!(env.id, Some(MessageId(42)));
    }

    #[test]
    fn test_decode_extra_field_is_unknown() {
        let env = DatagramCodec.decode(b"\xFF\x00\x01Carol\0extra\0");
        assert_eq!(env.message, ProtocolMessage::Unknown);
    }

    #[test]
    fn test_decode_missing_terminator_is_unknown() {
        let env = DatagramCodec.decode(b"\xFF\x00\x01Carol");
        assert_eq!(env.message, ProtocolMessage::Unknown);
    }

    #[test]
    fn test_decode_ping_with_payload_is_unknown() {
        let env = DatagramCodec.decode(b"\xFD\x00\x01x\0");
        assert_eq!(env.message, ProtocolMessage::Unknown);
    }

    #[test]
    fn test_decode_bad_reply_result_is_unknown() {
        let env = DatagramCodec.decode(b"\x01\x00\x01\x02\x00\x00hi\0");
        assert_eq!(env.message, ProtocolMessage::Unknown);
    }

    #[test]
    fn test_decode_unassigned_type_is_unknown() {
        let env = DatagramCodec.decode(b"\x42\x00\x03hello\0");
        assert_eq!(env.message, ProtocolMessage::Unknown);
        assert_eq!(env.id, Some(MessageId(3)));
    }

    #[test]
    fn test_decode_invalid_field_is_unknown() {
        let env = DatagramCodec.decode(b"\x04\x00\x01Bad Name\0hi\0");
        assert_eq!(env.message, ProtocolMessage::Unknown);
    }
}
