//! The client session: current state plus the identity the client presents.

use chatline_protocol::validate::{Field, validate};
use chatline_protocol::{DISCORD_PREFIX, ProtocolMessage};

use crate::{ClientEvent, ClientState, Intent, SessionError};

/// Display name used until the user authenticates or renames.
pub const DEFAULT_DISPLAY_NAME: &str = "Anonymous";

/// What the caller must do after a local intent was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Send the message; nothing else to wait for.
    Send(ProtocolMessage),
    /// Send the message, then hold further input until a `REPLY` arrives.
    Request(ProtocolMessage),
    /// Send the goodbye and shut down. The session is already in `End`.
    Farewell(ProtocolMessage),
    /// No network effect; show the event to the user.
    Local(ClientEvent),
}

/// A protocol fault detected while handling an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The message did not decode, or is one the server never sends.
    Malformed,
    /// A `REPLY` arrived while no request was outstanding.
    UnexpectedReply,
}

/// What the caller must do after an inbound message was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reaction {
    /// Show the event; the state did not change.
    Show(ClientEvent),
    /// The outstanding request was answered; show the event and release
    /// local input.
    Replied(ClientEvent),
    /// The server ended the conversation. The session is now in `End`.
    Ended(ClientEvent),
    /// Send `error` and terminate with `fault`. The session is now in
    /// `End`.
    Fault {
        fault: Fault,
        error: ProtocolMessage,
    },
    /// Nothing to do.
    Nothing,
}

/// The client side of one conversation with the server.
///
/// Pure and synchronous: every method runs to completion without I/O, so a
/// caller holding it behind a lock never holds the lock across a network
/// operation. There is exactly one per run.
#[derive(Debug, Clone)]
pub struct ClientSession {
    state: ClientState,
    display_name: String,
    discord_mode: bool,
}

impl Default for ClientSession {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ClientSession {
    /// A fresh session in `Start`. With `discord_mode`, channel IDs get the
    /// `discord.` prefix before they are sent.
    pub fn new(discord_mode: bool) -> Self {
        Self {
            state: ClientState::Start,
            display_name: DEFAULT_DISPLAY_NAME.to_owned(),
            discord_mode,
        }
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn is_ended(&self) -> bool {
        self.state == ClientState::End
    }

    fn set_state(&mut self, next: ClientState) {
        if self.state != next {
            tracing::debug!(from = %self.state, to = %next, "state transition");
            self.state = next;
        }
    }

    fn not_allowed(&self, intent: &'static str) -> SessionError {
        SessionError::NotAllowed {
            intent,
            state: self.state,
        }
    }

    /// Checks a local intent against the grammar and the current state.
    ///
    /// Fields are validated before the state is consulted, so a typo is
    /// reported as such even when the command would be refused anyway.
    /// A refused intent leaves the session untouched.
    ///
    /// # Errors
    /// - [`SessionError::InvalidField`] if a field breaks the grammar.
    /// - [`SessionError::NotAllowed`] if the intent is illegal in the
    ///   current state.
    /// - [`SessionError::AlreadyEnded`] once the session is in `End`.
    pub fn handle_intent(
        &mut self,
        intent: Intent,
    ) -> Result<Transition, SessionError> {
        if self.is_ended() {
            return Err(SessionError::AlreadyEnded);
        }

        let name = intent.name();
        match intent {
            Intent::Auth {
                username,
                secret,
                display_name,
            } => {
                validate(Field::Username, &username)?;
                validate(Field::Secret, &secret)?;
                validate(Field::DisplayName, &display_name)?;
                if !matches!(self.state, ClientState::Start | ClientState::Auth)
                {
                    return Err(self.not_allowed(name));
                }
                self.display_name = display_name.clone();
                self.set_state(ClientState::Auth);
                Ok(Transition::Request(ProtocolMessage::Auth {
                    username,
                    display_name,
                    secret,
                }))
            }
            Intent::Join { channel_id } => {
                validate(Field::ChannelId, &channel_id)?;
                if self.state != ClientState::Open {
                    return Err(self.not_allowed(name));
                }
                let channel_id = if self.discord_mode {
                    format!("{DISCORD_PREFIX}{channel_id}")
                } else {
                    channel_id
                };
                self.set_state(ClientState::Join);
                Ok(Transition::Request(ProtocolMessage::Join {
                    channel_id,
                    display_name: self.display_name.clone(),
                }))
            }
            Intent::Chat { content } => {
                validate(Field::Content, &content)?;
                if self.state != ClientState::Open {
                    return Err(self.not_allowed(name));
                }
                Ok(Transition::Send(ProtocolMessage::Chat {
                    sender: self.display_name.clone(),
                    content,
                }))
            }
            Intent::Rename { display_name } => {
                validate(Field::DisplayName, &display_name)?;
                self.display_name = display_name.clone();
                Ok(Transition::Local(ClientEvent::Renamed(display_name)))
            }
            Intent::Help => Ok(Transition::Local(ClientEvent::Help)),
            Intent::Bye => {
                self.set_state(ClientState::End);
                Ok(Transition::Farewell(self.bye()))
            }
        }
    }

    /// Reacts to one decoded inbound message.
    ///
    /// `Confirm` and `Ping` are transport concerns and produce
    /// [`Reaction::Nothing`], as does everything once the session has
    /// ended.
    pub fn handle_message(&mut self, message: &ProtocolMessage) -> Reaction {
        if self.is_ended() {
            return Reaction::Nothing;
        }

        match message {
            ProtocolMessage::Chat { sender, content } => {
                Reaction::Show(ClientEvent::Chat {
                    sender: sender.clone(),
                    content: content.clone(),
                })
            }
            ProtocolMessage::Reply {
                success, content, ..
            } => {
                let state = self.state;
                if !state.expects_reply() {
                    tracing::warn!(%state, "reply without outstanding request");
                    return self.fault(
                        Fault::UnexpectedReply,
                        format!("Unexpected REPLY in state {state}"),
                    );
                }
                // A rejected AUTH may be retried; a JOIN returns to Open
                // either way.
                let next = if state == ClientState::Auth && !*success {
                    ClientState::Auth
                } else {
                    ClientState::Open
                };
                self.set_state(next);
                Reaction::Replied(ClientEvent::Reply {
                    success: *success,
                    content: content.clone(),
                })
            }
            ProtocolMessage::Error { sender, content } => {
                self.set_state(ClientState::End);
                Reaction::Ended(ClientEvent::PeerError {
                    sender: sender.clone(),
                    content: content.clone(),
                })
            }
            ProtocolMessage::Bye { sender } => {
                self.set_state(ClientState::End);
                Reaction::Ended(ClientEvent::PeerLeft {
                    sender: sender.clone(),
                })
            }
            ProtocolMessage::Confirm { .. } | ProtocolMessage::Ping => {
                Reaction::Nothing
            }
            ProtocolMessage::Unknown => self.fault(
                Fault::Malformed,
                "Malformed message received".to_owned(),
            ),
            // Client-to-server only.
            ProtocolMessage::Auth { .. } | ProtocolMessage::Join { .. } => {
                self.fault(
                    Fault::Malformed,
                    format!("Unexpected {} from server", message.kind()),
                )
            }
        }
    }

    fn fault(&mut self, fault: Fault, content: String) -> Reaction {
        let error = ProtocolMessage::Error {
            sender: self.display_name.clone(),
            content,
        };
        self.set_state(ClientState::End);
        Reaction::Fault { fault, error }
    }

    fn bye(&self) -> ProtocolMessage {
        ProtocolMessage::Bye {
            sender: self.display_name.clone(),
        }
    }

    /// Moves to `End` for shutdown. Returns the `BYE` to send, or `None`
    /// if the session had already ended.
    pub fn begin_shutdown(&mut self) -> Option<ProtocolMessage> {
        if self.is_ended() {
            return None;
        }
        self.set_state(ClientState::End);
        Some(self.bye())
    }

    /// Moves to `End` without anything to send, e.g. when the server
    /// closed the connection.
    pub fn mark_ended(&mut self) {
        self.set_state(ClientState::End);
    }

    /// Rolls back a request whose message never reached the server, so
    /// the user can try again: an undelivered `AUTH` returns to `Start`,
    /// an undelivered `JOIN` to `Open`.
    pub fn abandon_request(&mut self) {
        match self.state {
            ClientState::Auth => self.set_state(ClientState::Start),
            ClientState::Join => self.set_state(ClientState::Open),
            _ => {}
        }
    }
}
