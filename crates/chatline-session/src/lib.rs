//! Client state machine for chatline.
//!
//! This crate decides what the client may do and how it reacts to what the
//! server says. It does no I/O: callers feed it local [`Intent`]s and
//! decoded [`ProtocolMessage`](chatline_protocol::ProtocolMessage)s and act
//! on the [`Transition`]s and [`Reaction`]s it returns.
//!
//! # How it fits in the stack
//!
//! ```text
//! Orchestrator (above)  ← runs the inbound/outbound loops, owns the socket
//!     ↕
//! Session Layer (this crate)  ← legal message sequences, display name
//!     ↕
//! Protocol Layer (below)  ← message model and field grammar
//! ```

mod error;
mod event;
mod session;
mod state;

pub use error::SessionError;
pub use event::{ClientEvent, Intent};
pub use session::{ClientSession, DEFAULT_DISPLAY_NAME, Fault, Reaction, Transition};
pub use state::ClientState;
