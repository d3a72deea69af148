//! # chatline
//!
//! Client engine for a line/binary chat protocol over TCP or UDP.
//!
//! The engine connects, authenticates, joins channels, exchanges chat text
//! and shuts down cleanly or on fault. It never touches the terminal and
//! never exits the process: local commands arrive as typed
//! [`Intent`]s, everything worth showing leaves as [`ClientEvent`]s, and a
//! finished run yields a [`ClientOutcome`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chatline::prelude::*;
//! use tokio::sync::mpsc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() {
//! let config = ClientConfig::new(TransportKind::Stream, "127.0.0.1");
//! let (intents_tx, intents_rx) = mpsc::channel(16);
//! let (events_tx, _events_rx) = mpsc::unbounded_channel();
//!
//! intents_tx
//!     .send(Intent::Auth {
//!         username: "bob".into(),
//!         secret: "pw".into(),
//!         display_name: "Bob".into(),
//!     })
//!     .await
//!     .ok();
//! drop(intents_tx);
//!
//! let outcome =
//!     connect_and_run(&config, intents_rx, events_tx, CancellationToken::new()).await;
//! assert!(outcome.is_success());
//! # }
//! ```

#![allow(async_fn_in_trait)]

mod channel;
mod client;
mod config;
mod datagram;
mod error;
mod outcome;
mod stream;

pub use channel::{Inbound, MessageChannel};
pub use client::{ChatClient, connect_and_run};
pub use config::{ClientConfig, DEFAULT_PORT, TimeoutPolicy};
pub use datagram::DatagramBinding;
pub use error::ChatError;
pub use outcome::ClientOutcome;
pub use stream::StreamBinding;

pub use chatline_protocol::{MessageId, MessageKind, ProtocolMessage};
pub use chatline_session::{ClientEvent, ClientState, Intent};
pub use chatline_transport::TransportKind;

pub mod prelude {
    pub use crate::{
        ChatClient, ChatError, ClientConfig, ClientEvent, ClientOutcome, ClientState,
        Intent, TimeoutPolicy, TransportKind, connect_and_run,
    };
}
