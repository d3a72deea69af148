//! Local input.
//!
//! Stdin is read on a plain thread: a blocking read cannot be cancelled,
//! and a thread parked on it must not keep the runtime from shutting down.

use std::io::BufRead;
use std::thread;

use chatline::{ClientEvent, Intent};
use tokio::sync::mpsc;

use crate::commands::parse_line;

/// Feeds parsed intents from `reader` into `intents` until input ends or
/// the client stops listening.
///
/// Lines that do not parse are reported on `events` and skipped. Dropping
/// `intents` at end of input is what tells the client to say goodbye.
pub fn pump<R: BufRead>(
    reader: R,
    intents: mpsc::Sender<Intent>,
    events: mpsc::UnboundedSender<ClientEvent>,
) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "stdin read failed, treating as end of input");
                break;
            }
        };
        match parse_line(&line) {
            Ok(Some(intent)) => {
                if intents.blocking_send(intent).is_err() {
                    tracing::debug!("client stopped accepting input");
                    return;
                }
            }
            Ok(None) => {}
            Err(e) => {
                let _ = events.send(ClientEvent::LocalError(e.to_string()));
            }
        }
    }
    tracing::debug!("end of input");
}

/// Spawns the stdin reader thread.
///
/// The thread is detached; it exits on its own at end of input, or on the
/// next line after the client has stopped.
pub fn spawn_stdin_reader(
    intents: mpsc::Sender<Intent>,
    events: mpsc::UnboundedSender<ClientEvent>,
) -> std::io::Result<()> {
    thread::Builder::new()
        .name("stdin".into())
        .spawn(move || pump(std::io::stdin().lock(), intents, events))
        .map(|_| ())
}
