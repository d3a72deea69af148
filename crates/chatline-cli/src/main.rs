use std::process::ExitCode;

use chatline::prelude::*;
use chatline_cli::display::{Output, render};
use chatline_cli::{Args, exit, input};
use clap::Parser;
use clap::error::ErrorKind;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Intents queued ahead of the client; input blocks beyond this.
const INTENT_BUFFER: usize = 32;

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => exit::exit_code(ClientOutcome::CommandLine),
            };
        }
    };

    // Diagnostics go to stderr so they never interleave with chat on stdout.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = args.to_config();
    tracing::debug!(?config, "starting");

    let cancel = CancellationToken::new();
    let (intents_tx, intents_rx) = mpsc::channel(INTENT_BUFFER);
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    if let Err(e) = input::spawn_stdin_reader(intents_tx, events_tx.clone()) {
        eprintln!("ERROR: cannot read input: {e}");
        return exit::exit_code(ClientOutcome::CommandLine);
    }

    let printer = tokio::spawn(print_events(events_rx, cancel.clone()));
    tokio::spawn(cancel_on_interrupt(cancel.clone()));

    let outcome = connect_and_run(&config, intents_rx, events_tx, cancel.clone()).await;
    tracing::debug!(%outcome, "session finished");

    // The stdin thread still holds an event sender; flush and stop.
    cancel.cancel();
    if let Err(e) = printer.await {
        tracing::warn!(error = %e, "printer task failed");
    }

    exit::exit_code(outcome)
}

async fn print_events(
    mut events: mpsc::UnboundedReceiver<ClientEvent>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            event = events.recv() => match event {
                Some(event) => print_event(&event),
                None => return,
            },
            _ = cancel.cancelled() => {
                while let Ok(event) = events.try_recv() {
                    print_event(&event);
                }
                return;
            }
        }
    }
}

fn print_event(event: &ClientEvent) {
    match render(event) {
        (Output::Stdout, line) => println!("{line}"),
        (Output::Stderr, line) => eprintln!("{line}"),
    }
}

async fn cancel_on_interrupt(cancel: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => {
                tracing::debug!("interrupted");
                cancel.cancel();
            }
            Err(e) => tracing::warn!(error = %e, "cannot listen for interrupt"),
        },
        _ = cancel.cancelled() => {}
    }
}
