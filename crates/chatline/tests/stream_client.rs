//! End-to-end tests of the client over TCP against a scripted server.

use std::time::Duration;

use chatline::prelude::*;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::net::tcp::OwnedReadHalf;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

// =========================================================================
// Helpers
// =========================================================================

/// Binds a listener on a random port; returns it with a matching config.
async fn listen() -> (TcpListener, ClientConfig) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let port = listener.local_addr().expect("should have addr").port();
    let config = ClientConfig {
        port,
        ..ClientConfig::new(TransportKind::Stream, "127.0.0.1")
    };
    (listener, config)
}

async fn read_line(reader: &mut BufReader<OwnedReadHalf>) -> String {
    let mut line = String::new();
    tokio::time::timeout(Duration::from_secs(5), reader.read_line(&mut line))
        .await
        .expect("server read timed out")
        .expect("server read failed");
    line
}

/// Reads whatever is left until the client closes its side.
async fn read_rest(reader: &mut BufReader<OwnedReadHalf>) -> String {
    let mut rest = String::new();
    tokio::time::timeout(Duration::from_secs(5), reader.read_to_string(&mut rest))
        .await
        .expect("client never closed")
        .expect("server read failed");
    rest
}

struct Session {
    intents: mpsc::Sender<Intent>,
    events: mpsc::UnboundedReceiver<ClientEvent>,
    handle: tokio::task::JoinHandle<ClientOutcome>,
}

fn start(config: ClientConfig) -> Session {
    let (intents_tx, intents_rx) = mpsc::channel(16);
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(async move {
        connect_and_run(&config, intents_rx, events_tx, CancellationToken::new()).await
    });
    Session {
        intents: intents_tx,
        events: events_rx,
        handle,
    }
}

fn auth() -> Intent {
    Intent::Auth {
        username: "bob".into(),
        secret: "pw".into(),
        display_name: "Bob".into(),
    }
}

fn drain(events: &mut mpsc::UnboundedReceiver<ClientEvent>) -> Vec<ClientEvent> {
    let mut out = Vec::new();
    while let Ok(e) = events.try_recv() {
        out.push(e);
    }
    out
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_auth_sends_exact_line() {
    let (listener, config) = listen().await;
    let mut session = start(config);
    session.intents.send(auth()).await.unwrap();

    let (stream, _) = listener.accept().await.unwrap();
    let (read, mut write) = stream.into_split();
    let mut reader = BufReader::new(read);

    assert_eq!(read_line(&mut reader).await, "AUTH bob AS Bob USING pw\r\n");
    write.write_all(b"REPLY OK IS Auth success.\r\n").await.unwrap();

    drop(session.intents);
    assert_eq!(read_rest(&mut reader).await, "BYE FROM Bob\r\n");

    assert_eq!(session.handle.await.unwrap(), ClientOutcome::Clean);
    let events = drain(&mut session.events);
    assert_eq!(
        events,
        vec![ClientEvent::Reply {
            success: true,
            content: "Auth success.".into(),
        }]
    );
}

#[tokio::test]
async fn test_peer_bye_ends_without_further_send() {
    let (listener, config) = listen().await;
    let mut session = start(config);
    session.intents.send(auth()).await.unwrap();

    let (stream, _) = listener.accept().await.unwrap();
    let (read, mut write) = stream.into_split();
    let mut reader = BufReader::new(read);

    read_line(&mut reader).await;
    write
        .write_all(b"REPLY OK IS hi\r\nBYE FROM Carol\r\n")
        .await
        .unwrap();

    // Nothing after AUTH: no BYE of our own once the server said goodbye.
    assert_eq!(read_rest(&mut reader).await, "");
    assert_eq!(session.handle.await.unwrap(), ClientOutcome::Clean);

    let events = drain(&mut session.events);
    assert_eq!(
        events.last(),
        Some(&ClientEvent::PeerLeft {
            sender: "Carol".into()
        })
    );
    drop(session.intents);
}

#[tokio::test]
async fn test_join_rejection_keeps_session_open() {
    let (listener, config) = listen().await;
    let mut session = start(config);
    for intent in [
        auth(),
        Intent::Join {
            channel_id: "secret".into(),
        },
        Intent::Chat {
            content: "still here".into(),
        },
    ] {
        session.intents.send(intent).await.unwrap();
    }

    let (stream, _) = listener.accept().await.unwrap();
    let (read, mut write) = stream.into_split();
    let mut reader = BufReader::new(read);

    read_line(&mut reader).await;
    write.write_all(b"REPLY OK IS in\r\n").await.unwrap();
    assert_eq!(read_line(&mut reader).await, "JOIN secret AS Bob\r\n");
    write.write_all(b"reply nok is Join denied.\r\n").await.unwrap();
    assert_eq!(
        read_line(&mut reader).await,
        "MSG FROM Bob IS still here\r\n"
    );
    write
        .write_all(b"MSG FROM Alice IS welcome back\r\nBYE FROM Server\r\n")
        .await
        .unwrap();

    assert_eq!(session.handle.await.unwrap(), ClientOutcome::Clean);
    let events = drain(&mut session.events);
    assert!(events.contains(&ClientEvent::Reply {
        success: false,
        content: "Join denied.".into(),
    }));
    assert!(events.contains(&ClientEvent::Chat {
        sender: "Alice".into(),
        content: "welcome back".into(),
    }));
}

#[tokio::test]
async fn test_malformed_line_sends_error_and_terminates() {
    let (listener, config) = listen().await;
    let session = start(config);

    let (stream, _) = listener.accept().await.unwrap();
    let (read, mut write) = stream.into_split();
    let mut reader = BufReader::new(read);

    write.write_all(b"HELLO THERE\r\n").await.unwrap();
    let rest = read_rest(&mut reader).await;
    assert!(rest.starts_with("ERR FROM Anonymous IS "), "{rest}");
    assert!(!rest.contains("BYE"), "{rest}");

    assert_eq!(
        session.handle.await.unwrap(),
        ClientOutcome::MalformedMessage
    );
    drop(session.intents);
}

#[tokio::test]
async fn test_unsolicited_reply_is_unexpected() {
    let (listener, config) = listen().await;
    let session = start(config);

    let (stream, _) = listener.accept().await.unwrap();
    let (read, mut write) = stream.into_split();
    let mut reader = BufReader::new(read);

    write.write_all(b"REPLY OK IS surprise\r\n").await.unwrap();
    let rest = read_rest(&mut reader).await;
    assert!(rest.starts_with("ERR FROM Anonymous IS "), "{rest}");

    assert_eq!(session.handle.await.unwrap(), ClientOutcome::UnexpectedReply);
    drop(session.intents);
}

#[tokio::test]
async fn test_server_close_reports_disconnect() {
    let (listener, config) = listen().await;
    let mut session = start(config);

    let (stream, _) = listener.accept().await.unwrap();
    drop(stream);

    assert_eq!(session.handle.await.unwrap(), ClientOutcome::Clean);
    assert_eq!(drain(&mut session.events), vec![ClientEvent::ServerClosed]);
    drop(session.intents);
}

#[tokio::test]
async fn test_no_reply_within_timeout() {
    let (listener, mut config) = listen().await;
    config.reply_timeout = Duration::from_millis(200);
    let session = start(config);
    session.intents.send(auth()).await.unwrap();

    let (stream, _) = listener.accept().await.unwrap();
    let (read, _write) = stream.into_split();
    let mut reader = BufReader::new(read);

    read_line(&mut reader).await;
    assert_eq!(
        read_line(&mut reader).await,
        "ERR FROM Bob IS No REPLY received in time\r\n"
    );
    assert_eq!(session.handle.await.unwrap(), ClientOutcome::NoReply);
}

#[tokio::test]
async fn test_connect_refused_is_connection_failure() {
    let (listener, config) = listen().await;
    drop(listener);

    let mut session = start(config);
    assert_eq!(
        session.handle.await.unwrap(),
        ClientOutcome::ConnectionFailed
    );
    assert!(matches!(
        session.events.try_recv(),
        Ok(ClientEvent::LocalError(_))
    ));
}

#[tokio::test]
async fn test_late_duplicate_reply_does_not_release_next_request() {
    let (listener, config) = listen().await;
    let mut session = start(config);
    session.intents.send(auth()).await.unwrap();

    let (stream, _) = listener.accept().await.unwrap();
    let (read, mut write) = stream.into_split();
    let mut reader = BufReader::new(read);

    read_line(&mut reader).await;
    write
        .write_all(b"REPLY NOK IS no\r\nREPLY NOK IS no again\r\n")
        .await
        .unwrap();
    // Both rejections are handled before the retry goes out.
    for _ in 0..2 {
        let event = tokio::time::timeout(Duration::from_secs(5), session.events.recv())
            .await
            .expect("no reply event")
            .expect("client gone");
        assert!(matches!(event, ClientEvent::Reply { success: false, .. }));
    }

    session.intents.send(auth()).await.unwrap();
    session
        .intents
        .send(Intent::Chat {
            content: "hi".into(),
        })
        .await
        .unwrap();
    assert_eq!(read_line(&mut reader).await, "AUTH bob AS Bob USING pw\r\n");
    write.write_all(b"REPLY OK IS yes\r\n").await.unwrap();

    drop(session.intents);
    assert_eq!(
        read_rest(&mut reader).await,
        "MSG FROM Bob IS hi\r\nBYE FROM Bob\r\n"
    );
    assert_eq!(session.handle.await.unwrap(), ClientOutcome::Clean);

    let events = drain(&mut session.events);
    assert_eq!(
        events,
        vec![ClientEvent::Reply {
            success: true,
            content: "yes".into(),
        }]
    );
}
