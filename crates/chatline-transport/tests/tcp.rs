//! Integration tests for the line-framed TCP connection.
//!
//! Each test binds a real listener on a random loopback port and plays the
//! server side by hand with raw tokio I/O.

use chatline_transport::{Connection, MAX_LINE_LEN, TcpConnection, TransportError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Binds a listener on an OS-assigned port and connects a client to it.
async fn connected_pair() -> (TcpConnection, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("should bind");
    let port = listener.local_addr().unwrap().port();

    let accept = tokio::spawn(async move { listener.accept().await.unwrap().0 });
    let client = TcpConnection::connect("127.0.0.1", port)
        .await
        .expect("client should connect");
    let server = accept.await.expect("accept task");
    (client, server)
}

#[tokio::test]
async fn test_tcp_send_appends_crlf() {
    let (client, mut server) = connected_pair().await;

    client.send(b"AUTH bob AS Bob USING pw").await.unwrap();

    let mut buf = vec![0u8; 64];
    let n = server.read(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"AUTH bob AS Bob USING pw\r\n");
}

#[tokio::test]
async fn test_tcp_recv_returns_one_line_per_call() {
    let (client, mut server) = connected_pair().await;

    // Two messages in a single segment must still come out one by one.
    server
        .write_all(b"REPLY OK IS hi\r\nMSG FROM Carol IS yo\r\n")
        .await
        .unwrap();

    let first = client.recv().await.unwrap().expect("first line");
    let second = client.recv().await.unwrap().expect("second line");
    assert_eq!(first, b"REPLY OK IS hi");
    assert_eq!(second, b"MSG FROM Carol IS yo");
}

#[tokio::test]
async fn test_tcp_recv_keeps_bare_lf_inside_content() {
    let (client, mut server) = connected_pair().await;

    server.write_all(b"MSG FROM a IS x\ny\r\n").await.unwrap();

    let line = client.recv().await.unwrap().unwrap();
    assert_eq!(line, b"MSG FROM a IS x\ny");
}

#[tokio::test]
async fn test_tcp_recv_reassembles_split_segments() {
    let (client, mut server) = connected_pair().await;

    let writer = tokio::spawn(async move {
        server.write_all(b"BYE FR").await.unwrap();
        server.flush().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        server.write_all(b"OM Carol\r").await.unwrap();
        server.flush().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        server.write_all(b"\n").await.unwrap();
        server
    });

    let line = client.recv().await.unwrap().unwrap();
    assert_eq!(line, b"BYE FROM Carol");
    drop(writer.await.unwrap());
}

#[tokio::test]
async fn test_tcp_recv_returns_none_when_peer_closes() {
    let (client, server) = connected_pair().await;

    drop(server);

    let result = client.recv().await.expect("recv should not error");
    assert!(result.is_none(), "closed peer should yield None");
}

#[tokio::test]
async fn test_tcp_recv_hands_up_oversized_line() {
    let (client, mut server) = connected_pair().await;

    let writer = tokio::spawn(async move {
        let junk = vec![b'A'; MAX_LINE_LEN + 10];
        let _ = server.write_all(&junk).await;
        server
    });

    let line = client.recv().await.unwrap().unwrap();
    assert!(line.len() > MAX_LINE_LEN);
    drop(writer.await.unwrap());
}

#[tokio::test]
async fn test_tcp_close_then_send_fails() {
    let (client, mut server) = connected_pair().await;

    client.close().await.expect("close should succeed");

    // The server sees end-of-stream once the write half is shut down.
    let mut rest = Vec::new();
    server.read_to_end(&mut rest).await.unwrap();
    assert!(rest.is_empty());

    let err = client.send(b"MSG FROM a IS b").await.unwrap_err();
    assert!(matches!(err, TransportError::ConnectionClosed(_)));
}

#[tokio::test]
async fn test_tcp_connect_refused_reports_connect_failed() {
    // Grab a free port, then release it so nothing is listening there.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };

    let result = TcpConnection::connect("127.0.0.1", port).await;
    assert!(matches!(
        result,
        Err(TransportError::ConnectFailed { .. })
    ));
}
