// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for the single-transaction client: loopback exchanges,
//! validation failures, cancellation, busy rejection, and transport release.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sntp::client::{ExchangeState, SntpClient};
use sntp::error::{MessageError, SntpError};
use sntp::message::Message;
use sntp::protocol::{Mode, Stratum};
use sntp::timestamp::Instant;
use sntp::transport::Transport;
use tokio::net::UdpSocket;

/// Spawn a loopback time server on an ephemeral port.
///
/// Replies to every request with a stratum-1 server-mode message whose origin
/// timestamp echoes the request's transmit timestamp byte for byte, the way a
/// real server copies the field without reinterpreting it.
async fn spawn_test_server() -> SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = socket.local_addr().expect("failed to get local addr");
    tokio::spawn(async move {
        let mut buf = [0u8; 1024];
        while let Ok((len, peer)) = socket.recv_from(&mut buf).await {
            if len < Message::SIZE {
                continue;
            }
            let mut reply = Message::new();
            reply.set_mode(Mode::Server);
            reply.set_stratum(Stratum::PRIMARY);
            reply.set_reference_id(*b"LOCL");
            reply.set_receive_timestamp(Instant::now());
            reply.set_transmit_timestamp(Instant::now());
            let mut reply_bytes = reply.to_bytes();
            reply_bytes[Message::ORIGIN_TIMESTAMP_OFFSET..Message::ORIGIN_TIMESTAMP_OFFSET + 8]
                .copy_from_slice(
                    &buf[Message::TRANSMIT_TIMESTAMP_OFFSET
                        ..Message::TRANSMIT_TIMESTAMP_OFFSET + 8],
                );
            let _ = socket.send_to(&reply_bytes, peer).await;
        }
    });
    addr
}

/// Spawn a misbehaving server that replies without echoing the request's
/// transmit timestamp.
async fn spawn_bad_origin_server() -> SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = socket.local_addr().expect("failed to get local addr");
    tokio::spawn(async move {
        let mut buf = [0u8; 1024];
        while let Ok((_, peer)) = socket.recv_from(&mut buf).await {
            let mut reply = Message::new();
            reply.set_mode(Mode::Server);
            reply.set_stratum(Stratum::PRIMARY);
            reply.set_origin_timestamp(Instant::new(1, 0));
            reply.set_receive_timestamp(Instant::now());
            reply.set_transmit_timestamp(Instant::now());
            let _ = socket.send_to(&reply.to_bytes(), peer).await;
        }
    });
    addr
}

#[tokio::test]
async fn test_query_time_loopback() {
    let addr = spawn_test_server().await;
    let client = SntpClient::new();

    let response = client.query_time(addr).await.expect("exchange failed");

    assert_eq!(response.mode(), Mode::Server);
    assert!(response.stratum().is_primary());
    assert_eq!(response.reference_id_text(), "LOCL");
    assert!(response.destination_timestamp().is_some());
    // Client and server share a clock, so the offset is essentially zero.
    let offset = response.local_clock_offset().expect("offset not available");
    assert!(offset.abs() < 1.0, "offset is {}", offset);
    assert_eq!(client.state(), ExchangeState::Completed);
}

#[tokio::test]
async fn test_query_time_with_timeout_loopback() {
    let addr = spawn_test_server().await;
    let response = sntp::query_time_with_timeout(addr, Duration::from_secs(5))
        .await
        .expect("exchange failed");
    assert_eq!(response.mode(), Mode::Server);
    assert!(response.local_clock_offset().is_some());
}

#[tokio::test]
async fn test_send_request_echoes_prepared_message() {
    let addr = spawn_test_server().await;
    let client = SntpClient::new();

    let mut request = Message::new();
    request.set_mode(Mode::Client);
    request.set_poll(6).unwrap();
    request.set_transmit_timestamp(Instant::new(1_704_067_200, 500_000_000));

    let response = client
        .send_request(addr, &request)
        .await
        .expect("exchange failed");
    assert_eq!(
        response.origin_timestamp(),
        Instant::new(1_704_067_200, 500_000_000)
    );
    assert_eq!(client.state(), ExchangeState::Completed);
}

#[tokio::test]
async fn test_client_reusable_after_completion() {
    let addr = spawn_test_server().await;
    let client = SntpClient::new();

    client.query_time(addr).await.expect("first exchange failed");
    assert_eq!(client.state(), ExchangeState::Completed);

    client
        .query_time(addr)
        .await
        .expect("second exchange failed");
    assert_eq!(client.state(), ExchangeState::Completed);
}

#[tokio::test]
async fn test_origin_mismatch_rejected() {
    let addr = spawn_bad_origin_server().await;
    let client = SntpClient::new();

    let err = client.query_time(addr).await.unwrap_err();
    assert!(matches!(err, SntpError::OriginMismatch), "got {err}");
    assert_eq!(client.state(), ExchangeState::Failed);
}

#[tokio::test]
async fn test_timeout_when_server_stays_silent() {
    // Bound but never reads or replies; the datagram just sits in its queue.
    let sink = UdpSocket::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = sink.local_addr().expect("failed to get local addr");

    let err = sntp::query_time_with_timeout(addr, Duration::from_millis(100))
        .await
        .unwrap_err();
    match err {
        SntpError::Transport(e) => assert_eq!(e.kind(), io::ErrorKind::TimedOut),
        other => panic!("unexpected error: {other}"),
    }
}

// ============================================================================
// Mock transport: scripted behavior plus drop counting, to pin down exactly
// when the exchange releases its transport.
// ============================================================================

enum MockBehavior {
    /// Answer any receive with these bytes.
    Reply(Vec<u8>),
    /// Fail the receive with this error kind.
    RecvError(io::ErrorKind),
    /// Never complete the receive.
    Hang,
}

struct MockTransport {
    behavior: MockBehavior,
    peer: SocketAddr,
    drops: Arc<AtomicUsize>,
}

impl MockTransport {
    fn new(behavior: MockBehavior, drops: Arc<AtomicUsize>) -> Self {
        MockTransport {
            behavior,
            peer: "127.0.0.1:123".parse().unwrap(),
            drops,
        }
    }
}

impl Drop for MockTransport {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

impl Transport for MockTransport {
    async fn send_to(&self, buf: &[u8], _target: SocketAddr) -> io::Result<usize> {
        Ok(buf.len())
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        match &self.behavior {
            MockBehavior::Reply(bytes) => {
                buf[..bytes.len()].copy_from_slice(bytes);
                Ok((bytes.len(), self.peer))
            }
            MockBehavior::RecvError(kind) => Err(io::Error::new(*kind, "injected recv failure")),
            MockBehavior::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

fn mock_server_addr() -> SocketAddr {
    "127.0.0.1:123".parse().unwrap()
}

/// Wait until the client reports an exchange awaiting its response.
async fn wait_until_awaiting(client: &SntpClient) {
    for _ in 0..500 {
        if client.state() == ExchangeState::AwaitingResponse {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("exchange never reached AwaitingResponse");
}

#[tokio::test]
async fn test_mock_exchange_success_releases_transport_once() {
    let mut request = Message::new();
    request.set_mode(Mode::Client);
    request.set_transmit_timestamp(Instant::new(1_700_000_000, 250_000_000));
    let request_bytes = request.to_bytes();

    let mut reply = Message::new();
    reply.set_mode(Mode::Server);
    reply.set_stratum(Stratum(2));
    reply.set_receive_timestamp(Instant::new(1_700_000_001, 0));
    reply.set_transmit_timestamp(Instant::new(1_700_000_001, 0));
    let mut reply_bytes = reply.to_bytes().to_vec();
    reply_bytes[Message::ORIGIN_TIMESTAMP_OFFSET..Message::ORIGIN_TIMESTAMP_OFFSET + 8]
        .copy_from_slice(
            &request_bytes
                [Message::TRANSMIT_TIMESTAMP_OFFSET..Message::TRANSMIT_TIMESTAMP_OFFSET + 8],
        );

    let drops = Arc::new(AtomicUsize::new(0));
    let mock = MockTransport::new(MockBehavior::Reply(reply_bytes), Arc::clone(&drops));
    let client = SntpClient::new();

    let response = client
        .send_request_via(mock, mock_server_addr(), &request)
        .await
        .expect("exchange failed");

    assert_eq!(response.stratum(), Stratum(2));
    assert!(response.destination_timestamp().is_some());
    assert_eq!(client.state(), ExchangeState::Completed);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_transport_error_fails_exchange() {
    let drops = Arc::new(AtomicUsize::new(0));
    let mock = MockTransport::new(
        MockBehavior::RecvError(io::ErrorKind::ConnectionRefused),
        Arc::clone(&drops),
    );
    let client = SntpClient::new();

    let err = client
        .query_time_via(mock, mock_server_addr())
        .await
        .unwrap_err();
    match err {
        SntpError::Transport(e) => assert_eq!(e.kind(), io::ErrorKind::ConnectionRefused),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(client.state(), ExchangeState::Failed);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cancel_aborts_exchange() {
    let client = Arc::new(SntpClient::new());
    let drops = Arc::new(AtomicUsize::new(0));
    let mock = MockTransport::new(MockBehavior::Hang, Arc::clone(&drops));

    let task = tokio::spawn({
        let client = Arc::clone(&client);
        async move { client.query_time_via(mock, mock_server_addr()).await }
    });

    wait_until_awaiting(&client).await;
    client.cancel();

    let result = task.await.expect("task panicked");
    assert!(matches!(result, Err(SntpError::Cancelled)));
    assert_eq!(client.state(), ExchangeState::Failed);
    // Cancellation dropped the exchange future, and its transport with it.
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_busy_rejects_concurrent_exchange() {
    let client = Arc::new(SntpClient::new());
    let first_drops = Arc::new(AtomicUsize::new(0));
    let first = MockTransport::new(MockBehavior::Hang, Arc::clone(&first_drops));

    let task = tokio::spawn({
        let client = Arc::clone(&client);
        async move { client.query_time_via(first, mock_server_addr()).await }
    });

    wait_until_awaiting(&client).await;

    // A second exchange on the same client fails fast but still consumes
    // (and so releases) the transport it was handed.
    let second_drops = Arc::new(AtomicUsize::new(0));
    let second = MockTransport::new(MockBehavior::Reply(vec![0u8; 48]), Arc::clone(&second_drops));
    let err = client
        .query_time_via(second, mock_server_addr())
        .await
        .unwrap_err();
    assert!(matches!(err, SntpError::Busy), "got {err}");
    assert_eq!(second_drops.load(Ordering::SeqCst), 1);

    // The in-flight exchange was not disturbed by the rejection.
    assert_eq!(client.state(), ExchangeState::AwaitingResponse);

    client.cancel();
    let result = task.await.expect("task panicked");
    assert!(matches!(result, Err(SntpError::Cancelled)));
    assert_eq!(first_drops.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unsupported_version_reply_rejected() {
    let mut reply = [0u8; 48];
    reply[0] = 7 << 3;

    let drops = Arc::new(AtomicUsize::new(0));
    let mock = MockTransport::new(MockBehavior::Reply(reply.to_vec()), Arc::clone(&drops));
    let client = SntpClient::new();

    let err = client
        .query_time_via(mock, mock_server_addr())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SntpError::Message(MessageError::UnsupportedVersion { version: 7 })
    ));
    assert_eq!(client.state(), ExchangeState::Failed);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_short_reply_rejected() {
    let drops = Arc::new(AtomicUsize::new(0));
    let mock = MockTransport::new(MockBehavior::Reply(vec![0u8; 20]), Arc::clone(&drops));
    let client = SntpClient::new();

    let err = client
        .query_time_via(mock, mock_server_addr())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SntpError::Message(MessageError::BufferTooShort {
            needed: 48,
            available: 20
        })
    ));
    assert_eq!(client.state(), ExchangeState::Failed);
}
