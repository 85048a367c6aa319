// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! A single-transaction SNTP client.
//!
//! [`SntpClient`] runs one request/response exchange at a time: serialize a
//! request, send it, await one reply datagram, stamp the arrival time (T4),
//! and resolve with the decoded [`Message`] or an [`SntpError`]. The exchange
//! future *is* the completion notification; it resolves exactly once with
//! either a message or an error.
//!
//! There is no retransmission and no intrinsic timeout. Bound the wait from
//! the caller, e.g. with [`crate::query_time_with_timeout`] or your own
//! `tokio::time::timeout` wrapper.
//!
//! Starting a second exchange while one is in flight fails fast with
//! [`SntpError::Busy`]; a client is reusable as soon as the previous exchange
//! reaches [`ExchangeState::Completed`] or [`ExchangeState::Failed`].
//! [`SntpClient::cancel`] aborts an in-flight exchange, which then resolves
//! with [`SntpError::Cancelled`] and releases its socket exactly as the error
//! path does.
//!
//! # Examples
//!
//! ```no_run
//! # async fn example() -> Result<(), sntp::SntpError> {
//! let client = sntp::client::SntpClient::new();
//! let response = client.query_time("time.nist.gov:123").await?;
//! if let Some(offset) = response.local_clock_offset() {
//!     println!("local clock offset: {:.6} s", offset);
//! }
//! # Ok(())
//! # }
//! ```

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, warn};
use tokio::net::{self, ToSocketAddrs, UdpSocket};
use tokio::sync::Notify;

use crate::error::SntpError;
use crate::message::Message;
use crate::protocol::Mode;
use crate::timestamp::Instant;
use crate::transport::Transport;

/// The phases of a request/response exchange.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum ExchangeState {
    /// No exchange has run on this client yet.
    Idle = 0,
    /// The request is being serialized and sent.
    Sending = 1,
    /// The request is on the wire; awaiting a reply datagram.
    AwaitingResponse = 2,
    /// The previous exchange resolved with a decoded message.
    Completed = 3,
    /// The previous exchange resolved with an error (or was cancelled).
    Failed = 4,
}

impl ExchangeState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ExchangeState::Idle,
            1 => ExchangeState::Sending,
            2 => ExchangeState::AwaitingResponse,
            3 => ExchangeState::Completed,
            _ => ExchangeState::Failed,
        }
    }

    /// Whether an exchange is currently running.
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            ExchangeState::Sending | ExchangeState::AwaitingResponse
        )
    }
}

/// A single-transaction SNTP client. See the [module docs](self).
#[derive(Debug, Default)]
pub struct SntpClient {
    state: AtomicU8,
    // Cancellation handle for the exchange currently in flight. Installed by
    // `begin`, cleared when the exchange's guard drops, so a stale `cancel`
    // cannot touch a later exchange.
    cancel: Mutex<Option<Arc<Notify>>>,
}

impl SntpClient {
    /// Creates an idle client.
    pub fn new() -> Self {
        SntpClient::default()
    }

    /// The current exchange state.
    pub fn state(&self) -> ExchangeState {
        ExchangeState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Cancels the exchange currently in flight, if any.
    ///
    /// The cancelled exchange resolves with [`SntpError::Cancelled`], drops
    /// its transport, and leaves the client in [`ExchangeState::Failed`],
    /// ready for the next exchange. Calling this with no exchange in flight
    /// does nothing.
    pub fn cancel(&self) {
        let slot = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(notify) = slot.as_ref() {
            notify.notify_one();
        }
    }

    /// Queries the server's notion of the current time.
    ///
    /// Resolves `server`, binds a fresh UDP socket in the matching address
    /// family, and runs [`query_time_via`](Self::query_time_via) over it.
    pub async fn query_time<A: ToSocketAddrs>(&self, server: A) -> Result<Message, SntpError> {
        let server = resolve(server).await?;
        let socket = bind_for(&server).await?;
        self.query_time_via(socket, server).await
    }

    /// Queries the server's notion of the current time over `transport`.
    ///
    /// Builds a client-mode request with the transmit timestamp set to the
    /// current time, then runs the exchange.
    pub async fn query_time_via<T: Transport>(
        &self,
        transport: T,
        server: SocketAddr,
    ) -> Result<Message, SntpError> {
        let mut request = Message::new();
        request.set_mode(Mode::Client);
        request.set_transmit_timestamp(Instant::now());
        self.send_request_via(transport, server, &request).await
    }

    /// Sends a caller-prepared request over a freshly bound UDP socket.
    ///
    /// See [`send_request_via`](Self::send_request_via) for the exchange
    /// semantics.
    pub async fn send_request<A: ToSocketAddrs>(
        &self,
        server: A,
        request: &Message,
    ) -> Result<Message, SntpError> {
        let server = resolve(server).await?;
        let socket = bind_for(&server).await?;
        self.send_request_via(socket, server, request).await
    }

    /// Runs one full exchange over `transport`: send `request` to `server`,
    /// receive one reply datagram, stamp its arrival time, decode it, and
    /// check that it echoes the request's transmit timestamp.
    ///
    /// The exchange owns `transport` and drops it on every exit path
    /// (success, error, cancellation, or the returned future itself being
    /// dropped), so the socket is released exactly once however the exchange
    /// ends.
    ///
    /// Fails immediately with [`SntpError::Busy`] if another exchange is in
    /// flight on this client.
    pub async fn send_request_via<T: Transport>(
        &self,
        transport: T,
        server: SocketAddr,
        request: &Message,
    ) -> Result<Message, SntpError> {
        let guard = self.begin()?;
        let cancel = guard.cancel_signal();
        let result = tokio::select! {
            result = exchange(&guard, transport, server, request) => result,
            _ = cancel.notified() => Err(SntpError::Cancelled),
        };
        match result {
            Ok(response) => {
                guard.finish(ExchangeState::Completed);
                Ok(response)
            }
            Err(e) => {
                guard.finish(ExchangeState::Failed);
                Err(e)
            }
        }
    }

    /// Claims the client for one exchange, failing fast when one is already
    /// in flight.
    fn begin(&self) -> Result<ExchangeGuard<'_>, SntpError> {
        self.state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |state| {
                if ExchangeState::from_u8(state).is_in_flight() {
                    None
                } else {
                    Some(ExchangeState::Sending as u8)
                }
            })
            .map_err(|_| SntpError::Busy)?;
        let notify = Arc::new(Notify::new());
        let mut slot = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Arc::clone(&notify));
        drop(slot);
        Ok(ExchangeGuard {
            client: self,
            notify,
        })
    }
}

/// Claim on the client for the span of one exchange.
///
/// Publishes state transitions while the exchange runs and guarantees the
/// terminal bookkeeping: when the guard drops, the cancel slot is cleared,
/// and an exchange still marked in-flight (the future was dropped mid-way)
/// lands in [`ExchangeState::Failed`].
struct ExchangeGuard<'a> {
    client: &'a SntpClient,
    notify: Arc<Notify>,
}

impl ExchangeGuard<'_> {
    fn cancel_signal(&self) -> Arc<Notify> {
        Arc::clone(&self.notify)
    }

    fn set_state(&self, state: ExchangeState) {
        self.client.state.store(state as u8, Ordering::Release);
    }

    fn finish(self, state: ExchangeState) {
        self.set_state(state);
    }
}

impl Drop for ExchangeGuard<'_> {
    fn drop(&mut self) {
        let mut slot = self
            .client
            .cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = None;
        drop(slot);
        let _ = self
            .client
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |state| {
                if ExchangeState::from_u8(state).is_in_flight() {
                    Some(ExchangeState::Failed as u8)
                } else {
                    None
                }
            });
    }
}

/// The exchange body. `send_request_via` races this against cancellation;
/// dropping it mid-way drops the transport.
async fn exchange<T: Transport>(
    guard: &ExchangeGuard<'_>,
    transport: T,
    server: SocketAddr,
    request: &Message,
) -> Result<Message, SntpError> {
    let request_bytes = request.to_bytes();
    let sent = transport.send_to(&request_bytes, server).await?;
    debug!("sent: {} bytes to {}", sent, server);
    guard.set_state(ExchangeState::AwaitingResponse);

    // Reply datagrams may carry extension fields past the 48-byte header.
    let mut recv_buf = [0u8; 1024];
    let (recv_len, src_addr) = transport.recv_from(&mut recv_buf[..]).await?;
    // T4 is read before any validation so that processing time inside this
    // process does not skew the offset.
    let destination = Instant::now();
    debug!("recv: {} bytes from {:?}", recv_len, src_addr);

    let mut response = Message::from_bytes(&recv_buf[..recv_len])?;
    let response_bytes = response.to_bytes();
    let origin = &response_bytes
        [Message::ORIGIN_TIMESTAMP_OFFSET..Message::ORIGIN_TIMESTAMP_OFFSET + 8];
    let transmit = &request_bytes
        [Message::TRANSMIT_TIMESTAMP_OFFSET..Message::TRANSMIT_TIMESTAMP_OFFSET + 8];
    if origin != transmit {
        warn!("origin timestamp mismatch from {:?}", src_addr);
        return Err(SntpError::OriginMismatch);
    }
    response.set_destination_timestamp(destination);
    Ok(response)
}

/// Resolves `server` to its first socket address.
async fn resolve<A: ToSocketAddrs>(server: A) -> Result<SocketAddr, SntpError> {
    let mut addrs = net::lookup_host(server).await?;
    addrs.next().ok_or_else(|| {
        SntpError::Transport(io::Error::new(
            io::ErrorKind::InvalidInput,
            "address resolved to no socket addresses",
        ))
    })
}

/// Binds an unspecified-address UDP socket in `server`'s address family.
async fn bind_for(server: &SocketAddr) -> Result<UdpSocket, SntpError> {
    let bind_addr = match server {
        SocketAddr::V4(_) => "0.0.0.0:0",
        SocketAddr::V6(_) => "[::]:0",
    };
    let socket = UdpSocket::bind(bind_addr).await?;
    debug!("{:?}", socket.local_addr());
    Ok(socket)
}
