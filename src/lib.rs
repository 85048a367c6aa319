/*!
# Example
Shows how to use the sntp library to fetch the current time according
to the requested ntp server.

```rust,no_run
use chrono::TimeZone;

#[tokio::main]
async fn main() {
    let address = "0.pool.ntp.org:123";
    let response = sntp::query_time(address).await.unwrap();
    let transmit = response.transmit_timestamp();
    let local_time = chrono::Local
        .timestamp_opt(transmit.secs(), transmit.subsec_nanos() as _)
        .unwrap();
    println!("{}", local_time);
    if let Some(offset) = response.local_clock_offset() {
        println!("Offset: {:.6} seconds", offset);
    }
}
```

For control over the request packet, the transport, cancellation, or
concurrency, use [`client::SntpClient`] directly.
*/

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// A single-transaction SNTP client with cancellation and busy rejection.
pub mod client;
/// Error types for the message codec and the request/response exchange.
pub mod error;
/// The 48-byte SNTP message header and its typed accessors.
pub mod message;
pub mod protocol;
/// Conversion utilities between calendar time and NTP wire formats.
///
/// Provides the `Instant` type for converting between NTP timestamps
/// (seconds since 1900-01-01) and Unix timestamps (seconds since 1970-01-01).
pub mod timestamp;
/// The datagram transport capability consumed by the client.
pub mod transport;

pub use client::{ExchangeState, SntpClient};
pub use error::{MessageError, SntpError};
pub use message::Message;
pub use transport::Transport;

use std::io;
use std::time::Duration;

use tokio::net::ToSocketAddrs;

/// Send a request to an SNTP server with a hardcoded 5 second timeout.
///
/// This is a convenience wrapper around [`query_time_with_timeout`] with a
/// 5 second timeout.
///
/// # Arguments
///
/// * `server` - Any valid socket address (e.g., `"pool.ntp.org:123"` or `"192.168.1.1:123"`)
///
/// # Returns
///
/// Returns the server's response [`Message`] with its destination timestamp
/// (T4) recorded, so [`Message::local_clock_offset`] is available, or an
/// error if the server cannot be reached or the response is invalid.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> Result<(), sntp::SntpError> {
/// let response = sntp::query_time("pool.ntp.org:123").await?;
///
/// println!("Server time: {:?}", response.transmit_timestamp());
/// println!("Stratum: {}", response.stratum());
///
/// if let Some(offset) = response.local_clock_offset() {
///     println!("Offset: {:.6} seconds", offset);
/// }
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns [`SntpError`] if:
/// - Cannot bind to a local UDP socket
/// - No response within 5 seconds
/// - DNS resolution fails
/// - The response is shorter than 48 bytes or has an unsupported version
/// - The response origin timestamp does not match our request (anti-replay)
pub async fn query_time<A: ToSocketAddrs>(server: A) -> Result<Message, SntpError> {
    query_time_with_timeout(server, Duration::from_secs(5)).await
}

/// Send a request to an SNTP server with a configurable timeout.
///
/// Runs one full exchange on a fresh [`SntpClient`] bounded by
/// [`tokio::time::timeout`]. The timeout covers the entire exchange
/// (DNS + send + receive).
///
/// # Arguments
///
/// * `server` - Any valid socket address (e.g., `"pool.ntp.org:123"` or `"192.168.1.1:123"`)
/// * `timeout` - Maximum duration for the entire exchange
///
/// # Examples
///
/// ```no_run
/// # use std::time::Duration;
/// # async fn example() -> Result<(), sntp::SntpError> {
/// let response =
///     sntp::query_time_with_timeout("pool.ntp.org:123", Duration::from_secs(10)).await?;
/// if let Some(offset) = response.local_clock_offset() {
///     println!("Offset: {:.6} seconds", offset);
/// }
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// As [`query_time`], with the timeout reported as an
/// [`SntpError::Transport`] of kind [`io::ErrorKind::TimedOut`].
pub async fn query_time_with_timeout<A: ToSocketAddrs>(
    server: A,
    timeout: Duration,
) -> Result<Message, SntpError> {
    let client = SntpClient::new();
    tokio::time::timeout(timeout, client.query_time(server))
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "NTP request timed out"))?
}
