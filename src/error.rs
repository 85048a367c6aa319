// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Error types for the message codec and the request/response exchange.
//!
//! [`MessageError`] covers synchronous codec failures (construction from a
//! short buffer, unsupported version, setter range violations). [`SntpError`]
//! covers everything an exchange can report. Both convert to
//! [`std::io::Error`] for interop with I/O-flavored call sites; programmatic
//! matching on a converted error works via [`std::io::Error::get_ref`] and
//! `downcast_ref`.

use std::error::Error;
use std::fmt;
use std::io;

/// Errors that can occur while constructing a message or writing its fields.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MessageError {
    /// The buffer is too short to hold a full 48-byte header.
    BufferTooShort {
        /// Number of bytes needed.
        needed: usize,
        /// Number of bytes available.
        available: usize,
    },
    /// The version field of a received packet is newer than this crate speaks.
    UnsupportedVersion {
        /// The version the packet declared.
        version: u8,
    },
    /// A field setter was given a value outside the field's range.
    ValueOutOfRange {
        /// Name of the field being set.
        field: &'static str,
        /// The rejected value.
        value: i32,
    },
}

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageError::BufferTooShort { needed, available } => {
                write!(
                    f,
                    "buffer too short: needed {} bytes, got {}",
                    needed, available
                )
            }
            MessageError::UnsupportedVersion { version } => {
                write!(f, "unsupported protocol version: {}", version)
            }
            MessageError::ValueOutOfRange { field, value } => {
                write!(f, "{} value out of range: {}", field, value)
            }
        }
    }
}

impl Error for MessageError {}

impl From<MessageError> for io::Error {
    fn from(err: MessageError) -> io::Error {
        let kind = match &err {
            MessageError::BufferTooShort { .. } => io::ErrorKind::UnexpectedEof,
            MessageError::UnsupportedVersion { .. } => io::ErrorKind::InvalidData,
            MessageError::ValueOutOfRange { .. } => io::ErrorKind::InvalidInput,
        };
        io::Error::new(kind, err)
    }
}

/// Errors that can resolve a request/response exchange.
#[derive(Debug)]
pub enum SntpError {
    /// The response failed to decode.
    Message(MessageError),
    /// Sending, receiving, binding, or address resolution failed. Carries the
    /// platform's native error code where one exists.
    Transport(io::Error),
    /// The response's origin timestamp does not echo the transmit timestamp
    /// of the request (stale or duplicate datagram).
    OriginMismatch,
    /// An exchange is already in flight on this client.
    Busy,
    /// The exchange was cancelled mid-flight.
    Cancelled,
}

impl fmt::Display for SntpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SntpError::Message(e) => write!(f, "invalid response: {}", e),
            SntpError::Transport(e) => write!(f, "transport error: {}", e),
            SntpError::OriginMismatch => {
                write!(f, "response origin timestamp does not match request")
            }
            SntpError::Busy => write!(f, "an exchange is already in flight"),
            SntpError::Cancelled => write!(f, "exchange cancelled"),
        }
    }
}

impl Error for SntpError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SntpError::Message(e) => Some(e),
            SntpError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MessageError> for SntpError {
    fn from(err: MessageError) -> SntpError {
        SntpError::Message(err)
    }
}

impl From<io::Error> for SntpError {
    fn from(err: io::Error) -> SntpError {
        SntpError::Transport(err)
    }
}

impl From<SntpError> for io::Error {
    fn from(err: SntpError) -> io::Error {
        let kind = match &err {
            SntpError::Message(e) => return io::Error::from(*e),
            SntpError::Transport(e) => return io::Error::new(e.kind(), err),
            SntpError::OriginMismatch => io::ErrorKind::InvalidData,
            SntpError::Busy => io::ErrorKind::WouldBlock,
            SntpError::Cancelled => io::ErrorKind::Interrupted,
        };
        io::Error::new(kind, err)
    }
}
