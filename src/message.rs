// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! The 48-byte SNTP message header and its typed accessors.
//!
//! A [`Message`] is a view over the raw header bytes: it owns a fixed 48-byte
//! backing array, and every accessor reads or writes that array directly in
//! network byte order. Construction establishes the length invariant, so the
//! accessors themselves cannot fail (the only fallible setters are the two
//! whose value range is narrower than their parameter type).
//!
//! ### Layout
//!
//! ```ignore
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |LI | VN  |Mode |    Stratum    |     Poll      |   Precision   |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                          Root Delay                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                        Root Dispersion                        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                         Reference ID                          |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                                                               |
//! +                     Reference Timestamp (64)                  +
//! |                                                               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                                                               |
//! +                      Origin Timestamp (64)                    +
//! |                                                               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                                                               |
//! +                      Receive Timestamp (64)                   +
//! |                                                               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                                                               |
//! +                      Transmit Timestamp (64)                  +
//! |                                                               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! The destination timestamp (the moment the response arrived, T4 in the
//! RFC 5905 on-wire exchange) is carried alongside the buffer but never
//! serialized; the orchestrator stamps it on receipt.

use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;

use crate::error::MessageError;
use crate::protocol::{LeapIndicator, Mode, Stratum, VERSION};
use crate::timestamp::{self, Instant};

// Bit layout of the first header byte.
const LEAP_INDICATOR_MASK: u8 = 0b1100_0000;
const LEAP_INDICATOR_SHIFT: u8 = 6;
const VERSION_MASK: u8 = 0b0011_1000;
const VERSION_SHIFT: u8 = 3;
const MODE_MASK: u8 = 0b0000_0111;

/// A buffer-backed SNTP message.
///
/// New outgoing messages start zeroed with the version preset; incoming
/// messages are constructed from received bytes with [`Message::from_bytes`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Message {
    data: [u8; Self::SIZE],
    destination_timestamp: Option<Instant>,
}

impl Message {
    /// The serialized size of the header in bytes.
    pub const SIZE: usize = 48;

    /// Byte offset of the stratum field.
    pub const STRATUM_OFFSET: usize = 1;
    /// Byte offset of the poll field.
    pub const POLL_OFFSET: usize = 2;
    /// Byte offset of the precision field.
    pub const PRECISION_OFFSET: usize = 3;
    /// Byte offset of the root delay field.
    pub const ROOT_DELAY_OFFSET: usize = 4;
    /// Byte offset of the root dispersion field.
    pub const ROOT_DISPERSION_OFFSET: usize = 8;
    /// Byte offset of the reference identifier field.
    pub const REFERENCE_ID_OFFSET: usize = 12;
    /// Byte offset of the reference timestamp field.
    pub const REFERENCE_TIMESTAMP_OFFSET: usize = 16;
    /// Byte offset of the origin timestamp field (T1).
    pub const ORIGIN_TIMESTAMP_OFFSET: usize = 24;
    /// Byte offset of the receive timestamp field (T2).
    pub const RECEIVE_TIMESTAMP_OFFSET: usize = 32;
    /// Byte offset of the transmit timestamp field (T3).
    pub const TRANSMIT_TIMESTAMP_OFFSET: usize = 40;

    /// Creates a zeroed message with the version field preset to
    /// [`VERSION`](crate::protocol::VERSION).
    pub fn new() -> Self {
        let mut message = Message {
            data: [0; Self::SIZE],
            destination_timestamp: None,
        };
        message.set_version(VERSION);
        message
    }

    /// Constructs a message from received bytes.
    ///
    /// The first [`Message::SIZE`] bytes are copied into the message; trailing
    /// bytes (extension fields, MACs) are ignored. Fails with
    /// [`MessageError::BufferTooShort`] if `raw` holds fewer than 48 bytes and
    /// with [`MessageError::UnsupportedVersion`] if the version field exceeds
    /// [`VERSION`](crate::protocol::VERSION).
    pub fn from_bytes(raw: &[u8]) -> Result<Self, MessageError> {
        if raw.len() < Self::SIZE {
            return Err(MessageError::BufferTooShort {
                needed: Self::SIZE,
                available: raw.len(),
            });
        }
        let mut data = [0u8; Self::SIZE];
        data.copy_from_slice(&raw[..Self::SIZE]);
        let message = Message {
            data,
            destination_timestamp: None,
        };
        let version = message.version();
        if version > VERSION {
            return Err(MessageError::UnsupportedVersion { version });
        }
        Ok(message)
    }

    /// Returns a copy of the 48-byte header, ready for transmission.
    ///
    /// The returned array is independent of the message; mutating one never
    /// affects the other.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        self.data
    }

    /// The leap indicator (bits 6-7 of the first header byte).
    pub fn leap_indicator(&self) -> LeapIndicator {
        LeapIndicator::from(self.data[0] >> LEAP_INDICATOR_SHIFT)
    }

    /// Sets the leap indicator, leaving the version and mode bits untouched.
    pub fn set_leap_indicator(&mut self, leap_indicator: LeapIndicator) {
        self.data[0] = (self.data[0] & !LEAP_INDICATOR_MASK)
            | ((leap_indicator as u8) << LEAP_INDICATOR_SHIFT);
    }

    /// The protocol version number (bits 3-5 of the first header byte).
    pub fn version(&self) -> u8 {
        (self.data[0] & VERSION_MASK) >> VERSION_SHIFT
    }

    /// Sets the version number. Only the low 3 bits of `version` are used.
    pub fn set_version(&mut self, version: u8) {
        self.data[0] = (self.data[0] & !VERSION_MASK) | ((version << VERSION_SHIFT) & VERSION_MASK);
    }

    /// The association mode (bits 0-2 of the first header byte).
    pub fn mode(&self) -> Mode {
        Mode::from(self.data[0] & MODE_MASK)
    }

    /// Sets the mode, leaving the leap indicator and version bits untouched.
    pub fn set_mode(&mut self, mode: Mode) {
        self.data[0] = (self.data[0] & !MODE_MASK) | (mode as u8);
    }

    /// The stratum of the server clock.
    pub fn stratum(&self) -> Stratum {
        Stratum(self.data[Self::STRATUM_OFFSET])
    }

    /// Sets the stratum.
    pub fn set_stratum(&mut self, stratum: Stratum) {
        self.data[Self::STRATUM_OFFSET] = stratum.0;
    }

    /// The poll interval as a signed log2 of seconds.
    pub fn poll(&self) -> i8 {
        self.data[Self::POLL_OFFSET] as i8
    }

    /// Sets the poll interval.
    ///
    /// Fails with [`MessageError::ValueOutOfRange`] when `value` does not fit
    /// the field's signed 8-bit range.
    pub fn set_poll(&mut self, value: i32) -> Result<(), MessageError> {
        let poll = i8::try_from(value)
            .map_err(|_| MessageError::ValueOutOfRange { field: "poll", value })?;
        self.data[Self::POLL_OFFSET] = poll as u8;
        Ok(())
    }

    /// The precision of the server clock as a signed log2 of seconds.
    pub fn precision(&self) -> i8 {
        self.data[Self::PRECISION_OFFSET] as i8
    }

    /// Sets the precision.
    ///
    /// Fails with [`MessageError::ValueOutOfRange`] when `value` does not fit
    /// the field's signed 8-bit range.
    pub fn set_precision(&mut self, value: i32) -> Result<(), MessageError> {
        let precision = i8::try_from(value).map_err(|_| MessageError::ValueOutOfRange {
            field: "precision",
            value,
        })?;
        self.data[Self::PRECISION_OFFSET] = precision as u8;
        Ok(())
    }

    /// Total round-trip delay to the reference clock.
    pub fn root_delay(&self) -> Duration {
        timestamp::from_ntp_short(&self.data[Self::ROOT_DELAY_OFFSET..])
    }

    /// Sets the root delay.
    pub fn set_root_delay(&mut self, delay: Duration) {
        self.data[Self::ROOT_DELAY_OFFSET..Self::ROOT_DELAY_OFFSET + 4]
            .copy_from_slice(&timestamp::to_ntp_short(delay));
    }

    /// Total dispersion to the reference clock.
    pub fn root_dispersion(&self) -> Duration {
        timestamp::from_ntp_short(&self.data[Self::ROOT_DISPERSION_OFFSET..])
    }

    /// Sets the root dispersion.
    pub fn set_root_dispersion(&mut self, dispersion: Duration) {
        self.data[Self::ROOT_DISPERSION_OFFSET..Self::ROOT_DISPERSION_OFFSET + 4]
            .copy_from_slice(&timestamp::to_ntp_short(dispersion));
    }

    /// The raw reference identifier bytes.
    ///
    /// Interpretation depends on the stratum: see
    /// [`reference_id_text`](Self::reference_id_text) and
    /// [`reference_id_ipv4`](Self::reference_id_ipv4).
    pub fn reference_id(&self) -> [u8; 4] {
        let mut id = [0u8; 4];
        id.copy_from_slice(&self.data[Self::REFERENCE_ID_OFFSET..Self::REFERENCE_ID_OFFSET + 4]);
        id
    }

    /// Sets the raw reference identifier bytes.
    pub fn set_reference_id(&mut self, id: [u8; 4]) {
        self.data[Self::REFERENCE_ID_OFFSET..Self::REFERENCE_ID_OFFSET + 4].copy_from_slice(&id);
    }

    /// The reference identifier as ASCII text with trailing NULs stripped.
    ///
    /// Meaningful for [`Stratum::UNSPECIFIED`] (kiss codes such as `"RATE"`)
    /// and [`Stratum::PRIMARY`] (reference source names such as `"GPS"`).
    pub fn reference_id_text(&self) -> String {
        let id = self.reference_id();
        String::from_utf8_lossy(&id)
            .trim_end_matches('\0')
            .to_string()
    }

    /// The reference identifier as an IPv4 address.
    ///
    /// Meaningful for secondary strata, where the field carries the address
    /// of the server's synchronization source.
    pub fn reference_id_ipv4(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.reference_id())
    }

    /// The time the server clock was last set or corrected.
    pub fn reference_timestamp(&self) -> Instant {
        timestamp::from_ntp_timestamp(&self.data[Self::REFERENCE_TIMESTAMP_OFFSET..])
    }

    /// Sets the reference timestamp.
    pub fn set_reference_timestamp(&mut self, t: Instant) {
        self.data[Self::REFERENCE_TIMESTAMP_OFFSET..Self::REFERENCE_TIMESTAMP_OFFSET + 8]
            .copy_from_slice(&timestamp::to_ntp_timestamp(t));
    }

    /// The time the request departed the client (T1), echoed by the server.
    pub fn origin_timestamp(&self) -> Instant {
        timestamp::from_ntp_timestamp(&self.data[Self::ORIGIN_TIMESTAMP_OFFSET..])
    }

    /// Sets the origin timestamp.
    pub fn set_origin_timestamp(&mut self, t: Instant) {
        self.data[Self::ORIGIN_TIMESTAMP_OFFSET..Self::ORIGIN_TIMESTAMP_OFFSET + 8]
            .copy_from_slice(&timestamp::to_ntp_timestamp(t));
    }

    /// The time the request arrived at the server (T2).
    pub fn receive_timestamp(&self) -> Instant {
        timestamp::from_ntp_timestamp(&self.data[Self::RECEIVE_TIMESTAMP_OFFSET..])
    }

    /// Sets the receive timestamp.
    pub fn set_receive_timestamp(&mut self, t: Instant) {
        self.data[Self::RECEIVE_TIMESTAMP_OFFSET..Self::RECEIVE_TIMESTAMP_OFFSET + 8]
            .copy_from_slice(&timestamp::to_ntp_timestamp(t));
    }

    /// The time the response departed the server (T3).
    pub fn transmit_timestamp(&self) -> Instant {
        timestamp::from_ntp_timestamp(&self.data[Self::TRANSMIT_TIMESTAMP_OFFSET..])
    }

    /// Sets the transmit timestamp.
    pub fn set_transmit_timestamp(&mut self, t: Instant) {
        self.data[Self::TRANSMIT_TIMESTAMP_OFFSET..Self::TRANSMIT_TIMESTAMP_OFFSET + 8]
            .copy_from_slice(&timestamp::to_ntp_timestamp(t));
    }

    /// The time the response arrived back at the client (T4), if it has been
    /// stamped. Never serialized.
    pub fn destination_timestamp(&self) -> Option<Instant> {
        self.destination_timestamp
    }

    /// Stamps the destination timestamp.
    pub fn set_destination_timestamp(&mut self, t: Instant) {
        self.destination_timestamp = Some(t);
    }

    /// The clock offset in seconds, computed from the four exchange
    /// timestamps as `((T2 - T1) - (T4 - T3)) / 2`.
    ///
    /// A positive value means the local clock is behind the server. A
    /// negative value means the local clock is ahead of the server.
    ///
    /// Returns `None` until the destination timestamp has been stamped; the
    /// formula is only meaningful after a completed exchange.
    pub fn local_clock_offset(&self) -> Option<f64> {
        let destination = self.destination_timestamp?;
        let t1 = secs_f64(self.origin_timestamp());
        let t2 = secs_f64(self.receive_timestamp());
        let t3 = secs_f64(self.transmit_timestamp());
        let t4 = secs_f64(destination);
        Some(((t2 - t1) - (t4 - t3)) / 2.0)
    }
}

impl Default for Message {
    fn default() -> Self {
        Message::new()
    }
}

// Total seconds as a float, for offset arithmetic across the four timestamps.
fn secs_f64(t: Instant) -> f64 {
    t.secs() as f64 + f64::from(t.subsec_nanos()) * 1e-9
}

fn write_instant(f: &mut fmt::Formatter<'_>, label: &str, t: Instant) -> fmt::Result {
    let sign = if t.secs() < 0 || t.subsec_nanos() < 0 {
        "-"
    } else {
        ""
    };
    writeln!(
        f,
        "{}: {}{}.{:09}",
        label,
        sign,
        t.secs().unsigned_abs(),
        t.subsec_nanos().unsigned_abs()
    )
}

impl fmt::Display for Message {
    /// Renders every field in a fixed order for diagnostics, interpreting the
    /// reference identifier according to the stratum.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "leap indicator: {:?}", self.leap_indicator())?;
        writeln!(f, "version: {}", self.version())?;
        writeln!(f, "mode: {:?}", self.mode())?;
        writeln!(f, "stratum: {}", self.stratum())?;
        writeln!(f, "poll: {}", self.poll())?;
        writeln!(f, "precision: {}", self.precision())?;
        writeln!(f, "root delay: {:?}", self.root_delay())?;
        writeln!(f, "root dispersion: {:?}", self.root_dispersion())?;
        let stratum = self.stratum();
        if stratum.is_unspecified() || stratum.is_primary() {
            writeln!(f, "reference id: {}", self.reference_id_text())?;
        } else if stratum.is_secondary() {
            writeln!(f, "reference id: {}", self.reference_id_ipv4())?;
        } else {
            writeln!(f, "reference id: {:02x?}", self.reference_id())?;
        }
        write_instant(f, "reference timestamp", self.reference_timestamp())?;
        write_instant(f, "origin timestamp", self.origin_timestamp())?;
        write_instant(f, "receive timestamp", self.receive_timestamp())?;
        write_instant(f, "transmit timestamp", self.transmit_timestamp())?;
        match self.destination_timestamp() {
            Some(t) => write_instant(f, "destination timestamp", t)?,
            None => writeln!(f, "destination timestamp: -")?,
        }
        match self.local_clock_offset() {
            Some(offset) => writeln!(f, "local clock offset: {:.6} s", offset),
            None => writeln!(f, "local clock offset: -"),
        }
    }
}
