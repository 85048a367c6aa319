//! Field-level types and constants for the SNTP packet header.
//!
//! These types cover the sub-byte fields packed into the first header byte
//! (leap indicator, version, mode) and the stratum byte. The header codec
//! itself lives in [`crate::message`].
//!
//! Documentation is largely derived (and often copied directly) from IETF RFC
//! 5905 and RFC 4330.

use std::fmt;

/// NTP port number.
pub const PORT: u16 = 123;

/// The highest NTP version this crate speaks, and the version stamped into
/// newly built messages.
pub const VERSION: u8 = 4;

/// A 2-bit integer warning of an impending leap second to be inserted or
/// deleted in the last minute of the current day.
///
/// Note that this field is packed into bits 6-7 of the first header byte.
///
/// Every 2-bit pattern is a defined variant, so conversion from the masked
/// field bits is total.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
pub enum LeapIndicator {
    /// No leap second adjustment required.
    #[default]
    NoWarning = 0,
    /// Last minute of the day has 61 seconds.
    InsertSecond = 1,
    /// Last minute of the day has 59 seconds.
    DeleteSecond = 2,
    /// Clock unsynchronized; alarm condition.
    Unknown = 3,
}

impl From<u8> for LeapIndicator {
    /// Converts from the low 2 bits of `value`; higher bits are ignored.
    fn from(value: u8) -> Self {
        match value & 0b11 {
            0 => LeapIndicator::NoWarning,
            1 => LeapIndicator::InsertSecond,
            2 => LeapIndicator::DeleteSecond,
            _ => LeapIndicator::Unknown,
        }
    }
}

/// A 3-bit integer representing the association mode.
///
/// Note that this field is packed into bits 0-2 of the first header byte. An
/// SNTP client sends [`Mode::Client`] and expects [`Mode::Server`] in the
/// reply.
///
/// Every 3-bit pattern is a defined variant, so conversion from the masked
/// field bits is total.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum Mode {
    /// Reserved mode (value 0).
    Reserved = 0,
    /// Symmetric active mode (value 1).
    SymmetricActive = 1,
    /// Symmetric passive mode (value 2).
    SymmetricPassive = 2,
    /// Client mode (value 3).
    Client = 3,
    /// Server mode (value 4).
    Server = 4,
    /// Broadcast mode (value 5).
    Broadcast = 5,
    /// NTP control message mode (value 6).
    ControlMessage = 6,
    /// Reserved for private use (value 7).
    ReservedForPrivateUse = 7,
}

impl From<u8> for Mode {
    /// Converts from the low 3 bits of `value`; higher bits are ignored.
    fn from(value: u8) -> Self {
        match value & 0b111 {
            0 => Mode::Reserved,
            1 => Mode::SymmetricActive,
            2 => Mode::SymmetricPassive,
            3 => Mode::Client,
            4 => Mode::Server,
            5 => Mode::Broadcast,
            6 => Mode::ControlMessage,
            _ => Mode::ReservedForPrivateUse,
        }
    }
}

/// An 8-bit integer representing the stratum.
///
/// ```ignore
/// +--------+-----------------------------------------------------+
/// | Value  | Meaning                                             |
/// +--------+-----------------------------------------------------+
/// | 0      | unspecified or invalid                              |
/// | 1      | primary server (e.g., equipped with a GPS receiver) |
/// | 2-15   | secondary server (via NTP)                          |
/// | 16     | unsynchronized                                      |
/// | 17-255 | reserved                                            |
/// +--------+-----------------------------------------------------+
/// ```
///
/// The stratum value selects the interpretation of the reference identifier
/// field: a four-character ASCII string (kiss code or reference source name)
/// for [`Stratum::UNSPECIFIED`] and [`Stratum::PRIMARY`], an IPv4 address for
/// secondary strata, opaque bytes otherwise. See
/// [`crate::message::Message::reference_id_text`].
#[derive(Copy, Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Stratum(pub u8);

impl Stratum {
    /// Unspecified or invalid (kiss-o'-death when received from a server).
    pub const UNSPECIFIED: Self = Stratum(0);
    /// The primary server (e.g. equipped with a GPS receiver).
    pub const PRIMARY: Self = Stratum(1);
    /// The minimum value specifying a secondary server (via NTP).
    pub const SECONDARY_MIN: Self = Stratum(2);
    /// The maximum value specifying a secondary server (via NTP).
    pub const SECONDARY_MAX: Self = Stratum(15);
    /// An unsynchronized clock.
    pub const UNSYNCHRONIZED: Self = Stratum(16);
    /// The maximum valid stratum value.
    pub const MAX: Self = Stratum(16);

    /// Whether or not the stratum is unspecified or invalid.
    pub fn is_unspecified(&self) -> bool {
        *self == Self::UNSPECIFIED
    }

    /// Whether or not the stratum represents a primary server.
    pub fn is_primary(&self) -> bool {
        *self == Self::PRIMARY
    }

    /// Whether or not the stratum represents a secondary server.
    pub fn is_secondary(&self) -> bool {
        Self::SECONDARY_MIN <= *self && *self <= Self::SECONDARY_MAX
    }

    /// Whether or not the stratum marks an unsynchronized clock.
    pub fn is_unsynchronized(&self) -> bool {
        *self == Self::UNSYNCHRONIZED
    }

    /// Whether or not the stratum is in the reserved range.
    pub fn is_reserved(&self) -> bool {
        *self > Self::MAX
    }
}

impl fmt::Display for Stratum {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
