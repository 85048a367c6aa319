//! Conversions between calendar time and the NTP fixed-point wire formats.
//!
//! The 64-bit timestamp format carries whole seconds since the prime epoch
//! (1900-01-01 00:00:00 UTC) in the high 32 bits and the fraction in units of
//! 2^-32 seconds in the low 32 bits. The 32-bit short format used by the root
//! delay and root dispersion fields carries 16 bits of seconds and 16 bits of
//! fraction (units of 2^-16 seconds).
//!
//! All conversions are pure integer arithmetic so results are identical on
//! every platform. The scaled seconds value (which would exceed the signed
//! 64-bit range for any date after 1968) is never materialized; the seconds
//! and fraction halves are computed separately.

use byteorder::{BigEndian, ByteOrder};
use std::time::{self, Duration};

/// The number of seconds from 1st January 1900 UTC to the start of the Unix epoch.
pub const EPOCH_DELTA: i64 = 2_208_988_800;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Describes an instant relative to the `UNIX_EPOCH` - 00:00:00 Coordinated
/// Universal Time (UTC), Thursday, 1 January 1970 in seconds with the
/// fractional part in nanoseconds.
///
/// If the **Instant** describes some moment prior to `UNIX_EPOCH`, both the
/// `secs` and `subsec_nanos` components will be negative.
///
/// The sole purpose of this type is for retrieving the "current" time using
/// the `std::time` module and for converting between the NTP wire formats. If
/// you are interested in converting from unix time to some other more human
/// readable format, perhaps see the [chrono
/// crate](https://crates.io/crates/chrono).
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Instant {
    secs: i64,
    subsec_nanos: i32,
}

impl Instant {
    /// Create a new **Instant** given its `secs` and `subsec_nanos` components.
    ///
    /// To indicate a time following `UNIX_EPOCH`, both `secs` and
    /// `subsec_nanos` must be positive. To indicate a time prior to
    /// `UNIX_EPOCH`, both `secs` and `subsec_nanos` must be negative.
    /// Violating these invariants will result in a **panic!**.
    pub fn new(secs: i64, subsec_nanos: i32) -> Instant {
        if secs > 0 && subsec_nanos < 0 {
            panic!("invalid instant: secs was positive but subsec_nanos was negative");
        }
        if secs < 0 && subsec_nanos > 0 {
            panic!("invalid instant: secs was negative but subsec_nanos was positive");
        }
        Instant { secs, subsec_nanos }
    }

    /// Uses `std::time::SystemTime::now` and `std::time::UNIX_EPOCH` to
    /// determine the current **Instant**.
    pub fn now() -> Self {
        match time::SystemTime::now().duration_since(time::UNIX_EPOCH) {
            Ok(duration) => {
                let secs = duration.as_secs() as i64;
                let subsec_nanos = duration.subsec_nanos() as i32;
                Instant::new(secs, subsec_nanos)
            }
            Err(sys_time_err) => {
                let duration_pre_unix_epoch = sys_time_err.duration();
                let secs = -(duration_pre_unix_epoch.as_secs() as i64);
                let subsec_nanos = -(duration_pre_unix_epoch.subsec_nanos() as i32);
                Instant::new(secs, subsec_nanos)
            }
        }
    }

    /// The "seconds" component of the **Instant**.
    pub fn secs(&self) -> i64 {
        self.secs
    }

    /// The fractional component of the **Instant** in nanoseconds.
    pub fn subsec_nanos(&self) -> i32 {
        self.subsec_nanos
    }
}

/// Encode an [`Instant`] as an 8-byte NTP timestamp (era 0, big-endian).
///
/// The encoding floors the real-valued offset from the prime epoch to a
/// multiple of 2^-32 seconds. Seconds outside era 0 wrap modulo 2^32.
pub fn to_ntp_timestamp(t: Instant) -> [u8; 8] {
    let mut ntp_secs = t.secs() + EPOCH_DELTA;
    let mut nanos = i64::from(t.subsec_nanos());
    // Borrow one second so the fraction is non-negative.
    if nanos < 0 {
        ntp_secs -= 1;
        nanos += NANOS_PER_SEC as i64;
    }
    // nanos << 32 < 2^62, so the intermediate cannot overflow.
    let fraction = ((nanos as u64) << 32) / NANOS_PER_SEC;
    let mut bytes = [0u8; 8];
    BigEndian::write_u32(&mut bytes[..4], ntp_secs as u32);
    BigEndian::write_u32(&mut bytes[4..], fraction as u32);
    bytes
}

/// Decode the first 8 bytes of `raw` as an era-0 NTP timestamp.
///
/// # Panics
///
/// Panics if `raw` holds fewer than 8 bytes.
pub fn from_ntp_timestamp(raw: &[u8]) -> Instant {
    let seconds = BigEndian::read_u32(&raw[..4]);
    let fraction = BigEndian::read_u32(&raw[4..8]);
    let mut secs = i64::from(seconds) - EPOCH_DELTA;
    let mut nanos = ((u64::from(fraction) * NANOS_PER_SEC) >> 32) as i64;
    // Match the component signs for pre-unix-epoch times.
    if secs < 0 && nanos > 0 {
        secs += 1;
        nanos -= NANOS_PER_SEC as i64;
    }
    Instant::new(secs, nanos as i32)
}

/// Encode a [`Duration`] as a 4-byte NTP short format value (big-endian).
///
/// Durations beyond the format's ~18.2 hour range saturate at the maximum.
pub fn to_ntp_short(duration: Duration) -> [u8; 4] {
    let whole = duration.as_secs().saturating_mul(1 << 16);
    let fraction = (u64::from(duration.subsec_nanos()) << 16) / NANOS_PER_SEC;
    let units = whole.saturating_add(fraction).min(u64::from(u32::MAX)) as u32;
    let mut bytes = [0u8; 4];
    BigEndian::write_u32(&mut bytes, units);
    bytes
}

/// Decode the first 4 bytes of `raw` as an NTP short format value.
///
/// # Panics
///
/// Panics if `raw` holds fewer than 4 bytes.
pub fn from_ntp_short(raw: &[u8]) -> Duration {
    let units = BigEndian::read_u32(&raw[..4]);
    let secs = u64::from(units >> 16);
    let nanos = ((u64::from(units & 0xFFFF) * NANOS_PER_SEC) >> 16) as u32;
    Duration::new(secs, nanos)
}
