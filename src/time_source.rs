//! Time sources: where the current time comes from.
//!
//! Two implementations exist. [`PlainClock`] reads the realtime clock and
//! converts it with ordinary calendar rules. [`LeapAwareClock`] (Linux only)
//! reads the kernel's NTP state through `adjtimex(2)` so an inserted leap
//! second shows up as `23:59:60` and a deleted one is skipped. [`probe`]
//! picks one at startup.

use chrono::{Local, TimeZone, Timelike, Utc};

use crate::errors::ClockError;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Local wall-clock time, split into display fields.
///
/// `second` is normally `0..=59` but reads `60` during an inserted leap
/// second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallClock {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl WallClock {
    pub fn new(hour: u8, minute: u8, second: u8) -> Self {
        Self {
            hour,
            minute,
            second,
        }
    }
}

/// Source of the current time.
pub trait TimeSource {
    /// Current local wall-clock time.
    fn wall_clock(&mut self) -> Result<WallClock, ClockError>;

    /// Current POSIX time in whole seconds.
    fn epoch_seconds(&mut self) -> Result<u64, ClockError>;

    /// Short name for logging.
    fn name(&self) -> &'static str;
}

/// Calendar conversion of `secs` in the local timezone.
fn local_wall_clock(secs: i64) -> Result<WallClock, ClockError> {
    let local = Local
        .timestamp_opt(secs, 0)
        .earliest()
        .ok_or(ClockError::LocalTime(secs))?;
    Ok(WallClock::new(
        local.hour() as u8,
        local.minute() as u8,
        local.second() as u8,
    ))
}

fn non_negative(secs: i64) -> Result<u64, ClockError> {
    u64::try_from(secs).map_err(|_| ClockError::BeforeEpoch(secs))
}

// ─── Plain ──────────────────────────────────────────────────────────────────

/// Realtime clock with ordinary calendar conversion.
#[derive(Debug, Default)]
pub struct PlainClock;

impl TimeSource for PlainClock {
    fn wall_clock(&mut self) -> Result<WallClock, ClockError> {
        local_wall_clock(Utc::now().timestamp())
    }

    fn epoch_seconds(&mut self) -> Result<u64, ClockError> {
        non_negative(Utc::now().timestamp())
    }

    fn name(&self) -> &'static str {
        "plain"
    }
}

// ─── Leap-second aware ──────────────────────────────────────────────────────

/// Kernel clock state as returned by `adjtimex(2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeapState {
    /// No leap second pending.
    Ok,
    /// A leap second will be inserted at the end of the UTC day.
    Insert,
    /// A leap second will be deleted at the end of the UTC day.
    Delete,
    /// A leap second is being inserted right now.
    InProgress,
    /// A leap second has just happened.
    Wait,
    /// The clock is not synchronized.
    Error,
}

impl LeapState {
    /// Decode the return value of `adjtimex(2)`.
    pub fn from_raw(state: i32) -> Self {
        match state {
            1 => LeapState::Insert,
            2 => LeapState::Delete,
            3 => LeapState::InProgress,
            4 => LeapState::Wait,
            5 => LeapState::Error,
            _ => LeapState::Ok,
        }
    }
}

/// Map a kernel timestamp and leap state onto the second to display.
///
/// Returns the timestamp to convert and whether one extra second must be
/// added to the converted seconds field (giving `:60`).
pub fn leap_adjust(secs: i64, state: LeapState) -> (i64, bool) {
    if secs.rem_euclid(SECONDS_PER_DAY) == 0 {
        match state {
            LeapState::Insert => (secs - 1, true),
            LeapState::Delete => (secs + 1, false),
            _ => (secs, false),
        }
    } else if state == LeapState::InProgress {
        (secs, true)
    } else {
        (secs, false)
    }
}

/// Wall-clock time for a kernel timestamp under `state`.
pub fn leap_wall_clock(secs: i64, state: LeapState) -> Result<WallClock, ClockError> {
    let (secs, extra) = leap_adjust(secs, state);
    let mut now = local_wall_clock(secs)?;
    if extra {
        now.second += 1;
    }
    Ok(now)
}

/// Realtime clock read through `adjtimex(2)`, honoring leap seconds.
#[cfg(target_os = "linux")]
#[derive(Debug, Default)]
pub struct LeapAwareClock;

#[cfg(target_os = "linux")]
impl LeapAwareClock {
    /// Read the kernel time and leap state without adjusting anything.
    fn read() -> Result<(i64, LeapState), ClockError> {
        // modes = 0: query only.
        let mut timex: libc::timex = unsafe { std::mem::zeroed() };
        let state = unsafe { libc::adjtimex(&mut timex) };
        if state == -1 {
            return Err(ClockError::ClockRead(std::io::Error::last_os_error()));
        }
        #[allow(clippy::unnecessary_cast)]
        let secs = timex.time.tv_sec as i64;
        Ok((secs, LeapState::from_raw(state)))
    }

    /// Whether the facility is usable in this environment.
    pub fn available() -> bool {
        Self::read().is_ok()
    }
}

#[cfg(target_os = "linux")]
impl TimeSource for LeapAwareClock {
    fn wall_clock(&mut self) -> Result<WallClock, ClockError> {
        let (secs, state) = Self::read()?;
        leap_wall_clock(secs, state)
    }

    fn epoch_seconds(&mut self) -> Result<u64, ClockError> {
        let (secs, _) = Self::read()?;
        non_negative(secs)
    }

    fn name(&self) -> &'static str {
        "leap-aware"
    }
}

/// Pick the best time source for this environment.
///
/// With `leap_seconds` enabled the leap-aware source is used when
/// `adjtimex(2)` answers; otherwise, or on other platforms, the plain one.
pub fn probe(leap_seconds: bool) -> Box<dyn TimeSource> {
    if leap_seconds {
        if let Some(clock) = leap_aware() {
            return clock;
        }
        log::info!("adjtimex unavailable, leap seconds will not be displayed");
    }
    Box::new(PlainClock)
}

#[cfg(target_os = "linux")]
fn leap_aware() -> Option<Box<dyn TimeSource>> {
    if LeapAwareClock::available() {
        Some(Box::new(LeapAwareClock))
    } else {
        None
    }
}

#[cfg(not(target_os = "linux"))]
fn leap_aware() -> Option<Box<dyn TimeSource>> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIDNIGHT: i64 = 1_483_228_800; // 2017-01-01T00:00:00Z

    #[test]
    fn test_leap_state_from_raw() {
        assert_eq!(LeapState::from_raw(0), LeapState::Ok);
        assert_eq!(LeapState::from_raw(1), LeapState::Insert);
        assert_eq!(LeapState::from_raw(2), LeapState::Delete);
        assert_eq!(LeapState::from_raw(3), LeapState::InProgress);
        assert_eq!(LeapState::from_raw(4), LeapState::Wait);
        assert_eq!(LeapState::from_raw(5), LeapState::Error);
    }

    #[test]
    fn test_leap_adjust_insert_at_midnight() {
        assert_eq!(leap_adjust(MIDNIGHT, LeapState::Insert), (MIDNIGHT - 1, true));
    }

    #[test]
    fn test_leap_adjust_delete_at_midnight() {
        assert_eq!(leap_adjust(MIDNIGHT, LeapState::Delete), (MIDNIGHT + 1, false));
    }

    #[test]
    fn test_leap_adjust_in_progress() {
        assert_eq!(
            leap_adjust(MIDNIGHT + 5, LeapState::InProgress),
            (MIDNIGHT + 5, true)
        );
    }

    #[test]
    fn test_leap_adjust_ordinary_second() {
        for state in [LeapState::Ok, LeapState::Insert, LeapState::Delete, LeapState::Wait] {
            assert_eq!(leap_adjust(MIDNIGHT + 17, state), (MIDNIGHT + 17, false));
        }
        assert_eq!(leap_adjust(MIDNIGHT, LeapState::Ok), (MIDNIGHT, false));
    }

    #[test]
    fn test_leap_wall_clock_inserted_second_reads_sixty() {
        let normal = leap_wall_clock(MIDNIGHT - 1, LeapState::Ok).unwrap();
        let leap = leap_wall_clock(MIDNIGHT, LeapState::Insert).unwrap();
        assert_eq!(leap.hour, normal.hour);
        assert_eq!(leap.minute, normal.minute);
        assert_eq!(leap.second, normal.second + 1);
    }

    #[test]
    fn test_plain_clock_reads_valid_fields() {
        let mut clock = PlainClock;
        let now = clock.wall_clock().unwrap();
        assert!(now.hour < 24);
        assert!(now.minute < 60);
        assert!(now.second < 61);
        assert!(clock.epoch_seconds().unwrap() > 1_600_000_000);
        assert_eq!(clock.name(), "plain");
    }

    #[test]
    fn test_probe_without_leap_seconds_is_plain() {
        assert_eq!(probe(false).name(), "plain");
    }

    #[test]
    fn test_non_negative_rejects_pre_epoch() {
        assert!(matches!(non_negative(-1), Err(ClockError::BeforeEpoch(-1))));
        assert_eq!(non_negative(5).unwrap(), 5);
    }
}
