//! One-second tick sources aligned to wall-clock second boundaries.
//!
//! On Linux the ticks come from a `timerfd` on `CLOCK_REALTIME`, armed with
//! an absolute expiry at the next whole second. Setting the clock therefore
//! moves the ticks with it. Elsewhere a tokio interval started at the next
//! whole second is used instead.
//!
//! A tick reports how many expirations happened since the previous read.
//! Callers draw once per tick regardless: missed seconds are dropped, never
//! replayed.

use std::io;
#[cfg(not(target_os = "linux"))]
use std::time::Duration;

#[cfg(not(target_os = "linux"))]
use tokio::time::{Instant, Interval, MissedTickBehavior};

/// A source of once-per-second wake-ups.
#[allow(async_fn_in_trait)]
pub trait Ticker {
    /// Wait for the next tick. Returns the number of expirations consumed
    /// (at least 1 for a real timer; more means ticks were missed).
    async fn tick(&mut self) -> io::Result<u64>;
}

/// Time left until the next whole wall-clock second.
#[cfg(not(target_os = "linux"))]
pub fn until_next_second() -> Duration {
    let nanos = chrono::Utc::now().timestamp_subsec_nanos().min(999_999_999);
    Duration::from_nanos(u64::from(1_000_000_000 - nanos))
}

// ─── timerfd ────────────────────────────────────────────────────────────────

#[cfg(target_os = "linux")]
pub use timerfd::TimerFdTicker;

#[cfg(target_os = "linux")]
mod timerfd {
    use std::io;
    use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};

    use tokio::io::unix::AsyncFd;

    use super::Ticker;

    /// Realtime `timerfd` firing on every whole second.
    #[derive(Debug)]
    pub struct TimerFdTicker {
        fd: AsyncFd<OwnedFd>,
    }

    impl TimerFdTicker {
        /// Create and arm the timer. The first tick fires at the next whole
        /// second. Must be called from inside a tokio runtime.
        pub fn new() -> io::Result<Self> {
            let timer = unsafe {
                libc::timerfd_create(libc::CLOCK_REALTIME, libc::TFD_NONBLOCK | libc::TFD_CLOEXEC)
            };
            if timer < 0 {
                return Err(io::Error::last_os_error());
            }
            let fd = unsafe { OwnedFd::from_raw_fd(timer) };

            let mut now: libc::timespec = unsafe { std::mem::zeroed() };
            if unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &raw mut now) } != 0 {
                return Err(io::Error::last_os_error());
            }

            let mut schedule: libc::itimerspec = unsafe { std::mem::zeroed() };
            schedule.it_interval.tv_sec = 1;
            schedule.it_interval.tv_nsec = 0;
            schedule.it_value.tv_sec = now.tv_sec + 1;
            schedule.it_value.tv_nsec = 0;

            let armed = unsafe {
                libc::timerfd_settime(
                    fd.as_raw_fd(),
                    libc::TFD_TIMER_ABSTIME,
                    &raw const schedule,
                    std::ptr::null_mut(),
                )
            };
            if armed != 0 {
                return Err(io::Error::last_os_error());
            }

            Ok(Self {
                fd: AsyncFd::new(fd)?,
            })
        }
    }

    fn read_expirations(fd: RawFd) -> io::Result<u64> {
        let mut count = 0u64;
        let n = unsafe {
            libc::read(
                fd,
                (&raw mut count).cast::<libc::c_void>(),
                std::mem::size_of::<u64>(),
            )
        };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(count)
    }

    impl Ticker for TimerFdTicker {
        async fn tick(&mut self) -> io::Result<u64> {
            loop {
                let mut guard = self.fd.readable().await?;
                match guard.try_io(|fd| read_expirations(fd.as_raw_fd())) {
                    Ok(Ok(count)) => return Ok(count),
                    Ok(Err(e)) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Ok(Err(e)) => return Err(e),
                    // Spurious readiness; readiness was cleared, wait again.
                    Err(_would_block) => continue,
                }
            }
        }
    }
}

// ─── tokio interval ─────────────────────────────────────────────────────────

/// Portable ticker: a tokio interval started at the next whole second.
///
/// Missed ticks are skipped rather than burst, and are reported as an
/// expiration count of 1 since the interval cannot count them.
#[cfg(not(target_os = "linux"))]
#[derive(Debug)]
pub struct IntervalTicker {
    interval: Interval,
}

#[cfg(not(target_os = "linux"))]
impl IntervalTicker {
    /// Must be called from inside a tokio runtime.
    pub fn new() -> Self {
        let start = Instant::now() + until_next_second();
        let mut interval = tokio::time::interval_at(start, Duration::from_secs(1));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }
}

#[cfg(not(target_os = "linux"))]
impl Default for IntervalTicker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "linux"))]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) -> io::Result<u64> {
        self.interval.tick().await;
        Ok(1)
    }
}

// ─── platform choice ────────────────────────────────────────────────────────

/// The tick source used by the binary.
#[derive(Debug)]
pub enum SystemTicker {
    #[cfg(target_os = "linux")]
    TimerFd(TimerFdTicker),
    #[cfg(not(target_os = "linux"))]
    Interval(IntervalTicker),
}

impl SystemTicker {
    /// The realtime timerfd on Linux, the interval fallback elsewhere.
    #[cfg(target_os = "linux")]
    pub fn new() -> io::Result<Self> {
        TimerFdTicker::new().map(SystemTicker::TimerFd)
    }

    #[cfg(not(target_os = "linux"))]
    pub fn new() -> io::Result<Self> {
        Ok(SystemTicker::Interval(IntervalTicker::new()))
    }
}

impl Ticker for SystemTicker {
    async fn tick(&mut self) -> io::Result<u64> {
        match self {
            #[cfg(target_os = "linux")]
            SystemTicker::TimerFd(t) => t.tick().await,
            #[cfg(not(target_os = "linux"))]
            SystemTicker::Interval(t) => t.tick().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[cfg(not(target_os = "linux"))]
    #[test]
    fn test_until_next_second_is_within_one_second() {
        let d = until_next_second();
        assert!(d > Duration::ZERO);
        assert!(d <= Duration::from_secs(1));
    }

    #[cfg(not(target_os = "linux"))]
    #[tokio::test]
    async fn test_interval_ticker_fires_within_a_second() {
        let mut ticker = IntervalTicker::new();
        let count = tokio::time::timeout(Duration::from_millis(1500), ticker.tick())
            .await
            .expect("tick should arrive")
            .unwrap();
        assert_eq!(count, 1);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_timerfd_ticker_fires_within_a_second() {
        let mut ticker = TimerFdTicker::new().unwrap();
        let count = tokio::time::timeout(Duration::from_millis(1500), ticker.tick())
            .await
            .expect("tick should arrive")
            .unwrap();
        assert!(count >= 1);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_system_ticker_uses_timerfd() {
        assert!(matches!(SystemTicker::new().unwrap(), SystemTicker::TimerFd(_)));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_timerfd_ticker_drains_overruns_in_one_read() {
        let mut ticker = TimerFdTicker::new().unwrap();
        tokio::time::sleep(Duration::from_millis(2100)).await;
        let count = ticker.tick().await.unwrap();
        assert!(count >= 2, "expected missed ticks to be counted, got {count}");
    }
}
