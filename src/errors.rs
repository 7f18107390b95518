//! Error types for clock setup and the run loop.

use std::io;

/// Errors that stop the clock.
///
/// Every variant is fatal: the caller restores the terminal and exits with
/// [`ClockError::exit_code`].
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    #[error("failed to read the system clock: {0}")]
    ClockRead(#[source] io::Error),

    #[error("time {0} cannot be represented in local time")]
    LocalTime(i64),

    #[error("system time is before the epoch ({0})")]
    BeforeEpoch(i64),

    #[error("failed to set up the tick timer: {0}")]
    TimerSetup(#[source] io::Error),

    #[error("failed to wait for the next tick: {0}")]
    TimerRead(#[source] io::Error),

    #[error("failed to query the terminal size: {0}")]
    WindowSize(#[source] io::Error),

    #[error("failed to configure the terminal: {0}")]
    TerminalSetup(#[source] io::Error),

    #[error("failed to register signal handlers: {0}")]
    Signals(#[source] io::Error),

    #[error("failed to write to the terminal: {0}")]
    Output(#[from] io::Error),
}

impl ClockError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        1
    }
}
