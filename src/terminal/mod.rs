//! Terminal management: input mode, alternate screen, window size, and
//! restoring all of it on every exit path.

mod raw_mode;
mod screen;
mod size;

pub use raw_mode::RawModeGuard;
pub use screen::{AlternateScreen, ENTER_SEQUENCE, LEAVE_SEQUENCE};
pub use size::{window_size, Tty, WindowSize};
