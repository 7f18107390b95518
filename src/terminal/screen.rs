//! Alternate screen buffer with a hidden cursor.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

/// Switch to the alternate screen and hide the cursor.
pub const ENTER_SEQUENCE: &str = "\x1b[?1049h\x1b[?25l";

/// Show the cursor and return to the main screen.
pub const LEAVE_SEQUENCE: &str = "\x1b[?25h\n\x1b[?1049l";

/// Whether some guard currently holds the alternate screen (for the panic
/// hook).
pub(crate) static SCREEN_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Guard that keeps the terminal on the alternate screen until dropped.
pub struct AlternateScreen<W: Write> {
    out: W,
    active: bool,
}

impl<W: Write> AlternateScreen<W> {
    /// Write [`ENTER_SEQUENCE`] to `out` and return the guard.
    pub fn enter(mut out: W) -> io::Result<Self> {
        super::raw_mode::install_panic_hook();

        out.write_all(ENTER_SEQUENCE.as_bytes())?;
        out.flush()?;
        SCREEN_ACTIVE.store(true, Ordering::SeqCst);
        Ok(Self { out, active: true })
    }

    /// Leave the alternate screen now. The drop is then a no-op.
    pub fn leave(&mut self) -> io::Result<()> {
        if self.active {
            self.active = false;
            SCREEN_ACTIVE.store(false, Ordering::SeqCst);
            self.out.write_all(LEAVE_SEQUENCE.as_bytes())?;
            self.out.flush()?;
        }
        Ok(())
    }

    #[cfg(test)]
    fn get_ref(&self) -> &W {
        &self.out
    }
}

impl<W: Write> Drop for AlternateScreen<W> {
    fn drop(&mut self) {
        // Best-effort cleanup - ignore errors during drop
        let _ = self.leave();
    }
}
