//! Unbuffered, no-echo input mode with panic-safe cleanup.
//!
//! Only `ECHO` and `ICANON` are cleared: keystrokes arrive one byte at a
//! time without being printed over the clock, while signal keys (Ctrl+C)
//! keep working.

use std::io::{self, Write};
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::screen::{LEAVE_SEQUENCE, SCREEN_ACTIVE};

/// Static flag to track if raw mode is active (for panic handler)
pub(crate) static RAW_MODE_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Saved attributes for the panic hook, which cannot reach the guard.
static SAVED_TERMIOS: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Guard that restores the original terminal attributes on drop.
/// This handles both normal exits and panics.
pub struct RawModeGuard {
    /// Attributes to restore; `None` if stdin is not a terminal.
    saved: Option<libc::termios>,
}

impl RawModeGuard {
    /// Clear `ECHO` and `ICANON` on stdin and return a guard that restores
    /// the previous attributes.
    ///
    /// If stdin is not a terminal the guard does nothing.
    ///
    /// # Errors
    /// Returns an error if the new attributes cannot be applied.
    pub fn enter() -> io::Result<Self> {
        // Install panic hook before touching the terminal
        install_panic_hook();

        let mut attrs: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(libc::STDIN_FILENO, &raw mut attrs) } != 0 {
            log::debug!(
                "stdin is not a terminal, leaving input mode alone: {}",
                io::Error::last_os_error()
            );
            return Ok(Self { saved: None });
        }

        let saved = attrs;
        attrs.c_lflag &= !(libc::ECHO | libc::ICANON);
        set_attrs(&attrs)?;

        if let Ok(mut backup) = SAVED_TERMIOS.lock() {
            *backup = Some(saved);
        }
        RAW_MODE_ACTIVE.store(true, Ordering::SeqCst);

        Ok(Self { saved: Some(saved) })
    }

    /// Manually restore the terminal without dropping the guard.
    /// After calling this, the guard's drop will be a no-op.
    pub fn exit(&mut self) -> io::Result<()> {
        if let Some(saved) = self.saved.take() {
            RAW_MODE_ACTIVE.store(false, Ordering::SeqCst);
            set_attrs(&saved)?;
        }
        Ok(())
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        // Best-effort cleanup - ignore errors during drop
        let _ = self.exit();
    }
}

fn set_attrs(attrs: &libc::termios) -> io::Result<()> {
    loop {
        if unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, attrs) } == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

/// Install a panic hook that restores terminal state before panicking.
/// This ensures the terminal is usable even if the clock panics.
pub(crate) fn install_panic_hook() {
    // Only install once - check if we've already installed
    static HOOK_INSTALLED: AtomicBool = AtomicBool::new(false);

    if HOOK_INSTALLED.swap(true, Ordering::SeqCst) {
        return; // Already installed
    }

    let original_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        if SCREEN_ACTIVE.swap(false, Ordering::SeqCst) {
            let mut stdout = io::stdout();
            let _ = stdout.write_all(LEAVE_SEQUENCE.as_bytes());
            let _ = stdout.flush();
        }
        if RAW_MODE_ACTIVE.swap(false, Ordering::SeqCst) {
            if let Ok(backup) = SAVED_TERMIOS.lock() {
                if let Some(ref saved) = *backup {
                    let _ = set_attrs(saved);
                }
            }
        }

        // Call the original panic hook to print the panic message
        original_hook(panic_info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_mode_guard_enter_and_drop() {
        // Without a TTY (CI) the guard is inert.
        match RawModeGuard::enter() {
            Ok(guard) => drop(guard),
            Err(e) => {
                eprintln!("Skipping test (terminal refused attributes): {}", e);
            }
        }
    }

    #[test]
    fn test_raw_mode_guard_manual_exit() {
        match RawModeGuard::enter() {
            Ok(mut guard) => {
                guard.exit().expect("Should restore terminal");
                assert!(guard.saved.is_none());

                // Second exit and drop are no-ops
                guard.exit().expect("Second exit should be a no-op");
                drop(guard);
            }
            Err(e) => {
                eprintln!("Skipping test (terminal refused attributes): {}", e);
            }
        }
    }

    #[test]
    fn test_panic_hook_installation() {
        install_panic_hook();
        install_panic_hook(); // Second call should be no-op
    }
}
