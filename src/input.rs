//! Keyboard quit detection on stdin.
//!
//! Stdin is watched for readiness through the tokio reactor. Each ready byte
//! is read individually: `q` or end of input stops the clock, a read error
//! stops it with a failure status, anything else is ignored. Reads only
//! happen after `poll(2)` confirms data (or a hangup) is pending, so stdin
//! never has to be switched to `O_NONBLOCK`. That flag would be shared with
//! stdout on a terminal and could make frame writes fail with `EAGAIN`.

use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::sync::Arc;

use tokio::io::unix::AsyncFd;
use tokio::io::Interest;
use tokio::task::JoinHandle;

use crate::signals::RunFlags;

/// Key that stops the clock.
pub const QUIT_KEY: u8 = b'q';

/// What a single read from stdin means for the run loop.
#[derive(Debug)]
pub enum InputEvent {
    /// The quit key was pressed.
    Quit,
    /// Stdin was closed.
    EndOfInput,
    /// Reading failed; shut down with a failure status.
    Failed(io::Error),
    /// Some other key; keep running.
    Ignored,
    /// A signal interrupted the read; try again.
    Interrupted,
    /// Nothing to read after all.
    WouldBlock,
}

/// Classify the result of reading one byte (`Ok(None)` is end of input).
pub fn classify(read: io::Result<Option<u8>>) -> InputEvent {
    match read {
        Ok(Some(QUIT_KEY)) => InputEvent::Quit,
        Ok(Some(_)) => InputEvent::Ignored,
        Ok(None) => InputEvent::EndOfInput,
        Err(e) if e.kind() == io::ErrorKind::Interrupted => InputEvent::Interrupted,
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => InputEvent::WouldBlock,
        Err(e) => InputEvent::Failed(e),
    }
}

/// Stdin as a pollable file descriptor. Never closes the descriptor.
#[derive(Debug)]
struct Stdin;

impl AsRawFd for Stdin {
    fn as_raw_fd(&self) -> RawFd {
        libc::STDIN_FILENO
    }
}

fn read_byte(fd: RawFd) -> io::Result<Option<u8>> {
    let mut byte = 0u8;
    let n = unsafe { libc::read(fd, (&raw mut byte).cast::<libc::c_void>(), 1) };
    match n {
        n if n < 0 => Err(io::Error::last_os_error()),
        0 => Ok(None),
        _ => Ok(Some(byte)),
    }
}

/// Whether a read on `fd` would return immediately.
fn input_pending(fd: RawFd) -> io::Result<bool> {
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    loop {
        let n = unsafe { libc::poll(&raw mut pfd, 1, 0) };
        if n >= 0 {
            if pfd.revents & libc::POLLNVAL != 0 {
                return Err(io::Error::from_raw_os_error(libc::EBADF));
            }
            return Ok(n > 0);
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

/// Start watching stdin for the quit key.
///
/// Returns `None` when stdin cannot be watched (for example when it is a
/// regular file or `/dev/null`); signals can still stop the clock.
pub fn spawn_quit_watcher(flags: Arc<RunFlags>) -> Option<JoinHandle<()>> {
    match watch_quit_key(Stdin, flags) {
        Ok(handle) => Some(handle),
        Err(e) => {
            log::warn!("cannot watch stdin, keyboard quit disabled: {e}");
            None
        }
    }
}

/// Watch `fd` for the quit key on a background task.
///
/// The descriptor must support readiness polling (a tty, pipe or socket).
/// Must be called from inside a tokio runtime.
pub fn watch_quit_key<F>(fd: F, flags: Arc<RunFlags>) -> io::Result<JoinHandle<()>>
where
    F: AsRawFd + Send + Sync + 'static,
{
    let fd = AsyncFd::with_interest(fd, Interest::READABLE)?;
    Ok(tokio::spawn(watch(fd, flags)))
}

/// Outcome of consuming whatever input is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Drained {
    /// Nothing left to read; wait for the next readiness event.
    Idle,
    /// The flags were updated and watching is over.
    Stopped,
}

/// Read every pending byte from `fd`, setting `flags` as soon as one of
/// them ends the run.
fn drain(fd: RawFd, flags: &RunFlags) -> Drained {
    loop {
        match input_pending(fd) {
            Ok(true) => {}
            Ok(false) => return Drained::Idle,
            Err(e) => {
                log::error!("polling input failed: {e}");
                flags.fail_input();
                return Drained::Stopped;
            }
        }

        match classify(read_byte(fd)) {
            InputEvent::Quit => {
                log::info!("quit key pressed");
                flags.request_shutdown();
                return Drained::Stopped;
            }
            InputEvent::EndOfInput => {
                log::info!("input closed, shutting down");
                flags.request_shutdown();
                return Drained::Stopped;
            }
            InputEvent::Failed(e) => {
                log::error!("reading input failed: {e}");
                flags.fail_input();
                return Drained::Stopped;
            }
            InputEvent::WouldBlock => return Drained::Idle,
            InputEvent::Ignored | InputEvent::Interrupted => {}
        }
    }
}

async fn watch<F: AsRawFd>(fd: AsyncFd<F>, flags: Arc<RunFlags>) {
    let raw_fd = fd.as_raw_fd();
    loop {
        let mut guard = match fd.readable().await {
            Ok(guard) => guard,
            Err(e) => {
                log::error!("input readiness failed: {e}");
                flags.fail_input();
                return;
            }
        };

        match drain(raw_fd, &flags) {
            Drained::Idle => guard.clear_ready(),
            Drained::Stopped => return,
        }
    }
}
