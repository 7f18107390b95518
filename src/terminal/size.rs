//! Terminal window size queries.

use std::io;

use crate::layout::TermSize;

/// Something that can report the terminal size.
pub trait WindowSize {
    fn window_size(&mut self) -> io::Result<TermSize>;
}

/// The controlling terminal, queried through stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct Tty;

impl WindowSize for Tty {
    fn window_size(&mut self) -> io::Result<TermSize> {
        window_size(libc::STDOUT_FILENO)
    }
}

/// Query the size of the terminal on `fd` via `ioctl(TIOCGWINSZ)`.
///
/// Interrupted calls are retried.
pub fn window_size(fd: libc::c_int) -> io::Result<TermSize> {
    loop {
        let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
        let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &raw mut ws) };
        if result == 0 {
            return Ok(TermSize::new(ws.ws_row, ws.ws_col));
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}
