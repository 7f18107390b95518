//! Frame rendering with raw ANSI sequences.
//!
//! A frame only touches the band of rows the clock occupies: everything
//! above it is erased with one `ESC[1J`, each glyph row clears to its left
//! before printing and to its right after, and `ESC[0J` wipes whatever lies
//! below. The whole frame is composed in memory, written in one go and
//! flushed before returning.

use std::fmt::Write as _;
use std::io::{self, Write};

use crate::glyph::{Symbol, GLYPH_HEIGHT};
use crate::layout::Layout;

/// Shown instead of the clock when it does not fit.
pub const TOO_SMALL_MESSAGE: &str = "Screen is too small";

/// Compose the escape sequences for one frame.
///
/// `row`/`col` are the 0-based origin; the terminal's 1-based coordinates
/// are derived here.
pub fn compose_frame(symbols: &[Symbol], row: usize, col: usize) -> String {
    let mut frame = String::with_capacity(64 + GLYPH_HEIGHT * (symbols.len() * 48 + 24));

    // Writing into a String cannot fail.
    let _ = write!(frame, "\x1b[{};1H\x1b[1J", row + 1);
    for r in 0..GLYPH_HEIGHT {
        let _ = write!(frame, "\x1b[{};{}H\x1b[1K", row + r + 1, col + 1);
        for symbol in symbols {
            frame.push_str(symbol.glyph()[r]);
        }
        frame.push_str("\x1b[0K");
    }
    frame.push_str("\x1b[0J");
    frame
}

/// Compose the fallback screen for a terminal that is too small.
pub fn compose_too_small() -> String {
    format!("\x1b[H\x1b[2J{TOO_SMALL_MESSAGE}\n")
}

/// Writes frames to a terminal (or any writer).
pub struct Renderer<W: Write> {
    out: W,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Draw `symbols` at the layout's origin, or the fallback message when
    /// the layout is too small.
    pub fn draw(&mut self, symbols: &[Symbol], layout: &Layout) -> io::Result<()> {
        if layout.is_too_small() {
            return self.draw_too_small();
        }
        let frame = compose_frame(symbols, layout.origin_row, layout.origin_col);
        self.emit(&frame)
    }

    /// Clear the screen and print [`TOO_SMALL_MESSAGE`].
    pub fn draw_too_small(&mut self) -> io::Result<()> {
        self.emit(&compose_too_small())
    }

    fn emit(&mut self, bytes: &str) -> io::Result<()> {
        self.out.write_all(bytes.as_bytes())?;
        self.out.flush()
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{TermSize, Tier};

    /// Records whether the last write was followed by a flush.
    #[derive(Default)]
    struct FlushTracker {
        data: Vec<u8>,
        pending: bool,
    }

    impl Write for FlushTracker {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.data.extend_from_slice(buf);
            self.pending = true;
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.pending = false;
            Ok(())
        }
    }

    fn sample() -> Vec<Symbol> {
        vec![Symbol::digit(1), Symbol::Separator, Symbol::digit(2)]
    }

    #[test]
    fn test_compose_frame_sequences() {
        let frame = compose_frame(&sample(), 6, 10);
        assert!(frame.starts_with("\x1b[7;1H\x1b[1J"));
        assert!(frame.ends_with("\x1b[0K\x1b[0J"));
        for r in 0..GLYPH_HEIGHT {
            let expected = format!(
                "\x1b[{};11H\x1b[1K{}{}{}\x1b[0K",
                7 + r,
                Symbol::digit(1).glyph()[r],
                Symbol::Separator.glyph()[r],
                Symbol::digit(2).glyph()[r],
            );
            assert!(frame.contains(&expected), "row {r}");
        }
    }

    #[test]
    fn test_compose_frame_at_origin_is_one_based() {
        let frame = compose_frame(&[Symbol::digit(0)], 0, 0);
        assert!(frame.starts_with("\x1b[1;1H\x1b[1J\x1b[1;1H\x1b[1K"));
        assert_eq!(frame.matches("\x1b[1K").count(), GLYPH_HEIGHT);
        assert_eq!(frame.matches("\x1b[0K").count(), GLYPH_HEIGHT);
    }

    #[test]
    fn test_too_small_screen() {
        assert_eq!(compose_too_small(), "\x1b[H\x1b[2JScreen is too small\n");
    }

    #[test]
    fn test_draw_is_idempotent() {
        let layout = Layout::wall_clock(TermSize::new(24, 128));
        let mut renderer = Renderer::new(Vec::new());
        renderer.draw(&sample(), &layout).unwrap();
        let first = renderer.get_ref().len();
        renderer.draw(&sample(), &layout).unwrap();

        let out = renderer.get_ref();
        assert_eq!(out.len(), 2 * first);
        assert_eq!(out[..first], out[first..]);
    }

    #[test]
    fn test_draw_flushes() {
        let layout = Layout::wall_clock(TermSize::new(24, 128));
        let mut renderer = Renderer::new(FlushTracker::default());
        renderer.draw(&sample(), &layout).unwrap();
        assert!(!renderer.get_ref().pending);
        assert!(!renderer.get_ref().data.is_empty());

        renderer.draw_too_small().unwrap();
        assert!(!renderer.get_ref().pending);
    }

    #[test]
    fn test_draw_too_small_layout_prints_message() {
        let layout = Layout::wall_clock(TermSize::new(10, 200));
        assert_eq!(layout.tier, Tier::TooSmall);
        let mut renderer = Renderer::new(Vec::new());
        renderer.draw(&sample(), &layout).unwrap();
        assert_eq!(renderer.get_ref().as_slice(), compose_too_small().as_bytes());
    }
}
