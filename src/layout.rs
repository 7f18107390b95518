//! Layout engine: display tier and drawing origin for a terminal size.
//!
//! Layout is pure arithmetic over the terminal dimensions. The run loop
//! caches the result and only recomputes it when a resize was observed (or,
//! in epoch mode, when the number of digits changes).

use crate::glyph::{GLYPH_HEIGHT, GLYPH_WIDTH, SEPARATOR_WIDTH};

/// Columns needed for `HH:MM`.
pub const COMPACT_WIDTH: usize = 4 * GLYPH_WIDTH + SEPARATOR_WIDTH;

/// Columns needed for `HH:MM:SS`.
pub const FULL_WIDTH: usize = 6 * GLYPH_WIDTH + 2 * SEPARATOR_WIDTH;

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TermSize {
    pub rows: u16,
    pub cols: u16,
}

impl TermSize {
    pub fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }
}

/// What the clock shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// Local wall-clock time, `HH:MM:SS`.
    #[default]
    WallClock,
    /// Seconds since the POSIX epoch.
    Epoch,
}

/// Resolved display density for the current terminal size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    /// Nothing fits; a fallback message is shown instead.
    TooSmall,
    /// Hours and minutes only.
    Compact,
    /// Hours, minutes and seconds.
    Full,
}

/// Where and how densely to draw.
///
/// `origin_row`/`origin_col` are 0-based and only meaningful when the tier
/// is not [`Tier::TooSmall`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub tier: Tier,
    pub origin_row: usize,
    pub origin_col: usize,
}

impl Layout {
    const TOO_SMALL: Layout = Layout {
        tier: Tier::TooSmall,
        origin_row: 0,
        origin_col: 0,
    };

    /// Layout for wall-clock mode.
    pub fn wall_clock(size: TermSize) -> Self {
        let (h, w) = (usize::from(size.rows), usize::from(size.cols));

        let tier = if h < GLYPH_HEIGHT || w < COMPACT_WIDTH {
            Tier::TooSmall
        } else if w < FULL_WIDTH {
            Tier::Compact
        } else {
            Tier::Full
        };

        match tier {
            Tier::TooSmall => Self::TOO_SMALL,
            Tier::Compact => Self::centered(tier, h, w, COMPACT_WIDTH),
            Tier::Full => Self::centered(tier, h, w, FULL_WIDTH),
        }
    }

    /// Layout for epoch mode showing `digits` digit glyphs.
    ///
    /// Epoch mode has no compact variant: it is either [`Tier::Full`] or
    /// [`Tier::TooSmall`].
    pub fn epoch(size: TermSize, digits: usize) -> Self {
        let (h, w) = (usize::from(size.rows), usize::from(size.cols));
        let required = digits.max(1) * GLYPH_WIDTH;

        if h < GLYPH_HEIGHT || w < required {
            Self::TOO_SMALL
        } else {
            Self::centered(Tier::Full, h, w, required)
        }
    }

    /// Layout for `mode`; `digits` is only consulted in epoch mode.
    pub fn for_mode(mode: DisplayMode, size: TermSize, digits: usize) -> Self {
        match mode {
            DisplayMode::WallClock => Self::wall_clock(size),
            DisplayMode::Epoch => Self::epoch(size, digits),
        }
    }

    pub fn is_too_small(&self) -> bool {
        self.tier == Tier::TooSmall
    }

    fn centered(tier: Tier, h: usize, w: usize, run_width: usize) -> Self {
        Self {
            tier,
            origin_row: (h - GLYPH_HEIGHT) / 2,
            origin_col: (w - run_width) / 2,
        }
    }
}
