//! Seven-segment glyph table.
//!
//! Every glyph is a fixed block of [`GLYPH_HEIGHT`] rows, each exactly
//! [`GLYPH_WIDTH`] terminal columns wide. Rows are concatenated left to
//! right by the renderer, so the blocks carry their own inter-glyph padding.

/// Width in terminal columns of one digit glyph.
pub const GLYPH_WIDTH: usize = 16;

/// Height in terminal rows of every glyph.
pub const GLYPH_HEIGHT: usize = 12;

/// Width in terminal columns of the separator glyph.
pub const SEPARATOR_WIDTH: usize = 16;

/// One glyph: a row of text per terminal line.
pub type Glyph = [&'static str; GLYPH_HEIGHT];

/// A drawable symbol: a decimal digit or the colon separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Digit(u8),
    Separator,
}

impl Symbol {
    /// Symbol for a single decimal digit.
    ///
    /// # Panics
    /// Panics if `d` is not in `0..=9`.
    pub fn digit(d: u8) -> Self {
        assert!(d <= 9, "not a decimal digit: {d}");
        Symbol::Digit(d)
    }

    /// The glyph block for this symbol.
    pub fn glyph(self) -> &'static Glyph {
        match self {
            Symbol::Digit(d) => DIGITS[usize::from(d)],
            Symbol::Separator => &COLON,
        }
    }

    /// Character this symbol stands for (`'0'..='9'` or `':'`).
    pub fn as_char(self) -> char {
        match self {
            Symbol::Digit(d) => char::from(b'0' + d),
            Symbol::Separator => ':',
        }
    }

    /// Reverse lookup: which symbol, if any, is drawn with `glyph`.
    #[cfg(test)]
    pub(crate) fn from_glyph(glyph: &Glyph) -> Option<Self> {
        if glyph == &COLON {
            return Some(Symbol::Separator);
        }
        DIGITS
            .iter()
            .position(|g| *g == glyph)
            .and_then(|i| u8::try_from(i).ok())
            .map(Symbol::Digit)
    }
}

static DIGITS: [&Glyph; 10] = [
    &ZERO, &ONE, &TWO, &THREE, &FOUR, &FIVE, &SIX, &SEVEN, &EIGHT, &NINE,
];

#[rustfmt::skip]
mod data {
    use super::Glyph;

    pub(super) static ZERO: Glyph = [
        "  ████████████  ",
        "  ██        ██  ",
        "  ██        ██  ",
        "  ██        ██  ",
        "  ██        ██  ",
        "  ██        ██  ",
        "  ██        ██  ",
        "  ██        ██  ",
        "  ██        ██  ",
        "  ██        ██  ",
        "  ████████████  ",
        "                ",
    ];

    pub(super) static ONE: Glyph = [
        "            ██  ",
        "            ██  ",
        "            ██  ",
        "            ██  ",
        "            ██  ",
        "            ██  ",
        "            ██  ",
        "            ██  ",
        "            ██  ",
        "            ██  ",
        "            ██  ",
        "                ",
    ];

    pub(super) static TWO: Glyph = [
        "  ████████████  ",
        "            ██  ",
        "            ██  ",
        "            ██  ",
        "            ██  ",
        "  ████████████  ",
        "  ██            ",
        "  ██            ",
        "  ██            ",
        "  ██            ",
        "  ████████████  ",
        "                ",
    ];

    pub(super) static THREE: Glyph = [
        "  ████████████  ",
        "            ██  ",
        "            ██  ",
        "            ██  ",
        "            ██  ",
        "  ████████████  ",
        "            ██  ",
        "            ██  ",
        "            ██  ",
        "            ██  ",
        "  ████████████  ",
        "                ",
    ];

    pub(super) static FOUR: Glyph = [
        "  ██        ██  ",
        "  ██        ██  ",
        "  ██        ██  ",
        "  ██        ██  ",
        "  ██        ██  ",
        "  ████████████  ",
        "            ██  ",
        "            ██  ",
        "            ██  ",
        "            ██  ",
        "            ██  ",
        "                ",
    ];

    pub(super) static FIVE: Glyph = [
        "  ████████████  ",
        "  ██            ",
        "  ██            ",
        "  ██            ",
        "  ██            ",
        "  ████████████  ",
        "            ██  ",
        "            ██  ",
        "            ██  ",
        "            ██  ",
        "  ████████████  ",
        "                ",
    ];

    pub(super) static SIX: Glyph = [
        "  ████████████  ",
        "  ██            ",
        "  ██            ",
        "  ██            ",
        "  ██            ",
        "  ████████████  ",
        "  ██        ██  ",
        "  ██        ██  ",
        "  ██        ██  ",
        "  ██        ██  ",
        "  ████████████  ",
        "                ",
    ];

    pub(super) static SEVEN: Glyph = [
        "  ████████████  ",
        "            ██  ",
        "            ██  ",
        "            ██  ",
        "            ██  ",
        "            ██  ",
        "            ██  ",
        "            ██  ",
        "            ██  ",
        "            ██  ",
        "            ██  ",
        "                ",
    ];

    pub(super) static EIGHT: Glyph = [
        "  ████████████  ",
        "  ██        ██  ",
        "  ██        ██  ",
        "  ██        ██  ",
        "  ██        ██  ",
        "  ████████████  ",
        "  ██        ██  ",
        "  ██        ██  ",
        "  ██        ██  ",
        "  ██        ██  ",
        "  ████████████  ",
        "                ",
    ];

    pub(super) static NINE: Glyph = [
        "  ████████████  ",
        "  ██        ██  ",
        "  ██        ██  ",
        "  ██        ██  ",
        "  ██        ██  ",
        "  ████████████  ",
        "            ██  ",
        "            ██  ",
        "            ██  ",
        "            ██  ",
        "  ████████████  ",
        "                ",
    ];

    pub(super) static COLON: Glyph = [
        "                ",
        "                ",
        "      ████      ",
        "      ████      ",
        "                ",
        "                ",
        "                ",
        "      ████      ",
        "      ████      ",
        "                ",
        "                ",
        "                ",
    ];
}

use data::{COLON, EIGHT, FIVE, FOUR, NINE, ONE, SEVEN, SIX, THREE, TWO, ZERO};

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(row: &str) -> usize {
        row.chars().count()
    }

    #[test]
    fn test_every_glyph_row_has_fixed_width() {
        for d in 0..=9 {
            for row in Symbol::digit(d).glyph() {
                assert_eq!(columns(row), GLYPH_WIDTH, "digit {d}");
            }
        }
        for row in Symbol::Separator.glyph() {
            assert_eq!(columns(row), SEPARATOR_WIDTH);
        }
    }

    #[test]
    fn test_glyphs_are_distinct() {
        let mut all: Vec<&Glyph> = (0..=9).map(|d| Symbol::digit(d).glyph()).collect();
        all.push(Symbol::Separator.glyph());
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_from_glyph_reverses_lookup() {
        for d in 0..=9 {
            let sym = Symbol::digit(d);
            assert_eq!(Symbol::from_glyph(sym.glyph()), Some(sym));
        }
        assert_eq!(
            Symbol::from_glyph(Symbol::Separator.glyph()),
            Some(Symbol::Separator)
        );
    }

    #[test]
    fn test_as_char() {
        assert_eq!(Symbol::digit(0).as_char(), '0');
        assert_eq!(Symbol::digit(7).as_char(), '7');
        assert_eq!(Symbol::Separator.as_char(), ':');
    }

    #[test]
    #[should_panic(expected = "not a decimal digit")]
    fn test_digit_rejects_out_of_range() {
        let _ = Symbol::digit(10);
    }
}
