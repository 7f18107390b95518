//! Time formatting: turning a time reading into the symbols to draw.

use crate::glyph::Symbol;
use crate::layout::Tier;
use crate::time_source::WallClock;

/// Upper bound on epoch digits. `u64::MAX` has 20 decimal digits.
pub const MAX_EPOCH_DIGITS: usize = 20;

/// Symbols for a wall-clock reading at the given tier.
///
/// [`Tier::Full`] yields `HH:MM:SS` (eight symbols). [`Tier::Compact`] stops
/// after the minutes, `HH:MM`, matching the width the layout reserves for
/// it. [`Tier::TooSmall`] yields nothing.
pub fn wall_clock_symbols(now: WallClock, tier: Tier) -> Vec<Symbol> {
    let mut symbols = Vec::with_capacity(8);
    if tier == Tier::TooSmall {
        return symbols;
    }

    push_pair(&mut symbols, now.hour);
    symbols.push(Symbol::Separator);
    push_pair(&mut symbols, now.minute);

    if tier == Tier::Full {
        symbols.push(Symbol::Separator);
        push_pair(&mut symbols, now.second);
    }
    symbols
}

fn push_pair(symbols: &mut Vec<Symbol>, value: u8) {
    symbols.push(Symbol::digit(value / 10 % 10));
    symbols.push(Symbol::digit(value % 10));
}

/// Decimal digits of `secs`, most significant first, never truncated.
///
/// # Panics
/// Panics if the value somehow needs more than [`MAX_EPOCH_DIGITS`] digits;
/// that is an internal consistency failure, not a runtime condition.
pub fn epoch_symbols(secs: u64) -> Vec<Symbol> {
    let mut digits = Vec::with_capacity(MAX_EPOCH_DIGITS);
    let mut rest = secs;
    loop {
        assert!(
            digits.len() < MAX_EPOCH_DIGITS,
            "epoch value {secs} exceeds {MAX_EPOCH_DIGITS} digits"
        );
        digits.push(Symbol::digit((rest % 10) as u8));
        rest /= 10;
        if rest == 0 {
            break;
        }
    }
    digits.reverse();
    digits
}

/// Text form of a symbol run, e.g. `"12:34:56"`.
pub fn symbols_to_string(symbols: &[Symbol]) -> String {
    symbols.iter().map(|s| s.as_char()).collect()
}
