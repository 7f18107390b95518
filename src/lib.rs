//! mongoclock library crate.
//!
//! A large seven-segment clock for the terminal. The pieces are exposed
//! here so the run loop can be driven with scripted collaborators in tests.

pub mod cli;
pub mod config;
pub mod errors;
pub mod event_loop;
pub mod format;
pub mod glyph;
pub mod input;
pub mod layout;
pub mod render;
pub mod signals;
pub mod terminal;
pub mod tick;
pub mod time_source;

pub use errors::ClockError;
pub use event_loop::{Clock, State};
pub use layout::{DisplayMode, Layout, TermSize, Tier};
pub use signals::RunFlags;
