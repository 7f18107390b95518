//! The clock's run loop.
//!
//! One iteration ([`Clock::step`]) consumes the resize flag, refreshes the
//! layout if needed, reads the time, and draws. [`Clock::run`] then waits
//! for whatever the resulting state calls for:
//!
//! - `Running`: the next tick, or an earlier wake-up from a signal or key.
//! - `BlockedTooSmall`: any wake-up at all (no ticks are needed to redraw a
//!   static message).
//! - `ShuttingDown`: nothing; the loop returns the exit status.
//!
//! A tick carrying several expirations still produces exactly one frame
//! showing the current time.

use std::io::Write;
use std::sync::Arc;

use crate::errors::ClockError;
use crate::format::{epoch_symbols, symbols_to_string, wall_clock_symbols};
use crate::glyph::Symbol;
use crate::layout::{DisplayMode, Layout, TermSize};
use crate::render::Renderer;
use crate::signals::RunFlags;
use crate::terminal::WindowSize;
use crate::tick::Ticker;
use crate::time_source::TimeSource;

/// Where the loop stands after an iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    BlockedTooSmall,
    ShuttingDown,
}

/// The clock: owns the loop state and its collaborators.
pub struct Clock<T, Z, W>
where
    T: Ticker,
    Z: WindowSize,
    W: Write,
{
    mode: DisplayMode,
    ticker: T,
    window: Z,
    time: Box<dyn TimeSource>,
    renderer: Renderer<W>,
    flags: Arc<RunFlags>,
    size: TermSize,
    /// Cached layout; `None` forces a recomputation.
    layout: Option<Layout>,
    /// Digit count the cached epoch layout was computed for.
    epoch_digits: usize,
    state: State,
    frames: u64,
}

impl<T, Z, W> Clock<T, Z, W>
where
    T: Ticker,
    Z: WindowSize,
    W: Write,
{
    pub fn new(
        mode: DisplayMode,
        ticker: T,
        window: Z,
        time: Box<dyn TimeSource>,
        out: W,
        flags: Arc<RunFlags>,
    ) -> Self {
        Self {
            mode,
            ticker,
            window,
            time,
            renderer: Renderer::new(out),
            flags,
            size: TermSize::default(),
            layout: None,
            epoch_digits: 0,
            state: State::Running,
            frames: 0,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Current cached layout, if one has been computed.
    pub fn layout(&self) -> Option<Layout> {
        self.layout
    }

    /// Number of clock frames drawn so far (fallback screens excluded).
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn renderer(&self) -> &Renderer<W> {
        &self.renderer
    }

    /// Run one iteration and return the resulting state.
    pub fn step(&mut self) -> Result<State, ClockError> {
        let next = self.iterate()?;
        if next != self.state {
            log::debug!("clock state {:?} -> {:?}", self.state, next);
        }
        self.state = next;
        Ok(next)
    }

    fn iterate(&mut self) -> Result<State, ClockError> {
        if self.flags.shutdown_requested() {
            return Ok(State::ShuttingDown);
        }

        if self.flags.take_resize() {
            self.size = self
                .window
                .window_size()
                .map_err(ClockError::WindowSize)?;
            self.layout = None;
            log::debug!("terminal resized to {}x{}", self.size.cols, self.size.rows);
        }

        let (symbols, layout) = match self.mode {
            DisplayMode::WallClock => {
                let layout = self.refresh_layout(0);
                if layout.is_too_small() {
                    return self.show_too_small();
                }
                let now = self.time.wall_clock()?;
                (wall_clock_symbols(now, layout.tier), layout)
            }
            DisplayMode::Epoch => {
                let symbols = epoch_symbols(self.time.epoch_seconds()?);
                let layout = self.refresh_layout(symbols.len());
                if layout.is_too_small() {
                    return self.show_too_small();
                }
                (symbols, layout)
            }
        };

        self.draw(&symbols, &layout)?;
        Ok(State::Running)
    }

    /// Return the cached layout, recomputing it after a resize or when the
    /// epoch digit count changed.
    fn refresh_layout(&mut self, digits: usize) -> Layout {
        let stale = match self.mode {
            DisplayMode::WallClock => self.layout.is_none(),
            DisplayMode::Epoch => self.layout.is_none() || digits != self.epoch_digits,
        };
        if let (false, Some(layout)) = (stale, self.layout) {
            return layout;
        }

        let layout = Layout::for_mode(self.mode, self.size, digits);
        self.epoch_digits = digits;
        self.layout = Some(layout);
        log::debug!(
            "layout {:?} at row {} col {}",
            layout.tier,
            layout.origin_row,
            layout.origin_col
        );
        layout
    }

    fn show_too_small(&mut self) -> Result<State, ClockError> {
        if self.state != State::BlockedTooSmall {
            log::info!(
                "terminal {}x{} too small for the clock",
                self.size.cols,
                self.size.rows
            );
        }
        self.renderer.draw_too_small()?;
        Ok(State::BlockedTooSmall)
    }

    fn draw(&mut self, symbols: &[Symbol], layout: &Layout) -> Result<(), ClockError> {
        log::trace!("frame {}: {}", self.frames, symbols_to_string(symbols));
        self.renderer.draw(symbols, layout)?;
        self.frames += 1;
        Ok(())
    }

    /// Drive the clock until shutdown. Returns the process exit status for a
    /// clean shutdown (1 if the input channel failed, 0 otherwise).
    pub async fn run(&mut self) -> Result<i32, ClockError> {
        loop {
            match self.step()? {
                State::ShuttingDown => break,
                State::BlockedTooSmall => self.flags.woken().await,
                State::Running => {
                    tokio::select! {
                        tick = self.ticker.tick() => {
                            let expirations = tick.map_err(ClockError::TimerRead)?;
                            if expirations > 1 {
                                log::debug!("dropped {} missed ticks", expirations - 1);
                            }
                        }
                        () = self.flags.woken() => {}
                    }
                }
            }
        }

        let code = self.flags.exit_code();
        log::info!("clock stopped with status {code}");
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Tier;
    use crate::time_source::WallClock;
    use std::collections::VecDeque;
    use std::io;

    struct FixedTime {
        now: WallClock,
        epoch: u64,
    }

    impl TimeSource for FixedTime {
        fn wall_clock(&mut self) -> Result<WallClock, ClockError> {
            Ok(self.now)
        }

        fn epoch_seconds(&mut self) -> Result<u64, ClockError> {
            Ok(self.epoch)
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    /// Reports sizes from a queue, repeating the last one.
    struct Sizes {
        queue: VecDeque<TermSize>,
        last: TermSize,
        queries: usize,
    }

    impl Sizes {
        fn new(sizes: &[TermSize]) -> Self {
            Self {
                queue: sizes.iter().copied().collect(),
                last: TermSize::default(),
                queries: 0,
            }
        }
    }

    impl WindowSize for Sizes {
        fn window_size(&mut self) -> io::Result<TermSize> {
            self.queries += 1;
            if let Some(size) = self.queue.pop_front() {
                self.last = size;
            }
            Ok(self.last)
        }
    }

    struct NeverTicks;

    impl Ticker for NeverTicks {
        async fn tick(&mut self) -> io::Result<u64> {
            std::future::pending().await
        }
    }

    fn clock(
        mode: DisplayMode,
        sizes: &[TermSize],
        flags: &Arc<RunFlags>,
    ) -> Clock<NeverTicks, Sizes, Vec<u8>> {
        let time = FixedTime {
            now: WallClock::new(12, 34, 56),
            epoch: 1_700_000_000,
        };
        Clock::new(
            mode,
            NeverTicks,
            Sizes::new(sizes),
            Box::new(time),
            Vec::new(),
            Arc::clone(flags),
        )
    }

    #[test]
    fn test_first_step_measures_and_draws() {
        let flags = RunFlags::new();
        let mut clock = clock(DisplayMode::WallClock, &[TermSize::new(24, 128)], &flags);

        assert_eq!(clock.step().unwrap(), State::Running);
        assert_eq!(clock.window.queries, 1);
        assert_eq!(clock.layout().unwrap().tier, Tier::Full);
        assert_eq!(clock.frames(), 1);
    }

    #[test]
    fn test_layout_is_not_recomputed_without_resize() {
        let flags = RunFlags::new();
        let mut clock = clock(DisplayMode::WallClock, &[TermSize::new(24, 128)], &flags);
        for _ in 0..5 {
            clock.step().unwrap();
        }
        assert_eq!(clock.window.queries, 1);
        assert_eq!(clock.frames(), 5);
    }

    #[test]
    fn test_resize_burst_queries_once() {
        let flags = RunFlags::new();
        let mut clock = clock(
            DisplayMode::WallClock,
            &[TermSize::new(24, 128), TermSize::new(24, 100)],
            &flags,
        );
        clock.step().unwrap();
        for _ in 0..10 {
            flags.request_resize();
        }
        clock.step().unwrap();
        assert_eq!(clock.window.queries, 2);
        assert_eq!(clock.layout().unwrap().tier, Tier::Compact);
    }

    #[test]
    fn test_too_small_blocks_then_recovers_on_resize() {
        let flags = RunFlags::new();
        let mut clock = clock(
            DisplayMode::WallClock,
            &[TermSize::new(10, 200), TermSize::new(24, 128)],
            &flags,
        );

        assert_eq!(clock.step().unwrap(), State::BlockedTooSmall);
        assert_eq!(clock.frames(), 0);

        // A wake-up that is not a resize keeps the fallback.
        assert_eq!(clock.step().unwrap(), State::BlockedTooSmall);

        flags.request_resize();
        assert_eq!(clock.step().unwrap(), State::Running);
        assert_eq!(clock.frames(), 1);
    }

    #[test]
    fn test_shutdown_wins_over_everything() {
        let flags = RunFlags::new();
        let mut clock = clock(DisplayMode::WallClock, &[TermSize::new(24, 128)], &flags);
        flags.request_resize();
        flags.request_shutdown();
        assert_eq!(clock.step().unwrap(), State::ShuttingDown);
        assert_eq!(clock.window.queries, 0);
        assert!(clock.renderer().get_ref().is_empty());
    }

    #[test]
    fn test_epoch_mode_layout_tracks_digits() {
        let flags = RunFlags::new();
        let mut clock = clock(DisplayMode::Epoch, &[TermSize::new(24, 200)], &flags);
        assert_eq!(clock.step().unwrap(), State::Running);
        let layout = clock.layout().unwrap();
        assert_eq!(layout.origin_col, (200 - 10 * 16) / 2);
        assert_eq!(clock.epoch_digits, 10);
    }

    #[test]
    fn test_epoch_mode_too_narrow() {
        let flags = RunFlags::new();
        let mut clock = clock(DisplayMode::Epoch, &[TermSize::new(24, 150)], &flags);
        assert_eq!(clock.step().unwrap(), State::BlockedTooSmall);
    }

    #[tokio::test]
    async fn test_run_returns_input_failure_status() {
        let flags = RunFlags::new();
        let mut clock = clock(DisplayMode::WallClock, &[TermSize::new(24, 128)], &flags);

        let trigger = Arc::clone(&flags);
        tokio::spawn(async move { trigger.fail_input() });

        assert_eq!(clock.run().await.unwrap(), 1);
        assert_eq!(clock.state(), State::ShuttingDown);
    }
}
