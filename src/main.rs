use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use mongoclock::cli::{self, ParseOutcome};
use mongoclock::config::Config;
use mongoclock::terminal::{AlternateScreen, RawModeGuard, Tty};
use mongoclock::tick::SystemTicker;
use mongoclock::{input, signals, time_source};
use mongoclock::{Clock, ClockError, DisplayMode, RunFlags};

/// Environment variable naming a log file (overrides the config file).
const LOG_ENV: &str = "MONGOCLOCK_LOG";

fn program_name() -> String {
    std::env::args()
        .next()
        .unwrap_or_else(|| "mongoclock".to_string())
}

/// Where logs go: `$MONGOCLOCK_LOG` if set, else the configured file.
/// `None` means stderr.
fn log_destination(env: Option<OsString>, configured: Option<&Path>) -> Option<PathBuf> {
    env.map(PathBuf::from)
        .or_else(|| configured.map(Path::to_path_buf))
}

/// Initialize `env_logger`.
///
/// Without a log file, records go to stderr, which is the terminal the
/// clock draws on: anything logged while the alternate screen is up is
/// painted over the clock until the next frame erases it. The default
/// filter is `warn`, and setup that can warn runs before the alternate
/// screen is entered so those messages stay readable after exit.
fn init_logging(file: Option<&Path>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));

    if let Some(path) = log_destination(std::env::var_os(LOG_ENV), file) {
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(log_file) => {
                builder.target(env_logger::Target::Pipe(Box::new(log_file)));
            }
            Err(e) => {
                eprintln!("Warning: cannot open log file {}: {}", path.display(), e);
            }
        }
    }

    builder.init();
}

/// Set up the terminal, run the clock, and restore the terminal.
///
/// Collaborators that may log a warning (tick source, time source, stdin
/// watcher) are created before the alternate screen. Guards are dropped in
/// reverse order of creation on every path out of this function, so the
/// terminal is restored before any error is printed.
async fn run_clock(mode: DisplayMode, leap_seconds: bool) -> Result<i32, ClockError> {
    let ticker = SystemTicker::new().map_err(ClockError::TimerSetup)?;
    let time = time_source::probe(leap_seconds);
    log::info!("using {} time source in {:?} mode", time.name(), mode);

    let flags = RunFlags::new();
    signals::listen(&flags).map_err(ClockError::Signals)?;
    let watcher = input::spawn_quit_watcher(flags.clone());

    let screen = AlternateScreen::enter(io::stdout())?;
    let raw_mode = RawModeGuard::enter().map_err(ClockError::TerminalSetup)?;

    let mut clock = Clock::new(mode, ticker, Tty, time, io::stdout(), flags);
    let result = clock.run().await;

    if let Some(watcher) = watcher {
        watcher.abort();
    }
    drop(raw_mode);
    drop(screen);
    result
}

fn main() {
    let argv0 = program_name();

    let args = match cli::parse_args(std::env::args_os()) {
        ParseOutcome::Run(args) => args,
        ParseOutcome::Info(text) => {
            print!("{text}");
            process::exit(0);
        }
        ParseOutcome::Usage => {
            eprintln!("{}", cli::usage(&argv0));
            process::exit(1);
        }
    };

    let config = match Config::load(None) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{argv0}: {e}");
            process::exit(1);
        }
    };

    init_logging(config.logging.file.as_deref());

    let mode = match args.mode() {
        Some(mode) => mode,
        None if config.clock.epoch => DisplayMode::Epoch,
        None => DisplayMode::WallClock,
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{argv0}: failed to start runtime: {e}");
            process::exit(1);
        }
    };

    let code = match runtime.block_on(run_clock(mode, config.clock.leap_seconds)) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e}");
            eprintln!("{argv0}: {e}");
            e.exit_code()
        }
    };

    drop(runtime);
    process::exit(code);
}
