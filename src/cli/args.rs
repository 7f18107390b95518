//! CLI argument parsing with clap.

use clap::error::ErrorKind;
use clap::Parser;

use crate::layout::DisplayMode;

/// Large seven-segment clock for the terminal
#[derive(Parser, Debug)]
#[command(name = "mongoclock")]
#[command(version, about = "Large seven-segment clock for the terminal", long_about = None)]
#[command(after_help = "Press q to quit.")]
#[command(args_override_self = true)]
pub struct Args {
    /// Show seconds since the POSIX epoch instead of the local time
    #[arg(short = 's', long = "seconds-since-epoch")]
    pub epoch: bool,
}

impl Args {
    /// Display mode requested on the command line, if any.
    pub fn mode(&self) -> Option<DisplayMode> {
        self.epoch.then_some(DisplayMode::Epoch)
    }
}

/// Result of parsing the command line.
#[derive(Debug)]
pub enum ParseOutcome {
    /// Run the clock with these arguments.
    Run(Args),
    /// Help or version was requested; print this and exit 0.
    Info(String),
    /// Bad arguments; print the usage line and exit 1.
    Usage,
}

/// Usage line for `argv0`.
pub fn usage(argv0: &str) -> String {
    format!("usage: {argv0} [-s]")
}

/// Parse `args` (including the program name).
pub fn parse_args<I, T>(args: I) -> ParseOutcome
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    match Args::try_parse_from(args) {
        Ok(args) => ParseOutcome::Run(args),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            ParseOutcome::Info(e.to_string())
        }
        Err(e) => {
            log::debug!("rejected arguments: {e}");
            ParseOutcome::Usage
        }
    }
}
