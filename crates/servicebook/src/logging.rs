//! Diagnostic logging for svcbook.
//!
//! Diagnostics go to stderr through `tracing`. Stdout is reserved for the
//! records, reports and printouts a command produces, so `svcbook list -f csv`
//! can be redirected to a file without log lines mixed in.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How much diagnostic output to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only (`-q`).
    Quiet,
    /// Warnings and errors, such as skipped ids or a failed automatic backup.
    #[default]
    Normal,
    /// Adds database, backup and query details (`-v`).
    Verbose,
    /// Everything (`-vv` and more).
    Trace,
}

impl Verbosity {
    /// Pick the level from the `-q` flag and the number of `-v` flags.
    /// `-q` wins over any number of `-v`.
    #[must_use]
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Trace,
        }
    }

    /// Most detailed `tracing` level shown at this verbosity.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::WARN,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }
}

/// Install the stderr subscriber for the `servicebook` target.
///
/// `RUST_LOG`, when set, replaces the level chosen by `verbosity`. Calling
/// this more than once keeps the first subscriber.
///
/// # Examples
///
/// ```no_run
/// use servicebook::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::from_flags(false, 1));
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let default_filter = format!("servicebook={}", verbosity.to_level_filter());
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time(),
    );
    let _ = subscriber.try_init();
}

/// Route logs from unit tests through the test harness, warnings and up.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
