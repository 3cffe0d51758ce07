//! Tracing subscriber setup.
//!
//! The `-v`/`-q` flags pick a default filter covering this crate and the
//! HTTP trace layer. `RUST_LOG` replaces that default entirely.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log targets that follow the CLI verbosity.
const TARGETS: &[&str] = &["docuapprove", "tower_http"];

/// How chatty the process should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Info and above.
    #[default]
    Normal,
    /// Debug and above, including one line per HTTP request.
    Verbose,
    /// Everything.
    Trace,
}

impl Verbosity {
    /// Build from repeated `-v` and a `-q` flag. `-q` wins.
    #[must_use]
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Trace,
        }
    }

    /// Maximum level emitted at this verbosity.
    #[must_use]
    pub fn to_level(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Filter used when `RUST_LOG` is unset.
    #[must_use]
    pub fn default_directive(&self) -> String {
        let level = self.to_level();
        TARGETS
            .iter()
            .map(|target| format!("{target}={level}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Install the global subscriber.
///
/// A second call leaves the first subscriber in place.
///
/// ```no_run
/// use docuapprove::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::Verbose);
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.default_directive()));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).compact())
        .try_init();
}

/// Route warnings through the test harness writer.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels() {
        assert_eq!(Verbosity::Quiet.to_level(), Level::ERROR);
        assert_eq!(Verbosity::default().to_level(), Level::INFO);
        assert_eq!(Verbosity::Verbose.to_level(), Level::DEBUG);
        assert_eq!(Verbosity::Trace.to_level(), Level::TRACE);
    }

    #[test]
    fn test_from_flags() {
        assert_eq!(Verbosity::from_flags(0, false), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(1, false), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(4, false), Verbosity::Trace);
        assert_eq!(Verbosity::from_flags(2, true), Verbosity::Quiet);
    }

    #[test]
    fn test_directive_covers_http_layer() {
        assert_eq!(
            Verbosity::Verbose.default_directive(),
            "docuapprove=DEBUG,tower_http=DEBUG"
        );
    }

    #[test]
    fn test_every_directive_parses() {
        for v in [
            Verbosity::Quiet,
            Verbosity::Normal,
            Verbosity::Verbose,
            Verbosity::Trace,
        ] {
            assert!(EnvFilter::try_new(v.default_directive()).is_ok());
        }
    }

    #[test]
    fn test_repeated_init() {
        init_test_logging();
        init_logging(Verbosity::Quiet);
    }
}
