//! `tracing` setup for `dealerd`.
//!
//! The `-v`/`-q` flags pick a [`Verbosity`]; `RUST_LOG`, when present,
//! replaces the whole filter.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Targets that follow the command-line verbosity.
const TARGETS: &[&str] = &["dealership", "dealerd", "tower_http"];

/// How chatty the process is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// `-q`: errors only.
    Quiet,
    /// Requests, orders and account changes.
    #[default]
    Normal,
    /// `-v`: SQL-level and extractor details.
    Verbose,
    /// `-vv`
    Trace,
}

impl Verbosity {
    /// Maximum level logged for the crate's own targets.
    #[must_use]
    pub fn level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Filter directive applied when `RUST_LOG` is unset, e.g.
    /// `dealership=INFO,dealerd=INFO,tower_http=INFO`.
    #[must_use]
    pub fn default_directive(self) -> String {
        let level = self.level();
        TARGETS
            .iter()
            .map(|target| format!("{target}={level}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.default_directive()));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}
