//! Process-wide exporter flags.
//!
//! Flags are parsed from a command-line style argument list and stored in a
//! global slot read by every exporter in the process. [`parse`] reads the
//! real process arguments; unknown arguments terminate the process with a
//! usage message, so hosts that have their own command line should call
//! [`parse_from`] with a list they control.

use std::ffi::OsString;
use std::sync::{OnceLock, PoisonError, RwLock};

use clap::Parser;

/// Tuning flags shared by all exporters.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "pgstat_exporter", about = "PostgreSQL statistics exporter flags")]
pub struct Flags {
    /// Lock wait timeout in seconds applied to every scrape session.
    #[arg(long, default_value_t = 2)]
    pub lock_wait_timeout: u64,

    /// Maximum number of rows read from pg_stat_statements.
    #[arg(long, default_value_t = 100)]
    pub statements_limit: u32,

    /// Log each scraper run at info level instead of debug.
    #[arg(long)]
    pub log_scrapes: bool,
}

impl Default for Flags {
    fn default() -> Self {
        Self {
            lock_wait_timeout: 2,
            statements_limit: 100,
            log_scrapes: false,
        }
    }
}

fn slot() -> &'static RwLock<Flags> {
    static FLAGS: OnceLock<RwLock<Flags>> = OnceLock::new();
    FLAGS.get_or_init(|| RwLock::new(Flags::default()))
}

/// Parses flags from the process arguments.
pub fn parse() {
    parse_from(std::env::args_os());
}

/// Parses flags from `args` (first element is the program name) and
/// replaces the current global flags.
pub fn parse_from<I, T>(args: I)
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let flags = Flags::parse_from(args);
    *slot().write().unwrap_or_else(PoisonError::into_inner) = flags;
}

/// Returns a copy of the current global flags.
pub fn current() -> Flags {
    slot().read().unwrap_or_else(PoisonError::into_inner).clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_name_only_yields_defaults() {
        let flags = Flags::parse_from(["pgstat_exporter"]);
        assert_eq!(flags, Flags::default());
    }

    #[test]
    fn parses_known_flags() {
        let flags = Flags::parse_from([
            "pgstat_exporter",
            "--lock-wait-timeout",
            "5",
            "--statements-limit=10",
        ]);
        assert_eq!(flags.lock_wait_timeout, 5);
        assert_eq!(flags.statements_limit, 10);
        assert!(!flags.log_scrapes);
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert!(Flags::try_parse_from(["host-binary", "--config", "agent.json"]).is_err());
    }
}
