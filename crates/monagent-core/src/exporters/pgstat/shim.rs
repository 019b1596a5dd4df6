//! Adjustments applied to the pgstat-exporter library before use.

use std::collections::HashMap;
use std::ffi::OsString;
use std::sync::{Arc, Once};

use pgstat_exporter::proto::MetricFamily;
use pgstat_exporter::{ScrapeError, Scraper, Session};
use tracing::{debug, warn};

/// Scraper wrapper reporting no minimum server version.
///
/// The library never skips a wrapped scraper on version grounds. A scraper
/// the server cannot serve fails its query and is counted as failed.
pub struct IgnoredVersion {
    inner: Arc<dyn Scraper>,
}

impl IgnoredVersion {
    pub fn new(inner: Arc<dyn Scraper>) -> Self {
        Self { inner }
    }
}

impl Scraper for IgnoredVersion {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn help(&self) -> &'static str {
        self.inner.help()
    }

    fn version(&self) -> f64 {
        0.0
    }

    fn scrape(&self, session: &mut dyn Session) -> Result<Vec<MetricFamily>, ScrapeError> {
        self.inner.scrape(session)
    }
}

/// Picks the scrapers to run. A flag present in `flags` decides; an
/// absent flag falls back to the table's default.
pub fn select_scrapers(
    table: Vec<(Arc<dyn Scraper>, bool)>,
    flags: &HashMap<String, bool>,
) -> Vec<Arc<dyn Scraper>> {
    for name in flags.keys() {
        if !table.iter().any(|(s, _)| s.name() == name) {
            warn!(scraper = %name, "unknown scraper flag ignored");
        }
    }

    table
        .into_iter()
        .filter(|(scraper, enabled)| flags.get(scraper.name()).copied().unwrap_or(*enabled))
        .map(|(scraper, _)| scraper)
        .collect()
}

static PREPARE: Once = Once::new();

/// Initializes the library's global flags once per process.
///
/// The library parses flags from an argument list and exits the process on
/// arguments it does not know. It only ever sees the program name, so the
/// agent's own command line never reaches it.
pub fn prepare_library() {
    PREPARE.call_once(|| {
        let program = std::env::args_os()
            .next()
            .unwrap_or_else(|| OsString::from("monagent"));
        pgstat_exporter::flags::parse_from([program]);
        debug!("pgstat library flags initialized");
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgstat_exporter::default_scrapers;

    fn names(scrapers: &[Arc<dyn Scraper>]) -> Vec<&'static str> {
        scrapers.iter().map(|s| s.name()).collect()
    }

    #[test]
    fn no_flags_selects_defaults() {
        let selected = select_scrapers(default_scrapers(), &HashMap::new());
        let expected: Vec<&str> = default_scrapers()
            .iter()
            .filter(|(_, on)| *on)
            .map(|(s, _)| s.name())
            .collect();
        assert_eq!(names(&selected), expected);
    }

    #[test]
    fn present_flag_overrides_default() {
        let flags = HashMap::from([
            ("global_status".to_string(), false),
            ("statements".to_string(), true),
        ]);
        let selected = names(&select_scrapers(default_scrapers(), &flags));
        assert!(!selected.contains(&"global_status"));
        assert!(selected.contains(&"statements"));
        assert!(selected.contains(&"bgwriter"));
    }

    #[test]
    fn unknown_flag_is_ignored() {
        let flags = HashMap::from([("no_such_scraper".to_string(), true)]);
        let with_unknown = names(&select_scrapers(default_scrapers(), &flags));
        let without = names(&select_scrapers(default_scrapers(), &HashMap::new()));
        assert_eq!(with_unknown, without);
    }

    #[test]
    fn ignored_version_forwards_identity() {
        let (inner, _) = default_scrapers()
            .into_iter()
            .find(|(s, _)| s.name() == "statements")
            .unwrap();
        assert!(inner.version() > 0.0);

        let wrapped = IgnoredVersion::new(inner.clone());
        assert_eq!(wrapped.name(), inner.name());
        assert_eq!(wrapped.help(), inner.help());
        assert_eq!(wrapped.version(), 0.0);
    }

    #[test]
    fn prepare_library_is_repeatable() {
        prepare_library();
        prepare_library();
        assert_eq!(pgstat_exporter::flags::current(), pgstat_exporter::flags::Flags::default());
    }
}
