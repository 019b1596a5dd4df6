//! Runs a set of scrapers against one server.
//!
//! Every [`Exporter::scrape`] opens a fresh session, determines the server
//! version, and runs each scraper whose minimum version the server meets.
//! A failing scraper is logged and counted; only connection and version
//! failures fail the whole scrape.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use tracing::{debug, info, warn};

use crate::error::ScrapeError;
use crate::flags;
use crate::scraper::{Scraper, counter, gauge, labeled_gauges};
use crate::session::Connector;
use crate::version::parse_server_version;

const UP_NAME: &str = "pg_up";
const UP_HELP: &str = "Whether the last scrape reached the server";

/// Collects metrics from one server with a fixed set of scrapers.
pub struct Exporter {
    dsn: String,
    scrapers: Vec<Arc<dyn Scraper>>,
    connector: Arc<dyn Connector>,
    scrapes_total: AtomicU64,
    up_desc: Desc,
}

impl Exporter {
    /// Creates an exporter.
    ///
    /// `dsn` is a libpq key/value string or a `postgresql://` URL; it is
    /// validated here, connections are opened per scrape.
    pub fn new(
        dsn: &str,
        scrapers: Vec<Arc<dyn Scraper>>,
        connector: Arc<dyn Connector>,
    ) -> Result<Self, ScrapeError> {
        postgres::Config::from_str(dsn).map_err(|e| ScrapeError::InvalidDsn(e.to_string()))?;
        let up_desc = Desc::new(
            UP_NAME.to_string(),
            UP_HELP.to_string(),
            Vec::new(),
            HashMap::new(),
        )?;

        Ok(Self {
            dsn: dsn.to_string(),
            scrapers,
            connector,
            scrapes_total: AtomicU64::new(0),
            up_desc,
        })
    }

    /// Scrapers this exporter runs, in execution order.
    pub fn scrapers(&self) -> &[Arc<dyn Scraper>] {
        &self.scrapers
    }

    /// Runs one scrape and returns all collected families.
    pub fn scrape(&self) -> Result<Vec<MetricFamily>, ScrapeError> {
        let started = Instant::now();
        let scrapes_total = self.scrapes_total.fetch_add(1, Ordering::Relaxed) + 1;
        let flags = flags::current();

        let mut session = self.connector.connect(&self.dsn)?;
        session.execute(&format!("SET lock_timeout = '{}s'", flags.lock_wait_timeout))?;

        let raw_version = session.server_version()?;
        let server_version = parse_server_version(&raw_version)
            .ok_or_else(|| ScrapeError::Version(raw_version.clone()))?;

        let mut families = Vec::new();
        let mut durations = Vec::with_capacity(self.scrapers.len() + 1);
        let mut failed = 0u32;

        for scraper in &self.scrapers {
            if scraper.version() > server_version {
                debug!(
                    scraper = scraper.name(),
                    required = scraper.version(),
                    server = server_version,
                    "scraper skipped, server version too old"
                );
                continue;
            }

            let scraper_started = Instant::now();
            match scraper.scrape(session.as_mut()) {
                Ok(collected) => families.extend(collected),
                Err(e) => {
                    failed += 1;
                    warn!(scraper = scraper.name(), error = %e, "scraper failed");
                }
            }
            let elapsed = scraper_started.elapsed();
            if flags.log_scrapes {
                info!(scraper = scraper.name(), elapsed_ms = elapsed.as_millis() as u64, "scraper done");
            }
            durations.push((vec![scraper.name().to_string()], elapsed.as_secs_f64()));
        }
        durations.push((vec!["total".to_string()], started.elapsed().as_secs_f64()));

        families.push(gauge(UP_NAME, UP_HELP, 1.0)?);
        families.push(counter(
            "pg_exporter_scrapes_total",
            "Scrapes performed by this exporter",
            scrapes_total as f64,
        )?);
        families.push(gauge(
            "pg_exporter_last_scrape_error",
            "Whether any scraper failed during the last scrape",
            if failed > 0 { 1.0 } else { 0.0 },
        )?);
        families.extend(labeled_gauges(
            "pg_exporter_collector_duration_seconds",
            "Time spent per scraper during the last scrape",
            &["collector"],
            &durations,
        )?);

        Ok(families)
    }
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.scrapers.iter().map(|s| s.name()).collect();
        f.debug_struct("Exporter").field("scrapers", &names).finish()
    }
}

/// Lenient collection for plain `prometheus` registries: a failed scrape
/// is reported as `pg_up 0` instead of an error.
impl Collector for Exporter {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.up_desc]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        match self.scrape() {
            Ok(families) => families,
            Err(e) => {
                warn!(error = %e, "scrape failed");
                gauge(UP_NAME, UP_HELP, 0.0).into_iter().collect()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::scrapers::testing::CannedSession;
    use crate::scrapers::{ScrapeGlobalStatus, ScrapeStatements};
    use crate::session::{Row, Session};

    pub(crate) struct CannedConnector {
        pub session: Option<CannedSession>,
    }

    impl Connector for CannedConnector {
        fn connect(&self, _dsn: &str) -> Result<Box<dyn Session>, ScrapeError> {
            self.session
                .clone()
                .map(|s| Box::new(s) as Box<dyn Session>)
                .ok_or_else(|| ScrapeError::Connection("connection refused".to_string()))
        }
    }

    pub(crate) fn server(version: &str) -> CannedSession {
        let version = version.to_string();
        CannedSession::default()
            .with(
                "SHOW server_version",
                vec![Row::new(vec!["server_version".to_string()], vec![Some(version)])],
            )
            .with(
                "FROM pg_stat_database",
                vec![Row::from_pairs(&[("xact_commit", Some("7"))])],
            )
    }

    fn names(families: &[MetricFamily]) -> Vec<&str> {
        families.iter().map(|f| f.get_name()).collect()
    }

    #[test]
    fn rejects_invalid_dsn() {
        let connector = Arc::new(CannedConnector { session: None });
        let err = Exporter::new("host=localhost port=notaport", Vec::new(), connector).unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidDsn(_)));
    }

    #[test]
    fn skips_scrapers_newer_than_server() {
        let connector = Arc::new(CannedConnector { session: Some(server("9.6.24")) });
        let scrapers: Vec<Arc<dyn Scraper>> =
            vec![Arc::new(ScrapeGlobalStatus), Arc::new(ScrapeStatements)];
        let exporter = Exporter::new("host=localhost user=monitor", scrapers, connector).unwrap();

        let families = exporter.scrape().unwrap();
        let names = names(&families);
        assert!(names.contains(&"pg_global_status_xact_commit"));
        assert!(!names.iter().any(|n| n.starts_with("pg_statements_")));
        assert!(names.contains(&"pg_up"));
    }

    #[test]
    fn scraper_failure_is_counted_not_fatal() {
        // Server new enough for statements, but the canned session has no answer for it.
        let connector = Arc::new(CannedConnector { session: Some(server("16.1")) });
        let scrapers: Vec<Arc<dyn Scraper>> =
            vec![Arc::new(ScrapeGlobalStatus), Arc::new(ScrapeStatements)];
        let exporter = Exporter::new("host=localhost user=monitor", scrapers, connector).unwrap();

        let families = exporter.scrape().unwrap();
        let last_error = families
            .iter()
            .find(|f| f.get_name() == "pg_exporter_last_scrape_error")
            .unwrap();
        assert_eq!(last_error.get_metric()[0].get_gauge().get_value(), 1.0);
    }

    #[test]
    fn connection_failure_fails_scrape() {
        let connector = Arc::new(CannedConnector { session: None });
        let exporter = Exporter::new("host=localhost", Vec::new(), connector).unwrap();
        assert!(matches!(exporter.scrape(), Err(ScrapeError::Connection(_))));
    }

    #[test]
    fn collector_reports_down_on_failure() {
        let connector = Arc::new(CannedConnector { session: None });
        let exporter = Exporter::new("host=localhost", Vec::new(), connector).unwrap();
        let families = Collector::collect(&exporter);
        assert_eq!(families.len(), 1);
        assert_eq!(families[0].get_name(), "pg_up");
        assert_eq!(families[0].get_metric()[0].get_gauge().get_value(), 0.0);
    }

    #[test]
    fn unparsable_version_fails_scrape() {
        let connector = Arc::new(CannedConnector { session: Some(server("unknown")) });
        let exporter = Exporter::new("host=localhost", Vec::new(), connector).unwrap();
        assert!(matches!(exporter.scrape(), Err(ScrapeError::Version(_))));
    }
}
