//! `pgstat` exporter: PostgreSQL statistics through the pgstat-exporter library.
//!
//! Configuration:
//!
//! ```json
//! { "dsn": "host=localhost user=monitor", "scraperFlags": { "statements": true } }
//! ```
//!
//! `scraperFlags` turns library scrapers on or off by name; scrapers not
//! named keep the library's default. Every selected scraper runs regardless
//! of the server version the library detects.

mod shim;

use std::collections::HashMap;
use std::sync::Arc;

use pgstat_exporter::{Connector, PgConnector, Registry, Scraper, default_scrapers};
use serde::Deserialize;
use tracing::info;

use crate::config::decode_plugin_config;
use crate::error::{PluginError, Result};
use crate::metric::{Metric, from_metric_family};
use crate::plugins::{Exporter, Plugin, PluginConfig};

pub use shim::{IgnoredVersion, prepare_library, select_scrapers};

pub const NAME: &str = "pgstat";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PgstatConfig {
    pub dsn: String,
    #[serde(rename = "scraperFlags", default)]
    pub scraper_flags: HashMap<String, bool>,
}

/// Library objects owned between `init` and `close`.
struct Attached {
    registry: Registry,
    exporter: Arc<pgstat_exporter::Exporter>,
}

pub struct PgstatExporter {
    connector: Arc<dyn Connector>,
    attached: Option<Attached>,
}

impl PgstatExporter {
    pub fn new() -> Self {
        Self::with_connector(Arc::new(PgConnector))
    }

    pub fn with_connector(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            attached: None,
        }
    }

    /// Names of the library scrapers this instance runs. Empty before `init`.
    pub fn scraper_names(&self) -> Vec<&'static str> {
        self.attached
            .as_ref()
            .map(|a| a.exporter.scrapers().iter().map(|s| s.name()).collect())
            .unwrap_or_default()
    }
}

impl Default for PgstatExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for PgstatExporter {
    fn description(&self) -> &'static str {
        "PostgreSQL server statistics via pgstat-exporter"
    }

    fn sample_config(&self) -> &'static str {
        r#"{ "dsn": "host=localhost user=monitor", "scraperFlags": { "statements": true, "replication_status": false } }"#
    }

    fn init(&mut self, config: &PluginConfig) -> Result<()> {
        let config: PgstatConfig = decode_plugin_config(NAME, config)?;
        if config.dsn.trim().is_empty() {
            return Err(PluginError::config(NAME, "dsn must not be empty"));
        }

        prepare_library();

        let scrapers: Vec<Arc<dyn Scraper>> = select_scrapers(default_scrapers(), &config.scraper_flags)
            .into_iter()
            .map(|s| Arc::new(IgnoredVersion::new(s)) as Arc<dyn Scraper>)
            .collect();

        let exporter = Arc::new(
            pgstat_exporter::Exporter::new(&config.dsn, scrapers, self.connector.clone())
                .map_err(|e| PluginError::config(NAME, e))?,
        );
        let registry = Registry::new();
        registry
            .register(exporter.clone())
            .map_err(PluginError::unexpected)?;

        self.attached = Some(Attached { registry, exporter });
        info!(scrapers = ?self.scraper_names(), "pgstat exporter attached");
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        // take() guards the library's non-repeatable unregister
        let Some(attached) = self.attached.take() else {
            return Ok(());
        };
        attached
            .registry
            .unregister(&attached.exporter)
            .map_err(PluginError::unexpected)?;
        info!("pgstat exporter detached");
        Ok(())
    }
}

impl Exporter for PgstatExporter {
    fn collect(&mut self) -> Result<Vec<Metric>> {
        let attached = self
            .attached
            .as_ref()
            .ok_or_else(|| PluginError::unexpected("pgstat exporter is not attached"))?;

        let families = attached
            .registry
            .gather()
            .map_err(|e| PluginError::ExternalGather {
                plugin: NAME.to_string(),
                message: e.to_string(),
            })?;

        Ok(families.iter().flat_map(from_metric_family).collect())
    }
}

#[cfg(test)]
mod tests {
    use pgstat_exporter::{Row, ScrapeError, Session};
    use serde_json::json;

    use super::*;

    /// Connector to a fake server that answers only the version probe and
    /// the global status query.
    struct FakeServer {
        version: &'static str,
        reachable: bool,
    }

    struct FakeSession {
        version: &'static str,
    }

    impl Connector for FakeServer {
        fn connect(&self, _dsn: &str) -> std::result::Result<Box<dyn Session>, ScrapeError> {
            if !self.reachable {
                return Err(ScrapeError::Connection("connection refused".to_string()));
            }
            Ok(Box::new(FakeSession {
                version: self.version,
            }))
        }
    }

    impl Session for FakeSession {
        fn execute(&mut self, _sql: &str) -> std::result::Result<(), ScrapeError> {
            Ok(())
        }

        fn query(&mut self, sql: &str) -> std::result::Result<Vec<Row>, ScrapeError> {
            if sql == "SHOW server_version" {
                Ok(vec![Row::from_pairs(&[("server_version", Some(self.version))])])
            } else if sql.contains("FROM pg_stat_database") {
                Ok(vec![Row::from_pairs(&[
                    ("numbackends", Some("3")),
                    ("xact_commit", Some("70")),
                ])])
            } else {
                Err(ScrapeError::Query("relation does not exist".to_string()))
            }
        }
    }

    fn exporter(version: &'static str, reachable: bool) -> PgstatExporter {
        PgstatExporter::with_connector(Arc::new(FakeServer { version, reachable }))
    }

    #[test]
    fn disabled_flag_excludes_default_scraper() {
        let mut e = exporter("16.2", true);
        e.init(&json!({ "dsn": "host=db1", "scraperFlags": { "global_status": false } }))
            .unwrap();

        let names = e.scraper_names();
        assert!(!names.contains(&"global_status"));
        assert!(names.contains(&"global_variables"));
    }

    #[test]
    fn absent_flags_use_library_defaults() {
        let mut e = exporter("16.2", true);
        e.init(&json!({ "dsn": "host=db1" })).unwrap();

        let expected: Vec<&str> = default_scrapers()
            .iter()
            .filter(|(_, on)| *on)
            .map(|(s, _)| s.name())
            .collect();
        assert_eq!(e.scraper_names(), expected);
    }

    #[test]
    fn collect_flattens_all_samples() {
        let mut e = exporter("16.2", true);
        e.init(&json!({ "dsn": "host=db1", "scraperFlags": { "global_status": true } }))
            .unwrap();

        let metrics = e.collect().unwrap();
        let commit = metrics
            .iter()
            .find(|m| m.name() == "pg_global_status_xact_commit")
            .unwrap();
        assert_eq!(commit.value(), 70.0);
        assert!(metrics.iter().any(|m| m.name() == "pg_up" && m.value() == 1.0));

        // one record per collector label value, each carrying the label
        let durations: Vec<&Metric> = metrics
            .iter()
            .filter(|m| m.name() == "pg_exporter_collector_duration_seconds")
            .collect();
        assert_eq!(durations.len(), e.scraper_names().len() + 1);
        assert!(durations.iter().all(|m| m.label("collector").is_some()));
    }

    #[test]
    fn old_server_version_does_not_skip_scrapers() {
        let mut e = exporter("9.0.1", true);
        e.init(&json!({ "dsn": "host=db1" })).unwrap();

        let metrics = e.collect().unwrap();
        assert!(metrics.iter().any(|m| m.name() == "pg_global_status_xact_commit"));
    }

    #[test]
    fn failing_gather_returns_no_data() {
        let mut e = exporter("16.2", false);
        e.init(&json!({ "dsn": "host=db1" })).unwrap();

        let err = e.collect().unwrap_err();
        assert!(matches!(err, PluginError::ExternalGather { ref plugin, .. } if plugin == NAME));
    }

    #[test]
    fn empty_dsn_is_a_config_error() {
        let mut e = exporter("16.2", true);
        assert!(matches!(
            e.init(&json!({ "dsn": "  " })),
            Err(PluginError::ConfigTranslation { .. })
        ));
        assert!(matches!(
            e.init(&json!({ "scraperFlags": {} })),
            Err(PluginError::ConfigTranslation { .. })
        ));
    }

    #[test]
    fn invalid_dsn_is_a_config_error() {
        let mut e = exporter("16.2", true);
        assert!(matches!(
            e.init(&json!({ "dsn": "host=db1 port=notaport" })),
            Err(PluginError::ConfigTranslation { .. })
        ));
    }

    #[test]
    fn mistyped_flags_are_a_config_error() {
        let mut e = exporter("16.2", true);
        assert!(matches!(
            e.init(&json!({ "dsn": "host=db1", "scraperFlags": { "locks": "yes" } })),
            Err(PluginError::ConfigTranslation { .. })
        ));
    }

    #[test]
    fn close_is_idempotent() {
        let mut e = exporter("16.2", true);
        e.init(&json!({ "dsn": "host=db1" })).unwrap();
        e.close().unwrap();
        e.close().unwrap();
        assert!(e.scraper_names().is_empty());
    }
}
