//! Per-database on-disk size.

use prometheus::proto::MetricFamily;

use crate::error::ScrapeError;
use crate::scraper::{Scraper, labeled_gauges};
use crate::session::Session;

const QUERY: &str = r#"
    SELECT datname, pg_database_size(datname)::bigint AS size_bytes
    FROM pg_database
    WHERE NOT datistemplate AND datallowconn
    ORDER BY datname
"#;

#[derive(Debug, Default, Clone, Copy)]
pub struct ScrapeDatabaseSize;

impl Scraper for ScrapeDatabaseSize {
    fn name(&self) -> &'static str {
        "database_size"
    }

    fn help(&self) -> &'static str {
        "Collect the on-disk size of each database"
    }

    fn version(&self) -> f64 {
        8.1
    }

    fn scrape(&self, session: &mut dyn Session) -> Result<Vec<MetricFamily>, ScrapeError> {
        let samples: Vec<(Vec<String>, f64)> = session
            .query(QUERY)?
            .iter()
            .filter_map(|row| Some((vec![row.get("datname")?.to_string()], row.get_f64("size_bytes")?)))
            .collect();

        Ok(labeled_gauges(
            "pg_database_size_bytes",
            "Disk space used by the database",
            &["datname"],
            &samples,
        )?
        .into_iter()
        .collect())
    }
}
