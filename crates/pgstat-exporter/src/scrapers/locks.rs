//! Lock counts from pg_locks.

use prometheus::proto::MetricFamily;

use crate::error::ScrapeError;
use crate::scraper::{Scraper, labeled_gauges};
use crate::session::Session;

const QUERY: &str = r#"
    SELECT
        mode,
        count(*)::bigint AS held,
        count(*) FILTER (WHERE NOT granted)::bigint AS waiting
    FROM pg_locks
    GROUP BY mode
    ORDER BY mode
"#;

#[derive(Debug, Default, Clone, Copy)]
pub struct ScrapeLocks;

impl Scraper for ScrapeLocks {
    fn name(&self) -> &'static str {
        "locks"
    }

    fn help(&self) -> &'static str {
        "Collect held and awaited lock counts by mode"
    }

    fn version(&self) -> f64 {
        // aggregate FILTER clause
        9.4
    }

    fn scrape(&self, session: &mut dyn Session) -> Result<Vec<MetricFamily>, ScrapeError> {
        let rows = session.query(QUERY)?;
        let mut held = Vec::with_capacity(rows.len());
        let mut waiting = Vec::with_capacity(rows.len());
        for row in &rows {
            let Some(mode) = row.get("mode") else {
                continue;
            };
            held.push((vec![mode.to_string()], row.get_f64("held").unwrap_or(0.0)));
            waiting.push((vec![mode.to_string()], row.get_f64("waiting").unwrap_or(0.0)));
        }

        let mut families = Vec::new();
        families.extend(labeled_gauges("pg_locks_count", "Locks by mode", &["mode"], &held)?);
        families.extend(labeled_gauges(
            "pg_locks_waiting",
            "Lock requests not yet granted, by mode",
            &["mode"],
            &waiting,
        )?);
        Ok(families)
    }
}
