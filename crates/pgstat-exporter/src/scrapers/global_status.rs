//! Instance-wide totals from pg_stat_database.

use prometheus::proto::MetricFamily;

use crate::error::ScrapeError;
use crate::scraper::{Scraper, counter, gauge, metric_name};
use crate::session::Session;

const SUBSYSTEM: &str = "global_status";

const QUERY: &str = r#"
    SELECT
        COALESCE(sum(numbackends), 0)::bigint AS numbackends,
        COALESCE(sum(xact_commit), 0)::bigint AS xact_commit,
        COALESCE(sum(xact_rollback), 0)::bigint AS xact_rollback,
        COALESCE(sum(blks_read), 0)::bigint AS blks_read,
        COALESCE(sum(blks_hit), 0)::bigint AS blks_hit,
        COALESCE(sum(tup_returned), 0)::bigint AS tup_returned,
        COALESCE(sum(tup_fetched), 0)::bigint AS tup_fetched,
        COALESCE(sum(tup_inserted), 0)::bigint AS tup_inserted,
        COALESCE(sum(tup_updated), 0)::bigint AS tup_updated,
        COALESCE(sum(tup_deleted), 0)::bigint AS tup_deleted,
        COALESCE(sum(conflicts), 0)::bigint AS conflicts,
        COALESCE(sum(temp_files), 0)::bigint AS temp_files,
        COALESCE(sum(temp_bytes), 0)::bigint AS temp_bytes,
        COALESCE(sum(deadlocks), 0)::bigint AS deadlocks
    FROM pg_stat_database
"#;

/// Columns reported as gauges; everything else is a monotonically increasing counter.
const GAUGE_COLUMNS: &[&str] = &["numbackends"];

/// Collects instance-wide transaction, block and tuple totals.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScrapeGlobalStatus;

impl Scraper for ScrapeGlobalStatus {
    fn name(&self) -> &'static str {
        SUBSYSTEM
    }

    fn help(&self) -> &'static str {
        "Collect instance-wide totals from pg_stat_database"
    }

    fn version(&self) -> f64 {
        9.2
    }

    fn scrape(&self, session: &mut dyn Session) -> Result<Vec<MetricFamily>, ScrapeError> {
        let rows = session.query(QUERY)?;
        let Some(row) = rows.first() else {
            return Ok(Vec::new());
        };

        let mut families = Vec::new();
        for column in row.columns() {
            let Some(value) = row.get_f64(column) else {
                continue;
            };
            let name = metric_name(SUBSYSTEM, column);
            let help = format!("Sum of pg_stat_database.{} over all databases", column);
            let family = if GAUGE_COLUMNS.contains(&column.as_str()) {
                gauge(&name, &help, value)?
            } else {
                counter(&name, &help, value)?
            };
            families.push(family);
        }
        Ok(families)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::testing::CannedSession;
    use crate::session::Row;
    use prometheus::proto::MetricType;

    #[test]
    fn one_family_per_column() {
        let mut session = CannedSession::default().with(
            "FROM pg_stat_database",
            vec![Row::from_pairs(&[
                ("numbackends", Some("12")),
                ("xact_commit", Some("1000")),
                ("deadlocks", Some("2")),
            ])],
        );

        let families = ScrapeGlobalStatus.scrape(&mut session).unwrap();
        assert_eq!(families.len(), 3);

        let backends = &families[0];
        assert_eq!(backends.get_name(), "pg_global_status_numbackends");
        assert_eq!(backends.get_field_type(), MetricType::GAUGE);
        assert_eq!(backends.get_metric()[0].get_gauge().get_value(), 12.0);

        let commits = &families[1];
        assert_eq!(commits.get_field_type(), MetricType::COUNTER);
        assert_eq!(commits.get_metric()[0].get_counter().get_value(), 1000.0);
    }

    #[test]
    fn empty_result_yields_nothing() {
        let mut session = CannedSession::default().with("FROM pg_stat_database", Vec::new());
        assert!(ScrapeGlobalStatus.scrape(&mut session).unwrap().is_empty());
    }
}
