//! Top statements from pg_stat_statements.

use prometheus::proto::MetricFamily;

use crate::error::ScrapeError;
use crate::flags;
use crate::scraper::{Scraper, labeled_counters};
use crate::session::Session;

const LABELS: &[&str] = &["queryid", "datname", "usename"];

fn build_statements_query(limit: u32) -> String {
    format!(
        r#"
            SELECT
                s.queryid::text AS queryid,
                COALESCE(d.datname, '') AS datname,
                COALESCE(r.rolname, '') AS usename,
                s.calls::bigint AS calls,
                (s.total_exec_time / 1000.0)::double precision AS exec_seconds,
                s.rows::bigint AS rows,
                s.shared_blks_hit::bigint AS shared_blks_hit,
                s.shared_blks_read::bigint AS shared_blks_read
            FROM pg_stat_statements s
            LEFT JOIN pg_database d ON d.oid = s.dbid
            LEFT JOIN pg_roles r ON r.oid = s.userid
            ORDER BY s.total_exec_time DESC
            LIMIT {limit}
        "#
    )
}

/// Per-statement counters, limited to the most expensive statements.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScrapeStatements;

impl Scraper for ScrapeStatements {
    fn name(&self) -> &'static str {
        "statements"
    }

    fn help(&self) -> &'static str {
        "Collect per-statement counters from pg_stat_statements"
    }

    fn version(&self) -> f64 {
        // total_exec_time
        13.0
    }

    fn scrape(&self, session: &mut dyn Session) -> Result<Vec<MetricFamily>, ScrapeError> {
        let rows = session.query(&build_statements_query(flags::current().statements_limit))?;

        let columns: [(&str, &str, &str); 5] = [
            ("calls", "pg_statements_calls_total", "Times the statement was executed"),
            ("exec_seconds", "pg_statements_exec_seconds_total", "Total execution time"),
            ("rows", "pg_statements_rows_total", "Rows retrieved or affected"),
            ("shared_blks_hit", "pg_statements_shared_blks_hit_total", "Shared buffer hits"),
            ("shared_blks_read", "pg_statements_shared_blks_read_total", "Shared blocks read"),
        ];

        let mut families = Vec::new();
        for (column, name, help) in columns {
            let samples: Vec<(Vec<String>, f64)> = rows
                .iter()
                .filter_map(|row| {
                    let labels = LABELS
                        .iter()
                        .map(|l| row.get(l).unwrap_or("").to_string())
                        .collect();
                    Some((labels, row.get_f64(column)?))
                })
                .collect();
            families.extend(labeled_counters(name, help, LABELS, &samples)?);
        }
        Ok(families)
    }
}
