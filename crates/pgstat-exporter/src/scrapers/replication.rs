//! Streaming replication state from pg_stat_replication.

use prometheus::proto::MetricFamily;

use crate::error::ScrapeError;
use crate::scraper::{Scraper, gauge, labeled_gauges};
use crate::session::Session;

const QUERY_RECOVERY: &str = "SELECT pg_is_in_recovery() AS in_recovery";

const QUERY_REPLICAS: &str = r#"
    SELECT
        COALESCE(application_name, '') AS application_name,
        COALESCE(client_addr::text, '') AS client_addr,
        COALESCE(state, '') AS state,
        COALESCE(EXTRACT(EPOCH FROM replay_lag), 0)::double precision AS replay_lag_seconds,
        COALESCE(pg_wal_lsn_diff(pg_current_wal_lsn(), replay_lsn), 0)::double precision AS replay_lag_bytes
    FROM pg_stat_replication
"#;

const LABELS: &[&str] = &["application_name", "client_addr", "state"];

/// Collects the recovery flag and per-replica lag.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScrapeReplicationStatus;

impl Scraper for ScrapeReplicationStatus {
    fn name(&self) -> &'static str {
        "replication_status"
    }

    fn help(&self) -> &'static str {
        "Collect recovery state and replica lag from pg_stat_replication"
    }

    fn version(&self) -> f64 {
        10.0
    }

    fn scrape(&self, session: &mut dyn Session) -> Result<Vec<MetricFamily>, ScrapeError> {
        let mut families = Vec::new();

        let in_recovery = session
            .query(QUERY_RECOVERY)?
            .first()
            .and_then(|row| row.get_f64("in_recovery"))
            .unwrap_or(0.0);
        families.push(gauge(
            "pg_replication_is_replica",
            "Whether the server is in recovery (1) or primary (0)",
            in_recovery,
        )?);

        // Replicas are only visible on the primary.
        if in_recovery == 0.0 {
            let mut lag_seconds = Vec::new();
            let mut lag_bytes = Vec::new();
            for row in session.query(QUERY_REPLICAS)? {
                let labels: Vec<String> = LABELS
                    .iter()
                    .map(|l| row.get(l).unwrap_or("").to_string())
                    .collect();
                lag_seconds.push((labels.clone(), row.get_f64("replay_lag_seconds").unwrap_or(0.0)));
                lag_bytes.push((labels, row.get_f64("replay_lag_bytes").unwrap_or(0.0)));
            }

            families.extend(labeled_gauges(
                "pg_replication_replay_lag_seconds",
                "Replay lag reported by the replica",
                LABELS,
                &lag_seconds,
            )?);
            families.extend(labeled_gauges(
                "pg_replication_replay_lag_bytes",
                "WAL bytes not yet replayed by the replica",
                LABELS,
                &lag_bytes,
            )?);
        }

        Ok(families)
    }
}
