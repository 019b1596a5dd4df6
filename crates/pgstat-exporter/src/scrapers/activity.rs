//! Session counts from pg_stat_activity.

use prometheus::proto::MetricFamily;

use crate::error::ScrapeError;
use crate::scraper::{Scraper, gauge, labeled_gauges};
use crate::session::Session;

const QUERY_SESSIONS: &str = r#"
    SELECT
        COALESCE(state, 'unknown') AS state,
        COALESCE(wait_event_type, '') AS wait_event_type,
        count(*)::bigint AS sessions
    FROM pg_stat_activity
    WHERE backend_type = 'client backend'
    GROUP BY 1, 2
    ORDER BY 1, 2
"#;

const QUERY_OLDEST_XACT: &str = r#"
    SELECT COALESCE(max(EXTRACT(EPOCH FROM now() - xact_start)), 0)::double precision AS oldest_xact_seconds
    FROM pg_stat_activity
    WHERE xact_start IS NOT NULL
"#;

/// Collects client sessions by state and wait event type.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScrapeActivity;

impl Scraper for ScrapeActivity {
    fn name(&self) -> &'static str {
        "activity"
    }

    fn help(&self) -> &'static str {
        "Collect session counts from pg_stat_activity"
    }

    fn version(&self) -> f64 {
        // backend_type and wait_event_type
        10.0
    }

    fn scrape(&self, session: &mut dyn Session) -> Result<Vec<MetricFamily>, ScrapeError> {
        let samples: Vec<(Vec<String>, f64)> = session
            .query(QUERY_SESSIONS)?
            .iter()
            .filter_map(|row| {
                Some((
                    vec![
                        row.get("state")?.to_string(),
                        row.get("wait_event_type").unwrap_or("").to_string(),
                    ],
                    row.get_f64("sessions")?,
                ))
            })
            .collect();

        let mut families: Vec<MetricFamily> = labeled_gauges(
            "pg_activity_sessions",
            "Client sessions by state and wait event type",
            &["state", "wait_event_type"],
            &samples,
        )?
        .into_iter()
        .collect();

        let oldest = session
            .query(QUERY_OLDEST_XACT)?
            .first()
            .and_then(|row| row.get_f64("oldest_xact_seconds"))
            .unwrap_or(0.0);
        families.push(gauge(
            "pg_activity_oldest_xact_seconds",
            "Age of the oldest open transaction",
            oldest,
        )?);

        Ok(families)
    }
}
