//! pg_stat_bgwriter collection (+ pg_stat_checkpointer on PG 17+).

use prometheus::proto::MetricFamily;

use crate::error::ScrapeError;
use crate::scraper::{Scraper, counter, metric_name};
use crate::session::Session;

const SUBSYSTEM: &str = "bgwriter";

/// Builds version-aware query for pg_stat_bgwriter.
///
/// PG 17 moved checkpoint counters to pg_stat_checkpointer and dropped
/// the backend write columns.
fn build_stat_bgwriter_query(server_version_num: Option<i32>) -> &'static str {
    if server_version_num.unwrap_or(0) >= 170000 {
        r#"
            SELECT
                COALESCE(c.num_timed, 0)::bigint AS checkpoints_timed,
                COALESCE(c.num_requested, 0)::bigint AS checkpoints_req,
                COALESCE(c.write_time, 0)::double precision AS checkpoint_write_time,
                COALESCE(c.sync_time, 0)::double precision AS checkpoint_sync_time,
                COALESCE(c.buffers_written, 0)::bigint AS buffers_checkpoint,
                COALESCE(b.buffers_clean, 0)::bigint AS buffers_clean,
                COALESCE(b.maxwritten_clean, 0)::bigint AS maxwritten_clean,
                COALESCE(b.buffers_alloc, 0)::bigint AS buffers_alloc
            FROM pg_stat_bgwriter b
            CROSS JOIN pg_stat_checkpointer c
        "#
    } else {
        r#"
            SELECT
                COALESCE(checkpoints_timed, 0)::bigint AS checkpoints_timed,
                COALESCE(checkpoints_req, 0)::bigint AS checkpoints_req,
                COALESCE(checkpoint_write_time, 0)::double precision AS checkpoint_write_time,
                COALESCE(checkpoint_sync_time, 0)::double precision AS checkpoint_sync_time,
                COALESCE(buffers_checkpoint, 0)::bigint AS buffers_checkpoint,
                COALESCE(buffers_clean, 0)::bigint AS buffers_clean,
                COALESCE(maxwritten_clean, 0)::bigint AS maxwritten_clean,
                COALESCE(buffers_backend, 0)::bigint AS buffers_backend,
                COALESCE(buffers_backend_fsync, 0)::bigint AS buffers_backend_fsync,
                COALESCE(buffers_alloc, 0)::bigint AS buffers_alloc
            FROM pg_stat_bgwriter
        "#
    }
}

/// Collects background writer and checkpoint counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScrapeBgwriter;

impl Scraper for ScrapeBgwriter {
    fn name(&self) -> &'static str {
        SUBSYSTEM
    }

    fn help(&self) -> &'static str {
        "Collect background writer and checkpointer counters"
    }

    fn version(&self) -> f64 {
        8.3
    }

    fn scrape(&self, session: &mut dyn Session) -> Result<Vec<MetricFamily>, ScrapeError> {
        let version_num = session.server_version_num();
        let rows = session.query(build_stat_bgwriter_query(version_num))?;
        let Some(row) = rows.first() else {
            return Ok(Vec::new());
        };

        let mut families = Vec::new();
        for column in row.columns() {
            if let Some(value) = row.get_f64(column) {
                let help = format!("pg_stat_bgwriter {}", column);
                families.push(counter(&metric_name(SUBSYSTEM, column), &help, value)?);
            }
        }
        Ok(families)
    }
}
