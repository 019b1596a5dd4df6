//! Built-in scrapers.
//!
//! | Scraper | Source | Min version | Default |
//! |---------|--------|-------------|---------|
//! | `global_status` | `pg_stat_database` totals | 9.2 | on |
//! | `global_variables` | `pg_settings` | 8.0 | on |
//! | `bgwriter` | `pg_stat_bgwriter` (+ `pg_stat_checkpointer`) | 8.3 | on |
//! | `replication_status` | `pg_stat_replication` | 10.0 | on |
//! | `database_size` | `pg_database_size()` | 8.1 | off |
//! | `activity` | `pg_stat_activity` | 10.0 | off |
//! | `locks` | `pg_locks` | 9.4 | off |
//! | `statements` | `pg_stat_statements` | 13.0 | off |

mod activity;
mod bgwriter;
mod database_size;
mod global_status;
mod global_variables;
mod locks;
mod replication;
mod statements;

use std::sync::Arc;

use crate::scraper::Scraper;

pub use activity::ScrapeActivity;
pub use bgwriter::ScrapeBgwriter;
pub use database_size::ScrapeDatabaseSize;
pub use global_status::ScrapeGlobalStatus;
pub use global_variables::ScrapeGlobalVariables;
pub use locks::ScrapeLocks;
pub use replication::ScrapeReplicationStatus;
pub use statements::ScrapeStatements;

/// All scrapers with whether each is enabled by default.
pub fn default_scrapers() -> Vec<(Arc<dyn Scraper>, bool)> {
    let table: [(Arc<dyn Scraper>, bool); 8] = [
        (Arc::new(ScrapeGlobalStatus), true),
        (Arc::new(ScrapeGlobalVariables), true),
        (Arc::new(ScrapeBgwriter), true),
        (Arc::new(ScrapeReplicationStatus), true),
        (Arc::new(ScrapeDatabaseSize), false),
        (Arc::new(ScrapeActivity), false),
        (Arc::new(ScrapeLocks), false),
        (Arc::new(ScrapeStatements), false),
    ];
    table.into()
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn scraper_names_are_unique() {
        let table = default_scrapers();
        let names: HashSet<&str> = table.iter().map(|(s, _)| s.name()).collect();
        assert_eq!(names.len(), table.len());
    }

    #[test]
    fn global_status_is_on_by_default() {
        let table = default_scrapers();
        let (_, enabled) = table
            .iter()
            .find(|(s, _)| s.name() == "global_status")
            .unwrap();
        assert!(*enabled);
    }
}
