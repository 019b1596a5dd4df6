//! Numeric server settings from pg_settings.

use prometheus::proto::MetricFamily;

use crate::error::ScrapeError;
use crate::scraper::{Scraper, gauge, metric_name};
use crate::session::Session;

const SUBSYSTEM: &str = "global_variables";

const QUERY: &str = r#"
    SELECT name, setting, COALESCE(unit, '') AS unit, COALESCE(short_desc, '') AS short_desc
    FROM pg_settings
    WHERE vartype IN ('bool', 'integer', 'real')
    ORDER BY name
"#;

/// Exports every boolean and numeric setting as a gauge.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScrapeGlobalVariables;

impl Scraper for ScrapeGlobalVariables {
    fn name(&self) -> &'static str {
        SUBSYSTEM
    }

    fn help(&self) -> &'static str {
        "Collect numeric settings from pg_settings"
    }

    fn version(&self) -> f64 {
        8.0
    }

    fn scrape(&self, session: &mut dyn Session) -> Result<Vec<MetricFamily>, ScrapeError> {
        let mut families = Vec::new();
        for row in session.query(QUERY)? {
            let (Some(name), Some(value)) = (row.get("name"), row.get_f64("setting")) else {
                continue;
            };
            let unit = row.get("unit").unwrap_or("");
            let help = match (row.get("short_desc").unwrap_or(""), unit) {
                ("", _) => format!("pg_settings {}", name),
                (desc, "") => desc.to_string(),
                (desc, unit) => format!("{} [unit: {}]", desc, unit),
            };
            families.push(gauge(&metric_name(SUBSYSTEM, name), &help, value)?);
        }
        Ok(families)
    }
}
