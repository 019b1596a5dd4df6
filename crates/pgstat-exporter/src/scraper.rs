//! The scraper contract and metric family helpers shared by all scrapers.

use prometheus::core::Collector;
use prometheus::proto::MetricFamily;
use prometheus::{Counter, CounterVec, Gauge, GaugeVec, Opts};

use crate::error::ScrapeError;
use crate::session::Session;

/// Metric name prefix for everything this crate emits.
pub const NAMESPACE: &str = "pg";

/// One discrete collection routine.
///
/// `version()` is the minimum server version the scraper's queries need;
/// the exporter skips scrapers whose version exceeds the server's.
pub trait Scraper: Send + Sync {
    /// Stable name, used in flag tables and logs.
    fn name(&self) -> &'static str;

    /// One-line description.
    fn help(&self) -> &'static str;

    /// Minimum server version as `major.minor`.
    fn version(&self) -> f64;

    /// Collects metric families over an open session.
    fn scrape(&self, session: &mut dyn Session) -> Result<Vec<MetricFamily>, ScrapeError>;
}

/// Replaces characters that are not valid in a metric name with `_`.
pub(crate) fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

/// `pg_<subsystem>_<name>`
pub(crate) fn metric_name(subsystem: &str, name: &str) -> String {
    format!("{}_{}_{}", NAMESPACE, subsystem, sanitize(name))
}

pub(crate) fn gauge(name: &str, help: &str, value: f64) -> Result<MetricFamily, ScrapeError> {
    let gauge = Gauge::with_opts(Opts::new(name, help))?;
    gauge.set(value);
    first_family(gauge.collect())
}

pub(crate) fn counter(name: &str, help: &str, value: f64) -> Result<MetricFamily, ScrapeError> {
    let counter = Counter::with_opts(Opts::new(name, help))?;
    counter.inc_by(value.max(0.0));
    first_family(counter.collect())
}

/// Builds one gauge family with a sample per label set. Returns `None` if there are no samples.
pub(crate) fn labeled_gauges(
    name: &str,
    help: &str,
    labels: &[&str],
    samples: &[(Vec<String>, f64)],
) -> Result<Option<MetricFamily>, ScrapeError> {
    if samples.is_empty() {
        return Ok(None);
    }
    let vec = GaugeVec::new(Opts::new(name, help), labels)?;
    for (values, value) in samples {
        let values: Vec<&str> = values.iter().map(String::as_str).collect();
        vec.get_metric_with_label_values(&values)?.set(*value);
    }
    first_family(vec.collect()).map(Some)
}

/// Builds one counter family with a sample per label set. Returns `None` if there are no samples.
pub(crate) fn labeled_counters(
    name: &str,
    help: &str,
    labels: &[&str],
    samples: &[(Vec<String>, f64)],
) -> Result<Option<MetricFamily>, ScrapeError> {
    if samples.is_empty() {
        return Ok(None);
    }
    let vec = CounterVec::new(Opts::new(name, help), labels)?;
    for (values, value) in samples {
        let values: Vec<&str> = values.iter().map(String::as_str).collect();
        vec.get_metric_with_label_values(&values)?
            .inc_by(value.max(0.0));
    }
    first_family(vec.collect()).map(Some)
}

fn first_family(families: Vec<MetricFamily>) -> Result<MetricFamily, ScrapeError> {
    families
        .into_iter()
        .next()
        .ok_or_else(|| ScrapeError::Metric("collector produced no family".to_string()))
}
