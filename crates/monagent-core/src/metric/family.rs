//! Flattening of Prometheus metric families into [`Metric`] records.

use chrono::{DateTime, TimeZone, Utc};
use pgstat_exporter::proto::{self, MetricFamily, MetricType};

use super::{Metric, MetricKind};

fn kind_of(field_type: MetricType) -> MetricKind {
    match field_type {
        MetricType::COUNTER => MetricKind::Counter,
        MetricType::GAUGE => MetricKind::Gauge,
        MetricType::SUMMARY => MetricKind::Summary,
        MetricType::HISTOGRAM => MetricKind::Histogram,
        MetricType::UNTYPED => MetricKind::Untyped,
    }
}

fn timestamp_of(sample: &proto::Metric, now: DateTime<Utc>) -> DateTime<Utc> {
    match sample.get_timestamp_ms() {
        0 => now,
        ms => Utc.timestamp_millis_opt(ms).single().unwrap_or(now),
    }
}

fn format_bound(bound: f64) -> String {
    if bound == f64::INFINITY {
        "+Inf".to_string()
    } else if bound == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        bound.to_string()
    }
}

/// Converts one family into one record per sample.
///
/// Counters, gauges and untyped series yield one record per labeled
/// sample. Histograms yield `<name>_bucket` records labeled with `le`
/// plus `<name>_sum` and `<name>_count`; summaries yield `<name>` records
/// labeled with `quantile` plus `<name>_sum` and `<name>_count`.
/// Samples without a timestamp are stamped with the current time.
pub fn from_metric_family(family: &MetricFamily) -> Vec<Metric> {
    let name = family.get_name();
    let kind = kind_of(family.get_field_type());
    let now = Utc::now();
    let mut out = Vec::with_capacity(family.get_metric().len());

    for sample in family.get_metric() {
        let ts = timestamp_of(sample, now);
        let base = |metric_name: String, value: f64| {
            sample
                .get_label()
                .iter()
                .fold(Metric::at(metric_name, value, kind, ts), |m, pair| {
                    m.with_label(pair.get_name(), pair.get_value())
                })
        };

        match kind {
            MetricKind::Counter => out.push(base(name.to_string(), sample.get_counter().get_value())),
            MetricKind::Gauge => out.push(base(name.to_string(), sample.get_gauge().get_value())),
            MetricKind::Untyped => out.push(base(name.to_string(), sample.get_untyped().get_value())),
            MetricKind::Histogram => {
                let histogram = sample.get_histogram();
                for bucket in histogram.get_bucket() {
                    out.push(
                        base(format!("{name}_bucket"), bucket.get_cumulative_count() as f64)
                            .with_label("le", format_bound(bucket.get_upper_bound())),
                    );
                }
                out.push(base(format!("{name}_sum"), histogram.get_sample_sum()));
                out.push(base(format!("{name}_count"), histogram.get_sample_count() as f64));
            }
            MetricKind::Summary => {
                let summary = sample.get_summary();
                for quantile in summary.get_quantile() {
                    out.push(
                        base(name.to_string(), quantile.get_value())
                            .with_label("quantile", quantile.get_quantile().to_string()),
                    );
                }
                out.push(base(format!("{name}_sum"), summary.get_sample_sum()));
                out.push(base(format!("{name}_count"), summary.get_sample_count() as f64));
            }
        }
    }

    out
}
