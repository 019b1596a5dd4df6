//! `relabel` processor: adds fixed labels and drops series by name.

use std::collections::{BTreeMap, HashSet};

use serde::Deserialize;

use crate::config::decode_plugin_config;
use crate::error::Result;
use crate::metric::Metric;
use crate::plugins::{Plugin, PluginConfig, Processor};

pub const NAME: &str = "relabel";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct RelabelConfig {
    /// Labels set on every record, overriding existing values.
    pub add_labels: BTreeMap<String, String>,
    /// Label keys removed from every record.
    pub drop_labels: Vec<String>,
    /// Records with these names are dropped.
    pub drop_names: HashSet<String>,
    /// Prepended to every surviving record name.
    pub name_prefix: Option<String>,
}

#[derive(Debug, Default)]
pub struct RelabelProcessor {
    config: RelabelConfig,
}

impl Plugin for RelabelProcessor {
    fn description(&self) -> &'static str {
        "Add or remove labels, drop series by name"
    }

    fn sample_config(&self) -> &'static str {
        r#"{ "addLabels": { "host": "db1" }, "dropLabels": [], "dropNames": ["node_procs_total"] }"#
    }

    fn init(&mut self, config: &PluginConfig) -> Result<()> {
        self.config = decode_plugin_config(NAME, config)?;
        Ok(())
    }
}

impl Processor for RelabelProcessor {
    fn process(&mut self, metrics: Vec<Metric>) -> Result<Vec<Metric>> {
        let config = &self.config;
        Ok(metrics
            .into_iter()
            .filter(|m| !config.drop_names.contains(m.name()))
            .map(|m| {
                let m = config
                    .add_labels
                    .iter()
                    .fold(m, |m, (k, v)| m.with_label(k.as_str(), v.as_str()));
                let m = config.drop_labels.iter().fold(m, |m, k| m.without_label(k));
                match &config.name_prefix {
                    Some(prefix) => {
                        let name = format!("{}{}", prefix, m.name());
                        m.with_name(name)
                    }
                    None => m,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn adds_and_drops() {
        let mut p = RelabelProcessor::default();
        p.init(&json!({
            "addLabels": { "host": "db1" },
            "dropLabels": ["pid"],
            "dropNames": ["noise"],
            "namePrefix": "agent_"
        }))
        .unwrap();

        let out = p
            .process(vec![
                Metric::gauge("load1", 0.5).with_label("pid", "7"),
                Metric::gauge("noise", 1.0),
            ])
            .unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name(), "agent_load1");
        assert_eq!(out[0].label("host"), Some("db1"));
        assert_eq!(out[0].label("pid"), None);
    }

    #[test]
    fn empty_config_passes_through() {
        let mut p = RelabelProcessor::default();
        p.init(&PluginConfig::Null).unwrap();
        let input = vec![Metric::counter("c", 2.0).with_label("a", "b")];
        assert_eq!(p.process(input.clone()).unwrap(), input);
    }
}
