//! Agent pipeline configuration.
//!
//! The agent reads one JSON document naming the plugin instances to run:
//!
//! ```json
//! {
//!   "inputs":     [{ "name": "loadavg" }],
//!   "processors": [{ "name": "relabel", "config": { "addLabels": { "host": "db1" } } }],
//!   "outputs":    [{ "name": "stdout" }],
//!   "exporters":  [{ "name": "pgstat", "config": { "dsn": "host=localhost" } }]
//! }
//! ```

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{PluginError, Result};
use crate::plugins::PluginConfig;

/// One plugin instance in the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginSpec {
    pub name: String,
    #[serde(default)]
    pub config: PluginConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    pub inputs: Vec<PluginSpec>,
    pub processors: Vec<PluginSpec>,
    pub outputs: Vec<PluginSpec>,
    pub exporters: Vec<PluginSpec>,
}

impl AgentConfig {
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| PluginError::config("agent", e))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PluginError::config("agent", format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    /// Default pipeline used when no file is given: local inputs to stdout.
    pub fn local_defaults() -> Self {
        let spec = |name: &str| PluginSpec {
            name: name.to_string(),
            config: PluginConfig::Null,
        };
        Self {
            inputs: vec![spec("loadavg"), spec("meminfo")],
            processors: Vec::new(),
            outputs: vec![spec("stdout")],
            exporters: Vec::new(),
        }
    }
}

/// Decodes a plugin's configuration value. `null` decodes like `{}`.
pub fn decode_plugin_config<T: DeserializeOwned>(plugin: &str, config: &PluginConfig) -> Result<T> {
    let value = match config {
        PluginConfig::Null => PluginConfig::Object(Default::default()),
        other => other.clone(),
    };
    serde_json::from_value(value).map_err(|e| PluginError::config(plugin, e))
}
