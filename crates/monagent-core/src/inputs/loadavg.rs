//! `loadavg` input: system load averages and runnable task counts.

use std::sync::Arc;

use crate::config::decode_plugin_config;
use crate::error::{PluginError, Result};
use crate::metric::Metric;
use crate::plugins::{Input, Plugin, PluginConfig};

use super::parser::parse_loadavg;
use super::{FileSystem, ProcConfig, RealFs};

pub const NAME: &str = "loadavg";

pub struct LoadAvgInput {
    fs: Arc<dyn FileSystem>,
    config: ProcConfig,
}

impl LoadAvgInput {
    pub fn new() -> Self {
        Self::with_fs(Arc::new(RealFs::new()))
    }

    pub fn with_fs(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            config: ProcConfig::default(),
        }
    }
}

impl Default for LoadAvgInput {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for LoadAvgInput {
    fn description(&self) -> &'static str {
        "Load averages and task counts from /proc/loadavg"
    }

    fn sample_config(&self) -> &'static str {
        r#"{ "procPath": "/proc" }"#
    }

    fn init(&mut self, config: &PluginConfig) -> Result<()> {
        self.config = decode_plugin_config(NAME, config)?;
        Ok(())
    }
}

impl Input for LoadAvgInput {
    fn collect(&mut self) -> Result<Vec<Metric>> {
        let path = self.config.proc_path.join("loadavg");
        let content = self
            .fs
            .read_to_string(&path)
            .map_err(|e| PluginError::unexpected(format!("{}: {}", path.display(), e)))?;
        let load = parse_loadavg(&content).map_err(PluginError::unexpected)?;

        Ok(vec![
            Metric::gauge("node_load1", load.load1),
            Metric::gauge("node_load5", load.load5),
            Metric::gauge("node_load15", load.load15),
            Metric::gauge("node_procs_running", load.running as f64),
            Metric::gauge("node_procs_total", load.total as f64),
        ])
    }
}
