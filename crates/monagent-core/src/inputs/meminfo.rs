//! `meminfo` input: memory usage from /proc/meminfo.

use std::sync::Arc;

use crate::config::decode_plugin_config;
use crate::error::{PluginError, Result};
use crate::metric::Metric;
use crate::plugins::{Input, Plugin, PluginConfig};

use super::parser::parse_meminfo;
use super::{FileSystem, ProcConfig, RealFs};

pub const NAME: &str = "meminfo";

pub struct MemInfoInput {
    fs: Arc<dyn FileSystem>,
    config: ProcConfig,
}

impl MemInfoInput {
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

impl Default for MemInfoInput {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for MemInfoInput {
    fn description(&self) -> &'static str {
        "Memory and swap usage from /proc/meminfo"
    }

    fn sample_config(&self) -> &'static str {
        r#"{ "procPath": "/proc" }"#
    }

    fn init(&mut self, config: &PluginConfig) -> Result<()> {
        self.config = decode_plugin_config(NAME, config)?;
        Ok(())
    }
}

impl Input for MemInfoInput {
    fn collect(&mut self) -> Result<Vec<Metric>> {
        let path = self.config.proc_path.join("meminfo");
        let content = self
            .fs
            .read_to_string(&path)
            .map_err(|e| PluginError::unexpected(format!("{}: {}", path.display(), e)))?;
        let fields = parse_meminfo(&content).map_err(PluginError::unexpected)?;

        Ok(fields
            .into_iter()
            .map(|(field, kb)| Metric::gauge(format!("node_memory_{field}_bytes"), (kb * 1024) as f64))
            .collect())
    }
}
