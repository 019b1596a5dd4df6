//! `stdout` output.

use std::io;

use crate::config::decode_plugin_config;
use crate::error::{PluginError, Result};
use crate::metric::Metric;
use crate::plugins::{Output, Plugin, PluginConfig};

use super::JsonLinesWriter;

pub const NAME: &str = "stdout";

#[derive(serde::Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct StdoutConfig {}

#[derive(Debug, Default)]
pub struct StdoutOutput;

impl Plugin for StdoutOutput {
    fn description(&self) -> &'static str {
        "Print metrics to standard output as JSON lines"
    }

    fn init(&mut self, config: &PluginConfig) -> Result<()> {
        decode_plugin_config::<StdoutConfig>(NAME, config)?;
        Ok(())
    }
}

impl Output for StdoutOutput {
    fn write(&mut self, metrics: &[Metric]) -> Result<()> {
        JsonLinesWriter::new(io::stdout().lock())
            .write_batch(metrics)
            .map_err(|e| PluginError::unexpected(format!("stdout: {}", e)))
    }
}
