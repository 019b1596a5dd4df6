//! `file` output: appends JSON lines to a file.

use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::info;

use crate::config::decode_plugin_config;
use crate::error::{PluginError, Result};
use crate::metric::Metric;
use crate::plugins::{Output, Plugin, PluginConfig};

use super::JsonLinesWriter;

pub const NAME: &str = "file";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FileConfig {
    pub path: PathBuf,
    /// Truncate instead of appending when the file exists.
    #[serde(default)]
    pub truncate: bool,
}

#[derive(Default)]
pub struct FileOutput {
    writer: Option<JsonLinesWriter<BufWriter<File>>>,
    path: PathBuf,
}

impl Plugin for FileOutput {
    fn description(&self) -> &'static str {
        "Write metrics to a file as JSON lines"
    }

    fn sample_config(&self) -> &'static str {
        r#"{ "path": "/var/lib/monagent/metrics.jsonl", "truncate": false }"#
    }

    fn init(&mut self, config: &PluginConfig) -> Result<()> {
        let config: FileConfig = decode_plugin_config(NAME, config)?;
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(!config.truncate)
            .truncate(config.truncate)
            .open(&config.path)
            .map_err(|e| PluginError::config(NAME, format!("{}: {}", config.path.display(), e)))?;

        info!(path = %config.path.display(), "file output opened");
        self.writer = Some(JsonLinesWriter::new(BufWriter::new(file)));
        self.path = config.path;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer
                .into_inner()
                .into_inner()
                .map_err(|e| PluginError::unexpected(format!("{}: {}", self.path.display(), e.error())))?;
        }
        Ok(())
    }
}

impl Output for FileOutput {
    fn write(&mut self, metrics: &[Metric]) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| PluginError::unexpected("file output is not open"))?;
        writer
            .write_batch(metrics)
            .map_err(|e| PluginError::unexpected(format!("{}: {}", self.path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn appends_lines_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.jsonl");

        for value in [1.0, 2.0] {
            let mut out = FileOutput::default();
            out.init(&json!({ "path": path })).unwrap();
            out.write(&[Metric::gauge("x", value)]).unwrap();
            out.close().unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn truncate_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.jsonl");
        std::fs::write(&path, "old\nold\n").unwrap();

        let mut out = FileOutput::default();
        out.init(&json!({ "path": path, "truncate": true })).unwrap();
        out.write(&[Metric::gauge("x", 1.0)]).unwrap();
        out.close().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("old"));
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn missing_path_is_a_config_error() {
        let mut out = FileOutput::default();
        assert!(matches!(out.init(&json!({})), Err(PluginError::ConfigTranslation { .. })));
    }
}
