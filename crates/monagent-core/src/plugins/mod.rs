//! Plugin contract, registry and managers.
//!
//! Four plugin kinds share one lifecycle:
//! - [`Input`] produces metrics from a local source
//! - [`Processor`] transforms a batch of metrics
//! - [`Output`] delivers a batch somewhere
//! - [`Exporter`] produces metrics by driving an external collector
//!
//! Plugins are registered by name into a per-kind [`Manager`]; every
//! lookup builds a fresh instance wrapped in a [`PluginInstance`], which
//! enforces the `created -> ready -> closed` state machine.

mod builtin;
mod lifecycle;
mod manager;
mod registry;

use serde::Serialize;

use crate::error::Result;
use crate::metric::Metric;

pub use builtin::register_builtin_plugins;
pub use lifecycle::{LifecycleState, PluginInstance};
pub use manager::{
    ExporterManager, InputManager, Manager, OutputManager, PluginManagers, ProcessorManager,
    process_managers,
};
pub use registry::{Factory, Registry};

/// Configuration handed to [`Plugin::init`].
pub type PluginConfig = serde_json::Value;

/// Plugin kinds. Each kind has its own name space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginKind {
    Input,
    Processor,
    Output,
    Exporter,
}

impl PluginKind {
    pub const ALL: [PluginKind; 4] = [
        PluginKind::Input,
        PluginKind::Processor,
        PluginKind::Output,
        PluginKind::Exporter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PluginKind::Input => "input",
            PluginKind::Processor => "processor",
            PluginKind::Output => "output",
            PluginKind::Exporter => "exporter",
        }
    }
}

impl std::fmt::Display for PluginKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Operations common to all plugin kinds.
///
/// Callers never use these directly; [`PluginInstance`] checks the
/// lifecycle state before forwarding.
pub trait Plugin: Send {
    fn description(&self) -> &'static str;

    /// Example configuration as a JSON document.
    fn sample_config(&self) -> &'static str {
        "{}"
    }

    /// Applies configuration. Called at most once per instance.
    fn init(&mut self, config: &PluginConfig) -> Result<()>;

    /// Releases resources. Called at most once per instance.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

pub trait Input: Plugin {
    fn collect(&mut self) -> Result<Vec<Metric>>;
}

pub trait Processor: Plugin {
    fn process(&mut self, metrics: Vec<Metric>) -> Result<Vec<Metric>>;
}

pub trait Output: Plugin {
    fn write(&mut self, metrics: &[Metric]) -> Result<()>;
}

pub trait Exporter: Plugin {
    fn collect(&mut self) -> Result<Vec<Metric>>;
}

/// Ties a plugin trait object type to its [`PluginKind`].
pub trait PluginFamily: Plugin {
    const KIND: PluginKind;
}

impl PluginFamily for dyn Input {
    const KIND: PluginKind = PluginKind::Input;
}

impl PluginFamily for dyn Processor {
    const KIND: PluginKind = PluginKind::Processor;
}

impl PluginFamily for dyn Output {
    const KIND: PluginKind = PluginKind::Output;
}

impl PluginFamily for dyn Exporter {
    const KIND: PluginKind = PluginKind::Exporter;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_display_lowercase() {
        let names: Vec<String> = PluginKind::ALL.iter().map(|k| k.to_string()).collect();
        assert_eq!(names, ["input", "processor", "output", "exporter"]);
    }

    #[test]
    fn trait_objects_know_their_kind() {
        assert_eq!(<dyn Input as PluginFamily>::KIND, PluginKind::Input);
        assert_eq!(<dyn Exporter as PluginFamily>::KIND, PluginKind::Exporter);
    }
}
