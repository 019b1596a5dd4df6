//! Per-kind plugin managers and the process-wide bundle holding them.

use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::error::Result;

use super::{Exporter, Input, Output, PluginFamily, PluginInstance, PluginKind, Processor, Registry};

/// Registration and lookup facade for one plugin kind.
pub struct Manager<P: ?Sized + PluginFamily> {
    registry: Registry<P>,
}

pub type InputManager = Manager<dyn Input>;
pub type ProcessorManager = Manager<dyn Processor>;
pub type OutputManager = Manager<dyn Output>;
pub type ExporterManager = Manager<dyn Exporter>;

impl<P: ?Sized + PluginFamily> Manager<P> {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
        }
    }

    pub fn kind(&self) -> PluginKind {
        P::KIND
    }

    /// Registers `factory` under `name`. Fails if the name is taken.
    pub fn register<F>(&self, name: &str, factory: F) -> Result<()>
    where
        F: Fn() -> Box<P> + Send + Sync + 'static,
    {
        self.registry.register(name, Arc::new(factory))?;
        debug!(kind = %P::KIND, plugin = name, "plugin registered");
        Ok(())
    }

    /// Returns a new, uninitialized instance of plugin `name`.
    pub fn get_plugin(&self, name: &str) -> Result<PluginInstance<P>> {
        self.registry.get_plugin(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.registry.names()
    }
}

impl<P: ?Sized + PluginFamily> Default for Manager<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// One manager per plugin kind, each built on first access.
///
/// Startup obtains the process-wide bundle from [`process_managers`] and
/// passes it by reference from there on.
#[derive(Default)]
pub struct PluginManagers {
    input: OnceLock<InputManager>,
    processor: OnceLock<ProcessorManager>,
    output: OnceLock<OutputManager>,
    exporter: OnceLock<ExporterManager>,
}

impl PluginManagers {
    pub const fn new() -> Self {
        Self {
            input: OnceLock::new(),
            processor: OnceLock::new(),
            output: OnceLock::new(),
            exporter: OnceLock::new(),
        }
    }

    pub fn input(&self) -> &InputManager {
        self.input.get_or_init(Manager::new)
    }

    pub fn processor(&self) -> &ProcessorManager {
        self.processor.get_or_init(Manager::new)
    }

    pub fn output(&self) -> &OutputManager {
        self.output.get_or_init(Manager::new)
    }

    pub fn exporter(&self) -> &ExporterManager {
        self.exporter.get_or_init(Manager::new)
    }

    /// Registered names of `kind`, sorted.
    pub fn names(&self, kind: PluginKind) -> Vec<String> {
        match kind {
            PluginKind::Input => self.input().names(),
            PluginKind::Processor => self.processor().names(),
            PluginKind::Output => self.output().names(),
            PluginKind::Exporter => self.exporter().names(),
        }
    }
}

/// The managers shared by the whole process.
pub fn process_managers() -> &'static PluginManagers {
    static MANAGERS: PluginManagers = PluginManagers::new();
    &MANAGERS
}
