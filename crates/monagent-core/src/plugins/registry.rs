//! Name to factory map for one plugin kind.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{PluginError, Result};

use super::{PluginFamily, PluginInstance};

/// Builds a fresh, unconfigured plugin on every call.
pub type Factory<P> = Arc<dyn Fn() -> Box<P> + Send + Sync>;

/// Registered factories of one kind.
///
/// The lock is held only while the map is read or written; factories run
/// after it is released.
pub struct Registry<P: ?Sized + PluginFamily> {
    factories: RwLock<HashMap<String, Factory<P>>>,
}

impl<P: ?Sized + PluginFamily> Registry<P> {
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
        }
    }

    /// Adds a factory under `name`. An existing entry is kept and the call fails.
    pub fn register(&self, name: &str, factory: Factory<P>) -> Result<()> {
        let mut factories = self.factories.write().unwrap_or_else(PoisonError::into_inner);
        if factories.contains_key(name) {
            return Err(PluginError::DuplicateRegistration {
                kind: P::KIND,
                name: name.to_string(),
            });
        }
        factories.insert(name.to_string(), factory);
        Ok(())
    }

    /// Builds a new instance of the plugin registered under `name`.
    pub fn get_plugin(&self, name: &str) -> Result<PluginInstance<P>> {
        let factory = self
            .factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| PluginError::NotFound {
                kind: P::KIND,
                name: name.to_string(),
            })?;

        Ok(PluginInstance::new(name, factory()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.factories.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<P: ?Sized + PluginFamily> Default for Registry<P> {
    fn default() -> Self {
        Self::new()
    }
}
