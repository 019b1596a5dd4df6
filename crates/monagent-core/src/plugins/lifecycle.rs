//! Lifecycle guard around a plugin instance.

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{PluginError, Result};
use crate::metric::Metric;

use super::{Exporter, Input, Output, PluginConfig, PluginFamily, PluginKind, Processor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Created,
    Ready,
    Closed,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LifecycleState::Created => "created",
            LifecycleState::Ready => "ready",
            LifecycleState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// One plugin instance together with its lifecycle state.
///
/// `init` is accepted once, in `created`. Data operations (`collect`,
/// `process`, `write`) are accepted only in `ready`. `close` is accepted
/// in any state and only reaches the plugin the first time. An instance
/// whose `init` failed refuses everything except `close`.
///
/// A `ready` instance dropped without `close` is closed on drop.
pub struct PluginInstance<P: ?Sized + PluginFamily> {
    name: String,
    state: LifecycleState,
    init_failed: bool,
    plugin: Box<P>,
}

impl<P: ?Sized + PluginFamily> PluginInstance<P> {
    pub(crate) fn new(name: &str, plugin: Box<P>) -> Self {
        Self {
            name: name.to_string(),
            state: LifecycleState::Created,
            init_failed: false,
            plugin,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PluginKind {
        P::KIND
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn description(&self) -> &'static str {
        self.plugin.description()
    }

    pub fn sample_config(&self) -> &'static str {
        self.plugin.sample_config()
    }

    pub fn init(&mut self, config: &PluginConfig) -> Result<()> {
        if self.state != LifecycleState::Created || self.init_failed {
            return Err(self.violation("init"));
        }

        match self.plugin.init(config) {
            Ok(()) => {
                self.state = LifecycleState::Ready;
                debug!(kind = %P::KIND, plugin = %self.name, "plugin initialized");
                Ok(())
            }
            Err(e) => {
                self.init_failed = true;
                Err(e)
            }
        }
    }

    /// Closes the plugin. Repeated calls return `Ok(())` without reaching it.
    pub fn close(&mut self) -> Result<()> {
        if self.state == LifecycleState::Closed {
            return Ok(());
        }
        self.state = LifecycleState::Closed;
        debug!(kind = %P::KIND, plugin = %self.name, "plugin closed");
        self.plugin.close()
    }

    fn ensure_ready(&self, operation: &'static str) -> Result<()> {
        if self.state == LifecycleState::Ready && !self.init_failed {
            Ok(())
        } else {
            Err(self.violation(operation))
        }
    }

    fn violation(&self, operation: &'static str) -> PluginError {
        PluginError::LifecycleViolation {
            kind: P::KIND,
            name: self.name.clone(),
            operation,
            state: self.state,
        }
    }
}

impl PluginInstance<dyn Input> {
    pub fn collect(&mut self) -> Result<Vec<Metric>> {
        self.ensure_ready("collect")?;
        self.plugin.collect()
    }
}

impl PluginInstance<dyn Processor> {
    pub fn process(&mut self, metrics: Vec<Metric>) -> Result<Vec<Metric>> {
        self.ensure_ready("process")?;
        self.plugin.process(metrics)
    }
}

impl PluginInstance<dyn Output> {
    pub fn write(&mut self, metrics: &[Metric]) -> Result<()> {
        self.ensure_ready("write")?;
        self.plugin.write(metrics)
    }
}

impl PluginInstance<dyn Exporter> {
    pub fn collect(&mut self) -> Result<Vec<Metric>> {
        self.ensure_ready("collect")?;
        self.plugin.collect()
    }
}

impl<P: ?Sized + PluginFamily> Drop for PluginInstance<P> {
    fn drop(&mut self) {
        if self.state == LifecycleState::Ready {
            warn!(kind = %P::KIND, plugin = %self.name, "plugin dropped without close");
            if let Err(e) = self.close() {
                warn!(kind = %P::KIND, plugin = %self.name, error = %e, "close on drop failed");
            }
        }
    }
}

impl<P: ?Sized + PluginFamily> std::fmt::Debug for PluginInstance<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginInstance")
            .field("kind", &P::KIND)
            .field("name", &self.name)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::plugins::testing::ProbeInput;

    fn instance(probe: ProbeInput) -> PluginInstance<dyn Input> {
        PluginInstance::<dyn Input>::new("probe", Box::new(probe))
    }

    #[test]
    fn collect_before_init_is_a_violation() {
        let mut p = instance(ProbeInput::default());
        let err = p.collect().unwrap_err();
        assert_eq!(
            err,
            PluginError::LifecycleViolation {
                kind: PluginKind::Input,
                name: "probe".to_string(),
                operation: "collect",
                state: LifecycleState::Created,
            }
        );
    }

    #[test]
    fn init_then_collect_then_close() {
        let mut p = instance(ProbeInput::default());
        p.init(&json!({})).unwrap();
        assert_eq!(p.state(), LifecycleState::Ready);
        assert_eq!(p.collect().unwrap().len(), 1);
        p.close().unwrap();
        assert_eq!(p.state(), LifecycleState::Closed);
    }

    #[test]
    fn init_twice_is_a_violation() {
        let mut p = instance(ProbeInput::default());
        p.init(&json!({})).unwrap();
        assert!(matches!(
            p.init(&json!({})),
            Err(PluginError::LifecycleViolation { operation: "init", .. })
        ));
    }

    #[test]
    fn collect_after_close_is_a_violation() {
        let mut p = instance(ProbeInput::default());
        p.init(&json!({})).unwrap();
        p.close().unwrap();
        assert!(matches!(
            p.collect(),
            Err(PluginError::LifecycleViolation {
                state: LifecycleState::Closed,
                ..
            })
        ));
    }

    #[test]
    fn close_twice_reaches_plugin_once() {
        let closes = Arc::new(AtomicUsize::new(0));
        let mut p = instance(ProbeInput {
            closes: closes.clone(),
            ..Default::default()
        });
        p.init(&json!({})).unwrap();
        p.close().unwrap();
        p.close().unwrap();
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn close_from_created_is_allowed() {
        let closes = Arc::new(AtomicUsize::new(0));
        let mut p = instance(ProbeInput {
            closes: closes.clone(),
            ..Default::default()
        });
        p.close().unwrap();
        assert_eq!(p.state(), LifecycleState::Closed);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_close_still_closes() {
        let mut p = instance(ProbeInput {
            fail_close: true,
            ..Default::default()
        });
        p.init(&json!({})).unwrap();
        assert!(p.close().is_err());
        assert_eq!(p.state(), LifecycleState::Closed);
        assert!(p.close().is_ok());
    }

    #[test]
    fn failed_init_leaves_instance_unusable() {
        let mut p = instance(ProbeInput {
            fail_init: true,
            ..Default::default()
        });
        assert!(matches!(p.init(&json!({})), Err(PluginError::ConfigTranslation { .. })));
        assert_eq!(p.state(), LifecycleState::Created);
        assert!(matches!(
            p.init(&json!({})),
            Err(PluginError::LifecycleViolation { .. })
        ));
        assert!(p.collect().is_err());
        assert!(p.close().is_ok());
    }

    #[test]
    fn drop_closes_ready_instance() {
        let closes = Arc::new(AtomicUsize::new(0));
        {
            let mut p = instance(ProbeInput {
                closes: closes.clone(),
                ..Default::default()
            });
            p.init(&json!({})).unwrap();
        }
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }
}
