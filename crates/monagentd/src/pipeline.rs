//! Fixed pipeline of plugin instances driven once per interval.

use monagent_core::config::{AgentConfig, PluginSpec};
use monagent_core::plugins::{
    Exporter, Input, Manager, Output, PluginFamily, PluginInstance, PluginManagers, Processor,
};
use monagent_core::response::{AgentResponse, Payload, build_response};
use monagent_core::{Metric, PluginError, Result};
use tracing::{debug, info, warn};

/// Outcome of one collection cycle.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub metrics: Vec<Metric>,
    pub errors: Vec<PluginError>,
}

impl CycleReport {
    /// Envelope for the cycle: the first error if any plugin failed,
    /// otherwise the collected metrics.
    pub fn into_response(self) -> AgentResponse {
        if let Some(err) = self.errors.first() {
            return build_response(Payload::Empty, Some(err));
        }
        match Payload::sequence(&self.metrics) {
            Ok(payload) => build_response(payload, None),
            Err(e) => build_response(Payload::Empty, Some(&e)),
        }
    }
}

#[derive(Default)]
pub struct Pipeline {
    inputs: Vec<PluginInstance<dyn Input>>,
    processors: Vec<PluginInstance<dyn Processor>>,
    outputs: Vec<PluginInstance<dyn Output>>,
    exporters: Vec<PluginInstance<dyn Exporter>>,
}

fn instantiate<P: ?Sized + PluginFamily>(
    manager: &Manager<P>,
    spec: &PluginSpec,
) -> Result<PluginInstance<P>> {
    let mut instance = manager.get_plugin(&spec.name)?;
    instance.init(&spec.config)?;
    info!(kind = %P::KIND, plugin = %spec.name, "plugin ready");
    Ok(instance)
}

impl Pipeline {
    /// Builds and initializes every configured plugin. On failure the
    /// instances built so far are closed before the error is returned.
    pub fn build(managers: &PluginManagers, config: &AgentConfig) -> Result<Self> {
        let mut pipeline = Pipeline::default();
        if let Err(e) = pipeline.populate(managers, config) {
            pipeline.close();
            return Err(e);
        }
        Ok(pipeline)
    }

    fn populate(&mut self, managers: &PluginManagers, config: &AgentConfig) -> Result<()> {
        for spec in &config.inputs {
            self.inputs.push(instantiate(managers.input(), spec)?);
        }
        for spec in &config.processors {
            self.processors.push(instantiate(managers.processor(), spec)?);
        }
        for spec in &config.outputs {
            self.outputs.push(instantiate(managers.output(), spec)?);
        }
        for spec in &config.exporters {
            self.exporters.push(instantiate(managers.exporter(), spec)?);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inputs.len() + self.processors.len() + self.outputs.len() + self.exporters.len()
    }

    /// Collects from every input and exporter, runs the batch through the
    /// processors in order, then hands it to every output.
    ///
    /// A failing plugin is logged and recorded in the report; the rest of
    /// the cycle continues. A failing processor leaves the batch unchanged.
    pub fn run_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();

        for input in &mut self.inputs {
            match input.collect() {
                Ok(metrics) => report.metrics.extend(metrics),
                Err(e) => {
                    warn!(plugin = input.name(), error = %e, "input failed");
                    report.errors.push(e);
                }
            }
        }
        for exporter in &mut self.exporters {
            match exporter.collect() {
                Ok(metrics) => report.metrics.extend(metrics),
                Err(e) => {
                    warn!(plugin = exporter.name(), error = %e, "exporter failed");
                    report.errors.push(e);
                }
            }
        }

        for processor in &mut self.processors {
            match processor.process(report.metrics.clone()) {
                Ok(metrics) => report.metrics = metrics,
                Err(e) => {
                    warn!(plugin = processor.name(), error = %e, "processor failed");
                    report.errors.push(e);
                }
            }
        }

        for output in &mut self.outputs {
            if let Err(e) = output.write(&report.metrics) {
                warn!(plugin = output.name(), error = %e, "output failed");
                report.errors.push(e);
            }
        }

        debug!(
            metrics = report.metrics.len(),
            errors = report.errors.len(),
            "cycle complete"
        );
        report
    }

    /// Closes every instance. Errors are logged.
    pub fn close(&mut self) {
        fn close_all<P: ?Sized + PluginFamily>(instances: &mut Vec<PluginInstance<P>>) {
            for mut instance in instances.drain(..) {
                if let Err(e) = instance.close() {
                    warn!(kind = %P::KIND, plugin = instance.name(), error = %e, "close failed");
                }
            }
        }

        close_all(&mut self.inputs);
        close_all(&mut self.exporters);
        close_all(&mut self.processors);
        close_all(&mut self.outputs);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use monagent_core::plugins::{Plugin, PluginConfig, PluginKind, register_builtin_plugins};
    use serde_json::json;

    use super::*;

    struct FixedInput;

    impl Plugin for FixedInput {
        fn description(&self) -> &'static str {
            "fixed"
        }

        fn init(&mut self, _config: &PluginConfig) -> Result<()> {
            Ok(())
        }
    }

    impl Input for FixedInput {
        fn collect(&mut self) -> Result<Vec<Metric>> {
            Ok(vec![Metric::gauge("a", 1.0), Metric::gauge("b", 2.0)])
        }
    }

    #[derive(Clone, Default)]
    struct CaptureOutput {
        written: Arc<Mutex<Vec<Metric>>>,
    }

    impl Plugin for CaptureOutput {
        fn description(&self) -> &'static str {
            "capture"
        }

        fn init(&mut self, _config: &PluginConfig) -> Result<()> {
            Ok(())
        }
    }

    impl Output for CaptureOutput {
        fn write(&mut self, metrics: &[Metric]) -> Result<()> {
            self.written.lock().unwrap().extend_from_slice(metrics);
            Ok(())
        }
    }

    fn managers(capture: &CaptureOutput) -> PluginManagers {
        let managers = PluginManagers::new();
        register_builtin_plugins(&managers).unwrap();
        managers.input().register("fixed", || Box::new(FixedInput)).unwrap();
        let capture = capture.clone();
        managers
            .output()
            .register("capture", move || Box::new(capture.clone()))
            .unwrap();
        managers
    }

    fn spec(name: &str, config: PluginConfig) -> PluginSpec {
        PluginSpec {
            name: name.to_string(),
            config,
        }
    }

    #[test]
    fn cycle_runs_inputs_processors_outputs() {
        let capture = CaptureOutput::default();
        let managers = managers(&capture);
        let config = AgentConfig {
            inputs: vec![spec("fixed", PluginConfig::Null)],
            processors: vec![spec(
                "relabel",
                json!({ "addLabels": { "host": "db1" }, "dropNames": ["b"] }),
            )],
            outputs: vec![spec("capture", PluginConfig::Null)],
            exporters: Vec::new(),
        };

        let mut pipeline = Pipeline::build(&managers, &config).unwrap();
        assert_eq!(pipeline.len(), 3);
        let report = pipeline.run_cycle();
        pipeline.close();

        assert!(report.errors.is_empty());
        let written = capture.written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].name(), "a");
        assert_eq!(written[0].label("host"), Some("db1"));
    }

    #[test]
    fn unknown_plugin_fails_build() {
        let capture = CaptureOutput::default();
        let managers = managers(&capture);
        let config = AgentConfig {
            inputs: vec![spec("fixed", PluginConfig::Null)],
            processors: vec![spec("nope", PluginConfig::Null)],
            ..Default::default()
        };

        let err = Pipeline::build(&managers, &config).err().unwrap();
        assert!(matches!(
            err,
            PluginError::NotFound { kind: PluginKind::Processor, ref name } if name == "nope"
        ));
    }

    #[test]
    fn failing_exporter_is_reported_in_response() {
        let capture = CaptureOutput::default();
        let managers = managers(&capture);
        let config = AgentConfig {
            inputs: vec![spec("fixed", PluginConfig::Null)],
            exporters: vec![spec("pgstat", json!({ "dsn": "host=127.0.0.1 port=1 connect_timeout=1" }))],
            ..Default::default()
        };

        let mut pipeline = Pipeline::build(&managers, &config).unwrap();
        let report = pipeline.run_cycle();
        pipeline.close();

        assert_eq!(report.metrics.len(), 2);
        assert_eq!(report.errors.len(), 1);
        let response = report.into_response();
        assert!(!response.successful);
        assert_eq!(response.status, 502);
        assert_eq!(response.error.unwrap().code, 2005);
    }

    #[test]
    fn successful_cycle_response_carries_contents() {
        let capture = CaptureOutput::default();
        let managers = managers(&capture);
        let config = AgentConfig {
            inputs: vec![spec("fixed", PluginConfig::Null)],
            ..Default::default()
        };

        let mut pipeline = Pipeline::build(&managers, &config).unwrap();
        let response = pipeline.run_cycle().into_response();
        pipeline.close();

        assert!(response.successful);
        let contents = response.data.unwrap()["contents"].as_array().unwrap().len();
        assert_eq!(contents, 2);
    }
}
