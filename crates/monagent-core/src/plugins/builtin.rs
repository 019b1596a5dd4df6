//! Registration of the plugins shipped with the agent.

use crate::error::Result;
use crate::exporters::{PgstatExporter, pgstat};
use crate::inputs::{LoadAvgInput, MemInfoInput};
use crate::outputs::{FileOutput, StdoutOutput};
use crate::processors::RelabelProcessor;

use super::PluginManagers;

/// Registers every built-in plugin. Must run once, before any lookup.
pub fn register_builtin_plugins(managers: &PluginManagers) -> Result<()> {
    managers.input().register("loadavg", || Box::new(LoadAvgInput::new()))?;
    managers.input().register("meminfo", || Box::new(MemInfoInput::new()))?;

    managers.processor().register("relabel", || Box::new(RelabelProcessor::default()))?;

    managers.output().register("stdout", || Box::new(StdoutOutput))?;
    managers.output().register("file", || Box::new(FileOutput::default()))?;

    managers.exporter().register(pgstat::NAME, || Box::new(PgstatExporter::new()))?;

    Ok(())
}
