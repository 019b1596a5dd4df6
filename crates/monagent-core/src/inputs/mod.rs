//! Built-in inputs reading the Linux procfs.

mod fs;
mod loadavg;
mod meminfo;
pub mod parser;

use std::path::PathBuf;

use serde::Deserialize;

pub use fs::{FileSystem, MockFs, RealFs};
pub use loadavg::LoadAvgInput;
pub use meminfo::MemInfoInput;

/// Configuration shared by procfs inputs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProcConfig {
    #[serde(default = "default_proc_path")]
    pub proc_path: PathBuf,
}

fn default_proc_path() -> PathBuf {
    PathBuf::from("/proc")
}

impl Default for ProcConfig {
    fn default() -> Self {
        Self {
            proc_path: default_proc_path(),
        }
    }
}
