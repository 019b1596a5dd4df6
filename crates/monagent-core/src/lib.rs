//! monagent-core — plugin backbone of the monagent monitoring agent.
//!
//! Provides:
//! - `metric` — the metric record model and Prometheus family flattening
//! - `plugins` — plugin traits, per-kind registries and managers, lifecycle guard
//! - `inputs`, `processors`, `outputs`, `exporters` — built-in plugins
//! - `response` — response envelope builder
//! - `config` — agent pipeline configuration
//!
//! # Usage
//!
//! ```ignore
//! use monagent_core::plugins::{process_managers, register_builtin_plugins};
//!
//! let managers = process_managers();
//! register_builtin_plugins(managers)?;
//!
//! let mut input = managers.input().get_plugin("loadavg")?;
//! input.init(&serde_json::json!({}))?;
//! let metrics = input.collect()?;
//! input.close()?;
//! ```

pub mod config;
pub mod error;
pub mod exporters;
pub mod inputs;
pub mod metric;
pub mod outputs;
pub mod plugins;
pub mod processors;
pub mod response;

pub use error::{ErrorCode, PluginError, Result};
pub use metric::{Metric, MetricKind};
