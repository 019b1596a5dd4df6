//! Exporter plugins wrapping external collector libraries.

pub mod pgstat;

pub use pgstat::{PgstatConfig, PgstatExporter};
