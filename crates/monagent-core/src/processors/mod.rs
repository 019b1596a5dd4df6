//! Built-in processors.

mod relabel;

pub use relabel::{RelabelConfig, RelabelProcessor};
