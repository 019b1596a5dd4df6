//! Built-in outputs. Both write one JSON document per metric per line.

mod file;
mod json_lines;
mod stdout;

pub use file::{FileConfig, FileOutput};
pub use json_lines::JsonLinesWriter;
pub use stdout::StdoutOutput;
