use std::io::{self, Write};

use crate::metric::Metric;

/// Writes metrics as newline-delimited JSON.
pub struct JsonLinesWriter<W: Write> {
    inner: W,
}

impl<W: Write> JsonLinesWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Writes the batch and flushes.
    pub fn write_batch(&mut self, metrics: &[Metric]) -> io::Result<()> {
        for metric in metrics {
            serde_json::to_writer(&mut self.inner, metric)?;
            self.inner.write_all(b"\n")?;
        }
        self.inner.flush()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_line_per_metric() {
        let mut writer = JsonLinesWriter::new(Vec::new());
        writer
            .write_batch(&[
                Metric::gauge("a", 1.0).with_label("host", "db1"),
                Metric::counter("b", 2.0),
            ])
            .unwrap();

        let out = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["name"], "a");
        assert_eq!(first["labels"]["host"], "db1");
        assert_eq!(first["kind"], "gauge");
        let second: Metric = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.value(), 2.0);
    }
}
