//! JSON output adapter.

use anyhow::Result;
use serde::Serialize;
use std::io::{self, Write};
use std::sync::Mutex;

/// JSON / JSON Lines output adapter.
pub struct JsonOutput {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonOutput {
    /// Creates a new JSON output writing to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Creates a new JSON output writing to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Writes one value as a single line.
    pub fn write<T: Serialize>(&self, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.write_line(&json)
    }

    /// Writes a value, optionally pretty-printed.
    pub fn write_document<T: Serialize + ?Sized>(&self, value: &T, pretty: bool) -> Result<()> {
        let json = if pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        self.write_line(&json)
    }

    #[allow(clippy::significant_drop_tightening)]
    fn write_line(&self, json: &str) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writeln!(writer, "{json}")?;
        Ok(())
    }

    #[allow(clippy::significant_drop_tightening)]
    pub fn flush(&self) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Writer that appends into a shared buffer.
    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Shared {
        fn text(&self) -> String {
            let bytes = self
                .0
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .clone();
            String::from_utf8(bytes).unwrap_or_default()
        }
    }

    #[test]
    fn test_lines_and_documents() {
        let buffer = Shared::default();
        let output = JsonOutput::new(Box::new(buffer.clone()));

        output.write(&serde_json::json!({"a": 1})).unwrap_or_else(|e| panic!("{e}"));
        output
            .write_document(&[1, 2], false)
            .unwrap_or_else(|e| panic!("{e}"));
        output.flush().unwrap_or_else(|e| panic!("{e}"));

        assert_eq!(buffer.text(), "{\"a\":1}\n[1,2]\n");
    }

    #[test]
    fn test_pretty_document() {
        let buffer = Shared::default();
        let output = JsonOutput::new(Box::new(buffer.clone()));
        output
            .write_document(&serde_json::json!({"a": 1}), true)
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(buffer.text(), "{\n  \"a\": 1\n}\n");
    }
}
