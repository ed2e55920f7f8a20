//! Output sinks for pipeline results.

use crate::error::Result;
use std::io::Write;

/// Receives rendered results one line at a time.
pub trait Sink {
    fn emit(&mut self, line: &str) -> Result<()>;

    /// Emit every item using its `Display` rendering.
    fn emit_all<T: std::fmt::Display>(&mut self, items: &[T]) -> Result<()>
    where
        Self: Sized,
    {
        for item in items {
            self.emit(&item.to_string())?;
        }
        Ok(())
    }
}

/// Writes lines to any `io::Write` (stdout, a file, a buffer).
pub struct WriterSink<W: Write> {
    out: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl WriterSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> Sink for WriterSink<W> {
    fn emit(&mut self, line: &str) -> Result<()> {
        writeln!(self.out, "{line}")?;
        Ok(())
    }
}

/// Keeps emitted lines in memory.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MemorySink {
    pub lines: Vec<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Sink for MemorySink {
    fn emit(&mut self, line: &str) -> Result<()> {
        self.lines.push(line.to_string());
        Ok(())
    }
}
