//! Appending numeric values to a text file.
//!
//! Each value is written as `"{n} "`. Writes are best-effort: a failed
//! write is logged and recorded, and the remaining values are still
//! attempted. Only failing to open the file aborts the call. The file
//! handle is owned by the call and closed on every exit path.

use crate::error::Result;
use std::fmt::Display;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Options for [`write_scores`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOptions {
    /// Remove an existing file before appending.
    pub replace_existing: bool,
}

impl Default for AppendOptions {
    fn default() -> Self {
        Self {
            replace_existing: true,
        }
    }
}

/// A value that could not be written.
#[derive(Debug)]
pub struct WriteFailure {
    pub index: usize,
    pub error: io::Error,
}

/// Outcome of an append run.
#[derive(Debug, Default)]
pub struct AppendReport {
    pub written: usize,
    pub failures: Vec<WriteFailure>,
}

impl AppendReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Write each value to `out`, continuing past failures.
pub fn append_each<W: Write, T: Display>(out: &mut W, values: &[T]) -> AppendReport {
    let mut report = AppendReport::default();
    for (index, value) in values.iter().enumerate() {
        // One write per value, so a value lands whole or not at all.
        let text = format!("{value} ");
        match out.write_all(text.as_bytes()) {
            Ok(()) => report.written += 1,
            Err(error) => {
                warn!(index, %value, %error, "failed to write value");
                report.failures.push(WriteFailure { index, error });
            }
        }
    }
    if let Err(error) = out.flush() {
        warn!(%error, "failed to flush output");
    }
    report
}

/// Append `values` to the file at `path`, creating it if needed.
pub fn write_scores<T: Display>(
    path: impl AsRef<Path>,
    values: &[T],
    options: AppendOptions,
) -> Result<AppendReport> {
    let path = path.as_ref();

    if options.replace_existing && path.exists() {
        fs::remove_file(path)?;
        debug!(path = %path.display(), "removed existing file");
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let report = append_each(&mut file, values);
    debug!(
        path = %path.display(),
        written = report.written,
        failed = report.failures.len(),
        "appended values"
    );
    Ok(report)
}
