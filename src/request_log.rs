//! Per-day, append-only request log.
//!
//! Dispatch errors and controller messages are written here as single lines
//! tagged with the route, e.g. ` [app->list] {"status":404,...}`. This is
//! separate from `tracing` diagnostics: it is the log operators read to see
//! what API clients got wrong.

use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use tracing::warn;
use tracing_appender::rolling::{self, RollingFileAppender};

use crate::route::RouteDescriptor;

/// Destination of request log lines.
pub trait RequestLog: Send + Sync {
    /// Append one line. Implementations must not interleave concurrent lines.
    fn append_line(&self, line: &str);
}

/// Prefix `line` with the route tag.
#[must_use]
pub fn tagged_line(route: &RouteDescriptor, line: &str) -> String {
    format!(" {} {}", route.log_tag(), line)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Writes to `<dir>/<prefix>.<YYYY-MM-DD>`, rolling at midnight UTC.
pub struct DailyFileLog {
    writer: Mutex<RollingFileAppender>,
}

impl DailyFileLog {
    /// Open (creating `dir` if needed).
    pub fn new(dir: impl AsRef<Path>, prefix: &str) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating request log dir {}", dir.display()))?;
        Ok(Self {
            writer: Mutex::new(rolling::daily(dir, prefix)),
        })
    }
}

impl RequestLog for DailyFileLog {
    fn append_line(&self, line: &str) {
        let mut writer = lock(&self.writer);
        if let Err(e) = writeln!(writer, "{line}").and_then(|()| writer.flush()) {
            warn!(error = %e, "Failed to write request log line");
        }
    }
}

/// Keeps lines in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<String>>,
}

impl MemoryLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        lock(&self.lines).clone()
    }
}

impl RequestLog for MemoryLog {
    fn append_line(&self, line: &str) {
        lock(&self.lines).push(line.to_string());
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLog;

impl RequestLog for NullLog {
    fn append_line(&self, _line: &str) {}
}
