//! Injectable logging sink.
//!
//! Components never call the process-wide `log` macros directly. Each one is
//! handed a [`Diagnostics`] at construction time and reports through it, so a
//! caller decides where records go: the installed `log` logger
//! ([`Diagnostics::global`]), nowhere ([`Diagnostics::silent`]), or an
//! in-memory buffer ([`MemorySink`]).

use std::fmt;
use std::sync::{Arc, Mutex};

use log::{Level, Log, Metadata, Record};

/// A logging target paired with the sink that receives its records.
#[derive(Clone)]
pub struct Diagnostics {
    target: Arc<str>,
    sink: Arc<dyn Log>,
}

impl Diagnostics {
    /// Creates a handle writing to `sink` under `target`.
    pub fn new(target: &str, sink: Arc<dyn Log>) -> Self {
        Self {
            target: Arc::from(target),
            sink,
        }
    }

    /// Forwards to whatever logger is installed with the `log` facade.
    pub fn global(target: &str) -> Self {
        Self::new(target, Arc::new(GlobalSink))
    }

    /// Discards every record.
    pub fn silent() -> Self {
        Self::new("silent", Arc::new(NullSink))
    }

    /// Same sink, different target.
    pub fn scoped(&self, target: &str) -> Self {
        Self {
            target: Arc::from(target),
            sink: Arc::clone(&self.sink),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        let metadata = Metadata::builder()
            .level(level)
            .target(&self.target)
            .build();
        if !self.sink.enabled(&metadata) {
            return;
        }
        self.sink.log(
            &Record::builder()
                .metadata(metadata)
                .args(args)
                .module_path_static(Some(module_path!()))
                .build(),
        );
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args);
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

struct GlobalSink;

impl Log for GlobalSink {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level() && log::logger().enabled(metadata)
    }

    fn log(&self, record: &Record<'_>) {
        log::logger().log(record);
    }

    fn flush(&self) {
        log::logger().flush();
    }
}

struct NullSink;

impl Log for NullSink {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        false
    }

    fn log(&self, _record: &Record<'_>) {}

    fn flush(&self) {}
}

/// A captured log record.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedRecord {
    pub level: Level,
    pub target: String,
    pub message: String,
}

/// Sink that keeps every record at or above `min_level` in memory.
pub struct MemorySink {
    min_level: Level,
    records: Mutex<Vec<CapturedRecord>>,
}

impl MemorySink {
    pub fn new(min_level: Level) -> Arc<Self> {
        Arc::new(Self {
            min_level,
            records: Mutex::new(Vec::new()),
        })
    }

    /// Snapshot of everything captured so far.
    pub fn records(&self) -> Vec<CapturedRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn records_at(&self, level: Level) -> Vec<CapturedRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.level == level)
            .collect()
    }
}

impl Log for MemorySink {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.min_level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Ok(mut records) = self.records.lock() {
            records.push(CapturedRecord {
                level: record.level(),
                target: record.target().to_string(),
                message: record.args().to_string(),
            });
        }
    }

    fn flush(&self) {}
}
