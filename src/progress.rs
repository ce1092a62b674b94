//! Per-iteration progress records and the sink they are delivered to.

use std::fmt;

/// One line of search progress, emitted after each generation when verbose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressRecord {
    /// Generation counter, 1-based.
    pub iteration: u64,
    /// Wall-clock seconds since the search started.
    pub elapsed_seconds: f64,
    /// Violated constraints of the pool best (exclusions + resource periods).
    pub violations: u64,
    /// Resource-violation magnitude of the pool best.
    pub magnitude: f64,
    /// Objective of the pool best.
    pub objective: f64,
}

impl fmt::Display for ProgressRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {:.5} | {} | {:.5} | {:.7}",
            self.iteration, self.elapsed_seconds, self.violations, self.magnitude, self.objective
        )
    }
}

/// Receives progress records; the engine treats this as an external sink.
pub trait ProgressSink {
    /// Delivers one record.
    fn emit(&mut self, record: &ProgressRecord);
}

/// The default sink: one record per line on standard output.
#[derive(Debug, Default)]
pub struct StdoutProgress;

impl ProgressSink for StdoutProgress {
    fn emit(&mut self, record: &ProgressRecord) {
        println!("{record}");
    }
}
