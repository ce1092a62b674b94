//! Error types for the maintenance-planning solver.
//!
//! One `thiserror` enum covers the whole crate: instance loading and
//! normalization, solution output, settings validation, and the internal
//! invariants of externally supplied assignments. Seed-oracle failures are
//! deliberately *not* represented here; they are absorbed at the engine
//! boundary (see [`crate::mip`]).

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the solver core.
#[derive(Debug, Error)]
pub enum MppError {
    /// The instance file could not be read.
    #[error("failed to read instance {path}: {source}")]
    InstanceRead {
        /// Path of the instance file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The instance file is not valid JSON.
    #[error("failed to parse instance {path}: {source}")]
    InstanceParse {
        /// Path of the instance file.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// The instance document does not have the expected shape.
    #[error("instance schema violation: {detail}")]
    Schema {
        /// What was expected and where.
        detail: String,
    },

    /// A numeric field stored as a string could not be coerced.
    #[error("cannot coerce {field} value {value:?} to a number")]
    Normalization {
        /// Dotted path of the offending field.
        field: String,
        /// The raw string value.
        value: String,
    },

    /// The solution file could not be created or written.
    #[error("failed to write solution {path}: {source}")]
    OutputWrite {
        /// Path of the solution file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An assignment does not cover every intervention.
    #[error("assignment is missing intervention {name}")]
    MissingIntervention {
        /// Name of the uncovered intervention.
        name: String,
    },

    /// An assignment places a start outside its feasible window.
    #[error("start {start} for {name} lies outside [1, {tmax}]")]
    StartOutOfWindow {
        /// Name of the intervention.
        name: String,
        /// The offending start time.
        start: i64,
        /// Latest allowed start.
        tmax: usize,
    },

    /// The pool is too small for DE/rand/1 mutation.
    #[error("pool size ({pool_size}) must be >= 4")]
    PoolTooSmall {
        /// The invalid pool size.
        pool_size: usize,
    },

    /// The best/1 blend ratio is outside [0, 1].
    #[error("best1 ratio ({ratio}) must be in [0, 1]")]
    InvalidBest1Ratio {
        /// The invalid ratio.
        ratio: f64,
    },

    /// The exponential-crossover decay is outside (0, 1).
    #[error("crossover rho ({rho}) must be in (0, 1)")]
    InvalidCrossoverRho {
        /// The invalid decay parameter.
        rho: f64,
    },

    /// The worker thread pool could not be created.
    #[error("failed to build worker thread pool: {detail}")]
    ThreadPool {
        /// Underlying builder error description.
        detail: String,
    },
}

/// A specialized `Result` type for solver operations.
pub type Result<T> = std::result::Result<T, MppError>;

impl MppError {
    /// Returns `true` if this error occurred while loading the instance.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            MppError::InstanceRead { .. }
                | MppError::InstanceParse { .. }
                | MppError::Schema { .. }
                | MppError::Normalization { .. }
        )
    }

    /// Returns `true` if this error reports a broken assignment invariant.
    pub fn is_invariant_error(&self) -> bool {
        matches!(
            self,
            MppError::MissingIntervention { .. } | MppError::StartOutOfWindow { .. }
        )
    }

    /// Returns `true` if this is a settings-validation error.
    pub fn is_settings_error(&self) -> bool {
        matches!(
            self,
            MppError::PoolTooSmall { .. }
                | MppError::InvalidBest1Ratio { .. }
                | MppError::InvalidCrossoverRho { .. }
        )
    }
}
