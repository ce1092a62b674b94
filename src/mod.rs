//! Approximate solver for the ROADEF/EURO 2020 maintenance-planning problem.
//!
//! Given maintenance interventions with start-dependent durations, scenario
//! risk profiles and resource workloads, plus per-period resource bounds and
//! pairwise exclusions, the solver assigns each intervention a start time in
//! its feasible window. It minimizes a convex blend of mean risk and
//! quantile excess while driving constraint violations to zero, using a
//! Differential Evolution population search with lexicographic
//! `(violations, magnitude, objective)` fitness, optional MIP hot start and
//! parallel offspring evaluation.
//!
//! # Example
//!
//! ```rust
//! use mpp_solver::{DESettings, DifferentialEvolution, Instance};
//!
//! # fn main() -> mpp_solver::Result<()> {
//! let document = serde_json::json!({
//!     "T": 3, "Quantile": 0.5, "Alpha": 1.0,
//!     "Scenarios_number": [1, 1, 1],
//!     "Resources": {},
//!     "Interventions": {
//!         "I1": {
//!             "tmax": 3, "Delta": [1, 1, 1], "workload": {},
//!             "risk": { "1": { "1": [2.0] }, "2": { "2": [4.0] }, "3": { "3": [6.0] } }
//!         }
//!     }
//! });
//! let instance = Instance::from_document(&document)?;
//! let settings = DESettings {
//!     max_iterations: 25,
//!     ..DESettings::default()
//! };
//! let report = DifferentialEvolution::new(&instance, settings).solve()?;
//! assert_eq!(report.assignment.get("I1"), Some(1));
//! # Ok(())
//! # }
//! ```
#![warn(missing_docs)]

pub mod error;
pub use error::{MppError, Result};

pub mod evaluator;
pub mod fitness;
pub mod instance;
pub mod solution;

/// Bounded half-up rounding onto start-time windows.
pub mod bounded_round;
/// Resample-until-distinct pool index draws.
pub mod distinct_indices;
/// Uniform random pool initialization.
pub mod init_random;
/// DE/best/1 mutation.
pub mod mutant_best1;
/// DE/rand/1 mutation.
pub mod mutant_rand1;
/// Exponential (circular-segment) crossover.
pub mod crossover_exponential;

pub mod differential_evolution;
pub mod mip;
pub mod progress;

/// End-to-end scenario tests for the engine.
#[cfg(test)]
mod de_tests;

pub use differential_evolution::DifferentialEvolution;
pub use evaluator::{Evaluation, Evaluator};
pub use fitness::Fitness;
pub use instance::Instance;
pub use mip::{OracleError, SeedOracle, UnavailableSeedOracle};
pub use progress::{ProgressRecord, ProgressSink, StdoutProgress};
pub use solution::Assignment;

/// Settings of the differential-evolution engine.
///
/// Defaults follow the tuned configuration of the original solver; override
/// fields with struct-update syntax or through [`DESettingsBuilder`].
#[derive(Debug, Clone, Copy)]
pub struct DESettings {
    /// Number of individuals in the pool.
    pub pool_size: usize,
    /// Per-offspring probability of DE/best/1 over DE/rand/1 mutation.
    pub best1_ratio: f64,
    /// Scaling factor `F` applied to the difference vector.
    pub scaling_factor: f64,
    /// Decay `rho` of the exponential-crossover segment-length distribution.
    pub crossover_rho: f64,
    /// Wall-clock budget in seconds; `<= 0` means unbounded.
    pub timelimit: f64,
    /// Time limit handed to the seed oracle; `<= 0` means unbounded.
    pub mip_timelimit: f64,
    /// Generation cap; `<= 0` means unbounded.
    pub max_iterations: i64,
    /// Worker threads for offspring evaluation.
    pub threads: usize,
    /// Seed of the pseudo-random generator.
    pub seed: u64,
    /// Emit per-iteration progress records.
    pub verbose: bool,
}

impl Default for DESettings {
    fn default() -> Self {
        Self {
            pool_size: 36,
            best1_ratio: 0.37,
            scaling_factor: 0.16,
            crossover_rho: 0.30,
            timelimit: 900.0,
            mip_timelimit: -1.0,
            max_iterations: -1,
            threads: 2,
            seed: 0,
            verbose: false,
        }
    }
}

impl DESettings {
    /// Checks the settings against the engine's structural requirements.
    ///
    /// # Errors
    ///
    /// Returns a settings error when the pool cannot host four distinct
    /// mutation indices or a ratio lies outside its domain.
    pub fn validate(&self) -> Result<()> {
        if self.pool_size < 4 {
            return Err(MppError::PoolTooSmall {
                pool_size: self.pool_size,
            });
        }
        if !(0.0..=1.0).contains(&self.best1_ratio) {
            return Err(MppError::InvalidBest1Ratio {
                ratio: self.best1_ratio,
            });
        }
        if self.crossover_rho <= 0.0 || self.crossover_rho >= 1.0 {
            return Err(MppError::InvalidCrossoverRho {
                rho: self.crossover_rho,
            });
        }
        Ok(())
    }
}

/// Fluent builder for [`DESettings`].
#[derive(Debug, Default)]
pub struct DESettingsBuilder {
    settings: DESettings,
}

impl DESettingsBuilder {
    /// Creates a builder holding the defaults.
    pub fn new() -> Self {
        Self::default()
    }
    /// Sets the pool size.
    pub fn pool_size(mut self, v: usize) -> Self {
        self.settings.pool_size = v;
        self
    }
    /// Sets the DE/best/1 blend ratio.
    pub fn best1_ratio(mut self, v: f64) -> Self {
        self.settings.best1_ratio = v;
        self
    }
    /// Sets the mutation scaling factor.
    pub fn scaling_factor(mut self, v: f64) -> Self {
        self.settings.scaling_factor = v;
        self
    }
    /// Sets the exponential-crossover decay.
    pub fn crossover_rho(mut self, v: f64) -> Self {
        self.settings.crossover_rho = v;
        self
    }
    /// Sets the wall-clock budget in seconds.
    pub fn timelimit(mut self, v: f64) -> Self {
        self.settings.timelimit = v;
        self
    }
    /// Sets the seed-oracle time limit.
    pub fn mip_timelimit(mut self, v: f64) -> Self {
        self.settings.mip_timelimit = v;
        self
    }
    /// Sets the generation cap.
    pub fn max_iterations(mut self, v: i64) -> Self {
        self.settings.max_iterations = v;
        self
    }
    /// Sets the number of worker threads.
    pub fn threads(mut self, v: usize) -> Self {
        self.settings.threads = v;
        self
    }
    /// Sets the RNG seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.settings.seed = v;
        self
    }
    /// Enables or disables verbose progress records.
    pub fn verbose(mut self, v: bool) -> Self {
        self.settings.verbose = v;
        self
    }
    /// Validates and returns the settings.
    ///
    /// # Errors
    ///
    /// See [`DESettings::validate`].
    pub fn build(self) -> Result<DESettings> {
        self.settings.validate()?;
        Ok(self.settings)
    }
}

/// Result of a finished search: the best individual and its evaluation.
#[derive(Debug, Clone)]
pub struct DEReport {
    /// Best assignment found, name-keyed in instance order.
    pub assignment: Assignment,
    /// Full evaluation of the best assignment.
    pub evaluation: Evaluation,
    /// Selection key of the best assignment.
    pub fitness: Fitness,
    /// Generations completed.
    pub iterations: u64,
    /// Total solution evaluations performed.
    pub evaluations: u64,
    /// Wall-clock seconds spent.
    pub elapsed_seconds: f64,
}
