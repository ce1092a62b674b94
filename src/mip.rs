//! The seed-oracle boundary.
//!
//! The engine optionally asks a mixed-integer relaxation for one feasible
//! assignment to replace the worst random individual. The oracle is opaque:
//! whatever it does internally, the engine consumes only a name-to-start
//! mapping, and every failure mode (no solver linked, timeout, infeasible
//! relaxation, malformed assignment) collapses to "no seed".

use thiserror::Error;

use crate::instance::Instance;
use crate::solution::Assignment;

/// Why a seed oracle produced no assignment.
#[derive(Debug, Error)]
#[error("seed oracle failed: {reason}")]
pub struct OracleError {
    /// Human-readable failure description.
    pub reason: String,
}

impl OracleError {
    /// Creates an error with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// An external solver that may provide one hot-start assignment.
pub trait SeedOracle {
    /// Attempts to produce a seed assignment within `timelimit` seconds
    /// (`<= 0` means unbounded).
    fn solve(
        &self,
        instance: &Instance,
        timelimit: f64,
        threads: usize,
        verbose: bool,
    ) -> std::result::Result<Assignment, OracleError>;
}

/// The stand-in oracle used when no MIP solver is linked in.
#[derive(Debug, Default)]
pub struct UnavailableSeedOracle;

impl SeedOracle for UnavailableSeedOracle {
    fn solve(
        &self,
        _instance: &Instance,
        _timelimit: f64,
        _threads: usize,
        _verbose: bool,
    ) -> std::result::Result<Assignment, OracleError> {
        Err(OracleError::new("no MIP solver linked"))
    }
}
