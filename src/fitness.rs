//! Lexicographic fitness ordering used by selection.
//!
//! Any reduction in violation count dominates any objective gain; among
//! equally-violating pairs smaller total magnitude wins; only then does the
//! objective decide. Violations are deliberately not folded into a scalar
//! penalty, so feasibility recovery always outranks risk minimization.

use std::cmp::Ordering;

use crate::evaluator::Evaluation;

/// The lexicographic selection key `(violations, magnitude, objective)`.
#[derive(Debug, Clone, Copy)]
pub struct Fitness {
    /// Exclusion violations plus violated (resource, period) pairs.
    pub violations: u64,
    /// Total resource-violation magnitude.
    pub magnitude: f64,
    /// Blended risk objective.
    pub objective: f64,
}

impl Fitness {
    /// Projects an evaluation onto its selection key.
    pub fn of(evaluation: &Evaluation) -> Self {
        Self {
            violations: evaluation.exclusions_violated + evaluation.resource_periods_violated,
            magnitude: evaluation.resource_violation_magnitude,
            objective: evaluation.objective,
        }
    }
}

impl PartialEq for Fitness {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Fitness {}

impl PartialOrd for Fitness {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fitness {
    fn cmp(&self, other: &Self) -> Ordering {
        self.violations
            .cmp(&other.violations)
            .then_with(|| self.magnitude.total_cmp(&other.magnitude))
            .then_with(|| self.objective.total_cmp(&other.objective))
    }
}
