//! Solution evaluation: objective decomposition and constraint violations.
//!
//! [`Evaluator`] is a pure function of the instance and an assignment. It
//! owns all scratch vectors (per-period scenario risk, per-resource usage)
//! and zero-fills them on every call, so repeated evaluation allocates
//! nothing. The engine builds one evaluator per worker thread.

use ndarray::ArrayView1;

use crate::error::Result;
use crate::instance::Instance;
use crate::solution::Assignment;

/// Symmetric slack applied to both resource bounds.
const TOLERANCE: f64 = 1e-5;

/// The full evaluation of one assignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// `alpha * mean_risk + (1 - alpha) * excess_risk`.
    pub objective: f64,
    /// Mean risk averaged over periods.
    pub mean_risk: f64,
    /// Expected excess (quantile tail risk) averaged over periods.
    pub excess_risk: f64,
    /// Number of (exclusion, season period) violations.
    pub exclusions_violated: u64,
    /// Number of (resource, period) bound violations.
    pub resource_periods_violated: u64,
    /// Total amount by which resource bounds are exceeded or undershot.
    pub resource_violation_magnitude: f64,
}

/// Evaluates assignments against one instance, reusing scratch buffers.
pub struct Evaluator<'a> {
    instance: &'a Instance,
    /// `risk[t - 1][k]` accumulates scenario `k` risk at period `t`.
    risk: Vec<Vec<f64>>,
    /// Raw per-period risk sums (over all scenarios).
    period_sum: Vec<f64>,
    /// `usage[r][t - 1]` accumulates resource `r` usage at period `t`.
    usage: Vec<Vec<f64>>,
}

impl<'a> Evaluator<'a> {
    /// Creates an evaluator with preallocated scratch for `instance`.
    pub fn new(instance: &'a Instance) -> Self {
        let risk = instance
            .scenario_counts()
            .iter()
            .map(|&s| vec![0.0; s])
            .collect();
        let period_sum = vec![0.0; instance.horizon()];
        let usage = instance
            .resources()
            .iter()
            .map(|_| vec![0.0; instance.horizon()])
            .collect();
        Self {
            instance,
            risk,
            period_sum,
            usage,
        }
    }

    /// Evaluates a start-time vector in instance intervention order.
    ///
    /// # Panics
    ///
    /// Panics if the vector does not cover every intervention or places a
    /// start outside its feasible window. The engine's operators preserve
    /// both invariants by construction, so a panic here indicates a bug.
    pub fn evaluate(&mut self, starts: ArrayView1<'_, i64>) -> Evaluation {
        let instance = self.instance;
        assert_eq!(
            starts.len(),
            instance.intervention_count(),
            "assignment covers {} interventions, instance has {}",
            starts.len(),
            instance.intervention_count()
        );

        for row in &mut self.risk {
            row.fill(0.0);
        }
        self.period_sum.fill(0.0);
        for row in &mut self.usage {
            row.fill(0.0);
        }

        // Accumulate scenario risk and resource usage over every active period.
        for (i, intervention) in instance.interventions().iter().enumerate() {
            let start = starts[i];
            assert!(
                start >= 1 && (start as usize) <= intervention.tmax,
                "start {start} for {} lies outside [1, {}]",
                intervention.name,
                intervention.tmax
            );
            let ts = start as usize;

            for (offset, contributions) in intervention.risk[ts - 1].iter().enumerate() {
                let t = ts + offset - 1;
                let row = &mut self.risk[t];
                for (k, &value) in contributions.iter().enumerate() {
                    row[k] += value;
                    self.period_sum[t] += value;
                }
            }

            for load in &intervention.workload {
                let usage = &mut self.usage[load.resource];
                for (offset, &amount) in load.amounts[ts - 1].iter().enumerate() {
                    usage[ts + offset - 1] += amount;
                }
            }
        }

        // Resource bounds; both sides can fail independently at a period.
        let mut resource_periods_violated: u64 = 0;
        let mut resource_violation_magnitude = 0.0;
        for (r, resource) in instance.resources().iter().enumerate() {
            let usage = &self.usage[r];
            for t in 0..instance.horizon() {
                let used = usage[t];
                if used > resource.max[t] + TOLERANCE {
                    resource_violation_magnitude += used - resource.max[t];
                    resource_periods_violated += 1;
                }
                if used < resource.min[t] - TOLERANCE {
                    resource_violation_magnitude += resource.min[t] - used;
                    resource_periods_violated += 1;
                }
            }
        }

        // Exclusions: count season periods inside the overlap of both
        // active intervals.
        let mut exclusions_violated: u64 = 0;
        for exclusion in instance.exclusions() {
            let ts_a = starts[exclusion.first] as usize;
            let ts_b = starts[exclusion.second] as usize;
            let end_a = ts_a + instance.interventions()[exclusion.first].delta[ts_a - 1] - 1;
            let end_b = ts_b + instance.interventions()[exclusion.second].delta[ts_b - 1] - 1;
            let overlap_start = ts_a.max(ts_b);
            let overlap_end = end_a.min(end_b);
            for &period in &instance.seasons()[exclusion.season].periods {
                if period >= overlap_start && period <= overlap_end {
                    exclusions_violated += 1;
                }
            }
        }

        // Objective: per-period mean and quantile excess. Periods without
        // scenarios contribute zero to both terms.
        let mut mean_risk = 0.0;
        let mut excess_risk = 0.0;
        for t in 0..instance.horizon() {
            let scenario_count = instance.scenario_counts()[t];
            if scenario_count == 0 {
                continue;
            }
            let period_mean = self.period_sum[t] / scenario_count as f64;
            mean_risk += period_mean;

            let k = (scenario_count as f64 * instance.quantile()).ceil() as usize;
            let row = &mut self.risk[t];
            let (_, quantile_value, _) = row.select_nth_unstable_by(k - 1, f64::total_cmp);
            excess_risk += (*quantile_value - period_mean).max(0.0);
        }
        mean_risk /= instance.horizon() as f64;
        excess_risk /= instance.horizon() as f64;
        let objective = instance.alpha() * mean_risk + (1.0 - instance.alpha()) * excess_risk;

        Evaluation {
            objective,
            mean_risk,
            excess_risk,
            exclusions_violated,
            resource_periods_violated,
            resource_violation_magnitude,
        }
    }

    /// Evaluates a name-keyed assignment, validating it first.
    ///
    /// Unlike [`evaluate`](Self::evaluate) this never panics on a malformed
    /// assignment; it is the entry point for externally produced solutions.
    pub fn evaluate_assignment(&mut self, assignment: &Assignment) -> Result<Evaluation> {
        let starts = assignment.to_starts(self.instance)?;
        Ok(self.evaluate(starts.view()))
    }
}
