//! End-to-end scenarios for the differential-evolution engine.

use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

use crate::evaluator::Evaluator;
use crate::fitness::Fitness;
use crate::instance::Instance;
use crate::mip::{OracleError, SeedOracle};
use crate::progress::{ProgressRecord, ProgressSink};
use crate::solution::Assignment;
use crate::{DESettings, DifferentialEvolution};

/// One intervention, three possible starts with increasing risk.
fn single_intervention_document() -> Value {
    json!({
        "T": 3,
        "Quantile": 0.5,
        "Alpha": 1.0,
        "Scenarios_number": [1, 1, 1],
        "Resources": {},
        "Interventions": {
            "I1": {
                "tmax": 3,
                "Delta": [1, 1, 1],
                "workload": {},
                "risk": { "1": { "1": [2.0] }, "2": { "2": [4.0] }, "3": { "3": [6.0] } }
            }
        }
    })
}

/// Two unit-duration interventions excluded everywhere; the overlapping
/// placements are cheaper than any feasible one.
fn feasibility_document() -> Value {
    json!({
        "T": 2,
        "Quantile": 0.5,
        "Alpha": 1.0,
        "Scenarios_number": [1, 1],
        "Resources": {},
        "Seasons": { "all": [1, 2] },
        "Interventions": {
            "A": {
                "tmax": 2,
                "Delta": [1, 1],
                "workload": {},
                "risk": { "1": { "1": [0.0] }, "2": { "2": [10.0] } }
            },
            "B": {
                "tmax": 2,
                "Delta": [1, 1],
                "workload": {},
                "risk": { "1": { "1": [0.0] }, "2": { "2": [10.0] } }
            }
        },
        "Exclusions": { "E1": ["A", "B", "all"] }
    })
}

/// A slightly larger instance with a resource and exclusions, used for the
/// determinism and trajectory scenarios.
fn search_document() -> Value {
    json!({
        "T": 6,
        "Quantile": 0.8,
        "Alpha": 0.6,
        "Scenarios_number": [2, 2, 2, 2, 2, 2],
        "Resources": {
            "crew": { "min": [0, 0, 0, 0, 0, 0], "max": [2.0, 2.0, 2.0, 2.0, 2.0, 2.0] }
        },
        "Seasons": { "winter": [1, 2], "summer": [4, 5, 6] },
        "Interventions": {
            "I1": {
                "tmax": 4,
                "Delta": [2, 2, 2, 2],
                "workload": {
                    "crew": {
                        "1": { "1": 1.0 }, "2": { "1": 1.0, "2": 1.0 }, "3": { "2": 1.0, "3": 1.0 },
                        "4": { "3": 1.0, "4": 1.0 }, "5": { "4": 1.0 }
                    }
                },
                "risk": {
                    "1": { "1": [4.0, 6.0] }, "2": { "1": [4.0, 6.0], "2": [3.0, 5.0] },
                    "3": { "2": [3.0, 5.0], "3": [2.0, 4.0] },
                    "4": { "3": [2.0, 4.0], "4": [1.0, 3.0] }, "5": { "4": [1.0, 3.0] }
                }
            },
            "I2": {
                "tmax": 5,
                "Delta": [2, 2, 2, 2, 2],
                "workload": {
                    "crew": {
                        "1": { "1": 2.0 }, "2": { "1": 2.0, "2": 2.0 }, "3": { "2": 2.0, "3": 2.0 },
                        "4": { "3": 2.0, "4": 2.0 }, "5": { "4": 2.0, "5": 2.0 }, "6": { "5": 2.0 }
                    }
                },
                "risk": {
                    "1": { "1": [5.0, 1.0] }, "2": { "1": [5.0, 1.0], "2": [4.0, 2.0] },
                    "3": { "2": [4.0, 2.0], "3": [3.0, 3.0] },
                    "4": { "3": [3.0, 3.0], "4": [2.0, 4.0] },
                    "5": { "4": [2.0, 4.0], "5": [1.0, 5.0] }, "6": { "5": [1.0, 5.0] }
                }
            },
            "I3": {
                "tmax": 6,
                "Delta": [1, 1, 1, 1, 1, 1],
                "workload": {
                    "crew": {
                        "1": { "1": 1.5 }, "2": { "2": 1.5 }, "3": { "3": 1.5 },
                        "4": { "4": 1.5 }, "5": { "5": 1.5 }, "6": { "6": 1.5 }
                    }
                },
                "risk": {
                    "1": { "1": [2.0, 2.0] }, "2": { "2": [2.5, 2.5] }, "3": { "3": [3.0, 3.0] },
                    "4": { "4": [3.5, 3.5] }, "5": { "5": [4.0, 4.0] }, "6": { "6": [4.5, 4.5] }
                }
            }
        },
        "Exclusions": {
            "E1": ["I1", "I2", "winter"],
            "E2": ["I2", "I3", "summer"]
        }
    })
}

fn quick_settings(seed: u64) -> DESettings {
    // A larger scaling factor than the production default: on the tiny test
    // lattices a scaled difference below 0.5 would always round back onto
    // the mutation base.
    DESettings {
        pool_size: 24,
        scaling_factor: 0.9,
        max_iterations: 40,
        threads: 1,
        seed,
        ..DESettings::default()
    }
}

struct CollectingSink(Arc<Mutex<Vec<ProgressRecord>>>);

impl ProgressSink for CollectingSink {
    fn emit(&mut self, record: &ProgressRecord) {
        self.0.lock().unwrap().push(*record);
    }
}

struct RaisingOracle;

impl SeedOracle for RaisingOracle {
    fn solve(
        &self,
        _instance: &Instance,
        _timelimit: f64,
        _threads: usize,
        _verbose: bool,
    ) -> Result<Assignment, OracleError> {
        Err(OracleError::new("relaxation blew up"))
    }
}

struct FixedOracle(Vec<(String, i64)>);

impl SeedOracle for FixedOracle {
    fn solve(
        &self,
        _instance: &Instance,
        _timelimit: f64,
        _threads: usize,
        _verbose: bool,
    ) -> Result<Assignment, OracleError> {
        Ok(Assignment::new(self.0.clone()))
    }
}

#[test]
fn test_single_intervention_finds_earliest_start() {
    let instance = Instance::from_document(&single_intervention_document()).unwrap();
    let report = DifferentialEvolution::new(&instance, quick_settings(0))
        .solve()
        .unwrap();

    assert_eq!(report.assignment.get("I1"), Some(1));
    assert_eq!(report.evaluation.objective, 2.0 / 3.0);
    assert_eq!(report.fitness.violations, 0);
}

#[test]
fn test_feasibility_dominates_objective() {
    let instance = Instance::from_document(&feasibility_document()).unwrap();
    let mut evaluator = Evaluator::new(&instance);

    // The overlapping placement really is cheaper.
    let overlapping = evaluator
        .evaluate_assignment(&Assignment::new(vec![("A".into(), 1), ("B".into(), 1)]))
        .unwrap();
    assert_eq!(overlapping.exclusions_violated, 1);
    assert_eq!(overlapping.objective, 0.0);

    let report = DifferentialEvolution::new(&instance, quick_settings(11))
        .solve()
        .unwrap();
    assert_eq!(report.fitness.violations, 0);
    assert_eq!(report.evaluation.objective, 5.0);
    assert_ne!(
        report.assignment.get("A").unwrap(),
        report.assignment.get("B").unwrap()
    );
}

#[test]
fn test_returned_starts_lie_in_windows() {
    let instance = Instance::from_document(&search_document()).unwrap();
    let report = DifferentialEvolution::new(&instance, quick_settings(3))
        .solve()
        .unwrap();
    for (i, name) in instance.intervention_names().enumerate() {
        let start = report.assignment.get(name).unwrap();
        assert!(
            start >= 1 && start as usize <= instance.tmax(i),
            "{name} starts at {start}"
        );
    }
}

#[test]
fn test_best_fitness_is_monotone() {
    let instance = Instance::from_document(&search_document()).unwrap();
    let records = Arc::new(Mutex::new(Vec::new()));
    let settings = DESettings {
        verbose: true,
        ..quick_settings(5)
    };
    DifferentialEvolution::new(&instance, settings)
        .with_progress(Box::new(CollectingSink(records.clone())))
        .solve()
        .unwrap();

    let records = records.lock().unwrap();
    assert_eq!(records.len(), 40);
    let keys: Vec<Fitness> = records
        .iter()
        .map(|r| Fitness {
            violations: r.violations,
            magnitude: r.magnitude,
            objective: r.objective,
        })
        .collect();
    for pair in keys.windows(2) {
        assert!(pair[1] <= pair[0], "fitness regressed: {pair:?}");
    }
}

#[test]
fn test_fixed_seed_runs_are_byte_identical() {
    let instance = Instance::from_document(&search_document()).unwrap();
    let dir = std::env::temp_dir();
    let first_path = dir.join(format!("mpp-det-a-{}.txt", std::process::id()));
    let second_path = dir.join(format!("mpp-det-b-{}.txt", std::process::id()));

    for path in [&first_path, &second_path] {
        let report = DifferentialEvolution::new(&instance, quick_settings(7))
            .solve()
            .unwrap();
        report.assignment.write_to(path).unwrap();
    }

    let first = std::fs::read(&first_path).unwrap();
    let second = std::fs::read(&second_path).unwrap();
    std::fs::remove_file(&first_path).unwrap();
    std::fs::remove_file(&second_path).unwrap();
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn test_raising_oracle_is_absorbed() {
    let instance = Instance::from_document(&search_document()).unwrap();
    let oracle = RaisingOracle;

    let seeded = DifferentialEvolution::new(&instance, quick_settings(9))
        .with_seed_oracle(&oracle)
        .solve()
        .unwrap();
    let unseeded = DifferentialEvolution::new(&instance, quick_settings(9))
        .solve()
        .unwrap();

    assert_eq!(seeded.assignment, unseeded.assignment);
    assert_eq!(seeded.fitness, unseeded.fitness);
}

#[test]
fn test_malformed_seed_is_absorbed() {
    let instance = Instance::from_document(&search_document()).unwrap();
    // Start 9 lies outside I1's window, so the seed must be discarded.
    let oracle = FixedOracle(vec![
        ("I1".into(), 9),
        ("I2".into(), 1),
        ("I3".into(), 1),
    ]);

    let seeded = DifferentialEvolution::new(&instance, quick_settings(13))
        .with_seed_oracle(&oracle)
        .solve()
        .unwrap();
    let unseeded = DifferentialEvolution::new(&instance, quick_settings(13))
        .solve()
        .unwrap();
    assert_eq!(seeded.assignment, unseeded.assignment);
}

#[test]
fn test_valid_seed_bounds_the_result() {
    let instance = Instance::from_document(&search_document()).unwrap();
    let seed_entries = vec![
        ("I1".to_string(), 3i64),
        ("I2".to_string(), 4),
        ("I3".to_string(), 1),
    ];
    let oracle = FixedOracle(seed_entries.clone());

    let mut evaluator = Evaluator::new(&instance);
    let seed_fitness = Fitness::of(
        &evaluator
            .evaluate_assignment(&Assignment::new(seed_entries))
            .unwrap(),
    );

    let report = DifferentialEvolution::new(&instance, quick_settings(17))
        .with_seed_oracle(&oracle)
        .solve()
        .unwrap();
    assert!(report.fitness <= seed_fitness);
}
