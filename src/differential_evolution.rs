//! The differential-evolution engine.
//!
//! A fixed-size pool of start-time vectors evolves through DE/best/1 and
//! DE/rand/1 mutation, exponential crossover and greedy per-slot selection
//! under the lexicographic fitness order. Offspring are generated and
//! evaluated in parallel from the current (read-only) pool into a second
//! buffer, then the buffers swap; mutation bases therefore never observe
//! same-generation writes. Each offspring slot derives its own generator
//! from `(seed, generation, slot)`, which makes runs reproducible for any
//! thread count.

use std::mem;
use std::sync::Mutex;
use std::time::Instant;

use ndarray::Array1;
use rand::SeedableRng;
use rand::distr::weighted::WeightedIndex;
use rand::rngs::StdRng;
use rand::Rng;
use rayon::prelude::*;

use crate::crossover_exponential::{exponential_crossover, segment_length_weights};
use crate::error::{MppError, Result};
use crate::evaluator::Evaluator;
use crate::fitness::Fitness;
use crate::init_random::init_random;
use crate::instance::Instance;
use crate::mip::SeedOracle;
use crate::mutant_best1::mutant_best1;
use crate::mutant_rand1::mutant_rand1;
use crate::progress::{ProgressRecord, ProgressSink, StdoutProgress};
use crate::solution::Assignment;
use crate::{DEReport, DESettings};

/// One pool member: a start-time vector and its selection key.
#[derive(Debug, Clone)]
pub(crate) struct Individual {
    pub(crate) starts: Array1<i64>,
    pub(crate) fitness: Fitness,
}

/// The population search over intervention start times.
pub struct DifferentialEvolution<'a> {
    instance: &'a Instance,
    settings: DESettings,
    oracle: Option<&'a dyn SeedOracle>,
    progress: Option<Box<dyn ProgressSink + 'a>>,
}

impl<'a> DifferentialEvolution<'a> {
    /// Creates an engine over a shared, read-only instance.
    pub fn new(instance: &'a Instance, settings: DESettings) -> Self {
        Self {
            instance,
            settings,
            oracle: None,
            progress: None,
        }
    }

    /// Installs a hot-start oracle consulted once after initialization.
    pub fn with_seed_oracle(mut self, oracle: &'a dyn SeedOracle) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Redirects verbose progress records away from standard output.
    pub fn with_progress(mut self, sink: Box<dyn ProgressSink + 'a>) -> Self {
        self.progress = Some(sink);
        self
    }

    /// Runs the search until the time budget or iteration cap expires and
    /// returns the best individual with its full evaluation.
    pub fn solve(&mut self) -> Result<DEReport> {
        let settings = self.settings;
        settings.validate()?;
        let instance = self.instance;
        let n = instance.intervention_count();
        let pool_size = settings.pool_size;

        let upper: Array1<i64> = instance
            .interventions()
            .iter()
            .map(|intervention| intervention.tmax() as i64)
            .collect();
        let lengths = WeightedIndex::new(segment_length_weights(settings.crossover_rho, n))
            .map_err(|_| MppError::InvalidCrossoverRho {
                rho: settings.crossover_rho,
            })?;

        // Scoped pool: the global one can only be configured once per
        // process, which would pin later runs to the first thread count.
        let workers = rayon::ThreadPoolBuilder::new()
            .num_threads(settings.threads.max(1))
            .build()
            .map_err(|e| MppError::ThreadPool {
                detail: e.to_string(),
            })?;

        let timer = Instant::now();
        let mut rng = StdRng::seed_from_u64(settings.seed);

        log::info!("initializing pool of {pool_size} individuals over {n} interventions");
        let starts_pool = init_random(pool_size, &upper, &mut rng);
        let mut current: Vec<Individual> = workers.install(|| {
            starts_pool
                .into_par_iter()
                .map_init(
                    || Evaluator::new(instance),
                    |evaluator, starts| {
                        let fitness = Fitness::of(&evaluator.evaluate(starts.view()));
                        Individual { starts, fitness }
                    },
                )
                .collect()
        });
        let mut evaluations = pool_size as u64;

        let mut idx_best = 0;
        let mut idx_worst = 0;
        for (i, individual) in current.iter().enumerate() {
            if individual.fitness < current[idx_best].fitness {
                idx_best = i;
            }
            if individual.fitness > current[idx_worst].fitness {
                idx_worst = i;
            }
        }

        // Hot start: best effort, never fatal. A malformed seed is absorbed
        // like any other oracle failure.
        let mut evaluator = Evaluator::new(instance);
        if let Some(oracle) = self.oracle {
            log::info!("requesting hot-start seed (timelimit {})", settings.mip_timelimit);
            let seed_starts = oracle
                .solve(
                    instance,
                    settings.mip_timelimit,
                    settings.threads,
                    settings.verbose,
                )
                .map_err(|e| e.to_string())
                .and_then(|assignment| {
                    assignment.to_starts(instance).map_err(|e| e.to_string())
                });
            match seed_starts {
                Ok(starts) => {
                    let fitness = Fitness::of(&evaluator.evaluate(starts.view()));
                    evaluations += 1;
                    current[idx_worst] = Individual { starts, fitness };
                    if current[idx_worst].fitness < current[idx_best].fitness {
                        idx_best = idx_worst;
                    }
                    log::info!("hot-start seed replaced the pool worst");
                }
                Err(reason) => log::warn!("continuing without hot start: {reason}"),
            }
        }

        let mut offspring = current.clone();
        let mut iteration: u64 = 0;

        while keep_running(&settings, &timer, iteration) {
            let generation = iteration + 1;
            let best_slot: Mutex<Option<(usize, Fitness)>> = Mutex::new(None);
            let current_pool = &current;
            let upper_ref = &upper;
            let lengths_ref = &lengths;

            workers.install(|| {
                offspring.par_iter_mut().enumerate().for_each_init(
                    || Evaluator::new(instance),
                    |evaluator, (slot, out)| {
                        let mut rng =
                            StdRng::seed_from_u64(slot_seed(settings.seed, generation, slot));
                        let parent = &current_pool[slot];

                        let mutant = if rng.random::<f64>() < settings.best1_ratio {
                            mutant_best1(
                                slot,
                                current_pool,
                                idx_best,
                                settings.scaling_factor,
                                upper_ref,
                                &mut rng,
                            )
                        } else {
                            mutant_rand1(
                                slot,
                                current_pool,
                                settings.scaling_factor,
                                upper_ref,
                                &mut rng,
                            )
                        };
                        let trial =
                            exponential_crossover(&parent.starts, &mutant, lengths_ref, &mut rng);

                        // Greedy per-slot selection; the parent is always
                        // carried forward when the trial does not strictly
                        // improve.
                        let trial_fitness = Fitness::of(&evaluator.evaluate(trial.view()));
                        if trial_fitness < parent.fitness {
                            out.starts = trial;
                            out.fitness = trial_fitness;
                        } else {
                            out.starts.assign(&parent.starts);
                            out.fitness = parent.fitness;
                        }

                        // Smallest slot wins ties so the promoted best does
                        // not depend on worker scheduling.
                        let mut best = best_slot.lock().unwrap();
                        let replace = match *best {
                            None => true,
                            Some((held_slot, held)) => {
                                out.fitness < held || (out.fitness == held && slot < held_slot)
                            }
                        };
                        if replace {
                            *best = Some((slot, out.fitness));
                        }
                    },
                );
            });
            evaluations += pool_size as u64;

            mem::swap(&mut current, &mut offspring);
            if let Some((slot, _)) = best_slot.into_inner().unwrap() {
                idx_best = slot;
            }
            iteration = generation;

            if settings.verbose {
                let best = &current[idx_best];
                let record = ProgressRecord {
                    iteration,
                    elapsed_seconds: timer.elapsed().as_secs_f64(),
                    violations: best.fitness.violations,
                    magnitude: best.fitness.magnitude,
                    objective: best.fitness.objective,
                };
                match &mut self.progress {
                    Some(sink) => sink.emit(&record),
                    None => StdoutProgress.emit(&record),
                }
            }
        }

        let best = &current[idx_best];
        let assignment = Assignment::from_starts(instance, best.starts.view());
        let evaluation = evaluator.evaluate(best.starts.view());
        evaluations += 1;
        log::info!(
            "search finished: {iteration} generations, {evaluations} evaluations, objective {:.7}",
            evaluation.objective
        );

        Ok(DEReport {
            assignment,
            evaluation,
            fitness: Fitness::of(&evaluation),
            iterations: iteration,
            evaluations,
            elapsed_seconds: timer.elapsed().as_secs_f64(),
        })
    }
}

fn keep_running(settings: &DESettings, timer: &Instant, iteration: u64) -> bool {
    if settings.max_iterations > 0 && iteration >= settings.max_iterations as u64 {
        return false;
    }
    if settings.timelimit > 0.0 && timer.elapsed().as_secs_f64() >= settings.timelimit {
        return false;
    }
    true
}

/// Derives the per-slot generator seed for one generation.
fn slot_seed(seed: u64, generation: u64, slot: usize) -> u64 {
    seed.wrapping_add(generation << 32).wrapping_add(slot as u64)
}
