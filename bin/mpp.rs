//! Command-line front end: load an instance, run the search, write the
//! solution file.
//!
//! ```text
//! mpp instance.json solution.txt --timelimit 300 --threads 4 -v
//! ```

use std::path::PathBuf;
use std::process;

use clap::Parser;

use mpp_solver::{
    DESettings, DifferentialEvolution, Instance, Result, UnavailableSeedOracle,
};

#[derive(Parser, Debug)]
#[command(
    name = "mpp",
    about = "Solve the maintenance planning problem with differential evolution"
)]
struct Cli {
    /// Path to the instance file
    instance: PathBuf,

    /// Path to the output solution file
    output: PathBuf,

    /// Number of individuals in the pool
    #[arg(long, default_value_t = 36)]
    pool_size: usize,

    /// Per-offspring probability of DE/best/1 over DE/rand/1 mutation
    #[arg(long, default_value_t = 0.37)]
    best1_ratio: f64,

    /// Scaling factor for mutation
    #[arg(long, default_value_t = 0.16)]
    scaling_factor: f64,

    /// Rho parameter of the exponential crossover
    #[arg(long, default_value_t = 0.30)]
    crossover_rho: f64,

    /// Wall-clock budget in seconds (<= 0 for unbounded)
    #[arg(long, default_value_t = 900.0, allow_negative_numbers = true)]
    timelimit: f64,

    /// Time limit for the seed MIP in seconds (<= 0 for unbounded)
    #[arg(long, default_value_t = -1.0, allow_negative_numbers = true)]
    mip_timelimit: f64,

    /// Maximum number of generations (<= 0 for unbounded)
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    max_iterations: i64,

    /// Number of threads for offspring evaluation
    #[arg(long, default_value_t = 2)]
    threads: usize,

    /// Random seed
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Emit per-iteration progress records
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(error) = run(&cli) {
        eprintln!("Error: {error}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let instance = Instance::from_path(&cli.instance)?;

    let settings = DESettings {
        pool_size: cli.pool_size,
        best1_ratio: cli.best1_ratio,
        scaling_factor: cli.scaling_factor,
        crossover_rho: cli.crossover_rho,
        timelimit: cli.timelimit,
        mip_timelimit: cli.mip_timelimit,
        max_iterations: cli.max_iterations,
        threads: cli.threads,
        seed: cli.seed,
        verbose: cli.verbose,
    };
    settings.validate()?;

    let oracle = UnavailableSeedOracle;
    let report = DifferentialEvolution::new(&instance, settings)
        .with_seed_oracle(&oracle)
        .solve()?;

    if cli.verbose {
        println!("Objective: {}", report.evaluation.objective);
        println!("Mean risk: {}", report.evaluation.mean_risk);
        println!("Excess risk: {}", report.evaluation.excess_risk);
        println!(
            "Exclusions (violations): {}",
            report.evaluation.exclusions_violated
        );
        println!(
            "Resource count (violations): {}",
            report.evaluation.resource_periods_violated
        );
        println!(
            "Resource sum (violations): {}",
            report.evaluation.resource_violation_magnitude
        );
    }

    report.assignment.write_to(&cli.output)
}
