pub mod experiment;
pub mod individual;
pub mod param;
pub mod pbil;
pub mod population;
pub mod problem;
pub mod utils;

use crate::experiment::Experiment;
use crate::param::Param;
use crate::pbil::pbil;
use crate::population::Population;
use crate::problem::Problem;
use chrono::Local;
use log::info;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::error::Error;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Load (or generate) the problem described by `param`, run PBIL on it and
/// assemble the resulting `Experiment`.
///
/// The run stops early when `running` is cleared, typically from a signal
/// handler.
pub fn run(param: &Param, running: Arc<AtomicBool>) -> Result<Experiment, Box<dyn Error>> {
    let start = std::time::Instant::now();
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();

    // Load problem
    let mut problem = Problem::new();
    if !param.problem.cnf.is_empty() {
        problem.load_cnf(&param.problem.cnf)?;
    } else {
        let mut rng = ChaCha8Rng::seed_from_u64(param.general.seed);
        problem = Problem::random(
            param.problem.n_variables,
            param.problem.n_clauses,
            param.problem.clause_length,
            &mut rng,
        );
        info!("Generated random problem");
        if !param.problem.save_cnf.is_empty() {
            problem.save_cnf(&param.problem.save_cnf)?;
        }
    }
    info!("{:?}", problem);

    // Launch the solver
    let trace = pbil(&problem, param, running);

    // Build experiment
    let git_sha = option_env!("PBILSAT_GIT_SHA").unwrap_or("unknown");
    let version = format!("{}#{}", env!("CARGO_PKG_VERSION"), git_sha);
    let (_, unsatisfied_clauses) = problem.verify(&trace.best.bits);

    let stem = param.general.save_exp.split('.').next().unwrap_or("");
    let id = if stem.is_empty() {
        format!("pbil_{}", timestamp)
    } else {
        format!("{}_pbil_{}", stem, timestamp)
    };

    let final_population = trace
        .populations
        .last()
        .cloned()
        .unwrap_or_else(Population::new);
    let populations = if param.general.keep_trace {
        Some(trace.populations)
    } else {
        None
    };

    Ok(Experiment {
        id,
        version,
        timestamp,
        parameters: param.clone(),
        problem,
        best: trace.best,
        best_generation: trace.best_generation,
        unsatisfied_clauses,
        generations: trace.generations,
        history: trace.history,
        probabilities: trace.probabilities,
        final_population,
        populations,
        execution_time: start.elapsed().as_secs_f64(),
    })
}
