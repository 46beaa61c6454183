use crate::individual::Individual;
use crate::param::Param;
use crate::population::Population;
use crate::problem::Problem;
use crate::utils::{display_generation, display_generation_legend, mean_and_std};
use log::{debug, error, info, warn};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

//-----------------------------------------------------------------------------
// Probability vector
//-----------------------------------------------------------------------------

/// Per-variable probability that a sampled bit equals 1.
///
/// All probabilities start at 0.5 and are pulled towards good assignments as
/// the run progresses.
#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
pub struct ProbabilityVector {
    pub probabilities: Vec<f64>,
}

impl ProbabilityVector {
    pub fn new(len: usize) -> ProbabilityVector {
        ProbabilityVector {
            probabilities: vec![0.5; len],
        }
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }

    /// Pull every probability towards the best individual at `learning_rate`;
    /// where best and worst disagree, pull again towards the best at
    /// `negative_learning_rate`.
    pub fn update(
        &mut self,
        best: &Individual,
        worst: &Individual,
        learning_rate: f64,
        negative_learning_rate: f64,
    ) {
        for (i, p) in self.probabilities.iter_mut().enumerate() {
            let bit = best.bits[i] as f64;
            *p = *p * (1.0 - learning_rate) + bit * learning_rate;
            if best.bits[i] != worst.bits[i] {
                *p = *p * (1.0 - negative_learning_rate) + bit * negative_learning_rate;
            }
        }
    }

    /// With probability `chance` per position, shift the probability towards
    /// a random direction (0 or 1) by `shift`.
    pub fn mutate(&mut self, chance: f64, shift: f64, rng: &mut ChaCha8Rng) {
        for p in self.probabilities.iter_mut() {
            if rng.gen::<f64>() <= chance {
                let direction = if rng.gen_bool(0.5) { 1.0 } else { 0.0 };
                *p = *p * (1.0 - shift) + direction * shift;
            }
        }
    }

    /// Keep every probability in [0, 1].
    pub fn clamp(&mut self) {
        for p in self.probabilities.iter_mut() {
            *p = p.clamp(0.0, 1.0);
        }
    }

    /// A vector has converged when every probability is committed: above the
    /// threshold or below its complement. A zero threshold disables the test.
    pub fn converged(&self, threshold: f64) -> bool {
        threshold > 0.0
            && self
                .probabilities
                .iter()
                .all(|&p| p > threshold || p < 1.0 - threshold)
    }

    /// Most likely assignment under the vector: 1 wherever the probability
    /// reaches 0.5.
    pub fn as_solution(&self) -> Vec<u8> {
        self.probabilities
            .iter()
            .map(|&p| if p >= 0.5 { 1 } else { 0 })
            .collect()
    }

    /// Mean bitwise Shannon entropy, a diversity measure: 1.0 for a fresh
    /// vector, 0.0 once every probability is committed.
    pub fn entropy(&self) -> f64 {
        if self.probabilities.is_empty() {
            return 0.0;
        }
        let epsilon = 1e-10;
        let total: f64 = self
            .probabilities
            .iter()
            .map(|&p| {
                let p = p.clamp(epsilon, 1.0 - epsilon);
                -(p * p.log2() + (1.0 - p) * (1.0 - p).log2())
            })
            .sum();
        total / self.probabilities.len() as f64
    }

    pub fn mean_and_std(&self) -> (f64, f64) {
        mean_and_std(&self.probabilities)
    }
}

//-----------------------------------------------------------------------------
// Run records
//-----------------------------------------------------------------------------

/// One history entry per generation
#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
pub struct GenerationRecord {
    pub generation: usize,
    /// Best fitness seen so far, across all generations
    pub best_fitness: usize,
    /// Mean fitness of the generation's population
    pub mean_fitness: f64,
}

/// Everything a PBIL run produces
#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
pub struct PbilTrace {
    /// Per-generation populations when tracing is enabled, otherwise only the
    /// last generation
    pub populations: Vec<Population>,
    pub history: Vec<GenerationRecord>,
    /// Best individual found across the whole run
    pub best: Individual,
    pub best_generation: usize,
    /// Number of generations actually run
    pub generations: usize,
    /// Final state of the probability vector
    pub probabilities: ProbabilityVector,
}

//-----------------------------------------------------------------------------
// PBIL core loop
//-----------------------------------------------------------------------------

/// Main function to run population-based incremental learning
///
/// # Arguments
///
/// * `problem` - The MAX-SAT problem to solve.
/// * `param` - Parameters for the algorithm.
/// * `running` - Atomic boolean to control the running state of the algorithm.
///
/// # Returns
///
/// A trace holding the best individual, the per-generation history and the
/// final probability vector.
///
/// # Panics
///
/// Panics if the configured population size is zero, which validation
/// normally rejects.
pub fn pbil(problem: &Problem, param: &Param, running: Arc<AtomicBool>) -> PbilTrace {
    let time = Instant::now();
    let mut rng = ChaCha8Rng::seed_from_u64(param.general.seed);

    let mut target = if param.pbil.target_fitness > 0 {
        param.pbil.target_fitness
    } else {
        problem.n_clauses
    };
    if target > problem.n_clauses {
        warn!(
            "Target fitness {} exceeds the {} clauses of the problem: capping.",
            target, problem.n_clauses
        );
        target = problem.n_clauses;
    }

    info!(
        "Running PBIL for up to {} generations, target fitness {}/{}",
        param.pbil.max_generations, target, problem.n_clauses
    );
    info!("{}", display_generation_legend());

    let mut probabilities = ProbabilityVector::new(problem.n_variables);
    let mut best = Individual::new();
    let mut best_generation: usize = 0;
    let mut history: Vec<GenerationRecord> = Vec::new();
    let mut populations: Vec<Population> = Vec::new();
    let mut generation: usize = 0;

    loop {
        let mut population = Population::new();
        population.generate(
            param.pbil.population_size,
            &probabilities,
            generation,
            &mut rng,
        );
        population.fit(problem, param.general.thread_number);

        let (generation_best, generation_worst) = match (population.best(), population.worst()) {
            (Some(b), Some(w)) => (b.clone(), w.clone()),
            _ => {
                error!("Generated an empty population!");
                panic!("Generated an empty population!");
            }
        };

        if generation == 0 || generation_best.fitness > best.fitness {
            best = generation_best.clone();
            best_generation = generation;
        }

        let mean_fitness = population.mean_fitness();
        history.push(GenerationRecord {
            generation,
            best_fitness: best.fitness,
            mean_fitness,
        });

        let line = display_generation(
            generation,
            &best,
            &generation_best,
            mean_fitness,
            &probabilities,
        );
        if generation % 100 == 0 || generation_best.fitness >= target {
            info!("{}", line);
        } else {
            debug!("{}", line);
        }

        // Stop criteria
        let mut need_to_break = false;

        if best.fitness >= target {
            info!("Target fitness reached at generation {}", generation);
            need_to_break = true;
        }

        if generation + 1 >= param.pbil.max_generations {
            info!("Reached max generations");
            need_to_break = true;
        }

        if probabilities.converged(param.pbil.convergence_threshold) {
            info!("Probability vector converged at generation {}", generation);
            need_to_break = true;
        }

        if !running.load(Ordering::Relaxed) {
            info!("Signal received");
            need_to_break = true;
        }

        if param.general.keep_trace {
            populations.push(population);
        } else if need_to_break {
            populations = vec![population];
        }

        if need_to_break {
            break;
        }

        // The first generation only seeds the statistics; the vector moves
        // from the second generation on.
        if generation > 0 {
            probabilities.update(
                &generation_best,
                &generation_worst,
                param.pbil.learning_rate,
                param.pbil.negative_learning_rate,
            );
            probabilities.mutate(
                param.pbil.mutation_probability,
                param.pbil.mutation_shift,
                &mut rng,
            );
            probabilities.clamp();
        }

        generation += 1;
    }

    let elapsed = time.elapsed();
    info!("PBIL computed {} generations in {:.2?}", generation + 1, elapsed);
    info!(
        "Best solution found at generation {}: {}/{} clauses satisfied",
        best_generation, best.fitness, problem.n_clauses
    );

    PbilTrace {
        populations,
        history,
        best,
        best_generation,
        generations: generation + 1,
        probabilities,
    }
}
