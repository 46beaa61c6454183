use crate::problem::Problem;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// One candidate assignment: a 0/1 value per variable
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct Individual {
    /// Assignment bits, one per variable
    pub bits: Vec<u8>,
    /// Number of clauses this assignment satisfies
    pub fitness: usize,
    /// Generation the individual was sampled in
    pub generation: usize,
    /// Identifier hash of the assignment
    pub hash: u64,
}

impl Individual {
    /// Generates a new empty Individual with default values
    pub fn new() -> Individual {
        Individual {
            bits: Vec::new(),
            fitness: 0,
            generation: 0,
            hash: 0,
        }
    }

    /// Sample an individual from a probability vector: bit `i` is set to 1
    /// when a uniform draw does not exceed `probabilities[i]`.
    pub fn sample(probabilities: &[f64], generation: usize, rng: &mut ChaCha8Rng) -> Individual {
        let bits: Vec<u8> = probabilities
            .iter()
            .map(|&p| if rng.gen::<f64>() <= p { 1 } else { 0 })
            .collect();

        let mut individual = Individual {
            bits,
            fitness: 0,
            generation,
            hash: 0,
        };
        individual.compute_hash();
        individual
    }

    /// Evaluate the assignment against a problem, storing the satisfied
    /// clause count as fitness.
    pub fn evaluate(&mut self, problem: &Problem) {
        self.fitness = problem.fitness(&self.bits);
    }

    pub fn compute_hash(&mut self) {
        let mut hasher = DefaultHasher::new();
        self.bits.hash(&mut hasher);
        self.hash = hasher.finish();
    }

    /// Render the assignment as a string of 0 and 1 characters.
    pub fn solution_string(&self) -> String {
        self.bits.iter().map(|&b| char::from(b'0' + b)).collect()
    }
}

impl fmt::Debug for Individual {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Individual[fitness={}, generation={}, bits={}]",
            self.fitness,
            self.generation,
            self.solution_string()
        )
    }
}
