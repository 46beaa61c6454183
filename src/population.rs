use crate::individual::Individual;
use crate::pbil::ProbabilityVector;
use crate::problem::Problem;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
pub struct Population {
    pub individuals: Vec<Individual>,
}

impl Population {
    pub fn new() -> Population {
        Population {
            individuals: Vec::new(),
        }
    }

    /// Sample `size` individuals from the probability vector, tagging them
    /// with the generation that produced them.
    pub fn generate(
        &mut self,
        size: u32,
        probabilities: &ProbabilityVector,
        generation: usize,
        rng: &mut ChaCha8Rng,
    ) {
        self.individuals = (0..size)
            .map(|_| Individual::sample(&probabilities.probabilities, generation, rng))
            .collect();
    }

    /// Evaluate every individual against the problem, in parallel when more
    /// than one thread is requested.
    pub fn fit(&mut self, problem: &Problem, thread_number: usize) {
        if thread_number > 1 {
            let pool = ThreadPoolBuilder::new()
                .num_threads(thread_number)
                .build()
                .expect("Failed to build thread pool");
            pool.install(|| {
                self.individuals
                    .par_iter_mut()
                    .for_each(|individual| individual.evaluate(problem));
            });
        } else {
            for individual in self.individuals.iter_mut() {
                individual.evaluate(problem);
            }
        }
    }

    /// Return the population sorted by decreasing fitness.
    pub fn sort(self) -> Population {
        let mut individuals = self.individuals;
        individuals.sort_by(|a, b| b.fitness.cmp(&a.fitness));
        Population { individuals }
    }

    /// Highest-fitness individual; ties keep the first one encountered.
    pub fn best(&self) -> Option<&Individual> {
        self.individuals
            .iter()
            .reduce(|best, individual| {
                if individual.fitness > best.fitness {
                    individual
                } else {
                    best
                }
            })
    }

    /// Lowest-fitness individual; ties keep the first one encountered.
    pub fn worst(&self) -> Option<&Individual> {
        self.individuals
            .iter()
            .reduce(|worst, individual| {
                if individual.fitness < worst.fitness {
                    individual
                } else {
                    worst
                }
            })
    }

    pub fn mean_fitness(&self) -> f64 {
        if self.individuals.is_empty() {
            return 0.0;
        }
        let total: usize = self.individuals.iter().map(|i| i.fitness).sum();
        total as f64 / self.individuals.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn population_with_fitnesses(fitnesses: &[usize]) -> Population {
        let individuals = fitnesses
            .iter()
            .enumerate()
            .map(|(index, &fitness)| {
                let mut individual = Individual::new();
                individual.bits = vec![index as u8];
                individual.fitness = fitness;
                individual
            })
            .collect();
        Population { individuals }
    }

    #[test]
    fn generate_produces_requested_size() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let probabilities = ProbabilityVector::new(8);
        let mut population = Population::new();
        population.generate(30, &probabilities, 4, &mut rng);
        assert_eq!(population.individuals.len(), 30);
        assert!(population.individuals.iter().all(|i| i.bits.len() == 8));
        assert!(population.individuals.iter().all(|i| i.generation == 4));
    }

    #[test]
    fn fit_evaluates_all_individuals() {
        let problem = Problem {
            n_variables: 2,
            n_clauses: 2,
            clauses: vec![vec![1, 2], vec![-1]],
        };
        let mut population = Population::new();
        for bits in [vec![1, 1], vec![0, 0], vec![0, 1]] {
            let mut individual = Individual::new();
            individual.bits = bits;
            population.individuals.push(individual);
        }
        population.fit(&problem, 1);
        let fitnesses: Vec<usize> = population.individuals.iter().map(|i| i.fitness).collect();
        assert_eq!(fitnesses, vec![1, 1, 2]);
    }

    #[test]
    fn best_and_worst_break_ties_on_first_index() {
        let population = population_with_fitnesses(&[3, 7, 7, 1, 1]);
        assert_eq!(population.best().unwrap().bits, vec![1]);
        assert_eq!(population.worst().unwrap().bits, vec![3]);
    }

    #[test]
    fn best_and_worst_are_none_on_empty_population() {
        let population = Population::new();
        assert!(population.best().is_none());
        assert!(population.worst().is_none());
    }

    #[test]
    fn sort_orders_by_decreasing_fitness() {
        let population = population_with_fitnesses(&[2, 9, 4]).sort();
        let fitnesses: Vec<usize> = population.individuals.iter().map(|i| i.fitness).collect();
        assert_eq!(fitnesses, vec![9, 4, 2]);
    }

    #[test]
    fn mean_fitness_averages_population() {
        let population = population_with_fitnesses(&[2, 4, 6]);
        assert!((population.mean_fitness() - 4.0).abs() < 1e-12);
    }
}
