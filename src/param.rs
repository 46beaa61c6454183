use log::warn;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::BufReader;

// Field definitions and associated default values

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Param {
    #[serde(default)]
    pub general: General,
    #[serde(default)]
    pub problem: Problem,
    #[serde(default)]
    pub pbil: Pbil,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct General {
    #[serde(default = "seed_default")]
    pub seed: u64,
    #[serde(default = "one_default")]
    pub thread_number: usize,
    #[serde(default = "empty_string")]
    pub log_base: String,
    #[serde(default = "log_suffix_default")]
    pub log_suffix: String,
    #[serde(default = "log_level_default")]
    pub log_level: String,
    #[serde(default = "keep_trace_default")]
    pub keep_trace: bool,
    #[serde(default = "empty_string")]
    pub save_exp: String,
    #[serde(default = "n_solution_to_display_default")]
    pub n_solution_to_display: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Problem {
    /// Path of a DIMACS CNF file; when empty a random problem is generated
    #[serde(default = "empty_string")]
    pub cnf: String,
    /// Where to write a generated random problem, if anywhere
    #[serde(default = "empty_string")]
    pub save_cnf: String,
    #[serde(default = "uzero_default")]
    pub n_variables: usize,
    #[serde(default = "uzero_default")]
    pub n_clauses: usize,
    #[serde(default = "clause_length_default")]
    pub clause_length: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Pbil {
    #[serde(default = "pop_size_default")]
    pub population_size: u32,
    #[serde(default = "max_generations_default")]
    pub max_generations: usize,
    #[serde(default = "learning_rate_default")]
    pub learning_rate: f64,
    #[serde(default = "negative_learning_rate_default")]
    pub negative_learning_rate: f64,
    #[serde(default = "mutation_probability_default")]
    pub mutation_probability: f64,
    #[serde(default = "mutation_shift_default")]
    pub mutation_shift: f64,
    /// 0 targets all clauses of the problem
    #[serde(default = "uzero_default")]
    pub target_fitness: usize,
    /// 0 disables the convergence stop criterion
    #[serde(default = "zero_default")]
    pub convergence_threshold: f64,
}

// Default section definitions

impl Default for General {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}

impl Default for Problem {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}

impl Default for Pbil {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}

impl Default for Param {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}

impl Param {
    pub fn new() -> Self {
        Self::default()
    }
}

pub fn get(param_file: String) -> Result<Param, Box<dyn Error>> {
    let param_file_reader = File::open(param_file)?;
    let param_reader = BufReader::new(param_file_reader);

    let mut config: Param = serde_yaml::from_reader(param_reader)?;

    validate(&mut config)?;

    Ok(config)
}

pub fn validate(param: &mut Param) -> Result<(), String> {
    if param.problem.cnf.is_empty() {
        if param.problem.n_variables == 0 || param.problem.n_clauses == 0 {
            return Err(
                "Either problem.cnf or problem.n_variables and problem.n_clauses must be set."
                    .to_string(),
            );
        }
        if param.problem.clause_length == 0 || param.problem.clause_length > param.problem.n_variables {
            return Err(format!(
                "Invalid clause_length={}. Must be in range [1, n_variables].",
                param.problem.clause_length
            ));
        }
    }

    if param.pbil.population_size == 0 {
        return Err("Invalid population_size=0. Must be >= 1.".to_string());
    }

    if param.pbil.max_generations == 0 {
        return Err("Invalid max_generations=0. Must be >= 1.".to_string());
    }

    if param.pbil.learning_rate <= 0.0 || param.pbil.learning_rate > 1.0 {
        return Err(format!(
            "Invalid learning_rate={:.3}. Must be in range (0, 1].",
            param.pbil.learning_rate
        ));
    }

    if param.pbil.negative_learning_rate < 0.0 || param.pbil.negative_learning_rate > 1.0 {
        return Err(format!(
            "Invalid negative_learning_rate={:.3}. Must be in range [0, 1].",
            param.pbil.negative_learning_rate
        ));
    }

    if param.pbil.mutation_probability < 0.0 || param.pbil.mutation_probability > 1.0 {
        return Err(format!(
            "Invalid mutation_probability={:.3}. Must be in range [0, 1].",
            param.pbil.mutation_probability
        ));
    }

    if param.pbil.mutation_shift < 0.0 || param.pbil.mutation_shift > 1.0 {
        return Err(format!(
            "Invalid mutation_shift={:.3}. Must be in range [0, 1].",
            param.pbil.mutation_shift
        ));
    }

    if param.pbil.convergence_threshold != 0.0
        && (param.pbil.convergence_threshold <= 0.5 || param.pbil.convergence_threshold >= 1.0)
    {
        return Err(format!(
            "Invalid convergence_threshold={:.3}. Must be 0 (disabled) or in range (0.5, 1).",
            param.pbil.convergence_threshold
        ));
    }

    if param.pbil.population_size == 1 {
        warn!("population_size=1: best and worst individuals always coincide and the negative learning rate never applies.");
    }

    if param.general.keep_trace
        && param.pbil.population_size as usize * param.pbil.max_generations > 10_000_000
    {
        warn!(
            "keep_trace with {} individuals over {} generations will hold every population in memory.",
            param.pbil.population_size, param.pbil.max_generations
        );
    }

    Ok(())
}

// Default value definitions

fn seed_default() -> u64 {
    42
}
fn empty_string() -> String {
    "".to_string()
}
fn one_default() -> usize {
    1
}
fn uzero_default() -> usize {
    0
}
fn zero_default() -> f64 {
    0.0
}
fn log_suffix_default() -> String {
    "log".to_string()
}
fn log_level_default() -> String {
    "info".to_string()
}
fn keep_trace_default() -> bool {
    false
}
fn n_solution_to_display_default() -> u32 {
    10
}
fn clause_length_default() -> usize {
    3
}
fn pop_size_default() -> u32 {
    100
}
fn max_generations_default() -> usize {
    1000
}
fn learning_rate_default() -> f64 {
    0.1
}
fn negative_learning_rate_default() -> f64 {
    0.075
}
fn mutation_probability_default() -> f64 {
    0.02
}
fn mutation_shift_default() -> f64 {
    0.05
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    #[test]
    fn defaults_match_documented_values() {
        let param = Param::new();
        assert_eq!(param.general.seed, 42);
        assert_eq!(param.general.thread_number, 1);
        assert_eq!(param.general.log_level, "info");
        assert_eq!(param.pbil.population_size, 100);
        assert_eq!(param.pbil.max_generations, 1000);
        assert!((param.pbil.learning_rate - 0.1).abs() < 1e-12);
        assert!((param.pbil.negative_learning_rate - 0.075).abs() < 1e-12);
        assert!((param.pbil.mutation_probability - 0.02).abs() < 1e-12);
        assert!((param.pbil.mutation_shift - 0.05).abs() < 1e-12);
        assert_eq!(param.pbil.target_fitness, 0);
        assert_eq!(param.pbil.convergence_threshold, 0.0);
    }

    #[test]
    fn validate_requires_a_problem() {
        let mut param = Param::default();
        assert!(validate(&mut param).is_err());

        param.problem.cnf = "problem.cnf".to_string();
        assert!(validate(&mut param).is_ok());

        param.problem.cnf = "".to_string();
        param.problem.n_variables = 20;
        param.problem.n_clauses = 50;
        assert!(validate(&mut param).is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_rates() {
        let mut param = Param::default();
        param.problem.cnf = "problem.cnf".to_string();

        param.pbil.learning_rate = 0.0;
        assert!(validate(&mut param).is_err());
        param.pbil.learning_rate = 1.5;
        assert!(validate(&mut param).is_err());
        param.pbil.learning_rate = 0.1;

        param.pbil.mutation_probability = -0.1;
        assert!(validate(&mut param).is_err());
        param.pbil.mutation_probability = 0.02;

        param.pbil.convergence_threshold = 0.3;
        assert!(validate(&mut param).is_err());
        param.pbil.convergence_threshold = 0.95;
        assert!(validate(&mut param).is_ok());
    }

    #[test]
    fn validate_rejects_oversized_clause_length() {
        let mut param = Param::default();
        param.problem.n_variables = 3;
        param.problem.n_clauses = 10;
        param.problem.clause_length = 5;
        assert!(validate(&mut param).is_err());
    }

    #[test]
    fn get_reads_a_yaml_file_with_partial_sections() {
        let path = env::temp_dir().join("pbilsat_param.yaml");
        let path_str = path.to_str().unwrap().to_string();
        fs::write(
            &path,
            "general:\n  seed: 7\nproblem:\n  cnf: some.cnf\npbil:\n  population_size: 25\n",
        )
        .unwrap();

        let param = get(path_str).unwrap();
        assert_eq!(param.general.seed, 7);
        assert_eq!(param.problem.cnf, "some.cnf");
        assert_eq!(param.pbil.population_size, 25);
        // untouched fields fall back to defaults
        assert_eq!(param.pbil.max_generations, 1000);

        fs::remove_file(&path).unwrap();
    }
}
