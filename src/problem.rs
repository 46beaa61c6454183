use log::{info, warn};
use rand::seq::index::sample;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};

/// A MAX-SAT problem in conjunctive normal form.
///
/// Clauses hold DIMACS literals: a positive literal `v` is satisfied when
/// variable `v-1` is set to 1, a negative literal `-v` when it is set to 0.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct Problem {
    pub n_variables: usize,
    pub n_clauses: usize,
    pub clauses: Vec<Vec<i32>>,
}

impl Problem {
    /// Create a new empty `Problem`
    pub fn new() -> Problem {
        Problem {
            n_variables: 0,
            n_clauses: 0,
            clauses: Vec::new(),
        }
    }

    /// Load a problem from a DIMACS CNF file.
    ///
    /// Comment lines (`c ...`) and blank lines are skipped. The problem line
    /// `p cnf <variables> <clauses>` sets the variable count; each following
    /// line holds the literals of one clause, terminated by `0`. When the
    /// declared clause count disagrees with the parsed clauses, the parsed
    /// count wins.
    pub fn load_cnf(&mut self, path: &str) -> Result<(), Box<dyn Error>> {
        info!("Loading CNF file {}...", path);
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let mut declared_clauses: usize = 0;
        self.clauses = Vec::new();

        for line in reader.lines() {
            let line = line?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('c') {
                continue;
            }

            if line.starts_with('p') {
                let fields: Vec<&str> = line.split_whitespace().collect();
                if fields.len() < 4 || fields[1] != "cnf" {
                    return Err(format!("Malformed problem line: {}", line).into());
                }
                self.n_variables = fields[2].parse()?;
                declared_clauses = fields[3].parse()?;
                continue;
            }

            let mut clause: Vec<i32> = Vec::new();
            for token in line.split_whitespace() {
                let literal: i32 = token.parse()?;
                if literal == 0 {
                    break;
                }
                if literal.unsigned_abs() as usize > self.n_variables {
                    return Err(format!(
                        "Literal {} references a variable beyond the declared {} variables",
                        literal, self.n_variables
                    )
                    .into());
                }
                clause.push(literal);
            }
            if !clause.is_empty() {
                self.clauses.push(clause);
            }
        }

        if self.clauses.len() != declared_clauses {
            warn!(
                "Expected {} clauses, got {}",
                declared_clauses,
                self.clauses.len()
            );
        }
        self.n_clauses = self.clauses.len();

        info!(
            "Loaded {} variables and {} clauses",
            self.n_variables, self.n_clauses
        );
        Ok(())
    }

    /// Write the problem to a DIMACS CNF file.
    pub fn save_cnf(&self, path: &str) -> Result<(), Box<dyn Error>> {
        let mut file = File::create(path)?;
        writeln!(file, "p cnf {} {}", self.n_variables, self.n_clauses)?;
        for clause in &self.clauses {
            let literals: Vec<String> = clause.iter().map(|l| l.to_string()).collect();
            writeln!(file, "{} 0", literals.join(" "))?;
        }
        info!("Saved CNF file {}", path);
        Ok(())
    }

    /// Build a random problem: each clause draws `clause_length` distinct
    /// variables, each literal negated with probability one half.
    ///
    /// # Panics
    ///
    /// Panics if `clause_length` exceeds `n_variables`.
    pub fn random(
        n_variables: usize,
        n_clauses: usize,
        clause_length: usize,
        rng: &mut ChaCha8Rng,
    ) -> Problem {
        if clause_length > n_variables {
            panic!(
                "Clause length {} exceeds variable count {}",
                clause_length, n_variables
            );
        }

        let mut clauses: Vec<Vec<i32>> = Vec::with_capacity(n_clauses);
        for _ in 0..n_clauses {
            let variables = sample(rng, n_variables, clause_length);
            let clause: Vec<i32> = variables
                .iter()
                .map(|v| {
                    let literal = (v + 1) as i32;
                    if rng.gen_bool(0.5) {
                        -literal
                    } else {
                        literal
                    }
                })
                .collect();
            clauses.push(clause);
        }

        Problem {
            n_variables,
            n_clauses,
            clauses,
        }
    }

    /// Number of clauses satisfied by a 0/1 assignment.
    pub fn fitness(&self, bits: &[u8]) -> usize {
        self.clauses
            .iter()
            .filter(|clause| Self::clause_satisfied(clause, bits))
            .count()
    }

    fn clause_satisfied(clause: &[i32], bits: &[u8]) -> bool {
        clause.iter().any(|&literal| {
            let variable = literal.unsigned_abs() as usize - 1;
            if literal > 0 {
                bits[variable] == 1
            } else {
                bits[variable] == 0
            }
        })
    }

    /// Check an assignment clause by clause.
    ///
    /// Returns whether every clause is satisfied together with the indices of
    /// the unsatisfied clauses.
    pub fn verify(&self, bits: &[u8]) -> (bool, Vec<usize>) {
        let unsatisfied: Vec<usize> = self
            .clauses
            .iter()
            .enumerate()
            .filter(|(_, clause)| !Self::clause_satisfied(clause, bits))
            .map(|(index, _)| index)
            .collect();
        (unsatisfied.is_empty(), unsatisfied)
    }

    fn clause_length_bounds(&self) -> (usize, usize, f64) {
        let min = self.clauses.iter().map(|c| c.len()).min().unwrap_or(0);
        let max = self.clauses.iter().map(|c| c.len()).max().unwrap_or(0);
        let total: usize = self.clauses.iter().map(|c| c.len()).sum();
        let mean = if self.clauses.is_empty() {
            0.0
        } else {
            total as f64 / self.clauses.len() as f64
        };
        (min, max, mean)
    }
}

impl fmt::Debug for Problem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (min, max, mean) = self.clause_length_bounds();
        write!(
            f,
            "MAXSAT problem: {} variables, {} clauses, clause length {}-{} (mean {:.2})",
            self.n_variables, self.n_clauses, min, max, mean
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::env;
    use std::fs;

    fn sample_problem() -> Problem {
        // (x1 v !x2 v x3) & (!x1 v x2 v !x3) & (x1 v x2 v x3)
        Problem {
            n_variables: 3,
            n_clauses: 3,
            clauses: vec![vec![1, -2, 3], vec![-1, 2, -3], vec![1, 2, 3]],
        }
    }

    #[test]
    fn fitness_counts_satisfied_clauses() {
        let problem = sample_problem();
        assert_eq!(problem.fitness(&[1, 1, 1]), 3);
        assert_eq!(problem.fitness(&[0, 1, 0]), 2);
        assert_eq!(problem.fitness(&[0, 0, 0]), 2);
    }

    #[test]
    fn verify_reports_unsatisfied_clause_indices() {
        let problem = sample_problem();
        let (all_satisfied, unsatisfied) = problem.verify(&[1, 1, 1]);
        assert!(all_satisfied);
        assert!(unsatisfied.is_empty());

        let (all_satisfied, unsatisfied) = problem.verify(&[0, 1, 0]);
        assert!(!all_satisfied);
        assert_eq!(unsatisfied, vec![0]);
    }

    #[test]
    fn cnf_files_round_trip() {
        let path = env::temp_dir().join("pbilsat_roundtrip.cnf");
        let path = path.to_str().unwrap().to_string();

        let problem = sample_problem();
        problem.save_cnf(&path).unwrap();

        let mut loaded = Problem::new();
        loaded.load_cnf(&path).unwrap();
        assert_eq!(loaded, problem);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn load_cnf_skips_comments_and_fixes_clause_count() {
        let path = env::temp_dir().join("pbilsat_mismatch.cnf");
        let path = path.to_str().unwrap().to_string();
        fs::write(&path, "c a comment\n\np cnf 2 3\n1 2 0\n-1 -2 0\n").unwrap();

        let mut problem = Problem::new();
        problem.load_cnf(&path).unwrap();
        // header declares 3 clauses but only 2 are present
        assert_eq!(problem.n_clauses, 2);
        assert_eq!(problem.clauses, vec![vec![1, 2], vec![-1, -2]]);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn load_cnf_rejects_out_of_range_literal() {
        let path = env::temp_dir().join("pbilsat_bad_literal.cnf");
        let path = path.to_str().unwrap().to_string();
        fs::write(&path, "p cnf 2 1\n1 5 0\n").unwrap();

        let mut problem = Problem::new();
        assert!(problem.load_cnf(&path).is_err());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn random_problem_has_requested_shape() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let problem = Problem::random(10, 25, 3, &mut rng);
        assert_eq!(problem.n_variables, 10);
        assert_eq!(problem.n_clauses, 25);
        for clause in &problem.clauses {
            assert_eq!(clause.len(), 3);
            let mut variables: Vec<u32> = clause.iter().map(|l| l.unsigned_abs()).collect();
            variables.sort();
            variables.dedup();
            assert_eq!(variables.len(), 3, "variables must be distinct");
            assert!(variables.iter().all(|&v| v >= 1 && v <= 10));
        }
    }
}
