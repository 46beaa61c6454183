use crate::individual::Individual;
use crate::param::Param;
use crate::pbil::{GenerationRecord, ProbabilityVector};
use crate::population::Population;
use crate::problem::Problem;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;

/// Complete record of one solver run
#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
pub struct Experiment {
    pub id: String,
    pub version: String,
    pub timestamp: String,

    pub parameters: Param,
    pub problem: Problem,

    /// Best individual found across the whole run
    pub best: Individual,
    pub best_generation: usize,
    /// Clause indices the best solution leaves unsatisfied
    pub unsatisfied_clauses: Vec<usize>,

    pub generations: usize,
    pub history: Vec<GenerationRecord>,
    pub probabilities: ProbabilityVector,

    pub final_population: Population,
    /// Per-generation populations, kept only when tracing is enabled
    pub populations: Option<Vec<Population>>,

    pub execution_time: f64,
}

impl Experiment {
    /// Saves the experiment in a format chosen from the file extension.
    pub fn save_auto<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn Error>> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "json" => self.save_json(path),
            "bin" | "bincode" => self.save_bincode(path),
            _ => {
                warn!("Unknown format. Saving experiment in json.");
                let json_path = path.with_extension("json");
                self.save_json(json_path)
            }
        }
    }

    /// Saves to JSON (human readable)
    fn save_json<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Saves as Bincode (compact binary, Rust-only)
    fn save_bincode<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn Error>> {
        let encoded = bincode::serialize(self)?;
        std::fs::write(path, encoded)?;
        Ok(())
    }

    /// Loads an experiment, detecting the format from the file extension and
    /// falling back to trying both formats.
    pub fn load_auto<P: AsRef<std::path::Path>>(path: P) -> Result<Experiment, Box<dyn Error>> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "json" => Self::load_json(path),
            "bin" | "bincode" => Self::load_bincode(path),
            _ => {
                if let Ok(experiment) = Self::load_bincode(path) {
                    return Ok(experiment);
                }
                Self::load_json(path)
            }
        }
    }

    fn load_json<P: AsRef<std::path::Path>>(path: P) -> Result<Experiment, Box<dyn Error>> {
        let json = std::fs::read_to_string(path)?;
        let experiment: Experiment = serde_json::from_str(&json)?;
        Ok(experiment)
    }

    fn load_bincode<P: AsRef<std::path::Path>>(path: P) -> Result<Experiment, Box<dyn Error>> {
        let bytes = std::fs::read(path)?;
        let experiment: Experiment = bincode::deserialize(&bytes)?;
        Ok(experiment)
    }

    /// Write the generation history as CSV.
    pub fn export_history<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn Error>> {
        let mut writer = csv::Writer::from_path(path.as_ref())?;
        for record in &self.history {
            writer.serialize(record)?;
        }
        writer.flush()?;
        info!(
            "Exported {} history records to {}",
            self.history.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    /// Render a console summary of the run, with up to `limit` individuals of
    /// the final population.
    pub fn display(&self, limit: u32) -> String {
        let target = self.problem.n_clauses;
        let success_rate = if target > 0 {
            self.best.fitness as f64 / target as f64 * 100.0
        } else {
            0.0
        };
        let (mean, std) = self.probabilities.mean_and_std();

        let mut str = format!(
            "Experiment {} (pbilsat {})\n{:?}\n",
            self.id, self.version, self.problem
        );
        str = format!(
            "{}Best solution, found at generation {}: {}/{} clauses satisfied ({:.1}%)\n  {}\n",
            str,
            self.best_generation,
            self.best.fitness,
            target,
            success_rate,
            self.best.solution_string()
        );
        if self.unsatisfied_clauses.is_empty() {
            str = format!("{}All clauses satisfied\n", str);
        } else {
            str = format!(
                "{}{} unsatisfied clauses: {:?}\n",
                str,
                self.unsatisfied_clauses.len(),
                self.unsatisfied_clauses
            );
        }
        str = format!(
            "{}Probability vector: entropy {:.3}, mean {:.3}, std {:.3}\n",
            str,
            self.probabilities.entropy(),
            mean,
            std
        );

        let mut fitnesses: Vec<f64> = self
            .final_population
            .individuals
            .iter()
            .map(|i| i.fitness as f64)
            .collect();
        if !fitnesses.is_empty() {
            str = format!(
                "{}Final population: {} individuals, median fitness {:.1}\n",
                str,
                fitnesses.len(),
                crate::utils::median(&mut fitnesses)
            );
        }

        let sorted = self.final_population.clone().sort();
        let shown = std::cmp::min(limit as usize, sorted.individuals.len());
        for (rank, individual) in sorted.individuals.iter().take(shown).enumerate() {
            str = format!(
                "{}Solution #{} {:?}\n",
                str,
                rank + 1,
                individual
            );
        }

        str = format!(
            "{}Computed {} generations in {:.2}s",
            str, self.generations, self.execution_time
        );
        str
    }
}
