use crate::individual::Individual;
use crate::pbil::ProbabilityVector;
use statrs::statistics::Statistics;

/// Mean and sample standard deviation of a slice of values
pub fn mean_and_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    if values.len() < 2 {
        return (values[0], 0.0);
    }
    (values.mean(), values.std_dev())
}

/// Median of a vector, sorting it in place
pub fn median(values: &mut Vec<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let middle = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[middle - 1] + values[middle]) / 2.0
    } else {
        values[middle]
    }
}

pub fn display_generation_legend() -> String {
    "generation | overall best | generation best | population mean | vector entropy".to_string()
}

/// One status line per generation, aligned with the legend
pub fn display_generation(
    generation: usize,
    best: &Individual,
    generation_best: &Individual,
    mean_fitness: f64,
    probabilities: &ProbabilityVector,
) -> String {
    format!(
        "{:>10} | {:>12} | {:>15} | {:>15.2} | {:>14.3}",
        generation,
        best.fitness,
        generation_best.fitness,
        mean_fitness,
        probabilities.entropy()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_std_handles_short_slices() {
        assert_eq!(mean_and_std(&[]), (0.0, 0.0));
        assert_eq!(mean_and_std(&[3.0]), (3.0, 0.0));

        let (mean, std) = mean_and_std(&[2.0, 4.0, 6.0]);
        assert!((mean - 4.0).abs() < 1e-12);
        assert!((std - 2.0).abs() < 1e-12);
    }

    #[test]
    fn median_handles_even_and_odd_lengths() {
        let mut odd = vec![5.0, 1.0, 3.0];
        assert!((median(&mut odd) - 3.0).abs() < 1e-12);

        let mut even = vec![4.0, 1.0, 3.0, 2.0];
        assert!((median(&mut even) - 2.5).abs() < 1e-12);

        let mut empty: Vec<f64> = Vec::new();
        assert_eq!(median(&mut empty), 0.0);
    }

    #[test]
    fn display_generation_contains_the_fitness_values() {
        let mut best = Individual::new();
        best.fitness = 47;
        let mut generation_best = Individual::new();
        generation_best.fitness = 45;
        let vector = ProbabilityVector::new(4);

        let line = display_generation(12, &best, &generation_best, 40.5, &vector);
        assert!(line.contains("12"));
        assert!(line.contains("47"));
        assert!(line.contains("45"));
        assert!(line.contains("40.50"));
    }
}
