//! Substitute prediction source for when no trained model is loaded.

use ndarray_rand::rand_distr::Exp1;
use rand::Rng;

use super::ProbabilityDistribution;

/// Draw from a flat Dirichlet(1, …, 1) over `classes` outcomes.
///
/// Normalised unit exponentials are Dirichlet distributed with all
/// concentrations equal to one.
pub fn sample(classes: usize) -> ProbabilityDistribution {
    let mut rng = rand::thread_rng();
    let weights: Vec<f32> = (0..classes.max(1)).map(|_| rng.sample::<f32, _>(Exp1)).collect();
    ProbabilityDistribution::from_weights(weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::distribution::SUM_TOLERANCE;

    #[test]
    fn test_samples_are_valid_distributions() {
        for _ in 0..200 {
            let d = sample(6);
            assert_eq!(d.len(), 6);
            assert!(d.values().iter().all(|p| (0.0..=1.0).contains(p)));
            assert!((d.sum() - 1.0).abs() < SUM_TOLERANCE);
        }
    }

    #[test]
    fn test_samples_are_not_constant() {
        let first = sample(6);
        assert!((0..20).any(|_| sample(6) != first));
    }

    #[test]
    fn test_single_class() {
        assert_eq!(sample(1).values(), &[1.0]);
    }
}
