use super::{DistanceCoefficients, DistanceMetric};
use crate::errors::ConfigError;
use crate::genomics::{ConnectionGenes, GenePair};

use serde::{Deserialize, Serialize};

/// Euclidean (L2) distance over aligned gene weights.
///
/// # Examples
/// ```
/// use kneat::distance::{DistanceMetric, EuclideanDistance};
/// use kneat::genomics::{ConnectionGene, ConnectionGenes};
///
/// let a: ConnectionGenes = vec![ConnectionGene::new(4, 0, 3, 0.5)].into_iter().collect();
/// let b: ConnectionGenes = vec![
///     ConnectionGene::new(4, 0, 3, 0.5),
///     ConnectionGene::new(5, 1, 3, -0.2),
/// ]
/// .into_iter()
/// .collect();
///
/// assert!((EuclideanDistance::default().distance(&a, &b) - 0.2).abs() < 1e-12);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EuclideanDistance {
    coefficients: DistanceCoefficients,
}

impl EuclideanDistance {
    /// Creates a metric with the specified coefficients.
    ///
    /// # Errors
    /// Returns an error if the coefficients are invalid.
    pub fn new(coefficients: DistanceCoefficients) -> Result<EuclideanDistance, ConfigError> {
        coefficients.validate()?;
        Ok(EuclideanDistance { coefficients })
    }

    /// Returns the metric's coefficients.
    pub fn coefficients(&self) -> &DistanceCoefficients {
        &self.coefficients
    }

    // Squared contribution of a gene pair.
    fn term(&self, pair: GenePair<'_>) -> f64 {
        let c = &self.coefficients;
        match pair {
            GenePair::Matching(x, y) => {
                let delta = x.weight() - y.weight();
                c.match_coefficient * delta * delta
            }
            GenePair::Left(g) | GenePair::Right(g) => {
                c.mismatch_constant + c.mismatch_coefficient * g.weight() * g.weight()
            }
        }
    }
}

impl DistanceMetric for EuclideanDistance {
    fn distance(&self, a: &ConnectionGenes, b: &ConnectionGenes) -> f64 {
        a.aligned_with(b)
            .map(|pair| self.term(pair))
            .sum::<f64>()
            .sqrt()
    }

    fn test_distance(&self, a: &ConnectionGenes, b: &ConnectionGenes, threshold: f64) -> bool {
        if threshold <= 0.0 {
            return false;
        }
        let threshold = threshold * threshold;
        let mut total = 0.0;
        for pair in a.aligned_with(b) {
            total += self.term(pair);
            if total >= threshold {
                return false;
            }
        }
        total < threshold
    }
}
