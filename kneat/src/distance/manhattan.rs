use super::{DistanceCoefficients, DistanceMetric};
use crate::errors::ConfigError;
use crate::genomics::{ConnectionGenes, GenePair};

use serde::{Deserialize, Serialize};

/// Manhattan (L1) distance over aligned gene weights.
///
/// # Examples
/// ```
/// use kneat::distance::{DistanceMetric, ManhattanDistance};
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
/// let metric = ManhattanDistance::default();
/// assert!((metric.distance(&a, &b) - 0.2).abs() < 1e-12);
/// assert!(metric.test_distance(&a, &b, 0.3));
/// assert!(!metric.test_distance(&a, &b, 0.1));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ManhattanDistance {
    coefficients: DistanceCoefficients,
}

impl ManhattanDistance {
    /// Creates a metric with the specified coefficients.
    ///
    /// # Errors
    /// Returns an error if the coefficients are invalid.
    pub fn new(coefficients: DistanceCoefficients) -> Result<ManhattanDistance, ConfigError> {
        coefficients.validate()?;
        Ok(ManhattanDistance { coefficients })
    }

    /// Returns the metric's coefficients.
    pub fn coefficients(&self) -> &DistanceCoefficients {
        &self.coefficients
    }

    fn term(&self, pair: GenePair<'_>) -> f64 {
        let c = &self.coefficients;
        match pair {
            GenePair::Matching(x, y) => c.match_coefficient * (x.weight() - y.weight()).abs(),
            GenePair::Left(g) | GenePair::Right(g) => {
                c.mismatch_constant + c.mismatch_coefficient * g.weight().abs()
            }
        }
    }
}

impl DistanceMetric for ManhattanDistance {
    fn distance(&self, a: &ConnectionGenes, b: &ConnectionGenes) -> f64 {
        if self.coefficients.is_plain() {
            a.aligned_with(b)
                .map(|pair| match pair {
                    GenePair::Matching(x, y) => (x.weight() - y.weight()).abs(),
                    GenePair::Left(g) | GenePair::Right(g) => g.weight().abs(),
                })
                .sum()
        } else {
            a.aligned_with(b).map(|pair| self.term(pair)).sum()
        }
    }

    fn test_distance(&self, a: &ConnectionGenes, b: &ConnectionGenes, threshold: f64) -> bool {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::ConnectionGene;
    use crate::Innovation;

    fn genes(layout: &[(Innovation, Innovation, f64)]) -> ConnectionGenes {
        layout.iter()
            .enumerate()
            .map(|(i, (s, t, w))| ConnectionGene::new(i + 10, *s, *t, *w))
            .collect()
    }

    #[test]
    fn symmetric_and_zero_on_self() {
        let a = genes(&[(0, 3, 1.0), (1, 3, -2.0), (7, 3, 0.5)]);
        let b = genes(&[(0, 3, -1.0), (2, 3, 4.0), (7, 3, 0.25)]);
        let metric = ManhattanDistance::default();
        assert_eq!(metric.distance(&a, &b), metric.distance(&b, &a));
        assert_eq!(metric.distance(&a, &a), 0.0);
        assert!((metric.distance(&a, &b) - (2.0 + 2.0 + 4.0 + 0.25)).abs() < 1e-12);
    }

    #[test]
    fn coefficients_weigh_terms() {
        let a = genes(&[(0, 3, 1.0), (1, 3, 2.0)]);
        let b = genes(&[(0, 3, 0.0)]);
        let metric = ManhattanDistance::new(DistanceCoefficients {
            match_coefficient: 2.0,
            mismatch_coefficient: 0.5,
            mismatch_constant: 10.0,
        })
        .unwrap();
        assert!((metric.distance(&a, &b) - (2.0 + 10.0 + 1.0)).abs() < 1e-12);
        assert!(metric.test_distance(&a, &b, 13.5));
        assert!(!metric.test_distance(&a, &b, 13.0));
    }

    #[test]
    fn invalid_coefficients_rejected() {
        let result = ManhattanDistance::new(DistanceCoefficients {
            match_coefficient: f64::NAN,
            ..DistanceCoefficients::default()
        });
        assert!(result.is_err());
    }
}
