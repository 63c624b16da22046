//! Genetic distance between connection gene sets,
//! and centroids of sets of genomes.
//!
//! Genes are aligned on their `(source, target)` endpoints.
//! Genes present on one side only are compared against zero.

mod euclidean;
mod manhattan;

pub use euclidean::EuclideanDistance;
pub use manhattan::ManhattanDistance;

use crate::errors::ConfigError;
use crate::genomics::{ConnectionGene, ConnectionGenes};
use crate::Innovation;

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::HashMap;

/// A measure of genetic distance between two gene sets.
///
/// Implementors must be symmetric, and return 0
/// for identical gene sets.
pub trait DistanceMetric: Sync {
    /// Returns the distance between `a` and `b`.
    fn distance(&self, a: &ConnectionGenes, b: &ConnectionGenes) -> f64;

    /// Returns `true` if the distance between `a` and `b` is
    /// strictly less than `threshold`. May stop comparing genes as
    /// soon as the answer is known.
    fn test_distance(&self, a: &ConnectionGenes, b: &ConnectionGenes, threshold: f64) -> bool {
        self.distance(a, b) < threshold
    }

    /// Returns the centroid of `members`: every gene present in any
    /// member, weighted by the sum of its weights divided by the
    /// number of members (absent genes count as zero).
    ///
    /// Centroid genes are enabled, and carry the lowest innovation
    /// number among the member genes they stand for.
    ///
    /// # Examples
    /// ```
    /// use kneat::distance::{DistanceMetric, ManhattanDistance};
    /// use kneat::genomics::{ConnectionGene, ConnectionGenes};
    ///
    /// let a: ConnectionGenes = vec![ConnectionGene::new(4, 0, 3, 0.5)].into_iter().collect();
    /// let b: ConnectionGenes = vec![
    ///     ConnectionGene::new(4, 0, 3, 1.5),
    ///     ConnectionGene::new(5, 1, 3, -0.2),
    /// ]
    /// .into_iter()
    /// .collect();
    ///
    /// let centroid = ManhattanDistance::default().centroid(&[&a, &b]);
    /// let weights: Vec<f64> = centroid.iter().map(|g| g.weight()).collect();
    /// assert_eq!(weights, vec![1.0, -0.1]);
    /// ```
    fn centroid(&self, members: &[&ConnectionGenes]) -> ConnectionGenes {
        mean_centroid(members)
    }
}

/// Coefficients applied to each term of a distance.
///
/// Matching genes contribute `match_coefficient` times their
/// weight difference; unmatched genes contribute
/// `mismatch_constant` plus `mismatch_coefficient` times
/// their weight. The defaults give the plain distance.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DistanceCoefficients {
    /// Factor for the weight difference of matching genes.
    pub match_coefficient: f64,
    /// Factor for the weight of unmatched genes.
    pub mismatch_coefficient: f64,
    /// Fixed penalty for each unmatched gene.
    pub mismatch_constant: f64,
}

impl DistanceCoefficients {
    /// Returns coefficients with all values set to 0.
    pub const fn zero() -> DistanceCoefficients {
        DistanceCoefficients {
            match_coefficient: 0.0,
            mismatch_coefficient: 0.0,
            mismatch_constant: 0.0,
        }
    }

    /// Checks the coefficients for malformed values.
    ///
    /// # Errors
    /// Returns an error if any coefficient is negative or not finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("match_coefficient", self.match_coefficient),
            ("mismatch_coefficient", self.mismatch_coefficient),
            ("mismatch_constant", self.mismatch_constant),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::DistanceCoefficient(name, value));
            }
        }
        Ok(())
    }

    pub(crate) fn is_plain(&self) -> bool {
        self.match_coefficient == 1.0 && self.mismatch_coefficient == 1.0 && self.mismatch_constant == 0.0
    }
}

impl Default for DistanceCoefficients {
    fn default() -> DistanceCoefficients {
        DistanceCoefficients {
            match_coefficient: 1.0,
            mismatch_coefficient: 1.0,
            mismatch_constant: 0.0,
        }
    }
}

fn mean_centroid(members: &[&ConnectionGenes]) -> ConnectionGenes {
    match members {
        [] => ConnectionGenes::new(),
        [single] => {
            let mut centroid = (*single).clone();
            for i in 0..centroid.len() {
                centroid.set_enabled_at(i, true);
            }
            centroid
        }
        _ => {
            let capacity = members.iter().map(|m| m.len()).max().unwrap_or(0);
            let mut totals: HashMap<(Innovation, Innovation), (Innovation, f64), RandomState> =
                HashMap::with_capacity_and_hasher(capacity, RandomState::new());

            for gene in members.iter().flat_map(|m| m.iter()) {
                let entry = totals
                    .entry(gene.endpoints())
                    .or_insert((gene.innovation(), 0.0));
                entry.0 = entry.0.min(gene.innovation());
                entry.1 += gene.weight();
            }

            let count = members.len() as f64;
            let mut genes: Vec<ConnectionGene> = totals
                .into_iter()
                .map(|((source, target), (innovation, total))| {
                    ConnectionGene::new(innovation, source, target, total / count)
                })
                .collect();
            genes.sort_unstable_by_key(|g| g.endpoints());
            ConnectionGenes::from_sorted(genes)
        }
    }
}
