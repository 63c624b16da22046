use crate::errors::{check_probability, check_probability_sum, ConfigError};
use crate::genomics::ConnectionGenes;

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::index;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// Which genes a weight mutation acts on.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum GeneSelection {
    /// This many distinct genes, or all of them if there are fewer.
    Cardinal(usize),
    /// This proportion of the genes, rounded, and at least one.
    Proportion(f64),
}

impl GeneSelection {
    fn count(&self, len: usize) -> usize {
        match *self {
            GeneSelection::Cardinal(n) => n.min(len),
            GeneSelection::Proportion(_) if len == 0 => 0,
            GeneSelection::Proportion(p) => ((p * len as f64).round() as usize).clamp(1, len),
        }
    }
}

/// How a selected weight is changed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum WeightPerturbation {
    /// Adds Gaussian noise with standard deviation `sigma`.
    Delta { sigma: f64 },
    /// Replaces the weight with a fresh uniform random value.
    Reset,
}

/// A gene selection rule paired with a perturbation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightMutationStrategy {
    /// Genes to mutate.
    pub selection: GeneSelection,
    /// Change applied to each selected weight.
    pub perturbation: WeightPerturbation,
}

/// A weighted set of weight mutation strategies,
/// of which one is picked for each mutation.
///
/// Mutated weights are kept within
/// `±connection_weight_scale`.
#[derive(Clone, Debug)]
pub struct WeightMutationScheme {
    strategies: Vec<(f64, WeightMutationStrategy)>,
    distribution: WeightedIndex<f64>,
}

impl WeightMutationScheme {
    /// Builds a scheme from `(probability, strategy)` pairs.
    ///
    /// # Errors
    /// Returns an error if there are no strategies, if a
    /// probability is malformed or they do not add up to 1,
    /// or if a delta has a non-positive standard deviation.
    ///
    /// # Examples
    /// ```
    /// use kneat::reproduction::{
    ///     GeneSelection, WeightMutationScheme, WeightMutationStrategy, WeightPerturbation,
    /// };
    ///
    /// let scheme = WeightMutationScheme::new(vec![
    ///     (
    ///         0.9,
    ///         WeightMutationStrategy {
    ///             selection: GeneSelection::Cardinal(1),
    ///             perturbation: WeightPerturbation::Delta { sigma: 0.1 },
    ///         },
    ///     ),
    ///     (
    ///         0.1,
    ///         WeightMutationStrategy {
    ///             selection: GeneSelection::Proportion(0.5),
    ///             perturbation: WeightPerturbation::Reset,
    ///         },
    ///     ),
    /// ]);
    /// assert!(scheme.is_ok());
    /// assert!(WeightMutationScheme::new(vec![]).is_err());
    /// ```
    pub fn new(
        strategies: Vec<(f64, WeightMutationStrategy)>,
    ) -> Result<WeightMutationScheme, ConfigError> {
        if strategies.is_empty() {
            return Err(ConfigError::EmptyWeightScheme);
        }
        for (probability, strategy) in &strategies {
            check_probability("weight mutation strategy", *probability)?;
            if let GeneSelection::Proportion(p) = strategy.selection {
                check_probability("gene selection proportion", p)?;
            }
            if let WeightPerturbation::Delta { sigma } = strategy.perturbation {
                if !sigma.is_finite() || sigma <= 0.0 {
                    return Err(ConfigError::Sigma(sigma));
                }
            }
        }
        check_probability_sum(
            "weight mutation strategy",
            strategies.iter().map(|(p, _)| p).sum(),
        )?;
        let distribution = WeightedIndex::new(strategies.iter().map(|(p, _)| *p))
            .map_err(|_| ConfigError::EmptyWeightScheme)?;

        Ok(WeightMutationScheme {
            strategies,
            distribution,
        })
    }

    /// The default scheme for weights bounded by `weight_scale`:
    /// mostly small Gaussian nudges to a few genes, with an
    /// occasional reset.
    ///
    /// # Errors
    /// Returns an error if `weight_scale` is not a
    /// positive, finite number.
    pub fn default_for(weight_scale: f64) -> Result<WeightMutationScheme, ConfigError> {
        if !weight_scale.is_finite() || weight_scale <= 0.0 {
            return Err(ConfigError::WeightScale(weight_scale));
        }
        let delta = WeightPerturbation::Delta {
            sigma: 0.05 * weight_scale,
        };
        let strategy = |selection, perturbation| WeightMutationStrategy {
            selection,
            perturbation,
        };
        WeightMutationScheme::new(vec![
            (0.59, strategy(GeneSelection::Cardinal(1), delta)),
            (0.29, strategy(GeneSelection::Cardinal(2), delta)),
            (0.09, strategy(GeneSelection::Cardinal(3), delta)),
            (0.02, strategy(GeneSelection::Proportion(0.02), delta)),
            (0.008, strategy(GeneSelection::Cardinal(1), WeightPerturbation::Reset)),
            (0.001, strategy(GeneSelection::Cardinal(2), WeightPerturbation::Reset)),
            (0.001, strategy(GeneSelection::Cardinal(3), WeightPerturbation::Reset)),
        ])
    }

    /// Returns the scheme's strategies and their probabilities.
    pub fn strategies(&self) -> &[(f64, WeightMutationStrategy)] {
        &self.strategies
    }

    /// Mutates the weights of `genes` with a randomly chosen
    /// strategy. Topology is never changed.
    pub fn mutate<R: Rng + ?Sized>(&self, genes: &mut ConnectionGenes, weight_scale: f64, rng: &mut R) {
        if genes.is_empty() {
            return;
        }
        let strategy = self.strategies[self.distribution.sample(rng)].1;
        let count = strategy.selection.count(genes.len());

        for i in index::sample(rng, genes.len(), count) {
            let weight = match strategy.perturbation {
                WeightPerturbation::Delta { sigma } => {
                    let noise: f64 = rng.sample(StandardNormal);
                    genes.as_slice()[i].weight() + noise * sigma
                }
                WeightPerturbation::Reset => rng.gen_range(-weight_scale..=weight_scale),
            };
            genes.set_weight_at(i, weight.clamp(-weight_scale, weight_scale));
        }
    }
}
