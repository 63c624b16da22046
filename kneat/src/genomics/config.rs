use crate::errors::ConfigError;
use crate::Innovation;

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;
use std::ops::Range;

/// Configuration data shared by every genome
/// in a population.
///
/// Input nodes are given the ids `0..input_count`, and
/// output nodes the ids `input_count..input_count + output_count`.
/// These ids are the same in all genomes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneticConfig {
    /// Number of inputs in a genome.
    pub input_count: NonZeroUsize,
    /// Number of outputs in a genome.
    pub output_count: NonZeroUsize,
    /// Whether genomes must decode into acyclic networks.
    pub acyclic: bool,
    /// Maximum magnitude of a connection weight.
    pub connection_weight_scale: f64,
}

impl GeneticConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0 or `false`, or in the case of
    /// `NonZeroUsize`s, 1.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments,
    /// as a zero weight scale fails validation. It is meant as a
    /// way to fill in unused values during configuration
    /// instantiation.
    ///
    /// # Examples
    /// ```
    /// use kneat::genomics::GeneticConfig;
    ///
    /// let config = GeneticConfig {
    ///     acyclic: true,
    ///     connection_weight_scale: 5.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// assert!(config.validate().is_ok());
    /// assert!(GeneticConfig::zero().validate().is_err());
    /// ```
    pub const fn zero() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::MIN,
            output_count: NonZeroUsize::MIN,
            acyclic: false,
            connection_weight_scale: 0.0,
        }
    }

    /// Checks the configuration for malformed values.
    ///
    /// # Errors
    /// Returns an error if the weight scale is not
    /// a positive, finite number.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connection_weight_scale.is_finite() && self.connection_weight_scale > 0.0 {
            Ok(())
        } else {
            Err(ConfigError::WeightScale(self.connection_weight_scale))
        }
    }

    /// Ids of the input nodes.
    pub fn input_ids(&self) -> Range<Innovation> {
        0..self.input_count.get()
    }

    /// Ids of the output nodes.
    pub fn output_ids(&self) -> Range<Innovation> {
        self.input_count.get()..self.input_output_count()
    }

    /// Number of input and output nodes; also
    /// the lowest id a hidden node can have.
    pub fn input_output_count(&self) -> usize {
        self.input_count.get() + self.output_count.get()
    }

    /// Returns `true` if `id` belongs to an input node.
    pub fn is_input(&self, id: Innovation) -> bool {
        id < self.input_count.get()
    }

    /// Returns `true` if `id` belongs to a hidden node.
    pub fn is_hidden(&self, id: Innovation) -> bool {
        id >= self.input_output_count()
    }
}

impl Default for GeneticConfig {
    fn default() -> GeneticConfig {
        GeneticConfig {
            acyclic: true,
            connection_weight_scale: 5.0,
            ..GeneticConfig::zero()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_ranges() {
        let config = GeneticConfig {
            input_count: NonZeroUsize::new(3).unwrap(),
            output_count: NonZeroUsize::new(2).unwrap(),
            ..GeneticConfig::default()
        };
        assert_eq!(config.input_ids(), 0..3);
        assert_eq!(config.output_ids(), 3..5);
        assert!(config.is_input(2));
        assert!(!config.is_input(3));
        assert!(!config.is_hidden(4));
        assert!(config.is_hidden(5));
    }

    #[test]
    fn validate_weight_scale() {
        for scale in [0.0, -1.0, f64::INFINITY, f64::NAN] {
            let config = GeneticConfig {
                connection_weight_scale: scale,
                ..GeneticConfig::default()
            };
            assert!(config.validate().is_err());
        }
    }
}
