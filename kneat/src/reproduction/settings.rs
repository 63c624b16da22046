use super::MutationType;
use crate::errors::{check_probability, check_probability_sum, ConfigError};

use serde::{Deserialize, Serialize};

/// Probabilities of each kind of asexual mutation.
/// They must add up to 1.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AsexualSettings {
    /// Chance of perturbing or resetting connection weights.
    pub connection_weight_mutation_probability: f64,
    /// Chance of splitting a connection with a new node.
    pub add_node_mutation_probability: f64,
    /// Chance of adding a new connection.
    pub add_connection_mutation_probability: f64,
    /// Chance of deleting a connection.
    pub delete_connection_mutation_probability: f64,
}

impl AsexualSettings {
    /// Returns settings with all probabilities set to 0.
    ///
    /// # Note
    /// This value does not pass validation; it is meant
    /// to fill in unused values during instantiation.
    pub const fn zero() -> AsexualSettings {
        AsexualSettings {
            connection_weight_mutation_probability: 0.0,
            add_node_mutation_probability: 0.0,
            add_connection_mutation_probability: 0.0,
            delete_connection_mutation_probability: 0.0,
        }
    }

    /// Settings that never add structure, used
    /// to shrink genomes back down.
    ///
    /// # Examples
    /// ```
    /// use kneat::reproduction::AsexualSettings;
    ///
    /// let settings = AsexualSettings::simplifying();
    /// assert_eq!(settings.add_node_mutation_probability, 0.0);
    /// assert!(settings.validate().is_ok());
    /// ```
    pub const fn simplifying() -> AsexualSettings {
        AsexualSettings {
            connection_weight_mutation_probability: 0.6,
            delete_connection_mutation_probability: 0.4,
            ..AsexualSettings::zero()
        }
    }

    /// Checks that every value is a probability
    /// and that they add up to 1.
    ///
    /// # Errors
    /// Returns the first malformed value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_probability(
            "connection_weight_mutation_probability",
            self.connection_weight_mutation_probability,
        )?;
        check_probability("add_node_mutation_probability", self.add_node_mutation_probability)?;
        check_probability(
            "add_connection_mutation_probability",
            self.add_connection_mutation_probability,
        )?;
        check_probability(
            "delete_connection_mutation_probability",
            self.delete_connection_mutation_probability,
        )?;
        check_probability_sum("asexual mutation", self.probabilities(false).iter().sum())
    }

    /// Returns the probabilities indexed by [`MutationType`].
    /// When `non_destructive` is set, connection deletion
    /// is given probability 0.
    pub(crate) fn probabilities(&self, non_destructive: bool) -> [f64; MutationType::COUNT] {
        let mut probabilities = [0.0; MutationType::COUNT];
        probabilities[MutationType::ConnectionWeight as usize] =
            self.connection_weight_mutation_probability;
        probabilities[MutationType::AddNode as usize] = self.add_node_mutation_probability;
        probabilities[MutationType::AddConnection as usize] = self.add_connection_mutation_probability;
        if !non_destructive {
            probabilities[MutationType::DeleteConnection as usize] =
                self.delete_connection_mutation_probability;
        }
        probabilities
    }
}

impl Default for AsexualSettings {
    fn default() -> AsexualSettings {
        AsexualSettings {
            connection_weight_mutation_probability: 0.94,
            add_node_mutation_probability: 0.01,
            add_connection_mutation_probability: 0.025,
            delete_connection_mutation_probability: 0.025,
        }
    }
}

/// Settings for uniform crossover.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecombinationSettings {
    /// Chance of inheriting each gene found only in the less
    /// fit parent. At 0, such genes are never inherited.
    pub secondary_parent_gene_probability: f64,
    /// Whether genes found in both parents are taken from each
    /// parent in proportion to its fitness, instead of evenly.
    pub fitness_weighted: bool,
}

impl RecombinationSettings {
    /// Returns settings with all values 0 or `false`,
    /// which are also the defaults.
    pub const fn zero() -> RecombinationSettings {
        RecombinationSettings {
            secondary_parent_gene_probability: 0.0,
            fitness_weighted: false,
        }
    }

    /// Checks that the secondary parent gene chance is a probability.
    ///
    /// # Errors
    /// Returns an error if it is outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_probability(
            "secondary_parent_gene_probability",
            self.secondary_parent_gene_probability,
        )
    }
}

impl Default for RecombinationSettings {
    fn default() -> RecombinationSettings {
        RecombinationSettings::zero()
    }
}
