use crate::errors::{check_probability, ConfigError};

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for population generation
/// and evolution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Size of the population.
    pub size: NonZeroUsize,
    /// Proportion of the possible input-to-output
    /// connections present in each initial genome.
    pub initial_connectivity: f64,
    /// Number of species to cluster the initial population into.
    pub species_count: NonZeroUsize,
    /// Top proportion of each species copied as-is
    /// to the next generation.
    pub elitism_proportion: f64,
    /// Top proportion of each species which can
    /// produce offspring.
    pub selection_proportion: f64,
    /// Chance that a child will be the result of sexual
    /// reproduction (as opposed to asexual).
    pub sexual_reproduction_chance: f64,
    /// Chance that a sexually produced child's second
    /// parent is picked from another species.
    pub interspecies_mating_chance: f64,
}

impl PopulationConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, or in the case of
    /// `NonZeroUsize`s, 1.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to abbreviate configuration
    /// instantiation, or to fill in unused values.
    ///
    /// # Examples
    /// ```
    /// use kneat::populations::PopulationConfig;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = PopulationConfig {
    ///     size: NonZeroUsize::new(50).unwrap(),
    ///     selection_proportion: 0.3,
    ///     ..PopulationConfig::zero()
    /// };
    /// assert!(config.validate().is_ok());
    /// ```
    pub const fn zero() -> PopulationConfig {
        PopulationConfig {
            size: NonZeroUsize::MIN,
            initial_connectivity: 0.0,
            species_count: NonZeroUsize::MIN,
            elitism_proportion: 0.0,
            selection_proportion: 0.0,
            sexual_reproduction_chance: 0.0,
            interspecies_mating_chance: 0.0,
        }
    }

    /// Checks the configuration for malformed values.
    ///
    /// # Errors
    /// Returns an error if a proportion or chance lies
    /// outside `[0, 1]`, or if more species are requested
    /// than there are genomes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_probability("initial_connectivity", self.initial_connectivity)?;
        check_probability("elitism_proportion", self.elitism_proportion)?;
        check_probability("selection_proportion", self.selection_proportion)?;
        check_probability("sexual_reproduction_chance", self.sexual_reproduction_chance)?;
        check_probability("interspecies_mating_chance", self.interspecies_mating_chance)?;
        if self.species_count > self.size {
            return Err(ConfigError::SpeciesCount {
                requested: self.species_count.get(),
                available: self.size.get(),
            });
        }
        Ok(())
    }
}

impl Default for PopulationConfig {
    fn default() -> PopulationConfig {
        PopulationConfig {
            size: NonZeroUsize::new(150).unwrap_or(NonZeroUsize::MIN),
            initial_connectivity: 0.05,
            species_count: NonZeroUsize::new(10).unwrap_or(NonZeroUsize::MIN),
            elitism_proportion: 0.2,
            selection_proportion: 0.2,
            sexual_reproduction_chance: 0.5,
            interspecies_mating_chance: 0.01,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(PopulationConfig::default().validate().is_ok());
        assert!(PopulationConfig::zero().validate().is_ok());
    }

    #[test]
    fn rejects_excess_species() {
        let config = PopulationConfig {
            size: NonZeroUsize::new(4).unwrap(),
            species_count: NonZeroUsize::new(5).unwrap(),
            ..PopulationConfig::zero()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::SpeciesCount {
                requested: 5,
                available: 4
            })
        );
    }

    #[test]
    fn rejects_bad_connectivity() {
        let config = PopulationConfig {
            initial_connectivity: 1.2,
            ..PopulationConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ProbabilityOutOfRange("initial_connectivity", 1.2))
        );
    }
}
