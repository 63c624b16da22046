//! Speciation partitions a population into clusters
//! of genetically similar genomes ("species"), protecting
//! structural innovations from competing directly with
//! the whole population.

mod config;
mod kmeans;
mod species;

pub use config::SpeciationConfig;
pub use kmeans::GeneticKMeans;
pub use species::{Species, SpeciesID};

use crate::errors::ConfigError;
use crate::genomics::Genome;

use rand::Rng;

/// A method of clustering genomes into species.
///
/// Species refer to genomes by their position in the slice
/// passed in; every genome belongs to exactly one species.
pub trait SpeciationStrategy {
    /// Clusters `genomes` into at most `species_count`
    /// species, discarding any previous partition.
    ///
    /// # Errors
    /// Returns an error if `species_count` is 0 or
    /// larger than the number of genomes.
    fn speciate_all<R: Rng + ?Sized>(
        &self,
        genomes: &[Genome],
        species_count: usize,
        rng: &mut R,
    ) -> Result<Vec<Species>, ConfigError>;

    /// Adds the genomes at positions `new_genomes` to an
    /// existing partition of the rest of `genomes`.
    ///
    /// # Errors
    /// Returns an error if there are genomes to add
    /// but no species to add them to.
    fn speciate_add(
        &self,
        genomes: &[Genome],
        new_genomes: &[usize],
        species: &mut Vec<Species>,
    ) -> Result<(), ConfigError>;
}
