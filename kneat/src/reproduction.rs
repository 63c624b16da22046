//! Operators that create offspring genomes, either by
//! mutating a single parent or by recombining two.
//!
//! Structural mutations request innovation ids through an
//! [`InnovationSource`](crate::genomics::InnovationSource),
//! so that identical changes made in the same generation
//! are given identical ids.

mod asexual;
mod errors;
mod recombination;
mod settings;
mod weights;

pub use asexual::{AsexualReproduction, ComplexityRegulationMode};
pub use errors::MutationError;
pub use recombination::UniformCrossover;
pub use settings::{AsexualSettings, RecombinationSettings};
pub use weights::{GeneSelection, WeightMutationScheme, WeightMutationStrategy, WeightPerturbation};

use serde::{Deserialize, Serialize};

/// The kinds of asexual mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationType {
    /// Weight perturbation or reset.
    ConnectionWeight = 0,
    /// Split a connection with a new node.
    AddNode = 1,
    /// Add a connection between unconnected nodes.
    AddConnection = 2,
    /// Remove a connection.
    DeleteConnection = 3,
}

impl MutationType {
    /// Number of mutation types.
    pub const COUNT: usize = 4;

    /// Every mutation type, in discriminant order.
    pub const ALL: [MutationType; MutationType::COUNT] = [
        MutationType::ConnectionWeight,
        MutationType::AddNode,
        MutationType::AddConnection,
        MutationType::DeleteConnection,
    ];

    /// Returns whether this mutation may change a genome's topology.
    pub fn is_structural(self) -> bool {
        !matches!(self, MutationType::ConnectionWeight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_matches_discriminants() {
        for (i, mutation_type) in MutationType::ALL.iter().enumerate() {
            assert_eq!(*mutation_type as usize, i);
        }
        assert!(!MutationType::ConnectionWeight.is_structural());
        assert!(MutationType::DeleteConnection.is_structural());
    }
}
