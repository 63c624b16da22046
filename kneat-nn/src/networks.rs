//! Runnable networks built from decoded graphs.
//!
//! The [`AcyclicNetwork`] type activates a depth-layered
//! graph in a single pass, and is best suited for function
//! approximation tasks.
//!
//! The [`CyclicNetwork`] type runs a fixed number of
//! timesteps per activation and keeps its state between
//! activations, making it suited to recurrent and
//! real-time control tasks.
mod acyclic;
mod cyclic;

pub use acyclic::AcyclicNetwork;
pub use cyclic::{CyclicNetwork, RelaxOutcome};

use crate::activation::ActivationFunction;
use crate::errors::NetworkError;
use crate::graphs::{decode, DecodedGraph};
use kneat::genomics::{GeneticConfig, Genome};

/// The network expressed by a genome, acyclic or
/// cyclic according to its configuration.
#[derive(Clone, Debug)]
pub enum Phenotype {
    Acyclic(AcyclicNetwork),
    Cyclic(CyclicNetwork),
}

impl Phenotype {
    /// Decodes `genome` and builds the matching network.
    /// `cycles_per_activation` is only used for cyclic
    /// configurations.
    ///
    /// # Errors
    /// Returns an error if decoding fails, or if a cyclic
    /// network is requested with zero cycles per activation.
    ///
    /// # Examples
    /// ```
    /// use kneat::genomics::{ConnectionGene, GeneticConfig, Genome};
    /// use kneat_nn::{ActivationFunction, Phenotype};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(2).unwrap(),
    ///     acyclic: false,
    ///     ..GeneticConfig::default()
    /// };
    /// let connections = vec![
    ///     ConnectionGene::new(3, 0, 2, 1.0),
    ///     ConnectionGene::new(4, 1, 2, -1.0),
    /// ];
    /// let genome = Genome::new(0, 0, connections.into_iter().collect(), &config);
    ///
    /// let mut network = Phenotype::from_genome(&genome, &config, ActivationFunction::ReLU, 1).unwrap();
    /// assert!(matches!(network, Phenotype::Cyclic(_)));
    /// assert_eq!(network.activate(&[2.0, 0.5]).unwrap(), vec![1.5]);
    /// ```
    pub fn from_genome(
        genome: &Genome,
        config: &GeneticConfig,
        activation: ActivationFunction,
        cycles_per_activation: usize,
    ) -> Result<Phenotype, NetworkError> {
        match decode(genome, config)? {
            DecodedGraph::Acyclic(graph) => Ok(Phenotype::Acyclic(AcyclicNetwork::new(graph, activation))),
            DecodedGraph::Cyclic(graph) => {
                CyclicNetwork::new(graph, activation, cycles_per_activation).map(Phenotype::Cyclic)
            }
        }
    }

    /// Sets the inputs, activates, and returns the outputs.
    /// Cyclic networks keep their state from previous calls;
    /// see [`reset`](Phenotype::reset).
    ///
    /// # Errors
    /// Returns an error if the length of `inputs` is not
    /// the network's input count.
    pub fn activate(&mut self, inputs: &[f64]) -> Result<Vec<f64>, NetworkError> {
        match self {
            Phenotype::Acyclic(network) => network.activate_with(inputs),
            Phenotype::Cyclic(network) => {
                network.set_inputs(inputs)?;
                network.activate();
                Ok(network.outputs())
            }
        }
    }

    /// Clears any state carried between activations.
    pub fn reset(&mut self) {
        if let Phenotype::Cyclic(network) = self {
            network.reset();
        }
    }

    /// Returns the output values of the last activation.
    pub fn outputs(&self) -> Vec<f64> {
        match self {
            Phenotype::Acyclic(network) => network.outputs(),
            Phenotype::Cyclic(network) => network.outputs(),
        }
    }
}
