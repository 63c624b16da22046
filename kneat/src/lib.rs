//! An implementation of NeuroEvolution of Augmenting Topologies,
//! with species formed by k-means clustering over genetic distance
//! instead of by a fixed compatibility threshold.
//!
//! Genomes are sorted sets of connection genes; nodes are implied by
//! connection endpoints. Structural mutations draw their ids from an
//! explicitly scoped [`InnovationRegistry`](genomics::InnovationRegistry),
//! so identical changes made to different genomes in the same scope
//! share ids. Decoding genomes into runnable networks is left to the
//! [`kneat-nn`] crate.
//!
//! # Example usage: Evolution of XOR function approximator, using `kneat-nn`
//! ```
//! use kneat::distance::ManhattanDistance;
//! use kneat::genomics::{GeneticConfig, Genome};
//! use kneat::populations::{PopulationConfig, PopulationFactory};
//! use kneat::speciation::{GeneticKMeans, SpeciationConfig};
//! use kneat_nn::{ActivationFunction, Phenotype};
//! use rand::{rngs::StdRng, SeedableRng};
//! use std::num::NonZeroUsize;
//!
//! fn evaluate_xor(genome: &Genome, config: &GeneticConfig) -> f64 {
//!     let mut network = match Phenotype::from_genome(genome, config, ActivationFunction::Logistic, 1) {
//!         Ok(network) => network,
//!         Err(_) => return 0.0,
//!     };
//!
//!     let values = [
//!         ([1.0, 0.0, 0.0], 0.0),
//!         ([1.0, 0.0, 1.0], 1.0),
//!         ([1.0, 1.0, 0.0], 1.0),
//!         ([1.0, 1.0, 1.0], 0.0),
//!     ];
//!
//!     let mut error = 0.0;
//!     for (input, output) in &values {
//!         match network.activate(input) {
//!             Ok(answer) => error += (answer[0] - output).abs(),
//!             Err(_) => return 0.0,
//!         }
//!     }
//!     (4.0 - error).powi(2)
//! }
//!
//! let genetic_config = GeneticConfig {
//!     input_count: NonZeroUsize::new(3).unwrap(),
//!     output_count: NonZeroUsize::new(1).unwrap(),
//!     acyclic: true,
//!     connection_weight_scale: 5.0,
//! };
//! let population_config = PopulationConfig {
//!     size: NonZeroUsize::new(150).unwrap(),
//!     initial_connectivity: 1.0,
//!     species_count: NonZeroUsize::new(8).unwrap(),
//!     ..PopulationConfig::default()
//! };
//!
//! let mut rng = StdRng::seed_from_u64(0);
//! let mut population = PopulationFactory::new(genetic_config.clone(), population_config)
//!     .unwrap()
//!     .create(
//!         GeneticKMeans::new(ManhattanDistance::default(), SpeciationConfig::default()).unwrap(),
//!         &mut rng,
//!     )
//!     .unwrap();
//!
//! for _ in 0..10 {
//!     population.evaluate_fitness(|g| evaluate_xor(g, &genetic_config));
//!     if population.champion().fitness() > 15.0 {
//!         println!("Solution found!: {}", population.champion());
//!         break;
//!     }
//!     if let Err(e) = population.evolve(&mut rng) {
//!         eprintln!("{}", e);
//!         break;
//!     }
//! }
//! ```
//!
//! [`kneat-nn`]: https://docs.rs/kneat-nn/

pub mod distance;
mod errors;
pub mod genomics;
pub mod populations;
pub mod reproduction;
pub mod speciation;

pub use errors::ConfigError;

/// Identifier of a structural feature: a node,
/// or a connection between two nodes.
pub type Innovation = usize;
