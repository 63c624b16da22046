//! # kneat-nn
//! Decoding of [`kneat`](https://crates.io/crates/kneat) genomes into
//! runnable neural networks.
//!
//! A genome is first decoded into a [`DirectedGraph`] over contiguous node
//! indices. Acyclic genomes are further layered by depth into an
//! [`AcyclicGraph`]. Two network implementations run these graphs:
//! - [`AcyclicNetwork`]: a single layer-by-layer pass per activation,
//!   best suited for function approximation.
//! - [`CyclicNetwork`]: a fixed number of timesteps per activation,
//!   for recurrent genomes and real-time control tasks.
//!
//! [`Phenotype`] picks between the two according to the genome's
//! configuration.
//!
//! [`DirectedGraph`]: crate::graphs::DirectedGraph
//! [`AcyclicGraph`]: crate::graphs::AcyclicGraph
//! [`AcyclicNetwork`]: crate::networks::AcyclicNetwork
//! [`CyclicNetwork`]: crate::networks::CyclicNetwork
//!
//! # Example usage: Evaluating an XOR approximator
//! ```
//! use kneat::genomics::{ConnectionGene, GeneticConfig, Genome};
//! use kneat_nn::{ActivationFunction, Phenotype};
//! use std::num::NonZeroUsize;
//!
//! // Allowed error margin for network answers.
//! const ERROR_MARGIN: f64 = 0.3;
//!
//! fn evaluate_xor(genome: &Genome, config: &GeneticConfig) -> f64 {
//!     let mut network = match Phenotype::from_genome(genome, config, ActivationFunction::LogisticSteep, 1) {
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
//!     let mut errors = [0.0; 4];
//!     for (i, (input, output)) in values.iter().enumerate() {
//!         errors[i] = match network.activate(input) {
//!             Ok(answer) => (answer[0] - output).abs(),
//!             Err(_) => return 0.0,
//!         };
//!         if errors[i] < ERROR_MARGIN {
//!             errors[i] = 0.0;
//!         }
//!     }
//!
//!     (4.0 - errors.iter().sum::<f64>()).powi(2)
//! }
//!
//! let config = GeneticConfig {
//!     input_count: NonZeroUsize::new(3).unwrap(),
//!     output_count: NonZeroUsize::new(1).unwrap(),
//!     acyclic: true,
//!     connection_weight_scale: 5.0,
//! };
//!
//! // A hand-wired solution: hidden node 4 detects "both inputs on".
//! let connections = vec![
//!     ConnectionGene::new(10, 0, 3, -1.0),
//!     ConnectionGene::new(11, 1, 3, 2.0),
//!     ConnectionGene::new(12, 2, 3, 2.0),
//!     ConnectionGene::new(13, 0, 4, -3.0),
//!     ConnectionGene::new(14, 1, 4, 2.0),
//!     ConnectionGene::new(15, 2, 4, 2.0),
//!     ConnectionGene::new(16, 4, 3, -5.0),
//! ];
//! let genome = Genome::new(0, 0, connections.into_iter().collect(), &config);
//!
//! assert_eq!(evaluate_xor(&genome, &config), 16.0);
//! ```
pub mod activation;
mod errors;
pub mod graphs;
pub mod networks;

pub use activation::ActivationFunction;
pub use errors::NetworkError;
pub use graphs::{decode, DecodedGraph};
pub use networks::Phenotype;
