//! Decoding of genomes into directed graphs over
//! contiguous node indices.
//!
//! Nodes are ordered inputs first, then outputs, then
//! hidden nodes in id order. Only enabled connection
//! genes are decoded. Acyclic genomes are further
//! layered by node depth, see [`AcyclicGraph`].
mod acyclic;

pub use acyclic::{AcyclicGraph, Layer};

use crate::errors::NetworkError;
use kneat::genomics::{GeneticConfig, Genome};
use kneat::Innovation;

use ahash::RandomState;

use std::collections::HashMap;

/// A directed, weighted graph whose nodes are
/// indexed `0..node_count()`.
#[derive(Clone, Debug, PartialEq)]
pub struct DirectedGraph {
    input_count: usize,
    output_count: usize,
    node_ids: Vec<Innovation>,
    connections: Vec<(usize, usize)>,
    weights: Vec<f64>,
}

impl DirectedGraph {
    /// Decodes the enabled connections of a genome.
    ///
    /// # Examples
    /// ```
    /// use kneat::genomics::{ConnectionGene, GeneticConfig, Genome};
    /// use kneat_nn::graphs::DirectedGraph;
    ///
    /// let config = GeneticConfig::default();
    /// let mut disabled = ConnectionGene::new(4, 1, 9, 1.0);
    /// disabled.set_enabled(false);
    /// let connections = vec![
    ///     ConnectionGene::new(2, 0, 1, 0.5),
    ///     disabled,
    ///     ConnectionGene::new(3, 9, 1, -1.0),
    /// ];
    /// let genome = Genome::new(0, 0, connections.into_iter().collect(), &config);
    ///
    /// let graph = DirectedGraph::from_genome(&genome, &config);
    /// assert_eq!(graph.node_ids(), &[0, 1, 9]);
    /// assert_eq!(graph.connections(), &[(0, 1), (2, 1)]);
    /// assert_eq!(graph.weights(), &[0.5, -1.0]);
    /// ```
    pub fn from_genome(genome: &Genome, config: &GeneticConfig) -> DirectedGraph {
        let input_ids: Vec<Innovation> = config.input_ids().collect();
        let output_ids: Vec<Innovation> = config.output_ids().collect();
        Self::build(
            &input_ids,
            &output_ids,
            genome.hidden_nodes().to_vec(),
            genome
                .connections()
                .iter()
                .filter(|g| g.enabled())
                .map(|g| (g.source(), g.target(), g.weight())),
        )
    }

    /// Builds a graph from explicit input and output
    /// node ids and `(source, target, weight)` triples.
    /// Every other endpoint becomes a hidden node.
    ///
    /// # Examples
    /// ```
    /// use kneat_nn::graphs::DirectedGraph;
    ///
    /// let graph = DirectedGraph::from_connections(
    ///     &[0, 1],
    ///     &[3],
    ///     &[(0, 2, 0.5), (1, 2, 0.3), (2, 3, 0.8)],
    /// );
    /// assert_eq!(graph.node_ids(), &[0, 1, 3, 2]);
    /// assert_eq!(graph.connections(), &[(0, 3), (1, 3), (3, 2)]);
    /// ```
    pub fn from_connections(
        input_ids: &[Innovation],
        output_ids: &[Innovation],
        connections: &[(Innovation, Innovation, f64)],
    ) -> DirectedGraph {
        let mut hidden: Vec<Innovation> = connections
            .iter()
            .flat_map(|&(s, t, _)| [s, t])
            .filter(|id| !input_ids.contains(id) && !output_ids.contains(id))
            .collect();
        hidden.sort_unstable();
        hidden.dedup();
        Self::build(input_ids, output_ids, hidden, connections.iter().copied())
    }

    fn build(
        input_ids: &[Innovation],
        output_ids: &[Innovation],
        hidden_ids: Vec<Innovation>,
        connections: impl Iterator<Item = (Innovation, Innovation, f64)>,
    ) -> DirectedGraph {
        let mut node_ids = Vec::with_capacity(input_ids.len() + output_ids.len() + hidden_ids.len());
        node_ids.extend_from_slice(input_ids);
        node_ids.extend_from_slice(output_ids);
        node_ids.extend(hidden_ids);

        let node_index_from_id: HashMap<_, _, RandomState> = node_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, i))
            .collect();

        let mut indexed: Vec<((usize, usize), f64)> = connections
            .map(|(s, t, w)| ((node_index_from_id[&s], node_index_from_id[&t]), w))
            .collect();
        indexed.sort_unstable_by_key(|(endpoints, _)| *endpoints);
        debug_assert!(indexed.windows(2).all(|w| w[0].0 != w[1].0));
        debug_assert!(
            indexed.iter().all(|((_, t), _)| *t >= input_ids.len()),
            "connection into an input node"
        );
        let (connections, weights) = indexed.into_iter().unzip();

        DirectedGraph {
            input_count: input_ids.len(),
            output_count: output_ids.len(),
            node_ids,
            connections,
            weights,
        }
    }

    /// Returns the number of input nodes,
    /// which occupy the first indices.
    pub fn input_count(&self) -> usize {
        self.input_count
    }

    /// Returns the number of output nodes,
    /// which follow the inputs.
    pub fn output_count(&self) -> usize {
        self.output_count
    }

    /// Returns the total number of nodes.
    pub fn node_count(&self) -> usize {
        self.node_ids.len()
    }

    /// Returns the genome node id of each node index.
    pub fn node_ids(&self) -> &[Innovation] {
        &self.node_ids
    }

    /// Returns `(source, target)` index pairs,
    /// sorted by source then target.
    pub fn connections(&self) -> &[(usize, usize)] {
        &self.connections
    }

    /// Returns connection weights, parallel to
    /// [`connections`](DirectedGraph::connections).
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

/// A genome decoded according to its
/// configuration's cyclicity mode.
#[derive(Clone, Debug, PartialEq)]
pub enum DecodedGraph {
    /// A graph layered by node depth.
    Acyclic(AcyclicGraph),
    /// A graph which may contain cycles.
    Cyclic(DirectedGraph),
}

/// Decodes a genome, layering it by depth
/// when `config.acyclic` is set.
///
/// # Errors
/// Returns [`NetworkError::CyclicGraph`] if the genome
/// is meant to be acyclic but contains a cycle.
///
/// # Examples
/// ```
/// use kneat::genomics::{ConnectionGene, GeneticConfig, Genome};
/// use kneat_nn::graphs::{decode, DecodedGraph};
///
/// let config = GeneticConfig::default();
/// let genome = Genome::new(0, 0, vec![ConnectionGene::new(2, 0, 1, 1.0)].into_iter().collect(), &config);
///
/// assert!(matches!(decode(&genome, &config), Ok(DecodedGraph::Acyclic(_))));
/// ```
pub fn decode(genome: &Genome, config: &GeneticConfig) -> Result<DecodedGraph, NetworkError> {
    let graph = DirectedGraph::from_genome(genome, config);
    if config.acyclic {
        AcyclicGraph::new(graph).map(DecodedGraph::Acyclic).map_err(|e| {
            log::debug!("genome {} failed to decode: {}", genome.id(), e);
            e
        })
    } else {
        Ok(DecodedGraph::Cyclic(graph))
    }
}
