//! Genomes are the focus of evolution in NEAT.
//! They are a sorted collection of connection genes whose
//! endpoints imply the nodes of the network they encode.
//! Genomes are never mutated in place by reproduction;
//! children are built from copies of their parents' genes.

mod config;
mod cycles;
mod errors;
mod genes;
mod ids;
mod registry;

pub use config::GeneticConfig;
pub use cycles::{is_cyclic, would_create_cycle};
pub use errors::GeneValidityError;
pub use genes::{AlignedGenes, ConnectionGene, ConnectionGenes, GenePair};
pub use ids::IdAllocator;
pub use registry::{InnovationRegistry, InnovationSource, InnovationTracker, SharedInnovations};

use crate::Innovation;

use serde::{Deserialize, Serialize};

use std::fmt;

/// A genome: a sorted set of connection genes plus
/// the ids of the hidden nodes they connect.
///
/// Input and output nodes are not stored; their ids are
/// fixed by the [`GeneticConfig`] shared by the population.
/// The hidden node list always equals the set of hidden
/// endpoints over all genes, enabled or not.
///
/// Suports Serde for convenient genome saving and loading.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Genome {
    id: usize,
    birth_generation: usize,
    connections: ConnectionGenes,
    hidden_nodes: Vec<Innovation>,
    fitness: f64,
}

impl Genome {
    /// Creates a genome from its connection genes, deriving
    /// the hidden node list from their endpoints.
    ///
    /// # Examples
    /// ```
    /// use kneat::genomics::{ConnectionGene, ConnectionGenes, GeneticConfig, Genome};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(2).unwrap(),
    ///     output_count: NonZeroUsize::new(1).unwrap(),
    ///     ..GeneticConfig::default()
    /// };
    ///
    /// // Nodes 0 and 1 are inputs, 2 is the output; 5 is hidden.
    /// let connections: ConnectionGenes = vec![
    ///     ConnectionGene::new(3, 0, 5, 0.5),
    ///     ConnectionGene::new(4, 5, 2, -1.0),
    ///     ConnectionGene::new(6, 1, 2, 0.25),
    /// ]
    /// .into_iter()
    /// .collect();
    ///
    /// let genome = Genome::new(0, 0, connections, &config);
    ///
    /// assert_eq!(genome.hidden_nodes(), &[5]);
    /// assert_eq!(genome.complexity(), 3);
    /// assert!(genome.validate(&config).is_ok());
    /// ```
    pub fn new(
        id: usize,
        birth_generation: usize,
        connections: ConnectionGenes,
        config: &GeneticConfig,
    ) -> Genome {
        let hidden_nodes = Self::hidden_nodes_of(&connections, config);
        Genome::with_hidden_nodes(id, birth_generation, connections, hidden_nodes)
    }

    /// Builds a genome whose hidden node list is already known.
    pub(crate) fn with_hidden_nodes(
        id: usize,
        birth_generation: usize,
        connections: ConnectionGenes,
        hidden_nodes: Vec<Innovation>,
    ) -> Genome {
        debug_assert!(connections.is_strictly_sorted());
        debug_assert!(hidden_nodes.windows(2).all(|w| w[0] < w[1]));
        Genome {
            id,
            birth_generation,
            connections,
            hidden_nodes,
            fitness: 0.0,
        }
    }

    /// Collects the sorted, deduplicated hidden endpoints of `connections`.
    pub(crate) fn hidden_nodes_of(connections: &ConnectionGenes, config: &GeneticConfig) -> Vec<Innovation> {
        let mut hidden: Vec<Innovation> = connections
            .iter()
            .flat_map(|g| [g.source(), g.target()])
            .filter(|id| config.is_hidden(*id))
            .collect();
        hidden.sort_unstable();
        hidden.dedup();
        hidden
    }

    /// Returns the genome's id.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns the generation in which the genome was created.
    pub fn birth_generation(&self) -> usize {
        self.birth_generation
    }

    /// Returns the genome's connection genes,
    /// sorted by `(source, target)`.
    pub fn connections(&self) -> &ConnectionGenes {
        &self.connections
    }

    /// Returns the ids of the genome's hidden nodes,
    /// in increasing order.
    pub fn hidden_nodes(&self) -> &[Innovation] {
        &self.hidden_nodes
    }

    /// Returns `true` if `id` is one of the genome's hidden nodes.
    pub fn is_hidden_node(&self, id: Innovation) -> bool {
        self.hidden_nodes.binary_search(&id).is_ok()
    }

    /// Returns the genome's complexity, measured
    /// as its number of connection genes.
    pub fn complexity(&self) -> usize {
        self.connections.len()
    }

    /// Returns `true` if the genome's connections form no cycle.
    pub fn is_acyclic(&self) -> bool {
        !is_cyclic(&self.connections)
    }

    /// Returns the genome's fitness. Freshly
    /// created genomes have a fitness of 0.
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Sets the genome's fitness.
    ///
    /// # Examples
    /// ```
    /// use kneat::genomics::{ConnectionGenes, GeneticConfig, Genome};
    ///
    /// let mut genome = Genome::new(0, 0, ConnectionGenes::new(), &GeneticConfig::default());
    /// genome.set_fitness(12.5);
    ///
    /// assert_eq!(genome.fitness(), 12.5);
    /// ```
    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }

    /// Checks the genome's structural invariants: genes are sorted
    /// by endpoints and unique, no gene targets an input node, the
    /// hidden node list matches the genes' endpoints, and, for an
    /// acyclic configuration, the genes form no cycle.
    ///
    /// # Errors
    /// Returns the first violation found.
    ///
    /// # Examples
    /// ```
    /// use kneat::genomics::{ConnectionGene, GeneticConfig, GeneValidityError, Genome};
    ///
    /// let config = GeneticConfig::default(); // 1 input (id 0), 1 output (id 1), acyclic.
    ///
    /// let cyclic = Genome::new(
    ///     0,
    ///     0,
    ///     vec![
    ///         ConnectionGene::new(2, 0, 3, 1.0),
    ///         ConnectionGene::new(4, 3, 5, 1.0),
    ///         ConnectionGene::new(6, 5, 3, 1.0),
    ///     ]
    ///     .into_iter()
    ///     .collect(),
    ///     &config,
    /// );
    /// assert_eq!(cyclic.validate(&config), Err(GeneValidityError::Cyclic));
    ///
    /// let into_input = Genome::new(
    ///     1,
    ///     0,
    ///     vec![ConnectionGene::new(2, 1, 0, 1.0)].into_iter().collect(),
    ///     &config,
    /// );
    /// assert_eq!(into_input.validate(&config), Err(GeneValidityError::InputTarget(0)));
    /// ```
    pub fn validate(&self, config: &GeneticConfig) -> Result<(), GeneValidityError> {
        let genes = self.connections.as_slice();
        for pair in genes.windows(2) {
            if pair[0].endpoints() == pair[1].endpoints() {
                let (source, target) = pair[0].endpoints();
                return Err(GeneValidityError::DuplicateEndpoints(source, target));
            }
            if pair[0].endpoints() > pair[1].endpoints() {
                return Err(GeneValidityError::Unsorted);
            }
        }
        if let Some(gene) = genes.iter().find(|g| config.is_input(g.target())) {
            return Err(GeneValidityError::InputTarget(gene.target()));
        }
        if Self::hidden_nodes_of(&self.connections, config) != self.hidden_nodes {
            return Err(GeneValidityError::HiddenNodeMismatch);
        }
        if config.acyclic && is_cyclic(&self.connections) {
            return Err(GeneValidityError::Cyclic);
        }
        Ok(())
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Genome {} (gen. {}, fitness {:.4}) {{ hidden: {:?}, genes: [",
            self.id, self.birth_generation, self.fitness, self.hidden_nodes
        )?;
        for (i, gene) in self.connections.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", gene)?;
        }
        write!(f, "] }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;

    fn config(inputs: usize, outputs: usize) -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(inputs).unwrap(),
            output_count: NonZeroUsize::new(outputs).unwrap(),
            ..GeneticConfig::default()
        }
    }

    fn genome(pairs: &[(Innovation, Innovation)], config: &GeneticConfig) -> Genome {
        let connections = pairs
            .iter()
            .enumerate()
            .map(|(i, (s, t))| ConnectionGene::new(50 + i, *s, *t, 1.0))
            .collect();
        Genome::new(0, 0, connections, config)
    }

    #[test]
    fn hidden_nodes_derived_and_sorted() {
        let config = config(3, 1);
        let g = genome(&[(0, 9), (9, 7), (7, 3), (1, 3)], &config);
        assert_eq!(g.hidden_nodes(), &[7, 9]);
        assert!(g.is_hidden_node(9));
        assert!(!g.is_hidden_node(3));
    }

    #[test]
    fn disabled_genes_keep_hidden_nodes() {
        let config = config(1, 1);
        let mut connections: ConnectionGenes =
            vec![ConnectionGene::new(2, 0, 5, 1.0), ConnectionGene::new(3, 5, 1, 1.0)]
                .into_iter()
                .collect();
        connections.set_enabled_at(0, false);
        let g = Genome::new(0, 0, connections, &config);
        assert_eq!(g.hidden_nodes(), &[5]);
        assert!(g.validate(&config).is_ok());
    }

    #[test]
    fn hidden_node_mismatch_detected() {
        let config = config(1, 1);
        let g = Genome::with_hidden_nodes(
            0,
            0,
            vec![ConnectionGene::new(2, 0, 1, 1.0)].into_iter().collect(),
            vec![4],
        );
        assert_eq!(g.validate(&config), Err(GeneValidityError::HiddenNodeMismatch));
    }

    #[test]
    fn cycles_allowed_when_not_acyclic() {
        let config = GeneticConfig {
            acyclic: false,
            ..config(1, 1)
        };
        let g = genome(&[(0, 4), (4, 5), (5, 4), (5, 1)], &config);
        assert!(!g.is_acyclic());
        assert!(g.validate(&config).is_ok());
    }

    #[test]
    fn serde_round_trip_preserves_genome() {
        let config = config(2, 1);
        let mut g = genome(&[(0, 2), (1, 2)], &config);
        g.set_fitness(3.5);
        let json = serde_json::to_string(&g).unwrap();
        let back: Genome = serde_json::from_str(&json).unwrap();
        assert_eq!(g, back);
    }

    #[test]
    fn display_lists_genes() {
        let config = config(1, 1);
        let g = genome(&[(0, 1)], &config);
        assert_eq!(
            g.to_string(),
            "Genome 0 (gen. 0, fitness 0.0000) { hidden: [], genes: [50[0->1, 1.000]] }"
        );
    }
}
