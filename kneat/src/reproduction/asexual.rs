use super::{AsexualSettings, MutationError, MutationType, WeightMutationScheme};
use crate::errors::ConfigError;
use crate::genomics::{
    would_create_cycle, ConnectionGene, ConnectionGenes, GeneticConfig, Genome, InnovationSource,
};
use crate::Innovation;

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of node pairs tried before giving up
/// on adding a connection.
const ADD_CONNECTION_ATTEMPTS: usize = 5;

/// Which set of mutation probabilities is in use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplexityRegulationMode {
    /// Genomes may grow: the configured settings apply.
    Complexifying,
    /// Genomes may only shrink: the simplifying settings apply.
    Simplifying,
}

/// Produces children from a single parent by
/// mutating a copy of its genes.
///
/// Each child undergoes exactly one mutation, chosen at random
/// according to the active [`AsexualSettings`]. Structural
/// mutations obtain their ids through an [`InnovationSource`],
/// so identical changes made to different parents agree.
#[derive(Clone, Debug)]
pub struct AsexualReproduction {
    genetic_config: GeneticConfig,
    complexifying: AsexualSettings,
    simplifying: AsexualSettings,
    mode: ComplexityRegulationMode,
    weight_scheme: WeightMutationScheme,
}

impl AsexualReproduction {
    /// Creates a new reproduction strategy, in complexifying mode.
    ///
    /// # Errors
    /// Returns an error if either configuration is invalid.
    ///
    /// # Examples
    /// ```
    /// use kneat::genomics::GeneticConfig;
    /// use kneat::reproduction::{AsexualReproduction, AsexualSettings, WeightMutationScheme};
    ///
    /// let config = GeneticConfig::default();
    /// let scheme = WeightMutationScheme::default_for(config.connection_weight_scale).unwrap();
    /// let reproduction = AsexualReproduction::new(config, AsexualSettings::default(), scheme);
    /// assert!(reproduction.is_ok());
    /// ```
    pub fn new(
        genetic_config: GeneticConfig,
        settings: AsexualSettings,
        weight_scheme: WeightMutationScheme,
    ) -> Result<AsexualReproduction, ConfigError> {
        genetic_config.validate()?;
        settings.validate()?;
        Ok(AsexualReproduction {
            genetic_config,
            complexifying: settings,
            simplifying: AsexualSettings::simplifying(),
            mode: ComplexityRegulationMode::Complexifying,
            weight_scheme,
        })
    }

    /// Replaces the settings used in simplifying mode.
    ///
    /// # Errors
    /// Returns an error if the settings are invalid.
    pub fn with_simplifying_settings(
        mut self,
        settings: AsexualSettings,
    ) -> Result<AsexualReproduction, ConfigError> {
        settings.validate()?;
        self.simplifying = settings;
        Ok(self)
    }

    /// Switches between the complexifying and simplifying settings.
    pub fn set_mode(&mut self, mode: ComplexityRegulationMode) {
        self.mode = mode;
    }

    /// Returns the active mode.
    pub fn mode(&self) -> ComplexityRegulationMode {
        self.mode
    }

    /// Returns the settings of the active mode.
    pub fn settings(&self) -> &AsexualSettings {
        match self.mode {
            ComplexityRegulationMode::Complexifying => &self.complexifying,
            ComplexityRegulationMode::Simplifying => &self.simplifying,
        }
    }

    /// Returns a mutated child of `parent`.
    ///
    /// A mutation type is sampled from the active settings;
    /// connection deletion is excluded for parents with fewer
    /// than two connections. Mutation types that turn out to be
    /// no-ops are excluded and sampling repeats. Weight mutation
    /// always succeeds, and is applied as a last resort.
    ///
    /// # Examples
    /// ```
    /// use kneat::genomics::{
    ///     ConnectionGene, GeneticConfig, Genome, IdAllocator, InnovationRegistry, InnovationTracker,
    /// };
    /// use kneat::reproduction::{AsexualReproduction, AsexualSettings, WeightMutationScheme};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let config = GeneticConfig::default();
    /// let parent = Genome::new(
    ///     0,
    ///     0,
    ///     vec![ConnectionGene::new(2, 0, 1, 0.5)].into_iter().collect(),
    ///     &config,
    /// );
    ///
    /// let scheme = WeightMutationScheme::default_for(config.connection_weight_scale).unwrap();
    /// let reproduction =
    ///     AsexualReproduction::new(config.clone(), AsexualSettings::default(), scheme).unwrap();
    ///
    /// let mut registry = InnovationRegistry::new();
    /// let mut ids = IdAllocator::new(3);
    /// let mut innovations = InnovationTracker::new(&mut registry, &mut ids);
    /// let mut rng = StdRng::seed_from_u64(42);
    ///
    /// let child = reproduction.create_child(&parent, 1, 1, &mut innovations, &mut rng);
    /// assert_eq!(child.id(), 1);
    /// assert!(child.validate(&config).is_ok());
    /// ```
    pub fn create_child<S, R>(
        &self,
        parent: &Genome,
        child_id: usize,
        generation: usize,
        innovations: &mut S,
        rng: &mut R,
    ) -> Genome
    where
        S: InnovationSource + ?Sized,
        R: Rng + ?Sized,
    {
        let mut probabilities = self.settings().probabilities(parent.complexity() < 2);

        loop {
            let mutation_type = match WeightedIndex::new(&probabilities) {
                Ok(distribution) => MutationType::ALL[distribution.sample(rng)],
                Err(_) => {
                    log::debug!("all structural mutations failed, mutating weights instead");
                    MutationType::ConnectionWeight
                }
            };

            match self.try_mutation(mutation_type, parent, child_id, generation, innovations, rng) {
                Ok(child) => return child,
                Err(e) => {
                    log::trace!("{:?} mutation of genome {} failed: {}", mutation_type, parent.id(), e);
                    probabilities[mutation_type as usize] = 0.0;
                }
            }
        }
    }

    /// Applies a mutation of the specified type to a copy of `parent`.
    ///
    /// # Errors
    /// Returns an error if the mutation has nothing to act on;
    /// see each mutation for the conditions.
    pub fn try_mutation<S, R>(
        &self,
        mutation_type: MutationType,
        parent: &Genome,
        child_id: usize,
        generation: usize,
        innovations: &mut S,
        rng: &mut R,
    ) -> Result<Genome, MutationError>
    where
        S: InnovationSource + ?Sized,
        R: Rng + ?Sized,
    {
        let (connections, hidden_nodes) = match mutation_type {
            MutationType::ConnectionWeight => self.mutate_weights(parent, rng),
            MutationType::AddNode => self.add_node(parent, innovations, rng)?,
            MutationType::AddConnection => self.add_connection(parent, innovations, rng)?,
            MutationType::DeleteConnection => self.delete_connection(parent, rng)?,
        };
        let child = Genome::with_hidden_nodes(child_id, generation, connections, hidden_nodes);
        debug_assert_eq!(child.validate(&self.genetic_config), Ok(()));
        Ok(child)
    }

    /// Perturbs or resets some of the parent's weights.
    fn mutate_weights<R: Rng + ?Sized>(
        &self,
        parent: &Genome,
        rng: &mut R,
    ) -> (ConnectionGenes, Vec<Innovation>) {
        let mut connections = parent.connections().clone();
        self.weight_scheme
            .mutate(&mut connections, self.genetic_config.connection_weight_scale, rng);
        (connections, parent.hidden_nodes().to_vec())
    }

    /// Splits a random enabled connection `s -> t` with a new
    /// node `n`. The split connection is disabled, and `s -> n`
    /// (weight 1) and `n -> t` (the split connection's weight)
    /// are added.
    ///
    /// # Errors
    /// Returns an error if the parent has no enabled connections.
    fn add_node<S, R>(
        &self,
        parent: &Genome,
        innovations: &mut S,
        rng: &mut R,
    ) -> Result<(ConnectionGenes, Vec<Innovation>), MutationError>
    where
        S: InnovationSource + ?Sized,
        R: Rng + ?Sized,
    {
        let enabled: Vec<usize> = parent
            .connections()
            .iter()
            .enumerate()
            .filter(|(_, g)| g.enabled())
            .map(|(i, _)| i)
            .collect();
        if enabled.is_empty() {
            return Err(if parent.connections().is_empty() {
                MutationError::NoConnections
            } else {
                MutationError::NoEnabledConnections
            });
        }

        let split_index = enabled[rng.gen_range(0..enabled.len())];
        let split = parent.connections().as_slice()[split_index];
        let (source, target) = split.endpoints();

        let node = innovations.added_node_innovation(source, target, &|id| parent.is_hidden_node(id));
        let in_innovation = innovations.connection_innovation(source, node);
        let out_innovation = innovations.connection_innovation(node, target);

        let mut connections = parent.connections().clone();
        connections.set_enabled_at(split_index, false);
        for gene in [
            ConnectionGene::new(in_innovation, source, node, 1.0),
            ConnectionGene::new(out_innovation, node, target, split.weight()),
        ] {
            let inserted = connections.insert(gene).is_ok();
            debug_assert!(inserted, "new node {} already connected", node);
        }

        let mut hidden_nodes = parent.hidden_nodes().to_vec();
        if let Err(position) = hidden_nodes.binary_search(&node) {
            hidden_nodes.insert(position, node);
        }

        Ok((connections, hidden_nodes))
    }

    /// Adds a connection between two unconnected nodes.
    ///
    /// For acyclic genomes the source is an input or hidden
    /// node and the target an output or hidden node, and the
    /// connection may not close a cycle. For cyclic genomes the
    /// source may be any node and the target any non-input node.
    ///
    /// # Errors
    /// Returns an error if no new connection was found
    /// within a few attempts.
    fn add_connection<S, R>(
        &self,
        parent: &Genome,
        innovations: &mut S,
        rng: &mut R,
    ) -> Result<(ConnectionGenes, Vec<Innovation>), MutationError>
    where
        S: InnovationSource + ?Sized,
        R: Rng + ?Sized,
    {
        let pair = (0..ADD_CONNECTION_ATTEMPTS)
            .map(|_| self.sample_node_pair(parent, rng))
            .find(|&(source, target)| self.is_viable_connection(parent.connections(), source, target))
            .ok_or(MutationError::NoViableConnection)?;
        let (source, target) = pair;

        let scale = self.genetic_config.connection_weight_scale;
        let weight = if rng.gen_bool(0.5) {
            rng.gen_range(-scale..=scale)
        } else {
            rng.gen_range(-0.01 * scale..=0.01 * scale)
        };
        let innovation = innovations.connection_innovation(source, target);

        let mut connections = parent.connections().clone();
        connections
            .insert(ConnectionGene::new(innovation, source, target, weight))
            .map_err(|_| MutationError::NoViableConnection)?;

        Ok((connections, parent.hidden_nodes().to_vec()))
    }

    fn sample_node_pair<R: Rng + ?Sized>(&self, parent: &Genome, rng: &mut R) -> (Innovation, Innovation) {
        let inputs = self.genetic_config.input_count.get();
        let outputs = self.genetic_config.output_count.get();
        let hidden = parent.hidden_nodes();

        if self.genetic_config.acyclic {
            let s = rng.gen_range(0..inputs + hidden.len());
            let source = if s < inputs { s } else { hidden[s - inputs] };
            let t = rng.gen_range(0..outputs + hidden.len());
            let target = if t < outputs { inputs + t } else { hidden[t - outputs] };
            (source, target)
        } else {
            let io = inputs + outputs;
            let s = rng.gen_range(0..io + hidden.len());
            let source = if s < io { s } else { hidden[s - io] };
            let t = rng.gen_range(0..outputs + hidden.len());
            let target = if t < outputs { inputs + t } else { hidden[t - outputs] };
            (source, target)
        }
    }

    fn is_viable_connection(&self, connections: &ConnectionGenes, source: Innovation, target: Innovation) -> bool {
        if connections.contains(source, target) {
            return false;
        }
        !self.genetic_config.acyclic || !would_create_cycle(connections, source, target)
    }

    /// Removes a random connection, and any hidden
    /// node left without connections.
    ///
    /// # Errors
    /// Returns an error if the parent has fewer than two connections.
    fn delete_connection<R: Rng + ?Sized>(
        &self,
        parent: &Genome,
        rng: &mut R,
    ) -> Result<(ConnectionGenes, Vec<Innovation>), MutationError> {
        match parent.complexity() {
            0 => return Err(MutationError::NoConnections),
            1 => return Err(MutationError::ConnectivityFloor),
            _ => {}
        }

        let mut connections = parent.connections().clone();
        let removed = connections.remove_at(rng.gen_range(0..connections.len()));

        let mut hidden_nodes = parent.hidden_nodes().to_vec();
        for node in [removed.source(), removed.target()] {
            if !parent.is_hidden_node(node) {
                continue;
            }
            let connected = !connections.outgoing(node).is_empty()
                || connections.iter().any(|g| g.target() == node);
            if !connected {
                if let Ok(position) = hidden_nodes.binary_search(&node) {
                    hidden_nodes.remove(position);
                }
            }
        }

        Ok((connections, hidden_nodes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{IdAllocator, InnovationRegistry, InnovationTracker};

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use std::num::NonZeroUsize;

    fn config(inputs: usize, outputs: usize, acyclic: bool) -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(inputs).unwrap(),
            output_count: NonZeroUsize::new(outputs).unwrap(),
            acyclic,
            connection_weight_scale: 5.0,
        }
    }

    fn reproduction(config: &GeneticConfig) -> AsexualReproduction {
        AsexualReproduction::new(
            config.clone(),
            AsexualSettings::default(),
            WeightMutationScheme::default_for(config.connection_weight_scale).unwrap(),
        )
        .unwrap()
    }

    fn genome(pairs: &[(Innovation, Innovation, f64)], config: &GeneticConfig) -> Genome {
        let connections = pairs
            .iter()
            .enumerate()
            .map(|(i, (s, t, w))| ConnectionGene::new(100 + i, *s, *t, *w))
            .collect();
        Genome::new(0, 0, connections, config)
    }

    #[test]
    fn add_node_splits_connection() {
        let config = config(2, 1, true);
        let parent = genome(&[(0, 2, 0.7)], &config);
        let mut registry = InnovationRegistry::new();
        let mut ids = IdAllocator::new(200);
        let mut tracker = InnovationTracker::new(&mut registry, &mut ids);

        let child = reproduction(&config)
            .try_mutation(
                MutationType::AddNode,
                &parent,
                1,
                1,
                &mut tracker,
                &mut StdRng::seed_from_u64(0),
            )
            .unwrap();

        assert_eq!(child.hidden_nodes(), &[200]);
        let genes: Vec<_> = child
            .connections()
            .iter()
            .map(|g| (g.endpoints(), g.weight(), g.enabled()))
            .collect();
        assert_eq!(
            genes,
            vec![
                ((0, 2), 0.7, false),
                ((0, 200), 1.0, true),
                ((200, 2), 0.7, true)
            ]
        );
        assert_eq!(registry.try_lookup_added_node(0, 2), Some(200));
        assert_eq!(registry.try_lookup_connection(0, 200), Some(201));
        assert_eq!(registry.try_lookup_connection(200, 2), Some(202));
    }

    #[test]
    fn add_node_needs_enabled_connection() {
        let config = config(1, 1, true);
        let mut parent_genes: ConnectionGenes =
            vec![ConnectionGene::new(2, 0, 1, 1.0)].into_iter().collect();
        parent_genes.set_enabled_at(0, false);
        let parent = Genome::new(0, 0, parent_genes, &config);

        let mut registry = InnovationRegistry::new();
        let mut ids = IdAllocator::new(3);
        let mut tracker = InnovationTracker::new(&mut registry, &mut ids);
        let result = reproduction(&config).try_mutation(
            MutationType::AddNode,
            &parent,
            1,
            1,
            &mut tracker,
            &mut StdRng::seed_from_u64(0),
        );
        assert_eq!(result.unwrap_err(), MutationError::NoEnabledConnections);
    }

    #[test]
    fn repeated_split_gets_fresh_node() {
        let config = config(1, 1, true);
        let parent = genome(&[(0, 1, 0.5)], &config);
        let mut registry = InnovationRegistry::new();
        let mut ids = IdAllocator::new(2);
        let reproduction = reproduction(&config);
        let mut rng = StdRng::seed_from_u64(3);

        let once = {
            let mut tracker = InnovationTracker::new(&mut registry, &mut ids);
            reproduction
                .try_mutation(MutationType::AddNode, &parent, 1, 1, &mut tracker, &mut rng)
                .unwrap()
        };
        // Re-enable the split gene so it can be split again.
        let mut genes = once.connections().clone();
        let index = genes.binary_search(0, 1).unwrap();
        genes.set_enabled_at(index, true);
        let again_parent = Genome::new(1, 1, genes, &config);

        let mut tracker = InnovationTracker::new(&mut registry, &mut ids);
        let mut twice = None;
        for _ in 0..20 {
            let child = reproduction
                .try_mutation(MutationType::AddNode, &again_parent, 2, 2, &mut tracker, &mut rng)
                .unwrap();
            if child.connections().find(0, 1).map(|g| g.enabled()) == Some(false) {
                twice = Some(child);
                break;
            }
        }
        let twice = twice.unwrap();
        assert_eq!(twice.hidden_nodes().len(), 2);
        assert!(twice.validate(&config).is_ok());
        assert_eq!(registry.try_lookup_added_node(0, 1), Some(once.hidden_nodes()[0]));
    }

    #[test]
    fn add_connection_respects_acyclicity() {
        let config = config(1, 1, true);
        // 0 -> 2 -> 3 -> 1; every remaining acyclic pair is 0 -> 1, 0 -> 3 or 2 -> 1.
        let parent = genome(&[(0, 2, 1.0), (2, 3, 1.0), (3, 1, 1.0)], &config);
        let reproduction = reproduction(&config);
        let mut registry = InnovationRegistry::new();
        let mut ids = IdAllocator::new(10);
        let mut rng = StdRng::seed_from_u64(17);

        for id in 0..50 {
            let mut tracker = InnovationTracker::new(&mut registry, &mut ids);
            if let Ok(child) =
                reproduction.try_mutation(MutationType::AddConnection, &parent, id, 1, &mut tracker, &mut rng)
            {
                assert!(child.is_acyclic());
                assert_eq!(child.complexity(), 4);
                assert!(child.connections().iter().all(|g| g.weight().abs() <= 5.0));
            }
        }
    }

    #[test]
    fn add_connection_fails_when_saturated() {
        let config = config(1, 1, true);
        let parent = genome(&[(0, 1, 1.0)], &config);
        let mut registry = InnovationRegistry::new();
        let mut ids = IdAllocator::new(2);
        let mut tracker = InnovationTracker::new(&mut registry, &mut ids);
        let result = reproduction(&config).try_mutation(
            MutationType::AddConnection,
            &parent,
            1,
            1,
            &mut tracker,
            &mut StdRng::seed_from_u64(0),
        );
        assert_eq!(result.unwrap_err(), MutationError::NoViableConnection);
        assert_eq!(registry.connection_count(), 0);
    }

    #[test]
    fn cyclic_add_connection_allows_recurrence() {
        let config = config(1, 1, false);
        let parent = genome(&[(0, 1, 1.0)], &config);
        let mut registry = InnovationRegistry::new();
        let mut ids = IdAllocator::new(2);
        let mut tracker = InnovationTracker::new(&mut registry, &mut ids);
        // The only free pair is the self-connection 1 -> 1.
        let mut rng = StdRng::seed_from_u64(8);
        let child = (0..20)
            .find_map(|_| {
                reproduction(&config)
                    .try_mutation(MutationType::AddConnection, &parent, 1, 1, &mut tracker, &mut rng)
                    .ok()
            })
            .unwrap();
        assert!(child.connections().contains(1, 1));
    }

    #[test]
    fn delete_connection_drops_orphans() {
        let config = config(1, 1, true);
        let parent = genome(&[(0, 1, 1.0), (0, 5, 1.0)], &config);
        let reproduction = reproduction(&config);
        let mut registry = InnovationRegistry::new();
        let mut ids = IdAllocator::new(10);
        let mut tracker = InnovationTracker::new(&mut registry, &mut ids);
        let mut rng = StdRng::seed_from_u64(2);

        for _ in 0..10 {
            let child = reproduction
                .try_mutation(MutationType::DeleteConnection, &parent, 1, 1, &mut tracker, &mut rng)
                .unwrap();
            assert_eq!(child.complexity(), 1);
            assert!(child.validate(&config).is_ok());
            assert_eq!(child.hidden_nodes().is_empty(), !child.connections().contains(0, 5));
        }

        let single = genome(&[(0, 1, 1.0)], &config);
        assert_eq!(
            reproduction
                .try_mutation(MutationType::DeleteConnection, &single, 1, 1, &mut tracker, &mut rng)
                .unwrap_err(),
            MutationError::ConnectivityFloor
        );
    }

    #[test]
    fn create_child_falls_back_to_weights() {
        let config = config(1, 1, true);
        let empty = Genome::new(0, 0, ConnectionGenes::new(), &config);
        let reproduction = AsexualReproduction::new(
            config.clone(),
            AsexualSettings {
                add_node_mutation_probability: 1.0,
                ..AsexualSettings::zero()
            },
            WeightMutationScheme::default_for(5.0).unwrap(),
        )
        .unwrap();
        let mut registry = InnovationRegistry::new();
        let mut ids = IdAllocator::new(2);
        let mut tracker = InnovationTracker::new(&mut registry, &mut ids);

        let child = reproduction.create_child(&empty, 7, 3, &mut tracker, &mut StdRng::seed_from_u64(0));
        assert_eq!(child.id(), 7);
        assert_eq!(child.birth_generation(), 3);
        assert!(child.connections().is_empty());
    }

    #[test]
    fn simplifying_mode_never_grows() {
        let config = config(2, 2, true);
        let parent = genome(&[(0, 2, 1.0), (1, 3, -1.0), (0, 3, 0.5)], &config);
        let mut reproduction = reproduction(&config);
        reproduction.set_mode(ComplexityRegulationMode::Simplifying);
        let mut registry = InnovationRegistry::new();
        let mut ids = IdAllocator::new(10);
        let mut rng = StdRng::seed_from_u64(6);

        for id in 0..30 {
            let mut tracker = InnovationTracker::new(&mut registry, &mut ids);
            let child = reproduction.create_child(&parent, id, 1, &mut tracker, &mut rng);
            assert!(child.complexity() <= parent.complexity());
        }
        assert_eq!(registry.connection_count(), 0);
    }
}
