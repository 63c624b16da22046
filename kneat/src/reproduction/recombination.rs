use super::RecombinationSettings;
use crate::errors::ConfigError;
use crate::genomics::{is_cyclic, ConnectionGenes, GenePair, GeneticConfig, Genome};

use rand::Rng;

use std::ptr;

/// Produces children from two parents by uniform crossover.
///
/// The fitter parent is the primary parent (the first one
/// on ties). Genes found in both parents are taken from
/// either at random, genes found only in the primary parent
/// are always inherited, and genes found only in the secondary
/// parent are inherited with probability
/// [`secondary_parent_gene_probability`].
///
/// [`secondary_parent_gene_probability`]: RecombinationSettings::secondary_parent_gene_probability
#[derive(Clone, Debug)]
pub struct UniformCrossover {
    genetic_config: GeneticConfig,
    settings: RecombinationSettings,
}

impl UniformCrossover {
    /// Creates a new crossover operator.
    ///
    /// # Errors
    /// Returns an error if either configuration is invalid.
    pub fn new(
        genetic_config: GeneticConfig,
        settings: RecombinationSettings,
    ) -> Result<UniformCrossover, ConfigError> {
        genetic_config.validate()?;
        settings.validate()?;
        Ok(UniformCrossover {
            genetic_config,
            settings,
        })
    }

    /// Returns the operator's settings.
    pub fn settings(&self) -> &RecombinationSettings {
        &self.settings
    }

    /// Recombines two parents into a new genome.
    ///
    /// Crossing a genome with itself yields a copy of it. In
    /// acyclic populations, a child that would contain a cycle
    /// is replaced by a copy of the primary parent.
    ///
    /// # Examples
    /// ```
    /// use kneat::genomics::{ConnectionGene, GeneticConfig, Genome};
    /// use kneat::reproduction::{RecombinationSettings, UniformCrossover};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let config = GeneticConfig::default();
    /// let mut fit = Genome::new(
    ///     0,
    ///     0,
    ///     vec![ConnectionGene::new(2, 0, 1, 0.5)].into_iter().collect(),
    ///     &config,
    /// );
    /// fit.set_fitness(3.0);
    /// let unfit = Genome::new(
    ///     1,
    ///     0,
    ///     vec![
    ///         ConnectionGene::new(2, 0, 1, -0.5),
    ///         ConnectionGene::new(4, 0, 3, 1.0),
    ///         ConnectionGene::new(5, 3, 1, 1.0),
    ///     ]
    ///     .into_iter()
    ///     .collect(),
    ///     &config,
    /// );
    ///
    /// let crossover = UniformCrossover::new(config, RecombinationSettings::default()).unwrap();
    /// let child = crossover.create_child(&fit, &unfit, 2, 1, &mut StdRng::seed_from_u64(0));
    ///
    /// // Genes of the less fit parent alone are not inherited.
    /// assert_eq!(child.complexity(), 1);
    /// assert!(child.hidden_nodes().is_empty());
    /// ```
    pub fn create_child<R: Rng + ?Sized>(
        &self,
        parent1: &Genome,
        parent2: &Genome,
        child_id: usize,
        generation: usize,
        rng: &mut R,
    ) -> Genome {
        let (primary, secondary) = if parent2.fitness() > parent1.fitness() {
            (parent2, parent1)
        } else {
            (parent1, parent2)
        };

        if ptr::eq(primary, secondary) || primary.connections() == secondary.connections() {
            return clone_as_child(primary, child_id, generation);
        }

        let primary_share = self.primary_share(primary, secondary);
        let mut genes = Vec::with_capacity(primary.complexity().max(secondary.complexity()));
        for pair in primary.connections().aligned_with(secondary.connections()) {
            match pair {
                GenePair::Matching(p, s) => genes.push(if rng.gen_bool(primary_share) { *p } else { *s }),
                GenePair::Left(p) => genes.push(*p),
                GenePair::Right(s) => {
                    if rng.gen::<f64>() < self.settings.secondary_parent_gene_probability {
                        genes.push(*s);
                    }
                }
            }
        }
        let connections = ConnectionGenes::from_sorted(genes);

        if self.genetic_config.acyclic && is_cyclic(&connections) {
            log::debug!(
                "crossover of genomes {} and {} produced a cycle, cloning {}",
                primary.id(),
                secondary.id(),
                primary.id()
            );
            return clone_as_child(primary, child_id, generation);
        }

        let hidden_nodes = Genome::hidden_nodes_of(&connections, &self.genetic_config);
        let child = Genome::with_hidden_nodes(child_id, generation, connections, hidden_nodes);
        debug_assert_eq!(child.validate(&self.genetic_config), Ok(()));
        child
    }

    /// Chance of taking a matching gene from the primary parent.
    fn primary_share(&self, primary: &Genome, secondary: &Genome) -> f64 {
        let total = primary.fitness() + secondary.fitness();
        if self.settings.fitness_weighted
            && total.is_finite()
            && total > 0.0
            && primary.fitness() >= 0.0
            && secondary.fitness() >= 0.0
        {
            primary.fitness() / total
        } else {
            0.5
        }
    }
}

fn clone_as_child(parent: &Genome, child_id: usize, generation: usize) -> Genome {
    Genome::with_hidden_nodes(
        child_id,
        generation,
        parent.connections().clone(),
        parent.hidden_nodes().to_vec(),
    )
}
