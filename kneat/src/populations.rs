//! A Population is a collection of genomes.
//! These are grouped into species, which can
//! be evolved using a genome evaluation function
//! as the source of selective pressure.
mod config;
mod errors;
pub mod logging;
mod offspring_factory;

pub use config::PopulationConfig;
pub use errors::EvolutionError;

use crate::distance::DistanceMetric;
use crate::errors::ConfigError;
use crate::genomics::{
    ConnectionGene, ConnectionGenes, GeneticConfig, Genome, IdAllocator, InnovationRegistry,
    InnovationTracker,
};
use crate::reproduction::{
    AsexualReproduction, AsexualSettings, RecombinationSettings, UniformCrossover,
    WeightMutationScheme,
};
use crate::speciation::{GeneticKMeans, SpeciationStrategy, Species};
use crate::Innovation;
use offspring_factory::OffspringFactory;

use rand::seq::index;
use rand::Rng;
use rayon::prelude::*;

/// Builds initial populations of minimally
/// connected genomes.
#[derive(Clone, Debug)]
pub struct PopulationFactory {
    genetic_config: GeneticConfig,
    population_config: PopulationConfig,
}

impl PopulationFactory {
    /// Creates a new factory.
    ///
    /// # Errors
    /// Returns an error if either configuration is invalid.
    pub fn new(
        genetic_config: GeneticConfig,
        population_config: PopulationConfig,
    ) -> Result<PopulationFactory, ConfigError> {
        genetic_config.validate()?;
        population_config.validate()?;
        Ok(PopulationFactory {
            genetic_config,
            population_config,
        })
    }

    /// Creates a population of genomes connecting inputs
    /// directly to outputs, and clusters it into species.
    ///
    /// Each genome holds a random selection of the possible
    /// input-to-output connections, sized by the
    /// [initial connectivity] but never empty, with weights
    /// uniform in `±connection_weight_scale`. The connection
    /// from input `i` to output `o` always has the innovation id
    /// `input_count + output_count + i * output_count + o`.
    ///
    /// Asexual reproduction and crossover use the default
    /// settings, which can be replaced on the population.
    ///
    /// # Errors
    /// Returns an error if the default reproduction
    /// settings cannot be built for the genetic config.
    ///
    /// [initial connectivity]: PopulationConfig::initial_connectivity
    ///
    /// # Examples
    /// ```
    /// use kneat::distance::EuclideanDistance;
    /// use kneat::genomics::GeneticConfig;
    /// use kneat::populations::{PopulationConfig, PopulationFactory};
    /// use kneat::speciation::{GeneticKMeans, SpeciationConfig};
    /// use rand::{rngs::StdRng, SeedableRng};
    /// use std::num::NonZeroUsize;
    ///
    /// let genetic_config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     ..GeneticConfig::default()
    /// };
    /// let population_config = PopulationConfig {
    ///     size: NonZeroUsize::new(20).unwrap(),
    ///     initial_connectivity: 0.5,
    ///     species_count: NonZeroUsize::new(4).unwrap(),
    ///     ..PopulationConfig::default()
    /// };
    ///
    /// let population = PopulationFactory::new(genetic_config, population_config)
    ///     .unwrap()
    ///     .create(
    ///         GeneticKMeans::new(EuclideanDistance::default(), SpeciationConfig::default()).unwrap(),
    ///         &mut StdRng::seed_from_u64(7),
    ///     )
    ///     .unwrap();
    ///
    /// assert_eq!(population.genomes().len(), 20);
    /// assert!(population.species().len() <= 4);
    /// // Input 1 to output 4 (the second output).
    /// assert_eq!(population.registry().try_lookup_connection(1, 4), Some(5 + 2 + 1));
    /// ```
    pub fn create<M, R>(
        &self,
        speciation: GeneticKMeans<M>,
        rng: &mut R,
    ) -> Result<Population<M>, ConfigError>
    where
        M: DistanceMetric,
        R: Rng + ?Sized,
    {
        let genetic_config = &self.genetic_config;
        let asexual = AsexualReproduction::new(
            genetic_config.clone(),
            AsexualSettings::default(),
            WeightMutationScheme::default_for(genetic_config.connection_weight_scale)?,
        )?;
        let crossover = UniformCrossover::new(genetic_config.clone(), RecombinationSettings::default())?;

        let mut registry = InnovationRegistry::new();
        let node_ids = IdAllocator::new(seed_registry(genetic_config, &mut registry));
        let mut genome_ids = IdAllocator::new(0);

        let genomes: Vec<Genome> = (0..self.population_config.size.get())
            .map(|_| {
                let connections = self.initial_connections(rng);
                Genome::new(genome_ids.next_id(), 0, connections, genetic_config)
            })
            .collect();

        let species_count = self
            .population_config
            .species_count
            .get()
            .min(genomes.len());
        let species = speciation.speciate_all(&genomes, species_count, rng)?;
        log::debug!(
            "created population of {} genomes in {} species",
            genomes.len(),
            species.len()
        );

        Ok(Population {
            genetic_config: self.genetic_config.clone(),
            population_config: self.population_config.clone(),
            genomes,
            species,
            registry,
            node_ids,
            genome_ids,
            generation: 0,
            speciation,
            asexual,
            crossover,
        })
    }

    /// Samples the input-to-output connections of one genome.
    fn initial_connections<R: Rng + ?Sized>(&self, rng: &mut R) -> ConnectionGenes {
        let inputs = self.genetic_config.input_count.get();
        let outputs = self.genetic_config.output_count.get();
        let possible = inputs * outputs;
        let count = probabilistic_round(possible as f64 * self.population_config.initial_connectivity, rng)
            .clamp(1, possible);

        let mut picked = index::sample(rng, possible, count).into_vec();
        picked.sort_unstable();

        let scale = self.genetic_config.connection_weight_scale;
        let genes = picked
            .into_iter()
            .map(|k| {
                let (i, o) = (k / outputs, k % outputs);
                ConnectionGene::new(
                    initial_innovation(&self.genetic_config, i, o),
                    i,
                    inputs + o,
                    rng.gen_range(-scale..=scale),
                )
            })
            .collect();
        ConnectionGenes::from_sorted(genes)
    }
}

/// A population of genomes.
#[derive(Clone, Debug)]
pub struct Population<M> {
    genetic_config: GeneticConfig,
    population_config: PopulationConfig,
    genomes: Vec<Genome>,
    species: Vec<Species>,
    registry: InnovationRegistry,
    node_ids: IdAllocator,
    genome_ids: IdAllocator,
    generation: usize,
    speciation: GeneticKMeans<M>,
    asexual: AsexualReproduction,
    crossover: UniformCrossover,
}

impl<M: DistanceMetric> Population<M> {
    /// Evaluates the fitness of each genome in the
    /// population using the passed evaluator, on the
    /// rayon thread pool.
    ///
    /// # Panics
    /// Panics if the evaluator returns a negative or
    /// non-finite fitness.
    pub fn evaluate_fitness<E>(&mut self, evaluator: E)
    where
        E: Fn(&Genome) -> f64 + Sync,
    {
        self.genomes.par_iter_mut().for_each(|genome| {
            let fitness = evaluator(genome);
            assert!(
                fitness.is_finite() && fitness >= 0.0,
                "fitness function returned invalid value {}",
                fitness
            );
            genome.set_fitness(fitness);
        });
    }

    /// Evolves the population by one generation.
    ///
    /// Each species is allotted offspring in proportion to
    /// its members' mean fitness. The top members of each
    /// species are kept as-is, and the rest of its allotment
    /// is bred from its fittest members. The children are then
    /// added to the species they are genetically nearest to.
    ///
    /// # Errors
    /// Returns an error if the population has become
    /// degenerate (no positive fitness anywhere).
    ///
    /// # Examples
    /// ```
    /// use kneat::distance::ManhattanDistance;
    /// use kneat::genomics::GeneticConfig;
    /// use kneat::populations::{PopulationConfig, PopulationFactory};
    /// use kneat::speciation::{GeneticKMeans, SpeciationConfig};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let mut rng = StdRng::seed_from_u64(3);
    /// let mut population = PopulationFactory::new(GeneticConfig::default(), PopulationConfig::default())
    ///     .unwrap()
    ///     .create(
    ///         GeneticKMeans::new(ManhattanDistance::default(), SpeciationConfig::default()).unwrap(),
    ///         &mut rng,
    ///     )
    ///     .unwrap();
    ///
    /// population.evaluate_fitness(|g| 1.0 + g.connections().iter().map(|c| c.weight()).sum::<f64>().abs());
    /// population.evolve(&mut rng).unwrap();
    ///
    /// assert_eq!(population.generation(), 1);
    /// assert_eq!(population.genomes().len(), 150);
    /// ```
    pub fn evolve<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), EvolutionError> {
        let allotted_offspring = self.allot_offspring()?;
        let ranked_species = self.rank_species_members();
        let champion_species = self.champion_species();

        let mut innovations = InnovationTracker::new(&mut self.registry, &mut self.node_ids);
        let offspring = OffspringFactory {
            genomes: &self.genomes,
            ranked_species: &ranked_species,
            innovations: &mut innovations,
            genome_ids: &mut self.genome_ids,
            asexual: &self.asexual,
            crossover: &self.crossover,
            population_config: &self.population_config,
            champion_species,
            generation: self.generation + 1,
        }
        .generate_offspring(&allotted_offspring, rng);

        // Elites first, in species order, followed by every child.
        let mut genomes = Vec::with_capacity(self.population_config.size.get());
        let mut species = Vec::with_capacity(self.species.len());
        for (s, o) in self.species.iter().zip(&offspring) {
            let start = genomes.len();
            genomes.extend(o.elites.iter().map(|&i| self.genomes[i].clone()));
            species.push(s.with_members((start..genomes.len()).collect()));
        }
        let first_child = genomes.len();
        genomes.extend(offspring.into_iter().flat_map(|o| o.children));
        let children: Vec<usize> = (first_child..genomes.len()).collect();

        // Species emptied of elites keep their old centroid
        // to draw in children.
        self.speciation.recompute_centroids(&genomes, &mut species);
        self.speciation.speciate_add(&genomes, &children, &mut species)?;
        species.retain(|s| !s.is_empty());

        self.genomes = genomes;
        self.species = species;
        self.generation += 1;
        log::debug!(
            "generation {}: {} genomes in {} species, {} innovations registered",
            self.generation,
            self.genomes.len(),
            self.species.len(),
            self.registry.connection_count() + self.registry.added_node_count()
        );
        Ok(())
    }

    /// Allot the number of offspring for each species,
    /// based on proportional mean species fitness.
    /// The species holding the champion gets at least one.
    ///
    /// # Errors
    ///
    /// Returns an error if all species' mean fitnesses are 0.
    fn allot_offspring(&self) -> Result<Vec<usize>, EvolutionError> {
        let mean_fitnesses: Vec<f64> = self
            .species
            .iter()
            .map(|s| s.members().iter().map(|&i| self.genomes[i].fitness()).sum::<f64>() / s.len() as f64)
            .collect();
        let fitness_sum: f64 = mean_fitnesses.iter().sum();
        if !(fitness_sum.is_finite() && fitness_sum > 0.0) {
            return Err(EvolutionError::DegeneratePopulation);
        }

        let size = self.population_config.size.get() as f64;
        let mut allotted =
            round_retain_sum(&mean_fitnesses.iter().map(|f| f / fitness_sum * size).collect::<Vec<_>>());

        if let Some(home) = self.champion_species() {
            if allotted[home] == 0 {
                if let Some(donor) = (0..allotted.len()).max_by_key(|&i| allotted[i]) {
                    allotted[donor] -= 1;
                    allotted[home] = 1;
                }
            }
        }

        Ok(allotted)
    }

    /// Position of the species holding the champion.
    fn champion_species(&self) -> Option<usize> {
        let champion = self.champion().id();
        self.species
            .iter()
            .position(|s| s.members().iter().any(|&i| self.genomes[i].id() == champion))
    }

    /// Each species' members, fittest first.
    fn rank_species_members(&self) -> Vec<Vec<usize>> {
        self.species
            .iter()
            .map(|s| {
                let mut members = s.members().to_vec();
                members.sort_by(|&a, &b| self.genomes[b].fitness().total_cmp(&self.genomes[a].fitness()));
                members
            })
            .collect()
    }

    /// Starts a new innovation scope: structural mutations
    /// made from now on no longer reuse the ids of earlier
    /// ones. The initial input-to-output connection ids
    /// stay registered.
    pub fn clear_registry(&mut self) {
        self.registry.clear();
        seed_registry(&self.genetic_config, &mut self.registry);
    }

    /// Returns the currently best-performing genome.
    /// Ties are resolved in favour of the earliest genome.
    pub fn champion(&self) -> &Genome {
        self.genomes
            .iter()
            .fold(&self.genomes[0], |best, g| if g.fitness() > best.fitness() { g } else { best })
    }

    /// Returns all current genomes.
    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    /// Returns all current species. Their members
    /// are positions in [`genomes`](Population::genomes).
    pub fn species(&self) -> &[Species] {
        &self.species
    }

    /// Returns the current generation number.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Returns the population's innovation registry.
    pub fn registry(&self) -> &InnovationRegistry {
        &self.registry
    }

    /// Returns the genetic configuration.
    pub fn genetic_config(&self) -> &GeneticConfig {
        &self.genetic_config
    }

    /// Returns the population configuration.
    pub fn population_config(&self) -> &PopulationConfig {
        &self.population_config
    }

    /// Returns the asexual reproduction strategy, e.g.
    /// to switch its complexity regulation mode.
    pub fn asexual_reproduction_mut(&mut self) -> &mut AsexualReproduction {
        &mut self.asexual
    }

    /// Replaces the asexual reproduction strategy.
    pub fn set_asexual_reproduction(&mut self, asexual: AsexualReproduction) {
        self.asexual = asexual;
    }

    /// Replaces the crossover operator.
    pub fn set_crossover(&mut self, crossover: UniformCrossover) {
        self.crossover = crossover;
    }
}

/// Innovation id of the initial connection
/// from input `i` to output `o`.
fn initial_innovation(config: &GeneticConfig, i: usize, o: usize) -> Innovation {
    config.input_output_count() + i * config.output_count.get() + o
}

/// Registers every initial input-to-output connection,
/// returning the first id left free.
fn seed_registry(config: &GeneticConfig, registry: &mut InnovationRegistry) -> Innovation {
    let (inputs, outputs) = (config.input_count.get(), config.output_count.get());
    for i in 0..inputs {
        for o in 0..outputs {
            registry.register_connection(i, inputs + o, initial_innovation(config, i, o));
        }
    }
    config.input_output_count() + inputs * outputs
}

/// Rounds `x` up with probability equal to its fractional part.
fn probabilistic_round<R: Rng + ?Sized>(x: f64, rng: &mut R) -> usize {
    let floor = x.floor();
    if rng.gen::<f64>() < x - floor {
        floor as usize + 1
    } else {
        floor as usize
    }
}

/// Rounds all values to positive whole numbers
/// while preserving their order and sum, assuming it is also whole.
/// Rounding is done in the manner that minimizes
/// the average error to the original set of values.
fn round_retain_sum(values: &[f64]) -> Vec<usize> {
    let total_sum = values.iter().sum::<f64>().round() as usize;
    let mut truncated: Vec<(usize, usize, f64)> = values
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let u = f.floor();
            let e = f - u;
            (i, u as usize, e)
        })
        .collect();
    let truncated_sum: usize = truncated.iter().map(|(_, u, _)| *u).sum();
    let remainder = total_sum.saturating_sub(truncated_sum).min(truncated.len());
    // Sort in decreasing order of error
    truncated.sort_by(|a, b| b.2.total_cmp(&a.2));
    for (_, u, _) in &mut truncated[..remainder] {
        *u += 1;
    }
    truncated.sort_by_key(|(i, ..)| *i);
    truncated.iter().map(|(_, u, _)| *u).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::ManhattanDistance;
    use crate::speciation::SpeciationConfig;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use std::num::NonZeroUsize;

    #[test]
    fn round_retain_sum() {
        let v = [
            5.2,
            9.5,
            2.8,
            1.3,
            2.2,
            2.7,
            6.3,
            1.0000000000001,
            0.9999999999999,
        ];
        let w = super::round_retain_sum(&v);
        assert_eq!(v.iter().sum::<f64>().round() as usize, w.iter().sum::<usize>());
        assert_eq!(w, [5, 10, 3, 1, 2, 3, 6, 1, 1]);
    }

    fn population(size: usize, species: usize) -> Population<ManhattanDistance> {
        let genetic_config = GeneticConfig {
            input_count: NonZeroUsize::new(3).unwrap(),
            output_count: NonZeroUsize::new(2).unwrap(),
            ..GeneticConfig::default()
        };
        let population_config = PopulationConfig {
            size: NonZeroUsize::new(size).unwrap(),
            initial_connectivity: 0.5,
            species_count: NonZeroUsize::new(species).unwrap(),
            ..PopulationConfig::default()
        };
        PopulationFactory::new(genetic_config, population_config)
            .unwrap()
            .create(
                GeneticKMeans::new(ManhattanDistance::default(), SpeciationConfig::default()).unwrap(),
                &mut StdRng::seed_from_u64(0),
            )
            .unwrap()
    }

    #[test]
    fn initial_genomes_use_fixed_innovations() {
        let population = population(30, 3);
        for genome in population.genomes() {
            assert!(genome.complexity() >= 1);
            assert!(genome.hidden_nodes().is_empty());
            for gene in genome.connections() {
                let (i, o) = (gene.source(), gene.target() - 3);
                assert_eq!(gene.innovation(), 5 + i * 2 + o);
                assert!(gene.weight().abs() <= 5.0);
            }
        }
        assert_eq!(population.registry().connection_count(), 6);
        assert_eq!(population.node_ids.peek(), 11);

        let ids: Vec<usize> = population.genomes().iter().map(Genome::id).collect();
        assert_eq!(ids, (0..30).collect::<Vec<_>>());
    }

    #[test]
    fn species_partition_population() {
        let population = population(30, 3);
        let mut members: Vec<usize> = population
            .species()
            .iter()
            .flat_map(|s| s.members().iter().copied())
            .collect();
        members.sort_unstable();
        assert_eq!(members, (0..30).collect::<Vec<_>>());
    }

    #[test]
    fn degenerate_population_cannot_evolve() {
        let mut population = population(10, 2);
        assert_eq!(
            population.evolve(&mut StdRng::seed_from_u64(0)),
            Err(EvolutionError::DegeneratePopulation)
        );
    }

    #[test]
    fn evolution_keeps_size_and_champion() {
        let mut population = population(40, 4);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..5 {
            population.evaluate_fitness(|g| 10.0 - g.connections().iter().map(|c| c.weight().abs()).sum::<f64>().min(9.0));
            let champion = population.champion().clone();
            population.evolve(&mut rng).unwrap();

            assert_eq!(population.genomes().len(), 40);
            assert!(population
                .genomes()
                .iter()
                .any(|g| g.id() == champion.id() && g.connections() == champion.connections()));
            for genome in population.genomes() {
                assert!(genome.validate(population.genetic_config()).is_ok());
            }
            let covered: usize = population.species().iter().map(Species::len).sum();
            assert_eq!(covered, 40);
        }
        assert_eq!(population.generation(), 5);
    }

    #[test]
    fn clearing_registry_keeps_initial_innovations() {
        let mut population = population(10, 2);
        population.registry.register_connection(7, 3, 42);
        population.clear_registry();
        assert_eq!(population.registry().connection_count(), 6);
        assert_eq!(population.registry().try_lookup_connection(0, 3), Some(5));
    }
}
