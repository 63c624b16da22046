use super::PopulationConfig;
use crate::genomics::{Genome, IdAllocator, InnovationSource};
use crate::reproduction::{AsexualReproduction, UniformCrossover};

use rand::Rng;

/// The next generation's share of one species:
/// the positions of the members kept as-is, and
/// newly produced children.
#[derive(Debug, Default)]
pub(super) struct SpeciesOffspring {
    pub(super) elites: Vec<usize>,
    pub(super) children: Vec<Genome>,
}

/// Auxiliary type for offspring generation.
/// Handles all the tasks of generating a population's
/// offspring according to the specified configs
/// and allotted offspring.
pub(super) struct OffspringFactory<'a, S: ?Sized> {
    /// The current generation's genomes.
    pub(super) genomes: &'a [Genome],
    /// Each species' member positions, fittest first.
    pub(super) ranked_species: &'a [Vec<usize>],
    pub(super) innovations: &'a mut S,
    pub(super) genome_ids: &'a mut IdAllocator,
    pub(super) asexual: &'a AsexualReproduction,
    pub(super) crossover: &'a UniformCrossover,
    pub(super) population_config: &'a PopulationConfig,
    /// Species whose fittest member is the population
    /// champion; it always keeps that member.
    pub(super) champion_species: Option<usize>,
    /// Generation the children are born into.
    pub(super) generation: usize,
}

impl<'a, S: InnovationSource + ?Sized> OffspringFactory<'a, S> {
    /// Generate the alloted offspring, species by species.
    pub(super) fn generate_offspring<R: Rng + ?Sized>(
        &mut self,
        allotted_offspring: &[usize],
        rng: &mut R,
    ) -> Vec<SpeciesOffspring> {
        let ranked_species = self.ranked_species;
        debug_assert_eq!(allotted_offspring.len(), ranked_species.len());
        let mut offspring = Vec::with_capacity(allotted_offspring.len());

        for (species_index, &allotted) in allotted_offspring.iter().enumerate() {
            let members = &ranked_species[species_index];
            let mut elite = self.count_elite(members.len());
            if self.champion_species == Some(species_index) {
                elite = elite.max(1);
            }
            let elite = elite.min(allotted);
            let mut children = Vec::with_capacity(allotted - elite);
            for _ in elite..allotted {
                children.push(self.create_child(species_index, rng));
            }
            offspring.push(SpeciesOffspring {
                elites: members[..elite].to_vec(),
                children,
            });
        }

        offspring
    }

    /// Number of top members carried over unchanged.
    fn count_elite(&self, species_size: usize) -> usize {
        (self.population_config.elitism_proportion * species_size as f64).round() as usize
    }

    /// Top members eligible as parents; never empty
    /// for a non-empty species.
    fn survivors(&self, species_index: usize) -> &'a [usize] {
        let ranked_species: &'a [Vec<usize>] = self.ranked_species;
        let members = &ranked_species[species_index];
        let count = (self.population_config.selection_proportion * members.len() as f64).round() as usize;
        &members[..count.clamp(1, members.len().max(1))]
    }

    /// Produces a single child with a parent from the
    /// species, sexually or asexually.
    fn create_child<R: Rng + ?Sized>(&mut self, species_index: usize, rng: &mut R) -> Genome {
        let survivors = self.survivors(species_index);
        let parent1 = survivors[rng.gen_range(0..survivors.len())];
        let child_id = self.genome_ids.next_id();

        if rng.gen::<f64>() < self.population_config.sexual_reproduction_chance {
            let parent2 = self.choose_second_parent(species_index, rng);
            if parent2 != parent1 {
                return self.crossover.create_child(
                    &self.genomes[parent1],
                    &self.genomes[parent2],
                    child_id,
                    self.generation,
                    rng,
                );
            }
        }

        self.asexual.create_child(
            &self.genomes[parent1],
            child_id,
            self.generation,
            &mut *self.innovations,
            rng,
        )
    }

    /// Choose a parent from the current species,
    /// or from another randomly selected.
    fn choose_second_parent<R: Rng + ?Sized>(&self, species_index: usize, rng: &mut R) -> usize {
        let species_count = self.ranked_species.len();
        let source = if species_count > 1
            && rng.gen::<f64>() < self.population_config.interspecies_mating_chance
        {
            // Any species other than the current one.
            let other = rng.gen_range(0..species_count - 1);
            if other >= species_index {
                other + 1
            } else {
                other
            }
        } else {
            species_index
        };
        let survivors = self.survivors(source);
        survivors[rng.gen_range(0..survivors.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{ConnectionGene, GeneticConfig, InnovationRegistry, InnovationTracker};
    use crate::reproduction::{AsexualSettings, RecombinationSettings, WeightMutationScheme};

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use std::num::NonZeroUsize;

    #[test]
    fn keeps_elites_and_fills_allotment() {
        let genetic_config = GeneticConfig::default();
        let genomes: Vec<Genome> = (0..6)
            .map(|i| {
                let mut g = Genome::new(
                    i,
                    0,
                    vec![ConnectionGene::new(2, 0, 1, i as f64 / 10.0)].into_iter().collect(),
                    &genetic_config,
                );
                g.set_fitness(i as f64);
                g
            })
            .collect();
        let ranked_species = vec![vec![2, 1, 0], vec![5, 4, 3]];
        let population_config = PopulationConfig {
            size: NonZeroUsize::new(6).unwrap(),
            elitism_proportion: 0.34,
            selection_proportion: 0.5,
            sexual_reproduction_chance: 0.5,
            interspecies_mating_chance: 0.5,
            ..PopulationConfig::zero()
        };
        let asexual = AsexualReproduction::new(
            genetic_config.clone(),
            AsexualSettings::default(),
            WeightMutationScheme::default_for(5.0).unwrap(),
        )
        .unwrap();
        let crossover = UniformCrossover::new(genetic_config, RecombinationSettings::default()).unwrap();

        let mut registry = InnovationRegistry::new();
        let mut node_ids = IdAllocator::new(3);
        let mut genome_ids = IdAllocator::new(6);
        let mut tracker = InnovationTracker::new(&mut registry, &mut node_ids);
        let offspring = OffspringFactory {
            genomes: &genomes,
            ranked_species: &ranked_species,
            innovations: &mut tracker,
            genome_ids: &mut genome_ids,
            asexual: &asexual,
            crossover: &crossover,
            population_config: &population_config,
            champion_species: Some(1),
            generation: 1,
        }
        .generate_offspring(&[2, 4], &mut StdRng::seed_from_u64(0));

        assert_eq!(offspring[0].elites, vec![2]);
        assert_eq!(offspring[1].elites, vec![5]);
        assert_eq!(offspring[0].children.len(), 1);
        assert_eq!(offspring[1].children.len(), 3);

        let ids: Vec<usize> = offspring
            .iter()
            .flat_map(|o| o.children.iter().map(Genome::id))
            .collect();
        assert_eq!(ids, vec![6, 7, 8, 9]);
        assert!(offspring
            .iter()
            .flat_map(|o| &o.children)
            .all(|c| c.birth_generation() == 1));
    }
}
