use super::{SpeciationConfig, SpeciationStrategy, Species, SpeciesID};
use crate::distance::DistanceMetric;
use crate::errors::ConfigError;
use crate::genomics::{ConnectionGenes, Genome};

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::index;
use rand::Rng;
use rayon::prelude::*;

/// Speciation by k-means clustering over genetic distance.
///
/// Initial centroids are chosen k-means++ style; genomes are
/// then repeatedly reassigned to their nearest centroid and
/// centroids recomputed, until no genome moves or the
/// iteration cap is reached. Species left empty are dropped.
///
/// With a non-zero [`regularization_constant`], the distance
/// to each species is increased in proportion to the species'
/// share of the population, discouraging a single species from
/// absorbing most genomes.
///
/// [`regularization_constant`]: SpeciationConfig::regularization_constant
#[derive(Clone, Debug)]
pub struct GeneticKMeans<M> {
    metric: M,
    config: SpeciationConfig,
}

/// Per-run constants of the regularization penalty.
#[derive(Clone, Copy, Debug)]
struct Regularization {
    population_count: f64,
    scale: f64,
}

/// A genome moving from one species to another,
/// as positions into the species and genome slices.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Move {
    genome: usize,
    from: usize,
    to: usize,
}

impl<M: DistanceMetric> GeneticKMeans<M> {
    /// Creates a new speciation strategy using `metric`.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    ///
    /// # Examples
    /// ```
    /// use kneat::distance::EuclideanDistance;
    /// use kneat::speciation::{GeneticKMeans, SpeciationConfig};
    ///
    /// let kmeans = GeneticKMeans::new(EuclideanDistance::default(), SpeciationConfig::default());
    /// assert!(kmeans.is_ok());
    ///
    /// let bad = SpeciationConfig {
    ///     regularization_constant: f64::NAN,
    ///     ..SpeciationConfig::default()
    /// };
    /// assert!(GeneticKMeans::new(EuclideanDistance::default(), bad).is_err());
    /// ```
    pub fn new(metric: M, config: SpeciationConfig) -> Result<GeneticKMeans<M>, ConfigError> {
        config.validate()?;
        Ok(GeneticKMeans { metric, config })
    }

    /// Returns the distance metric used for clustering.
    pub fn metric(&self) -> &M {
        &self.metric
    }

    /// Returns the strategy's configuration.
    pub fn config(&self) -> &SpeciationConfig {
        &self.config
    }

    /// Chooses `k` seed genomes and assigns every
    /// genome to the species of its nearest seed.
    fn seed_species<R: Rng + ?Sized>(&self, genomes: &[Genome], k: usize, rng: &mut R) -> Vec<Species> {
        let mut remaining: Vec<usize> = (0..genomes.len()).collect();
        let mut seeds = Vec::with_capacity(k);
        seeds.push(remaining.remove(rng.gen_range(0..remaining.len())));

        while seeds.len() < k {
            let subset_count = if remaining.len() <= 10 {
                remaining.len()
            } else {
                ((remaining.len() as f64).log10() * 10.0) as usize
            };
            let candidates = index::sample(rng, remaining.len(), subset_count).into_vec();

            let weights: Vec<f64> = candidates
                .iter()
                .map(|&c| {
                    let genes = genomes[remaining[c]].connections();
                    let nearest = seeds
                        .iter()
                        .map(|&s| self.metric.distance(genomes[s].connections(), genes))
                        .fold(f64::INFINITY, f64::min);
                    nearest * nearest
                })
                .collect();

            // All candidates coincide with a seed: pick any.
            let chosen = match WeightedIndex::new(&weights) {
                Ok(distribution) => candidates[distribution.sample(rng)],
                Err(_) => candidates[rng.gen_range(0..candidates.len())],
            };
            seeds.push(remaining.remove(chosen));
        }

        let mut species: Vec<Species> = seeds
            .iter()
            .enumerate()
            .map(|(i, &s)| Species::seeded(SpeciesID(i), s, genomes[s].connections().clone()))
            .collect();

        for &genome in &remaining {
            let (nearest, _) = self.nearest_species(genomes[genome].connections(), &species, None);
            species[nearest].add_member(genome);
        }

        for s in species.iter_mut() {
            let centroid = self.centroid_of(genomes, s.members());
            s.set_centroid(centroid);
        }

        species
    }

    fn centroid_of(&self, genomes: &[Genome], members: &[usize]) -> ConnectionGenes {
        let genes: Vec<&ConnectionGenes> = members.iter().map(|&m| genomes[m].connections()).collect();
        self.metric.centroid(&genes)
    }

    /// Distance from `genes` to `species`, including the
    /// regularization penalty when one applies.
    fn adjusted_distance(
        &self,
        genes: &ConnectionGenes,
        species: &Species,
        size: usize,
        regularization: Option<Regularization>,
    ) -> f64 {
        let distance = self.metric.distance(genes, species.centroid());
        match regularization {
            Some(r) => distance + (size as f64 / r.population_count) * r.scale,
            None => distance,
        }
    }

    /// Returns the position of the species nearest to `genes`, and
    /// the distance to it. Ties go to the lowest position.
    fn nearest_species(
        &self,
        genes: &ConnectionGenes,
        species: &[Species],
        regularization: Option<Regularization>,
    ) -> (usize, f64) {
        let mut nearest = (0, f64::INFINITY);
        for (i, s) in species.iter().enumerate() {
            let distance = self.adjusted_distance(genes, s, s.len(), regularization);
            if distance < nearest.1 {
                nearest = (i, distance);
            }
        }
        nearest
    }

    fn regularization(&self, species: &[Species]) -> Option<Regularization> {
        if self.config.regularization_constant == 0.0 {
            return None;
        }
        let population_count = species.iter().map(Species::len).sum::<usize>() as f64;
        let mut max_distance: f64 = 0.0;
        for (i, a) in species.iter().enumerate() {
            for b in &species[i + 1..] {
                max_distance = max_distance.max(self.metric.distance(a.centroid(), b.centroid()));
            }
        }
        Some(Regularization {
            population_count,
            scale: max_distance * self.config.regularization_constant,
        })
    }

    /// Finds the genomes that are strictly nearer to another
    /// species' centroid than to their own.
    fn reallocations(
        &self,
        genomes: &[Genome],
        species: &[Species],
        regularization: Option<Regularization>,
    ) -> Vec<Move> {
        let relocate = |(from, genome): (usize, usize)| -> Option<Move> {
            let genes = genomes[genome].connections();
            let own = self.adjusted_distance(genes, &species[from], species[from].len(), regularization);
            let (to, distance) = self.nearest_species(genes, species, regularization);
            if to != from && distance < own {
                Some(Move { genome, from, to })
            } else {
                None
            }
        };

        let pairs = species
            .iter()
            .enumerate()
            .flat_map(|(s, sp)| sp.members().iter().map(move |&g| (s, g)));

        if self.config.parallel {
            let pairs: Vec<(usize, usize)> = pairs.collect();
            pairs.into_par_iter().filter_map(relocate).collect()
        } else {
            pairs.filter_map(relocate).collect()
        }
    }

    /// Recomputes the centroids of the flagged species,
    /// moving each by at most `max_shift`, if given.
    fn update_centroids(
        &self,
        genomes: &[Genome],
        species: &mut [Species],
        modified: &[bool],
        max_shift: Option<f64>,
    ) {
        for (s, _) in species.iter_mut().zip(modified).filter(|(_, m)| **m) {
            if s.is_empty() {
                continue;
            }
            let mean = self.centroid_of(genomes, s.members());
            let centroid = match max_shift {
                Some(cap) => {
                    let shift = self.metric.distance(s.centroid(), &mean);
                    if shift > cap {
                        s.centroid().interpolate(&mean, cap / shift)
                    } else {
                        mean
                    }
                }
                None => mean,
            };
            s.set_centroid(centroid);
        }
    }

    /// Sets the centroid of every non-empty species
    /// to the mean of its members.
    pub(crate) fn recompute_centroids(&self, genomes: &[Genome], species: &mut [Species]) {
        for s in species.iter_mut().filter(|s| !s.is_empty()) {
            let mean = self.centroid_of(genomes, s.members());
            s.set_centroid(mean);
        }
    }

    /// Runs reallocation rounds until the partition is stable
    /// or the iteration cap is reached. Damped runs finish with
    /// undamped rounds from the members' means.
    fn run_kmeans(&self, genomes: &[Genome], species: &mut Vec<Species>) {
        drop_empty(species);
        let regularization = self.regularization(species);
        let mut iterations = self.reallocate(genomes, species, regularization, self.config.max_centroid_shift);

        if self.config.max_centroid_shift.is_some() {
            self.recompute_centroids(genomes, species);
            iterations += self.reallocate(genomes, species, regularization, None);
        }

        log::debug!(
            "k-means finished after {} iterations with {} species",
            iterations,
            species.len()
        );
    }

    /// Moves genomes to their nearest species until none moves
    /// or the iteration cap is reached. Returns the number of
    /// rounds run.
    fn reallocate(
        &self,
        genomes: &[Genome],
        species: &mut Vec<Species>,
        regularization: Option<Regularization>,
        max_shift: Option<f64>,
    ) -> usize {
        let mut iterations = 0;
        for _ in 0..self.config.max_kmeans_iterations.get() {
            iterations += 1;
            let moves = self.reallocations(genomes, species, regularization);
            log::trace!("k-means iteration {}: {} reallocations", iterations, moves.len());
            if moves.is_empty() {
                break;
            }

            let mut modified = vec![false; species.len()];
            for m in &moves {
                species[m.from].remove_member(m.genome);
                species[m.to].add_member(m.genome);
                modified[m.from] = true;
                modified[m.to] = true;
            }
            self.update_centroids(genomes, species, &modified, max_shift);
            drop_empty(species);
        }
        iterations
    }
}

fn drop_empty(species: &mut Vec<Species>) {
    let before = species.len();
    species.retain(|s| !s.is_empty());
    if species.len() < before {
        log::debug!("dropped {} empty species", before - species.len());
    }
}

impl<M: DistanceMetric> SpeciationStrategy for GeneticKMeans<M> {
    fn speciate_all<R: Rng + ?Sized>(
        &self,
        genomes: &[Genome],
        species_count: usize,
        rng: &mut R,
    ) -> Result<Vec<Species>, ConfigError> {
        if species_count == 0 || species_count > genomes.len() {
            return Err(ConfigError::SpeciesCount {
                requested: species_count,
                available: genomes.len(),
            });
        }

        let mut species = self.seed_species(genomes, species_count, rng);
        self.run_kmeans(genomes, &mut species);
        Ok(species)
    }

    fn speciate_add(
        &self,
        genomes: &[Genome],
        new_genomes: &[usize],
        species: &mut Vec<Species>,
    ) -> Result<(), ConfigError> {
        if new_genomes.is_empty() {
            return Ok(());
        }
        if species.is_empty() {
            return Err(ConfigError::SpeciesCount {
                requested: 0,
                available: genomes.len(),
            });
        }

        // Assign against the centroids as they were before the
        // batch, so the outcome does not depend on batch order.
        let regularization = self.regularization(species);
        let assignments: Vec<usize> = new_genomes
            .iter()
            .map(|&g| self.nearest_species(genomes[g].connections(), species, regularization).0)
            .collect();

        let mut modified = vec![false; species.len()];
        for (&genome, &target) in new_genomes.iter().zip(&assignments) {
            species[target].add_member(genome);
            modified[target] = true;
        }
        for (s, _) in species.iter_mut().zip(&modified).filter(|(_, m)| **m) {
            let mean = self.centroid_of(genomes, s.members());
            s.set_centroid(mean);
        }

        self.run_kmeans(genomes, species);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::{EuclideanDistance, ManhattanDistance};
    use crate::genomics::{ConnectionGene, GeneticConfig};

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use std::num::NonZeroUsize;

    fn genome(id: usize, weights: &[f64]) -> Genome {
        let config = GeneticConfig {
            input_count: NonZeroUsize::new(weights.len()).unwrap(),
            ..GeneticConfig::default()
        };
        let output = weights.len();
        let connections = weights
            .iter()
            .enumerate()
            .map(|(i, w)| ConnectionGene::new(output + 1 + i, i, output, *w))
            .collect();
        Genome::new(id, 0, connections, &config)
    }

    fn kmeans() -> GeneticKMeans<EuclideanDistance> {
        let config = SpeciationConfig {
            max_kmeans_iterations: NonZeroUsize::new(50).unwrap(),
            ..SpeciationConfig::zero()
        };
        GeneticKMeans::new(EuclideanDistance::default(), config).unwrap()
    }

    fn two_clusters() -> Vec<Genome> {
        vec![
            genome(0, &[0.0, 0.1]),
            genome(1, &[4.0, 4.1]),
            genome(2, &[0.1, 0.0]),
            genome(3, &[4.1, 4.0]),
            genome(4, &[0.05, 0.05]),
            genome(5, &[3.9, 4.0]),
        ]
    }

    #[test]
    fn separates_obvious_clusters() {
        let genomes = two_clusters();
        let mut rng = StdRng::seed_from_u64(7);
        let species = kmeans().speciate_all(&genomes, 2, &mut rng).unwrap();

        assert_eq!(species.len(), 2);
        let mut partitions: Vec<Vec<usize>> = species.iter().map(|s| s.members().to_vec()).collect();
        partitions.sort();
        assert_eq!(partitions, vec![vec![0, 2, 4], vec![1, 3, 5]]);
    }

    #[test]
    fn rejects_bad_species_counts() {
        let genomes = two_clusters();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            kmeans().speciate_all(&genomes, 7, &mut rng).unwrap_err(),
            ConfigError::SpeciesCount {
                requested: 7,
                available: 6
            }
        );
        assert!(kmeans().speciate_all(&genomes, 0, &mut rng).is_err());
    }

    #[test]
    fn one_species_per_genome() {
        let genomes = two_clusters();
        let mut rng = StdRng::seed_from_u64(3);
        let species = kmeans().speciate_all(&genomes, 6, &mut rng).unwrap();
        assert_eq!(species.len(), 6);
        assert!(species.iter().all(|s| s.len() == 1));
    }

    #[test]
    fn parallel_assignment_matches_serial() {
        let genomes: Vec<Genome> = (0..40)
            .map(|i| genome(i, &[(i % 7) as f64 * 0.3, (i % 5) as f64 * -0.4, (i % 3) as f64]))
            .collect();
        let serial = kmeans();
        let parallel = GeneticKMeans::new(
            EuclideanDistance::default(),
            SpeciationConfig {
                parallel: true,
                ..serial.config().clone()
            },
        )
        .unwrap();

        let a = serial.speciate_all(&genomes, 4, &mut StdRng::seed_from_u64(11)).unwrap();
        let b = parallel.speciate_all(&genomes, 4, &mut StdRng::seed_from_u64(11)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn speciate_add_keeps_ids_and_assigns_new_genomes() {
        let mut genomes = two_clusters();
        let strategy = kmeans();
        let mut species = strategy
            .speciate_all(&genomes, 2, &mut StdRng::seed_from_u64(1))
            .unwrap();
        let ids: Vec<SpeciesID> = species.iter().map(Species::id).collect();

        genomes.push(genome(6, &[0.0, 0.0]));
        genomes.push(genome(7, &[4.0, 4.0]));
        strategy.speciate_add(&genomes, &[6, 7], &mut species).unwrap();

        assert_eq!(species.iter().map(Species::id).collect::<Vec<_>>(), ids);
        let home_of = |g: usize| species.iter().position(|s| s.contains(g)).unwrap();
        assert_eq!(home_of(6), home_of(0));
        assert_eq!(home_of(7), home_of(1));
    }

    #[test]
    fn damped_centroids_end_at_member_mean() {
        let genomes = two_clusters();
        let strategy = GeneticKMeans::new(
            ManhattanDistance::default(),
            SpeciationConfig {
                max_kmeans_iterations: NonZeroUsize::new(50).unwrap(),
                max_centroid_shift: Some(0.05),
                ..SpeciationConfig::zero()
            },
        )
        .unwrap();
        let species = strategy
            .speciate_all(&genomes, 2, &mut StdRng::seed_from_u64(5))
            .unwrap();

        for s in &species {
            let expected = strategy.centroid_of(&genomes, s.members());
            assert!(strategy.metric().distance(s.centroid(), &expected) < 1e-9);
        }
    }

    #[test]
    fn damped_partition_settles_at_nearest_centroid() {
        let genomes: Vec<Genome> = (0..30)
            .map(|i| genome(i, &[(i % 7) as f64 * 0.5, (i % 4) as f64 * -0.7, (i % 5) as f64 * 0.2]))
            .collect();
        let strategy = GeneticKMeans::new(
            EuclideanDistance::default(),
            SpeciationConfig {
                max_kmeans_iterations: NonZeroUsize::new(100).unwrap(),
                max_centroid_shift: Some(0.01),
                ..SpeciationConfig::zero()
            },
        )
        .unwrap();

        for seed in 0..5 {
            let species = strategy
                .speciate_all(&genomes, 4, &mut StdRng::seed_from_u64(seed))
                .unwrap();
            assert!(strategy.reallocations(&genomes, &species, None).is_empty());
        }
    }

    #[test]
    fn recompute_centroids_skips_empty_species() {
        let genomes = two_clusters();
        let strategy = kmeans();
        let stale = genomes[1].connections().clone();
        let mut species = vec![
            Species::seeded(SpeciesID(0), 1, stale.clone()).with_members(vec![0, 2, 4]),
            Species::seeded(SpeciesID(1), 1, stale.clone()).with_members(Vec::new()),
        ];

        strategy.recompute_centroids(&genomes, &mut species);

        let expected = strategy.centroid_of(&genomes, &[0, 2, 4]);
        assert!(strategy.metric().distance(species[0].centroid(), &expected) < 1e-9);
        assert_eq!(species[1].centroid(), &stale);
    }

    #[test]
    fn regularization_penalizes_large_species() {
        let strategy = GeneticKMeans::new(
            EuclideanDistance::default(),
            SpeciationConfig {
                regularization_constant: 0.5,
                ..kmeans().config().clone()
            },
        )
        .unwrap();
        let genomes = two_clusters();
        let species = strategy
            .speciate_all(&genomes, 2, &mut StdRng::seed_from_u64(2))
            .unwrap();
        let total: usize = species.iter().map(Species::len).sum();
        assert_eq!(total, genomes.len());

        let regularization = strategy.regularization(&species).unwrap();
        assert_eq!(regularization.population_count, 6.0);
        assert!(regularization.scale > 0.0);
    }
}
