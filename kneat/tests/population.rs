use kneat::distance::{DistanceMetric, EuclideanDistance};
use kneat::genomics::{GeneticConfig, Genome};
use kneat::populations::logging::{EvolutionLogger, GenerationMemberRecord, ReportingLevel};
use kneat::populations::{Population, PopulationConfig, PopulationFactory};
use kneat::speciation::{GeneticKMeans, SpeciationConfig};
use kneat_nn::{ActivationFunction, Phenotype};

use rand::rngs::StdRng;
use rand::SeedableRng;

use std::num::NonZeroUsize;

fn evaluate_xor(genome: &Genome, config: &GeneticConfig) -> f64 {
    let mut network = match Phenotype::from_genome(genome, config, ActivationFunction::LogisticSteep, 1) {
        Ok(network) => network,
        Err(_) => return 0.0,
    };
    let values = [
        ([1.0, 0.0, 0.0], 0.0),
        ([1.0, 0.0, 1.0], 1.0),
        ([1.0, 1.0, 0.0], 1.0),
        ([1.0, 1.0, 1.0], 0.0),
    ];
    let mut error = 0.0;
    for (input, output) in &values {
        match network.activate(input) {
            Ok(answer) => error += (answer[0] - output).abs(),
            Err(_) => return 0.0,
        }
    }
    (4.0 - error).powi(2)
}

fn genetic_config() -> GeneticConfig {
    GeneticConfig {
        input_count: NonZeroUsize::new(3).unwrap(),
        output_count: NonZeroUsize::new(1).unwrap(),
        acyclic: true,
        connection_weight_scale: 5.0,
    }
}

/// Species partition the genomes, none is empty, and every
/// centroid is the mean of its members.
fn assert_species_invariants<M: DistanceMetric>(population: &Population<M>, metric: &M) {
    let species = population.species();
    let genomes = population.genomes();

    let mut members: Vec<usize> = species.iter().flat_map(|s| s.members().iter().copied()).collect();
    members.sort_unstable();
    assert_eq!(members, (0..genomes.len()).collect::<Vec<_>>());
    assert!(species.iter().all(|s| !s.is_empty()));

    for s in species {
        let genes: Vec<_> = s.members().iter().map(|&m| genomes[m].connections()).collect();
        let mean = metric.centroid(&genes);
        assert!(
            metric.distance(&mean, s.centroid()) < 1e-9,
            "species {:?} centroid is not its members' mean",
            s.id()
        );
    }
}

fn evolve_checking_species<M: DistanceMetric + Clone>(
    population_config: PopulationConfig,
    metric: M,
    seed: u64,
    generations: usize,
) {
    let genetic_config = genetic_config();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut population = PopulationFactory::new(genetic_config.clone(), population_config)
        .unwrap()
        .create(
            GeneticKMeans::new(metric.clone(), SpeciationConfig::default()).unwrap(),
            &mut rng,
        )
        .unwrap();
    assert_species_invariants(&population, &metric);

    for _ in 0..generations {
        population.evaluate_fitness(|g| evaluate_xor(g, &genetic_config));
        population.evolve(&mut rng).unwrap();
        assert_species_invariants(&population, &metric);
    }
}

#[test]
fn species_stay_consistent_across_generations() {
    let population_config = PopulationConfig {
        size: NonZeroUsize::new(60).unwrap(),
        species_count: NonZeroUsize::new(5).unwrap(),
        ..PopulationConfig::default()
    };
    evolve_checking_species(population_config, EuclideanDistance::default(), 9, 10);
}

#[test]
fn carried_over_species_centre_on_their_elites() {
    for seed in 0..10 {
        let population_config = PopulationConfig {
            size: NonZeroUsize::new(40).unwrap(),
            species_count: NonZeroUsize::new(5).unwrap(),
            elitism_proportion: 1.0,
            ..PopulationConfig::default()
        };
        evolve_checking_species(population_config, EuclideanDistance::default(), seed, 3);
    }
}

#[test]
fn champion_fitness_never_decreases() {
    let genetic_config = genetic_config();
    let population_config = PopulationConfig {
        size: NonZeroUsize::new(60).unwrap(),
        initial_connectivity: 1.0,
        species_count: NonZeroUsize::new(5).unwrap(),
        ..PopulationConfig::default()
    };
    let mut rng = StdRng::seed_from_u64(2);
    let mut population = PopulationFactory::new(genetic_config.clone(), population_config)
        .unwrap()
        .create(
            GeneticKMeans::new(EuclideanDistance::default(), SpeciationConfig::default()).unwrap(),
            &mut rng,
        )
        .unwrap();
    let mut logger = EvolutionLogger::new(ReportingLevel::PopulationChampion);

    let mut best = 0.0;
    for generation in 0..25 {
        population.evaluate_fitness(|g| evaluate_xor(g, &genetic_config));
        let fitness = population.champion().fitness();
        assert!(fitness >= best, "generation {}: {} < {}", generation, fitness, best);
        best = fitness;

        logger.log(&population);
        let log = logger.last().unwrap();
        assert_eq!(log.generation_number, generation);
        assert_eq!(log.fitness.maximum, fitness);
        assert_eq!(log.species_sizes.iter().map(|(_, n)| n).sum::<usize>(), 60);
        match &log.generation_sample {
            GenerationMemberRecord::PopulationChampion(champion) => {
                assert_eq!(champion.id(), population.champion().id())
            }
            other => panic!("unexpected sample {:?}", other),
        }

        population.evolve(&mut rng).unwrap();
    }

    assert_eq!(logger.iter().count(), 25);
    assert!(population.genomes().iter().all(|g| g.is_acyclic()));
}

#[test]
fn evolution_is_deterministic_for_a_seed() {
    let run = |seed: u64| {
        let genetic_config = genetic_config();
        let population_config = PopulationConfig {
            size: NonZeroUsize::new(30).unwrap(),
            species_count: NonZeroUsize::new(3).unwrap(),
            ..PopulationConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(seed);
        let mut population = PopulationFactory::new(genetic_config.clone(), population_config)
            .unwrap()
            .create(
                GeneticKMeans::new(
                    EuclideanDistance::default(),
                    SpeciationConfig {
                        parallel: true,
                        ..SpeciationConfig::default()
                    },
                )
                .unwrap(),
                &mut rng,
            )
            .unwrap();
        for _ in 0..8 {
            population.evaluate_fitness(|g| evaluate_xor(g, &genetic_config));
            population.evolve(&mut rng).unwrap();
        }
        population
            .genomes()
            .iter()
            .map(|g| (g.id(), g.connections().clone()))
            .collect::<Vec<_>>()
    };

    assert_eq!(run(4), run(4));
}

#[test]
fn invalid_configurations_fail_fast() {
    let zero_scale = GeneticConfig {
        connection_weight_scale: 0.0,
        ..genetic_config()
    };
    assert!(PopulationFactory::new(zero_scale, PopulationConfig::default()).is_err());

    let too_many_species = PopulationConfig {
        size: NonZeroUsize::new(5).unwrap(),
        species_count: NonZeroUsize::new(6).unwrap(),
        ..PopulationConfig::default()
    };
    assert!(PopulationFactory::new(genetic_config(), too_many_species).is_err());

    let bad_probability = PopulationConfig {
        elitism_proportion: 1.5,
        ..PopulationConfig::default()
    };
    assert!(PopulationFactory::new(genetic_config(), bad_probability).is_err());
}
