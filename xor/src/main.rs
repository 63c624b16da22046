use kneat::distance::ManhattanDistance;
use kneat::genomics::{GeneticConfig, Genome};
use kneat::populations::logging::{EvolutionLogger, ReportingLevel, Stats};
use kneat::populations::{Population, PopulationConfig, PopulationFactory};
use kneat::reproduction::ComplexityRegulationMode;
use kneat::speciation::{GeneticKMeans, SpeciationConfig};
use kneat_nn::{ActivationFunction, Phenotype};

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use std::num::NonZeroUsize;

const ERROR_MARGIN: f64 = 0.3;
const MAX_GENERATIONS: usize = 200;
// Mean connection count above which mutations stop adding structure.
const COMPLEXITY_CEILING: f64 = 30.0;

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

    let mut errors = [0.0; 4];
    for (i, (input, output)) in values.iter().enumerate() {
        errors[i] = match network.activate(input) {
            Ok(answer) => (answer[0] - output).abs(),
            Err(_) => return 0.0,
        };
        if errors[i] < ERROR_MARGIN {
            errors[i] = 0.0;
        }
    }

    (4.0 - errors.iter().sum::<f64>()).powi(2)
}

fn solved(population: &Population<ManhattanDistance>) -> bool {
    (population.champion().fitness() - 16.0).abs() < f64::EPSILON
}

fn main() {
    let genetic_config = GeneticConfig {
        input_count: NonZeroUsize::new(3).unwrap(),
        output_count: NonZeroUsize::new(1).unwrap(),
        acyclic: true,
        connection_weight_scale: 5.0,
    };
    let population_config = PopulationConfig {
        size: NonZeroUsize::new(150).unwrap(),
        initial_connectivity: 1.0,
        species_count: NonZeroUsize::new(8).unwrap(),
        elitism_proportion: 0.2,
        selection_proportion: 0.2,
        sexual_reproduction_chance: 0.5,
        interspecies_mating_chance: 0.01,
    };
    let speciation_config = SpeciationConfig {
        max_kmeans_iterations: NonZeroUsize::new(5).unwrap(),
        parallel: true,
        ..SpeciationConfig::zero()
    };

    stress_test(&genetic_config, &population_config, &speciation_config);
    serde_test(&genetic_config, &population_config, &speciation_config);
}

fn new_population(
    genetic_config: &GeneticConfig,
    population_config: &PopulationConfig,
    speciation_config: &SpeciationConfig,
    rng: &mut StdRng,
) -> Population<ManhattanDistance> {
    PopulationFactory::new(genetic_config.clone(), population_config.clone())
        .and_then(|factory| {
            factory.create(
                GeneticKMeans::new(ManhattanDistance::default(), speciation_config.clone())?,
                rng,
            )
        })
        .unwrap()
}

/// Evolves until solved or out of generations, switching to
/// simplifying mutations while genomes are too large.
fn run(population: &mut Population<ManhattanDistance>, logger: &mut EvolutionLogger, rng: &mut StdRng) {
    let genetic_config = population.genetic_config().clone();
    for _ in 0..MAX_GENERATIONS {
        population.evaluate_fitness(|g| evaluate_xor(g, &genetic_config));
        logger.log(population);
        if solved(population) {
            break;
        }

        let mean_complexity = logger.last().map_or(0.0, |log| log.complexity.mean);
        population.asexual_reproduction_mut().set_mode(if mean_complexity > COMPLEXITY_CEILING {
            ComplexityRegulationMode::Simplifying
        } else {
            ComplexityRegulationMode::Complexifying
        });

        if let Err(e) = population.evolve(rng) {
            eprintln!("{}", e);
            break;
        }
    }
}

fn stress_test(
    genetic_config: &GeneticConfig,
    population_config: &PopulationConfig,
    speciation_config: &SpeciationConfig,
) {
    const ITERATIONS: u64 = 200;
    let generations: Vec<Option<usize>> = (0..ITERATIONS)
        .into_par_iter()
        .map(|seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut population = new_population(genetic_config, population_config, speciation_config, &mut rng);
            let mut logger = EvolutionLogger::new(ReportingLevel::NoGenomes);
            run(&mut population, &mut logger, &mut rng);
            solved(&population).then(|| population.generation())
        })
        .collect();

    println!(
        "Successful run generation count {:?}, {}% failure rate over {} iterations",
        Stats::from(generations.iter().filter_map(|g| g.map(|g| g as f64))),
        generations.iter().filter(|g| g.is_none()).count() as f64 * 100.0 / ITERATIONS as f64,
        ITERATIONS
    );
}

fn serde_test(
    genetic_config: &GeneticConfig,
    population_config: &PopulationConfig,
    speciation_config: &SpeciationConfig,
) {
    let mut rng = StdRng::seed_from_u64(0);
    let mut population = new_population(genetic_config, population_config, speciation_config, &mut rng);
    let mut logger = EvolutionLogger::new(ReportingLevel::SpeciesChampions);
    run(&mut population, &mut logger, &mut rng);

    if let Some(log) = logger.last() {
        println!("{}", log);
    }
    let champion = ron::to_string(population.champion()).unwrap();
    println!("{}", champion);

    let champion: Genome = ron::from_str(&champion).unwrap();
    println!(
        "Deserialized champion scores {}",
        evaluate_xor(&champion, genetic_config)
    );
}
