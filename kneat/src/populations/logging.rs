use super::Population;
use crate::distance::DistanceMetric;
use crate::genomics::Genome;
use crate::speciation::SpeciesID;

use serde::{Deserialize, Serialize};

use std::fmt;

/// Defines different possible reporting levels for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportingLevel {
    /// Clones the entire population.
    AllGenomes,
    /// Clones species and their champions.
    SpeciesChampions,
    /// Clones only the population champion.
    PopulationChampion,
    /// Clones no genomes.
    NoGenomes,
}

/// A snapshot of a population.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Log {
    pub generation_number: usize,
    pub generation_sample: GenerationMemberRecord,
    pub species_count: usize,
    /// Member count of each species, in species order.
    pub species_sizes: Vec<(SpeciesID, usize)>,
    pub fitness: Stats,
    /// Connection gene counts.
    pub complexity: Stats,
    pub hidden_node_count: Stats,
}

impl fmt::Display for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Log {{\n\
            \tgeneration_number: {:?}\n\
            \tspecies_count: {:?}\n\
            \tspecies_sizes: {:?}\n\
            \tfitness: {:?}\n\
            \tcomplexity: {:?}\n\
            \thidden_node_count: {:?}\n\
            }}",
            &self.generation_number,
            &self.species_count,
            self.species_sizes.iter().map(|(_, n)| n).collect::<Vec<_>>(),
            &self.fitness,
            &self.complexity,
            &self.hidden_node_count,
        )
    }
}

/// A struct for reporting basic statistical data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub maximum: f64,
    pub minimum: f64,
    pub mean: f64,
    pub median: f64,
}

impl Stats {
    /// Returns statistics about numbers in a sequence.
    /// All values are NaN for an empty sequence.
    ///
    /// # Examples
    /// ```
    /// use kneat::populations::logging::Stats;
    ///
    /// let stats = Stats::from([-2.0, -1.0, 0.5, 1.0, 1.5].iter().copied());
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    /// ```
    pub fn from(data: impl Iterator<Item = f64>) -> Stats {
        let mut data: Vec<f64> = data.collect();
        if data.is_empty() {
            return Stats {
                maximum: f64::NAN,
                minimum: f64::NAN,
                mean: f64::NAN,
                median: f64::NAN,
            };
        }

        let (mut max, mut min, mut sum) = (f64::MIN, f64::MAX, 0.0);
        for d in &data {
            max = d.max(max);
            min = d.min(min);
            sum += d;
        }
        let mean = sum / data.len() as f64;

        data.sort_unstable_by(f64::total_cmp);
        let mid = data.len() / 2;
        let median = if data.len() % 2 == 0 {
            (data[mid - 1] + data[mid]) / 2.0
        } else {
            data[mid]
        };

        Stats {
            maximum: max,
            minimum: min,
            mean,
            median,
        }
    }
}

/// A reporting-level dependant store
/// of genomes from a population.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum GenerationMemberRecord {
    /// Species IDs and their genomes.
    Species(Vec<(SpeciesID, Vec<Genome>)>),
    /// Only species IDs and species champions.
    SpeciesChampions(Vec<(SpeciesID, Genome)>),
    /// Only population champion.
    PopulationChampion(Genome),
    /// Empty.
    None,
}

/// A log of the evolution of a population over time.
#[derive(Clone, Debug)]
pub struct EvolutionLogger {
    reporting_level: ReportingLevel,
    logs: Vec<Log>,
}

impl EvolutionLogger {
    /// Returns a logger with the appropiate reporting level.
    pub fn new(reporting_level: ReportingLevel) -> EvolutionLogger {
        EvolutionLogger {
            reporting_level,
            logs: vec![],
        }
    }

    /// Store a snapshot of a population.
    ///
    /// # Examples
    /// ```
    /// use kneat::distance::ManhattanDistance;
    /// use kneat::genomics::GeneticConfig;
    /// use kneat::populations::logging::{EvolutionLogger, ReportingLevel};
    /// use kneat::populations::{PopulationConfig, PopulationFactory};
    /// use kneat::speciation::{GeneticKMeans, SpeciationConfig};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let population = PopulationFactory::new(GeneticConfig::default(), PopulationConfig::default())
    ///     .unwrap()
    ///     .create(
    ///         GeneticKMeans::new(ManhattanDistance::default(), SpeciationConfig::default()).unwrap(),
    ///         &mut StdRng::seed_from_u64(0),
    ///     )
    ///     .unwrap();
    ///
    /// let mut logger = EvolutionLogger::new(ReportingLevel::PopulationChampion);
    /// logger.log(&population);
    ///
    /// let log = logger.iter().next().unwrap();
    /// assert_eq!(log.generation_number, 0);
    /// assert_eq!(log.complexity.minimum, 1.0);
    /// ```
    pub fn log<M: DistanceMetric>(&mut self, population: &Population<M>) {
        let genomes = population.genomes();

        self.logs.push(Log {
            generation_number: population.generation(),
            generation_sample: match self.reporting_level {
                ReportingLevel::AllGenomes => GenerationMemberRecord::Species(
                    population
                        .species()
                        .iter()
                        .map(|s| (s.id(), members(genomes, s.members()).cloned().collect()))
                        .collect(),
                ),
                ReportingLevel::SpeciesChampions => GenerationMemberRecord::SpeciesChampions(
                    population
                        .species()
                        .iter()
                        .filter_map(|s| {
                            members(genomes, s.members())
                                .max_by(|a, b| a.fitness().total_cmp(&b.fitness()))
                                .map(|champion| (s.id(), champion.clone()))
                        })
                        .collect(),
                ),
                ReportingLevel::PopulationChampion => {
                    GenerationMemberRecord::PopulationChampion(population.champion().clone())
                }
                ReportingLevel::NoGenomes => GenerationMemberRecord::None,
            },
            species_count: population.species().len(),
            species_sizes: population.species().iter().map(|s| (s.id(), s.len())).collect(),
            fitness: Stats::from(genomes.iter().map(Genome::fitness)),
            complexity: Stats::from(genomes.iter().map(|g| g.complexity() as f64)),
            hidden_node_count: Stats::from(genomes.iter().map(|g| g.hidden_nodes().len() as f64)),
        });
    }

    /// Iterate over all logged snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &Log> {
        self.logs.iter()
    }

    /// Returns the latest snapshot, if any.
    pub fn last(&self) -> Option<&Log> {
        self.logs.last()
    }
}

fn members<'a>(genomes: &'a [Genome], ids: &'a [usize]) -> impl Iterator<Item = &'a Genome> + 'a {
    ids.iter().map(move |&i| &genomes[i])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_length_median() {
        let stats = Stats::from([4.0, 1.0, 3.0, 2.0].iter().copied());
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.mean, 2.5);
    }

    #[test]
    fn empty_stats_are_nan() {
        let stats = Stats::from(std::iter::empty());
        assert!(stats.mean.is_nan() && stats.median.is_nan());
    }
}
