use std::error::Error;
use std::fmt;

/// An error type indicating a malformed configuration.
/// Returned by constructors before any state is built.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A probability lies outside `[0, 1]`.
    ProbabilityOutOfRange(&'static str, f64),
    /// A set of exclusive probabilities does not add up to 1.
    ProbabilitySum(&'static str, f64),
    /// The connection weight scale is not a positive, finite number.
    WeightScale(f64),
    /// A standard deviation is not a positive, finite number.
    Sigma(f64),
    /// A weight mutation scheme has no strategies.
    EmptyWeightScheme,
    /// A distance coefficient is negative or not finite.
    DistanceCoefficient(&'static str, f64),
    /// A speciation parameter is negative or not finite.
    SpeciationParameter(&'static str, f64),
    /// More species were requested than there are genomes,
    /// or none at all.
    SpeciesCount {
        requested: usize,
        available: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProbabilityOutOfRange(name, value) => {
                write!(f, "probability {} = {} outside of [0, 1]", name, value)
            }
            Self::ProbabilitySum(name, total) => {
                write!(f, "{} probabilities add up to {} instead of 1", name, total)
            }
            Self::WeightScale(scale) => write!(f, "invalid connection weight scale {}", scale),
            Self::Sigma(sigma) => write!(f, "invalid weight delta standard deviation {}", sigma),
            Self::EmptyWeightScheme => write!(f, "weight mutation scheme with no strategies"),
            Self::DistanceCoefficient(name, value) => {
                write!(f, "invalid distance coefficient {} = {}", name, value)
            }
            Self::SpeciationParameter(name, value) => {
                write!(f, "invalid speciation parameter {} = {}", name, value)
            }
            Self::SpeciesCount {
                requested,
                available,
            } => write!(
                f,
                "cannot form {} species from {} genomes",
                requested, available
            ),
        }
    }
}

impl Error for ConfigError {}

/// Checks that `value` is a probability.
pub(crate) fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ProbabilityOutOfRange(name, value))
    }
}

/// Checks that a set of exclusive probabilities sums to 1.
pub(crate) fn check_probability_sum(name: &'static str, total: f64) -> Result<(), ConfigError> {
    if (total - 1.0).abs() <= 1e-6 {
        Ok(())
    } else {
        Err(ConfigError::ProbabilitySum(name, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probability_bounds() {
        assert!(check_probability("p", 0.0).is_ok());
        assert!(check_probability("p", 1.0).is_ok());
        assert!(check_probability("p", -0.01).is_err());
        assert!(check_probability("p", f64::NAN).is_err());
    }

    #[test]
    fn probability_sum_tolerance() {
        assert!(check_probability_sum("p", 1.0 + 5e-7).is_ok());
        assert_eq!(
            check_probability_sum("asexual", 0.9),
            Err(ConfigError::ProbabilitySum("asexual", 0.9))
        );
    }
}
