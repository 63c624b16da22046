use crate::errors::ConfigError;

use std::error::Error;
use std::fmt;

/// An error type indicating that a generation
/// could not be evolved.
#[derive(Debug, Clone, PartialEq)]
pub enum EvolutionError {
    /// No species has a positive, finite mean fitness,
    /// so offspring cannot be allotted.
    DegeneratePopulation,
    /// The offspring could not be speciated.
    Speciation(ConfigError),
}

impl fmt::Display for EvolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegeneratePopulation => write!(f, "attempted evolution on degenerate population"),
            Self::Speciation(e) => write!(f, "speciation of offspring failed: {}", e),
        }
    }
}

impl Error for EvolutionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::DegeneratePopulation => None,
            Self::Speciation(e) => Some(e),
        }
    }
}

impl From<ConfigError> for EvolutionError {
    fn from(e: ConfigError) -> EvolutionError {
        EvolutionError::Speciation(e)
    }
}
