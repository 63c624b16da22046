use std::error::Error;
use std::fmt;

/// An error type indicating a genome or graph
/// could not be turned into a runnable network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// A graph decoded as acyclic contains a cycle.
    CyclicGraph,
    /// A cyclic network was requested with zero
    /// timesteps per activation.
    ZeroCycles,
    /// The number of inputs passed to a network
    /// does not match its input node count.
    InputCount { expected: usize, found: usize },
    /// No activation function has the given name.
    UnknownActivation(String),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CyclicGraph => write!(f, "graph marked acyclic contains a cycle"),
            Self::ZeroCycles => write!(f, "cyclic network requires at least one cycle per activation"),
            Self::InputCount { expected, found } => {
                write!(f, "expected {} network inputs, found {}", expected, found)
            }
            Self::UnknownActivation(name) => write!(f, "unknown activation function '{}'", name),
        }
    }
}

impl Error for NetworkError {}
