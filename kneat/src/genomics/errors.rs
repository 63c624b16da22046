use crate::Innovation;

use std::error::Error;
use std::fmt;

/// An error type indicating that a genome or
/// gene sequence breaks a structural invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneValidityError {
    /// Two genes share the same endpoints.
    DuplicateEndpoints(Innovation, Innovation),
    /// Genes are not sorted by endpoints.
    Unsorted,
    /// A gene targets an input node.
    InputTarget(Innovation),
    /// The hidden node list does not match the gene endpoints.
    HiddenNodeMismatch,
    /// The genome is configured acyclic but contains a cycle.
    Cyclic,
}

impl fmt::Display for GeneValidityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateEndpoints(source, target) => write!(
                f,
                "duplicate gene insertion between endpoints {} -> {}",
                source, target
            ),
            Self::Unsorted => write!(f, "connection genes are not sorted by endpoints"),
            Self::InputTarget(id) => write!(f, "gene with input node {} as target", id),
            Self::HiddenNodeMismatch => {
                write!(f, "hidden node list does not match connection endpoints")
            }
            Self::Cyclic => write!(f, "cycle found in genome constrained to be acyclic"),
        }
    }
}

impl Error for GeneValidityError {}
