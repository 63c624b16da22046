use std::error::Error;
use std::fmt;

/// The reason a structural mutation left its
/// parent unchanged. Not a failure of the caller:
/// another mutation can simply be tried instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationError {
    /// The parent has no connections to act on.
    NoConnections,
    /// The parent has connections, but none are enabled.
    NoEnabledConnections,
    /// Deleting would leave the parent without connections.
    ConnectivityFloor,
    /// No new connection could be placed.
    NoViableConnection,
}

impl fmt::Display for MutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoConnections => write!(f, "genome has no connections"),
            Self::NoEnabledConnections => write!(f, "genome has no enabled connections"),
            Self::ConnectivityFloor => write!(f, "genome is at its minimum connection count"),
            Self::NoViableConnection => write!(f, "no viable connection found"),
        }
    }
}

impl Error for MutationError {}
