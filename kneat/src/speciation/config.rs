use crate::errors::ConfigError;

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for genetic k-means speciation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeciationConfig {
    /// Maximum number of reallocation rounds per k-means run.
    pub max_kmeans_iterations: NonZeroUsize,
    /// Weight of the species-size penalty added to distances.
    /// 0 disables regularization.
    pub regularization_constant: f64,
    /// Maximum distance a centroid may move in one k-means round.
    /// `None` lets centroids jump to their members' mean.
    /// Damped runs end with undamped rounds, so centroids
    /// finish at their members' mean either way.
    pub max_centroid_shift: Option<f64>,
    /// Whether to run the assignment step on the rayon thread pool.
    pub parallel: bool,
}

impl SpeciationConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, `None` or `false`, or in the case
    /// of `NonZeroUsize`s, 1.
    ///
    /// # Examples
    /// ```
    /// use kneat::speciation::SpeciationConfig;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = SpeciationConfig {
    ///     max_kmeans_iterations: NonZeroUsize::new(10).unwrap(),
    ///     ..SpeciationConfig::zero()
    /// };
    /// assert!(config.validate().is_ok());
    /// ```
    pub const fn zero() -> SpeciationConfig {
        SpeciationConfig {
            max_kmeans_iterations: NonZeroUsize::MIN,
            regularization_constant: 0.0,
            max_centroid_shift: None,
            parallel: false,
        }
    }

    /// Checks the configuration for malformed values.
    ///
    /// # Errors
    /// Returns an error if the regularization constant is negative
    /// or not finite, or if the centroid shift cap is not positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = self.regularization_constant;
        if !r.is_finite() || r < 0.0 {
            return Err(ConfigError::SpeciationParameter("regularization_constant", r));
        }
        if let Some(shift) = self.max_centroid_shift {
            if !shift.is_finite() || shift <= 0.0 {
                return Err(ConfigError::SpeciationParameter("max_centroid_shift", shift));
            }
        }
        Ok(())
    }
}

impl Default for SpeciationConfig {
    fn default() -> SpeciationConfig {
        SpeciationConfig {
            max_kmeans_iterations: NonZeroUsize::new(5).unwrap_or(NonZeroUsize::MIN),
            ..SpeciationConfig::zero()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_parameters() {
        let negative = SpeciationConfig {
            regularization_constant: -0.1,
            ..SpeciationConfig::default()
        };
        assert!(negative.validate().is_err());

        let zero_shift = SpeciationConfig {
            max_centroid_shift: Some(0.0),
            ..SpeciationConfig::default()
        };
        assert_eq!(
            zero_shift.validate(),
            Err(ConfigError::SpeciationParameter("max_centroid_shift", 0.0))
        );
    }
}
