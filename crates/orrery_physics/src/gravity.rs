//! Gravity configuration

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Newtonian gravitational constant (m^3 kg^-1 s^-2)
pub const G: f64 = 6.674e-11;

/// What to do when two interacting bodies get closer than the minimum separation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SingularityPolicy {
    /// Fail the tick with [`PhysicsError::SingularConfiguration`](crate::PhysicsError)
    #[default]
    Error,
    /// Evaluate the force as if the bodies were `min_separation` apart,
    /// along their actual direction
    Clamp,
}

/// Configuration for the gravity computation
#[derive(Clone, Debug, PartialEq)]
pub struct GravityConfig {
    /// Gravitational constant used for every pairwise interaction
    pub gravitational_constant: f64,
    /// Separations below this (meters) are treated as singular
    pub min_separation: f64,
    /// Handling of singular separations
    pub singularity: SingularityPolicy,
}

impl Default for GravityConfig {
    fn default() -> Self {
        Self {
            gravitational_constant: G,
            min_separation: 1.0,
            singularity: SingularityPolicy::Error,
        }
    }
}

impl GravityConfig {
    /// Create a gravity config with the given constant and default singularity handling
    pub fn new(gravitational_constant: f64) -> Self {
        Self {
            gravitational_constant,
            ..Self::default()
        }
    }

    /// Set the minimum separation and what happens below it
    pub fn with_singularity(mut self, min_separation: f64, policy: SingularityPolicy) -> Self {
        self.min_separation = min_separation.max(0.0);
        self.singularity = policy;
        self
    }

    /// Check that the constants describe attractive, finite gravity
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = self.gravitational_constant;
        if !(g.is_finite() && g > 0.0) {
            return Err(ConfigError::InvalidGravitationalConstant(g));
        }
        if !self.min_separation.is_finite() || self.min_separation < 0.0 {
            return Err(ConfigError::InvalidMinSeparation(self.min_separation));
        }
        Ok(())
    }
}
