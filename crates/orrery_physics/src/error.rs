//! Error types for simulation setup and stepping
//!
//! Setup mistakes are reported as [`ConfigError`] as soon as they are made.
//! Runtime failures are [`PhysicsError`]; any of them halts the simulation.

use std::fmt;

use crate::body::BodyKey;

/// Invalid simulation configuration, detected at setup time
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The system has no center yet (orbiters and subsystems need one)
    MissingCenter,
    /// `define_center` was called on a system that already has a center
    CenterAlreadyDefined,
    /// A key that does not belong to the simulation's body arena
    UnknownBody(BodyKey),
    /// The same body is reachable twice in the system tree
    DuplicateBody(BodyKey),
    /// A body was used as both the center and an orbiter of one system
    CenterIsOrbiter(BodyKey),
    /// The simulation has already been initialized and can no longer be edited
    AlreadyInitialized,
    /// No root system was installed before initializing
    NoRootSystem,
    /// A body's initial state is unusable
    InvalidBody { name: String, reason: String },
    /// The fixed timestep must be positive and finite
    InvalidTimestep(f64),
    /// The gravitational constant must be positive and finite
    InvalidGravitationalConstant(f64),
    /// The minimum separation must be finite
    InvalidMinSeparation(f64),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingCenter => write!(f, "System has no center body"),
            ConfigError::CenterAlreadyDefined => write!(f, "System center is already defined"),
            ConfigError::UnknownBody(key) => write!(f, "Unknown body: {:?}", key),
            ConfigError::DuplicateBody(key) => {
                write!(f, "Body {:?} is already part of the system tree", key)
            }
            ConfigError::CenterIsOrbiter(key) => {
                write!(f, "Body {:?} cannot be both center and orbiter", key)
            }
            ConfigError::AlreadyInitialized => write!(f, "Simulation is already initialized"),
            ConfigError::NoRootSystem => write!(f, "No root system installed"),
            ConfigError::InvalidBody { name, reason } => {
                write!(f, "Invalid body '{}': {}", name, reason)
            }
            ConfigError::InvalidTimestep(dt) => write!(f, "Invalid timestep: {} s", dt),
            ConfigError::InvalidGravitationalConstant(g) => {
                write!(f, "Invalid gravitational constant: {}", g)
            }
            ConfigError::InvalidMinSeparation(d) => write!(f, "Invalid minimum separation: {} m", d),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Error raised while initializing or stepping a simulation
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// Configuration problem found when the simulation started
    Config(ConfigError),
    /// Two interacting bodies are closer than the configured minimum separation
    SingularConfiguration {
        first: String,
        second: String,
        separation: f64,
    },
    /// An earlier tick failed; the trajectory is no longer trustworthy
    Halted,
}

impl fmt::Display for PhysicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicsError::Config(e) => write!(f, "Configuration error: {}", e),
            PhysicsError::SingularConfiguration { first, second, separation } => write!(
                f,
                "Singular configuration: '{}' and '{}' are {} m apart",
                first, second, separation
            ),
            PhysicsError::Halted => write!(f, "Simulation halted after a failed tick"),
        }
    }
}

impl std::error::Error for PhysicsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PhysicsError::Config(e) => Some(e),
            PhysicsError::SingularConfiguration { .. } => None,
            PhysicsError::Halted => None,
        }
    }
}

impl From<ConfigError> for PhysicsError {
    fn from(e: ConfigError) -> Self {
        PhysicsError::Config(e)
    }
}
