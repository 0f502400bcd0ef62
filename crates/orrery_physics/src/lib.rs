//! Hierarchical gravitational N-body simulation for Orrery
//!
//! This crate provides:
//! - Bodies integrated with position Verlet
//! - Orbital systems (center, orbiters, nested subsystems) that schedule the force pass
//! - A simulation arena with a strict setup / running / halted lifecycle
//! - A fixed-timestep clock that turns frame time into simulation ticks

pub mod body;
pub mod clock;
pub mod error;
pub mod gravity;
pub mod simulation;
pub mod system;

// Re-export commonly used types
pub use body::{Body, BodyKey};
pub use clock::{FixedTimestep, DEFAULT_MAX_FRAME_DELTA};
pub use error::{ConfigError, PhysicsError};
pub use gravity::{GravityConfig, SingularityPolicy, G};
pub use simulation::{Simulation, SimulationPhase};
pub use system::{BodyArena, OrbitalSystem};
