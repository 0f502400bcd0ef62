//! Orrery - hierarchical gravitational N-body simulation
//!
//! Library half of the application, shared by the binary and its integration tests.

pub mod config;
pub mod systems;
