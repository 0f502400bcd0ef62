//! Vector math for the orrery simulation
//!
//! ## Core Types
//!
//! - [`Vec3`] - double-precision 3D vector used for positions, velocities and accelerations

mod vec3;

pub use vec3::Vec3;

/// Astronomical unit in meters
pub const AU: f64 = 1.496e11;
