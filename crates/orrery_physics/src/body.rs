//! Point-mass bodies and their per-tick Verlet state

use std::f64::consts::TAU;

use orrery_math::Vec3;
use slotmap::new_key_type;

use crate::error::{ConfigError, PhysicsError};
use crate::gravity::{GravityConfig, SingularityPolicy};

// Define generational key type for bodies
new_key_type! {
    /// Key to a body in the simulation's body arena
    ///
    /// Systems hold keys instead of references, so the arena is the single
    /// owner of every body and a key can never dangle into a reused slot.
    pub struct BodyKey;
}

/// A gravitating point mass
///
/// Motion is advanced with position Verlet: the body keeps its current and
/// previous position instead of a live velocity. `velocity` is only the
/// initial condition used to synthesize the first previous position.
#[derive(Clone, Debug)]
pub struct Body {
    /// Display/lookup name
    pub name: String,
    position: Vec3,
    previous_position: Vec3,
    velocity: Vec3,
    acceleration: Vec3,
    mass: f64,
    radius: f64,
    orbital_center: Option<BodyKey>,
    display_scale: f64,
    rotation_period: Option<f64>,
    spin_angle: f64,
}

impl Body {
    /// Create a body with initial position (m), velocity (m/s) and mass (kg)
    pub fn new(name: impl Into<String>, position: Vec3, velocity: Vec3, mass: f64) -> Self {
        Self {
            name: name.into(),
            position,
            previous_position: position,
            velocity,
            acceleration: Vec3::ZERO,
            mass,
            radius: 0.0,
            orbital_center: None,
            display_scale: 1.0,
            rotation_period: None,
            spin_angle: 0.0,
        }
    }

    /// Set the display radius (no effect on physics)
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// Set the factor applied to this body's offset from its orbital center when displayed
    pub fn with_display_scale(mut self, display_scale: f64) -> Self {
        self.display_scale = display_scale;
        self
    }

    /// Set the axial rotation period in seconds
    pub fn with_rotation_period(mut self, period: f64) -> Self {
        self.rotation_period = Some(period);
        self
    }

    /// Set the body this one is considered to revolve around
    pub fn with_orbital_center(mut self, center: BodyKey) -> Self {
        self.orbital_center = Some(center);
        self
    }

    /// Check that the initial state can be integrated
    pub fn validate(&self) -> Result<(), ConfigError> {
        let reason = if !(self.mass.is_finite() && self.mass > 0.0) {
            Some(format!("mass must be positive and finite, got {}", self.mass))
        } else if !self.position.is_finite() {
            Some("position is not finite".to_string())
        } else if !self.velocity.is_finite() {
            Some("velocity is not finite".to_string())
        } else if !(self.radius.is_finite() && self.radius >= 0.0) {
            Some(format!("radius must be non-negative, got {}", self.radius))
        } else if !(self.display_scale.is_finite() && self.display_scale > 0.0) {
            Some(format!("display scale must be positive, got {}", self.display_scale))
        } else if matches!(self.rotation_period, Some(p) if !(p.is_finite() && p != 0.0)) {
            Some("rotation period must be finite and non-zero".to_string())
        } else {
            None
        };

        match reason {
            Some(reason) => Err(ConfigError::InvalidBody {
                name: self.name.clone(),
                reason,
            }),
            None => Ok(()),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn previous_position(&self) -> Vec3 {
        self.previous_position
    }

    /// Initial velocity (not advanced by integration)
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Acceleration accumulated during the current tick
    pub fn acceleration(&self) -> Vec3 {
        self.acceleration
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn orbital_center(&self) -> Option<BodyKey> {
        self.orbital_center
    }

    pub(crate) fn set_orbital_center(&mut self, center: Option<BodyKey>) {
        self.orbital_center = center;
    }

    pub fn display_scale(&self) -> f64 {
        self.display_scale
    }

    pub fn rotation_period(&self) -> Option<f64> {
        self.rotation_period
    }

    /// Axial rotation angle in radians, in `[0, 2π)`
    pub fn spin_angle(&self) -> f64 {
        self.spin_angle
    }

    /// Velocity reconstructed from the position history
    pub fn velocity_estimate(&self, dt: f64) -> Vec3 {
        (self.position - self.previous_position) / dt
    }

    /// Zero the accumulated acceleration (start of every force pass)
    pub fn reset_acceleration(&mut self) {
        self.acceleration = Vec3::ZERO;
    }

    /// Add one pairwise contribution to the accumulated acceleration
    pub fn accumulate_acceleration(&mut self, contribution: Vec3) {
        self.acceleration += contribution;
    }

    /// Gravitational acceleration this body experiences due to `other`
    ///
    /// `a = G * m_other / |Δr|^3 * Δr` with `Δr = r_other - r_self`.
    pub fn acceleration_from(&self, other: &Body, gravity: &GravityConfig) -> Result<Vec3, PhysicsError> {
        let mut delta = other.position - self.position;
        let mut distance = delta.length();

        if distance < gravity.min_separation || distance == 0.0 {
            match gravity.singularity {
                SingularityPolicy::Error => {
                    return Err(PhysicsError::SingularConfiguration {
                        first: self.name.clone(),
                        second: other.name.clone(),
                        separation: distance,
                    });
                }
                SingularityPolicy::Clamp => {
                    if distance == 0.0 {
                        // No direction to pull in
                        return Ok(Vec3::ZERO);
                    }
                    // Same direction, stretched out to the minimum separation
                    delta = delta * (gravity.min_separation / distance);
                    distance = gravity.min_separation;
                }
            }
        }

        let magnitude = gravity.gravitational_constant * other.mass / (distance * distance * distance);
        Ok(delta * magnitude)
    }

    /// Synthesize the previous position from the initial velocity
    ///
    /// Second-order Taylor step backwards in time. The acceleration for the
    /// initial configuration must already be accumulated.
    pub fn prime_velocity_verlet(&mut self, dt: f64) {
        self.previous_position =
            self.position - self.velocity * dt + self.acceleration * (0.5 * dt * dt);
    }

    /// Advance one step with the position Verlet recurrence
    pub fn integrate(&mut self, dt: f64) {
        let next = self.position * 2.0 - self.previous_position + self.acceleration * (dt * dt);
        self.previous_position = self.position;
        self.position = next;

        if let Some(period) = self.rotation_period {
            self.spin_angle = (self.spin_angle + TAU * dt / period).rem_euclid(TAU);
        }
    }

    pub fn kinetic_energy(&self, dt: f64) -> f64 {
        0.5 * self.mass * self.velocity_estimate(dt).length_squared()
    }
}
