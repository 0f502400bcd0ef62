//! Mapping from physical positions to display coordinates

use orrery_math::{Vec3, AU};
use orrery_physics::{BodyKey, Simulation};

/// Scales meters down to scene units
///
/// One astronomical unit maps to `scale` scene units. Bodies with a display
/// scale other than 1 have their offset from their orbital center exaggerated,
/// so a moon remains visible next to its planet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayProjection {
    pub scale: f64,
}

impl Default for DisplayProjection {
    fn default() -> Self {
        Self { scale: 1.5 }
    }
}

impl DisplayProjection {
    pub fn new(scale: f64) -> Self {
        Self { scale }
    }

    /// Convert a position in meters to scene units
    pub fn project(&self, position: Vec3) -> Vec3 {
        position * (self.scale / AU)
    }

    /// Display position of a body, honoring its display scale
    pub fn display_position(&self, simulation: &Simulation, key: BodyKey) -> Option<Vec3> {
        let body = simulation.body(key)?;
        let position = body.position();

        let center = body
            .orbital_center()
            .filter(|_| body.display_scale() != 1.0)
            .and_then(|c| simulation.position(c));

        Some(match center {
            Some(center) => {
                self.project(center) + self.project(position - center) * body.display_scale()
            }
            None => self.project(position),
        })
    }
}
