//! Serializable body and system templates
//!
//! Templates refer to bodies by name; they are resolved into arena keys when a
//! scene is instantiated.

use serde::{Deserialize, Serialize};

use orrery_math::Vec3;
use orrery_physics::Body;

fn default_display_scale() -> f64 {
    1.0
}

/// Serializable initial state of a body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyTemplate {
    /// Unique name within the scene
    pub name: String,
    /// Initial position (m)
    pub position: Vec3,
    /// Initial velocity (m/s)
    #[serde(default)]
    pub velocity: Vec3,
    /// Mass (kg)
    pub mass: f64,
    /// Physical radius (m)
    #[serde(default)]
    pub radius: f64,
    /// Exaggeration of the offset from the orbital center when drawn
    #[serde(default = "default_display_scale")]
    pub display_scale: f64,
    /// Axial rotation period (s)
    #[serde(default)]
    pub rotation_period: Option<f64>,
}

impl BodyTemplate {
    pub fn new(name: impl Into<String>, position: Vec3, velocity: Vec3, mass: f64) -> Self {
        Self {
            name: name.into(),
            position,
            velocity,
            mass,
            radius: 0.0,
            display_scale: 1.0,
            rotation_period: None,
        }
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_display_scale(mut self, display_scale: f64) -> Self {
        self.display_scale = display_scale;
        self
    }

    pub fn with_rotation_period(mut self, period: f64) -> Self {
        self.rotation_period = Some(period);
        self
    }

    /// Build the runtime body described by this template
    pub fn to_body(&self) -> Body {
        let mut body = Body::new(self.name.clone(), self.position, self.velocity, self.mass)
            .with_radius(self.radius)
            .with_display_scale(self.display_scale);
        if let Some(period) = self.rotation_period {
            body = body.with_rotation_period(period);
        }
        body
    }
}

/// Serializable shape of one level of the system tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemTemplate {
    /// Name of the center body
    pub center: String,
    /// Whether the center is pinned in place
    #[serde(default)]
    pub fixed: bool,
    /// Names of the direct orbiters
    #[serde(default)]
    pub orbiters: Vec<String>,
    /// Nested systems whose centers orbit this one
    #[serde(default)]
    pub subsystems: Vec<SystemTemplate>,
}

impl SystemTemplate {
    pub fn new(center: impl Into<String>) -> Self {
        Self {
            center: center.into(),
            fixed: false,
            orbiters: Vec::new(),
            subsystems: Vec::new(),
        }
    }

    pub fn fixed(mut self) -> Self {
        self.fixed = true;
        self
    }

    pub fn with_orbiter(mut self, name: impl Into<String>) -> Self {
        self.orbiters.push(name.into());
        self
    }

    pub fn with_subsystem(mut self, subsystem: SystemTemplate) -> Self {
        self.subsystems.push(subsystem);
        self
    }

    /// Every body name referenced by this level and the levels below it
    pub fn names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        out.push(&self.center);
        out.extend(self.orbiters.iter().map(String::as_str));
        for sub in &self.subsystems {
            sub.collect_names(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_template_to_body() {
        let template = BodyTemplate::new("Moon", Vec3::new(3e8, 0.0, 0.0), Vec3::new(0.0, 1022.0, 0.0), 7.35e22)
            .with_radius(1.7374e6)
            .with_display_scale(60.0)
            .with_rotation_period(86400.0);
        let body = template.to_body();

        assert_eq!(body.name, "Moon");
        assert_eq!(body.position(), Vec3::new(3e8, 0.0, 0.0));
        assert_eq!(body.velocity(), Vec3::new(0.0, 1022.0, 0.0));
        assert_eq!(body.mass(), 7.35e22);
        assert_eq!(body.radius(), 1.7374e6);
        assert_eq!(body.display_scale(), 60.0);
        assert_eq!(body.rotation_period(), Some(86400.0));
    }

    #[test]
    fn test_body_template_defaults_from_ron() {
        let template: BodyTemplate = ron::from_str(
            r#"(name: "Rock", position: (x: 1.0, y: 2.0, z: 3.0), mass: 5.0)"#,
        )
        .unwrap();
        assert_eq!(template.velocity, Vec3::ZERO);
        assert_eq!(template.radius, 0.0);
        assert_eq!(template.display_scale, 1.0);
        assert!(template.rotation_period.is_none());
    }

    #[test]
    fn test_system_template_names() {
        let system = SystemTemplate::new("Sun")
            .fixed()
            .with_orbiter("Mars")
            .with_subsystem(SystemTemplate::new("Earth").with_orbiter("Moon"));

        assert!(system.fixed);
        assert_eq!(system.names(), vec!["Sun", "Mars", "Earth", "Moon"]);
    }
}
