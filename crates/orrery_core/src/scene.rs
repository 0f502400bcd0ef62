//! Scene serialization
//!
//! Provides Scene struct for loading/saving scenes from RON files.
//! Scenes contain body templates, the system tree and optional physics settings.

use serde::{Serialize, Deserialize};
use std::collections::HashMap;
use std::path::Path;
use std::fs;
use std::io;

use orrery_math::{Vec3, AU};
use orrery_physics::{BodyKey, GravityConfig, OrbitalSystem, PhysicsError, Simulation};

use crate::scene_validator::{SceneValidator, ValidationError};
use crate::template::{BodyTemplate, SystemTemplate};

/// Default rotation period for the built-in bodies (one day)
const DAY: f64 = 24.0 * 3600.0;

/// A serializable scene: bodies plus the shape of the system tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// Scene name (for display/debugging)
    pub name: String,
    /// Body templates in this scene
    pub bodies: Vec<BodyTemplate>,
    /// Root of the system tree
    pub root: SystemTemplate,
    /// Overrides the configured gravitational constant
    #[serde(default)]
    pub gravitational_constant: Option<f64>,
}

impl Scene {
    /// Create a new empty scene whose root is centered on `center`
    pub fn new(name: impl Into<String>, center: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bodies: Vec::new(),
            root: SystemTemplate::new(center),
            gravitational_constant: None,
        }
    }

    /// Load a scene from a RON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SceneLoadError> {
        let contents = fs::read_to_string(path)?;
        let scene = ron::from_str(&contents)?;
        Ok(scene)
    }

    /// Save a scene to a RON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SceneSaveError> {
        let pretty = ron::ser::PrettyConfig::new()
            .struct_names(true)
            .enumerate_arrays(false);
        let contents = ron::ser::to_string_pretty(self, pretty)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Add a body template to this scene
    pub fn add_body(&mut self, body: BodyTemplate) {
        self.bodies.push(body);
    }

    /// Replace the system tree
    pub fn with_root(mut self, root: SystemTemplate) -> Self {
        self.root = root;
        self
    }

    pub fn with_gravitational_constant(mut self, g: f64) -> Self {
        self.gravitational_constant = Some(g);
        self
    }

    /// Look up a body template by name
    pub fn body(&self, name: &str) -> Option<&BodyTemplate> {
        self.bodies.iter().find(|b| b.name == name)
    }

    /// The inner solar system with the Moon orbiting the Earth
    ///
    /// The Sun is pinned at the origin. Mercury, Venus and Mars orbit it
    /// directly; the Earth is the center of its own subsystem.
    pub fn solar_system() -> Self {
        let planet = |name: &str, distance: f64, speed: f64, mass: f64, radius_km: f64| {
            BodyTemplate::new(name, Vec3::new(distance, 0.0, 0.0), Vec3::new(0.0, speed, 0.0), mass)
                .with_radius(radius_km * 1000.0)
                .with_rotation_period(DAY)
        };

        let mut scene = Scene::new("Solar System", "Sun");
        scene.add_body(BodyTemplate::new("Sun", Vec3::ZERO, Vec3::ZERO, 2e30).with_radius(6.9634e8));
        scene.add_body(planet("Mercury", 5.80e10, 47360.0, 3.3e23, 2439.7));
        scene.add_body(planet("Venus", 1.08e11, 35025.0, 5e24, 6051.8));
        scene.add_body(planet("Earth", AU, 29780.0, 6e24, 6371.0));
        scene.add_body(planet("Mars", 2.279e11, 24080.0, 6e24, 3389.5));
        scene.add_body(
            planet("Moon", AU + 3e8, 29780.0 + 1022.0, 7.35e22, 1737.4).with_display_scale(60.0),
        );

        scene.with_root(
            SystemTemplate::new("Sun")
                .fixed()
                .with_orbiter("Mercury")
                .with_orbiter("Venus")
                .with_orbiter("Mars")
                .with_subsystem(SystemTemplate::new("Earth").with_orbiter("Moon")),
        )
    }
}

/// Error loading a scene
#[derive(Debug)]
pub enum SceneLoadError {
    /// IO error (file not found, permission denied, etc.)
    Io(io::Error),
    /// Parse error (invalid RON syntax)
    Parse(ron::error::SpannedError),
}

impl From<io::Error> for SceneLoadError {
    fn from(e: io::Error) -> Self {
        SceneLoadError::Io(e)
    }
}

impl From<ron::error::SpannedError> for SceneLoadError {
    fn from(e: ron::error::SpannedError) -> Self {
        SceneLoadError::Parse(e)
    }
}

impl std::fmt::Display for SceneLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneLoadError::Io(e) => write!(f, "IO error: {}", e),
            SceneLoadError::Parse(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for SceneLoadError {}

/// Error saving a scene
#[derive(Debug)]
pub enum SceneSaveError {
    /// IO error (permission denied, disk full, etc.)
    Io(io::Error),
    /// Serialization error
    Serialize(ron::Error),
}

impl From<io::Error> for SceneSaveError {
    fn from(e: io::Error) -> Self {
        SceneSaveError::Io(e)
    }
}

impl From<ron::Error> for SceneSaveError {
    fn from(e: ron::Error) -> Self {
        SceneSaveError::Serialize(e)
    }
}

impl std::fmt::Display for SceneSaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneSaveError::Io(e) => write!(f, "IO error: {}", e),
            SceneSaveError::Serialize(e) => write!(f, "Serialize error: {}", e),
        }
    }
}

impl std::error::Error for SceneSaveError {}

/// Unified error type for scene operations
#[derive(Debug)]
pub enum SceneError {
    /// IO error (file not found, permission denied, etc.)
    Io(io::Error),
    /// Parse error (invalid RON syntax)
    Parse(ron::error::SpannedError),
    /// Serialization error
    Serialize(ron::Error),
    /// The scene failed validation
    Validation(Vec<ValidationError>),
    /// The physics layer rejected the scene
    Physics(PhysicsError),
    /// A system references a body the scene does not define
    UnknownBodyName(String),
}

impl From<io::Error> for SceneError {
    fn from(e: io::Error) -> Self {
        SceneError::Io(e)
    }
}

impl From<ron::error::SpannedError> for SceneError {
    fn from(e: ron::error::SpannedError) -> Self {
        SceneError::Parse(e)
    }
}

impl From<ron::Error> for SceneError {
    fn from(e: ron::Error) -> Self {
        SceneError::Serialize(e)
    }
}

impl From<SceneLoadError> for SceneError {
    fn from(e: SceneLoadError) -> Self {
        match e {
            SceneLoadError::Io(io_err) => SceneError::Io(io_err),
            SceneLoadError::Parse(parse_err) => SceneError::Parse(parse_err),
        }
    }
}

impl From<PhysicsError> for SceneError {
    fn from(e: PhysicsError) -> Self {
        SceneError::Physics(e)
    }
}

impl From<orrery_physics::ConfigError> for SceneError {
    fn from(e: orrery_physics::ConfigError) -> Self {
        SceneError::Physics(e.into())
    }
}

impl From<Vec<ValidationError>> for SceneError {
    fn from(errors: Vec<ValidationError>) -> Self {
        SceneError::Validation(errors)
    }
}

impl std::fmt::Display for SceneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneError::Io(e) => write!(f, "IO error: {}", e),
            SceneError::Parse(e) => write!(f, "Parse error: {}", e),
            SceneError::Serialize(e) => write!(f, "Serialize error: {}", e),
            SceneError::Validation(errors) => {
                write!(f, "Scene failed validation:")?;
                for error in errors {
                    write!(f, " {};", error)?;
                }
                Ok(())
            }
            SceneError::Physics(e) => write!(f, "Physics error: {}", e),
            SceneError::UnknownBodyName(name) => write!(f, "Unknown body name: '{}'", name),
        }
    }
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SceneError::Io(e) => Some(e),
            SceneError::Parse(e) => Some(e),
            SceneError::Serialize(e) => Some(e),
            SceneError::Physics(e) => Some(e),
            SceneError::Validation(_) | SceneError::UnknownBodyName(_) => None,
        }
    }
}

/// A runtime scene containing an instantiated [`Simulation`]
///
/// Keeps the name → key map so callers can refer to bodies the way the scene
/// file does.
pub struct ActiveScene {
    /// Scene name (from template)
    pub name: String,
    /// The live simulation
    pub simulation: Simulation,
    keys: HashMap<String, BodyKey>,
}

impl ActiveScene {
    /// Validate a scene and instantiate it into a new simulation
    ///
    /// The scene's own gravitational constant, if any, overrides the one in
    /// `gravity`.
    pub fn from_template(template: &Scene, mut gravity: GravityConfig, dt: f64) -> Result<Self, SceneError> {
        SceneValidator::validate_or_error(template)?;

        if let Some(g) = template.gravitational_constant {
            gravity.gravitational_constant = g;
        }
        let mut simulation = Simulation::with_config(gravity, dt);

        let mut keys = HashMap::new();
        for body in &template.bodies {
            let key = simulation.add_body(body.to_body())?;
            keys.insert(body.name.clone(), key);
        }

        let root = build_system(&template.root, &keys)?;
        simulation.set_root(root)?;

        log::info!(
            "Instantiated scene '{}' with {} bodies",
            template.name,
            template.bodies.len()
        );

        Ok(Self {
            name: template.name.clone(),
            simulation,
            keys,
        })
    }

    /// Key of the body with the given name
    pub fn key(&self, name: &str) -> Option<BodyKey> {
        self.keys.get(name).copied()
    }

    /// Current position of the named body
    pub fn position(&self, name: &str) -> Option<Vec3> {
        self.key(name).and_then(|key| self.simulation.position(key))
    }

    /// Body names and keys, sorted by name
    pub fn named_keys(&self) -> Vec<(&str, BodyKey)> {
        let mut out: Vec<_> = self.keys.iter().map(|(n, k)| (n.as_str(), *k)).collect();
        out.sort_by(|a, b| a.0.cmp(b.0));
        out
    }
}

fn build_system(template: &SystemTemplate, keys: &HashMap<String, BodyKey>) -> Result<OrbitalSystem, SceneError> {
    let lookup = |name: &str| {
        keys.get(name)
            .copied()
            .ok_or_else(|| SceneError::UnknownBodyName(name.to_string()))
    };

    let mut system = OrbitalSystem::with_center(lookup(&template.center)?);
    system.fix_center(template.fixed);
    for name in &template.orbiters {
        system.add_orbiter(lookup(name)?)?;
    }
    for sub in &template.subsystems {
        system.add_subsystem(build_system(sub, keys)?)?;
    }
    Ok(system)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_body_scene() -> Scene {
        let mut scene = Scene::new("Binary", "Star").with_root(
            SystemTemplate::new("Star").with_orbiter("Planet"),
        );
        scene.add_body(BodyTemplate::new("Star", Vec3::ZERO, Vec3::ZERO, 1e30));
        scene.add_body(BodyTemplate::new(
            "Planet",
            Vec3::new(1e11, 0.0, 0.0),
            Vec3::new(0.0, 30000.0, 0.0),
            1e24,
        ));
        scene
    }

    #[test]
    fn test_scene_new() {
        let scene = Scene::new("Test Scene", "Sun");
        assert_eq!(scene.name, "Test Scene");
        assert!(scene.bodies.is_empty());
        assert_eq!(scene.root.center, "Sun");
        assert!(scene.gravitational_constant.is_none());
    }

    #[test]
    fn test_solar_system_layout() {
        let scene = Scene::solar_system();
        assert_eq!(scene.bodies.len(), 6);
        assert!(scene.root.fixed);
        assert_eq!(scene.root.orbiters, vec!["Mercury", "Venus", "Mars"]);
        assert_eq!(scene.root.subsystems.len(), 1);
        assert_eq!(scene.root.subsystems[0].center, "Earth");
        assert_eq!(scene.root.subsystems[0].orbiters, vec!["Moon"]);

        let moon = scene.body("Moon").unwrap();
        assert_eq!(moon.position, Vec3::new(AU + 3e8, 0.0, 0.0));
        assert_eq!(moon.velocity, Vec3::new(0.0, 30802.0, 0.0));
        assert_eq!(moon.display_scale, 60.0);
        assert!(SceneValidator::validate(&scene).is_empty());
    }

    #[test]
    fn test_scene_serialization() {
        let scene = Scene::solar_system().with_gravitational_constant(6.67e-11);

        let pretty = ron::ser::PrettyConfig::new().struct_names(true);
        let serialized = ron::ser::to_string_pretty(&scene, pretty).unwrap();
        assert!(serialized.contains("Solar System"));
        assert!(serialized.contains("Mercury"));

        let deserialized: Scene = ron::from_str(&serialized).unwrap();
        assert_eq!(deserialized.name, "Solar System");
        assert_eq!(deserialized.bodies, scene.bodies);
        assert_eq!(deserialized.root, scene.root);
        assert_eq!(deserialized.gravitational_constant, Some(6.67e-11));
    }

    #[test]
    fn test_parse_scene_file_format() {
        let scene_ron = r#"
Scene(
    name: "Binary",
    bodies: [
        BodyTemplate(
            name: "Star",
            position: Vec3(x: 0.0, y: 0.0, z: 0.0),
            mass: 2e30,
        ),
        BodyTemplate(
            name: "Planet",
            position: Vec3(x: 1.5e11, y: 0.0, z: 0.0),
            velocity: Vec3(x: 0.0, y: 29780.0, z: 0.0),
            mass: 6e24,
            rotation_period: Some(86400.0),
        ),
    ],
    root: SystemTemplate(
        center: "Star",
        fixed: true,
        orbiters: ["Planet"],
    ),
)
"#;
        let scene: Scene = ron::from_str(scene_ron).unwrap();
        assert_eq!(scene.name, "Binary");
        assert_eq!(scene.bodies.len(), 2);
        assert_eq!(scene.bodies[1].velocity, Vec3::new(0.0, 29780.0, 0.0));
        assert_eq!(scene.bodies[1].rotation_period, Some(86400.0));
        assert!(scene.root.fixed);
        assert!(scene.root.subsystems.is_empty());
        assert!(scene.gravitational_constant.is_none());
    }

    #[test]
    fn test_active_scene_from_template() {
        let active = ActiveScene::from_template(&two_body_scene(), GravityConfig::default(), 3600.0).unwrap();
        assert_eq!(active.name, "Binary");
        assert_eq!(active.simulation.body_count(), 2);

        let star = active.key("Star").unwrap();
        let planet = active.key("Planet").unwrap();
        assert_eq!(active.simulation.root().unwrap().center(), Some(star));
        assert_eq!(active.simulation.body(planet).unwrap().orbital_center(), Some(star));
        assert_eq!(active.position("Planet"), Some(Vec3::new(1e11, 0.0, 0.0)));
        assert!(active.key("Nobody").is_none());

        let names: Vec<_> = active.named_keys().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Planet", "Star"]);
    }

    #[test]
    fn test_scene_gravity_override() {
        let scene = two_body_scene().with_gravitational_constant(1.0);
        let active = ActiveScene::from_template(&scene, GravityConfig::default(), 1.0).unwrap();
        assert_eq!(active.simulation.gravity().gravitational_constant, 1.0);
    }

    #[test]
    fn test_invalid_scene_rejected() {
        let mut scene = two_body_scene();
        scene.root.orbiters.push("Ghost".to_string());
        let result = ActiveScene::from_template(&scene, GravityConfig::default(), 1.0);
        match result {
            Err(SceneError::Validation(errors)) => {
                assert_eq!(errors, vec![ValidationError::UnknownBody("Ghost".to_string())]);
            }
            _ => panic!("expected a validation error"),
        }
    }

    #[test]
    fn test_center_listed_as_orbiter_rejected() {
        let mut scene = two_body_scene();
        scene.root.orbiters.push("Star".to_string());
        let result = ActiveScene::from_template(&scene, GravityConfig::default(), 1.0);
        assert!(result.is_err());
    }
}
