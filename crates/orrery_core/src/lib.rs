//! Scene-level types for Orrery
//!
//! This crate sits between the physics and the application:
//!
//! - [`BodyTemplate`] / [`SystemTemplate`] - Serializable bodies and system tree
//! - [`Scene`] - Loadable/saveable scene, including the built-in solar system
//! - [`SceneValidator`] - Static checks before a scene is instantiated
//! - [`ActiveScene`] - A scene instantiated into a live [`Simulation`]
//! - [`DisplayProjection`] - Meters to scene units
//! - [`OrbitTrail`] / [`TrailRecorder`] - Recent position history, exportable as `f32` vertices

mod display;
mod scene;
mod scene_validator;
mod template;
mod trail;

pub use display::DisplayProjection;
pub use scene::{ActiveScene, Scene, SceneError, SceneLoadError, SceneSaveError};
pub use scene_validator::{SceneValidator, ValidationError};
pub use template::{BodyTemplate, SystemTemplate};
pub use trail::{vertex_bytes, OrbitTrail, TrailRecorder};

// Re-export commonly used types for convenience
pub use orrery_math::{Vec3, AU};
pub use orrery_physics::{BodyKey, GravityConfig, Simulation};
