//! Scene validation
//!
//! Validates scenes for common errors before instantiation. The [`SceneValidator`]
//! checks for issues like empty scenes, duplicate body names, systems that
//! reference undefined bodies, and unusable initial states.

use std::collections::HashSet;

use crate::scene::Scene;

/// Validation error found in a scene
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Scene has no bodies
    EmptyScene,
    /// Two bodies share a name
    DuplicateName(String),
    /// The system tree names a body the scene does not define
    UnknownBody(String),
    /// A body appears more than once in the system tree
    RepeatedMember(String),
    /// Mass is zero, negative or not a number
    NonPositiveMass(String),
    /// Position or velocity has a NaN or infinite component
    NonFiniteState(String),
    /// Scene-level gravitational constant is not positive and finite
    InvalidGravitationalConstant(f64),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::EmptyScene => write!(f, "Scene has no bodies"),
            ValidationError::DuplicateName(name) => {
                write!(f, "Duplicate body name: '{}'", name)
            }
            ValidationError::UnknownBody(name) => {
                write!(f, "System references unknown body '{}'", name)
            }
            ValidationError::RepeatedMember(name) => {
                write!(f, "Body '{}' appears more than once in the system tree", name)
            }
            ValidationError::NonPositiveMass(name) => {
                write!(f, "Body '{}' must have a positive mass", name)
            }
            ValidationError::NonFiniteState(name) => {
                write!(f, "Body '{}' has a non-finite position or velocity", name)
            }
            ValidationError::InvalidGravitationalConstant(g) => {
                write!(f, "Invalid gravitational constant: {}", g)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Scene validator that checks for common errors
///
/// Performs static analysis of a [`Scene`] to detect problems before any
/// body is created.
///
/// # Example
/// ```ignore
/// let errors = SceneValidator::validate(&scene);
/// for error in &errors {
///     log::warn!("Validation error: {}", error);
/// }
/// ```
pub struct SceneValidator;

impl SceneValidator {
    /// Validate a scene, returning all errors found
    ///
    /// Returns an empty vector if no validation errors are detected.
    pub fn validate(scene: &Scene) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if scene.bodies.is_empty() {
            errors.push(ValidationError::EmptyScene);
        }

        let mut defined = HashSet::new();
        for body in &scene.bodies {
            if !defined.insert(body.name.as_str()) {
                errors.push(ValidationError::DuplicateName(body.name.clone()));
            }
            if body.mass.is_nan() || body.mass <= 0.0 {
                errors.push(ValidationError::NonPositiveMass(body.name.clone()));
            }
            if !body.position.is_finite() || !body.velocity.is_finite() {
                errors.push(ValidationError::NonFiniteState(body.name.clone()));
            }
        }

        let mut placed = HashSet::new();
        for name in scene.root.names() {
            if !defined.contains(name) {
                errors.push(ValidationError::UnknownBody(name.to_string()));
            } else if !placed.insert(name) {
                errors.push(ValidationError::RepeatedMember(name.to_string()));
            }
        }

        if let Some(g) = scene.gravitational_constant {
            if !(g.is_finite() && g > 0.0) {
                errors.push(ValidationError::InvalidGravitationalConstant(g));
            }
        }

        errors
    }

    /// Validate and return Result (Ok if no errors, Err with all errors)
    pub fn validate_or_error(scene: &Scene) -> Result<(), Vec<ValidationError>> {
        let errors = Self::validate(scene);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
