//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`ORRERY_SECTION__KEY`)

use figment::{Figment, providers::{Format, Toml, Env}};
use serde::{Serialize, Deserialize};
use std::path::Path;

use orrery_physics::{GravityConfig, SingularityPolicy, DEFAULT_MAX_FRAME_DELTA, G};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Integration settings
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Which scene to run
    #[serde(default)]
    pub scene: SceneConfig,
    /// Display projection and trails
    #[serde(default)]
    pub display: DisplayConfig,
    /// Headless run loop
    #[serde(default)]
    pub run: RunConfig,
    /// Debug configuration
    #[serde(default)]
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. `config/default.toml`
    /// 2. `config/user.toml`
    /// 3. Environment variables (`ORRERY_*`)
    pub fn load() -> Result<Self, AppConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, AppConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // ORRERY_SIMULATION__DT=3600 -> simulation.dt = 3600
        figment = figment.merge(Env::prefixed("ORRERY_").split("__"));

        figment.extract().map_err(AppConfigError::from)
    }
}

/// Integration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed timestep in simulated seconds
    pub dt: f64,
    /// Simulated seconds per real second
    pub time_multiplier: f64,
    /// Gravitational constant (m^3 kg^-1 s^-2)
    pub gravitational_constant: f64,
    /// Longest real frame counted by the clock, in seconds
    pub max_frame_delta: f64,
    /// Separations below this are singular, in meters
    pub min_separation: f64,
    /// `error` halts the simulation, `clamp` caps the force at `min_separation`
    pub singularity: SingularityPolicy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt: 6.0 * 3600.0,
            time_multiplier: 500_000.0,
            gravitational_constant: G,
            max_frame_delta: DEFAULT_MAX_FRAME_DELTA,
            min_separation: 1.0,
            singularity: SingularityPolicy::Error,
        }
    }
}

impl SimulationConfig {
    /// Convert to the physics crate's gravity configuration
    pub fn to_gravity_config(&self) -> GravityConfig {
        GravityConfig::new(self.gravitational_constant)
            .with_singularity(self.min_separation, self.singularity)
    }
}

/// Scene selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// RON scene file; the built-in solar system is used when unset
    pub path: Option<String>,
    /// Pin the root center regardless of what the scene says
    pub fix_center: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            path: None,
            fix_center: true,
        }
    }
}

/// Display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Scene units per astronomical unit
    pub scale: f64,
    /// Points kept per orbit trail
    pub trail_length: usize,
    /// Ticks between trail samples
    pub trail_interval: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            scale: 1.5,
            trail_length: 512,
            trail_interval: 4,
        }
    }
}

/// Headless run loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Frames per real second
    pub frame_rate: f64,
    /// Real seconds to run for
    pub duration: f64,
    /// Real seconds between position reports
    pub report_interval: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60.0,
            duration: 10.0,
            report_interval: 1.0,
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Configuration error
#[derive(Debug)]
pub struct AppConfigError {
    message: String,
}

impl From<figment::Error> for AppConfigError {
    fn from(e: figment::Error) -> Self {
        AppConfigError {
            message: e.to_string(),
        }
    }
}

impl std::fmt::Display for AppConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Configuration error: {}", self.message)
    }
}

impl std::error::Error for AppConfigError {}
