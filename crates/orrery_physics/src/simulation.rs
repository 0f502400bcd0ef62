//! Simulation state: the body arena, the system tree and the tick protocol

use std::collections::HashSet;

use orrery_math::Vec3;

use crate::body::{Body, BodyKey};
use crate::error::{ConfigError, PhysicsError};
use crate::gravity::GravityConfig;
use crate::system::{BodyArena, OrbitalSystem};

/// Where a simulation is in its lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationPhase {
    /// Bodies and systems can still be added
    Setup,
    /// Initialized; only [`Simulation::step`] advances it
    Running,
    /// A tick failed and the simulation refuses to continue
    Halted,
}

/// A complete gravitational simulation
///
/// Owns every [`Body`] in a generational arena and the root [`OrbitalSystem`]
/// that schedules force computation and integration over them. The only way to
/// advance time is [`step`](Self::step), which runs the whole force pass before
/// moving any body.
pub struct Simulation {
    bodies: BodyArena,
    root: Option<OrbitalSystem>,
    gravity: GravityConfig,
    dt: f64,
    phase: SimulationPhase,
    ticks: u64,
}

impl Simulation {
    /// Create a simulation with default gravity and the given fixed timestep (seconds)
    pub fn new(dt: f64) -> Self {
        Self::with_config(GravityConfig::default(), dt)
    }

    /// Create a simulation with custom gravity configuration
    pub fn with_config(gravity: GravityConfig, dt: f64) -> Self {
        Self {
            bodies: BodyArena::with_key(),
            root: None,
            gravity,
            dt,
            phase: SimulationPhase::Setup,
            ticks: 0,
        }
    }

    fn ensure_setup(&self) -> Result<(), ConfigError> {
        match self.phase {
            SimulationPhase::Setup => Ok(()),
            _ => Err(ConfigError::AlreadyInitialized),
        }
    }

    /// Add a body to the arena and return its key
    pub fn add_body(&mut self, body: Body) -> Result<BodyKey, ConfigError> {
        self.ensure_setup()?;
        body.validate()?;
        if let Some(center) = body.orbital_center() {
            if !self.bodies.contains_key(center) {
                return Err(ConfigError::UnknownBody(center));
            }
        }
        log::debug!("Added body '{}' (mass {:e} kg)", body.name, body.mass());
        Ok(self.bodies.insert(body))
    }

    /// Install the root of the system tree
    ///
    /// Checks that every referenced body exists and appears once, and points
    /// each member's orbital center at its system's center unless one was
    /// already set.
    pub fn set_root(&mut self, root: OrbitalSystem) -> Result<(), ConfigError> {
        self.ensure_setup()?;
        root.center().ok_or(ConfigError::MissingCenter)?;

        let mut seen = HashSet::new();
        for key in root.bodies() {
            if !self.bodies.contains_key(key) {
                return Err(ConfigError::UnknownBody(key));
            }
            if !seen.insert(key) {
                return Err(ConfigError::DuplicateBody(key));
            }
        }

        link_orbital_centers(&root, &mut self.bodies);

        let outside = self.bodies.len() - seen.len();
        if outside > 0 {
            log::warn!("{} bodies are not part of the system tree and will not move", outside);
        }
        log::info!(
            "Installed system tree: {} bodies, {} levels",
            seen.len(),
            root.depth()
        );
        self.root = Some(root);
        Ok(())
    }

    /// Pin or release the root center (e.g. keep the star at the origin)
    pub fn fix_root_center(&mut self, fixed: bool) -> Result<(), ConfigError> {
        let root = self.root.as_mut().ok_or(ConfigError::NoRootSystem)?;
        root.fix_center(fixed);
        Ok(())
    }

    /// Prime the Verlet history of every moving body
    ///
    /// Called automatically by the first [`step`](Self::step) if needed.
    pub fn initialize(&mut self) -> Result<(), PhysicsError> {
        match self.phase {
            SimulationPhase::Setup => {}
            SimulationPhase::Running => return Err(ConfigError::AlreadyInitialized.into()),
            SimulationPhase::Halted => return Err(PhysicsError::Halted),
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(ConfigError::InvalidTimestep(self.dt).into());
        }
        self.gravity.validate()?;

        let root = self.root.as_ref().ok_or(ConfigError::NoRootSystem)?;
        if let Err(e) = root.initialize(&mut self.bodies, &self.gravity, self.dt) {
            log::error!("Initialization failed: {}", e);
            self.phase = SimulationPhase::Halted;
            return Err(e);
        }

        self.phase = SimulationPhase::Running;
        log::info!(
            "Simulation initialized: {} bodies, dt = {} s",
            self.bodies.len(),
            self.dt
        );
        Ok(())
    }

    /// Advance simulated time by one fixed tick
    ///
    /// A failed tick halts the simulation; every later call returns
    /// [`PhysicsError::Halted`].
    pub fn step(&mut self) -> Result<(), PhysicsError> {
        match self.phase {
            SimulationPhase::Halted => return Err(PhysicsError::Halted),
            SimulationPhase::Setup => self.initialize()?,
            SimulationPhase::Running => {}
        }

        let root = self.root.as_ref().ok_or(ConfigError::NoRootSystem)?;
        if let Err(e) = root.step(&mut self.bodies, &self.gravity, self.dt) {
            log::error!("Tick {} failed, halting simulation: {}", self.ticks + 1, e);
            self.phase = SimulationPhase::Halted;
            return Err(e);
        }

        self.ticks += 1;
        log::trace!("Tick {} complete", self.ticks);
        Ok(())
    }

    /// Advance by `n` ticks
    pub fn step_n(&mut self, n: u64) -> Result<(), PhysicsError> {
        for _ in 0..n {
            self.step()?;
        }
        Ok(())
    }

    /// Get a body by key
    pub fn body(&self, key: BodyKey) -> Option<&Body> {
        self.bodies.get(key)
    }

    /// Current position of a body, as of the last completed tick
    pub fn position(&self, key: BodyKey) -> Option<Vec3> {
        self.bodies.get(key).map(Body::position)
    }

    /// Find a body by name
    pub fn find(&self, name: &str) -> Option<BodyKey> {
        self.bodies
            .iter()
            .find(|(_, body)| body.name == name)
            .map(|(key, _)| key)
    }

    /// Iterate over all bodies
    pub fn bodies(&self) -> impl Iterator<Item = (BodyKey, &Body)> + '_ {
        self.bodies.iter()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn root(&self) -> Option<&OrbitalSystem> {
        self.root.as_ref()
    }

    pub fn gravity(&self) -> &GravityConfig {
        &self.gravity
    }

    /// Fixed timestep in seconds
    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn phase(&self) -> SimulationPhase {
        self.phase
    }

    /// Completed ticks since initialization
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Simulated seconds elapsed
    pub fn elapsed(&self) -> f64 {
        self.ticks as f64 * self.dt
    }

    /// Total kinetic energy, with velocities taken from the position history
    pub fn kinetic_energy(&self) -> f64 {
        self.bodies.values().map(|b| b.kinetic_energy(self.dt)).sum()
    }

    /// Total gravitational potential energy over every pair of bodies
    pub fn potential_energy(&self) -> f64 {
        let bodies: Vec<&Body> = self.bodies.values().collect();
        let g = self.gravity.gravitational_constant;
        let mut total = 0.0;
        for (i, a) in bodies.iter().enumerate() {
            for b in &bodies[i + 1..] {
                let r = a.position().distance(b.position());
                if r > 0.0 {
                    total -= g * a.mass() * b.mass() / r;
                }
            }
        }
        total
    }

    pub fn total_energy(&self) -> f64 {
        self.kinetic_energy() + self.potential_energy()
    }
}

fn link_orbital_centers(system: &OrbitalSystem, bodies: &mut BodyArena) {
    let Some(center) = system.center() else {
        return;
    };
    let members = system
        .orbiters()
        .iter()
        .copied()
        .chain(system.subsystems().iter().filter_map(OrbitalSystem::center));
    for member in members {
        let body = &mut bodies[member];
        if body.orbital_center().is_none() {
            body.set_orbital_center(Some(center));
        }
    }
    for sub in system.subsystems() {
        link_orbital_centers(sub, bodies);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gravity::{SingularityPolicy, G};
    use std::f64::consts::TAU;

    const SUN_MASS: f64 = 1.99e30;
    const EARTH_ORBIT: f64 = 1.496e11;

    /// Sun pinned at the origin, Earth on a near-circular orbit
    fn sun_earth(dt: f64) -> (Simulation, BodyKey, BodyKey) {
        sun_earth_with(GravityConfig::default(), dt)
    }

    fn sun_earth_with(gravity: GravityConfig, dt: f64) -> (Simulation, BodyKey, BodyKey) {
        let mut sim = Simulation::with_config(gravity, dt);
        let sun = sim
            .add_body(Body::new("Sun", Vec3::ZERO, Vec3::ZERO, SUN_MASS))
            .unwrap();
        let earth = sim
            .add_body(Body::new(
                "Earth",
                Vec3::new(EARTH_ORBIT, 0.0, 0.0),
                Vec3::new(0.0, 29780.0, 0.0),
                5.97e24,
            ))
            .unwrap();
        let mut root = OrbitalSystem::with_center(sun);
        root.fix_center(true);
        root.add_orbiter(earth).unwrap();
        sim.set_root(root).unwrap();
        (sim, sun, earth)
    }

    #[test]
    fn test_new_simulation_is_in_setup() {
        let sim = Simulation::new(60.0);
        assert_eq!(sim.phase(), SimulationPhase::Setup);
        assert_eq!(sim.body_count(), 0);
        assert_eq!(sim.ticks(), 0);
        assert_eq!(sim.dt(), 60.0);
    }

    #[test]
    fn test_add_body_rejects_invalid() {
        let mut sim = Simulation::new(60.0);
        let result = sim.add_body(Body::new("Bad", Vec3::ZERO, Vec3::ZERO, -1.0));
        assert!(matches!(result, Err(ConfigError::InvalidBody { .. })));
    }

    #[test]
    fn test_step_without_root_fails() {
        let mut sim = Simulation::new(60.0);
        sim.add_body(Body::new("Lonely", Vec3::ZERO, Vec3::ZERO, 1.0)).unwrap();
        assert_eq!(sim.step(), Err(PhysicsError::Config(ConfigError::NoRootSystem)));
    }

    #[test]
    fn test_invalid_timestep_rejected() {
        let (mut sim, _, _) = sun_earth(0.0);
        assert_eq!(
            sim.initialize(),
            Err(PhysicsError::Config(ConfigError::InvalidTimestep(0.0)))
        );
    }

    #[test]
    fn test_nan_gravitational_constant_rejected() {
        let (mut sim, _, earth) = sun_earth_with(GravityConfig::new(f64::NAN), 60.0);
        let start = sim.position(earth).unwrap();
        assert!(matches!(
            sim.step_n(3),
            Err(PhysicsError::Config(ConfigError::InvalidGravitationalConstant(_)))
        ));
        assert_ne!(sim.phase(), SimulationPhase::Running);
        assert_eq!(sim.ticks(), 0);
        assert_eq!(sim.position(earth), Some(start));
    }

    #[test]
    fn test_repulsive_gravity_rejected() {
        let (mut sim, _, _) = sun_earth_with(GravityConfig::new(-G), 60.0);
        assert_eq!(
            sim.initialize(),
            Err(PhysicsError::Config(ConfigError::InvalidGravitationalConstant(-G)))
        );
    }

    #[test]
    fn test_infinite_min_separation_rejected() {
        let gravity = GravityConfig::new(G).with_singularity(f64::INFINITY, SingularityPolicy::Clamp);
        let (mut sim, _, _) = sun_earth_with(gravity, 60.0);
        assert_eq!(
            sim.step(),
            Err(PhysicsError::Config(ConfigError::InvalidMinSeparation(f64::INFINITY)))
        );
    }

    #[test]
    fn test_set_root_rejects_unknown_body() {
        let mut sim = Simulation::new(60.0);
        let mut other = Simulation::new(60.0);
        let sun = sim.add_body(Body::new("Sun", Vec3::ZERO, Vec3::ZERO, 1.0)).unwrap();
        // Key from a different arena with a slot this one never filled
        other.add_body(Body::new("X", Vec3::ZERO, Vec3::ZERO, 1.0)).unwrap();
        let foreign = other.add_body(Body::new("Y", Vec3::ZERO, Vec3::ZERO, 1.0)).unwrap();

        let mut root = OrbitalSystem::with_center(sun);
        root.add_orbiter(foreign).unwrap();
        assert_eq!(sim.set_root(root), Err(ConfigError::UnknownBody(foreign)));
    }

    #[test]
    fn test_set_root_links_orbital_centers() {
        let mut sim = Simulation::new(60.0);
        let sun = sim.add_body(Body::new("Sun", Vec3::ZERO, Vec3::ZERO, 1e30)).unwrap();
        let earth = sim
            .add_body(Body::new("Earth", Vec3::new(1e11, 0.0, 0.0), Vec3::ZERO, 6e24))
            .unwrap();
        let moon = sim
            .add_body(Body::new("Moon", Vec3::new(1.003e11, 0.0, 0.0), Vec3::ZERO, 7e22))
            .unwrap();

        let mut earth_system = OrbitalSystem::with_center(earth);
        earth_system.add_orbiter(moon).unwrap();
        let mut root = OrbitalSystem::with_center(sun);
        root.add_subsystem(earth_system).unwrap();
        sim.set_root(root).unwrap();

        assert_eq!(sim.body(earth).unwrap().orbital_center(), Some(sun));
        assert_eq!(sim.body(moon).unwrap().orbital_center(), Some(earth));
        assert_eq!(sim.body(sun).unwrap().orbital_center(), None);
    }

    #[test]
    fn test_setup_locked_after_initialize() {
        let (mut sim, _, _) = sun_earth(21600.0);
        sim.initialize().unwrap();
        assert_eq!(sim.phase(), SimulationPhase::Running);

        let late = sim.add_body(Body::new("Late", Vec3::ZERO, Vec3::ZERO, 1.0));
        assert_eq!(late, Err(ConfigError::AlreadyInitialized));
        assert_eq!(
            sim.initialize(),
            Err(PhysicsError::Config(ConfigError::AlreadyInitialized))
        );
    }

    #[test]
    fn test_first_step_initializes() {
        let (mut sim, _, earth) = sun_earth(21600.0);
        sim.step().unwrap();
        assert_eq!(sim.phase(), SimulationPhase::Running);
        assert_eq!(sim.ticks(), 1);
        assert_eq!(sim.elapsed(), 21600.0);
        assert!(sim.position(earth).unwrap().y > 0.0);
    }

    #[test]
    fn test_find_by_name() {
        let (sim, sun, earth) = sun_earth(21600.0);
        assert_eq!(sim.find("Sun"), Some(sun));
        assert_eq!(sim.find("Earth"), Some(earth));
        assert_eq!(sim.find("Pluto"), None);
    }

    #[test]
    fn test_earth_year() {
        let (mut sim, sun, earth) = sun_earth(21600.0);
        let start = sim.position(earth).unwrap();

        for _ in 0..1460 {
            sim.step().unwrap();
            let r = sim.position(earth).unwrap().length();
            assert!(r > 1.47e11 && r < 1.52e11, "radius left bounds: {:e}", r);
        }

        let end = sim.position(earth).unwrap();
        assert!(start.distance(end) < 0.03 * EARTH_ORBIT);
        assert_eq!(sim.position(sun).unwrap(), Vec3::ZERO);
    }

    #[test]
    fn test_circular_orbit_closes_after_one_period() {
        let dt = 3600.0;
        let mut sim = Simulation::new(dt);
        let r = 1.0e11;
        let v = (G * SUN_MASS / r).sqrt();
        let sun = sim.add_body(Body::new("Sun", Vec3::ZERO, Vec3::ZERO, SUN_MASS)).unwrap();
        let planet = sim
            .add_body(Body::new("P", Vec3::new(r, 0.0, 0.0), Vec3::new(0.0, v, 0.0), 1e20))
            .unwrap();
        let mut root = OrbitalSystem::with_center(sun);
        root.fix_center(true);
        root.add_orbiter(planet).unwrap();
        sim.set_root(root).unwrap();

        let period = TAU * (r * r * r / (G * SUN_MASS)).sqrt();
        let steps = (period / dt).round() as u64;
        sim.step_n(steps).unwrap();

        let end = sim.position(planet).unwrap();
        assert!(
            end.distance(Vec3::new(r, 0.0, 0.0)) < 0.01 * r,
            "orbit did not close: {:?}",
            end
        );
    }

    #[test]
    fn test_energy_bounded_over_many_steps() {
        let (mut sim, _, _) = sun_earth(21600.0);
        sim.initialize().unwrap();
        let initial = sim.total_energy();

        sim.step_n(1460 * 5).unwrap();

        let drift = ((sim.total_energy() - initial) / initial).abs();
        assert!(drift < 1e-3, "energy drift {:e}", drift);
    }

    #[test]
    fn test_singular_tick_halts() {
        let mut sim = Simulation::new(1.0);
        let a = sim.add_body(Body::new("A", Vec3::ZERO, Vec3::ZERO, 1.0)).unwrap();
        let b = sim.add_body(Body::new("B", Vec3::ZERO, Vec3::ZERO, 1.0)).unwrap();
        let mut root = OrbitalSystem::with_center(a);
        root.add_orbiter(b).unwrap();
        sim.set_root(root).unwrap();

        assert!(matches!(sim.step(), Err(PhysicsError::SingularConfiguration { .. })));
        assert_eq!(sim.phase(), SimulationPhase::Halted);
        assert_eq!(sim.step(), Err(PhysicsError::Halted));
        assert_eq!(sim.ticks(), 0);
    }

    #[test]
    fn test_clamp_policy_keeps_running() {
        let gravity = GravityConfig::default().with_singularity(1.0, SingularityPolicy::Clamp);
        let mut sim = Simulation::with_config(gravity, 1.0);
        let a = sim.add_body(Body::new("A", Vec3::ZERO, Vec3::ZERO, 1.0)).unwrap();
        let b = sim.add_body(Body::new("B", Vec3::ZERO, Vec3::ZERO, 1.0)).unwrap();
        let mut root = OrbitalSystem::with_center(a);
        root.add_orbiter(b).unwrap();
        sim.set_root(root).unwrap();

        sim.step_n(3).unwrap();
        assert_eq!(sim.phase(), SimulationPhase::Running);
        assert!(sim.position(b).unwrap().is_finite());
    }

    #[test]
    fn test_fix_root_center_requires_root() {
        let mut sim = Simulation::new(1.0);
        assert_eq!(sim.fix_root_center(true), Err(ConfigError::NoRootSystem));
    }
}
