//! Hierarchical orbital systems
//!
//! An [`OrbitalSystem`] groups a center body, the bodies that orbit it directly,
//! and nested subsystems whose own center orbits this system's center (a planet
//! with its moons). Systems hold [`BodyKey`]s into the simulation's arena; the
//! arena is passed into every operation that reads or moves bodies.
//!
//! Gravity does not follow the ownership tree, so the force pass walks it
//! level by level. At each level the *members* are the direct orbiters plus
//! the centers of the subsystems. Every member is pulled by the level's center
//! and by every ancestor center, and every pair of members interacts. The pass
//! then recurses so each subsystem handles its own satellites.

use slotmap::SlotMap;

use crate::body::{Body, BodyKey};
use crate::error::{ConfigError, PhysicsError};
use crate::gravity::GravityConfig;

/// Arena holding every body of a simulation
pub type BodyArena = SlotMap<BodyKey, Body>;

/// A center one or more levels up that still pulls on deeper satellites
#[derive(Clone, Copy, Debug)]
struct Attractor {
    key: BodyKey,
    moves: bool,
}

/// A center body, its direct orbiters and its subsystems
#[derive(Clone, Debug, Default)]
pub struct OrbitalSystem {
    center: Option<BodyKey>,
    orbiters: Vec<BodyKey>,
    subsystems: Vec<OrbitalSystem>,
    center_is_fixed: bool,
}

impl OrbitalSystem {
    /// Create an empty system; call [`define_center`](Self::define_center) next
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a system around `center`
    pub fn with_center(center: BodyKey) -> Self {
        Self {
            center: Some(center),
            ..Self::default()
        }
    }

    /// Assign the center body. Must happen before any orbiter is added.
    pub fn define_center(&mut self, center: BodyKey) -> Result<(), ConfigError> {
        if self.center.is_some() {
            return Err(ConfigError::CenterAlreadyDefined);
        }
        if self.contains(center) {
            return Err(ConfigError::CenterIsOrbiter(center));
        }
        self.center = Some(center);
        Ok(())
    }

    /// Append a direct orbiter of the center
    pub fn add_orbiter(&mut self, body: BodyKey) -> Result<(), ConfigError> {
        let center = self.center.ok_or(ConfigError::MissingCenter)?;
        if body == center {
            return Err(ConfigError::CenterIsOrbiter(body));
        }
        if self.contains(body) {
            return Err(ConfigError::DuplicateBody(body));
        }
        self.orbiters.push(body);
        Ok(())
    }

    /// Take ownership of a subsystem
    ///
    /// The child's center becomes a member of this level: it is pulled by this
    /// system's center and interacts with every other member. If it was
    /// previously added as a direct orbiter it is moved out of that list so it
    /// is integrated exactly once.
    pub fn add_subsystem(&mut self, child: OrbitalSystem) -> Result<(), ConfigError> {
        let center = self.center.ok_or(ConfigError::MissingCenter)?;
        let child_center = child.center.ok_or(ConfigError::MissingCenter)?;
        if child_center == center {
            return Err(ConfigError::CenterIsOrbiter(child_center));
        }

        let promoted = self.orbiters.iter().position(|&k| k == child_center);
        let existing = self.bodies();
        if let Some(&duplicate) = child
            .bodies()
            .iter()
            .find(|&&k| existing.contains(&k) && !(promoted.is_some() && k == child_center))
        {
            return Err(ConfigError::DuplicateBody(duplicate));
        }

        if let Some(index) = promoted {
            log::debug!("Promoting orbiter {:?} to subsystem center", child_center);
            self.orbiters.remove(index);
        }
        self.subsystems.push(child);
        Ok(())
    }

    /// Pin (or release) the center: a fixed center is never reset or integrated
    pub fn fix_center(&mut self, fixed: bool) {
        self.center_is_fixed = fixed;
    }

    pub fn is_center_fixed(&self) -> bool {
        self.center_is_fixed
    }

    pub fn center(&self) -> Option<BodyKey> {
        self.center
    }

    pub fn orbiters(&self) -> &[BodyKey] {
        &self.orbiters
    }

    pub fn subsystems(&self) -> &[OrbitalSystem] {
        &self.subsystems
    }

    /// Every body reachable from this system (center first, depth-first)
    ///
    /// Contains no duplicates for a tree built through this API.
    pub fn bodies(&self) -> Vec<BodyKey> {
        let mut out = Vec::new();
        self.collect_bodies(&mut out);
        out
    }

    /// Whether `body` is reachable from this system
    pub fn contains(&self, body: BodyKey) -> bool {
        self.center == Some(body)
            || self.orbiters.contains(&body)
            || self.subsystems.iter().any(|s| s.contains(body))
    }

    /// Bodies that are not pinned, i.e. the ones integration moves
    pub fn moving_bodies(&self) -> Vec<BodyKey> {
        let mut out = Vec::new();
        self.collect_moving(&mut out);
        out
    }

    /// Number of nested levels, counting this one
    pub fn depth(&self) -> usize {
        1 + self.subsystems.iter().map(|s| s.depth()).max().unwrap_or(0)
    }

    fn collect_bodies(&self, out: &mut Vec<BodyKey>) {
        out.extend(self.center);
        out.extend(self.orbiters.iter().copied());
        for sub in &self.subsystems {
            sub.collect_bodies(out);
        }
    }

    fn collect_moving(&self, out: &mut Vec<BodyKey>) {
        if !self.center_is_fixed {
            out.extend(self.center);
        }
        out.extend(self.orbiters.iter().copied());
        for sub in &self.subsystems {
            sub.collect_moving(out);
        }
    }

    /// Subsystem centers of this level, with whether each one moves
    fn hubs(&self) -> Vec<(BodyKey, bool)> {
        self.subsystems
            .iter()
            .filter_map(|s| s.center.map(|c| (c, !s.center_is_fixed)))
            .collect()
    }

    /// One-time setup of the Verlet history for the whole tree
    ///
    /// Every moving body gets the acceleration of its immediate center and a
    /// synthesized previous position. Must run before the first [`step`](Self::step).
    /// Keys must come from `bodies`; [`Simulation::set_root`](crate::Simulation::set_root)
    /// checks that before a tree is ever stepped.
    pub(crate) fn initialize(&self, bodies: &mut BodyArena, gravity: &GravityConfig, dt: f64) -> Result<(), PhysicsError> {
        let center = self.center.ok_or(ConfigError::MissingCenter)?;
        if !self.center_is_fixed {
            let body = &mut bodies[center];
            body.reset_acceleration();
            body.prime_velocity_verlet(dt);
        }
        self.prime_members(bodies, gravity, dt, center)
    }

    fn prime_members(
        &self,
        bodies: &mut BodyArena,
        gravity: &GravityConfig,
        dt: f64,
        center: BodyKey,
    ) -> Result<(), PhysicsError> {
        for &orbiter in &self.orbiters {
            prime_against(bodies, orbiter, center, gravity, dt)?;
        }
        for sub in &self.subsystems {
            let sub_center = sub.center.ok_or(ConfigError::MissingCenter)?;
            if !sub.center_is_fixed {
                prime_against(bodies, sub_center, center, gravity, dt)?;
            }
            sub.prime_members(bodies, gravity, dt, sub_center)?;
        }
        Ok(())
    }

    /// Advance the whole tree by one tick: full force pass, then integration
    pub(crate) fn step(&self, bodies: &mut BodyArena, gravity: &GravityConfig, dt: f64) -> Result<(), PhysicsError> {
        self.compute_all_accelerations(bodies, gravity)?;
        self.integrate(bodies, dt);
        Ok(())
    }

    /// Per-tick force pass for the tree rooted here
    fn compute_all_accelerations(&self, bodies: &mut BodyArena, gravity: &GravityConfig) -> Result<(), PhysicsError> {
        let center = self.center.ok_or(ConfigError::MissingCenter)?;
        self.reset_accelerations(bodies);
        self.accumulate_level(bodies, gravity, center, &[])
    }

    /// Force pass for a subsystem's satellites, given the centers above it
    fn compute_satellite_accelerations(
        &self,
        bodies: &mut BodyArena,
        gravity: &GravityConfig,
        ancestors: &[Attractor],
    ) -> Result<(), PhysicsError> {
        let center = self.center.ok_or(ConfigError::MissingCenter)?;
        self.accumulate_level(bodies, gravity, center, ancestors)
    }

    fn reset_accelerations(&self, bodies: &mut BodyArena) {
        if !self.center_is_fixed {
            if let Some(center) = self.center {
                bodies[center].reset_acceleration();
            }
        }
        for &orbiter in &self.orbiters {
            bodies[orbiter].reset_acceleration();
        }
        for sub in &self.subsystems {
            sub.reset_accelerations(bodies);
        }
    }

    fn accumulate_level(
        &self,
        bodies: &mut BodyArena,
        gravity: &GravityConfig,
        center: BodyKey,
        ancestors: &[Attractor],
    ) -> Result<(), PhysicsError> {
        let center_moves = !self.center_is_fixed;
        let hubs = self.hubs();

        // Pull of this level's center and of every center above it
        let members = self
            .orbiters
            .iter()
            .map(|&k| (k, true))
            .chain(hubs.iter().copied());
        for (member, member_moves) in members {
            interact(bodies, gravity, member, member_moves, center, center_moves)?;
            for ancestor in ancestors {
                interact(bodies, gravity, member, member_moves, ancestor.key, ancestor.moves)?;
            }
        }

        // Orbiter pairs; each side recomputed from its own definition
        for (i, &a) in self.orbiters.iter().enumerate() {
            for &b in &self.orbiters[i + 1..] {
                interact(bodies, gravity, a, true, b, true)?;
            }
        }

        // Orbiters against subsystem centers
        for &orbiter in &self.orbiters {
            for &(hub, hub_moves) in &hubs {
                interact(bodies, gravity, orbiter, true, hub, hub_moves)?;
            }
        }

        // Subsystem center pairs
        for (i, &(a, a_moves)) in hubs.iter().enumerate() {
            for &(b, b_moves) in &hubs[i + 1..] {
                interact(bodies, gravity, a, a_moves, b, b_moves)?;
            }
        }

        if self.subsystems.is_empty() {
            return Ok(());
        }

        let mut lineage = ancestors.to_vec();
        lineage.push(Attractor {
            key: center,
            moves: center_moves,
        });
        for sub in &self.subsystems {
            sub.compute_satellite_accelerations(bodies, gravity, &lineage)?;
        }
        Ok(())
    }

    /// Move every non-fixed body: center, then orbiters, then subsystems
    fn integrate(&self, bodies: &mut BodyArena, dt: f64) {
        if !self.center_is_fixed {
            if let Some(center) = self.center {
                bodies[center].integrate(dt);
            }
        }
        for &orbiter in &self.orbiters {
            bodies[orbiter].integrate(dt);
        }
        for sub in &self.subsystems {
            sub.integrate(bodies, dt);
        }
    }
}

/// Add the pull of `source` on `target`
fn pull(bodies: &mut BodyArena, gravity: &GravityConfig, target: BodyKey, source: BodyKey) -> Result<(), PhysicsError> {
    let acceleration = bodies[target].acceleration_from(&bodies[source], gravity)?;
    bodies[target].accumulate_acceleration(acceleration);
    Ok(())
}

/// Mutual interaction; a pinned side does not accumulate
fn interact(
    bodies: &mut BodyArena,
    gravity: &GravityConfig,
    a: BodyKey,
    a_moves: bool,
    b: BodyKey,
    b_moves: bool,
) -> Result<(), PhysicsError> {
    if a_moves {
        pull(bodies, gravity, a, b)?;
    }
    if b_moves {
        pull(bodies, gravity, b, a)?;
    }
    Ok(())
}

fn prime_against(
    bodies: &mut BodyArena,
    body: BodyKey,
    center: BodyKey,
    gravity: &GravityConfig,
    dt: f64,
) -> Result<(), PhysicsError> {
    bodies[body].reset_acceleration();
    pull(bodies, gravity, body, center)?;
    bodies[body].prime_velocity_verlet(dt);
    Ok(())
}
