//! Simulation system
//!
//! Drives the orbital simulation from wall-clock time:
//! - Delta time calculation
//! - Fixed-timestep accumulation
//! - Physics stepping
//! - Orbit trail sampling

use std::time::Instant;

use orrery_core::{ActiveScene, TrailRecorder};
use orrery_physics::{FixedTimestep, PhysicsError};

use crate::config::AppConfig;

/// Result of a simulation update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationResult {
    /// Ticks run during this frame
    pub ticks: u32,
    /// Fraction of the next tick already accumulated
    pub alpha: f64,
}

/// Feeds real elapsed time into a scene's simulation
pub struct SimulationSystem {
    last_frame: Instant,
    clock: FixedTimestep,
    trails: TrailRecorder,
}

impl SimulationSystem {
    /// Create a simulation system from the application configuration
    pub fn new(config: &AppConfig) -> Self {
        Self {
            last_frame: Instant::now(),
            clock: FixedTimestep::new(config.simulation.dt, config.simulation.time_multiplier)
                .with_max_frame_delta(config.simulation.max_frame_delta),
            trails: TrailRecorder::new(config.display.trail_length, config.display.trail_interval),
        }
    }

    /// Run one frame using the time elapsed since the previous call
    pub fn update(&mut self, scene: &mut ActiveScene) -> Result<SimulationResult, PhysicsError> {
        let now = Instant::now();
        let raw_dt = (now - self.last_frame).as_secs_f64();
        self.last_frame = now;
        self.advance(raw_dt, scene)
    }

    /// Run one frame of `real_dt` seconds
    ///
    /// The clock caps the delta and subdivides it into fixed ticks. Trails are
    /// sampled after every completed tick.
    pub fn advance(&mut self, real_dt: f64, scene: &mut ActiveScene) -> Result<SimulationResult, PhysicsError> {
        let simulation = &mut scene.simulation;
        let trails = &mut self.trails;
        let ticks = self.clock.advance(real_dt, || {
            simulation.step()?;
            trails.record(simulation);
            Ok::<(), PhysicsError>(())
        })?;

        if ticks > 0 {
            log::trace!("Frame ran {} ticks, t = {:.0} s", ticks, simulation.elapsed());
        }

        Ok(SimulationResult {
            ticks,
            alpha: self.clock.alpha(),
        })
    }

    pub fn trails(&self) -> &TrailRecorder {
        &self.trails
    }

    pub fn clock(&self) -> &FixedTimestep {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orrery_core::Scene;

    fn solar_system(config: &AppConfig) -> ActiveScene {
        ActiveScene::from_template(
            &Scene::solar_system(),
            config.simulation.to_gravity_config(),
            config.simulation.dt,
        )
        .unwrap()
    }

    #[test]
    fn test_frame_runs_expected_ticks() {
        let config = AppConfig::default();
        let mut scene = solar_system(&config);
        let mut system = SimulationSystem::new(&config);

        // 1/60 s * 500000 = 8333 s, less than one 21600 s tick
        let first = system.advance(1.0 / 60.0, &mut scene).unwrap();
        assert_eq!(first.ticks, 0);
        assert!(first.alpha > 0.0 && first.alpha < 1.0);

        // 0.1 s * 500000 = 50000 s, enough for the carried-over remainder plus two ticks
        let second = system.advance(0.1, &mut scene).unwrap();
        assert_eq!(second.ticks, 2);
        assert_eq!(scene.simulation.ticks(), 2);
    }

    #[test]
    fn test_delta_time_capped() {
        let config = AppConfig::default();
        let mut scene = solar_system(&config);
        let mut system = SimulationSystem::new(&config);

        // A 5 s stall counts as 0.25 s: 125000 s of simulated time
        let result = system.advance(5.0, &mut scene).unwrap();
        assert_eq!(result.ticks, 5);
    }

    #[test]
    fn test_trails_sampled_per_tick() {
        let mut config = AppConfig::default();
        config.display.trail_interval = 1;
        let mut scene = solar_system(&config);
        let mut system = SimulationSystem::new(&config);

        system.advance(0.25, &mut scene).unwrap();
        let earth = scene.key("Earth").unwrap();
        assert_eq!(system.trails().trail(earth).unwrap().len(), 5);
    }

    #[test]
    fn test_update_uses_wall_clock() {
        let config = AppConfig::default();
        let mut scene = solar_system(&config);
        let mut system = SimulationSystem::new(&config);

        std::thread::sleep(std::time::Duration::from_millis(100));
        let result = system.update(&mut scene).unwrap();
        // At least 0.1 s * 500000 = 50000 s
        assert!(result.ticks >= 2);
    }
}
