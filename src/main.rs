//! Orrery - hierarchical gravitational N-body simulation
//!
//! Headless driver: loads the configured scene, runs it against the wall
//! clock and logs where every body is.

use std::thread;
use std::time::{Duration, Instant};

use orrery::config::AppConfig;
use orrery::systems::SimulationSystem;
use orrery_core::{vertex_bytes, ActiveScene, DisplayProjection, Scene, SceneError};

const SECONDS_PER_DAY: f64 = 86400.0;

fn load_scene(config: &AppConfig) -> Result<ActiveScene, SceneError> {
    let mut scene = match &config.scene.path {
        Some(path) => {
            log::info!("Loading scene from {}", path);
            Scene::load(path)?
        }
        None => Scene::solar_system(),
    };
    if config.scene.fix_center {
        scene.root.fixed = true;
    }

    ActiveScene::from_template(
        &scene,
        config.simulation.to_gravity_config(),
        config.simulation.dt,
    )
}

fn report(active: &ActiveScene, projection: &DisplayProjection) {
    let sim = &active.simulation;
    log::info!(
        "t = {:.1} days ({} ticks), total energy {:.6e} J",
        sim.elapsed() / SECONDS_PER_DAY,
        sim.ticks(),
        sim.total_energy()
    );
    for (name, key) in active.named_keys() {
        let (Some(position), Some(display)) =
            (sim.position(key), projection.display_position(sim, key))
        else {
            continue;
        };
        log::info!(
            "  {:<8} r = ({:+.4e}, {:+.4e}, {:+.4e}) m  display = ({:+.3}, {:+.3}, {:+.3})",
            name,
            position.x,
            position.y,
            position.z,
            display.x,
            display.y,
            display.z
        );
    }
}

fn run(config: &AppConfig) -> Result<(), SceneError> {
    let mut active = load_scene(config)?;
    log::info!(
        "Running '{}' for {} s at {} fps (dt = {} s, x{})",
        active.name,
        config.run.duration,
        config.run.frame_rate,
        config.simulation.dt,
        config.simulation.time_multiplier
    );

    let projection = DisplayProjection::new(config.display.scale);
    let mut system = SimulationSystem::new(config);
    let frame = Duration::from_secs_f64(1.0 / config.run.frame_rate.max(1.0));
    let report_every = Duration::from_secs_f64(config.run.report_interval.max(0.0));
    let end = Duration::from_secs_f64(config.run.duration.max(0.0));

    active.simulation.initialize()?;
    let initial_energy = active.simulation.total_energy();
    report(&active, &projection);

    let start = Instant::now();
    let mut last_report = start;
    while start.elapsed() < end {
        thread::sleep(frame);
        system.update(&mut active)?;

        if last_report.elapsed() >= report_every {
            report(&active, &projection);
            last_report = Instant::now();
        }
    }

    report(&active, &projection);
    for (name, key) in active.named_keys() {
        if let Some(trail) = system.trails().trail(key) {
            let vertices = trail.vertices(&projection);
            log::debug!(
                "  {:<8} trail: {} vertices, {} bytes",
                name,
                vertices.len(),
                vertex_bytes(&vertices).len()
            );
        }
    }
    let drift = (active.simulation.total_energy() - initial_energy) / initial_energy.abs();
    log::info!(
        "Finished after {:.1} simulated days, relative energy drift {:.3e}",
        active.simulation.elapsed() / SECONDS_PER_DAY,
        drift
    );
    Ok(())
}

fn main() {
    let loaded = AppConfig::load();
    let config = loaded.as_ref().ok().cloned().unwrap_or_default();

    // RUST_LOG still wins over the configured level
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.debug.log_level.as_str()),
    )
    .init();
    log::info!("Starting Orrery");

    if let Err(e) = &loaded {
        log::warn!("Failed to load config: {}. Using defaults.", e);
    }

    if let Err(e) = run(&config) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
