//! Orbit trails
//!
//! Bounded history of recent positions per body, for drawing orbit paths.

use std::collections::{HashMap, VecDeque};

use orrery_math::Vec3;
use orrery_physics::{BodyKey, Simulation};

use crate::display::DisplayProjection;

/// Ring buffer of a body's most recent sampled positions
#[derive(Clone, Debug)]
pub struct OrbitTrail {
    points: VecDeque<Vec3>,
    capacity: usize,
}

impl OrbitTrail {
    pub fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a point, dropping the oldest once full
    pub fn push(&mut self, point: Vec3) {
        if self.capacity == 0 {
            return;
        }
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    /// Points from oldest to newest
    pub fn points(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.points.iter().copied()
    }

    pub fn latest(&self) -> Option<Vec3> {
        self.points.back().copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Scene-space line strip, oldest point first, narrowed to `f32`
    pub fn vertices(&self, projection: &DisplayProjection) -> Vec<[f32; 3]> {
        self.points
            .iter()
            .map(|&p| projection.project(p).to_f32_array())
            .collect()
    }
}

/// Raw bytes of a vertex list, as uploaded to a GPU buffer
pub fn vertex_bytes(vertices: &[[f32; 3]]) -> &[u8] {
    bytemuck::cast_slice(vertices)
}

/// Samples every moving body of a simulation into its own trail
#[derive(Debug)]
pub struct TrailRecorder {
    trails: HashMap<BodyKey, OrbitTrail>,
    length: usize,
    interval: u64,
}

impl TrailRecorder {
    /// Keep up to `length` points per body, sampling every `interval` ticks
    pub fn new(length: usize, interval: u64) -> Self {
        Self {
            trails: HashMap::new(),
            length,
            interval: interval.max(1),
        }
    }

    /// Record the current positions if the simulation's tick count is due
    ///
    /// Returns whether a sample was taken.
    pub fn record(&mut self, simulation: &Simulation) -> bool {
        if simulation.ticks() % self.interval != 0 {
            return false;
        }
        let Some(root) = simulation.root() else {
            return false;
        };
        for key in root.moving_bodies() {
            if let Some(position) = simulation.position(key) {
                self.trails
                    .entry(key)
                    .or_insert_with(|| OrbitTrail::new(self.length))
                    .push(position);
            }
        }
        true
    }

    pub fn trail(&self, key: BodyKey) -> Option<&OrbitTrail> {
        self.trails.get(&key)
    }

    pub fn clear(&mut self) {
        self.trails.clear();
    }
}
