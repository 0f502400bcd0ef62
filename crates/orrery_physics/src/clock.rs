//! Fixed-timestep clock
//!
//! Converts variable wall-clock frame times into a whole number of fixed
//! simulation ticks. Leftover time carries over to the next frame.

use crate::error::PhysicsError;
use crate::simulation::Simulation;

/// Default cap on a single frame's wall-clock delta (seconds)
pub const DEFAULT_MAX_FRAME_DELTA: f64 = 0.25;

/// Accumulator that schedules fixed simulation ticks from real time
#[derive(Clone, Debug)]
pub struct FixedTimestep {
    dt: f64,
    time_multiplier: f64,
    max_frame_delta: f64,
    accumulator: f64,
}

impl FixedTimestep {
    /// Create a clock for ticks of `dt` simulated seconds, with simulated time
    /// running `time_multiplier` times faster than real time
    pub fn new(dt: f64, time_multiplier: f64) -> Self {
        Self {
            dt,
            time_multiplier,
            max_frame_delta: DEFAULT_MAX_FRAME_DELTA,
            accumulator: 0.0,
        }
    }

    /// Cap on real seconds counted from one frame (avoids a spiral after a stall)
    pub fn with_max_frame_delta(mut self, max_frame_delta: f64) -> Self {
        self.max_frame_delta = max_frame_delta.max(0.0);
        self
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn time_multiplier(&self) -> f64 {
        self.time_multiplier
    }

    pub fn set_time_multiplier(&mut self, time_multiplier: f64) {
        self.time_multiplier = time_multiplier.max(0.0);
    }

    /// Simulated seconds waiting to be consumed by the next tick
    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Fraction of a tick currently accumulated, in `[0, 1)`
    ///
    /// Useful for interpolating between the last two positions when drawing.
    pub fn alpha(&self) -> f64 {
        if self.dt > 0.0 {
            self.accumulator / self.dt
        } else {
            0.0
        }
    }

    /// Feed one frame of real time and run `step` for every whole tick it pays for
    ///
    /// Returns the number of ticks run. If `step` fails, the remaining ticks of
    /// this frame are dropped and the error is returned.
    pub fn advance<E, F>(&mut self, real_delta: f64, mut step: F) -> Result<u32, E>
    where
        F: FnMut() -> Result<(), E>,
    {
        let real_delta = if real_delta.is_finite() && real_delta > 0.0 {
            real_delta.min(self.max_frame_delta)
        } else {
            0.0
        };
        self.accumulator += real_delta * self.time_multiplier;

        if self.dt.is_nan() || self.dt <= 0.0 {
            return Ok(0);
        }

        let mut ticks = 0;
        while self.accumulator >= self.dt {
            if let Err(e) = step() {
                self.accumulator = 0.0;
                return Err(e);
            }
            self.accumulator -= self.dt;
            ticks += 1;
        }
        Ok(ticks)
    }

    /// Feed one frame of real time to a [`Simulation`]
    pub fn advance_simulation(&mut self, real_delta: f64, simulation: &mut Simulation) -> Result<u32, PhysicsError> {
        self.advance(real_delta, || simulation.step())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_ticks_only() {
        let mut clock = FixedTimestep::new(10.0, 100.0);
        let mut count = 0;
        // 0.25 s real * 100 = 25 s simulated -> 2 ticks, 5 s left over
        let ticks = clock
            .advance(0.25, || {
                count += 1;
                Ok::<(), ()>(())
            })
            .unwrap();
        assert_eq!(ticks, 2);
        assert_eq!(count, 2);
        assert!((clock.accumulator() - 5.0).abs() < 1e-9);
        assert!((clock.alpha() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_leftover_carries_over() {
        let mut clock = FixedTimestep::new(10.0, 100.0);
        assert_eq!(clock.advance(0.06, || Ok::<(), ()>(())).unwrap(), 0);
        assert_eq!(clock.advance(0.06, || Ok::<(), ()>(())).unwrap(), 1);
        assert!((clock.accumulator() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_frame_delta_is_capped() {
        let mut clock = FixedTimestep::new(1.0, 1.0);
        // A 10 s stall only counts as 0.25 s
        let ticks = clock.advance(10.0, || Ok::<(), ()>(())).unwrap();
        assert_eq!(ticks, 0);
        assert!((clock.accumulator() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_bad_deltas_ignored() {
        let mut clock = FixedTimestep::new(1.0, 100.0);
        assert_eq!(clock.advance(-1.0, || Ok::<(), ()>(())).unwrap(), 0);
        assert_eq!(clock.advance(f64::NAN, || Ok::<(), ()>(())).unwrap(), 0);
        assert_eq!(clock.accumulator(), 0.0);
    }

    #[test]
    fn test_step_error_stops_frame() {
        let mut clock = FixedTimestep::new(1.0, 100.0);
        let mut count = 0;
        let result = clock.advance(0.1, || {
            count += 1;
            if count == 3 {
                Err("boom")
            } else {
                Ok(())
            }
        });
        assert_eq!(result, Err("boom"));
        assert_eq!(count, 3);
        assert_eq!(clock.accumulator(), 0.0);
    }

    #[test]
    fn test_zero_multiplier_pauses() {
        let mut clock = FixedTimestep::new(1.0, 100.0);
        clock.set_time_multiplier(0.0);
        assert_eq!(clock.advance(0.2, || Ok::<(), ()>(())).unwrap(), 0);
        assert_eq!(clock.accumulator(), 0.0);
    }
}
