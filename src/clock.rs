//! Simulation clock layered on top of Bevy's [`Time`](bevy::prelude::Time).
//!
//! Gameplay never reads wall-clock time.  Each frame the parent delta is fed
//! through [`SimClock::advance`], which applies pause, single-step and time
//! scale, and everything downstream (physics, refire timers, corpse timers,
//! animation holds) consumes the resulting delta.
//!
//! | State | Delta produced |
//! |---|---|
//! | running | `parent × time_scale` |
//! | paused | `0` |
//! | paused + step requested | one frame of `parent × time_scale`, then paused again |

use bevy::prelude::Resource;

#[derive(Resource, Debug, Clone)]
pub struct SimClock {
    paused: bool,
    step_requested: bool,
    time_scale: f32,
    delta: f32,
    elapsed: f64,
}

impl Default for SimClock {
    fn default() -> Self {
        Self {
            paused: false,
            step_requested: false,
            time_scale: 1.0,
            delta: 0.0,
            elapsed: 0.0,
        }
    }
}

impl SimClock {
    /// Advance by one parent frame and return the gameplay delta.
    pub fn advance(&mut self, parent_delta: f32) -> f32 {
        let parent_delta = if parent_delta.is_finite() {
            parent_delta.max(0.0)
        } else {
            0.0
        };

        self.delta = if self.paused && !self.step_requested {
            0.0
        } else {
            parent_delta * self.time_scale
        };

        if self.step_requested {
            self.step_requested = false;
            self.paused = true;
        }

        self.elapsed += self.delta as f64;
        self.delta
    }

    /// Gameplay delta produced by the most recent [`advance`](Self::advance).
    pub fn delta_secs(&self) -> f32 {
        self.delta
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Run exactly one more frame, then hold.
    pub fn step_single_frame(&mut self) {
        self.step_requested = true;
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Negative or non-finite scales are treated as zero.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = if scale.is_finite() { scale.max(0.0) } else { 0.0 };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pause_freezes_delta() {
        let mut clock = SimClock::default();
        clock.set_paused(true);
        assert_eq!(clock.advance(0.016), 0.0);
        assert_eq!(clock.elapsed_secs(), 0.0);
    }

    #[test]
    fn single_step_runs_one_frame_then_pauses() {
        let mut clock = SimClock::default();
        clock.step_single_frame();
        assert_eq!(clock.advance(0.02), 0.02);
        assert!(clock.is_paused());
        assert_eq!(clock.advance(0.02), 0.0);
    }

    #[test]
    fn time_scale_slows_delta() {
        let mut clock = SimClock::default();
        clock.set_time_scale(0.1);
        assert!((clock.advance(0.5) - 0.05).abs() < 1e-6);
        clock.set_time_scale(-2.0);
        assert_eq!(clock.advance(0.5), 0.0);
    }

    #[test]
    fn garbage_parent_delta_is_zero() {
        let mut clock = SimClock::default();
        assert_eq!(clock.advance(f32::NAN), 0.0);
        assert_eq!(clock.advance(-1.0), 0.0);
    }
}
