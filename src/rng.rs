//! Seeded random source shared by the simulation.
//!
//! Every random decision the core makes (damage rolls, spread cones, procedural
//! obstacle placement, respawn points) goes through [`SimRng`], never through
//! `thread_rng`, so a test can pin the seed and replay a fight exactly.

use crate::definitions::FloatRange;
use bevy::math::Vec3;
use bevy::log::info;
use bevy::prelude::{Res, ResMut, Resource};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

use crate::config::SimConfig;

#[derive(Resource, Debug, Clone)]
pub struct SimRng {
    rng: StdRng,
}

impl SimRng {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Replace the generator state, keeping the resource in place.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Uniform float in `[min, max]`.  A collapsed or inverted range yields `min`.
    pub fn float_in_range(&mut self, min: f32, max: f32) -> f32 {
        if max > min {
            self.rng.gen_range(min..=max)
        } else {
            min
        }
    }

    /// Uniform integer in `[min, max]`.  A collapsed or inverted range yields `min`.
    pub fn int_in_range(&mut self, min: i32, max: i32) -> i32 {
        if max > min {
            self.rng.gen_range(min..=max)
        } else {
            min
        }
    }

    pub fn roll(&mut self, range: FloatRange) -> f32 {
        self.float_in_range(range.min, range.max)
    }

    /// Weighted boolean: true with the given probability.
    pub fn chance(&mut self, probability: f32) -> bool {
        if probability <= 0.0 {
            return false;
        }
        self.rng.gen::<f32>() < probability
    }

    /// Unit direction uniformly distributed over the spherical cap of half-angle
    /// `max_degrees` around `forward`.
    ///
    /// Sampling `cos θ` uniformly (rather than `θ`) keeps the density even
    /// across the cap; a flat-disc sample would bunch rays toward the rim at
    /// small angles.  A zero `forward` comes back unchanged.
    pub fn direction_in_cone(&mut self, forward: Vec3, max_degrees: f32) -> Vec3 {
        let Some(axis) = forward.try_normalize() else {
            return forward;
        };
        if max_degrees <= 0.0 {
            return axis;
        }
        let cos_max = max_degrees.min(180.0).to_radians().cos();
        let cos_theta = self.float_in_range(cos_max, 1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
        let phi = self.float_in_range(0.0, TAU);
        let (side, up) = axis.any_orthonormal_pair();
        let offset = side * phi.cos() + up * phi.sin();
        (axis * cos_theta + offset * sin_theta).normalize_or(axis)
    }
}

impl Default for SimRng {
    fn default() -> Self {
        Self::seeded(crate::constants::DEFAULT_RNG_SEED)
    }
}

/// Startup system: restart the generator from the configured seed.
///
/// Runs after [`crate::config::load_sim_config`] so a seed set in
/// `assets/sim.toml` takes effect.
pub fn reseed_from_config(config: Res<SimConfig>, mut rng: ResMut<SimRng>) {
    rng.reseed(config.rng_seed);
    info!("Simulation RNG seeded with {:#x}", config.rng_seed);
}
