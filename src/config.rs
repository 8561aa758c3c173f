//! Runtime simulation configuration loaded from `assets/sim.toml`.
//!
//! [`SimConfig`] is a Bevy [`Resource`] that mirrors the tunables in
//! [`crate::constants`].  At startup, [`load_sim_config`] reads
//! `assets/sim.toml` and overwrites the defaults with any values present in the
//! file.  Missing keys fall back to the compile-time defaults, so a minimal TOML
//! can override just the values you care about.
//!
//! ## Usage in systems
//!
//! Add `config: Res<SimConfig>` to any system parameter list and read values
//! with `config.gravity`, `config.rng_seed`, etc.  The map copies the values it
//! needs into [`crate::map::MapSettings`] when it is built, so the core never
//! reaches back into the ECS.

use crate::constants::*;
use crate::error::{validate_ceiling_height, validate_gravity, SimResult};
use bevy::prelude::*;
use serde::Deserialize;

/// Path of the runtime configuration file, relative to the working directory.
pub const SIM_CONFIG_PATH: &str = "assets/sim.toml";

/// Runtime-tunable simulation configuration.
///
/// All fields default to the corresponding compile-time constant from
/// `src/constants.rs`.
#[derive(Resource, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // ── Physics ───────────────────────────────────────────────────────────────
    pub gravity: f32,
    pub ceiling_height: f32,

    // ── AI ────────────────────────────────────────────────────────────────────
    pub ai_walk_proximity_sq: f32,
    pub ai_firing_cone_degrees: f32,

    // ── Session ───────────────────────────────────────────────────────────────
    pub rng_seed: u64,
    pub player_actor: String,
    pub definitions_path: String,
    pub map_name: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            ceiling_height: CEILING_HEIGHT,
            ai_walk_proximity_sq: AI_WALK_PROXIMITY_SQ,
            ai_firing_cone_degrees: AI_FIRING_CONE_DEGREES,
            rng_seed: DEFAULT_RNG_SEED,
            player_actor: DEFAULT_PLAYER_ACTOR.to_string(),
            definitions_path: DEFAULT_DEFINITIONS_PATH.to_string(),
            map_name: DEFAULT_MAP_NAME.to_string(),
        }
    }
}

impl SimConfig {
    /// Parse a configuration from TOML text; absent keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Check the physically meaningful values.
    pub fn validate(&self) -> SimResult<()> {
        validate_gravity(self.gravity)?;
        validate_ceiling_height(self.ceiling_height)?;
        Ok(())
    }
}

/// Startup system: attempt to load `assets/sim.toml` and overwrite the
/// `SimConfig` resource with any values present in the file.
///
/// Missing keys retain their compiled defaults.  Parse errors and out-of-range
/// values are logged but do not abort the simulation.  A missing file is not an
/// error.
pub fn load_sim_config(mut config: ResMut<SimConfig>) {
    let path = SIM_CONFIG_PATH;
    match std::fs::read_to_string(path) {
        Ok(contents) => match SimConfig::from_toml_str(&contents) {
            Ok(loaded) => match loaded.validate() {
                Ok(()) => {
                    *config = loaded;
                    info!("Loaded simulation config from {path}");
                }
                Err(e) => warn!("Rejected {path}: {e}; using defaults"),
            },
            Err(e) => {
                warn!("Failed to parse {path}: {e}; using defaults");
            }
        },
        Err(_) => {
            info!("No {path} found; using compiled defaults");
        }
    }
}
