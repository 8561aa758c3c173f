//! Bevy plugin that drives the simulation core.
//!
//! The core itself ([`Map`] and everything under it) is plain Rust and knows
//! nothing about the ECS.  This module wires it into a Bevy app:
//!
//! ```text
//! Time ─▶ advance_sim_clock ─▶ tick_map_system ─▶ forward_effects_system ─▶ SoundCue / VisualEffect
//! ```
//!
//! All three run chained in `Update`, so a pause in [`SimClock`] freezes the
//! whole pipeline for that frame.

use crate::clock::SimClock;
use crate::config::SimConfig;
use crate::effects::{EffectQueue, SimContext, SimEvent, VisualEffectKind};
use crate::map::Map;
use crate::rng::SimRng;
use bevy::prelude::*;

/// A sound the simulation wants played.
#[derive(Message, Debug, Clone, PartialEq)]
pub struct SoundCue {
    pub cue: String,
    pub position: Vec3,
}

/// A cosmetic effect the simulation wants drawn.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct VisualEffect {
    pub kind: VisualEffectKind,
    pub position: Vec3,
    pub normal: Vec3,
}

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimConfig>()
            .init_resource::<SimClock>()
            .init_resource::<EffectQueue>();
        if !app.world().contains_resource::<SimRng>() {
            let seed = app.world().resource::<SimConfig>().rng_seed;
            app.insert_resource(SimRng::seeded(seed));
        }

        app.add_message::<SoundCue>()
            .add_message::<VisualEffect>()
            .add_systems(
                Update,
                (
                    advance_sim_clock,
                    tick_map_system.run_if(resource_exists::<Map>),
                    forward_effects_system,
                )
                    .chain(),
            );
    }
}

/// Feed Bevy's frame delta through the pausable, scalable simulation clock.
pub fn advance_sim_clock(time: Res<Time>, mut clock: ResMut<SimClock>) {
    clock.advance(time.delta_secs());
}

/// Run one map tick with this frame's simulation delta.
pub fn tick_map_system(
    clock: Res<SimClock>,
    mut map: ResMut<Map>,
    mut rng: ResMut<SimRng>,
    mut effects: ResMut<EffectQueue>,
) {
    let dt = clock.delta_secs();
    if dt <= 0.0 {
        return;
    }
    let mut ctx = SimContext::new(&mut *rng, &mut *effects);
    map.tick(dt, &mut ctx);
}

/// Drain the effect queue into Bevy messages for audio and rendering hosts.
pub fn forward_effects_system(
    mut queue: ResMut<EffectQueue>,
    mut sounds: MessageWriter<SoundCue>,
    mut visuals: MessageWriter<VisualEffect>,
) {
    for event in queue.drain() {
        match event {
            SimEvent::Sound { cue, position } => {
                sounds.write(SoundCue { cue, position });
            }
            SimEvent::Visual {
                kind,
                position,
                normal,
            } => {
                visuals.write(VisualEffect {
                    kind,
                    position,
                    normal,
                });
            }
        }
    }
}
