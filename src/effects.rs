//! Audio/visual trigger boundary and the per-tick simulation context.
//!
//! The core never plays a sound or draws a spark itself; it reports them to an
//! [`EffectSink`] and moves on.  Inside a Bevy app the sink is the
//! [`EffectQueue`] resource, drained into messages after every tick; tests can
//! pass [`NullEffects`] or inspect a queue directly.

use crate::rng::SimRng;
use bevy::math::Vec3;
use bevy::prelude::Resource;

/// Cosmetic effect categories a renderer may want to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualEffectKind {
    MuzzleFlash,
    /// A hitscan ray struck an actor.
    Blood,
    /// A hitscan ray struck world geometry.
    Sparks,
    Explosion,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    Sound {
        cue: String,
        position: Vec3,
    },
    Visual {
        kind: VisualEffectKind,
        position: Vec3,
        normal: Vec3,
    },
}

/// Fire-and-forget receiver for everything the simulation wants heard or seen.
pub trait EffectSink {
    fn notify_sound(&mut self, cue: &str, position: Vec3);
    fn spawn_visual_effect(&mut self, kind: VisualEffectKind, position: Vec3, normal: Vec3);
}

/// Buffers events until the host drains them.
#[derive(Resource, Debug, Default)]
pub struct EffectQueue {
    events: Vec<SimEvent>,
}

impl EffectQueue {
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, SimEvent> {
        self.events.drain(..)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Number of queued sound events with the given cue.
    pub fn count_sounds(&self, cue: &str) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SimEvent::Sound { cue: c, .. } if c == cue))
            .count()
    }

    pub fn count_visuals(&self, kind: VisualEffectKind) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SimEvent::Visual { kind: k, .. } if *k == kind))
            .count()
    }
}

impl EffectSink for EffectQueue {
    fn notify_sound(&mut self, cue: &str, position: Vec3) {
        self.events.push(SimEvent::Sound {
            cue: cue.to_string(),
            position,
        });
    }

    fn spawn_visual_effect(&mut self, kind: VisualEffectKind, position: Vec3, normal: Vec3) {
        self.events.push(SimEvent::Visual {
            kind,
            position,
            normal,
        });
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEffects;

impl EffectSink for NullEffects {
    fn notify_sound(&mut self, _cue: &str, _position: Vec3) {}
    fn spawn_visual_effect(&mut self, _kind: VisualEffectKind, _position: Vec3, _normal: Vec3) {}
}

/// Collaborators a tick needs, passed explicitly instead of reached for as
/// globals.
pub struct SimContext<'a> {
    pub rng: &'a mut SimRng,
    pub effects: &'a mut dyn EffectSink,
}

impl<'a> SimContext<'a> {
    pub fn new(rng: &'a mut SimRng, effects: &'a mut dyn EffectSink) -> Self {
        Self { rng, effects }
    }

    /// Play an optional definition cue; `None` is silently skipped.
    pub fn sound(&mut self, cue: Option<&str>, position: Vec3) {
        if let Some(cue) = cue {
            self.effects.notify_sound(cue, position);
        }
    }

    pub fn visual(&mut self, kind: VisualEffectKind, position: Vec3, normal: Vec3) {
        self.effects.spawn_visual_effect(kind, position, normal);
    }
}
