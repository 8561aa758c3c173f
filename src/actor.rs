//! Simulated actors: marines, demons, projectiles.
//!
//! An [`Actor`] owns its kinematic state, health and weapon inventory.  It
//! knows nothing about other actors; anything that touches two of them
//! (collision, damage attribution, explosions) is driven by the map, which is
//! the only owner of actor storage.
//!
//! ## Lifecycle
//!
//! ```text
//! alive ──die()──▶ dead (corpse timer running) ──timer elapses──▶ destroyed ──prune──▶ slot freed
//! ```
//!
//! Death is one-way.  A destroyed actor is skipped by every pass until the map
//! prunes it at the end of the tick.

use crate::constants::*;
use crate::controller::ControllerId;
use crate::definitions::{ActorDefinition, Faction, WeaponDefinition};
use crate::geometry::{turn_toward_degrees, EulerAngles, ZCylinder};
use crate::handle::ActorUid;
use crate::weapon::Weapon;
use bevy::math::Vec3;
use std::sync::Arc;

/// Coarse animation state reported to renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationState {
    #[default]
    Walk,
    Attack,
    Hurt,
    Death,
}

/// Result of [`Actor::take_damage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Target was already dead; nothing changed.
    Ignored,
    Hurt,
    /// This hit was the killing blow.
    Killed,
}

#[derive(Debug, Clone)]
pub struct Actor {
    uid: ActorUid,
    definition: Arc<ActorDefinition>,

    pub position: Vec3,
    pub orientation: EulerAngles,
    pub velocity: Vec3,
    pub acceleration: Vec3,
    pub health: f32,
    pub is_grounded: bool,
    /// Who fired this actor, for projectiles.  Invalid for everything else.
    pub owner: ActorUid,

    weapons: Vec<Weapon>,
    equipped: Option<usize>,

    pub(crate) controller: Option<ControllerId>,
    pub(crate) ai_controller: Option<ControllerId>,

    is_dead: bool,
    is_destroyed: bool,
    corpse_age: f32,
    pub(crate) pending_spawn_death: bool,

    animation: AnimationState,
    animation_hold: f32,
}

impl Actor {
    pub(crate) fn new(
        uid: ActorUid,
        definition: Arc<ActorDefinition>,
        weapons: Vec<Arc<WeaponDefinition>>,
        position: Vec3,
        orientation: EulerAngles,
    ) -> Self {
        let weapons: Vec<Weapon> = weapons.into_iter().map(Weapon::new).collect();
        let equipped = if weapons.is_empty() { None } else { Some(0) };
        Self {
            uid,
            health: definition.health,
            pending_spawn_death: definition.die_on_spawn,
            definition,
            position,
            orientation,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            is_grounded: position.z <= 0.0,
            owner: ActorUid::INVALID,
            weapons,
            equipped,
            controller: None,
            ai_controller: None,
            is_dead: false,
            is_destroyed: false,
            corpse_age: 0.0,
            animation: AnimationState::Walk,
            animation_hold: 0.0,
        }
    }

    // ── Identity ──────────────────────────────────────────────────────────────

    #[inline]
    pub fn uid(&self) -> ActorUid {
        self.uid
    }

    pub fn definition(&self) -> &Arc<ActorDefinition> {
        &self.definition
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn faction(&self) -> Faction {
        self.definition.faction
    }

    pub fn controller(&self) -> Option<ControllerId> {
        self.controller
    }

    pub fn ai_controller(&self) -> Option<ControllerId> {
        self.ai_controller
    }

    /// True when `other` is this actor's owner.
    pub fn is_owned_by(&self, other: ActorUid) -> bool {
        self.owner.is_valid() && self.owner == other
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    pub fn is_dead(&self) -> bool {
        self.is_dead
    }

    pub fn is_destroyed(&self) -> bool {
        self.is_destroyed
    }

    /// Neither dead nor awaiting removal.
    pub fn is_alive(&self) -> bool {
        !self.is_dead && !self.is_destroyed
    }

    pub fn animation(&self) -> AnimationState {
        self.animation
    }

    /// Subtract health.  Dead actors ignore further damage.
    pub fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        if self.is_dead || self.is_destroyed || !amount.is_finite() {
            return DamageOutcome::Ignored;
        }
        self.health = (self.health - amount).min(self.definition.health);
        if self.health <= 0.0 {
            self.die();
            DamageOutcome::Killed
        } else {
            self.play_one_shot(AnimationState::Hurt);
            DamageOutcome::Hurt
        }
    }

    /// Mark dead and start the corpse timer.  Returns false if already dead.
    ///
    /// Map-level consequences (death cue, explosion, kill credit) are applied
    /// by the caller.
    pub fn die(&mut self) -> bool {
        if self.is_dead {
            return false;
        }
        self.is_dead = true;
        self.pending_spawn_death = false;
        self.corpse_age = 0.0;
        self.animation = AnimationState::Death;
        self.animation_hold = 0.0;
        true
    }

    /// Skip the remaining corpse time.
    pub(crate) fn destroy(&mut self) {
        self.is_dead = true;
        self.is_destroyed = true;
    }

    /// Advance weapon, animation and corpse timers.  Returns true on the tick
    /// the corpse expires.
    pub(crate) fn advance_timers(&mut self, dt: f32) -> bool {
        for weapon in &mut self.weapons {
            weapon.refire.advance(dt);
        }

        if self.animation_hold > 0.0 {
            self.animation_hold -= dt;
            if self.animation_hold <= 0.0 && !self.is_dead {
                self.animation = AnimationState::Walk;
            }
        }

        if self.is_dead && !self.is_destroyed {
            self.corpse_age += dt;
            if self.corpse_age >= self.definition.corpse_lifetime {
                self.is_destroyed = true;
                return true;
            }
        }
        false
    }

    fn play_one_shot(&mut self, state: AnimationState) {
        if self.is_dead {
            return;
        }
        self.animation = state;
        self.animation_hold = ONE_SHOT_ANIMATION_SECS;
    }

    pub(crate) fn mark_attacking(&mut self) {
        self.play_one_shot(AnimationState::Attack);
    }

    // ── Physics ───────────────────────────────────────────────────────────────

    pub fn add_force(&mut self, force: Vec3) {
        if force.is_finite() {
            self.acceleration += force;
        }
    }

    pub fn add_impulse(&mut self, impulse: Vec3) {
        if impulse.is_finite() {
            self.velocity += impulse;
        }
    }

    /// Drag, gravity, semi-implicit Euler step, grounded flag, pitch clamp.
    pub fn integrate(&mut self, dt: f32, gravity: f32) {
        if !self.is_alive() || !self.definition.simulated {
            self.acceleration = Vec3::ZERO;
            return;
        }
        let def = Arc::clone(&self.definition);
        self.add_force(-self.velocity * def.drag);
        self.add_force(Vec3::NEG_Z * gravity * def.gravity_scale);

        self.velocity += self.acceleration * dt;
        self.position += self.velocity * dt;
        self.acceleration = Vec3::ZERO;
        self.is_grounded = self.position.z <= 0.0;
        self.clamp_pitch();
    }

    pub fn clamp_pitch(&mut self) {
        let max = if self.is_grounded {
            PITCH_MAX_GROUNDED_DEGREES
        } else {
            PITCH_MAX_AIRBORNE_DEGREES
        };
        self.orientation.pitch = self.orientation.pitch.clamp(PITCH_MIN_DEGREES, max);
    }

    /// Push along `direction` hard enough to settle at `speed` against drag.
    pub fn move_in_direction(&mut self, direction: Vec3, speed: f32) {
        let direction = direction.normalize_or_zero();
        self.add_force(direction * (speed * self.definition.drag));
    }

    /// Yaw toward `goal_yaw` at up to `max_rate` degrees per second.
    pub fn turn_in_direction(&mut self, goal_yaw: f32, max_rate: f32, dt: f32) {
        self.orientation.yaw = turn_toward_degrees(self.orientation.yaw, goal_yaw, max_rate * dt);
    }

    // ── Geometry ──────────────────────────────────────────────────────────────

    pub fn radius(&self) -> f32 {
        self.definition.physics_radius
    }

    pub fn height(&self) -> f32 {
        self.definition.physics_height
    }

    pub fn cylinder(&self) -> ZCylinder {
        ZCylinder::new(self.position, self.radius(), self.height())
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation.forward()
    }

    /// Point the weapon and camera pivot around.
    pub fn pivot_position(&self) -> Vec3 {
        self.position + Vec3::Z * self.definition.weapon_height
    }

    /// Camera position.  A corpse's eye sinks to the floor over its lifetime.
    pub fn eye_position(&self) -> Vec3 {
        let (forward, _, up) = self.orientation.basis();
        let def = &self.definition;
        let eye = self.pivot_position()
            + up * (def.eye_height - def.weapon_height)
            + forward * EYE_FORWARD_OFFSET;
        if !self.is_dead {
            return eye;
        }
        let fraction = if def.corpse_lifetime > 0.0 {
            (self.corpse_age / def.corpse_lifetime).clamp(0.0, 1.0)
        } else {
            1.0
        };
        eye.lerp(self.position, fraction)
    }

    /// Eye pushed out to the edge of the body: where hitscan rays start.
    pub fn fire_origin(&self) -> Vec3 {
        self.eye_position() + self.forward() * self.radius()
    }

    /// Where projectiles appear: a little below and ahead of the fire origin.
    pub fn muzzle_position(&self) -> Vec3 {
        self.fire_origin() + Vec3::NEG_Z * self.height() * MUZZLE_DROP_FRACTION
            + self.forward() * MUZZLE_FORWARD_OFFSET
    }

    // ── Inventory ─────────────────────────────────────────────────────────────

    pub fn weapons(&self) -> &[Weapon] {
        &self.weapons
    }

    pub fn equipped_index(&self) -> Option<usize> {
        self.equipped
    }

    pub fn equipped_weapon(&self) -> Option<&Weapon> {
        self.equipped.and_then(|i| self.weapons.get(i))
    }

    pub fn equipped_weapon_mut(&mut self) -> Option<&mut Weapon> {
        self.equipped.and_then(|i| self.weapons.get_mut(i))
    }

    /// Out-of-range indices are ignored.
    pub fn equip_weapon(&mut self, index: usize) {
        if index < self.weapons.len() {
            self.equipped = Some(index);
        }
    }

    pub fn equip_next_weapon(&mut self) {
        if let Some(i) = self.equipped {
            self.equip_weapon(i + 1);
        }
    }

    pub fn equip_previous_weapon(&mut self) {
        if let Some(i) = self.equipped.and_then(|i| i.checked_sub(1)) {
            self.equip_weapon(i);
        }
    }

    // ── Snapshot ──────────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> ActorSnapshot {
        ActorSnapshot {
            uid: self.uid,
            definition: self.definition.name.clone(),
            faction: self.definition.faction,
            position: self.position,
            orientation: self.orientation,
            velocity: self.velocity,
            health: self.health,
            max_health: self.definition.health,
            animation: self.animation,
            is_dead: self.is_dead,
            equipped_weapon: self.equipped_weapon().map(|w| w.name().to_string()),
        }
    }
}

/// Read-only view of one actor for renderers and HUDs.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorSnapshot {
    pub uid: ActorUid,
    pub definition: String,
    pub faction: Faction,
    pub position: Vec3,
    pub orientation: EulerAngles,
    pub velocity: Vec3,
    pub health: f32,
    pub max_health: f32,
    pub animation: AnimationState,
    pub is_dead: bool,
    pub equipped_weapon: Option<String>,
}
