//! The world: actor registry, controller arena, static geometry and the
//! per-tick pipeline.
//!
//! [`Map`] is the only owner of actors and controllers.  Everything else holds
//! an [`ActorUid`] or a [`ControllerId`] and asks the map to resolve it.
//!
//! ## Tick order
//!
//! 1. Kill actors whose definition dies on spawn.
//! 2. Advance weapon, animation and corpse timers.
//! 3. Collect every controller's decision from the current state, record AI
//!    targets, then apply the commands (moves, turns, attacks).
//! 4. Integrate physics.
//! 5. Actor vs actor, actor vs obstacle, actor vs world geometry.
//! 6. Prune destroyed actors and release their slots.
//!
//! The submodules add the rest of `impl Map`: collision passes in
//! [`collision`], spatial queries in [`raycast`] and damage/weapon resolution
//! in [`combat`].

pub mod collision;
pub mod combat;
pub mod obstacles;
pub mod raycast;
pub mod tiles;

#[cfg(test)]
pub(crate) mod test_support;

pub use obstacles::{ObstacleField, ObstacleKind, StaticObstacle};
pub use raycast::RaycastHit;
pub use tiles::TileGrid;

use crate::actor::{Actor, ActorSnapshot};
use crate::ai::AiDecision;
use crate::config::SimConfig;
use crate::constants::MAX_ACTOR_SLOTS;
use crate::controller::{
    ActorCommand, Controller, ControllerId, ControllerKind, EquipRequest, PlayerController,
    PlayerIntent,
};
use crate::definitions::{DefinitionLibrary, Faction, MapLayout};
use crate::effects::SimContext;
use crate::error::{SimError, SimResult};
use crate::geometry::EulerAngles;
use crate::handle::ActorUid;
use crate::rng::SimRng;
use bevy::log::{debug, info, warn};
use bevy::math::Vec3;
use bevy::prelude::Resource;
use std::collections::VecDeque;
use std::sync::Arc;

/// Per-map copy of the tunables the tick needs.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSettings {
    pub gravity: f32,
    pub ceiling_height: f32,
    pub ai_walk_proximity_sq: f32,
    pub ai_firing_cone_degrees: f32,
    /// Definition a player respawns as.
    pub player_actor: String,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self::from(&SimConfig::default())
    }
}

impl From<&SimConfig> for MapSettings {
    fn from(config: &SimConfig) -> Self {
        Self {
            gravity: config.gravity,
            ceiling_height: config.ceiling_height,
            ai_walk_proximity_sq: config.ai_walk_proximity_sq,
            ai_firing_cone_degrees: config.ai_firing_cone_degrees,
            player_actor: config.player_actor.clone(),
        }
    }
}

/// Static collision geometry.
#[derive(Debug, Clone)]
pub enum WorldGeometry {
    /// Bounded grid with a floor at `z = 0` and a ceiling.
    Tiles(TileGrid),
    /// Open terrain with free-standing obstacles and no ceiling.
    Field(ObstacleField),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPoint {
    pub position: Vec3,
    pub orientation: EulerAngles,
}

#[derive(Resource)]
pub struct Map {
    name: String,
    definitions: Arc<DefinitionLibrary>,
    settings: MapSettings,
    geometry: WorldGeometry,
    spawn_points: Vec<SpawnPoint>,

    slots: Vec<Option<Actor>>,
    /// Freed slot indices, reused oldest first.
    free_slots: VecDeque<u16>,
    next_salt: u16,

    controllers: Vec<Option<Controller>>,
    free_controllers: Vec<u32>,
}

/// Slot lookup with the salt check.  Free function so callers can borrow the
/// slot array apart from the rest of the map.
fn resolve_slot(slots: &[Option<Actor>], uid: ActorUid) -> Option<&Actor> {
    if !uid.is_valid() {
        return None;
    }
    slots
        .get(uid.index())?
        .as_ref()
        .filter(|actor| actor.uid() == uid)
}

impl Map {
    pub fn new(
        name: impl Into<String>,
        definitions: Arc<DefinitionLibrary>,
        settings: MapSettings,
        geometry: WorldGeometry,
        spawn_points: Vec<SpawnPoint>,
    ) -> Self {
        Self {
            name: name.into(),
            definitions,
            settings,
            geometry,
            spawn_points,
            slots: Vec::new(),
            free_slots: VecDeque::new(),
            next_salt: 0,
            controllers: Vec::new(),
            free_controllers: Vec::new(),
        }
    }

    /// Build the named map from the library and spawn its listed actors.
    pub fn from_definition(
        definitions: Arc<DefinitionLibrary>,
        map_name: &str,
        settings: MapSettings,
        rng: &mut SimRng,
    ) -> SimResult<Self> {
        let definition = Arc::clone(definitions.map(map_name)?);
        let geometry = match &definition.layout {
            MapLayout::Tiles { rows, legend } => WorldGeometry::Tiles(TileGrid::from_rows(
                &definition.name,
                rows,
                legend,
                &definitions,
            )?),
            MapLayout::Field { width, height } => {
                WorldGeometry::Field(ObstacleField::generate(*width, *height, rng))
            }
        };
        let spawn_points = definition
            .spawn_points
            .iter()
            .map(|info| SpawnPoint {
                position: info.position(),
                orientation: EulerAngles::from_yaw(info.yaw),
            })
            .collect();

        let mut map = Self::new(
            definition.name.clone(),
            definitions,
            settings,
            geometry,
            spawn_points,
        );
        for info in &definition.actors {
            map.spawn(&info.actor, info.position(), EulerAngles::from_yaw(info.yaw))?;
        }
        info!(
            "Loaded map '{}' with {} actors and {} spawn points",
            map.name,
            map.actor_count(),
            map.spawn_points.len()
        );
        Ok(map)
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn definitions(&self) -> &Arc<DefinitionLibrary> {
        &self.definitions
    }

    pub fn settings(&self) -> &MapSettings {
        &self.settings
    }

    pub fn geometry(&self) -> &WorldGeometry {
        &self.geometry
    }

    pub fn spawn_points(&self) -> &[SpawnPoint] {
        &self.spawn_points
    }

    // ── Registry ──────────────────────────────────────────────────────────────

    /// Spawn an actor from its definition.  AI-enabled definitions get their
    /// own AI controller, already possessing the new actor.
    pub fn spawn(
        &mut self,
        definition_name: &str,
        position: Vec3,
        orientation: EulerAngles,
    ) -> SimResult<ActorUid> {
        let definition = Arc::clone(self.definitions.actor(definition_name)?);
        let weapons = self.definitions.weapons_for(&definition)?;
        let index = self.allocate_slot()?;
        let uid = ActorUid::new(self.next_salt, index);
        self.next_salt = self.next_salt.wrapping_add(1);

        let ai_enabled = definition.ai_enabled;
        self.slots[index as usize] = Some(Actor::new(
            uid,
            definition,
            weapons,
            position,
            orientation,
        ));

        if ai_enabled {
            let cid = self.add_controller(Controller::ai());
            self.possess(cid, uid);
        }
        debug!("Spawned {definition_name} as {uid} at {position}");
        Ok(uid)
    }

    fn allocate_slot(&mut self) -> SimResult<u16> {
        if let Some(index) = self.free_slots.pop_front() {
            return Ok(index);
        }
        if self.slots.len() >= MAX_ACTOR_SLOTS {
            return Err(SimError::RegistryFull {
                capacity: MAX_ACTOR_SLOTS,
            });
        }
        self.slots.push(None);
        Ok((self.slots.len() - 1) as u16)
    }

    /// O(1) lookup.  Stale and invalid handles resolve to `None`.
    pub fn resolve(&self, uid: ActorUid) -> Option<&Actor> {
        resolve_slot(&self.slots, uid)
    }

    pub fn resolve_mut(&mut self, uid: ActorUid) -> Option<&mut Actor> {
        if !uid.is_valid() {
            return None;
        }
        self.slots
            .get_mut(uid.index())?
            .as_mut()
            .filter(|actor| actor.uid() == uid)
    }

    /// Every occupied slot, corpses included.
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.slots.iter().flatten()
    }

    pub fn actor_count(&self) -> usize {
        self.actors().count()
    }

    pub fn snapshots(&self) -> Vec<ActorSnapshot> {
        self.actors().map(Actor::snapshot).collect()
    }

    // ── Controllers ───────────────────────────────────────────────────────────

    fn add_controller(&mut self, controller: Controller) -> ControllerId {
        if let Some(index) = self.free_controllers.pop() {
            self.controllers[index as usize] = Some(controller);
            return ControllerId(index);
        }
        self.controllers.push(Some(controller));
        ControllerId((self.controllers.len() - 1) as u32)
    }

    /// Register a player controller.  It possesses nothing until
    /// [`possess`](Self::possess) or [`spawn_player`](Self::spawn_player).
    pub fn add_player_controller(&mut self) -> ControllerId {
        self.add_controller(Controller::player())
    }

    fn release_controller(&mut self, cid: ControllerId) {
        if let Some(slot) = self.controllers.get_mut(cid.index()) {
            if slot.take().is_some() {
                self.free_controllers.push(cid.0);
            }
        }
    }

    pub fn controller(&self, cid: ControllerId) -> Option<&Controller> {
        self.controllers.get(cid.index())?.as_ref()
    }

    pub(crate) fn controller_mut(&mut self, cid: ControllerId) -> Option<&mut Controller> {
        self.controllers.get_mut(cid.index())?.as_mut()
    }

    pub fn player(&self, cid: ControllerId) -> Option<&PlayerController> {
        self.controller(cid)?.as_player()
    }

    /// Replace the input a player controller acts on.  False if `cid` is not a
    /// player.
    pub fn set_player_intent(&mut self, cid: ControllerId, intent: PlayerIntent) -> bool {
        match self.controller_mut(cid).and_then(Controller::as_player_mut) {
            Some(player) => {
                player.intent = intent;
                true
            }
            None => false,
        }
    }

    /// Bind `cid` to `uid`, tearing down whatever either side was linked to.
    ///
    /// Dead actors cannot be possessed, and a player cannot take an actor
    /// whose definition forbids it.
    pub fn possess(&mut self, cid: ControllerId, uid: ActorUid) -> bool {
        let Some(is_player) = self.controller(cid).map(Controller::is_player) else {
            return false;
        };
        let Some(actor) = self.resolve(uid) else {
            return false;
        };
        if !actor.is_alive() || (is_player && !actor.definition().can_be_possessed) {
            return false;
        }
        let previous = actor.controller;
        if previous == Some(cid) {
            return true;
        }

        self.unpossess(cid);
        if let Some(previous) = previous {
            if let Some(controller) = self.controller_mut(previous) {
                controller.possessed = ActorUid::INVALID;
            }
        }

        if let Some(actor) = self.resolve_mut(uid) {
            actor.controller = Some(cid);
            if !is_player {
                actor.ai_controller = Some(cid);
            }
        }
        if let Some(controller) = self.controller_mut(cid) {
            controller.possessed = uid;
        }
        debug!("Controller {} possessed {uid}", cid.index());
        true
    }

    /// Release whatever `cid` possesses.  The actor falls back to its own AI
    /// controller if it has one.
    pub fn unpossess(&mut self, cid: ControllerId) {
        let Some(controller) = self.controller_mut(cid) else {
            return;
        };
        let uid = std::mem::replace(&mut controller.possessed, ActorUid::INVALID);
        if let Some(player) = controller.as_player_mut() {
            if uid.is_valid() {
                player.last_possessed = uid;
            }
        }

        let Some(actor) = self.resolve(uid) else {
            return;
        };
        if actor.controller != Some(cid) {
            return;
        }
        let fallback = actor.ai_controller.filter(|&ai| {
            ai != cid
                && self
                    .controller(ai)
                    .is_some_and(|c| !c.possessed.is_valid())
        });

        if let Some(actor) = self.resolve_mut(uid) {
            actor.controller = fallback;
        }
        if let Some(ai) = fallback.and_then(|ai| self.controller_mut(ai)) {
            ai.possessed = uid;
        }
    }

    /// Spawn the configured player actor at a random spawn point and hand it to
    /// `cid`.
    pub fn spawn_player(&mut self, cid: ControllerId, rng: &mut SimRng) -> SimResult<ActorUid> {
        let point = if self.spawn_points.is_empty() {
            SpawnPoint {
                position: Vec3::ZERO,
                orientation: EulerAngles::default(),
            }
        } else {
            let last = self.spawn_points.len() as i32 - 1;
            self.spawn_points[rng.int_in_range(0, last) as usize]
        };
        let actor = self.settings.player_actor.clone();
        let uid = self.spawn(&actor, point.position, point.orientation)?;
        if !self.possess(cid, uid) {
            warn!("Player controller {} could not possess {actor}", cid.index());
        }
        Ok(uid)
    }

    // ── Tick ──────────────────────────────────────────────────────────────────

    /// Advance the world by `dt` seconds.  Non-positive or non-finite steps
    /// are ignored.
    pub fn tick(&mut self, dt: f32, ctx: &mut SimContext) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.resolve_spawn_deaths(ctx);
        self.advance_timers(dt);
        self.run_controllers(dt, ctx);
        self.integrate(dt);
        self.collide_actors(ctx);
        self.collide_actors_with_obstacles(ctx);
        self.collide_actors_with_world(ctx);
        self.prune(ctx);
    }

    fn resolve_spawn_deaths(&mut self, ctx: &mut SimContext) {
        let doomed: Vec<ActorUid> = self
            .actors()
            .filter(|a| a.pending_spawn_death && a.is_alive())
            .map(Actor::uid)
            .collect();
        for uid in doomed {
            self.kill(uid, ActorUid::INVALID, ctx);
        }
    }

    fn advance_timers(&mut self, dt: f32) {
        for actor in self.slots.iter_mut().flatten() {
            actor.advance_timers(dt);
        }
    }

    fn run_controllers(&mut self, dt: f32, ctx: &mut SimContext) {
        let mut player_plans = Vec::new();
        for controller in self.controllers.iter_mut().flatten() {
            let uid = controller.possessed;
            let ControllerKind::Player(player) = &mut controller.kind else {
                continue;
            };
            if let Some(actor) = resolve_slot(&self.slots, uid).filter(|a| a.is_alive()) {
                player_plans.push((uid, player.decide(actor)));
            }
        }

        // Every AI reads the same pre-move world.
        let mut ai_plans: Vec<(ControllerId, ActorUid, AiDecision)> = Vec::new();
        for (index, slot) in self.controllers.iter().enumerate() {
            let Some(controller) = slot else {
                continue;
            };
            let ControllerKind::Ai(ai) = &controller.kind else {
                continue;
            };
            let uid = controller.possessed;
            if self.resolve(uid).is_some_and(Actor::is_alive) {
                ai_plans.push((ControllerId(index as u32), uid, ai.decide(self, uid)));
            }
        }

        // Targets land before any command runs, so damage dealt below can
        // still redirect an AI through `damaged_by`.
        let mut ai_commands = Vec::with_capacity(ai_plans.len());
        for (cid, uid, decision) in ai_plans {
            if let Some(ControllerKind::Ai(ai)) = self.controller_mut(cid).map(|c| &mut c.kind) {
                ai.set_target(decision.target);
            }
            if decision.noticed {
                if let Some(actor) = self.resolve(uid) {
                    let cue = actor.definition().see_sound.clone();
                    ctx.sound(cue.as_deref(), actor.position);
                }
            }
            ai_commands.push((uid, decision.commands));
        }

        for (uid, commands) in player_plans {
            self.apply_commands(uid, commands, dt, ctx);
        }
        for (uid, commands) in ai_commands {
            self.apply_commands(uid, commands, dt, ctx);
        }
    }

    /// Carry out controller commands.  Skipped once the actor is gone or dead,
    /// which can happen when an earlier command this tick killed it.
    pub(crate) fn apply_commands(
        &mut self,
        uid: ActorUid,
        commands: Vec<ActorCommand>,
        dt: f32,
        ctx: &mut SimContext,
    ) {
        for command in commands {
            if !self.resolve(uid).is_some_and(Actor::is_alive) {
                return;
            }
            if let ActorCommand::Attack { aim } = command {
                self.fire_weapon(uid, aim, ctx);
                continue;
            }
            let Some(actor) = self.resolve_mut(uid) else {
                return;
            };
            match command {
                ActorCommand::Move { direction, speed } => actor.move_in_direction(direction, speed),
                ActorCommand::Turn { yaw, rate } => actor.turn_in_direction(yaw, rate, dt),
                ActorCommand::Look {
                    yaw_delta,
                    pitch_delta,
                } => {
                    actor.orientation.yaw += yaw_delta;
                    actor.orientation.pitch += pitch_delta;
                    actor.clamp_pitch();
                }
                ActorCommand::Equip(EquipRequest::Slot(index)) => actor.equip_weapon(index),
                ActorCommand::Equip(EquipRequest::Next) => actor.equip_next_weapon(),
                ActorCommand::Equip(EquipRequest::Previous) => actor.equip_previous_weapon(),
                ActorCommand::Attack { .. } => {}
            }
        }
    }

    fn integrate(&mut self, dt: f32) {
        let gravity = self.settings.gravity;
        for actor in self.slots.iter_mut().flatten() {
            actor.integrate(dt, gravity);
        }
    }

    /// Free every destroyed actor.  Players lose their link; marines respawn
    /// their player straight away.
    fn prune(&mut self, ctx: &mut SimContext) {
        let mut respawns = Vec::new();
        for index in 0..self.slots.len() {
            if !self.slots[index].as_ref().is_some_and(Actor::is_destroyed) {
                continue;
            }
            let Some(actor) = self.slots[index].take() else {
                continue;
            };
            let uid = actor.uid();

            if let Some(cid) = actor.controller {
                if let Some(controller) = self.controller_mut(cid) {
                    if controller.possessed == uid {
                        controller.possessed = ActorUid::INVALID;
                        if let Some(player) = controller.as_player_mut() {
                            player.last_possessed = uid;
                            if actor.faction() == Faction::Marine {
                                respawns.push(cid);
                            }
                        }
                    }
                }
            }
            if let Some(ai) = actor.ai_controller {
                self.release_controller(ai);
            }
            self.free_slots.push_back(index as u16);
            debug!("Pruned {} ({uid})", actor.name());
        }

        for cid in respawns {
            match self.spawn_player(cid, ctx.rng) {
                Ok(uid) => info!("Respawned player {} as {uid}", cid.index()),
                Err(e) => warn!("Player {} could not respawn: {e}", cid.index()),
            }
        }
    }
}
