//! Controllers: whoever decides what a possessed actor does.
//!
//! A [`Controller`] is a tagged variant over a player input adapter and an AI
//! brain.  It holds only a handle to its actor; the actor holds only a
//! [`ControllerId`] back.  The map owns both arenas and keeps the two links in
//! step through `possess` / `unpossess`.

use crate::actor::Actor;
use crate::ai::AiController;
use crate::handle::ActorUid;
use bevy::math::{Vec2, Vec3};

/// Index into the map's controller arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControllerId(pub(crate) u32);

impl ControllerId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Externally supplied aim, e.g. from a tracked hand controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AimPose {
    pub origin: Vec3,
    pub direction: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquipRequest {
    Slot(usize),
    Next,
    Previous,
}

/// One action a controller asks its actor to perform this tick.
#[derive(Debug, Clone, PartialEq)]
pub enum ActorCommand {
    Move { direction: Vec3, speed: f32 },
    /// Yaw toward `yaw` at up to `rate` degrees per second.
    Turn { yaw: f32, rate: f32 },
    /// Add to yaw/pitch directly (mouse look).
    Look { yaw_delta: f32, pitch_delta: f32 },
    Attack { aim: Option<AimPose> },
    Equip(EquipRequest),
}

/// Input the host wrote for a player this frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerIntent {
    /// Local movement: x forward, y left.  Clamped to unit length.
    pub move_axes: Vec2,
    pub sprint: bool,
    pub yaw_delta: f32,
    pub pitch_delta: f32,
    pub attack: bool,
    /// Consumed on the tick it is applied.
    pub equip: Option<EquipRequest>,
    pub aim: Option<AimPose>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerController {
    pub kills: u32,
    pub deaths: u32,
    pub last_possessed: ActorUid,
    pub intent: PlayerIntent,
}

impl PlayerController {
    /// Translate the held intent into commands for `actor`.
    pub fn decide(&mut self, actor: &Actor) -> Vec<ActorCommand> {
        let mut commands = Vec::new();
        let intent = &mut self.intent;

        if intent.yaw_delta != 0.0 || intent.pitch_delta != 0.0 {
            commands.push(ActorCommand::Look {
                yaw_delta: intent.yaw_delta,
                pitch_delta: intent.pitch_delta,
            });
            intent.yaw_delta = 0.0;
            intent.pitch_delta = 0.0;
        }

        let axes = intent.move_axes.clamp_length_max(1.0);
        if axes != Vec2::ZERO {
            let (forward, left, _) = actor.orientation.basis();
            let flat = |v: Vec3| v.with_z(0.0).normalize_or_zero();
            let direction = flat(forward) * axes.x + flat(left) * axes.y;
            let def = actor.definition();
            let speed = if intent.sprint { def.run_speed } else { def.walk_speed };
            commands.push(ActorCommand::Move {
                direction,
                speed: speed * axes.length(),
            });
        }

        if let Some(request) = intent.equip.take() {
            commands.push(ActorCommand::Equip(request));
        }

        if intent.attack {
            commands.push(ActorCommand::Attack { aim: intent.aim });
        }
        commands
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerKind {
    Player(PlayerController),
    Ai(AiController),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Controller {
    pub(crate) possessed: ActorUid,
    pub kind: ControllerKind,
}

impl Controller {
    pub fn player() -> Self {
        Self {
            possessed: ActorUid::INVALID,
            kind: ControllerKind::Player(PlayerController::default()),
        }
    }

    pub fn ai() -> Self {
        Self {
            possessed: ActorUid::INVALID,
            kind: ControllerKind::Ai(AiController::default()),
        }
    }

    pub fn possessed(&self) -> ActorUid {
        self.possessed
    }

    pub fn is_player(&self) -> bool {
        matches!(self.kind, ControllerKind::Player(_))
    }

    pub fn as_player(&self) -> Option<&PlayerController> {
        match &self.kind {
            ControllerKind::Player(p) => Some(p),
            ControllerKind::Ai(_) => None,
        }
    }

    pub fn as_player_mut(&mut self) -> Option<&mut PlayerController> {
        match &mut self.kind {
            ControllerKind::Player(p) => Some(p),
            ControllerKind::Ai(_) => None,
        }
    }

    pub fn as_ai(&self) -> Option<&AiController> {
        match &self.kind {
            ControllerKind::Ai(ai) => Some(ai),
            ControllerKind::Player(_) => None,
        }
    }

    /// The possessed actor was hurt by `attacker`.
    pub fn damaged_by(&mut self, attacker: ActorUid) {
        if let ControllerKind::Ai(ai) = &mut self.kind {
            ai.damaged_by(attacker);
        }
    }

    /// The possessed actor was killed by `killer`.
    pub fn killed_by(&mut self, _killer: ActorUid) {
        if let ControllerKind::Player(p) = &mut self.kind {
            p.deaths += 1;
        }
    }

    /// The possessed actor (or its projectile) killed `victim`.
    pub fn killed(&mut self, _victim: ActorUid) {
        if let ControllerKind::Player(p) = &mut self.kind {
            p.kills += 1;
        }
    }
}
