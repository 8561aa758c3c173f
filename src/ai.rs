//! AI brain: acquire a hostile, close in, shoot when lined up.
//!
//! The controller holds nothing but its current target.  Each tick it reads
//! the map (never mutates it) and returns an [`AiDecision`]; the map applies
//! all decisions after every AI has decided, so no AI sees another's movement
//! from the same tick.
//!
//! ```text
//! searching ──hostile seen / damaged──▶ engaging ──target dead or gone──▶ searching
//! ```

use crate::controller::ActorCommand;
use crate::geometry::{angle_between_degrees_2d, bearing_degrees};
use crate::handle::ActorUid;
use crate::map::Map;
use bevy::math::Vec3Swizzles;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AiController {
    target: ActorUid,
}

/// What an AI wants to do this tick.
#[derive(Debug, Clone, PartialEq)]
pub struct AiDecision {
    /// Target to remember after this tick.
    pub target: ActorUid,
    /// A new target was spotted; the actor plays its sighting cue.
    pub noticed: bool,
    pub commands: Vec<ActorCommand>,
}

impl AiController {
    pub fn target(&self) -> ActorUid {
        self.target
    }

    pub(crate) fn set_target(&mut self, target: ActorUid) {
        self.target = target;
    }

    /// Retaliate: whoever hurt us becomes the target, seen or not.
    pub fn damaged_by(&mut self, attacker: ActorUid) {
        if attacker.is_valid() {
            self.target = attacker;
        }
    }

    /// Decide for the actor `uid` against the current map state.
    pub fn decide(&self, map: &Map, uid: ActorUid) -> AiDecision {
        let mut decision = AiDecision {
            target: self.target,
            noticed: false,
            commands: Vec::new(),
        };
        let Some(me) = map.resolve(uid) else {
            return decision;
        };

        let target_alive = map.resolve(self.target).is_some_and(|t| t.is_alive());
        if !target_alive {
            decision.target = map.find_closest_visible_hostile(uid);
            decision.noticed = decision.target.is_valid();
        }
        let Some(target) = map.resolve(decision.target).filter(|t| t.is_alive()) else {
            return decision;
        };

        let settings = map.settings();
        let def = me.definition();
        let to_target = target.position.xy() - me.position.xy();
        let fire_to_target = target.position.xy() - me.fire_origin().xy();

        let speed = if to_target.length_squared() < settings.ai_walk_proximity_sq {
            def.walk_speed
        } else {
            def.run_speed
        };
        let range = me.equipped_weapon().map_or(0.0, |w| w.range());
        let in_range = fire_to_target.length_squared() < range * range;
        let in_cone = angle_between_degrees_2d(fire_to_target, me.forward().xy())
            < settings.ai_firing_cone_degrees;

        if in_range && in_cone && map.has_line_of_sight(uid, target.uid()) {
            decision.commands.push(ActorCommand::Attack { aim: None });
        } else {
            decision.commands.push(ActorCommand::Move {
                direction: me.forward(),
                speed,
            });
        }
        decision.commands.push(ActorCommand::Turn {
            yaw: bearing_degrees(to_target),
            rate: def.turn_speed,
        });
        decision
    }
}
