//! Damage, death and weapon resolution.
//!
//! Every damage path runs through [`Map::deal_damage`], which settles
//! attribution: damage dealt by an owned actor (a projectile) is credited to
//! its owner, so retaliation and kill tallies land on whoever pulled the
//! trigger.

use super::Map;
use crate::actor::{Actor, DamageOutcome};
use crate::controller::{AimPose, Controller};
use crate::definitions::Faction;
use crate::effects::{SimContext, VisualEffectKind};
use crate::geometry::{bearing_degrees, is_point_in_directed_sector_2d, EulerAngles};
use crate::handle::ActorUid;
use bevy::log::{debug, warn};
use bevy::math::{Vec3, Vec3Swizzles};
use std::sync::Arc;

impl Map {
    /// Whoever gets credit for damage dealt by `source`.
    fn attribution(&self, source: ActorUid) -> ActorUid {
        match self.resolve(source) {
            Some(actor) if actor.owner.is_valid() => actor.owner,
            _ => source,
        }
    }

    /// Apply `amount` to `victim`, notify its controller of the attacker and
    /// run death consequences on a killing blow.
    pub fn deal_damage(
        &mut self,
        victim: ActorUid,
        amount: f32,
        source: ActorUid,
        ctx: &mut SimContext,
    ) -> DamageOutcome {
        let attacker = self.attribution(source);
        let Some(actor) = self.resolve_mut(victim) else {
            return DamageOutcome::Ignored;
        };
        let outcome = actor.take_damage(amount);
        if outcome == DamageOutcome::Ignored {
            return outcome;
        }
        let position = actor.position;
        let controller = actor.controller;
        if outcome == DamageOutcome::Hurt {
            let cue = actor.definition().hurt_sound.clone();
            ctx.sound(cue.as_deref(), position);
        }

        if attacker.is_valid() && attacker != victim {
            if let Some(controller) = controller.and_then(|cid| self.controller_mut(cid)) {
                controller.damaged_by(attacker);
            }
        }
        if outcome == DamageOutcome::Killed {
            self.on_death(victim, attacker, ctx);
        }
        outcome
    }

    /// Kill outright.  `source` is attributed like damage; pass
    /// [`ActorUid::INVALID`] for deaths nobody caused.  False if already dead.
    pub fn kill(&mut self, uid: ActorUid, source: ActorUid, ctx: &mut SimContext) -> bool {
        let killer = self.attribution(source);
        let Some(actor) = self.resolve_mut(uid) else {
            return false;
        };
        if !actor.die() {
            return false;
        }
        self.on_death(uid, killer, ctx);
        true
    }

    fn on_death(&mut self, victim: ActorUid, killer: ActorUid, ctx: &mut SimContext) {
        let Some(actor) = self.resolve(victim) else {
            return;
        };
        let definition = Arc::clone(actor.definition());
        let position = actor.position;
        let controller = actor.controller;
        debug!("{} ({victim}) killed by {killer}", definition.name);
        ctx.sound(definition.death_sound.as_deref(), position);

        if let Some(controller) = controller.and_then(|cid| self.controller_mut(cid)) {
            controller.killed_by(killer);
        }
        if killer.is_valid() && killer != victim {
            let killer_controller = self.resolve(killer).and_then(Actor::controller);
            if let Some(controller) = killer_controller.and_then(|cid| self.controller_mut(cid)) {
                controller.killed(victim);
            }
        }
        if definition.explode_on_die {
            self.explode(victim, ctx);
        }
    }

    /// Radial blast around a dying actor.
    ///
    /// The owner of the exploding actor is spared the damage; marines still
    /// feel the push of their own blast.
    fn explode(&mut self, uid: ActorUid, ctx: &mut SimContext) {
        let Some(actor) = self.resolve(uid) else {
            return;
        };
        let definition = Arc::clone(actor.definition());
        let center = actor.position;
        let owner = actor.owner;
        ctx.visual(VisualEffectKind::Explosion, center, Vec3::Z);

        let radius_sq = definition.explosion_radius * definition.explosion_radius;
        let caught: Vec<ActorUid> = self
            .actors()
            .filter(|other| {
                other.uid() != uid
                    && other.is_alive()
                    && other.position.xy().distance_squared(center.xy()) <= radius_sq
            })
            .map(Actor::uid)
            .collect();

        for victim in caught {
            let is_owner = victim == owner;
            let Some(target) = self.resolve_mut(victim) else {
                continue;
            };
            if !is_owner || target.faction() == Faction::Marine {
                let away = (target.position - center).normalize_or_zero();
                target.add_impulse(away * definition.impulse_on_explode);
            }
            if !is_owner {
                let amount = ctx.rng.roll(definition.explosion_damage);
                self.deal_damage(victim, amount, uid, ctx);
            }
        }
    }

    /// Fire the actor's equipped weapon.  `aim` overrides the eye-based origin
    /// and direction.  Returns false when nothing was fired.
    pub fn fire_weapon(
        &mut self,
        uid: ActorUid,
        aim: Option<AimPose>,
        ctx: &mut SimContext,
    ) -> bool {
        let Some(actor) = self.resolve_mut(uid) else {
            return false;
        };
        if !actor.is_alive() {
            return false;
        }
        let Some(weapon) = actor.equipped_weapon_mut() else {
            return false;
        };
        if !weapon.refire.try_fire() {
            return false;
        }
        let weapon = Arc::clone(&weapon.definition);
        actor.mark_attacking();

        let position = actor.position;
        let (origin, forward, muzzle) = match aim {
            Some(pose) => {
                let direction = pose.direction.normalize_or(actor.forward());
                (pose.origin, direction, pose.origin)
            }
            None => (actor.fire_origin(), actor.forward(), actor.muzzle_position()),
        };
        let (yaw, faction) = (actor.orientation.yaw, actor.faction());
        let controller = actor.controller;
        let held_by_player = controller
            .and_then(|cid| self.controller(cid))
            .is_some_and(Controller::is_player);

        ctx.sound(weapon.fire_sound.as_deref(), position);
        ctx.visual(VisualEffectKind::MuzzleFlash, muzzle, forward);

        for _ in 0..weapon.ray_count {
            let direction = match aim {
                Some(_) => forward,
                None => ctx.rng.direction_in_cone(forward, weapon.ray_cone),
            };
            let hit = self.raycast_vs_all(origin, direction, weapon.ray_range, uid);
            if !hit.did_impact {
                continue;
            }
            match hit.impact_actor {
                Some(victim) => {
                    ctx.visual(VisualEffectKind::Blood, hit.position, hit.normal);
                    let amount = ctx.rng.roll(weapon.ray_damage);
                    self.deal_damage(victim, amount, uid, ctx);
                    if let Some(target) = self.resolve_mut(victim) {
                        target.add_impulse(hit.forward * weapon.ray_impulse);
                    }
                }
                None => ctx.visual(VisualEffectKind::Sparks, hit.position, hit.normal),
            }
        }

        if weapon.projectile_count > 0 {
            match weapon.projectile_actor.as_deref() {
                None => warn!("Weapon {} fires projectiles but names none", weapon.name),
                Some(projectile) => {
                    for _ in 0..weapon.projectile_count {
                        let direction = match aim {
                            Some(_) => forward,
                            None => ctx.rng.direction_in_cone(forward, weapon.projectile_cone),
                        };
                        match self.spawn(projectile, muzzle, EulerAngles::facing(direction)) {
                            Ok(spawned) => {
                                if let Some(p) = self.resolve_mut(spawned) {
                                    p.owner = uid;
                                    p.add_impulse(direction * weapon.projectile_speed);
                                }
                            }
                            Err(e) => {
                                warn!("Weapon {} could not spawn {projectile}: {e}", weapon.name);
                                break;
                            }
                        }
                    }
                }
            }
        }

        let sweep_yaw = match aim {
            Some(_) if forward.xy() != bevy::math::Vec2::ZERO => bearing_degrees(forward.xy()),
            _ => yaw,
        };
        for _ in 0..weapon.melee_count {
            let struck: Vec<ActorUid> = self
                .actors()
                .filter(|other| {
                    other.uid() != uid
                        && other.is_alive()
                        && faction.is_hostile_to(other.faction())
                        && is_point_in_directed_sector_2d(
                            other.position.xy(),
                            position.xy(),
                            sweep_yaw,
                            weapon.melee_arc,
                            weapon.melee_range,
                        )
                })
                .map(Actor::uid)
                .collect();
            for victim in struck {
                let amount = ctx.rng.roll(weapon.melee_damage);
                self.deal_damage(victim, amount, uid, ctx);
                if let Some(target) = self.resolve_mut(victim) {
                    let away = (target.position - position).with_z(0.0).normalize_or_zero();
                    target.add_impulse(away * weapon.melee_impulse);
                }
            }
        }

        if held_by_player && aim.is_none() {
            if let Some(actor) = self.resolve_mut(uid) {
                actor.orientation.pitch -= weapon.recoil_angle;
                actor.clamp_pitch();
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::actor::DamageOutcome;
    use crate::controller::PlayerIntent;
    use crate::effects::VisualEffectKind;
    use crate::geometry::EulerAngles;
    use crate::handle::ActorUid;
    use bevy::math::Vec3;

    // ── Helpers ──────────────────────────────────────────────────────────────

    fn at(x: f32, y: f32) -> Vec3 {
        Vec3::new(x, y, 0.0)
    }

    // ── Hitscan ──────────────────────────────────────────────────────────────

    /// A pistol shot hurts the imp in front of it and makes it retaliate.
    #[test]
    fn hitscan_hit_damages_and_provokes_retaliation() {
        let mut map = open_map();
        let mut harness = Harness::default();
        let marine = map.spawn("Marine", at(2.0, 5.0), EulerAngles::default()).unwrap();
        let imp = map.spawn("Imp", at(6.0, 5.0), EulerAngles::from_yaw(180.0)).unwrap();

        assert!(map.fire_weapon(marine, None, &mut harness.ctx()));

        let victim = map.resolve(imp).unwrap();
        assert_eq!(victim.health, 20.0);
        assert!(victim.velocity.x > 0.0);
        let ai = map.controller(victim.controller().unwrap()).unwrap();
        assert_eq!(ai.as_ai().unwrap().target(), marine);
        assert_eq!(harness.effects.count_sounds("pistol"), 1);
        assert_eq!(harness.effects.count_visuals(VisualEffectKind::Blood), 1);
    }

    #[test]
    fn refire_timer_gates_the_second_shot() {
        let mut map = open_map();
        let mut harness = Harness::default();
        let marine = map.spawn("Marine", at(2.0, 5.0), EulerAngles::default()).unwrap();
        assert!(map.fire_weapon(marine, None, &mut harness.ctx()));
        assert!(!map.fire_weapon(marine, None, &mut harness.ctx()));
    }

    #[test]
    fn missing_everything_but_the_wall_makes_sparks() {
        let mut map = walled_map();
        let mut harness = Harness::default();
        let marine = map.spawn("Marine", Vec3::new(0.5, 0.5, 0.0), EulerAngles::default()).unwrap();
        map.fire_weapon(marine, None, &mut harness.ctx());
        assert_eq!(harness.effects.count_visuals(VisualEffectKind::Sparks), 1);
        assert_eq!(harness.effects.count_visuals(VisualEffectKind::Blood), 0);
    }

    #[test]
    fn aim_pose_overrides_eye_direction() {
        let mut map = open_map();
        let mut harness = Harness::default();
        let marine = map.spawn("Marine", at(5.0, 5.0), EulerAngles::default()).unwrap();
        let target = map.spawn("Target", at(5.0, 9.0), EulerAngles::default()).unwrap();
        let aim = crate::controller::AimPose {
            origin: Vec3::new(5.0, 5.5, 0.3),
            direction: Vec3::Y,
        };
        assert!(map.fire_weapon(marine, Some(aim), &mut harness.ctx()));
        assert_eq!(map.resolve(target).unwrap().health, 40.0);
    }

    #[test]
    fn player_weapons_kick_pitch_up() {
        let mut map = open_map();
        let mut harness = Harness::default();
        let marine = map.spawn("Marine", at(5.0, 5.0), EulerAngles::default()).unwrap();
        let player = map.add_player_controller();
        assert!(map.possess(player, marine));
        map.fire_weapon(marine, None, &mut harness.ctx());
        assert_eq!(map.resolve(marine).unwrap().orientation.pitch, -2.0);
    }

    /// One long tick with the trigger held fires a single round; the refire
    /// budget is drained rather than banked.
    #[test]
    fn long_tick_with_trigger_held_fires_once() {
        let mut map = open_map();
        let mut harness = Harness::default();
        let marine = map.spawn("Marine", at(5.0, 5.0), EulerAngles::default()).unwrap();
        let player = map.add_player_controller();
        assert!(map.possess(player, marine));
        map.set_player_intent(
            player,
            PlayerIntent {
                attack: true,
                ..Default::default()
            },
        );

        map.tick(2.0, &mut harness.ctx());
        assert_eq!(harness.effects.count_sounds("pistol"), 1);

        map.tick(0.1, &mut harness.ctx());
        assert_eq!(harness.effects.count_sounds("pistol"), 1);
    }

    // ── Projectiles ──────────────────────────────────────────────────────────

    #[test]
    fn launcher_spawns_an_owned_projectile_at_the_muzzle() {
        let mut map = open_map();
        let mut harness = Harness::default();
        let marine = map.spawn("Marine", at(5.0, 5.0), EulerAngles::default()).unwrap();
        map.resolve_mut(marine).unwrap().equip_weapon(1);
        let muzzle = map.resolve(marine).unwrap().muzzle_position();

        assert!(map.fire_weapon(marine, None, &mut harness.ctx()));

        let rocket = map
            .actors()
            .find(|a| a.name() == "Rocket")
            .expect("rocket spawned");
        assert_eq!(rocket.owner, marine);
        assert!(rocket.position.distance(muzzle) < 1e-5);
        assert!((rocket.velocity - Vec3::X * 10.0).length() < 1e-4);
    }

    /// Kill credit follows the projectile back to whoever fired it.
    #[test]
    fn projectile_kill_is_credited_to_its_owner() {
        let mut map = open_map();
        let mut harness = Harness::default();
        let marine = map.spawn("Marine", at(2.0, 5.0), EulerAngles::default()).unwrap();
        let player = map.add_player_controller();
        map.possess(player, marine);
        let rocket = map.spawn("Rocket", at(20.0, 20.0), EulerAngles::default()).unwrap();
        map.resolve_mut(rocket).unwrap().owner = marine;
        let imp = map.spawn("Imp", at(40.0, 40.0), EulerAngles::default()).unwrap();

        let outcome = map.deal_damage(imp, 500.0, rocket, &mut harness.ctx());

        assert_eq!(outcome, DamageOutcome::Killed);
        assert_eq!(map.player(player).unwrap().kills, 1);
    }

    // ── Explosions ───────────────────────────────────────────────────────────

    #[test]
    fn explosion_hurts_and_pushes_everything_in_radius() {
        let mut map = open_map();
        let mut harness = Harness::default();
        let barrel = map.spawn("Barrel", at(10.0, 10.0), EulerAngles::default()).unwrap();
        let near = map.spawn("Target", at(11.0, 10.0), EulerAngles::default()).unwrap();
        let far = map.spawn("Target", at(15.0, 10.0), EulerAngles::default()).unwrap();

        assert!(map.kill(barrel, ActorUid::INVALID, &mut harness.ctx()));

        let near = map.resolve(near).unwrap();
        assert_eq!(near.health, 30.0);
        assert!(near.velocity.x > 0.0);
        assert_eq!(map.resolve(far).unwrap().health, 50.0);
        assert_eq!(harness.effects.count_visuals(VisualEffectKind::Explosion), 1);
    }

    #[test]
    fn own_rocket_blast_spares_the_owner() {
        let mut map = open_map();
        let mut harness = Harness::default();
        let marine = map.spawn("Marine", at(10.0, 10.0), EulerAngles::default()).unwrap();
        let rocket = map.spawn("Rocket", at(10.5, 10.0), EulerAngles::default()).unwrap();
        map.resolve_mut(rocket).unwrap().owner = marine;

        map.kill(rocket, ActorUid::INVALID, &mut harness.ctx());

        let owner = map.resolve(marine).unwrap();
        assert_eq!(owner.health, 100.0);
        assert!(owner.velocity.x < 0.0, "marines still feel their own blast");
    }

    #[test]
    fn damage_to_a_corpse_is_ignored() {
        let mut map = open_map();
        let mut harness = Harness::default();
        let target = map.spawn("Target", at(3.0, 3.0), EulerAngles::default()).unwrap();
        map.kill(target, ActorUid::INVALID, &mut harness.ctx());
        harness.effects.clear();

        let outcome = map.deal_damage(target, 10.0, ActorUid::INVALID, &mut harness.ctx());

        assert_eq!(outcome, DamageOutcome::Ignored);
        assert!(harness.effects.events().is_empty());
        assert!(!map.kill(target, ActorUid::INVALID, &mut harness.ctx()));
    }

    // ── Melee ────────────────────────────────────────────────────────────────

    #[test]
    fn melee_sweep_hits_hostiles_in_the_arc_once() {
        let mut map = open_map();
        let mut harness = Harness::default();
        let imp = map.spawn("Imp", at(10.0, 10.0), EulerAngles::default()).unwrap();
        let front = map.spawn("Marine", at(11.5, 10.0), EulerAngles::default()).unwrap();
        let behind = map.spawn("Marine", at(8.5, 10.0), EulerAngles::default()).unwrap();
        let friend = map.spawn("Imp", at(11.0, 10.5), EulerAngles::default()).unwrap();

        assert!(map.fire_weapon(imp, None, &mut harness.ctx()));

        let hit = map.resolve(front).unwrap();
        assert_eq!(hit.health, 85.0);
        assert!(hit.velocity.x > 0.0);
        assert_eq!(map.resolve(behind).unwrap().health, 100.0);
        assert_eq!(map.resolve(friend).unwrap().health, 30.0);
    }
}
