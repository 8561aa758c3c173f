//! Collision passes run by [`Map::tick`].
//!
//! Every shape is a vertical cylinder except tiles, which are unit boxes in
//! XY.  Resolution only ever moves actors horizontally; the floor and ceiling
//! pass handles `z` on its own.

use super::{Map, WorldGeometry};
use crate::actor::Actor;
use crate::effects::SimContext;
use crate::geometry::{
    cylinders_overlap, push_disc_out_of_aabb, push_disc_out_of_fixed_disc, push_discs_apart,
};
use crate::handle::ActorUid;
use bevy::math::{IVec2, Vec3Swizzles};

const NEIGHBOURS: [IVec2; 8] = [
    IVec2::new(1, 0),
    IVec2::new(-1, 0),
    IVec2::new(0, 1),
    IVec2::new(0, -1),
    IVec2::new(1, 1),
    IVec2::new(1, -1),
    IVec2::new(-1, 1),
    IVec2::new(-1, -1),
];

/// Pairs that never interact: an actor and anything it fired, siblings fired
/// by the same owner, and any two owned actors.
fn ignore_each_other(a: &Actor, b: &Actor) -> bool {
    a.is_owned_by(b.uid())
        || b.is_owned_by(a.uid())
        || (a.owner.is_valid() && b.owner.is_valid())
}

/// Horizontal separation of an overlapping pair.
fn separate(a: &mut Actor, b: &mut Actor) {
    let mut a_xy = a.position.xy();
    let mut b_xy = b.position.xy();
    match (
        a.definition().collides_with_actors,
        b.definition().collides_with_actors,
    ) {
        (true, true) => {
            push_discs_apart(&mut a_xy, a.radius(), &mut b_xy, b.radius());
        }
        (true, false) => {
            push_disc_out_of_fixed_disc(&mut a_xy, a.radius(), b_xy, b.radius());
        }
        (false, true) => {
            push_disc_out_of_fixed_disc(&mut b_xy, b.radius(), a_xy, a.radius());
        }
        (false, false) => {}
    }
    a.position = a_xy.extend(a.position.z);
    b.position = b_xy.extend(b.position.z);
}

impl Map {
    pub(crate) fn collide_actors(&mut self, ctx: &mut SimContext) {
        let count = self.slots.len();
        for i in 0..count {
            for j in (i + 1)..count {
                let (head, tail) = self.slots.split_at_mut(j);
                let (Some(a), Some(b)) = (head[i].as_mut(), tail[0].as_mut()) else {
                    continue;
                };
                if !a.is_alive() || !b.is_alive() {
                    continue;
                }
                if !cylinders_overlap(&a.cylinder(), &b.cylinder()) || ignore_each_other(a, b) {
                    continue;
                }
                separate(a, b);
                let (a_uid, b_uid) = (a.uid(), b.uid());
                self.on_collide(a_uid, Some(b_uid), ctx);
                self.on_collide(b_uid, Some(a_uid), ctx);
            }
        }
    }

    /// `uid` touched `other`, or the world when `other` is `None`.
    ///
    /// Contact damage and knockback only land on a live actor; `die_on_collide`
    /// fires either way.
    pub(crate) fn on_collide(
        &mut self,
        uid: ActorUid,
        other: Option<ActorUid>,
        ctx: &mut SimContext,
    ) {
        let Some(actor) = self.resolve(uid) else {
            return;
        };
        if !actor.is_alive() {
            return;
        }
        let definition = std::sync::Arc::clone(actor.definition());
        let push = actor.forward().with_z(0.0).normalize_or_zero() * definition.impulse_on_collide;

        if let Some(other) = other.filter(|&o| self.resolve(o).is_some_and(Actor::is_alive)) {
            if !definition.damage_on_collide.is_zero() {
                let amount = ctx.rng.roll(definition.damage_on_collide);
                self.deal_damage(other, amount, uid, ctx);
            }
            if let Some(victim) = self.resolve_mut(other) {
                victim.add_impulse(push);
            }
        }

        if definition.die_on_collide {
            self.kill(uid, ActorUid::INVALID, ctx);
        }
    }

    /// Free-standing obstacles on field maps.
    pub(crate) fn collide_actors_with_obstacles(&mut self, ctx: &mut SimContext) {
        let WorldGeometry::Field(field) = &self.geometry else {
            return;
        };
        let mut touched = Vec::new();
        for actor in self.slots.iter_mut().flatten() {
            if !actor.is_alive() || !actor.definition().collides_with_world {
                continue;
            }
            let mut hit = false;
            for obstacle in field.obstacles() {
                if !cylinders_overlap(&actor.cylinder(), &obstacle.cylinder()) {
                    continue;
                }
                let mut xy = actor.position.xy();
                if push_disc_out_of_fixed_disc(
                    &mut xy,
                    actor.radius(),
                    obstacle.position.xy(),
                    obstacle.radius(),
                ) {
                    actor.position = xy.extend(actor.position.z);
                    hit = true;
                }
            }
            if hit {
                touched.push(actor.uid());
            }
        }
        for uid in touched {
            self.on_collide(uid, None, ctx);
        }
    }

    /// Solid tiles around each actor, then floor and ceiling.
    pub(crate) fn collide_actors_with_world(&mut self, ctx: &mut SimContext) {
        let ceiling = self.settings.ceiling_height;
        let mut touched = Vec::new();
        let mut fell_out = Vec::new();

        for actor in self.slots.iter_mut().flatten() {
            if !actor.is_alive() || !actor.definition().collides_with_world {
                continue;
            }
            let mut hit = false;
            match &self.geometry {
                WorldGeometry::Tiles(grid) => {
                    let cell = actor.position.xy().floor().as_ivec2();
                    for offset in NEIGHBOURS {
                        let neighbour = cell + offset;
                        if !grid.is_solid(neighbour) {
                            continue;
                        }
                        let (min, max) = super::TileGrid::cell_bounds(neighbour);
                        let mut xy = actor.position.xy();
                        if push_disc_out_of_aabb(&mut xy, actor.radius(), min, max) {
                            actor.position = xy.extend(actor.position.z);
                            hit = true;
                        }
                    }

                    if actor.position.z < 0.0 {
                        land(actor);
                        hit = true;
                    } else if actor.position.z + actor.height() > ceiling {
                        actor.position.z = (ceiling - actor.height()).max(0.0);
                        actor.velocity.z = actor.velocity.z.min(0.0);
                        hit = true;
                    }
                }
                WorldGeometry::Field(field) => {
                    if actor.position.z < 0.0 {
                        if field.contains_xy(actor.position.xy()) {
                            land(actor);
                            hit = true;
                        } else {
                            fell_out.push(actor.uid());
                        }
                    }
                }
            }
            if hit {
                touched.push(actor.uid());
            }
        }

        for uid in touched {
            self.on_collide(uid, None, ctx);
        }
        for uid in fell_out {
            self.kill(uid, ActorUid::INVALID, ctx);
        }
    }
}

fn land(actor: &mut Actor) {
    actor.position.z = 0.0;
    actor.velocity.z = actor.velocity.z.max(0.0);
    actor.is_grounded = true;
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::geometry::EulerAngles;
    use bevy::math::{Vec2, Vec3, Vec3Swizzles};

    #[test]
    fn overlapping_actors_separate_by_exactly_the_penetration() {
        let mut map = open_map();
        let a = map.spawn("Marine", Vec3::new(5.0, 5.0, 0.0), EulerAngles::default()).unwrap();
        let b = map.spawn("Marine", Vec3::new(5.3, 5.0, 0.0), EulerAngles::default()).unwrap();
        let before_a = map.resolve(a).unwrap().position.xy();
        let before_b = map.resolve(b).unwrap().position.xy();

        map.collide_actors(&mut Harness::default().ctx());

        let after_a = map.resolve(a).unwrap().position.xy();
        let after_b = map.resolve(b).unwrap().position.xy();
        // Radii 0.25 + 0.25 at distance 0.3: penetration 0.2, split evenly.
        assert!((after_a - before_a - Vec2::new(-0.1, 0.0)).length() < 1e-5);
        assert!((after_b - before_b - Vec2::new(0.1, 0.0)).length() < 1e-5);
        assert!((after_b.distance(after_a) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn non_colliding_actor_pushes_the_other_out() {
        let mut map = open_map();
        let ghost = map.spawn("Ghost", Vec3::new(5.0, 5.0, 0.0), EulerAngles::default()).unwrap();
        let marine = map.spawn("Marine", Vec3::new(5.3, 5.0, 0.0), EulerAngles::default()).unwrap();

        map.collide_actors(&mut Harness::default().ctx());

        assert_eq!(map.resolve(ghost).unwrap().position.xy(), Vec2::new(5.0, 5.0));
        let moved = map.resolve(marine).unwrap().position.xy();
        assert!((moved.x - 5.5).abs() < 1e-5);
    }

    #[test]
    fn projectile_ignores_its_owner() {
        let mut map = open_map();
        let marine = map.spawn("Marine", Vec3::new(5.0, 5.0, 0.0), EulerAngles::default()).unwrap();
        let rocket = map.spawn("Rocket", Vec3::new(5.1, 5.0, 0.2), EulerAngles::default()).unwrap();
        map.resolve_mut(rocket).unwrap().owner = marine;

        map.collide_actors(&mut Harness::default().ctx());

        let owner = map.resolve(marine).unwrap();
        assert_eq!(owner.position.xy(), Vec2::new(5.0, 5.0));
        assert_eq!(owner.health, 100.0);
        assert!(map.resolve(rocket).unwrap().is_alive());
    }

    #[test]
    fn contact_damage_hurts_the_other_actor() {
        let mut map = open_map();
        let spike = map.spawn("Spike", Vec3::new(5.0, 5.0, 0.0), EulerAngles::default()).unwrap();
        let marine = map.spawn("Marine", Vec3::new(5.3, 5.0, 0.0), EulerAngles::default()).unwrap();

        map.collide_actors(&mut Harness::default().ctx());

        assert_eq!(map.resolve(marine).unwrap().health, 90.0);
        assert_eq!(map.resolve(spike).unwrap().health, 100.0);
    }

    #[test]
    fn solid_tiles_push_actors_out() {
        let mut map = walled_map();
        // Wall occupies cell (2, 0); stand just inside its west face.
        let uid = map.spawn("Marine", Vec3::new(1.9, 0.5, 0.0), EulerAngles::default()).unwrap();

        map.collide_actors_with_world(&mut Harness::default().ctx());

        let actor = map.resolve(uid).unwrap();
        assert!((actor.position.x - 1.75).abs() < 1e-5);
    }

    #[test]
    fn floor_and_ceiling_clamp_height() {
        let mut map = walled_map();
        let low = map.spawn("Marine", Vec3::new(0.5, 3.5, -0.4), EulerAngles::default()).unwrap();
        let high = map.spawn("Marine", Vec3::new(3.5, 3.5, 0.9), EulerAngles::default()).unwrap();
        map.resolve_mut(low).unwrap().velocity = Vec3::NEG_Z;

        map.collide_actors_with_world(&mut Harness::default().ctx());

        let low = map.resolve(low).unwrap();
        assert_eq!(low.position.z, 0.0);
        assert_eq!(low.velocity.z, 0.0);
        assert!((map.resolve(high).unwrap().position.z - 0.4).abs() < 1e-5);
    }

    #[test]
    fn projectile_dies_on_the_wall() {
        let mut map = walled_map();
        let rocket = map.spawn("Rocket", Vec3::new(1.97, 0.5, 0.3), EulerAngles::default()).unwrap();

        map.collide_actors_with_world(&mut Harness::default().ctx());

        assert!(map.resolve(rocket).unwrap().is_dead());
    }

    #[test]
    fn falling_off_the_field_kills() {
        let mut map = open_map();
        let uid = map.spawn("Marine", Vec3::new(-3.0, 5.0, -0.5), EulerAngles::default()).unwrap();

        map.collide_actors_with_world(&mut Harness::default().ctx());

        assert!(map.resolve(uid).unwrap().is_dead());
    }

    #[test]
    fn obstacles_block_actors_on_fields() {
        let mut map = open_map();
        if let super::WorldGeometry::Field(field) = &mut map.geometry {
            field.add(crate::map::StaticObstacle::rock(Vec3::new(5.0, 5.0, 0.0), 1.0));
        }
        let uid = map.spawn("Marine", Vec3::new(5.4, 5.0, 0.0), EulerAngles::default()).unwrap();

        map.collide_actors_with_obstacles(&mut Harness::default().ctx());

        // Rock radius 0.3 plus marine radius 0.25.
        assert!((map.resolve(uid).unwrap().position.x - 5.55).abs() < 1e-5);
    }
}
