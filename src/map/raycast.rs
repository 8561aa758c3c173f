//! Spatial queries: raycasts and visibility.

use super::{Map, WorldGeometry};
use crate::actor::Actor;
use crate::geometry::{
    is_point_in_directed_sector_2d, nearer_impact, raycast_vs_ceiling, raycast_vs_floor,
    raycast_vs_z_cylinder, Ray3, RayImpact,
};
use crate::handle::ActorUid;
use bevy::math::{Vec3, Vec3Swizzles};

/// Outcome of a map raycast.  On a miss `distance` is the full reach and
/// `position` the end of the ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    pub did_impact: bool,
    pub distance: f32,
    pub position: Vec3,
    pub normal: Vec3,
    pub start: Vec3,
    pub forward: Vec3,
    pub max_distance: f32,
    /// Struck actor, when the ray hit one.
    pub impact_actor: Option<ActorUid>,
}

impl RaycastHit {
    fn miss(start: Vec3, forward: Vec3, max_distance: f32) -> Self {
        let forward = forward.normalize_or_zero();
        let reach = if max_distance.is_finite() {
            max_distance.max(0.0)
        } else {
            0.0
        };
        Self {
            did_impact: false,
            distance: reach,
            position: start + forward * reach,
            normal: Vec3::ZERO,
            start,
            forward,
            max_distance: reach,
            impact_actor: None,
        }
    }

    fn from_impact(ray: &Ray3, impact: Option<RayImpact>, actor: Option<ActorUid>) -> Self {
        match impact {
            Some(impact) => Self {
                did_impact: true,
                distance: impact.distance,
                position: impact.position,
                normal: impact.normal,
                start: ray.start,
                forward: ray.forward,
                max_distance: ray.max_distance,
                impact_actor: actor,
            },
            None => Self::miss(ray.start, ray.forward, ray.max_distance),
        }
    }
}

impl Map {
    /// Static geometry plus the floor, and the ceiling on tile maps.
    pub fn raycast_vs_world(&self, start: Vec3, direction: Vec3, max_distance: f32) -> RaycastHit {
        let Some(ray) = Ray3::new(start, direction, max_distance) else {
            return RaycastHit::miss(start, direction, max_distance);
        };
        let impact = match &self.geometry {
            WorldGeometry::Tiles(grid) => nearer_impact(
                nearer_impact(grid.raycast(&ray), raycast_vs_floor(&ray, 0.0)),
                raycast_vs_ceiling(&ray, self.settings.ceiling_height),
            ),
            WorldGeometry::Field(field) => {
                nearer_impact(field.raycast(&ray), raycast_vs_floor(&ray, 0.0))
            }
        };
        RaycastHit::from_impact(&ray, impact, None)
    }

    /// Live actors only; `excluding` is skipped.
    pub fn raycast_vs_actors(
        &self,
        start: Vec3,
        direction: Vec3,
        max_distance: f32,
        excluding: ActorUid,
    ) -> RaycastHit {
        let Some(ray) = Ray3::new(start, direction, max_distance) else {
            return RaycastHit::miss(start, direction, max_distance);
        };
        let mut best: Option<(RayImpact, ActorUid)> = None;
        for actor in self.actors() {
            if !actor.is_alive() || actor.uid() == excluding {
                continue;
            }
            let Some(impact) = raycast_vs_z_cylinder(&ray, &actor.cylinder()) else {
                continue;
            };
            if best.map_or(true, |(b, _)| impact.distance < b.distance) {
                best = Some((impact, actor.uid()));
            }
        }
        RaycastHit::from_impact(&ray, best.map(|(i, _)| i), best.map(|(_, uid)| uid))
    }

    /// Nearest of [`raycast_vs_world`](Self::raycast_vs_world) and
    /// [`raycast_vs_actors`](Self::raycast_vs_actors).  The actor wins only
    /// when strictly closer.
    pub fn raycast_vs_all(
        &self,
        start: Vec3,
        direction: Vec3,
        max_distance: f32,
        excluding: ActorUid,
    ) -> RaycastHit {
        let world = self.raycast_vs_world(start, direction, max_distance);
        let actors = self.raycast_vs_actors(start, direction, max_distance, excluding);
        match (world.did_impact, actors.did_impact) {
            (_, false) => world,
            (false, true) => actors,
            (true, true) if actors.distance < world.distance => actors,
            (true, true) => world,
        }
    }

    /// Nearest hostile inside the seeker's sight sector with a clear line of
    /// sight.  Invalid when there is none.
    pub fn find_closest_visible_hostile(&self, seeker: ActorUid) -> ActorUid {
        let Some(me) = self.resolve(seeker) else {
            return ActorUid::INVALID;
        };
        let def = me.definition();
        let mut closest = ActorUid::INVALID;
        let mut closest_distance_sq = f32::INFINITY;

        for other in self.actors() {
            if other.uid() == seeker
                || !other.is_alive()
                || !me.faction().is_hostile_to(other.faction())
            {
                continue;
            }
            if !is_point_in_directed_sector_2d(
                other.position.xy(),
                me.position.xy(),
                me.orientation.yaw,
                def.sight_angle,
                def.sight_radius,
            ) {
                continue;
            }
            if !self.line_of_sight_between(me, other) {
                continue;
            }
            let distance_sq = me.position.distance_squared(other.position);
            if distance_sq < closest_distance_sq {
                closest_distance_sq = distance_sq;
                closest = other.uid();
            }
        }
        closest
    }

    /// True when a world ray from the seeker's eye toward `target` travels at
    /// least the horizontal distance between them.
    pub fn has_line_of_sight(&self, seeker: ActorUid, target: ActorUid) -> bool {
        match (self.resolve(seeker), self.resolve(target)) {
            (Some(me), Some(other)) => self.line_of_sight_between(me, other),
            _ => false,
        }
    }

    fn line_of_sight_between(&self, me: &Actor, other: &Actor) -> bool {
        let offset = other.position - me.position;
        let needed = offset.xy().length();
        if needed <= f32::EPSILON {
            return true;
        }
        let hit = self.raycast_vs_world(me.eye_position(), offset, me.definition().sight_radius);
        hit.distance * hit.distance >= needed * needed
    }
}
