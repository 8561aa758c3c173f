//! Static obstacles and the procedural field they are scattered over.
//!
//! Obstacles are fixed vertical cylinders with no controller, health or
//! weapons.  A field map is open terrain: cliff rocks ring the border and
//! trees and rocks are sprinkled through the interior.

use crate::constants::*;
use crate::geometry::{nearer_impact, raycast_vs_z_cylinder, Ray3, RayImpact, ZCylinder};
use crate::rng::SimRng;
use bevy::math::{Vec2, Vec3, Vec3Swizzles};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleKind {
    Tree,
    Rock,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticObstacle {
    pub kind: ObstacleKind,
    pub position: Vec3,
    pub scale: f32,
}

impl StaticObstacle {
    pub fn tree(position: Vec3, scale: f32) -> Self {
        Self {
            kind: ObstacleKind::Tree,
            position,
            scale,
        }
    }

    pub fn rock(position: Vec3, scale: f32) -> Self {
        Self {
            kind: ObstacleKind::Rock,
            position,
            scale,
        }
    }

    pub fn radius(&self) -> f32 {
        match self.kind {
            ObstacleKind::Tree => self.scale * 0.2,
            ObstacleKind::Rock => self.scale * 0.3,
        }
    }

    pub fn height(&self) -> f32 {
        match self.kind {
            ObstacleKind::Tree => self.scale,
            ObstacleKind::Rock => self.scale * 0.5,
        }
    }

    pub fn cylinder(&self) -> ZCylinder {
        ZCylinder::new(self.position, self.radius(), self.height())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObstacleField {
    size: Vec2,
    obstacles: Vec<StaticObstacle>,
}

impl ObstacleField {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            obstacles: Vec::new(),
        }
    }

    /// Cliffs along the border, then trees, then rocks.
    pub fn generate(width: u32, height: u32, rng: &mut SimRng) -> Self {
        let mut field = Self::new(width as f32, height as f32);
        let (w, h) = (width as usize, height as usize);
        let last_x = w.saturating_sub(1) / FIELD_CLIFF_SPACING * FIELD_CLIFF_SPACING;
        let last_y = h.saturating_sub(1) / FIELD_CLIFF_SPACING * FIELD_CLIFF_SPACING;

        for y in (0..h).step_by(FIELD_CLIFF_SPACING) {
            for x in (0..w).step_by(FIELD_CLIFF_SPACING) {
                if x == 0 || x == last_x || y == 0 || y == last_y {
                    let scale = rng.float_in_range(10.0, 15.0);
                    field.add(StaticObstacle::rock(
                        Vec3::new(x as f32, y as f32, FIELD_CLIFF_SINK),
                        scale,
                    ));
                }
            }
        }

        let interior_x = FIELD_INTERIOR_MARGIN..w.saturating_sub(FIELD_INTERIOR_MARGIN);
        let interior_y = FIELD_INTERIOR_MARGIN..h.saturating_sub(FIELD_INTERIOR_MARGIN);
        for y in interior_y.clone() {
            for x in interior_x.clone() {
                let spot = Vec2::new(x as f32, y as f32);
                if rng.chance(FIELD_TREE_CHANCE) && field.is_valid_spawn_location(spot) {
                    field.add(StaticObstacle::tree(spot.extend(0.0), 1.0));
                }
            }
        }
        for y in interior_y {
            for x in interior_x.clone() {
                let spot = Vec2::new(x as f32, y as f32);
                if rng.chance(FIELD_ROCK_CHANCE) && field.is_valid_spawn_location(spot) {
                    let scale = rng.float_in_range(0.25, 2.5);
                    field.add(StaticObstacle::rock(spot.extend(0.0), scale));
                }
            }
        }
        field
    }

    pub fn add(&mut self, obstacle: StaticObstacle) {
        self.obstacles.push(obstacle);
    }

    pub fn obstacles(&self) -> &[StaticObstacle] {
        &self.obstacles
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Inside the playable XY rectangle.
    pub fn contains_xy(&self, point: Vec2) -> bool {
        point.x >= 0.0 && point.y >= 0.0 && point.x <= self.size.x && point.y <= self.size.y
    }

    /// Not inside any obstacle's footprint.
    pub fn is_valid_spawn_location(&self, point: Vec2) -> bool {
        self.obstacles
            .iter()
            .all(|o| o.position.xy().distance_squared(point) >= o.radius() * o.radius())
    }

    pub fn raycast(&self, ray: &Ray3) -> Option<RayImpact> {
        self.obstacles
            .iter()
            .fold(None, |best, o| nearer_impact(best, raycast_vs_z_cylinder(ray, &o.cylinder())))
    }
}
