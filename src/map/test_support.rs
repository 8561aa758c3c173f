//! Shared fixtures for map, combat and AI tests.

use super::{Map, MapSettings, ObstacleField, SpawnPoint, TileGrid, WorldGeometry};
use crate::definitions::{
    ActorDefinition, DefinitionLibrary, Faction, FloatRange, MapDefinition, MapLayout, SpawnInfo,
    SpawnPointInfo, TileDefinition, WeaponDefinition,
};
use crate::effects::{EffectQueue, SimContext};
use crate::geometry::EulerAngles;
use crate::rng::SimRng;
use bevy::math::Vec3;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const SPAWN_POINT: Vec3 = Vec3::new(2.0, 2.0, 0.0);

/// Owns the collaborators a [`SimContext`] borrows.
pub struct Harness {
    pub rng: SimRng,
    pub effects: EffectQueue,
}

impl Default for Harness {
    fn default() -> Self {
        Self {
            rng: SimRng::seeded(7),
            effects: EffectQueue::default(),
        }
    }
}

impl Harness {
    pub fn ctx(&mut self) -> SimContext<'_> {
        SimContext::new(&mut self.rng, &mut self.effects)
    }
}

pub fn tick(map: &mut Map, dt: f32) {
    map.tick(dt, &mut Harness::default().ctx());
}

fn fixed(amount: f32) -> FloatRange {
    FloatRange::new(amount, amount)
}

pub fn sample_library() -> DefinitionLibrary {
    let mut library = DefinitionLibrary::default();

    library.insert_weapon(WeaponDefinition {
        name: "Pistol".into(),
        ray_count: 1,
        ray_range: 20.0,
        ray_damage: fixed(10.0),
        ray_impulse: 1.0,
        fire_sound: Some("pistol".into()),
        ..Default::default()
    });
    library.insert_weapon(WeaponDefinition {
        name: "Launcher".into(),
        refire_time: 1.0,
        projectile_count: 1,
        projectile_actor: Some("Rocket".into()),
        projectile_speed: 10.0,
        ..Default::default()
    });
    library.insert_weapon(WeaponDefinition {
        name: "Claw".into(),
        refire_time: 1.0,
        melee_count: 1,
        melee_arc: 90.0,
        melee_range: 2.0,
        melee_damage: fixed(15.0),
        melee_impulse: 2.0,
        ..Default::default()
    });
    library.insert_weapon(WeaponDefinition {
        name: "Blaster".into(),
        ray_count: 1,
        ray_range: 3.0,
        ray_damage: fixed(5.0),
        ..Default::default()
    });

    library.insert_actor(ActorDefinition {
        name: "Marine".into(),
        faction: Faction::Marine,
        can_be_possessed: true,
        weapons: vec!["Pistol".into(), "Launcher".into()],
        hurt_sound: Some("marine_hurt".into()),
        death_sound: Some("marine_death".into()),
        ..Default::default()
    });
    library.insert_actor(ActorDefinition {
        name: "Imp".into(),
        faction: Faction::Demon,
        health: 30.0,
        can_be_possessed: true,
        corpse_lifetime: 1.0,
        ai_enabled: true,
        sight_radius: 10.0,
        turn_speed: 180.0,
        weapons: vec!["Claw".into()],
        hurt_sound: Some("imp_hurt".into()),
        see_sound: Some("imp_see".into()),
        ..Default::default()
    });
    library.insert_actor(ActorDefinition {
        name: "Sentry".into(),
        faction: Faction::Demon,
        ai_enabled: true,
        sight_radius: 10.0,
        sight_angle: 90.0,
        turn_speed: 180.0,
        weapons: vec!["Blaster".into()],
        see_sound: Some("sentry_see".into()),
        ..Default::default()
    });
    library.insert_actor(ActorDefinition {
        name: "Target".into(),
        health: 50.0,
        ..Default::default()
    });
    library.insert_actor(ActorDefinition {
        name: "Rocket".into(),
        health: 1.0,
        physics_radius: 0.05,
        physics_height: 0.05,
        drag: 0.0,
        die_on_collide: true,
        explode_on_die: true,
        explosion_radius: 1.5,
        explosion_damage: fixed(50.0),
        impulse_on_explode: 4.0,
        ..Default::default()
    });
    library.insert_actor(ActorDefinition {
        name: "Barrel".into(),
        health: 10.0,
        explode_on_die: true,
        explosion_radius: 2.0,
        explosion_damage: fixed(20.0),
        impulse_on_explode: 5.0,
        ..Default::default()
    });
    library.insert_actor(ActorDefinition {
        name: "Puff".into(),
        die_on_spawn: true,
        corpse_lifetime: 0.5,
        collides_with_world: false,
        collides_with_actors: false,
        ..Default::default()
    });
    library.insert_actor(ActorDefinition {
        name: "Ghost".into(),
        collides_with_actors: false,
        ..Default::default()
    });
    library.insert_actor(ActorDefinition {
        name: "Spike".into(),
        faction: Faction::Demon,
        damage_on_collide: fixed(10.0),
        ..Default::default()
    });

    library.insert_tile(TileDefinition {
        name: "Wall".into(),
        is_solid: true,
        sprite_coords: [1, 0],
    });
    library.insert_tile(TileDefinition {
        name: "Floor".into(),
        is_solid: false,
        sprite_coords: [0, 0],
    });
    library.insert_map(MapDefinition {
        name: "box".into(),
        layout: MapLayout::Tiles {
            rows: walled_rows(),
            legend: legend(),
        },
        spawn_points: vec![SpawnPointInfo {
            position: SPAWN_POINT.to_array(),
            yaw: 0.0,
        }],
        actors: vec![SpawnInfo {
            actor: "Imp".into(),
            position: [3.5, 3.5, 0.0],
            yaw: 180.0,
        }],
    });
    library
}

/// 5 × 5 floor with one wall at cell (2, 0).
fn walled_rows() -> Vec<String> {
    ["..#..", ".....", ".....", ".....", "....."]
        .iter()
        .map(|row| row.to_string())
        .collect()
}

fn legend() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("#".to_string(), "Wall".to_string()),
        (".".to_string(), "Floor".to_string()),
    ])
}

fn spawn_points() -> Vec<SpawnPoint> {
    vec![SpawnPoint {
        position: SPAWN_POINT,
        orientation: EulerAngles::default(),
    }]
}

/// Empty 64 × 64 field: no obstacles, no ceiling.
pub fn open_map() -> Map {
    Map::new(
        "open",
        Arc::new(sample_library()),
        MapSettings::default(),
        WorldGeometry::Field(ObstacleField::new(64.0, 64.0)),
        spawn_points(),
    )
}

/// The 5 × 5 tile box with a wall at (2, 0).
pub fn walled_map() -> Map {
    let library = sample_library();
    let grid = TileGrid::from_rows("walled", &walled_rows(), &legend(), &library)
        .expect("fixture rows are valid");
    Map::new(
        "walled",
        Arc::new(library),
        MapSettings::default(),
        WorldGeometry::Tiles(grid),
        spawn_points(),
    )
}
