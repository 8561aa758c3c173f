//! Immutable definition tables for actors, weapons, tiles and maps.
//!
//! Definitions are authored elsewhere and handed to the core already parsed;
//! here they arrive as TOML.  Every table is keyed by name and shared through
//! `Arc`, so an actor holds a cheap read-only reference to its template for as
//! long as it lives.
//!
//! ## File layout
//!
//! ```toml
//! [[actor]]
//! name = "Imp"
//! faction = "demon"
//! weapons = ["ImpClaw"]
//! ai_enabled = true
//!
//! [[weapon]]
//! name = "ImpClaw"
//! melee_count = 1
//! melee_damage = [4.0, 8.0]
//! ```
//!
//! All cross references (actor → weapon, weapon → projectile actor, map →
//! tile, map → actor) are checked by [`DefinitionLibrary::validate`] when the
//! library is built, so an unknown name is a load-time failure and never a
//! tick-time one.

use crate::error::{SimError, SimResult};
use bevy::math::Vec3;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

// ── Scalars ───────────────────────────────────────────────────────────────────

/// Closed interval used for rolled damage values.  Authored as `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(from = "[f32; 2]")]
pub struct FloatRange {
    pub min: f32,
    pub max: f32,
}

impl FloatRange {
    pub const ZERO: FloatRange = FloatRange { min: 0.0, max: 0.0 };

    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// True when the range can never roll a non-zero value.
    pub fn is_zero(&self) -> bool {
        self.min == 0.0 && self.max == 0.0
    }
}

impl From<[f32; 2]> for FloatRange {
    fn from([min, max]: [f32; 2]) -> Self {
        Self { min, max }
    }
}

/// Coarse allegiance tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Faction {
    /// Belongs to nobody: never targeted, never counted as hostile.
    #[default]
    Neutral,
    Marine,
    Demon,
}

impl Faction {
    /// Two factions are hostile when they differ and neither is neutral.
    pub fn is_hostile_to(self, other: Faction) -> bool {
        self != other && self != Faction::Neutral && other != Faction::Neutral
    }
}

// ── Actor ─────────────────────────────────────────────────────────────────────

/// Template every actor is spawned from.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ActorDefinition {
    pub name: String,
    pub faction: Faction,
    pub health: f32,
    pub can_be_possessed: bool,
    pub die_on_spawn: bool,
    pub corpse_lifetime: f32,

    // Collision
    pub physics_radius: f32,
    pub physics_height: f32,
    pub collides_with_world: bool,
    pub collides_with_actors: bool,
    pub simulated: bool,
    pub die_on_collide: bool,
    pub damage_on_collide: FloatRange,
    pub impulse_on_collide: f32,

    // Movement
    pub walk_speed: f32,
    pub run_speed: f32,
    /// Degrees per second.
    pub turn_speed: f32,
    pub drag: f32,
    pub gravity_scale: f32,

    // Camera and combat
    pub eye_height: f32,
    pub weapon_height: f32,
    pub weapons: Vec<String>,

    // Perception
    pub ai_enabled: bool,
    pub sight_radius: f32,
    /// Full aperture of the sight sector, degrees.
    pub sight_angle: f32,

    // Explosion
    pub explode_on_die: bool,
    pub explosion_radius: f32,
    pub explosion_damage: FloatRange,
    pub impulse_on_explode: f32,

    // Audio cues
    pub hurt_sound: Option<String>,
    pub death_sound: Option<String>,
    pub see_sound: Option<String>,
}

impl Default for ActorDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            faction: Faction::Neutral,
            health: 100.0,
            can_be_possessed: false,
            die_on_spawn: false,
            corpse_lifetime: 0.0,
            physics_radius: 0.25,
            physics_height: 0.6,
            collides_with_world: true,
            collides_with_actors: true,
            simulated: true,
            die_on_collide: false,
            damage_on_collide: FloatRange::ZERO,
            impulse_on_collide: 0.0,
            walk_speed: 4.0,
            run_speed: 10.0,
            turn_speed: 90.0,
            drag: 3.0,
            gravity_scale: 0.0,
            eye_height: 0.5,
            weapon_height: 0.45,
            weapons: Vec::new(),
            ai_enabled: false,
            sight_radius: 64.0,
            sight_angle: 120.0,
            explode_on_die: false,
            explosion_radius: 0.0,
            explosion_damage: FloatRange::ZERO,
            impulse_on_explode: 0.0,
            hurt_sound: None,
            death_sound: None,
            see_sound: None,
        }
    }
}

// ── Weapon ────────────────────────────────────────────────────────────────────

/// Template every weapon instance is created from.
///
/// A single weapon may combine hitscan rays, projectiles and melee sweeps; each
/// part is skipped when its count is zero.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WeaponDefinition {
    pub name: String,
    /// Seconds between shots.  Zero or less means unthrottled.
    pub refire_time: f32,

    pub ray_count: u32,
    /// Maximum deviation from the aim direction, degrees.
    pub ray_cone: f32,
    pub ray_range: f32,
    pub ray_damage: FloatRange,
    pub ray_impulse: f32,

    pub projectile_count: u32,
    pub projectile_actor: Option<String>,
    pub projectile_cone: f32,
    pub projectile_speed: f32,

    pub melee_count: u32,
    /// Full aperture of the melee sector, degrees.
    pub melee_arc: f32,
    pub melee_range: f32,
    pub melee_damage: FloatRange,
    pub melee_impulse: f32,

    /// Pitch kick applied to player-held weapons, degrees.
    pub recoil_angle: f32,
    pub fire_sound: Option<String>,
}

impl Default for WeaponDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            refire_time: 0.5,
            ray_count: 0,
            ray_cone: 0.0,
            ray_range: 0.0,
            ray_damage: FloatRange::ZERO,
            ray_impulse: 0.0,
            projectile_count: 0,
            projectile_actor: None,
            projectile_cone: 0.0,
            projectile_speed: 0.0,
            melee_count: 0,
            melee_arc: 90.0,
            melee_range: 0.0,
            melee_damage: FloatRange::ZERO,
            melee_impulse: 0.0,
            recoil_angle: 2.0,
            fire_sound: None,
        }
    }
}

// ── Tiles and maps ────────────────────────────────────────────────────────────

/// One kind of grid cell.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TileDefinition {
    pub name: String,
    pub is_solid: bool,
    /// Sprite-sheet cell, carried through for renderers.
    pub sprite_coords: [u32; 2],
}

/// Where an actor enters the world when a map is loaded.
#[derive(Debug, Clone, Deserialize)]
pub struct SpawnInfo {
    pub actor: String,
    pub position: [f32; 3],
    #[serde(default)]
    pub yaw: f32,
}

/// A player (re)spawn location.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SpawnPointInfo {
    pub position: [f32; 3],
    #[serde(default)]
    pub yaw: f32,
}

impl SpawnPointInfo {
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }
}

impl SpawnInfo {
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }
}

/// Static geometry of a map.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MapLayout {
    /// Bounded grid of tiles.  `rows[0]` is the `y = 0` row; each character is
    /// looked up in `legend`.
    Tiles {
        rows: Vec<String>,
        legend: BTreeMap<String, String>,
    },
    /// Open, unbounded-height terrain sprinkled with procedurally placed trees
    /// and rocks.
    Field { width: u32, height: u32 },
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapDefinition {
    pub name: String,
    pub layout: MapLayout,
    #[serde(default)]
    pub spawn_points: Vec<SpawnPointInfo>,
    #[serde(default)]
    pub actors: Vec<SpawnInfo>,
}

// ── Library ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct DefinitionFile {
    #[serde(default, rename = "actor")]
    actors: Vec<ActorDefinition>,
    #[serde(default, rename = "weapon")]
    weapons: Vec<WeaponDefinition>,
    #[serde(default, rename = "tile")]
    tiles: Vec<TileDefinition>,
    #[serde(default, rename = "map")]
    maps: Vec<MapDefinition>,
}

/// Name-indexed store of every loaded definition.
#[derive(Debug, Default, Clone)]
pub struct DefinitionLibrary {
    actors: HashMap<String, Arc<ActorDefinition>>,
    weapons: HashMap<String, Arc<WeaponDefinition>>,
    tiles: HashMap<String, Arc<TileDefinition>>,
    maps: HashMap<String, Arc<MapDefinition>>,
}

impl DefinitionLibrary {
    /// Parse and validate a library from TOML text.
    pub fn from_toml_str(text: &str) -> SimResult<Self> {
        Self::parse(text, "<inline>")
    }

    /// Read, parse and validate a library from a file.
    pub fn load(path: &str) -> SimResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| SimError::DefinitionParse {
            source_name: path.to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&text, path)
    }

    fn parse(text: &str, source_name: &str) -> SimResult<Self> {
        let file: DefinitionFile =
            toml::from_str(text).map_err(|e| SimError::DefinitionParse {
                source_name: source_name.to_string(),
                message: e.to_string(),
            })?;

        let mut library = Self::default();
        for def in file.actors {
            library.insert_actor(def);
        }
        for def in file.weapons {
            library.insert_weapon(def);
        }
        for def in file.tiles {
            library.insert_tile(def);
        }
        for def in file.maps {
            library.insert_map(def);
        }
        library.validate()?;
        Ok(library)
    }

    pub fn insert_actor(&mut self, def: ActorDefinition) {
        self.actors.insert(def.name.clone(), Arc::new(def));
    }

    pub fn insert_weapon(&mut self, def: WeaponDefinition) {
        self.weapons.insert(def.name.clone(), Arc::new(def));
    }

    pub fn insert_tile(&mut self, def: TileDefinition) {
        self.tiles.insert(def.name.clone(), Arc::new(def));
    }

    pub fn insert_map(&mut self, def: MapDefinition) {
        self.maps.insert(def.name.clone(), Arc::new(def));
    }

    pub fn actor(&self, name: &str) -> SimResult<&Arc<ActorDefinition>> {
        self.actors
            .get(name)
            .ok_or_else(|| SimError::UnknownActorDefinition {
                name: name.to_string(),
            })
    }

    pub fn weapon(&self, name: &str) -> SimResult<&Arc<WeaponDefinition>> {
        self.weapons
            .get(name)
            .ok_or_else(|| SimError::UnknownWeaponDefinition {
                name: name.to_string(),
            })
    }

    pub fn tile(&self, name: &str) -> SimResult<&Arc<TileDefinition>> {
        self.tiles
            .get(name)
            .ok_or_else(|| SimError::UnknownTileDefinition {
                name: name.to_string(),
            })
    }

    pub fn map(&self, name: &str) -> SimResult<&Arc<MapDefinition>> {
        self.maps
            .get(name)
            .ok_or_else(|| SimError::UnknownMapDefinition {
                name: name.to_string(),
            })
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    pub fn weapon_count(&self) -> usize {
        self.weapons.len()
    }

    /// Resolve every name an actor definition refers to.
    pub fn weapons_for(&self, actor: &ActorDefinition) -> SimResult<Vec<Arc<WeaponDefinition>>> {
        actor
            .weapons
            .iter()
            .map(|name| self.weapon(name).cloned())
            .collect()
    }

    /// Check every cross reference between tables.
    pub fn validate(&self) -> SimResult<()> {
        for actor in self.actors.values() {
            self.weapons_for(actor)?;
        }
        for weapon in self.weapons.values() {
            if let Some(projectile) = &weapon.projectile_actor {
                self.actor(projectile)?;
            } else if weapon.projectile_count > 0 {
                return Err(SimError::UnknownActorDefinition {
                    name: format!("<projectile of {}>", weapon.name),
                });
            }
        }
        for map in self.maps.values() {
            if let MapLayout::Tiles { legend, .. } = &map.layout {
                for tile in legend.values() {
                    self.tile(tile)?;
                }
            }
            for spawn in &map.actors {
                self.actor(&spawn.actor)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r####"
        [[actor]]
        name = "Imp"
        faction = "demon"
        health = 40.0
        weapons = ["Claw"]
        damage_on_collide = [2.0, 5.0]

        [[weapon]]
        name = "Claw"
        melee_count = 1
        melee_range = 1.5
        melee_damage = [4.0, 8.0]

        [[tile]]
        name = "Wall"
        is_solid = true

        [[tile]]
        name = "Floor"

        [[map]]
        name = "box"
        [map.layout]
        kind = "tiles"
        rows = ["###", "#.#", "###"]
        [map.layout.legend]
        "#" = "Wall"
        "." = "Floor"
    "####;

    #[test]
    fn parses_tables_and_applies_defaults() {
        let library = DefinitionLibrary::from_toml_str(SAMPLE).unwrap();
        let imp = library.actor("Imp").unwrap();
        assert_eq!(imp.faction, Faction::Demon);
        assert_eq!(imp.health, 40.0);
        assert_eq!(imp.damage_on_collide, FloatRange::new(2.0, 5.0));
        assert_eq!(imp.walk_speed, 4.0);
        assert_eq!(imp.turn_speed, 90.0);

        let claw = library.weapon("Claw").unwrap();
        assert_eq!(claw.melee_arc, 90.0);
        assert_eq!(claw.melee_damage, FloatRange::new(4.0, 8.0));
        assert!(library.map("box").is_ok());
    }

    #[test]
    fn unknown_weapon_reference_fails_at_load() {
        let text = r##"
            [[actor]]
            name = "Imp"
            weapons = ["Plasma"]
        "##;
        let err = DefinitionLibrary::from_toml_str(text).unwrap_err();
        assert_eq!(
            err,
            SimError::UnknownWeaponDefinition {
                name: "Plasma".to_string()
            }
        );
    }

    #[test]
    fn unknown_map_name_is_reported_as_a_map() {
        let library = DefinitionLibrary::from_toml_str(SAMPLE).unwrap();
        assert_eq!(
            library.map("arena").unwrap_err(),
            SimError::UnknownMapDefinition {
                name: "arena".to_string()
            }
        );
        assert_eq!(
            library.tile("Lava").unwrap_err().to_string(),
            "unknown tile definition 'Lava'"
        );
    }

    #[test]
    fn projectile_weapon_without_actor_is_rejected() {
        let text = r##"
            [[weapon]]
            name = "Launcher"
            projectile_count = 1
        "##;
        assert!(DefinitionLibrary::from_toml_str(text).is_err());
    }

    #[test]
    fn malformed_toml_reports_parse_error() {
        let err = DefinitionLibrary::from_toml_str("[[actor]\nname = ").unwrap_err();
        assert!(matches!(err, SimError::DefinitionParse { .. }));
    }

    #[test]
    fn neutral_is_never_hostile() {
        assert!(Faction::Marine.is_hostile_to(Faction::Demon));
        assert!(!Faction::Marine.is_hostile_to(Faction::Marine));
        assert!(!Faction::Neutral.is_hostile_to(Faction::Demon));
        assert!(!Faction::Demon.is_hostile_to(Faction::Neutral));
    }
}
