//! Centralised simulation and gameplay constants.
//!
//! Runtime-tunable values are mirrored in [`crate::config::SimConfig`]; the
//! constants here are the authoritative defaults it falls back to.  Values that
//! describe fixed geometry of the actor model (eye offsets, pitch limits) are
//! not configurable.

// ── Physics ───────────────────────────────────────────────────────────────────

/// Downward acceleration applied to an actor with `gravity_scale = 1.0`
/// (map units / s²).
///
/// Most definitions ship with `gravity_scale = 0.0`; only lobbed projectiles
/// and ragdoll-ish props opt in.
pub const GRAVITY: f32 = 100.0;

/// Height of the ceiling plane on bounded tile maps (map units).
///
/// The floor is always `z = 0`.  Actors taller than this are clamped flat
/// against the floor.
pub const CEILING_HEIGHT: f32 = 1.0;

// ── Orientation ───────────────────────────────────────────────────────────────

/// Lowest pitch (degrees, looking up) any actor may hold.
pub const PITCH_MIN_DEGREES: f32 = -85.0;

/// Highest pitch while standing on the floor.  Prevents a grounded actor from
/// staring straight down through its own feet.
pub const PITCH_MAX_GROUNDED_DEGREES: f32 = 45.0;

/// Highest pitch while airborne.
pub const PITCH_MAX_AIRBORNE_DEGREES: f32 = 85.0;

// ── Actor Geometry ────────────────────────────────────────────────────────────

/// Small forward nudge applied to the eye so rays never start exactly on the
/// actor's own axis.
pub const EYE_FORWARD_OFFSET: f32 = 0.01;

/// Fraction of the actor height the projectile muzzle sits below the eye.
pub const MUZZLE_DROP_FRACTION: f32 = 0.1;

/// Extra forward distance between the eye-ray origin and the muzzle.
pub const MUZZLE_FORWARD_OFFSET: f32 = 0.1;

// ── AI ────────────────────────────────────────────────────────────────────────

/// Squared 2D distance under which an engaging AI slows to walk speed.
pub const AI_WALK_PROXIMITY_SQ: f32 = 4.0;

/// Half-angle (degrees) of the cone in which an AI will pull the trigger.
///
/// Outside this cone it keeps turning and closing distance instead.
pub const AI_FIRING_CONE_DEGREES: f32 = 15.0;

// ── Animation ─────────────────────────────────────────────────────────────────

/// How long one-shot animation states (attack, hurt) are held before the actor
/// falls back to its walk cycle (seconds).
pub const ONE_SHOT_ANIMATION_SECS: f32 = 0.35;

// ── Registry ──────────────────────────────────────────────────────────────────

/// Number of addressable actor slots.
///
/// Slot indices are 16 bits wide; index `0xFFFF` is never minted so that the
/// all-ones handle stays reserved as the invalid sentinel.
pub const MAX_ACTOR_SLOTS: usize = 0xFFFF;

// ── Procedural Field ──────────────────────────────────────────────────────────

/// Spacing between generated cliff rocks along the field border.
pub const FIELD_CLIFF_SPACING: usize = 4;

/// Width of the border band kept clear of trees and rocks.
pub const FIELD_INTERIOR_MARGIN: usize = 10;

/// Probability that an interior cell receives a tree.
pub const FIELD_TREE_CHANCE: f32 = 0.08;

/// Probability that an interior cell receives a rock.
pub const FIELD_ROCK_CHANCE: f32 = 0.08;

/// Vertical offset of border cliffs so they read as rising out of the ground.
pub const FIELD_CLIFF_SINK: f32 = -1.5;

// ── Runtime ───────────────────────────────────────────────────────────────────

/// Default seed for the simulation random source.
pub const DEFAULT_RNG_SEED: u64 = 0x5A1_F00D;

/// Definition name of the actor spawned for (and respawned under) the player.
pub const DEFAULT_PLAYER_ACTOR: &str = "Marine";

/// Default path of the definition tables.
pub const DEFAULT_DEFINITIONS_PATH: &str = "assets/definitions.toml";

/// Default map loaded by the binary.
pub const DEFAULT_MAP_NAME: &str = "arena";
