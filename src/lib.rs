//! Simulation core for a first-person arena shooter.
//!
//! Actors live in a generational slot registry owned by the [`map::Map`];
//! controllers (player input or AI) possess them through handles, weapons
//! resolve into hitscan rays, projectiles and melee sweeps, and a fixed
//! per-tick pipeline moves, collides and prunes everything.  The
//! [`simulation::SimulationPlugin`] drives the core from a Bevy app.

pub mod actor;
pub mod ai;
pub mod clock;
pub mod config;
pub mod constants;
pub mod controller;
pub mod definitions;
pub mod effects;
pub mod error;
pub mod geometry;
pub mod handle;
pub mod map;
pub mod rng;
pub mod simulation;
pub mod weapon;
