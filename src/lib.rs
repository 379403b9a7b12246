//! Tile platformer movement and collision engine.
//!
//! The core (`kinematics`, `collision`, `simulation::step`) is plain data and
//! functions over a [`tilemap::TileQuery`]; the plugins wire it into a Bevy app.

pub mod collision;
pub mod components;
pub mod config;
pub mod geometry;
pub mod input;
pub mod kinematics;
pub mod physics;
pub mod player;
pub mod simulation;
pub mod tilemap;
