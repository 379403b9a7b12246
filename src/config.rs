use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// How directional input drives horizontal velocity.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalMode {
    /// Velocity is set straight to `±move_speed`; no input stops the actor.
    #[default]
    HardSet,
    /// `move_force * dt` is added each step; drag decays the speed when idle.
    Accumulate,
}

/// Deepest fall, in rows below the map, that a config may allow.
pub const MAX_FALL_TOLERANCE: i32 = 1024;

/// Physics constants (as a resource so they can be tuned)
#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Vertical acceleration in units/s², negative pulls down.
    pub gravity: f32,
    pub move_speed: f32,
    pub move_force: f32,
    pub horizontal_mode: HorizontalMode,
    pub jump_impulse: f32,
    /// Upward speed kept once the jump button is released early.
    pub jump_cutoff: f32,
    /// Horizontal velocity multiplier applied every step.
    pub drag: f32,
    pub min_velocity: [f32; 2],
    pub max_velocity: [f32; 2],
    /// Largest time step integrated at once, in seconds.
    pub max_step: f32,
    /// Horizontal shrink of the collision box on each side.
    pub collision_inset: f32,
    /// Rows below the map bottom before the actor counts as fallen.
    pub fall_tolerance: i32,
    /// Fraction of the map width that finishes the level.
    pub goal_fraction: f32,
    pub player_size: [f32; 2],
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: -450.0,
            move_speed: 120.0,
            move_force: 800.0,
            horizontal_mode: HorizontalMode::HardSet,
            jump_impulse: 310.0,
            jump_cutoff: 150.0,
            drag: 0.9,
            min_velocity: [-120.0, -450.0],
            max_velocity: [120.0, 250.0],
            max_step: 0.02,
            collision_inset: 2.0,
            fall_tolerance: 1,
            goal_fraction: 0.95,
            player_size: [18.0, 26.0],
        }
    }
}

impl PhysicsConfig {
    pub fn min_velocity(&self) -> Vec2 {
        Vec2::from_array(self.min_velocity)
    }

    pub fn max_velocity(&self) -> Vec2 {
        Vec2::from_array(self.max_velocity)
    }

    pub fn player_size(&self) -> Vec2 {
        Vec2::from_array(self.player_size)
    }

    pub fn validate(&self) -> Result<(), String> {
        let scalars = [
            ("gravity", self.gravity),
            ("move_speed", self.move_speed),
            ("move_force", self.move_force),
            ("jump_impulse", self.jump_impulse),
            ("jump_cutoff", self.jump_cutoff),
        ];
        for (name, value) in scalars {
            if !value.is_finite() {
                return Err(format!("{name} must be finite, got {value}"));
            }
        }
        if !(self.max_step.is_finite() && self.max_step > 0.0) {
            return Err(format!("max_step must be positive, got {}", self.max_step));
        }
        if !(0.0..=1.0).contains(&self.drag) {
            return Err(format!("drag must be within 0..=1, got {}", self.drag));
        }
        for axis in 0..2 {
            if self.min_velocity[axis] > self.max_velocity[axis] {
                return Err(format!(
                    "min_velocity {:?} exceeds max_velocity {:?}",
                    self.min_velocity, self.max_velocity
                ));
            }
        }
        let [w, h] = self.player_size;
        if w <= 0.0 || h <= 0.0 {
            return Err(format!("player_size must be positive, got {:?}", self.player_size));
        }
        if self.collision_inset < 0.0 || self.collision_inset * 2.0 >= w {
            return Err(format!(
                "collision_inset {} leaves no collision box for width {}",
                self.collision_inset, w
            ));
        }
        if !(self.goal_fraction > 0.0 && self.goal_fraction <= 1.0) {
            return Err(format!(
                "goal_fraction must be within 0..=1, got {}",
                self.goal_fraction
            ));
        }
        if !(0..=MAX_FALL_TOLERANCE).contains(&self.fall_tolerance) {
            return Err(format!(
                "fall_tolerance must be within 0..={MAX_FALL_TOLERANCE}, got {}",
                self.fall_tolerance
            ));
        }
        Ok(())
    }

    /// Parse a (possibly partial) JSON override on top of the defaults.
    pub fn from_json_str(contents: &str) -> Result<Self, String> {
        let config: PhysicsConfig =
            serde_json::from_str(contents).map_err(|e| format!("invalid physics config: {e}"))?;
        config.validate()?;
        Ok(config)
    }
}
