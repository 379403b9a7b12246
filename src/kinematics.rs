use crate::components::{Actor, Facing};
use crate::config::{HorizontalMode, PhysicsConfig};
use bevy::math::Vec2;

/// Per-frame input snapshot for one actor.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct InputState {
    pub moving_left: bool,
    pub moving_right: bool,
    pub jump_held: bool,
}

impl InputState {
    /// Opposite directions held together cancel out.
    pub fn direction(&self) -> Facing {
        match (self.moving_left, self.moving_right) {
            (true, false) => Facing::Left,
            (false, true) => Facing::Right,
            _ => Facing::Idle,
        }
    }
}

/// Caps a frame's elapsed time. Long frames would let the actor pass through thin
/// tiles, so the cap applies before any integration. Negative or NaN input is 0.
pub fn clamp_step(dt: f32, max_step: f32) -> f32 {
    if dt > 0.0 {
        dt.min(max_step)
    } else {
        0.0
    }
}

pub fn apply_gravity(velocity: &mut Vec2, gravity: f32, dt: f32) {
    velocity.y += gravity * dt;
}

pub fn apply_drag(vx: &mut f32, drag: f32) {
    *vx *= drag;
}

/// Starts a jump when grounded; otherwise trims the ascent to `cutoff` once the button
/// is released. Returns whether a jump started.
pub fn try_jump(
    velocity: &mut Vec2,
    on_ground: &mut bool,
    jump_held: bool,
    impulse: f32,
    cutoff: f32,
) -> bool {
    if jump_held && *on_ground {
        velocity.y += impulse;
        *on_ground = false;
        return true;
    }
    if !jump_held && velocity.y > cutoff {
        velocity.y = cutoff;
    }
    false
}

pub fn apply_horizontal_input(vx: &mut f32, direction: Facing, config: &PhysicsConfig, dt: f32) {
    let sign = match direction {
        Facing::Left => -1.0,
        Facing::Right => 1.0,
        Facing::Idle => 0.0,
    };
    match config.horizontal_mode {
        HorizontalMode::HardSet => *vx = sign * config.move_speed,
        HorizontalMode::Accumulate => *vx += sign * config.move_force * dt,
    }
}

pub fn clamp_velocity(velocity: Vec2, min: Vec2, max: Vec2) -> Vec2 {
    velocity.max(min).min(max)
}

/// Advance velocity and compute the tentative position for this step.
///
/// Only `velocity`, `desired_position`, `facing` and (on a jump) `on_ground` change;
/// `position` is left for the resolver to commit. Terminal actors are untouched.
pub fn integrate(actor: &mut Actor, input: &InputState, dt: f32, config: &PhysicsConfig) -> Vec2 {
    if !actor.is_alive() {
        return actor.desired_position;
    }
    let dt = clamp_step(dt, config.max_step);
    let direction = input.direction();
    actor.facing = direction;

    let mut velocity = actor.velocity;
    apply_gravity(&mut velocity, config.gravity, dt);
    apply_drag(&mut velocity.x, config.drag);
    try_jump(
        &mut velocity,
        &mut actor.on_ground,
        input.jump_held,
        config.jump_impulse,
        config.jump_cutoff,
    );
    apply_horizontal_input(&mut velocity.x, direction, config, dt);
    actor.velocity = clamp_velocity(velocity, config.min_velocity(), config.max_velocity());

    actor.desired_position = actor.position + actor.velocity * dt;
    actor.desired_position
}
