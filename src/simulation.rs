use bevy::log::debug;
use serde::{Deserialize, Serialize};

use crate::collision::{resolve, StepResult};
use crate::components::Actor;
use crate::config::PhysicsConfig;
use crate::kinematics::{integrate, InputState};
use crate::tilemap::{TileQuery, Tilemap};

/// One simulation step: integrate, then resolve and commit.
///
/// A terminal actor is returned unchanged until the host replaces it.
pub fn step<M: TileQuery + ?Sized>(
    actor: &mut Actor,
    input: &InputState,
    dt: f32,
    map: &M,
    config: &PhysicsConfig,
) -> StepResult {
    if !actor.is_alive() {
        return StepResult::from_actor(actor);
    }
    integrate(actor, input, dt, config);
    resolve(actor, map, config)
}

#[derive(Deserialize, Clone, Debug)]
pub struct SimulationRequest {
    pub level: Option<Tilemap>,
    pub physics: Option<PhysicsConfig>,
    #[serde(default)]
    pub inputs: Vec<SimInput>,
    pub max_frames: u32,
    #[serde(default = "default_record_interval")]
    pub record_interval: u32,
    #[serde(default = "default_frame_dt")]
    pub dt: f32,
}

fn default_record_interval() -> u32 {
    1
}

fn default_frame_dt() -> f32 {
    1.0 / 60.0
}

#[derive(Deserialize, Clone, Debug)]
pub struct SimInput {
    pub frame: u32,
    pub action: String,
    #[serde(default)]
    pub duration: u32,
}

#[derive(Serialize, Clone)]
pub struct SimulationResult {
    pub outcome: String,
    pub frames_elapsed: u32,
    pub trace: Vec<TraceFrame>,
    pub events: Vec<SimEvent>,
}

#[derive(Serialize, Clone)]
pub struct TraceFrame {
    pub frame: u32,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub grounded: bool,
}

#[derive(Serialize, Clone)]
pub struct SimEvent {
    pub frame: u32,
    #[serde(rename = "type")]
    pub event_type: String,
    pub x: f32,
    pub y: f32,
}

impl SimulationRequest {
    pub fn from_json_str(contents: &str) -> Result<Self, String> {
        let request: SimulationRequest = serde_json::from_str(contents)
            .map_err(|e| format!("invalid simulation request: {e}"))?;
        for input in &request.inputs {
            if !matches!(input.action.as_str(), "left" | "right" | "jump") {
                return Err(format!(
                    "unknown action '{}' at frame {}",
                    input.action, input.frame
                ));
            }
        }
        if let Some(level) = &request.level {
            level.validate()?;
        }
        if let Some(physics) = &request.physics {
            physics.validate()?;
        }
        Ok(request)
    }

    /// Expand the input timeline into one snapshot per frame.
    fn frame_inputs(&self) -> Vec<InputState> {
        let mut frames = vec![InputState::default(); self.max_frames as usize];
        for input in &self.inputs {
            let duration = input.duration.max(1);
            let end = input.frame.saturating_add(duration).min(self.max_frames);
            for f in input.frame..end {
                let state = &mut frames[f as usize];
                match input.action.as_str() {
                    "left" => state.moving_left = true,
                    "right" => state.moving_right = true,
                    "jump" => state.jump_held = true,
                    _ => {}
                }
            }
        }
        frames
    }
}

fn trace_frame(frame: u32, actor: &Actor) -> TraceFrame {
    TraceFrame {
        frame,
        x: actor.position.x,
        y: actor.position.y,
        vx: actor.velocity.x,
        vy: actor.velocity.y,
        grounded: actor.on_ground,
    }
}

fn event(frame: u32, event_type: &str, actor: &Actor) -> SimEvent {
    SimEvent {
        frame,
        event_type: event_type.to_string(),
        x: actor.position.x,
        y: actor.position.y,
    }
}

/// Run a scripted input timeline headlessly from the level's spawn point.
pub fn run_simulation(
    tilemap: &Tilemap,
    config: &PhysicsConfig,
    request: &SimulationRequest,
) -> SimulationResult {
    let size = config.player_size();
    let mut actor = Actor::spawn(tilemap.spawn_point(size), size);
    let inputs = request.frame_inputs();

    let mut trace = Vec::new();
    let mut events = Vec::new();
    let mut outcome = "timeout".to_string();
    let mut frames_elapsed = 0;

    for (frame, input) in (0u32..).zip(inputs.iter()) {
        let was_grounded = actor.on_ground;
        let result = step(&mut actor, input, request.dt, tilemap, config);
        frames_elapsed = frame + 1;

        if was_grounded && result.velocity.y > 0.0 {
            events.push(event(frame, "jump_start", &actor));
        }
        if result.on_ground && !was_grounded {
            events.push(event(frame, "land", &actor));
        }

        if let Some(reason) = result.terminal {
            debug!("[Koalio sim] frame {}: {}", frame, reason.label());
            events.push(event(frame, reason.label(), &actor));
            outcome = reason.label().to_string();
            trace.push(trace_frame(frame, &actor));
            break;
        }

        if request.record_interval > 0 && frame % request.record_interval == 0 {
            trace.push(trace_frame(frame, &actor));
        }
    }

    SimulationResult {
        outcome,
        frames_elapsed,
        trace,
        events,
    }
}

/// Run a request, falling back to the given level and physics when it carries none.
pub fn run_request(
    request: &SimulationRequest,
    default_level: &Tilemap,
    default_physics: &PhysicsConfig,
) -> SimulationResult {
    let level = request.level.as_ref().unwrap_or(default_level);
    let physics = request.physics.as_ref().unwrap_or(default_physics);
    run_simulation(level, physics, request)
}
