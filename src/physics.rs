use bevy::prelude::*;

use crate::components::*;
use crate::config::PhysicsConfig;
use crate::input::PlayerInput;
use crate::player::spawn_actor;
use crate::simulation::step;
use crate::tilemap::Tilemap;

pub struct PhysicsPlugin;

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<TerminalEvent>()
            .add_event::<RestartRequested>()
            .add_systems(FixedUpdate, (step_players, restart_players).chain());
    }
}

/// Sent once when a player's run ends. Presentation reacts to this.
#[derive(Event, Clone, Copy, Debug)]
pub struct TerminalEvent {
    pub entity: Entity,
    pub reason: TerminalReason,
    pub position: Vec2,
}

/// Ask for every player to be rebuilt at the spawn point.
#[derive(Event, Default, Clone, Copy, Debug)]
pub struct RestartRequested;

fn step_players(
    time: Res<Time>,
    tilemap: Res<Tilemap>,
    config: Res<PhysicsConfig>,
    input: Res<PlayerInput>,
    mut players: Query<(Entity, &mut Actor), With<Player>>,
    mut terminal: EventWriter<TerminalEvent>,
) {
    let dt = time.delta_secs();
    for (entity, mut actor) in players.iter_mut() {
        if !actor.is_alive() {
            continue;
        }
        let result = step(&mut actor, &input.0, dt, &*tilemap, &config);
        if let Some(reason) = result.terminal {
            info!(
                "[Koalio] Run ended ({}) at ({:.1}, {:.1})",
                reason.label(),
                result.position.x,
                result.position.y
            );
            terminal.send(TerminalEvent {
                entity,
                reason,
                position: result.position,
            });
        }
    }
}

fn restart_players(
    mut requests: EventReader<RestartRequested>,
    tilemap: Res<Tilemap>,
    config: Res<PhysicsConfig>,
    mut players: Query<&mut Actor, With<Player>>,
) {
    if requests.is_empty() {
        return;
    }
    requests.clear();
    for mut actor in players.iter_mut() {
        *actor = spawn_actor(&tilemap, &config);
    }
    debug!("[Koalio] Players restarted");
}
