use crate::components::*;
use crate::config::PhysicsConfig;
use crate::tilemap::Tilemap;
use bevy::prelude::*;

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_player);
    }
}

/// Fresh actor standing on the level's spawn tile.
pub fn spawn_actor(tilemap: &Tilemap, config: &PhysicsConfig) -> Actor {
    let size = config.player_size();
    Actor::spawn(tilemap.spawn_point(size), size)
}

fn spawn_player(mut commands: Commands, tilemap: Res<Tilemap>, config: Res<PhysicsConfig>) {
    let actor = spawn_actor(&tilemap, &config);
    info!(
        "[Koalio] Spawning player at ({:.1}, {:.1})",
        actor.position.x, actor.position.y
    );
    commands.spawn((Player, actor));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_spawns_on_spawn_tile() {
        let mut app = App::new();
        app.insert_resource(Tilemap::test_level())
            .insert_resource(PhysicsConfig::default())
            .add_plugins(PlayerPlugin);
        app.update();

        let world = app.world_mut();
        let mut query = world.query_filtered::<&Actor, With<Player>>();
        let actors: Vec<Actor> = query.iter(world).copied().collect();
        assert_eq!(actors.len(), 1);
        let expected = spawn_actor(&Tilemap::test_level(), &PhysicsConfig::default());
        assert_eq!(actors[0].position, expected.position);
        assert!(actors[0].is_alive());
    }
}
