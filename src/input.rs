use bevy::prelude::*;

use crate::kinematics::InputState;

/// Input snapshot consumed by the physics step.
/// Keyboard (windowed) and scripted drivers (headless) both write to this.
#[derive(Resource, Default, Clone, Copy, Debug)]
pub struct PlayerInput(pub InputState);

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(PlayerInput::default()).add_systems(
            PreUpdate,
            keyboard_to_input.run_if(resource_exists::<ButtonInput<KeyCode>>),
        );
    }
}

/// Translate keyboard state to the player's input flags
fn keyboard_to_input(keyboard: Res<ButtonInput<KeyCode>>, mut input: ResMut<PlayerInput>) {
    input.0 = InputState {
        moving_left: keyboard.any_pressed([KeyCode::KeyA, KeyCode::ArrowLeft]),
        moving_right: keyboard.any_pressed([KeyCode::KeyD, KeyCode::ArrowRight]),
        jump_held: keyboard.any_pressed([KeyCode::Space, KeyCode::KeyW, KeyCode::ArrowUp]),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyboard_state_maps_to_input_flags() {
        let mut app = App::new();
        app.add_plugins(InputPlugin);
        app.insert_resource(ButtonInput::<KeyCode>::default());

        {
            let mut keyboard = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
            keyboard.press(KeyCode::ArrowRight);
            keyboard.press(KeyCode::Space);
        }
        app.update();

        let input = app.world().resource::<PlayerInput>().0;
        assert!(input.moving_right);
        assert!(input.jump_held);
        assert!(!input.moving_left);

        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .release(KeyCode::Space);
        app.update();
        assert!(!app.world().resource::<PlayerInput>().0.jump_held);
    }

    #[test]
    fn input_is_untouched_without_a_keyboard() {
        let mut app = App::new();
        app.add_plugins(InputPlugin);
        app.world_mut().resource_mut::<PlayerInput>().0.moving_left = true;
        app.update();
        assert!(app.world().resource::<PlayerInput>().0.moving_left);
    }
}
