// kart_sim/src/simulation/plugins/input/manual.rs

use crate::cli::Cli;
use crate::prelude::*;

/// A "mailbox" for keyboard intent. The keyboard system writes to it, the
/// kart's input resolution reads from it.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct ManualInput {
    pub command: DriveCommand,
}

impl InputSource for ManualInput {
    fn generate_input(&mut self) -> DriveCommand {
        self.command
    }
}

pub struct ManualInputPlugin;

impl Plugin for ManualInputPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            OnEnter(AppState::SceneBuilding),
            attach_manual_input.in_set(SceneBuildSet::ProcessVehicle),
        )
        .add_systems(
            Update,
            keyboard_controller.run_if(resource_exists::<ButtonInput<KeyCode>>),
        );
    }
}

/// Gives every kart a keyboard mailbox when `--manual` was passed.
fn attach_manual_input(
    mut commands: Commands,
    cli: Option<Res<Cli>>,
    requests: Query<Entity, With<SpawnKartRequest>>,
) {
    if !cli.is_some_and(|cli| cli.manual) {
        return;
    }
    for entity in &requests {
        info!("[INPUT] {entity}: driven by the arrow keys");
        commands.entity(entity).insert(ManualInput::default());
    }
}

/// Arrow keys or WASD. Applies the same input to every manually driven kart.
fn keyboard_controller(keys: Res<ButtonInput<KeyCode>>, mut query: Query<&mut ManualInput>) {
    let pressed = |a: KeyCode, b: KeyCode| keys.pressed(a) || keys.pressed(b);
    let command = command_from_keys(
        pressed(KeyCode::ArrowUp, KeyCode::KeyW),
        pressed(KeyCode::ArrowDown, KeyCode::KeyS),
        pressed(KeyCode::ArrowLeft, KeyCode::KeyA),
        pressed(KeyCode::ArrowRight, KeyCode::KeyD),
    );
    for mut input in &mut query {
        input.command = command;
    }
}

fn command_from_keys(up: bool, down: bool, left: bool, right: bool) -> DriveCommand {
    let turn = (if right { 1.0 } else { 0.0 }) - (if left { 1.0 } else { 0.0 });
    DriveCommand::new(up, down, turn)
}
