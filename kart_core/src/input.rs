// kart_core/src/input.rs

/// One tick's worth of driver intent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DriveCommand {
    pub accelerate: bool,
    pub brake: bool,
    /// Steering in `[-1, 1]`. Positive steers to the right.
    pub turn: f64,
}

impl DriveCommand {
    pub const IDLE: DriveCommand = DriveCommand {
        accelerate: false,
        brake: false,
        turn: 0.0,
    };

    pub fn new(accelerate: bool, brake: bool, turn: f64) -> Self {
        Self {
            accelerate,
            brake,
            turn: turn.clamp(-1.0, 1.0),
        }
    }

    /// `1` for throttle, `-1` for brake/reverse, `0` for both or neither.
    pub fn accel_input(&self) -> f64 {
        (if self.accelerate { 1.0 } else { 0.0 }) - (if self.brake { 1.0 } else { 0.0 })
    }
}

/// Anything that can drive a kart: a keyboard, a script, a trained agent.
pub trait InputSource: Send + Sync {
    fn generate_input(&mut self) -> DriveCommand;
}

/// Polls every source in order; the last one wins.
///
/// All sources are polled even though only the last result is kept, so
/// sources with internal state (scripts) advance in lock-step. Returns `None`
/// when no source is registered, in which case the caller keeps its previous
/// command.
pub fn resolve_command(sources: &mut [&mut dyn InputSource]) -> Option<DriveCommand> {
    let mut resolved = None;
    for source in sources.iter_mut() {
        resolved = Some(source.generate_input());
    }
    resolved
}

/// Replays a fixed list of commands, one per tick, looping at the end.
#[derive(Debug, Clone)]
pub struct ScriptedInput {
    commands: Vec<DriveCommand>,
    cursor: usize,
}

impl ScriptedInput {
    pub fn new(commands: Vec<DriveCommand>) -> Self {
        Self {
            commands,
            cursor: 0,
        }
    }

    pub fn constant(command: DriveCommand) -> Self {
        Self::new(vec![command])
    }
}

impl InputSource for ScriptedInput {
    fn generate_input(&mut self) -> DriveCommand {
        if self.commands.is_empty() {
            return DriveCommand::IDLE;
        }
        let command = self.commands[self.cursor];
        self.cursor = (self.cursor + 1) % self.commands.len();
        command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accel_input_combines_flags() {
        assert_eq!(DriveCommand::new(true, false, 0.0).accel_input(), 1.0);
        assert_eq!(DriveCommand::new(false, true, 0.0).accel_input(), -1.0);
        assert_eq!(DriveCommand::new(true, true, 0.0).accel_input(), 0.0);
        assert_eq!(DriveCommand::IDLE.accel_input(), 0.0);
    }

    #[test]
    fn new_clamps_turn() {
        assert_eq!(DriveCommand::new(false, false, 3.0).turn, 1.0);
        assert_eq!(DriveCommand::new(false, false, -3.0).turn, -1.0);
    }

    #[test]
    fn last_registered_source_wins() {
        let throttle = DriveCommand::new(true, false, 0.0);
        let reverse_left = DriveCommand::new(false, true, -1.0);
        let mut first = ScriptedInput::constant(throttle);
        let mut second = ScriptedInput::constant(reverse_left);

        let sources: &mut [&mut dyn InputSource] = &mut [&mut first, &mut second];
        assert_eq!(resolve_command(sources), Some(reverse_left));

        let sources: &mut [&mut dyn InputSource] = &mut [&mut second, &mut first];
        assert_eq!(resolve_command(sources), Some(throttle));
    }

    #[test]
    fn no_sources_resolves_to_none() {
        assert_eq!(resolve_command(&mut []), None);
    }

    #[test]
    fn every_source_is_polled() {
        let a = DriveCommand::new(true, false, 0.0);
        let b = DriveCommand::new(false, true, 0.0);
        let mut script = ScriptedInput::new(vec![a, b]);
        let mut overriding = ScriptedInput::constant(DriveCommand::IDLE);

        let sources: &mut [&mut dyn InputSource] = &mut [&mut script, &mut overriding];
        resolve_command(sources);
        // The script advanced even though its output was overridden.
        assert_eq!(script.generate_input(), b);
        assert_eq!(script.generate_input(), a);
    }
}
