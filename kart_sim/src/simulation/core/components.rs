// kart_sim/src/simulation/core/components.rs

use bevy::prelude::Component;
use kart_core::prelude::{
    DecisionProvider, DriveCommand, KartAgent, KartDynamics, SurfaceLayer,
};

// --- Wrapper Components for Core Types ---

/// The velocity integrator of one kart.
#[derive(Component)]
pub struct KartModel(pub KartDynamics);

/// The learning agent riding on a kart.
#[derive(Component)]
pub struct DrivingAgent(pub KartAgent);

/// The policy that answers the agent's observations. Karts driven by hand
/// have none.
#[derive(Component)]
pub struct Decider(pub Box<dyn DecisionProvider>);

/// The command applied on the current physics tick.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct ActiveCommand(pub DriveCommand);

/// Counts physics ticks between two decisions.
#[derive(Component, Debug, Clone)]
pub struct DecisionClock {
    pub period: u32,
    pub ticks: u32,
}

impl DecisionClock {
    pub fn new(period: u32) -> Self {
        Self { period, ticks: 0 }
    }

    /// Advances one tick. True on the first tick and every `period` ticks after.
    pub fn tick(&mut self) -> bool {
        let due = self.ticks == 0;
        self.ticks = (self.ticks + 1) % self.period.max(1);
        due
    }
}

/// What a static collider means to the agent's ray casts.
#[derive(Component, Debug, Clone, Copy)]
pub struct SurfaceTag(pub SurfaceLayer);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_clock_fires_every_period() {
        let mut clock = DecisionClock::new(3);
        let fired: Vec<bool> = (0..7).map(|_| clock.tick()).collect();
        assert_eq!(fired, vec![true, false, false, true, false, false, true]);
    }
}
