// kart_sim/src/simulation/plugins/agent/mod.rs

//! Perception, decisions, rewards and episode bookkeeping for every kart
//! that carries a `DrivingAgent`.

use avian3d::prelude::{CollisionStarted, LinearVelocity};
use rand::RngCore;

use crate::{
    cli::Cli,
    prelude::*,
    simulation::{core::prng::SimulationRng, plugins::track::TrackLayout},
};

pub struct AgentPlugin;

impl Plugin for AgentPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            OnEnter(AppState::SceneBuilding),
            process_agent_logic.in_set(SceneBuildSet::ProcessAgent),
        )
        .add_systems(OnEnter(AppState::Running), start_agents)
        .add_systems(
            FixedUpdate,
            (
                (handle_checkpoint_triggers, recover_out_of_bounds)
                    .chain()
                    .in_set(SimulationSet::Triggers),
                run_decisions.in_set(SimulationSet::Decision),
            ),
        );
    }
}

// --- SPAWNING ---

/// Builds the agent for every kart that received a dynamics model. Each agent
/// draws its own seed from the simulation's generator.
fn process_agent_logic(
    mut commands: Commands,
    requests: Query<(Entity, &SpawnKartRequest), With<KartModel>>,
    layout: Option<Res<TrackLayout>>,
    cli: Option<Res<Cli>>,
    mut rng: ResMut<SimulationRng>,
) {
    let Some(layout) = layout else {
        error!("[AGENT] No track layout was built; karts will not be scored.");
        return;
    };
    let manual = cli.is_some_and(|cli| cli.manual);

    for (entity, request) in &requests {
        let agent = match KartAgent::new(
            &request.agent,
            layout.0.clone(),
            rng.0.next_u64(),
            Box::new(NullTrainer),
        ) {
            Ok(agent) => agent,
            Err(e) => {
                error!("[AGENT] {entity}: {e}");
                continue;
            }
        };
        info!(
            "[AGENT] {entity}: {:?} agent, {} sensors, decision every {} ticks",
            agent.mode(),
            agent.sensors().len(),
            request.agent.decision_period
        );

        let mut entity_commands = commands.entity(entity);
        entity_commands.insert((
            DrivingAgent(agent),
            DecisionClock::new(request.agent.decision_period),
        ));
        if !manual {
            entity_commands.insert(Decider(Box::new(SensorBalanceDriver::new(
                &request.agent.sensors,
            ))));
        }
    }
}

/// Opens the first episode of every agent.
fn start_agents(
    mut agents: Query<(Entity, &mut DrivingAgent, &mut Transform, &mut LinearVelocity)>,
    queries: TrackQueries,
) {
    for (entity, mut agent, mut transform, mut velocity) in &mut agents {
        let mut body = KartBody {
            entity,
            transform: &mut *transform,
            velocity: &mut *velocity,
            queries: &queries,
        };
        agent.0.start(&mut body);
        info!(
            "[AGENT] {entity}: started at checkpoint {}",
            agent.0.current_checkpoint()
        );
    }
}

// --- RUNTIME ---

/// Forwards trigger entries to the agent that owns the kart.
fn handle_checkpoint_triggers(
    mut collisions: EventReader<CollisionStarted>,
    mut agents: Query<&mut DrivingAgent>,
) {
    for CollisionStarted(a, b) in collisions.read() {
        for (kart, other) in [(*a, *b), (*b, *a)] {
            if let Ok(mut agent) = agents.get_mut(kart) {
                agent.0.on_trigger_enter(ColliderHandle::from_entity(other));
            }
        }
    }
}

fn recover_out_of_bounds(
    mut agents: Query<(Entity, &mut DrivingAgent, &mut Transform, &mut LinearVelocity)>,
    queries: TrackQueries,
) {
    for (entity, mut agent, mut transform, mut velocity) in &mut agents {
        let mut body = KartBody {
            entity,
            transform: &mut *transform,
            velocity: &mut *velocity,
            queries: &queries,
        };
        if agent.0.recover_out_of_bounds(&mut body) {
            info!(
                "[AGENT] {entity}: out of bounds, back to checkpoint {}",
                agent.0.current_checkpoint()
            );
        }
    }
}

/// On decision ticks: observe, decide, apply, then close the episode if a
/// sensor reading latched termination.
fn run_decisions(
    mut agents: Query<(
        Entity,
        &mut DrivingAgent,
        &mut DecisionClock,
        &KartModel,
        Option<&mut Decider>,
        &mut Transform,
        &mut LinearVelocity,
    )>,
    queries: TrackQueries,
    mut finished: EventWriter<EpisodeFinished>,
) {
    for (entity, mut agent, mut clock, model, decider, mut transform, mut velocity) in &mut agents {
        if !clock.tick() {
            continue;
        }

        let mut body = KartBody {
            entity,
            transform: &mut *transform,
            velocity: &mut *velocity,
            queries: &queries,
        };
        let observation = agent.0.collect_observations(&body, &model.0);
        if let Some(mut decider) = decider {
            let action = decider.0.decide(&observation);
            agent.0.on_action_received(action, &body, &model.0);
        }

        if let Some(summary) = agent.0.finish_pending_episode(&mut body) {
            finished.write(EpisodeFinished {
                kart: entity,
                summary,
            });
        }

        let reward = agent.0.take_step_reward();
        trace!("[AGENT] {entity}: decision reward {reward:.3}");
    }
}
