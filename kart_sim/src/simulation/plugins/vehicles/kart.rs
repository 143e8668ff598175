// kart_sim/src/simulation/plugins/vehicles/kart.rs

use avian3d::prelude::{
    Collider, CollisionEventsEnabled, CollisionLayers, GravityScale, LinearVelocity, LockedAxes,
    RigidBody, SleepingDisabled,
};

use crate::{
    prelude::*,
    simulation::{
        core::{
            layers::GameLayer,
            transforms::{
                bevy_transform_to_enu_iso, bevy_vector_to_enu_vector, enu_half_extents_to_bevy_size,
                enu_quat_to_bevy_quat, enu_vector_to_bevy_vector,
            },
        },
        plugins::input::manual::ManualInput,
    },
};
use kart_core::dynamics::align_heading;

// --- THE PLUGIN ---
pub struct KartPlugin;

impl Plugin for KartPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            OnEnter(AppState::SceneBuilding),
            (
                // Reads the request and adds the LOGICAL components: the
                // velocity integrator and the command mailbox.
                process_kart_logic.in_set(SceneBuildSet::ProcessVehicle),
                // Adds the PHYSICAL body once the logic is attached.
                attach_kart_physics.in_set(SceneBuildSet::Physics),
            ),
        )
        .add_systems(FixedUpdate, drive_karts.in_set(SimulationSet::Actuation));
    }
}

// --- SYSTEMS ---

/// SPAWNING (LOGIC): builds the pure dynamics model from the request.
fn process_kart_logic(mut commands: Commands, requests: Query<(Entity, &SpawnKartRequest)>) {
    for (entity, request) in &requests {
        match KartDynamics::new(request.kart.clone()) {
            Ok(model) => {
                commands
                    .entity(entity)
                    .insert((KartModel(model), ActiveCommand::default()));
            }
            Err(e) => error!("[KART] {entity}: invalid kart parameters: {e}"),
        }
    }
}

/// SPAWNING (PHYSICS): attaches the rigid body, collider and optional mesh.
///
/// The body is dynamic so Avian reports trigger entries and resolves wall
/// contacts, but gravity and rotation are left to `drive_karts`.
fn attach_kart_physics(
    mut commands: Commands,
    query: Query<(Entity, &SpawnKartRequest, &KartModel), Without<RigidBody>>,
    mut meshes: Option<ResMut<Assets<Mesh>>>,
    mut materials: Option<ResMut<Assets<StandardMaterial>>>,
) {
    for (entity, request, model) in &query {
        let size = enu_half_extents_to_bevy_size(&model.0.params().half_extents);
        info!(
            "[KART] {entity}: attaching body {:.1}x{:.1}x{:.1} at {:?}",
            size.x,
            size.z,
            size.y,
            request.start_pose.translation.vector.as_slice()
        );

        let mut entity_commands = commands.entity(entity);
        entity_commands.insert((
            RigidBody::Dynamic,
            Collider::cuboid(size.x, size.y, size.z),
            GravityScale(0.0),
            LockedAxes::ROTATION_LOCKED,
            LinearVelocity::default(),
            CollisionEventsEnabled,
            // Velocity is written every tick; the body must never sleep.
            SleepingDisabled,
            CollisionLayers::new(GameLayer::Kart, [GameLayer::Obstacle, GameLayer::Checkpoint]),
        ));

        if let (Some(meshes), Some(materials)) = (meshes.as_mut(), materials.as_mut()) {
            entity_commands.insert((
                Mesh3d(meshes.add(Cuboid::new(size.x, size.y, size.z))),
                MeshMaterial3d(materials.add(Color::srgb(0.8, 0.2, 0.15))),
            ));
        }
    }
}

/// RUNTIME: resolves the kart's inputs, integrates its velocity and turns
/// the nose into the direction of travel.
fn drive_karts(
    time: Res<Time>,
    mut karts: Query<(
        &KartModel,
        &mut ActiveCommand,
        &mut Transform,
        &mut LinearVelocity,
        Option<&mut ManualInput>,
        Option<&mut DrivingAgent>,
        Has<Decider>,
    )>,
) {
    let dt = time.delta_secs_f64();
    for (model, mut command, mut transform, mut velocity, mut manual, mut agent, has_decider) in
        &mut karts
    {
        // Later sources win. The agent only drives when something decides for it.
        let mut sources: Vec<&mut dyn InputSource> = Vec::with_capacity(2);
        if let Some(manual) = manual.as_deref_mut() {
            sources.push(manual);
        }
        if has_decider {
            if let Some(agent) = agent.as_deref_mut() {
                sources.push(&mut agent.0);
            }
        }
        if let Some(resolved) = resolve_command(&mut sources) {
            command.0 = resolved;
        }

        let pose = bevy_transform_to_enu_iso(&transform);
        let next = model.0.integrate(
            &bevy_vector_to_enu_vector(&velocity.0),
            &pose.rotation,
            &command.0,
            dt,
        );
        velocity.0 = enu_vector_to_bevy_vector(&next);
        transform.rotation = enu_quat_to_bevy_quat(&align_heading(&pose.rotation, &next));
    }
}
