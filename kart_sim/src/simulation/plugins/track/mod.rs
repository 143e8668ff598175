// kart_sim/src/simulation/plugins/track/mod.rs

//! Spawns the circuit: ground tiles, walls and checkpoint triggers.

use avian3d::prelude::{Collider, CollisionLayers, RigidBody, Sensor};

use crate::prelude::*;
use crate::simulation::core::{
    layers::GameLayer,
    transforms::{enu_half_extents_to_bevy_size, enu_iso_to_bevy_transform},
};
use kart_core::config::GroundTileConfig;
use nalgebra::{Isometry3, Vector3};

/// The checkpoint track of the spawned circuit. Collider handles are the
/// trigger entities.
#[derive(Resource, Debug, Clone)]
pub struct TrackLayout(pub CheckpointTrack);

pub struct TrackPlugin;

impl Plugin for TrackPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            OnEnter(AppState::SceneBuilding),
            (spawn_circuit.in_set(SceneBuildSet::BuildTrack), spawn_lighting_and_camera),
        );
    }
}

fn spawn_circuit(
    mut commands: Commands,
    scenario: Res<Scenario>,
    mut meshes: Option<ResMut<Assets<Mesh>>>,
    mut materials: Option<ResMut<Assets<StandardMaterial>>>,
) {
    let track = &scenario.0.track;
    info!(
        "[TRACK] Spawning {} ground tiles, {} walls and {} checkpoints",
        track.ground.len(),
        track.walls.len(),
        track.checkpoints.len()
    );

    let mut spawn_box = |name: String,
                         pose: Isometry3<f64>,
                         half_extents: &Vector3<f64>,
                         layer: SurfaceLayer,
                         color: Color| {
        let size = enu_half_extents_to_bevy_size(half_extents);
        let mut entity = commands.spawn((
            Name::new(name),
            enu_iso_to_bevy_transform(&pose),
            RigidBody::Static,
            Collider::cuboid(size.x, size.y, size.z),
            CollisionLayers::new(GameLayer::from(layer), [GameLayer::Kart]),
            SurfaceTag(layer),
        ));
        if layer == SurfaceLayer::Checkpoint {
            entity.insert(Sensor);
        }
        if let (Some(meshes), Some(materials)) = (meshes.as_mut(), materials.as_mut()) {
            entity.insert((
                Mesh3d(meshes.add(Cuboid::new(size.x, size.y, size.z))),
                MeshMaterial3d(materials.add(StandardMaterial {
                    base_color: color,
                    alpha_mode: if layer == SurfaceLayer::Checkpoint {
                        AlphaMode::Blend
                    } else {
                        AlphaMode::Opaque
                    },
                    ..default()
                })),
            ));
        }
        entity.id()
    };

    for (i, tile) in track.ground.iter().enumerate() {
        let (layer, color) = ground_style(tile);
        spawn_box(format!("Ground {i}"), tile.pose(), &tile.half_extents, layer, color);
    }
    for (i, wall) in track.walls.iter().enumerate() {
        spawn_box(
            format!("Wall {i}"),
            wall.pose(),
            &wall.half_extents,
            SurfaceLayer::Obstacle,
            Color::srgb(0.6, 0.6, 0.65),
        );
    }

    let checkpoints: Vec<Checkpoint> = track
        .checkpoints
        .iter()
        .enumerate()
        .map(|(index, gate)| {
            let entity = spawn_box(
                format!("Checkpoint {index}"),
                gate.pose(),
                &gate.half_extents,
                SurfaceLayer::Checkpoint,
                Color::srgba(0.2, 0.8, 0.3, 0.25),
            );
            Checkpoint {
                index,
                pose: gate.pose(),
                half_extents: gate.half_extents,
                collider: ColliderHandle::from_entity(entity),
            }
        })
        .collect();

    match CheckpointTrack::new(checkpoints) {
        Ok(layout) => commands.insert_resource(TrackLayout(layout)),
        Err(e) => error!("[TRACK] {e}; the agent will not be built"),
    }
}

fn ground_style(tile: &GroundTileConfig) -> (SurfaceLayer, Color) {
    if tile.out_of_bounds {
        (SurfaceLayer::OutOfBounds, Color::srgb(0.35, 0.55, 0.25))
    } else {
        (SurfaceLayer::Track, Color::srgb(0.25, 0.25, 0.28))
    }
}

/// Spawns a light and a static overview camera when rendering is available.
fn spawn_lighting_and_camera(
    mut commands: Commands,
    scenario: Res<Scenario>,
    materials: Option<Res<Assets<StandardMaterial>>>,
) {
    if materials.is_none() {
        return;
    }

    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            illuminance: 15_000.0,
            ..default()
        },
        Transform::from_xyz(10.0, 30.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // Frame the circuit from above and behind its centroid.
    let gates = &scenario.0.track.checkpoints;
    let centroid = gates.iter().map(|g| g.position).sum::<Vector3<f64>>() / gates.len().max(1) as f64;
    let target = Vec3::new(centroid.x as f32, 0.0, -centroid.y as f32);
    commands.spawn((
        Camera3d::default(),
        Transform::from_translation(target + Vec3::new(0.0, 45.0, 35.0)).looking_at(target, Vec3::Y),
    ));
}
