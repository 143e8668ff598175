// kart_sim/src/main.rs

//! Drives a kart around the circuit described by a scenario file.
//!
//! Run from the `kart_sim` directory so the default scenario path resolves:
//! `cargo run -- --scenario assets/scenarios/oval.toml`
//! `cargo run -- --headless --mode training --seed 7`

use std::process::ExitCode;

use avian3d::prelude::*;
use bevy::{
    asset::AssetPlugin,
    log::LogPlugin,
    prelude::*,
    render::mesh::MeshPlugin,
    scene::ScenePlugin,
    state::app::StatesPlugin,
};
use clap::Parser;

use kart_sim::{
    cli::Cli,
    simulation::config::{apply_cli_overrides, load_scenario, Scenario},
    KartSimulationPlugin,
};

const LOG_FILTER: &str = "info,wgpu_core=error,wgpu_hal=error,kart_sim=debug,kart_core=debug";

fn main() -> ExitCode {
    let cli = Cli::parse();

    // --- 1. Load Simulation Configuration ---
    // The logger does not exist yet, so failures go straight to stderr.
    let config = match load_scenario(&cli.scenario) {
        Ok(config) => apply_cli_overrides(config, &cli),
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut app = App::new();

    // --- 2. Add Core Bevy Plugins ---
    let log = LogPlugin {
        level: bevy::log::Level::INFO,
        filter: LOG_FILTER.to_string(),
        ..default()
    };
    if cli.headless {
        app.add_plugins((
            MinimalPlugins,
            StatesPlugin,
            log,
            TransformPlugin,
            AssetPlugin::default(),
            ScenePlugin,
            MeshPlugin,
        ));
    } else {
        app.add_plugins(DefaultPlugins.set(log))
            // Visualize colliders, including the checkpoint triggers.
            .add_plugins(PhysicsDebugPlugin::default());
    }
    app.add_plugins(PhysicsPlugins::default())
        // Everything the simulation plugins read while building the scene.
        .insert_resource(Scenario(config))
        .insert_resource(cli);

    // --- 3. Add the Main Simulation Plugin ---
    app.add_plugins(KartSimulationPlugin);

    // --- 4. Run the App ---
    info!("Starting kart simulation...");
    if app.run().is_error() {
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
