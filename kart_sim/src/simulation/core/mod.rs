// kart_sim/src/simulation/core/mod.rs

pub mod app_state;
pub mod components;
pub mod events;
pub mod layers;
pub mod physics_bridge;
pub mod prng;
pub mod simulation_setup;
pub mod spawn_requests;
pub mod transforms;
