// kart_core/src/lib.rs

// This file defines the public modules of the library.
pub mod agent;
pub mod config;
pub mod decision;
pub mod dynamics;
pub mod env;
pub mod error;
pub mod input;
pub mod physics;
pub mod prelude;
pub mod sensors;
pub mod track;
pub mod types;
pub mod utils;
pub mod world;
