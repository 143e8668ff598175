// kart_sim/src/simulation/plugins/mod.rs

pub mod agent;
pub mod input;
pub mod track;
pub mod vehicles;
