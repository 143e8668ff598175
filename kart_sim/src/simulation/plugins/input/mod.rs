// kart_sim/src/simulation/plugins/input/mod.rs

pub mod manual;
