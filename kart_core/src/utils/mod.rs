// kart_core/src/utils/mod.rs

pub mod math;
pub mod serde_helpers;
