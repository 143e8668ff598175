// kart_sim/src/simulation/core/prng.rs

use bevy::prelude::Resource;
use rand_chacha::ChaCha8Rng;

/// A newtype wrapper around `ChaCha8Rng` to make it a Bevy Resource.
/// Every agent is seeded from it, so one scenario seed fixes the whole run.
#[derive(Resource)]
pub struct SimulationRng(pub ChaCha8Rng);
