// kart_sim/src/simulation/config.rs

//! Loads and validates the scenario file before the Bevy app is built.

use std::path::{Path, PathBuf};

use bevy::prelude::Resource;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use kart_core::{config::ScenarioConfig, error::ConfigError};
use thiserror::Error;

use crate::cli::Cli;

/// The validated scenario, shared with every plugin.
#[derive(Resource, Debug, Clone)]
pub struct Scenario(pub ScenarioConfig);

#[derive(Debug, Error)]
pub enum ScenarioLoadError {
    #[error("could not load scenario '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<figment::Error>,
    },

    #[error("scenario '{path}' is invalid: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },
}

/// Reads `path`, layers `KART_`-prefixed environment variables on top
/// (`KART_SIMULATION__SEED=3` sets `simulation.seed`) and validates the result.
pub fn load_scenario(path: &Path) -> Result<ScenarioConfig, ScenarioLoadError> {
    let config: ScenarioConfig = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("KART_").split("__"))
        .extract()
        .map_err(|e| ScenarioLoadError::Parse {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

    config.validate().map_err(|source| ScenarioLoadError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(config)
}

/// Applies the command-line overrides. Mode and seed never invalidate a
/// scenario, so no re-validation is needed.
pub fn apply_cli_overrides(mut config: ScenarioConfig, cli: &Cli) -> ScenarioConfig {
    if let Some(mode) = cli.mode {
        config.agent.mode = mode.into();
    }
    if let Some(seed) = cli.seed {
        config.simulation.seed = Some(seed);
    }
    config
}
