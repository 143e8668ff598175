// kart_sim/src/cli.rs

use bevy::prelude::Resource;
use clap::{Parser, ValueEnum};
use kart_core::config::AgentMode;
use std::path::PathBuf;

/// Kart circuit agent: drives a kart around a checkpoint circuit.
///
/// This struct defines the command-line arguments of the `kart_sim` binary.
#[derive(Parser, Debug, Resource, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the scenario TOML file to run.
    #[arg(short, long, default_value = "assets/scenarios/oval.toml")]
    pub scenario: PathBuf,

    /// Run the simulation in headless mode (without a graphical window).
    #[arg(long, default_value_t = false)]
    pub headless: bool,

    /// Override the agent mode from the scenario file.
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Override the random seed from the scenario file.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Drive with the arrow keys instead of the built-in policy. The agent
    /// keeps scoring the run.
    #[arg(long, default_value_t = false)]
    pub manual: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    Training,
    Inferencing,
}

impl From<ModeArg> for AgentMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Training => AgentMode::Training,
            ModeArg::Inferencing => AgentMode::Inferencing,
        }
    }
}
