//! # Wirings
//!
//! Sparse connectivity structures consumed by [`LTCCell`](crate::cells::LTCCell).
//! A wiring holds two polarity matrices: `units × units` for synapses between
//! neurons and `input_dim × units` for synapses from input features, the latter
//! created by [`Wiring::build`].
//!
//! | Wiring | Structure |
//! |--------|-----------|
//! | [`FullyConnected`] | every neuron to every neuron |
//! | [`Random`] | uniformly sampled subset of synapses |
//! | [`NCP`] | sensory → inter → command → motor layers |
//! | [`AutoNCP`] | [`NCP`] sized from a unit count and sparsity level |
//! | [`CustomWiring`] | synapses added by hand |

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

mod base;
mod custom;
mod fully_connected;
mod ncp;
mod random;

pub use base::{Adjacency, NeuronKind, Polarity, Synapse, Wiring};
pub use custom::CustomWiring;
pub use fully_connected::FullyConnected;
pub use ncp::{AutoNCP, NCP};
pub use random::Random;

/// Polarity matrices in serializable form
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatrixConfig {
    pub units: usize,
    pub output_dim: usize,
    pub input_dim: Option<usize>,
    pub adjacency_matrix: Vec<Vec<i32>>,
    pub sensory_adjacency_matrix: Option<Vec<Vec<i32>>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FullyConnectedConfig {
    pub erev_init_seed: u64,
    pub self_connections: bool,
    pub matrices: MatrixConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RandomConfig {
    pub sparsity_level: f64,
    pub random_seed: u64,
    pub matrices: MatrixConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NcpConfig {
    pub inter_neurons: usize,
    pub command_neurons: usize,
    pub motor_neurons: usize,
    pub sensory_fanout: usize,
    pub inter_fanout: usize,
    pub recurrent_command_synapses: usize,
    pub motor_fanin: usize,
    pub seed: u64,
    pub matrices: MatrixConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AutoNcpConfig {
    pub units: usize,
    pub output_size: usize,
    pub sparsity_level: f64,
    pub seed: u64,
    pub matrices: MatrixConfig,
}

/// Serializable description of any wiring, tagged by `kind`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WiringConfig {
    FullyConnected(FullyConnectedConfig),
    Random(RandomConfig),
    Ncp(NcpConfig),
    AutoNcp(AutoNcpConfig),
    Custom(MatrixConfig),
}

impl WiringConfig {
    pub fn matrices(&self) -> &MatrixConfig {
        match self {
            WiringConfig::FullyConnected(c) => &c.matrices,
            WiringConfig::Random(c) => &c.matrices,
            WiringConfig::Ncp(c) => &c.matrices,
            WiringConfig::AutoNcp(c) => &c.matrices,
            WiringConfig::Custom(m) => m,
        }
    }

    /// Rebuild the wiring this config was taken from
    pub fn into_wiring(self) -> Result<Box<dyn Wiring>> {
        Ok(match self {
            WiringConfig::FullyConnected(c) => Box::new(FullyConnected::from_config(&c)?),
            WiringConfig::Random(c) => Box::new(Random::from_config(&c)?),
            WiringConfig::Ncp(c) => Box::new(NCP::from_config(&c)?),
            WiringConfig::AutoNcp(c) => Box::new(AutoNCP::from_config(&c)?),
            WiringConfig::Custom(m) => Box::new(CustomWiring::from_config(&m)?),
        })
    }
}

/// Write a wiring as pretty-printed JSON
pub fn save_json<P: AsRef<Path>>(wiring: &dyn Wiring, path: P) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, &wiring.to_config())?;
    Ok(())
}

/// Read a wiring written by [`save_json`]
pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Box<dyn Wiring>> {
    let reader = BufReader::new(File::open(path)?);
    let config: WiringConfig = serde_json::from_reader(reader)?;
    config.into_wiring()
}
