use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use super::base::{Adjacency, Polarity, Wiring};
use super::{FullyConnectedConfig, WiringConfig};
use crate::error::Result;

/// Every neuron synapses onto every neuron; every input feeds every neuron.
///
/// Polarities are drawn with a 2:1 excitatory bias from a seeded generator,
/// the sensory synapses continuing the stream used for the internal ones.
#[derive(Clone, Debug)]
pub struct FullyConnected {
    adjacency: Adjacency,
    erev_init_seed: u64,
    self_connections: bool,
    rng: StdRng,
}

impl FullyConnected {
    pub const DEFAULT_SEED: u64 = 1111;

    pub fn new(
        units: usize,
        output_dim: Option<usize>,
        erev_init_seed: u64,
        self_connections: bool,
    ) -> Result<Self> {
        let mut adjacency = Adjacency::new(units, output_dim.unwrap_or(units))?;
        let mut rng = StdRng::seed_from_u64(erev_init_seed);

        for src in 0..units {
            for dest in 0..units {
                if src == dest && !self_connections {
                    continue;
                }
                adjacency.add_synapse(src, dest, Polarity::mostly_excitatory(&mut rng))?;
            }
        }

        Ok(Self {
            adjacency,
            erev_init_seed,
            self_connections,
            rng,
        })
    }

    /// `units` neurons, all of them motor, default seed, self loops included
    pub fn with_units(units: usize) -> Result<Self> {
        Self::new(units, None, Self::DEFAULT_SEED, true)
    }

    pub fn self_connections(&self) -> bool {
        self.self_connections
    }

    /// Regenerates from the seed so the rng stream is where `new` left it,
    /// then takes the stored matrices as they are.
    pub fn from_config(config: &FullyConnectedConfig) -> Result<Self> {
        let matrices = &config.matrices;
        let mut wiring = Self::new(
            matrices.units,
            Some(matrices.output_dim),
            config.erev_init_seed,
            config.self_connections,
        )?;
        wiring.adjacency = Adjacency::from_config(matrices)?;
        Ok(wiring)
    }
}

impl Wiring for FullyConnected {
    fn adjacency(&self) -> &Adjacency {
        &self.adjacency
    }

    fn adjacency_mut(&mut self) -> &mut Adjacency {
        &mut self.adjacency
    }

    fn build(&mut self, input_dim: usize) -> Result<()> {
        if !self.adjacency.set_input_dim(input_dim)? {
            return Ok(());
        }
        for src in 0..input_dim {
            for dest in 0..self.adjacency.units() {
                let polarity = Polarity::mostly_excitatory(&mut self.rng);
                self.adjacency.add_sensory_synapse(src, dest, polarity)?;
            }
        }
        debug!(
            units = self.units(),
            input_dim,
            synapses = self.synapse_count(),
            sensory_synapses = self.sensory_synapse_count(),
            "built fully connected wiring"
        );
        Ok(())
    }

    fn to_config(&self) -> WiringConfig {
        WiringConfig::FullyConnected(FullyConnectedConfig {
            erev_init_seed: self.erev_init_seed,
            self_connections: self.self_connections,
            matrices: self.adjacency.to_config(),
        })
    }
}
