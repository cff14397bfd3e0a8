use tracing::debug;

use super::base::{Adjacency, Wiring};
use super::{MatrixConfig, WiringConfig};
use crate::error::Result;

/// Blank wiring whose synapses are placed by hand with
/// [`Wiring::add_synapse`] and, after `build`, [`Wiring::add_sensory_synapse`].
#[derive(Clone, Debug)]
pub struct CustomWiring {
    adjacency: Adjacency,
}

impl CustomWiring {
    pub fn new(units: usize) -> Result<Self> {
        Ok(Self {
            adjacency: Adjacency::new(units, units)?,
        })
    }

    /// Treat the first `output_dim` neurons as motor neurons
    pub fn with_output_dim(mut self, output_dim: usize) -> Result<Self> {
        self.adjacency.set_output_dim(output_dim)?;
        Ok(self)
    }

    pub fn from_config(config: &MatrixConfig) -> Result<Self> {
        Ok(Self {
            adjacency: Adjacency::from_config(config)?,
        })
    }
}

impl Wiring for CustomWiring {
    fn adjacency(&self) -> &Adjacency {
        &self.adjacency
    }

    fn adjacency_mut(&mut self) -> &mut Adjacency {
        &mut self.adjacency
    }

    fn build(&mut self, input_dim: usize) -> Result<()> {
        if self.adjacency.set_input_dim(input_dim)? {
            debug!(units = self.units(), input_dim, "built custom wiring");
        }
        Ok(())
    }

    fn to_config(&self) -> WiringConfig {
        WiringConfig::Custom(self.adjacency.to_config())
    }
}
