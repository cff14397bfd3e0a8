use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use tracing::{debug, warn};

use super::base::{Adjacency, Polarity, Wiring};
use super::{RandomConfig, WiringConfig};
use crate::error::{NcpError, Result};

/// Uniformly sampled sparse wiring.
///
/// Keeps `round(n · (1 - sparsity_level))` of the `n` possible synapses of each
/// matrix, chosen without replacement.
#[derive(Clone, Debug)]
pub struct Random {
    adjacency: Adjacency,
    sparsity_level: f64,
    random_seed: u64,
    rng: StdRng,
}

impl Random {
    pub fn new(
        units: usize,
        output_dim: Option<usize>,
        sparsity_level: f64,
        random_seed: u64,
    ) -> Result<Self> {
        if !(0.0..1.0).contains(&sparsity_level) {
            return Err(NcpError::InvalidSparsity {
                value: sparsity_level,
                range: "[0, 1)",
            });
        }
        let mut wiring = Self {
            adjacency: Adjacency::new(units, output_dim.unwrap_or(units))?,
            sparsity_level,
            random_seed,
            rng: StdRng::seed_from_u64(random_seed),
        };

        for (src, dest) in wiring.sample_pairs(units, units) {
            let polarity = Polarity::mostly_excitatory(&mut wiring.rng);
            wiring.adjacency.add_synapse(src, dest, polarity)?;
        }
        if wiring.synapse_count() == 0 {
            warn!(units, sparsity_level, "random wiring has no internal synapses");
        }
        Ok(wiring)
    }

    pub fn sparsity_level(&self) -> f64 {
        self.sparsity_level
    }

    /// Distinct `(row, col)` pairs of a `rows × cols` matrix
    fn sample_pairs(&mut self, rows: usize, cols: usize) -> Vec<(usize, usize)> {
        let total = rows * cols;
        let keep = ((total as f64) * (1.0 - self.sparsity_level)).round() as usize;
        index::sample(&mut self.rng, total, keep.min(total))
            .into_iter()
            .map(|flat| (flat / cols, flat % cols))
            .collect()
    }

    pub fn from_config(config: &RandomConfig) -> Result<Self> {
        let matrices = &config.matrices;
        let mut wiring = Self::new(
            matrices.units,
            Some(matrices.output_dim),
            config.sparsity_level,
            config.random_seed,
        )?;
        wiring.adjacency = Adjacency::from_config(matrices)?;
        Ok(wiring)
    }
}

impl Wiring for Random {
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
        let units = self.adjacency.units();
        for (src, dest) in self.sample_pairs(input_dim, units) {
            let polarity = Polarity::mostly_excitatory(&mut self.rng);
            self.adjacency.add_sensory_synapse(src, dest, polarity)?;
        }
        debug!(
            units,
            input_dim,
            sparsity = self.sparsity_level,
            synapses = self.synapse_count(),
            sensory_synapses = self.sensory_synapse_count(),
            "built random wiring"
        );
        Ok(())
    }

    fn to_config(&self) -> WiringConfig {
        WiringConfig::Random(RandomConfig {
            sparsity_level: self.sparsity_level,
            random_seed: self.random_seed,
            matrices: self.adjacency.to_config(),
        })
    }
}
