use std::ops::Range;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::base::{Adjacency, NeuronKind, Polarity, Wiring};
use super::{AutoNcpConfig, NcpConfig, WiringConfig};
use crate::error::{NcpError, Result};

/// Links drawn by [`fan_out`], as `(anchor, partner, polarity)`
type Links = Vec<(usize, usize, Polarity)>;

/// Draws `per_anchor` distinct partners for every anchor neuron, then gives
/// each partner that was never drawn a share of anchors of its own so that no
/// neuron of either group is left disconnected.
///
/// The fill-in share is the mean number of links a partner received,
/// clamped to `[1, anchors.len()]`.
fn fan_out(
    rng: &mut StdRng,
    anchors: Range<usize>,
    partners: Range<usize>,
    per_anchor: usize,
) -> Links {
    let anchor_ids: Vec<usize> = anchors.collect();
    let partner_ids: Vec<usize> = partners.clone().collect();
    let mut reached = vec![false; partner_ids.len()];
    let mut links = Links::new();

    for &anchor in &anchor_ids {
        let chosen: Vec<usize> = partner_ids.choose_multiple(rng, per_anchor).copied().collect();
        for partner in chosen {
            reached[partner - partners.start] = true;
            links.push((anchor, partner, Polarity::balanced(rng)));
        }
    }

    let share = (anchor_ids.len() * per_anchor / partner_ids.len()).clamp(1, anchor_ids.len());
    let orphans: Vec<usize> = partner_ids
        .iter()
        .zip(&reached)
        .filter_map(|(&id, &hit)| (!hit).then_some(id))
        .collect();
    for partner in orphans {
        let chosen: Vec<usize> = anchor_ids.choose_multiple(rng, share).copied().collect();
        for anchor in chosen {
            links.push((anchor, partner, Polarity::balanced(rng)));
        }
    }
    links
}

/// Neural Circuit Policy wiring.
///
/// Four layers: sensory → inter → command → motor, with recurrent synapses
/// among command neurons. Neuron ids are laid out `[motor | command | inter]`;
/// sensory neurons are the input features.
#[derive(Clone, Debug)]
pub struct NCP {
    adjacency: Adjacency,
    num_inter_neurons: usize,
    num_command_neurons: usize,
    num_motor_neurons: usize,
    sensory_fanout: usize,
    inter_fanout: usize,
    recurrent_command_synapses: usize,
    motor_fanin: usize,
    seed: u64,
    rng: StdRng,
}

impl NCP {
    pub const DEFAULT_SEED: u64 = 22222;

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        inter_neurons: usize,
        command_neurons: usize,
        motor_neurons: usize,
        sensory_fanout: usize,
        inter_fanout: usize,
        recurrent_command_synapses: usize,
        motor_fanin: usize,
        seed: u64,
    ) -> Result<Self> {
        for (count, layer) in [
            (inter_neurons, "inter"),
            (command_neurons, "command"),
            (motor_neurons, "motor"),
        ] {
            if count == 0 {
                return Err(NcpError::EmptyLayer(layer));
            }
        }
        for (parameter, value, layer, available) in [
            ("motor fanin", motor_fanin, "command", command_neurons),
            ("sensory fanout", sensory_fanout, "inter", inter_neurons),
            ("inter fanout", inter_fanout, "command", command_neurons),
        ] {
            if value > available {
                return Err(NcpError::FanExceedsLayer {
                    parameter,
                    value,
                    layer,
                    available,
                });
            }
        }

        let units = inter_neurons + command_neurons + motor_neurons;
        Ok(Self {
            adjacency: Adjacency::new(units, motor_neurons)?,
            num_inter_neurons: inter_neurons,
            num_command_neurons: command_neurons,
            num_motor_neurons: motor_neurons,
            sensory_fanout,
            inter_fanout,
            recurrent_command_synapses,
            motor_fanin,
            seed,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn motor_neurons(&self) -> Range<usize> {
        0..self.num_motor_neurons
    }

    pub fn command_neurons(&self) -> Range<usize> {
        let start = self.num_motor_neurons;
        start..start + self.num_command_neurons
    }

    pub fn inter_neurons(&self) -> Range<usize> {
        self.command_neurons().end..self.adjacency.units()
    }

    pub fn sensory_fanout(&self) -> usize {
        self.sensory_fanout
    }

    pub fn inter_fanout(&self) -> usize {
        self.inter_fanout
    }

    pub fn recurrent_command_synapses(&self) -> usize {
        self.recurrent_command_synapses
    }

    pub fn motor_fanin(&self) -> usize {
        self.motor_fanin
    }

    fn build_sensory_to_inter_layer(&mut self, input_dim: usize) -> Result<()> {
        let inter = self.inter_neurons();
        let links = fan_out(&mut self.rng, 0..input_dim, inter, self.sensory_fanout);
        for (src, dest, polarity) in links {
            self.adjacency.add_sensory_synapse(src, dest, polarity)?;
        }
        Ok(())
    }

    fn build_inter_to_command_layer(&mut self) -> Result<()> {
        let (inter, command) = (self.inter_neurons(), self.command_neurons());
        let links = fan_out(&mut self.rng, inter, command, self.inter_fanout);
        for (src, dest, polarity) in links {
            self.adjacency.add_synapse(src, dest, polarity)?;
        }
        Ok(())
    }

    fn build_recurrent_command_layer(&mut self) -> Result<()> {
        let commands = self.command_neurons();
        for _ in 0..self.recurrent_command_synapses {
            let src = self.rng.gen_range(commands.clone());
            let dest = self.rng.gen_range(commands.clone());
            let polarity = Polarity::balanced(&mut self.rng);
            self.adjacency.add_synapse(src, dest, polarity)?;
        }
        Ok(())
    }

    fn build_command_to_motor_layer(&mut self) -> Result<()> {
        // Anchored on the motor side: fan-in per motor neuron, fill-in per command neuron.
        let (motor, command) = (self.motor_neurons(), self.command_neurons());
        let links = fan_out(&mut self.rng, motor, command, self.motor_fanin);
        for (dest, src, polarity) in links {
            self.adjacency.add_synapse(src, dest, polarity)?;
        }
        Ok(())
    }

    fn config(&self) -> NcpConfig {
        NcpConfig {
            inter_neurons: self.num_inter_neurons,
            command_neurons: self.num_command_neurons,
            motor_neurons: self.num_motor_neurons,
            sensory_fanout: self.sensory_fanout,
            inter_fanout: self.inter_fanout,
            recurrent_command_synapses: self.recurrent_command_synapses,
            motor_fanin: self.motor_fanin,
            seed: self.seed,
            matrices: self.adjacency.to_config(),
        }
    }

    pub fn from_config(config: &NcpConfig) -> Result<Self> {
        let mut ncp = Self::new(
            config.inter_neurons,
            config.command_neurons,
            config.motor_neurons,
            config.sensory_fanout,
            config.inter_fanout,
            config.recurrent_command_synapses,
            config.motor_fanin,
            config.seed,
        )?;
        ncp.restore_matrices(&config.matrices)?;
        Ok(ncp)
    }

    fn restore_matrices(&mut self, matrices: &super::MatrixConfig) -> Result<()> {
        let adjacency = Adjacency::from_config(matrices)?;
        if adjacency.units() != self.adjacency.units()
            || adjacency.output_dim() != self.num_motor_neurons
        {
            return Err(NcpError::MalformedMatrix {
                name: "adjacency",
                reason: format!(
                    "matrices describe {} units with {} outputs, layers give {} with {}",
                    adjacency.units(),
                    adjacency.output_dim(),
                    self.adjacency.units(),
                    self.num_motor_neurons
                ),
            });
        }
        let (inter, command) = (self.inter_neurons(), self.command_neurons());
        let stray = adjacency.internal().indexed_iter().find(|&((src, dest), &v)| {
            let allowed = (inter.contains(&src) && command.contains(&dest))
                || (command.contains(&src) && !inter.contains(&dest));
            v != 0 && !allowed
        });
        if let Some(((src, dest), _)) = stray {
            return Err(NcpError::MalformedMatrix {
                name: "adjacency",
                reason: format!("synapse {src} -> {dest} crosses the NCP layer order"),
            });
        }

        let stray = adjacency.sensory().and_then(|sensory| {
            sensory
                .indexed_iter()
                .find(|&((_, dest), &v)| v != 0 && !inter.contains(&dest))
        });
        if let Some(((src, dest), _)) = stray {
            return Err(NcpError::MalformedMatrix {
                name: "sensory adjacency",
                reason: format!("sensory synapse {src} -> {dest} does not reach an inter neuron"),
            });
        }
        self.adjacency = adjacency;
        Ok(())
    }
}

impl Wiring for NCP {
    fn adjacency(&self) -> &Adjacency {
        &self.adjacency
    }

    fn adjacency_mut(&mut self) -> &mut Adjacency {
        &mut self.adjacency
    }

    fn num_layers(&self) -> usize {
        3
    }

    fn neurons_of_layer(&self, layer_id: usize) -> Option<Vec<usize>> {
        match layer_id {
            0 => Some(self.inter_neurons().collect()),
            1 => Some(self.command_neurons().collect()),
            2 => Some(self.motor_neurons().collect()),
            _ => None,
        }
    }

    fn neuron_kind(&self, neuron_id: usize) -> Option<NeuronKind> {
        if self.motor_neurons().contains(&neuron_id) {
            Some(NeuronKind::Motor)
        } else if self.command_neurons().contains(&neuron_id) {
            Some(NeuronKind::Command)
        } else if self.inter_neurons().contains(&neuron_id) {
            Some(NeuronKind::Inter)
        } else {
            None
        }
    }

    fn build(&mut self, input_dim: usize) -> Result<()> {
        if !self.adjacency.set_input_dim(input_dim)? {
            return Ok(());
        }
        self.build_sensory_to_inter_layer(input_dim)?;
        self.build_inter_to_command_layer()?;
        self.build_recurrent_command_layer()?;
        self.build_command_to_motor_layer()?;

        debug!(
            input_dim,
            inter = self.num_inter_neurons,
            command = self.num_command_neurons,
            motor = self.num_motor_neurons,
            synapses = self.synapse_count(),
            sensory_synapses = self.sensory_synapse_count(),
            "built NCP wiring"
        );
        Ok(())
    }

    fn to_config(&self) -> WiringConfig {
        WiringConfig::Ncp(self.config())
    }
}

/// [`NCP`] sized from a neuron budget and a sparsity level.
///
/// 40% of the non-motor neurons become command neurons, the rest inter
/// neurons; fan-outs scale with `1 - sparsity_level`.
#[derive(Clone, Debug)]
pub struct AutoNCP {
    ncp: NCP,
    output_size: usize,
    sparsity_level: f64,
    seed: u64,
}

impl AutoNCP {
    pub fn new(units: usize, output_size: usize, sparsity_level: f64, seed: u64) -> Result<Self> {
        if output_size + 2 >= units {
            return Err(NcpError::InvalidOutputDim {
                output_dim: output_size,
                units,
            });
        }
        if !(0.0..=0.9).contains(&sparsity_level) {
            return Err(NcpError::InvalidSparsity {
                value: sparsity_level,
                range: "[0, 0.9]",
            });
        }

        let density = 1.0 - sparsity_level;
        let scaled = |count: usize, factor: f64| ((count as f64 * factor) as usize).max(1);

        let inter_and_command = units - output_size;
        let command_neurons = scaled(inter_and_command, 0.4);
        let inter_neurons = inter_and_command - command_neurons;

        let ncp = NCP::new(
            inter_neurons,
            command_neurons,
            output_size,
            scaled(inter_neurons, density),
            scaled(command_neurons, density),
            scaled(command_neurons, density * 2.0),
            scaled(command_neurons, density),
            seed,
        )?;

        Ok(Self {
            ncp,
            output_size,
            sparsity_level,
            seed,
        })
    }

    /// The generated layer layout
    pub fn ncp(&self) -> &NCP {
        &self.ncp
    }

    pub fn sparsity_level(&self) -> f64 {
        self.sparsity_level
    }

    pub fn from_config(config: &AutoNcpConfig) -> Result<Self> {
        let mut auto = Self::new(
            config.units,
            config.output_size,
            config.sparsity_level,
            config.seed,
        )?;
        auto.ncp.restore_matrices(&config.matrices)?;
        Ok(auto)
    }
}

impl Wiring for AutoNCP {
    fn adjacency(&self) -> &Adjacency {
        self.ncp.adjacency()
    }

    fn adjacency_mut(&mut self) -> &mut Adjacency {
        self.ncp.adjacency_mut()
    }

    fn num_layers(&self) -> usize {
        self.ncp.num_layers()
    }

    fn neurons_of_layer(&self, layer_id: usize) -> Option<Vec<usize>> {
        self.ncp.neurons_of_layer(layer_id)
    }

    fn neuron_kind(&self, neuron_id: usize) -> Option<NeuronKind> {
        self.ncp.neuron_kind(neuron_id)
    }

    fn build(&mut self, input_dim: usize) -> Result<()> {
        self.ncp.build(input_dim)
    }

    fn to_config(&self) -> WiringConfig {
        WiringConfig::AutoNcp(AutoNcpConfig {
            units: self.units(),
            output_size: self.output_size,
            sparsity_level: self.sparsity_level,
            seed: self.seed,
            matrices: self.ncp.adjacency().to_config(),
        })
    }
}
