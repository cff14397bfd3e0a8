use ndarray::Array2;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{MatrixConfig, WiringConfig};
use crate::error::{NcpError, Result};

/// Sign of a synapse
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Excitatory,
    Inhibitory,
}

impl Polarity {
    /// Matrix encoding: +1 excitatory, -1 inhibitory
    pub fn sign(self) -> i32 {
        match self {
            Polarity::Excitatory => 1,
            Polarity::Inhibitory => -1,
        }
    }

    pub fn from_sign(sign: i32) -> Option<Self> {
        match sign {
            1 => Some(Polarity::Excitatory),
            -1 => Some(Polarity::Inhibitory),
            _ => None,
        }
    }

    /// Even odds between excitatory and inhibitory
    pub(crate) fn balanced<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen::<bool>() {
            Polarity::Excitatory
        } else {
            Polarity::Inhibitory
        }
    }

    /// Two out of three synapses excitatory
    pub(crate) fn mostly_excitatory<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let sign = *[-1, 1, 1].choose(rng).unwrap_or(&1);
        Polarity::from_sign(sign).unwrap_or(Polarity::Excitatory)
    }
}

/// Role of a neuron inside a wiring
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeuronKind {
    Inter,
    Command,
    Motor,
}

/// One directed synapse of a wiring graph
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Synapse {
    pub src: usize,
    pub dest: usize,
    pub polarity: Polarity,
    /// Source is an input feature rather than a neuron
    pub sensory: bool,
}

/// Polarity matrices shared by every wiring.
///
/// `internal[[src, dest]]` and `sensory[[feature, dest]]` hold -1, 0 or +1.
#[derive(Clone, Debug, PartialEq)]
pub struct Adjacency {
    units: usize,
    output_dim: usize,
    input_dim: Option<usize>,
    internal: Array2<i32>,
    sensory: Option<Array2<i32>>,
}

impl Adjacency {
    pub fn new(units: usize, output_dim: usize) -> Result<Self> {
        if units == 0 {
            return Err(NcpError::EmptyLayer("neuron"));
        }
        if output_dim == 0 || output_dim > units {
            return Err(NcpError::InvalidOutputDim { output_dim, units });
        }
        Ok(Self {
            units,
            output_dim,
            input_dim: None,
            internal: Array2::zeros((units, units)),
            sensory: None,
        })
    }

    pub fn units(&self) -> usize {
        self.units
    }

    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    pub fn input_dim(&self) -> Option<usize> {
        self.input_dim
    }

    pub fn internal(&self) -> &Array2<i32> {
        &self.internal
    }

    pub fn sensory(&self) -> Option<&Array2<i32>> {
        self.sensory.as_ref()
    }

    pub(crate) fn set_output_dim(&mut self, output_dim: usize) -> Result<()> {
        if output_dim == 0 || output_dim > self.units {
            return Err(NcpError::InvalidOutputDim {
                output_dim,
                units: self.units,
            });
        }
        self.output_dim = output_dim;
        Ok(())
    }

    /// Fixes the input width and allocates an empty sensory matrix.
    ///
    /// Returns `Ok(false)` when the same width was already set, in which case
    /// the caller must not generate sensory synapses again.
    pub(crate) fn set_input_dim(&mut self, input_dim: usize) -> Result<bool> {
        if let Some(expected) = self.input_dim {
            if expected != input_dim {
                return Err(NcpError::ConflictingInputDim {
                    expected,
                    got: input_dim,
                });
            }
            return Ok(false);
        }
        if input_dim == 0 {
            return Err(NcpError::EmptyLayer("sensory"));
        }
        self.input_dim = Some(input_dim);
        self.sensory = Some(Array2::zeros((input_dim, self.units)));
        Ok(true)
    }

    pub fn add_synapse(&mut self, src: usize, dest: usize, polarity: Polarity) -> Result<()> {
        if src >= self.units || dest >= self.units {
            return Err(NcpError::SynapseOutOfRange {
                kind: "internal",
                src,
                dest,
                sources: self.units,
                units: self.units,
            });
        }
        self.internal[[src, dest]] = polarity.sign();
        Ok(())
    }

    pub fn add_sensory_synapse(&mut self, src: usize, dest: usize, polarity: Polarity) -> Result<()> {
        let units = self.units;
        let (input_dim, sensory) = match (self.input_dim, self.sensory.as_mut()) {
            (Some(dim), Some(matrix)) => (dim, matrix),
            _ => return Err(NcpError::NotBuilt),
        };
        if src >= input_dim || dest >= units {
            return Err(NcpError::SynapseOutOfRange {
                kind: "sensory",
                src,
                dest,
                sources: input_dim,
                units,
            });
        }
        sensory[[src, dest]] = polarity.sign();
        Ok(())
    }

    pub(crate) fn to_config(&self) -> MatrixConfig {
        MatrixConfig {
            units: self.units,
            output_dim: self.output_dim,
            input_dim: self.input_dim,
            adjacency_matrix: rows_of(&self.internal),
            sensory_adjacency_matrix: self.sensory.as_ref().map(rows_of),
        }
    }

    pub(crate) fn from_config(config: &MatrixConfig) -> Result<Self> {
        let mut adjacency = Self::new(config.units, config.output_dim)?;
        adjacency.internal =
            matrix_from_rows("adjacency", &config.adjacency_matrix, config.units, config.units)?;

        match (config.input_dim, &config.sensory_adjacency_matrix) {
            (Some(0), _) => return Err(NcpError::EmptyLayer("sensory")),
            (Some(input_dim), Some(rows)) => {
                adjacency.input_dim = Some(input_dim);
                adjacency.sensory =
                    Some(matrix_from_rows("sensory adjacency", rows, input_dim, config.units)?);
            }
            (None, None) => {}
            _ => {
                return Err(NcpError::MalformedMatrix {
                    name: "sensory adjacency",
                    reason: "input_dim and sensory matrix must be given together".to_string(),
                })
            }
        }
        Ok(adjacency)
    }
}

fn rows_of(matrix: &Array2<i32>) -> Vec<Vec<i32>> {
    matrix.outer_iter().map(|row| row.to_vec()).collect()
}

fn matrix_from_rows(
    name: &'static str,
    rows: &[Vec<i32>],
    nrows: usize,
    ncols: usize,
) -> Result<Array2<i32>> {
    if rows.len() != nrows || rows.iter().any(|row| row.len() != ncols) {
        return Err(NcpError::MalformedMatrix {
            name,
            reason: format!("expected {nrows}x{ncols} entries"),
        });
    }
    if let Some(bad) = rows.iter().flatten().find(|v| !(-1..=1).contains(*v)) {
        return Err(NcpError::MalformedMatrix {
            name,
            reason: format!("entry {bad} is not a polarity"),
        });
    }
    let flat: Vec<i32> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((nrows, ncols), flat).map_err(|e| NcpError::MalformedMatrix {
        name,
        reason: e.to_string(),
    })
}

/// Base trait for wiring configurations in Neural Circuit Policies
pub trait Wiring: Send + Sync {
    /// Polarity matrices backing this wiring
    fn adjacency(&self) -> &Adjacency;

    fn adjacency_mut(&mut self) -> &mut Adjacency;

    /// Fix the number of input features and generate the sensory synapses
    fn build(&mut self, input_dim: usize) -> Result<()>;

    /// Serializable description, matrices included
    fn to_config(&self) -> WiringConfig;

    /// Returns the number of neurons in this wiring
    fn units(&self) -> usize {
        self.adjacency().units()
    }

    /// Returns the input dimension (number of sensory features)
    fn input_dim(&self) -> Option<usize> {
        self.adjacency().input_dim()
    }

    /// Returns the output dimension (number of motor neurons)
    fn output_dim(&self) -> usize {
        self.adjacency().output_dim()
    }

    fn is_built(&self) -> bool {
        self.input_dim().is_some()
    }

    fn input_required(&self) -> bool {
        self.adjacency().sensory().is_some()
    }

    fn num_layers(&self) -> usize {
        1
    }

    /// Neuron ids of a layer, `None` for an unknown layer id
    fn neurons_of_layer(&self, layer_id: usize) -> Option<Vec<usize>> {
        (layer_id == 0).then(|| (0..self.units()).collect())
    }

    /// Motor neurons come first, every other neuron is an interneuron
    fn neuron_kind(&self, neuron_id: usize) -> Option<NeuronKind> {
        if neuron_id >= self.units() {
            None
        } else if neuron_id < self.output_dim() {
            Some(NeuronKind::Motor)
        } else {
            Some(NeuronKind::Inter)
        }
    }

    fn adjacency_matrix(&self) -> &Array2<i32> {
        self.adjacency().internal()
    }

    fn sensory_adjacency_matrix(&self) -> Option<&Array2<i32>> {
        self.adjacency().sensory()
    }

    /// Initial reversal potentials of internal synapses
    fn erev_initializer(&self) -> Array2<i32> {
        self.adjacency_matrix().clone()
    }

    /// Initial reversal potentials of sensory synapses
    fn sensory_erev_initializer(&self) -> Option<Array2<i32>> {
        self.sensory_adjacency_matrix().cloned()
    }

    fn add_synapse(&mut self, src: usize, dest: usize, polarity: Polarity) -> Result<()> {
        self.adjacency_mut().add_synapse(src, dest, polarity)
    }

    fn add_sensory_synapse(&mut self, src: usize, dest: usize, polarity: Polarity) -> Result<()> {
        self.adjacency_mut().add_sensory_synapse(src, dest, polarity)
    }

    fn synapse_count(&self) -> usize {
        self.adjacency_matrix().iter().map(|v| v.unsigned_abs() as usize).sum()
    }

    fn sensory_synapse_count(&self) -> usize {
        self.sensory_adjacency_matrix()
            .map(|m| m.iter().map(|v| v.unsigned_abs() as usize).sum())
            .unwrap_or(0)
    }

    /// Every synapse as a directed edge, sensory synapses first
    fn synapses(&self) -> Vec<Synapse> {
        let tagged = |matrix: &Array2<i32>, sensory: bool| -> Vec<Synapse> {
            matrix
                .indexed_iter()
                .filter_map(|((src, dest), &sign)| {
                    Polarity::from_sign(sign).map(|polarity| Synapse {
                        src,
                        dest,
                        polarity,
                        sensory,
                    })
                })
                .collect()
        };
        let mut edges = self
            .sensory_adjacency_matrix()
            .map(|m| tagged(m, true))
            .unwrap_or_default();
        edges.extend(tagged(self.adjacency_matrix(), false));
        edges
    }
}
