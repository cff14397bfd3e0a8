//! Liquid Time-Constant (LTC) RNN Layer
//!
//! Unrolls an [`LTCCell`] over a sequence, carrying the hidden state between
//! timesteps.

use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cells::{LTCCell, LTCCellConfig};
use crate::error::Result;
use crate::wirings::{FullyConnected, Wiring};

/// Settings of an [`LTC`] layer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LTCConfig {
    pub cell: LTCCellConfig,
    /// Return every timestep instead of only the last one
    pub return_sequences: bool,
    /// `[batch, seq, features]` when true, `[seq, batch, features]` otherwise
    pub batch_first: bool,
}

impl Default for LTCConfig {
    fn default() -> Self {
        Self {
            cell: LTCCellConfig::default(),
            return_sequences: true,
            batch_first: true,
        }
    }
}

impl LTCConfig {
    pub fn with_cell(mut self, cell: LTCCellConfig) -> Self {
        self.cell = cell;
        self
    }

    pub fn with_return_sequences(mut self, return_sequences: bool) -> Self {
        self.return_sequences = return_sequences;
        self
    }

    pub fn with_batch_first(mut self, batch_first: bool) -> Self {
        self.batch_first = batch_first;
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.cell.validate()?;
        Ok(config)
    }

    /// Build `wiring` for `input_size` features and create the layer
    pub fn init<B: Backend>(
        &self,
        input_size: usize,
        wiring: &mut dyn Wiring,
        device: &B::Device,
    ) -> Result<LTC<B>> {
        wiring.build(input_size)?;
        let cell = self.cell.init(&*wiring, device)?;

        debug!(
            input_size,
            units = cell.state_size(),
            motor = cell.motor_size(),
            return_sequences = self.return_sequences,
            batch_first = self.batch_first,
            "initialized LTC layer"
        );

        Ok(LTC {
            cell,
            input_size,
            return_sequences: self.return_sequences,
            batch_first: self.batch_first,
        })
    }
}

/// LTC RNN Layer
///
/// # Type Parameters
/// * `B` - The backend type
#[derive(Module, Debug)]
pub struct LTC<B: Backend> {
    /// The recurrent cell applied at every timestep
    cell: LTCCell<B>,
    /// Input size (number of features)
    #[module(skip)]
    input_size: usize,
    /// Whether to return full sequence or just last timestep
    #[module(skip)]
    return_sequences: bool,
    /// Whether input is batch-first (batch, seq, features) vs (seq, batch, features)
    #[module(skip)]
    batch_first: bool,
}

impl<B: Backend> LTC<B> {
    /// Layer with default settings over `wiring`
    pub fn new(input_size: usize, wiring: &mut dyn Wiring, device: &B::Device) -> Result<Self> {
        LTCConfig::default().init(input_size, wiring, device)
    }

    /// Layer over a [`FullyConnected`] wiring of `units` motor neurons
    pub fn fully_connected(input_size: usize, units: usize, device: &B::Device) -> Result<Self> {
        let mut wiring = FullyConnected::with_units(units)?;
        Self::new(input_size, &mut wiring, device)
    }

    pub fn cell(&self) -> &LTCCell<B> {
        &self.cell
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn state_size(&self) -> usize {
        self.cell.state_size()
    }

    pub fn motor_size(&self) -> usize {
        self.cell.motor_size()
    }

    pub fn synapse_count(&self) -> usize {
        self.cell.synapse_count()
    }

    pub fn sensory_synapse_count(&self) -> usize {
        self.cell.sensory_synapse_count()
    }

    /// See [`LTCCell::apply_weight_constraints`]
    pub fn apply_weight_constraints(mut self) -> Self {
        self.cell = self.cell.apply_weight_constraints();
        self
    }

    /// Runs the cell over a batch-first sequence, returning the kept outputs
    /// and the final state
    fn unroll(
        &self,
        input: Tensor<B, 3>,
        state: Option<Tensor<B, 2>>,
        timespans: Option<Tensor<B, 2>>,
    ) -> (Vec<Tensor<B, 2>>, Tensor<B, 2>) {
        let device = input.device();
        let [batch, seq_len, _] = input.dims();

        let mut state = state.unwrap_or_else(|| Tensor::zeros([batch, self.state_size()], &device));
        let timespans = timespans.unwrap_or_else(|| Tensor::ones([batch, seq_len], &device));
        let mut outputs = Vec::with_capacity(if self.return_sequences { seq_len } else { 1 });

        for t in 0..seq_len {
            let step_input: Tensor<B, 2> = input.clone().narrow(1, t, 1).squeeze(1);
            let elapsed: Tensor<B, 1> = timespans.clone().narrow(1, t, 1).squeeze(1);

            let (output, next) = self.cell.forward(step_input, state, elapsed);
            state = next;

            if self.return_sequences || t + 1 == seq_len {
                outputs.push(output);
            }
        }
        (outputs, state)
    }

    /// Forward pass over a batch of sequences
    ///
    /// # Arguments
    /// * `input` - `[batch, seq, features]`, or `[seq, batch, features]` when
    ///   `batch_first` is off
    /// * `state` - initial state `[batch, state_size]`, zeros when `None`
    /// * `timespans` - elapsed time per step, laid out like the first two axes
    ///   of `input`; ones when `None`
    ///
    /// # Returns
    /// `(output, final_state)`. `output` keeps the input layout with
    /// `motor_size` features; without `return_sequences` its sequence axis has
    /// length 1 and holds the last step. An empty sequence yields an empty
    /// sequence axis and returns the initial state unchanged.
    pub fn forward(
        &self,
        input: Tensor<B, 3>,
        state: Option<Tensor<B, 2>>,
        timespans: Option<Tensor<B, 2>>,
    ) -> (Tensor<B, 3>, Tensor<B, 2>) {
        let seq_axis = if self.batch_first { 1 } else { 0 };
        let batch_axis = 1 - seq_axis;
        let dims = input.dims();
        if dims[seq_axis] == 0 {
            let device = input.device();
            let mut shape = [0; 3];
            shape[batch_axis] = dims[batch_axis];
            shape[2] = self.motor_size();
            let state = state
                .unwrap_or_else(|| Tensor::zeros([dims[batch_axis], self.state_size()], &device));
            return (Tensor::zeros(shape, &device), state);
        }
        let (input, timespans) = if self.batch_first {
            (input, timespans)
        } else {
            (input.swap_dims(0, 1), timespans.map(|ts| ts.swap_dims(0, 1)))
        };

        let (outputs, state) = self.unroll(input, state, timespans);
        (Tensor::stack(outputs, seq_axis), state)
    }

    /// Forward pass over one sequence `[seq, features]`
    pub fn forward_unbatched(
        &self,
        input: Tensor<B, 2>,
        state: Option<Tensor<B, 1>>,
        timespans: Option<Tensor<B, 1>>,
    ) -> (Tensor<B, 2>, Tensor<B, 1>) {
        if input.dims()[0] == 0 {
            let device = input.device();
            let state = state.unwrap_or_else(|| Tensor::zeros([self.state_size()], &device));
            return (Tensor::zeros([0, self.motor_size()], &device), state);
        }
        let (outputs, state) = self.unroll(
            input.unsqueeze::<3>(),
            state.map(|s| s.unsqueeze::<2>()),
            timespans.map(|ts| ts.unsqueeze::<2>()),
        );
        (Tensor::cat(outputs, 0), state.squeeze(0))
    }
}
