//! Liquid Time-Constant (LTC) Cell Implementation
//!
//! Reference: Hasani et al., "Liquid time-constant networks", AAAI 2021

use burn::module::{Module, Param};
use burn::tensor::activation;
use burn::tensor::backend::Backend;
use burn::tensor::{Distribution, Tensor, TensorData};
use ndarray::Array2;
use tracing::{debug, warn};

use super::config::{LTCCellConfig, MappingMode};
use super::init_ranges::InitRange;
use crate::error::{NcpError, Result};
use crate::wirings::Wiring;

/// Liquid Time-Constant (LTC) Cell
///
/// Each neuron follows `cm · dv/dt = gleak · (vleak − v) + Σ g_ij · (erev_ij − v)`
/// where the synaptic conductance `g_ij = w_ij · σ(sigma_ij · (v_i − mu_ij))`
/// exists only where the wiring has a synapse. One forward call integrates the
/// ODE over `elapsed_time` with `ode_unfolds` semi-implicit Euler steps.
#[derive(Debug, Module)]
pub struct LTCCell<B: Backend> {
    /// Leak conductance (kept positive)
    pub gleak: Param<Tensor<B, 1>>,
    /// Leak reversal potential
    pub vleak: Param<Tensor<B, 1>>,
    /// Membrane capacitance (kept positive)
    pub cm: Param<Tensor<B, 1>>,
    /// Sigmoid steepness of internal synapses
    pub sigma: Param<Tensor<B, 2>>,
    /// Sigmoid center of internal synapses
    pub mu: Param<Tensor<B, 2>>,
    /// Weights of internal synapses (kept positive)
    pub w: Param<Tensor<B, 2>>,
    /// Reversal potentials of internal synapses, initialized from polarities
    pub erev: Param<Tensor<B, 2>>,
    /// Sigmoid steepness of sensory synapses
    pub sensory_sigma: Param<Tensor<B, 2>>,
    /// Sigmoid center of sensory synapses
    pub sensory_mu: Param<Tensor<B, 2>>,
    /// Weights of sensory synapses (kept positive)
    pub sensory_w: Param<Tensor<B, 2>>,
    /// Reversal potentials of sensory synapses, initialized from polarities
    pub sensory_erev: Param<Tensor<B, 2>>,
    /// `|adjacency|`, not trainable
    pub sparsity_mask: Tensor<B, 2>,
    /// `|sensory adjacency|`, not trainable
    pub sensory_sparsity_mask: Tensor<B, 2>,
    /// Input scale, absent with `MappingMode::None`
    pub input_w: Option<Param<Tensor<B, 1>>>,
    /// Input shift, only with `MappingMode::Affine`
    pub input_b: Option<Param<Tensor<B, 1>>>,
    /// Output scale, absent with `MappingMode::None`
    pub output_w: Option<Param<Tensor<B, 1>>>,
    /// Output shift, only with `MappingMode::Affine`
    pub output_b: Option<Param<Tensor<B, 1>>>,
    /// Solver sub-steps per forward call
    #[module(skip)]
    ode_unfolds: usize,
    /// Added to the solver denominator
    #[module(skip)]
    epsilon: f64,
    /// Softplus on the positive parameters instead of explicit clamping
    #[module(skip)]
    implicit_param_constraints: bool,
    /// Number of neurons
    #[module(skip)]
    state_size: usize,
    /// Number of input features
    #[module(skip)]
    sensory_size: usize,
    /// Number of motor (output) neurons
    #[module(skip)]
    motor_size: usize,
    /// Internal synapses of the wiring
    #[module(skip)]
    synapse_count: usize,
    /// Sensory synapses of the wiring
    #[module(skip)]
    sensory_synapse_count: usize,
}

fn uniform<B: Backend, const D: usize>(
    shape: [usize; D],
    range: InitRange,
    device: &B::Device,
) -> Param<Tensor<B, D>> {
    let tensor = if range.is_constant() {
        Tensor::full(shape, range.min, device)
    } else {
        Tensor::random(shape, Distribution::Uniform(range.min, range.max), device)
    };
    Param::from_tensor(tensor)
}

/// Polarity matrix as a float tensor, optionally as its absolute value
fn polarity_tensor<B: Backend>(matrix: &Array2<i32>, absolute: bool, device: &B::Device) -> Tensor<B, 2> {
    let (rows, cols) = matrix.dim();
    let values: Vec<f32> = matrix
        .iter()
        .map(|&v| if absolute { v.abs() as f32 } else { v as f32 })
        .collect();
    Tensor::from_data(TensorData::new(values, [rows, cols]), device)
}

fn mapping<B: Backend>(
    mode: MappingMode,
    size: usize,
    device: &B::Device,
) -> (Option<Param<Tensor<B, 1>>>, Option<Param<Tensor<B, 1>>>) {
    let weight = mode
        .has_weight()
        .then(|| Param::from_tensor(Tensor::ones([size], device)));
    let bias = mode
        .has_bias()
        .then(|| Param::from_tensor(Tensor::zeros([size], device)));
    (weight, bias)
}

impl<B: Backend> LTCCell<B> {
    /// Cell with default settings for a built wiring
    pub fn new(wiring: &dyn Wiring, device: &B::Device) -> Result<Self> {
        LTCCellConfig::default().init(wiring, device)
    }

    pub(crate) fn from_config(
        config: &LTCCellConfig,
        wiring: &dyn Wiring,
        device: &B::Device,
    ) -> Result<Self> {
        let sensory_adjacency = wiring.sensory_erev_initializer().ok_or(NcpError::NotBuilt)?;
        let adjacency = wiring.erev_initializer();
        let state_size = wiring.units();
        let sensory_size = sensory_adjacency.nrows();
        let motor_size = wiring.output_dim();
        let ranges = &config.init_ranges;

        if wiring.sensory_synapse_count() == 0 {
            warn!(state_size, sensory_size, "wiring has no sensory synapses, inputs are ignored");
        }

        let (input_w, input_b) = mapping(config.input_mapping, sensory_size, device);
        let (output_w, output_b) = mapping(config.output_mapping, motor_size, device);

        debug!(
            state_size,
            sensory_size,
            motor_size,
            synapses = wiring.synapse_count(),
            sensory_synapses = wiring.sensory_synapse_count(),
            input_mapping = ?config.input_mapping,
            output_mapping = ?config.output_mapping,
            "initialized LTC cell"
        );

        Ok(Self {
            gleak: uniform([state_size], ranges.gleak, device),
            vleak: uniform([state_size], ranges.vleak, device),
            cm: uniform([state_size], ranges.cm, device),
            sigma: uniform([state_size, state_size], ranges.sigma, device),
            mu: uniform([state_size, state_size], ranges.mu, device),
            w: uniform([state_size, state_size], ranges.w, device),
            erev: Param::from_tensor(polarity_tensor(&adjacency, false, device)),
            sensory_sigma: uniform([sensory_size, state_size], ranges.sensory_sigma, device),
            sensory_mu: uniform([sensory_size, state_size], ranges.sensory_mu, device),
            sensory_w: uniform([sensory_size, state_size], ranges.sensory_w, device),
            sensory_erev: Param::from_tensor(polarity_tensor(&sensory_adjacency, false, device)),
            sparsity_mask: polarity_tensor(&adjacency, true, device),
            sensory_sparsity_mask: polarity_tensor(&sensory_adjacency, true, device),
            input_w,
            input_b,
            output_w,
            output_b,
            ode_unfolds: config.ode_unfolds,
            epsilon: config.epsilon,
            implicit_param_constraints: config.implicit_param_constraints,
            state_size,
            sensory_size,
            motor_size,
            synapse_count: wiring.synapse_count(),
            sensory_synapse_count: wiring.sensory_synapse_count(),
        })
    }

    pub fn state_size(&self) -> usize {
        self.state_size
    }

    pub fn sensory_size(&self) -> usize {
        self.sensory_size
    }

    pub fn motor_size(&self) -> usize {
        self.motor_size
    }

    pub fn output_size(&self) -> usize {
        self.motor_size
    }

    pub fn ode_unfolds(&self) -> usize {
        self.ode_unfolds
    }

    pub fn synapse_count(&self) -> usize {
        self.synapse_count
    }

    pub fn sensory_synapse_count(&self) -> usize {
        self.sensory_synapse_count
    }

    /// Clamp `w`, `sensory_w`, `cm` and `gleak` at zero.
    ///
    /// Only needed with explicit constraints, after each optimizer step.
    pub fn apply_weight_constraints(mut self) -> Self {
        let clamp = |tensor: Tensor<B, 2>| tensor.clamp_min(0.0).detach().require_grad();
        self.w = self.w.map(clamp);
        self.sensory_w = self.sensory_w.map(clamp);

        let clamp = |tensor: Tensor<B, 1>| tensor.clamp_min(0.0).detach().require_grad();
        self.cm = self.cm.map(clamp);
        self.gleak = self.gleak.map(clamp);
        self
    }

    fn positive<const D: usize>(&self, param: &Param<Tensor<B, D>>) -> Tensor<B, D> {
        if self.implicit_param_constraints {
            activation::softplus(param.val(), 1.0)
        } else {
            param.val()
        }
    }

    fn map_inputs(&self, inputs: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut mapped = inputs;
        if let Some(w) = &self.input_w {
            mapped = mapped * w.val().unsqueeze::<2>();
        }
        if let Some(b) = &self.input_b {
            mapped = mapped + b.val().unsqueeze::<2>();
        }
        mapped
    }

    fn map_outputs(&self, state: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut output = if self.motor_size < self.state_size {
            state.narrow(1, 0, self.motor_size)
        } else {
            state
        };
        if let Some(w) = &self.output_w {
            output = output * w.val().unsqueeze::<2>();
        }
        if let Some(b) = &self.output_b {
            output = output + b.val().unsqueeze::<2>();
        }
        output
    }

    /// Conductance of every `[batch, pre, post]` synapse
    fn conductance(
        pre: Tensor<B, 2>,
        mu: Tensor<B, 2>,
        sigma: Tensor<B, 2>,
        weight: Tensor<B, 2>,
    ) -> Tensor<B, 3> {
        let [batch, presynaptic] = pre.dims();
        let pre = pre.reshape([batch, presynaptic, 1]);
        let gate = activation::sigmoid((pre - mu.unsqueeze::<3>()) * sigma.unsqueeze::<3>());
        gate * weight.unsqueeze::<3>()
    }

    /// `(Σ g · erev, Σ g)` over the presynaptic axis
    fn reduce(conductance: Tensor<B, 3>, erev: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let numerator = (conductance.clone() * erev.unsqueeze::<3>())
            .sum_dim(1)
            .squeeze::<2>(1);
        let denominator = conductance.sum_dim(1).squeeze::<2>(1);
        (numerator, denominator)
    }

    fn ode_solver(
        &self,
        inputs: Tensor<B, 2>,
        state: Tensor<B, 2>,
        elapsed_time: Tensor<B, 1>,
    ) -> Tensor<B, 2> {
        let [batch, _] = state.dims();

        // Sensory synapses see a fixed input for the whole step.
        let sensory_weight = self.positive(&self.sensory_w) * self.sensory_sparsity_mask.clone();
        let sensory = Self::conductance(
            inputs,
            self.sensory_mu.val(),
            self.sensory_sigma.val(),
            sensory_weight,
        );
        let (sensory_numerator, sensory_denominator) = Self::reduce(sensory, self.sensory_erev.val());

        let dt = elapsed_time
            .div_scalar(self.ode_unfolds as f64)
            .reshape([batch, 1]);
        let cm_t = self.positive(&self.cm).unsqueeze::<2>() / dt;
        let gleak = self.positive(&self.gleak).unsqueeze::<2>();
        let leak_current = gleak.clone() * self.vleak.val().unsqueeze::<2>();
        let weight = self.positive(&self.w) * self.sparsity_mask.clone();
        let (mu, sigma, erev) = (self.mu.val(), self.sigma.val(), self.erev.val());

        let mut v = state;
        for _ in 0..self.ode_unfolds {
            let internal = Self::conductance(v.clone(), mu.clone(), sigma.clone(), weight.clone());
            let (numerator, denominator) = Self::reduce(internal, erev.clone());

            let numerator = cm_t.clone() * v
                + leak_current.clone()
                + numerator
                + sensory_numerator.clone();
            let denominator = (cm_t.clone() + gleak.clone() + denominator + sensory_denominator.clone())
                .add_scalar(self.epsilon);
            v = numerator / denominator;
        }
        v
    }

    /// One step of the cell.
    ///
    /// # Shapes
    /// - `inputs`: `[batch, sensory_size]`
    /// - `states`: `[batch, state_size]`
    /// - `elapsed_time`: `[batch]`, time covered by this step
    ///
    /// Returns `(output [batch, motor_size], new_state [batch, state_size])`.
    pub fn forward(
        &self,
        inputs: Tensor<B, 2>,
        states: Tensor<B, 2>,
        elapsed_time: Tensor<B, 1>,
    ) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let new_states = self.ode_solver(self.map_inputs(inputs), states, elapsed_time);
        (self.map_outputs(new_states.clone()), new_states)
    }

    /// [`forward`](Self::forward) with the same elapsed time for the whole batch
    pub fn step(
        &self,
        inputs: Tensor<B, 2>,
        states: Tensor<B, 2>,
        elapsed_time: f64,
    ) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let [batch, _] = inputs.dims();
        let elapsed = Tensor::full([batch], elapsed_time, &inputs.device());
        self.forward(inputs, states, elapsed)
    }
}
