//! Training Demo - Sine Wave Regression
//!
//! Fits an NCP-wired LTC network to predict `sin(t + 1)` from `sin(t)` and
//! `cos(t)` using the autodiff NdArray backend and Adam.

use burn::backend::ndarray::NdArrayDevice;
use burn::backend::{Autodiff, NdArray};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::{Tensor, TensorData};
use ncps_ltc::cells::LTCCellConfig;
use ncps_ltc::rnn::{LTCConfig, LTC};
use ncps_ltc::wirings::AutoNCP;
use tracing::info;
use tracing_subscriber::EnvFilter;

type Backend = Autodiff<NdArray<f32>>;

const SEQ_LEN: usize = 48;
const EPOCHS: usize = 60;
const LEARNING_RATE: f64 = 0.01;

/// Returns `([1, SEQ_LEN, 2], [1, SEQ_LEN, 1])`
fn sine_data(device: &NdArrayDevice) -> (Tensor<Backend, 3>, Tensor<Backend, 3>) {
    let ts: Vec<f32> = (0..SEQ_LEN)
        .map(|i| i as f32 * 2.0 * std::f32::consts::PI / 16.0)
        .collect();
    let features: Vec<f32> = ts.iter().flat_map(|t| [t.sin(), t.cos()]).collect();
    let targets: Vec<f32> = ts.iter().map(|t| (t + 1.0).sin()).collect();

    (
        Tensor::from_data(TensorData::new(features, [1, SEQ_LEN, 2]), device),
        Tensor::from_data(TensorData::new(targets, [1, SEQ_LEN, 1]), device),
    )
}

fn main() -> ncps_ltc::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let device = Default::default();
    let (input, target) = sine_data(&device);

    let mut wiring = AutoNCP::new(16, 1, 0.5, 22222)?;
    let config = LTCConfig::default().with_cell(
        LTCCellConfig::default()
            .with_implicit_param_constraints(false)
            .with_ode_unfolds(6),
    );
    let mut model: LTC<Backend> = config.init(2, &mut wiring, &device)?;
    let mut optim = AdamConfig::new().init::<Backend, LTC<Backend>>();

    info!(
        units = model.state_size(),
        synapses = model.synapse_count(),
        sensory_synapses = model.sensory_synapse_count(),
        "training LTC on sine wave"
    );

    for epoch in 1..=EPOCHS {
        let (prediction, _) = model.forward(input.clone(), None, None);
        let loss = (prediction - target.clone()).powf_scalar(2.0).mean();
        let value = loss.clone().into_scalar();

        let grads = GradientsParams::from_grads(loss.backward(), &model);
        // Explicit constraints: clamp the positive parameters after each step.
        model = optim
            .step(LEARNING_RATE, model, grads)
            .apply_weight_constraints();

        if epoch % 10 == 0 {
            info!(epoch, loss = value, "epoch finished");
        }
    }

    let (prediction, _) = model.forward(input, None, None);
    let loss = (prediction - target).powf_scalar(2.0).mean().into_scalar();
    println!("Final MSE: {loss:.5}");
    Ok(())
}
