//! Integration tests for the LTC Cell

use burn::backend::{Autodiff, NdArray};
use burn::module::Module;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::{Distribution, Tensor, TensorData};
use ncps_ltc::cells::{LTCCell, LTCCellConfig, MappingMode};
use ncps_ltc::wirings::{AutoNCP, CustomWiring, FullyConnected, Polarity, Wiring};

type Backend = NdArray<f32>;
type TrainBackend = Autodiff<Backend>;

fn create_test_cell() -> LTCCell<Backend> {
    let device = Default::default();
    let mut wiring = FullyConnected::new(10, Some(5), 1234, true).unwrap();
    wiring.build(8).unwrap();

    LTCCellConfig::default()
        .with_ode_unfolds(6)
        .with_epsilon(1e-8)
        .init(&wiring, &device)
        .unwrap()
}

/// One neuron fed by one excitatory input, every parameter fixed
fn single_neuron_cell(implicit: bool) -> LTCCell<Backend> {
    let device = Default::default();
    let mut wiring = CustomWiring::new(1).unwrap();
    wiring.build(1).unwrap();
    wiring.add_sensory_synapse(0, 0, Polarity::Excitatory).unwrap();

    LTCCellConfig::default()
        .with_ode_unfolds(1)
        .with_epsilon(0.0)
        .with_input_mapping(MappingMode::None)
        .with_output_mapping(MappingMode::None)
        .with_implicit_param_constraints(implicit)
        .with_init_range("gleak", 0.5, 0.5)
        .unwrap()
        .with_init_range("vleak", 0.2, 0.2)
        .unwrap()
        .with_init_range("cm", 0.4, 0.4)
        .unwrap()
        .with_init_range("sensory_w", 0.3, 0.3)
        .unwrap()
        .with_init_range("sensory_mu", 0.0, 0.0)
        .unwrap()
        .with_init_range("sensory_sigma", 1.0, 1.0)
        .unwrap()
        .init(&wiring, &device)
        .unwrap()
}

fn max_abs_diff(a: Tensor<Backend, 2>, b: Tensor<Backend, 2>) -> f32 {
    (a - b).abs().max().into_scalar()
}

#[test]
fn test_ltc_cell_creation() {
    let cell = create_test_cell();

    assert_eq!(cell.state_size(), 10);
    assert_eq!(cell.motor_size(), 5);
    assert_eq!(cell.sensory_size(), 8);
    assert_eq!(cell.ode_unfolds(), 6);
}

#[test]
fn test_settings_survive_module_mapping() {
    let device = Default::default();
    let cell = create_test_cell();
    let moved = cell.clone().to_device(&device).no_grad();

    assert_eq!(moved.ode_unfolds(), 6);
    assert_eq!(moved.state_size(), cell.state_size());
    assert_eq!(moved.sensory_size(), cell.sensory_size());
    assert_eq!(moved.motor_size(), cell.motor_size());
    assert_eq!(moved.synapse_count(), cell.synapse_count());
    assert_eq!(moved.sensory_synapse_count(), cell.sensory_synapse_count());
}

#[test]
fn test_ltc_cell_forward() {
    let device = Default::default();
    let cell = create_test_cell();

    let batch_size = 4;
    let inputs = Tensor::<Backend, 2>::zeros([batch_size, 8], &device);
    let states = Tensor::<Backend, 2>::zeros([batch_size, 10], &device);
    let elapsed_time = Tensor::<Backend, 1>::ones([batch_size], &device);

    let (output, new_state) = cell.forward(inputs, states, elapsed_time);

    // Output is motor_size, state is state_size
    assert_eq!(output.dims(), [batch_size, 5]);
    assert_eq!(new_state.dims(), [batch_size, 10]);
}

#[test]
fn test_ltc_state_change() {
    let device = Default::default();
    let cell = create_test_cell();

    let inputs = Tensor::<Backend, 2>::random([2, 8], Distribution::Uniform(-1.0, 1.0), &device);
    let states = Tensor::<Backend, 2>::zeros([2, 10], &device);

    let (_, new_state) = cell.step(inputs, states, 1.0);

    let state_diff = new_state.abs().mean().into_scalar();
    assert!(state_diff > 0.0, "State should change after forward pass");
}

#[test]
fn test_ltc_with_ncp_wiring() {
    let device = Default::default();
    let mut wiring = AutoNCP::new(20, 4, 0.5, 22222).unwrap();
    wiring.build(6).unwrap();
    let cell = LTCCell::<Backend>::new(&wiring, &device).unwrap();

    let inputs = Tensor::<Backend, 2>::random([3, 6], Distribution::Default, &device);
    let states = Tensor::<Backend, 2>::zeros([3, 20], &device);
    let (output, new_state) = cell.step(inputs, states, 1.0);

    assert_eq!(output.dims(), [3, 4]);
    assert_eq!(new_state.dims(), [3, 20]);
}

#[test]
fn test_step_matches_forward_with_uniform_elapsed_time() {
    let device = Default::default();
    let cell = create_test_cell();

    let inputs = Tensor::<Backend, 2>::random([3, 8], Distribution::Default, &device);
    let states = Tensor::<Backend, 2>::random([3, 10], Distribution::Default, &device);
    let elapsed = Tensor::<Backend, 1>::full([3], 0.7, &device);

    let (_, via_forward) = cell.forward(inputs.clone(), states.clone(), elapsed);
    let (_, via_step) = cell.step(inputs, states, 0.7);

    assert!(max_abs_diff(via_forward, via_step) < 1e-6);
}

#[test]
fn test_elapsed_time_changes_dynamics() {
    let device = Default::default();
    let cell = create_test_cell();

    let inputs = Tensor::<Backend, 2>::random([2, 8], Distribution::Uniform(-1.0, 1.0), &device);
    let states = Tensor::<Backend, 2>::random([2, 10], Distribution::Uniform(-1.0, 1.0), &device);

    let (_, short) = cell.step(inputs.clone(), states.clone(), 0.1);
    let (_, long) = cell.step(inputs, states, 5.0);

    assert!(max_abs_diff(short, long) > 1e-4);
}

#[test]
fn test_per_sample_elapsed_time() {
    let device = Default::default();
    let cell = create_test_cell();

    let inputs = Tensor::<Backend, 2>::random([1, 8], Distribution::Default, &device);
    let states = Tensor::<Backend, 2>::random([1, 10], Distribution::Default, &device);
    let batch_inputs = Tensor::cat(vec![inputs.clone(), inputs.clone()], 0);
    let batch_states = Tensor::cat(vec![states.clone(), states.clone()], 0);
    let elapsed = Tensor::<Backend, 1>::from_floats([0.5, 2.0], &device);

    let (_, batched) = cell.forward(batch_inputs, batch_states, elapsed);
    let (_, first) = cell.step(inputs.clone(), states.clone(), 0.5);
    let (_, second) = cell.step(inputs, states, 2.0);

    assert!(max_abs_diff(batched.clone().narrow(0, 0, 1), first) < 1e-6);
    assert!(max_abs_diff(batched.narrow(0, 1, 1), second) < 1e-6);
}

#[test]
fn test_closed_form_single_neuron() {
    let device = Default::default();
    let cell = single_neuron_cell(false);

    let inputs = Tensor::<Backend, 2>::zeros([1, 1], &device);
    let states = Tensor::<Backend, 2>::ones([1, 1], &device);
    let (output, new_state) = cell.step(inputs, states, 1.0);

    // g = 0.3 * sigmoid(0) = 0.15
    // v = (0.4 * 1 + 0.5 * 0.2 + 0.15 * 1) / (0.4 + 0.5 + 0.15)
    let expected = 0.65 / 1.05;
    assert!((new_state.into_scalar() - expected).abs() < 1e-5);
    assert!((output.into_scalar() - expected).abs() < 1e-5);
}

#[test]
fn test_closed_form_single_neuron_with_softplus() {
    let device = Default::default();
    let cell = single_neuron_cell(true);

    let softplus = |x: f32| (1.0 + x.exp()).ln();
    let (cm, gleak, w) = (softplus(0.4), softplus(0.5), softplus(0.3));
    let g = w * 0.5;
    let expected = (cm * 1.0 + gleak * 0.2 + g) / (cm + gleak + g);

    let inputs = Tensor::<Backend, 2>::zeros([1, 1], &device);
    let states = Tensor::<Backend, 2>::ones([1, 1], &device);
    let (_, new_state) = cell.step(inputs, states, 1.0);

    assert!((new_state.into_scalar() - expected).abs() < 1e-5);
}

#[test]
fn test_masked_synapse_has_no_influence() {
    let device = Default::default();
    // Without self connections the diagonal of the adjacency matrix is empty.
    let mut wiring = FullyConnected::new(4, Some(2), 3, false).unwrap();
    wiring.build(3).unwrap();
    assert_eq!(wiring.adjacency_matrix()[[0, 0]], 0);

    let cell = LTCCell::<Backend>::new(&wiring, &device).unwrap();
    let mut perturbed = cell.clone();
    let mut bump = vec![0.0f32; 16];
    bump[0] = 5.0;
    let bump = Tensor::<Backend, 2>::from_data(TensorData::new(bump, [4, 4]), &device);
    perturbed.w = perturbed.w.map(|w| w + bump.clone());

    let inputs = Tensor::<Backend, 2>::random([2, 3], Distribution::Default, &device);
    let states = Tensor::<Backend, 2>::random([2, 4], Distribution::Default, &device);
    let (_, reference) = cell.step(inputs.clone(), states.clone(), 1.0);
    let (_, result) = perturbed.step(inputs, states, 1.0);

    assert!(max_abs_diff(reference, result) < 1e-6);
}

#[test]
fn test_unconnected_input_is_ignored() {
    let device = Default::default();
    let mut wiring = CustomWiring::new(2).unwrap();
    wiring.add_synapse(1, 0, Polarity::Inhibitory).unwrap();
    wiring.build(2).unwrap();
    wiring.add_sensory_synapse(0, 1, Polarity::Excitatory).unwrap();

    let cell = LTCCell::<Backend>::new(&wiring, &device).unwrap();
    let states = Tensor::<Backend, 2>::zeros([1, 2], &device);
    let a = Tensor::<Backend, 2>::from_floats([[0.3, -4.0]], &device);
    let b = Tensor::<Backend, 2>::from_floats([[0.3, 9.0]], &device);

    let (_, with_a) = cell.step(a, states.clone(), 1.0);
    let (_, with_b) = cell.step(b, states, 1.0);

    assert!(max_abs_diff(with_a, with_b) < 1e-6);
}

#[test]
fn test_state_stays_bounded() {
    let device = Default::default();
    let cell = create_test_cell();

    let mut states = Tensor::<Backend, 2>::zeros([2, 10], &device);
    for _ in 0..50 {
        let inputs = Tensor::<Backend, 2>::random([2, 8], Distribution::Uniform(-3.0, 3.0), &device);
        states = cell.step(inputs, states, 1.0).1;
    }

    let peak = states.abs().max().into_scalar();
    assert!(peak.is_finite());
    assert!(peak < 10.0, "state diverged to {peak}");
}

#[test]
fn test_gradients_respect_sparsity() {
    let device = Default::default();
    let mut wiring = FullyConnected::new(4, Some(2), 3, false).unwrap();
    wiring.build(3).unwrap();
    let cell = LTCCell::<TrainBackend>::new(&wiring, &device).unwrap();

    let inputs = Tensor::<TrainBackend, 2>::random([2, 3], Distribution::Default, &device);
    let states = Tensor::<TrainBackend, 2>::random([2, 4], Distribution::Default, &device);
    let (output, _) = cell.step(inputs, states, 1.0);
    let grads = output.powf_scalar(2.0).mean().backward();

    let w_grad = cell.w.grad(&grads).expect("w should receive a gradient");
    let masked: f32 = w_grad.clone().slice([0..1, 0..1]).into_scalar();
    assert_eq!(masked, 0.0);
    assert!(w_grad.abs().sum().into_scalar() > 0.0);
    assert!(cell.sensory_w.grad(&grads).is_some());
    assert!(cell.gleak.grad(&grads).is_some());
}

#[test]
fn test_optimizer_step_with_explicit_constraints() {
    let device = Default::default();
    let mut wiring = AutoNCP::new(12, 2, 0.5, 5).unwrap();
    wiring.build(3).unwrap();
    let mut cell = LTCCellConfig::default()
        .with_implicit_param_constraints(false)
        .init::<TrainBackend>(&wiring, &device)
        .unwrap();
    let mut optim = AdamConfig::new().init::<TrainBackend, LTCCell<TrainBackend>>();

    let inputs = Tensor::<TrainBackend, 2>::random([4, 3], Distribution::Default, &device);
    let target = Tensor::<TrainBackend, 2>::ones([4, 2], &device);
    let mut losses = Vec::new();

    for _ in 0..5 {
        let states = Tensor::<TrainBackend, 2>::zeros([4, 12], &device);
        let (output, _) = cell.step(inputs.clone(), states, 1.0);
        let loss = (output - target.clone()).powf_scalar(2.0).mean();
        losses.push(loss.clone().into_scalar());

        let grads = GradientsParams::from_grads(loss.backward(), &cell);
        cell = optim.step(0.05, cell, grads).apply_weight_constraints();
    }

    assert!(losses.last().unwrap() < losses.first().unwrap());
    assert!(cell.w.val().min().into_scalar() >= 0.0);
    assert!(cell.cm.val().min().into_scalar() >= 0.0);
}
