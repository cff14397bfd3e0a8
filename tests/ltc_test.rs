//! Integration tests for the LTC layer

use burn::backend::NdArray;
use burn::tensor::{Distribution, Tensor};
use ncps_ltc::cells::{InitRanges, LTCCellConfig};
use ncps_ltc::rnn::{LTCConfig, LTC};
use ncps_ltc::wirings::{AutoNCP, FullyConnected, Wiring, NCP};

type Backend = NdArray<f32>;

/// Every parameter drawn from a zero-width range, so two layers built from
/// the same wiring are identical
fn fixed_cell() -> LTCCellConfig {
    let ranges = InitRanges::default()
        .with_ranges([
            ("gleak", (0.4, 0.4)),
            ("vleak", (0.1, 0.1)),
            ("cm", (0.5, 0.5)),
            ("w", (0.3, 0.3)),
            ("sigma", (5.0, 5.0)),
            ("mu", (0.5, 0.5)),
            ("sensory_w", (0.6, 0.6)),
            ("sensory_sigma", (4.0, 4.0)),
            ("sensory_mu", (0.2, 0.2)),
        ])
        .unwrap();
    LTCCellConfig::default().with_init_ranges(ranges)
}

fn layer(config: LTCConfig, input_size: usize) -> LTC<Backend> {
    let device = Default::default();
    let mut wiring = NCP::new(6, 4, 2, 3, 2, 3, 2, 17).unwrap();
    config.init(input_size, &mut wiring, &device).unwrap()
}

fn max_abs_diff<const D: usize>(a: Tensor<Backend, D>, b: Tensor<Backend, D>) -> f32 {
    (a - b).abs().max().into_scalar()
}

#[test]
fn test_ltc_layer_shapes() {
    let device = Default::default();
    let mut wiring = AutoNCP::new(24, 3, 0.5, 22222).unwrap();
    let ltc = LTC::<Backend>::new(5, &mut wiring, &device).unwrap();

    assert_eq!(ltc.input_size(), 5);
    assert_eq!(ltc.state_size(), 24);
    assert_eq!(ltc.motor_size(), 3);
    assert!(ltc.sensory_synapse_count() > 0);

    let input = Tensor::<Backend, 3>::random([2, 9, 5], Distribution::Default, &device);
    let (output, state) = ltc.forward(input, None, None);
    assert_eq!(output.dims(), [2, 9, 3]);
    assert_eq!(state.dims(), [2, 24]);
}

#[test]
fn test_layer_builds_the_wiring() {
    let device = Default::default();
    let mut wiring = FullyConnected::new(8, Some(2), 4, true).unwrap();
    let _ = LTC::<Backend>::new(3, &mut wiring, &device).unwrap();

    assert_eq!(wiring.input_dim(), Some(3));
    assert!(LTC::<Backend>::new(4, &mut wiring, &device).is_err());
}

#[test]
fn test_last_output_matches_full_sequence() {
    let device = Default::default();
    let full = layer(LTCConfig::default().with_cell(fixed_cell()), 3);
    let last = layer(
        LTCConfig::default()
            .with_cell(fixed_cell())
            .with_return_sequences(false),
        3,
    );

    let input = Tensor::<Backend, 3>::random([2, 6, 3], Distribution::Default, &device);
    let (sequence, state_a) = full.forward(input.clone(), None, None);
    let (final_step, state_b) = last.forward(input, None, None);

    assert_eq!(final_step.dims(), [2, 1, 2]);
    assert!(max_abs_diff(sequence.narrow(1, 5, 1), final_step) < 1e-6);
    assert!(max_abs_diff(state_a, state_b) < 1e-6);
}

#[test]
fn test_state_carries_across_calls() {
    let device = Default::default();
    let ltc = layer(LTCConfig::default().with_cell(fixed_cell()), 3);

    let input = Tensor::<Backend, 3>::random([2, 8, 3], Distribution::Default, &device);
    let (whole, whole_state) = ltc.forward(input.clone(), None, None);

    let (_, mid_state) = ltc.forward(input.clone().narrow(1, 0, 5), None, None);
    let (tail, tail_state) = ltc.forward(input.narrow(1, 5, 3), Some(mid_state), None);

    assert!(max_abs_diff(whole.narrow(1, 5, 3), tail) < 1e-5);
    assert!(max_abs_diff(whole_state, tail_state) < 1e-5);
}

#[test]
fn test_default_timespans_are_ones() {
    let device = Default::default();
    let ltc = layer(LTCConfig::default().with_cell(fixed_cell()), 3);

    let input = Tensor::<Backend, 3>::random([2, 4, 3], Distribution::Default, &device);
    let ones = Tensor::<Backend, 2>::ones([2, 4], &device);
    let halves = Tensor::<Backend, 2>::full([2, 4], 0.5, &device);

    let (implicit, _) = ltc.forward(input.clone(), None, None);
    let (explicit, _) = ltc.forward(input.clone(), None, Some(ones));
    let (shorter, _) = ltc.forward(input, None, Some(halves));

    assert!(max_abs_diff(implicit.clone(), explicit) < 1e-6);
    assert!(max_abs_diff(implicit, shorter) > 1e-5);
}

#[test]
fn test_seq_first_matches_batch_first() {
    let device = Default::default();
    let batch_first = layer(LTCConfig::default().with_cell(fixed_cell()), 3);
    let seq_first = layer(
        LTCConfig::default()
            .with_cell(fixed_cell())
            .with_batch_first(false),
        3,
    );

    let input = Tensor::<Backend, 3>::random([2, 5, 3], Distribution::Default, &device);
    let timespans = Tensor::<Backend, 2>::random([2, 5], Distribution::Uniform(0.5, 1.5), &device);

    let (expected, expected_state) = batch_first.forward(input.clone(), None, Some(timespans.clone()));
    let (output, state) = seq_first.forward(
        input.swap_dims(0, 1),
        None,
        Some(timespans.swap_dims(0, 1)),
    );

    assert_eq!(output.dims(), [5, 2, 2]);
    assert!(max_abs_diff(output.swap_dims(0, 1), expected) < 1e-6);
    assert!(max_abs_diff(state, expected_state) < 1e-6);
}

#[test]
fn test_unbatched_matches_batch_of_one() {
    let device = Default::default();
    let ltc = layer(LTCConfig::default().with_cell(fixed_cell()), 3);

    let sequence = Tensor::<Backend, 2>::random([7, 3], Distribution::Default, &device);
    let (batched, batched_state) = ltc.forward(sequence.clone().unsqueeze::<3>(), None, None);
    let (output, state) = ltc.forward_unbatched(sequence, None, None);

    assert_eq!(output.dims(), [7, 2]);
    assert_eq!(state.dims(), [12]);
    assert!(max_abs_diff(batched.squeeze::<2>(0), output) < 1e-6);
    assert!(max_abs_diff(batched_state.squeeze::<1>(0), state) < 1e-6);
}

#[test]
fn test_unbatched_last_step_only() {
    let device = Default::default();
    let ltc = layer(LTCConfig::default().with_return_sequences(false), 3);

    let sequence = Tensor::<Backend, 2>::random([4, 3], Distribution::Default, &device);
    let (output, _) = ltc.forward_unbatched(sequence, None, None);
    assert_eq!(output.dims(), [1, 2]);
}

#[test]
fn test_empty_sequence_returns_initial_state() {
    let device = Default::default();
    let initial = Tensor::<Backend, 2>::random([2, 12], Distribution::Default, &device);

    let ltc = layer(LTCConfig::default(), 3);
    let input = Tensor::<Backend, 3>::zeros([2, 0, 3], &device);
    let (output, state) = ltc.forward(input, Some(initial.clone()), None);
    assert_eq!(output.dims(), [2, 0, 2]);
    assert_eq!(max_abs_diff(state, initial), 0.0);

    let ltc = layer(LTCConfig::default().with_batch_first(false), 3);
    let input = Tensor::<Backend, 3>::zeros([0, 2, 3], &device);
    let (output, state) = ltc.forward(input, None, None);
    assert_eq!(output.dims(), [0, 2, 2]);
    assert_eq!(state.dims(), [2, 12]);
    assert_eq!(state.abs().max().into_scalar(), 0.0);
}

#[test]
fn test_layer_config_from_json() {
    let config = LTCConfig::from_json(
        r#"{
            "return_sequences": false,
            "cell": { "ode_unfolds": 3, "input_mapping": "linear" }
        }"#,
    )
    .unwrap();

    assert!(!config.return_sequences);
    assert!(config.batch_first);
    assert_eq!(config.cell.ode_unfolds, 3);

    let ltc = layer(config, 4);
    assert_eq!(ltc.cell().ode_unfolds(), 3);
    assert!(ltc.cell().input_b.is_none());
}
