//! Sequence Processing with an LTC layer
//!
//! Runs an LTC network over irregularly sampled sequences, in batch-first and
//! sequence-first layouts, and carries the hidden state between chunks.

use burn::backend::NdArray;
use burn::tensor::{Distribution, Tensor};
use ncps_ltc::cells::LTCCellConfig;
use ncps_ltc::rnn::{LTCConfig, LTC};
use ncps_ltc::wirings::{AutoNCP, FullyConnected};
use tracing_subscriber::EnvFilter;

type Backend = NdArray<f32>;

fn main() -> ncps_ltc::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let device = Default::default();
    println!("=== LTC Sequence Example ===\n");

    // Example 1: NCP wiring, output restricted to motor neurons
    println!("Example 1: LTC over AutoNCP(32 units, 4 motor)");
    let mut wiring = AutoNCP::new(32, 4, 0.5, 22222)?;
    let ltc = LTC::<Backend>::new(6, &mut wiring, &device)?;

    let input = Tensor::<Backend, 3>::random([2, 30, 6], Distribution::Uniform(-1.0, 1.0), &device);
    let timespans = Tensor::<Backend, 2>::random([2, 30], Distribution::Uniform(0.2, 2.0), &device);
    let (output, state) = ltc.forward(input, None, Some(timespans));

    println!("  Input shape:  [2, 30, 6]");
    println!("  Output shape: {:?}", output.dims());
    println!("  State shape:  {:?}", state.dims());
    println!();

    // Example 2: sequence-first input, last step only
    println!("Example 2: Sequence-first layout, last output only");
    let config = LTCConfig::default()
        .with_batch_first(false)
        .with_return_sequences(false)
        .with_cell(LTCCellConfig::default().with_ode_unfolds(3));
    let mut wiring = FullyConnected::new(10, Some(2), FullyConnected::DEFAULT_SEED, true)?;
    let ltc = config.init::<Backend>(4, &mut wiring, &device)?;

    let input = Tensor::<Backend, 3>::random([15, 3, 4], Distribution::Default, &device);
    let (output, _) = ltc.forward(input, None, None);
    println!("  Input shape:  [15, 3, 4]");
    println!("  Output shape: {:?}", output.dims());
    println!();

    // Example 3: streaming in chunks
    println!("Example 3: Stateful streaming");
    let ltc = LTC::<Backend>::fully_connected(4, 8, &device)?;
    let mut state = None;
    for chunk in 0..3 {
        let input = Tensor::<Backend, 3>::random([1, 5, 4], Distribution::Default, &device);
        let (output, next) = ltc.forward(input, state, None);
        let last = output.narrow(1, 4, 1).mean().into_scalar();
        println!("  chunk {chunk}: mean of last output {last:+.4}");
        state = Some(next);
    }

    // Example 4: a single unbatched sequence
    println!("\nExample 4: Unbatched sequence");
    let sequence = Tensor::<Backend, 2>::random([12, 4], Distribution::Default, &device);
    let (output, state) = ltc.forward_unbatched(sequence, None, None);
    println!("  Output shape: {:?}", output.dims());
    println!("  State shape:  {:?}", state.dims());

    println!("\n=== Sequence Example completed! ===");
    Ok(())
}
