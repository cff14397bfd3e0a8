//! NCP (Neural Circuit Policy) Wiring Example
//!
//! Builds NCP wirings by hand and through AutoNCP, inspects their layers and
//! synapses, and saves one to JSON.
//!
//! Run with `RUST_LOG=debug cargo run --example ncp_wiring` to see the
//! construction logs.

use ncps_ltc::wirings::{self, AutoNCP, NeuronKind, Wiring, NCP};
use tracing_subscriber::EnvFilter;

fn main() -> ncps_ltc::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== NCP Wiring Example ===\n");

    // Example 1: every layer sized by hand
    println!("Example 1: Manual NCP Configuration");
    let mut wiring = NCP::new(
        12,    // inter_neurons
        8,     // command_neurons
        4,     // motor_neurons
        5,     // sensory_fanout (input -> inter)
        4,     // inter_fanout (inter -> command)
        3,     // recurrent_command_synapses
        4,     // motor_fanin (command -> motor)
        12345, // seed
    )?;
    wiring.build(20)?;

    println!("  Units: {} ({} motor)", wiring.units(), wiring.output_dim());
    for layer in 0..wiring.num_layers() {
        let neurons = wiring.neurons_of_layer(layer).unwrap_or_default();
        let kind = neurons.first().and_then(|&id| wiring.neuron_kind(id));
        println!("    layer {layer}: {:?} x{}", kind, neurons.len());
    }
    println!("  Internal synapses: {}", wiring.synapse_count());
    println!("  Sensory synapses:  {}", wiring.sensory_synapse_count());
    println!();

    // Example 2: the motor neurons only receive
    println!("Example 2: Synapses into motor neuron 0");
    for synapse in wiring.synapses().iter().filter(|s| !s.sensory && s.dest == 0) {
        println!(
            "    {:?} {} -> 0 ({:?})",
            wiring.neuron_kind(synapse.src).unwrap_or(NeuronKind::Inter),
            synapse.src,
            synapse.polarity
        );
    }
    println!();

    // Example 3: sparsity trade-off
    println!("Example 3: AutoNCP Sparsity Comparison");
    for sparsity in [0.0, 0.3, 0.5, 0.8] {
        let mut auto = AutoNCP::new(64, 8, sparsity, 42)?;
        auto.build(16)?;
        let layout = auto.ncp();
        println!(
            "  sparsity {sparsity:.1}: inter {:>2}, command {:>2}, {:>4} internal / {:>4} sensory synapses",
            layout.inter_neurons().len(),
            layout.command_neurons().len(),
            auto.synapse_count(),
            auto.sensory_synapse_count()
        );
    }
    println!();

    // Example 4: persistence
    println!("Example 4: Save and Load");
    let path = std::env::temp_dir().join("ncp_wiring_example.json");
    wirings::save_json(&wiring, &path)?;
    let restored = wirings::load_json(&path)?;
    println!("  Saved to {}", path.display());
    println!(
        "  Restored wiring matches: {}",
        restored.adjacency_matrix() == wiring.adjacency_matrix()
            && restored.sensory_adjacency_matrix() == wiring.sensory_adjacency_matrix()
    );
    std::fs::remove_file(&path)?;

    println!("\n=== NCP Examples completed! ===");
    Ok(())
}
