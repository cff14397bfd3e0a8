//! # NCPS-LTC - Neural Circuit Policies with Liquid Time-Constant cells
//!
//! Sparse, biologically inspired recurrent wirings and the LTC neuron model on
//! top of the Burn framework. Tensor execution, autodiff and device placement
//! are left to the Burn backend chosen by the caller.
//!
//! ## Features
//!
//! - **Wirings**: fully connected, random, NCP (sensory → inter → command → motor)
//!   and hand-built connectivity, with JSON save/load
//! - **LTC cell**: ODE-based recurrent step restricted by the wiring's sparsity mask
//! - **Initialization ranges**: per-parameter intervals, overridable by name
//! - **LTC layer**: sequence unrolling with optional per-step elapsed times
//!
//! ## Quick Start
//!
//! ```rust
//! use ncps_ltc::prelude::*;
//!
//! let mut wiring = NCP::new(10, 6, 2, 4, 3, 4, 3, 22222).unwrap();
//! wiring.build(5).unwrap();
//!
//! assert_eq!(wiring.units(), 18);
//! assert_eq!(wiring.output_dim(), 2);
//! assert_eq!(wiring.neuron_kind(0), Some(NeuronKind::Motor));
//! ```
//!
//! ## Cell-level Usage
//!
//! ```ignore
//! use ncps_ltc::cells::LTCCellConfig;
//! use ncps_ltc::wirings::FullyConnected;
//!
//! let mut wiring = FullyConnected::new(32, Some(8), 1234, true)?;
//! wiring.build(16)?;
//! let cell = LTCCellConfig::default()
//!     .with_init_range("sigma", 4.0, 6.0)?
//!     .init::<Backend>(&wiring, &device)?;
//! ```

pub mod cells;
pub mod error;
pub mod rnn;
pub mod wirings;

pub use error::{NcpError, Result};

pub mod prelude {
    pub use crate::cells::{InitRange, InitRanges, LTCCell, LTCCellConfig, MappingMode};
    pub use crate::error::{NcpError, Result};
    pub use crate::rnn::{LTCConfig, LTC};
    pub use crate::wirings::{
        AutoNCP, CustomWiring, FullyConnected, NeuronKind, Polarity, Random, Wiring, NCP,
    };
}
