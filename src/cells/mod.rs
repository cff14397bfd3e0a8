//! # LTC Cell
//!
//! Single-timestep Liquid Time-Constant cell. The [`LTC`](crate::rnn::LTC)
//! layer wraps it for whole sequences.
//!
//! ## Solver
//!
//! Per forward call the membrane ODE is unfolded `ode_unfolds` times with a
//! fused semi-implicit Euler step:
//!
//! ```text
//! v ← (cm/Δt · v + gleak · vleak + Σ g · erev) / (cm/Δt + gleak + Σ g + ε)
//! ```
//!
//! with `Δt = elapsed_time / ode_unfolds` and `g` the masked synaptic
//! conductances (internal and sensory).
//!
//! ## Tensor Shapes
//!
//! | Tensor | Shape |
//! |--------|-------|
//! | `inputs` | `[batch, sensory_size]` |
//! | `states` | `[batch, state_size]` |
//! | `elapsed_time` | `[batch]` |
//! | `output` | `[batch, motor_size]` |
//!
//! ## Example
//!
//! ```
//! use burn::backend::NdArray;
//! use burn::tensor::Tensor;
//! use ncps_ltc::cells::LTCCellConfig;
//! use ncps_ltc::wirings::{AutoNCP, Wiring};
//!
//! type Backend = NdArray<f32>;
//! let device = Default::default();
//!
//! let mut wiring = AutoNCP::new(16, 4, 0.5, 7).unwrap();
//! wiring.build(3).unwrap();
//!
//! let cell = LTCCellConfig::default()
//!     .with_init_range("vleak", 0.0, 0.0)
//!     .unwrap()
//!     .init::<Backend>(&wiring, &device)
//!     .unwrap();
//!
//! let inputs = Tensor::<Backend, 2>::zeros([2, 3], &device);
//! let states = Tensor::<Backend, 2>::zeros([2, 16], &device);
//! let (output, next) = cell.step(inputs, states, 1.0);
//! assert_eq!(output.dims(), [2, 4]);
//! assert_eq!(next.dims(), [2, 16]);
//! ```

mod config;
mod init_ranges;
pub mod ltc_cell;

pub use config::{LTCCellConfig, MappingMode};
pub use init_ranges::{InitRange, InitRanges};
pub use ltc_cell::LTCCell;
