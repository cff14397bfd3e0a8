//! # RNN Layer for Sequence Processing
//!
//! [`LTC`] drives an [`LTCCell`](crate::cells::LTCCell) across a sequence and
//! manages the hidden state.
//!
//! ## Tensor Shapes
//!
//! | Tensor | batch-first (default) | sequence-first |
//! |--------|-----------------------|----------------|
//! | `input` | `[batch, seq, features]` | `[seq, batch, features]` |
//! | `timespans` | `[batch, seq]` | `[seq, batch]` |
//! | `output` | `[batch, seq, motor]` | `[seq, batch, motor]` |
//! | `state` | `[batch, units]` | `[batch, units]` |
//!
//! With `return_sequences = false` the `seq` axis of the output has length 1.
//!
//! ## Stateful Processing
//!
//! ```
//! use burn::backend::NdArray;
//! use burn::tensor::Tensor;
//! use ncps_ltc::rnn::LTC;
//! use ncps_ltc::wirings::AutoNCP;
//!
//! type Backend = NdArray<f32>;
//! let device = Default::default();
//!
//! let mut wiring = AutoNCP::new(20, 2, 0.5, 42).unwrap();
//! let ltc = LTC::<Backend>::new(3, &mut wiring, &device).unwrap();
//!
//! let batch = Tensor::<Backend, 3>::zeros([4, 10, 3], &device);
//! let (_, state) = ltc.forward(batch.clone(), None, None);
//! let (output, _) = ltc.forward(batch, Some(state), None);
//! assert_eq!(output.dims(), [4, 10, 2]);
//! ```

pub mod ltc;

pub use ltc::{LTCConfig, LTC};
