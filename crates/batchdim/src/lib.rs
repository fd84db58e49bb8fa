//! # batchdim
//!
//! Batched tensors for vmap-style vectorization: a batch level hides one
//! physical dimension of a tensor, levels stack, and the physical layout of
//! a batched tensor is kept out of reach.
//!
//! ## Usage
//!
//! ```rust
//! use batchdim::prelude::*;
//!
//! let x = Tensor::ones((2, 3, 4), DType::F32)?;
//! let x = add_batch_dim(&x, 1, 1)?;
//! assert_eq!(x.dims(), &[2, 4]);
//! let x = add_batch_dim(&x, 2, 1)?;
//! assert_eq!(x.dims(), &[2]);
//! assert!(x.strides().is_err());
//! # Ok::<(), batchdim::Error>(())
//! ```
//!
//! ## Architecture
//!
//! | Crate | Purpose |
//! |-------|----------|
//! | `batchdim-core` | Tensor, Shape, Layout, DType, Storage, TensorMeta, Error |
//! | `batchdim` | BatchDim, BatchedTensor, Batchable (this crate) |

/// Re-export core types.
pub use batchdim_core::{
    bail, DType, Error, Layout, Result, Shape, Storage, Tensor, TensorId, TensorMeta, WithDType,
};

/// Batched tensors and batch level bookkeeping.
pub mod batched;

pub use batched::{add_batch_dim, make_batched, BatchDim, Batchable, BatchedTensor, Level};

/// Prelude: import this for the most common types.
pub mod prelude {
    pub use crate::batched::{
        add_batch_dim, make_batched, BatchDim, Batchable, BatchedTensor, Level,
    };
    pub use crate::{DType, Error, Result, Shape, Tensor, TensorMeta};
}
