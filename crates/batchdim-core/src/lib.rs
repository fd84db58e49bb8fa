//! # batchdim-core
//!
//! Plain tensor primitives underneath the batched view.
//!
//! This crate provides:
//! - [`Tensor`] — a dense value: layout over a shared storage buffer
//! - [`Shape`] / [`Layout`] — sizes, strides, and offset
//! - [`DType`] / [`Storage`] — element types and the flat buffer
//! - [`TensorMeta`] — the shape/layout query surface shared with batched tensors
//! - [`Error`] / [`Result`] — the crate-wide error type

pub mod dtype;
pub mod error;
pub mod layout;
pub mod meta;
pub mod shape;
pub mod storage;
pub mod tensor;

pub use dtype::{DType, WithDType};
pub use error::{Error, Result};
pub use layout::Layout;
pub use meta::TensorMeta;
pub use shape::Shape;
pub use storage::Storage;
pub use tensor::{Tensor, TensorId};
