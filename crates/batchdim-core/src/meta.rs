use std::sync::RwLockReadGuard;

use crate::error::Result;
use crate::shape::Shape;
use crate::storage::Storage;

/// Shape and layout queries shared by plain and batched tensors.
///
/// The shape queries (`shape`, `dims`, `rank`, `elem_count`) always succeed
/// and describe the *logical* tensor. The layout queries (`strides`,
/// `is_contiguous`, `storage`, `storage_offset`) describe physical memory;
/// a plain tensor answers them, a batched tensor returns
/// [`Error::UnsupportedOnBatchedValue`](crate::Error::UnsupportedOnBatchedValue).
pub trait TensorMeta {
    /// Logical shape.
    fn shape(&self) -> &Shape;

    /// Logical sizes, shortcut for `shape().dims()`.
    fn dims(&self) -> &[usize] {
        self.shape().dims()
    }

    /// Logical rank.
    fn rank(&self) -> usize {
        self.shape().rank()
    }

    /// Number of logical elements. 1 for a rank-0 tensor.
    fn elem_count(&self) -> usize {
        self.shape().elem_count()
    }

    fn strides(&self) -> Result<&[usize]>;

    fn is_contiguous(&self) -> Result<bool>;

    /// Read access to the raw storage buffer.
    fn storage(&self) -> Result<RwLockReadGuard<'_, Storage>>;

    fn storage_offset(&self) -> Result<usize>;
}
